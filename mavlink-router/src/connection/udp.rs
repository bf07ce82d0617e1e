//! UDP adapters: a per-peer-demultiplexing listener ("udpin") and a fixed-remote sender
//! ("udpout"). Grounded on `mavlink-core`'s `async_connection/udp.rs`, whose
//! `AsyncUdpConnection` tracks a single `last_recv_address`; generalized here into a map so
//! that multiple peers on one bound socket each get their own routable connection.

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use mavlink_core::Message;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::connection::{next_connection_key, ConnectionKey, ConnectionKind, RouterEvent};
use crate::error::StartupError;
use crate::wire::{parse_datagram, validate_and_decode};

/// Handle used by the router to push outbound bytes to a connection this adapter owns.
pub struct UdpOutboundHandle {
    pub sender: mpsc::UnboundedSender<(ConnectionKey, Vec<u8>)>,
}

/// A single bound UDP socket demultiplexing inbound datagrams by peer address. The listener
/// socket itself is never added to the routable connection set — only its per-peer records
/// are — so a broadcast fan-out never echoes a frame back through the socket it arrived on.
pub async fn spawn_listener<M: Message + Send + 'static>(
    address: Ipv4Addr,
    port: u16,
    events: mpsc::UnboundedSender<RouterEvent<M>>,
) -> Result<UdpOutboundHandle, StartupError> {
    let bind_addr = SocketAddr::from((address, port));
    let socket = UdpSocket::bind(bind_addr).await.map_err(|source| StartupError::Io {
        address: format!("udpin:{address}:{port}"),
        source,
    })?;
    let socket = Arc::new(socket);

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<(ConnectionKey, Vec<u8>)>();
    let outbound_tx_for_return = outbound_tx.clone();

    tokio::spawn(async move {
        let mut peers: HashMap<SocketAddr, ConnectionKey> = HashMap::new();
        let mut peer_addrs: HashMap<ConnectionKey, SocketAddr> = HashMap::new();
        let mut buf = [0u8; 280];

        loop {
            tokio::select! {
                recv = socket.recv_from(&mut buf) => {
                    let (len, peer_addr) = match recv {
                        Ok(pair) => pair,
                        Err(err) => {
                            warn!(error = %err, "udp listener recv error");
                            continue;
                        }
                    };

                    let is_new_peer = !peers.contains_key(&peer_addr);
                    let key = *peers.entry(peer_addr).or_insert_with(next_connection_key);
                    if is_new_peer {
                        peer_addrs.insert(key, peer_addr);
                        // Give the router a plain per-connection sink for this peer; it
                        // forwards into the listener's shared multiplexed channel.
                        let (relay_tx, mut relay_rx) = mpsc::unbounded_channel::<Vec<u8>>();
                        let shared = outbound_tx.clone();
                        tokio::spawn(async move {
                            while let Some(bytes) = relay_rx.recv().await {
                                if shared.send((key, bytes)).is_err() {
                                    return;
                                }
                            }
                        });
                        if events
                            .send(RouterEvent::AttachOutbound {
                                key,
                                kind: ConnectionKind::UdpPeer,
                                sender: relay_tx,
                            })
                            .is_err()
                        {
                            return;
                        }
                    }
                    if events
                        .send(RouterEvent::Connected { key, kind: ConnectionKind::UdpPeer })
                        .is_err()
                    {
                        return;
                    }

                    match parse_datagram(&buf[..len]) {
                        Ok(raw) => {
                            let message_id = raw.message_id;
                            let version = raw.version;
                            match validate_and_decode::<M>(raw) {
                                Ok((header, message, raw)) => {
                                    let _ = events.send(RouterEvent::FrameReceived {
                                        key,
                                        version,
                                        header,
                                        message,
                                        raw,
                                    });
                                }
                                Err(error) => {
                                    debug!(?error, message_id, "dropping udp frame");
                                    let _ = events.send(RouterEvent::FrameError { key, error });
                                }
                            }
                        }
                        Err(error) => {
                            let _ = events.send(RouterEvent::FrameError { key, error });
                        }
                    }
                }
                outbound = outbound_rx.recv() => {
                    let Some((key, bytes)) = outbound else { return; };
                    if let Some(addr) = peer_addrs.get(&key) {
                        if let Err(err) = socket.send_to(&bytes, addr).await {
                            warn!(error = %err, "udp listener send error");
                        }
                    }
                }
            }
        }
    });

    Ok(UdpOutboundHandle { sender: outbound_tx_for_return })
}

/// A socket bound toward one fixed remote address, added as a single routable connection.
pub async fn spawn_sender<M: Message + Send + 'static>(
    address: Ipv4Addr,
    port: u16,
    events: mpsc::UnboundedSender<RouterEvent<M>>,
) -> Result<(ConnectionKey, mpsc::UnboundedSender<Vec<u8>>), StartupError> {
    let remote = SocketAddr::from((address, port));
    let socket = UdpSocket::bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)))
        .await
        .map_err(|source| StartupError::Io {
            address: format!("udpout:{address}:{port}"),
            source,
        })?;
    socket
        .connect(remote)
        .await
        .map_err(|source| StartupError::Io {
            address: format!("udpout:{address}:{port}"),
            source,
        })?;

    let key = next_connection_key();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();
    let _ = events.send(RouterEvent::Connected { key, kind: ConnectionKind::UdpSender });

    tokio::spawn(async move {
        let mut buf = [0u8; 280];
        loop {
            tokio::select! {
                recv = socket.recv(&mut buf) => {
                    let len = match recv {
                        Ok(len) => len,
                        Err(err) => {
                            warn!(error = %err, "udp sender recv error");
                            continue;
                        }
                    };
                    match parse_datagram(&buf[..len]) {
                        Ok(raw) => {
                            let version = raw.version;
                            match validate_and_decode::<M>(raw) {
                                Ok((header, message, raw)) => {
                                    let _ = events.send(RouterEvent::FrameReceived {
                                        key,
                                        version,
                                        header,
                                        message,
                                        raw,
                                    });
                                }
                                Err(error) => {
                                    let _ = events.send(RouterEvent::FrameError { key, error });
                                }
                            }
                        }
                        Err(error) => {
                            let _ = events.send(RouterEvent::FrameError { key, error });
                        }
                    }
                }
                outbound = outbound_rx.recv() => {
                    let Some(bytes) = outbound else { return; };
                    if let Err(err) = socket.send(&bytes).await {
                        warn!(error = %err, "udp sender send error");
                    }
                }
            }
        }
    });

    Ok((key, outbound_tx))
}
