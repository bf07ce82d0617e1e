//! Outbound TCP adapter: persistent stream with magic-byte resync and scheduled reconnect.
//!
//! Grounded on `mavlink-core`'s `async_connection/tcp.rs` `tcpout` (bare connect, no retry)
//! generalized with `K4HVH-mav-lite`'s reconnect-and-keep-serving style for the router's
//! connection lifecycle (spec.md §4.4's per-connection state machine).

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use mavlink_core::Message;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{next_connection_key, ConnectionKey, ConnectionKind, RouterEvent};
use crate::wire::{validate_and_decode, Reframer};

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Spawns the outbound TCP connection's lifecycle task and returns its outbound sender.
/// The connection key is stable across reconnects; the router sees `Disconnected` then a
/// fresh `Connected` for the same key on every reconnect cycle.
pub fn spawn_outbound<M: Message + Send + 'static>(
    address: Ipv4Addr,
    port: u16,
    events: mpsc::UnboundedSender<RouterEvent<M>>,
) -> (ConnectionKey, mpsc::UnboundedSender<Vec<u8>>) {
    let key = next_connection_key();
    let remote = SocketAddr::from((address, port));
    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel::<Vec<u8>>();

    tokio::spawn(async move {
        let mut outbound_rx = outbound_rx;
        loop {
            match TcpStream::connect(remote).await {
                Ok(stream) => {
                    info!(%remote, "tcp connection established");
                    let _ = events.send(RouterEvent::Connected { key, kind: ConnectionKind::Tcp });
                    serve(stream, key, &events, &mut outbound_rx).await;
                    let _ = events.send(RouterEvent::Disconnected { key });
                }
                Err(err) => {
                    debug!(%remote, error = %err, "tcp connect failed, retrying");
                }
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    });

    (key, outbound_tx)
}

async fn serve<M: Message + Send + 'static>(
    stream: TcpStream,
    key: ConnectionKey,
    events: &mpsc::UnboundedSender<RouterEvent<M>>,
    outbound_rx: &mut mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let (mut read_half, mut write_half) = stream.into_split();
    let mut reframer = Reframer::new();
    let mut buf = [0u8; 512];

    loop {
        tokio::select! {
            read = read_half.read(&mut buf) => {
                match read {
                    Ok(0) => {
                        warn!(?key, "tcp peer closed connection");
                        return;
                    }
                    Ok(n) => {
                        reframer.push(&buf[..n]);
                        for result in reframer.drain() {
                            match result {
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
                    }
                    Err(err) => {
                        warn!(?key, error = %err, "tcp read error");
                        return;
                    }
                }
            }
            outbound = outbound_rx.recv() => {
                let Some(bytes) = outbound else { return; };
                if let Err(err) = write_half.write_all(&bytes).await {
                    warn!(?key, error = %err, "tcp write error");
                    return;
                }
            }
        }
    }
}
