//! Connection adapters: per-transport framing, send and reconnect.
//!
//! Each adapter is an independent task that turns transport bytes into [`RouterEvent`]s and
//! posts them to the router's inbox; adapters never learn routes or inspect the dialect
//! themselves (spec.md §4.3) — that is the router's job.

pub mod serial;
pub mod tcp;
pub mod udp;

use std::sync::atomic::{AtomicU64, Ordering};

use mavlink_core::{MavHeader, MavlinkVersion, Message};
use tokio::sync::{mpsc, oneshot};

use crate::subscription::{Delivery, SubscriptionQuery};
use crate::wire::FrameError;

/// Opaque identifier for a single connection (a UDP listener's per-peer record, a UDP
/// sender, a TCP outbound stream, or a serial port).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionKey(u64);

impl ConnectionKey {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

static NEXT_CONNECTION_KEY: AtomicU64 = AtomicU64::new(1);

/// Allocates a fresh, process-unique connection key.
pub fn next_connection_key() -> ConnectionKey {
    ConnectionKey(NEXT_CONNECTION_KEY.fetch_add(1, Ordering::Relaxed))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    UdpPeer,
    UdpSender,
    Tcp,
    Serial,
}

/// Connection lifecycle per spec.md §4.4's state machine. UDP peers (listener side) have no
/// reconnecting state — they are simply removed when stale; UDP senders stay `Open` until
/// explicitly removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Init,
    Open,
    Reconnecting,
    Closed,
}

/// Events an adapter posts to the router's inbox. Generic over the dialect's `Message` type
/// so the router can be instantiated against any generated dialect module.
pub enum RouterEvent<M: Message> {
    Connected {
        key: ConnectionKey,
        kind: ConnectionKind,
    },
    /// Registers the outbound sender for a connection the application wired up, so the
    /// router can reach it from its dispatch path. Sent once, right after spawning an
    /// adapter, before any `Connected`/`FrameReceived` events from it are processed.
    AttachOutbound {
        key: ConnectionKey,
        kind: ConnectionKind,
        sender: mpsc::UnboundedSender<Vec<u8>>,
    },
    Disconnected {
        key: ConnectionKey,
    },
    FrameReceived {
        key: ConnectionKey,
        version: MavlinkVersion,
        header: MavHeader,
        message: Option<M>,
        raw: Vec<u8>,
    },
    FrameError {
        key: ConnectionKey,
        error: FrameError,
    },
    Send {
        message: M,
    },
    Subscribe {
        query: SubscriptionQuery,
        handle: mpsc::UnboundedSender<Delivery<M>>,
        reply: oneshot::Sender<u64>,
    },
    Unsubscribe {
        id: u64,
    },
    Shutdown,
}
