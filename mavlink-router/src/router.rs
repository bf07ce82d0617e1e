//! The router actor: a single task owning the route table, connection map and subscription
//! list exclusively, processing one event at a time from its inbox (spec.md §4.4, §5).

use std::collections::HashMap;

use mavlink_core::{MavHeader, MavlinkVersion, Message};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::connection::{ConnectionKey, ConnectionKind, ConnectionState, RouterEvent};
use crate::frame::{Frame, Target};
use crate::metrics::Metrics;
use crate::route_table::RouteTable;
use crate::subscription::{Delivery, Subscription, SubscriptionQuery};
use crate::subscription_cache;

struct ConnectionRecord {
    kind: ConnectionKind,
    state: ConnectionState,
}

/// Handle used by application code to drive the router from outside its task: send
/// messages, subscribe/unsubscribe. Cloning is cheap; it is just a channel sender.
#[derive(Clone)]
pub struct RouterHandle<M: Message> {
    inbox: mpsc::UnboundedSender<RouterEvent<M>>,
}

impl<M: Message> RouterHandle<M> {
    /// Packs and enqueues a locally originated message for dispatch. Returns immediately;
    /// routing (including silent drop for an unknown targeted route) happens asynchronously
    /// inside the router task.
    ///
    /// Returns `SendError::ProtocolUndefined` if `message`'s id has no entry in the
    /// configured dialect's dispatch table (spec.md §7: "pack requested for a value that is
    /// not a known message; reported to the caller of send").
    pub fn send(&self, message: M) -> Result<(), crate::error::SendError> {
        if M::default_message_from_id(message.message_id()).is_none() {
            return Err(crate::error::SendError::ProtocolUndefined);
        }
        let _ = self.inbox.send(RouterEvent::Send { message });
        Ok(())
    }

    pub fn subscribe(
        &self,
        query: SubscriptionQuery,
    ) -> mpsc::UnboundedReceiver<Delivery<M>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        let _ = self.inbox.send(RouterEvent::Subscribe {
            query,
            handle: tx,
            reply: reply_tx,
        });
        // The subscription id is only needed for unsubscribe-by-id, which callers track via
        // the consumer's own lifetime (dropping `rx` triggers automatic unsubscribe); the
        // reply channel exists so a caller that wants the id explicitly can await it.
        drop(reply_rx);
        rx
    }

    pub fn shutdown(&self) {
        let _ = self.inbox.send(RouterEvent::Shutdown);
    }

    /// Wires a freshly spawned adapter's outbound sender into the router so its connection
    /// becomes reachable from the dispatch path.
    pub fn attach_outbound(
        &self,
        key: ConnectionKey,
        kind: ConnectionKind,
        sender: mpsc::UnboundedSender<Vec<u8>>,
    ) {
        let _ = self
            .inbox
            .send(RouterEvent::AttachOutbound { key, kind, sender });
    }

    /// Clones the inbox sender so an adapter task can post its own events directly.
    pub fn event_sender(&self) -> mpsc::UnboundedSender<RouterEvent<M>> {
        self.inbox.clone()
    }
}

/// Router state, singleton per process (spec.md §3 "Router state").
pub struct Router<M: Message> {
    local_system: u8,
    local_component: u8,
    /// The configured dialect's name, standing in for spec.md §3's `dialect_module_handle`
    /// (the generated dialect module itself is fixed at compile time by `M`; this is the
    /// runtime record that one was actually selected, per spec.md §7's `no_dialect_set`).
    dialect_name: &'static str,
    connections: HashMap<ConnectionKey, ConnectionRecord>,
    outbound: HashMap<ConnectionKey, mpsc::UnboundedSender<Vec<u8>>>,
    routes: RouteTable,
    subscriptions: Vec<Subscription<M>>,
    next_subscription_id: u64,
    next_sequence: u8,
    metrics: Metrics,
    inbox: mpsc::UnboundedReceiver<RouterEvent<M>>,
}

impl<M: Message + Clone> Router<M> {
    /// Creates a new router and its handle. Refuses to start without a dialect name
    /// (spec.md §7 `no_dialect_set`). Restores the process-wide subscription cache verbatim
    /// (spec.md §4.5); restored entries have no live consumer channel until a new caller
    /// re-subscribes with a matching query, so they are recorded for `restored()` but not
    /// re-activated automatically.
    pub fn new(
        local_system: u8,
        local_component: u8,
        dialect_name: &'static str,
    ) -> Result<(Self, RouterHandle<M>), crate::error::StartupError> {
        if dialect_name.is_empty() {
            return Err(crate::error::StartupError::NoDialectSet);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let router = Self {
            local_system,
            local_component,
            dialect_name,
            connections: HashMap::new(),
            outbound: HashMap::new(),
            routes: RouteTable::new(),
            subscriptions: Vec::new(),
            next_subscription_id: 1,
            next_sequence: 0,
            metrics: Metrics::new(),
            inbox: rx,
        };
        Ok((router, RouterHandle { inbox: tx }))
    }

    /// The dialect name this router was configured with.
    pub fn dialect_name(&self) -> &'static str {
        self.dialect_name
    }

    /// A handle to this router's message/byte counters (spec.md §2 "ambient stack"). Cloning
    /// is cheap; hand a clone to a logging task via [`Metrics::start_stats_logger`].
    pub fn metrics(&self) -> Metrics {
        self.metrics.clone()
    }

    /// Cache entries restored at construction time, for diagnostics/reactivation by the
    /// application layer.
    pub fn restored_subscriptions(&self) -> Vec<subscription_cache::CachedSubscription> {
        subscription_cache::restore()
    }

    /// Runs the router's event loop until a `Shutdown` event arrives or the inbox closes.
    /// This is the router's only suspension-free body: all I/O happens in adapter tasks.
    pub async fn run(mut self) {
        while let Some(event) = self.inbox.recv().await {
            match event {
                RouterEvent::Connected { key, kind } => {
                    self.connections.insert(
                        key,
                        ConnectionRecord {
                            kind,
                            state: ConnectionState::Open,
                        },
                    );
                }
                RouterEvent::AttachOutbound { key, kind, sender } => {
                    self.outbound.insert(key, sender);
                    self.connections.insert(
                        key,
                        ConnectionRecord {
                            kind,
                            state: ConnectionState::Init,
                        },
                    );
                }
                RouterEvent::Disconnected { key } => {
                    if let Some(record) = self.connections.get_mut(&key) {
                        record.state = match record.kind {
                            ConnectionKind::UdpPeer | ConnectionKind::UdpSender => {
                                ConnectionState::Closed
                            }
                            ConnectionKind::Tcp | ConnectionKind::Serial => {
                                ConnectionState::Reconnecting
                            }
                        };
                    }
                    self.routes.remove_connection(key);
                }
                RouterEvent::FrameReceived {
                    key,
                    version,
                    header,
                    message,
                    raw,
                } => {
                    self.metrics.record_received();
                    self.routes.learn(header.system_id, header.component_id, key);
                    if let Some(message) = message {
                        let frame = Frame::new(version, header, message, Some(key), raw);
                        self.dispatch(frame).await;
                    } else {
                        // unknown_message: still forward raw bytes, never decode-deliver.
                        self.forward_raw_except(key, &raw).await;
                    }
                }
                RouterEvent::FrameError { key, error } => {
                    debug!(?key, ?error, "frame error on connection");
                }
                RouterEvent::Send { message } => {
                    self.send_local(message).await;
                }
                RouterEvent::Subscribe { query, handle, reply } => {
                    let id = self.next_subscription_id;
                    self.next_subscription_id += 1;
                    // Replacing an identical query is a dedup per spec.md §3.
                    self.subscriptions.retain(|s| s.query != query);
                    subscription_cache::add(subscription_cache::CachedSubscription {
                        id,
                        query: query.clone(),
                    });
                    self.subscriptions.push(Subscription { id, query, handle });
                    let _ = reply.send(id);
                }
                RouterEvent::Unsubscribe { id } => {
                    self.subscriptions.retain(|s| s.id != id);
                    subscription_cache::remove(id);
                }
                RouterEvent::Shutdown => {
                    info!("router shutting down");
                    break;
                }
            }
        }
        self.connections.clear();
        self.routes.clear();
    }

    /// Assigns source/sequence to a locally originated message, then dispatches it exactly
    /// as if it had arrived from the pseudo-source `local` (spec.md §4.4 "Send").
    async fn send_local(&mut self, message: M) {
        let header = MavHeader {
            system_id: self.local_system,
            component_id: self.local_component,
            sequence: self.next_sequence,
        };
        self.next_sequence = (self.next_sequence + 1) % 255;

        let mut raw = Vec::new();
        if let Err(error) =
            mavlink_core::write_versioned_msg(&mut raw, MavlinkVersion::V2, header, &message)
        {
            warn!(?error, "failed to pack locally originated message");
            return;
        }
        let frame = Frame::new(MavlinkVersion::V2, header, message, None, raw);
        self.dispatch(frame).await;
    }

    async fn dispatch(&mut self, frame: Frame<M>) {
        self.deliver_to_subscribers(&frame);

        match frame.target {
            Target::Broadcast => {
                self.forward_raw_except(frame.source.unwrap_or(ConnectionKey::new(0)), &frame.raw)
                    .await;
            }
            _ => {
                let (target_system, target_component) = frame.target.as_query();
                let keys = self.routes.resolve(target_system, target_component);
                if keys.is_empty() {
                    // targeted-before-learned: silent drop, per spec.md §7.
                    return;
                }
                for key in keys {
                    if Some(key) == frame.source {
                        continue;
                    }
                    self.send_raw(key, &frame.raw).await;
                }
            }
        }
    }

    async fn forward_raw_except(&mut self, source: ConnectionKey, raw: &[u8]) {
        let targets: Vec<ConnectionKey> = self
            .connections
            .keys()
            .copied()
            .filter(|key| *key != source)
            .collect();
        for key in targets {
            self.send_raw(key, raw).await;
        }
    }

    async fn send_raw(&mut self, key: ConnectionKey, raw: &[u8]) {
        if let Some(sender) = self.outbound.get(&key) {
            if sender.send(raw.to_vec()).is_err() {
                warn!(?key, "outbound channel closed, dropping connection");
                self.connections.remove(&key);
                self.outbound.remove(&key);
                self.metrics.record_dropped();
            } else {
                self.metrics.record_routed(raw.len());
            }
        }
    }

    fn deliver_to_subscribers(&mut self, frame: &Frame<M>) {
        let mut dead = Vec::new();
        for subscription in &self.subscriptions {
            if !Subscription::matches(&subscription.query, frame) {
                continue;
            }
            let delivery = if subscription.query.as_frame {
                Delivery::Frame {
                    header: frame.header,
                    raw: frame.raw.clone(),
                }
            } else {
                Delivery::Message(frame.message.clone())
            };
            if subscription.handle.send(delivery).is_err() {
                dead.push(subscription.id);
            }
        }
        for id in dead {
            self.subscriptions.retain(|s| s.id != id);
            subscription_cache::remove(id);
        }
    }
}
