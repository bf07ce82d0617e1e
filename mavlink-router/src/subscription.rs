//! Local-consumer subscriptions: filter queries, matching, and delivered payloads.

use tokio::sync::mpsc;

use mavlink_core::Message;

use crate::frame::Frame;

/// A subscriber's filter. `0`/`None` on any field means wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionQuery {
    pub message_id: Option<u32>,
    pub source_system: u8,
    pub source_component: u8,
    pub target_system: u8,
    pub target_component: u8,
    /// Deliver the full frame (including raw bytes) rather than just the decoded message.
    pub as_frame: bool,
}

impl SubscriptionQuery {
    pub fn any() -> Self {
        Self {
            message_id: None,
            source_system: 0,
            source_component: 0,
            target_system: 0,
            target_component: 0,
            as_frame: false,
        }
    }
}

impl Default for SubscriptionQuery {
    fn default() -> Self {
        Self::any()
    }
}

/// What gets handed to a subscriber on a match.
#[derive(Debug, Clone)]
pub enum Delivery<M: Message> {
    Message(M),
    Frame { header: mavlink_core::MavHeader, raw: Vec<u8> },
}

/// A registered local consumer: its filter plus the channel used to hand deliveries to it.
/// The consumer end holds the matching `mpsc::UnboundedReceiver`; when it is dropped, `send`
/// on `handle` starts failing and the router treats that as consumer death.
pub struct Subscription<M: Message> {
    pub id: u64,
    pub query: SubscriptionQuery,
    pub handle: mpsc::UnboundedSender<Delivery<M>>,
}

impl<M: Message> Subscription<M> {
    /// True iff every non-wildcard field of `query` equals the frame's corresponding field,
    /// and the query's `message_id`, if set, equals the frame's message id.
    ///
    /// Target constraints only match frames whose target query is itself a wildcard on that
    /// axis (a broadcast frame), unless the subscription's own target fields are also 0 —
    /// i.e. a subscription asking for a specific target never matches a broadcast addressed
    /// to someone else, and a wildcard subscription matches everything.
    pub fn matches(query: &SubscriptionQuery, frame: &Frame<M>) -> bool {
        if let Some(want_id) = query.message_id {
            if want_id != frame.message.message_id() {
                return false;
            }
        }
        if query.source_system != 0 && query.source_system != frame.source_system() {
            return false;
        }
        if query.source_component != 0 && query.source_component != frame.source_component() {
            return false;
        }
        let (target_system, target_component) = frame.target.as_query();
        if query.target_system != 0 && query.target_system != target_system {
            return false;
        }
        if query.target_component != 0 && query.target_component != target_component {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavlink_core::{MavHeader, MavlinkVersion};

    // A minimal stand-in Message used only to exercise matching logic.
    #[derive(Debug, Clone)]
    struct Dummy {
        id: u32,
    }

    impl Message for Dummy {
        fn message_id(&self) -> u32 {
            self.id
        }
        fn message_name(&self) -> &'static str {
            "DUMMY"
        }
        fn ser(&self, _version: MavlinkVersion, _bytes: &mut [u8]) -> usize {
            0
        }
        fn parse(
            _version: MavlinkVersion,
            _msgid: u32,
            _payload: &[u8],
        ) -> Result<Self, mavlink_core::error::ParserError> {
            Ok(Dummy { id: 0 })
        }
        fn message_id_from_name(_name: &str) -> Option<u32> {
            None
        }
        fn default_message_from_id(_id: u32) -> Option<Self> {
            None
        }
        fn extra_crc(_id: u32) -> u8 {
            0
        }
    }

    fn frame(source_system: u8, source_component: u8) -> Frame<Dummy> {
        Frame::new(
            MavlinkVersion::V2,
            MavHeader {
                system_id: source_system,
                component_id: source_component,
                sequence: 0,
            },
            Dummy { id: 0 },
            None,
            Vec::new(),
        )
    }

    #[test]
    fn wildcard_query_matches_anything() {
        let query = SubscriptionQuery::any();
        assert!(Subscription::matches(&query, &frame(3, 1)));
    }

    #[test]
    fn non_zero_field_must_match_exactly() {
        let mut query = SubscriptionQuery::any();
        query.source_system = 3;
        assert!(Subscription::matches(&query, &frame(3, 1)));
        assert!(!Subscription::matches(&query, &frame(4, 1)));
    }

    #[test]
    fn replacing_a_field_with_wildcard_never_shrinks_the_match_set() {
        let mut specific = SubscriptionQuery::any();
        specific.source_system = 3;
        specific.source_component = 1;
        let mut wildcard = specific.clone();
        wildcard.source_component = 0;

        for f in [frame(3, 1), frame(3, 2), frame(3, 9)] {
            if Subscription::matches(&specific, &f) {
                assert!(Subscription::matches(&wildcard, &f));
            }
        }
    }
}
