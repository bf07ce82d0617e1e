//! The runtime frame type the router operates on: a decoded message plus the routing
//! metadata derived from it, and the raw encoded bytes cached for zero-copy forwarding.

use mavlink_core::{MavHeader, MavlinkVersion, Message};

use crate::connection::ConnectionKey;

/// Where a frame is headed, derived once at validation time from whether the message is
/// targeted and whether its target fields are non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Broadcast,
    System(u8),
    Component(u8),
    SystemComponent(u8, u8),
}

impl Target {
    /// Classifies a message's destination from its (possibly absent) target fields.
    ///
    /// A message with no `target_system`/`target_component` fields at all, or with both
    /// present but zero, is a broadcast. Otherwise it is targeted to whichever of the two
    /// fields is non-zero (0 stays a wildcard on that axis).
    pub fn from_fields(target_system: Option<u8>, target_component: Option<u8>) -> Self {
        match (target_system, target_component) {
            (None, None) => Target::Broadcast,
            (Some(0), None) | (None, Some(0)) | (Some(0), Some(0)) => Target::Broadcast,
            (Some(sys), None) | (Some(sys), Some(0)) => Target::System(sys),
            (None, Some(comp)) | (Some(0), Some(comp)) => Target::Component(comp),
            (Some(sys), Some(comp)) => Target::SystemComponent(sys, comp),
        }
    }

    pub fn is_broadcast(self) -> bool {
        matches!(self, Target::Broadcast)
    }

    /// The `(system_id, component_id)` wildcard query this target implies for a route-table
    /// lookup. `0` on either axis means "any".
    pub fn as_query(self) -> (u8, u8) {
        match self {
            Target::Broadcast => (0, 0),
            Target::System(sys) => (sys, 0),
            Target::Component(comp) => (0, comp),
            Target::SystemComponent(sys, comp) => (sys, comp),
        }
    }
}

/// A single validated MAVLink frame flowing through the router.
#[derive(Debug, Clone)]
pub struct Frame<M: Message> {
    pub version: MavlinkVersion,
    pub header: MavHeader,
    pub message: M,
    pub target: Target,
    /// The connection the frame arrived on, or `None` for locally originated frames.
    pub source: Option<ConnectionKey>,
    /// The exact bytes as received (or as packed, for local origin), cached so that
    /// forwarding an unrecognized or already-decoded message never re-serializes it.
    pub raw: Vec<u8>,
}

impl<M: Message> Frame<M> {
    pub fn new(
        version: MavlinkVersion,
        header: MavHeader,
        message: M,
        source: Option<ConnectionKey>,
        raw: Vec<u8>,
    ) -> Self {
        let target = Target::from_fields(message.target_system_id(), message.target_component_id());
        Self {
            version,
            header,
            message,
            target,
            source,
            raw,
        }
    }

    pub fn source_system(&self) -> u8 {
        self.header.system_id
    }

    pub fn source_component(&self) -> u8 {
        self.header.component_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_when_no_target_fields() {
        assert_eq!(Target::from_fields(None, None), Target::Broadcast);
    }

    #[test]
    fn broadcast_when_targets_zero() {
        assert_eq!(Target::from_fields(Some(0), Some(0)), Target::Broadcast);
    }

    #[test]
    fn targeted_system_component() {
        assert_eq!(
            Target::from_fields(Some(2), Some(1)),
            Target::SystemComponent(2, 1)
        );
        assert_eq!(Target::SystemComponent(2, 1).as_query(), (2, 1));
    }

    #[test]
    fn wildcard_component_axis() {
        assert_eq!(Target::from_fields(Some(2), Some(0)), Target::System(2));
        assert_eq!(Target::System(2).as_query(), (2, 0));
    }
}
