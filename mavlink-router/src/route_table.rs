//! The `(system_id, component_id) -> connection` mapping learned from observed traffic.

use std::collections::HashMap;

use crate::connection::ConnectionKey;

/// Maps a MAVLink source `(system_id, component_id)` to the connection it was last seen
/// arriving on. Wildcard `0` is never stored as a key — it is query-only.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<(u8, u8), ConnectionKey>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records (or overwrites) the connection a `(system_id, component_id)` source was
    /// last observed on.
    pub fn learn(&mut self, system_id: u8, component_id: u8, connection: ConnectionKey) {
        self.routes.insert((system_id, component_id), connection);
    }

    /// Resolves a `(target_system, target_component)` query (0 = wildcard on either axis)
    /// to the set of connection keys that should receive the frame, deduplicated.
    pub fn resolve(&self, target_system: u8, target_component: u8) -> Vec<ConnectionKey> {
        let mut matches: Vec<ConnectionKey> = self
            .routes
            .iter()
            .filter(|((sys, comp), _)| {
                (target_system == 0 || *sys == target_system)
                    && (target_component == 0 || *comp == target_component)
            })
            .map(|(_, key)| *key)
            .collect();
        matches.sort_unstable();
        matches.dedup();
        matches
    }

    pub fn remove_connection(&mut self, connection: ConnectionKey) {
        self.routes.retain(|_, v| *v != connection);
    }

    pub fn clear(&mut self) {
        self.routes.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionKey;

    #[test]
    fn learns_and_overwrites_most_recent_source() {
        let mut table = RouteTable::new();
        let a = ConnectionKey::new(1);
        let b = ConnectionKey::new(2);

        table.learn(1, 1, a);
        assert_eq!(table.resolve(1, 1), vec![a]);

        table.learn(1, 1, b);
        assert_eq!(table.resolve(1, 1), vec![b]);
    }

    #[test]
    fn wildcard_query_matches_all_components_of_a_system() {
        let mut table = RouteTable::new();
        let a = ConnectionKey::new(1);
        let b = ConnectionKey::new(2);
        table.learn(1, 1, a);
        table.learn(1, 2, b);

        let mut resolved = table.resolve(1, 0);
        resolved.sort_unstable();
        let mut expected = vec![a, b];
        expected.sort_unstable();
        assert_eq!(resolved, expected);
    }

    #[test]
    fn unknown_target_resolves_to_empty() {
        let table = RouteTable::new();
        assert!(table.resolve(9, 9).is_empty());
    }
}
