//! Listener identity and attachment.
//!
//! Identity is keyed by (position id, event key) and survives render passes;
//! attachment is per node id. The two are deliberately separate: a node can
//! be replaced while its position's handler identity lives on, which is also
//! why re-registration must always detach-then-attach.

use crate::state::EventKey;
use dom::Id;
use std::collections::{HashMap, HashSet};

pub(crate) type HandlerId = u64;

#[derive(Default)]
pub(crate) struct ListenerTable {
    next_handler: HandlerId,
    by_position: HashMap<String, HashMap<EventKey, HandlerId>>,
    by_handler: HashMap<HandlerId, (String, EventKey)>,
    attached: HashMap<Id, Vec<HandlerId>>,
}

impl ListenerTable {
    /// Look up or lazily allocate the stable handler identity for
    /// (position, key).
    pub fn ensure_handler(&mut self, position_id: &str, key: &EventKey) -> HandlerId {
        let slot = self
            .by_position
            .entry(position_id.to_string())
            .or_default();
        if let Some(&handler) = slot.get(key) {
            return handler;
        }
        self.next_handler += 1;
        let handler = self.next_handler;
        slot.insert(key.clone(), handler);
        self.by_handler
            .insert(handler, (position_id.to_string(), key.clone()));
        handler
    }

    /// Detach-then-attach `handler` on `node`.
    pub fn attach(&mut self, node: Id, handler: HandlerId) {
        let slot = self.attached.entry(node).or_default();
        slot.retain(|&h| h != handler);
        slot.push(handler);
    }

    /// Drop every registration under `position_id` whose key is not in
    /// `fresh`, detaching from `node`. Returns how many were removed.
    pub fn sweep_position(
        &mut self,
        node: Id,
        position_id: &str,
        fresh: &HashSet<EventKey>,
    ) -> usize {
        let Some(slot) = self.by_position.get_mut(position_id) else {
            return 0;
        };

        let stale: Vec<(EventKey, HandlerId)> = slot
            .iter()
            .filter(|(key, _)| !fresh.contains(key))
            .map(|(key, &handler)| (key.clone(), handler))
            .collect();

        for (key, handler) in &stale {
            slot.remove(key);
            self.by_handler.remove(handler);
            let now_empty = match self.attached.get_mut(&node) {
                Some(attached) => {
                    attached.retain(|h| h != handler);
                    attached.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.attached.remove(&node);
            }
        }

        if slot.is_empty() {
            self.by_position.remove(position_id);
        }

        stale.len()
    }

    pub fn handlers_at(&self, node: Id) -> &[HandlerId] {
        self.attached.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn resolve(&self, handler: HandlerId) -> Option<&(String, EventKey)> {
        self.by_handler.get(&handler)
    }

    pub fn lookup(&self, position_id: &str, key: &EventKey) -> Option<HandlerId> {
        self.by_position.get(position_id)?.get(key).copied()
    }

    pub fn registered_count(&self) -> usize {
        self.by_handler.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::EventFlags;

    fn key(event_type: &str, capture: bool) -> EventKey {
        EventKey {
            event_type: event_type.to_string(),
            flags: EventFlags {
                capture,
                passive: false,
            },
        }
    }

    #[test]
    fn handler_identity_is_stable_across_registrations() {
        let mut table = ListenerTable::default();
        let a = table.ensure_handler("0.1.2", &key("click", false));
        let b = table.ensure_handler("0.1.2", &key("click", false));
        assert_eq!(a, b);
        let c = table.ensure_handler("0.1.2", &key("click", true));
        assert_ne!(a, c);
    }

    #[test]
    fn reattach_does_not_duplicate() {
        let mut table = ListenerTable::default();
        let h = table.ensure_handler("p", &key("input", false));
        let node = Id(7);
        table.attach(node, h);
        table.attach(node, h);
        assert_eq!(table.handlers_at(node), &[h]);
    }

    #[test]
    fn sweep_removes_only_stale_keys() {
        let mut table = ListenerTable::default();
        let node = Id(3);
        let keep = key("click", false);
        let drop = key("focus", false);
        let h_keep = table.ensure_handler("p", &keep);
        let h_drop = table.ensure_handler("p", &drop);
        table.attach(node, h_keep);
        table.attach(node, h_drop);

        let fresh = HashSet::from([keep.clone()]);
        assert_eq!(table.sweep_position(node, "p", &fresh), 1);
        assert_eq!(table.lookup("p", &keep), Some(h_keep));
        assert_eq!(table.lookup("p", &drop), None);
        assert_eq!(table.handlers_at(node), &[h_keep]);
        assert_eq!(table.registered_count(), 1);
    }

    #[test]
    fn sweeping_everything_drops_the_position_entry() {
        let mut table = ListenerTable::default();
        let node = Id(3);
        let h = table.ensure_handler("p", &key("click", false));
        table.attach(node, h);
        table.sweep_position(node, "p", &HashSet::new());
        assert_eq!(table.registered_count(), 0);
        assert!(table.handlers_at(node).is_empty());
        // A later registration allocates a new identity.
        let h2 = table.ensure_handler("p", &key("click", false));
        assert_ne!(h, h2);
    }
}
