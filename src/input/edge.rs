//! Edge detection between consecutive tick snapshots

use super::snapshot::KeySnapshot;
use super::types::{EventKind, KeyId};

/// Keys that changed state between two ticks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEdges {
    /// `current \ previous`, in current-snapshot order
    pub pressed: Vec<KeyId>,
    /// `previous \ current`, in previous-snapshot order
    pub released: Vec<KeyId>,
}

impl KeyEdges {
    /// Check if no key changed state
    pub fn is_empty(&self) -> bool {
        self.pressed.is_empty() && self.released.is_empty()
    }

    /// Number of events this tick will fire
    pub fn len(&self) -> usize {
        self.pressed.len() + self.released.len()
    }

    /// All events in dispatch order: every press, then every release
    pub fn events(&self) -> impl Iterator<Item = (&KeyId, EventKind)> {
        self.pressed
            .iter()
            .map(|k| (k, EventKind::Pressed))
            .chain(self.released.iter().map(|k| (k, EventKind::Released)))
    }
}

/// Rolling previous/current snapshot pair
///
/// Only the previous snapshot is stored between ticks; the current one is
/// supplied to [`EdgeDetector::advance`] and becomes the previous afterwards.
#[derive(Debug, Clone, Default)]
pub struct EdgeDetector {
    previous: KeySnapshot,
}

impl EdgeDetector {
    /// Create a detector with no keys held
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys held as of the last tick
    pub fn previous(&self) -> &KeySnapshot {
        &self.previous
    }

    /// Diff this tick's snapshot against the previous one and roll forward
    ///
    /// An empty snapshot is an ordinary tick: every held key is released.
    /// `None` means capture was unavailable: the previous snapshot is cleared
    /// without emitting releases, so a key held when capture was lost neither
    /// fires a spurious release on resume nor stays recorded as pressed.
    pub fn advance(&mut self, current: Option<KeySnapshot>) -> KeyEdges {
        let Some(current) = current else {
            self.previous = KeySnapshot::new();
            return KeyEdges::default();
        };

        let pressed = current
            .iter()
            .filter(|key| !self.previous.contains(key))
            .cloned()
            .collect();
        let released = self
            .previous
            .iter()
            .filter(|key| !current.contains(key))
            .cloned()
            .collect();

        self.previous = current;
        KeyEdges { pressed, released }
    }

    /// Forget all held keys
    pub fn reset(&mut self) {
        self.previous = KeySnapshot::new();
    }
}
