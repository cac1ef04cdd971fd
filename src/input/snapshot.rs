//! Per-tick set of keys the host reports as held down

use super::types::KeyId;

/// Immutable set of keys held down during one tick
///
/// Keeps the host's order (first occurrence wins). The lists are a handful of
/// entries, so membership is a linear scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    keys: Vec<KeyId>,
}

impl KeySnapshot {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from host key names, skipping names that fail to parse
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .filter_map(|name| KeyId::new(name.as_ref()).ok())
            .collect()
    }

    /// Check if a key is held in this snapshot
    pub fn contains(&self, key: &KeyId) -> bool {
        self.keys.contains(key)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyId> {
        self.keys.iter()
    }

    pub fn as_slice(&self) -> &[KeyId] {
        &self.keys
    }
}

impl FromIterator<KeyId> for KeySnapshot {
    fn from_iter<T: IntoIterator<Item = KeyId>>(iter: T) -> Self {
        let mut keys: Vec<KeyId> = Vec::new();
        for key in iter {
            // The wildcard is not a physical key
            if key.is_wildcard() || keys.contains(&key) {
                continue;
            }
            keys.push(key);
        }
        Self { keys }
    }
}

impl<'a> IntoIterator for &'a KeySnapshot {
    type Item = &'a KeyId;
    type IntoIter = std::slice::Iter<'a, KeyId>;

    fn into_iter(self) -> Self::IntoIter {
        self.keys.iter()
    }
}
