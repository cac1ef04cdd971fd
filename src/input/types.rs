//! Core types for the input system: KeyId, EventKind, EventFilter, InputContext

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::error::InputError;

/// Host spellings that mean "any key"
const WILDCARD_ALIASES: [&str; 4] = ["ANY", "ANY_KEY", "ANYKEY", "*"];

/// A case-normalized key name, or the wildcard matching every key
///
/// Two ids compare equal when their names match ignoring ASCII case. The
/// spelling first supplied is kept for display.
#[derive(Clone)]
pub struct KeyId(Repr);

#[derive(Clone)]
enum Repr {
    Any,
    Named {
        canonical: Arc<str>,
        display: Arc<str>,
    },
}

impl KeyId {
    /// The wildcard: bindings on it receive every key's events
    pub const ANY: KeyId = KeyId(Repr::Any);

    /// Parse a host key name
    ///
    /// Whitespace is trimmed. `ANY`, `ANY_KEY`, `ANYKEY` and `*` (any case)
    /// produce [`KeyId::ANY`].
    pub fn new(name: &str) -> Result<Self, InputError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(InputError::InvalidKey(name.to_string()));
        }

        let canonical = trimmed.to_ascii_uppercase();
        if WILDCARD_ALIASES.contains(&canonical.as_str()) {
            return Ok(KeyId::ANY);
        }

        Ok(KeyId(Repr::Named {
            canonical: canonical.into(),
            display: trimmed.into(),
        }))
    }

    /// Check if this is the wildcard
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        matches!(self.0, Repr::Any)
    }

    /// Uppercased name used for comparison
    pub fn canonical(&self) -> &str {
        match &self.0 {
            Repr::Any => "ANY",
            Repr::Named { canonical, .. } => canonical,
        }
    }

    /// Name as the host spelled it
    pub fn as_str(&self) -> &str {
        match &self.0 {
            Repr::Any => "ANY",
            Repr::Named { display, .. } => display,
        }
    }
}

impl PartialEq for KeyId {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (Repr::Any, Repr::Any) => true,
            (Repr::Named { canonical: a, .. }, Repr::Named { canonical: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyId {}

impl Hash for KeyId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.is_wildcard().hash(state);
        self.canonical().hash(state);
    }
}

impl Ord for KeyId {
    fn cmp(&self, other: &Self) -> Ordering {
        // Wildcard sorts first
        other
            .is_wildcard()
            .cmp(&self.is_wildcard())
            .then_with(|| self.canonical().cmp(other.canonical()))
    }
}

impl PartialOrd for KeyId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for KeyId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        KeyId::new(s)
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Any => f.write_str("KeyId::ANY"),
            Repr::Named { display, .. } => write!(f, "KeyId({:?})", display),
        }
    }
}

impl Serialize for KeyId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// An edge transition of a key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Pressed,
    Released,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Pressed => f.pad("Pressed"),
            EventKind::Released => f.pad("Released"),
        }
    }
}

/// Restricts a binding to one kind of transition
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EventFilter {
    Pressed,
    Released,
    /// Matches both kinds
    #[default]
    Any,
}

impl EventFilter {
    /// Check if an event of this kind passes the filter
    #[inline]
    pub fn matches(self, kind: EventKind) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Pressed => kind == EventKind::Pressed,
            EventFilter::Released => kind == EventKind::Released,
        }
    }
}

impl From<EventKind> for EventFilter {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::Pressed => EventFilter::Pressed,
            EventKind::Released => EventFilter::Released,
        }
    }
}

/// Which input stack produced an event
///
/// Only the raw-hook path distinguishes contexts; the tick path polls the
/// player's gameplay input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputContext {
    #[default]
    Gameplay,
    Menu,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_case_insensitive() {
        let a = KeyId::new("LeftMouseButton").unwrap();
        let b = KeyId::new("leftmousebutton").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.canonical(), "LEFTMOUSEBUTTON");
        assert_eq!(a.as_str(), "LeftMouseButton");
    }

    #[test]
    fn test_key_trimmed() {
        let key = KeyId::new("  F1 ").unwrap();
        assert_eq!(key.as_str(), "F1");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(KeyId::new("   "), Err(InputError::InvalidKey(_))));
    }

    #[test]
    fn test_wildcard_aliases() {
        for name in ["ANY", "any_key", "AnyKey", "*"] {
            assert!(KeyId::new(name).unwrap().is_wildcard(), "{}", name);
        }
        assert!(!KeyId::new("ANYTHING").unwrap().is_wildcard());
    }

    #[test]
    fn test_wildcard_sorts_first() {
        let mut keys = vec![
            KeyId::new("B").unwrap(),
            KeyId::ANY,
            KeyId::new("a").unwrap(),
        ];
        keys.sort();
        assert!(keys[0].is_wildcard());
        assert_eq!(keys[1].as_str(), "a");
    }

    #[test]
    fn test_filter_matches() {
        assert!(EventFilter::Any.matches(EventKind::Pressed));
        assert!(EventFilter::Any.matches(EventKind::Released));
        assert!(EventFilter::Pressed.matches(EventKind::Pressed));
        assert!(!EventFilter::Pressed.matches(EventKind::Released));
        assert!(!EventFilter::Released.matches(EventKind::Pressed));
    }
}
