//! Desired-state command values

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// GPIO line number on the relay daemon; globally unique per signal element
pub type SignalId = u8;

/// Full desired on/off state for a set of signal elements.
///
/// Built fresh by the controller for every command, always from a known
/// baseline; the daemon applies it idempotently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredState {
    pins: BTreeMap<SignalId, bool>,
}

impl DesiredState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, id: SignalId, on: bool) -> &mut Self {
        self.pins.insert(id, on);
        self
    }

    pub fn get(&self, id: SignalId) -> Option<bool> {
        self.pins.get(&id).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SignalId, bool)> + '_ {
        self.pins.iter().map(|(&id, &on)| (id, on))
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Ids currently commanded on
    pub fn active(&self) -> impl Iterator<Item = SignalId> + '_ {
        self.pins
            .iter()
            .filter(|(_, &on)| on)
            .map(|(&id, _)| id)
    }
}

impl FromIterator<(SignalId, bool)> for DesiredState {
    fn from_iter<I: IntoIterator<Item = (SignalId, bool)>>(iter: I) -> Self {
        Self {
            pins: iter.into_iter().collect(),
        }
    }
}

// Wire form expected by the daemon: {"18": 1, "23": 0, ...}
impl Serialize for DesiredState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pins.len()))?;
        for (id, on) in &self.pins {
            map.serialize_entry(&id.to_string(), &u8::from(*on))?;
        }
        map.end()
    }
}

/// Request body for the daemon's `POST /set_pin`
#[derive(Debug, Serialize)]
pub struct SetPinRequest<'a> {
    pub pins: &'a DesiredState,
}
