use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::fingerprint::SignalSnapshot;

/// Body of the emergency and nurse-call requests.
#[derive(Debug, Serialize)]
pub struct IdentifierPayload<'a> {
    pub ssid: &'a str,
}

/// Fingerprint body: `{"location1": {...}, "location2": {...}, ...}`,
/// most recent snapshot first.
#[derive(Debug)]
pub struct LocationPayload<'a>(pub &'a [SignalSnapshot]);

impl Serialize for LocationPayload<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (i, snapshot) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("location{}", i + 1), snapshot)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientRegistration {
    pub name: String,
    pub birth: String,
    pub ssid: String,
}
