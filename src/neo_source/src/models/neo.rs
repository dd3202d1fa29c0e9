//! Canonical in-memory representation of one near-Earth object as returned by NeoWs.
//!
//! Only the fields the sync engine inspects are typed. The upstream JSON object is
//! kept exactly as received and is what gets stored, so absent keys stay absent
//! and explicit `null`s stay `null`.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};

/// A single near-Earth object (asteroid) from the `browse` endpoint.
///
/// The typed fields are a read view over [`NeoObject::payload`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub struct NeoObject {
    /// Stable NASA identifier of the physical object. This is the logical id.
    pub neo_reference_id: String,

    /// Display name, e.g. `"433 Eros (A898 PA)"`.
    pub name: String,

    /// Orbit solution metadata. Missing on some malformed upstream rows.
    pub orbital_data: Option<OrbitalData>,

    /// Historic and predicted close approaches.
    pub close_approach_data: Vec<CloseApproach>,

    payload: Value,
}

/// The `orbital_data` block of a [`NeoObject`].
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct OrbitalData {
    /// When the orbit solution was computed (`"%Y-%m-%d %H:%M:%S"`).
    ///
    /// This is the change-detection key: a new value means a new snapshot.
    #[serde(default)]
    pub orbit_determination_date: Option<String>,
}

/// One entry of `close_approach_data`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CloseApproach {
    /// Full approach timestamp (`"%Y-%b-%d %H:%M"`, e.g. `"2025-Jan-01 12:00"`).
    #[serde(default)]
    pub close_approach_date_full: Option<String>,
}

#[derive(Deserialize)]
struct TypedView {
    neo_reference_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    orbital_data: Option<OrbitalData>,
    #[serde(default)]
    close_approach_data: Option<Vec<CloseApproach>>,
}

impl TryFrom<Value> for NeoObject {
    type Error = serde_json::Error;

    fn try_from(payload: Value) -> Result<Self, Self::Error> {
        let view = TypedView::deserialize(&payload)?;
        Ok(Self {
            neo_reference_id: view.neo_reference_id,
            name: view.name.unwrap_or_default(),
            orbital_data: view.orbital_data,
            close_approach_data: view.close_approach_data.unwrap_or_default(),
            payload,
        })
    }
}

impl Serialize for NeoObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.payload.serialize(serializer)
    }
}

impl NeoObject {
    /// Builds a minimal object; mostly useful for tests and fixtures.
    pub fn new(
        neo_reference_id: impl Into<String>,
        name: impl Into<String>,
        orbit_determination_date: Option<&str>,
    ) -> Self {
        let neo_reference_id = neo_reference_id.into();
        let name = name.into();
        let payload = json!({
            "neo_reference_id": neo_reference_id,
            "name": name,
            "orbital_data": { "orbit_determination_date": orbit_determination_date },
        });
        Self {
            neo_reference_id,
            name,
            orbital_data: Some(OrbitalData {
                orbit_determination_date: orbit_determination_date.map(str::to_string),
            }),
            close_approach_data: Vec::new(),
            payload,
        }
    }

    /// The change-detection key, if the upstream row carries one.
    pub fn orbit_determination_date(&self) -> Option<&str> {
        self.orbital_data
            .as_ref()
            .and_then(|o| o.orbit_determination_date.as_deref())
    }

    /// The upstream object as received.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Serializes the object back into the JSON document that gets stored.
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.payload)
    }
}
