use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidLocation {
    #[error("coordinates must be finite numbers")]
    NonFinite,
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidLocation> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(InvalidLocation::NonFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidLocation::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidLocation::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Re-checks a value that arrived through deserialization.
    pub fn validated(self) -> Result<Self, InvalidLocation> {
        Self::new(self.latitude, self.longitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

impl ElementKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "node" | "n" => Some(Self::Node),
            "way" | "w" => Some(Self::Way),
            "relation" | "r" | "rel" => Some(Self::Relation),
            _ => None,
        }
    }

    pub fn as_code(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Way => "way",
            Self::Relation => "relation",
        }
    }
}

/// Tag keys that can name a POI category, in priority order.
pub const CATEGORY_KEYS: [&str; 8] = [
    "shop", "tourism", "amenity", "historic", "leisure", "natural", "man_made", "memorial",
];

/// Open-ended OSM tag bag. Empty values read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OsmTags(BTreeMap<String, String>);

impl OsmTags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    pub fn operator(&self) -> Option<&str> {
        self.get("operator")
    }

    pub fn building(&self) -> Option<&str> {
        self.get("building")
    }

    pub fn residential(&self) -> Option<&str> {
        self.get("residential")
    }

    pub fn amenity(&self) -> Option<&str> {
        self.get("amenity")
    }

    /// First category tag present, as `(key, value)`.
    pub fn category(&self) -> Option<(&'static str, &str)> {
        CATEGORY_KEYS
            .iter()
            .find_map(|key| self.get(key).map(|value| (*key, value)))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for OsmTags {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawGeoElement {
    pub kind: ElementKind,
    pub id: i64,
    pub position: Option<Location>,
    pub center: Option<Location>,
    #[serde(default)]
    pub tags: OsmTags,
}

impl RawGeoElement {
    /// Direct coordinate first, centroid second. Non-finite values count as missing.
    pub fn coordinate(&self) -> Option<Location> {
        [self.position, self.center]
            .into_iter()
            .flatten()
            .find(|loc| loc.latitude.is_finite() && loc.longitude.is_finite())
    }

    pub fn poi_id(&self) -> String {
        format!("{}/{}", self.kind.as_code(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PointOfInterest {
    pub fn location(&self) -> Location {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }

    /// Rounded meters for display; unknown distances read as 0.
    pub fn distance_label(&self) -> u64 {
        self.distance.unwrap_or(0.0).max(0.0).round() as u64
    }

    /// Shape check for POIs supplied by callers rather than by discovery.
    pub fn is_well_formed(&self) -> bool {
        !self.id.trim().is_empty()
            && !self.name.trim().is_empty()
            && Location::new(self.latitude, self.longitude).is_ok()
            && self.distance.map_or(true, |d| d.is_finite() && d >= 0.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryResponse {
    #[serde(rename = "selectedPOIs")]
    pub selected_pois: Vec<PointOfInterest>,
    pub story: String,
    #[serde(rename = "nextDestination")]
    pub next_destination: PointOfInterest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrivalSource {
    Encyclopedia,
    NotFound,
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalReport {
    pub poi: PointOfInterest,
    pub message: String,
    pub source: ArrivalSource,
}
