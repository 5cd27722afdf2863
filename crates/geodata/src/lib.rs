mod fixture;
mod overpass;
mod wikipedia;

use thiserror::Error;
use wander_core::{Location, RawGeoElement};

pub use fixture::FixtureGeoSource;
pub use overpass::{build_overpass_query, OverpassClient, DEFAULT_OVERPASS_URL};
pub use wikipedia::{WikipediaClient, DEFAULT_WIKIPEDIA_URL};

#[derive(Debug, Error)]
pub enum GeoDataError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode provider response: {0}")]
    Decode(String),
    #[error("fixture {path}: {message}")]
    Fixture { path: String, message: String },
    #[error("invalid endpoint url: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("lookup disabled")]
    Disabled,
}

/// Tag predicate for a geospatial query. An empty `values` list matches any value;
/// otherwise the tag must equal one of `values` exactly. The Overpass query anchors
/// its pattern so both providers admit the same elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub values: Vec<String>,
}

impl TagFilter {
    pub fn any(key: &str) -> Self {
        Self {
            key: key.to_string(),
            values: Vec::new(),
        }
    }

    pub fn one_of(key: &str, values: &[&str]) -> Self {
        Self {
            key: key.to_string(),
            values: values.iter().map(|value| value.to_string()).collect(),
        }
    }

    pub fn matches(&self, element: &RawGeoElement) -> bool {
        match element.tags.get(&self.key) {
            Some(value) => self.values.is_empty() || self.values.iter().any(|v| v == value),
            None => false,
        }
    }
}

pub trait GeoQueryProvider: Send + Sync {
    async fn query(
        &self,
        location: Location,
        radius_m: u32,
        filters: &[TagFilter],
    ) -> Result<Vec<RawGeoElement>, GeoDataError>;
}

pub trait EncyclopediaLookup: Send + Sync {
    /// `Ok(None)` when nothing is indexed near `location`.
    async fn lookup(&self, location: Location, radius_m: u32)
        -> Result<Option<String>, GeoDataError>;
}

#[derive(Clone)]
pub enum GeoSource {
    Overpass(OverpassClient),
    Fixture(FixtureGeoSource),
}

impl GeoSource {
    pub fn describe(&self) -> &'static str {
        match self {
            GeoSource::Overpass(_) => "overpass",
            GeoSource::Fixture(_) => "fixture",
        }
    }
}

impl GeoQueryProvider for GeoSource {
    async fn query(
        &self,
        location: Location,
        radius_m: u32,
        filters: &[TagFilter],
    ) -> Result<Vec<RawGeoElement>, GeoDataError> {
        match self {
            GeoSource::Overpass(source) => source.query(location, radius_m, filters).await,
            GeoSource::Fixture(source) => source.query(location, radius_m, filters).await,
        }
    }
}

#[derive(Clone)]
pub enum Encyclopedia {
    Wikipedia(WikipediaClient),
    Disabled,
}

impl Encyclopedia {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Encyclopedia::Disabled)
    }
}

impl EncyclopediaLookup for Encyclopedia {
    async fn lookup(
        &self,
        location: Location,
        radius_m: u32,
    ) -> Result<Option<String>, GeoDataError> {
        match self {
            Encyclopedia::Wikipedia(client) => client.lookup(location, radius_m).await,
            Encyclopedia::Disabled => Err(GeoDataError::Disabled),
        }
    }
}
