use std::collections::BTreeMap;

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;
use wander_core::{ElementKind, Location, OsmTags, RawGeoElement};

use crate::{GeoDataError, GeoQueryProvider, TagFilter};

pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassResponseDto {
    #[serde(default)]
    pub(crate) elements: Vec<OverpassElementDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OverpassElementDto {
    #[serde(rename = "type")]
    element_type: String,
    id: i64,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenterDto>,
    #[serde(default)]
    tags: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct OverpassCenterDto {
    lat: f64,
    lon: f64,
}

impl OverpassResponseDto {
    /// Unknown element types (e.g. `area`) are skipped; missing coordinates are
    /// left for the classifier to report.
    pub(crate) fn into_elements(self) -> Vec<RawGeoElement> {
        self.elements
            .into_iter()
            .filter_map(OverpassElementDto::into_element)
            .collect()
    }
}

impl OverpassElementDto {
    fn into_element(self) -> Option<RawGeoElement> {
        let Some(kind) = ElementKind::parse(&self.element_type) else {
            debug!(element_type = %self.element_type, id = self.id, "skipping unsupported element type");
            return None;
        };

        let position = match (self.lat, self.lon) {
            (Some(latitude), Some(longitude)) => Some(Location {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Some(RawGeoElement {
            kind,
            id: self.id,
            position,
            center: self.center.map(|center| Location {
                latitude: center.lat,
                longitude: center.lon,
            }),
            tags: self.tags.into_iter().collect::<OsmTags>(),
        })
    }
}

fn filter_clause(filter: &TagFilter) -> String {
    let key = filter.key.replace('"', "");
    if filter.values.is_empty() {
        format!("[\"{key}\"]")
    } else {
        let pattern = filter
            .values
            .iter()
            .map(|value| value.replace(['"', '|'], ""))
            .collect::<Vec<_>>()
            .join("|");
        format!("[\"{key}\"~\"^({pattern})$\"]")
    }
}

/// Overpass QL union over node/way/relation for each filter, with centroids for
/// ways and relations.
pub fn build_overpass_query(location: Location, radius_m: u32, filters: &[TagFilter]) -> String {
    let around = format!(
        "(around:{},{},{})",
        radius_m, location.latitude, location.longitude
    );

    let mut statements = String::new();
    for filter in filters {
        let clause = filter_clause(filter);
        for element in ["node", "way", "relation"] {
            statements.push_str(&format!("  {element}{clause}{around};\n"));
        }
    }

    format!("[out:json];\n(\n{statements});\nout body center;\n")
}

#[derive(Clone)]
pub struct OverpassClient {
    http: Client,
    endpoint: Url,
}

impl OverpassClient {
    pub fn new(http: Client, endpoint: &str) -> Result<Self, GeoDataError> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl GeoQueryProvider for OverpassClient {
    async fn query(
        &self,
        location: Location,
        radius_m: u32,
        filters: &[TagFilter],
    ) -> Result<Vec<RawGeoElement>, GeoDataError> {
        let query = build_overpass_query(location, radius_m, filters);

        let response = self
            .http
            .post(self.endpoint.clone())
            .form(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeoDataError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: OverpassResponseDto = response
            .json()
            .await
            .map_err(|error| GeoDataError::Decode(error.to_string()))?;
        let elements = body.into_elements();
        debug!(radius_m, elements = elements.len(), "overpass query answered");
        Ok(elements)
    }
}
