use std::fs;
use std::path::Path;
use std::sync::Arc;

use wander_core::{distance_between, Location, RawGeoElement};

use crate::overpass::OverpassResponseDto;
use crate::{GeoDataError, GeoQueryProvider, TagFilter};

/// Offline provider backed by a saved Overpass JSON response. Answers queries
/// by radius and tag filter so the discovery loop behaves as it would online.
#[derive(Clone, Debug)]
pub struct FixtureGeoSource {
    elements: Arc<Vec<RawGeoElement>>,
}

impl FixtureGeoSource {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GeoDataError> {
        let path = path.as_ref();
        let fixture_error = |message: String| GeoDataError::Fixture {
            path: path.display().to_string(),
            message,
        };

        let raw = fs::read_to_string(path).map_err(|error| fixture_error(error.to_string()))?;
        Self::from_json(&raw).map_err(|error| fixture_error(error.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, GeoDataError> {
        let dto: OverpassResponseDto =
            serde_json::from_str(raw).map_err(|error| GeoDataError::Decode(error.to_string()))?;
        Ok(Self::from_elements(dto.into_elements()))
    }

    pub fn from_elements(elements: Vec<RawGeoElement>) -> Self {
        Self {
            elements: Arc::new(elements),
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl GeoQueryProvider for FixtureGeoSource {
    async fn query(
        &self,
        location: Location,
        radius_m: u32,
        filters: &[TagFilter],
    ) -> Result<Vec<RawGeoElement>, GeoDataError> {
        Ok(self
            .elements
            .iter()
            .filter(|element| {
                element
                    .coordinate()
                    .map(|coordinate| distance_between(location, coordinate) <= f64::from(radius_m))
                    .unwrap_or(false)
            })
            .filter(|element| filters.is_empty() || filters.iter().any(|f| f.matches(element)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "elements": [
            {"type": "node", "id": 1, "lat": 51.2200, "lon": 4.4025, "tags": {"name": "Near", "historic": "monument"}},
            {"type": "node", "id": 2, "lat": 51.2400, "lon": 4.4025, "tags": {"name": "Far", "historic": "ruins"}},
            {"type": "node", "id": 3, "lat": 51.2201, "lon": 4.4025, "tags": {"name": "Shop", "shop": "bakery"}}
        ]
    }"#;

    #[tokio::test]
    async fn answers_by_radius_and_tag() {
        let source = FixtureGeoSource::from_json(FIXTURE).unwrap();
        let origin = Location {
            latitude: 51.2194,
            longitude: 4.4025,
        };
        let filters = [TagFilter::any("historic")];

        let near = source.query(origin, 500, &filters).await.unwrap();
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].id, 1);

        let wide = source.query(origin, 5_000, &filters).await.unwrap();
        assert_eq!(wide.len(), 2);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let error = FixtureGeoSource::from_path("/nonexistent/fixture.json").unwrap_err();
        assert!(error.to_string().contains("/nonexistent/fixture.json"));
    }
}
