use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;
use url::Url;
use wander_core::Location;

use crate::{EncyclopediaLookup, GeoDataError};

pub const DEFAULT_WIKIPEDIA_URL: &str = "https://en.wikipedia.org/w/api.php";

#[derive(Clone)]
pub struct WikipediaClient {
    http: Client,
    endpoint: Url,
}

impl WikipediaClient {
    pub fn new(http: Client, endpoint: &str) -> Result<Self, GeoDataError> {
        Ok(Self {
            http,
            endpoint: Url::parse(endpoint)?,
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: &[(&str, String)]) -> Result<T, GeoDataError> {
        let response = self
            .http
            .get(self.endpoint.clone())
            .query(params)
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

        response
            .json()
            .await
            .map_err(|error| GeoDataError::Decode(error.to_string()))
    }
}

pub(crate) fn first_geosearch_page(payload: &Value) -> Option<u64> {
    payload
        .get("query")?
        .get("geosearch")?
        .as_array()?
        .first()?
        .get("pageid")?
        .as_u64()
}

pub(crate) fn page_extract(payload: &Value, page_id: u64) -> Option<String> {
    payload
        .get("query")?
        .get("pages")?
        .get(page_id.to_string())?
        .get("extract")?
        .as_str()
        .map(ToString::to_string)
}

impl EncyclopediaLookup for WikipediaClient {
    async fn lookup(
        &self,
        location: Location,
        radius_m: u32,
    ) -> Result<Option<String>, GeoDataError> {
        let search: Value = self
            .get(&[
                ("action", "query".to_string()),
                ("list", "geosearch".to_string()),
                (
                    "gscoord",
                    format!("{}|{}", location.latitude, location.longitude),
                ),
                ("gsradius", radius_m.to_string()),
                ("gslimit", "1".to_string()),
                ("format", "json".to_string()),
            ])
            .await?;

        let Some(page_id) = first_geosearch_page(&search) else {
            debug!(
                latitude = location.latitude,
                longitude = location.longitude,
                "no encyclopedia page nearby"
            );
            return Ok(None);
        };

        let extract: Value = self
            .get(&[
                ("action", "query".to_string()),
                ("prop", "extracts".to_string()),
                ("exintro", String::new()),
                ("explaintext", String::new()),
                ("pageids", page_id.to_string()),
                ("format", "json".to_string()),
            ])
            .await?;

        Ok(Some(page_extract(&extract, page_id).unwrap_or_default()))
    }
}
