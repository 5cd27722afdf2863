use std::time::Duration;

use tracing::{debug, info, warn};
use wander_core::{classify_and_filter, Location, PointOfInterest};
use wander_geodata::{GeoQueryProvider, TagFilter};

use crate::config::DiscoveryConfig;

pub const TOURISM_VALUES: &[&str] = &["museum", "attraction", "viewpoint", "gallery", "zoo"];

pub fn discovery_filters() -> Vec<TagFilter> {
    vec![
        TagFilter::any("historic"),
        TagFilter::one_of("tourism", TOURISM_VALUES),
    ]
}

#[derive(Debug, Clone, Default)]
pub struct Discovery {
    pub pois: Vec<PointOfInterest>,
    /// Radius that produced `pois`, if any attempt did.
    pub radius_m: Option<u32>,
    pub attempts: usize,
    pub provider_errors: usize,
    pub timed_out: bool,
}

pub struct DiscoveryEngine<P> {
    provider: P,
    config: DiscoveryConfig,
}

impl<P> DiscoveryEngine<P>
where
    P: GeoQueryProvider,
{
    pub fn new(provider: P, config: DiscoveryConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Never fails: provider errors advance to the next radius and an empty
    /// result means nothing was found up to the ceiling.
    pub async fn discover(&self, location: Location, initial_radius_m: Option<u32>) -> Discovery {
        let initial = initial_radius_m.unwrap_or(self.config.initial_radius_m);

        match self.config.deadline {
            Some(deadline) => self.discover_with_deadline(location, initial, deadline).await,
            None => self.expand(location, initial).await,
        }
    }

    async fn discover_with_deadline(
        &self,
        location: Location,
        initial: u32,
        deadline: Duration,
    ) -> Discovery {
        match tokio::time::timeout(deadline, self.expand(location, initial)).await {
            Ok(discovery) => discovery,
            Err(_) => {
                warn!(deadline_ms = deadline.as_millis() as u64, "discovery deadline elapsed");
                Discovery {
                    timed_out: true,
                    ..Discovery::default()
                }
            }
        }
    }

    async fn expand(&self, location: Location, initial: u32) -> Discovery {
        let filters = discovery_filters();
        let mut discovery = Discovery::default();

        let schedule = self.config.radius_schedule(initial);
        if schedule.is_empty() {
            warn!(
                radius_m = initial,
                max_radius_m = self.config.max_radius_m,
                "initial radius exceeds the ceiling, not querying"
            );
            return discovery;
        }

        for radius in schedule {
            discovery.attempts += 1;
            debug!(radius_m = radius, "searching for points of interest");

            let elements = match self.provider.query(location, radius, &filters).await {
                Ok(elements) => elements,
                Err(error) => {
                    discovery.provider_errors += 1;
                    warn!(radius_m = radius, error = %error, "geospatial query failed, expanding radius");
                    continue;
                }
            };

            discovery.pois = classify_and_filter(location, &elements);
            if !discovery.pois.is_empty() {
                discovery.radius_m = Some(radius);
                info!(
                    radius_m = radius,
                    found = discovery.pois.len(),
                    raw = elements.len(),
                    "points of interest found"
                );
                return discovery;
            }
        }

        info!(attempts = discovery.attempts, "no points of interest nearby");
        discovery
    }
}
