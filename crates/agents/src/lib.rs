pub mod arrival;
pub mod config;
pub mod discovery;
pub mod orchestrator;
pub mod selector;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument};
use wander_core::{ArrivalReport, ArrivalSource, Location, Message, PointOfInterest, SelectionStrategy};
use wander_geodata::{Encyclopedia, EncyclopediaLookup, GeoQueryProvider, GeoSource};
use wander_observability::AppMetrics;
use wander_reasoning::{Reasoner, ReasoningService};

pub use arrival::ArrivalGuide;
pub use config::{DiscoveryConfig, GuideConfig, ReasonerKind};
pub use discovery::{Discovery, DiscoveryEngine};
pub use orchestrator::{GuideError, Narrative, NarrativeOrchestrator, NarrativeSource};
pub use selector::CandidateSelector;

pub type DefaultGuide = GuideAgent<GeoSource, Reasoner, Encyclopedia>;

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub geodata: &'static str,
    pub reasoning: &'static str,
    pub reasoning_model: Option<String>,
    pub encyclopedia: bool,
}

#[derive(Debug, Clone)]
pub struct Exploration {
    pub discovery: Discovery,
    /// `None` when discovery found nothing to narrate.
    pub narrative: Option<Narrative>,
}

pub struct GuideAgent<P, R, E> {
    discovery: DiscoveryEngine<P>,
    orchestrator: NarrativeOrchestrator<R>,
    arrival: ArrivalGuide<E>,
    capabilities: Capabilities,
    metrics: Arc<AppMetrics>,
}

impl DefaultGuide {
    pub fn from_config(config: &GuideConfig, metrics: Arc<AppMetrics>) -> Result<Self> {
        let http = config.build_http_client()?;
        let geo = config.build_geo_source(&http)?;
        let reasoner = config.build_reasoner(&http)?;
        let encyclopedia = config.build_encyclopedia(&http)?;

        let capabilities = Capabilities {
            geodata: geo.describe(),
            reasoning: reasoner.backend(),
            reasoning_model: reasoner.model().map(str::to_string),
            encyclopedia: encyclopedia.is_enabled(),
        };
        info!(
            geodata = capabilities.geodata,
            reasoning = capabilities.reasoning,
            encyclopedia = capabilities.encyclopedia,
            "guide configured"
        );

        Ok(GuideAgent::new(
            DiscoveryEngine::new(geo, config.discovery.clone()),
            NarrativeOrchestrator::new(Arc::new(reasoner), config.narrative_style.clone()),
            ArrivalGuide::new(encyclopedia, config.encyclopedia_radius_m),
            capabilities,
            metrics,
        ))
    }
}

impl<P, R, E> GuideAgent<P, R, E>
where
    P: GeoQueryProvider,
    R: ReasoningService,
    E: EncyclopediaLookup,
{
    pub fn new(
        discovery: DiscoveryEngine<P>,
        orchestrator: NarrativeOrchestrator<R>,
        arrival: ArrivalGuide<E>,
        capabilities: Capabilities,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            discovery,
            orchestrator,
            arrival,
            capabilities,
            metrics,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn metrics(&self) -> &Arc<AppMetrics> {
        &self.metrics
    }

    pub fn discovery_config(&self) -> &DiscoveryConfig {
        self.discovery.config()
    }

    #[instrument(skip(self), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn discover(&self, location: Location, initial_radius_m: Option<u32>) -> Discovery {
        let started = Instant::now();
        self.metrics.inc_request();

        let discovery = self.run_discovery(location, initial_radius_m).await;

        self.metrics.observe_latency(started.elapsed());
        info!(
            found = discovery.pois.len(),
            radius_m = ?discovery.radius_m,
            attempts = discovery.attempts,
            "discovery handled"
        );
        discovery
    }

    #[instrument(skip_all, fields(pois = pois.len(), turns = history.len()))]
    pub async fn story(
        &self,
        pois: &[PointOfInterest],
        history: &[Message],
    ) -> Result<Narrative, GuideError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let narrative = self.run_narrative(pois, history).await?;

        self.metrics.observe_latency(started.elapsed());
        info!(
            next = %narrative.story.next_destination.id,
            source = ?narrative.source,
            selection = ?narrative.selection,
            "story handled"
        );
        Ok(narrative)
    }

    #[instrument(skip(self, history), fields(lat = location.latitude, lon = location.longitude))]
    pub async fn explore(&self, location: Location, history: &[Message]) -> Exploration {
        let started = Instant::now();
        self.metrics.inc_request();

        let discovery = self.run_discovery(location, None).await;
        let narrative = if discovery.pois.is_empty() {
            None
        } else {
            self.run_narrative(&discovery.pois, history).await.ok()
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            found = discovery.pois.len(),
            narrated = narrative.is_some(),
            "exploration handled"
        );
        Exploration {
            discovery,
            narrative,
        }
    }

    #[instrument(skip_all, fields(poi = %poi.id))]
    pub async fn arrive(&self, poi: &PointOfInterest) -> ArrivalReport {
        let started = Instant::now();
        self.metrics.inc_request();

        let report = self.arrival.arrive(poi).await;
        if report.source != ArrivalSource::Encyclopedia {
            self.metrics.inc_encyclopedia_miss();
        }

        self.metrics.observe_latency(started.elapsed());
        info!(source = ?report.source, "arrival handled");
        report
    }

    async fn run_discovery(&self, location: Location, initial_radius_m: Option<u32>) -> Discovery {
        let discovery = self.discovery.discover(location, initial_radius_m).await;

        for _ in 0..discovery.attempts {
            self.metrics.inc_provider_call();
        }
        for _ in 0..discovery.provider_errors {
            self.metrics.inc_provider_error();
        }
        if discovery.pois.is_empty() {
            self.metrics.inc_empty_discovery();
        }
        discovery
    }

    async fn run_narrative(
        &self,
        pois: &[PointOfInterest],
        history: &[Message],
    ) -> Result<Narrative, GuideError> {
        let narrative = self.orchestrator.generate(pois, history).await?;

        if narrative.selection == SelectionStrategy::Fallback {
            self.metrics.inc_selector_fallback();
        }
        if narrative.source == NarrativeSource::Template {
            self.metrics.inc_narrative_fallback();
        }
        Ok(narrative)
    }
}
