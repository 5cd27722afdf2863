use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::info;
use wander_geodata::{
    Encyclopedia, FixtureGeoSource, GeoSource, OverpassClient, WikipediaClient,
    DEFAULT_OVERPASS_URL, DEFAULT_WIKIPEDIA_URL,
};
use wander_reasoning::{
    GeminiClient, OpenAiClient, Reasoner, DEFAULT_GEMINI_MODEL, DEFAULT_GEMINI_URL,
    DEFAULT_OPENAI_MODEL, DEFAULT_OPENAI_URL,
};

pub const DEFAULT_INITIAL_RADIUS_M: u32 = 500;
pub const DEFAULT_RADIUS_STEP_M: u32 = 900;
pub const DEFAULT_MAX_RADIUS_M: u32 = 5_000;
pub const DEFAULT_ENCYCLOPEDIA_RADIUS_M: u32 = 500;

const USER_AGENT: &str = concat!("wander-guide/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub initial_radius_m: u32,
    pub radius_step_m: u32,
    pub max_radius_m: u32,
    pub deadline: Option<Duration>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            initial_radius_m: DEFAULT_INITIAL_RADIUS_M,
            radius_step_m: DEFAULT_RADIUS_STEP_M,
            max_radius_m: DEFAULT_MAX_RADIUS_M,
            deadline: None,
        }
    }
}

impl DiscoveryConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            initial_radius_m: env_parse("WANDER_INITIAL_RADIUS_M")
                .filter(|radius: &u32| *radius > 0)
                .unwrap_or(defaults.initial_radius_m),
            radius_step_m: env_parse("WANDER_RADIUS_STEP_M")
                .filter(|step: &u32| *step > 0)
                .unwrap_or(defaults.radius_step_m),
            max_radius_m: env_parse("WANDER_MAX_RADIUS_M").unwrap_or(defaults.max_radius_m),
            deadline: env_parse("WANDER_DISCOVERY_DEADLINE_SECONDS").map(Duration::from_secs),
        }
    }

    /// Radii tried in order: `initial, initial + step, ...` while at or below the
    /// ceiling. Empty when the initial radius is already past it.
    pub fn radius_schedule(&self, initial_radius_m: u32) -> Vec<u32> {
        let step = self.radius_step_m.max(1);
        let mut radii = Vec::new();
        let mut radius = Some(initial_radius_m);
        while let Some(current) = radius.filter(|r| *r <= self.max_radius_m) {
            radii.push(current);
            radius = current.checked_add(step);
        }
        radii
    }

    pub fn accepts_initial_radius(&self, radius_m: u32) -> bool {
        radius_m > 0 && radius_m <= self.max_radius_m
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonerKind {
    Gemini,
    OpenAi,
    Off,
}

impl ReasonerKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "gemini" | "google" => Some(Self::Gemini),
            "openai" | "open_ai" => Some(Self::OpenAi),
            "off" | "none" | "disabled" | "local" => Some(Self::Off),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct GuideConfig {
    pub discovery: DiscoveryConfig,
    pub narrative_style: Option<String>,
    pub http_timeout: Duration,
    pub overpass_url: String,
    pub geo_fixture: Option<PathBuf>,
    pub wikipedia_url: String,
    pub encyclopedia_enabled: bool,
    pub encyclopedia_radius_m: u32,
    pub reasoner: ReasonerKind,
    pub gemini_url: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_url: String,
    pub openai_api_key: Option<String>,
    pub openai_model: String,
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            narrative_style: None,
            http_timeout: Duration::from_secs(20),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            geo_fixture: None,
            wikipedia_url: DEFAULT_WIKIPEDIA_URL.to_string(),
            encyclopedia_enabled: true,
            encyclopedia_radius_m: DEFAULT_ENCYCLOPEDIA_RADIUS_M,
            reasoner: ReasonerKind::Off,
            gemini_url: DEFAULT_GEMINI_URL.to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            openai_url: DEFAULT_OPENAI_URL.to_string(),
            openai_api_key: None,
            openai_model: DEFAULT_OPENAI_MODEL.to_string(),
        }
    }
}

impl GuideConfig {
    /// Offline setup: fixture geodata, no reasoning service, no encyclopedia.
    pub fn offline(fixture: impl Into<PathBuf>) -> Self {
        Self {
            geo_fixture: Some(fixture.into()),
            encyclopedia_enabled: false,
            ..Self::default()
        }
    }

    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let gemini_api_key = env_non_empty("WANDER_GEMINI_API_KEY");
        let openai_api_key = env_non_empty("WANDER_OPENAI_API_KEY");

        let reasoner = match env_non_empty("WANDER_REASONER") {
            Some(value) => ReasonerKind::parse(&value)
                .with_context(|| format!("unknown WANDER_REASONER value '{value}'"))?,
            None if gemini_api_key.is_some() => ReasonerKind::Gemini,
            None if openai_api_key.is_some() => ReasonerKind::OpenAi,
            None => ReasonerKind::Off,
        };

        let encyclopedia_enabled = match env_non_empty("WANDER_ENCYCLOPEDIA") {
            Some(value) => !matches!(value.to_lowercase().as_str(), "off" | "none" | "disabled"),
            None => defaults.encyclopedia_enabled,
        };

        Ok(Self {
            discovery: DiscoveryConfig::from_env(),
            narrative_style: env_non_empty("WANDER_NARRATIVE_STYLE"),
            http_timeout: env_parse("WANDER_HTTP_TIMEOUT_SECONDS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            overpass_url: env_non_empty("WANDER_OVERPASS_URL").unwrap_or(defaults.overpass_url),
            geo_fixture: env_non_empty("WANDER_GEO_FIXTURE").map(PathBuf::from),
            wikipedia_url: env_non_empty("WANDER_WIKIPEDIA_URL").unwrap_or(defaults.wikipedia_url),
            encyclopedia_enabled,
            encyclopedia_radius_m: defaults.encyclopedia_radius_m,
            reasoner,
            gemini_url: env_non_empty("WANDER_GEMINI_URL").unwrap_or(defaults.gemini_url),
            gemini_api_key,
            gemini_model: env_non_empty("WANDER_GEMINI_MODEL").unwrap_or(defaults.gemini_model),
            openai_url: env_non_empty("WANDER_OPENAI_URL").unwrap_or(defaults.openai_url),
            openai_api_key,
            openai_model: env_non_empty("WANDER_OPENAI_MODEL").unwrap_or(defaults.openai_model),
        })
    }

    pub fn build_http_client(&self) -> Result<Client> {
        Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(6).min(self.http_timeout))
            .timeout(self.http_timeout)
            .build()
            .context("failed to build HTTP client")
    }

    pub fn build_geo_source(&self, http: &Client) -> Result<GeoSource> {
        if let Some(path) = &self.geo_fixture {
            let fixture = FixtureGeoSource::from_path(path)
                .with_context(|| format!("failed loading geodata fixture {}", path.display()))?;
            info!(path = %path.display(), elements = fixture.len(), "using offline geodata fixture");
            return Ok(GeoSource::Fixture(fixture));
        }

        let client = OverpassClient::new(http.clone(), &self.overpass_url)
            .with_context(|| format!("invalid overpass url {}", self.overpass_url))?;
        Ok(GeoSource::Overpass(client))
    }

    pub fn build_reasoner(&self, http: &Client) -> Result<Reasoner> {
        match self.reasoner {
            ReasonerKind::Off => Ok(Reasoner::Disabled),
            ReasonerKind::Gemini => {
                let Some(api_key) = self.gemini_api_key.clone() else {
                    bail!("WANDER_REASONER=gemini requires WANDER_GEMINI_API_KEY");
                };
                let client =
                    GeminiClient::new(http.clone(), &self.gemini_url, api_key, &self.gemini_model)
                        .context("invalid gemini url")?;
                Ok(Reasoner::Gemini(client))
            }
            ReasonerKind::OpenAi => {
                let Some(api_key) = self.openai_api_key.clone() else {
                    bail!("WANDER_REASONER=openai requires WANDER_OPENAI_API_KEY");
                };
                let client =
                    OpenAiClient::new(http.clone(), &self.openai_url, api_key, &self.openai_model)
                        .context("invalid openai url")?;
                Ok(Reasoner::OpenAi(client))
            }
        }
    }

    pub fn build_encyclopedia(&self, http: &Client) -> Result<Encyclopedia> {
        if !self.encyclopedia_enabled {
            return Ok(Encyclopedia::Disabled);
        }
        let client = WikipediaClient::new(http.clone(), &self.wikipedia_url)
            .with_context(|| format!("invalid wikipedia url {}", self.wikipedia_url))?;
        Ok(Encyclopedia::Wikipedia(client))
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_schedule_has_six_steps() {
        let config = DiscoveryConfig::default();
        assert_eq!(
            config.radius_schedule(DEFAULT_INITIAL_RADIUS_M),
            vec![500, 1_400, 2_300, 3_200, 4_100, 5_000]
        );
    }

    #[test]
    fn schedule_is_empty_above_ceiling() {
        let config = DiscoveryConfig::default();
        assert!(config.radius_schedule(8_000).is_empty());
        assert!(config.radius_schedule(4_000_000).is_empty());
        assert_eq!(config.radius_schedule(5_000), vec![5_000]);
        assert!(!config.accepts_initial_radius(0));
        assert!(!config.accepts_initial_radius(5_001));
        assert!(config.accepts_initial_radius(5_000));
    }

    #[test]
    fn zero_initial_radius_from_env_keeps_default() {
        env::set_var("WANDER_INITIAL_RADIUS_M", "0");
        let config = DiscoveryConfig::from_env();
        env::remove_var("WANDER_INITIAL_RADIUS_M");
        assert_eq!(config.initial_radius_m, DEFAULT_INITIAL_RADIUS_M);
    }

    #[test]
    fn reasoner_kind_parses_aliases() {
        assert_eq!(ReasonerKind::parse("Gemini"), Some(ReasonerKind::Gemini));
        assert_eq!(ReasonerKind::parse("off"), Some(ReasonerKind::Off));
        assert_eq!(ReasonerKind::parse("claude"), None);
    }

    #[test]
    fn offline_config_builds_disabled_collaborators() {
        let config = GuideConfig::offline("/tmp/does-not-matter.json");
        let http = config.build_http_client().unwrap();
        assert!(matches!(config.build_reasoner(&http).unwrap(), Reasoner::Disabled));
        assert!(!config.build_encyclopedia(&http).unwrap().is_enabled());
    }
}
