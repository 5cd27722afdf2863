use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use wander_core::{Location, PointOfInterest};
use wander_geodata::{EncyclopediaLookup, GeoDataError};
use wander_reasoning::{ReasoningError, ReasoningService};

pub fn poi(id: &str, name: &str, distance: f64) -> PointOfInterest {
    PointOfInterest {
        id: id.to_string(),
        name: name.to_string(),
        kind: "monument".to_string(),
        latitude: 51.2194 + distance / 111_000.0,
        longitude: 4.4025,
        distance: Some(distance),
        description: None,
    }
}

/// `node/1`, `node/2`, ... at the given distances.
pub fn pois_at(distances: &[f64]) -> Vec<PointOfInterest> {
    distances
        .iter()
        .enumerate()
        .map(|(index, distance)| {
            poi(
                &format!("node/{}", index + 1),
                &format!("Place {}", index + 1),
                *distance,
            )
        })
        .collect()
}

/// Replays canned replies in order; errors once the script runs out.
#[derive(Default)]
pub struct ScriptedReasoner {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl ScriptedReasoner {
    pub fn replying(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|reply| reply.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }
}

impl ReasoningService for ScriptedReasoner {
    async fn complete(&self, prompt: &str) -> Result<String, ReasoningError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .ok_or(ReasoningError::Status {
                status: 503,
                body: "unavailable".to_string(),
            })
    }
}

pub enum FixedLookup {
    Extract(String),
    Missing,
    Broken,
}

impl EncyclopediaLookup for FixedLookup {
    async fn lookup(
        &self,
        _location: Location,
        _radius_m: u32,
    ) -> Result<Option<String>, GeoDataError> {
        match self {
            FixedLookup::Extract(text) => Ok(Some(text.clone())),
            FixedLookup::Missing => Ok(None),
            FixedLookup::Broken => Err(GeoDataError::Status {
                status: 500,
                body: "boom".to_string(),
            }),
        }
    }
}
