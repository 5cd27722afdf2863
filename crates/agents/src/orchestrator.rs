use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use wander_core::narrative::{build_story_prompt, templated_story};
use wander_core::selection::closest_first;
use wander_core::{
    Message, PointOfInterest, Selection, SelectionStrategy, StoryResponse, SELECTION_SIZE,
};
use wander_reasoning::ReasoningService;

use crate::selector::CandidateSelector;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GuideError {
    #[error("no points of interest to narrate")]
    NoCandidates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    Reasoned,
    Template,
}

#[derive(Debug, Clone)]
pub struct Narrative {
    pub story: StoryResponse,
    pub source: NarrativeSource,
    pub selection: SelectionStrategy,
}

pub struct NarrativeOrchestrator<R> {
    reasoner: Arc<R>,
    selector: CandidateSelector<R>,
    style: Option<String>,
}

impl<R> NarrativeOrchestrator<R>
where
    R: ReasoningService,
{
    pub fn new(reasoner: Arc<R>, style: Option<String>) -> Self {
        Self {
            selector: CandidateSelector::new(reasoner.clone()),
            reasoner,
            style,
        }
    }

    pub async fn generate(
        &self,
        pois: &[PointOfInterest],
        history: &[Message],
    ) -> Result<Narrative, GuideError> {
        if pois.is_empty() {
            return Err(GuideError::NoCandidates);
        }

        let selection = self.selector.select(pois).await;
        let Some(next_destination) = selection.pois.first().cloned() else {
            return Err(GuideError::NoCandidates);
        };

        let prompt = build_story_prompt(&selection.pois, history, self.style.as_deref());
        match self.reasoner.complete(&prompt).await {
            Ok(text) if !text.trim().is_empty() => {
                debug!(chars = text.len(), "narrative generated");
                Ok(Narrative {
                    story: StoryResponse {
                        selected_pois: selection.pois,
                        story: text.trim().to_string(),
                        next_destination,
                    },
                    source: NarrativeSource::Reasoned,
                    selection: selection.strategy,
                })
            }
            Ok(_) => {
                warn!("narrative reply was blank, using template");
                self.fallback(pois, history, selection)
            }
            Err(error) => {
                warn!(error = %error, "narrative generation failed, using template");
                self.fallback(pois, history, selection)
            }
        }
    }

    /// The template always narrates the closest candidates. The selector's
    /// strategy is kept only when those are exactly the places it picked.
    fn fallback(
        &self,
        pois: &[PointOfInterest],
        history: &[Message],
        selection: Selection,
    ) -> Result<Narrative, GuideError> {
        let closest = closest_first(pois, SELECTION_SIZE);
        let strategy = if closest == selection.pois {
            selection.strategy
        } else {
            SelectionStrategy::Fallback
        };

        let story = templated_story(closest, history).ok_or(GuideError::NoCandidates)?;
        Ok(Narrative {
            story,
            source: NarrativeSource::Template,
            selection: strategy,
        })
    }
}
