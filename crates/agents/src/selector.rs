use std::sync::Arc;

use tracing::{debug, warn};
use wander_core::selection::{
    build_selection_prompt, closest_first, dedupe_by_id, parse_selection_indices,
    resolve_selection,
};
use wander_core::{PointOfInterest, Selection, SelectionStrategy, SELECTION_SIZE};
use wander_reasoning::ReasoningService;

pub struct CandidateSelector<R> {
    reasoner: Arc<R>,
}

impl<R> CandidateSelector<R>
where
    R: ReasoningService,
{
    pub fn new(reasoner: Arc<R>) -> Self {
        Self { reasoner }
    }

    /// Picks up to three distinct candidates. Falls back to the closest three
    /// whenever the reasoning service errors or answers without an index array.
    pub async fn select(&self, pois: &[PointOfInterest]) -> Selection {
        let candidates = dedupe_by_id(pois);

        if candidates.len() <= SELECTION_SIZE {
            return Selection {
                pois: candidates,
                strategy: SelectionStrategy::PassThrough,
            };
        }

        let prompt = build_selection_prompt(&candidates);
        let reply = match self.reasoner.complete(&prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(error = %error, "candidate selection unavailable, using closest candidates");
                return fallback(&candidates);
            }
        };

        let Some(indices) = parse_selection_indices(&reply) else {
            warn!(reply = %truncate(&reply, 200), "selection reply had no index array");
            return fallback(&candidates);
        };

        let selection = resolve_selection(&candidates, &indices);
        debug!(?indices, strategy = ?selection.strategy, "candidates selected");
        selection
    }
}

fn fallback(candidates: &[PointOfInterest]) -> Selection {
    Selection {
        pois: closest_first(candidates, SELECTION_SIZE),
        strategy: SelectionStrategy::Fallback,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{poi, pois_at, ScriptedReasoner};

    fn ids(selection: &Selection) -> Vec<&str> {
        selection.pois.iter().map(|p| p.id.as_str()).collect()
    }

    #[tokio::test]
    async fn small_inputs_pass_through_without_a_call() {
        let reasoner = Arc::new(ScriptedReasoner::failing());
        let selector = CandidateSelector::new(reasoner.clone());

        let selection = selector.select(&pois_at(&[50.0, 80.0])).await;

        assert_eq!(selection.strategy, SelectionStrategy::PassThrough);
        assert_eq!(selection.pois.len(), 2);
        assert_eq!(reasoner.calls(), 0);
    }

    #[tokio::test]
    async fn duplicates_do_not_count_towards_the_selection() {
        let selector = CandidateSelector::new(Arc::new(ScriptedReasoner::failing()));
        let mut input = pois_at(&[50.0, 80.0]);
        input.push(input[0].clone());
        input.push(input[1].clone());

        let selection = selector.select(&input).await;

        assert_eq!(ids(&selection), vec!["node/1", "node/2"]);
    }

    #[tokio::test]
    async fn uses_indices_from_the_reply() {
        let distances = (1..=10).map(|i| i as f64 * 100.0).collect::<Vec<_>>();
        let selector = CandidateSelector::new(Arc::new(ScriptedReasoner::replying(&[
            "Great choices! pick these: [2, 5, 9]",
        ])));

        let selection = selector.select(&pois_at(&distances)).await;

        assert_eq!(selection.strategy, SelectionStrategy::Reasoned);
        assert_eq!(ids(&selection), vec!["node/2", "node/5", "node/9"]);
    }

    #[tokio::test]
    async fn service_failure_returns_three_closest_in_order() {
        let selector = CandidateSelector::new(Arc::new(ScriptedReasoner::failing()));
        let input = pois_at(&[50.0, 80.0, 120.0, 300.0, 900.0]);

        let selection = selector.select(&input).await;

        assert_eq!(selection.strategy, SelectionStrategy::Fallback);
        assert_eq!(selection.pois, input[..3].to_vec());
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back() {
        let selector = CandidateSelector::new(Arc::new(ScriptedReasoner::replying(&[
            "I like the second and the fourth one.",
        ])));

        let selection = selector.select(&pois_at(&[10.0, 20.0, 30.0, 40.0])).await;

        assert_eq!(selection.strategy, SelectionStrategy::Fallback);
        assert_eq!(ids(&selection), vec!["node/1", "node/2", "node/3"]);
    }

    #[tokio::test]
    async fn out_of_range_indices_are_repaired() {
        let selector =
            CandidateSelector::new(Arc::new(ScriptedReasoner::replying(&["[4, 40, 4]"])));
        let mut input = pois_at(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        input.push(poi("way/77", "Stadspark", 60.0));

        let selection = selector.select(&input).await;

        assert_eq!(selection.strategy, SelectionStrategy::Repaired);
        assert_eq!(ids(&selection), vec!["node/4", "node/1", "node/2"]);
    }
}
