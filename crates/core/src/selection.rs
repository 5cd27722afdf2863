use std::collections::HashSet;

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::PointOfInterest;

pub const SELECTION_SIZE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Three or fewer candidates, nothing to choose.
    PassThrough,
    Reasoned,
    /// Reasoned picks topped up with the closest remaining candidates.
    Repaired,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct Selection {
    pub pois: Vec<PointOfInterest>,
    pub strategy: SelectionStrategy,
}

pub fn dedupe_by_id(pois: &[PointOfInterest]) -> Vec<PointOfInterest> {
    let mut seen = HashSet::new();
    pois.iter()
        .filter(|poi| seen.insert(poi.id.as_str()))
        .cloned()
        .collect()
}

pub fn closest_first(pois: &[PointOfInterest], count: usize) -> Vec<PointOfInterest> {
    dedupe_by_id(pois).into_iter().take(count).collect()
}

pub fn build_selection_prompt(pois: &[PointOfInterest]) -> String {
    let listing = pois
        .iter()
        .enumerate()
        .map(|(index, poi)| {
            format!(
                "{}. {} ({}, {}m away)",
                index + 1,
                poi.name,
                poi.kind,
                poi.distance_label()
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an AI travel guide tasked with selecting the most interesting locations from a list.\n\
Your goal is to choose exactly {SELECTION_SIZE} diverse and engaging points of interest that would make for an interesting adventure.\n\n\
Here are the points of interest, with their name, type, and distance from the user:\n\
{listing}\n\n\
Select the {SELECTION_SIZE} most interesting, diverse, and unique locations from this list.\n\
Format your response as a JSON array with just the indices (1-based) of your selections.\n\
Example: [4, 7, 12]\n"
    )
}

static BRACKET_PATTERN: OnceCell<Regex> = OnceCell::new();

fn bracket_pattern() -> &'static Regex {
    BRACKET_PATTERN.get_or_init(|| Regex::new(r"\[.*?\]").expect("valid selection regex"))
}

/// Extracts the first bracketed JSON array from free text. `None` when there is
/// no array or it does not parse. Non-integer entries are skipped.
pub fn parse_selection_indices(text: &str) -> Option<Vec<i64>> {
    let literal = bracket_pattern().find(text)?.as_str();
    let values: Vec<serde_json::Value> = serde_json::from_str(literal).ok()?;

    Some(
        values
            .iter()
            .filter_map(|value| match value {
                serde_json::Value::Number(number) => number
                    .as_i64()
                    .or_else(|| number.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
                serde_json::Value::String(text) => text.trim().parse::<i64>().ok(),
                _ => None,
            })
            .collect(),
    )
}

/// Maps 1-based indices onto `pois`, drops misses and repeats, then fills the
/// remaining slots with the closest unselected candidates.
pub fn resolve_selection(pois: &[PointOfInterest], indices: &[i64]) -> Selection {
    let mut chosen: Vec<PointOfInterest> = Vec::with_capacity(SELECTION_SIZE);
    let mut seen = HashSet::new();

    for index in indices {
        if chosen.len() == SELECTION_SIZE {
            break;
        }
        let Some(poi) = usize::try_from(*index)
            .ok()
            .and_then(|i| i.checked_sub(1))
            .and_then(|i| pois.get(i))
        else {
            continue;
        };
        if seen.insert(poi.id.clone()) {
            chosen.push(poi.clone());
        }
    }

    let strategy = if chosen.len() >= SELECTION_SIZE.min(pois.len()) {
        SelectionStrategy::Reasoned
    } else {
        SelectionStrategy::Repaired
    };

    for poi in pois {
        if chosen.len() >= SELECTION_SIZE {
            break;
        }
        if seen.insert(poi.id.clone()) {
            chosen.push(poi.clone());
        }
    }

    Selection {
        pois: chosen,
        strategy,
    }
}
