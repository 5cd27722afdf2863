use std::collections::HashSet;

use tracing::{debug, warn};
use unicode_segmentation::UnicodeSegmentation;

use crate::geo::distance_between;
use crate::models::{Location, PointOfInterest, RawGeoElement};

pub const MAX_CANDIDATES: usize = 30;
pub const UNKNOWN_TYPE: &str = "unknown";

pub const EXCLUDED_TYPES: &[&str] = &[
    "traffic_signals",
    "crossing",
    "street_lamp",
    "tree",
    "waste_basket",
    "post_box",
    "bollard",
    "bench",
    "recycling",
    "bicycle_parking",
    "surveillance",
    "parking",
    "parking_entrance",
    "parking_space",
    "car_sharing",
    "bus_stop",
    "restaurant",
    "fast_food",
    "house",
    "residential",
];

pub const VALUABLE_AMENITIES: &[&str] = &[
    "cafe",
    "pub",
    "bar",
    "tourist_attraction",
    "poi",
    "poi_category",
    "monument",
    "historic",
    "park",
    "church",
    "place_of_worship",
    "cinema",
    "theatre",
    "museum",
    "library",
    "marketplace",
    "arts_centre",
    "fountain",
    "nightclub",
    "gallery",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unnamed,
    ExcludedType,
    Residential,
    LowValueAmenity,
    PlaceholderName,
}

/// A classified element before filtering. Keeps the raw category key so the
/// amenity rule can look at the subtype the type was derived from.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub poi: PointOfInterest,
    pub category_key: Option<&'static str>,
    residential: bool,
}

pub fn classify(origin: Location, element: &RawGeoElement) -> Option<Candidate> {
    let Some(coordinate) = element.coordinate() else {
        warn!(element = %element.poi_id(), "element has no coordinates, skipping");
        return None;
    };

    let distance = distance_between(origin, coordinate).round();
    let (category_key, kind) = match element.tags.category() {
        Some((key, value)) => (Some(key), value.trim().to_string()),
        None => (None, UNKNOWN_TYPE.to_string()),
    };

    let name = element
        .tags
        .name()
        .or_else(|| element.tags.operator())
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| format!("{} at {}m", kind, distance as u64));

    let residential = matches!(element.tags.building(), Some("house" | "residential"))
        || element.tags.residential() == Some("yes");

    Some(Candidate {
        poi: PointOfInterest {
            id: element.poi_id(),
            name,
            kind,
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            distance: Some(distance),
            description: None,
        },
        category_key,
        residential,
    })
}

pub fn check(candidate: &Candidate) -> Result<(), Rejection> {
    let poi = &candidate.poi;

    if poi.name.trim().is_empty() {
        return Err(Rejection::Unnamed);
    }

    if EXCLUDED_TYPES.contains(&poi.kind.as_str()) {
        return Err(Rejection::ExcludedType);
    }

    if candidate.residential {
        return Err(Rejection::Residential);
    }

    if candidate.category_key == Some("amenity") && !VALUABLE_AMENITIES.contains(&poi.kind.as_str())
    {
        return Err(Rejection::LowValueAmenity);
    }

    if is_placeholder_name(&poi.name) {
        return Err(Rejection::PlaceholderName);
    }

    Ok(())
}

pub fn is_placeholder_name(name: &str) -> bool {
    let stripped = name.replace(|ch: char| ch.is_ascii_digit(), "");
    stripped.trim().graphemes(true).count() <= 2
}

/// Classifies, filters, sorts by distance and caps the candidate list.
pub fn classify_and_filter(origin: Location, elements: &[RawGeoElement]) -> Vec<PointOfInterest> {
    let mut seen = HashSet::new();
    let mut pois = Vec::new();

    for element in elements {
        let Some(candidate) = classify(origin, element) else {
            continue;
        };
        if !seen.insert(candidate.poi.id.clone()) {
            continue;
        }
        match check(&candidate) {
            Ok(()) => pois.push(candidate.poi),
            Err(reason) => {
                debug!(poi = %candidate.poi.id, kind = %candidate.poi.kind, ?reason, "candidate rejected")
            }
        }
    }

    pois.sort_by(|a, b| {
        a.distance
            .unwrap_or(0.0)
            .total_cmp(&b.distance.unwrap_or(0.0))
    });
    pois.truncate(MAX_CANDIDATES);
    pois
}
