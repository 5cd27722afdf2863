use tracing::{debug, warn};
use wander_core::narrative::{
    arrival_empty_extract, arrival_lookup_failed, arrival_message, arrival_not_found,
};
use wander_core::{ArrivalReport, ArrivalSource, PointOfInterest};
use wander_geodata::EncyclopediaLookup;

pub struct ArrivalGuide<E> {
    lookup: E,
    radius_m: u32,
}

impl<E> ArrivalGuide<E>
where
    E: EncyclopediaLookup,
{
    pub fn new(lookup: E, radius_m: u32) -> Self {
        Self { lookup, radius_m }
    }

    pub async fn arrive(&self, poi: &PointOfInterest) -> ArrivalReport {
        let (info, source) = match self.lookup.lookup(poi.location(), self.radius_m).await {
            Ok(Some(extract)) if !extract.trim().is_empty() => {
                debug!(poi = %poi.id, chars = extract.len(), "encyclopedia extract found");
                (extract, ArrivalSource::Encyclopedia)
            }
            Ok(Some(_)) => (arrival_empty_extract(poi), ArrivalSource::NotFound),
            Ok(None) => (arrival_not_found(poi), ArrivalSource::NotFound),
            Err(error) => {
                warn!(poi = %poi.id, error = %error, "encyclopedia lookup failed");
                (arrival_lookup_failed(poi), ArrivalSource::Unavailable)
            }
        };

        ArrivalReport {
            message: arrival_message(poi, &info),
            poi: poi.clone(),
            source,
        }
    }
}
