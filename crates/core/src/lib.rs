pub mod classify;
pub mod geo;
pub mod models;
pub mod narrative;
pub mod selection;

pub use classify::{classify_and_filter, MAX_CANDIDATES};
pub use geo::{distance_between, distance_m};
pub use models::*;
pub use selection::{Selection, SelectionStrategy, SELECTION_SIZE};
