//! Post-ingestion consolidation over the whole network.

mod stop_order;
mod variants;

pub use stop_order::{global_stop_order, route_stop_orders};
pub use variants::merge_trip_variants;
