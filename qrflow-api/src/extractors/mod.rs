//! Custom request extractors.

pub mod params;

pub use params::{ParamChannels, ROUTE_FRAGMENT_HEADER};
