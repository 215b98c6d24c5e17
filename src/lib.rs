//! Client library for two public Belgian geospatial WMS services.
//!
//! Queries the DOV soil-data service and the Geopunt elevation service and
//! reshapes their GetFeatureInfo responses into plain records: layered soil
//! texture profiles and elevation values in meters. Callers never see WMS
//! request construction or the schema quirks of either upstream.

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::core::dov::{get_profile_from_dov, parse_texture, DovClient};
pub use crate::core::geopunt::{get_elevation, parse_elevation, GeopuntClient};
pub use crate::domain::model::{
    ElevationResult, LayerMetadata, SoilLayer, SoilProfile, ValueMetadata,
};
pub use crate::domain::ports::{FeatureInfoRequest, InfoFormat, WmsService};
pub use crate::utils::error::{Result, WmsError};
