use std::collections::HashMap;

use crate::utils::error::Result;

/// GetFeatureInfo response formats used by the upstream services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoFormat {
    /// application/json
    Json,
    /// text/plain
    Text,
}

impl InfoFormat {
    pub fn as_mime(&self) -> &'static str {
        match self {
            InfoFormat::Json => "application/json",
            InfoFormat::Text => "text/plain",
        }
    }
}

/// Parameters for one WMS GetFeatureInfo query.
#[derive(Debug, Clone)]
pub struct FeatureInfoRequest {
    /// Layers to display (same as GetMap).
    pub layers: Vec<String>,
    /// Layers to query for information.
    pub query_layers: Vec<String>,
    /// Coordinate reference system, passed through untouched.
    pub crs: String,
    /// Bounding box: [min_x, min_y, max_x, max_y] in CRS units.
    pub bbox: [f64; 4],
    /// Raster window width in pixels.
    pub width: u32,
    /// Raster window height in pixels.
    pub height: u32,
    /// Pixel column to sample, 0-based from the left.
    pub i: u32,
    /// Pixel row to sample, 0-based from the top.
    pub j: u32,
    pub info_format: InfoFormat,
}

/// Capability set of a connected WMS endpoint.
///
/// [`HttpWms`](crate::core::wms::HttpWms) is the real transport; tests
/// inject stand-ins so no network I/O happens.
pub trait WmsService {
    /// Advertised layers, name to title.
    fn layers(&self) -> &HashMap<String, String>;

    /// Issue a GetFeatureInfo query and return the raw response body.
    fn get_feature_info(&self, request: &FeatureInfoRequest) -> Result<Vec<u8>>;
}
