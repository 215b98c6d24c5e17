use serde::{Deserialize, Serialize};

/// Provenance of one content value: the upstream attribute it came from and
/// the confidence interval the service reported alongside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueMetadata {
    pub source: String,
    pub uncertainty: f64,
}

/// Per-field metadata for one soil layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerMetadata {
    pub sand_content: ValueMetadata,
    pub silt_content: ValueMetadata,
    pub clay_content: ValueMetadata,
}

/// Soil texture composition for one fixed depth band.
///
/// Depth bounds are centimeters below the surface. Content fields are
/// percentages; the service reports them in `[0, 100]` but the parser does
/// not enforce that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilLayer {
    pub name: String,
    pub layer_top: u32,
    pub layer_bottom: u32,
    pub sand_content: f64,
    pub silt_content: f64,
    pub clay_content: f64,
    pub metadata: LayerMetadata,
}

/// A layered soil texture profile at one location.
///
/// Layer order follows the raw payload's own field order, not sorted depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SoilProfile {
    pub layers: Vec<SoilLayer>,
    pub elevation: Option<f64>,
}

/// Elevation in meters; `None` when the service answered with a no-data
/// sentinel or an unparseable value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ElevationResult {
    pub elevation: Option<f64>,
}
