//! Client for the Geopunt (DHMV) elevation service.

use std::collections::HashMap;

use geo_types::Point;
use tracing::{error, info, warn};

use crate::config;
use crate::core::wms::{bbox_around, WmsConnection};
use crate::domain::model::ElevationResult;
use crate::domain::ports::{FeatureInfoRequest, InfoFormat, WmsService};
use crate::utils::error::Result;

// Raster window for elevation queries, sampled at its center pixel.
const WINDOW_SIZE: u32 = 256;

/// Parse an elevation value out of a text/plain GetFeatureInfo response.
///
/// Upstream shape:
/// `"@DHMVII_DTM_1m Stretched value;Pixel Value; 32.360001;32.360001;"`.
/// The third semicolon-delimited field is the value. Returns `None` when
/// fewer than three fields are present or the field is not a number; the
/// service sometimes answers with a no-data sentinel in this shape, so
/// that is a recoverable condition, not an error.
pub fn parse_elevation(raw: &str) -> Option<f64> {
    let fields: Vec<&str> = raw.trim().split(';').collect();
    if fields.len() < 3 {
        warn!(
            "Elevation response has {} fields, expected at least 3",
            fields.len()
        );
        return None;
    }
    match fields[2].trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Error parsing elevation value {:?}: {e}", fields[2]);
            None
        }
    }
}

/// Client for the Geopunt digital terrain model WMS.
pub struct GeopuntClient {
    conn: WmsConnection,
}

impl GeopuntClient {
    /// Client against the public DHMV service. Lazy: no I/O happens until
    /// the first query.
    pub fn new() -> Self {
        Self::with_base_url(config::GEOPUNT_BASE_URL)
    }

    /// Point the client at a different endpoint (tests, mirrors).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            conn: WmsConnection::new(base_url, config::DEFAULT_WMS_VERSION),
        }
    }

    pub fn base_url(&self) -> &str {
        self.conn.base_url()
    }

    /// Inject a pre-connected service; test stand-ins go through here.
    pub fn set_service(&mut self, service: Box<dyn WmsService>) {
        self.conn.set_service(service);
    }

    /// Advertised layers (name to title), optionally filtered.
    pub fn list_layers(
        &mut self,
        filter: Option<&dyn Fn(&str, &str) -> bool>,
    ) -> Result<HashMap<String, String>> {
        self.conn.list_layers(filter)
    }

    /// Fetch the elevation at a location from a terrain model layer.
    ///
    /// `None` when the layer is not advertised or the query fails; a
    /// response that parses to no value still yields
    /// `Some(ElevationResult { elevation: None })`.
    pub fn fetch_elevation(
        &mut self,
        location: Point<f64>,
        crs: &str,
        layer_name: &str,
    ) -> Option<ElevationResult> {
        match self.conn.layer_exists(layer_name) {
            Ok(true) => {}
            Ok(false) => {
                let available = self.conn.layer_names().unwrap_or_default();
                warn!("Layer {layer_name} not found. Available layers: {available:?}");
                return None;
            }
            Err(e) => {
                error!("Failed to check layer {layer_name}: {e}");
                return None;
            }
        }

        let request = FeatureInfoRequest {
            layers: vec![layer_name.to_string()],
            query_layers: vec![layer_name.to_string()],
            crs: crs.to_string(),
            bbox: bbox_around(location, config::QUERY_BUFFER),
            width: WINDOW_SIZE,
            height: WINDOW_SIZE,
            i: WINDOW_SIZE / 2,
            j: WINDOW_SIZE / 2,
            info_format: InfoFormat::Text,
        };

        let content = match self.conn.get_feature_info(&request) {
            Ok(body) => String::from_utf8_lossy(&body).into_owned(),
            Err(e) => {
                error!("Failed to fetch elevation from Geopunt API: {e}");
                return None;
            }
        };

        let elevation = parse_elevation(&content);
        if elevation.is_some() {
            info!("Fetched elevation from Geopunt API");
        }
        Some(ElevationResult { elevation })
    }
}

impl Default for GeopuntClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch elevation from the public Geopunt service at the given location.
pub fn get_elevation(
    location: Point<f64>,
    crs: &str,
    layer_name: &str,
) -> Option<ElevationResult> {
    GeopuntClient::new().fetch_elevation(location, crs, layer_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_the_documented_response_shape() {
        let raw = "@DHMVII_DTM_1m Stretched value;Pixel Value; 32.360001;32.360001;";
        assert_eq!(parse_elevation(raw), Some(32.360001));
    }

    #[test]
    fn garbage_is_absent_not_an_error() {
        assert_eq!(parse_elevation("garbage"), None);
    }

    #[test]
    fn too_few_fields_is_absent() {
        assert_eq!(parse_elevation("label;value"), None);
    }

    #[test]
    fn non_numeric_third_field_is_absent() {
        assert_eq!(parse_elevation("a;b;nodata;c;"), None);
    }

    #[test]
    fn negative_and_padded_values_parse() {
        assert_eq!(parse_elevation("a;b;  -3.25 ;x;"), Some(-3.25));
    }
}
