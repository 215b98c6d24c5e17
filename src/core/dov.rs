//! Client for the Belgian DOV (Databank Ondergrond Vlaanderen) soil
//! service: texture fraction rasters queried per point, reshaped into a
//! depth-layered profile.

use std::collections::HashMap;

use geo_types::Point;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::config::{self, DepthTable};
use crate::core::geopunt::GeopuntClient;
use crate::core::wms::{bbox_around, WmsConnection};
use crate::domain::model::{LayerMetadata, SoilLayer, SoilProfile, ValueMetadata};
use crate::domain::ports::{FeatureInfoRequest, InfoFormat, WmsService};
use crate::utils::error::{Result, WmsError};

// Fixed provenance strings, indexed as the features arrive: clay, silt, sand.
const CLAY_SOURCE: &str = "DOV WMS, bdbstat:fractie_klei_basisdata_bodemkartering";
const SILT_SOURCE: &str = "DOV WMS, bdbstat:fractie_leem_basisdata_bodemkartering";
const SAND_SOURCE: &str = "DOV WMS, bdbstat:fractie_zand_basisdata_bodemkartering";

#[derive(Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Map<String, Value>,
}

/// Parse a DOV GetFeatureInfo response into a layered soil profile.
///
/// The service answers with three features in fixed order (clay, silt,
/// sand), each mapping depth-band keys to percentages, with an uncertainty
/// companion per key (`_betrouwbaarheid` suffix). Depth bands are read from
/// the first feature's property set, so a response with fewer depth keys
/// yields fewer layers; layers come out in the payload's own key order.
///
/// Structural malformation is a hard error: malformed JSON, fewer than
/// three features when non-empty, a depth key absent from `table`, or a
/// missing/non-numeric value or uncertainty companion. An empty feature
/// list is not an error and yields an empty profile.
pub fn parse_texture(raw: &str, table: &DepthTable) -> Result<SoilProfile> {
    let collection: FeatureCollection =
        serde_json::from_str(raw).map_err(|e| WmsError::Parse {
            message: format!("malformed feature collection: {e}"),
        })?;
    let features = collection.features;

    if features.is_empty() {
        return Ok(SoilProfile::default());
    }
    if features.len() < 3 {
        return Err(WmsError::Parse {
            message: format!(
                "expected three texture features (clay, silt, sand), got {}",
                features.len()
            ),
        });
    }

    let depth_keys: Vec<String> = features[0]
        .properties
        .keys()
        .filter(|key| !key.ends_with(config::UNCERTAINTY_SUFFIX))
        .cloned()
        .collect();

    let mut layers = Vec::with_capacity(depth_keys.len());

    for depth_key in &depth_keys {
        let band = table.get(depth_key).ok_or_else(|| WmsError::Parse {
            message: format!("unknown depth band key {depth_key:?}"),
        })?;

        let ci_key = format!("{depth_key}{}", config::UNCERTAINTY_SUFFIX);

        let (clay_content, clay_mtd) = fraction(&features[0], depth_key, &ci_key, CLAY_SOURCE)?;
        let (silt_content, silt_mtd) = fraction(&features[1], depth_key, &ci_key, SILT_SOURCE)?;
        let (sand_content, sand_mtd) = fraction(&features[2], depth_key, &ci_key, SAND_SOURCE)?;

        layers.push(SoilLayer {
            name: band.name.clone(),
            layer_top: band.top,
            layer_bottom: band.bottom,
            sand_content,
            silt_content,
            clay_content,
            metadata: LayerMetadata {
                sand_content: sand_mtd,
                silt_content: silt_mtd,
                clay_content: clay_mtd,
            },
        });
    }

    Ok(SoilProfile {
        layers,
        elevation: None,
    })
}

/// One content percentage plus its uncertainty companion from a feature.
fn fraction(
    feature: &Feature,
    depth_key: &str,
    ci_key: &str,
    source: &str,
) -> Result<(f64, ValueMetadata)> {
    let value = number(&feature.properties, depth_key)?;
    let uncertainty = number(&feature.properties, ci_key)?;
    Ok((
        value,
        ValueMetadata {
            source: source.to_string(),
            uncertainty,
        },
    ))
}

fn number(properties: &Map<String, Value>, key: &str) -> Result<f64> {
    properties
        .get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| WmsError::Parse {
            message: format!("missing or non-numeric property {key:?}"),
        })
}

/// Client for the DOV soil texture WMS.
pub struct DovClient {
    conn: WmsConnection,
    depths: DepthTable,
    elevation: GeopuntClient,
}

impl DovClient {
    /// Client against the public DOV geoserver. Lazy: no I/O happens until
    /// the first query.
    pub fn new() -> Self {
        Self::with_base_url(config::DOV_BASE_URL)
    }

    /// Point the client at a different endpoint (tests, mirrors).
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            conn: WmsConnection::new(base_url, config::DEFAULT_WMS_VERSION),
            depths: DepthTable::default(),
            elevation: GeopuntClient::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.conn.base_url()
    }

    /// Inject a pre-connected service; test stand-ins go through here.
    pub fn set_service(&mut self, service: Box<dyn WmsService>) {
        self.conn.set_service(service);
    }

    /// Replace the elevation client used by
    /// [`fetch_profile`](DovClient::fetch_profile).
    pub fn set_elevation_client(&mut self, client: GeopuntClient) {
        self.elevation = client;
    }

    /// List advertised layers. Without a filter, only soil-related layers
    /// ("bodem" in the name) are returned.
    pub fn list_soil_layers(
        &mut self,
        filter: Option<&dyn Fn(&str, &str) -> bool>,
    ) -> Result<HashMap<String, String>> {
        match filter {
            Some(f) => self.conn.list_layers(Some(f)),
            None => self
                .conn
                .list_layers(Some(&|name: &str, _: &str| {
                    name.to_lowercase().contains("bodem")
                })),
        }
    }

    /// Fetch the soil texture profile at a location.
    ///
    /// All three texture layers must be advertised by the service; if any
    /// is missing no query is made. Missing layers, transport failures and
    /// parse failures are logged and reported as `None`: callers at this
    /// level only need a usable-result signal. When `fetch_elevation` is
    /// set the Geopunt elevation for the same point is merged in; a failed
    /// elevation sub-fetch leaves `elevation` empty without invalidating
    /// the texture result.
    pub fn fetch_profile(
        &mut self,
        location: Point<f64>,
        fetch_elevation: bool,
        crs: &str,
    ) -> Option<SoilProfile> {
        for layer_name in config::TEXTURE_LAYERS {
            match self.conn.layer_exists(layer_name) {
                Ok(true) => {}
                Ok(false) => {
                    warn!("Layer {layer_name} not found");
                    return None;
                }
                Err(e) => {
                    error!("Failed to check layer {layer_name}: {e}");
                    return None;
                }
            }
        }

        let layers: Vec<String> = config::TEXTURE_LAYERS.iter().map(|s| s.to_string()).collect();
        let request = FeatureInfoRequest {
            query_layers: layers.clone(),
            layers,
            crs: crs.to_string(),
            bbox: bbox_around(location, config::QUERY_BUFFER),
            width: 100,
            height: 100,
            i: 50,
            j: 50,
            info_format: InfoFormat::Json,
        };

        let mut profile = match self.query_texture(&request) {
            Ok(profile) => profile,
            Err(e) => {
                error!("Failed to fetch profile: {e}");
                return None;
            }
        };

        if fetch_elevation {
            profile.elevation = self
                .elevation
                .fetch_elevation(location, crs, config::DTM_LAYER)
                .and_then(|result| result.elevation);
        }

        Some(profile)
    }

    fn query_texture(&mut self, request: &FeatureInfoRequest) -> Result<SoilProfile> {
        let body = self.conn.get_feature_info(request)?;
        let raw = String::from_utf8(body).map_err(|e| WmsError::Parse {
            message: format!("response is not valid UTF-8: {e}"),
        })?;
        parse_texture(&raw, &self.depths)
    }
}

impl Default for DovClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetch a soil profile from the public DOV service at the given
/// coordinates.
///
/// Handles client setup for callers who do not want to manage a
/// [`DovClient`] themselves. `profile_name` only shows up in diagnostics
/// and defaults to `Profile_<x>_<y>`.
pub fn get_profile_from_dov(
    x: f64,
    y: f64,
    crs: &str,
    fetch_elevation: bool,
    profile_name: Option<&str>,
) -> Option<SoilProfile> {
    let location = Point::new(x, y);
    let name = profile_name
        .map(str::to_string)
        .unwrap_or_else(|| format!("Profile_{x:.0}_{y:.0}"));
    debug!("Fetching soil profile {name} at ({x}, {y}) in {crs}");

    DovClient::new().fetch_profile(location, fetch_elevation, crs)
}
