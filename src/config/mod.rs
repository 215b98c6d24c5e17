//! Service endpoints, required layer identifiers, and the depth-band table.

use std::collections::HashMap;

use serde::Deserialize;

/// Base URL of the DOV geoserver (soil data).
pub const DOV_BASE_URL: &str = "https://www.dov.vlaanderen.be/geoserver";

/// Base URL of the Geopunt DHMV service (elevation).
pub const GEOPUNT_BASE_URL: &str = "https://geo.api.vlaanderen.be/DHMV";

pub const DEFAULT_WMS_VERSION: &str = "1.3.0";

/// Belgian Lambert72, the CRS both services are queried in by default.
pub const DEFAULT_CRS: &str = "EPSG:31370";

/// 1-meter digital terrain model layer on the Geopunt service.
pub const DTM_LAYER: &str = "DHMVII_DTM_1m";

/// DOV texture fraction layers, in clay/silt/sand order. The feature order
/// of GetFeatureInfo responses matches this order.
pub const TEXTURE_LAYERS: [&str; 3] = [
    "bdbstat:fractie_klei_basisdata_bodemkartering",
    "bdbstat:fractie_leem_basisdata_bodemkartering",
    "bdbstat:fractie_zand_basisdata_bodemkartering",
];

/// Suffix marking the uncertainty companion of a depth-band attribute.
pub const UNCERTAINTY_SUFFIX: &str = "_betrouwbaarheid";

/// Half-width of the bounding box built around a query point, in CRS units.
/// The upstream protocol only supports pixel-addressed raster queries, so a
/// point query becomes a tiny box sampled at its center pixel.
pub const QUERY_BUFFER: f64 = 0.0001;

/// One depth band of the DOV texture rasters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DepthBand {
    pub top: u32,
    pub bottom: u32,
    pub name: String,
}

/// Mapping from the service's Dutch depth-band attribute keys to depth
/// bounds and layer names.
///
/// The keys are service-specific and may change upstream, so the table is a
/// value rather than a hard-coded match. Alternate tables can be
/// deserialized from JSON and passed to
/// [`parse_texture`](crate::core::dov::parse_texture).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct DepthTable {
    bands: HashMap<String, DepthBand>,
}

impl DepthTable {
    pub fn get(&self, key: &str) -> Option<&DepthBand> {
        self.bands.get(key)
    }
}

impl Default for DepthTable {
    fn default() -> Self {
        let bands = [
            ("_0_-_10_cm", 0, 10, "Layer_0-10cm"),
            ("_10_-_30_cm", 10, 30, "Layer_10-30cm"),
            ("_30_-_60_cm", 30, 60, "Layer_30-60cm"),
            ("_60_-_100_cm", 60, 100, "Layer_60-100cm"),
            ("_100_-_150_cm", 100, 150, "Layer_100-150cm"),
        ]
        .into_iter()
        .map(|(key, top, bottom, name)| {
            (
                key.to_string(),
                DepthBand {
                    top,
                    bottom,
                    name: name.to_string(),
                },
            )
        })
        .collect();
        Self { bands }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_all_five_bands() {
        let table = DepthTable::default();
        for key in [
            "_0_-_10_cm",
            "_10_-_30_cm",
            "_30_-_60_cm",
            "_60_-_100_cm",
            "_100_-_150_cm",
        ] {
            let band = table.get(key).unwrap();
            assert!(band.top < band.bottom);
        }
        assert!(table.get("_200_-_300_cm").is_none());
    }

    #[test]
    fn table_deserializes_from_json() {
        let json = r#"{"_0_-_5_cm": {"top": 0, "bottom": 5, "name": "Layer_0-5cm"}}"#;
        let table: DepthTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.get("_0_-_5_cm").unwrap().name, "Layer_0-5cm");
    }
}
