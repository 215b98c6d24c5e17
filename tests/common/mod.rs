#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use dovwms::{FeatureInfoRequest, Result, WmsError, WmsService};

/// Realistic DOV GetFeatureInfo payload: three features (clay, silt, sand)
/// with five depth bands each plus their uncertainty companions.
pub fn sample_payload() -> String {
    serde_json::json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "id": "",
                "geometry": null,
                "properties": {
                    "_0_-_10_cm": 3.611795663833618,
                    "_10_-_30_cm": 3.3866608142852783,
                    "_30_-_60_cm": 3.2221295833587646,
                    "_60_-_100_cm": 4.441609859466553,
                    "_100_-_150_cm": 5.9969096183776855,
                    "_0_-_10_cm_betrouwbaarheid": 0.36081814765930176,
                    "_10_-_30_cm_betrouwbaarheid": 0.052916716784238815,
                    "_30_-_60_cm_betrouwbaarheid": 1.635129451751709,
                    "_60_-_100_cm_betrouwbaarheid": 2.9045262336730957,
                    "_100_-_150_cm_betrouwbaarheid": 0.6920930743217468
                }
            },
            {
                "type": "Feature",
                "id": "",
                "geometry": null,
                "properties": {
                    "_0_-_10_cm": 22.44235610961914,
                    "_10_-_30_cm": 21.5340576171875,
                    "_30_-_60_cm": 23.25323486328125,
                    "_60_-_100_cm": 17.14266014099121,
                    "_100_-_150_cm": 12.025032997131348,
                    "_0_-_10_cm_betrouwbaarheid": 0.3361551761627197,
                    "_10_-_30_cm_betrouwbaarheid": 3.2321090698242188,
                    "_30_-_60_cm_betrouwbaarheid": 0.04036116972565651,
                    "_60_-_100_cm_betrouwbaarheid": 2.195176362991333,
                    "_100_-_150_cm_betrouwbaarheid": 1.328452467918396
                }
            },
            {
                "type": "Feature",
                "id": "",
                "geometry": null,
                "properties": {
                    "_0_-_10_cm": 72.97166442871094,
                    "_10_-_30_cm": 72.86681365966797,
                    "_30_-_60_cm": 76.02572631835938,
                    "_60_-_100_cm": 77.10255432128906,
                    "_100_-_150_cm": 81.56967163085938,
                    "_0_-_10_cm_betrouwbaarheid": 0.17820630967617035,
                    "_10_-_30_cm_betrouwbaarheid": 0.8113504648208618,
                    "_30_-_60_cm_betrouwbaarheid": 0.15391893684864044,
                    "_60_-_100_cm_betrouwbaarheid": 2.6368417739868164,
                    "_100_-_150_cm_betrouwbaarheid": 3.644649028778076
                }
            }
        ],
        "totalFeatures": "unknown",
        "numberReturned": 3,
        "timeStamp": "2025-10-26T11:38:35.044Z",
        "crs": null
    })
    .to_string()
}

pub fn empty_payload() -> String {
    serde_json::json!({"type": "FeatureCollection", "features": []}).to_string()
}

/// In-memory stand-in for a connected WMS service. Records queries so
/// tests can assert what was (or was not) sent.
pub struct FakeWms {
    layers: HashMap<String, String>,
    response: Vec<u8>,
    fail: bool,
    pub calls: Rc<Cell<usize>>,
    pub last_request: Rc<RefCell<Option<FeatureInfoRequest>>>,
}

impl FakeWms {
    pub fn new(layer_names: &[&str], response: impl Into<Vec<u8>>) -> Self {
        let layers = layer_names
            .iter()
            .map(|name| (name.to_string(), format!("{name} title")))
            .collect();
        Self {
            layers,
            response: response.into(),
            fail: false,
            calls: Rc::new(Cell::new(0)),
            last_request: Rc::new(RefCell::new(None)),
        }
    }

    /// Make every query fail with a service exception.
    pub fn failing(layer_names: &[&str]) -> Self {
        let mut fake = Self::new(layer_names, Vec::new());
        fake.fail = true;
        fake
    }
}

impl WmsService for FakeWms {
    fn layers(&self) -> &HashMap<String, String> {
        &self.layers
    }

    fn get_feature_info(&self, request: &FeatureInfoRequest) -> Result<Vec<u8>> {
        self.calls.set(self.calls.get() + 1);
        *self.last_request.borrow_mut() = Some(request.clone());
        if self.fail {
            return Err(WmsError::Service {
                message: "simulated query failure".to_string(),
            });
        }
        Ok(self.response.clone())
    }
}
