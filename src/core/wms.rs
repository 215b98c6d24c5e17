//! WMS connection handling: lazy connect, capabilities indexing, and
//! GetFeatureInfo request building over blocking HTTP.

use std::collections::HashMap;

use geo_types::Point;
use quick_xml::events::Event;
use quick_xml::Reader;
use tracing::{error, info};
use url::Url;

use crate::domain::ports::{FeatureInfoRequest, WmsService};
use crate::utils::error::{Result, WmsError};

/// Axis-aligned box of half-width `buffer` around a point, in CRS units.
pub fn bbox_around(location: Point<f64>, buffer: f64) -> [f64; 4] {
    [
        location.x() - buffer,
        location.y() - buffer,
        location.x() + buffer,
        location.y() + buffer,
    ]
}

/// A lazily-connected handle to one WMS endpoint.
///
/// The connection is established on first use and reused afterwards. A
/// pre-built service (real or stand-in) can be injected with
/// [`set_service`](WmsConnection::set_service), in which case no HTTP
/// connect is attempted.
pub struct WmsConnection {
    base_url: String,
    version: String,
    service: Option<Box<dyn WmsService>>,
}

impl WmsConnection {
    pub fn new(base_url: &str, version: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            version: version.to_string(),
            service: None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Inject a service, bypassing the HTTP connect on first use.
    pub fn set_service(&mut self, service: Box<dyn WmsService>) {
        self.service = Some(service);
    }

    fn service(&mut self) -> Result<&dyn WmsService> {
        let service: Box<dyn WmsService> = match self.service.take() {
            Some(service) => service,
            None => Box::new(HttpWms::connect(&self.base_url, &self.version)?),
        };
        Ok(&**self.service.insert(service))
    }

    /// Advertised layers (name to title), optionally filtered on both.
    pub fn list_layers(
        &mut self,
        filter: Option<&dyn Fn(&str, &str) -> bool>,
    ) -> Result<HashMap<String, String>> {
        let layers = self
            .service()?
            .layers()
            .iter()
            .filter(|(name, title)| filter.map_or(true, |f| f(name, title)))
            .map(|(name, title)| (name.clone(), title.clone()))
            .collect();
        Ok(layers)
    }

    pub fn layer_exists(&mut self, layer_name: &str) -> Result<bool> {
        Ok(self.service()?.layers().contains_key(layer_name))
    }

    /// Names of all advertised layers, for diagnostics.
    pub fn layer_names(&mut self) -> Result<Vec<String>> {
        Ok(self.service()?.layers().keys().cloned().collect())
    }

    pub fn get_feature_info(&mut self, request: &FeatureInfoRequest) -> Result<Vec<u8>> {
        self.service()?.get_feature_info(request)
    }
}

/// WMS transport over blocking HTTP.
pub struct HttpWms {
    url: String,
    version: String,
    http: reqwest::blocking::Client,
    layers: HashMap<String, String>,
}

impl HttpWms {
    /// Connect to the service: fetch GetCapabilities and index the
    /// advertised layers. The base URL gets a `/wms` suffix unless already
    /// present.
    pub fn connect(base_url: &str, version: &str) -> Result<Self> {
        let wms_url = if base_url.ends_with("/wms") {
            base_url.to_string()
        } else {
            format!("{base_url}/wms")
        };

        let http = reqwest::blocking::Client::new();
        let capabilities = Self::fetch_capabilities(&http, &wms_url, version).map_err(|e| {
            error!("Failed to connect to WMS service at {wms_url}: {e}");
            e
        })?;
        let layers = parse_capabilities(&capabilities)?;
        info!(
            "Connected to WMS service {} ({} layers available)",
            wms_url,
            layers.len()
        );

        Ok(Self {
            url: wms_url,
            version: version.to_string(),
            http,
            layers,
        })
    }

    fn fetch_capabilities(
        http: &reqwest::blocking::Client,
        wms_url: &str,
        version: &str,
    ) -> Result<String> {
        let mut url = Url::parse(wms_url)?;
        url.query_pairs_mut()
            .append_pair("SERVICE", "WMS")
            .append_pair("VERSION", version)
            .append_pair("REQUEST", "GetCapabilities");
        Ok(http.get(url).send()?.error_for_status()?.text()?)
    }

    fn feature_info_url(&self, request: &FeatureInfoRequest) -> Result<Url> {
        let bbox = request.bbox;
        let mut url = Url::parse(&self.url)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("SERVICE", "WMS")
                .append_pair("VERSION", &self.version)
                .append_pair("REQUEST", "GetFeatureInfo")
                .append_pair("LAYERS", &request.layers.join(","))
                .append_pair("QUERY_LAYERS", &request.query_layers.join(","))
                .append_pair("STYLES", "")
                .append_pair("FORMAT", "image/png")
                .append_pair(
                    "BBOX",
                    &format!("{},{},{},{}", bbox[0], bbox[1], bbox[2], bbox[3]),
                )
                .append_pair("WIDTH", &request.width.to_string())
                .append_pair("HEIGHT", &request.height.to_string())
                .append_pair("INFO_FORMAT", request.info_format.as_mime());
            // 1.3.0 renamed SRS to CRS and the query pixel to I/J.
            if self.version.starts_with("1.3") {
                pairs
                    .append_pair("CRS", &request.crs)
                    .append_pair("I", &request.i.to_string())
                    .append_pair("J", &request.j.to_string());
            } else {
                pairs
                    .append_pair("SRS", &request.crs)
                    .append_pair("X", &request.i.to_string())
                    .append_pair("Y", &request.j.to_string());
            }
        }
        Ok(url)
    }
}

impl WmsService for HttpWms {
    fn layers(&self) -> &HashMap<String, String> {
        &self.layers
    }

    fn get_feature_info(&self, request: &FeatureInfoRequest) -> Result<Vec<u8>> {
        let url = self.feature_info_url(request)?;
        let body = self.http.get(url).send()?.error_for_status()?.bytes()?;

        // Some servers answer a failed query with 200 and an exception report.
        if body.starts_with(b"<?xml") {
            let text = String::from_utf8_lossy(&body);
            if text.contains("ServiceException") {
                return Err(WmsError::Service {
                    message: text.into_owned(),
                });
            }
        }

        Ok(body.to_vec())
    }
}

/// Extract advertised layers (name to title) from a GetCapabilities
/// document.
///
/// Only `Name`/`Title` elements that are direct children of a `Layer`
/// count: `Style` blocks carry their own names, and the `Service` section
/// has a `Name` of its own. Unnamed group layers are skipped.
fn parse_capabilities(xml: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut stack: Vec<(Option<String>, Option<String>)> = Vec::new();
    let mut layers = HashMap::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"Layer" {
                    stack.push((None, None));
                }
                path.push(name);
            }
            Ok(Event::Text(t)) => {
                let under_layer = path.len() >= 2 && path[path.len() - 2] == b"Layer";
                if under_layer {
                    if let (Some(tag), Some(layer)) = (path.last(), stack.last_mut()) {
                        let text = t.unescape()?.into_owned();
                        match tag.as_slice() {
                            b"Name" => layer.0 = Some(text),
                            b"Title" => layer.1 = Some(text),
                            _ => {}
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                path.pop();
                if e.local_name().as_ref() == b"Layer" {
                    if let Some((Some(name), title)) = stack.pop() {
                        layers.insert(name, title.unwrap_or_default());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(WmsError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(layers)
}
