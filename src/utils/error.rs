use thiserror::Error;

#[derive(Error, Debug)]
pub enum WmsError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Capabilities document error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Parse error: {message}")]
    Parse { message: String },

    #[error("WMS service exception: {message}")]
    Service { message: String },
}

pub type Result<T> = std::result::Result<T, WmsError>;
