use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("configuration missing: {0}")]
    ConfigurationMissing(&'static str),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },

    #[error("schema error: {0}")]
    Schema(String),
}

impl From<serde_json::Error> for OverlayError {
    fn from(e: serde_json::Error) -> Self {
        OverlayError::Schema(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;
