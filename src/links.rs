//! Opening external links

use thiserror::Error;

#[derive(Error, Debug)]
#[error("Failed to open {url}: {reason}")]
pub struct LinkError {
    pub url: String,
    pub reason: String,
}

/// Opens a URL in a new browsing context. Success is not observed.
pub trait LinkOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<(), LinkError>;
}
