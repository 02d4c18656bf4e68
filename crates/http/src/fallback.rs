//! The page served when routing or a handler fails.

use std::path::Path;

use bytes::Bytes;
use tracing::{info, warn};

/// Served when the configured page cannot be read at startup.
pub const EMBEDDED_FALLBACK: &[u8] = b"<p> 404 NO FOUND </p>";

/// The not-found page, read once at startup and shared read-only by every session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackPage {
    body: Bytes,
}

impl FallbackPage {
    /// Reads the page at `path`. Never fails: an unreadable file is logged and replaced
    /// by [`EMBEDDED_FALLBACK`].
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(content) => {
                info!(path = %path.display(), size = content.len(), "loaded fallback page");
                Self { body: Bytes::from(content) }
            }
            Err(e) => {
                warn!(path = %path.display(), cause = %e, "can't read fallback page, using the embedded one");
                Self::embedded()
            }
        }
    }

    pub fn embedded() -> Self {
        Self { body: Bytes::from_static(EMBEDDED_FALLBACK) }
    }

    /// Returns the page body; cloning it is a reference count bump.
    pub fn body(&self) -> Bytes {
        self.body.clone()
    }
}

impl Default for FallbackPage {
    fn default() -> Self {
        Self::embedded()
    }
}

impl From<Bytes> for FallbackPage {
    fn from(body: Bytes) -> Self {
        Self { body }
    }
}
