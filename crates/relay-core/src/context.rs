//! Static context document injected into every prompt

use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{Error, Result};

/// Text used when the context file does not exist
pub const FALLBACK_CONTEXT: &str = "Product information not available.";

/// Immutable product-information text shared by all request handlers
#[derive(Debug, Clone)]
pub struct ContextDocument {
    text: Arc<str>,
    fallback: bool,
}

impl ContextDocument {
    /// Read the document at `path`
    ///
    /// A missing file yields [`FALLBACK_CONTEXT`]; any other read failure
    /// is returned so the process can refuse to start.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        match std::fs::read_to_string(path) {
            Ok(text) => {
                info!("Loaded context document {} ({} bytes)", path.display(), text.len());
                Ok(Self {
                    text: text.into(),
                    fallback: false,
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(
                    "Context document {} not found, using fallback text",
                    path.display()
                );
                Ok(Self::fallback())
            }
            Err(e) => Err(Error::Context {
                path: path.display().to_string(),
                source: e,
            }),
        }
    }

    /// Build a document from in-memory text
    pub fn from_text(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self {
            text: text.into(),
            fallback: false,
        }
    }

    /// The fallback document
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_CONTEXT.into(),
            fallback: true,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the document is the built-in fallback text
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }
}
