//! Content-type inference.
//!
//! The engine records a content type on every file node but doesn't decide
//! what it is; a [`ContentTypeResolver`] supplied by the caller does. The
//! default guesses from the path's extension.

use std::path::Path;

pub const DIRECTORY_CONTENT_TYPE: &str = "inode/directory";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

pub trait ContentTypeResolver: Send + Sync + std::fmt::Debug + 'static {
    fn content_type(&self, path: &str) -> String;
}

/// Guess a MIME type from the file extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessFromExtension;

impl ContentTypeResolver for GuessFromExtension {
    fn content_type(&self, path: &str) -> String {
        mime_guess::from_path(Path::new(path))
            .first()
            .map(|mime| mime.essence_str().to_string())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
    }
}

/// Whether content of this type is safe to present as UTF-8 text.
pub fn is_textual(content_type: &str) -> bool {
    content_type.contains("text")
        || content_type == "application/json"
        || content_type == "application/javascript"
}
