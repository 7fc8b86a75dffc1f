//! Import adapters: populate a [`crate::ir::Network`] from a source
//! document. Each adapter owns one format; `extract_info_from_path`
//! picks by file extension.

pub mod editor;
pub mod sbml;

use std::path::Path;

use crate::error::TranslateError;
use crate::ir::Network;

pub fn extract_info_from_path(path: &Path) -> Result<Network, TranslateError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "json" => editor::extract_info_from_file(path),
        // Anything else is treated as SBML XML, matching the original's
        // default input path.
        _ => sbml::extract_info_from_file(path),
    }
}
