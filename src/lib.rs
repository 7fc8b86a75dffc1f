//! Translator for SBML layout+render models. Reads SBML XML or
//! network-editor JSON into a neutral network representation and writes
//! it back out as SBML, figures (SVG/PNG/JPG), Cytoscape.js JSON,
//! network-editor JSON or Escher maps.

#[cfg(feature = "cli")]
pub mod cli;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod import;
pub mod ir;
pub mod shapes;

#[cfg(feature = "cli")]
pub use cli::run;
pub use error::TranslateError;
