use crate::config::load_config;
use crate::export::{
    CytoscapeExport, EscherExport, FigureExport, NetworkEditorExport, SbmlExport,
};
use crate::import::extract_info_from_path;
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "sbmlplot",
    version,
    about = "Translate SBML layout+render models between figure and JSON formats"
)]
pub struct Args {
    /// Input file: SBML XML (.xml/.sbml) or network-editor JSON (.json)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file. JSON and SBML formats default to stdout if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Export format. Figure output picks svg, pdf, png or jpg from the
    /// output extension.
    #[arg(short = 'e', long = "exportFormat", value_enum, default_value = "figure")]
    pub export_format: ExportFormat,

    /// Config JSON5 file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Sbml,
    Figure,
    Cytoscapejs,
    Networkeditor,
    Escher,
}

pub fn run() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;

    let network = extract_info_from_path(&args.input)?;

    if args.export_format == ExportFormat::Figure {
        let output = args
            .output
            .as_deref()
            .context("figure export needs --output with an svg, pdf, png or jpg extension")?;
        let mut export = FigureExport::with_config(config.figure);
        export.save(&network, output)?;
        return Ok(());
    }

    let document = match args.export_format {
        ExportFormat::Sbml => SbmlExport::new().export(&network)?,
        ExportFormat::Cytoscapejs => CytoscapeExport::new().export(&network)?,
        ExportFormat::Networkeditor => NetworkEditorExport::new().export(&network)?,
        ExportFormat::Escher => EscherExport::with_config(config.escher).export(&network)?,
        ExportFormat::Figure => unreachable!(),
    };
    write_output(&document, args.output.as_deref())
}

fn write_output(document: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, document)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        None => println!("{document}"),
    }
    Ok(())
}
