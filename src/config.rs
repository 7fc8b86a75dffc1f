use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the figure exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FigureConfig {
    /// Padding around the network extents, in layout units.
    pub margin: f64,
    /// Font used for labels that carry no font of their own.
    pub font_family: String,
    pub font_size: f64,
    /// Overrides the document background color when set.
    pub background: Option<String>,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            margin: 10.0,
            font_family: "Arial".to_string(),
            font_size: 12.0,
            background: None,
        }
    }
}

/// Metadata written into the header of exported Escher maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscherConfig {
    pub map_name: String,
    pub map_description: String,
}

impl Default for EscherConfig {
    fn default() -> Self {
        Self {
            map_name: "new_map".to_string(),
            map_description: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub figure: FigureConfig,
    pub escher: EscherConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct FigureConfigFile {
    margin: Option<f64>,
    font_family: Option<String>,
    font_size: Option<f64>,
    background: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct EscherConfigFile {
    map_name: Option<String>,
    map_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    figure: Option<FigureConfigFile>,
    escher: Option<EscherConfigFile>,
}

/// Loads a JSON5 config file and overlays it on the defaults. A `None`
/// path returns the defaults unchanged.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;

    if let Some(figure) = parsed.figure {
        if let Some(v) = figure.margin {
            config.figure.margin = v;
        }
        if let Some(v) = figure.font_family {
            config.figure.font_family = v;
        }
        if let Some(v) = figure.font_size {
            config.figure.font_size = v;
        }
        if let Some(v) = figure.background {
            config.figure.background = Some(v);
        }
    }

    if let Some(escher) = parsed.escher {
        if let Some(v) = escher.map_name {
            config.escher.map_name = v;
        }
        if let Some(v) = escher.map_description {
            config.escher.map_description = v;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.figure.margin, 10.0);
        assert_eq!(config.escher.map_name, "new_map");
    }

    #[test]
    fn partial_file_overlays_defaults() {
        let dir = std::env::temp_dir();
        let path = dir.join("sbmlplot_config_overlay.json5");
        std::fs::write(
            &path,
            "{ figure: { margin: 25, background: '#fafafa' }, escher: { mapName: 'core' } }",
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.figure.margin, 25.0);
        assert_eq!(config.figure.background.as_deref(), Some("#fafafa"));
        assert_eq!(config.figure.font_family, "Arial");
        assert_eq!(config.escher.map_name, "core");
        assert_eq!(config.escher.map_description, "");
    }
}
