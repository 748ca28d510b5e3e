use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::model::Size;

/// Geometry knobs for the canvas engine. All sizes are canvas units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Default footprint for nodes without an explicit size.
    pub leaf_size: Size,
    /// Default footprint for container kinds without an explicit size.
    pub container_size: Size,
    /// Border reserved inside a container on every side.
    pub container_padding: f32,
    /// Strip reserved at the top of a container for its title bar.
    pub header_height: f32,
    /// A freshly built container never shrinks below this.
    pub min_container_size: Size,
    pub node_spacing: f32,
    pub rank_spacing: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            leaf_size: Size::new(150.0, 80.0),
            container_size: Size::new(420.0, 260.0),
            container_padding: 24.0,
            header_height: 40.0,
            min_container_size: Size::new(180.0, 120.0),
            node_spacing: 50.0,
            rank_spacing: 50.0,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CanvasConfigFile {
    leaf_width: Option<f32>,
    leaf_height: Option<f32>,
    container_width: Option<f32>,
    container_height: Option<f32>,
    container_padding: Option<f32>,
    header_height: Option<f32>,
    min_container_width: Option<f32>,
    min_container_height: Option<f32>,
    node_spacing: Option<f32>,
    rank_spacing: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<CanvasConfig> {
    let mut config = CanvasConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: CanvasConfigFile = serde_json::from_str(&contents)?;

    if let Some(v) = parsed.leaf_width {
        config.leaf_size.width = v;
    }
    if let Some(v) = parsed.leaf_height {
        config.leaf_size.height = v;
    }
    if let Some(v) = parsed.container_width {
        config.container_size.width = v;
    }
    if let Some(v) = parsed.container_height {
        config.container_size.height = v;
    }
    if let Some(v) = parsed.container_padding {
        config.container_padding = v;
    }
    if let Some(v) = parsed.header_height {
        config.header_height = v;
    }
    if let Some(v) = parsed.min_container_width {
        config.min_container_size.width = v;
    }
    if let Some(v) = parsed.min_container_height {
        config.min_container_size.height = v;
    }
    if let Some(v) = parsed.node_spacing {
        config.node_spacing = v;
    }
    if let Some(v) = parsed.rank_spacing {
        config.rank_spacing = v;
    }

    Ok(config)
}
