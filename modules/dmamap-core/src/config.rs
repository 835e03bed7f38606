use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{DmaMapError, Result};

pub const DEFAULT_MAPPING_PATH: &str = "src/components/dmamap/dma_mapping.csv";
pub const DEFAULT_GEOJSON_PATH: &str = "src/components/dmamap/nielsengeo.json";
/// Deploy-time config file looked up next to the binary.
pub const CONFIG_FILE_NAME: &str = "dmamap.toml";

/// Run configuration. Fixed at deploy time: either the compiled-in defaults
/// or a TOML file shipped next to the binary. Nothing is read from the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub mapping: MappingConfig,
    pub geojson: GeoJsonConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub path: PathBuf,
    pub id_column: String,
    pub name_column: String,
}

impl Default for MappingConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_MAPPING_PATH),
            id_column: "dma_number".to_string(),
            name_column: "dma_name".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeoJsonConfig {
    pub input: PathBuf,
    /// Where to write the result. None = rewrite `input` in place.
    pub output: Option<PathBuf>,
    /// Spaces per indentation level in the written document.
    pub indent: usize,
}

impl Default for GeoJsonConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_GEOJSON_PATH),
            output: None,
            indent: 4,
        }
    }
}

impl GeoJsonConfig {
    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.input)
    }
}

impl Config {
    /// Load and parse a TOML config file. Omitted keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| DmaMapError::io(path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            DmaMapError::Config(msg) => DmaMapError::Config(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Deploy-time config: `dmamap.toml` in `dir` when present, else the
    /// compiled-in defaults. Relative paths in the file resolve against `dir`.
    pub fn resolve_in(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.is_file() {
            return Ok(Self::default());
        }
        Ok(Self::load(&path)?.rebase(dir))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).map_err(|e| DmaMapError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.mapping.id_column.trim().is_empty() {
            return Err(DmaMapError::Config("mapping.id_column must not be empty".into()));
        }
        if self.mapping.name_column.trim().is_empty() {
            return Err(DmaMapError::Config("mapping.name_column must not be empty".into()));
        }
        Ok(())
    }

    /// Resolve relative paths against `base` (usually the config file's directory).
    pub fn rebase(mut self, base: &Path) -> Self {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.mapping.path);
        join(&mut self.geojson.input);
        if let Some(out) = self.geojson.output.as_mut() {
            join(out);
        }
        self
    }
}
