use std::path::PathBuf;

use tracing::{info, warn};

use crate::collection::FeatureCollection;
use crate::config::Config;
use crate::error::Result;
use crate::mapping::{Mapping, MappingColumns};
use crate::normalize::{normalize_collection, NormalizeStats};

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mapping_entries: usize,
    pub stats: NormalizeStats,
    pub output: PathBuf,
    /// False on a dry run.
    pub written: bool,
}

impl RunReport {
    pub fn completion_message(&self) -> String {
        format!(
            "Updated {}: 'dma_id' and 'dma_name' are now the first keys in all features.",
            self.output.display()
        )
    }
}

/// Load mapping, load features, normalize, write.
pub fn run(config: &Config) -> Result<RunReport> {
    execute(config, true)
}

/// Everything `run` does except writing the output file.
pub fn dry_run(config: &Config) -> Result<RunReport> {
    execute(config, false)
}

fn execute(config: &Config, write: bool) -> Result<RunReport> {
    let columns = MappingColumns::from(&config.mapping);
    let mapping = Mapping::load(&config.mapping.path, &columns)?;
    info!(path = %config.mapping.path.display(), entries = mapping.len(), "Loaded DMA mapping");

    let collection = FeatureCollection::load(&config.geojson.input)?;
    if !collection.has_features_key() {
        warn!(path = %config.geojson.input.display(), "Document has no 'features' key, nothing to normalize");
    }
    info!(path = %config.geojson.input.display(), features = collection.len(), "Loaded feature collection");

    let (collection, stats) = normalize_collection(collection, &mapping);
    info!(
        features = stats.features,
        matched = stats.matched,
        unmapped = stats.unmapped,
        missing_identifier = stats.missing_identifier,
        "Normalized features"
    );
    if stats.missing_identifier > 0 {
        warn!(count = stats.missing_identifier, "Features without an identifier were given dma_id = null");
    }

    let output = config.geojson.output_path().to_path_buf();
    if write {
        collection.write(&output, config.geojson.indent)?;
        info!(path = %output.display(), "Wrote normalized feature collection");
    }

    Ok(RunReport {
        mapping_entries: mapping.len(),
        stats,
        output,
        written: write,
    })
}
