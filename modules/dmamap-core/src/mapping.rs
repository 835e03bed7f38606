use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::config::MappingConfig;
use crate::error::{DmaMapError, Result};

/// Which CSV header names hold the DMA number and its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingColumns {
    pub id: String,
    pub name: String,
}

impl Default for MappingColumns {
    fn default() -> Self {
        Self {
            id: "dma_number".to_string(),
            name: "dma_name".to_string(),
        }
    }
}

impl From<&MappingConfig> for MappingColumns {
    fn from(config: &MappingConfig) -> Self {
        Self {
            id: config.id_column.clone(),
            name: config.name_column.clone(),
        }
    }
}

/// DMA number -> display name. Built once per run, read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mapping {
    names: HashMap<i64, String>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the mapping from a CSV file on disk.
    pub fn load(path: &Path, columns: &MappingColumns) -> Result<Self> {
        let file = File::open(path).map_err(|e| DmaMapError::io(path, e))?;
        Self::from_reader(file, columns)
    }

    /// Parse a headed CSV table. Any row whose identifier does not parse as an
    /// integer, or that is too short to hold either column, aborts the whole
    /// load. Extra trailing fields are ignored. Later rows overwrite earlier ones.
    pub fn from_reader<R: Read>(reader: R, columns: &MappingColumns) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = rdr.headers()?.clone();
        let id_idx = column_index(&headers, &columns.id)?;
        let name_idx = column_index(&headers, &columns.name)?;

        let mut mapping = Mapping::new();
        let mut overwritten = 0usize;

        for result in rdr.records() {
            let record = result?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            let raw_id = field(&record, id_idx, &columns.id, line)?;
            let id: i64 = raw_id
                .trim()
                .parse()
                .map_err(|source| DmaMapError::InvalidIdentifier {
                    line,
                    value: raw_id.to_string(),
                    source,
                })?;
            let name = field(&record, name_idx, &columns.name, line)?.trim();

            if let Some(previous) = mapping.insert(id, name) {
                overwritten += 1;
                debug!(dma_id = id, previous = %previous, name, line, "Duplicate DMA number, later row wins");
            }
        }

        if overwritten > 0 {
            debug!(overwritten, "Mapping rows overwritten by later duplicates");
        }

        Ok(mapping)
    }

    /// Insert or replace a name, returning the one it replaced.
    pub fn insert(&mut self, id: i64, name: impl Into<String>) -> Option<String> {
        self.names.insert(id, name.into())
    }

    pub fn lookup(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(i64, S)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (i64, S)>>(iter: I) -> Self {
        let mut mapping = Mapping::new();
        for (id, name) in iter {
            mapping.insert(id, name);
        }
        mapping
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, column: &str, line: u64) -> Result<&'r str> {
    record.get(idx).ok_or_else(|| DmaMapError::MissingField {
        line,
        column: column.to_string(),
    })
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == column)
        .ok_or_else(|| DmaMapError::MissingColumn(column.to_string()))
}
