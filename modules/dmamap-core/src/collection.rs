//! GeoJSON-style feature collection document.
//!
//! The document is kept as an ordered JSON object so that everything outside
//! `features` (type, crs, name, bbox, ...) round-trips untouched, including the
//! position of `features` among its siblings.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::{json_kind, DmaMapError, Result};

pub const FEATURES_KEY: &str = "features";

/// One feature: an ordered map of attribute keys to JSON values.
pub type Feature = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    document: Map<String, Value>,
    /// None when the document has no `features` key.
    features: Option<Vec<Feature>>,
}

impl FeatureCollection {
    /// Validate the document shape. A missing `features` key is tolerated and
    /// treated as zero features; anything else malformed is an error.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut document = match value {
            Value::Object(map) => map,
            other => return Err(DmaMapError::NotAnObject(json_kind(&other))),
        };

        let features = match document.get_mut(FEATURES_KEY) {
            None => None,
            Some(slot) => {
                // Leave a placeholder so the key keeps its position on write.
                let items = match slot.take() {
                    Value::Array(items) => items,
                    other => return Err(DmaMapError::FeaturesNotArray(json_kind(&other))),
                };
                let features = items
                    .into_iter()
                    .enumerate()
                    .map(|(index, item)| match item {
                        Value::Object(feature) => Ok(feature),
                        other => Err(DmaMapError::FeatureNotObject {
                            index,
                            found: json_kind(&other),
                        }),
                    })
                    .collect::<Result<Vec<_>>>()?;
                Some(features)
            }
        };

        Ok(Self { document, features })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| DmaMapError::io(path, e))?;
        let value: Value =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| DmaMapError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_value(value)
    }

    pub fn has_features_key(&self) -> bool {
        self.features.is_some()
    }

    pub fn features(&self) -> &[Feature] {
        self.features.as_deref().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.features().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features().is_empty()
    }

    /// Replace every feature with `f(feature)`, keeping sequence order.
    pub fn map_features<F>(mut self, f: F) -> Self
    where
        F: FnMut(Feature) -> Feature,
    {
        self.features = self
            .features
            .take()
            .map(|features| features.into_iter().map(f).collect());
        self
    }

    #[cfg(test)]
    pub(crate) fn into_value(self) -> Value {
        let mut document = self.document;
        if let Some(features) = self.features {
            let features = features.into_iter().map(Value::Object).collect();
            document.insert(FEATURES_KEY.into(), Value::Array(features));
        }
        Value::Object(document)
    }

    /// Pretty-print with `indent` spaces per level. Non-ASCII text is written as UTF-8.
    pub fn to_writer<W: Write>(&self, writer: W, indent: usize) -> serde_json::Result<()> {
        let indent = vec![b' '; indent];
        let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
        let mut ser = serde_json::Serializer::with_formatter(writer, formatter);
        self.serialize(&mut ser)
    }

    /// Write atomically: serialize into a temp file next to `path`, then rename
    /// over it. A failure leaves any existing file untouched.
    pub fn write(&self, path: &Path, indent: usize) -> Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| DmaMapError::io(dir, e))?;
        {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            self.to_writer(&mut writer, indent)
                .map_err(|e| DmaMapError::io(path, e.into()))?;
            writer.flush().map_err(|e| DmaMapError::io(path, e))?;
        }
        // Temp files are created 0600; keep the target's mode when rewriting in place.
        if let Ok(meta) = std::fs::metadata(path) {
            tmp.as_file()
                .set_permissions(meta.permissions())
                .map_err(|e| DmaMapError::io(path, e))?;
        }
        tmp.as_file_mut()
            .sync_all()
            .map_err(|e| DmaMapError::io(path, e))?;
        tmp.persist(path).map_err(|e| DmaMapError::io(path, e.error))?;
        Ok(())
    }
}

/// Serializes straight from the held document; `features` is emitted at the
/// position of its original key.
impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.document.len()))?;
        for (key, value) in &self.document {
            match &self.features {
                Some(features) if key == FEATURES_KEY => map.serialize_entry(key, features)?,
                _ => map.serialize_entry(key, value)?,
            }
        }
        map.end()
    }
}
