pub mod collection;
pub mod config;
pub mod error;
pub mod mapping;
pub mod normalize;
pub mod pipeline;

pub use collection::{Feature, FeatureCollection};
pub use config::Config;
pub use error::{DmaMapError, Result};
pub use mapping::{Mapping, MappingColumns};
pub use normalize::{normalize_collection, normalize_feature, resolve_display_name, NormalizeStats};
pub use pipeline::{dry_run, run, RunReport};
