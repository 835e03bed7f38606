//! Feature normalization: rename `id` to `dma_id`, resolve `dma_name` from the
//! mapping, and rebuild each feature so those two keys come first.

use serde_json::Value;

use crate::collection::{Feature, FeatureCollection};
use crate::mapping::Mapping;

/// Generic identifier key carried by features before normalization.
pub const SOURCE_ID_KEY: &str = "id";
pub const DMA_ID_KEY: &str = "dma_id";
pub const DMA_NAME_KEY: &str = "dma_name";

/// How a single feature's name lookup went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Matched,
    Unmapped,
    MissingIdentifier,
}

/// Per-run counters over the normalized features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub features: usize,
    pub matched: usize,
    pub unmapped: usize,
    pub missing_identifier: usize,
}

impl NormalizeStats {
    fn record(&mut self, outcome: LookupOutcome) {
        self.features += 1;
        match outcome {
            LookupOutcome::Matched => self.matched += 1,
            LookupOutcome::Unmapped => self.unmapped += 1,
            LookupOutcome::MissingIdentifier => self.missing_identifier += 1,
        }
    }
}

/// Integer key for a `dma_id` value. Integral floats (`501.0`) count; strings,
/// fractions and every other JSON type do not.
pub fn identifier_key(value: &Value) -> Option<i64> {
    let Value::Number(number) = value else {
        return None;
    };
    if let Some(id) = number.as_i64() {
        return Some(id);
    }
    let f = number.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Display name for a feature's `dma_id`, or `""` when there is no identifier
/// or the mapping has no entry for it.
pub fn resolve_display_name<'a>(mapping: &'a Mapping, dma_id: Option<&Value>) -> &'a str {
    dma_id
        .and_then(identifier_key)
        .and_then(|id| mapping.lookup(id))
        .unwrap_or("")
}

/// Normalize one feature. Never fails: a feature without an identifier gets
/// `dma_id: null` and an empty name.
pub fn normalize_feature(feature: Feature, mapping: &Mapping) -> Feature {
    normalize_with_outcome(feature, mapping).0
}

fn normalize_with_outcome(feature: Feature, mapping: &Mapping) -> (Feature, LookupOutcome) {
    let mut renamed = None;
    let mut existing = None;
    let mut rest = Vec::with_capacity(feature.len());

    for (key, value) in feature {
        match key.as_str() {
            SOURCE_ID_KEY => renamed = Some(value),
            DMA_ID_KEY => existing = Some(value),
            // Always recomputed.
            DMA_NAME_KEY => {}
            _ => rest.push((key, value)),
        }
    }

    // `id` wins over a stale `dma_id` when both are present.
    let dma_id = renamed.or(existing).filter(|v| !v.is_null());

    let name = resolve_display_name(mapping, dma_id.as_ref());
    let outcome = match dma_id.as_ref().map(identifier_key) {
        None => LookupOutcome::MissingIdentifier,
        Some(Some(id)) if mapping.lookup(id).is_some() => LookupOutcome::Matched,
        Some(_) => LookupOutcome::Unmapped,
    };

    let mut out = Feature::with_capacity(rest.len() + 2);
    out.insert(DMA_ID_KEY.to_string(), dma_id.unwrap_or(Value::Null));
    out.insert(DMA_NAME_KEY.to_string(), Value::String(name.to_string()));
    out.extend(rest);

    (out, outcome)
}

/// Normalize every feature in order. Top-level metadata is left as is.
pub fn normalize_collection(
    collection: FeatureCollection,
    mapping: &Mapping,
) -> (FeatureCollection, NormalizeStats) {
    let mut stats = NormalizeStats::default();
    let collection = collection.map_features(|feature| {
        let (feature, outcome) = normalize_with_outcome(feature, mapping);
        stats.record(outcome);
        feature
    });
    (collection, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(value: Value) -> Feature {
        match value {
            Value::Object(map) => map,
            other => panic!("not an object: {other}"),
        }
    }

    fn keys(feature: &Feature) -> Vec<&str> {
        feature.keys().map(String::as_str).collect()
    }

    fn market_x() -> Mapping {
        [(501, "Market X")].into_iter().collect()
    }

    #[test]
    fn mapped_identifier_is_renamed_and_named() {
        let out = normalize_feature(feature(json!({"id": 501, "name": "Foo"})), &market_x());
        assert_eq!(keys(&out), vec!["dma_id", "dma_name", "name"]);
        assert_eq!(
            Value::Object(out),
            json!({"dma_id": 501, "dma_name": "Market X", "name": "Foo"})
        );
    }

    #[test]
    fn unmapped_identifier_gets_empty_name() {
        let out = normalize_feature(feature(json!({"id": 999, "name": "Bar"})), &market_x());
        assert_eq!(keys(&out), vec!["dma_id", "dma_name", "name"]);
        assert_eq!(
            Value::Object(out),
            json!({"dma_id": 999, "dma_name": "", "name": "Bar"})
        );
    }

    #[test]
    fn missing_identifier_gets_null_id_and_empty_name() {
        let out = normalize_feature(feature(json!({"name": "Baz"})), &market_x());
        assert_eq!(keys(&out), vec!["dma_id", "dma_name", "name"]);
        assert_eq!(
            Value::Object(out),
            json!({"dma_id": null, "dma_name": "", "name": "Baz"})
        );
    }

    #[test]
    fn remaining_keys_keep_relative_order() {
        let input = feature(json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": []},
            "id": 501,
            "properties": {"households": 7_000_000},
            "bbox": [0, 0, 1, 1]
        }));
        let out = normalize_feature(input, &market_x());
        assert_eq!(
            keys(&out),
            vec!["dma_id", "dma_name", "type", "geometry", "properties", "bbox"]
        );
        assert_eq!(out["geometry"], json!({"type": "Polygon", "coordinates": []}));
        assert_eq!(out["properties"], json!({"households": 7_000_000}));
    }

    #[test]
    fn stale_name_is_recomputed_and_not_duplicated() {
        let input = feature(json!({"dma_name": "Old", "name": "Foo", "id": 501}));
        let out = normalize_feature(input, &market_x());
        assert_eq!(keys(&out), vec!["dma_id", "dma_name", "name"]);
        assert_eq!(out["dma_name"], json!("Market X"));
    }

    #[test]
    fn id_overrides_existing_dma_id() {
        let input = feature(json!({"dma_id": 1, "id": 501}));
        let out = normalize_feature(input, &market_x());
        assert_eq!(keys(&out), vec!["dma_id", "dma_name"]);
        assert_eq!(out["dma_id"], json!(501));
        assert_eq!(out["dma_name"], json!("Market X"));
    }

    #[test]
    fn normalizing_twice_is_identical() {
        let mapping = market_x();
        let input = feature(json!({"geometry": null, "id": 501, "name": "Foo"}));
        let once = normalize_feature(input, &mapping);
        let twice = normalize_feature(once.clone(), &mapping);
        assert_eq!(keys(&once), keys(&twice));
        assert_eq!(once, twice);

        let missing = normalize_feature(feature(json!({"name": "Baz"})), &mapping);
        assert_eq!(normalize_feature(missing.clone(), &mapping), missing);
    }

    #[test]
    fn resolve_display_name_fallbacks() {
        let mapping = market_x();
        assert_eq!(resolve_display_name(&mapping, Some(&json!(501))), "Market X");
        assert_eq!(resolve_display_name(&mapping, Some(&json!(501.0))), "Market X");
        assert_eq!(resolve_display_name(&mapping, Some(&json!(999))), "");
        assert_eq!(resolve_display_name(&mapping, Some(&json!("501"))), "");
        assert_eq!(resolve_display_name(&mapping, Some(&json!(501.5))), "");
        assert_eq!(resolve_display_name(&mapping, Some(&Value::Null)), "");
        assert_eq!(resolve_display_name(&mapping, None), "");
    }

    #[test]
    fn identifier_key_accepts_only_integral_numbers() {
        assert_eq!(identifier_key(&json!(-3)), Some(-3));
        assert_eq!(identifier_key(&json!(12.0)), Some(12));
        assert_eq!(identifier_key(&json!(12.25)), None);
        assert_eq!(identifier_key(&json!(true)), None);
        assert_eq!(identifier_key(&json!([501])), None);
    }

    #[test]
    fn collection_counts_and_order_are_preserved() {
        let collection = FeatureCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {"id": 501, "name": "Foo"},
                {"id": 999, "name": "Bar"},
                {"name": "Baz"},
                {"id": "501"}
            ]
        }))
        .unwrap();

        let (out, stats) = normalize_collection(collection, &market_x());
        assert_eq!(out.len(), 4);
        assert_eq!(
            stats,
            NormalizeStats {
                features: 4,
                matched: 1,
                unmapped: 2,
                missing_identifier: 1,
            }
        );

        let names: Vec<Value> = out
            .features()
            .iter()
            .map(|f| f["dma_name"].clone())
            .collect();
        assert_eq!(names, vec![json!("Market X"), json!(""), json!(""), json!("")]);
        for f in out.features() {
            assert_eq!(&keys(f)[..2], &["dma_id", "dma_name"]);
        }
    }

    #[test]
    fn collection_without_features_key_is_untouched() {
        let input = json!({"type": "FeatureCollection", "name": "empty"});
        let collection = FeatureCollection::from_value(input.clone()).unwrap();
        let (out, stats) = normalize_collection(collection, &market_x());
        assert_eq!(stats, NormalizeStats::default());
        assert_eq!(out.into_value(), input);
    }
}
