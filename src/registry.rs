//! Per-endpoint schema dispatch.
//!
//! Each traffic source can carry its own field bounds, so the host keys
//! schemas on the source address. The fallback schema plays the role of the
//! general dissector applied when no per-source binding exists. The engine
//! itself stays a pure function; this table is the only dispatch state.

use crate::schema::Schema;
use std::collections::HashMap;
use std::net::IpAddr;

/// Lookup table from source address to the schema that dissects its frames.
#[derive(Debug, Default)]
pub struct DissectorRegistry {
    by_source: HashMap<IpAddr, Schema>,
    fallback: Option<Schema>,
}

impl DissectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a schema to one source address. Replaces any earlier binding.
    pub fn register(&mut self, source: IpAddr, schema: Schema) {
        self.by_source.insert(source, schema);
    }

    /// Schema used for sources with no per-address binding.
    pub fn set_fallback(&mut self, schema: Schema) {
        self.fallback = Some(schema);
    }

    /// Schema for a source address: the per-address binding, else the fallback.
    pub fn schema_for(&self, source: IpAddr) -> Option<&Schema> {
        self.by_source.get(&source).or(self.fallback.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.by_source.is_empty() && self.fallback.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldKind, FieldSpec};

    fn schema(label: &str) -> Schema {
        Schema::new(
            label,
            vec![FieldSpec {
                name: "sync".to_string(),
                kind: FieldKind::UInt(1),
                range: None,
            }],
        )
        .expect("schema")
    }

    #[test]
    fn per_source_binding_wins_over_fallback() {
        let mut registry = DissectorRegistry::new();
        registry.set_fallback(schema("General"));
        let addr: IpAddr = "10.0.0.1".parse().expect("addr");
        registry.register(addr, schema("PerSource"));

        assert_eq!(registry.schema_for(addr).map(|s| s.protocol()), Some("PerSource"));
        let other: IpAddr = "10.0.0.2".parse().expect("addr");
        assert_eq!(registry.schema_for(other).map(|s| s.protocol()), Some("General"));
    }

    #[test]
    fn empty_registry_matches_nothing() {
        let registry = DissectorRegistry::new();
        assert!(registry.is_empty());
        let addr: IpAddr = "10.0.0.1".parse().expect("addr");
        assert!(registry.schema_for(addr).is_none());
    }
}
