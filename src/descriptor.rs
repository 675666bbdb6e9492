//! Compile per-endpoint field descriptors into a [`Schema`].
//!
//! The host's configuration layer describes each endpoint's fields as small
//! descriptors (declared type, byte width, dynamic-length wiring). This
//! module translates one ordered description into the [`FieldSpec`] model,
//! applying the same construction-time validation as [`Schema::new`]. A
//! dynamic field whose length source is absent is rejected here rather than
//! decoded against an undefined length.

use crate::schema::{FieldKind, FieldSpec, Range, Schema, SchemaError};

/// Declared type of a descriptor field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaredType {
    /// One-byte on/off value, decoded as an integer.
    Flag,
    Integer,
    Text,
}

/// One field as described by the endpoint configuration.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub declared_type: DeclaredType,
    /// Byte width for fixed fields; ignored for dynamic ones, whose width
    /// comes from the length source at decode time.
    pub min_width: u32,
    pub is_dynamic_length: bool,
    pub length_source: Option<String>,
    /// Inclusive bounds on the decoded value (or on the length, when
    /// `is_dynamic_length` is set).
    pub range: Option<(u64, u64)>,
}

/// Build a schema from ordered `(name, descriptor)` pairs.
pub fn compile(
    protocol: impl Into<String>,
    fields: &[(String, FieldDescriptor)],
) -> Result<Schema, SchemaError> {
    let mut specs = Vec::with_capacity(fields.len());
    for (name, d) in fields {
        let kind = if d.is_dynamic_length {
            let length_source = d.length_source.clone().ok_or_else(|| {
                SchemaError::UnresolvedLengthSource {
                    field: name.clone(),
                }
            })?;
            match d.declared_type {
                DeclaredType::Text => FieldKind::DynText { length_source },
                DeclaredType::Flag | DeclaredType::Integer => {
                    FieldKind::DynBytes { length_source }
                }
            }
        } else {
            match d.declared_type {
                DeclaredType::Flag => FieldKind::UInt(1),
                DeclaredType::Integer => FieldKind::UInt(d.min_width),
                DeclaredType::Text => FieldKind::Text(d.min_width),
            }
        };
        specs.push(FieldSpec {
            name: name.clone(),
            kind,
            range: d.range.map(|(min, max)| Range { min, max }),
        });
    }
    Schema::new(protocol, specs)
}
