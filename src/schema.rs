//! Field schema: ordered, immutable description of the fields a frame carries.

use std::collections::HashMap;

/// Wire kind of one field. All integers are unsigned big-endian.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Unsigned integer of 1..=8 bytes.
    UInt(u32),
    /// IEEE-754 single (4 bytes).
    Float,
    /// IEEE-754 double (8 bytes).
    Double,
    /// Fixed-size raw byte span.
    Bytes(u32),
    /// Fixed-size text span (lossy UTF-8 on decode).
    Text(u32),
    /// Byte span sized by the decoded value of an earlier integer field.
    DynBytes { length_source: String },
    /// Text span sized by the decoded value of an earlier integer field.
    DynText { length_source: String },
}

impl FieldKind {
    /// Declared byte width; `None` for dynamic spans.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            FieldKind::UInt(w) | FieldKind::Bytes(w) | FieldKind::Text(w) => Some(*w as usize),
            FieldKind::Float => Some(4),
            FieldKind::Double => Some(8),
            FieldKind::DynBytes { .. } | FieldKind::DynText { .. } => None,
        }
    }

    /// Name of the field supplying this field's length, for dynamic spans.
    pub fn length_source(&self) -> Option<&str> {
        match self {
            FieldKind::DynBytes { length_source } | FieldKind::DynText { length_source } => {
                Some(length_source.as_str())
            }
            _ => None,
        }
    }

    /// Whether a decoded value of this kind can size a dynamic span.
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldKind::UInt(_))
    }
}

/// Inclusive bounds over a decoded numeric value. On a dynamic span the
/// bounds constrain the resolved length, not the span contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub min: u64,
    pub max: u64,
}

impl Range {
    pub fn contains(&self, v: u64) -> bool {
        v >= self.min && v <= self.max
    }

    pub fn contains_f64(&self, v: f64) -> bool {
        v >= self.min as f64 && v <= self.max as f64
    }
}

/// One schema entry. A `range` on a fixed `Bytes`/`Text` span has no numeric
/// value to check and is ignored at decode time.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub range: Option<Range>,
}

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("duplicate field name: {0}")]
    DuplicateField(String),
    #[error("field {field}: length source {length_source} is not declared")]
    UnknownLengthSource { field: String, length_source: String },
    #[error("field {field}: length source {length_source} must appear before the field it sizes")]
    ForwardLengthSource { field: String, length_source: String },
    #[error("field {field}: length source {length_source} is not an integer field")]
    NonNumericLengthSource { field: String, length_source: String },
    #[error("field {field}: dynamic length has no length source")]
    UnresolvedLengthSource { field: String },
    #[error("field {field}: range [{min}..{max}] is inverted")]
    InvertedRange { field: String, min: u64, max: u64 },
    #[error("field {field}: unsupported integer width {width} (expected 1..=8)")]
    UnsupportedWidth { field: String, width: u32 },
}

/// Ordered field schema plus a protocol label. Immutable after construction
/// and freely shareable across concurrent dissect calls.
///
/// Declaration order is decode order: a dynamic span may only be sized by a
/// field that appears strictly earlier. Length-source references are resolved
/// to positions here, once, so the decode loop never re-branches on names.
#[derive(Debug, Clone)]
pub struct Schema {
    protocol: String,
    fields: Vec<FieldSpec>,
    by_name: HashMap<String, usize>,
    sources: Vec<Option<usize>>,
}

impl Schema {
    pub fn new(protocol: impl Into<String>, fields: Vec<FieldSpec>) -> Result<Self, SchemaError> {
        let mut by_name = HashMap::new();
        for (i, f) in fields.iter().enumerate() {
            if by_name.insert(f.name.clone(), i).is_some() {
                return Err(SchemaError::DuplicateField(f.name.clone()));
            }
        }
        let mut sources = Vec::with_capacity(fields.len());
        for (i, f) in fields.iter().enumerate() {
            if let Some(r) = f.range {
                if r.min > r.max {
                    return Err(SchemaError::InvertedRange {
                        field: f.name.clone(),
                        min: r.min,
                        max: r.max,
                    });
                }
            }
            if let FieldKind::UInt(w) = f.kind {
                if w == 0 || w > 8 {
                    return Err(SchemaError::UnsupportedWidth {
                        field: f.name.clone(),
                        width: w,
                    });
                }
            }
            let source = match f.kind.length_source() {
                Some(name) => {
                    let pos = *by_name.get(name).ok_or_else(|| SchemaError::UnknownLengthSource {
                        field: f.name.clone(),
                        length_source: name.to_string(),
                    })?;
                    if pos >= i {
                        return Err(SchemaError::ForwardLengthSource {
                            field: f.name.clone(),
                            length_source: name.to_string(),
                        });
                    }
                    if !fields[pos].kind.is_numeric() {
                        return Err(SchemaError::NonNumericLengthSource {
                            field: f.name.clone(),
                            length_source: name.to_string(),
                        });
                    }
                    Some(pos)
                }
                None => None,
            };
            sources.push(source);
        }
        Ok(Schema {
            protocol: protocol.into(),
            fields,
            by_name,
            sources,
        })
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Position of a field by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Resolved position of the length source for the field at `index`, if
    /// that field is a dynamic span.
    pub(crate) fn length_source_position(&self, index: usize) -> Option<usize> {
        self.sources.get(index).copied().flatten()
    }
}
