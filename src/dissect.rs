//! Decode one frame against a schema, accumulating DPI diagnostics.
//!
//! The engine walks fields in schema order with a byte cursor. Running out of
//! bytes is terminal: the fields decoded so far are kept and the pass stops,
//! since every later offset would be meaningless. A value (or dynamic length)
//! outside its declared range is recorded and decoding continues, so one bad
//! field does not hide the rest of the packet.

use crate::schema::{FieldKind, Schema};
use crate::value::Value;
use byteorder::{BigEndian, ByteOrder};

/// Terminal status of a dissect pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DissectStatus {
    /// Every field decoded, no diagnostics.
    Valid,
    /// Every field decoded, at least one range violation recorded.
    Warnings,
    /// Ran out of bytes; the result holds the fields decoded before the gap.
    Truncated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    ValueOutOfRange,
    LengthOutOfRange,
    Truncated,
}

/// One human-readable finding, tied to the field that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub field: String,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Result of decoding one field.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedField {
    pub name: String,
    /// Byte span `[start, end)` consumed from the buffer.
    pub byte_range: (usize, usize),
    pub value: Value,
    /// Range-violation note, if the decoded value (or the dynamic length)
    /// fell outside the declared bounds.
    pub violation: Option<String>,
}

/// Everything one dissect pass produced. Immutable once returned; diagnostics
/// are kept in field order.
#[derive(Debug, Clone, PartialEq)]
pub struct DissectResult {
    pub fields: Vec<DecodedField>,
    pub status: DissectStatus,
    pub diagnostics: Vec<Diagnostic>,
}

impl DissectResult {
    pub fn is_valid(&self) -> bool {
        matches!(self.status, DissectStatus::Valid)
    }

    pub fn field(&self, name: &str) -> Option<&DecodedField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Decode `buffer` against `schema`, field by field in declared order.
///
/// Pure function of its inputs: no shared state, no I/O. An empty buffer is
/// treated as "not this protocol" and yields `None`. Safe to call from any
/// number of threads over one shared [`Schema`].
pub fn dissect(schema: &Schema, buffer: &[u8]) -> Option<DissectResult> {
    if buffer.is_empty() {
        return None;
    }
    let mut fields: Vec<DecodedField> = Vec::with_capacity(schema.len());
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    // Decoded integer value per schema position; non-integer fields hold 0
    // and can never be a length source (rejected at construction).
    let mut numeric: Vec<u64> = Vec::with_capacity(schema.len());
    let mut offset = 0usize;

    for (i, spec) in schema.fields().iter().enumerate() {
        let mut violation: Option<String> = None;
        let width = match &spec.kind {
            FieldKind::UInt(w) | FieldKind::Bytes(w) | FieldKind::Text(w) => *w as usize,
            FieldKind::Float => 4,
            FieldKind::Double => 8,
            FieldKind::DynBytes { .. } | FieldKind::DynText { .. } => {
                let len = schema
                    .length_source_position(i)
                    .map(|src| numeric[src])
                    .unwrap_or(0);
                // A bad length is a semantic finding; the span is still
                // decoded if the buffer actually holds that many bytes.
                if let Some(range) = spec.range {
                    if !range.contains(len) {
                        let message = format!("{} length out of range", spec.name);
                        violation = Some(message.clone());
                        diagnostics.push(Diagnostic {
                            field: spec.name.clone(),
                            kind: DiagnosticKind::LengthOutOfRange,
                            message,
                        });
                    }
                }
                len as usize
            }
        };

        let available = buffer.len() - offset;
        if available < width {
            diagnostics.push(Diagnostic {
                field: spec.name.clone(),
                kind: DiagnosticKind::Truncated,
                message: format!(
                    "Not enough bytes for {}: need {}, have {}",
                    spec.name, width, available
                ),
            });
            return Some(DissectResult {
                fields,
                status: DissectStatus::Truncated,
                diagnostics,
            });
        }

        let raw = &buffer[offset..offset + width];
        let value = decode_value(&spec.kind, raw);

        // Dynamic spans were range-checked through their length above.
        if let Some(range) = spec.range {
            match &spec.kind {
                FieldKind::UInt(_) => {
                    let v = value.as_u64().unwrap_or(0);
                    if !range.contains(v) {
                        let message = format!("{} out of range", spec.name);
                        violation = Some(message.clone());
                        diagnostics.push(Diagnostic {
                            field: spec.name.clone(),
                            kind: DiagnosticKind::ValueOutOfRange,
                            message,
                        });
                    }
                }
                FieldKind::Float | FieldKind::Double => {
                    let v = value.as_f64().unwrap_or(0.0);
                    if !range.contains_f64(v) {
                        let message = format!("{} out of range", spec.name);
                        violation = Some(message.clone());
                        diagnostics.push(Diagnostic {
                            field: spec.name.clone(),
                            kind: DiagnosticKind::ValueOutOfRange,
                            message,
                        });
                    }
                }
                _ => {}
            }
        }

        numeric.push(value.as_u64().unwrap_or(0));
        fields.push(DecodedField {
            name: spec.name.clone(),
            byte_range: (offset, offset + width),
            value,
            violation,
        });
        offset += width;
    }

    let status = if diagnostics.is_empty() {
        DissectStatus::Valid
    } else {
        DissectStatus::Warnings
    };
    Some(DissectResult {
        fields,
        status,
        diagnostics,
    })
}

fn decode_value(kind: &FieldKind, raw: &[u8]) -> Value {
    match kind {
        FieldKind::UInt(w) => match w {
            1 => Value::U8(raw[0]),
            2 => Value::U16(BigEndian::read_u16(raw)),
            4 => Value::U32(BigEndian::read_u32(raw)),
            8 => Value::U64(BigEndian::read_u64(raw)),
            _ => Value::U64(BigEndian::read_uint(raw, *w as usize)),
        },
        FieldKind::Float => Value::Float(BigEndian::read_f32(raw)),
        FieldKind::Double => Value::Double(BigEndian::read_f64(raw)),
        FieldKind::Bytes(_) | FieldKind::DynBytes { .. } => Value::Bytes(raw.to_vec()),
        FieldKind::Text(_) | FieldKind::DynText { .. } => {
            Value::Text(String::from_utf8_lossy(raw).into_owned())
        }
    }
}
