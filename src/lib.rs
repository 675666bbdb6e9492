//! # dpidissect — Schema-Driven Frame Dissector with DPI Validation
//!
//! Decodes fixed-shape binary frames (sync byte, numeric ids, a
//! length-prefixed payload, CRC, flag) against a runtime field schema and
//! validates every field against its declared numeric bounds, aggregating
//! human-readable diagnostics instead of stopping at the first problem.
//!
//! ## Model
//!
//! - **Schema**: ordered, immutable field list with a protocol label.
//!   Length-source references are resolved to positions at construction.
//! - **Dissect**: `dissect(schema, buffer)` walks fields in order. Missing
//!   bytes abort the pass (earlier fields kept, status `Truncated`); range
//!   violations are recorded and decoding continues.
//! - **Registry**: per-source-address schema dispatch with a fallback.
//!
//! ## Field kinds
//!
//! - `u8`, `u16`, `u32`, `u64` (unsigned, big-endian), `float`, `double`
//! - `bytes(n)`, `text(n)` fixed spans
//! - `bytes(field)`, `text(field)` spans sized by an earlier integer field
//! - Bounds: `[min..max]` (inclusive; on a dynamic span they constrain the
//!   resolved length)
//!
//! ## Example DSL
//!
//! ```text
//! protocol Sensor {
//!     sync: u8 [0..1];
//!     id: u32 [2242..8400];
//!     type: u32;
//!     length: u32 [7..14];
//!     payload: bytes(length);
//!     crc: u32 [232297096..4100283207];
//!     flag: u8 [0..1];
//! }
//! ```
//!
//! ## Usage
//!
//! Schemas come from the DSL ([`parse`]) or from endpoint descriptors
//! ([`descriptor::compile`]). See `tests/integration.rs` for full examples
//! and the `dissect_pcap` binary for capture-file tooling.

pub mod descriptor;
pub mod dissect;
pub mod dump;
pub mod parser;
pub mod registry;
pub mod schema;
pub mod value;

pub use dissect::{
    dissect, DecodedField, Diagnostic, DiagnosticKind, DissectResult, DissectStatus,
};
pub use parser::parse;
pub use registry::DissectorRegistry;
pub use schema::{FieldKind, FieldSpec, Range, Schema, SchemaError};
pub use value::Value;
