//! Format dissect results for display (field tree, info line).

use crate::dissect::{DissectResult, DissectStatus};
use crate::value::Value;

/// Raw display string for one value.
pub fn format_value(v: &Value) -> String {
    match v {
        Value::U8(x) => format!("{}", x),
        Value::U16(x) => format!("{}", x),
        Value::U32(x) => format!("{}", x),
        Value::U64(x) => format!("{}", x),
        Value::Float(x) => format!("{}", x),
        Value::Double(x) => format!("{}", x),
        Value::Bytes(b) => format!("hex({})", hex_string(b)),
        Value::Text(s) => s.clone(),
    }
}

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

fn status_label(status: DissectStatus) -> &'static str {
    match status {
        DissectStatus::Valid => "valid",
        DissectStatus::Warnings => "warnings",
        DissectStatus::Truncated => "truncated",
    }
}

/// Multi-line dump: status, one line per decoded field with its byte range
/// and any violation note, then the diagnostic list.
pub fn result_to_dump(result: &DissectResult) -> String {
    let mut lines = vec![format!("status: {}", status_label(result.status))];
    for f in &result.fields {
        let (start, end) = f.byte_range;
        let mut line = format!("  {} [{}-{}]: {}", f.name, start, end, format_value(&f.value));
        if let Some(ref note) = f.violation {
            line.push_str("  !! ");
            line.push_str(note);
        }
        lines.push(line);
    }
    if !result.diagnostics.is_empty() {
        lines.push("diagnostics:".to_string());
        for d in &result.diagnostics {
            lines.push(format!("  {}", d));
        }
    }
    lines.join("\n")
}

/// Info-column summary: `[DPI Error: ...]` when any diagnostic was recorded,
/// otherwise the decoded fields as `name=value` pairs sorted by name.
pub fn info_line(result: &DissectResult) -> String {
    if !result.diagnostics.is_empty() {
        let msgs: Vec<&str> = result.diagnostics.iter().map(|d| d.message.as_str()).collect();
        format!("[DPI Error: {}]", msgs.join("; "))
    } else {
        let mut parts: Vec<String> = result
            .fields
            .iter()
            .map(|f| format!("{}={}", f.name, format_value(&f.value)))
            .collect();
        parts.sort();
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dissect::{DecodedField, Diagnostic, DiagnosticKind};

    fn valid_result() -> DissectResult {
        DissectResult {
            fields: vec![
                DecodedField {
                    name: "sync".to_string(),
                    byte_range: (0, 1),
                    value: Value::U8(1),
                    violation: None,
                },
                DecodedField {
                    name: "id".to_string(),
                    byte_range: (1, 5),
                    value: Value::U32(5000),
                    violation: None,
                },
            ],
            status: DissectStatus::Valid,
            diagnostics: vec![],
        }
    }

    #[test]
    fn info_line_sorts_field_pairs() {
        assert_eq!(info_line(&valid_result()), "id=5000, sync=1");
    }

    #[test]
    fn info_line_reports_dpi_error() {
        let mut result = valid_result();
        result.status = DissectStatus::Warnings;
        result.diagnostics.push(Diagnostic {
            field: "id".to_string(),
            kind: DiagnosticKind::ValueOutOfRange,
            message: "id out of range".to_string(),
        });
        assert_eq!(info_line(&result), "[DPI Error: id out of range]");
    }

    #[test]
    fn dump_marks_violations() {
        let mut result = valid_result();
        result.status = DissectStatus::Warnings;
        result.fields[1].violation = Some("id out of range".to_string());
        let dump = result_to_dump(&result);
        assert!(dump.contains("status: warnings"));
        assert!(dump.contains("id [1-5]: 5000  !! id out of range"));
    }
}
