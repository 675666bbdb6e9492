//! Parse schema DSL source into a [`Schema`] using PEST.

use crate::schema::{FieldKind, FieldSpec, Range, Schema};
use pest::Parser;
use pest_derive::Parser as PestParser;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// Parse schema source into a validated [`Schema`].
pub fn parse(source: &str) -> Result<Schema, String> {
    let pairs = SchemaParser::parse(Rule::protocol, source)
        .map_err(|e| format!("Parse error: {}", e))?;
    let pair = pairs.into_iter().next().ok_or("Empty parse")?;
    build_schema(pair)
}

fn build_schema(pair: pest::iterators::Pair<Rule>) -> Result<Schema, String> {
    let mut protocol = String::new();
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => protocol = inner.as_str().to_string(),
            Rule::field => fields.push(build_field(inner)?),
            _ => {}
        }
    }
    if protocol.is_empty() {
        return Err("protocol: missing name".to_string());
    }
    Schema::new(protocol, fields).map_err(|e| e.to_string())
}

fn build_field(pair: pest::iterators::Pair<Rule>) -> Result<FieldSpec, String> {
    let mut it = pair.into_inner();
    let name = it.next().ok_or("field: missing name")?.as_str().to_string();
    let type_pair = it.next().ok_or("field: missing type")?;
    let kind = build_kind(type_pair)?;
    let range = match it.next() {
        Some(r) if r.as_rule() == Rule::range => Some(build_range(r)?),
        _ => None,
    };
    Ok(FieldSpec { name, kind, range })
}

fn build_kind(pair: pest::iterators::Pair<Rule>) -> Result<FieldKind, String> {
    let inner = pair.into_inner().next().ok_or("field type: empty")?;
    match inner.as_rule() {
        Rule::uint_type => {
            let width = match inner.as_str() {
                "u8" => 1,
                "u16" => 2,
                "u32" => 4,
                "u64" => 8,
                other => return Err(format!("unknown integer type: {}", other)),
            };
            Ok(FieldKind::UInt(width))
        }
        Rule::scalar_type => Ok(match inner.as_str() {
            "float" => FieldKind::Float,
            _ => FieldKind::Double,
        }),
        Rule::span_type => {
            let mut it = inner.into_inner();
            let kind_pair = it.next().ok_or("span: missing kind")?;
            let len_pair = it.next().ok_or("span: missing length")?;
            let len_inner = len_pair.into_inner().next().ok_or("span: missing length")?;
            let text = kind_pair.as_str() == "text";
            match len_inner.as_rule() {
                Rule::number => {
                    let width: u32 = len_inner
                        .as_str()
                        .parse()
                        .map_err(|e| format!("span width: {}", e))?;
                    Ok(if text {
                        FieldKind::Text(width)
                    } else {
                        FieldKind::Bytes(width)
                    })
                }
                Rule::ident => {
                    let length_source = len_inner.as_str().to_string();
                    Ok(if text {
                        FieldKind::DynText { length_source }
                    } else {
                        FieldKind::DynBytes { length_source }
                    })
                }
                _ => Err("span: bad length".to_string()),
            }
        }
        _ => Err(format!("unknown field type: {}", inner.as_str())),
    }
}

fn build_range(pair: pest::iterators::Pair<Rule>) -> Result<Range, String> {
    let mut it = pair.into_inner();
    let min: u64 = it
        .next()
        .ok_or("range: missing min")?
        .as_str()
        .parse()
        .map_err(|e| format!("range min: {}", e))?;
    let max: u64 = it
        .next()
        .ok_or("range: missing max")?
        .as_str()
        .parse()
        .map_err(|e| format!("range max: {}", e))?;
    Ok(Range { min, max })
}
