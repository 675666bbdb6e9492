//! Benchmark: dissect synthesized sensor frames. Three shapes: fully valid,
//! out-of-range id (semantic diagnostics, full decode), and a 3-byte
//! truncation (structural abort).

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dpidissect::{dissect, parse};

const SENSOR_DSL: &str = r#"
protocol Sensor {
	sync: u8 [0..1];
	id: u32 [2242..8400];
	type: u32;
	length: u32 [7..14];
	payload: bytes(length);
	crc: u32 [232297096..4100283207];
	flag: u8 [0..1];
}
"#;

fn sensor_frame(id: u32, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    out.push(1u8);
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&3u32.to_be_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out.extend_from_slice(&300_000_000u32.to_be_bytes());
    out.push(1u8);
    out
}

fn bench_dissect(c: &mut Criterion) {
    let schema = parse(SENSOR_DSL).expect("schema");
    let valid = sensor_frame(5000, b"payload");
    let flagged = sensor_frame(9000, b"payload");
    let truncated = valid[..3].to_vec();

    c.bench_function("dissect_valid", |b| {
        b.iter(|| dissect(black_box(&schema), black_box(&valid)))
    });
    c.bench_function("dissect_flagged", |b| {
        b.iter(|| dissect(black_box(&schema), black_box(&flagged)))
    });
    c.bench_function("dissect_truncated", |b| {
        b.iter(|| dissect(black_box(&schema), black_box(&truncated)))
    });
}

criterion_group!(benches, bench_dissect);
criterion_main!(benches);
