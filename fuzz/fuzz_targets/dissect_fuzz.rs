//! Dissect fuzz target: arbitrary buffers against a fixed schema.
//! dissect must never panic; any buffer yields None or a DissectResult.
//! Build with: cargo fuzz run dissect_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
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

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    use std::sync::OnceLock;
    static SCHEMA: OnceLock<dpidissect::Schema> = OnceLock::new();
    let schema = SCHEMA.get_or_init(|| dpidissect::parse(SENSOR_DSL).expect("schema"));
    let _ = dpidissect::dissect(schema, data);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run dissect_fuzz");
}
