//! Fingerprint command - print the transform's cache-key contribution

use anyhow::Result;
use clap::Parser;
use instrument_core::{InstrumentingTransform, FORMAT_VERSION, TRANSFORM_ID};
use serde::Serialize;

use super::output::print_json;

#[derive(Parser, Debug)]
pub struct FingerprintCmd {}

#[derive(Debug, Serialize)]
struct FingerprintOutput {
    transform_id: &'static str,
    format_version: i32,
    sha256: String,
}

impl FingerprintCmd {
    pub fn execute(&self, json_output: bool) -> Result<()> {
        let output = FingerprintOutput {
            transform_id: TRANSFORM_ID,
            format_version: FORMAT_VERSION,
            sha256: InstrumentingTransform.fingerprint(),
        };
        if json_output {
            print_json(&output)
        } else {
            println!("{} v{}", output.transform_id, output.format_version);
            println!("{}", output.sha256);
            Ok(())
        }
    }
}
