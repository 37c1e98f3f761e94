//! CLI subcommand implementations for classpath-instrument

pub mod fingerprint;
pub mod output;
pub mod rewrite;
pub mod rules;
