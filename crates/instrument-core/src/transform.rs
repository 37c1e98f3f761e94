//! Classpath transform facade.
//!
//! This is the surface an external classpath cache talks to: it asks for the
//! configuration fingerprint once, then for an instrumenting stage per
//! discovered entry.

use std::path::{Path, PathBuf};

use anyhow::Result;
use instrument_types::{ClassUnit, EventSink, UnitBuilder};

use crate::fingerprint::{ConfigHasher, Sha256ConfigHasher};
use crate::stats::RewriteStats;
use crate::unit_visitor::InstrumentingStage;

/// Identifier written into the cache key.
pub const TRANSFORM_ID: &str = "InstrumentingTransformer";

/// Decoration format. Increment when the rewrite rules or the synthesized
/// wrapper change.
pub const FORMAT_VERSION: i32 = 6;

/// A compiled unit found on the classpath.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClasspathEntry {
    path: PathBuf,
}

impl ClasspathEntry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the unit relative to its classpath root.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The instrumenting transform.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstrumentingTransform;

impl InstrumentingTransform {
    pub fn apply_configuration_to(&self, hasher: &mut dyn ConfigHasher) {
        hasher.put_string(TRANSFORM_ID);
        hasher.put_int(FORMAT_VERSION);
    }

    /// SHA-256 of the configuration, hex encoded.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256ConfigHasher::new();
        self.apply_configuration_to(&mut hasher);
        hasher.finish_hex()
    }

    /// Stage for one entry. The entry keeps its path; only its content changes.
    pub fn apply<S: EventSink>(
        &self,
        entry: &ClasspathEntry,
        downstream: S,
    ) -> (PathBuf, InstrumentingStage<S>) {
        (entry.path().to_path_buf(), InstrumentingStage::new(downstream))
    }

    /// Rewrite an in-memory unit.
    pub fn instrument(&self, unit: &ClassUnit) -> Result<InstrumentedUnit> {
        let mut stage = InstrumentingStage::new(UnitBuilder::new());
        unit.replay(&mut stage)?;
        let (builder, stats) = stage.into_parts();
        Ok(InstrumentedUnit {
            unit: builder.finish()?,
            stats,
        })
    }
}

/// A rewritten unit with what changed in it.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentedUnit {
    pub unit: ClassUnit,
    pub stats: RewriteStats,
}
