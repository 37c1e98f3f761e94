//! Classpath Instrument Core
//!
//! Rewrites compiled units so that reads of system properties and of named
//! integer, long and boolean settings go through an instrumentation shim, which
//! learns the name of the unit performing each read.
//!
//! # Core Modules
//!
//! - [`rewrite_table`]: The closed catalog of redirected calls
//! - [`method_rewriter`]: Per-method instruction rewriting
//! - [`unit_visitor`]: Per-unit stage, call-site table wrapper synthesis
//! - [`transform`]: Facade used by a classpath cache (fingerprint, per-entry stage)
//! - [`batch`]: Parallel rewriting of many in-memory units
//!
//! # Example
//!
//! ```ignore
//! use instrument_core::InstrumentingTransform;
//!
//! let rewritten = InstrumentingTransform.instrument(&unit)?;
//! println!("{} calls redirected", rewritten.stats.redirected_calls);
//! ```

pub mod batch;
pub mod fingerprint;
pub mod method_rewriter;
pub mod rewrite_table;
pub mod stats;
pub mod transform;
pub mod unit_visitor;

pub use batch::{instrument_units, instrument_units_with_threads, summarize};
pub use fingerprint::{ConfigHasher, Sha256ConfigHasher};
pub use method_rewriter::MethodBodyRewriter;
pub use rewrite_table::{lookup, rules, CallSignature, RedirectTarget, RewriteRule, SHIM_OWNER};
pub use stats::RewriteStats;
pub use transform::{
    ClasspathEntry, InstrumentedUnit, InstrumentingTransform, FORMAT_VERSION, TRANSFORM_ID,
};
pub use unit_visitor::{InstrumentingStage, UnitContext, UnitIdentity, UnitState};

// Re-export the event model so callers need a single dependency
pub use instrument_types;
