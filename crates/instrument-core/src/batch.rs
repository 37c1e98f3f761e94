//! Parallel rewriting of many units.
//!
//! Units share nothing but the static rewrite table, so each one is rewritten
//! on whichever worker picks it up, with its own stage and context.

use anyhow::{Context, Result};
use instrument_types::ClassUnit;
use rayon::prelude::*;
use tracing::info;

use crate::stats::RewriteStats;
use crate::transform::{InstrumentedUnit, InstrumentingTransform};

/// Rewrite `units` on the global rayon pool. Results keep input order.
pub fn instrument_units(units: &[ClassUnit]) -> Vec<Result<InstrumentedUnit>> {
    let transform = InstrumentingTransform;
    units
        .par_iter()
        .map(|unit| {
            transform
                .instrument(unit)
                .with_context(|| format!("instrument unit {}", unit.name()))
        })
        .collect()
}

/// Rewrite `units` on a dedicated pool of `threads` workers.
pub fn instrument_units_with_threads(
    units: &[ClassUnit],
    threads: usize,
) -> Result<Vec<Result<InstrumentedUnit>>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .context("build rewrite thread pool")?;
    Ok(pool.install(|| instrument_units(units)))
}

/// Merge the stats of every successfully rewritten unit.
pub fn summarize(results: &[Result<InstrumentedUnit>]) -> RewriteStats {
    let mut total = RewriteStats::default();
    let mut failed = 0usize;
    for result in results {
        match result {
            Ok(done) => total.merge(&done.stats),
            Err(_) => failed += 1,
        }
    }
    info!(
        units = results.len(),
        failed,
        redirected = total.redirected_calls,
        wrappers = total.wrappers_synthesized,
        "batch rewrite finished"
    );
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite_table::{CREATE_CALL_SITE_ARRAY_METHOD, RETURN_CALL_SITE_ARRAY};
    use instrument_types::{
        access, opcodes, ClassHeader, Insn, Member, MethodCall, MethodDecl, MethodDef,
    };

    fn unit(name: &str, code: Vec<Insn>) -> ClassUnit {
        let mut unit = ClassUnit::new(ClassHeader {
            version: 52,
            access: access::PUBLIC,
            name: name.to_string(),
            signature: None,
            super_name: None,
            interfaces: Vec::new(),
        });
        unit.members.push(Member::Method(MethodDef {
            decl: MethodDecl {
                access: access::STATIC,
                name: "m".to_string(),
                descriptor: "()V".to_string(),
                signature: None,
                exceptions: Vec::new(),
            },
            code,
        }));
        unit
    }

    fn get_long(name: &str) -> ClassUnit {
        unit(
            name,
            vec![
                Insn::ldc_string("timeout"),
                Insn::Invoke(MethodCall::invoke_static(
                    "java/lang/Long",
                    "getLong",
                    "(Ljava/lang/String;)Ljava/lang/Long;",
                )),
                Insn::op(opcodes::POP),
                Insn::op(opcodes::RETURN),
            ],
        )
    }

    #[test]
    fn test_results_keep_input_order_and_identity() {
        let units: Vec<ClassUnit> = (0..32).map(|i| get_long(&format!("p/Unit{}", i))).collect();
        let results = instrument_units(&units);
        assert_eq!(results.len(), 32);
        for (i, result) in results.iter().enumerate() {
            let done = result.as_ref().unwrap();
            assert_eq!(done.unit.name(), format!("p/Unit{}", i));
            let code = &done.unit.methods().next().unwrap().code;
            assert_eq!(code[1], Insn::ldc_string(&format!("p.Unit{}", i)));
        }
        let total = summarize(&results);
        assert_eq!(total.redirected_calls, 32);
        assert_eq!(total.by_target.get("getLong"), Some(&32));
    }

    #[test]
    fn test_factory_units_counted() {
        let mut with_factory = unit("p/Script", vec![Insn::op(opcodes::RETURN)]);
        with_factory.members.push(Member::Method(MethodDef {
            decl: MethodDecl {
                access: access::PRIVATE | access::STATIC,
                name: CREATE_CALL_SITE_ARRAY_METHOD.to_string(),
                descriptor: RETURN_CALL_SITE_ARRAY.to_string(),
                signature: None,
                exceptions: Vec::new(),
            },
            code: vec![Insn::op(opcodes::ACONST_NULL), Insn::op(opcodes::ARETURN)],
        }));
        let units = vec![with_factory, get_long("p/Other")];
        let results = instrument_units_with_threads(&units, 2).unwrap();
        let total = summarize(&results);
        assert_eq!(total.wrappers_synthesized, 1);
        assert_eq!(results[0].as_ref().unwrap().unit.methods().count(), 3);
        assert_eq!(results[1].as_ref().unwrap().unit.methods().count(), 1);
    }

    #[test]
    fn test_empty_batch() {
        let results = instrument_units(&[]);
        assert!(results.is_empty());
        assert_eq!(summarize(&results), RewriteStats::default());
    }
}
