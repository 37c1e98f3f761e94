//! Rewriting of one method body.
//!
//! Each static invocation is checked against two independent rules:
//!
//! 1. A call to the unit's own call-site factory is sent to the synthesized
//!    wrapper instead, so the table gets registered with the shim.
//! 2. A call matching the rewrite table becomes `ldc "<unit>"` followed by a
//!    call to the shim; the unit name lands after the original arguments.
//!
//! Everything else passes through untouched, except the method's `Maxs`: once
//! a table redirect has been made, `max_stack` grows by one for the pushed
//! unit name. The `ldc` is consumed by the very next instruction, so one slot
//! covers any number of redirects.

use std::sync::Arc;

use instrument_types::{Insn, MethodCall};
use smallvec::{smallvec, SmallVec};
use tracing::trace;

use crate::rewrite_table::{self, CallSignature, INSTRUMENTED_CALL_SITE_METHOD};
use crate::stats::RewriteStats;
use crate::unit_visitor::UnitIdentity;

/// Replacement for one input instruction.
pub type Rewritten = SmallVec<[Insn; 2]>;

/// Rewriter for the instructions of a single method.
#[derive(Debug)]
pub struct MethodBodyRewriter {
    unit: Arc<UnitIdentity>,
    method: String,
    rewritten: usize,
    redirected: usize,
}

impl MethodBodyRewriter {
    pub fn new(unit: Arc<UnitIdentity>, method: impl Into<String>) -> Self {
        Self {
            unit,
            method: method.into(),
            rewritten: 0,
            redirected: 0,
        }
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    /// Call instructions rewritten so far in this method.
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    pub fn rewrite(&mut self, insn: Insn, stats: &mut RewriteStats) -> Rewritten {
        let call = match insn {
            Insn::Invoke(call) if call.is_static() => call,
            Insn::Maxs {
                max_stack,
                max_locals,
            } if self.redirected > 0 => {
                return smallvec![Insn::Maxs {
                    max_stack: max_stack.saturating_add(1),
                    max_locals,
                }];
            }
            other => return smallvec![other],
        };

        if self.is_own_factory_call(&call) {
            trace!(
                unit = self.unit.binary_name(),
                method = %self.method,
                "redirecting call-site factory to wrapper"
            );
            stats.record_factory_call();
            self.rewritten += 1;
            return smallvec![Insn::Invoke(MethodCall::invoke_static(
                self.unit.internal_name(),
                INSTRUMENTED_CALL_SITE_METHOD,
                &call.descriptor,
            ))];
        }

        let target = rewrite_table::lookup(&CallSignature::of(&call));
        match target {
            Some(target) => {
                trace!(
                    unit = self.unit.binary_name(),
                    method = %self.method,
                    owner = %call.owner,
                    callee = %call.name,
                    descriptor = %call.descriptor,
                    shim = target.name,
                    "redirecting call to shim"
                );
                stats.record_redirect(target);
                self.rewritten += 1;
                self.redirected += 1;
                smallvec![
                    Insn::ldc_string(self.unit.binary_name()),
                    Insn::Invoke(target.to_call()),
                ]
            }
            None => smallvec![Insn::Invoke(call)],
        }
    }

    fn is_own_factory_call(&self, call: &MethodCall) -> bool {
        call.owner == self.unit.internal_name()
            && rewrite_table::is_call_site_factory(&call.name, &call.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewrite_table::{rules, RETURN_CALL_SITE_ARRAY, SHIM_OWNER};
    use instrument_types::{opcodes, Constant, InvokeKind, Label};

    fn rewriter() -> MethodBodyRewriter {
        MethodBodyRewriter::new(
            Arc::new(UnitIdentity::from_internal_name("com/example/Foo")),
            "run",
        )
    }

    fn static_call(owner: &str, name: &str, descriptor: &str) -> Insn {
        Insn::Invoke(MethodCall::invoke_static(owner, name, descriptor))
    }

    #[test]
    fn test_every_rule_redirects_with_unit_name() {
        for rule in rules() {
            let mut rw = rewriter();
            let mut stats = RewriteStats::default();
            let out = rw.rewrite(
                static_call(rule.call.owner, rule.call.name, rule.call.descriptor),
                &mut stats,
            );
            assert_eq!(out.len(), 2);
            assert_eq!(
                out[0],
                Insn::Ldc {
                    value: Constant::String("com.example.Foo".to_string())
                }
            );
            let call = out[1].as_call().unwrap();
            assert_eq!(call.kind, InvokeKind::Static);
            assert_eq!(call.owner, SHIM_OWNER);
            assert_eq!(call.name, rule.target.name);
            assert_eq!(call.descriptor, rule.target.descriptor);
            assert!(!call.is_interface);
            assert_eq!(stats.redirected_calls, 1);
            assert_eq!(rw.rewritten(), 1);
        }
    }

    #[test]
    fn test_non_static_invocations_pass_through() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        for kind in [InvokeKind::Virtual, InvokeKind::Special, InvokeKind::Interface] {
            let insn = Insn::Invoke(MethodCall::new(
                kind,
                "java/lang/System",
                "getProperty",
                "(Ljava/lang/String;)Ljava/lang/String;",
            ));
            let out = rw.rewrite(insn.clone(), &mut stats);
            assert_eq!(out.as_slice(), &[insn]);
        }
        assert!(stats.is_unchanged());
    }

    #[test]
    fn test_unlisted_calls_pass_through() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        for insn in [
            static_call(
                "java/lang/System",
                "getenv",
                "(Ljava/lang/String;)Ljava/lang/String;",
            ),
            static_call("java/lang/System", "currentTimeMillis", "()J"),
            static_call("java/lang/Integer", "valueOf", "(I)Ljava/lang/Integer;"),
            static_call(
                "java/lang/Boolean",
                "getBoolean",
                "(Ljava/lang/String;)Ljava/lang/Boolean;",
            ),
        ] {
            let out = rw.rewrite(insn.clone(), &mut stats);
            assert_eq!(out.as_slice(), &[insn]);
        }
        assert_eq!(rw.rewritten(), 0);
    }

    #[test]
    fn test_other_instructions_pass_through() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        for insn in [
            Insn::op(opcodes::DUP),
            Insn::ldc_string("os.name"),
            Insn::Label { label: Label(3) },
            Insn::Field {
                opcode: opcodes::GETSTATIC,
                owner: "java/lang/System".to_string(),
                name: "out".to_string(),
                descriptor: "Ljava/io/PrintStream;".to_string(),
            },
            Insn::InvokeDynamic {
                name: "get".to_string(),
                descriptor: "()Ljava/lang/String;".to_string(),
                bootstrap_owner: "java/lang/invoke/LambdaMetafactory".to_string(),
                bootstrap_name: "metafactory".to_string(),
                bootstrap_descriptor: "()V".to_string(),
                bootstrap_args: Vec::new(),
            },
        ] {
            let out = rw.rewrite(insn.clone(), &mut stats);
            assert_eq!(out.as_slice(), &[insn]);
        }
    }

    #[test]
    fn test_own_factory_call_goes_to_wrapper() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        let out = rw.rewrite(
            static_call("com/example/Foo", "$createCallSiteArray", RETURN_CALL_SITE_ARRAY),
            &mut stats,
        );
        assert_eq!(
            out.as_slice(),
            &[static_call(
                "com/example/Foo",
                "$instrumentedCallSiteArray",
                RETURN_CALL_SITE_ARRAY
            )]
        );
        assert_eq!(stats.factory_calls, 1);
        assert_eq!(stats.redirected_calls, 0);
    }

    #[test]
    fn test_maxs_after_redirects() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        let maxs = Insn::Maxs {
            max_stack: 3,
            max_locals: 1,
        };
        assert_eq!(rw.rewrite(maxs.clone(), &mut stats).as_slice(), &[maxs.clone()]);

        for _ in 0..2 {
            rw.rewrite(
                static_call("java/lang/Boolean", "getBoolean", "(Ljava/lang/String;)Z"),
                &mut stats,
            );
        }
        // one slot regardless of how many redirects
        let out = rw.rewrite(maxs, &mut stats);
        assert_eq!(
            out.as_slice(),
            &[Insn::Maxs {
                max_stack: 4,
                max_locals: 1
            }]
        );

        let out = rw.rewrite(
            Insn::Maxs {
                max_stack: u16::MAX,
                max_locals: 0,
            },
            &mut stats,
        );
        assert_eq!(
            out.as_slice(),
            &[Insn::Maxs {
                max_stack: u16::MAX,
                max_locals: 0
            }]
        );
    }

    #[test]
    fn test_factory_redirect_keeps_maxs() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        rw.rewrite(
            static_call("com/example/Foo", "$createCallSiteArray", RETURN_CALL_SITE_ARRAY),
            &mut stats,
        );
        let maxs = Insn::Maxs {
            max_stack: 1,
            max_locals: 0,
        };
        assert_eq!(rw.rewrite(maxs.clone(), &mut stats).as_slice(), &[maxs]);
    }

    #[test]
    fn test_foreign_factory_call_untouched() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        let insn = static_call("com/example/Bar", "$createCallSiteArray", RETURN_CALL_SITE_ARRAY);
        let out = rw.rewrite(insn.clone(), &mut stats);
        assert_eq!(out.as_slice(), &[insn]);

        // owner given in binary form is not the same unit
        let insn = static_call("com.example.Foo", "$createCallSiteArray", RETURN_CALL_SITE_ARRAY);
        let out = rw.rewrite(insn.clone(), &mut stats);
        assert_eq!(out.as_slice(), &[insn]);
        assert!(stats.is_unchanged());
    }

    #[test]
    fn test_factory_with_other_shape_untouched() {
        let mut rw = rewriter();
        let mut stats = RewriteStats::default();
        let insn = static_call("com/example/Foo", "$createCallSiteArray", "()[Ljava/lang/Object;");
        let out = rw.rewrite(insn.clone(), &mut stats);
        assert_eq!(out.as_slice(), &[insn]);
    }
}
