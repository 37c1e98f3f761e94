//! Per-unit pipeline stage.
//!
//! [`InstrumentingStage`] sits in front of an arbitrary downstream
//! [`EventSink`]. It forwards every event in order, routing method body
//! instructions through a [`MethodBodyRewriter`], and adds one synthesized
//! method before the end of the unit when the unit declares a call-site table
//! factory.
//!
//! All mutable state lives in a [`UnitContext`] owned by the stage, and a stage
//! handles exactly one unit. Concurrent units each get their own stage.

use std::sync::Arc;

use anyhow::Result;
use instrument_types::{
    access, binary_name, opcodes, ClassEvent, EventSink, Insn, MethodCall, MethodDecl,
};
use tracing::debug;

use crate::method_rewriter::MethodBodyRewriter;
use crate::rewrite_table::{
    is_call_site_factory, CREATE_CALL_SITE_ARRAY_METHOD, INSTRUMENTED_CALL_SITE_METHOD,
    REGISTER_CALL_SITES_METHOD, RETURN_CALL_SITE_ARRAY, RETURN_VOID_FROM_CALL_SITE_ARRAY,
    SHIM_OWNER,
};
use crate::stats::RewriteStats;

/// Name of the unit being rewritten, in both spellings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitIdentity {
    internal_name: String,
    binary_name: String,
}

impl UnitIdentity {
    pub fn from_internal_name(internal_name: &str) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            binary_name: binary_name(internal_name),
        }
    }

    /// Slash-separated name, as used for call owners.
    pub fn internal_name(&self) -> &str {
        &self.internal_name
    }

    /// Dotted name, as passed to the shim.
    pub fn binary_name(&self) -> &str {
        &self.binary_name
    }
}

/// Traversal state of one unit.
#[derive(Debug, Default)]
pub enum UnitState {
    /// No header seen yet
    #[default]
    NotStarted,
    Active(ActiveUnit),
    /// End event received, wrapper being emitted
    Finalizing,
    Done,
}

#[derive(Debug)]
pub struct ActiveUnit {
    identity: Arc<UnitIdentity>,
    has_call_sites: bool,
    method: Option<MethodBodyRewriter>,
}

impl ActiveUnit {
    fn new(identity: UnitIdentity) -> Self {
        Self {
            identity: Arc::new(identity),
            has_call_sites: false,
            method: None,
        }
    }
}

/// Everything the stage knows about the unit it is rewriting.
#[derive(Debug, Default)]
pub struct UnitContext {
    state: UnitState,
    stats: RewriteStats,
}

impl UnitContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UnitState {
        &self.state
    }

    pub fn identity(&self) -> Option<&UnitIdentity> {
        match &self.state {
            UnitState::Active(unit) => Some(&unit.identity),
            _ => None,
        }
    }

    /// Whether a call-site table factory has been declared so far.
    pub fn has_call_sites(&self) -> bool {
        matches!(&self.state, UnitState::Active(unit) if unit.has_call_sites)
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, UnitState::Done)
    }

    pub fn stats(&self) -> &RewriteStats {
        &self.stats
    }

    /// Rewrite one event and hand the result to `downstream`.
    pub fn transform<S: EventSink + ?Sized>(
        &mut self,
        event: ClassEvent,
        downstream: &mut S,
    ) -> Result<()> {
        match event {
            ClassEvent::Header(header) => {
                let identity = UnitIdentity::from_internal_name(&header.name);
                downstream.accept(ClassEvent::Header(header))?;
                if matches!(self.state, UnitState::NotStarted) {
                    self.state = UnitState::Active(ActiveUnit::new(identity));
                }
                Ok(())
            }
            ClassEvent::Method(decl) => {
                if let UnitState::Active(unit) = &mut self.state {
                    if is_call_site_factory(&decl.name, &decl.descriptor) {
                        unit.has_call_sites = true;
                    }
                    unit.method = Some(MethodBodyRewriter::new(
                        Arc::clone(&unit.identity),
                        decl.name.clone(),
                    ));
                }
                downstream.accept(ClassEvent::Method(decl))
            }
            ClassEvent::Code(insn) => match &mut self.state {
                UnitState::Active(ActiveUnit {
                    method: Some(rewriter),
                    ..
                }) => {
                    for out in rewriter.rewrite(insn, &mut self.stats) {
                        downstream.accept(ClassEvent::Code(out))?;
                    }
                    Ok(())
                }
                _ => downstream.accept(ClassEvent::Code(insn)),
            },
            ClassEvent::MethodEnd => {
                if let UnitState::Active(unit) = &mut self.state {
                    if let Some(rewriter) = unit.method.take() {
                        if rewriter.rewritten() > 0 {
                            debug!(
                                unit = unit.identity.binary_name(),
                                method = rewriter.method(),
                                rewritten = rewriter.rewritten(),
                                "rewrote method body"
                            );
                        }
                    }
                }
                downstream.accept(ClassEvent::MethodEnd)
            }
            ClassEvent::End => {
                let state = std::mem::replace(&mut self.state, UnitState::Finalizing);
                if let UnitState::Active(unit) = state {
                    if unit.has_call_sites {
                        debug!(
                            unit = unit.identity.binary_name(),
                            "synthesizing call-site table wrapper"
                        );
                        for event in call_site_wrapper_events(&unit.identity) {
                            downstream.accept(event)?;
                        }
                        self.stats.record_wrapper();
                    }
                    debug!(
                        unit = unit.identity.binary_name(),
                        redirected = self.stats.redirected_calls,
                        factory_calls = self.stats.factory_calls,
                        wrapper = unit.has_call_sites,
                        "finished unit"
                    );
                }
                downstream.accept(ClassEvent::End)?;
                self.state = UnitState::Done;
                Ok(())
            }
            other => downstream.accept(other),
        }
    }
}

/// Events of the wrapper method added to units that build call-site tables.
///
/// The wrapper calls the factory, hands a duplicate of the table to the shim,
/// and returns the table. Its body is emitted as-is and never rewritten.
pub fn call_site_wrapper_events(unit: &UnitIdentity) -> Vec<ClassEvent> {
    vec![
        ClassEvent::Method(MethodDecl {
            access: access::STATIC | access::SYNTHETIC | access::PRIVATE,
            name: INSTRUMENTED_CALL_SITE_METHOD.to_string(),
            descriptor: RETURN_CALL_SITE_ARRAY.to_string(),
            signature: None,
            exceptions: Vec::new(),
        }),
        ClassEvent::Code(Insn::Invoke(MethodCall::invoke_static(
            unit.internal_name(),
            CREATE_CALL_SITE_ARRAY_METHOD,
            RETURN_CALL_SITE_ARRAY,
        ))),
        ClassEvent::Code(Insn::op(opcodes::DUP)),
        ClassEvent::Code(Insn::Invoke(MethodCall::invoke_static(
            SHIM_OWNER,
            REGISTER_CALL_SITES_METHOD,
            RETURN_VOID_FROM_CALL_SITE_ARRAY,
        ))),
        ClassEvent::Code(Insn::op(opcodes::ARETURN)),
        ClassEvent::Code(Insn::Maxs {
            max_stack: 2,
            max_locals: 0,
        }),
        ClassEvent::MethodEnd,
    ]
}

/// Instrumenting stage for one unit, in front of `downstream`.
#[derive(Debug)]
pub struct InstrumentingStage<S> {
    context: UnitContext,
    downstream: S,
}

impl<S: EventSink> InstrumentingStage<S> {
    pub fn new(downstream: S) -> Self {
        Self {
            context: UnitContext::new(),
            downstream,
        }
    }

    pub fn context(&self) -> &UnitContext {
        &self.context
    }

    pub fn stats(&self) -> &RewriteStats {
        self.context.stats()
    }

    pub fn downstream(&self) -> &S {
        &self.downstream
    }

    /// Give back the downstream sink along with what was rewritten.
    pub fn into_parts(self) -> (S, RewriteStats) {
        (self.downstream, self.context.stats)
    }
}

impl<S: EventSink> EventSink for InstrumentingStage<S> {
    fn accept(&mut self, event: ClassEvent) -> Result<()> {
        self.context.transform(event, &mut self.downstream)
    }
}
