//! Shared types for the classpath-instrument workspace.
//!
//! This crate provides the structured representation of a compiled unit that the
//! rewriting engine consumes and produces, so the engine never has to touch class
//! file bytes directly.
//!
//! ## Event Model
//!
//! The [`event`] module contains the traversal events of one unit:
//! - [`ClassEvent`](event::ClassEvent) - Unit-level events (header, members, end)
//! - [`Insn`](event::Insn) - Method body instructions
//! - [`MethodCall`](event::MethodCall) - The invoke instructions the engine rewrites
//!
//! ## Units and Sinks
//!
//! - [`EventSink`](sink::EventSink) - Consumer end of a pipeline stage
//! - [`ClassUnit`](unit::ClassUnit) - In-memory unit that replays its events
//! - [`UnitBuilder`](unit::UnitBuilder) - Sink that assembles events back into a unit

pub mod descriptor;
pub mod env_utils;
pub mod event;
pub mod names;
pub mod sink;
pub mod unit;

pub use descriptor::{DescriptorError, JvmType, MethodDescriptor};
pub use event::{
    access, opcodes, ClassEvent, ClassHeader, Constant, FieldDecl, Insn, InvokeKind, Label,
    MethodCall, MethodDecl,
};
pub use names::{binary_name, internal_name};
pub use sink::EventSink;
pub use unit::{ClassUnit, Member, MethodDef, UnitBuilder, UnitStreamError};
