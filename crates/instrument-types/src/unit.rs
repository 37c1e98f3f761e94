//! In-memory compiled units.
//!
//! [`ClassUnit`] is the reader side of a traversal: it replays its contents as
//! [`ClassEvent`]s. [`UnitBuilder`] is the writer side: an [`EventSink`] that
//! assembles events back into a unit and rejects sequences that do not
//! describe one.

use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::event::{ClassEvent, ClassHeader, FieldDecl, Insn, MethodDecl};
use crate::sink::EventSink;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodDef {
    pub decl: MethodDecl,
    #[serde(default)]
    pub code: Vec<Insn>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Member {
    Field(FieldDecl),
    Method(MethodDef),
}

/// A compiled unit with its members in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassUnit {
    pub header: ClassHeader,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub members: Vec<Member>,
}

impl ClassUnit {
    pub fn new(header: ClassHeader) -> Self {
        Self {
            header,
            source_file: None,
            members: Vec::new(),
        }
    }

    /// Internal name of the unit.
    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.members.iter().filter_map(|m| match m {
            Member::Method(def) => Some(def),
            Member::Field(_) => None,
        })
    }

    pub fn method(&self, name: &str, descriptor: &str) -> Option<&MethodDef> {
        self.methods()
            .find(|def| def.decl.name == name && def.decl.descriptor == descriptor)
    }

    /// Feed this unit's events into `sink`, stopping at the first error.
    pub fn replay<S: EventSink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.accept(ClassEvent::Header(self.header.clone()))?;
        if let Some(file) = &self.source_file {
            sink.accept(ClassEvent::Source { file: file.clone() })?;
        }
        for member in &self.members {
            match member {
                Member::Field(field) => sink.accept(ClassEvent::Field(field.clone()))?,
                Member::Method(def) => {
                    sink.accept(ClassEvent::Method(def.decl.clone()))?;
                    for insn in &def.code {
                        sink.accept(ClassEvent::Code(insn.clone()))?;
                    }
                    sink.accept(ClassEvent::MethodEnd)?;
                }
            }
        }
        sink.accept(ClassEvent::End)
    }

    pub fn events(&self) -> Vec<ClassEvent> {
        let mut events = Vec::new();
        // Vec never refuses an event
        let _ = self.replay(&mut events);
        events
    }

    pub fn from_events<I>(events: I) -> Result<Self, UnitStreamError>
    where
        I: IntoIterator<Item = ClassEvent>,
    {
        let mut builder = UnitBuilder::new();
        for event in events {
            builder.push(event)?;
        }
        builder.finish()
    }
}

/// Event sequence that does not describe a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnitStreamError {
    /// A member or end event arrived before the header
    MissingHeader,
    /// A second header arrived
    DuplicateHeader { name: String },
    /// A field or method was declared while a method body was open
    MemberInsideMethod { method: String },
    /// An instruction arrived with no open method
    InstructionOutsideMethod,
    /// `MethodEnd` with no open method
    UnmatchedMethodEnd,
    /// `End` while a method body was still open
    UnterminatedMethod { method: String },
    /// Any event after `End`
    EventAfterEnd,
    /// The stream stopped before `End`
    MissingEnd,
}

impl fmt::Display for UnitStreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStreamError::MissingHeader => write!(f, "unit event stream has no header"),
            UnitStreamError::DuplicateHeader { name } => {
                write!(f, "unexpected second header for unit {}", name)
            }
            UnitStreamError::MemberInsideMethod { method } => {
                write!(f, "member declared inside the body of method {}", method)
            }
            UnitStreamError::InstructionOutsideMethod => {
                write!(f, "instruction outside of any method body")
            }
            UnitStreamError::UnmatchedMethodEnd => {
                write!(f, "method end without an open method")
            }
            UnitStreamError::UnterminatedMethod { method } => {
                write!(f, "unit ended inside the body of method {}", method)
            }
            UnitStreamError::EventAfterEnd => write!(f, "event after end of unit"),
            UnitStreamError::MissingEnd => write!(f, "unit event stream ended without End"),
        }
    }
}

impl std::error::Error for UnitStreamError {}

/// Sink that assembles a [`ClassUnit`].
#[derive(Debug, Default)]
pub struct UnitBuilder {
    header: Option<ClassHeader>,
    source_file: Option<String>,
    members: Vec<Member>,
    open_method: Option<MethodDef>,
    finished: bool,
}

impl UnitBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ClassEvent) -> Result<(), UnitStreamError> {
        if self.finished {
            return Err(UnitStreamError::EventAfterEnd);
        }
        match event {
            ClassEvent::Header(header) => {
                if self.header.is_some() {
                    return Err(UnitStreamError::DuplicateHeader { name: header.name });
                }
                self.header = Some(header);
            }
            ClassEvent::Source { file } => {
                self.require_header()?;
                self.source_file = Some(file);
            }
            ClassEvent::Field(field) => {
                self.require_member_position()?;
                self.members.push(Member::Field(field));
            }
            ClassEvent::Method(decl) => {
                self.require_member_position()?;
                self.open_method = Some(MethodDef {
                    decl,
                    code: Vec::new(),
                });
            }
            ClassEvent::Code(insn) => match &mut self.open_method {
                Some(def) => def.code.push(insn),
                None => return Err(UnitStreamError::InstructionOutsideMethod),
            },
            ClassEvent::MethodEnd => {
                let def = self
                    .open_method
                    .take()
                    .ok_or(UnitStreamError::UnmatchedMethodEnd)?;
                self.members.push(Member::Method(def));
            }
            ClassEvent::End => {
                self.require_member_position().map_err(|e| match e {
                    UnitStreamError::MemberInsideMethod { method } => {
                        UnitStreamError::UnterminatedMethod { method }
                    }
                    other => other,
                })?;
                self.finished = true;
            }
        }
        Ok(())
    }

    pub fn finish(self) -> Result<ClassUnit, UnitStreamError> {
        if !self.finished {
            return Err(UnitStreamError::MissingEnd);
        }
        let header = self.header.ok_or(UnitStreamError::MissingHeader)?;
        Ok(ClassUnit {
            header,
            source_file: self.source_file,
            members: self.members,
        })
    }

    fn require_header(&self) -> Result<(), UnitStreamError> {
        if self.header.is_none() {
            return Err(UnitStreamError::MissingHeader);
        }
        Ok(())
    }

    fn require_member_position(&self) -> Result<(), UnitStreamError> {
        self.require_header()?;
        if let Some(def) = &self.open_method {
            return Err(UnitStreamError::MemberInsideMethod {
                method: def.decl.name.clone(),
            });
        }
        Ok(())
    }
}

impl EventSink for UnitBuilder {
    fn accept(&mut self, event: ClassEvent) -> Result<()> {
        self.push(event)?;
        Ok(())
    }
}
