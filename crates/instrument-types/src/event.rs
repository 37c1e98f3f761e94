//! Traversal events of a compiled unit.
//!
//! A unit is presented to a pipeline stage as an ordered sequence of
//! [`ClassEvent`]s: one header, then source and member declarations, with each
//! method declaration followed by its body instructions and a
//! [`ClassEvent::MethodEnd`], and finally [`ClassEvent::End`].
//!
//! Instructions mirror the operand shapes of the class file format closely
//! enough to round-trip a method body. Only [`Insn::Invoke`] is interpreted by
//! the rewrite engine; every other instruction is carried opaquely.

use serde::{Deserialize, Serialize};

/// Opcodes of instructions carried as [`Insn::Op`] and friends.
pub mod opcodes {
    pub const NOP: u8 = 0x00;
    pub const ACONST_NULL: u8 = 0x01;
    pub const ICONST_0: u8 = 0x03;
    pub const ICONST_1: u8 = 0x04;
    pub const BIPUSH: u8 = 0x10;
    pub const SIPUSH: u8 = 0x11;
    pub const ILOAD: u8 = 0x15;
    pub const LLOAD: u8 = 0x16;
    pub const ALOAD: u8 = 0x19;
    pub const ISTORE: u8 = 0x36;
    pub const ASTORE: u8 = 0x3a;
    pub const POP: u8 = 0x57;
    pub const DUP: u8 = 0x59;
    pub const IFEQ: u8 = 0x99;
    pub const IFNE: u8 = 0x9a;
    pub const GOTO: u8 = 0xa7;
    pub const IRETURN: u8 = 0xac;
    pub const LRETURN: u8 = 0xad;
    pub const ARETURN: u8 = 0xb0;
    pub const RETURN: u8 = 0xb1;
    pub const GETSTATIC: u8 = 0xb2;
    pub const PUTSTATIC: u8 = 0xb3;
    pub const GETFIELD: u8 = 0xb4;
    pub const PUTFIELD: u8 = 0xb5;
    pub const INVOKEVIRTUAL: u8 = 0xb6;
    pub const INVOKESPECIAL: u8 = 0xb7;
    pub const INVOKESTATIC: u8 = 0xb8;
    pub const INVOKEINTERFACE: u8 = 0xb9;
    pub const NEW: u8 = 0xbb;
    pub const NEWARRAY: u8 = 0xbc;
    pub const ANEWARRAY: u8 = 0xbd;
    pub const ATHROW: u8 = 0xbf;
    pub const CHECKCAST: u8 = 0xc0;
    pub const INSTANCEOF: u8 = 0xc1;
    pub const IFNULL: u8 = 0xc6;
    pub const IFNONNULL: u8 = 0xc7;
}

/// Access flags for units, fields and methods.
pub mod access {
    pub const PUBLIC: u16 = 0x0001;
    pub const PRIVATE: u16 = 0x0002;
    pub const PROTECTED: u16 = 0x0004;
    pub const STATIC: u16 = 0x0008;
    pub const FINAL: u16 = 0x0010;
    pub const SUPER: u16 = 0x0020;
    pub const INTERFACE: u16 = 0x0200;
    pub const ABSTRACT: u16 = 0x0400;
    pub const SYNTHETIC: u16 = 0x1000;
}

/// Branch target inside a method body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Label(pub u32);

/// Loadable constant operand of `ldc` and of constant-valued fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    /// Class literal, by internal name
    Class(String),
}

/// Dispatch kind of an invoke instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    Virtual,
    Special,
    Static,
    Interface,
}

impl InvokeKind {
    pub fn opcode(self) -> u8 {
        match self {
            InvokeKind::Virtual => opcodes::INVOKEVIRTUAL,
            InvokeKind::Special => opcodes::INVOKESPECIAL,
            InvokeKind::Static => opcodes::INVOKESTATIC,
            InvokeKind::Interface => opcodes::INVOKEINTERFACE,
        }
    }

    pub fn from_opcode(opcode: u8) -> Option<Self> {
        match opcode {
            opcodes::INVOKEVIRTUAL => Some(InvokeKind::Virtual),
            opcodes::INVOKESPECIAL => Some(InvokeKind::Special),
            opcodes::INVOKESTATIC => Some(InvokeKind::Static),
            opcodes::INVOKEINTERFACE => Some(InvokeKind::Interface),
            _ => None,
        }
    }
}

/// A method invocation instruction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodCall {
    pub kind: InvokeKind,
    /// Internal name of the owning type
    pub owner: String,
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub is_interface: bool,
}

impl MethodCall {
    pub fn new(kind: InvokeKind, owner: &str, name: &str, descriptor: &str) -> Self {
        Self {
            kind,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            is_interface: kind == InvokeKind::Interface,
        }
    }

    pub fn invoke_static(owner: &str, name: &str, descriptor: &str) -> Self {
        Self::new(InvokeKind::Static, owner, name, descriptor)
    }

    pub fn is_static(&self) -> bool {
        self.kind == InvokeKind::Static
    }
}

/// One instruction (or pseudo-instruction) of a method body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insn {
    /// Zero-operand instruction (`dup`, `areturn`, ...)
    Op { opcode: u8 },
    /// `bipush`, `sipush`, `newarray`
    Int { opcode: u8, operand: i32 },
    /// Local variable load/store
    Var { opcode: u8, var: u16 },
    /// `new`, `anewarray`, `checkcast`, `instanceof`
    Type { opcode: u8, type_name: String },
    Field {
        opcode: u8,
        owner: String,
        name: String,
        descriptor: String,
    },
    Invoke(MethodCall),
    InvokeDynamic {
        name: String,
        descriptor: String,
        bootstrap_owner: String,
        bootstrap_name: String,
        bootstrap_descriptor: String,
        #[serde(default)]
        bootstrap_args: Vec<Constant>,
    },
    Jump { opcode: u8, target: Label },
    Label { label: Label },
    Ldc { value: Constant },
    Iinc { var: u16, increment: i16 },
    TableSwitch {
        min: i32,
        max: i32,
        default: Label,
        targets: Vec<Label>,
    },
    LookupSwitch {
        default: Label,
        keys: Vec<i32>,
        targets: Vec<Label>,
    },
    MultiANewArray { descriptor: String, dimensions: u8 },
    TryCatch {
        start: Label,
        end: Label,
        handler: Label,
        exception_type: Option<String>,
    },
    LineNumber { line: u32, start: Label },
    Maxs { max_stack: u16, max_locals: u16 },
}

impl Insn {
    pub fn op(opcode: u8) -> Self {
        Insn::Op { opcode }
    }

    pub fn ldc_string(value: &str) -> Self {
        Insn::Ldc {
            value: Constant::String(value.to_string()),
        }
    }

    pub fn as_call(&self) -> Option<&MethodCall> {
        match self {
            Insn::Invoke(call) => Some(call),
            _ => None,
        }
    }
}

/// Declaration line of a unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassHeader {
    pub version: u32,
    pub access: u16,
    /// Internal name, e.g. `com/example/Foo`
    pub name: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub super_name: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub value: Option<Constant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDecl {
    pub access: u16,
    pub name: String,
    pub descriptor: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub exceptions: Vec<String>,
}

impl MethodDecl {
    pub fn is_static(&self) -> bool {
        self.access & access::STATIC != 0
    }
}

/// One traversal event of a unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassEvent {
    Header(ClassHeader),
    Source { file: String },
    Field(FieldDecl),
    /// Opens a method; its instructions follow as `Code` until `MethodEnd`
    Method(MethodDecl),
    Code(Insn),
    MethodEnd,
    End,
}
