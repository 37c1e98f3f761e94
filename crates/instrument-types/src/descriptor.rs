//! JVM type and method descriptors.
//!
//! Descriptors are the compact type strings used by compiled units:
//! - Field types: `I`, `J`, `Ljava/lang/String;`, `[Ljava/lang/Object;`
//! - Method shapes: `(Ljava/lang/String;I)Ljava/lang/Integer;`
//!
//! The rewrite engine compares descriptors as plain strings. This module exists
//! for building descriptors from parts and for rendering them readably.

use std::fmt;
use std::str::FromStr;

use crate::names::binary_name;

/// A JVM type as it appears in a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum JvmType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    /// Only valid as a method return type
    Void,
    /// Class or interface type, by internal name
    Object(String),
    Array(Box<JvmType>),
}

impl JvmType {
    pub fn object(internal_name: &str) -> Self {
        JvmType::Object(internal_name.to_string())
    }

    pub fn string() -> Self {
        Self::object("java/lang/String")
    }

    /// Parse a single field descriptor such as `Ljava/lang/Long;`.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut reader = Reader::new(descriptor);
        let ty = reader.next_type(false)?;
        reader.expect_end()?;
        Ok(ty)
    }

    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    fn write_descriptor(&self, out: &mut String) {
        match self {
            JvmType::Boolean => out.push('Z'),
            JvmType::Byte => out.push('B'),
            JvmType::Char => out.push('C'),
            JvmType::Short => out.push('S'),
            JvmType::Int => out.push('I'),
            JvmType::Long => out.push('J'),
            JvmType::Float => out.push('F'),
            JvmType::Double => out.push('D'),
            JvmType::Void => out.push('V'),
            JvmType::Object(name) => {
                out.push('L');
                out.push_str(name);
                out.push(';');
            }
            JvmType::Array(element) => {
                out.push('[');
                element.write_descriptor(out);
            }
        }
    }

    /// Source-level spelling, e.g. `java.lang.String` or `long[]`.
    pub fn class_name(&self) -> String {
        match self {
            JvmType::Boolean => "boolean".to_string(),
            JvmType::Byte => "byte".to_string(),
            JvmType::Char => "char".to_string(),
            JvmType::Short => "short".to_string(),
            JvmType::Int => "int".to_string(),
            JvmType::Long => "long".to_string(),
            JvmType::Float => "float".to_string(),
            JvmType::Double => "double".to_string(),
            JvmType::Void => "void".to_string(),
            JvmType::Object(name) => binary_name(name),
            JvmType::Array(element) => format!("{}[]", element.class_name()),
        }
    }
}

impl fmt::Display for JvmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

impl FromStr for JvmType {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        JvmType::parse(s)
    }
}

/// Parameter types and return type of a method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<JvmType>,
    pub ret: JvmType,
}

impl MethodDescriptor {
    pub fn new(ret: JvmType, params: Vec<JvmType>) -> Self {
        Self { params, ret }
    }

    /// Parse a method descriptor such as `(Ljava/lang/String;J)Ljava/lang/Long;`.
    pub fn parse(descriptor: &str) -> Result<Self, DescriptorError> {
        let mut reader = Reader::new(descriptor);
        if !reader.eat(b'(') {
            return Err(DescriptorError::MissingParameterList {
                descriptor: descriptor.to_string(),
            });
        }
        let mut params = Vec::new();
        while !reader.eat(b')') {
            params.push(reader.next_type(false)?);
        }
        let ret = reader.next_type(true)?;
        reader.expect_end()?;
        Ok(Self { params, ret })
    }

    /// The same shape with one more trailing parameter.
    pub fn with_appended_param(&self, param: JvmType) -> Self {
        let mut params = self.params.clone();
        params.push(param);
        Self {
            params,
            ret: self.ret.clone(),
        }
    }

    pub fn descriptor(&self) -> String {
        let mut out = String::from("(");
        for param in &self.params {
            param.write_descriptor(&mut out);
        }
        out.push(')');
        self.ret.write_descriptor(&mut out);
        out
    }

    /// Java-like rendering: `java.lang.Integer name(java.lang.String, int)`.
    pub fn render(&self, name: &str) -> String {
        let params: Vec<String> = self.params.iter().map(JvmType::class_name).collect();
        format!("{} {}({})", self.ret.class_name(), name, params.join(", "))
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.descriptor())
    }
}

impl FromStr for MethodDescriptor {
    type Err = DescriptorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodDescriptor::parse(s)
    }
}

/// Malformed descriptor text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Input ended where a type was expected
    UnexpectedEnd { descriptor: String },
    /// A character that does not start any type
    InvalidTag {
        descriptor: String,
        offset: usize,
        found: char,
    },
    /// `L` without a closing `;`, or with an empty class name
    BadClassName { descriptor: String, offset: usize },
    /// `V` used as a parameter or array element
    VoidNotAllowed { descriptor: String, offset: usize },
    /// Extra characters after a complete descriptor
    TrailingInput { descriptor: String, offset: usize },
    /// Method descriptor not starting with `(`
    MissingParameterList { descriptor: String },
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DescriptorError::UnexpectedEnd { descriptor } => {
                write!(f, "descriptor `{}` ends unexpectedly", descriptor)
            }
            DescriptorError::InvalidTag {
                descriptor,
                offset,
                found,
            } => write!(
                f,
                "invalid type tag '{}' at offset {} in descriptor `{}`",
                found, offset, descriptor
            ),
            DescriptorError::BadClassName { descriptor, offset } => write!(
                f,
                "malformed class name at offset {} in descriptor `{}`",
                offset, descriptor
            ),
            DescriptorError::VoidNotAllowed { descriptor, offset } => write!(
                f,
                "void is only valid as a return type (offset {} in `{}`)",
                offset, descriptor
            ),
            DescriptorError::TrailingInput { descriptor, offset } => write!(
                f,
                "unexpected trailing input at offset {} in descriptor `{}`",
                offset, descriptor
            ),
            DescriptorError::MissingParameterList { descriptor } => {
                write!(f, "method descriptor `{}` must start with '('", descriptor)
            }
        }
    }
}

impl std::error::Error for DescriptorError {}

struct Reader<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.pos).copied()
    }

    fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_end(&self) -> Result<(), DescriptorError> {
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(DescriptorError::TrailingInput {
                descriptor: self.input.to_string(),
                offset: self.pos,
            })
        }
    }

    fn next_type(&mut self, allow_void: bool) -> Result<JvmType, DescriptorError> {
        let start = self.pos;
        let tag = self.peek().ok_or_else(|| DescriptorError::UnexpectedEnd {
            descriptor: self.input.to_string(),
        })?;
        self.pos += 1;
        let ty = match tag {
            b'Z' => JvmType::Boolean,
            b'B' => JvmType::Byte,
            b'C' => JvmType::Char,
            b'S' => JvmType::Short,
            b'I' => JvmType::Int,
            b'J' => JvmType::Long,
            b'F' => JvmType::Float,
            b'D' => JvmType::Double,
            b'V' if allow_void => JvmType::Void,
            b'V' => {
                return Err(DescriptorError::VoidNotAllowed {
                    descriptor: self.input.to_string(),
                    offset: start,
                })
            }
            b'L' => {
                let rest = &self.input[self.pos..];
                let end = rest.find(';').filter(|&end| end > 0).ok_or_else(|| {
                    DescriptorError::BadClassName {
                        descriptor: self.input.to_string(),
                        offset: start,
                    }
                })?;
                let name = &rest[..end];
                self.pos += end + 1;
                JvmType::Object(name.to_string())
            }
            b'[' => JvmType::Array(Box::new(self.next_type(false)?)),
            _ => {
                let found = self.input[start..].chars().next().unwrap_or('?');
                return Err(DescriptorError::InvalidTag {
                    descriptor: self.input.to_string(),
                    offset: start,
                    found,
                });
            }
        };
        Ok(ty)
    }
}
