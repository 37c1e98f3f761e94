//! Class name conversions.
//!
//! Class names appear in two spellings:
//! - Internal form: `com/example/Foo`, used by class files and instruction operands
//! - Binary form: `com.example.Foo`, used in source code and reflection
//!
//! Call signatures and owners are always compared in internal form. The binary
//! form is what the shim receives as the identity of a calling unit.

/// Convert an internal class name to its dotted binary name.
///
/// # Examples
///
/// ```
/// use instrument_types::names::binary_name;
///
/// assert_eq!(binary_name("com/example/Foo"), "com.example.Foo");
/// assert_eq!(binary_name("com/example/Foo$Inner"), "com.example.Foo$Inner");
/// assert_eq!(binary_name("Foo"), "Foo");
/// ```
pub fn binary_name(internal_name: &str) -> String {
    internal_name.replace('/', ".")
}

/// Convert a dotted binary class name to its internal form.
///
/// # Examples
///
/// ```
/// use instrument_types::names::internal_name;
///
/// assert_eq!(internal_name("java.lang.System"), "java/lang/System");
/// ```
pub fn internal_name(binary_name: &str) -> String {
    binary_name.replace('.', "/")
}
