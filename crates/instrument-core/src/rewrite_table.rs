//! The fixed catalog of redirected calls.
//!
//! Every entry maps one static call `(owner, name, descriptor)` to a method on
//! the instrumentation shim whose descriptor is the original one plus a
//! trailing `java.lang.String` parameter. The rewritten call site pushes the
//! calling unit's binary name as that extra argument, so the shim can attribute
//! the read to its origin.
//!
//! The table is closed: a call is redirected only on an exact match of owner,
//! name and descriptor.

use instrument_types::MethodCall;

/// Internal name of the runtime shim receiving redirected calls.
pub const SHIM_OWNER: &str = "org/gradle/internal/classpath/Instrumented";

// =============================================================================
// Call-site table factory
// =============================================================================

/// Groovy's per-class call-site table type.
pub const CALL_SITE_ARRAY_TYPE: &str = "org/codehaus/groovy/runtime/callsite/CallSiteArray";
/// Factory method the Groovy compiler generates in units that use call sites.
pub const CREATE_CALL_SITE_ARRAY_METHOD: &str = "$createCallSiteArray";
/// Wrapper added next to the factory.
pub const INSTRUMENTED_CALL_SITE_METHOD: &str = "$instrumentedCallSiteArray";
pub const RETURN_CALL_SITE_ARRAY: &str = "()Lorg/codehaus/groovy/runtime/callsite/CallSiteArray;";
/// Shim entry point registering a freshly built table.
pub const REGISTER_CALL_SITES_METHOD: &str = "groovyCallSites";
pub const RETURN_VOID_FROM_CALL_SITE_ARRAY: &str =
    "(Lorg/codehaus/groovy/runtime/callsite/CallSiteArray;)V";

/// True if `(name, descriptor)` is the call-site table factory.
pub fn is_call_site_factory(name: &str, descriptor: &str) -> bool {
    name == CREATE_CALL_SITE_ARRAY_METHOD && descriptor == RETURN_CALL_SITE_ARRAY
}

// =============================================================================
// Signatures
// =============================================================================

/// Lookup key: the exact target of a static call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallSignature<'a> {
    pub owner: &'a str,
    pub name: &'a str,
    pub descriptor: &'a str,
}

impl<'a> CallSignature<'a> {
    pub const fn new(owner: &'a str, name: &'a str, descriptor: &'a str) -> Self {
        Self {
            owner,
            name,
            descriptor,
        }
    }

    pub fn of(call: &'a MethodCall) -> Self {
        Self::new(&call.owner, &call.name, &call.descriptor)
    }
}

/// Shim method a matching call is redirected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RedirectTarget {
    pub name: &'static str,
    pub descriptor: &'static str,
}

impl RedirectTarget {
    pub fn owner(&self) -> &'static str {
        SHIM_OWNER
    }

    /// The `invokestatic` instruction calling this target.
    pub fn to_call(&self) -> MethodCall {
        MethodCall::invoke_static(SHIM_OWNER, self.name, self.descriptor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteRule {
    pub call: CallSignature<'static>,
    pub target: RedirectTarget,
}

const fn rule(
    owner: &'static str,
    name: &'static str,
    descriptor: &'static str,
    shim_name: &'static str,
    shim_descriptor: &'static str,
) -> RewriteRule {
    RewriteRule {
        call: CallSignature::new(owner, name, descriptor),
        target: RedirectTarget {
            name: shim_name,
            descriptor: shim_descriptor,
        },
    }
}

const SYSTEM: &str = "java/lang/System";
const INTEGER: &str = "java/lang/Integer";
const LONG: &str = "java/lang/Long";
const BOOLEAN: &str = "java/lang/Boolean";

static RULES: [RewriteRule; 10] = [
    // System properties
    rule(
        SYSTEM,
        "getProperty",
        "(Ljava/lang/String;)Ljava/lang/String;",
        "systemProperty",
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
    ),
    rule(
        SYSTEM,
        "getProperty",
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
        "systemProperty",
        "(Ljava/lang/String;Ljava/lang/String;Ljava/lang/String;)Ljava/lang/String;",
    ),
    rule(
        SYSTEM,
        "getProperties",
        "()Ljava/util/Properties;",
        "systemProperties",
        "(Ljava/lang/String;)Ljava/util/Properties;",
    ),
    // Integer.getInteger
    rule(
        INTEGER,
        "getInteger",
        "(Ljava/lang/String;)Ljava/lang/Integer;",
        "getInteger",
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Integer;",
    ),
    rule(
        INTEGER,
        "getInteger",
        "(Ljava/lang/String;I)Ljava/lang/Integer;",
        "getInteger",
        "(Ljava/lang/String;ILjava/lang/String;)Ljava/lang/Integer;",
    ),
    rule(
        INTEGER,
        "getInteger",
        "(Ljava/lang/String;Ljava/lang/Integer;)Ljava/lang/Integer;",
        "getInteger",
        "(Ljava/lang/String;Ljava/lang/Integer;Ljava/lang/String;)Ljava/lang/Integer;",
    ),
    // Long.getLong
    rule(
        LONG,
        "getLong",
        "(Ljava/lang/String;)Ljava/lang/Long;",
        "getLong",
        "(Ljava/lang/String;Ljava/lang/String;)Ljava/lang/Long;",
    ),
    rule(
        LONG,
        "getLong",
        "(Ljava/lang/String;J)Ljava/lang/Long;",
        "getLong",
        "(Ljava/lang/String;JLjava/lang/String;)Ljava/lang/Long;",
    ),
    rule(
        LONG,
        "getLong",
        "(Ljava/lang/String;Ljava/lang/Long;)Ljava/lang/Long;",
        "getLong",
        "(Ljava/lang/String;Ljava/lang/Long;Ljava/lang/String;)Ljava/lang/Long;",
    ),
    // Boolean.getBoolean
    rule(
        BOOLEAN,
        "getBoolean",
        "(Ljava/lang/String;)Z",
        "getBoolean",
        "(Ljava/lang/String;Ljava/lang/String;)Z",
    ),
];

/// All redirect rules, in a fixed order.
pub fn rules() -> &'static [RewriteRule] {
    &RULES
}

/// Find the redirect for an exact call signature.
pub fn lookup(signature: &CallSignature<'_>) -> Option<&'static RedirectTarget> {
    RULES
        .iter()
        .find(|rule| rule.call == *signature)
        .map(|rule| &rule.target)
}
