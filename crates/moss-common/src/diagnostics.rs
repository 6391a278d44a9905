//! Diagnostic model shared by the solver and the front end.
//!
//! Recoverable resolution failures carry one of the `M2xxx` codes below and
//! are rendered at the offending call or declaration while compilation of the
//! rest of the file continues. Internal faults use [`DiagnosticCategory::Fault`]
//! and are never shown as ordinary diagnostics; they abort the current
//! compilation unit instead.

use crate::span::Span;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Warning,
    Error,
    /// Internal invariant violation. Fatal for the compilation unit and
    /// deliberately distinct from user-facing errors.
    Fault,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

/// Diagnostic codes for the type-resolution core.
pub mod codes {
    pub const ARITY_MISMATCH: u32 = 2001;
    pub const AMBIGUOUS_CALL: u32 = 2002;
    pub const NO_APPLICABLE_METHOD: u32 = 2003;
    pub const INFERENCE_BLOCKED: u32 = 2004;
    pub const TYPE_ARGUMENT_COUNT: u32 = 2005;
    pub const ILLEGAL_OVERRIDE_NO_BASE: u32 = 2006;
    pub const ILLEGAL_OVERRIDE_AMBIGUOUS: u32 = 2007;
    pub const DUPLICATE_MEMBER: u32 = 2008;
    pub const INVALID_CAST: u32 = 2009;
    pub const UNKNOWN_TYPE: u32 = 2010;
    pub const NO_SUCH_MEMBER: u32 = 2011;

    /// Internal faults; never user-facing.
    pub const FAULT_RECURSION_LIMIT: u32 = 9001;
    pub const FAULT_MALFORMED_HEADER: u32 = 9002;
    pub const FAULT_INFERENCE_INVARIANT: u32 = 9003;
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: codes::ARITY_MISMATCH,
        category: DiagnosticCategory::Error,
        message: "wrong number of arguments",
    },
    DiagnosticMessage {
        code: codes::AMBIGUOUS_CALL,
        category: DiagnosticCategory::Error,
        message: "ambiguous call; multiple overloads apply",
    },
    DiagnosticMessage {
        code: codes::NO_APPLICABLE_METHOD,
        category: DiagnosticCategory::Error,
        message: "no overload accepts these argument types",
    },
    DiagnosticMessage {
        code: codes::INFERENCE_BLOCKED,
        category: DiagnosticCategory::Error,
        message: "could not infer type arguments",
    },
    DiagnosticMessage {
        code: codes::TYPE_ARGUMENT_COUNT,
        category: DiagnosticCategory::Error,
        message: "wrong number of type arguments",
    },
    DiagnosticMessage {
        code: codes::ILLEGAL_OVERRIDE_NO_BASE,
        category: DiagnosticCategory::Error,
        message: "method overrides nothing in the supertype chain",
    },
    DiagnosticMessage {
        code: codes::ILLEGAL_OVERRIDE_AMBIGUOUS,
        category: DiagnosticCategory::Error,
        message: "override target is ambiguous",
    },
    DiagnosticMessage {
        code: codes::DUPLICATE_MEMBER,
        category: DiagnosticCategory::Error,
        message: "conflicting declaration with the same signature",
    },
    DiagnosticMessage {
        code: codes::INVALID_CAST,
        category: DiagnosticCategory::Error,
        message: "no conversion between these types",
    },
    DiagnosticMessage {
        code: codes::UNKNOWN_TYPE,
        category: DiagnosticCategory::Error,
        message: "unknown type name",
    },
    DiagnosticMessage {
        code: codes::NO_SUCH_MEMBER,
        category: DiagnosticCategory::Error,
        message: "no member with this name",
    },
    DiagnosticMessage {
        code: codes::FAULT_RECURSION_LIMIT,
        category: DiagnosticCategory::Fault,
        message: "internal: recursion limit exceeded",
    },
    DiagnosticMessage {
        code: codes::FAULT_MALFORMED_HEADER,
        category: DiagnosticCategory::Fault,
        message: "internal: malformed function header",
    },
    DiagnosticMessage {
        code: codes::FAULT_INFERENCE_INVARIANT,
        category: DiagnosticCategory::Fault,
        message: "internal: inference produced more bindings than type parameters",
    },
];

pub fn get_message_template(code: u32) -> Option<&'static str> {
    DIAGNOSTIC_MESSAGES
        .iter()
        .find(|m| m.code == code)
        .map(|m| m.message)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub code: u32,
    pub span: Span,
    pub message_text: String,
}

impl Diagnostic {
    pub fn error(code: u32, span: Span, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Error,
            code,
            span,
            message_text: message.into(),
        }
    }

    pub fn fault(code: u32, message: impl Into<String>) -> Self {
        Self {
            category: DiagnosticCategory::Fault,
            code,
            span: Span::EMPTY,
            message_text: message.into(),
        }
    }

    pub fn is_fault(&self) -> bool {
        self.category == DiagnosticCategory::Fault
    }
}
