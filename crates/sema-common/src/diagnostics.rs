//! Diagnostic types and message lookup for the collector and binder.
//!
//! Rendering and localisation are the host's business; this module only carries
//! the code, category, location and a filled-in English template.

use serde::Serialize;

// =============================================================================
// Diagnostic Types
// =============================================================================

/// Diagnostic category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum DiagnosticCategory {
    Warning = 0,
    Error = 1,
    Suggestion = 2,
    Message = 3,
}

/// Related information for a diagnostic (e.g., "see also" locations).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DiagnosticRelatedInformation {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
}

/// A binding diagnostic with optional related information.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub file: String,
    pub start: u32,
    pub length: u32,
    pub message_text: String,
    pub category: DiagnosticCategory,
    pub code: u32,
    /// Related information spans (e.g., where the previous declaration lives)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_information: Vec<DiagnosticRelatedInformation>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    #[must_use]
    pub const fn error(file: String, start: u32, length: u32, message: String, code: u32) -> Self {
        Self {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Error,
            code,
            related_information: Vec::new(),
        }
    }

    /// Create a diagnostic from a catalog code, filling `{0}`, `{1}`, ... with `args`.
    ///
    /// Unknown codes keep an empty message rather than failing; the host owns
    /// the real catalog.
    #[must_use]
    pub fn from_code(file: String, start: u32, length: u32, code: u32, args: &[&str]) -> Self {
        let (category, message) = match get_diagnostic_message(code) {
            Some(m) => (m.category, format_message(m.message, args)),
            None => (DiagnosticCategory::Error, String::new()),
        };
        Self {
            file,
            start,
            length,
            message_text: message,
            category,
            code,
            related_information: Vec::new(),
        }
    }

    /// Add related information to this diagnostic.
    #[must_use]
    pub fn with_related(mut self, file: String, start: u32, length: u32, message: String) -> Self {
        self.related_information.push(DiagnosticRelatedInformation {
            file,
            start,
            length,
            message_text: message,
            category: DiagnosticCategory::Message,
            code: 0,
        });
        self
    }
}

/// Format a diagnostic message by replacing {0}, {1}, etc. with arguments.
#[must_use]
pub fn format_message(template: &str, args: &[&str]) -> String {
    let mut result = template.to_string();
    for (i, arg) in args.iter().enumerate() {
        result = result.replace(&format!("{{{i}}}"), arg);
    }
    result
}

/// A diagnostic message definition with code, category, and message template.
#[derive(Clone, Copy, Debug)]
pub struct DiagnosticMessage {
    pub code: u32,
    pub category: DiagnosticCategory,
    pub message: &'static str,
}

pub mod diagnostic_codes {
    pub const IDENTIFIER_EXPECTED: u32 = 1003;
    pub const TOKEN_EXPECTED: u32 = 1005;
    pub const TYPE_EXPECTED: u32 = 1110;
    pub const DECLARATION_OR_STATEMENT_EXPECTED: u32 = 1128;
    pub const ACCESSOR_CANNOT_HAVE_TYPE_PARAMETERS: u32 = 1094;
    pub const DUPLICATE_IDENTIFIER: u32 = 2300;
    pub const CANNOT_FIND_MODULE: u32 = 2307;
    pub const AMBIENT_MISMATCH_IN_MERGED_DECLARATION: u32 = 2384;
    pub const MULTIPLE_CONSTRUCTOR_IMPLEMENTATIONS: u32 = 2392;
    pub const EXPORT_MISMATCH_IN_MERGED_DECLARATION: u32 = 2395;
    pub const ENUM_FIRST_MEMBER_MUST_HAVE_INITIALIZER: u32 = 2432;
    pub const NAMESPACE_IN_DIFFERENT_FILE_FROM_MERGED_VALUE: u32 = 2433;
    pub const NAMESPACE_BEFORE_MERGED_VALUE: u32 = 2434;
}

/// Message templates for every code the parser and binder report.
pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::IDENTIFIER_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "Identifier expected.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::TOKEN_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "'{0}' expected.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::TYPE_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "Type expected.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::DECLARATION_OR_STATEMENT_EXPECTED,
        category: DiagnosticCategory::Error,
        message: "Declaration or statement expected.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::ACCESSOR_CANNOT_HAVE_TYPE_PARAMETERS,
        category: DiagnosticCategory::Error,
        message: "An accessor cannot have type parameters.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::DUPLICATE_IDENTIFIER,
        category: DiagnosticCategory::Error,
        message: "Duplicate identifier '{0}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_MODULE,
        category: DiagnosticCategory::Error,
        message: "Cannot find module '{0}'.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::AMBIENT_MISMATCH_IN_MERGED_DECLARATION,
        category: DiagnosticCategory::Error,
        message: "Individual declarations in merged declaration '{0}' must be all ambient or all non-ambient.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::MULTIPLE_CONSTRUCTOR_IMPLEMENTATIONS,
        category: DiagnosticCategory::Error,
        message: "Multiple constructor implementations are not allowed.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::EXPORT_MISMATCH_IN_MERGED_DECLARATION,
        category: DiagnosticCategory::Error,
        message: "Individual declarations in merged declaration '{0}' must be all exported or all local.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::ENUM_FIRST_MEMBER_MUST_HAVE_INITIALIZER,
        category: DiagnosticCategory::Error,
        message: "In an enum with multiple declarations, only one declaration can omit an initializer for its first enum element.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::NAMESPACE_IN_DIFFERENT_FILE_FROM_MERGED_VALUE,
        category: DiagnosticCategory::Error,
        message: "A namespace declaration cannot be in a different file from a class or function with which it is merged.",
    },
    DiagnosticMessage {
        code: diagnostic_codes::NAMESPACE_BEFORE_MERGED_VALUE,
        category: DiagnosticCategory::Error,
        message: "A namespace declaration cannot be located prior to a class or function with which it is merged.",
    },
];

/// Look up a diagnostic message definition by code.
#[must_use]
pub fn get_diagnostic_message(code: u32) -> Option<&'static DiagnosticMessage> {
    DIAGNOSTIC_MESSAGES.iter().find(|m| m.code == code)
}

/// Get the message template for a diagnostic code.
#[must_use]
pub fn get_message_template(code: u32) -> Option<&'static str> {
    get_diagnostic_message(code).map(|m| m.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_fills_template() {
        let diag = Diagnostic::from_code(
            "a.ts".to_string(),
            3,
            4,
            diagnostic_codes::DUPLICATE_IDENTIFIER,
            &["foo"],
        );
        assert_eq!(diag.message_text, "Duplicate identifier 'foo'.");
        assert_eq!(diag.category, DiagnosticCategory::Error);
        assert!(diag.related_information.is_empty());
    }

    #[test]
    fn test_unknown_code_has_empty_message() {
        let diag = Diagnostic::from_code("a.ts".to_string(), 0, 0, 9999, &[]);
        assert_eq!(diag.code, 9999);
        assert!(diag.message_text.is_empty());
        assert!(get_message_template(9999).is_none());
    }

    #[test]
    fn test_related_information_is_serialized_only_when_present() {
        let plain = Diagnostic::error("a.ts".into(), 0, 1, "x".into(), 1);
        let json = serde_json::to_string(&plain).unwrap();
        assert!(!json.contains("related_information"));

        let related = plain.with_related("b.ts".into(), 5, 2, "declared here".into());
        let json = serde_json::to_string(&related).unwrap();
        assert!(json.contains("declared here"));
    }
}
