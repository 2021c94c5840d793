// src/validate/issue.rs

//! Diagnostics produced while parsing and validating a task graph.

use std::fmt;

use serde::Serialize;

/// Where an issue was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueKind {
    /// The document itself is malformed.
    Syntactic,
    /// The document parses but does not make sense against the registry.
    Semantic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Warning,
    Error,
}

/// A single diagnostic. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ValidationIssue {
    kind: IssueKind,
    severity: IssueSeverity,
    message: String,
}

impl ValidationIssue {
    pub fn new(kind: IssueKind, severity: IssueSeverity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Syntactic, IssueSeverity::Error, message)
    }

    pub fn semantic_error(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Semantic, IssueSeverity::Error, message)
    }

    pub fn semantic_warning(message: impl Into<String>) -> Self {
        Self::new(IssueKind::Semantic, IssueSeverity::Warning, message)
    }

    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    pub fn severity(&self) -> IssueSeverity {
        self.severity
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_error(&self) -> bool {
        self.severity == IssueSeverity::Error
    }
}

/// Renders as `ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, '<message>')`.
///
/// Callers of the validation endpoint match on this exact text.
impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            IssueKind::Syntactic => "SYNTAX",
            IssueKind::Semantic => "SEMANTIC",
        };
        let severity = match self.severity {
            IssueSeverity::Warning => "WARNING",
            IssueSeverity::Error => "ERROR",
        };
        write!(
            f,
            "ValidationIssue(IssueType.{kind}, IssueSeverity.{severity}, {})",
            quote_message(&self.message)
        )
    }
}

impl std::error::Error for ValidationIssue {}

/// Render a list of issues as `[issue, issue, ...]`.
pub fn render_issues(issues: &[ValidationIssue]) -> String {
    let rendered: Vec<String> = issues.iter().map(ToString::to_string).collect();
    format!("[{}]", rendered.join(", "))
}

/// Body of a validation response: `{ "valid": true }` or `{ "message": "[...]" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ValidationReport {
    Valid { valid: bool },
    Invalid { message: String },
}

impl ValidationReport {
    /// Warnings alone do not make a graph invalid.
    pub fn from_issues(issues: &[ValidationIssue]) -> Self {
        if is_valid(issues) {
            ValidationReport::Valid { valid: true }
        } else {
            ValidationReport::Invalid {
                message: render_issues(issues),
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationReport::Valid { .. })
    }
}

/// `true` if no issue has `Error` severity.
pub fn is_valid(issues: &[ValidationIssue]) -> bool {
    !issues.iter().any(ValidationIssue::is_error)
}

/// Quote a message the way the established wire format does: single quotes
/// unless the text contains a single quote and no double quote.
fn quote_message(message: &str) -> String {
    let quote = if message.contains('\'') && !message.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(message.len() + 2);
    out.push(quote);
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}
