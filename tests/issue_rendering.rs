// tests/issue_rendering.rs

use stepgraph::ValidationIssue;
use stepgraph::validate::{IssueKind, IssueSeverity, ValidationReport, render_issues};

#[test]
fn renders_single_issue() {
    let issue = ValidationIssue::semantic_error("In step \"s\": unrecognized argument: c");
    assert_eq!(
        issue.to_string(),
        "ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, 'In step \"s\": unrecognized argument: c')"
    );
}

#[test]
fn renders_kind_and_severity_tags() {
    let warning = ValidationIssue::semantic_warning("w");
    assert_eq!(
        warning.to_string(),
        "ValidationIssue(IssueType.SEMANTIC, IssueSeverity.WARNING, 'w')"
    );

    let syntax = ValidationIssue::new(IssueKind::Syntactic, IssueSeverity::Error, "bad");
    assert_eq!(
        syntax.to_string(),
        "ValidationIssue(IssueType.SYNTAX, IssueSeverity.ERROR, 'bad')"
    );
}

#[test]
fn quoting_follows_repr_rules() {
    // A lone single quote switches to double quotes.
    assert_eq!(
        ValidationIssue::semantic_error("it's").to_string(),
        "ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, \"it's\")"
    );
    // Both kinds of quote: single quotes, with the single quote escaped.
    assert_eq!(
        ValidationIssue::semantic_error("it's \"x\"").to_string(),
        "ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, 'it\\'s \"x\"')"
    );
    assert_eq!(
        ValidationIssue::semantic_error("a\\b\nc").to_string(),
        "ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, 'a\\\\b\\nc')"
    );
}

#[test]
fn renders_lists() {
    assert_eq!(render_issues(&[]), "[]");

    let issues = vec![
        ValidationIssue::semantic_error("one"),
        ValidationIssue::semantic_warning("two"),
    ];
    assert_eq!(
        render_issues(&issues),
        "[ValidationIssue(IssueType.SEMANTIC, IssueSeverity.ERROR, 'one'), ValidationIssue(IssueType.SEMANTIC, IssueSeverity.WARNING, 'two')]"
    );
}

#[test]
fn report_is_valid_unless_an_error_is_present() {
    assert_eq!(
        ValidationReport::from_issues(&[]),
        ValidationReport::Valid { valid: true }
    );
    assert!(ValidationReport::from_issues(&[ValidationIssue::semantic_warning("w")]).is_valid());

    let issues = vec![
        ValidationIssue::semantic_warning("w"),
        ValidationIssue::semantic_error("e"),
    ];
    // The message lists warnings too.
    assert_eq!(
        ValidationReport::from_issues(&issues),
        ValidationReport::Invalid {
            message: render_issues(&issues)
        }
    );
}
