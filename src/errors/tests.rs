//! Unit tests for error handling.
//!
//! This module contains tests for diagnostic errors and descriptor errors.

use crate::errors::errors::{DescriptorError, Error, ErrorImpl, ErrorTip, Severity};
use crate::Position;
use std::rc::Rc;

fn position(offset: u32) -> Position {
    Position(offset, Rc::new("test.php".to_string()))
}

#[test]
fn test_error_creation() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        position(10),
    );

    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 10);
}

#[test]
fn test_unreachable_code_is_a_warning() {
    let error = Error::new(ErrorImpl::UnreachableCode, position(0));

    assert_eq!(error.get_error_name(), "UnreachableCode");
    assert_eq!(error.severity(), Severity::Warning);
}

#[test]
fn test_missing_return_is_an_error() {
    let error = Error::new(
        ErrorImpl::MissingReturn {
            function: "f".to_string(),
        },
        position(0),
    );

    assert_eq!(error.severity(), Severity::Error);
    assert_eq!(error.to_string(), "missing return in f");
}

#[test]
fn test_undeclared_exception_tip() {
    let error = Error::new(
        ErrorImpl::UndeclaredException {
            exception: "A".to_string(),
            function: "f".to_string(),
        },
        position(0),
    );

    match error.get_tip() {
        ErrorTip::Suggestion(tip) => assert!(tip.contains("throws")),
        ErrorTip::None => panic!("Expected suggestion tip"),
    }
}

#[test]
fn test_error_tip_none() {
    let error = Error::new(
        ErrorImpl::UnrecognisedToken {
            token: "@".to_string(),
        },
        position(0),
    );

    assert!(matches!(error.get_tip(), ErrorTip::None));
}

#[test]
fn test_error_tip_display() {
    let tip = ErrorTip::Suggestion("Try this instead".to_string());
    assert_eq!(tip.to_string(), "Try this instead");

    let tip = ErrorTip::None;
    assert_eq!(tip.to_string(), "");
}

#[test]
fn test_severity_ordering() {
    assert!(Severity::Notice < Severity::Warning);
    assert!(Severity::Warning < Severity::Error);
    assert_eq!(Severity::Notice.to_string(), "notice");
}

#[test]
fn test_descriptor_error_messages() {
    let error = DescriptorError::InvalidDescriptor {
        descriptor: "int[".to_string(),
        reason: "unbalanced bracket".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "invalid type descriptor \"int[\": unbalanced bracket"
    );

    let error = DescriptorError::VerificationFailure {
        expected: "int[]".to_string(),
        actual_guess: "string[int]".to_string(),
    };
    assert_eq!(
        error.to_string(),
        "value does not match int[]: found string[int]"
    );
}
