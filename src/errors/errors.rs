use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// How serious a diagnostic is. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Notice,
    Warning,
    Error,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Notice => write!(f, "notice"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &'static str {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => "UnrecognisedToken",
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::UnexpectedTokenDetailed { .. } => "UnexpectedTokenDetailed",
            ErrorImpl::NumberParseError { .. } => "NumberParseError",
            ErrorImpl::UnreachableCode => "UnreachableCode",
            ErrorImpl::MissingReturn { .. } => "MissingReturn",
            ErrorImpl::MissingReturnValue { .. } => "MissingReturnValue",
            ErrorImpl::ReturnValueInVoid { .. } => "ReturnValueInVoid",
            ErrorImpl::UndeclaredException { .. } => "UndeclaredException",
            ErrorImpl::TypeMatchError { .. } => "TypeMatchError",
            ErrorImpl::ArgumentTypeMatchError { .. } => "ArgumentTypeMatchError",
            ErrorImpl::UnexpectedArguments { .. } => "UnexpectedArguments",
            ErrorImpl::MissingArguments { .. } => "MissingArguments",
            ErrorImpl::VariableNotDeclared { .. } => "VariableNotDeclared",
            ErrorImpl::FunctionAlreadyDeclared { .. } => "FunctionAlreadyDeclared",
            ErrorImpl::FunctionNotDeclared { .. } => "FunctionNotDeclared",
            ErrorImpl::ClassAlreadyDeclared { .. } => "ClassAlreadyDeclared",
            ErrorImpl::UnknownClass { .. } => "UnknownClass",
            ErrorImpl::UnknownMember { .. } => "UnknownMember",
            ErrorImpl::MemberAlreadyDeclared { .. } => "MemberAlreadyDeclared",
            ErrorImpl::InaccessibleMember { .. } => "InaccessibleMember",
            ErrorImpl::InvalidAnnotation { .. } => "InvalidAnnotation",
            ErrorImpl::CyclicInheritance { .. } => "CyclicInheritance",
            ErrorImpl::InvalidParent { .. } => "InvalidParent",
            ErrorImpl::OutsideLoop { .. } => "OutsideLoop",
            ErrorImpl::AbstractInstantiation { .. } => "AbstractInstantiation",
            ErrorImpl::FinalClassExtended { .. } => "FinalClassExtended",
            ErrorImpl::AbstractMethodNotImplemented { .. } => "AbstractMethodNotImplemented",
            ErrorImpl::InvalidKeyType { .. } => "InvalidKeyType",
            ErrorImpl::NotAnObject { .. } => "NotAnObject",
            ErrorImpl::NotThrowable { .. } => "NotThrowable",
        }
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnrecognisedToken { .. } => ErrorTip::None,
            ErrorImpl::UnexpectedToken { token } => ErrorTip::Suggestion(format!(
                "Unexpected token: `{}`, did you miss a semicolon?",
                token
            )),
            ErrorImpl::UnexpectedTokenDetailed { token, message } => {
                ErrorTip::Suggestion(format!("Unexpected token: `{}`, {}", token, message))
            }
            ErrorImpl::NumberParseError { token } => ErrorTip::Suggestion(format!(
                "Invalid number: `{}`, is it above the integer limit?",
                token
            )),
            ErrorImpl::UnreachableCode => {
                ErrorTip::Suggestion(String::from("Remove the statement or the jump before it"))
            }
            ErrorImpl::MissingReturn { function } => ErrorTip::Suggestion(format!(
                "Not every path of `{}` returns a value",
                function
            )),
            ErrorImpl::MissingReturnValue { function } => ErrorTip::Suggestion(format!(
                "`{}` is declared to return a value",
                function
            )),
            ErrorImpl::ReturnValueInVoid { function } => {
                ErrorTip::Suggestion(format!("`{}` is declared `void`", function))
            }
            ErrorImpl::UndeclaredException {
                exception,
                function,
            } => ErrorTip::Suggestion(format!(
                "Catch `{}` or add it to the `throws` list of `{}`",
                exception, function
            )),
            ErrorImpl::TypeMatchError { expected, received } => ErrorTip::Suggestion(format!(
                "Expected type `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::ArgumentTypeMatchError { expected, received } => {
                ErrorTip::Suggestion(format!(
                    "Expected argument type `{}`, received `{}`",
                    expected, received
                ))
            }
            ErrorImpl::UnexpectedArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected at most {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::MissingArguments { expected, received } => ErrorTip::Suggestion(format!(
                "Expected at least {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::VariableNotDeclared { variable } => {
                ErrorTip::Suggestion(format!("Variable `${}` is used before assignment", variable))
            }
            ErrorImpl::FunctionAlreadyDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already declared", function))
            }
            ErrorImpl::FunctionNotDeclared { function } => {
                ErrorTip::Suggestion(format!("Function `{}` is not declared", function))
            }
            ErrorImpl::ClassAlreadyDeclared { class } => {
                ErrorTip::Suggestion(format!("Class `{}` already declared", class))
            }
            ErrorImpl::UnknownClass { class } => {
                ErrorTip::Suggestion(format!("Unknown class `{}`", class))
            }
            ErrorImpl::UnknownMember { class, member } => {
                ErrorTip::Suggestion(format!("`{}` has no member `{}`", class, member))
            }
            ErrorImpl::MemberAlreadyDeclared { class, member } => {
                ErrorTip::Suggestion(format!("`{}::{}` already declared", class, member))
            }
            ErrorImpl::InaccessibleMember {
                class,
                member,
                visibility,
            } => ErrorTip::Suggestion(format!(
                "`{}::{}` is {} and cannot be accessed here",
                class, member, visibility
            )),
            ErrorImpl::InvalidAnnotation { reason } => {
                ErrorTip::Suggestion(format!("Invalid annotation: {}", reason))
            }
            ErrorImpl::CyclicInheritance { class } => {
                ErrorTip::Suggestion(format!("`{}` inherits from itself", class))
            }
            ErrorImpl::InvalidParent { class, parent, message } => ErrorTip::Suggestion(format!(
                "`{}` cannot inherit from `{}`: {}",
                class, parent, message
            )),
            ErrorImpl::OutsideLoop { keyword } => {
                ErrorTip::Suggestion(format!("`{}` used outside of a loop or switch", keyword))
            }
            ErrorImpl::AbstractInstantiation { class } => {
                ErrorTip::Suggestion(format!("`{}` is abstract and cannot be instantiated", class))
            }
            ErrorImpl::FinalClassExtended { class, parent } => ErrorTip::Suggestion(format!(
                "`{}` cannot extend final class `{}`",
                class, parent
            )),
            ErrorImpl::AbstractMethodNotImplemented { class, method } => {
                ErrorTip::Suggestion(format!(
                    "`{}` must implement `{}` or be declared abstract",
                    class, method
                ))
            }
            ErrorImpl::InvalidKeyType { expected, received } => ErrorTip::Suggestion(format!(
                "Container is indexed by `{}`, received `{}`",
                expected, received
            )),
            ErrorImpl::NotAnObject { received } => {
                ErrorTip::Suggestion(format!("Expected an object, received `{}`", received))
            }
            ErrorImpl::NotThrowable { received } => {
                ErrorTip::Suggestion(format!("`{}` is not an exception", received))
            }
        }
    }

    pub fn severity(&self) -> Severity {
        match &self.internal_error {
            ErrorImpl::UnreachableCode | ErrorImpl::VariableNotDeclared { .. } => {
                Severity::Warning
            }
            _ => Severity::Error,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unrecognised token: {token:?}")]
    UnrecognisedToken { token: String },
    #[error("unexpected token: {token:?}")]
    UnexpectedToken { token: String },
    #[error("unexpected token ({message}): {token:?}")]
    UnexpectedTokenDetailed { token: String, message: String },
    #[error("error parsing number: {token:?}")]
    NumberParseError { token: String },
    #[error("unreachable code")]
    UnreachableCode,
    #[error("missing return in {function}")]
    MissingReturn { function: String },
    #[error("missing return value in {function}")]
    MissingReturnValue { function: String },
    #[error("returning a value from void {function}")]
    ReturnValueInVoid { function: String },
    #[error("exception {exception} is not declared in the throws list of {function}")]
    UndeclaredException { exception: String, function: String },
    #[error("types do not match: expected {expected}, received {received}")]
    TypeMatchError { expected: String, received: String },
    #[error("argument types do not match: expected {expected}, received {received}")]
    ArgumentTypeMatchError { expected: String, received: String },
    #[error("too many arguments: expected {expected}, received {received}")]
    UnexpectedArguments { expected: usize, received: usize },
    #[error("missing arguments: expected {expected}, received {received}")]
    MissingArguments { expected: usize, received: usize },
    #[error("variable ${variable} not declared")]
    VariableNotDeclared { variable: String },
    #[error("function {function} already declared")]
    FunctionAlreadyDeclared { function: String },
    #[error("function {function} not declared")]
    FunctionNotDeclared { function: String },
    #[error("class {class} already declared")]
    ClassAlreadyDeclared { class: String },
    #[error("unknown class {class}")]
    UnknownClass { class: String },
    #[error("unknown member {class}::{member}")]
    UnknownMember { class: String, member: String },
    #[error("member {class}::{member} already declared")]
    MemberAlreadyDeclared { class: String, member: String },
    #[error("{visibility} member {class}::{member} is not accessible")]
    InaccessibleMember {
        class: String,
        member: String,
        visibility: String,
    },
    #[error("invalid annotation: {reason}")]
    InvalidAnnotation { reason: String },
    #[error("cyclic inheritance involving {class}")]
    CyclicInheritance { class: String },
    #[error("{class} cannot inherit from {parent}: {message}")]
    InvalidParent {
        class: String,
        parent: String,
        message: String,
    },
    #[error("{keyword} outside of a loop")]
    OutsideLoop { keyword: String },
    #[error("cannot instantiate abstract class {class}")]
    AbstractInstantiation { class: String },
    #[error("{class} extends final class {parent}")]
    FinalClassExtended { class: String, parent: String },
    #[error("{class} does not implement abstract method {method}")]
    AbstractMethodNotImplemented { class: String, method: String },
    #[error("invalid key type: expected {expected}, received {received}")]
    InvalidKeyType { expected: String, received: String },
    #[error("not an object: {received}")]
    NotAnObject { received: String },
    #[error("not throwable: {received}")]
    NotThrowable { received: String },
}

/// Failures of the type-descriptor compiler and of runtime verification.
///
/// Unlike [`Error`] these are never logged by the analysis itself; they are
/// returned to whoever asked for the compilation or verification.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("invalid type descriptor {descriptor:?}: {reason}")]
    InvalidDescriptor { descriptor: String, reason: String },
    #[error("value does not match {expected}: found {actual_guess}")]
    VerificationFailure {
        expected: String,
        actual_guess: String,
    },
}
