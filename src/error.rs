//! Error taxonomy for building, validating and evaluating expressions.
//!
//! Build and structural errors are raised once, while turning a token tree
//! into an [`Expression`](crate::Expression). Evaluation errors are local to
//! a single evaluation call. A missing variable is never an error: it
//! resolves to null.

use thiserror::Error;

/// The builder could not produce a node from a token at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuildError {
    /// `"@"` or a path with blank segments such as `"@a..b"`
    #[error("invalid variable reference '{0}'")]
    InvalidVariable(String),

    /// `{"#": ...}` with an empty function name
    #[error("function name must not be blank")]
    BlankFunctionName,

    /// A declaration whose value is neither a string nor a list of strings
    #[error("declaration names must be a string or a list of strings, got {0}")]
    InvalidDeclaration(String),
}

/// A tree assembled by hand through [`Ast`](crate::Ast) was given a bad link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("node {0} does not exist")]
    UnknownNode(usize),

    /// Nodes cannot be shared between parents
    #[error("node {0} already has a parent")]
    AlreadyAttached(usize),

    #[error("attaching node {child} under node {parent} would create a cycle")]
    Cycle { parent: usize, child: usize },
}

/// An operator node violates its arity or shape rules.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("AST node [{token}] {expected}")]
pub struct StructuralError {
    /// The operator token, e.g. `$between`
    pub token: String,
    /// Human-readable description of the required shape
    pub expected: String,
}

impl StructuralError {
    pub fn new(token: impl Into<String>, expected: impl Into<String>) -> Self {
        StructuralError {
            token: token.into(),
            expected: expected.into(),
        }
    }
}

/// Errors that can occur during evaluation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// No function resolver supports the requested name
    #[error("function '{0}' is not supported")]
    UnsupportedFunction(String),

    /// Type mismatch or invalid operation for the given type
    #[error("Type error: {0}")]
    Type(String),

    /// Division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// A resolved function rejected its arguments
    #[error("function '{name}' failed: {message}")]
    Function { name: String, message: String },
}

impl EvalError {
    pub fn type_error(message: impl Into<String>) -> Self {
        EvalError::Type(message.into())
    }
}

/// Umbrella error for the one-shot helpers that parse, build, validate and
/// evaluate in a single call.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Parse error: {0}")]
    Structural(#[from] StructuralError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// A fetch script with an unusable filter/projection layout
    #[error("Invalid script: {0}")]
    Script(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
