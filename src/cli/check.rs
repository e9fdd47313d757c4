//! Validate and evaluate an expression against JSON variables

use super::CliError;
use crate::{Expression, FunctionRegistry, RootContext, convert::value_to_json};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The expression, as JSON text
    pub expression: String,
    /// Variables as a JSON object; missing means no variables
    pub variables: Option<String>,
    /// Only build and validate, don't evaluate
    pub syntax_only: bool,
    /// Leave the builtin functions out of the registry
    pub no_builtins: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// The expression is valid; carries its canonical form (arrays unwrapped)
    SyntaxValid(serde_json::Value),
    /// The expression evaluated successfully
    Success(serde_json::Value),
}

/// Execute a check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let expression = Expression::parse(&options.expression)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid(expression.to_token()));
    }

    let variables: serde_json::Value = match &options.variables {
        Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
        _ => serde_json::Value::Object(Default::default()),
    };

    let functions = if options.no_builtins {
        FunctionRegistry::new()
    } else {
        FunctionRegistry::with_builtins()
    };
    let ctx = RootContext::from_json(variables, &functions);
    let result = expression.evaluate(&ctx)?;

    Ok(CheckResult::Success(value_to_json(&result)))
}
