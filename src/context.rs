//! Variable and function resolution for evaluation.
//!
//! A [`RootContext`] is created per evaluation call and owns the variables
//! the expression is evaluated against. Comprehension operators layer a
//! [`SubContext`] on top of it for their bound names; nested comprehensions
//! chain sub contexts, each pointing at its outer context.

use std::{fmt, sync::Arc};

use crate::{ast::VariablePath, error::EvalError, functions::BuiltinFunctions, value::Value};

/// A resolved function: takes evaluated operands, returns a value.
pub type Function = Arc<dyn Fn(&[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// Supplies named functions to `{"#name": [...]}` nodes.
///
/// Resolvers are consulted in ascending [`priority`](FunctionResolver::priority)
/// order and the first one that supports a name wins.
pub trait FunctionResolver: Send + Sync {
    fn supports(&self, name: &str) -> bool;

    /// Lower values are consulted first.
    fn priority(&self) -> i32 {
        0
    }

    /// Only called with names this resolver [supports](FunctionResolver::supports).
    fn resolve(&self, name: &str) -> Function;
}

/// Ordered, read-only list of function resolvers.
///
/// Build it once and share it between evaluations; it is `Send + Sync`.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    resolvers: Vec<Arc<dyn FunctionResolver>>,
}

impl FunctionRegistry {
    /// An empty registry: every function call fails as unsupported.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the [`BuiltinFunctions`].
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(BuiltinFunctions);
        registry
    }

    pub fn register(&mut self, resolver: impl FunctionResolver + 'static) -> &mut Self {
        self.register_arc(Arc::new(resolver))
    }

    /// Add a shared resolver. Resolvers with equal priority keep their
    /// registration order.
    pub fn register_arc(&mut self, resolver: Arc<dyn FunctionResolver>) -> &mut Self {
        self.resolvers.push(resolver);
        self.resolvers.sort_by_key(|r| r.priority());
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Select the first resolver supporting `name`.
    pub fn resolve(&self, name: &str) -> Result<Function, EvalError> {
        let (index, resolver) = self
            .resolvers
            .iter()
            .enumerate()
            .find(|(_, r)| r.supports(name))
            .ok_or_else(|| EvalError::UnsupportedFunction(name.to_string()))?;
        tracing::trace!(name, index, priority = resolver.priority(), "function resolved");
        Ok(resolver.resolve(name))
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("resolvers", &self.resolvers.len())
            .finish()
    }
}

/// Resolution capabilities the evaluator needs.
pub trait EvaluationContext {
    /// Resolve a variable reference. Unknown paths resolve to null.
    fn resolve_variable_value(&self, path: &VariablePath) -> Value;

    /// Resolve a function by name, failing when nothing supports it.
    fn resolve_function(&self, name: &str) -> Result<Function, EvalError>;
}

/// Context backed by a variable map and a function registry.
///
/// # Examples
///
/// ```
/// use jse_lang::{Expression, FunctionRegistry, RootContext, Value};
/// use serde_json::json;
///
/// let functions = FunctionRegistry::with_builtins();
/// let ctx = RootContext::from_json(json!({"age": 5}), &functions);
/// let expr = Expression::parse(r#"{"$between": ["@age", 1, 10]}"#).unwrap();
/// assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Boolean(true));
/// ```
#[derive(Debug, Clone)]
pub struct RootContext<'a> {
    variables: Value,
    functions: &'a FunctionRegistry,
}

impl<'a> RootContext<'a> {
    /// `variables` is usually an object keyed by variable name; a path is
    /// looked up from it segment by segment.
    pub fn new(variables: Value, functions: &'a FunctionRegistry) -> Self {
        RootContext {
            variables,
            functions,
        }
    }

    pub fn from_json(variables: serde_json::Value, functions: &'a FunctionRegistry) -> Self {
        Self::new(variables.into(), functions)
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }
}

impl EvaluationContext for RootContext<'_> {
    fn resolve_variable_value(&self, path: &VariablePath) -> Value {
        self.variables
            .lookup(path.segments())
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn resolve_function(&self, name: &str) -> Result<Function, EvalError> {
        self.functions.resolve(name)
    }
}

/// Scope holding the names bound by one comprehension step.
///
/// Only paths whose first segment is a bound name are answered here; every
/// other lookup, and every function lookup, goes to the outer context.
pub struct SubContext<'a> {
    outer: &'a dyn EvaluationContext,
    bindings: Vec<(String, Value)>,
}

impl<'a> SubContext<'a> {
    pub fn new(outer: &'a dyn EvaluationContext) -> Self {
        SubContext {
            outer,
            bindings: Vec::with_capacity(2),
        }
    }

    /// Bind `name`, replacing any previous binding of it.
    pub fn bind(&mut self, name: &str, value: Value) -> &mut Self {
        match self.bindings.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => self.bindings.push((name.to_string(), value)),
        }
        self
    }

    pub fn unbind(&mut self, name: &str) -> &mut Self {
        self.bindings.retain(|(n, _)| n != name);
        self
    }

    pub fn unbind_all(&mut self) -> &mut Self {
        self.bindings.clear();
        self
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bindings.iter().any(|(n, _)| n == name)
    }

    /// Take a bound value back out, leaving null in its place.
    pub(crate) fn take(&mut self, name: &str) -> Option<Value> {
        self.bindings
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| std::mem::take(v))
    }
}

impl EvaluationContext for SubContext<'_> {
    fn resolve_variable_value(&self, path: &VariablePath) -> Value {
        match self.bindings.iter().find(|(name, _)| name == path.first()) {
            Some((_, bound)) => bound.lookup(path.rest()).cloned().unwrap_or(Value::Null),
            None => self.outer.resolve_variable_value(path),
        }
    }

    fn resolve_function(&self, name: &str) -> Result<Function, EvalError> {
        self.outer.resolve_function(name)
    }
}

impl fmt::Debug for SubContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubContext")
            .field("bindings", &self.bindings)
            .finish_non_exhaustive()
    }
}
