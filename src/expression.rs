use std::collections::HashMap;

use regex::Regex;

use crate::{
    ast::{Ast, NodeId},
    builder::{NodeBuilder, Syntax},
    context::EvaluationContext,
    error::{EvalError, Result},
    evaluator::Evaluator,
    validator::Validator,
    value::Value,
};

/// A validated, immutable expression.
///
/// This is the only evaluable form of a tree: it can only be obtained
/// through validation. It holds no interior mutability, so one instance can
/// be cached and evaluated concurrently from many threads, each call with
/// its own context.
///
/// # Examples
///
/// ```
/// use jse_lang::{Expression, FunctionRegistry, RootContext, Value};
/// use serde_json::json;
///
/// let expr = Expression::parse(r#"{"$eq": ["@name", "corant"]}"#).unwrap();
/// let functions = FunctionRegistry::new();
///
/// let ctx = RootContext::from_json(json!({"name": "corant"}), &functions);
/// assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Boolean(true));
/// ```
#[derive(Debug, Clone)]
pub struct Expression {
    ast: Ast,
    root: NodeId,
    patterns: HashMap<NodeId, Regex>,
}

impl Expression {
    pub(crate) fn new(ast: Ast, root: NodeId, patterns: HashMap<NodeId, Regex>) -> Self {
        Expression {
            ast,
            root,
            patterns,
        }
    }

    /// Parse JSON text and build a validated expression with the default syntax.
    pub fn parse(source: &str) -> Result<Self> {
        let token: serde_json::Value = serde_json::from_str(source)?;
        Self::from_token(&token)
    }

    /// Build and validate an expression from an already parsed token tree.
    pub fn from_token(token: &serde_json::Value) -> Result<Self> {
        Self::build_with(&NodeBuilder::new(), token)
    }

    pub fn build_with(builder: &NodeBuilder, token: &serde_json::Value) -> Result<Self> {
        let ast = builder.build(token)?;
        Ok(Validator::new().validate(ast)?)
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Render back into a token tree with the default syntax.
    pub fn to_token(&self) -> serde_json::Value {
        self.ast.to_token(self.root, &Syntax::default())
    }

    /// Evaluate against a context.
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> Result<Value, EvalError> {
        Evaluator::new(self).evaluate(ctx)
    }

    /// Compiled, anchored pattern of a `$regex` node.
    pub(crate) fn pattern(&self, id: NodeId) -> Option<&Regex> {
        self.patterns.get(&id)
    }
}
