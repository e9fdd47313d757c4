//! Structural validation of expression trees.
//!
//! Every node is checked on its own, in pre-order, against the arity and
//! shape rules of its operator category. Validation runs once, when an
//! [`Expression`] is created; evaluation never reports structural errors.

use std::collections::HashMap;

use regex::Regex;

use crate::{
    ast::{Ast, Category, NodeId, NodeKind, Operator},
    error::StructuralError,
    expression::Expression,
    value::Value,
};

/// Stateless checker for per-operator shape rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator;

impl Validator {
    pub fn new() -> Self {
        Validator
    }

    /// Validate every reachable node, then seal the tree.
    ///
    /// A tree without a root has nothing to evaluate and is rejected.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn validate(&self, ast: Ast) -> Result<Expression, StructuralError> {
        let Some(root) = ast.root().filter(|&root| ast.contains(root)) else {
            return Err(StructuralError::new("root", "must be set to an existing node"));
        };
        let mut patterns = HashMap::new();
        for id in ast.preorder() {
            match ast.node(id).operator() {
                Some(Operator::Regex) => {
                    patterns.insert(id, self.pattern(&ast, id)?);
                }
                _ => self.visit(&ast, id)?,
            }
        }
        tracing::debug!(patterns = patterns.len(), "expression validated");
        Ok(Expression::new(ast, root, patterns))
    }

    /// Check a single node. Non-operator nodes always pass.
    pub fn visit(&self, ast: &Ast, id: NodeId) -> Result<(), StructuralError> {
        let Some(op) = ast.node(id).operator() else {
            return Ok(());
        };
        let children = ast.children(id);
        let count = children.len();
        let fail = |expected: &str| -> Result<(), StructuralError> {
            Err(StructuralError::new(op.token(), expected))
        };

        match op.category() {
            Category::Binary if count != 2 => fail("must contain 2 children nodes"),
            Category::Unary if count != 1 => fail("must contain 1 child node"),
            Category::Pattern => self.pattern(ast, id).map(|_| ()),
            Category::Range if count != 3 => fail("must contain 3 children nodes"),
            Category::Ternary if !(2..=3).contains(&count) => {
                fail("must contain 2 or 3 children nodes")
            }
            Category::Variadic if count == 0 => fail("must have children nodes"),
            Category::SingleBind => {
                if count != 3 || !declares(ast, children[1], 1) {
                    return fail(
                        "must contain 3 children nodes and the second must be a declaration \
                         of 1 name",
                    );
                }
                if op == Operator::Filter && !names_present(ast, children[1]) {
                    return fail("must declare a non-blank name");
                }
                Ok(())
            }
            Category::DoubleBind if count != 3 || !declares(ast, children[1], 2) => fail(
                "must contain 3 children nodes and the second must be a declaration of 2 names",
            ),
            Category::Fold => {
                let shaped = match count {
                    3 => declares(ast, children[1], 2),
                    4 => declares(ast, children[2], 2),
                    _ => false,
                };
                if shaped {
                    Ok(())
                } else {
                    fail(
                        "must contain 3 children nodes with a declaration of 2 names second, \
                         or 4 children nodes with a declaration of 2 names third",
                    )
                }
            }
            Category::Collect if count != 4 || !declares(ast, children[2], 2) => fail(
                "must contain 4 children nodes and the third must be a declaration of 2 names",
            ),
            _ => Ok(()),
        }
    }

    /// Check a `$regex` node and compile its literal pattern, anchored at
    /// both ends.
    fn pattern(&self, ast: &Ast, id: NodeId) -> Result<Regex, StructuralError> {
        let token = Operator::Regex.token();
        let children = ast.children(id);
        if children.len() != 2 || !ast.node(children[1]).is_value() {
            return Err(StructuralError::new(
                token,
                "must contain 2 children nodes and the second must be a value node",
            ));
        }
        let NodeKind::Value(Value::String(pattern)) = ast.kind(children[1]) else {
            return Err(StructuralError::new(token, "pattern must be a string literal"));
        };
        Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
            StructuralError::new(token, format!("pattern is not a valid regular expression: {e}"))
        })
    }
}

fn declares(ast: &Ast, id: NodeId, count: usize) -> bool {
    ast.node(id)
        .declared_names()
        .is_some_and(|names| names.len() == count)
}

fn names_present(ast: &Ast, id: NodeId) -> bool {
    ast.node(id)
        .declared_names()
        .is_some_and(|names| names.iter().all(|name| !name.is_empty()))
}

/// Validate a built tree with the default rules.
pub fn validate(ast: Ast) -> Result<Expression, StructuralError> {
    Validator::new().validate(ast)
}
