//! Turns a token tree (parsed JSON) into an expression [`Ast`].
//!
//! # Token conventions
//!
//! | Token | Node |
//! |---|---|
//! | `null`, `true`, `42`, `"text"` | [`NodeKind::Value`] |
//! | `"@it.score"` | [`NodeKind::Variable`] with path `["it", "score"]` |
//! | `"@@text"` | literal string `"@text"` |
//! | `[a, b]` | [`NodeKind::Array`] |
//! | `{"$gt": [a, b]}` | [`NodeKind::Operator`] |
//! | `{"#add": [a, b]}` | [`NodeKind::Function`] named `add` |
//! | `{"$decl": "acc,it"}` | [`NodeKind::Declaration`] |
//! | any other object | [`NodeKind::Object`] of [`NodeKind::Entry`] nodes |
//!
//! The builder only rejects tokens it cannot turn into a node at all.
//! Arity and shape rules are checked afterwards by the
//! [validator](crate::validator).

use serde_json::Value as Token;

use crate::{
    ast::{Ast, NodeId, NodeKind, Operator, VariablePath},
    convert::json_to_value,
    error::BuildError,
    value::Value,
};

/// Reserved sigils and separators recognised by the builder.
#[derive(Debug, Clone, PartialEq)]
pub struct Syntax {
    /// Leading character of variable references (`@`)
    pub variable_sigil: char,
    /// Leading character of custom function keys (`#`)
    pub function_sigil: char,
    /// Separator between namespace path segments (`.`)
    pub path_separator: char,
    /// Key of declaration objects (`$decl`)
    pub declaration_key: String,
    /// Separator between declared names (`,`)
    pub name_separator: char,
}

impl Default for Syntax {
    fn default() -> Self {
        Syntax {
            variable_sigil: '@',
            function_sigil: '#',
            path_separator: '.',
            declaration_key: "$decl".to_string(),
            name_separator: ',',
        }
    }
}

/// Builds expression trees from token trees.
#[derive(Debug, Clone, Default)]
pub struct NodeBuilder {
    syntax: Syntax,
}

impl NodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_syntax(syntax: Syntax) -> Self {
        NodeBuilder { syntax }
    }

    pub fn syntax(&self) -> &Syntax {
        &self.syntax
    }

    /// Build an unvalidated tree from a token.
    ///
    /// # Examples
    ///
    /// ```
    /// use jse_lang::{NodeBuilder, NodeKind, Operator};
    /// use serde_json::json;
    ///
    /// let ast = NodeBuilder::new().build(&json!({"$eq": ["@name", "corant"]})).unwrap();
    /// let root = ast.root().unwrap();
    /// assert_eq!(ast.kind(root), &NodeKind::Operator(Operator::Eq));
    /// assert_eq!(ast.children(root).len(), 2);
    /// ```
    pub fn build(&self, token: &Token) -> Result<Ast, BuildError> {
        let mut ast = Ast::default();
        let root = self.build_node(&mut ast, token)?;
        ast.mark_root(root);
        Ok(ast)
    }

    fn build_node(&self, ast: &mut Ast, token: &Token) -> Result<NodeId, BuildError> {
        match token {
            Token::String(s) => self.build_string(ast, s),
            Token::Array(items) => {
                let id = ast.push(NodeKind::Array);
                for item in items {
                    let child = self.build_node(ast, item)?;
                    ast.attach(id, child);
                }
                Ok(id)
            }
            Token::Object(map) => match map.iter().next() {
                Some((key, value)) if map.len() == 1 => self.build_entry(ast, key, value, token),
                _ => self.build_object(ast, token),
            },
            scalar => Ok(ast.push(NodeKind::Value(json_to_value(scalar.clone())))),
        }
    }

    fn build_string(&self, ast: &mut Ast, s: &str) -> Result<NodeId, BuildError> {
        let Some(reference) = s.strip_prefix(self.syntax.variable_sigil) else {
            return Ok(ast.push(NodeKind::Value(Value::String(s.to_string()))));
        };
        if reference.starts_with(self.syntax.variable_sigil) {
            // doubled sigil escapes a literal
            return Ok(ast.push(NodeKind::Value(Value::String(reference.to_string()))));
        }
        let path = VariablePath::parse(reference, self.syntax.path_separator)
            .ok_or_else(|| BuildError::InvalidVariable(s.to_string()))?;
        Ok(ast.push(NodeKind::Variable(path)))
    }

    fn build_entry(
        &self,
        ast: &mut Ast,
        key: &str,
        value: &Token,
        token: &Token,
    ) -> Result<NodeId, BuildError> {
        if key == self.syntax.declaration_key {
            let names = self.declared_names(value)?;
            return Ok(ast.push(NodeKind::Declaration(names)));
        }

        let kind = if let Some(op) = Operator::from_token(key) {
            NodeKind::Operator(op)
        } else if let Some(name) = key.strip_prefix(self.syntax.function_sigil) {
            if name.trim().is_empty() {
                return Err(BuildError::BlankFunctionName);
            }
            NodeKind::Function(name.to_string())
        } else {
            if key.starts_with('$') {
                tracing::debug!(key, "unknown operator key, building an object literal");
            }
            return self.build_object(ast, token);
        };

        let id = ast.push(kind);
        let child = self.build_node(ast, value)?;
        ast.attach(id, child);
        ast.post_construct(id);
        Ok(id)
    }

    fn build_object(&self, ast: &mut Ast, token: &Token) -> Result<NodeId, BuildError> {
        let id = ast.push(NodeKind::Object);
        if let Token::Object(map) = token {
            for (key, value) in map {
                let entry = ast.push(NodeKind::Entry(key.clone()));
                let child = self.build_node(ast, value)?;
                ast.attach(entry, child);
                ast.attach(id, entry);
            }
        }
        Ok(id)
    }

    fn declared_names(&self, value: &Token) -> Result<Vec<String>, BuildError> {
        match value {
            Token::String(s) => Ok(s
                .split(self.syntax.name_separator)
                .map(|name| name.trim().to_string())
                .collect()),
            Token::Array(items) => items
                .iter()
                .map(|item| match item {
                    Token::String(name) => Ok(name.trim().to_string()),
                    other => Err(BuildError::InvalidDeclaration(token_type(other).into())),
                })
                .collect(),
            other => Err(BuildError::InvalidDeclaration(token_type(other).into())),
        }
    }
}

fn token_type(token: &Token) -> &'static str {
    match token {
        Token::Null => "null",
        Token::Bool(_) => "boolean",
        Token::Number(_) => "number",
        Token::String(_) => "string",
        Token::Array(_) => "array",
        Token::Object(_) => "object",
    }
}
