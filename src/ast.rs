//! # Expression Language - Abstract Syntax Tree
//!
//! An expression is written as a JSON document. Reserved object keys name
//! operators, strings starting with `@` reference variables and everything
//! else is literal data.
//!
//! ## Architecture Overview
//!
//! - **[node]** - Arena-backed tree: [`Ast`], [`NodeId`], [`Node`], [`NodeKind`]
//! - **[operators]** - Reserved operator table and shape categories
//! - **[path]** - Dotted namespace paths used by variable references
//!
//! ## Quick Start
//!
//! ```text
//! {"$and": [
//!     {"$gte": ["@age", 18]},
//!     {"$regex": ["@name", "^co.*"]}
//! ]}
//! ```
//!
//! ## Core Concepts
//!
//! ### Array unwrap
//!
//! Operators accept operands either spread or wrapped in one array:
//! `{"$eq": ["@a", 1]}` builds an `$eq` node with two children, exactly
//! like a node whose sole array child was flattened into it.
//!
//! ### Comprehensions
//!
//! `$filter`, `$map`, `$sort`, `$max`, `$min`, `$reduce` and `$collect`
//! iterate a list while binding names introduced by a declaration:
//!
//! ```text
//! {"$map": ["@items", {"$decl": "it"}, "@it.score"]}
//! ```
//!
//! ### Lifecycle
//!
//! A tree is built once, validated once and then wrapped into an immutable
//! [`Expression`](crate::Expression) that can be evaluated any number of
//! times, from any number of threads.
pub mod node;
pub mod operators;
pub mod path;

pub use node::{Ast, Node, NodeId, NodeKind};
pub use operators::{Category, Operator};
pub use path::VariablePath;
