//! # jse-lang
//!
//! A JSON-shaped expression language for filtering, projecting and
//! transforming query results.
//!
//! ```
//! use jse_lang::{Expression, FunctionRegistry, RootContext, Value};
//! use serde_json::json;
//!
//! let expr = Expression::parse(r##"
//!     {"$reduce": ["@items", {"$decl": "acc,it"}, {"#add": ["@acc", "@it.score"]}]}
//! "##).unwrap();
//!
//! let functions = FunctionRegistry::with_builtins();
//! let ctx = RootContext::from_json(
//!     json!({"items": [{"score": 1}, {"score": 5}, {"score": 9}]}),
//!     &functions,
//! );
//! assert_eq!(expr.evaluate(&ctx).unwrap(), Value::Integer(15));
//! ```
pub mod ast;
pub mod builder;
#[cfg(feature = "cli")]
pub mod cli;
pub mod context;
pub mod convert;
pub mod error;
pub mod evaluator;
pub mod expression;
pub mod fetch;
pub mod functions;
pub mod validator;
pub mod value;

pub use ast::{Ast, Node, NodeId, NodeKind, Operator, VariablePath};
pub use builder::{NodeBuilder, Syntax};
pub use context::{
    EvaluationContext, Function, FunctionRegistry, FunctionResolver, RootContext, SubContext,
};
pub use error::{BuildError, Error, EvalError, Result, StructuralError, TreeError};
pub use evaluator::Evaluator;
pub use expression::Expression;
pub use fetch::{FetchScript, LinkedContext};
pub use functions::BuiltinFunctions;
pub use validator::{Validator, validate};
pub use value::Value;
