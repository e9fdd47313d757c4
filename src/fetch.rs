//! Result-fetching decisions for related queries.
//!
//! A query may fetch related rows for each of its result rows. A fetch
//! script decides whether to fetch at all (the predicate) and which fetched
//! rows to inject into which parent row (the filter), optionally projecting
//! them down to a set of fields.
//!
//! Variables in fetch scripts use fixed namespaces:
//!
//! | Prefix | Resolves against |
//! |---|---|
//! | `@r.` | the current parent result row |
//! | `@fr.` | the candidate fetched row |
//! | `@p.` | the query parameters |
//!
//! Paths without one of these prefixes resolve against the parameters.
//!
//! # Script layout
//!
//! ```text
//! {
//!   "filter": {"$eq": ["@r.id", "@fr.ownerId"]},
//!   "projection": {"name": true, "address.city": true}
//! }
//! ```
//!
//! A script with neither a `filter` nor a `projection` key is used as the
//! filter as a whole.

use crate::{
    ast::VariablePath,
    context::{EvaluationContext, Function, FunctionRegistry},
    error::{Error, EvalError, Result},
    expression::Expression,
    value::{Map, Value},
};

pub const PARENT_RESULT_NAMESPACE: &str = "r";
pub const FETCHED_RESULT_NAMESPACE: &str = "fr";
pub const PARAMETER_NAMESPACE: &str = "p";

pub const FILTER_KEY: &str = "filter";
pub const PROJECTION_KEY: &str = "projection";

/// Evaluation context exposing a parent row, a fetched row and the query
/// parameters under their namespaces.
#[derive(Debug, Clone, Copy)]
pub struct LinkedContext<'a> {
    parent_result: Option<&'a Value>,
    fetched_result: Option<&'a Value>,
    parameters: &'a Value,
    functions: &'a FunctionRegistry,
}

impl<'a> LinkedContext<'a> {
    pub fn new(parameters: &'a Value, functions: &'a FunctionRegistry) -> Self {
        LinkedContext {
            parent_result: None,
            fetched_result: None,
            parameters,
            functions,
        }
    }

    /// Point the context at a parent row and optionally a fetched row.
    pub fn link(mut self, parent_result: &'a Value, fetched_result: Option<&'a Value>) -> Self {
        self.parent_result = Some(parent_result);
        self.fetched_result = fetched_result;
        self
    }
}

impl EvaluationContext for LinkedContext<'_> {
    fn resolve_variable_value(&self, path: &VariablePath) -> Value {
        let (source, rest) = match path.first() {
            PARENT_RESULT_NAMESPACE => (self.parent_result, path.rest()),
            FETCHED_RESULT_NAMESPACE => (self.fetched_result, path.rest()),
            PARAMETER_NAMESPACE => (Some(self.parameters), path.rest()),
            _ => (Some(self.parameters), path.segments()),
        };
        source
            .and_then(|value| value.lookup(rest))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn resolve_function(&self, name: &str) -> Result<Function, EvalError> {
        self.functions.resolve(name)
    }
}

/// A parsed fetch script: an optional filter and an optional projection.
#[derive(Debug, Clone)]
pub struct FetchScript {
    filter: Option<Expression>,
    projection: Option<Vec<Vec<String>>>,
}

impl FetchScript {
    pub fn parse(code: &str) -> Result<Self> {
        let root: serde_json::Value = serde_json::from_str(code)?;
        Self::from_token(&root)
    }

    pub fn from_token(root: &serde_json::Value) -> Result<Self> {
        let filter_token = root.get(FILTER_KEY);
        let projection_token = root.get(PROJECTION_KEY);

        let filter = match (filter_token, projection_token) {
            (None, None) => Some(Expression::from_token(root)?),
            (Some(token), _) => Some(Expression::from_token(token)?),
            (None, Some(_)) => None,
        };
        let projection = projection_token.map(parse_projection).transpose()?;

        tracing::debug!(
            filter = filter.is_some(),
            projected_keys = projection.as_ref().map_or(0, Vec::len),
            "fetch script parsed"
        );
        Ok(FetchScript { filter, projection })
    }

    pub fn filter(&self) -> Option<&Expression> {
        self.filter.as_ref()
    }

    /// Projected key paths, in declaration order
    pub fn projection(&self) -> Option<&[Vec<String>]> {
        self.projection.as_deref()
    }

    /// Decide whether to fetch for a result row.
    ///
    /// A script without a filter always fetches.
    pub fn predicate(
        &self,
        result: &Value,
        parameters: &Value,
        functions: &FunctionRegistry,
    ) -> Result<bool, EvalError> {
        match &self.filter {
            Some(filter) => {
                let ctx = LinkedContext::new(parameters, functions).link(result, None);
                Ok(filter.evaluate(&ctx)?.is_truthy())
            }
            None => Ok(true),
        }
    }

    /// Inject matching fetched rows into each parent row at `inject_path`.
    ///
    /// With `multi_records` the injected value is the list of all matches;
    /// otherwise it is the first match, or null when nothing matched.
    pub fn inject(
        &self,
        parent_results: &mut [Value],
        fetched_results: &[Value],
        parameters: &Value,
        functions: &FunctionRegistry,
        multi_records: bool,
        inject_path: &str,
    ) -> Result<(), EvalError> {
        let path: Vec<&str> = inject_path.split('.').filter(|s| !s.is_empty()).collect();
        let base = LinkedContext::new(parameters, functions);

        for parent in parent_results.iter_mut() {
            let mut selected: Vec<&Value> = Vec::new();
            match &self.filter {
                None if multi_records => selected.extend(fetched_results),
                None => selected.extend(fetched_results.first()),
                Some(filter) => {
                    for fetched in fetched_results {
                        let ctx = base.link(parent, Some(fetched));
                        if filter.evaluate(&ctx)?.is_truthy() {
                            selected.push(fetched);
                            if !multi_records {
                                break;
                            }
                        }
                    }
                }
            }

            let mut injected: Vec<Value> = match &self.projection {
                Some(keys) => selected.into_iter().map(|row| project(row, keys)).collect(),
                None => selected.into_iter().cloned().collect(),
            };
            *parent.entry_path(&path) = if multi_records {
                Value::Array(injected)
            } else if injected.is_empty() {
                Value::Null
            } else {
                injected.swap_remove(0)
            };
        }
        Ok(())
    }
}

fn project(row: &Value, keys: &[Vec<String>]) -> Value {
    let mut result = Value::Object(Map::new());
    for key in keys {
        let value = row.lookup(key).cloned().unwrap_or(Value::Null);
        *result.entry_path(key) = value;
    }
    result
}

fn parse_projection(token: &serde_json::Value) -> Result<Vec<Vec<String>>> {
    let serde_json::Value::Object(map) = token else {
        return Err(Error::Script(format!("{} must be an object", PROJECTION_KEY)));
    };
    let mut keys: Vec<Vec<String>> = Vec::new();
    for (key, flag) in map {
        if !enabled(flag) {
            continue;
        }
        let segments: Vec<String> = key
            .split('.')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        if !segments.is_empty() && !keys.contains(&segments) {
            keys.push(segments);
        }
    }
    if keys.is_empty() {
        return Err(Error::Script(format!("{} can't be empty", PROJECTION_KEY)));
    }
    Ok(keys)
}

fn enabled(flag: &serde_json::Value) -> bool {
    match flag {
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        serde_json::Value::String(s) => s.trim().eq_ignore_ascii_case("true") || s.trim() == "1",
        _ => false,
    }
}
