use std::cmp::Ordering;

use crate::{
    ast::{NodeId, NodeKind, Operator},
    context::{EvaluationContext, SubContext},
    error::EvalError,
    expression::Expression,
    value::{Map, Value},
};

/// Tree-walking interpreter over a validated [`Expression`].
///
/// The evaluator holds no state of its own; all variable state lives in the
/// context passed to [`Evaluator::evaluate`] and in the sub contexts that
/// comprehension operators stack on top of it.
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'a> {
    expression: &'a Expression,
}

impl<'a> Evaluator<'a> {
    pub fn new(expression: &'a Expression) -> Self {
        Evaluator { expression }
    }

    /// Evaluates the whole expression.
    ///
    /// # Examples
    ///
    /// ```
    /// use jse_lang::{Evaluator, Expression, FunctionRegistry, RootContext, Value};
    /// use serde_json::json;
    ///
    /// let expr = Expression::parse(
    ///     r#"{"$map": ["@items", {"$decl": "it"}, "@it.score"]}"#,
    /// ).unwrap();
    /// let functions = FunctionRegistry::new();
    /// let ctx = RootContext::from_json(
    ///     json!({"items": [{"score": 1}, {"score": 5}]}),
    ///     &functions,
    /// );
    ///
    /// let result = Evaluator::new(&expr).evaluate(&ctx).unwrap();
    /// assert_eq!(result, Value::Array(vec![Value::Integer(1), Value::Integer(5)]));
    /// ```
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn evaluate(&self, ctx: &dyn EvaluationContext) -> Result<Value, EvalError> {
        self.eval(self.expression.root(), ctx)
    }

    fn eval(&self, id: NodeId, ctx: &dyn EvaluationContext) -> Result<Value, EvalError> {
        let ast = self.expression.ast();
        let children = ast.children(id);
        match ast.kind(id) {
            NodeKind::Value(v) => Ok(v.clone()),
            NodeKind::Variable(path) => Ok(ctx.resolve_variable_value(path)),
            NodeKind::Function(name) => {
                let function = ctx.resolve_function(name)?;
                let args = self.eval_all(children, ctx)?;
                function(&args)
            }
            NodeKind::Declaration(names) => Err(EvalError::type_error(format!(
                "declaration of [{}] can only be used as a comprehension operand",
                names.join(", ")
            ))),
            NodeKind::Array => Ok(Value::Array(self.eval_all(children, ctx)?)),
            NodeKind::Object => {
                let mut map = Map::with_capacity(children.len());
                for &entry in children {
                    if let NodeKind::Entry(key) = ast.kind(entry) {
                        map.insert(key.clone(), self.eval(entry, ctx)?);
                    }
                }
                Ok(Value::Object(map))
            }
            NodeKind::Entry(_) => match children.first() {
                Some(&value) => self.eval(value, ctx),
                None => Ok(Value::Null),
            },
            NodeKind::Operator(op) => self.eval_operator(*op, id, children, ctx),
        }
    }

    fn eval_all(
        &self,
        ids: &[NodeId],
        ctx: &dyn EvaluationContext,
    ) -> Result<Vec<Value>, EvalError> {
        ids.iter().map(|&id| self.eval(id, ctx)).collect()
    }

    fn eval_operator(
        &self,
        op: Operator,
        id: NodeId,
        children: &[NodeId],
        ctx: &dyn EvaluationContext,
    ) -> Result<Value, EvalError> {
        use Operator::*;
        match op {
            Eq | Ne => {
                let left = self.eval(children[0], ctx)?;
                let right = self.eval(children[1], ctx)?;
                Ok(Value::Boolean(left.loose_eq(&right) == (op == Eq)))
            }
            Eqs | Nes => {
                let left = self.eval(children[0], ctx)?;
                let right = self.eval(children[1], ctx)?;
                Ok(Value::Boolean((left == right) == (op == Eqs)))
            }
            Gt | Gte | Lt | Lte => {
                let left = self.eval(children[0], ctx)?;
                let right = self.eval(children[1], ctx)?;
                let Some(ordering) = ordered(op, &left, &right)? else {
                    return Ok(Value::Boolean(false));
                };
                Ok(Value::Boolean(match op {
                    Gt => ordering.is_gt(),
                    Gte => ordering.is_ge(),
                    Lt => ordering.is_lt(),
                    _ => ordering.is_le(),
                }))
            }
            Between => {
                let value = self.eval(children[0], ctx)?;
                let low = self.eval(children[1], ctx)?;
                let high = self.eval(children[2], ctx)?;
                let (Some(above), Some(below)) =
                    (ordered(op, &value, &low)?, ordered(op, &value, &high)?)
                else {
                    return Ok(Value::Boolean(false));
                };
                Ok(Value::Boolean(above.is_ge() && below.is_le()))
            }
            Regex => {
                let value = self.eval(children[0], ctx)?;
                if value.is_null() {
                    return Ok(Value::Boolean(false));
                }
                let pattern = self
                    .expression
                    .pattern(id)
                    .ok_or_else(|| EvalError::type_error("$regex pattern was not compiled"))?;
                Ok(Value::Boolean(pattern.is_match(&value.as_string())))
            }
            In | Nin => {
                let value = self.eval(children[0], ctx)?;
                let candidates = match &children[1..] {
                    [single] => match self.eval(*single, ctx)? {
                        Value::Array(items) => items,
                        other => vec![other],
                    },
                    rest => self.eval_all(rest, ctx)?,
                };
                let found = candidates.iter().any(|c| value.loose_eq(c));
                Ok(Value::Boolean(found == (op == In)))
            }
            IsNull | NonNull => {
                let value = self.eval(children[0], ctx)?;
                Ok(Value::Boolean(value.is_null() == (op == IsNull)))
            }
            And | Not => {
                let mut all = true;
                for &child in children {
                    if !self.eval(child, ctx)?.is_truthy() {
                        all = false;
                        break;
                    }
                }
                Ok(Value::Boolean(all == (op == And)))
            }
            Or | Nor => {
                let mut any = false;
                for &child in children {
                    if self.eval(child, ctx)?.is_truthy() {
                        any = true;
                        break;
                    }
                }
                Ok(Value::Boolean(any == (op == Or)))
            }
            Xor => {
                let mut result = false;
                for &child in children {
                    result ^= self.eval(child, ctx)?.is_truthy();
                }
                Ok(Value::Boolean(result))
            }
            Conditional => {
                if self.eval(children[0], ctx)?.is_truthy() {
                    self.eval(children[1], ctx)
                } else {
                    match children.get(2) {
                        Some(&otherwise) => self.eval(otherwise, ctx),
                        None => Ok(Value::Null),
                    }
                }
            }
            Nvl => {
                let value = self.eval(children[0], ctx)?;
                match (children.len(), value.is_null()) {
                    (2, false) => Ok(value),
                    (2, true) => self.eval(children[1], ctx),
                    (_, false) => self.eval(children[1], ctx),
                    (_, true) => self.eval(children[2], ctx),
                }
            }
            Distinct => {
                let mut result: Vec<Value> = Vec::new();
                for &child in children {
                    let items = match self.eval(child, ctx)? {
                        Value::Array(items) => items,
                        other => vec![other],
                    };
                    for item in items {
                        if !result.contains(&item) {
                            result.push(item);
                        }
                    }
                }
                Ok(Value::Array(result))
            }
            Return | Subroutine => {
                let mut last = Value::Null;
                for &child in children {
                    last = self.eval(child, ctx)?;
                }
                Ok(last)
            }
            Filter => self.eval_filter(children, ctx),
            Map => self.eval_map(children, ctx),
            Sort => self.eval_sort(children, ctx),
            Max | Min => self.eval_extreme(op, children, ctx),
            Reduce => match children {
                [list, decl, body] => self.eval_fold(op, *list, None, *decl, *body, ctx),
                [list, initial, decl, body] => {
                    self.eval_fold(op, *list, Some(*initial), *decl, *body, ctx)
                }
                _ => Err(shape_error(op)),
            },
            Collect => match children {
                [list, initial, decl, body] => {
                    self.eval_fold(op, *list, Some(*initial), *decl, *body, ctx)
                }
                _ => Err(shape_error(op)),
            },
        }
    }

    /// Evaluate a comprehension's input. Null counts as an empty list.
    fn list(
        &self,
        op: Operator,
        id: NodeId,
        ctx: &dyn EvaluationContext,
    ) -> Result<Vec<Value>, EvalError> {
        match self.eval(id, ctx)? {
            Value::Array(items) => {
                tracing::trace!(%op, items = items.len(), "comprehension input");
                Ok(items)
            }
            Value::Null => Ok(Vec::new()),
            other => Err(EvalError::type_error(format!(
                "{} requires array, got {}",
                op,
                other.type_name()
            ))),
        }
    }

    fn names(&self, op: Operator, id: NodeId) -> Result<&'a [String], EvalError> {
        self.expression
            .ast()
            .node(id)
            .declared_names()
            .ok_or_else(|| shape_error(op))
    }

    fn eval_filter(
        &self,
        children: &[NodeId],
        ctx: &dyn EvaluationContext,
    ) -> Result<Value, EvalError> {
        let items = self.list(Operator::Filter, children[0], ctx)?;
        let name = &self.names(Operator::Filter, children[1])?[0];
        let mut scope = SubContext::new(ctx);
        let mut kept = Vec::new();
        for item in items {
            scope.unbind_all().bind(name, item);
            let keep = self.eval(children[2], &scope)?.is_truthy();
            if keep && let Some(item) = scope.take(name) {
                kept.push(item);
            }
        }
        Ok(Value::Array(kept))
    }

    fn eval_map(
        &self,
        children: &[NodeId],
        ctx: &dyn EvaluationContext,
    ) -> Result<Value, EvalError> {
        let items = self.list(Operator::Map, children[0], ctx)?;
        let name = &self.names(Operator::Map, children[1])?[0];
        let mut scope = SubContext::new(ctx);
        let mut mapped = Vec::with_capacity(items.len());
        for item in items {
            scope.unbind_all().bind(name, item);
            mapped.push(self.eval(children[2], &scope)?);
        }
        Ok(Value::Array(mapped))
    }

    fn eval_sort(
        &self,
        children: &[NodeId],
        ctx: &dyn EvaluationContext,
    ) -> Result<Value, EvalError> {
        let items = self.list(Operator::Sort, children[0], ctx)?;
        let names = self.names(Operator::Sort, children[1])?;
        let mut scope = SubContext::new(ctx);
        let mut compare = |a: &Value, b: &Value| self.compare(children[2], names, &mut scope, a, b);
        Ok(Value::Array(merge_sort(items, &mut compare)?))
    }

    fn eval_extreme(
        &self,
        op: Operator,
        children: &[NodeId],
        ctx: &dyn EvaluationContext,
    ) -> Result<Value, EvalError> {
        let items = self.list(op, children[0], ctx)?;
        let names = self.names(op, children[1])?;
        let wanted = if op == Operator::Max {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        let mut scope = SubContext::new(ctx);
        let mut best: Option<Value> = None;
        for item in items {
            best = Some(match best {
                None => item,
                Some(current) => {
                    if self.compare(children[2], names, &mut scope, &item, &current)? == wanted {
                        item
                    } else {
                        current
                    }
                }
            });
        }
        Ok(best.unwrap_or(Value::Null))
    }

    /// Left fold shared by `$reduce` and `$collect`.
    fn eval_fold(
        &self,
        op: Operator,
        list: NodeId,
        initial: Option<NodeId>,
        decl: NodeId,
        body: NodeId,
        ctx: &dyn EvaluationContext,
    ) -> Result<Value, EvalError> {
        let items = self.list(op, list, ctx)?;
        let names = self.names(op, decl)?;
        // without an initial value the first step sees a null accumulator
        let mut acc = match initial {
            Some(id) => self.eval(id, ctx)?,
            None => Value::Null,
        };
        if op == Operator::Collect && !matches!(acc, Value::Array(_) | Value::Object(_)) {
            return Err(EvalError::type_error(format!(
                "{} requires an array or object accumulator, got {}",
                op,
                acc.type_name()
            )));
        }
        let mut scope = SubContext::new(ctx);
        for item in items {
            scope.unbind_all().bind(&names[0], acc).bind(&names[1], item);
            acc = self.eval(body, &scope)?;
        }
        Ok(acc)
    }

    /// Run a comparator body over the pair `(a, b)`.
    fn compare(
        &self,
        body: NodeId,
        names: &[String],
        scope: &mut SubContext<'_>,
        a: &Value,
        b: &Value,
    ) -> Result<Ordering, EvalError> {
        scope
            .unbind_all()
            .bind(&names[0], a.clone())
            .bind(&names[1], b.clone());
        match self.eval(body, &*scope)? {
            Value::Integer(n) => Ok(n.cmp(&0)),
            Value::Float(n) => Ok(n.partial_cmp(&0.0).unwrap_or(Ordering::Equal)),
            other => Err(EvalError::type_error(format!(
                "comparator must yield a number, got {}",
                other.type_name()
            ))),
        }
    }
}

/// Ordering for the relational operators. `Ok(None)` means a null operand,
/// which makes the comparison false.
fn ordered(op: Operator, left: &Value, right: &Value) -> Result<Option<Ordering>, EvalError> {
    if left.is_null() || right.is_null() {
        return Ok(None);
    }
    left.compare(right).map(Some).ok_or_else(|| {
        EvalError::type_error(format!(
            "Cannot compare {} with {} in {}",
            left.type_name(),
            right.type_name(),
            op
        ))
    })
}

fn shape_error(op: Operator) -> EvalError {
    EvalError::type_error(format!("{} operands do not have the validated shape", op))
}

/// Stable merge sort with a fallible comparator.
///
/// Ties keep their input order, and an inconsistent comparator can only
/// produce an odd order, never a panic.
fn merge_sort<F>(mut items: Vec<Value>, compare: &mut F) -> Result<Vec<Value>, EvalError>
where
    F: FnMut(&Value, &Value) -> Result<Ordering, EvalError>,
{
    if items.len() <= 1 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare)?;
    let right = merge_sort(right, compare)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r)? == Ordering::Greater,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sort_is_stable() {
        let items: Vec<Value> = [(2, "a"), (1, "b"), (2, "c"), (1, "d")]
            .into_iter()
            .map(|(k, tag)| Value::Array(vec![Value::Integer(k), Value::String(tag.into())]))
            .collect();
        let mut by_key = |a: &Value, b: &Value| {
            let key = |v: &Value| v.lookup(&["0"]).and_then(Value::as_int).unwrap_or(0);
            Ok(key(a).cmp(&key(b)))
        };
        let sorted = merge_sort(items, &mut by_key).unwrap();
        let tags: Vec<String> = sorted
            .iter()
            .map(|v| v.lookup(&["1"]).map(Value::as_string).unwrap_or_default())
            .collect();
        assert_eq!(tags, ["b", "d", "a", "c"]);
    }

    #[test]
    fn merge_sort_propagates_comparator_errors() {
        let items = vec![Value::Integer(1), Value::Integer(2)];
        let mut failing = |_: &Value, _: &Value| Err(EvalError::type_error("boom"));
        assert!(merge_sort(items, &mut failing).is_err());
    }
}
