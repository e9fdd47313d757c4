//! Builtin function resolver.
//!
//! Functions are called as `{"#name": [operands...]}`. The builtins cover
//! arithmetic, string helpers and the collection helpers that `$reduce` and
//! `$collect` bodies need to build accumulators.
//!
//! | Function | Meaning |
//! |---|---|
//! | `add sub mul div mod` | left fold, null operands skipped; `add` also joins strings |
//! | `compare(a, b)` | `-1`, `0` or `1` by the total value order, for `$sort`/`$max`/`$min` |
//! | `concat(...)` | string forms joined |
//! | `upper lower trim` | string case and whitespace |
//! | `size(x)` | length of a string, array or object; `0` for null |
//! | `contains startsWith endsWith` | substring or element tests |
//! | `append(list, items...)` | new array with items appended |
//! | `put(object, key, value)` | new object with one key set |
//! | `get(value, path)` | non-strict dotted lookup |
//! | `keys values` | object keys (sorted) or the values in key order |
//! | `type(x)` | type name |

use std::sync::Arc;

use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    context::{Function, FunctionResolver},
    error::EvalError,
    value::{Map, Value},
};

/// Resolver for the builtin functions listed in the module docs.
///
/// It has priority `100`, so resolvers registered with the default
/// priority `0` can override any builtin name.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinFunctions;

impl BuiltinFunctions {
    pub const NAMES: [&'static str; 20] = [
        "add",
        "sub",
        "mul",
        "div",
        "mod",
        "compare",
        "concat",
        "upper",
        "lower",
        "trim",
        "size",
        "contains",
        "startsWith",
        "endsWith",
        "append",
        "put",
        "get",
        "keys",
        "values",
        "type",
    ];
}

impl FunctionResolver for BuiltinFunctions {
    fn supports(&self, name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    fn priority(&self) -> i32 {
        100
    }

    fn resolve(&self, name: &str) -> Function {
        let name = name.to_string();
        Arc::new(move |args: &[Value]| call(&name, args))
    }
}

fn call(name: &str, args: &[Value]) -> Result<Value, EvalError> {
    match name {
        "add" => fold_arithmetic(name, args, Arith::Add),
        "sub" => fold_arithmetic(name, args, Arith::Sub),
        "mul" => fold_arithmetic(name, args, Arith::Mul),
        "div" => fold_arithmetic(name, args, Arith::Div),
        "mod" => fold_arithmetic(name, args, Arith::Mod),
        "compare" => {
            let [a, b] = exact::<2>(name, args)?;
            Ok(Value::Integer(a.canonical_cmp(b) as i64))
        }
        "concat" => Ok(Value::String(
            args.iter().map(Value::as_string).collect::<Vec<_>>().concat(),
        )),
        "upper" => map_string(name, args, str::to_uppercase),
        "lower" => map_string(name, args, str::to_lowercase),
        "trim" => map_string(name, args, |s| s.trim().to_string()),
        "size" => {
            let [v] = exact::<1>(name, args)?;
            match v {
                Value::Null => Ok(Value::Integer(0)),
                Value::String(s) => Ok(Value::Integer(s.chars().count() as i64)),
                Value::Array(arr) => Ok(Value::Integer(arr.len() as i64)),
                Value::Object(obj) => Ok(Value::Integer(obj.len() as i64)),
                other => Err(failure(
                    name,
                    format!("requires string, array or object, got {}", other.type_name()),
                )),
            }
        }
        "contains" => {
            let [hay, needle] = exact::<2>(name, args)?;
            match (hay, needle) {
                (Value::String(s), Value::String(sub)) => {
                    Ok(Value::Boolean(s.contains(sub.as_str())))
                }
                (Value::Array(items), v) => Ok(Value::Boolean(items.iter().any(|i| i.loose_eq(v)))),
                (Value::Null, _) => Ok(Value::Boolean(false)),
                (a, b) => Err(failure(
                    name,
                    format!("cannot search {} in {}", b.type_name(), a.type_name()),
                )),
            }
        }
        "startsWith" | "endsWith" => {
            let [s, affix] = exact::<2>(name, args)?;
            match (s, affix) {
                (Value::String(s), Value::String(affix)) => {
                    Ok(Value::Boolean(if name == "startsWith" {
                        s.starts_with(affix.as_str())
                    } else {
                        s.ends_with(affix.as_str())
                    }))
                }
                (Value::Null, _) => Ok(Value::Boolean(false)),
                (a, b) => Err(failure(
                    name,
                    format!("requires strings, got {} and {}", a.type_name(), b.type_name()),
                )),
            }
        }
        "append" => match args.split_first() {
            Some((Value::Array(items), rest)) => {
                let mut items = items.clone();
                items.extend(rest.iter().cloned());
                Ok(Value::Array(items))
            }
            Some((Value::Null, rest)) => Ok(Value::Array(rest.to_vec())),
            Some((other, _)) => {
                Err(failure(name, format!("requires array, got {}", other.type_name())))
            }
            None => Err(failure(name, "requires at least 1 argument")),
        },
        "put" => {
            let [target, key, value] = exact::<3>(name, args)?;
            let mut map = match target {
                Value::Object(map) => map.clone(),
                Value::Null => Map::new(),
                other => {
                    return Err(failure(
                        name,
                        format!("requires object, got {}", other.type_name()),
                    ));
                }
            };
            map.insert(key.as_string(), value.clone());
            Ok(Value::Object(map))
        }
        "get" => {
            let [target, path] = exact::<2>(name, args)?;
            let path = path.as_string();
            let segments: Vec<&str> = path.split('.').collect();
            Ok(target.lookup(&segments).cloned().unwrap_or(Value::Null))
        }
        "keys" | "values" => {
            let [target] = exact::<1>(name, args)?;
            let Value::Object(map) = target else {
                return Err(failure(name, format!("requires object, got {}", target.type_name())));
            };
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            Ok(Value::Array(if name == "keys" {
                keys.into_iter().map(|k| Value::String(k.clone())).collect()
            } else {
                keys.into_iter().map(|k| map[k].clone()).collect()
            }))
        }
        "type" => {
            let [v] = exact::<1>(name, args)?;
            Ok(Value::String(v.type_name().to_string()))
        }
        _ => Err(EvalError::UnsupportedFunction(name.to_string())),
    }
}

fn failure(name: &str, message: impl Into<String>) -> EvalError {
    EvalError::Function {
        name: name.to_string(),
        message: message.into(),
    }
}

fn exact<'a, const N: usize>(name: &str, args: &'a [Value]) -> Result<&'a [Value; N], EvalError> {
    args.try_into().map_err(|_| {
        failure(
            name,
            format!("requires exactly {} argument(s), got {}", N, args.len()),
        )
    })
}

fn map_string(name: &str, args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, EvalError> {
    let [v] = exact::<1>(name, args)?;
    match v {
        Value::String(s) => Ok(Value::String(f(s))),
        Value::Null => Ok(Value::Null),
        other => Err(failure(name, format!("requires string, got {}", other.type_name()))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

fn fold_arithmetic(name: &str, args: &[Value], op: Arith) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(failure(name, "requires at least 1 argument"));
    }
    let mut operands = args.iter().filter(|v| !v.is_null());
    let Some(first) = operands.next() else {
        return Ok(Value::Null);
    };
    operands.try_fold(first.clone(), |acc, next| arithmetic(op, &acc, next))
}

/// Binary arithmetic keeping integers when the result is whole.
///
/// Mixed integer/float operands go through `Decimal` so that, for
/// example, `100 * 1.1` yields the integer `110`.
fn arithmetic(op: Arith, left: &Value, right: &Value) -> Result<Value, EvalError> {
    match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => match op {
            Arith::Add => checked(a.checked_add(*b)),
            Arith::Sub => checked(a.checked_sub(*b)),
            Arith::Mul => checked(a.checked_mul(*b)),
            Arith::Div | Arith::Mod if *b == 0 => Err(EvalError::DivisionByZero),
            // exact division stays integral, anything else becomes a float
            Arith::Div => match a.checked_rem(*b) {
                Some(0) => checked(a.checked_div(*b)),
                Some(_) => Ok(Value::Float(*a as f64 / *b as f64)),
                None => checked(None),
            },
            Arith::Mod => checked(a.checked_rem(*b)),
        },
        (Value::Float(a), Value::Float(b)) => match op {
            Arith::Add => Ok(Value::Float(a + b)),
            Arith::Sub => Ok(Value::Float(a - b)),
            Arith::Mul => Ok(Value::Float(a * b)),
            Arith::Div | Arith::Mod if *b == 0.0 => Err(EvalError::DivisionByZero),
            Arith::Div => Ok(Value::Float(a / b)),
            Arith::Mod => Ok(Value::Float(a % b)),
        },
        (Value::Integer(a), Value::Float(b)) => {
            mixed(op, Decimal::from_i64(*a), Decimal::from_f64(*b), *a as f64, *b)
        }
        (Value::Float(a), Value::Integer(b)) => {
            mixed(op, Decimal::from_f64(*a), Decimal::from_i64(*b), *a, *b as f64)
        }
        (Value::String(a), Value::String(b)) if op == Arith::Add => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        (a, b) => Err(EvalError::type_error(format!(
            "Cannot apply {:?} to {} and {}",
            op,
            a.type_name(),
            b.type_name()
        ))),
    }
}

fn checked(result: Option<i64>) -> Result<Value, EvalError> {
    result
        .map(Value::Integer)
        .ok_or_else(|| EvalError::type_error("integer overflow"))
}

fn mixed(
    op: Arith,
    ad: Option<Decimal>,
    bd: Option<Decimal>,
    af: f64,
    bf: f64,
) -> Result<Value, EvalError> {
    if matches!(op, Arith::Div | Arith::Mod) && bf == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    if let Some(ad) = ad
        && let Some(bd) = bd
    {
        let rd = match op {
            Arith::Add => ad.checked_add(bd),
            Arith::Sub => ad.checked_sub(bd),
            Arith::Mul => ad.checked_mul(bd),
            Arith::Div => ad.checked_div(bd),
            Arith::Mod => ad.checked_rem(bd),
        };
        if let Some(rd) = rd {
            if rd.is_integer()
                && let Some(r) = rd.to_i64()
            {
                return Ok(Value::Integer(r));
            } else if let Some(r) = rd.to_f64() {
                return Ok(Value::Float(r));
            }
        }
    }
    let res = match op {
        Arith::Add => af + bf,
        Arith::Sub => af - bf,
        Arith::Mul => af * bf,
        Arith::Div => af / bf,
        Arith::Mod => af % bf,
    };
    Ok(Value::Float(res))
}
