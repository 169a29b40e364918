//! Built-in operations: the fixed set of stack-manipulating, arithmetic,
//! comparison and I/O words every program can call without a `fun`
//! definition.
//!
//! Every built-in operates on the *context stack* passed in by the
//! evaluator; `ret` additionally reaches into the caller's stack. Stack
//! underflow in any built-in is a fatal [`NumenError::StackUnderflow`].

use numen_core::{NumenError, NumenResult, Value};

/// The fixed set of recognized built-in symbols, in the order the parser
/// checks them. Anything not in this list that also isn't a keyword, type
/// name, or literal becomes an `Identifier`.
pub const BUILTIN_NAMES: &[&str] = &[
    "+", "-", "*", "/", "%", "==", "!=", ">", "<", ">=", "<=", "print", "swap", "drop", "copy",
    "carry", "rot", "max", "min", "ret", "is",
];

pub fn is_builtin_name(word: &str) -> bool {
    BUILTIN_NAMES.contains(&word)
}

/// Run a built-in by name against the active context stack. `caller_stack`
/// is only read/written by `ret`.
pub fn call(name: &str, stack: &mut Vec<Value>, caller_stack: &mut Vec<Value>) -> NumenResult<()> {
    match name {
        "+" => plus(stack),
        "-" => binary_numeric(stack, "-", |a, b| a - b, |a, b| a - b),
        "*" => binary_numeric(stack, "*", |a, b| a * b, |a, b| a * b),
        "/" => divide(stack),
        "%" => modulo(stack),
        "==" => {
            let (a, b) = pop2(stack, "==")?;
            stack.push(Value::Bool(a == b));
            Ok(())
        }
        "!=" => {
            let (a, b) = pop2(stack, "!=")?;
            stack.push(Value::Bool(a != b));
            Ok(())
        }
        ">" => comparison(stack, ">", |a, b| a > b, |a, b| a > b),
        "<" => comparison(stack, "<", |a, b| a < b, |a, b| a < b),
        ">=" => comparison(stack, ">=", |a, b| a >= b, |a, b| a >= b),
        "<=" => comparison(stack, "<=", |a, b| a <= b, |a, b| a <= b),
        "print" => print(stack),
        "swap" => swap(stack),
        "drop" => {
            pop(stack, "drop")?;
            Ok(())
        }
        "copy" => copy(stack),
        "carry" => carry(stack),
        "rot" => rot(stack),
        "max" => binary_numeric(stack, "max", |a, b| a.max(b), |a, b| a.max(b)),
        "min" => binary_numeric(stack, "min", |a, b| a.min(b), |a, b| a.min(b)),
        "ret" => ret(stack, caller_stack),
        "is" => is(stack),
        other => Err(NumenError::name_error(format!("'{other}' is not a known built-in"))),
    }
}

fn pop(stack: &mut Vec<Value>, operation: &str) -> NumenResult<Value> {
    stack.pop().ok_or_else(|| NumenError::stack_underflow(operation))
}

/// Pop two operands in stack order: `a` was pushed first (deeper), `b` was
/// pushed last (on top), matching the usual `a b op` reading.
fn pop2(stack: &mut Vec<Value>, operation: &str) -> NumenResult<(Value, Value)> {
    let b = pop(stack, operation)?;
    let a = pop(stack, operation)?;
    Ok((a, b))
}

fn plus(stack: &mut Vec<Value>) -> NumenResult<()> {
    let (a, b) = pop2(stack, "+")?;
    match (&a, &b) {
        (Value::String(x), Value::String(y)) => {
            stack.push(Value::String(format!("{x}{y}")));
            Ok(())
        }
        _ => binary_numeric_values("+", a, b, |x, y| x + y, |x, y| x + y).map(|v| stack.push(v)),
    }
}

fn binary_numeric_values(
    op: &str,
    a: Value,
    b: Value,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> NumenResult<Value> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(Value::Int(int_op(x, y))),
        (Value::Float(x), Value::Float(y)) => Ok(Value::Float(float_op(x, y))),
        (Value::Int(x), Value::Float(y)) => Ok(Value::Float(float_op(x as f64, y))),
        (Value::Float(x), Value::Int(y)) => Ok(Value::Float(float_op(x, y as f64))),
        (a, b) => Err(NumenError::type_error(format!(
            "'{op}' requires numeric operands, got {} and {}",
            a.kind_name(),
            b.kind_name()
        ))),
    }
}

fn binary_numeric(
    stack: &mut Vec<Value>,
    op: &str,
    int_op: impl Fn(i64, i64) -> i64,
    float_op: impl Fn(f64, f64) -> f64,
) -> NumenResult<()> {
    let (a, b) = pop2(stack, op)?;
    stack.push(binary_numeric_values(op, a, b, int_op, float_op)?);
    Ok(())
}

fn comparison(
    stack: &mut Vec<Value>,
    op: &str,
    int_cmp: impl Fn(i64, i64) -> bool,
    float_cmp: impl Fn(f64, f64) -> bool,
) -> NumenResult<()> {
    let (a, b) = pop2(stack, op)?;
    let result = match (a, b) {
        (Value::Int(x), Value::Int(y)) => int_cmp(x, y),
        (Value::Float(x), Value::Float(y)) => float_cmp(x, y),
        (Value::Int(x), Value::Float(y)) => float_cmp(x as f64, y),
        (Value::Float(x), Value::Int(y)) => float_cmp(x, y as f64),
        (a, b) => {
            return Err(NumenError::type_error(format!(
                "'{op}' requires numeric operands, got {} and {}",
                a.kind_name(),
                b.kind_name()
            )));
        }
    };
    stack.push(Value::Bool(result));
    Ok(())
}

fn divide(stack: &mut Vec<Value>) -> NumenResult<()> {
    let (a, b) = pop2(stack, "/")?;
    let result = match (a, b) {
        (Value::Int(_), Value::Int(0)) => {
            return Err(NumenError::type_error("'/' division by zero"));
        }
        (Value::Int(x), Value::Int(y)) => Value::Int(x / y),
        (Value::Float(x), Value::Float(y)) => Value::Float(x / y),
        (Value::Int(x), Value::Float(y)) => Value::Float(x as f64 / y),
        (Value::Float(x), Value::Int(y)) => Value::Float(x / y as f64),
        (a, b) => {
            return Err(NumenError::type_error(format!(
                "'/' requires numeric operands, got {} and {}",
                a.kind_name(),
                b.kind_name()
            )));
        }
    };
    stack.push(result);
    Ok(())
}

/// Integer `%` computes true remainder. The reference Go implementation
/// this language was distilled from computes integer `%` as integer
/// division (confirmed in `Bmod`, `examples/original_source/core/core.go`):
/// this is a documented bug fix, not a reinterpretation (see SPEC_FULL.md
/// §9 and DESIGN.md).
fn modulo(stack: &mut Vec<Value>) -> NumenResult<()> {
    let (a, b) = pop2(stack, "%")?;
    let result = match (a, b) {
        (Value::Int(_), Value::Int(0)) => {
            return Err(NumenError::type_error("'%' division by zero"));
        }
        (Value::Int(x), Value::Int(y)) => Value::Int(x % y),
        (Value::Float(x), Value::Float(y)) => Value::Float(x % y),
        (Value::Int(x), Value::Float(y)) => Value::Float(x as f64 % y),
        (Value::Float(x), Value::Int(y)) => Value::Float(x % y as f64),
        (a, b) => {
            return Err(NumenError::type_error(format!(
                "'%' requires numeric operands, got {} and {}",
                a.kind_name(),
                b.kind_name()
            )));
        }
    };
    stack.push(result);
    Ok(())
}

fn print(stack: &mut Vec<Value>) -> NumenResult<()> {
    let value = pop(stack, "print")?;
    match &value {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) | Value::String(_) => {
            println!("{value}");
            Ok(())
        }
        other => Err(NumenError::type_error(format!("'{other}' is not printable"))),
    }
}

fn swap(stack: &mut Vec<Value>) -> NumenResult<()> {
    let (a, b) = pop2(stack, "swap")?;
    stack.push(b);
    stack.push(a);
    Ok(())
}

fn copy(stack: &mut Vec<Value>) -> NumenResult<()> {
    let top = stack.last().ok_or_else(|| NumenError::stack_underflow("copy"))?.clone();
    stack.push(top);
    Ok(())
}

/// `(a b -- a b a)`: duplicate the second-from-top item onto the top.
fn carry(stack: &mut Vec<Value>) -> NumenResult<()> {
    if stack.len() < 2 {
        return Err(NumenError::stack_underflow("carry"));
    }
    let second_from_top = stack[stack.len() - 2].clone();
    stack.push(second_from_top);
    Ok(())
}

/// `(a b c -- a c b)`.
fn rot(stack: &mut Vec<Value>) -> NumenResult<()> {
    let c = pop(stack, "rot")?;
    let b = pop(stack, "rot")?;
    let a = pop(stack, "rot")?;
    stack.push(a);
    stack.push(c);
    stack.push(b);
    Ok(())
}

fn ret(stack: &mut Vec<Value>, caller_stack: &mut Vec<Value>) -> NumenResult<()> {
    let value = pop(stack, "ret")?;
    caller_stack.push(value);
    Ok(())
}

/// Type predicate: exactly one operand must be a `Type` value; the other is
/// the subject whose kind is compared against it.
fn is(stack: &mut Vec<Value>) -> NumenResult<()> {
    let (a, b) = pop2(stack, "is")?;
    let result = match (a.as_type(), b.as_type()) {
        (Some(t), None) => t.matches(&b),
        (None, Some(t)) => t.matches(&a),
        _ => {
            return Err(NumenError::type_error(
                "'is' requires exactly one 'Type' operand",
            ));
        }
    };
    stack.push(Value::Bool(result));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, mut stack: Vec<Value>) -> NumenResult<Vec<Value>> {
        let mut caller = Vec::new();
        call(name, &mut stack, &mut caller)?;
        Ok(stack)
    }

    #[test]
    fn plus_adds_ints() {
        assert_eq!(run("+", vec![Value::Int(1), Value::Int(2)]).unwrap(), vec![Value::Int(3)]);
    }

    #[test]
    fn plus_concatenates_strings() {
        let out = run("+", vec![Value::String("a".into()), Value::String("b".into())]).unwrap();
        assert_eq!(out, vec![Value::String("ab".into())]);
    }

    #[test]
    fn plus_coerces_mixed_int_float() {
        let out = run("+", vec![Value::Int(1), Value::Float(2.5)]).unwrap();
        assert_eq!(out, vec![Value::Float(3.5)]);
    }

    #[test]
    fn modulo_is_true_remainder_not_division() {
        let out = run("%", vec![Value::Int(7), Value::Int(2)]).unwrap();
        assert_eq!(out, vec![Value::Int(1)]);
    }

    #[test]
    fn integer_division_by_zero_is_a_type_error() {
        let err = run("/", vec![Value::Int(1), Value::Int(0)]).unwrap_err();
        assert!(matches!(err, NumenError::Type { .. }));
    }

    #[test]
    fn underflow_on_empty_stack() {
        let err = run("drop", vec![]).unwrap_err();
        assert!(matches!(err, NumenError::StackUnderflow { .. }));
    }

    #[test]
    fn swap_exchanges_top_two() {
        let out = run("swap", vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(out, vec![Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn carry_duplicates_second_from_top() {
        let out = run("carry", vec![Value::Int(1), Value::Int(2)]).unwrap();
        assert_eq!(out, vec![Value::Int(1), Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn rot_moves_third_above_second() {
        let out =
            run("rot", vec![Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap();
        assert_eq!(out, vec![Value::Int(1), Value::Int(3), Value::Int(2)]);
    }

    #[test]
    fn ret_writes_to_caller_stack() {
        let mut stack = vec![Value::Int(9)];
        let mut caller = vec![];
        call("ret", &mut stack, &mut caller).unwrap();
        assert!(stack.is_empty());
        assert_eq!(caller, vec![Value::Int(9)]);
    }

    #[test]
    fn is_checks_subject_kind_against_type_operand() {
        use numen_core::TypeName;
        let out =
            run("is", vec![Value::Int(3), Value::Type(TypeName::Int)]).unwrap();
        assert_eq!(out, vec![Value::Bool(true)]);
    }

    #[test]
    fn is_without_a_type_operand_is_a_type_error() {
        let err = run("is", vec![Value::Int(1), Value::Int(2)]).unwrap_err();
        assert!(matches!(err, NumenError::Type { .. }));
    }

    #[test]
    fn equals_is_structural_across_kinds() {
        let out = run("==", vec![Value::Int(2), Value::Float(2.0)]).unwrap();
        assert_eq!(out, vec![Value::Bool(false)]);
    }
}
