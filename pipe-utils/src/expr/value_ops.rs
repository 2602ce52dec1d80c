//! Operator semantics over dynamic values.
//!
//! Numbers keep their type where JSON can represent the result:
//! integers stay integers (checked `i64`), mixing with floats yields floats,
//! true division always yields a float and floor division rounds towards
//! negative infinity. Anything JSON cannot hold is an overflow.

use crate::errors::ExprError;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Signature shared by every binary operation.
pub(crate) type BinaryOp = fn(&Value, &Value) -> Result<Value, ExprError>;

/// Signature shared by every unary operation.
pub(crate) type UnaryOp = fn(&Value) -> Result<Value, ExprError>;

#[derive(Debug, Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn to_f64(self) -> f64 {
        match self {
            Self::Int(i) => i as f64,
            Self::Float(f) => f,
        }
    }

    fn is_zero(self) -> bool {
        match self {
            Self::Int(i) => i == 0,
            Self::Float(f) => f == 0.0,
        }
    }
}

/// Returns the name used for `value`'s type in error messages.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn int(value: i64) -> Value {
    Value::Number(Number::from(value))
}

fn float(op: &'static str, value: f64) -> Result<Value, ExprError> {
    Number::from_f64(value)
        .map(Value::Number)
        .ok_or(ExprError::overflow(op))
}

fn checked(op: &'static str, value: Option<i64>) -> Result<Value, ExprError> {
    value.map(int).ok_or(ExprError::overflow(op))
}

fn unsupported(op: &'static str, left: &Value, right: &Value) -> ExprError {
    ExprError::operands(op, type_name(left), type_name(right))
}

fn arithmetic(
    op: &'static str,
    left: &Value,
    right: &Value,
    ints: fn(i64, i64) -> Option<i64>,
    floats: fn(f64, f64) -> f64,
) -> Result<Value, ExprError> {
    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(a)), Some(Num::Int(b))) => checked(op, ints(a, b)),
        (Some(a), Some(b)) => float(op, floats(a.to_f64(), b.to_f64())),
        _ => Err(unsupported(op, left, right)),
    }
}

/// Number of times to repeat a sequence of `len` items; empty sequences
/// and non-positive counts repeat zero times.
fn repeat_count(op: &'static str, len: usize, count: i64) -> Result<usize, ExprError> {
    if len == 0 || count <= 0 {
        return Ok(0);
    }
    let times = usize::try_from(count).map_err(|_| ExprError::overflow(op))?;
    len.checked_mul(times)
        .map(|_| times)
        .ok_or_else(|| ExprError::overflow(op))
}

/// `left + right`: numeric addition, string and array concatenation.
pub fn add(left: &Value, right: &Value) -> Result<Value, ExprError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
        (Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        _ => arithmetic("+", left, right, i64::checked_add, |a, b| a + b),
    }
}

/// `left - right`.
pub fn sub(left: &Value, right: &Value) -> Result<Value, ExprError> {
    arithmetic("-", left, right, i64::checked_sub, |a, b| a - b)
}

/// `left * right`: numeric product, or repetition of a string or array.
pub fn mul(left: &Value, right: &Value) -> Result<Value, ExprError> {
    match (left, right, Num::of(left), Num::of(right)) {
        (Value::String(s), _, _, Some(Num::Int(n))) | (_, Value::String(s), Some(Num::Int(n)), _) => {
            let times = repeat_count("*", s.len(), n)?;
            let mut repeated = String::new();
            repeated
                .try_reserve_exact(s.len() * times)
                .map_err(|_| ExprError::overflow("*"))?;
            for _ in 0..times {
                repeated.push_str(s);
            }
            Ok(Value::String(repeated))
        }
        (Value::Array(items), _, _, Some(Num::Int(n)))
        | (_, Value::Array(items), Some(Num::Int(n)), _) => {
            let times = repeat_count("*", items.len(), n)?;
            let mut repeated = Vec::new();
            repeated
                .try_reserve_exact(items.len() * times)
                .map_err(|_| ExprError::overflow("*"))?;
            for _ in 0..times {
                repeated.extend(items.iter().cloned());
            }
            Ok(Value::Array(repeated))
        }
        _ => arithmetic("*", left, right, i64::checked_mul, |a, b| a * b),
    }
}

/// `left / right`, always a float.
pub fn div(left: &Value, right: &Value) -> Result<Value, ExprError> {
    match (Num::of(left), Num::of(right)) {
        (Some(_), Some(b)) if b.is_zero() => Err(ExprError::zero_division("/")),
        (Some(a), Some(b)) => float("/", a.to_f64() / b.to_f64()),
        _ => Err(unsupported("/", left, right)),
    }
}

fn floor_div_int(a: i64, b: i64) -> Option<i64> {
    let quotient = a.checked_div(b)?;
    if (a % b != 0) && ((a < 0) != (b < 0)) {
        quotient.checked_sub(1)
    } else {
        Some(quotient)
    }
}

fn rem_int(a: i64, b: i64) -> Option<i64> {
    if b == -1 {
        return Some(0);
    }
    let remainder = a.checked_rem(b)?;
    if remainder != 0 && ((remainder < 0) != (b < 0)) {
        Some(remainder + b)
    } else {
        Some(remainder)
    }
}

/// Floor quotient and remainder of `a / b`, derived together so that
/// `quotient * b + remainder` stays close to `a`.
fn divmod_float(a: f64, b: f64) -> (f64, f64) {
    let mut remainder = a % b;
    let mut quotient = (a - remainder) / b;
    if remainder == 0.0 {
        remainder = 0.0_f64.copysign(b);
    } else if (b < 0.0) != (remainder < 0.0) {
        remainder += b;
        quotient -= 1.0;
    }
    let quotient = if quotient == 0.0 {
        0.0_f64.copysign(a / b)
    } else {
        let floored = quotient.floor();
        if quotient - floored > 0.5 {
            floored + 1.0
        } else {
            floored
        }
    };
    (quotient, remainder)
}

/// `left // right`: division rounded towards negative infinity.
pub fn floor_div(left: &Value, right: &Value) -> Result<Value, ExprError> {
    match (Num::of(left), Num::of(right)) {
        (Some(_), Some(b)) if b.is_zero() => Err(ExprError::zero_division("//")),
        (Some(Num::Int(a)), Some(Num::Int(b))) => checked("//", floor_div_int(a, b)),
        (Some(a), Some(b)) => float("//", divmod_float(a.to_f64(), b.to_f64()).0),
        _ => Err(unsupported("//", left, right)),
    }
}

/// `left % right`: the remainder takes the sign of the divisor.
pub fn rem(left: &Value, right: &Value) -> Result<Value, ExprError> {
    match (Num::of(left), Num::of(right)) {
        (Some(_), Some(b)) if b.is_zero() => Err(ExprError::zero_division("%")),
        (Some(Num::Int(a)), Some(Num::Int(b))) => checked("%", rem_int(a, b)),
        (Some(a), Some(b)) => float("%", divmod_float(a.to_f64(), b.to_f64()).1),
        _ => Err(unsupported("%", left, right)),
    }
}

/// `divmod(left, right)` as `[quotient, remainder]`.
pub fn divmod(left: &Value, right: &Value) -> Result<Value, ExprError> {
    if Num::of(left).is_none() || Num::of(right).is_none() {
        return Err(unsupported("divmod", left, right));
    }
    Ok(Value::Array(vec![floor_div(left, right)?, rem(left, right)?]))
}

/// `left ** right`.
pub fn pow(left: &Value, right: &Value) -> Result<Value, ExprError> {
    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(base)), Some(Num::Int(exp))) if exp >= 0 => match base {
            0 | 1 if exp > 0 => Ok(int(base)),
            -1 => Ok(int(if exp % 2 == 0 { 1 } else { -1 })),
            _ => {
                let exp = u32::try_from(exp).map_err(|_| ExprError::overflow("**"))?;
                checked("**", base.checked_pow(exp))
            }
        },
        (Some(base), Some(exp)) => {
            let (base, exp) = (base.to_f64(), exp.to_f64());
            if base == 0.0 && exp < 0.0 {
                return Err(ExprError::zero_division("**"));
            }
            if base < 0.0 && exp.fract() != 0.0 {
                return Err(ExprError::invalid_value(
                    "**",
                    "negative base with a fractional exponent",
                ));
            }
            float("**", base.powf(exp))
        }
        _ => Err(unsupported("**", left, right)),
    }
}

/// `pow(base, exp, modulus)` over integers.
pub fn pow_mod(base: &Value, exp: &Value, modulus: &Value) -> Result<Value, ExprError> {
    let (Some(Num::Int(base)), Some(Num::Int(exp)), Some(Num::Int(modulus))) =
        (Num::of(base), Num::of(exp), Num::of(modulus))
    else {
        return Err(ExprError::invalid_value(
            "pow",
            "all three arguments must be integers",
        ));
    };
    if modulus == 0 {
        return Err(ExprError::invalid_value("pow", "modulus cannot be zero"));
    }
    if exp < 0 {
        return Err(ExprError::invalid_value("pow", "exponent cannot be negative"));
    }

    let m = i128::from(modulus).abs();
    let mut result: i128 = 1 % m;
    let mut factor = i128::from(base).rem_euclid(m);
    let mut exp = exp;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * factor % m;
        }
        factor = factor * factor % m;
        exp >>= 1;
    }
    if modulus < 0 && result != 0 {
        result -= m;
    }
    checked("pow", i64::try_from(result).ok())
}

fn int_or_bool(
    op: &'static str,
    left: &Value,
    right: &Value,
    ints: fn(i64, i64) -> i64,
    bools: fn(bool, bool) -> bool,
) -> Result<Value, ExprError> {
    match (left, right, Num::of(left), Num::of(right)) {
        (Value::Bool(a), Value::Bool(b), _, _) => Ok(Value::Bool(bools(*a, *b))),
        (_, _, Some(Num::Int(a)), Some(Num::Int(b))) => Ok(int(ints(a, b))),
        _ => Err(unsupported(op, left, right)),
    }
}

/// `left & right`.
pub fn bitand(left: &Value, right: &Value) -> Result<Value, ExprError> {
    int_or_bool("&", left, right, |a, b| a & b, |a, b| a & b)
}

/// `left | right`.
pub fn bitor(left: &Value, right: &Value) -> Result<Value, ExprError> {
    int_or_bool("|", left, right, |a, b| a | b, |a, b| a | b)
}

/// `left ^ right`.
pub fn bitxor(left: &Value, right: &Value) -> Result<Value, ExprError> {
    int_or_bool("^", left, right, |a, b| a ^ b, |a, b| a ^ b)
}

fn shift_operands(op: &'static str, left: &Value, right: &Value) -> Result<(i64, u32), ExprError> {
    match (Num::of(left), Num::of(right)) {
        (Some(Num::Int(_)), Some(Num::Int(count))) if count < 0 => {
            Err(ExprError::invalid_value(op, "negative shift count"))
        }
        (Some(Num::Int(value)), Some(Num::Int(count))) => {
            Ok((value, u32::try_from(count).unwrap_or(u32::MAX)))
        }
        _ => Err(unsupported(op, left, right)),
    }
}

/// `left << right`.
pub fn shl(left: &Value, right: &Value) -> Result<Value, ExprError> {
    let (value, count) = shift_operands("<<", left, right)?;
    if value == 0 {
        return Ok(int(0));
    }
    if count >= i64::BITS {
        return Err(ExprError::overflow("<<"));
    }
    let shifted = value << count;
    if shifted >> count == value {
        Ok(int(shifted))
    } else {
        Err(ExprError::overflow("<<"))
    }
}

/// `left >> right`: arithmetic shift, rounding towards negative infinity.
pub fn shr(left: &Value, right: &Value) -> Result<Value, ExprError> {
    let (value, count) = shift_operands(">>", left, right)?;
    Ok(int(value >> count.min(i64::BITS - 1)))
}

fn ensure_numeric(op: &'static str, items: &[Value]) -> Result<(), ExprError> {
    match items.iter().find(|item| Num::of(item).is_none()) {
        Some(item) => Err(ExprError::operand(op, type_name(item))),
        None => Ok(()),
    }
}

fn dot(op: &'static str, left: &[Value], right: &[Value]) -> Result<Value, ExprError> {
    if left.len() != right.len() {
        return Err(ExprError::invalid_value(
            op,
            format!("vectors of length {} and {} are not aligned", left.len(), right.len()),
        ));
    }
    ensure_numeric(op, left)?;
    ensure_numeric(op, right)?;
    left.iter()
        .zip(right)
        .try_fold(int(0), |sum, (a, b)| add(&sum, &mul(a, b)?))
}

fn as_matrix(value: &Value) -> Option<Vec<&[Value]>> {
    match value {
        Value::Array(rows) if !rows.is_empty() => rows
            .iter()
            .map(|row| row.as_array().map(Vec::as_slice))
            .collect(),
        _ => None,
    }
}

fn column(matrix: &[&[Value]], index: usize) -> Vec<Value> {
    matrix
        .iter()
        .map(|row| row.get(index).cloned().unwrap_or(Value::Null))
        .collect()
}

fn columns(op: &'static str, matrix: &[&[Value]]) -> Result<usize, ExprError> {
    let width = matrix.first().map_or(0, |row| row.len());
    if matrix.iter().any(|row| row.len() != width) {
        return Err(ExprError::invalid_value(op, "matrix rows have different lengths"));
    }
    Ok(width)
}

/// `left @ right`: dot, matrix-matrix, matrix-vector and vector-matrix products.
pub fn matmul(left: &Value, right: &Value) -> Result<Value, ExprError> {
    const OP: &str = "@";
    match (as_matrix(left), as_matrix(right)) {
        (Some(a), Some(b)) => {
            let width = columns(OP, &b)?;
            columns(OP, &a)?;
            a.iter()
                .map(|row| {
                    (0..width)
                        .map(|j| dot(OP, row, &column(&b, j)))
                        .collect::<Result<Vec<_>, _>>()
                        .map(Value::Array)
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (Some(a), None) => {
            let vector = right.as_array().ok_or_else(|| unsupported(OP, left, right))?;
            columns(OP, &a)?;
            a.iter()
                .map(|row| dot(OP, row, vector))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (None, Some(b)) => {
            let vector = left.as_array().ok_or_else(|| unsupported(OP, left, right))?;
            let width = columns(OP, &b)?;
            (0..width)
                .map(|j| dot(OP, vector, &column(&b, j)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
        (None, None) => match (left, right) {
            (Value::Array(a), Value::Array(b)) => dot(OP, a, b),
            _ => Err(unsupported(OP, left, right)),
        },
    }
}

/// `-value`.
pub fn neg(value: &Value) -> Result<Value, ExprError> {
    match Num::of(value) {
        Some(Num::Int(i)) => checked("-", i.checked_neg()),
        Some(Num::Float(f)) => float("-", -f),
        None => Err(ExprError::operand("unary -", type_name(value))),
    }
}

/// `+value`.
pub fn pos(value: &Value) -> Result<Value, ExprError> {
    match Num::of(value) {
        Some(_) => Ok(value.clone()),
        None => Err(ExprError::operand("unary +", type_name(value))),
    }
}

/// `abs(value)`.
pub fn abs(value: &Value) -> Result<Value, ExprError> {
    match Num::of(value) {
        Some(Num::Int(i)) => checked("abs", i.checked_abs()),
        Some(Num::Float(f)) => float("abs", f.abs()),
        None => Err(ExprError::operand("abs", type_name(value))),
    }
}

/// `~value`, bitwise inversion of an integer.
pub fn invert(value: &Value) -> Result<Value, ExprError> {
    match Num::of(value) {
        Some(Num::Int(i)) => Ok(int(!i)),
        _ => Err(ExprError::operand("~", type_name(value))),
    }
}

/// Orders two values: numbers, strings, and arrays lexicographically.
pub fn compare(op: &'static str, left: &Value, right: &Value) -> Result<Ordering, ExprError> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b) {
                if !equals(x, y) {
                    return compare(op, x, y);
                }
            }
            Ok(a.len().cmp(&b.len()))
        }
        _ => match (Num::of(left), Num::of(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => Ok(a.cmp(&b)),
            (Some(a), Some(b)) => a
                .to_f64()
                .partial_cmp(&b.to_f64())
                .ok_or_else(|| unsupported(op, left, right)),
            _ => Err(unsupported(op, left, right)),
        },
    }
}

/// Numeric-aware equality: `1 == 1.0`, and booleans only equal booleans.
#[must_use]
pub fn equals(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| equals(x, y))
        }
        (Value::Object(a), Value::Object(b)) => objects_equal(a, b),
        _ => match (Num::of(left), Num::of(right)) {
            (Some(Num::Int(a)), Some(Num::Int(b))) => a == b,
            #[allow(clippy::float_cmp)]
            (Some(a), Some(b)) => a.to_f64() == b.to_f64(),
            _ => left == right,
        },
    }
}

fn objects_equal(a: &Map<String, Value>, b: &Map<String, Value>) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| equals(value, other)))
}

macro_rules! comparison {
    ($(#[$doc:meta])* $name:ident, $symbol:literal, $test:expr) => {
        $(#[$doc])*
        pub fn $name(left: &Value, right: &Value) -> Result<Value, ExprError> {
            let ordering = compare($symbol, left, right)?;
            Ok(Value::Bool($test(ordering)))
        }
    };
}

comparison!(
    /// `left < right`.
    lt, "<", Ordering::is_lt
);
comparison!(
    /// `left <= right`.
    le, "<=", Ordering::is_le
);
comparison!(
    /// `left > right`.
    gt, ">", Ordering::is_gt
);
comparison!(
    /// `left >= right`.
    ge, ">=", Ordering::is_ge
);

/// `left == right` as a value.
pub fn eq(left: &Value, right: &Value) -> Result<Value, ExprError> {
    Ok(Value::Bool(equals(left, right)))
}

/// `left != right` as a value.
pub fn ne(left: &Value, right: &Value) -> Result<Value, ExprError> {
    Ok(Value::Bool(!equals(left, right)))
}

fn normalize_index(index: i64, len: usize) -> Result<usize, ExprError> {
    let out_of_range = || ExprError::IndexOutOfRange { index, len };
    let signed_len = i64::try_from(len).map_err(|_| out_of_range())?;
    let position = if index < 0 { index + signed_len } else { index };
    usize::try_from(position)
        .ok()
        .filter(|&position| position < len)
        .ok_or_else(out_of_range)
}

/// `value[key]`: array position (negative counts from the end), object key
/// (numbers are stringified) or string character.
pub fn index(value: &Value, key: &Value) -> Result<Value, ExprError> {
    match (value, key) {
        (Value::Array(items), Value::Number(n)) if n.is_i64() || n.is_u64() => {
            let position = normalize_index(n.as_i64().unwrap_or(i64::MAX), items.len())?;
            Ok(items[position].clone())
        }
        (Value::String(s), Value::Number(n)) if n.is_i64() || n.is_u64() => {
            let chars: Vec<char> = s.chars().collect();
            let position = normalize_index(n.as_i64().unwrap_or(i64::MAX), chars.len())?;
            Ok(Value::String(chars[position].to_string()))
        }
        (Value::Object(map), Value::String(name)) => lookup(map, name),
        (Value::Object(map), Value::Number(n)) => lookup(map, &n.to_string()),
        _ => Err(ExprError::NotSubscriptable {
            type_name: type_name(value),
            key_type: type_name(key),
        }),
    }
}

fn lookup(map: &Map<String, Value>, key: &str) -> Result<Value, ExprError> {
    map.get(key)
        .cloned()
        .ok_or_else(|| ExprError::MissingKey { key: key.to_string() })
}

/// `value.name`: object field access.
pub fn attr(value: &Value, name: &str) -> Result<Value, ExprError> {
    value
        .as_object()
        .and_then(|map| map.get(name))
        .cloned()
        .ok_or_else(|| ExprError::MissingAttribute {
            type_name: type_name(value),
            name: name.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ExprErrorKind;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn kind_of(result: Result<Value, ExprError>) -> ExprErrorKind {
        result.unwrap_err().kind()
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!(null)), "null");
        assert_eq!(type_name(&json!(true)), "boolean");
        assert_eq!(type_name(&json!(1)), "integer");
        assert_eq!(type_name(&json!(1.5)), "float");
        assert_eq!(type_name(&json!("a")), "string");
        assert_eq!(type_name(&json!([])), "array");
        assert_eq!(type_name(&json!({})), "object");
    }

    #[test]
    fn test_integer_arithmetic_stays_integral() {
        assert_eq!(add(&json!(2), &json!(3)).unwrap(), json!(5));
        assert_eq!(sub(&json!(2), &json!(3)).unwrap(), json!(-1));
        assert_eq!(mul(&json!(4), &json!(-2)).unwrap(), json!(-8));
        assert!(add(&json!(2), &json!(3)).unwrap().is_i64());
    }

    #[test]
    fn test_mixed_arithmetic_yields_float() {
        assert_eq!(add(&json!(1), &json!(0.5)).unwrap(), json!(1.5));
        assert!(mul(&json!(2), &json!(1.0)).unwrap().is_f64());
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(kind_of(add(&json!(i64::MAX), &json!(1))), ExprErrorKind::Overflow);
        assert_eq!(kind_of(neg(&json!(i64::MIN))), ExprErrorKind::Overflow);
        assert_eq!(kind_of(pow(&json!(10), &json!(400.0))), ExprErrorKind::Overflow);
        assert_eq!(kind_of(shl(&json!(1), &json!(64))), ExprErrorKind::Overflow);
    }

    #[test]
    fn test_true_division_is_float() {
        assert_eq!(div(&json!(10), &json!(2)).unwrap(), json!(5.0));
        assert_eq!(div(&json!(1), &json!(-1)).unwrap(), json!(-1.0));
        assert_eq!(kind_of(div(&json!(1), &json!(0))), ExprErrorKind::ZeroDivision);
        assert_eq!(kind_of(div(&json!(1), &json!(0.0))), ExprErrorKind::ZeroDivision);
    }

    #[test]
    fn test_floor_division_and_modulo_follow_divisor_sign() {
        assert_eq!(floor_div(&json!(5), &json!(2)).unwrap(), json!(2));
        assert_eq!(floor_div(&json!(-5), &json!(2)).unwrap(), json!(-3));
        assert_eq!(floor_div(&json!(7.5), &json!(2)).unwrap(), json!(3.0));
        assert_eq!(rem(&json!(-3), &json!(2)).unwrap(), json!(1));
        assert_eq!(rem(&json!(3), &json!(-2)).unwrap(), json!(-1));
        assert_eq!(rem(&json!(5.5), &json!(2)).unwrap(), json!(1.5));
        assert_eq!(rem(&json!(-0.5), &json!(2)).unwrap(), json!(1.5));
        assert_eq!(kind_of(rem(&json!(1), &json!(0))), ExprErrorKind::ZeroDivision);
        assert_eq!(kind_of(floor_div(&json!(i64::MIN), &json!(-1))), ExprErrorKind::Overflow);
    }

    #[test]
    fn test_divmod() {
        assert_eq!(divmod(&json!(7), &json!(2)).unwrap(), json!([3, 1]));
        assert_eq!(divmod(&json!(-7), &json!(2)).unwrap(), json!([-4, 1]));
        assert_eq!(kind_of(divmod(&json!("7"), &json!(2))), ExprErrorKind::Type);
    }

    #[test]
    fn test_float_floor_division_agrees_with_modulo() {
        assert_eq!(floor_div(&json!(1), &json!(0.1)).unwrap(), json!(9.0));
        assert_eq!(rem(&json!(1), &json!(0.1)).unwrap(), json!(0.09999999999999995));
        assert_eq!(
            divmod(&json!(1), &json!(0.1)).unwrap(),
            json!([9.0, 0.09999999999999995])
        );
        assert_eq!(divmod(&json!(-7.5), &json!(2)).unwrap(), json!([-4.0, 0.5]));
        assert_eq!(divmod(&json!(7.5), &json!(-2)).unwrap(), json!([-4.0, -0.5]));
        assert_eq!(floor_div(&json!(6.0), &json!(3)).unwrap(), json!(2.0));
    }

    #[test]
    fn test_pow_rules() {
        assert_eq!(pow(&json!(2), &json!(10)).unwrap(), json!(1024));
        assert_eq!(pow(&json!(2), &json!(0)).unwrap(), json!(1));
        assert_eq!(pow(&json!(2), &json!(-1)).unwrap(), json!(0.5));
        assert_eq!(pow(&json!(4), &json!(0.5)).unwrap(), json!(2.0));
        assert_eq!(kind_of(pow(&json!(0), &json!(-1))), ExprErrorKind::ZeroDivision);
        assert_eq!(kind_of(pow(&json!(-8), &json!(0.5))), ExprErrorKind::Value);
        assert_eq!(kind_of(pow(&json!(2), &json!(64))), ExprErrorKind::Overflow);
    }

    #[test]
    fn test_pow_of_unit_bases_with_huge_exponent() {
        let huge = json!(i64::MAX);
        assert_eq!(pow(&json!(0), &huge).unwrap(), json!(0));
        assert_eq!(pow(&json!(1), &huge).unwrap(), json!(1));
        assert_eq!(pow(&json!(-1), &huge).unwrap(), json!(-1));
        assert_eq!(pow(&json!(-1), &json!(i64::MAX - 1)).unwrap(), json!(1));
        assert_eq!(pow(&json!(0), &json!(0)).unwrap(), json!(1));
        assert_eq!(kind_of(pow(&json!(2), &huge)), ExprErrorKind::Overflow);
    }

    #[test]
    fn test_pow_mod() {
        assert_eq!(pow_mod(&json!(2), &json!(10), &json!(1000)).unwrap(), json!(24));
        assert_eq!(pow_mod(&json!(3), &json!(0), &json!(1)).unwrap(), json!(0));
        assert_eq!(pow_mod(&json!(2), &json!(3), &json!(-5)).unwrap(), json!(-2));
        assert_eq!(pow_mod(&json!(-2), &json!(3), &json!(5)).unwrap(), json!(2));
        assert_eq!(kind_of(pow_mod(&json!(2), &json!(3), &json!(0))), ExprErrorKind::Value);
        assert_eq!(kind_of(pow_mod(&json!(2.0), &json!(3), &json!(5))), ExprErrorKind::Value);
    }

    #[test]
    fn test_sequence_concatenation_and_repetition() {
        assert_eq!(add(&json!("ab"), &json!("cd")).unwrap(), json!("abcd"));
        assert_eq!(add(&json!([1]), &json!([2, 3])).unwrap(), json!([1, 2, 3]));
        assert_eq!(mul(&json!("a"), &json!(2)).unwrap(), json!("aa"));
        assert_eq!(mul(&json!(3), &json!("ab")).unwrap(), json!("ababab"));
        assert_eq!(mul(&json!([0]), &json!(3)).unwrap(), json!([0, 0, 0]));
        assert_eq!(mul(&json!("a"), &json!(-1)).unwrap(), json!(""));
        assert_eq!(kind_of(add(&json!("a"), &json!(1))), ExprErrorKind::Type);
        assert_eq!(kind_of(mul(&json!("a"), &json!(1.5))), ExprErrorKind::Type);
    }

    #[test]
    fn test_oversized_repetition_is_overflow() {
        assert_eq!(kind_of(mul(&json!("ab"), &json!(i64::MAX))), ExprErrorKind::Overflow);
        assert_eq!(kind_of(mul(&json!(i64::MAX), &json!("ab"))), ExprErrorKind::Overflow);
        assert_eq!(kind_of(mul(&json!([1, 2]), &json!(i64::MAX))), ExprErrorKind::Overflow);
        assert_eq!(kind_of(mul(&json!([0]), &json!(i64::MAX))), ExprErrorKind::Overflow);
        assert_eq!(mul(&json!(""), &json!(i64::MAX)).unwrap(), json!(""));
        assert_eq!(mul(&json!([]), &json!(i64::MAX)).unwrap(), json!([]));
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(bitor(&json!(0b1010), &json!(0b0101)).unwrap(), json!(0b1111));
        assert_eq!(bitand(&json!(0b1010), &json!(0b0101)).unwrap(), json!(0));
        assert_eq!(bitxor(&json!(0b11), &json!(0b01)).unwrap(), json!(0b10));
        assert_eq!(bitand(&json!(true), &json!(false)).unwrap(), json!(false));
        assert_eq!(bitor(&json!(true), &json!(false)).unwrap(), json!(true));
        assert_eq!(kind_of(bitand(&json!(1.0), &json!(1))), ExprErrorKind::Type);
        assert_eq!(kind_of(bitand(&json!(true), &json!(1))), ExprErrorKind::Type);
    }

    #[test]
    fn test_shifts() {
        assert_eq!(shl(&json!(2), &json!(1)).unwrap(), json!(4));
        assert_eq!(shl(&json!(8), &json!(2)).unwrap(), json!(32));
        assert_eq!(shr(&json!(8), &json!(2)).unwrap(), json!(2));
        assert_eq!(shr(&json!(-1), &json!(100)).unwrap(), json!(-1));
        assert_eq!(shr(&json!(-5), &json!(1)).unwrap(), json!(-3));
        assert_eq!(kind_of(shl(&json!(1), &json!(-1))), ExprErrorKind::Value);
        assert_eq!(kind_of(shr(&json!(1.0), &json!(1))), ExprErrorKind::Type);
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(neg(&json!(5)).unwrap(), json!(-5));
        assert_eq!(neg(&json!(-2.5)).unwrap(), json!(2.5));
        assert_eq!(pos(&json!(3)).unwrap(), json!(3));
        assert_eq!(abs(&json!(-10)).unwrap(), json!(10));
        assert_eq!(abs(&json!(-1.5)).unwrap(), json!(1.5));
        assert_eq!(invert(&json!(1)).unwrap(), json!(-2));
        assert_eq!(invert(&json!(10)).unwrap(), json!(-11));
        assert_eq!(kind_of(neg(&json!("a"))), ExprErrorKind::Type);
        assert_eq!(kind_of(invert(&json!(true))), ExprErrorKind::Type);
        assert_eq!(kind_of(pos(&json!([]))), ExprErrorKind::Type);
    }

    #[test]
    fn test_matmul_shapes() {
        assert_eq!(matmul(&json!([1, 2, 3]), &json!([4, 5, 6])).unwrap(), json!(32));
        assert_eq!(
            matmul(&json!([[1, 2], [3, 4]]), &json!([[5, 6], [7, 8]])).unwrap(),
            json!([[19, 22], [43, 50]])
        );
        assert_eq!(matmul(&json!([[1, 0], [0, 2]]), &json!([3, 4])).unwrap(), json!([3, 8]));
        assert_eq!(matmul(&json!([1, 2]), &json!([[1, 2], [3, 4]])).unwrap(), json!([7, 10]));
        assert_eq!(matmul(&json!([0.5]), &json!([2])).unwrap(), json!(1.0));
        assert_eq!(kind_of(matmul(&json!([1, 2]), &json!([1]))), ExprErrorKind::Value);
        assert_eq!(kind_of(matmul(&json!(["a"]), &json!([1]))), ExprErrorKind::Type);
        assert_eq!(kind_of(matmul(&json!(2), &json!(3))), ExprErrorKind::Type);
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(lt(&json!(1), &json!(2)).unwrap(), json!(true));
        assert_eq!(le(&json!(2), &json!(2.0)).unwrap(), json!(true));
        assert_eq!(gt(&json!("b"), &json!("a")).unwrap(), json!(true));
        assert_eq!(ge(&json!([1, 2]), &json!([1, 2, 0])).unwrap(), json!(false));
        assert_eq!(lt(&json!([1, 2]), &json!([1, 3])).unwrap(), json!(true));
        assert_eq!(kind_of(lt(&json!("a"), &json!(1))), ExprErrorKind::Type);
        assert_eq!(kind_of(lt(&json!(true), &json!(false))), ExprErrorKind::Type);
    }

    #[test]
    fn test_equality_is_numeric_aware() {
        assert!(equals(&json!(1), &json!(1.0)));
        assert!(equals(&json!([1, {"a": 2}]), &json!([1.0, {"a": 2.0}])));
        assert!(!equals(&json!(true), &json!(1)));
        assert!(!equals(&json!("1"), &json!(1)));
        assert_eq!(ne(&json!(null), &json!(null)).unwrap(), json!(false));
        assert_eq!(eq(&json!({"a": 1}), &json!({"a": 1, "b": 2})).unwrap(), json!(false));
    }

    #[test]
    fn test_index_lookup() {
        assert_eq!(index(&json!([1, 2, 3]), &json!(0)).unwrap(), json!(1));
        assert_eq!(index(&json!([1, 2, 3]), &json!(-1)).unwrap(), json!(3));
        assert_eq!(index(&json!({"a": 1}), &json!("a")).unwrap(), json!(1));
        assert_eq!(index(&json!({"1": "one"}), &json!(1)).unwrap(), json!("one"));
        assert_eq!(index(&json!("héllo"), &json!(1)).unwrap(), json!("é"));
        assert_eq!(
            index(&json!([1]), &json!(3)).unwrap_err(),
            ExprError::IndexOutOfRange { index: 3, len: 1 }
        );
        assert_eq!(kind_of(index(&json!([1]), &json!(-2))), ExprErrorKind::Index);
        assert_eq!(kind_of(index(&json!({}), &json!("x"))), ExprErrorKind::Key);
        assert_eq!(kind_of(index(&json!(5), &json!(0))), ExprErrorKind::Type);
        assert_eq!(kind_of(index(&json!([1]), &json!("0"))), ExprErrorKind::Type);
    }

    #[test]
    fn test_attr_lookup() {
        assert_eq!(attr(&json!({"name": "pipe"}), "name").unwrap(), json!("pipe"));
        assert_eq!(
            attr(&json!([1]), "name").unwrap_err(),
            ExprError::MissingAttribute {
                type_name: "array",
                name: "name".to_string()
            }
        );
        assert_eq!(kind_of(attr(&json!({}), "name")), ExprErrorKind::Attribute);
    }
}
