// Shape and type comparison of nested save values.
// Scalars only have to agree on their exact kind; mappings and sequences
// have to agree on their keys and lengths all the way down.

use thiserror::Error;

use crate::codec::{Value, ValueType};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompareError {
    #[error("Invalid type combination: {left} and {right}")]
    InvalidCombination { left: ValueType, right: ValueType },
}

/// True if `a` and `b` have the same shape and the same value kinds.
///
/// - Kinds must match exactly; a bool is never an integer and an integer
///   is never a decimal.
/// - Mappings need the same key count and every key of `a` present in `b`.
/// - Sequences need the same length and are compared by position.
/// - Scalar values themselves are not compared.
pub fn compare(a: &Value, b: &Value) -> Result<bool, CompareError> {
    if a.value_type() != b.value_type() {
        return Ok(false);
    }

    match (a, b) {
        (Value::Object(left), Value::Object(right)) => {
            if left.len() != right.len() {
                return Ok(false);
            }
            for (key, left_value) in left.iter() {
                let Some(right_value) = right.get(key) else {
                    return Ok(false);
                };
                if !compare(left_value, right_value)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Array(left), Value::Array(right)) => {
            if left.len() != right.len() {
                return Ok(false);
            }
            for (left_value, right_value) in left.iter().zip(right) {
                if !compare(left_value, right_value)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::Null, Value::Null)
        | (Value::Bool(_), Value::Bool(_))
        | (Value::Integer(_), Value::Integer(_))
        | (Value::Decimal(_), Value::Decimal(_))
        | (Value::String(_), Value::String(_)) => Ok(true),
        // Kinds already match here, so this is only reached by a `Value`
        // kind that has no arm above.
        _ => Err(CompareError::InvalidCombination {
            left: a.value_type(),
            right: b.value_type(),
        }),
    }
}
