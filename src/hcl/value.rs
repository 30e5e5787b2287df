//! Statically evaluated configuration values

use crate::error::EvalError;
use std::collections::BTreeMap;
use std::fmt;

/// Target shape requested by a caller of `evaluate_expr`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Any value, no conversion
    Any,
    /// A string; numbers and bools convert implicitly
    String,
    /// A mapping keyed by strings
    Map,
    /// A list of strings
    StringList,
}

impl Shape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shape::Any => "any",
            Shape::String => "string",
            Shape::Map => "map",
            Shape::StringList => "list of string",
        }
    }
}

/// A concrete configuration value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Converts this value to the requested shape
    ///
    /// Follows Terraform's implicit conversions: numbers and bools become
    /// strings, everything else must already have the right shape.
    pub fn conform(self, shape: Shape) -> Result<Value, EvalError> {
        match (shape, self) {
            (_, Value::Null) if shape != Shape::Any => Err(EvalError::Null),
            (Shape::Any, value) => Ok(value),
            (Shape::String, Value::String(s)) => Ok(Value::String(s)),
            (Shape::String, Value::Number(n)) => Ok(Value::String(format_number(n))),
            (Shape::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),
            (Shape::Map, Value::Map(map)) => Ok(Value::Map(map)),
            (Shape::StringList, Value::List(items)) => items
                .into_iter()
                .map(|item| item.conform(Shape::String))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (shape, other) => Err(EvalError::TypeMismatch {
                expected: shape.as_str(),
                found: other.type_name(),
            }),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Consumes a string value
    pub fn into_string(self) -> Result<String, EvalError> {
        match self.conform(Shape::String)? {
            Value::String(s) => Ok(s),
            other => Err(EvalError::TypeMismatch {
                expected: "string",
                found: other.type_name(),
            }),
        }
    }

    /// Consumes a map value
    pub fn into_map(self) -> Result<BTreeMap<String, Value>, EvalError> {
        match self.conform(Shape::Map)? {
            Value::Map(map) => Ok(map),
            other => Err(EvalError::TypeMismatch {
                expected: "map",
                found: other.type_name(),
            }),
        }
    }

    /// Builds a value from JSON, as found in `.tf.json` files
    ///
    /// Strings containing `${` are interpolation templates and cannot be
    /// resolved without an evaluation context.
    pub fn from_json(json: &serde_json::Value) -> Result<Value, EvalError> {
        Ok(match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().ok_or_else(|| {
                EvalError::Unsupported(format!("number {} out of range", n))
            })?),
            serde_json::Value::String(s) if s.contains("${") => {
                return Err(EvalError::Unknown(format!("template \"{}\"", s)));
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(Value::from_json)
                    .collect::<Result<_, _>>()?,
            ),
            serde_json::Value::Object(fields) => Value::Map(
                fields
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), Value::from_json(v)?)))
                    .collect::<Result<_, EvalError>>()?,
            ),
        })
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} = {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Formats whole numbers without a fractional part, as Terraform does
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conform_string_from_number_and_bool() {
        assert_eq!(
            Value::Number(3.0).conform(Shape::String).unwrap(),
            Value::String("3".to_string())
        );
        assert_eq!(
            Value::Number(1.5).conform(Shape::String).unwrap(),
            Value::String("1.5".to_string())
        );
        assert_eq!(
            Value::Bool(true).conform(Shape::String).unwrap(),
            Value::String("true".to_string())
        );
    }

    #[test]
    fn test_conform_null_fails_for_concrete_shapes() {
        assert_eq!(Value::Null.conform(Shape::String), Err(EvalError::Null));
        assert_eq!(Value::Null.conform(Shape::Map), Err(EvalError::Null));
        assert_eq!(Value::Null.conform(Shape::Any), Ok(Value::Null));
    }

    #[test]
    fn test_conform_type_mismatch() {
        let err = Value::String("x".to_string())
            .conform(Shape::Map)
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::TypeMismatch {
                expected: "map",
                found: "string"
            }
        );
    }

    #[test]
    fn test_conform_string_list() {
        let list = Value::List(vec![Value::String("a".to_string()), Value::Number(2.0)]);
        assert_eq!(
            list.conform(Shape::StringList).unwrap(),
            Value::List(vec![
                Value::String("a".to_string()),
                Value::String("2".to_string())
            ])
        );

        let nested = Value::List(vec![Value::List(vec![])]);
        assert!(nested.conform(Shape::StringList).is_err());
    }

    #[test]
    fn test_from_json_template_is_unknown() {
        let json = serde_json::json!({"name": "${var.name}"});
        assert!(matches!(
            Value::from_json(&json),
            Err(EvalError::Unknown(_))
        ));
    }

    #[test]
    fn test_from_json_object() {
        let json = serde_json::json!({"Foo": "bar", "Count": 2});
        let value = Value::from_json(&json).unwrap();
        let map = value.into_map().unwrap();
        assert_eq!(map["Foo"], Value::String("bar".to_string()));
        assert_eq!(map["Count"], Value::Number(2.0));
    }

    #[test]
    fn test_display() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Value::List(vec![Value::Bool(false)]));
        assert_eq!(Value::Map(map).to_string(), "{a = [false]}");
    }
}
