//! Field tables
//!
//! Every adapter declares its inputs as a static `[FieldSpec]`: name, type,
//! validation range and default. [`resolve`] turns a caller's partial field
//! map into a total one. A value that is absent or `null` takes the default;
//! a value that is present is validated and never replaced.

use serde_json::Value;
use thiserror::Error;

/// Loose submission fields as received from the caller
pub type Fields = serde_json::Map<String, Value>;

/// Accepted shape and range of one field
#[derive(Clone, Copy)]
pub enum FieldKind {
    /// JSON number without fractional part, inclusive bounds
    Integer { min: i64, max: i64 },
    /// Any finite JSON number, inclusive bounds
    Number { min: f64, max: f64 },
    /// JSON string
    Text,
    /// JSON string with at least one non-whitespace character
    NonEmptyText,
    /// String-typed field that tolerates upstream formats. Numbers are
    /// rendered to strings, then checked with the predicate.
    Lenient(fn(&str) -> bool),
}

impl FieldKind {
    fn expected(&self) -> &'static str {
        match self {
            FieldKind::Integer { .. } => "integer",
            FieldKind::Number { .. } => "number",
            FieldKind::Text | FieldKind::NonEmptyText => "string",
            FieldKind::Lenient(_) => "string or number",
        }
    }
}

/// What an absent field becomes
#[derive(Clone, Copy)]
pub enum FieldDefault {
    Integer(i64),
    Number(f64),
    Text(&'static str),
    /// Computed from the fields resolved before it in the table
    Inferred(fn(&Fields) -> Value),
    /// No default; the caller must supply it
    Required,
}

// Debug by hand; fn-pointer variants print their tag only.
impl std::fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Integer { min, max } => write!(f, "Integer({}..={})", min, max),
            FieldKind::Number { min, max } => write!(f, "Number({}..={})", min, max),
            FieldKind::Text => write!(f, "Text"),
            FieldKind::NonEmptyText => write!(f, "NonEmptyText"),
            FieldKind::Lenient(_) => write!(f, "Lenient"),
        }
    }
}

impl std::fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldDefault::Integer(n) => write!(f, "Integer({})", n),
            FieldDefault::Number(n) => write!(f, "Number({})", n),
            FieldDefault::Text(s) => write!(f, "Text({:?})", s),
            FieldDefault::Inferred(_) => write!(f, "Inferred"),
            FieldDefault::Required => write!(f, "Required"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub default: FieldDefault,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, default: FieldDefault) -> Self {
        Self { name, kind, default }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("missing required field `{0}`")]
    Missing(&'static str),

    #[error("field `{field}` must be a {expected}")]
    WrongType { field: &'static str, expected: &'static str },

    #[error("field `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: String },

    #[error("malformed parameters: {0}")]
    Malformed(String),
}

/// Fill and validate `input` against `specs`, in table order.
///
/// Fields not named in the table are dropped.
pub fn resolve(specs: &[FieldSpec], input: &Fields) -> Result<Fields, FieldError> {
    let mut resolved = Fields::new();

    for spec in specs {
        let value = match input.get(spec.name).filter(|v| !v.is_null()) {
            Some(provided) => check(spec, provided)?,
            None => default_for(spec, &resolved)?,
        };
        resolved.insert(spec.name.to_string(), value);
    }

    Ok(resolved)
}

/// Resolve into a typed parameter struct
pub fn resolve_into<T: serde::de::DeserializeOwned>(
    specs: &[FieldSpec],
    input: &Fields,
) -> Result<T, FieldError> {
    let resolved = resolve(specs, input)?;
    serde_json::from_value(Value::Object(resolved)).map_err(|e| FieldError::Malformed(e.to_string()))
}

fn check(spec: &FieldSpec, value: &Value) -> Result<Value, FieldError> {
    let wrong_type = || FieldError::WrongType {
        field: spec.name,
        expected: spec.kind.expected(),
    };
    let out_of_range = |v: &Value| FieldError::OutOfRange {
        field: spec.name,
        value: v.to_string(),
    };

    match spec.kind {
        FieldKind::Integer { min, max } => {
            let n = as_integer(value).ok_or_else(wrong_type)?;
            if n < min || n > max {
                return Err(out_of_range(value));
            }
            Ok(Value::from(n))
        }
        FieldKind::Number { min, max } => {
            let n = value.as_f64().filter(|n| n.is_finite()).ok_or_else(wrong_type)?;
            if n < min || n > max {
                return Err(out_of_range(value));
            }
            Ok(value.clone())
        }
        FieldKind::Text => match value {
            Value::String(_) => Ok(value.clone()),
            _ => Err(wrong_type()),
        },
        FieldKind::NonEmptyText => match value {
            Value::String(s) if s.trim().is_empty() => Err(FieldError::Missing(spec.name)),
            Value::String(_) => Ok(value.clone()),
            _ => Err(wrong_type()),
        },
        FieldKind::Lenient(accepts) => {
            let text = match value {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                _ => return Err(wrong_type()),
            };
            if !accepts(&text) {
                return Err(out_of_range(value));
            }
            Ok(Value::String(text))
        }
    }
}

fn default_for(spec: &FieldSpec, resolved: &Fields) -> Result<Value, FieldError> {
    match spec.default {
        FieldDefault::Integer(n) => Ok(Value::from(n)),
        FieldDefault::Number(n) => Ok(Value::from(n)),
        FieldDefault::Text(s) => Ok(Value::from(s)),
        FieldDefault::Inferred(infer) => Ok(infer(resolved)),
        FieldDefault::Required => Err(FieldError::Missing(spec.name)),
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    value
        .as_f64()
        .filter(|n| n.is_finite() && n.fract() == 0.0 && n.abs() < i64::MAX as f64)
        .map(|n| n as i64)
}
