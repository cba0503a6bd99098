//! Script values and their ES3-style conversions

use std::fmt;

use super::object::{ObjectHandle, ObjectKind};

#[derive(Clone, Debug, Default)]
pub enum ScriptValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Object(ObjectHandle),
}

impl ScriptValue {
    pub fn type_of(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "object",
            ScriptValue::Boolean(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Object(handle) if handle.is_function() => "function",
            ScriptValue::Object(_) => "object",
        }
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, ScriptValue::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Undefined | ScriptValue::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectHandle> {
        match self {
            ScriptValue::Object(handle) => Some(handle),
            _ => None,
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null => false,
            ScriptValue::Boolean(b) => *b,
            ScriptValue::Number(n) => *n != 0.0 && !n.is_nan(),
            ScriptValue::String(s) => !s.is_empty(),
            ScriptValue::Object(_) => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            ScriptValue::Undefined => f64::NAN,
            ScriptValue::Null => 0.0,
            ScriptValue::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            ScriptValue::Number(n) => *n,
            ScriptValue::String(s) => string_to_number(s),
            ScriptValue::Object(handle) => match &handle.borrow().kind {
                ObjectKind::Date(ms) => *ms,
                _ => string_to_number(&handle.default_string()),
            },
        }
    }

    pub fn to_script_string(&self) -> String {
        match self {
            ScriptValue::Undefined => "undefined".to_string(),
            ScriptValue::Null => "null".to_string(),
            ScriptValue::Boolean(b) => b.to_string(),
            ScriptValue::Number(n) => number_to_string(*n),
            ScriptValue::String(s) => s.clone(),
            ScriptValue::Object(handle) => handle.default_string(),
        }
    }

    /// `===`
    pub fn strict_equals(&self, other: &ScriptValue) -> bool {
        match (self, other) {
            (ScriptValue::Undefined, ScriptValue::Undefined) | (ScriptValue::Null, ScriptValue::Null) => true,
            (ScriptValue::Boolean(a), ScriptValue::Boolean(b)) => a == b,
            (ScriptValue::Number(a), ScriptValue::Number(b)) => a == b,
            (ScriptValue::String(a), ScriptValue::String(b)) => a == b,
            (ScriptValue::Object(a), ScriptValue::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    /// `==`
    pub fn loose_equals(&self, other: &ScriptValue) -> bool {
        use ScriptValue::*;
        match (self, other) {
            (Undefined | Null, Undefined | Null) => true,
            (Undefined | Null, _) | (_, Undefined | Null) => false,
            (Number(a), String(_)) => *a == other.to_number(),
            (String(_), Number(b)) => self.to_number() == *b,
            (Boolean(_), _) => Number(self.to_number()).loose_equals(other),
            (_, Boolean(_)) => self.loose_equals(&Number(other.to_number())),
            (Object(_), Number(_) | String(_)) => String(self.to_script_string()).loose_equals(other),
            (Number(_) | String(_), Object(_)) => self.loose_equals(&String(other.to_script_string())),
            _ => self.strict_equals(other),
        }
    }
}

/// ES3 number to string conversion for the common cases
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{:.0}", n)
    } else {
        format!("{}", n)
    }
}

fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map(|v| v as f64).unwrap_or(f64::NAN);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        // Rust accepts "inf" and "nan", ES3 does not
        other if other.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => f64::NAN,
        other => other.parse().unwrap_or(f64::NAN),
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_script_string())
    }
}

impl From<bool> for ScriptValue {
    fn from(value: bool) -> Self {
        ScriptValue::Boolean(value)
    }
}

impl From<f64> for ScriptValue {
    fn from(value: f64) -> Self {
        ScriptValue::Number(value)
    }
}

impl From<i32> for ScriptValue {
    fn from(value: i32) -> Self {
        ScriptValue::Number(value as f64)
    }
}

impl From<&str> for ScriptValue {
    fn from(value: &str) -> Self {
        ScriptValue::String(value.to_string())
    }
}

impl From<String> for ScriptValue {
    fn from(value: String) -> Self {
        ScriptValue::String(value)
    }
}

impl From<ObjectHandle> for ScriptValue {
    fn from(value: ObjectHandle) -> Self {
        ScriptValue::Object(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(number_to_string(3.0), "3");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(2.5), "2.5");
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
    }

    #[test]
    fn test_string_to_number() {
        assert_eq!(ScriptValue::from(" 42 ").to_number(), 42.0);
        assert_eq!(ScriptValue::from("").to_number(), 0.0);
        assert_eq!(ScriptValue::from("0x1F").to_number(), 31.0);
        assert_eq!(ScriptValue::from("1e3").to_number(), 1000.0);
        assert!(ScriptValue::from("inf").to_number().is_nan());
        assert!(ScriptValue::Undefined.to_number().is_nan());
    }

    #[test]
    fn test_loose_equality() {
        assert!(ScriptValue::Null.loose_equals(&ScriptValue::Undefined));
        assert!(ScriptValue::from("1").loose_equals(&ScriptValue::from(1)));
        assert!(ScriptValue::from(true).loose_equals(&ScriptValue::from(1)));
        assert!(!ScriptValue::Null.loose_equals(&ScriptValue::from(0)));
        assert!(!ScriptValue::from(f64::NAN).strict_equals(&ScriptValue::from(f64::NAN)));
    }

    #[test]
    fn test_truthiness() {
        assert!(!ScriptValue::from("").to_boolean());
        assert!(ScriptValue::from("0").to_boolean());
        assert!(!ScriptValue::from(f64::NAN).to_boolean());
    }
}
