use std::collections::BTreeMap;

/// A raw row value as seen by the binder.
///
/// This mirrors JSON but keeps integers and floats apart (unlike JSON's single
/// "number") so selector arithmetic can preserve integer results.
///
/// # Examples
///
/// ```
/// use navql::Value;
///
/// let row = Value::from(serde_json::json!({ "title": "Hello", "votes": 3 }));
/// assert_eq!(row.get("votes"), Some(&Value::Integer(3)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Float(f64),
    Integer(i64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Truthiness used by `Where`, `Any`, `All` and the logical operators:
    /// null, `false`, zero and empty strings or containers are false.
    pub fn as_bool(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(flag) => *flag,
            Value::Integer(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::String(text) => !text.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(fields) => !fields.is_empty(),
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match *self {
            Value::Integer(n) => Some(n as f64),
            Value::Float(n) => Some(n),
            _ => None,
        }
    }

    /// Text form used when a value is concatenated onto a string.
    pub fn as_string(&self) -> String {
        match self {
            Value::String(text) => text.clone(),
            Value::Null => "null".to_string(),
            Value::Boolean(flag) => flag.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Float(n) => n.to_string(),
            composite => serde_json::Value::from(composite.clone()).to_string(),
        }
    }

    /// Field lookup on an object: exact name first, then ASCII
    /// case-insensitive (`p.Title` finds `"title"`).
    pub fn get(&self, name: &str) -> Option<&Value> {
        let Value::Object(map) = self else {
            return None;
        };
        map.get(name).or_else(|| {
            map.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value)
        })
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(obj) => {
                Value::Object(obj.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(v: Value) -> Self {
        match v {
            Value::Null => serde_json::Value::Null,
            Value::Boolean(b) => serde_json::Value::Bool(b),
            Value::Integer(i) => serde_json::Value::Number(i.into()),
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s),
            Value::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}
