//! Query-string building.
//!
//! Unset values (`None`) and empty strings are dropped; everything else is
//! rendered with its `Display` form.

use chrono::{DateTime, SecondsFormat, Utc};

#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Str(String),
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
}

impl QueryValue {
    /// Rendered value, or `None` when the key should be omitted.
    pub fn render(&self) -> Option<String> {
        match self {
            QueryValue::Null => None,
            QueryValue::Str(s) if s.is_empty() => None,
            QueryValue::Str(s) => Some(s.clone()),
            QueryValue::Int(i) => Some(i.to_string()),
            QueryValue::UInt(u) => Some(u.to_string()),
            QueryValue::Float(f) => Some(f.to_string()),
            QueryValue::Bool(b) => Some(b.to_string()),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::Str(v.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::Str(v)
    }
}

impl From<&String> for QueryValue {
    fn from(v: &String) -> Self {
        QueryValue::Str(v.clone())
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<f64> for QueryValue {
    fn from(v: f64) -> Self {
        QueryValue::Float(v)
    }
}

macro_rules! int_query_value {
    ($variant:ident: $wide:ty => $($t:ty),*) => {
        $(impl From<$t> for QueryValue {
            fn from(v: $t) -> Self {
                QueryValue::$variant(<$wide>::from(v))
            }
        })*
    };
}

int_query_value!(Int: i64 => i32, i64);
int_query_value!(UInt: u64 => u32, u64);

impl From<usize> for QueryValue {
    fn from(v: usize) -> Self {
        match u64::try_from(v) {
            Ok(u) => QueryValue::UInt(u),
            Err(_) => QueryValue::Str(v.to_string()),
        }
    }
}

impl From<DateTime<Utc>> for QueryValue {
    fn from(v: DateTime<Utc>) -> Self {
        QueryValue::Str(v.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(QueryValue::Null)
    }
}

/// Ordered query parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a parameter; omitted when the value is unset or empty.
    pub fn push(mut self, key: impl Into<String>, value: impl Into<QueryValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// In-place variant of [`QueryParams::push`].
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        if let Some(rendered) = value.into().render() {
            self.pairs.push((key.into(), rendered));
        }
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// `a=1&b=two`, form-encoded, without a leading `?`.
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.pairs.iter())
            .finish()
    }
}
