use bigdecimal::{BigDecimal, ToPrimitive, Zero};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use indexmap::IndexMap;

use crate::calendar;
use crate::expression::{Expression, TypeSet, TypeTag};

/// Insertion-ordered string-keyed mapping
pub type Map = IndexMap<String, Value>;

/// Variables an expression is evaluated against
pub type Context = Map;

/// Values that can appear in an expression graph
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Decimal(BigDecimal),
    String(String),
    List(Vec<Value>),
    Map(Map),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    TimeDelta(TimeDelta),
    Expression(Box<Expression>),
}

/// Structural equality. JSON has a single number type, so an integral
/// float equals the integer it spells.
impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Integer(i), Value::Float(f)) | (Value::Float(f), Value::Integer(i)) => {
                exact_integer(*f) == Some(*i)
            }
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Time(a), Value::Time(b)) => a == b,
            (Value::TimeDelta(a), Value::TimeDelta(b)) => a == b,
            (Value::Expression(a), Value::Expression(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the expression held by this value, if any
    pub fn as_expression(&self) -> Option<&Expression> {
        match self {
            Value::Expression(expr) => Some(expr),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integral view of a number; floats qualify only when they have no fraction
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => Some(*f as i64),
            Value::Decimal(d) if d.is_integer() => d.to_i64(),
            _ => None,
        }
    }

    /// Floating point view of a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(
            self,
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_)
        )
    }

    /// Get the type tags this value can evaluate to
    pub fn types(&self) -> TypeSet {
        match self {
            Value::Null => TypeSet::of(TypeTag::Any),
            Value::Boolean(_) => TypeSet::of(TypeTag::Boolean),
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_) => TypeSet::of(TypeTag::Number),
            Value::String(_) => TypeSet::of(TypeTag::String),
            Value::List(_)
            | Value::Map(_)
            | Value::Date(_)
            | Value::DateTime(_)
            | Value::Time(_)
            | Value::TimeDelta(_) => TypeSet::of(TypeTag::Composite),
            Value::Expression(expr) => expr.types(),
        }
    }

    /// Truthiness used by Bool, Not, And, Or and If
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Integer(i) => *i != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::Decimal(d) => !d.is_zero(),
            Value::String(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => !map.is_empty(),
            Value::Date(_) | Value::DateTime(_) => true,
            Value::Time(t) => {
                t.hour() != 0 || t.minute() != 0 || t.second() != 0 || t.nanosecond() >= 1_000_000
            }
            Value::TimeDelta(delta) => !delta.is_zero(),
            Value::Expression(_) => true,
        }
    }

    /// Scalar used by Greater and Less. Dates and durations become
    /// milliseconds, booleans 0/1, strings their parsed number.
    pub fn ordinal(&self) -> Option<f64> {
        match self {
            Value::Null | Value::List(_) | Value::Map(_) | Value::Expression(_) => None,
            Value::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Integer(_) | Value::Float(_) | Value::Decimal(_) => self.as_f64(),
            Value::String(s) => {
                let s = s.trim();
                if s.is_empty() {
                    Some(0.0)
                } else {
                    s.parse::<f64>().ok()
                }
            }
            Value::Date(date) => Some(calendar::date_millis(*date)),
            Value::DateTime(datetime) => Some(calendar::datetime_millis(*datetime)),
            Value::Time(time) => Some(calendar::time_millis(*time)),
            Value::TimeDelta(delta) => Some(calendar::delta_millis(*delta)),
        }
    }

    /// Equality used by Equal: structural for lists and maps, category and
    /// instant for dates, numeric across number representations.
    pub fn loosely_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.loosely_equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.loosely_equals(w)))
            }
            (Value::Date(a), Value::Date(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::Date(_), _) | (_, Value::Date(_)) => false,
            (Value::DateTime(_), _) | (_, Value::DateTime(_)) => false,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (a, b) if a.is_number() && b.is_number() => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => x == y,
                _ => false,
            },
            (a, b) => a == b,
        }
    }

    /// Length used by Len
    pub fn length(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List(items) => Some(items.len()),
            Value::Map(map) => Some(map.len()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(value as i64)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<BigDecimal> for Value {
    fn from(value: BigDecimal) -> Self {
        Value::Decimal(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Map(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::Date(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Value::Time(value)
    }
}

impl From<TimeDelta> for Value {
    fn from(value: TimeDelta) -> Self {
        Value::TimeDelta(value)
    }
}

impl From<Expression> for Value {
    fn from(value: Expression) -> Self {
        Value::Expression(Box::new(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Plain conversion without reviving tagged records
impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => number_value(&n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

/// The integer an integral float spells, when it fits in i64
pub(crate) fn exact_integer(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
    (f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64).then(|| f as i64)
}

/// Number a float becomes on the wire: integral values lose their
/// fraction and non-finite values become null
pub(crate) fn float_value(f: f64) -> Value {
    if !f.is_finite() {
        Value::Null
    } else if let Some(i) = exact_integer(f) {
        Value::Integer(i)
    } else {
        Value::Float(f)
    }
}

/// Integers stay integral when they fit in i64
pub(crate) fn number_value(n: &serde_json::Number) -> Value {
    match n.as_i64() {
        Some(i) => Value::Integer(i),
        None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
    }
}

/// Build a map from key/value pairs
pub fn map<K, V, I>(entries: I) -> Map
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
