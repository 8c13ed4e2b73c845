//! Canonical constructor-call strings.
//!
//! Nodes render as `Tag(arg, ...)` with arguments in constructor order,
//! scalars as JSON literals, lists as `[a, b]` and mappings as
//! `{"key": value}` in insertion order.

use std::fmt;

use crate::calendar::duration_components;
use crate::expression::Expression;
use crate::value::Value;

/// Spell a float the way JSON does, integral values without a fraction
pub(crate) fn format_float(value: f64) -> String {
    if !value.is_finite() {
        "null".to_string()
    } else if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        value.to_string()
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let quoted = serde_json::to_string(text).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

fn write_separated<'a, I>(f: &mut fmt::Formatter<'_>, items: I) -> fmt::Result
where
    I: IntoIterator<Item = &'a Value>,
{
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::String(s) => write_quoted(f, s),
            Value::List(items) => {
                f.write_str("[")?;
                write_separated(f, items)?;
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_quoted(f, key)?;
                    write!(f, ": {}", value)?;
                }
                f.write_str("}")
            }
            Value::Date(date) => write_quoted(f, &date.format("%Y-%m-%d").to_string()),
            Value::DateTime(datetime) => {
                write_quoted(f, &datetime.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Value::Time(time) => write_quoted(f, &time.format("%H:%M:%S%.f").to_string()),
            Value::TimeDelta(delta) => {
                let (days, seconds, micros) = duration_components(*delta);
                write!(f, "TimeDelta({}, {}, {})", days, seconds, micros)
            }
            Value::Expression(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.tag())?;
        write_separated(f, &self.arguments())?;
        f.write_str(")")
    }
}
