//! Encoding of value graphs into canonical JSON text.
//!
//! Nodes become records whose tag key comes first, followed by the fields
//! in [`Tag::fields`](crate::expression::Tag::fields) order. Absent
//! optional fields are written as `null`.

use log::debug;
use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};

use crate::calendar::duration_components;
use crate::codec::CodecResult;
use crate::expression::eval::decimal_number;
use crate::expression::{DateParts, Expression, TAG_KEY};
use crate::value::{float_value, Value};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => match float_value(*f) {
                Value::Integer(i) => serializer.serialize_i64(i),
                // Integral past i64, JSON still spells it without a fraction
                Value::Float(f) if f.fract() == 0.0 && f > 0.0 && f < u64::MAX as f64 => {
                    serializer.serialize_u64(f as u64)
                }
                Value::Float(f) => serializer.serialize_f64(f),
                _ => serializer.serialize_unit(),
            },
            Value::Decimal(decimal) => decimal_number(decimal).serialize(serializer),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => serializer.collect_seq(items),
            Value::Map(map) => serializer.collect_map(map),
            Value::Date(date) => Expression::Date(DateParts::from(*date)).serialize(serializer),
            Value::DateTime(datetime) => Expression::DateTime {
                date: datetime.date().into(),
                time: datetime.time().into(),
            }
            .serialize(serializer),
            Value::Time(time) => Err(S::Error::custom(format!(
                "time of day {} has no wire representation",
                time
            ))),
            Value::TimeDelta(delta) => {
                let (days, seconds, microseconds) = duration_components(*delta);
                Expression::TimeDelta {
                    days: days.into(),
                    seconds: seconds.into(),
                    microseconds: microseconds.into(),
                }
                .serialize(serializer)
            }
            Value::Expression(expr) => expr.serialize(serializer),
        }
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let record = self.record();
        let mut map = serializer.serialize_map(Some(record.len() + 1))?;
        map.serialize_entry(TAG_KEY, &self.tag())?;
        for (key, value) in &record {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Encode a value graph as compact JSON
pub fn encode(value: &Value) -> CodecResult<String> {
    let text = serde_json::to_string(value)?;
    debug!("Encoded {} bytes", text.len());
    Ok(text)
}

/// Encode a value graph as a JSON tree
pub fn to_json(value: &Value) -> CodecResult<serde_json::Value> {
    Ok(serde_json::to_value(value)?)
}
