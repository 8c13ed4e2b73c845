//! Decoding of canonical JSON text.
//!
//! Text is parsed into a JSON tree first, then revived bottom-up. A mapping
//! whose tag key names a registered tag is replaced, once its fields are
//! revived, by its evaluation or, with `noeval`, by the rebuilt node.

use log::{debug, trace};

use crate::calendar::Clock;
use crate::codec::{CodecError, CodecResult};
use crate::expression::{registry, ExpressionEvaluator, TAG_KEY};
use crate::value::{number_value, Map, Value};

/// Decoder for encoded value graphs
pub struct Decoder<'a> {
    evaluator: ExpressionEvaluator<'a>,
    noeval: bool,
}

impl<'a> Decoder<'a> {
    /// Create a decoder evaluating records against `context`
    pub fn new(context: &'a Map) -> Self {
        Self {
            evaluator: ExpressionEvaluator::new(context),
            noeval: false,
        }
    }

    /// Rebuild nodes instead of evaluating them
    pub fn with_noeval(self, noeval: bool) -> Self {
        Self { noeval, ..self }
    }

    pub fn with_clock(self, clock: &'a dyn Clock) -> Self {
        Self {
            evaluator: self.evaluator.with_clock(clock),
            ..self
        }
    }

    /// Parse and revive text
    pub fn decode(&self, text: &str) -> CodecResult<Value> {
        debug!("Decoding {} bytes (noeval: {})", text.len(), self.noeval);
        let tree: serde_json::Value = serde_json::from_str(text)?;
        self.revive(tree)
    }

    /// Revive a parsed JSON tree, children first
    pub fn revive(&self, tree: serde_json::Value) -> CodecResult<Value> {
        match tree {
            serde_json::Value::Null => Ok(Value::Null),
            serde_json::Value::Bool(b) => Ok(Value::Boolean(b)),
            serde_json::Value::Number(n) => Ok(number_value(&n)),
            serde_json::Value::String(s) => Ok(Value::String(s)),
            serde_json::Value::Array(items) => items
                .into_iter()
                .map(|item| self.revive(item))
                .collect::<CodecResult<Vec<_>>>()
                .map(Value::List),
            serde_json::Value::Object(object) => {
                let entry = object
                    .get(TAG_KEY)
                    .and_then(serde_json::Value::as_str)
                    .and_then(|name| registry().lookup(name));

                let mut fields = Map::with_capacity(object.len());
                for (key, value) in object {
                    if entry.is_some() && key == TAG_KEY {
                        continue;
                    }
                    fields.insert(key, self.revive(value)?);
                }

                let Some(entry) = entry else {
                    return Ok(Value::Map(fields));
                };
                trace!("Reviving {} record", entry.tag);
                if self.noeval {
                    entry
                        .build(fields)
                        .map(Value::from)
                        .map_err(|source| CodecError::Construction {
                            tag: entry.tag,
                            source,
                        })
                } else {
                    Ok(entry.evaluate(&fields, &self.evaluator))
                }
            }
        }
    }
}

/// Decode text, evaluating every record against `context`
pub fn decode(text: &str, context: &Map) -> CodecResult<Value> {
    Decoder::new(context).decode(text)
}

/// Decode text into live nodes without evaluating them
pub fn decode_structure(text: &str) -> CodecResult<Value> {
    let context = Map::new();
    Decoder::new(&context).with_noeval(true).decode(text)
}

/// Decode a JSON object into a context. Date and DateTime records in it
/// become date values.
pub fn decode_context(text: &str) -> CodecResult<Map> {
    match decode(text, &Map::new())? {
        Value::Map(context) => Ok(context),
        other => Err(CodecError::NotAMapping(other.types().to_string())),
    }
}
