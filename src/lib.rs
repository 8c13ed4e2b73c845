pub mod calendar;
pub mod codec;
pub mod expression;
pub mod reader;
pub mod value;

pub use codec::{decode, decode_context, decode_structure, encode, CodecError, CodecResult, Decoder};
pub use expression::{
    evaluate_expression, DateParts, Expression, ExpressionError, ExpressionEvaluator,
    ExpressionResult, Tag, TimeParts, TypeSet, TypeTag,
};
pub use reader::parse_expression;
pub use value::{map, Context, Map, Value};
