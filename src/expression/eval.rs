//! Expression evaluation and the tag registry.
//!
//! Every tag has one evaluator working on already-evaluated fields. The
//! decoder reaches evaluators through [`registry`] while reviving records,
//! and [`ExpressionEvaluator`] reaches the same functions when walking a
//! live expression, so both paths agree.

use std::collections::HashMap;
use std::sync::OnceLock;

use bigdecimal::{BigDecimal, ToPrimitive};
use chrono::NaiveTime;
use log::warn;

use crate::calendar::{self, Clock, DateAdjustment, SystemClock, TimeAdjustment};
use crate::expression::display::format_float;
use crate::expression::{Expression, ExpressionResult, Tag};
use crate::value::{float_value, Map, Value};

static SYSTEM_CLOCK: SystemClock = SystemClock;
static NULL: Value = Value::Null;

/// Evaluates a tag's fields once they hold plain values
pub type Evaluator = fn(&Map, &ExpressionEvaluator<'_>) -> Value;

/// Evaluator for expressions
#[derive(Clone, Copy)]
pub struct ExpressionEvaluator<'a> {
    /// Variables visible to Eval
    context: &'a Map,
    /// Source of today and now for Date and DateTime
    clock: &'a dyn Clock,
}

impl<'a> ExpressionEvaluator<'a> {
    /// Create a new evaluator reading the system clock
    pub fn new(context: &'a Map) -> Self {
        Self {
            context,
            clock: &SYSTEM_CLOCK,
        }
    }

    pub fn with_clock(self, clock: &'a dyn Clock) -> Self {
        Self { clock, ..self }
    }

    pub fn context(&self) -> &'a Map {
        self.context
    }

    /// Evaluate an expression bottom-up
    pub fn evaluate(&self, expr: &Expression) -> Value {
        let fields: Map = expr
            .record()
            .into_iter()
            .map(|(key, value)| (key, self.evaluate_value(&value)))
            .collect();
        evaluator(expr.tag())(&fields, self)
    }

    /// Evaluate every expression nested in a value. Other values come out
    /// as an encode/decode round trip would leave them.
    pub fn evaluate_value(&self, value: &Value) -> Value {
        match value {
            Value::Expression(expr) => self.evaluate(expr),
            Value::List(items) => {
                Value::List(items.iter().map(|item| self.evaluate_value(item)).collect())
            }
            Value::Map(map) => Value::Map(
                map.iter()
                    .map(|(key, item)| (key.clone(), self.evaluate_value(item)))
                    .collect(),
            ),
            Value::Decimal(decimal) => decimal_number(decimal),
            Value::Float(f) => float_value(*f),
            other => other.clone(),
        }
    }
}

/// Helper function to evaluate an expression against a context
pub fn evaluate_expression(expr: &Expression, context: &Map) -> Value {
    ExpressionEvaluator::new(context).evaluate(expr)
}

/// Number a decimal becomes on the wire
pub(crate) fn decimal_number(decimal: &BigDecimal) -> Value {
    if decimal.is_integer() {
        if let Some(i) = decimal.to_i64() {
            return Value::Integer(i);
        }
    }
    decimal.to_f64().map_or(Value::Null, float_value)
}

/// Registered tag
pub struct Entry {
    pub tag: Tag,
    evaluator: Evaluator,
}

impl Entry {
    /// Rebuild a node from its revived fields
    pub fn build(&self, fields: Map) -> ExpressionResult<Expression> {
        Expression::from_record(self.tag, fields)
    }

    /// Evaluate revived fields
    pub fn evaluate(&self, fields: &Map, evaluator: &ExpressionEvaluator<'_>) -> Value {
        (self.evaluator)(fields, evaluator)
    }
}

/// Tag name to constructor and evaluator
pub struct Registry {
    entries: HashMap<&'static str, Entry>,
}

impl Registry {
    fn new() -> Self {
        let entries = Tag::ALL
            .into_iter()
            .map(|tag| {
                (
                    tag.as_str(),
                    Entry {
                        tag,
                        evaluator: evaluator(tag),
                    },
                )
            })
            .collect();
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The process-wide registry, built on first use
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::new)
}

fn evaluator(tag: Tag) -> Evaluator {
    match tag {
        Tag::Eval => eval_path,
        Tag::Not => eval_not,
        Tag::Bool => eval_bool,
        Tag::And => eval_and,
        Tag::Or => eval_or,
        Tag::Equal => eval_equal,
        Tag::Greater => eval_greater,
        Tag::Less => eval_less,
        Tag::If => eval_if,
        Tag::Get => eval_get,
        Tag::In => eval_in,
        Tag::Date => eval_date,
        Tag::DateTime => eval_datetime,
        Tag::TimeDelta => eval_time_delta,
        Tag::Len => eval_len,
    }
}

fn field<'m>(fields: &'m Map, key: &str) -> &'m Value {
    fields.get(key).unwrap_or(&NULL)
}

fn eval_path(fields: &Map, evaluator: &ExpressionEvaluator<'_>) -> Value {
    let default = field(fields, "d");
    match field(fields, "v") {
        Value::String(path) => resolve_path(path, default, evaluator.context()),
        _ => default.clone(),
    }
}

/// A literal key wins over a dotted walk into nested mappings and lists
fn resolve_path(path: &str, default: &Value, context: &Map) -> Value {
    if let Some(value) = context.get(path) {
        return value.clone();
    }
    match path.split_once('.') {
        Some((head, rest)) => descend(context.get(head), rest, default),
        None => default.clone(),
    }
}

/// Lists are addressed by their decimal index, e.g. `lines.0.name`
fn resolve_index(path: &str, default: &Value, items: &[Value]) -> Value {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let item = head
        .parse::<usize>()
        .ok()
        .filter(|index| index.to_string() == head)
        .and_then(|index| items.get(index));
    match rest {
        None => item.cloned().unwrap_or_else(|| default.clone()),
        Some(rest) => descend(item, rest, default),
    }
}

fn descend(value: Option<&Value>, rest: &str, default: &Value) -> Value {
    match value {
        Some(Value::Map(inner)) => resolve_path(rest, default, inner),
        Some(Value::List(items)) => resolve_index(rest, default, items),
        _ => default.clone(),
    }
}

fn eval_not(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    Value::Boolean(!field(fields, "v").is_truthy())
}

fn eval_bool(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    Value::Boolean(field(fields, "v").is_truthy())
}

fn eval_and(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    match field(fields, "s") {
        Value::List(statements) => Value::Boolean(statements.iter().all(Value::is_truthy)),
        _ => Value::Boolean(false),
    }
}

fn eval_or(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    match field(fields, "s") {
        Value::List(statements) => Value::Boolean(statements.iter().any(Value::is_truthy)),
        _ => Value::Boolean(false),
    }
}

fn eval_equal(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    Value::Boolean(field(fields, "s1").loosely_equals(field(fields, "s2")))
}

fn eval_greater(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    compare(fields, |left, right, inclusive| {
        if inclusive {
            left >= right
        } else {
            left > right
        }
    })
}

fn eval_less(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    compare(fields, |left, right, inclusive| {
        if inclusive {
            left <= right
        } else {
            left < right
        }
    })
}

/// Null on either side is false; otherwise compare as numbers
fn compare<F>(fields: &Map, cmp_fn: F) -> Value
where
    F: Fn(f64, f64, bool) -> bool,
{
    let (left, right) = (field(fields, "s1"), field(fields, "s2"));
    if left.is_null() || right.is_null() {
        return Value::Boolean(false);
    }
    match (left.ordinal(), right.ordinal()) {
        (Some(left), Some(right)) => {
            Value::Boolean(cmp_fn(left, right, field(fields, "e").is_truthy()))
        }
        _ => Value::Boolean(false),
    }
}

fn eval_if(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    if field(fields, "c").is_truthy() {
        field(fields, "t").clone()
    } else {
        field(fields, "e").clone()
    }
}

fn eval_get(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    let default = field(fields, "d");
    match (field(fields, "v"), field(fields, "k")) {
        (Value::Map(target), Value::String(key)) => {
            target.get(key).cloned().unwrap_or_else(|| default.clone())
        }
        _ => default.clone(),
    }
}

fn eval_in(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    let key = field(fields, "k");
    let found = match field(fields, "v") {
        Value::List(items) => items.iter().any(|item| item.loosely_equals(key)),
        Value::Map(map) => mapping_key(key)
            .and_then(|key| map.get(&key))
            .is_some_and(Value::is_truthy),
        Value::String(text) => key.as_str().is_some_and(|key| text.contains(key)),
        _ => false,
    };
    Value::Boolean(found)
}

/// Numbers address mapping keys by their decimal spelling
fn mapping_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Integer(i) => Some(i.to_string()),
        Value::Float(f) => Some(format_float(*f)),
        _ => None,
    }
}

fn eval_len(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    field(fields, "v")
        .length()
        .map_or(Value::Null, |len| Value::Integer(len as i64))
}

/// Integer view of a field, truncating fractions
fn integer_field(fields: &Map, key: &str) -> Option<i64> {
    let value = field(fields, key).as_f64()?;
    value.is_finite().then(|| value.trunc() as i64)
}

fn date_adjustment(fields: &Map) -> DateAdjustment {
    // Zero leaves the base field in place, like null
    let replacement = |key: &str| integer_field(fields, key).filter(|v| *v != 0);
    DateAdjustment {
        year: replacement("y"),
        month: replacement("M"),
        day: replacement("d"),
        delta_years: integer_field(fields, "dy").unwrap_or(0),
        delta_months: integer_field(fields, "dM").unwrap_or(0),
        delta_days: integer_field(fields, "dd").unwrap_or(0),
    }
}

fn eval_date(fields: &Map, evaluator: &ExpressionEvaluator<'_>) -> Value {
    let base = match field(fields, "start") {
        Value::Date(date) => *date,
        Value::DateTime(datetime) => datetime.date(),
        _ => evaluator.clock.today(),
    };
    match date_adjustment(fields).apply(base) {
        Some(date) => Value::Date(date),
        None => {
            warn!("Date out of range from base {}", base);
            Value::Null
        }
    }
}

fn eval_datetime(fields: &Map, evaluator: &ExpressionEvaluator<'_>) -> Value {
    let base = match field(fields, "start") {
        Value::DateTime(datetime) => *datetime,
        Value::Date(date) => date.and_time(NaiveTime::MIN),
        _ => evaluator.clock.now(),
    };
    let time = TimeAdjustment {
        hour: integer_field(fields, "h"),
        minute: integer_field(fields, "m"),
        second: integer_field(fields, "s"),
        microsecond: integer_field(fields, "ms"),
        delta_hours: integer_field(fields, "dh").unwrap_or(0),
        delta_minutes: integer_field(fields, "dm").unwrap_or(0),
        delta_seconds: integer_field(fields, "ds").unwrap_or(0),
        delta_microseconds: integer_field(fields, "dms").unwrap_or(0),
    };
    match time.apply(&date_adjustment(fields), base) {
        Some(datetime) => Value::DateTime(datetime),
        None => {
            warn!("DateTime out of range from base {}", base);
            Value::Null
        }
    }
}

fn eval_time_delta(fields: &Map, _: &ExpressionEvaluator<'_>) -> Value {
    let component = |key: &str| field(fields, key).as_f64().unwrap_or(0.0);
    match calendar::duration(component("d"), component("s"), component("m")) {
        Some(delta) => Value::TimeDelta(delta),
        None => {
            warn!("TimeDelta out of range");
            Value::Null
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::FixedClock;
    use crate::expression::{DateParts, TimeParts};
    use crate::value::map;
    use chrono::{NaiveDate, TimeDelta};
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn clock() -> FixedClock {
        FixedClock(date(2024, 3, 15).and_hms_opt(9, 30, 0).unwrap())
    }

    #[test]
    fn test_registry_covers_every_tag() {
        let registry = registry();
        assert_eq!(registry.len(), Tag::ALL.len());
        for tag in Tag::ALL {
            assert_eq!(registry.lookup(tag.as_str()).map(|e| e.tag), Some(tag));
        }
        assert!(registry.lookup("Unknown").is_none());
    }

    #[test]
    fn test_eval_path() {
        let context = map([
            ("foo", Value::from("bar")),
            ("a.b", Value::from("literal")),
            ("a", Value::Map(map([("b", "nested"), ("c", "other")]))),
            ("nothing", Value::Null),
        ]);

        assert_eq!(
            evaluate_expression(&Expression::eval("foo", ""), &context),
            Value::from("bar")
        );
        assert_eq!(
            evaluate_expression(&Expression::eval("missing", 0), &context),
            Value::from(0)
        );
        // Literal dotted key takes precedence
        assert_eq!(
            evaluate_expression(&Expression::eval("a.b", ""), &context),
            Value::from("literal")
        );
        assert_eq!(
            evaluate_expression(&Expression::eval("a.c", ""), &context),
            Value::from("other")
        );
        assert_eq!(
            evaluate_expression(&Expression::eval("a.z", "dflt"), &context),
            Value::from("dflt")
        );
        // Present null is returned as is
        assert_eq!(
            evaluate_expression(&Expression::eval("nothing", "dflt"), &context),
            Value::Null
        );
        // Walking through a scalar falls back
        assert_eq!(
            evaluate_expression(&Expression::eval("foo.bar", "dflt"), &context),
            Value::from("dflt")
        );
    }

    #[test]
    fn test_eval_path_through_lists() {
        let context = map([
            ("foo", Value::List(vec!["a".into()])),
            (
                "lines",
                Value::List(vec![Value::Map(map([("name", "first")])), Value::Null]),
            ),
        ]);
        let eval = |path: &str| evaluate_expression(&Expression::eval(path, "dflt"), &context);

        assert_eq!(eval("foo.0"), Value::from("a"));
        assert_eq!(eval("lines.0.name"), Value::from("first"));
        assert_eq!(eval("lines.1"), Value::Null);
        assert_eq!(eval("foo.1"), Value::from("dflt"));
        assert_eq!(eval("foo.00"), Value::from("dflt"));
        assert_eq!(eval("foo.+0"), Value::from("dflt"));
        assert_eq!(eval("foo.x"), Value::from("dflt"));
        assert_eq!(eval("lines.1.name"), Value::from("dflt"));
    }

    #[test]
    fn test_logical_operations() {
        let context = Map::new();
        let and = Expression::and(vec![true.into(), false.into()]).unwrap();
        assert_eq!(evaluate_expression(&and, &context), Value::Boolean(false));
        let and = Expression::and(vec![true.into(), 1.into(), "x".into()]).unwrap();
        assert_eq!(evaluate_expression(&and, &context), Value::Boolean(true));
        let or = Expression::or(vec![false.into(), 0.into(), "".into()]).unwrap();
        assert_eq!(evaluate_expression(&or, &context), Value::Boolean(false));
        let or = Expression::or(vec![false.into(), Value::List(vec![0.into()])]).unwrap();
        assert_eq!(evaluate_expression(&or, &context), Value::Boolean(true));

        assert_eq!(
            evaluate_expression(&Expression::not(Value::Null), &context),
            Value::Boolean(true)
        );
        assert_eq!(
            evaluate_expression(&Expression::bool(Value::Map(Map::new())), &context),
            Value::Boolean(false)
        );
    }

    #[test]
    fn test_comparison_operations() {
        let context = map([("i", 1)]);
        let cases = [
            (Expression::greater(1, 0, false), true),
            (Expression::greater(1, 1, false), false),
            (Expression::greater(1, 1, true), true),
            (Expression::less(0, 1, false), true),
            (Expression::less(1.5, 1, true), false),
            (Expression::greater(Value::Null, 0, false), false),
            (Expression::less(0, Value::Null, true), false),
            (Expression::greater(1, Value::Null, false), false),
            (Expression::greater(Expression::eval("i", 0), 0, false), true),
        ];
        for (expr, expected) in cases {
            assert_eq!(
                evaluate_expression(&expr.unwrap(), &context),
                Value::Boolean(expected)
            );
        }
    }

    #[test]
    fn test_date_comparison() {
        let clock = clock();
        let context = Map::new();
        let evaluator = ExpressionEvaluator::new(&context).with_clock(&clock);
        let later = Expression::datetime(
            DateParts::ymd(2020, 1, 1),
            TimeParts::hms(0, 0, 0).with_microsecond(1),
        )
        .unwrap();
        let day = Expression::date(DateParts::ymd(2020, 1, 1)).unwrap();

        let expr = Expression::greater(later.clone(), day.clone(), false).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Boolean(true));

        // Dates compare as milliseconds against plain numbers
        let expr = Expression::greater(day.clone(), 90_000, false).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Boolean(true));

        let midnight = Expression::datetime(
            DateParts::ymd(2020, 1, 1),
            TimeParts::hms(0, 0, 0).with_microsecond(0),
        )
        .unwrap();
        let expr = Expression::greater(midnight, day, true).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Boolean(true));
    }

    #[test]
    fn test_equal() {
        let context = map([("x", Value::from(date(2020, 1, 1)))]);
        let equal = Expression::equal(1, 1.0).unwrap();
        assert_eq!(evaluate_expression(&equal, &context), Value::Boolean(true));

        let lists = Expression::equal(
            Value::List(vec![1.into(), "a".into()]),
            Value::List(vec![1.into(), "a".into()]),
        )
        .unwrap();
        assert_eq!(evaluate_expression(&lists, &context), Value::Boolean(true));

        // Date against a datetime at the same instant
        let expr = Expression::equal(
            Expression::eval("x", Map::new()),
            date(2020, 1, 1).and_hms_opt(0, 0, 0).unwrap(),
        )
        .unwrap();
        assert_eq!(evaluate_expression(&expr, &context), Value::Boolean(false));
        let expr = Expression::equal(Expression::eval("x", Map::new()), date(2020, 1, 1)).unwrap();
        assert_eq!(evaluate_expression(&expr, &context), Value::Boolean(true));
    }

    #[test]
    fn test_if() {
        let context = map([("flag", 1)]);
        let expr = Expression::if_then_else(Expression::eval("flag", 0), "yes", "no");
        assert_eq!(evaluate_expression(&expr, &context), Value::from("yes"));
        let expr = Expression::if_then_else(Expression::eval("other", 0), "yes", "no");
        assert_eq!(evaluate_expression(&expr, &context), Value::from("no"));
        let expr = Expression::if_then_else(false, "yes", Value::Null);
        assert_eq!(evaluate_expression(&expr, &context), Value::Null);
    }

    #[test]
    fn test_get() {
        let target = Value::Map(map([("foo", Value::from("bar")), ("none", Value::Null)]));
        let context = Map::new();
        let get = |key: &str| Expression::get(target.clone(), key, "default").unwrap();

        assert_eq!(evaluate_expression(&get("foo"), &context), Value::from("bar"));
        assert_eq!(evaluate_expression(&get("baz"), &context), Value::from("default"));
        assert_eq!(evaluate_expression(&get("none"), &context), Value::Null);

        let empty = Expression::get(Value::Map(Map::new()), "foo", "default").unwrap();
        assert_eq!(evaluate_expression(&empty, &context), Value::from("default"));
    }

    #[test]
    fn test_in() {
        let context = map([("foo", Value::Null)]);
        let list = Value::List(vec!["test".into(), 1.into()]);
        let mapping = Value::Map(map([("test", Value::from(1)), ("zero", Value::from(0)), ("1", Value::from("bar"))]));
        let cases = [
            (Expression::member("test", list.clone()), true),
            (Expression::member("other", list.clone()), false),
            (Expression::member(1, list), true),
            (Expression::member("test", mapping.clone()), true),
            (Expression::member("zero", mapping.clone()), false),
            (Expression::member("missing", mapping.clone()), false),
            (Expression::member(1, mapping), true),
            (Expression::member("test", Expression::eval("foo", Value::List(vec![]))), false),
        ];
        for (expr, expected) in cases {
            assert_eq!(
                evaluate_expression(&expr.unwrap(), &context),
                Value::Boolean(expected)
            );
        }
    }

    #[test]
    fn test_in_string_container() {
        let context = map([("s", "foo bar")]);
        let expr = Expression::member("bar", Expression::eval("s", Map::new())).unwrap();
        assert_eq!(evaluate_expression(&expr, &context), Value::Boolean(true));
    }

    #[test]
    fn test_len() {
        let context = map([("s", "foo bar")]);
        let cases = [
            (Expression::length(Value::Map(map([("1", 2), ("3", 4)]))), Value::from(2)),
            (Expression::length(Value::List(vec![1.into()])), Value::from(1)),
            (Expression::length("foo bar"), Value::from(7)),
            (Expression::length(Expression::eval("s", "")), Value::from(7)),
            (Expression::length(Expression::eval("missing", Map::new())), Value::from(0)),
        ];
        for (expr, expected) in cases {
            assert_eq!(evaluate_expression(&expr.unwrap(), &context), expected);
        }
    }

    #[test]
    fn test_date() {
        let clock = clock();
        let context = Map::new();
        let evaluator = ExpressionEvaluator::new(&context).with_clock(&clock);

        let expr = Expression::date(DateParts::ymd(2010, 1, 12).with_deltas(-1, 12, -7)).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Date(date(2010, 1, 5)));

        // Missing fields come from today
        let expr = Expression::date(DateParts::ymd(Value::Null, 1, Value::Null)).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Date(date(2024, 1, 15)));

        // Zero does not override
        let expr = Expression::date(DateParts::ymd(0, 0, 0)).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Date(date(2024, 3, 15)));

        let start = date(2000, 6, 30).and_hms_opt(23, 0, 0).unwrap();
        let expr = Expression::date(DateParts::default().with_deltas(0, 0, 1).with_start(start)).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::Date(date(2000, 7, 1)));
    }

    #[test]
    fn test_datetime() {
        let clock = clock();
        let context = Map::new();
        let evaluator = ExpressionEvaluator::new(&context).with_clock(&clock);

        let expr = Expression::datetime(
            DateParts::ymd(2010, 1, 12).with_deltas(-1, 12, -7),
            TimeParts::hms(10, 30, 20)
                .with_microsecond(0)
                .with_deltas(2, 15, 30, 1),
        )
        .unwrap();
        let expected = date(2010, 1, 5).and_hms_micro_opt(12, 45, 50, 1).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::DateTime(expected));

        // Zero overrides time fields, unlike date fields
        let expr = Expression::datetime(DateParts::default(), TimeParts::hms(0, Value::Null, 0)).unwrap();
        let expected = date(2024, 3, 15).and_hms_opt(0, 30, 0).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::DateTime(expected));

        // A date start means midnight
        let expr = Expression::datetime(
            DateParts::default().with_start(date(2020, 2, 2)),
            TimeParts::default(),
        )
        .unwrap();
        let expected = date(2020, 2, 2).and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(evaluator.evaluate(&expr), Value::DateTime(expected));
    }

    #[test]
    fn test_date_overflow_is_null() {
        let context = Map::new();
        let expr = Expression::date(DateParts::ymd(2020, 1, 1).with_deltas(i64::MAX, 0, 0)).unwrap();
        assert_eq!(evaluate_expression(&expr, &context), Value::Null);
        let expr = Expression::date(DateParts::ymd(2020, i64::MIN, 1)).unwrap();
        assert_eq!(evaluate_expression(&expr, &context), Value::Null);

        let context = map([("m", i64::MIN)]);
        let expr = Expression::datetime(
            DateParts::ymd(2020, Expression::eval("m", 0), 1),
            TimeParts::default(),
        )
        .unwrap();
        assert_eq!(evaluate_expression(&expr, &context), Value::Null);
    }

    #[test]
    fn test_time_delta() {
        let context = Map::new();
        let expr = Expression::time_delta(1, 2, 3).unwrap();
        assert_eq!(
            evaluate_expression(&expr, &context),
            Value::TimeDelta(TimeDelta::microseconds(86_402_000_003))
        );
        let expr = Expression::time_delta(0, 1.5, 0).unwrap();
        assert_eq!(
            evaluate_expression(&expr, &context),
            Value::TimeDelta(TimeDelta::milliseconds(1_500))
        );
    }

    #[test]
    fn test_evaluate_value_normalizes() {
        let context = Map::new();
        let evaluator = ExpressionEvaluator::new(&context);
        let decimal = BigDecimal::from_str("2.50").unwrap();
        assert_eq!(evaluator.evaluate_value(&decimal.into()), Value::Float(2.5));
        let decimal = BigDecimal::from_str("3").unwrap();
        assert_eq!(evaluator.evaluate_value(&decimal.into()), Value::Integer(3));
        assert_eq!(evaluator.evaluate_value(&f64::NAN.into()), Value::Null);
        assert!(matches!(
            evaluator.evaluate_value(&2.0.into()),
            Value::Integer(2)
        ));

        let nested = Value::List(vec![Expression::not(false).into(), Value::Map(map([("a", Expression::bool(1))]))]);
        assert_eq!(
            evaluator.evaluate_value(&nested),
            Value::List(vec![true.into(), Value::Map(map([("a", true)]))])
        );
    }
}
