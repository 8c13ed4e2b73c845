//! Expression node definitions.

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::expression::type_checker::{coerce_boolean, TypeChecker, TypeSet, TypeTag};
use crate::expression::{ExpressionError, ExpressionResult, Tag};
use crate::value::{Map, Value};

const PARENT_PREFIX: &str = "_parent_";

/// Date fields shared by Date and DateTime
#[derive(Debug, Clone, PartialEq)]
pub struct DateParts {
    pub year: Value,
    pub month: Value,
    pub day: Value,
    pub delta_years: Value,
    pub delta_months: Value,
    pub delta_days: Value,
    /// Base value; today or now when it is not a date
    pub start: Value,
}

impl Default for DateParts {
    fn default() -> Self {
        Self {
            year: Value::Null,
            month: Value::Null,
            day: Value::Null,
            delta_years: Value::Integer(0),
            delta_months: Value::Integer(0),
            delta_days: Value::Integer(0),
            start: Value::Null,
        }
    }
}

impl DateParts {
    pub fn ymd(year: impl Into<Value>, month: impl Into<Value>, day: impl Into<Value>) -> Self {
        Self {
            year: year.into(),
            month: month.into(),
            day: day.into(),
            ..Default::default()
        }
    }

    pub fn with_deltas(
        mut self,
        years: impl Into<Value>,
        months: impl Into<Value>,
        days: impl Into<Value>,
    ) -> Self {
        self.delta_years = years.into();
        self.delta_months = months.into();
        self.delta_days = days.into();
        self
    }

    pub fn with_start(mut self, start: impl Into<Value>) -> Self {
        self.start = start.into();
        self
    }

    fn check(&self, checker: &TypeChecker) -> ExpressionResult<()> {
        checker.check_calendar_field("y", &self.year)?;
        checker.check_calendar_field("M", &self.month)?;
        checker.check_calendar_field("d", &self.day)?;
        checker.check_calendar_field("dy", &self.delta_years)?;
        checker.check_calendar_field("dM", &self.delta_months)?;
        checker.check_calendar_field("dd", &self.delta_days)
    }
}

impl From<NaiveDate> for DateParts {
    fn from(date: NaiveDate) -> Self {
        DateParts::ymd(date.year() as i64, date.month() as i64, date.day() as i64)
    }
}

/// Time-of-day fields of DateTime
#[derive(Debug, Clone, PartialEq)]
pub struct TimeParts {
    pub hour: Value,
    pub minute: Value,
    pub second: Value,
    pub microsecond: Value,
    pub delta_hours: Value,
    pub delta_minutes: Value,
    pub delta_seconds: Value,
    pub delta_microseconds: Value,
}

impl Default for TimeParts {
    fn default() -> Self {
        Self {
            hour: Value::Null,
            minute: Value::Null,
            second: Value::Null,
            microsecond: Value::Null,
            delta_hours: Value::Integer(0),
            delta_minutes: Value::Integer(0),
            delta_seconds: Value::Integer(0),
            delta_microseconds: Value::Integer(0),
        }
    }
}

impl TimeParts {
    pub fn hms(hour: impl Into<Value>, minute: impl Into<Value>, second: impl Into<Value>) -> Self {
        Self {
            hour: hour.into(),
            minute: minute.into(),
            second: second.into(),
            ..Default::default()
        }
    }

    pub fn with_microsecond(mut self, microsecond: impl Into<Value>) -> Self {
        self.microsecond = microsecond.into();
        self
    }

    pub fn with_deltas(
        mut self,
        hours: impl Into<Value>,
        minutes: impl Into<Value>,
        seconds: impl Into<Value>,
        microseconds: impl Into<Value>,
    ) -> Self {
        self.delta_hours = hours.into();
        self.delta_minutes = minutes.into();
        self.delta_seconds = seconds.into();
        self.delta_microseconds = microseconds.into();
        self
    }

    fn check(&self, checker: &TypeChecker) -> ExpressionResult<()> {
        checker.check_calendar_field("h", &self.hour)?;
        checker.check_calendar_field("m", &self.minute)?;
        checker.check_calendar_field("s", &self.second)?;
        checker.check_calendar_field("ms", &self.microsecond)?;
        checker.check_calendar_field("dh", &self.delta_hours)?;
        checker.check_calendar_field("dm", &self.delta_minutes)?;
        checker.check_calendar_field("ds", &self.delta_seconds)?;
        checker.check_calendar_field("dms", &self.delta_microseconds)
    }
}

impl From<NaiveTime> for TimeParts {
    fn from(time: NaiveTime) -> Self {
        TimeParts::hms(time.hour() as i64, time.minute() as i64, time.second() as i64)
            .with_microsecond((time.nanosecond() / 1_000) as i64)
    }
}

/// Expression tree node
///
/// Nodes are immutable once built. Fields hold literal values or nested
/// nodes wrapped in [`Value::Expression`].
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Context lookup by dotted path
    Eval { path: String, default: Value },

    Not { operand: Value },

    /// Truthiness of the operand
    Bool { operand: Value },

    And { operands: Vec<Value> },

    Or { operands: Vec<Value> },

    Equal { left: Value, right: Value },

    Greater {
        left: Value,
        right: Value,
        inclusive: Value,
    },

    Less {
        left: Value,
        right: Value,
        inclusive: Value,
    },

    If {
        condition: Value,
        then: Value,
        otherwise: Value,
    },

    /// Mapping lookup with a fallback
    Get {
        target: Value,
        key: Value,
        default: Value,
    },

    /// Membership of a key in a list, mapping or string
    In { key: Value, container: Value },

    Date(DateParts),

    DateTime { date: DateParts, time: TimeParts },

    TimeDelta {
        days: Value,
        seconds: Value,
        microseconds: Value,
    },

    Len { operand: Value },
}

impl Expression {
    /// Create an Eval expression
    pub fn eval(path: impl Into<String>, default: impl Into<Value>) -> Self {
        Expression::Eval {
            path: path.into(),
            default: default.into(),
        }
    }

    pub fn not(operand: impl Into<Value>) -> Self {
        Expression::Not {
            operand: coerce_boolean(operand.into()),
        }
    }

    pub fn bool(operand: impl Into<Value>) -> Self {
        Expression::Bool {
            operand: operand.into(),
        }
    }

    /// Create an And expression over two or more statements
    pub fn and(statements: Vec<Value>) -> ExpressionResult<Self> {
        let operands = Self::logical(Tag::And, statements)?;
        Ok(Expression::And { operands })
    }

    /// Create an Or expression over two or more statements
    pub fn or(statements: Vec<Value>) -> ExpressionResult<Self> {
        let operands = Self::logical(Tag::Or, statements)?;
        Ok(Expression::Or { operands })
    }

    fn logical(operator: Tag, statements: Vec<Value>) -> ExpressionResult<Vec<Value>> {
        TypeChecker::new(operator).check_statement_count(&statements, 2)?;
        Ok(statements.into_iter().map(coerce_boolean).collect())
    }

    pub fn equal(left: impl Into<Value>, right: impl Into<Value>) -> ExpressionResult<Self> {
        let (left, right) = (left.into(), right.into());
        TypeChecker::new(Tag::Equal).check_same_types(&left, &right)?;
        Ok(Expression::Equal { left, right })
    }

    pub fn greater(
        left: impl Into<Value>,
        right: impl Into<Value>,
        inclusive: impl Into<Value>,
    ) -> ExpressionResult<Self> {
        let (left, right, inclusive) =
            Self::comparison(Tag::Greater, left.into(), right.into(), inclusive.into())?;
        Ok(Expression::Greater {
            left,
            right,
            inclusive,
        })
    }

    pub fn less(
        left: impl Into<Value>,
        right: impl Into<Value>,
        inclusive: impl Into<Value>,
    ) -> ExpressionResult<Self> {
        let (left, right, inclusive) =
            Self::comparison(Tag::Less, left.into(), right.into(), inclusive.into())?;
        Ok(Expression::Less {
            left,
            right,
            inclusive,
        })
    }

    fn comparison(
        operator: Tag,
        left: Value,
        right: Value,
        inclusive: Value,
    ) -> ExpressionResult<(Value, Value, Value)> {
        let checker = TypeChecker::new(operator);
        checker.check_comparable("s1", &left)?;
        checker.check_comparable("s2", &right)?;
        Ok((left, right, coerce_boolean(inclusive)))
    }

    pub fn if_then_else(
        condition: impl Into<Value>,
        then: impl Into<Value>,
        otherwise: impl Into<Value>,
    ) -> Self {
        Expression::If {
            condition: coerce_boolean(condition.into()),
            then: then.into(),
            otherwise: otherwise.into(),
        }
    }

    pub fn get(
        target: impl Into<Value>,
        key: impl Into<Value>,
        default: impl Into<Value>,
    ) -> ExpressionResult<Self> {
        let (target, key) = (target.into(), key.into());
        let checker = TypeChecker::new(Tag::Get);
        checker.check_mapping("v", &target)?;
        checker.check_string("k", &key)?;
        Ok(Expression::Get {
            target,
            key,
            default: default.into(),
        })
    }

    /// Create an In expression testing `key` against `container`
    pub fn member(key: impl Into<Value>, container: impl Into<Value>) -> ExpressionResult<Self> {
        let (key, container) = (key.into(), container.into());
        let checker = TypeChecker::new(Tag::In);
        checker.check_member_key("k", &key)?;
        checker.check_container("v", &container)?;
        Ok(Expression::In { key, container })
    }

    pub fn date(parts: DateParts) -> ExpressionResult<Self> {
        parts.check(&TypeChecker::new(Tag::Date))?;
        Ok(Expression::Date(parts))
    }

    pub fn datetime(date: DateParts, time: TimeParts) -> ExpressionResult<Self> {
        let checker = TypeChecker::new(Tag::DateTime);
        date.check(&checker)?;
        time.check(&checker)?;
        Ok(Expression::DateTime { date, time })
    }

    pub fn time_delta(
        days: impl Into<Value>,
        seconds: impl Into<Value>,
        microseconds: impl Into<Value>,
    ) -> ExpressionResult<Self> {
        let (days, seconds, microseconds) = (days.into(), seconds.into(), microseconds.into());
        let checker = TypeChecker::new(Tag::TimeDelta);
        checker.check_duration_field("d", &days)?;
        checker.check_duration_field("s", &seconds)?;
        checker.check_duration_field("m", &microseconds)?;
        Ok(Expression::TimeDelta {
            days,
            seconds,
            microseconds,
        })
    }

    /// Create a Len expression
    pub fn length(operand: impl Into<Value>) -> ExpressionResult<Self> {
        let operand = operand.into();
        TypeChecker::new(Tag::Len).check_sized("v", &operand)?;
        Ok(Expression::Len { operand })
    }

    /// `Get(self, key, default)`
    pub fn lookup(
        self,
        key: impl Into<Value>,
        default: impl Into<Value>,
    ) -> ExpressionResult<Expression> {
        Expression::get(self, key, default)
    }

    /// `In(self, container)`
    pub fn member_of(self, container: impl Into<Value>) -> ExpressionResult<Expression> {
        Expression::member(self, container)
    }

    /// `In(key, self)`
    pub fn contains(self, key: impl Into<Value>) -> ExpressionResult<Expression> {
        Expression::member(key, self)
    }

    pub fn tag(&self) -> Tag {
        match self {
            Expression::Eval { .. } => Tag::Eval,
            Expression::Not { .. } => Tag::Not,
            Expression::Bool { .. } => Tag::Bool,
            Expression::And { .. } => Tag::And,
            Expression::Or { .. } => Tag::Or,
            Expression::Equal { .. } => Tag::Equal,
            Expression::Greater { .. } => Tag::Greater,
            Expression::Less { .. } => Tag::Less,
            Expression::If { .. } => Tag::If,
            Expression::Get { .. } => Tag::Get,
            Expression::In { .. } => Tag::In,
            Expression::Date(_) => Tag::Date,
            Expression::DateTime { .. } => Tag::DateTime,
            Expression::TimeDelta { .. } => Tag::TimeDelta,
            Expression::Len { .. } => Tag::Len,
        }
    }

    /// Get the type tags this expression can evaluate to
    pub fn types(&self) -> TypeSet {
        match self {
            Expression::Eval { default, .. } | Expression::Get { default, .. } => default.types(),
            Expression::If {
                then, otherwise, ..
            } => then.types().union(otherwise.types()),
            Expression::Date(_) | Expression::DateTime { .. } | Expression::TimeDelta { .. } => {
                TypeSet::of(TypeTag::Composite)
            }
            Expression::Len { .. } => TypeSet::of(TypeTag::Number),
            _ => TypeSet::of(TypeTag::Boolean),
        }
    }

    /// First segment of an Eval path, without the parent prefix
    pub fn basename(&self) -> Option<&str> {
        match self {
            Expression::Eval { path, .. } => {
                let name = path.strip_prefix(PARENT_PREFIX).unwrap_or(path);
                Some(name.split('.').next().unwrap_or(name))
            }
            _ => None,
        }
    }

    /// Field values in wire order, see [`Tag::fields`]
    fn field_values(&self) -> Vec<Value> {
        match self {
            Expression::Eval { path, default } => vec![path.as_str().into(), default.clone()],
            Expression::Not { operand } | Expression::Bool { operand } | Expression::Len { operand } => {
                vec![operand.clone()]
            }
            Expression::And { operands } | Expression::Or { operands } => {
                vec![Value::List(operands.clone())]
            }
            Expression::Equal { left, right } => vec![left.clone(), right.clone()],
            Expression::Greater {
                left,
                right,
                inclusive,
            }
            | Expression::Less {
                left,
                right,
                inclusive,
            } => vec![left.clone(), right.clone(), inclusive.clone()],
            Expression::If {
                condition,
                then,
                otherwise,
            } => vec![condition.clone(), then.clone(), otherwise.clone()],
            Expression::Get {
                target,
                key,
                default,
            } => vec![target.clone(), key.clone(), default.clone()],
            Expression::In { key, container } => vec![key.clone(), container.clone()],
            Expression::Date(date) => date_values(date),
            Expression::DateTime { date, time } => {
                let mut values = date_values(date);
                values.extend([
                    time.hour.clone(),
                    time.minute.clone(),
                    time.second.clone(),
                    time.microsecond.clone(),
                    time.delta_hours.clone(),
                    time.delta_minutes.clone(),
                    time.delta_seconds.clone(),
                    time.delta_microseconds.clone(),
                ]);
                values
            }
            Expression::TimeDelta {
                days,
                seconds,
                microseconds,
            } => vec![days.clone(), seconds.clone(), microseconds.clone()],
        }
    }

    /// Canonical record of this node without the tag key
    pub fn record(&self) -> Map {
        self.tag()
            .fields()
            .iter()
            .map(|key| key.to_string())
            .zip(self.field_values())
            .collect()
    }

    /// Rebuild a node from its record, applying the constructor checks.
    /// Missing fields take their constructor defaults.
    pub fn from_record(tag: Tag, fields: Map) -> ExpressionResult<Expression> {
        let mut fields = Fields(fields);
        match tag {
            Tag::Eval => {
                let path = path_of(fields.take("v", Value::Null))?;
                Ok(Expression::eval(path, fields.take("d", "")))
            }
            Tag::Not => Ok(Expression::not(fields.take("v", Value::Null))),
            Tag::Bool => Ok(Expression::bool(fields.take("v", Value::Null))),
            Tag::And => Expression::and(statements_of(tag, fields.take("s", Value::Null))?),
            Tag::Or => Expression::or(statements_of(tag, fields.take("s", Value::Null))?),
            Tag::Equal => Expression::equal(fields.take("s1", Value::Null), fields.take("s2", Value::Null)),
            Tag::Greater => Expression::greater(
                fields.take("s1", Value::Null),
                fields.take("s2", Value::Null),
                fields.take("e", false),
            ),
            Tag::Less => Expression::less(
                fields.take("s1", Value::Null),
                fields.take("s2", Value::Null),
                fields.take("e", false),
            ),
            Tag::If => Ok(Expression::if_then_else(
                fields.take("c", Value::Null),
                fields.take("t", Value::Null),
                fields.take("e", Value::Null),
            )),
            Tag::Get => Expression::get(
                fields.take("v", Value::Null),
                fields.take("k", Value::Null),
                fields.take("d", Value::Null),
            ),
            Tag::In => Expression::member(fields.take("k", Value::Null), fields.take("v", Value::Null)),
            Tag::Date => Expression::date(fields.date_parts()),
            Tag::DateTime => {
                let date = fields.date_parts();
                Expression::datetime(date, fields.time_parts())
            }
            Tag::TimeDelta => Expression::time_delta(
                fields.take("d", 0),
                fields.take("s", 0),
                fields.take("m", 0),
            ),
            Tag::Len => Expression::length(fields.take("v", Value::Null)),
        }
    }

    /// Constructor arguments in canonical string order
    pub fn arguments(&self) -> Vec<Value> {
        match self {
            Expression::And { operands } | Expression::Or { operands } => operands.clone(),
            Expression::DateTime { date, time } => vec![
                date.year.clone(),
                date.month.clone(),
                date.day.clone(),
                time.hour.clone(),
                time.minute.clone(),
                time.second.clone(),
                time.microsecond.clone(),
                date.delta_years.clone(),
                date.delta_months.clone(),
                date.delta_days.clone(),
                time.delta_hours.clone(),
                time.delta_minutes.clone(),
                time.delta_seconds.clone(),
                time.delta_microseconds.clone(),
                date.start.clone(),
            ],
            _ => self.field_values(),
        }
    }

    /// Build a node from positional constructor arguments
    pub fn from_arguments(tag: Tag, arguments: Vec<Value>) -> ExpressionResult<Expression> {
        let (minimum, maximum) = tag.arity();
        if arguments.len() < minimum || arguments.len() > maximum {
            return Err(ExpressionError::ArgumentCount {
                operator: tag,
                minimum,
                maximum,
                actual: arguments.len(),
            });
        }

        let mut args = Arguments(arguments.into_iter());
        match tag {
            Tag::And => Expression::and(args.0.collect()),
            Tag::Or => Expression::or(args.0.collect()),
            Tag::DateTime => {
                let (year, month, day) = (
                    args.next_or(Value::Null),
                    args.next_or(Value::Null),
                    args.next_or(Value::Null),
                );
                let time = TimeParts::hms(
                    args.next_or(Value::Null),
                    args.next_or(Value::Null),
                    args.next_or(Value::Null),
                )
                .with_microsecond(args.next_or(Value::Null));
                let date = DateParts::ymd(year, month, day).with_deltas(
                    args.next_or(0),
                    args.next_or(0),
                    args.next_or(0),
                );
                let time = time.with_deltas(
                    args.next_or(0),
                    args.next_or(0),
                    args.next_or(0),
                    args.next_or(0),
                );
                Expression::datetime(date.with_start(args.next_or(Value::Null)), time)
            }
            // Remaining tags take their arguments in field order
            _ => {
                let fields = tag
                    .fields()
                    .iter()
                    .filter_map(|key| args.0.next().map(|value| (key.to_string(), value)))
                    .collect();
                Expression::from_record(tag, fields)
            }
        }
    }
}

fn date_values(date: &DateParts) -> Vec<Value> {
    vec![
        date.year.clone(),
        date.month.clone(),
        date.day.clone(),
        date.delta_years.clone(),
        date.delta_months.clone(),
        date.delta_days.clone(),
        date.start.clone(),
    ]
}

fn path_of(value: Value) -> ExpressionResult<String> {
    match value {
        Value::String(path) => Ok(path),
        other => Err(ExpressionError::InvalidOperand {
            operator: Tag::Eval,
            field: "v",
            expected: "a string",
            actual: other.types(),
        }),
    }
}

fn statements_of(operator: Tag, value: Value) -> ExpressionResult<Vec<Value>> {
    match value {
        Value::List(statements) => Ok(statements),
        other => Err(ExpressionError::InvalidOperand {
            operator,
            field: "s",
            expected: "a list of statements",
            actual: other.types(),
        }),
    }
}

/// Record fields consumed by key
struct Fields(Map);

impl Fields {
    fn take(&mut self, key: &str, default: impl Into<Value>) -> Value {
        self.0.shift_remove(key).unwrap_or_else(|| default.into())
    }

    fn date_parts(&mut self) -> DateParts {
        DateParts {
            year: self.take("y", Value::Null),
            month: self.take("M", Value::Null),
            day: self.take("d", Value::Null),
            delta_years: self.take("dy", 0),
            delta_months: self.take("dM", 0),
            delta_days: self.take("dd", 0),
            start: self.take("start", Value::Null),
        }
    }

    fn time_parts(&mut self) -> TimeParts {
        TimeParts {
            hour: self.take("h", Value::Null),
            minute: self.take("m", Value::Null),
            second: self.take("s", Value::Null),
            microsecond: self.take("ms", Value::Null),
            delta_hours: self.take("dh", 0),
            delta_minutes: self.take("dm", 0),
            delta_seconds: self.take("ds", 0),
            delta_microseconds: self.take("dms", 0),
        }
    }
}

/// Positional arguments consumed in order
struct Arguments(std::vec::IntoIter<Value>);

impl Arguments {
    fn next_or(&mut self, default: impl Into<Value>) -> Value {
        self.0.next().unwrap_or_else(|| default.into())
    }
}
