//! Node tags and their wire layout.

use serde::Serialize;
use std::fmt;

/// Key holding the tag name in an encoded record
pub const TAG_KEY: &str = "__class__";

/// Tags of the closed node vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Tag {
    Eval,
    Not,
    Bool,
    And,
    Or,
    Equal,
    Greater,
    Less,
    If,
    Get,
    In,
    Date,
    DateTime,
    TimeDelta,
    Len,
}

impl Tag {
    pub const ALL: [Tag; 15] = [
        Tag::Eval,
        Tag::Not,
        Tag::Bool,
        Tag::And,
        Tag::Or,
        Tag::Equal,
        Tag::Greater,
        Tag::Less,
        Tag::If,
        Tag::Get,
        Tag::In,
        Tag::Date,
        Tag::DateTime,
        Tag::TimeDelta,
        Tag::Len,
    ];

    /// Get the name used on the wire and in the canonical string
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Eval => "Eval",
            Tag::Not => "Not",
            Tag::Bool => "Bool",
            Tag::And => "And",
            Tag::Or => "Or",
            Tag::Equal => "Equal",
            Tag::Greater => "Greater",
            Tag::Less => "Less",
            Tag::If => "If",
            Tag::Get => "Get",
            Tag::In => "In",
            Tag::Date => "Date",
            Tag::DateTime => "DateTime",
            Tag::TimeDelta => "TimeDelta",
            Tag::Len => "Len",
        }
    }

    pub fn from_name(name: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.as_str() == name)
    }

    /// Record fields in encoding order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Tag::Eval => &["v", "d"],
            Tag::Not | Tag::Bool | Tag::Len => &["v"],
            Tag::And | Tag::Or => &["s"],
            Tag::Equal => &["s1", "s2"],
            Tag::Greater | Tag::Less => &["s1", "s2", "e"],
            Tag::If => &["c", "t", "e"],
            Tag::Get => &["v", "k", "d"],
            Tag::In => &["k", "v"],
            Tag::Date => &["y", "M", "d", "dy", "dM", "dd", "start"],
            Tag::DateTime => &[
                "y", "M", "d", "dy", "dM", "dd", "start", "h", "m", "s", "ms", "dh", "dm", "ds",
                "dms",
            ],
            Tag::TimeDelta => &["d", "s", "m"],
        }
    }

    /// Minimum and maximum positional constructor arguments
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Tag::Eval => (1, 2),
            Tag::Not | Tag::Bool | Tag::Len => (1, 1),
            Tag::And | Tag::Or => (0, usize::MAX),
            Tag::Equal | Tag::In => (2, 2),
            Tag::Greater | Tag::Less | Tag::If | Tag::Get => (2, 3),
            Tag::Date => (0, 7),
            Tag::DateTime => (0, 15),
            Tag::TimeDelta => (0, 3),
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
