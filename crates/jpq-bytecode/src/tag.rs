//! Node type tags and the operator families they encode.
//!
//! Every node starts with an 8-byte header:
//! - 0: tag byte
//! - 1: flag byte ([`FLAG_EXTERNAL`])
//! - 2-3: zero padding
//! - 4-7: `i32` offset of the next path step, relative to the node start (0 = none)

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

pub const NODE_HEADER_SIZE: usize = 8;

/// The node or something below it (operands or `next` chain) needs an external cache slot.
pub const FLAG_EXTERNAL: u8 = 0x01;

/// `.**{.. to last}` and `{last}` bounds.
pub const ANY_LAST: u32 = u32::MAX;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Null,
    Bool,
    Numeric,
    String,
    Key,
    Current,
    Root,
    Variable,
    Last,
    AnyKey,
    AnyArray,
    IndexArray,
    Any,
    Binary(BinaryOp),
    LikeRegex,
    Unary(UnaryOp),
    Filter,
    Method(Method),
    Sequence,
    Array,
    Object,
    Operator,
    Cast,
    Lambda,
    HigherOrder(HigherOrderKind),
}

impl Tag {
    /// Decode a tag byte; `None` for bytes no encoder writes.
    pub fn from_byte(b: u8) -> Option<Self> {
        let tag = match b {
            0 => Self::Null,
            1 => Self::Bool,
            2 => Self::Numeric,
            3 => Self::String,
            4 => Self::Key,
            5 => Self::Current,
            6 => Self::Root,
            7 => Self::Variable,
            8 => Self::Last,
            9 => Self::AnyKey,
            10 => Self::AnyArray,
            11 => Self::IndexArray,
            12 => Self::Any,
            20..=33 => Self::Binary(BinaryOp::ALL[usize::from(b - 20)]),
            34 => Self::LikeRegex,
            40..=44 => Self::Unary(UnaryOp::ALL[usize::from(b - 40)]),
            45 => Self::Filter,
            50..=57 => Self::Method(Method::ALL[usize::from(b - 50)]),
            60 => Self::Sequence,
            61 => Self::Array,
            62 => Self::Object,
            63 => Self::Operator,
            64 => Self::Cast,
            65 => Self::Lambda,
            70..=77 => Self::HigherOrder(HigherOrderKind::ALL[usize::from(b - 70)]),
            _ => return None,
        };
        Some(tag)
    }

    pub fn to_byte(self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool => 1,
            Self::Numeric => 2,
            Self::String => 3,
            Self::Key => 4,
            Self::Current => 5,
            Self::Root => 6,
            Self::Variable => 7,
            Self::Last => 8,
            Self::AnyKey => 9,
            Self::AnyArray => 10,
            Self::IndexArray => 11,
            Self::Any => 12,
            Self::Binary(op) => 20 + op as u8,
            Self::LikeRegex => 34,
            Self::Unary(op) => 40 + op as u8,
            Self::Filter => 45,
            Self::Method(m) => 50 + m as u8,
            Self::Sequence => 60,
            Self::Array => 61,
            Self::Object => 62,
            Self::Operator => 63,
            Self::Cast => 64,
            Self::Lambda => 65,
            Self::HigherOrder(kind) => 70 + kind as u8,
        }
    }

    /// Name used by the dump.
    pub fn name(self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool => "Bool",
            Self::Numeric => "Numeric",
            Self::String => "String",
            Self::Key => "Key",
            Self::Current => "Current",
            Self::Root => "Root",
            Self::Variable => "Variable",
            Self::Last => "Last",
            Self::AnyKey => "AnyKey",
            Self::AnyArray => "AnyArray",
            Self::IndexArray => "IndexArray",
            Self::Any => "Any",
            Self::Binary(op) => op.name(),
            Self::LikeRegex => "LikeRegex",
            Self::Unary(op) => op.name(),
            Self::Filter => "Filter",
            Self::Method(m) => m.name(),
            Self::Sequence => "Sequence",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::Operator => "Operator",
            Self::Cast => "Cast",
            Self::Lambda => "Lambda",
            Self::HigherOrder(kind) => kind.name(),
        }
    }

    /// Nodes that evaluate to a three-valued truth value.
    pub fn is_predicate(self) -> bool {
        match self {
            Self::Binary(op) => op.is_comparison() || op.is_logical() || op == BinaryOp::StartsWith,
            Self::Unary(op) => matches!(op, UnaryOp::Not | UnaryOp::Exists | UnaryOp::IsUnknown),
            Self::LikeRegex => true,
            _ => false,
        }
    }

    /// Literal scalars.
    pub fn is_scalar(self) -> bool {
        matches!(self, Self::Null | Self::Bool | Self::Numeric | Self::String)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    And,
    Or,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    StartsWith,
}

impl BinaryOp {
    pub const ALL: [Self; 14] = [
        Self::And,
        Self::Or,
        Self::Equal,
        Self::NotEqual,
        Self::Less,
        Self::LessOrEqual,
        Self::Greater,
        Self::GreaterOrEqual,
        Self::Add,
        Self::Sub,
        Self::Mul,
        Self::Div,
        Self::Mod,
        Self::StartsWith,
    ];

    /// Operator as written in query text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::And => "&&",
            Self::Or => "||",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::StartsWith => "starts with",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::And => "And",
            Self::Or => "Or",
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Less => "Less",
            Self::LessOrEqual => "LessOrEqual",
            Self::Greater => "Greater",
            Self::GreaterOrEqual => "GreaterOrEqual",
            Self::Add => "Add",
            Self::Sub => "Sub",
            Self::Mul => "Mul",
            Self::Div => "Div",
            Self::Mod => "Mod",
            Self::StartsWith => "StartsWith",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessOrEqual
                | Self::Greater
                | Self::GreaterOrEqual
        )
    }

    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or)
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, Self::Add | Self::Sub | Self::Mul | Self::Div | Self::Mod)
    }

    /// Binding strength used when rendering; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Or => 0,
            Self::And => 1,
            Self::Add | Self::Sub => 3,
            Self::Mul | Self::Div | Self::Mod => 4,
            _ => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Not,
    Exists,
    IsUnknown,
    Plus,
    Minus,
}

impl UnaryOp {
    pub const ALL: [Self; 5] = [
        Self::Not,
        Self::Exists,
        Self::IsUnknown,
        Self::Plus,
        Self::Minus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Not => "Not",
            Self::Exists => "Exists",
            Self::IsUnknown => "IsUnknown",
            Self::Plus => "Plus",
            Self::Minus => "Minus",
        }
    }
}

/// Zero-argument item methods (`.type()`, `.size()`, ...).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    Type,
    Size,
    Abs,
    Floor,
    Ceiling,
    Double,
    KeyValue,
    Datetime,
}

impl Method {
    pub const ALL: [Self; 8] = [
        Self::Type,
        Self::Size,
        Self::Abs,
        Self::Floor,
        Self::Ceiling,
        Self::Double,
        Self::KeyValue,
        Self::Datetime,
    ];

    /// Method name as written in query text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Size => "size",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceiling => "ceiling",
            Self::Double => "double",
            Self::KeyValue => "keyvalue",
            Self::Datetime => "datetime",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Type => "Type",
            Self::Size => "Size",
            Self::Abs => "Abs",
            Self::Floor => "Floor",
            Self::Ceiling => "Ceiling",
            Self::Double => "Double",
            Self::KeyValue => "KeyValue",
            Self::Datetime => "Datetime",
        }
    }
}

/// Functions taking a lambda argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HigherOrderKind {
    Map,
    FlatMap,
    Reduce,
    Fold,
    FoldLeft,
    FoldRight,
    Min,
    Max,
}

impl HigherOrderKind {
    pub const ALL: [Self; 8] = [
        Self::Map,
        Self::FlatMap,
        Self::Reduce,
        Self::Fold,
        Self::FoldLeft,
        Self::FoldRight,
        Self::Min,
        Self::Max,
    ];

    /// Function name as written in query text.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Map => "map",
            Self::FlatMap => "flatmap",
            Self::Reduce => "reduce",
            Self::Fold => "fold",
            Self::FoldLeft => "foldl",
            Self::FoldRight => "foldr",
            Self::Min => "min",
            Self::Max => "max",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Map => "Map",
            Self::FlatMap => "FlatMap",
            Self::Reduce => "Reduce",
            Self::Fold => "Fold",
            Self::FoldLeft => "FoldLeft",
            Self::FoldRight => "FoldRight",
            Self::Min => "Min",
            Self::Max => "Max",
        }
    }

    pub fn is_fold(self) -> bool {
        matches!(
            self,
            Self::Reduce | Self::Fold | Self::FoldLeft | Self::FoldRight
        )
    }
}

/// `like_regex` flags, stored as a bit set.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegexFlags(u32);

impl RegexFlags {
    /// `i`: case-insensitive.
    pub const CASE_INSENSITIVE: u32 = 0x01;
    /// `s`: `.` matches newline.
    pub const DOT_ALL: u32 = 0x02;
    /// `m`: `^` and `$` match at line breaks.
    pub const MULTI_LINE: u32 = 0x04;
    /// `x`: whitespace in the pattern is ignored.
    pub const EXTENDED: u32 = 0x08;
    /// `q`: the pattern is a literal string.
    pub const QUOTE: u32 = 0x10;

    const LETTERS: [(char, u32); 5] = [
        ('i', Self::CASE_INSENSITIVE),
        ('s', Self::DOT_ALL),
        ('m', Self::MULTI_LINE),
        ('x', Self::EXTENDED),
        ('q', Self::QUOTE),
    ];

    pub fn from_bits(bits: u32) -> Option<Self> {
        (bits & !0x1F == 0).then_some(Self(bits))
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, flag: u32) -> bool {
        self.0 & flag != 0
    }

    /// Parse a flag string such as `"is"`; `Err` carries the unknown letter.
    pub fn parse(text: &str) -> Result<Self, char> {
        let mut bits = 0;
        for c in text.chars() {
            let (_, bit) = Self::LETTERS
                .iter()
                .find(|(letter, _)| *letter == c)
                .ok_or(c)?;
            bits |= bit;
        }
        Ok(Self(bits))
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for RegexFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (letter, bit) in Self::LETTERS {
            if self.contains(bit) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}

impl Serialize for RegexFlags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RegexFlags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FlagsVisitor;

        impl Visitor<'_> for FlagsVisitor {
            type Value = RegexFlags;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a like_regex flag string such as \"is\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<RegexFlags, E> {
                RegexFlags::parse(v)
                    .map_err(|c| E::custom(format!("unrecognized like_regex flag {c:?}")))
            }
        }

        deserializer.deserialize_str(FlagsVisitor)
    }
}
