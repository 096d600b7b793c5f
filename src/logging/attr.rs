//! Key-value attributes and call-site argument pairing.

use crate::config::duration::format_duration;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Key recorded for arguments that could not be paired into an attribute.
pub const BAD_KEY: &str = "BAD_KEY";

/// An attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    String(String),
    I64(i64),
    U64(u64),
    F64(f64),
    Bool(bool),
    Duration(Duration),
    Time(DateTime<Utc>),
    Json(serde_json::Value),
}

impl AttrValue {
    /// JSON form with durations as strings and times as RFC 3339.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            AttrValue::String(s) => serde_json::Value::String(s.clone()),
            AttrValue::I64(n) => serde_json::Value::from(*n),
            AttrValue::U64(n) => serde_json::Value::from(*n),
            AttrValue::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or_else(|| serde_json::Value::String(f.to_string())),
            AttrValue::Bool(b) => serde_json::Value::Bool(*b),
            AttrValue::Duration(d) => serde_json::Value::String(format_duration(*d)),
            AttrValue::Time(t) => serde_json::Value::String(t.to_rfc3339()),
            AttrValue::Json(v) => v.clone(),
        }
    }
}

/// A named attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: AttrValue,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One element of a call-site argument list.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A key or a value, depending on position.
    Value(AttrValue),
    /// A ready-made attribute.
    Attr(Attr),
}

impl From<Attr> for Arg {
    fn from(attr: Attr) -> Self {
        Arg::Attr(attr)
    }
}

impl From<AttrValue> for Arg {
    fn from(value: AttrValue) -> Self {
        Arg::Value(value)
    }
}

macro_rules! impl_attr_value {
    ($($ty:ty => |$v:ident| $conv:expr;)*) => {
        $(
            impl From<$ty> for AttrValue {
                fn from($v: $ty) -> Self {
                    $conv
                }
            }

            impl From<$ty> for Arg {
                fn from(v: $ty) -> Self {
                    Arg::Value(AttrValue::from(v))
                }
            }
        )*
    };
}

impl_attr_value! {
    &str => |v| AttrValue::String(v.to_string());
    String => |v| AttrValue::String(v);
    &String => |v| AttrValue::String(v.clone());
    i8 => |v| AttrValue::I64(i64::from(v));
    i16 => |v| AttrValue::I64(i64::from(v));
    i32 => |v| AttrValue::I64(i64::from(v));
    i64 => |v| AttrValue::I64(v);
    isize => |v| AttrValue::I64(v as i64);
    u8 => |v| AttrValue::U64(u64::from(v));
    u16 => |v| AttrValue::U64(u64::from(v));
    u32 => |v| AttrValue::U64(u64::from(v));
    u64 => |v| AttrValue::U64(v);
    usize => |v| AttrValue::U64(v as u64);
    f32 => |v| AttrValue::F64(f64::from(v));
    f64 => |v| AttrValue::F64(v);
    bool => |v| AttrValue::Bool(v);
    Duration => |v| AttrValue::Duration(v);
    DateTime<Utc> => |v| AttrValue::Time(v);
    serde_json::Value => |v| AttrValue::Json(v);
}

/// Build a `Vec<Arg>` from alternating keys and values, or ready [`Attr`]s.
///
/// ```
/// use identity_service::args;
/// let args = args!["user", "alice", "attempts", 3];
/// assert_eq!(args.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::logging::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::logging::Arg::from($arg)),+]
    };
}

/// Pair up call-site arguments.
///
/// A string followed by anything becomes one attribute. A lone trailing string
/// and a non-string in key position are kept under [`BAD_KEY`].
pub fn args_to_attrs(args: Vec<Arg>) -> Vec<Attr> {
    let mut attrs = Vec::with_capacity(args.len() / 2 + 1);
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg {
            Arg::Attr(attr) => attrs.push(attr),
            Arg::Value(AttrValue::String(key)) => match iter.next() {
                Some(Arg::Value(value)) => attrs.push(Attr { key, value }),
                Some(Arg::Attr(group)) => {
                    let mut object = serde_json::Map::new();
                    object.insert(group.key, group.value.to_json());
                    attrs.push(Attr::new(key, serde_json::Value::Object(object)));
                }
                None => attrs.push(Attr::new(BAD_KEY, key)),
            },
            Arg::Value(value) => attrs.push(Attr {
                key: BAD_KEY.to_string(),
                value,
            }),
        }
    }

    attrs
}
