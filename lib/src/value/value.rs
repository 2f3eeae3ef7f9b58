use std::fmt;
use std::sync::Arc;
use std::collections::BTreeMap;

use either::Either;
use serde::{Serialize, Deserialize};

pub type Dict<K = Arc<str>, V = Value> = BTreeMap<K, V>;

/// Represents any value a template can compute with.
///
/// A `Value` is what flows through a pipeline: the result of invoking a field
/// or identifier, and the argument handed to the next one. Its [`Display`]
/// implementation is the _string form_ written to the output by an action.
///
/// [`Display`]: fmt::Display
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Num(Num),
    String(Arc<str>),
    Array(Arc<Vec<Value>>),
    Dict(Arc<Dict>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None
        }
    }

    pub fn to_num(&self) -> Option<Num> {
        match self {
            Value::Num(n) => Some(*n),
            _ => None
        }
    }

    pub fn into_str(self) -> Result<Arc<str>, Value> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(&**s),
            _ => None
        }
    }

    pub fn into_vec(self) -> Result<Arc<Vec<Value>>, Value> {
        match self {
            Value::Array(v) => Ok(v),
            _ => Err(self)
        }
    }

    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Value::Array(v) => Some(v.as_slice()),
            _ => None
        }
    }

    pub fn as_dict(&self) -> Option<&Dict> {
        match self {
            Value::Dict(v) => Some(&**v),
            _ => None
        }
    }

    pub fn into_dict(self) -> Result<Arc<Dict>, Value> {
        match self {
            Value::Dict(v) => Ok(v),
            _ => Err(self)
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Num(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Dict(_) => "dict",
        }
    }
}

/// Writes the string form of the value: nothing for `null`, strings verbatim,
/// and compact JSON for arrays and dictionaries.
///
/// ```rust
/// use quill::value::Value;
///
/// assert_eq!(Value::Null.to_string(), "");
/// assert_eq!(Value::from("<b>").to_string(), "<b>");
/// assert_eq!(Value::from(-3i64).to_string(), "-3");
/// assert_eq!(Value::from(vec!["a", "b"]).to_string(), r#"["a","b"]"#);
/// ```
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => fmt::Display::fmt(b, f),
            Value::Num(n) => fmt::Display::fmt(n, f),
            Value::String(s) => f.write_str(s),
            Value::Array(_) | Value::Dict(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

macro_rules! impl_from_primitive {
    ($($T:ty),+ => $E:ident::$kind:ident) => {
        $(
            impl From<$T> for $E {
                fn from(value: $T) -> Self {
                    $E::$kind(value.into())
                }
            }
        )+
    };
}

impl_from_primitive!(bool => Value::Bool);
impl_from_primitive!(&str => Value::String);
impl_from_primitive!(std::borrow::Cow<'_, str> => Value::String);
impl_from_primitive!(String => Value::String);
impl_from_primitive!(Arc<str> => Value::String);
impl_from_primitive!(Arc<Vec<Value>> => Value::Array);
impl_from_primitive!(Arc<Dict> => Value::Dict);
impl_from_primitive!(u8, u16, u32, u64, usize => Value::Num);
impl_from_primitive!(i8, i16, i32, i64, isize => Value::Num);
impl_from_primitive!(f32, f64 => Value::Num);
impl_from_primitive!(Num => Value::Num);

impl From<()> for Value  {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<A, B> From<Either<A, B>> for Value where Value: From<A>, Value: From<B> {
    fn from(value: Either<A, B>) -> Self {
        either::for_both!(value, v => v.into())
    }
}

impl<T> From<Option<T>> for Value where Value: From<T> {
    fn from(value: Option<T>) -> Self {
        value.map(Value::from).unwrap_or(Value::Null)
    }
}

impl<T> From<Vec<T>> for Value where Value: From<T> {
    fn from(value: Vec<T>) -> Self {
        value.into_iter()
            .map(Value::from)
            .collect()
    }
}

impl<K, V> From<Dict<K, V>> for Value where Arc<str>: From<K>, Value: From<V> {
    fn from(value: Dict<K, V>) -> Self {
        let dict = value.into_iter()
            .map(|(k, v)| (<Arc::<str>>::from(k), Value::from(v)))
            .collect::<Dict>();

        Value::Dict(Arc::new(dict))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let vec = iter.into_iter().collect::<Vec<Value>>();
        Value::Array(Arc::new(vec))
    }
}

/// A signed, unsigned, or floating point numeric value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Num {
    /// A 64-bit unsigned integer.
    U64(u64),
    /// A 64-bit signed integer.
    I64(i64),
    /// A 64-bit float.
    F64(f64),
}

impl Num {
    /// Converts `self` into an `i128` if it is integral.
    pub fn to_i128(self) -> Option<i128> {
        match self {
            Num::U64(v) => Some(v as i128),
            Num::I64(v) => Some(v as i128),
            Num::F64(_) => None,
        }
    }

    /// Converts `self` into an `f64`, possibly losing precision.
    pub fn to_f64_lossy(self) -> f64 {
        match self {
            Num::U64(v) => v as f64,
            Num::I64(v) => v as f64,
            Num::F64(v) => v,
        }
    }
}

impl PartialEq for Num {
    /// ```rust
    /// use quill::value::Num;
    ///
    /// assert!(Num::from(-0i8) == Num::from(0u8));
    /// assert!(Num::from(10i32) == Num::from(10u64));
    /// assert!(Num::from(2.0f64) == Num::from(2u8));
    /// assert!(Num::from(-1i8) != Num::from(1u8));
    /// ```
    fn eq(&self, other: &Self) -> bool {
        match (self.to_i128(), other.to_i128()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_f64_lossy() == other.to_f64_lossy(),
        }
    }
}

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Num::U64(v) => fmt::Display::fmt(v, f),
            Num::I64(v) => fmt::Display::fmt(v, f),
            Num::F64(v) => fmt::Display::fmt(v, f),
        }
    }
}

macro_rules! impl_from_for_num_value {
    ($($T:ty: $V:ident as $C:ty),* $(,)?) => ($(
        impl From<$T> for Num {
            fn from(value: $T) -> Num {
                Num::$V(value as $C)
            }
        }
    )*)
}

impl_from_for_num_value! {
    u8: U64 as u64, u16: U64 as u64, u32: U64 as u64, u64: U64 as u64, usize: U64 as u64,
    i8: I64 as i64, i16: I64 as i64, i32: I64 as i64, i64: I64 as i64, isize: I64 as i64,
    f32: F64 as f64, f64: F64 as f64,
}

macro_rules! impl_try_from_value {
    ($($T:ty),+ => | $v:ident | $e:expr) => {
        $(
            impl TryFrom<$crate::value::Value> for $T {
                type Error = Value;

                fn try_from($v: $crate::value::Value) -> Result<Self, Self::Error> {
                    (|| $e)()
                }
            }
        )+
    };
}

impl_try_from_value!(bool => |v| v.to_bool().ok_or(v));
impl_try_from_value!(Arc<str> => |v| v.into_str());
impl_try_from_value!(String => |v| v.into_str().map(|s| s.to_string()));
impl_try_from_value!(Arc<Dict> => |v| v.into_dict());
impl_try_from_value!(Arc<Vec<Value>> => |v| v.into_vec());
impl_try_from_value!(Num => |v| v.to_num().ok_or(v));
impl_try_from_value!(f64 => |v| v.to_num().map(|n| n.to_f64_lossy()).ok_or(v));

impl_try_from_value!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize =>
    |v| v.to_num().and_then(|n| n.to_i128()?.try_into().ok()).ok_or(v));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_untagged_from_toml() {
        let value: Value = toml::from_str(r#"
            title = "Hello"
            count = 3
            ratio = 0.5
            tags = ["a", "b"]
        "#).unwrap();

        let dict = value.as_dict().unwrap();
        assert_eq!(dict["title"], Value::from("Hello"));
        assert_eq!(dict["count"], Value::from(3u8));
        assert_eq!(dict["ratio"], Value::from(0.5));
        assert_eq!(dict["tags"].to_string(), r#"["a","b"]"#);
    }

    #[test]
    fn integer_conversions_check_range() {
        assert_eq!(u8::try_from(Value::from(200u64)), Ok(200));
        assert!(u8::try_from(Value::from(300u64)).is_err());
        assert!(u32::try_from(Value::from(-1i64)).is_err());
        assert!(i64::try_from(Value::from(1.5)).is_err());
        assert_eq!(f64::try_from(Value::from(2i64)), Ok(2.0));
    }

    #[test]
    fn dict_display_is_json() {
        let value = Value::from(crate::dict! { "a" => 1u8, "b" => true });
        assert_eq!(value.to_string(), r#"{"a":1,"b":true}"#);
    }
}
