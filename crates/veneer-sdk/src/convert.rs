//! Conversions between Rust types and `Value`
//!
//! `ToValue` encodes arguments and results, `FromValue` decodes them, and
//! `ValueType` reports the `TypeDesc` used in signatures. `#[proxyable]`
//! emits calls to all three for every parameter and return type.

use crate::error::ConversionError;
use crate::signature::TypeDesc;
use crate::value::Value;

/// Convert a Rust value into a `Value`.
pub trait ToValue {
    /// Encode as a `Value`
    fn to_value(self) -> Value;
}

/// Convert a `Value` back into a Rust value.
pub trait FromValue: Sized {
    /// Decode, returning an error if the shape or range does not match
    fn from_value(value: &Value) -> Result<Self, ConversionError>;
}

/// Type descriptor of a Rust type for signature metadata.
pub trait ValueType {
    /// Descriptor used in `MethodSignature`s
    fn type_desc() -> TypeDesc;
}

macro_rules! signed_int {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(self) -> Value {
                Value::Int(self as i64)
            }
        }

        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, ConversionError> {
                let wide: i128 = match value {
                    Value::Int(i) => *i as i128,
                    Value::UInt(u) => *u as i128,
                    other => return Err(ConversionError::mismatch(stringify!($t), other)),
                };
                <$t>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                    target: stringify!($t),
                    value: wide.to_string(),
                })
            }
        }

        impl ValueType for $t {
            fn type_desc() -> TypeDesc {
                TypeDesc::Int(stringify!($t))
            }
        }
    )*};
}

macro_rules! unsigned_int {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(self) -> Value {
                Value::UInt(self as u64)
            }
        }

        impl FromValue for $t {
            fn from_value(value: &Value) -> Result<Self, ConversionError> {
                let wide: i128 = match value {
                    Value::Int(i) => *i as i128,
                    Value::UInt(u) => *u as i128,
                    other => return Err(ConversionError::mismatch(stringify!($t), other)),
                };
                <$t>::try_from(wide).map_err(|_| ConversionError::OutOfRange {
                    target: stringify!($t),
                    value: wide.to_string(),
                })
            }
        }

        impl ValueType for $t {
            fn type_desc() -> TypeDesc {
                TypeDesc::UInt(stringify!($t))
            }
        }
    )*};
}

signed_int!(i8, i16, i32, i64, isize);
unsigned_int!(u8, u16, u32, u64, usize);

impl ToValue for f64 {
    fn to_value(self) -> Value {
        Value::Float(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.as_f64().ok_or_else(|| ConversionError::mismatch("f64", value))
    }
}

impl ValueType for f64 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Float("f64")
    }
}

impl ToValue for f32 {
    fn to_value(self) -> Value {
        Value::Float(self as f64)
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_f64()
            .map(|f| f as f32)
            .ok_or_else(|| ConversionError::mismatch("f32", value))
    }
}

impl ValueType for f32 {
    fn type_desc() -> TypeDesc {
        TypeDesc::Float("f32")
    }
}

impl ToValue for bool {
    fn to_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value.as_bool().ok_or_else(|| ConversionError::mismatch("bool", value))
    }
}

impl ValueType for bool {
    fn type_desc() -> TypeDesc {
        TypeDesc::Bool
    }
}

// Unit type (for methods that return nothing)
impl ToValue for () {
    fn to_value(self) -> Value {
        Value::Null
    }
}

impl FromValue for () {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            Ok(())
        } else {
            Err(ConversionError::mismatch("()", value))
        }
    }
}

impl ValueType for () {
    fn type_desc() -> TypeDesc {
        TypeDesc::Unit
    }
}

impl ToValue for String {
    fn to_value(self) -> Value {
        Value::Str(self)
    }
}

impl ToValue for &str {
    fn to_value(self) -> Value {
        Value::Str(self.to_string())
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ConversionError::mismatch("String", value))
    }
}

impl ValueType for String {
    fn type_desc() -> TypeDesc {
        TypeDesc::Str
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(self) -> Value {
        Value::List(self.into_iter().map(ToValue::to_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        value
            .as_list()
            .ok_or_else(|| ConversionError::mismatch("Vec", value))?
            .iter()
            .map(T::from_value)
            .collect()
    }
}

impl<T: ValueType> ValueType for Vec<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::List(Box::new(T::type_desc()))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(self) -> Value {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: ValueType> ValueType for Option<T> {
    fn type_desc() -> TypeDesc {
        TypeDesc::Optional(Box::new(T::type_desc()))
    }
}

// Value passes through untouched
impl ToValue for Value {
    fn to_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl ValueType for Value {
    fn type_desc() -> TypeDesc {
        TypeDesc::Value
    }
}

/// Implement the conversion traits for user types carried as opaque objects.
///
/// The type must be `Clone + Send + Sync + 'static`; decoding clones the
/// shared value out of the object handle.
///
/// ```ignore
/// #[derive(Clone)]
/// pub struct Order { id: u64 }
///
/// veneer_sdk::object_value!(Order);
/// ```
#[macro_export]
macro_rules! object_value {
    ($($t:ty),+ $(,)?) => {$(
        impl $crate::ToValue for $t {
            fn to_value(self) -> $crate::Value {
                $crate::Value::object(self)
            }
        }

        impl $crate::FromValue for $t {
            fn from_value(value: &$crate::Value) -> ::std::result::Result<Self, $crate::ConversionError> {
                value
                    .downcast_object::<$t>()
                    .cloned()
                    .ok_or_else(|| $crate::ConversionError::mismatch(::std::any::type_name::<$t>(), value))
            }
        }

        impl $crate::ValueType for $t {
            fn type_desc() -> $crate::TypeDesc {
                $crate::TypeDesc::Object(::std::any::type_name::<$t>())
            }
        }
    )+};
}
