//! Conversion of Rust values into the comparable [`Value`] model.
//!
//! Primitive and collection types implement [`Inspect`] here; user structs opt in with
//! [`inspect_record!`](crate::inspect_record), which lists the fields to compare in
//! declaration order.

use crate::format::render;
use crate::value::{Kind, Value};
use chrono::{DateTime, TimeZone};
use std::collections::{BTreeMap, HashMap};

/// Types that can be turned into a [`Value`] for comparison.
pub trait Inspect {
    fn to_value(&self) -> Value;

    /// Stable nominal type identity used for type checks and custom comparators.
    ///
    /// Must equal the `ty` of the values [`to_value`](Inspect::to_value) produces, otherwise
    /// comparators registered with
    /// [`custom_comparator_for`](crate::PolicyBuilder::custom_comparator_for) never apply.
    fn type_name() -> String {
        std::any::type_name::<Self>().to_string()
    }
}

/// Implement [`Inspect`] for a struct by listing its fields.
///
/// ```
/// use valdiff_core::{inspect_record, Inspect};
///
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// inspect_record!(Point { x, y });
///
/// let v = Point { x: 1, y: 2 }.to_value();
/// assert_eq!(v.fields().unwrap().len(), 2);
/// ```
#[macro_export]
macro_rules! inspect_record {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::Inspect for $ty {
            fn to_value(&self) -> $crate::Value {
                $crate::Value::record(
                    <Self as $crate::Inspect>::type_name(),
                    [$((stringify!($field), $crate::Inspect::to_value(&self.$field))),*],
                )
            }
        }
    };
}

macro_rules! inspect_signed {
    ($($t:ty),*) => {$(
        impl Inspect for $t {
            fn to_value(&self) -> Value {
                Value::new(Self::type_name(), Kind::Int(*self as i64))
            }

            fn type_name() -> String {
                stringify!($t).to_string()
            }
        }
    )*};
}

macro_rules! inspect_unsigned {
    ($($t:ty),*) => {$(
        impl Inspect for $t {
            fn to_value(&self) -> Value {
                Value::new(Self::type_name(), Kind::Uint(*self as u64))
            }

            fn type_name() -> String {
                stringify!($t).to_string()
            }
        }
    )*};
}

inspect_signed!(i8, i16, i32, i64, isize);
inspect_unsigned!(u8, u16, u32, u64, usize);

impl Inspect for f32 {
    fn to_value(&self) -> Value {
        Value::new(Self::type_name(), Kind::Float(f64::from(*self)))
    }

    fn type_name() -> String {
        "f32".to_string()
    }
}

impl Inspect for f64 {
    fn to_value(&self) -> Value {
        Value::float(*self)
    }

    fn type_name() -> String {
        "f64".to_string()
    }
}

impl Inspect for bool {
    fn to_value(&self) -> Value {
        Value::bool(*self)
    }

    fn type_name() -> String {
        "bool".to_string()
    }
}

impl Inspect for char {
    fn to_value(&self) -> Value {
        Value::new(Self::type_name(), Kind::Str(self.to_string()))
    }

    fn type_name() -> String {
        "char".to_string()
    }
}

impl Inspect for String {
    fn to_value(&self) -> Value {
        Value::string(self.clone())
    }

    fn type_name() -> String {
        "String".to_string()
    }
}

/// Borrowed strings compare as `String`.
impl Inspect for str {
    fn to_value(&self) -> Value {
        Value::string(self)
    }

    fn type_name() -> String {
        "String".to_string()
    }
}

/// References are transparent: they report the referent's value and type.
impl<T: Inspect + ?Sized> Inspect for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn type_name() -> String {
        T::type_name()
    }
}

impl<T: Inspect + ?Sized> Inspect for Box<T> {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }

    fn type_name() -> String {
        T::type_name()
    }
}

impl<T: Inspect> Inspect for Vec<T> {
    fn to_value(&self) -> Value {
        Value::seq(Self::type_name(), self.iter().map(Inspect::to_value).collect())
    }
}

impl<T: Inspect, const N: usize> Inspect for [T; N] {
    fn to_value(&self) -> Value {
        Value::array(Self::type_name(), self.iter().map(Inspect::to_value).collect())
    }
}

/// `None` is an empty holder, reported as nil.
impl<T: Inspect> Inspect for Option<T> {
    fn to_value(&self) -> Value {
        Value::dynamic(Self::type_name(), self.as_ref().map(Inspect::to_value))
    }
}

/// The hasher is not part of the type identity.
impl<K: Inspect, V: Inspect, S> Inspect for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        let mut entries: Vec<(Value, Value)> = self
            .iter()
            .map(|(k, v)| (k.to_value(), v.to_value()))
            .collect();
        // HashMap iteration order is random; sort on the rendered key for stable output.
        entries.sort_by_cached_key(|(k, _)| render(k, true));
        Value::map(Self::type_name(), entries)
    }

    fn type_name() -> String {
        std::any::type_name::<HashMap<K, V>>().to_string()
    }
}

impl<K: Inspect, V: Inspect> Inspect for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        Value::map(
            Self::type_name(),
            self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect(),
        )
    }
}

/// Every timestamp shares one type identity regardless of its time zone.
impl<Tz: TimeZone> Inspect for DateTime<Tz> {
    fn to_value(&self) -> Value {
        Value::time(self.clone())
    }

    fn type_name() -> String {
        "DateTime".to_string()
    }
}

/// Already-built values pass through with their own type.
impl Inspect for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}
