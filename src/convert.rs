//! Scalar conversion service.
//!
//! Scalars are the leaves of a model: values with a canonical textual form.
//! The engine only talks to this module through [`to_text`] and
//! [`from_text`]; the per-type rules live in [`Scalar`] implementations.
//!
//! Integers are formatted with `itoa` and floats with `ryu`. Parsing is
//! strict apart from surrounding whitespace, and an empty text converts to
//! nothing but `String`.

use crate::error::{Error, Result};
use crate::reflect::{ModelType, Object, Reflect, ScalarVTable, TypeDescriptor, TypeKind};
use std::any::type_name;
use std::borrow::Cow;

/// A value with a canonical textual form.
///
/// Custom scalars (for example fieldless enums) implement this trait and
/// return [`scalar_descriptor`] from [`ModelType::type_descriptor`], which
/// the [`scalar_type!`](crate::scalar_type) macro does for them.
pub trait Scalar: ModelType {
    /// Canonical textual form.
    fn to_text(&self) -> Result<Cow<'_, str>>;

    /// Parses the textual form.
    fn from_text(text: &str) -> Result<Self>;
}

/// Descriptor of a scalar type.
pub fn scalar_descriptor<T: Scalar>() -> TypeDescriptor {
    TypeDescriptor::new::<T>(TypeKind::Scalar(ScalarVTable {
        to_text: scalar_to_text::<T>,
        from_text: scalar_from_text::<T>,
    }))
}

fn scalar_to_text<T: Scalar>(value: &dyn Reflect) -> Result<String> {
    let scalar = value.downcast_ref::<T>().ok_or_else(|| {
        Error::type_mismatch(type_name::<T>(), value.reflect_descriptor().type_path())
    })?;
    Ok(scalar.to_text()?.into_owned())
}

fn scalar_from_text<T: Scalar>(text: &str) -> Result<Box<dyn Reflect>> {
    Ok(Box::new(T::from_text(text)?))
}

/// Converts a value to its textual form.
///
/// `Option` and [`Object`] are looked through; `None` fails with a null
/// value error and anything that is not a scalar is unconvertible.
pub fn to_text(value: &dyn Reflect) -> Result<String> {
    let descriptor = value.reflect_descriptor();
    match descriptor.kind() {
        TypeKind::Scalar(vt) => (vt.to_text)(value),
        TypeKind::Nullable(vt) => match (vt.get)(value) {
            Some(inner) => to_text(inner),
            None => Err(Error::null_value()),
        },
        TypeKind::Object => match value.downcast_ref::<Object>() {
            Some(object) => to_text(object.get()),
            None => Err(Error::unconvertible(descriptor.type_path())),
        },
        _ => Err(Error::unconvertible(descriptor.type_path())),
    }
}

/// Converts text to a value of the `target` type.
///
/// An [`Object`] target receives the text as a boxed `String`.
pub fn from_text(text: &str, target: TypeDescriptor) -> Result<Box<dyn Reflect>> {
    match target.kind() {
        TypeKind::Scalar(vt) => (vt.from_text)(text),
        TypeKind::Nullable(vt) => (vt.wrap)(from_text(text, vt.inner())?),
        TypeKind::Object => Ok(Box::new(Object::new(text.to_string()))),
        _ => Err(Error::unconvertible(target.type_path())),
    }
}

/// Rejects empty or whitespace-only text for non-string scalars.
fn non_empty<T>(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(Error::format(type_name::<T>(), text, "empty value"));
    }
    Ok(trimmed)
}

macro_rules! integer_scalars {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ModelType for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    scalar_descriptor::<$ty>()
                }

                fn instantiate() -> Option<Self> {
                    Some(0)
                }
            }

            impl Scalar for $ty {
                fn to_text(&self) -> Result<Cow<'_, str>> {
                    let mut buffer = itoa::Buffer::new();
                    Ok(Cow::Owned(buffer.format(*self).to_string()))
                }

                fn from_text(text: &str) -> Result<Self> {
                    non_empty::<$ty>(text)?
                        .parse::<$ty>()
                        .map_err(|e| Error::format(type_name::<$ty>(), text, e))
                }
            }
        )*
    };
}

integer_scalars!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! float_scalars {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ModelType for $ty {
                fn type_descriptor() -> TypeDescriptor {
                    scalar_descriptor::<$ty>()
                }

                fn instantiate() -> Option<Self> {
                    Some(0.0)
                }
            }

            impl Scalar for $ty {
                fn to_text(&self) -> Result<Cow<'_, str>> {
                    let mut buffer = ryu::Buffer::new();
                    Ok(Cow::Owned(buffer.format(*self).to_string()))
                }

                fn from_text(text: &str) -> Result<Self> {
                    non_empty::<$ty>(text)?
                        .parse::<$ty>()
                        .map_err(|e| Error::format(type_name::<$ty>(), text, e))
                }
            }
        )*
    };
}

float_scalars!(f32, f64);

impl ModelType for bool {
    fn type_descriptor() -> TypeDescriptor {
        scalar_descriptor::<bool>()
    }

    fn instantiate() -> Option<Self> {
        Some(false)
    }
}

impl Scalar for bool {
    fn to_text(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(if *self { "true" } else { "false" }))
    }

    fn from_text(text: &str) -> Result<Self> {
        let trimmed = non_empty::<bool>(text)?;
        if trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(Error::format("bool", text, "expected true or false"))
        }
    }
}

impl ModelType for char {
    fn type_descriptor() -> TypeDescriptor {
        scalar_descriptor::<char>()
    }

    fn instantiate() -> Option<Self> {
        Some('\0')
    }
}

impl Scalar for char {
    fn to_text(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Owned(self.to_string()))
    }

    fn from_text(text: &str) -> Result<Self> {
        let mut chars = non_empty::<char>(text)?.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(Error::format("char", text, "expected exactly one character")),
        }
    }
}

impl ModelType for String {
    fn type_descriptor() -> TypeDescriptor {
        scalar_descriptor::<String>()
    }

    fn instantiate() -> Option<Self> {
        Some(String::new())
    }
}

impl Scalar for String {
    fn to_text(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(self.as_str()))
    }

    fn from_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }
}

/// Descriptors of the scalars every model knows without registration.
pub(crate) fn builtin_scalars() -> [TypeDescriptor; 17] {
    [
        TypeDescriptor::of::<bool>(),
        TypeDescriptor::of::<char>(),
        TypeDescriptor::of::<i8>(),
        TypeDescriptor::of::<i16>(),
        TypeDescriptor::of::<i32>(),
        TypeDescriptor::of::<i64>(),
        TypeDescriptor::of::<i128>(),
        TypeDescriptor::of::<isize>(),
        TypeDescriptor::of::<u8>(),
        TypeDescriptor::of::<u16>(),
        TypeDescriptor::of::<u32>(),
        TypeDescriptor::of::<u64>(),
        TypeDescriptor::of::<u128>(),
        TypeDescriptor::of::<usize>(),
        TypeDescriptor::of::<f32>(),
        TypeDescriptor::of::<f64>(),
        TypeDescriptor::of::<String>(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Color {
        Red,
        Green,
    }

    crate::scalar_type!(Color);

    impl Scalar for Color {
        fn to_text(&self) -> Result<Cow<'_, str>> {
            Ok(Cow::Borrowed(match self {
                Color::Red => "Red",
                Color::Green => "Green",
            }))
        }

        fn from_text(text: &str) -> Result<Self> {
            match text {
                "Red" => Ok(Color::Red),
                "Green" => Ok(Color::Green),
                _ => Err(Error::format("Color", text, "unknown variant")),
            }
        }
    }

    #[test]
    fn test_integers() {
        assert_eq!(to_text(&-42i32).unwrap(), "-42");
        assert_eq!(to_text(&u128::MAX).unwrap(), u128::MAX.to_string());
        let value = from_text(" 17 ", TypeDescriptor::of::<u8>()).unwrap();
        assert_eq!(value.downcast_ref::<u8>(), Some(&17));
    }

    #[test]
    fn test_integer_overflow_is_format_error() {
        let err = from_text("300", TypeDescriptor::of::<u8>()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Format { .. }));
    }

    #[test]
    fn test_floats() {
        assert_eq!(to_text(&1.5f64).unwrap(), "1.5");
        assert_eq!(to_text(&2.0f32).unwrap(), "2.0");
        let value = from_text("2.25", TypeDescriptor::of::<f64>()).unwrap();
        assert_eq!(value.downcast_ref::<f64>(), Some(&2.25));
    }

    #[test]
    fn test_bool_is_case_insensitive() {
        assert_eq!(to_text(&true).unwrap(), "true");
        for text in ["true", "True", "TRUE"] {
            let value = from_text(text, TypeDescriptor::of::<bool>()).unwrap();
            assert_eq!(value.downcast_ref::<bool>(), Some(&true));
        }
        assert!(from_text("yes", TypeDescriptor::of::<bool>()).is_err());
    }

    #[test]
    fn test_empty_text_only_converts_to_string() {
        let value = from_text("", TypeDescriptor::of::<String>()).unwrap();
        assert_eq!(value.downcast_ref::<String>().map(String::as_str), Some(""));

        for target in [
            TypeDescriptor::of::<i32>(),
            TypeDescriptor::of::<bool>(),
            TypeDescriptor::of::<char>(),
            TypeDescriptor::of::<f64>(),
        ] {
            let err = from_text("   ", target).unwrap_err();
            assert!(err.is_conversion(), "{} accepted blank text", target);
        }
    }

    #[test]
    fn test_char() {
        assert_eq!(to_text(&'x').unwrap(), "x");
        assert!(from_text("xy", TypeDescriptor::of::<char>()).is_err());
    }

    #[test]
    fn test_nullable_and_object() {
        let value = from_text("5", TypeDescriptor::of::<Option<i64>>()).unwrap();
        assert_eq!(value.downcast_ref::<Option<i64>>(), Some(&Some(5)));
        assert_eq!(to_text(&Some(5i64)).unwrap(), "5");
        assert!(matches!(to_text(&None::<i64>).unwrap_err().kind(), ErrorKind::NullValue));

        let object = from_text("hi", TypeDescriptor::of::<Object>()).unwrap();
        assert_eq!(
            object.downcast_ref::<Object>().and_then(|o| o.downcast_ref::<String>()),
            Some(&"hi".to_string())
        );
        assert_eq!(to_text(&Object::new(3u16)).unwrap(), "3");
    }

    #[test]
    fn test_non_scalar_is_unconvertible() {
        let err = to_text(&vec![1i32]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Unconvertible(_)));
        let err = from_text("1", TypeDescriptor::of::<Vec<i32>>()).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Unconvertible(_)));
    }

    #[test]
    fn test_custom_scalar() {
        assert_eq!(to_text(&Color::Green).unwrap(), "Green");
        let value = from_text("Red", TypeDescriptor::of::<Color>()).unwrap();
        assert_eq!(value.downcast_ref::<Color>(), Some(&Color::Red));
        assert_eq!(TypeDescriptor::of::<Color>().type_ident(), "Color");
    }
}
