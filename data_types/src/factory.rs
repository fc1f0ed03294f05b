//! Static converter selection from a default value.
//!
//! A default of a primitive Rust type picks its converter at compile time.
//! `None` defaults are rejected because they carry no element type; use
//! [`Optional::absent`](crate::Optional::absent) instead.

use crate::converter::Converter;
use crate::datetime::{DateTime, DateTimeValue};
use crate::duration::TimeDelta;
use crate::list::List;
use crate::optional::Optional;
use crate::primitive::{Boolean, Float, Integer, Text};
use chrono::{FixedOffset, NaiveDateTime, Utc};
use errors::InvalidDefaultError;
use std::fmt;

pub trait IntoConverter {
    type Converter: Converter;

    fn into_converter(self) -> Result<Self::Converter, InvalidDefaultError>;
}

impl IntoConverter for bool {
    type Converter = Boolean;

    fn into_converter(self) -> Result<Boolean, InvalidDefaultError> {
        Ok(Boolean::new(self))
    }
}

macro_rules! integer_defaults {
    ($($ty:ty),*) => {
        $(
            impl IntoConverter for $ty {
                type Converter = Integer;

                fn into_converter(self) -> Result<Integer, InvalidDefaultError> {
                    Ok(Integer::new(i64::from(self)))
                }
            }
        )*
    };
}

integer_defaults!(i64, i32, i16, i8, u32, u16, u8);

impl IntoConverter for f64 {
    type Converter = Float;

    fn into_converter(self) -> Result<Float, InvalidDefaultError> {
        Ok(Float::new(self))
    }
}

impl IntoConverter for f32 {
    type Converter = Float;

    fn into_converter(self) -> Result<Float, InvalidDefaultError> {
        Ok(Float::new(f64::from(self)))
    }
}

impl IntoConverter for String {
    type Converter = Text;

    fn into_converter(self) -> Result<Text, InvalidDefaultError> {
        Ok(Text::new(self))
    }
}

impl IntoConverter for &str {
    type Converter = Text;

    fn into_converter(self) -> Result<Text, InvalidDefaultError> {
        Ok(Text::new(self))
    }
}

impl IntoConverter for DateTimeValue {
    type Converter = DateTime;

    fn into_converter(self) -> Result<DateTime, InvalidDefaultError> {
        Ok(DateTime::new(self))
    }
}

impl IntoConverter for NaiveDateTime {
    type Converter = DateTime;

    fn into_converter(self) -> Result<DateTime, InvalidDefaultError> {
        Ok(DateTime::new(self))
    }
}

impl IntoConverter for chrono::DateTime<FixedOffset> {
    type Converter = DateTime;

    fn into_converter(self) -> Result<DateTime, InvalidDefaultError> {
        Ok(DateTime::new(self))
    }
}

impl IntoConverter for chrono::DateTime<Utc> {
    type Converter = DateTime;

    fn into_converter(self) -> Result<DateTime, InvalidDefaultError> {
        Ok(DateTime::new(self))
    }
}

impl IntoConverter for chrono::TimeDelta {
    type Converter = TimeDelta;

    fn into_converter(self) -> Result<TimeDelta, InvalidDefaultError> {
        Ok(TimeDelta::new(self))
    }
}

impl<T> IntoConverter for Vec<T>
where
    T: IntoConverter + Clone + fmt::Debug + PartialEq + Send,
    T::Converter: Converter<Value = T>,
{
    type Converter = List<T::Converter>;

    fn into_converter(self) -> Result<Self::Converter, InvalidDefaultError> {
        List::infer(self)
    }
}

impl<T: IntoConverter> IntoConverter for Option<T> {
    type Converter = Optional<T::Converter>;

    fn into_converter(self) -> Result<Self::Converter, InvalidDefaultError> {
        match self {
            Some(value) => Ok(Optional::new(value.into_converter()?)),
            None => Err(InvalidDefaultError::UntypedNone),
        }
    }
}
