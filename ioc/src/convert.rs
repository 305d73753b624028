//! The string-to-typed-value converter collaborator.

use std::any::{Any, TypeId};

/// Converts raw parameter strings into typed values for value-typed
/// properties. Supplied by the host; [`StdConverter`] covers the primitive
/// scalars and `String`.
pub trait Converter: Send + Sync {
  /// Converts `raw` into a boxed value of the `target` type, or an error
  /// reason when no conversion applies.
  fn convert(&self, raw: &str, target: TypeId) -> Result<Box<dyn Any + Send + Sync>, String>;
}

/// The default converter: `String`, `bool`, `char`, the integer primitives
/// and the floats, parsed from the trimmed raw value.
pub struct StdConverter;

impl StdConverter {
  fn parse_into<T>(raw: &str) -> Result<Box<dyn Any + Send + Sync>, String>
  where
    T: std::str::FromStr + Any + Send + Sync,
    T::Err: std::fmt::Display,
  {
    raw
      .trim()
      .parse::<T>()
      .map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
      .map_err(|e| e.to_string())
  }
}

impl Converter for StdConverter {
  fn convert(&self, raw: &str, target: TypeId) -> Result<Box<dyn Any + Send + Sync>, String> {
    if target == TypeId::of::<String>() {
      return Ok(Box::new(raw.to_string()));
    }
    macro_rules! try_parse {
      ($($t:ty),* $(,)?) => {
        $(
          if target == TypeId::of::<$t>() {
            return Self::parse_into::<$t>(raw);
          }
        )*
      };
    }
    try_parse!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
    Err("no standard conversion for the declared property type".to_string())
  }
}
