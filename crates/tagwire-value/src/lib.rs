//! Dynamically-tagged value model.
//!
//! A [`Variant`] holds exactly one of eight payload kinds. Accessors are
//! strict: asking for a payload the variant does not carry is a
//! [`ValueError::TypeMismatch`], never an implicit conversion.

pub mod error;
#[cfg(feature = "json")]
pub mod json;
pub mod variant;

pub use error::{Result, ValueError};
pub use variant::{Variant, VariantList, VariantMap, VariantType};
