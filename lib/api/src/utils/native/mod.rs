//! Conversions between host values and stack slots, and the traits that
//! describe the parameters and results of host callables.

mod convert;
mod params;

pub(crate) use convert::float_to_integer;
pub use convert::{FromStack, ToStack};
pub use params::{IntoResults, ParamList, Parameter};
