#[macro_use]
mod macros;
pub(crate) mod native;
