//! This module defines the runtime entities: the [`State`] a host call
//! runs on, the values it manipulates such as [`Table`] and [`Function`],
//! and the [`Library`] builder that registers host callables into it.

pub(crate) mod function;
pub use function::*;

pub(crate) mod library;
pub use library::*;

pub(crate) mod state;
pub use state::*;

pub(crate) mod table;
pub use table::*;

pub(crate) mod userdata;
pub use userdata::*;
