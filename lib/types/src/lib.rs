//! Common types shared by the `stackbind` crates: the runtime's value
//! type tags, callable signatures, stack index helpers and the error
//! types raised across the host/script boundary.
//!
//! This crate has no notion of a running state; it only describes
//! what the runtime and the binding layer talk about.

#![deny(missing_docs, unused_extern_crates)]
#![warn(unused_import_braces)]
#![allow(clippy::new_without_default)]
#![warn(
    clippy::mut_mut,
    clippy::nonminimal_bool,
    clippy::map_unwrap_or,
    clippy::print_stdout,
    clippy::unicode_not_nfc,
    clippy::use_self
)]

pub mod error;
mod index;
mod types;

pub use crate::error::{BoxError, RuntimeError};
pub use crate::index::{
    is_upvalue_index, upvalue_index, upvalue_slot, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STACK,
    MULTRET, UPVALUE_BASE,
};
pub use crate::types::{CallableKind, Signature, Type};

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
