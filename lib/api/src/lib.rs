#![deny(
    missing_docs,
    unused_extern_crates,
    rustdoc::broken_intra_doc_links
)]
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

//! `stackbind` binds Rust callables into a small stack-based scripting
//! runtime without per-callable marshalling code.
//!
//! A callable's shape is classified from its type alone: free functions,
//! functions receiving the running [`State`], methods and field
//! accessors. Binding one produces a native closure whose only upvalue is
//! the callable itself and whose entry point is generated for that exact
//! type.
//!
//! ```
//! use stackbind::{field, Library, Object, State, UserType};
//!
//! struct Person {
//!     name: String,
//!     age: i64,
//! }
//!
//! impl UserType for Person {}
//!
//! impl Person {
//!     fn greet(&self, greeting: String) -> String {
//!         format!("{greeting}, {}", self.name)
//!     }
//! }
//!
//! let mut lib = Library::named("person");
//! lib.bind("greet", Person::greet);
//! lib.bind("age", field(|p: &Person| &p.age));
//!
//! let mut state = State::new();
//! lib.register(&mut state)?;
//!
//! // person.greet(ann, "Hello")
//! state.get_global("person");
//! state.get_field(-1, "greet")?;
//! state.push(Object::new(Person { name: "Ann".into(), age: 31 }));
//! state.push("Hello");
//! state.call(2, 1)?;
//! assert_eq!(state.get(-1).and_then(|v| v.string()), Some("Hello, Ann"));
//! # Ok::<(), stackbind::RuntimeError>(())
//! ```
//!
//! # Table of Contents
//!
//! - [Binding](#binding)
//! - [Conversions](#conversions)
//! - [Logging](#logging)
//!
//! # Binding
//!
//! [`Function::new_typed`] and [`push_callable`] accept:
//!
//! - `Fn(A1, .., An) -> R`, read from stack positions `1..=n`;
//! - `Fn(&mut State, A1, .., An) -> R`, which may call back into the state;
//! - `Fn(&O, A1, ..) -> R` and `Fn(&mut O, A1, ..) -> R` where `O:
//!   UserType`, with the receiver at position 1 as an [`Object<O>`];
//! - [`field`] accessors, which read one field of the receiver.
//!
//! Up to 16 parameters are supported. Parameters are taken by value and
//! must implement [`Parameter`]; a missing or unconvertible argument
//! reads as the parameter's default. `R` is `()`, any [`ToStack`] type,
//! or a `Result` whose error is raised to the caller.
//!
//! # Conversions
//!
//! [`ToStack`] and [`FromStack`] convert host values to and from stack
//! slots. They are implemented for the primitive numbers, `bool`,
//! strings, [`Option`], [`Value`], [`Table`], [`Function`],
//! [`AnyUserData`] and [`Object`].
//!
//! # Logging
//!
//! The crate logs through [`tracing`]: bindings and registrations at
//! debug level, every dispatch at trace level and broken invariants at
//! error level.

#[macro_use]
mod utils;

mod config;
mod entities;
mod value;

pub use crate::config::{Config, ConfigError, ReceiverPolicy};
pub use crate::entities::*;
pub use crate::utils::native::{FromStack, IntoResults, ParamList, Parameter, ToStack};
pub use crate::value::Value;

pub use stackbind_types::{
    is_upvalue_index, upvalue_index, upvalue_slot, BoxError, CallableKind, RuntimeError,
    Signature, Type, DEFAULT_MAX_CALL_DEPTH, DEFAULT_MAX_STACK, MULTRET, UPVALUE_BASE,
};

/// Version number of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
