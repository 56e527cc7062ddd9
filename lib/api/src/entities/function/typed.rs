//! Native Functions.
//!
//! This module creates the helper `TypedFunction` that let us call host
//! functions from the host with statically typed arguments and results.
//!
//! ```
//! use stackbind::{Function, State};
//!
//! let mut state = State::new();
//! let greet = Function::new_typed(|name: String| format!("hello {name}"));
//! let greeting: String = greet.typed::<String, String>().call(&mut state, "Ann".into())?;
//! assert_eq!(greeting, "hello Ann");
//! # Ok::<(), stackbind::RuntimeError>(())
//! ```
use std::marker::PhantomData;

use stackbind_types::{RuntimeError, Type, MULTRET};

use crate::{FromStack, Function, State, ToStack};

/// The `FromResults` trait reads the results of a typed call.
///
/// `()` expects no result and any [`FromStack`] type expects exactly one.
pub trait FromResults: Sized {
    /// Number of result slots expected.
    const COUNT: usize;

    /// Reads the results, the first one from stack position `first`.
    fn from_results(state: &State, first: i32) -> Result<Self, RuntimeError>;
}

impl FromResults for () {
    const COUNT: usize = 0;

    fn from_results(_state: &State, _first: i32) -> Result<Self, RuntimeError> {
        Ok(())
    }
}

impl<T: FromStack> FromResults for T {
    const COUNT: usize = 1;

    fn from_results(state: &State, first: i32) -> Result<Self, RuntimeError> {
        T::try_from_stack(state, first).ok_or_else(|| RuntimeError::ResultType {
            expected: T::TYPE,
            got: state.type_at(first).unwrap_or(Type::Nil),
        })
    }
}

/// A [`Function`] with statically known argument and result types.
///
/// Built by [`Function::typed`]. A single argument is written `A`, several
/// as a tuple `(A, B)`, none as `()`.
pub struct TypedFunction<Args, Rets> {
    func: Function,
    _phantom: PhantomData<fn(Args) -> Rets>,
}

impl<Args, Rets> Clone for TypedFunction<Args, Rets> {
    fn clone(&self) -> Self {
        Self {
            func: self.func.clone(),
            _phantom: PhantomData,
        }
    }
}

impl<Args, Rets> TypedFunction<Args, Rets> {
    pub(crate) fn new(func: Function) -> Self {
        Self {
            func,
            _phantom: PhantomData,
        }
    }

    /// The underlying untyped function.
    pub fn function(&self) -> &Function {
        &self.func
    }

    /// Collects `got` results starting at frame position `base + 1` and
    /// clears them from the stack.
    fn finish(&self, state: &mut State, base: usize, got: usize) -> Result<Rets, RuntimeError>
    where
        Rets: FromResults,
    {
        let result = if got == Rets::COUNT {
            Rets::from_results(state, base as i32 + 1)
        } else {
            Err(RuntimeError::ResultCount {
                expected: Rets::COUNT,
                got,
            })
        };
        state.set_top(base);
        result
    }
}

impl<Args, Rets> std::fmt::Debug for TypedFunction<Args, Rets> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TypedFunction").field(&self.func).finish()
    }
}

macro_rules! impl_native_traits {
    ( $( $x:ident ),* ) => {
        #[allow(unused_parens, non_snake_case)]
        impl<$( $x , )* Rets> TypedFunction<( $( $x ),* ), Rets>
        where
            $( $x: ToStack, )*
            Rets: FromResults,
        {
            /// Call the typed function and return its result.
            #[allow(clippy::too_many_arguments)]
            pub fn call(&self, state: &mut State, $( $x: $x, )* ) -> Result<Rets, RuntimeError> {
                state.check_stack(count_idents!( $( $x ),* ) + 1)?;
                let base = state.top();
                state.push(self.func.clone());
                $( $x.to_stack(state); )*
                let nargs = state.top() - base - 1;
                let got = state.call(nargs, MULTRET)?;
                self.finish(state, base, got)
            }
        }
    };
}

for_each_arity!(impl_native_traits);
