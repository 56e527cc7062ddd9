//! Native closures and the binding of host callables.
//!
//! A [`Function`] is a native entry point plus a list of upvalues. Host
//! callables are bound by [`Function::new_typed`] (or
//! [`push_callable`]): the callable becomes the closure's only upvalue and
//! the entry point is the adapter generated for its exact type.

pub(crate) mod dispatch;
pub(crate) mod entry;
pub(crate) mod host;
pub(crate) mod typed;

use std::fmt;
use std::rc::Rc;

use stackbind_types::{RuntimeError, Signature, MULTRET};

use crate::{AnyUserData, ParamList, State, Value};

pub use self::host::{
    field, FieldAccessor, FreeFn, HostCallable, HostCallableKind, Member, Method, MethodMut,
    WithState,
};
pub use self::typed::{FromResults, TypedFunction};

/// The signature of every native entry point.
///
/// The entry point runs with its arguments at stack positions `1..=top`
/// and returns how many values it pushed as results.
pub type NativeFn = fn(&mut State) -> Result<usize, RuntimeError>;

struct Closure {
    entry: NativeFn,
    upvalues: Box<[Value]>,
    signature: Option<Signature>,
}

/// A native closure value.
#[derive(Clone)]
pub struct Function(Rc<Closure>);

impl Function {
    /// Creates a closure over `entry` with the given upvalues.
    pub fn new_native(entry: NativeFn, upvalues: Vec<Value>) -> Self {
        Self(Rc::new(Closure {
            entry,
            upvalues: upvalues.into_boxed_slice(),
            signature: None,
        }))
    }

    /// Binds a host callable.
    ///
    /// The callable's kind, parameters and result are derived from its
    /// type; see [`HostCallable`] for the supported shapes.
    ///
    /// ```
    /// use stackbind::{Function, State};
    ///
    /// fn add(a: i64, b: i64) -> i64 {
    ///     a + b
    /// }
    ///
    /// let mut state = State::new();
    /// let add = Function::new_typed(add);
    /// let sum: i64 = add.typed::<(i64, i64), i64>().call(&mut state, 2, 3)?;
    /// assert_eq!(sum, 5);
    /// # Ok::<(), stackbind::RuntimeError>(())
    /// ```
    ///
    /// Parameters are passed by value; a callable taking a mutable
    /// reference cannot be bound:
    ///
    /// ```compile_fail
    /// use stackbind::Function;
    ///
    /// fn bump(counter: &mut i64) {
    ///     *counter += 1;
    /// }
    ///
    /// let _ = Function::new_typed(bump);
    /// ```
    pub fn new_typed<K, Args, R, F>(callable: F) -> Self
    where
        F: HostCallable<K, Args, R>,
        K: HostCallableKind,
        Args: ParamList,
    {
        let signature = F::signature();
        tracing::debug!(%signature, "binding host callable");
        Self(Rc::new(Closure {
            entry: entry::entry_point::<K, Args, R, F>,
            upvalues: Box::new([Value::UserData(AnyUserData::new(callable))]),
            signature: Some(signature),
        }))
    }

    /// The descriptor of the bound callable, if this closure was created
    /// by [`Function::new_typed`].
    pub fn signature(&self) -> Option<&Signature> {
        self.0.signature.as_ref()
    }

    /// The closure's upvalues.
    pub fn upvalues(&self) -> &[Value] {
        &self.0.upvalues
    }

    pub(crate) fn entry(&self) -> NativeFn {
        self.0.entry
    }

    /// Calls the function with dynamically typed arguments and returns
    /// every result.
    pub fn call(&self, state: &mut State, args: &[Value]) -> Result<Vec<Value>, RuntimeError> {
        state.check_stack(args.len() + 1)?;
        let base = state.top();
        state.push(self.clone());
        for arg in args {
            state.push(arg.clone());
        }
        state.call(args.len(), MULTRET)?;
        Ok(state.drain_from(base))
    }

    /// Returns a typed view of this function.
    ///
    /// The types are not checked against the bound signature; a mismatch
    /// surfaces as default-valued arguments or a
    /// [`RuntimeError::ResultCount`] when calling.
    pub fn typed<Args, Rets>(&self) -> TypedFunction<Args, Rets> {
        TypedFunction::new(self.clone())
    }

    /// Checks whether two handles refer to the same closure.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.signature {
            Some(signature) => write!(f, "{signature}@{:p}", self.as_ptr()),
            None => write!(f, "native@{:p}", self.as_ptr()),
        }
    }
}

/// Binds a host callable and pushes the resulting closure onto the stack.
///
/// The closure's only upvalue is the callable itself; its entry point is
/// the adapter generated for `F`, so no further metadata is needed to
/// call it.
pub fn push_callable<K, Args, R, F>(state: &mut State, callable: F) -> Result<(), RuntimeError>
where
    F: HostCallable<K, Args, R>,
    K: HostCallableKind,
    Args: ParamList,
{
    state.check_stack(1)?;
    state.push(Function::new_typed(callable));
    Ok(())
}
