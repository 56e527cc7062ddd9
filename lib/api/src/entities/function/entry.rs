use std::any::type_name;
use std::rc::Rc;

use stackbind_types::{upvalue_index, RuntimeError};

use super::host::{HostCallable, HostCallableKind};
use crate::{ParamList, State};

/// The native target of every closure built by the binder.
///
/// Monomorphized per callable type, so the callable stored in upvalue 1
/// is always recovered as exactly `F`.
pub(crate) fn entry_point<K, Args, R, F>(state: &mut State) -> Result<usize, RuntimeError>
where
    F: HostCallable<K, Args, R>,
    K: HostCallableKind,
    Args: ParamList,
{
    let Some(callable) = recover::<F>(state) else {
        tracing::error!(
            callable = type_name::<F>(),
            "native closure invoked without its bound callable"
        );
        return Err(RuntimeError::MissingCallable);
    };
    tracing::trace!(
        kind = ?K::KIND,
        params = Args::COUNT,
        args = state.top(),
        "dispatching host callable"
    );
    callable.dispatch(state)
}

fn recover<F: 'static>(state: &State) -> Option<Rc<F>> {
    state.get(upvalue_index(1))?.userdata()?.downcast::<F>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Function, Value};
    use tracing_test::traced_test;

    fn double(x: i64) -> i64 {
        x * 2
    }

    #[test]
    #[traced_test]
    fn closure_without_callable_is_an_error() {
        let mut state = State::new();
        state.push(Function::new_native(
            entry_point::<crate::FreeFn, (i64,), i64, fn(i64) -> i64>,
            vec![],
        ));
        state.push(4);
        let err = state.call(1, 1).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingCallable));
        assert_eq!(state.top(), 0);
        assert!(logs_contain("native closure invoked without its bound callable"));
    }

    #[test]
    fn callable_of_another_type_is_an_error() {
        let mut state = State::new();
        state.push(Function::new_native(
            entry_point::<crate::FreeFn, (i64,), i64, fn(i64) -> i64>,
            vec![Value::from("not a callable")],
        ));
        let err = state.call(0, 0).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingCallable));
    }

    #[test]
    fn stored_callable_is_dispatched() {
        let mut state = State::new();
        state.push(Value::UserData(crate::AnyUserData::new(
            double as fn(i64) -> i64,
        )));
        state
            .push_closure(
                entry_point::<crate::FreeFn, (i64,), i64, fn(i64) -> i64>,
                1,
            )
            .unwrap();
        state.push(21);
        assert_eq!(state.call(1, 1).unwrap(), 1);
        assert_eq!(state.get(-1), Some(&Value::Integer(42)));
    }
}
