//! One routine per callable kind. Each reads the arguments of the running
//! call in ascending stack order, invokes the callable and writes the
//! result through [`IntoResults`].

use stackbind_types::{RuntimeError, Type};

use crate::{FromStack, IntoResults, Object, ParamList, ReceiverPolicy, State, ToStack, UserType};

pub(crate) fn call_free<Args, R>(
    state: &mut State,
    invoke: impl FnOnce(Args) -> R,
) -> Result<usize, RuntimeError>
where
    Args: ParamList,
    R: IntoResults,
{
    let args = Args::read_from(state, 1);
    invoke(args).push_results(state)
}

pub(crate) fn call_with_state<Args, R>(
    state: &mut State,
    invoke: impl FnOnce(&mut State, Args) -> R,
) -> Result<usize, RuntimeError>
where
    Args: ParamList,
    R: IntoResults,
{
    let args = Args::read_from(state, 1);
    invoke(state, args).push_results(state)
}

pub(crate) fn call_method<O, Args, R>(
    state: &mut State,
    invoke: impl FnOnce(&O, Args) -> R,
) -> Result<usize, RuntimeError>
where
    O: UserType,
    Args: ParamList,
    R: IntoResults,
{
    let Some(object) = receiver::<O>(state) else {
        return missing_receiver::<O>(state);
    };
    let Ok(this) = object.try_borrow() else {
        return missing_receiver::<O>(state);
    };
    let args = Args::read_from(state, 2);
    let result = invoke(&this, args);
    drop(this);
    result.push_results(state)
}

pub(crate) fn call_method_mut<O, Args, R>(
    state: &mut State,
    invoke: impl FnOnce(&mut O, Args) -> R,
) -> Result<usize, RuntimeError>
where
    O: UserType,
    Args: ParamList,
    R: IntoResults,
{
    let Some(object) = receiver::<O>(state) else {
        return missing_receiver::<O>(state);
    };
    let Ok(mut this) = object.try_borrow_mut() else {
        return missing_receiver::<O>(state);
    };
    let args = Args::read_from(state, 2);
    let result = invoke(&mut this, args);
    drop(this);
    result.push_results(state)
}

/// Field accessors ignore every argument after the receiver.
pub(crate) fn read_field<O, V>(
    state: &mut State,
    project: impl FnOnce(&O) -> &V,
) -> Result<usize, RuntimeError>
where
    O: UserType,
    V: ToStack + Clone,
{
    let Some(object) = receiver::<O>(state) else {
        return missing_receiver::<O>(state);
    };
    let Ok(this) = object.try_borrow() else {
        return missing_receiver::<O>(state);
    };
    let value = project(&this).clone();
    drop(this);
    state.check_stack(1)?;
    Ok(value.to_stack(state))
}

fn receiver<O: UserType>(state: &State) -> Option<Object<O>> {
    Object::<O>::try_from_stack(state, 1)
}

fn missing_receiver<O: UserType>(state: &State) -> Result<usize, RuntimeError> {
    let owner = O::type_name();
    match state.config().missing_receiver {
        ReceiverPolicy::Skip => {
            tracing::debug!(
                owner,
                found = state.type_at(1).map_or("none", Type::name),
                "skipping member call without a valid receiver"
            );
            Ok(0)
        }
        ReceiverPolicy::Raise => Err(RuntimeError::MissingReceiver { owner }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Config, Value};
    use tracing_test::traced_test;

    struct Counter {
        hits: u32,
    }

    impl UserType for Counter {}

    #[test]
    #[traced_test]
    fn invalid_receiver_skips_the_call() {
        let mut state = State::new();
        state.push(5);
        let mut invoked = false;
        let produced = call_method::<Counter, (), _>(&mut state, |_, ()| {
            invoked = true;
            1u32
        })
        .unwrap();
        assert_eq!(produced, 0);
        assert!(!invoked);
        assert_eq!(state.top(), 1);
        assert!(logs_contain("skipping member call without a valid receiver"));
    }

    #[test]
    fn invalid_receiver_can_raise() {
        let config = Config {
            missing_receiver: ReceiverPolicy::Raise,
            ..Config::default()
        };
        let mut state = State::with_config(config);
        let err = call_method::<Counter, (), _>(&mut state, |c, ()| c.hits).unwrap_err();
        assert!(matches!(err, RuntimeError::MissingReceiver { .. }));
    }

    #[test]
    fn receiver_borrowed_elsewhere_is_missing() {
        let mut state = State::new();
        let counter = Object::new(Counter { hits: 0 });
        state.push(counter.to_userdata());
        let _held = counter.borrow();
        let produced =
            call_method_mut::<Counter, (), _>(&mut state, |c, ()| c.hits += 1).unwrap();
        assert_eq!(produced, 0);
    }

    #[test]
    fn method_parameters_start_after_the_receiver() {
        let mut state = State::new();
        let counter = Object::new(Counter { hits: 1 });
        state.push(counter.to_userdata());
        state.push(10);
        state.push(Value::Nil);
        let produced = call_method_mut::<Counter, (u32, u32), _>(&mut state, |c, (a, b)| {
            c.hits += a + b;
            c.hits
        })
        .unwrap();
        assert_eq!(produced, 1);
        assert_eq!(state.get(-1), Some(&Value::Integer(11)));
        assert_eq!(counter.borrow().hits, 11);
    }
}
