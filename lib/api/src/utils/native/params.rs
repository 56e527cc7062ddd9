use stackbind_types::{BoxError, RuntimeError, Type};

use super::convert::{FromStack, ToStack};
use crate::State;

/// A type that can be passed by value to a host callable.
///
/// Every [`FromStack`] type with a [`Default`] qualifies; the default is
/// used when the argument is missing or does not convert. References,
/// mutable or not, never qualify.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be passed to a host callable",
    label = "not a by-value parameter",
    note = "parameters must implement `FromStack` and `Default`; reference parameters are not supported"
)]
pub trait Parameter: FromStack + Default {}

impl<T: FromStack + Default> Parameter for T {}

/// The `ParamList` trait represents a tuple (list) of parameters, read
/// from consecutive stack positions.
pub trait ParamList: Sized {
    /// Number of parameters.
    const COUNT: usize;

    /// Type tags of the parameters, in declaration order.
    fn types() -> Vec<Type>;

    /// Reads every parameter, the first one from stack position `first`.
    ///
    /// Positions are read strictly in ascending order.
    fn read_from(state: &State, first: i32) -> Self;
}

macro_rules! impl_param_list {
    ( $( $x:ident ),* ) => {
        impl< $( $x: Parameter ),* > ParamList for ( $( $x, )* ) {
            const COUNT: usize = count_idents!( $( $x ),* );

            fn types() -> Vec<Type> {
                vec![ $( <$x as FromStack>::TYPE ),* ]
            }

            #[allow(unused_variables, unused_mut, unused_assignments, clippy::unused_unit)]
            fn read_from(state: &State, first: i32) -> Self {
                let mut index = first;
                (
                    $(
                        {
                            let value = <$x as FromStack>::from_stack(state, index, $x::default());
                            index += 1;
                            value
                        },
                    )*
                )
            }
        }
    };
}

for_each_arity!(impl_param_list);

/// The `IntoResults` trait describes what a host callable returns and how
/// it is written back to the stack.
///
/// `()` writes nothing, any [`ToStack`] value writes its slots, and a
/// `Result` writes its `Ok` value or raises its `Err` value to the caller
/// of [`State::call`].
pub trait IntoResults {
    /// The result type tag, `None` when nothing is written.
    const TYPE: Option<Type>;

    /// Writes the result and returns how many slots were written.
    fn push_results(self, state: &mut State) -> Result<usize, RuntimeError>;
}

impl IntoResults for () {
    const TYPE: Option<Type> = None;

    fn push_results(self, _state: &mut State) -> Result<usize, RuntimeError> {
        Ok(0)
    }
}

impl<T: ToStack> IntoResults for T {
    const TYPE: Option<Type> = Some(T::TYPE);

    fn push_results(self, state: &mut State) -> Result<usize, RuntimeError> {
        state.check_stack(1)?;
        Ok(self.to_stack(state))
    }
}

impl<T, E> IntoResults for Result<T, E>
where
    T: IntoResults,
    E: Into<BoxError>,
{
    const TYPE: Option<Type> = T::TYPE;

    fn push_results(self, state: &mut State) -> Result<usize, RuntimeError> {
        self.map_err(RuntimeError::user)?.push_results(state)
    }
}

#[cfg(test)]
mod test_params {
    use super::*;
    use crate::Value;
    use pretty_assertions::assert_eq;
    use std::fmt;

    #[test]
    fn test_missing_arguments_read_as_default() {
        let mut state = State::new();
        state.push(4);
        state.push("not a number");
        let (a, b, c): (i64, i64, String) = ParamList::read_from(&state, 1);
        assert_eq!((a, b, c), (4, 0, String::new()));
    }

    #[test]
    fn test_types_follow_declaration_order() {
        assert_eq!(
            <(bool, f64, Option<String>)>::types(),
            vec![Type::Boolean, Type::Number, Type::String]
        );
        assert_eq!(<(bool, f64, Option<String>)>::COUNT, 3);
        assert!(<()>::types().is_empty());
    }

    #[test]
    fn test_result_shapes() {
        #[derive(Debug)]
        struct E;

        impl fmt::Display for E {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(formatter, "E")
            }
        }

        impl std::error::Error for E {}

        let mut state = State::new();
        assert_eq!(().push_results(&mut state).unwrap(), 0);
        assert_eq!(7i64.push_results(&mut state).unwrap(), 1);
        assert_eq!(state.get(-1), Some(&Value::Integer(7)));

        let ok: Result<(), E> = Ok(());
        assert_eq!(ok.push_results(&mut state).unwrap(), 0);
        let err: Result<i64, E> = Err(E);
        let err = err.push_results(&mut state).unwrap_err();
        assert!(err.downcast_ref::<E>().is_some());
        assert_eq!(state.top(), 1);

        assert_eq!(<Result<i64, E> as IntoResults>::TYPE, Some(Type::Integer));
        assert_eq!(<() as IntoResults>::TYPE, None);
    }
}
