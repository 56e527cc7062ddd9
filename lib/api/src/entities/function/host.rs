//! Classification of host callables.
//!
//! A host callable is classified by the marker kind its type satisfies.
//! The kinds are disjoint: a closure taking `&O` first can only be a
//! [`Method`], one taking `&mut State` first can only be [`WithState`],
//! and so on. Callables of any other shape do not implement
//! [`HostCallable`] and fail to bind at compile time.

use std::fmt;
use std::marker::PhantomData;

use stackbind_types::{CallableKind, RuntimeError, Signature};

use super::dispatch;
use crate::{IntoResults, ParamList, Parameter, State, ToStack, UserType};

mod private {
    pub trait HostCallableKindSealed {}
}

/// The kind of a host callable. This trait is sealed.
pub trait HostCallableKind: private::HostCallableKindSealed {
    /// The kind reported in signatures.
    const KIND: CallableKind;
}

/// Marker for free functions: `Fn(A1, .., An) -> R`.
pub struct FreeFn;

/// Marker for free functions that receive the running state first:
/// `Fn(&mut State, A1, .., An) -> R`.
pub struct WithState;

/// Marker for methods borrowing their receiver: `Fn(&O, A1, .., An) -> R`.
pub struct Method<O>(PhantomData<O>);

/// Marker for methods mutably borrowing their receiver:
/// `Fn(&mut O, A1, .., An) -> R`.
pub struct MethodMut<O>(PhantomData<O>);

/// Marker for field accessors built by [`field`].
pub struct Member<O>(PhantomData<O>);

impl private::HostCallableKindSealed for FreeFn {}
impl HostCallableKind for FreeFn {
    const KIND: CallableKind = CallableKind::FreeFunction;
}

impl private::HostCallableKindSealed for WithState {}
impl HostCallableKind for WithState {
    const KIND: CallableKind = CallableKind::FreeFunction;
}

impl<O> private::HostCallableKindSealed for Method<O> {}
impl<O> HostCallableKind for Method<O> {
    const KIND: CallableKind = CallableKind::MemberFunction;
}

impl<O> private::HostCallableKindSealed for MethodMut<O> {}
impl<O> HostCallableKind for MethodMut<O> {
    const KIND: CallableKind = CallableKind::MemberFunction;
}

impl<O> private::HostCallableKindSealed for Member<O> {}
impl<O> HostCallableKind for Member<O> {
    const KIND: CallableKind = CallableKind::MemberData;
}

/// A callable that can be bound into a state.
///
/// `Kind` is one of [`FreeFn`], [`WithState`], [`Method`], [`MethodMut`] or
/// [`Member`]; `Args` is the tuple of parameter types and `Rets` the
/// result type. All three are inferred at the binding site.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be bound as a host callable",
    note = "parameters must be passed by value and implement `Parameter`; receivers must implement `UserType`"
)]
pub trait HostCallable<Kind, Args, Rets>: 'static {
    /// The descriptor of this callable type.
    fn signature() -> Signature;

    /// Reads the arguments of the running call, invokes the callable and
    /// writes its result. Returns the number of result slots.
    fn dispatch(&self, state: &mut State) -> Result<usize, RuntimeError>;
}

/// Projects a field out of a receiver. Built by [`field`].
pub struct FieldAccessor<O, V, F> {
    get: F,
    _phantom: PhantomData<fn(&O) -> &V>,
}

/// Builds a field accessor from a projection closure.
///
/// ```
/// use stackbind::{field, Function, Object, State, UserType};
///
/// struct Player {
///     score: i64,
/// }
///
/// impl UserType for Player {}
///
/// let mut state = State::new();
/// let score = Function::new_typed(field(|p: &Player| &p.score));
/// let player = Object::new(Player { score: 42 });
/// let value: i64 = score.typed::<Object<Player>, i64>().call(&mut state, player)?;
/// assert_eq!(value, 42);
/// # Ok::<(), stackbind::RuntimeError>(())
/// ```
pub fn field<O, V, F>(get: F) -> FieldAccessor<O, V, F>
where
    F: Fn(&O) -> &V,
{
    FieldAccessor {
        get,
        _phantom: PhantomData,
    }
}

impl<O, V, F> fmt::Debug for FieldAccessor<O, V, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("owner", &std::any::type_name::<O>())
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}

impl<O, V, F> HostCallable<Member<O>, (), V> for FieldAccessor<O, V, F>
where
    O: UserType,
    V: ToStack + Clone + 'static,
    F: Fn(&O) -> &V + 'static,
{
    fn signature() -> Signature {
        Signature::member_data(O::type_name(), <V as ToStack>::TYPE)
    }

    fn dispatch(&self, state: &mut State) -> Result<usize, RuntimeError> {
        dispatch::read_field(state, &self.get)
    }
}

macro_rules! impl_host_callable {
    ( $( $x:ident ),* ) => {
        impl< $( $x, )* Rets, Func > HostCallable<FreeFn, ( $( $x, )* ), Rets> for Func
        where
            Func: Fn( $( $x ),* ) -> Rets + 'static,
            $( $x: Parameter, )*
            Rets: IntoResults,
        {
            fn signature() -> Signature {
                Signature::free(
                    <( $( $x, )* ) as ParamList>::types(),
                    <Rets as IntoResults>::TYPE,
                )
            }

            #[allow(non_snake_case)]
            fn dispatch(&self, state: &mut State) -> Result<usize, RuntimeError> {
                dispatch::call_free::<( $( $x, )* ), Rets>(state, |( $( $x, )* )| self( $( $x ),* ))
            }
        }

        impl< $( $x, )* Rets, Func > HostCallable<WithState, ( $( $x, )* ), Rets> for Func
        where
            Func: Fn( &mut State, $( $x ),* ) -> Rets + 'static,
            $( $x: Parameter, )*
            Rets: IntoResults,
        {
            fn signature() -> Signature {
                Signature::free(
                    <( $( $x, )* ) as ParamList>::types(),
                    <Rets as IntoResults>::TYPE,
                )
            }

            #[allow(non_snake_case)]
            fn dispatch(&self, state: &mut State) -> Result<usize, RuntimeError> {
                dispatch::call_with_state::<( $( $x, )* ), Rets>(
                    state,
                    |state, ( $( $x, )* )| self(state, $( $x ),* ),
                )
            }
        }

        impl< $( $x, )* Rets, Func, O > HostCallable<Method<O>, ( $( $x, )* ), Rets> for Func
        where
            Func: Fn( &O, $( $x ),* ) -> Rets + 'static,
            O: UserType,
            $( $x: Parameter, )*
            Rets: IntoResults,
        {
            fn signature() -> Signature {
                Signature::member_function(
                    O::type_name(),
                    <( $( $x, )* ) as ParamList>::types(),
                    <Rets as IntoResults>::TYPE,
                )
            }

            #[allow(non_snake_case)]
            fn dispatch(&self, state: &mut State) -> Result<usize, RuntimeError> {
                dispatch::call_method::<O, ( $( $x, )* ), Rets>(
                    state,
                    |this, ( $( $x, )* )| self(this, $( $x ),* ),
                )
            }
        }

        impl< $( $x, )* Rets, Func, O > HostCallable<MethodMut<O>, ( $( $x, )* ), Rets> for Func
        where
            Func: Fn( &mut O, $( $x ),* ) -> Rets + 'static,
            O: UserType,
            $( $x: Parameter, )*
            Rets: IntoResults,
        {
            fn signature() -> Signature {
                Signature::member_function(
                    O::type_name(),
                    <( $( $x, )* ) as ParamList>::types(),
                    <Rets as IntoResults>::TYPE,
                )
            }

            #[allow(non_snake_case)]
            fn dispatch(&self, state: &mut State) -> Result<usize, RuntimeError> {
                dispatch::call_method_mut::<O, ( $( $x, )* ), Rets>(
                    state,
                    |this, ( $( $x, )* )| self(this, $( $x ),* ),
                )
            }
        }
    };
}

for_each_arity!(impl_host_callable);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Type;
    use pretty_assertions::assert_eq;

    struct Person {
        name: String,
    }

    impl UserType for Person {
        fn type_name() -> &'static str {
            "Person"
        }
    }

    impl Person {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn rename(&mut self, name: String) {
            self.name = name;
        }
    }

    fn signature_of<K, Args, Rets, F>(_: &F) -> Signature
    where
        F: HostCallable<K, Args, Rets>,
    {
        F::signature()
    }

    fn add(a: i64, b: i64) -> i64 {
        a + b
    }

    #[test]
    fn free_functions_are_classified_by_their_parameters() {
        let sig = signature_of(&add);
        assert_eq!(sig.kind(), CallableKind::FreeFunction);
        assert_eq!(sig.params(), &[Type::Integer, Type::Integer]);
        assert_eq!(sig.result(), Some(Type::Integer));
        assert_eq!(sig.owner(), None);

        let sig = signature_of(&|| {});
        assert!(sig.params().is_empty());
        assert!(sig.is_void());
    }

    #[test]
    fn state_parameter_is_not_a_stack_slot() {
        let sig = signature_of(&|_: &mut State, flag: bool| flag);
        assert_eq!(sig.kind(), CallableKind::FreeFunction);
        assert_eq!(sig.params(), &[Type::Boolean]);
        assert_eq!(sig.first_param_index(), 1);
    }

    #[test]
    fn methods_report_their_owner() {
        let sig = signature_of(&Person::name);
        assert_eq!(sig.kind(), CallableKind::MemberFunction);
        assert!(sig.params().is_empty());
        assert_eq!(sig.owner(), Some("Person"));
        assert_eq!(sig.first_param_index(), 2);

        let sig = signature_of(&Person::rename);
        assert_eq!(sig.params(), &[Type::String]);
        assert!(sig.is_void());
        assert_eq!(sig.to_string(), "Person::fn(self, String) -> ()");
    }

    #[test]
    fn field_accessors_take_no_parameters() {
        let sig = signature_of(&field(|p: &Person| &p.name));
        assert_eq!(sig.kind(), CallableKind::MemberData);
        assert!(sig.params().is_empty());
        assert_eq!(sig.result(), Some(Type::String));
        assert_eq!(sig.to_string(), "Person.field -> String");
    }

    #[test]
    fn sixteen_parameters_are_supported() {
        #[allow(clippy::too_many_arguments)]
        fn wide(
            a: u8, b: u8, c: u8, d: u8, e: u8, f: u8, g: u8, h: u8,
            i: u8, j: u8, k: u8, l: u8, m: u8, n: u8, o: u8, p: u8,
        ) -> u32 {
            [a, b, c, d, e, f, g, h, i, j, k, l, m, n, o, p]
                .iter()
                .map(|&x| u32::from(x))
                .sum()
        }

        let sig = signature_of(&wide);
        assert_eq!(sig.params().len(), 16);
    }
}
