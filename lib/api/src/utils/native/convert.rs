use std::rc::Rc;

use stackbind_types::Type;

use crate::{AnyUserData, Function, Object, State, Table, Value};

/// Writes a host value into stack slots.
pub trait ToStack {
    /// The type tag reported in signatures.
    const TYPE: Type;

    /// Pushes the value and returns how many slots were written.
    ///
    /// The caller is responsible for making room with
    /// [`State::check_stack`].
    fn to_stack(self, state: &mut State) -> usize;
}

/// Reads a host value from a stack slot.
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be read from a stack slot",
    note = "implement `stackbind::FromStack` for `{Self}`"
)]
pub trait FromStack: Sized {
    /// The type tag reported in signatures.
    const TYPE: Type;

    /// Reads the value at `index`, returning `None` when the slot does not
    /// exist or holds something that does not convert.
    fn try_from_stack(state: &State, index: i32) -> Option<Self>;

    /// Reads the value at `index`, falling back to `default`.
    fn from_stack(state: &State, index: i32, default: Self) -> Self {
        Self::try_from_stack(state, index).unwrap_or(default)
    }
}

/// Converts an integral float in `[-2^63, 2^63)` to the equal integer.
pub(crate) fn float_to_integer(n: f64) -> Option<i64> {
    // 2^63 is exact in f64; `i64::MAX as f64` rounds up to it.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if n.fract() == 0.0 && (-LIMIT..LIMIT).contains(&n) {
        Some(n as i64)
    } else {
        None
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    let s = s.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(float_to_integer))
}

fn read_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(i) => Some(*i),
        Value::Number(n) => float_to_integer(*n),
        Value::String(s) => parse_integer(s),
        _ => None,
    }
}

fn read_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Integer(i) => Some(*i as f64),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

macro_rules! integer_conversions {
    ( $( $ty:ty ),* ) => {
        $(
            impl ToStack for $ty {
                const TYPE: Type = Type::Integer;

                fn to_stack(self, state: &mut State) -> usize {
                    state.push(Value::Integer(self.into()));
                    1
                }
            }

            impl FromStack for $ty {
                const TYPE: Type = Type::Integer;

                fn try_from_stack(state: &State, index: i32) -> Option<Self> {
                    read_integer(state.get(index)?).and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

integer_conversions!(i8, i16, i32, i64, u8, u16, u32);

impl ToStack for isize {
    const TYPE: Type = Type::Integer;

    fn to_stack(self, state: &mut State) -> usize {
        // isize is at most 64 bits wide on every supported target.
        state.push(Value::Integer(self as i64));
        1
    }
}

impl FromStack for isize {
    const TYPE: Type = Type::Integer;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        read_integer(state.get(index)?).and_then(|i| Self::try_from(i).ok())
    }
}

/// Unsigned 64-bit values are stored by bit pattern: values above
/// `i64::MAX` become negative integers and read back unchanged. Reading
/// wraps the same way, so `Integer(-1)` reads as `u64::MAX`.
impl ToStack for u64 {
    const TYPE: Type = Type::Integer;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(Value::Integer(self as i64));
        1
    }
}

impl FromStack for u64 {
    const TYPE: Type = Type::Integer;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        const LIMIT: f64 = 18_446_744_073_709_551_616.0;
        match state.get(index)? {
            Value::Number(n) if n.fract() == 0.0 && (0.0..LIMIT).contains(n) => Some(*n as Self),
            Value::String(s) => s
                .trim()
                .parse::<Self>()
                .ok()
                .or_else(|| parse_integer(s).map(|i| i as Self)),
            value => read_integer(value).map(|i| i as Self),
        }
    }
}

impl ToStack for usize {
    const TYPE: Type = Type::Integer;

    fn to_stack(self, state: &mut State) -> usize {
        (self as u64).to_stack(state)
    }
}

impl FromStack for usize {
    const TYPE: Type = Type::Integer;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        u64::try_from_stack(state, index).and_then(|n| Self::try_from(n).ok())
    }
}

impl ToStack for f32 {
    const TYPE: Type = Type::Number;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(Value::Number(self.into()));
        1
    }
}

impl FromStack for f32 {
    const TYPE: Type = Type::Number;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        read_number(state.get(index)?).map(|n| n as Self)
    }
}

impl ToStack for f64 {
    const TYPE: Type = Type::Number;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(Value::Number(self));
        1
    }
}

impl FromStack for f64 {
    const TYPE: Type = Type::Number;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        read_number(state.get(index)?)
    }
}

impl ToStack for bool {
    const TYPE: Type = Type::Boolean;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(Value::Boolean(self));
        1
    }
}

impl FromStack for bool {
    const TYPE: Type = Type::Boolean;

    /// Any existing slot converts, using script truthiness.
    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        state.get(index).map(Value::truthy)
    }
}

impl ToStack for String {
    const TYPE: Type = Type::String;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(self);
        1
    }
}

impl ToStack for &str {
    const TYPE: Type = Type::String;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(self);
        1
    }
}

impl FromStack for String {
    const TYPE: Type = Type::String;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        match state.get(index)? {
            Value::String(s) => Some(s.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl ToStack for Rc<str> {
    const TYPE: Type = Type::String;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(self);
        1
    }
}

impl FromStack for Rc<str> {
    const TYPE: Type = Type::String;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        match state.get(index)? {
            Value::String(s) => Some(Self::clone(s)),
            _ => String::try_from_stack(state, index).map(Self::from),
        }
    }
}

impl<T: ToStack> ToStack for Option<T> {
    const TYPE: Type = T::TYPE;

    fn to_stack(self, state: &mut State) -> usize {
        match self {
            Some(value) => value.to_stack(state),
            None => {
                state.push(Value::Nil);
                1
            }
        }
    }
}

impl<T: FromStack> FromStack for Option<T> {
    const TYPE: Type = <T as FromStack>::TYPE;

    /// Always converts: `nil`, a missing slot and an unconvertible value
    /// all read as `None`.
    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        match state.get(index) {
            None | Some(Value::Nil) => Some(None),
            Some(_) => Some(T::try_from_stack(state, index)),
        }
    }
}

impl ToStack for Value {
    const TYPE: Type = Type::Any;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(self);
        1
    }
}

impl FromStack for Value {
    const TYPE: Type = Type::Any;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        state.get(index).cloned()
    }
}

macro_rules! reference_conversions {
    ( $( $ty:ty => $variant:ident ),* ) => {
        $(
            impl ToStack for $ty {
                const TYPE: Type = Type::$variant;

                fn to_stack(self, state: &mut State) -> usize {
                    state.push(Value::$variant(self));
                    1
                }
            }

            impl FromStack for $ty {
                const TYPE: Type = Type::$variant;

                fn try_from_stack(state: &State, index: i32) -> Option<Self> {
                    match state.get(index)? {
                        Value::$variant(v) => Some(v.clone()),
                        _ => None,
                    }
                }
            }
        )*
    };
}

reference_conversions!(
    Table => Table,
    Function => Function,
    AnyUserData => UserData
);

impl<T: 'static> ToStack for Object<T> {
    const TYPE: Type = Type::UserData;

    fn to_stack(self, state: &mut State) -> usize {
        state.push(self.to_userdata());
        1
    }
}

impl<T: 'static> FromStack for Object<T> {
    const TYPE: Type = Type::UserData;

    fn try_from_stack(state: &State, index: i32) -> Option<Self> {
        Self::from_userdata(state.get(index)?.userdata()?)
    }
}
