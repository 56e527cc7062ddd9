use std::fmt;
use std::rc::Rc;

use stackbind_types::Type;

use crate::utils::native::float_to_integer;
use crate::{AnyUserData, Function, Object, Table};

/// A value living in a stack slot, a table field or an upvalue.
///
/// Scalars are stored inline. Tables, functions and userdata are
/// reference values: cloning a `Value` clones the reference, and two
/// reference values are equal only when they point at the same object.
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value.
    #[default]
    Nil,

    /// A boolean.
    Boolean(bool),

    /// A signed 64 bit integer.
    Integer(i64),

    /// A 64 bit float.
    Number(f64),

    /// An immutable, cheaply clonable string.
    String(Rc<str>),

    /// A string-keyed table.
    Table(Table),

    /// A native closure.
    Function(Function),

    /// Opaque host data.
    UserData(AnyUserData),
}

macro_rules! accessors {
    ($bind:ident $(($variant:ident($ty:ty) $get:ident $unwrap:ident $cvt:expr))*) => ($(
        /// Attempt to access the underlying value of this `Value`, returning
        /// `None` if it is not the correct type.
        pub fn $get(&self) -> Option<$ty> {
            if let Self::$variant($bind) = self {
                Some($cvt)
            } else {
                None
            }
        }

        /// Returns the underlying value of this `Value`, panicking if it's the
        /// wrong type.
        ///
        /// # Panics
        ///
        /// Panics if `self` is not of the right type.
        pub fn $unwrap(&self) -> $ty {
            self.$get().expect(concat!("expected ", stringify!($ty)))
        }
    )*)
}

impl Value {
    /// Returns the corresponding [`Type`] for this `Value`.
    pub fn ty(&self) -> Type {
        match self {
            Self::Nil => Type::Nil,
            Self::Boolean(_) => Type::Boolean,
            Self::Integer(_) => Type::Integer,
            Self::Number(_) => Type::Number,
            Self::String(_) => Type::String,
            Self::Table(_) => Type::Table,
            Self::Function(_) => Type::Function,
            Self::UserData(_) => Type::UserData,
        }
    }

    /// Whether this value is `nil`.
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Truthiness as scripts see it: only `nil` and `false` are false.
    pub fn truthy(&self) -> bool {
        !matches!(self, Self::Nil | Self::Boolean(false))
    }

    accessors! {
        e
        (Boolean(bool) boolean unwrap_boolean *e)
        (Integer(i64) integer unwrap_integer *e)
        (Number(f64) number unwrap_number *e)
        (String(&str) string unwrap_string &**e)
        (Table(&Table) table unwrap_table e)
        (Function(&Function) function unwrap_function e)
        (UserData(&AnyUserData) userdata unwrap_userdata e)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "Nil"),
            Self::Boolean(v) => write!(f, "Boolean({v:?})"),
            Self::Integer(v) => write!(f, "Integer({v:?})"),
            Self::Number(v) => write!(f, "Number({v:?})"),
            Self::String(v) => write!(f, "String({v:?})"),
            Self::Table(v) => write!(f, "Table({v:?})"),
            Self::Function(v) => write!(f, "Function({v:?})"),
            Self::UserData(v) => write!(f, "UserData({v:?})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => write!(f, "nil"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Number(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v}"),
            other => write!(f, "{}: {:p}", other.ty().name(), other.identity()),
        }
    }
}

impl Value {
    fn identity(&self) -> *const () {
        match self {
            Self::Table(t) => t.as_ptr(),
            Self::Function(func) => func.as_ptr(),
            Self::UserData(u) => u.as_ptr(),
            _ => std::ptr::null(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Nil, Self::Nil) => true,
            (Self::Boolean(a), Self::Boolean(b)) => a == b,
            (Self::Integer(a), Self::Integer(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Integer(i), Self::Number(n)) | (Self::Number(n), Self::Integer(i)) => {
                float_to_integer(*n) == Some(*i)
            }
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Table(a), Self::Table(b)) => Table::ptr_eq(a, b),
            (Self::Function(a), Self::Function(b)) => Function::ptr_eq(a, b),
            (Self::UserData(a), Self::UserData(b)) => AnyUserData::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(val: &str) -> Self {
        Self::String(Rc::from(val))
    }
}

impl From<String> for Value {
    fn from(val: String) -> Self {
        Self::String(Rc::from(val))
    }
}

impl From<i32> for Value {
    fn from(val: i32) -> Self {
        Self::Integer(val.into())
    }
}

impl<T: 'static> From<Object<T>> for Value {
    fn from(val: Object<T>) -> Self {
        Self::UserData(val.to_userdata())
    }
}

macro_rules! from_variant {
    ( $( $ty:ty => $variant:ident ),* ) => {
        $(
            impl From<$ty> for Value {
                fn from(val: $ty) -> Self {
                    Self::$variant(val)
                }
            }
        )*
    };
}

from_variant!(
    bool => Boolean,
    i64 => Integer,
    f64 => Number,
    Rc<str> => String,
    Table => Table,
    Function => Function,
    AnyUserData => UserData
);
