use std::any::{Any, type_name};
use std::cell::{BorrowError, BorrowMutError, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Opaque host data stored in a stack slot.
///
/// The runtime never looks inside; host code recovers the concrete type
/// with [`AnyUserData::downcast`].
#[derive(Clone)]
pub struct AnyUserData {
    data: Rc<dyn Any>,
    type_name: &'static str,
}

impl AnyUserData {
    /// Moves `value` into a new userdata.
    pub fn new<T: Any>(value: T) -> Self {
        Self {
            data: Rc::new(value),
            type_name: type_name::<T>(),
        }
    }

    fn from_rc<T: Any>(data: Rc<T>) -> Self {
        Self {
            data,
            type_name: type_name::<T>(),
        }
    }

    /// Whether the userdata holds a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.data.is::<T>()
    }

    /// Returns a new handle to the data if it is a `T`.
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.data).downcast::<T>().ok()
    }

    /// Borrows the data if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// The name of the stored type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Size in bytes of the stored value.
    pub fn size(&self) -> usize {
        std::mem::size_of_val(&*self.data)
    }

    /// Checks whether two handles refer to the same data.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.data, &b.data)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.data) as *const ()
    }
}

impl fmt::Debug for AnyUserData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.type_name, self.as_ptr())
    }
}

/// A host type whose methods and fields can be bound.
///
/// Member callables take their receiver from stack position 1 as an
/// [`Object`] of this type.
///
/// ```
/// use stackbind::UserType;
///
/// struct Player {
///     score: i64,
/// }
///
/// impl UserType for Player {
///     fn type_name() -> &'static str {
///         "Player"
///     }
/// }
/// ```
///
/// Methods of other types cannot be bound:
///
/// ```compile_fail
/// use stackbind::Function;
///
/// struct Plain;
///
/// impl Plain {
///     fn get(&self) -> i64 {
///         1
///     }
/// }
///
/// let _ = Function::new_typed(Plain::get);
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` cannot be used as the receiver of a host callable",
    note = "implement `stackbind::UserType` for `{Self}` to bind its methods and fields"
)]
pub trait UserType: 'static {
    /// The owner name used in signatures and logs.
    fn type_name() -> &'static str {
        type_name::<Self>()
    }
}

/// A shared host object that can be handed to scripts and used as the
/// receiver of bound methods and field accessors.
///
/// ```
/// use stackbind::Object;
///
/// struct Counter(u32);
///
/// let counter = Object::new(Counter(1));
/// counter.borrow_mut().0 += 1;
/// assert_eq!(counter.borrow().0, 2);
/// ```
#[derive(derive_more::From)]
pub struct Object<T>(Rc<RefCell<T>>);

impl<T: 'static> Object<T> {
    /// Wraps `value` in a new shared object.
    pub fn new(value: T) -> Self {
        Self(Rc::new(RefCell::new(value)))
    }

    /// Immutably borrows the object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    /// Mutably borrows the object.
    ///
    /// # Panics
    ///
    /// Panics if the object is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    /// Immutably borrows the object, failing if it is mutably borrowed.
    pub fn try_borrow(&self) -> Result<Ref<'_, T>, BorrowError> {
        self.0.try_borrow()
    }

    /// Mutably borrows the object, failing if it is borrowed.
    pub fn try_borrow_mut(&self) -> Result<RefMut<'_, T>, BorrowMutError> {
        self.0.try_borrow_mut()
    }

    /// Recovers an object from userdata holding one.
    pub fn from_userdata(userdata: &AnyUserData) -> Option<Self> {
        userdata.downcast::<RefCell<T>>().map(Self)
    }

    /// Converts the object into userdata sharing the same storage.
    pub fn to_userdata(&self) -> AnyUserData {
        AnyUserData::from_rc(Rc::clone(&self.0))
    }

    /// Checks whether two handles refer to the same object.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }
}

impl<T> Clone for Object<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Object<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object<{}>@{:p}", type_name::<T>(), Rc::as_ptr(&self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Point {
        x: i32,
    }

    #[test]
    fn object_round_trips_through_userdata() {
        let object = Object::new(Point { x: 3 });
        let userdata = object.to_userdata();
        assert!(userdata.is::<RefCell<Point>>());
        let back = Object::<Point>::from_userdata(&userdata).unwrap();
        assert!(Object::ptr_eq(&object, &back));
        back.borrow_mut().x = 7;
        assert_eq!(object.borrow().x, 7);
    }

    #[test]
    fn wrong_type_does_not_downcast() {
        let userdata = AnyUserData::new(5u8);
        assert!(Object::<Point>::from_userdata(&userdata).is_none());
        assert_eq!(userdata.downcast_ref::<u8>(), Some(&5));
        assert_eq!(userdata.size(), 1);
    }

    #[test]
    fn borrow_conflicts_are_reported() {
        let object = Object::new(Point { x: 0 });
        let _guard = object.borrow_mut();
        assert!(object.try_borrow().is_err());
    }
}
