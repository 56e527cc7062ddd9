use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::Value;

/// A string-keyed table.
///
/// Tables are reference values: clones share the same fields. Fields
/// keep their insertion order, and setting a field to `nil` removes it.
#[derive(Clone, Default)]
pub struct Table(Rc<RefCell<IndexMap<String, Value>>>);

impl Table {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, `nil` when it is absent.
    pub fn get(&self, name: &str) -> Value {
        self.0.borrow().get(name).cloned().unwrap_or_default()
    }

    /// Sets a field. Setting `nil` removes the field.
    pub fn set(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut fields = self.0.borrow_mut();
        if value.is_nil() {
            fields.shift_remove(name);
        } else {
            fields.insert(name.to_string(), value);
        }
    }

    /// Whether a non-nil field exists.
    pub fn contains(&self, name: &str) -> bool {
        self.0.borrow().contains_key(name)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the table has no fields.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Checks whether two handles refer to the same table.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn as_ptr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(fields) => f.debug_map().entries(fields.iter()).finish(),
            Err(_) => write!(f, "<borrowed>"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_removes_fields() {
        let table = Table::new();
        table.set("a", 1i64);
        table.set("b", "two");
        assert_eq!(table.len(), 2);
        table.set("a", Value::Nil);
        assert!(!table.contains("a"));
        assert_eq!(table.get("a"), Value::Nil);
        assert_eq!(table.keys(), vec!["b".to_string()]);
    }

    #[test]
    fn clones_share_fields() {
        let table = Table::new();
        let alias = table.clone();
        alias.set("x", true);
        assert_eq!(table.get("x"), Value::Boolean(true));
        assert!(Table::ptr_eq(&table, &alias));
    }
}
