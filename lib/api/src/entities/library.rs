use std::fmt;

use indexmap::IndexMap;
use stackbind_types::RuntimeError;

use crate::{Function, HostCallable, HostCallableKind, ParamList, StackCheck, State};

/// A set of functions registered into a state in one step.
///
/// A named library is stored as a global table holding every function; an
/// unnamed one sets each function as a global. Functions keep their
/// definition order.
///
/// # Usage:
/// ```
/// use stackbind::{Library, State};
///
/// fn add(a: i64, b: i64) -> i64 {
///     a + b
/// }
///
/// let mut math = Library::named("math");
/// math.bind("add", add);
/// math.bind("neg", |x: f64| -x);
///
/// let mut state = State::new();
/// math.register(&mut state)?;
/// assert!(state.globals().get("math").table().is_some());
/// # Ok::<(), stackbind::RuntimeError>(())
/// ```
#[derive(Clone, Default)]
pub struct Library {
    name: Option<String>,
    functions: IndexMap<String, Function>,
}

impl Library {
    /// Create a new library whose functions become globals.
    pub fn new() -> Self {
        Default::default()
    }

    /// Create a new library stored under the global table `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    /// The global table name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Adds a function under `name`, replacing any previous one.
    pub fn define(&mut self, name: impl Into<String>, function: Function) {
        self.functions.insert(name.into(), function);
    }

    /// Binds a host callable and adds it under `name`.
    pub fn bind<K, Args, R, F>(&mut self, name: impl Into<String>, callable: F)
    where
        F: HostCallable<K, Args, R>,
        K: HostCallableKind,
        Args: ParamList,
    {
        self.define(name, Function::new_typed(callable));
    }

    /// Returns true if a function is defined under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Gets the function defined under `name`.
    pub fn get(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Iterates over the functions in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Function)> {
        self.functions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if no function is defined.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Commits every function to `state`. Leaves the stack unchanged.
    pub fn register(&self, state: &mut State) -> Result<(), RuntimeError> {
        let mut state = StackCheck::new(state);
        match &self.name {
            Some(name) => {
                state.check_stack(2)?;
                state.new_table();
                for (field, function) in &self.functions {
                    state.push(function.clone());
                    state.set_field(-2, field)?;
                }
                state.set_global(name)?;
            }
            None => {
                state.check_stack(1)?;
                for (global, function) in &self.functions {
                    state.push(function.clone());
                    state.set_global(global)?;
                }
            }
        }
        tracing::debug!(
            library = self.name.as_deref().unwrap_or("<globals>"),
            functions = self.functions.len(),
            "registered library"
        );
        Ok(())
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("name", &self.name)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<S: Into<String>> Extend<(S, Function)> for Library {
    fn extend<I: IntoIterator<Item = (S, Function)>>(&mut self, iter: I) {
        for (name, function) in iter {
            self.define(name, function);
        }
    }
}

impl<'a> IntoIterator for &'a Library {
    type Item = (&'a String, &'a Function);
    type IntoIter = indexmap::map::Iter<'a, String, Function>;

    fn into_iter(self) -> Self::IntoIter {
        self.functions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Type, Value};
    use pretty_assertions::assert_eq;
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn named_library_becomes_a_table() {
        let mut lib = Library::named("util");
        lib.bind("one", || 1);
        lib.bind("two", || 2);
        assert_eq!(lib.len(), 2);
        assert!(lib.contains("one"));
        assert_eq!(
            lib.iter().map(|(name, _)| name).collect::<Vec<_>>(),
            vec!["one", "two"]
        );

        let mut state = State::new();
        lib.register(&mut state).unwrap();
        assert_eq!(state.top(), 0);
        let table = state.globals().get("util");
        let table = table.table().unwrap();
        assert_eq!(table.keys(), vec!["one".to_string(), "two".to_string()]);
        assert!(Function::ptr_eq(
            table.get("two").function().unwrap(),
            lib.get("two").unwrap()
        ));
        assert!(logs_contain("registered library"));
    }

    #[test]
    fn unnamed_library_sets_globals() {
        let mut lib = Library::new();
        lib.extend([("hello", Function::new_typed(|| "hi"))]);
        let mut state = State::new();
        lib.register(&mut state).unwrap();
        assert_eq!(state.get_global("hello"), Type::Function);
        state.call(0, 1).unwrap();
        assert_eq!(state.get(-1), Some(&Value::from("hi")));
    }

    #[test]
    fn redefining_keeps_the_position() {
        let mut lib = Library::new();
        lib.bind("a", || 1);
        lib.bind("b", || 2);
        lib.bind("a", || 3);
        assert_eq!(lib.len(), 2);
        assert_eq!(lib.iter().next().map(|(name, _)| name), Some("a"));
    }
}
