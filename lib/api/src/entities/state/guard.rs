use std::ops::{Deref, DerefMut};
use std::panic::Location;

use super::State;

/// Verifies that a scope leaves the stack as deep as it found it.
///
/// The depth is recorded on creation and compared on drop, whatever way
/// the scope is left. A mismatch is logged at error level and, in debug
/// builds, fails an assertion unless the thread is already panicking.
///
/// ```
/// use stackbind::{StackCheck, State};
///
/// let mut state = State::new();
/// {
///     let mut state = StackCheck::new(&mut state);
///     state.push(1);
///     state.pop(1);
/// }
/// ```
pub struct StackCheck<'a> {
    state: &'a mut State,
    expected: usize,
    location: &'static Location<'static>,
}

impl<'a> StackCheck<'a> {
    /// Starts checking `state`.
    #[track_caller]
    pub fn new(state: &'a mut State) -> Self {
        let expected = state.top();
        Self {
            state,
            expected,
            location: Location::caller(),
        }
    }

    /// The depth the scope must end with.
    pub fn expected(&self) -> usize {
        self.expected
    }
}

impl Deref for StackCheck<'_> {
    type Target = State;

    fn deref(&self) -> &State {
        self.state
    }
}

impl DerefMut for StackCheck<'_> {
    fn deref_mut(&mut self) -> &mut State {
        self.state
    }
}

impl Drop for StackCheck<'_> {
    fn drop(&mut self) {
        let actual = self.state.top();
        if actual != self.expected {
            tracing::error!(
                expected = self.expected,
                actual,
                location = %self.location,
                "stack depth changed in a checked scope"
            );
            if !std::thread::panicking() {
                debug_assert_eq!(
                    actual, self.expected,
                    "stack depth changed in a checked scope at {}",
                    self.location
                );
            }
        }
    }
}

/// Restores the stack depth when dropped, discarding whatever the scope
/// left on the stack.
///
/// ```
/// use stackbind::{StackGuard, State};
///
/// let mut state = State::new();
/// {
///     let mut state = StackGuard::new(&mut state);
///     state.push("scratch");
/// }
/// assert_eq!(state.top(), 0);
/// ```
pub struct StackGuard<'a> {
    state: &'a mut State,
    top: usize,
}

impl<'a> StackGuard<'a> {
    /// Records the depth of `state`.
    pub fn new(state: &'a mut State) -> Self {
        let top = state.top();
        Self { state, top }
    }
}

impl Deref for StackGuard<'_> {
    type Target = State;

    fn deref(&self) -> &State {
        self.state
    }
}

impl DerefMut for StackGuard<'_> {
    fn deref_mut(&mut self) -> &mut State {
        self.state
    }
}

impl Drop for StackGuard<'_> {
    fn drop(&mut self) {
        self.state.set_top(self.top);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_discards_scratch_values() {
        let mut state = State::new();
        state.push(1);
        {
            let mut guard = StackGuard::new(&mut state);
            guard.push(2);
            guard.push(3);
            assert_eq!(guard.top(), 3);
        }
        assert_eq!(state.top(), 1);
    }

    #[test]
    fn balanced_scope_passes_the_check() {
        let mut state = State::new();
        let mut check = StackCheck::new(&mut state);
        check.push(true);
        check.pop(1);
        assert_eq!(check.expected(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "stack depth changed in a checked scope")]
    fn unbalanced_scope_fails_in_debug_builds() {
        let mut state = State::new();
        let mut check = StackCheck::new(&mut state);
        check.push(true);
    }
}
