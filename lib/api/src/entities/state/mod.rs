//! The stack-based execution context.
//!
//! Positive indices are 1-based and relative to the base of the running
//! call frame, negative indices count down from the top and upvalue
//! pseudo-indices (see [`upvalue_index`](crate::upvalue_index)) address
//! the running closure's upvalues.

mod guard;

pub use guard::{StackCheck, StackGuard};

use std::any::Any;
use std::mem;

use stackbind_types::{is_upvalue_index, upvalue_slot, RuntimeError, Type, DEFAULT_MAX_STACK};

use crate::{AnyUserData, Config, FromStack, Function, NativeFn, Table, ToStack, Value};

struct CallFrame {
    /// Absolute stack slot of the frame's position 1.
    base: usize,
    /// The running closure, `None` for the outermost frame.
    closure: Option<Function>,
}

/// An execution context: one value stack, a table of globals and the
/// limits it runs under.
///
/// `State` is single-threaded; it and every value it holds are `!Send`.
///
/// ```
/// use stackbind::{Function, State};
///
/// let mut state = State::new();
/// state.push(Function::new_typed(|a: i64, b: i64| a * b));
/// state.push(6);
/// state.push(7);
/// assert_eq!(state.call(2, 1)?, 1);
/// assert_eq!(state.get(-1).and_then(|v| v.integer()), Some(42));
/// # Ok::<(), stackbind::RuntimeError>(())
/// ```
pub struct State {
    stack: Vec<Value>,
    frame: CallFrame,
    depth: usize,
    globals: Table,
    config: Config,
}

impl State {
    /// Creates a state with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a state with the given configuration.
    ///
    /// `max_stack` is clamped to [`DEFAULT_MAX_STACK`]; larger stacks would
    /// reach into the upvalue pseudo-indices.
    pub fn with_config(mut config: Config) -> Self {
        if config.max_stack > DEFAULT_MAX_STACK {
            tracing::warn!(
                requested = config.max_stack,
                limit = DEFAULT_MAX_STACK,
                "clamping stack limit"
            );
            config.max_stack = DEFAULT_MAX_STACK;
        }
        tracing::debug!(?config, "creating state");
        Self {
            stack: Vec::new(),
            frame: CallFrame {
                base: 0,
                closure: None,
            },
            depth: 0,
            globals: Table::new(),
            config,
        }
    }

    /// The configuration this state runs under.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of nested native calls currently running.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of slots in the running frame. This is also the index of
    /// the topmost slot.
    pub fn top(&self) -> usize {
        self.stack.len() - self.frame.base
    }

    /// Grows the running frame with `nil`s or shrinks it to `top` slots.
    pub fn set_top(&mut self, top: usize) {
        self.stack.resize(self.frame.base + top, Value::Nil);
    }

    /// Pushes a value.
    ///
    /// Pushing never checks the stack limit; reserve room with
    /// [`State::check_stack`] first.
    pub fn push(&mut self, value: impl Into<Value>) {
        self.stack.push(value.into());
    }

    /// Pops up to `n` values from the running frame.
    pub fn pop(&mut self, n: usize) {
        let len = self.stack.len().saturating_sub(n).max(self.frame.base);
        self.stack.truncate(len);
    }

    /// Converts `index` into a 1-based position in the running frame.
    /// Returns `None` for upvalue pseudo-indices and for indices that do
    /// not address a live slot.
    pub fn absolute(&self, index: i32) -> Option<usize> {
        let top = self.top();
        if index > 0 {
            let position = index as usize;
            (position <= top).then_some(position)
        } else if index < 0 && !is_upvalue_index(index) {
            let back = index.unsigned_abs() as usize;
            (back <= top).then(|| top - back + 1)
        } else {
            None
        }
    }

    /// The value at `index`, `None` when the index addresses nothing.
    pub fn get(&self, index: i32) -> Option<&Value> {
        if let Some(slot) = upvalue_slot(index) {
            return self.frame.closure.as_ref()?.upvalues().get(slot);
        }
        let position = self.absolute(index)?;
        self.stack.get(self.frame.base + position - 1)
    }

    /// The type of the value at `index`, `None` when the index addresses
    /// nothing.
    pub fn type_at(&self, index: i32) -> Option<Type> {
        self.get(index).map(Value::ty)
    }

    /// Ensures there is room for `extra` more slots.
    pub fn check_stack(&mut self, extra: usize) -> Result<(), RuntimeError> {
        let limit = self.config.max_stack;
        if self.stack.len().saturating_add(extra) > limit {
            return Err(RuntimeError::StackOverflow {
                requested: extra,
                limit,
            });
        }
        self.stack.reserve(extra);
        Ok(())
    }

    /// Pops `upvalues` values and pushes a closure over them targeting
    /// `entry`. The first popped value becomes upvalue 1.
    pub fn push_closure(&mut self, entry: NativeFn, upvalues: usize) -> Result<(), RuntimeError> {
        if upvalues > self.top() {
            return Err(RuntimeError::InvalidIndex(-(upvalues as i32)));
        }
        let values = self.stack.split_off(self.stack.len() - upvalues);
        self.push(Function::new_native(entry, values));
        Ok(())
    }

    /// Calls the function sitting below the topmost `nargs` values.
    ///
    /// On success the function and its arguments are replaced by the
    /// results, adjusted to `nresults` (pass [`MULTRET`](crate::MULTRET)
    /// to keep them all), and the number of results left on the stack is
    /// returned. On error the function and its arguments are discarded.
    pub fn call(&mut self, nargs: usize, nresults: i32) -> Result<usize, RuntimeError> {
        if nargs >= self.top() {
            return Err(RuntimeError::InvalidIndex(-(nargs as i32) - 1));
        }
        let func_slot = self.stack.len() - nargs - 1;
        let function = match &self.stack[func_slot] {
            Value::Function(function) => function.clone(),
            other => {
                let ty = other.ty().name();
                self.stack.truncate(func_slot);
                return Err(RuntimeError::NotCallable(ty));
            }
        };
        if self.depth >= self.config.max_call_depth {
            self.stack.truncate(func_slot);
            return Err(RuntimeError::CallDepthExceeded(self.config.max_call_depth));
        }

        let callee = CallFrame {
            base: func_slot + 1,
            closure: Some(function.clone()),
        };
        let caller = mem::replace(&mut self.frame, callee);
        self.depth += 1;
        let outcome = (function.entry())(self);
        self.depth -= 1;
        let callee = mem::replace(&mut self.frame, caller);

        match outcome {
            Ok(produced) => {
                let produced = produced.min(self.stack.len().saturating_sub(callee.base));
                let first_result = self.stack.len() - produced;
                self.stack.drain(func_slot..first_result);
                match usize::try_from(nresults) {
                    Ok(wanted) => {
                        self.stack.resize(func_slot + wanted, Value::Nil);
                        Ok(wanted)
                    }
                    Err(_) => Ok(produced),
                }
            }
            Err(error) => {
                tracing::trace!(%error, "call failed");
                self.stack.truncate(func_slot);
                Err(error)
            }
        }
    }

    /// Pushes a new empty table.
    pub fn new_table(&mut self) {
        self.push(Table::new());
    }

    fn table_at(&self, index: i32) -> Result<Table, RuntimeError> {
        match self.get(index) {
            Some(Value::Table(table)) => Ok(table.clone()),
            Some(other) => Err(RuntimeError::NotIndexable(other.ty().name())),
            None => Err(RuntimeError::InvalidIndex(index)),
        }
    }

    fn pop_value(&mut self) -> Result<Value, RuntimeError> {
        if self.top() == 0 {
            return Err(RuntimeError::InvalidIndex(-1));
        }
        self.stack.pop().ok_or(RuntimeError::InvalidIndex(-1))
    }

    /// Pops the topmost value and stores it as field `name` of the table
    /// at `index`. `index` is resolved before the pop.
    pub fn set_field(&mut self, index: i32, name: &str) -> Result<(), RuntimeError> {
        let table = self.table_at(index)?;
        let value = self.pop_value()?;
        table.set(name, value);
        Ok(())
    }

    /// Pushes field `name` of the table at `index` and returns its type.
    pub fn get_field(&mut self, index: i32, name: &str) -> Result<Type, RuntimeError> {
        let value = self.table_at(index)?.get(name);
        let ty = value.ty();
        self.push(value);
        Ok(ty)
    }

    /// Pops the topmost value and stores it as global `name`.
    pub fn set_global(&mut self, name: &str) -> Result<(), RuntimeError> {
        let value = self.pop_value()?;
        self.globals.set(name, value);
        Ok(())
    }

    /// Pushes global `name` and returns its type.
    pub fn get_global(&mut self, name: &str) -> Type {
        let value = self.globals.get(name);
        let ty = value.ty();
        self.push(value);
        ty
    }

    /// The table of globals.
    pub fn globals(&self) -> &Table {
        &self.globals
    }

    /// Converts `value` and stores it as global `name`.
    pub fn set_variable<T: ToStack>(&mut self, name: &str, value: T) -> Result<(), RuntimeError> {
        let mut state = StackCheck::new(self);
        state.check_stack(1)?;
        value.to_stack(&mut state);
        state.set_global(name)
    }

    /// Reads global `name`, falling back to `default` when it is missing
    /// or does not convert.
    pub fn get_variable<T: FromStack>(&mut self, name: &str, default: T) -> T {
        let mut state = StackGuard::new(self);
        state.get_global(name);
        T::from_stack(&state, -1, default)
    }

    /// Moves `value` into new userdata stored as global `name` and returns
    /// a handle to it. The stack is left unchanged.
    pub fn set_userdata<T: Any>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<AnyUserData, RuntimeError> {
        let userdata = AnyUserData::new(value);
        let mut state = StackCheck::new(self);
        state.check_stack(1)?;
        state.push(Value::UserData(userdata.clone()));
        state.set_global(name)?;
        Ok(userdata)
    }

    /// The raw length of the value at `index`: the byte length of a
    /// string, the field count of a table, the size of userdata, and 0
    /// for anything else.
    pub fn raw_len(&self, index: i32) -> usize {
        match self.get(index) {
            Some(Value::String(s)) => s.len(),
            Some(Value::Table(table)) => table.len(),
            Some(Value::UserData(userdata)) => userdata.size(),
            _ => 0,
        }
    }

    /// Removes every value from frame position `from + 1` up.
    pub(crate) fn drain_from(&mut self, from: usize) -> Vec<Value> {
        let start = (self.frame.base + from).min(self.stack.len());
        self.stack.split_off(start)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("top", &self.top())
            .field("depth", &self.depth)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{upvalue_index, ReceiverPolicy, MULTRET};
    use pretty_assertions::assert_eq;

    fn sum_all(state: &mut State) -> Result<usize, RuntimeError> {
        let mut total = 0;
        for index in 1..=state.top() as i32 {
            total += i64::from_stack(state, index, 0);
        }
        state.push(total);
        Ok(1)
    }

    fn three_values(state: &mut State) -> Result<usize, RuntimeError> {
        state.push(1);
        state.push(2);
        state.push(3);
        Ok(3)
    }

    fn first_upvalue(state: &mut State) -> Result<usize, RuntimeError> {
        let value = state.get(upvalue_index(1)).cloned().unwrap_or_default();
        state.push(value);
        Ok(1)
    }

    #[test]
    fn indices_are_frame_relative() {
        let mut state = State::new();
        state.push("a");
        state.push("b");
        assert_eq!(state.absolute(1), Some(1));
        assert_eq!(state.absolute(-1), Some(2));
        assert_eq!(state.absolute(3), None);
        assert_eq!(state.absolute(-3), None);
        assert_eq!(state.absolute(0), None);
        assert_eq!(state.type_at(-2), Some(Type::String));
        assert_eq!(state.get(upvalue_index(1)), None);
    }

    #[test]
    fn call_replaces_function_and_arguments_with_results() {
        let mut state = State::new();
        state.push("below");
        state.push(Function::new_native(sum_all, vec![]));
        state.push(1);
        state.push(2);
        state.push(3);
        assert_eq!(state.call(3, 1).unwrap(), 1);
        assert_eq!(state.top(), 2);
        assert_eq!(state.get(-1), Some(&Value::Integer(6)));
        assert_eq!(state.get(1), Some(&Value::from("below")));
    }

    #[test]
    fn results_are_adjusted() {
        let mut state = State::new();
        state.push(Function::new_native(three_values, vec![]));
        assert_eq!(state.call(0, MULTRET).unwrap(), 3);
        assert_eq!(state.top(), 3);

        state.set_top(0);
        state.push(Function::new_native(three_values, vec![]));
        assert_eq!(state.call(0, 1).unwrap(), 1);
        assert_eq!(state.get(1), Some(&Value::Integer(1)));

        state.set_top(0);
        state.push(Function::new_native(three_values, vec![]));
        assert_eq!(state.call(0, 5).unwrap(), 5);
        assert_eq!(state.get(5), Some(&Value::Nil));
    }

    #[test]
    fn calling_a_non_function_discards_it() {
        let mut state = State::new();
        state.push(1);
        state.push(2);
        let err = state.call(1, 0).unwrap_err();
        assert!(matches!(err, RuntimeError::NotCallable("number")));
        assert_eq!(state.top(), 0);
    }

    #[test]
    fn closures_see_their_upvalues() {
        let mut state = State::new();
        state.push("captured");
        state.push_closure(first_upvalue, 1).unwrap();
        assert_eq!(state.top(), 1);
        state.call(0, 1).unwrap();
        assert_eq!(state.get(1), Some(&Value::from("captured")));
    }

    #[test]
    fn stack_limit_is_enforced() {
        let config = Config {
            max_stack: 4,
            ..Config::default()
        };
        let mut state = State::with_config(config);
        state.check_stack(4).unwrap();
        let err = state.check_stack(5).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::StackOverflow {
                requested: 5,
                limit: 4
            }
        ));
        assert_eq!(state.config().missing_receiver, ReceiverPolicy::Skip);
    }

    #[test]
    fn oversized_stack_limit_is_clamped() {
        let config = Config {
            max_stack: DEFAULT_MAX_STACK * 2,
            ..Config::default()
        };
        let state = State::with_config(config);
        assert_eq!(state.config().max_stack, DEFAULT_MAX_STACK);
    }

    #[test]
    fn deepest_negative_index_is_not_an_upvalue() {
        let mut state = State::new();
        state.set_top(DEFAULT_MAX_STACK);
        state.push(3);
        let deepest = -(DEFAULT_MAX_STACK as i32) - 1;
        assert_eq!(state.absolute(deepest), Some(1));
        assert_eq!(state.get(-1), Some(&Value::Integer(3)));
        assert_eq!(state.get(-(DEFAULT_MAX_STACK as i32)), Some(&Value::Nil));
    }

    #[test]
    fn call_depth_is_limited() {
        fn recurse(state: &mut State) -> Result<usize, RuntimeError> {
            state.push(Function::new_native(recurse, vec![]));
            state.call(0, 0)
        }

        let config = Config {
            max_call_depth: 8,
            ..Config::default()
        };
        let mut state = State::with_config(config);
        state.push(Function::new_native(recurse, vec![]));
        let err = state.call(0, 0).unwrap_err();
        assert!(matches!(err, RuntimeError::CallDepthExceeded(8)));
        assert_eq!(state.top(), 0);
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn tables_and_globals() {
        let mut state = State::new();
        state.new_table();
        state.push(10);
        state.set_field(-2, "x").unwrap();
        assert_eq!(state.top(), 1);
        assert_eq!(state.get_field(1, "x").unwrap(), Type::Integer);
        assert_eq!(state.get_field(1, "y").unwrap(), Type::Nil);
        state.pop(2);
        assert_eq!(state.raw_len(1), 1);
        state.set_global("t").unwrap();
        assert_eq!(state.top(), 0);
        assert_eq!(state.get_global("t"), Type::Table);

        state.push(3);
        let err = state.set_field(-1, "x").unwrap_err();
        assert!(matches!(err, RuntimeError::NotIndexable("number")));
    }

    #[test]
    fn variables_convert_through_the_stack() {
        let mut state = State::new();
        state.set_variable("answer", 42u8).unwrap();
        state.set_variable("name", "Ann").unwrap();
        assert_eq!(state.get_variable("answer", 0i64), 42);
        assert_eq!(state.get_variable("name", String::new()), "Ann");
        assert_eq!(state.get_variable("missing", 7i32), 7);
        assert_eq!(state.top(), 0);
        assert_eq!(state.raw_len(1), 0);
        assert!(state.globals().contains("name"));
    }

    #[test]
    fn userdata_globals_leave_the_stack_balanced() {
        let mut state = State::new();
        state.push("below");
        let userdata = state.set_userdata("buffer", [0u8; 16]).unwrap();
        assert_eq!(state.top(), 1);
        assert_eq!(userdata.size(), 16);

        assert_eq!(state.get_global("buffer"), Type::UserData);
        assert_eq!(state.raw_len(-1), 16);
        let stored = state.get(-1).and_then(Value::userdata).unwrap();
        assert!(AnyUserData::ptr_eq(stored, &userdata));
        assert_eq!(stored.downcast_ref::<[u8; 16]>(), Some(&[0u8; 16]));
    }
}
