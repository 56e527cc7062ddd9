//! Stack index conventions.
//!
//! Positive indices are 1-based and relative to the base of the running
//! call frame. Negative indices count down from the top of the stack
//! (`-1` is the topmost value). Indices at or below [`UPVALUE_BASE`] are
//! pseudo-indices addressing the upvalues of the running closure.

/// Default limit for the number of live stack slots in a state.
pub const DEFAULT_MAX_STACK: usize = 1_000_000;

/// Default limit for nested native calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

/// Passed as `nresults` to keep every value returned by a call.
pub const MULTRET: i32 = -1;

/// Upvalue pseudo-indices start right below this value.
pub const UPVALUE_BASE: i32 = -(DEFAULT_MAX_STACK as i32) - 1000;

/// Returns the pseudo-index of the `n`-th (1-based) upvalue of the
/// running closure.
///
/// ```
/// use stackbind_types::{upvalue_index, upvalue_slot};
///
/// assert_eq!(upvalue_slot(upvalue_index(1)), Some(0));
/// ```
pub const fn upvalue_index(n: i32) -> i32 {
    UPVALUE_BASE - n
}

/// Whether `index` is an upvalue pseudo-index.
pub const fn is_upvalue_index(index: i32) -> bool {
    index < UPVALUE_BASE
}

/// Converts an upvalue pseudo-index to a 0-based slot in the closure's
/// upvalue list.
pub const fn upvalue_slot(index: i32) -> Option<usize> {
    if is_upvalue_index(index) {
        Some((UPVALUE_BASE - index - 1) as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upvalue_indices_do_not_collide_with_stack_indices() {
        assert!(!is_upvalue_index(1));
        assert!(!is_upvalue_index(-1));
        assert!(!is_upvalue_index(-(DEFAULT_MAX_STACK as i32)));
        assert!(is_upvalue_index(upvalue_index(1)));
        assert_eq!(upvalue_slot(upvalue_index(3)), Some(2));
        assert_eq!(upvalue_slot(-1), None);
    }
}
