//! Stack growth for `compile_expr`.
//!
//! Compiling a node compiles its children first, so compile depth equals tree
//! depth. Rewritten member chains nest one `Member` per hop plus the null
//! tests, and a request thread may not have room for that.

/// Headroom below which `compile_expr` moves to a fresh segment.
#[cfg(not(target_arch = "wasm32"))]
const COMPILE_RED_ZONE: usize = 64 * 1024;

/// Size of each segment `stacker` allocates for compilation.
#[cfg(not(target_arch = "wasm32"))]
const COMPILE_SEGMENT: usize = 1024 * 1024;

/// Run one compilation step on a stack with at least `COMPILE_RED_ZONE`
/// bytes free.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(compile_step: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(COMPILE_RED_ZONE, COMPILE_SEGMENT, compile_step)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(compile_step: impl FnOnce() -> R) -> R {
    compile_step()
}
