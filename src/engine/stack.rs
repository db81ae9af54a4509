//! Stack-limit computation.
//!
//! The limit is measured from the address of a local on the caller's
//! stack, assuming the stack grows downward.

/// Machine word size; also the clamp value when the subtraction wraps.
pub const WORD: usize = std::mem::size_of::<usize>();

/// Address `size` bytes below this function's own parameter.
///
/// Informational only: the engine derives its own limit from the configured
/// stack size, and this value is logged at engine init.
#[inline(never)]
pub fn stack_limit(size: usize) -> usize {
    let anchor = std::ptr::addr_of!(size) as usize;
    limit_below(anchor, size)
}

/// Address `size` bytes below `anchor`, rounded down to whole words.
///
/// Always at least one word below the anchor. If that would wrap past the
/// anchor (or land on null), returns `WORD`.
pub fn limit_below(anchor: usize, size: usize) -> usize {
    let span = (size / WORD).max(1).saturating_mul(WORD);
    match anchor.checked_sub(span) {
        Some(limit) if limit != 0 => limit,
        _ => WORD,
    }
}
