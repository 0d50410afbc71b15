//! Invariant checking hooks run after structural edits.
//!
//! Checks are compiled in for debug builds and whenever the
//! `strict-invariants` or `check-invariants` feature is enabled; release
//! builds without those features skip them entirely.

use crate::topo_error::TopoError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), TopoError>;

    /// Panic on the first violation when invariant checking is compiled in.
    fn debug_assert_invariants(&self) {
        #[cfg(any(
            debug_assertions,
            feature = "strict-invariants",
            feature = "check-invariants"
        ))]
        if let Err(e) = self.validate_invariants() {
            panic!("[invariants] {e}");
        }
    }
}

/// Validate `$target` after the operation named `$op` and panic on error when
/// invariant checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($target:expr, $op:literal) => {{
        #[cfg(any(
            debug_assertions,
            feature = "strict-invariants",
            feature = "check-invariants"
        ))]
        {
            if let Err(e) = $crate::debug_invariants::DebugInvariants::validate_invariants($target) {
                panic!(concat!("[invariants] after `", $op, "`: {}"), e);
            }
        }
    }};
}
