//! Structural self-checks for containers built from untrusted input.

use crate::mesh_error::MeshRegridError;

/// Types that can verify their own structural invariants.
pub trait DebugInvariants {
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshRegridError>;

    /// Panic on a broken invariant in debug builds, or in any build with the
    /// `check-invariants` feature.
    #[track_caller]
    fn debug_assert_invariants(&self) {
        if cfg!(any(debug_assertions, feature = "check-invariants")) {
            if let Err(e) = self.validate_invariants() {
                panic!("[invariants] {}: {e}", std::any::type_name::<Self>());
            }
        }
    }
}
