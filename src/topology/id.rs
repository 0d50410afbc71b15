//! `PersistentId`: a strong, zero-cost handle for topology entities
//!
//! Every entity of a [`TopoGraph`](crate::topology::graph::TopoGraph) is named
//! by a `PersistentId`. Ids wrap a nonzero `u64` so 0 stays reserved as an
//! invalid or sentinel value, and they are never reissued within a graph, so
//! external stores keyed by id see a lookup miss instead of a silent alias once
//! an entity goes away.
//!
//! This module provides:
//! - A transparent `PersistentId` newtype around `NonZeroU64`.
//! - Fallible constructors and accessors.
//! - `Debug`, `Display`, ordering and hashing so ids can key maps and sets.

use std::{fmt, num::NonZeroU64};

use crate::topo_error::TopoError;

/// Stable identifier of a topology entity.
///
/// # Memory layout
/// This type is `repr(transparent)`, meaning it has the same ABI and
/// alignment as its single field (`NonZeroU64`), and `Option<PersistentId>`
/// is still eight bytes.
#[derive(
    Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[repr(transparent)]
pub struct PersistentId(NonZeroU64);

impl PersistentId {
    /// Creates a new `PersistentId` from a raw `u64` value.
    ///
    /// # Errors
    /// Returns [`TopoError::InvalidPersistentId`] if `raw == 0`.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use brep_topo::topology::id::PersistentId;
    /// let id = PersistentId::new(1).unwrap();
    /// assert_eq!(id.get(), 1);
    /// ```
    #[inline]
    pub fn new(raw: u64) -> Result<Self, TopoError> {
        NonZeroU64::new(raw)
            .map(PersistentId)
            .ok_or(TopoError::InvalidPersistentId)
    }

    /// Returns the inner `u64` value of this `PersistentId`.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0.get()
    }
}

impl TryFrom<u64> for PersistentId {
    type Error = TopoError;

    #[inline]
    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        PersistentId::new(raw)
    }
}

impl From<PersistentId> for u64 {
    #[inline]
    fn from(id: PersistentId) -> Self {
        id.get()
    }
}

// -----------------------------------------------------------------------------
// Formatting traits
// -----------------------------------------------------------------------------

/// Displays as `PersistentId(raw_value)`.
impl fmt::Debug for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PersistentId").field(&self.get()).finish()
    }
}

/// Prints only the raw integer.
impl fmt::Display for PersistentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}
