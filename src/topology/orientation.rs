//! Orientation of a topology entity relative to its geometry or owner.
//!
//! Orientations compose along a containment path like a sign flip (group C₂),
//! with one extra absorbing element for entities whose sense is not known:
//!
//! | `compose` | Forward  | Reversed | Unknown |
//! |-----------|----------|----------|---------|
//! | Forward   | Forward  | Reversed | Unknown |
//! | Reversed  | Reversed | Forward  | Unknown |
//! | Unknown   | Unknown  | Unknown  | Unknown |
//!
//! `Forward` is the identity, so [`accumulate_path`] over an empty path is
//! `Forward`.

use core::fmt::{Debug, Formatter};

use crate::topo_error::TopoError;

/// Sense of an entity. Discriminants are the stable numeric codes.
#[derive(
    Copy, Clone, Eq, PartialEq, Hash, Default, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    Forward = 0,
    Reversed = 1,
    Unknown = 2,
}

impl Debug for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Orientation::Forward => "Forward",
            Orientation::Reversed => "Reversed",
            Orientation::Unknown => "Unknown",
        })
    }
}

impl Orientation {
    /// "Do `a`, then `b`" along a path. XOR on the known senses.
    #[inline]
    pub const fn compose(a: Self, b: Self) -> Self {
        match (a, b) {
            (Orientation::Unknown, _) | (_, Orientation::Unknown) => Orientation::Unknown,
            (Orientation::Forward, x) | (x, Orientation::Forward) => x,
            (Orientation::Reversed, Orientation::Reversed) => Orientation::Forward,
        }
    }

    /// The opposite sense; `Unknown` stays `Unknown`.
    #[inline]
    pub const fn reversed(self) -> Self {
        match self {
            Orientation::Forward => Orientation::Reversed,
            Orientation::Reversed => Orientation::Forward,
            Orientation::Unknown => Orientation::Unknown,
        }
    }

    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, Orientation::Unknown)
    }

    /// True when both senses are known and differ.
    #[inline]
    pub const fn opposes(self, other: Self) -> bool {
        matches!(
            (self, other),
            (Orientation::Forward, Orientation::Reversed)
                | (Orientation::Reversed, Orientation::Forward)
        )
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Orientation {
    type Error = TopoError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Orientation::Forward),
            1 => Ok(Orientation::Reversed),
            2 => Ok(Orientation::Unknown),
            _ => Err(TopoError::UnknownCode {
                what: "orientation",
                code,
            }),
        }
    }
}

impl From<bool> for Orientation {
    /// `true` is `Forward` (same sense), `false` is `Reversed`.
    #[inline]
    fn from(same_sense: bool) -> Self {
        if same_sense {
            Orientation::Forward
        } else {
            Orientation::Reversed
        }
    }
}

/// Accumulate a sequence of orientation steps along a path, left-to-right.
/// Returns the total orientation from the start of the path to its end.
#[inline]
pub fn accumulate_path<I>(path: I) -> Orientation
where
    I: IntoIterator<Item = Orientation>,
{
    path.into_iter()
        .fold(Orientation::Forward, Orientation::compose)
}
