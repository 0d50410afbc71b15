//! Opaque handles to the geometry carried by topology entities.
//!
//! The topology graph never looks inside geometry; it only checks that the
//! *kind* of a handle fits the entity it is attached to (vertex → point,
//! edge → curve, face → surface).

use std::fmt;

use crate::topo_error::TopoError;

/// Kind of geometry a [`GeometryRef`] points at.
///
/// Discriminants are the stable numeric codes used by external stores.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum GeometryKind {
    #[default]
    None = 0,
    Point = 1,
    Curve = 2,
    Surface = 3,
}

impl GeometryKind {
    /// Numeric code of this kind.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for GeometryKind {
    type Error = TopoError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(GeometryKind::None),
            1 => Ok(GeometryKind::Point),
            2 => Ok(GeometryKind::Curve),
            3 => Ok(GeometryKind::Surface),
            _ => Err(TopoError::UnknownCode {
                what: "geometry kind",
                code,
            }),
        }
    }
}

/// Immutable, copyable handle to a piece of geometry.
///
/// `handle` is meaningful only to whoever owns the geometry tables (see
/// [`BRep`](crate::brep::BRep)); the topology layer treats it as opaque.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(from = "RawGeometryRef")]
pub struct GeometryRef {
    kind: GeometryKind,
    handle: u64,
}

/// Wire shape of [`GeometryRef`]; decoded values go through [`GeometryRef::new`].
#[derive(serde::Deserialize)]
struct RawGeometryRef {
    kind: GeometryKind,
    handle: u64,
}

impl From<RawGeometryRef> for GeometryRef {
    fn from(raw: RawGeometryRef) -> Self {
        GeometryRef::new(raw.kind, raw.handle)
    }
}

impl GeometryRef {
    /// The absent geometry.
    pub const NONE: GeometryRef = GeometryRef {
        kind: GeometryKind::None,
        handle: 0,
    };

    /// Build a handle of an explicit kind. A `None` kind always drops the payload.
    #[inline]
    pub const fn new(kind: GeometryKind, handle: u64) -> Self {
        match kind {
            GeometryKind::None => Self::NONE,
            _ => Self { kind, handle },
        }
    }

    #[inline]
    pub const fn point(handle: u64) -> Self {
        Self::new(GeometryKind::Point, handle)
    }

    #[inline]
    pub const fn curve(handle: u64) -> Self {
        Self::new(GeometryKind::Curve, handle)
    }

    #[inline]
    pub const fn surface(handle: u64) -> Self {
        Self::new(GeometryKind::Surface, handle)
    }

    #[inline]
    pub const fn kind(self) -> GeometryKind {
        self.kind
    }

    #[inline]
    pub const fn handle(self) -> u64 {
        self.handle
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        matches!(self.kind, GeometryKind::None)
    }
}

impl fmt::Debug for GeometryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("GeometryRef(None)")
        } else {
            f.debug_tuple("GeometryRef")
                .field(&self.kind)
                .field(&self.handle)
                .finish()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for kind in [
            GeometryKind::None,
            GeometryKind::Point,
            GeometryKind::Curve,
            GeometryKind::Surface,
        ] {
            assert_eq!(GeometryKind::try_from(kind.code()), Ok(kind));
        }
        assert_eq!(
            GeometryKind::try_from(4),
            Err(TopoError::UnknownCode {
                what: "geometry kind",
                code: 4
            })
        );
    }

    #[test]
    fn none_kind_discards_handle() {
        let g = GeometryRef::new(GeometryKind::None, 99);
        assert_eq!(g, GeometryRef::NONE);
        assert!(g.is_none());
        assert_eq!(g.handle(), 0);
    }

    #[test]
    fn decoding_a_none_kind_discards_handle() {
        let g: GeometryRef = serde_json::from_str(r#"{"kind":"None","handle":7}"#).unwrap();
        assert_eq!(g, GeometryRef::NONE);
        assert_eq!(g.handle(), 0);

        let c: GeometryRef = serde_json::from_str(r#"{"kind":"Curve","handle":7}"#).unwrap();
        assert_eq!(c, GeometryRef::curve(7));
        let json = serde_json::to_string(&c).unwrap();
        assert_eq!(serde_json::from_str::<GeometryRef>(&json).unwrap(), c);
    }

    #[test]
    fn constructors_tag_kind() {
        assert_eq!(GeometryRef::point(3).kind(), GeometryKind::Point);
        assert_eq!(GeometryRef::curve(3).kind(), GeometryKind::Curve);
        assert_eq!(GeometryRef::surface(3).handle(), 3);
        assert_ne!(GeometryRef::point(3), GeometryRef::curve(3));
        assert_eq!(format!("{:?}", GeometryRef::curve(5)), "GeometryRef(Curve, 5)");
    }
}
