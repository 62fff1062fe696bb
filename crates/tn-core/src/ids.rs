//! Strongly typed identifiers.
//!
//! Dense ids (`ClusterId`, `NodeId`, `EdgeId`, …) are `Copy + Ord + Hash`
//! integer wrappers used as `Vec` indices and map keys.  External ids coming
//! from input files (`WayId`) are strings, because upstream data mixes
//! integer and textual identifiers.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID".
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// A junction.  Clusters are numbered densely in order of their lowest
    /// endpoint index, so the numbering does not depend on union order.
    pub struct ClusterId(u32);
}

typed_id! {
    /// Arena handle of a node in the in-memory trail graph or routing network.
    pub struct NodeId(u32);
}

typed_id! {
    /// Arena handle of an edge in the in-memory trail graph or routing network.
    pub struct EdgeId(u32);
}

typed_id! {
    /// Identifier of a stored geometry point (persisted routing graph vertex).
    pub struct GeometryId(u64);
}

typed_id! {
    /// Identifier of a stored, simplified path.
    pub struct PathId(u64);
}

// ── WayId ─────────────────────────────────────────────────────────────────────

/// External identifier of an input way, or the synthetic id of a merged
/// segment (`merged_{a}_{b}`).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WayId(pub String);

impl WayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthetic id for the segment produced by contracting `a` then `b`.
    pub fn merged(a: &WayId, b: &WayId) -> Self {
        Self(format!("merged_{}_{}", a.0, b.0))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WayId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<i64> for WayId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

// ── EndpointId ────────────────────────────────────────────────────────────────

/// Which physical end of a way's geometry.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WayEnd {
    Start,
    End,
}

/// One end of a way.  Displays as `{way}_start` / `{way}_end`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndpointId {
    pub way: WayId,
    pub end: WayEnd,
}

impl EndpointId {
    pub fn start(way: &WayId) -> Self {
        Self { way: way.clone(), end: WayEnd::Start }
    }

    pub fn end(way: &WayId) -> Self {
        Self { way: way.clone(), end: WayEnd::End }
    }

    #[inline]
    pub fn is_start(&self) -> bool {
        self.end == WayEnd::Start
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            WayEnd::Start => write!(f, "{}_start", self.way),
            WayEnd::End   => write!(f, "{}_end", self.way),
        }
    }
}
