//! Typed identifiers for graph elements, vehicles and requesters.
//!
//! Graph ids are dense indices into `RoadGraph` arrays and vehicle ids are
//! positions in the fleet roster, so both index a `Vec` through `.index()`.
//! Requester ids come from a counter and are never reused.  Each id prints
//! with a short tag (`node#4`, `req#17`) so log lines stay readable; the
//! `INVALID` sentinel prints as `req#-`.

use std::fmt;

macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident(u32) as $tag:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[derive(serde::Serialize, serde::Deserialize)]
        $vis struct $name(pub u32);

        impl $name {
            /// Marks an absent id; also the `Default`.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($tag, "#{}"), self.0)
                } else {
                    f.write_str(concat!($tag, "#-"))
                }
            }
        }
    };
}

typed_id! {
    /// Dense index of a road-graph node (assigned at load time, not the
    /// identity used in the graph file).
    pub struct NodeId(u32) as "node";
}

typed_id! {
    /// Index of a directed road-graph edge.
    pub struct EdgeId(u32) as "edge";
}

typed_id! {
    /// Position of a vehicle in the fixed fleet roster.
    pub struct VehicleId(u32) as "veh";
}

typed_id! {
    /// Identity of a ride requester, unique for the lifetime of the engine.
    pub struct RequesterId(u32) as "req";
}
