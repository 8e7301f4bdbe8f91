//! Typed identifiers for stage nodes and resources
//!
//! Every id is a process-unique integer issued by an [`IdGenerator`]. Ids are
//! never reused by the generator that issued them, so a lookup with an id whose
//! object was destroyed simply fails to resolve instead of finding a newer
//! object that happens to sit at the same address or slot.
//!
//! Generators are plain values owned by whatever registry hands out ids. Two
//! registries (or two tests) never share a counter.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Typed identifier. `T` is a marker type and carries no data.
pub struct Id<T> {
    value: u64,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    /// Wrap a raw value. Mostly useful for tests and debugging tools.
    pub const fn from_raw(value: u64) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// The raw integer value
    pub const fn raw(self) -> u64 {
        self.value
    }
}

// Manual impls: derives would require `T: Clone` etc. on the marker type.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: IdKind> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", T::NAME, self.value)
    }
}

impl<T: IdKind> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", T::NAME, self.value)
    }
}

/// Name used when printing ids of a given kind
pub trait IdKind {
    /// Human readable kind name
    const NAME: &'static str;
}

macro_rules! id_kind {
    ($(#[$meta:meta])* $marker:ident, $alias:ident, $name:literal) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub enum $marker {}

        impl IdKind for $marker {
            const NAME: &'static str = $name;
        }

        $(#[$meta])*
        pub type $alias = Id<$marker>;
    };
}

id_kind!(
    /// Stage node (actor, camera, light)
    NodeTag, NodeId, "Node"
);
id_kind!(
    /// Mesh resource
    MeshTag, MeshId, "Mesh"
);
id_kind!(
    /// Material resource
    MaterialTag, MaterialId, "Material"
);
id_kind!(
    /// Texture resource (opaque to the batcher)
    TextureTag, TextureId, "Texture"
);
id_kind!(
    /// Shader program (opaque to the batcher)
    ShaderTag, ShaderId, "Shader"
);
id_kind!(
    /// Registration in a signal, watch list or task list
    ConnectionTag, ConnectionId, "Connection"
);

/// Issues monotonically increasing ids. Zero is never issued.
#[derive(Debug, Default, Clone)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    /// Create a generator whose first id is 1
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Issue the next id
    pub fn next<T>(&mut self) -> Id<T> {
        self.last += 1;
        Id::from_raw(self.last)
    }

    /// Number of ids issued so far
    pub const fn issued(&self) -> u64 {
        self.last
    }
}
