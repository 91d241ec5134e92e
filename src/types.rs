use std::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Vertex label, unique within one graph.
pub type VInt = u32;

/// Whether edges are ordered pairs or unordered pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Directedness {
    Directed,
    Undirected,
}

impl Directedness {
    pub fn from_flag(directed: bool) -> Self {
        if directed {
            Directedness::Directed
        } else {
            Directedness::Undirected
        }
    }

    pub fn is_directed(&self) -> bool {
        matches!(self, Directedness::Directed)
    }
}

/// A pair of endpoints.
///
/// Equality and hashing are plain field-wise. Undirected graphs hand out and
/// look up edges through [`Edge::canonical`], so `(3, 1)` and `(1, 3)` name
/// the same stored edge there. The derived ordering only fixes the iteration
/// order of edge-keyed maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: VInt,
    pub to: VInt,
}

impl Edge {
    pub fn new(from: VInt, to: VInt) -> Self {
        Edge { from, to }
    }

    /// The storage key of this edge under the given directedness.
    pub fn canonical(self, directedness: Directedness) -> Self {
        match directedness {
            Directedness::Directed => self,
            Directedness::Undirected => {
                if self.from <= self.to {
                    self
                } else {
                    Edge { from: self.to, to: self.from }
                }
            }
        }
    }

    /// The endpoint opposite to `vertex`, if `vertex` is one of the endpoints.
    pub fn other(&self, vertex: VInt) -> Option<VInt> {
        if self.from == vertex {
            Some(self.to)
        } else if self.to == vertex {
            Some(self.from)
        } else {
            None
        }
    }

    pub fn is_tail_or_head(&self, vertex: VInt) -> bool {
        self.from == vertex || self.to == vertex
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.from, self.to)
    }
}

impl From<(VInt, VInt)> for Edge {
    fn from(pair: (VInt, VInt)) -> Self {
        Edge::new(pair.0, pair.1)
    }
}
