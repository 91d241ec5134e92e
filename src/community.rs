use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{GraphError, Result};
use crate::types::VInt;

pub mod girvan_newman;
pub mod greedy_modularity;

/// Leader id of a community, the smallest member by convention.
pub type CommID = VInt;

/// Disjoint communities keyed by their leader.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Partition {
    communities: BTreeMap<CommID, BTreeSet<VInt>>,
}

impl Partition {
    /// One community per vertex.
    pub fn singletons(vertices: &[VInt]) -> Partition {
        Partition {
            communities: vertices.iter()
                .map(|v| (*v, BTreeSet::from([*v])))
                .collect(),
        }
    }

    /// Build from member groups; each group is led by its smallest member.
    pub fn from_groups<I>(groups: I) -> Partition
    where
        I: IntoIterator<Item = Vec<VInt>>,
    {
        let mut communities = BTreeMap::new();
        for group in groups {
            let members: BTreeSet<VInt> = group.into_iter().collect();
            if let Some(leader) = members.first() {
                communities.insert(*leader, members);
            }
        }
        Partition { communities }
    }

    pub fn len(&self) -> usize {
        self.communities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// Communities in ascending leader order.
    pub fn communities(&self) -> &BTreeMap<CommID, BTreeSet<VInt>> {
        &self.communities
    }

    pub fn leaders(&self) -> Vec<CommID> {
        self.communities.keys().copied().collect()
    }

    pub fn members(&self, leader: CommID) -> Option<&BTreeSet<VInt>> {
        self.communities.get(&leader)
    }

    /// Leader of the community holding `vertex_id`.
    pub fn community_of(&self, vertex_id: VInt) -> Option<CommID> {
        self.communities.iter()
            .find(|(_, members)| members.contains(&vertex_id))
            .map(|(leader, _)| *leader)
    }

    /// Whether every vertex of `vertices` sits in exactly one community and
    /// no community holds anything else.
    pub fn covers(&self, vertices: &[VInt]) -> bool {
        let mut seen = BTreeSet::new();
        for members in self.communities.values() {
            for v in members {
                if !seen.insert(*v) {
                    return false;
                }
            }
        }
        let expected: BTreeSet<VInt> = vertices.iter().copied().collect();
        seen == expected
    }

    /// Merge two communities under the lesser leader, which is returned.
    pub fn merge(&mut self, first: CommID, second: CommID) -> Result<CommID> {
        if first == second {
            return Ok(first);
        }
        let first_members = self.communities.remove(&first)
            .ok_or(GraphError::UnknownVertex(first))?;
        let second_members = match self.communities.remove(&second) {
            Some(members) => members,
            None => {
                // Put the first one back so the partition is untouched.
                self.communities.insert(first, first_members);
                return Err(GraphError::UnknownVertex(second));
            }
        };
        let leader = first.min(second);
        let mut merged = first_members;
        merged.extend(second_members);
        self.communities.insert(leader, merged);
        Ok(leader)
    }
}
