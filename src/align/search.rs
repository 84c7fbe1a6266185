//! align::search
//!
//! A* search over match decisions.
//!
//! # State
//!
//! A [`DecisionTreeNode`] has resolved the first `k` candidate clusters.
//! Besides `k` it carries the order frontier (the highest graph position
//! accepted in witness order so far) and the set of *contested* vertices
//! already consumed. A contested vertex is the candidate of a unique cluster
//! and of at least one other cluster; every other vertex can only be taken
//! once by construction, since in-order accepts strictly increase the
//! frontier and displaced accepts are reserved for unique clusters.
//!
//! # Costs
//!
//! | decision          | cost                                    |
//! |-------------------|-----------------------------------------|
//! | in-order accept   | candidate's edit distance               |
//! | displaced accept  | candidate's edit distance, 1 displaced  |
//! | reject            | 1 rejected                              |
//!
//! A [`SearchCost`] compares rejected tokens first, then near-match
//! distance, then displaced accepts. No number of displacements or edits
//! adds up to a reject, so the search always keeps the largest match set
//! and the outcome does not depend on the near-match threshold.
//!
//! The heuristic sums, over the unresolved clusters, the cheapest cost each
//! could possibly incur. It never overestimates and drops by at most the
//! step cost along every edge, so the first goal popped is optimal.
//!
//! # Determinism
//!
//! The frontier is ordered by f-score, then by depth (more resolved
//! clusters first), then by insertion sequence. Among partial solutions of
//! equal f-score the deepest is finished first; insertion order settles
//! ties at equal depth. Children are pushed in a fixed order, so
//! equal-cost alternatives always resolve the same way.
//!
//! # Size
//!
//! The number of expanded nodes grows with the number of distinct order
//! frontiers reachable per cluster, which is large for long witnesses over
//! a small vocabulary. Callers bound it with `max_witness_tokens`.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};
use std::fmt;
use std::ops::Add;
use std::rc::Rc;

use serde::Serialize;

use super::matcher::{Candidate, Cluster, Match};

/// Cost of a set of decisions, ordered field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SearchCost {
    /// Witness tokens left unmatched.
    pub rejected: u32,
    /// Summed edit distance of near matches.
    pub distance: u32,
    /// Unique matches accepted out of witness order.
    pub displaced: u32,
}

impl SearchCost {
    pub const ZERO: Self = Self {
        rejected: 0,
        distance: 0,
        displaced: 0,
    };

    fn reject() -> Self {
        Self {
            rejected: 1,
            ..Self::ZERO
        }
    }

    fn accept(candidate: &Candidate, displaced: bool) -> Self {
        Self {
            rejected: 0,
            distance: candidate.cost,
            displaced: u32::from(displaced),
        }
    }
}

impl Add for SearchCost {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            rejected: self.rejected + other.rejected,
            distance: self.distance + other.distance,
            displaced: self.displaced + other.displaced,
        }
    }
}

impl fmt::Display for SearchCost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} rejected, {} edits, {} displaced",
            self.rejected, self.distance, self.displaced
        )
    }
}

/// What was decided for one cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Take `candidate` (an index into the cluster's candidates).
    Accept { candidate: usize, displaced: bool },
    /// Leave the token unmatched.
    Reject,
}

/// A partial assignment of decisions, stored in the search arena.
#[derive(Debug, Clone)]
pub struct DecisionTreeNode {
    resolved: usize,
    frontier: Option<u32>,
    used: Rc<BTreeSet<u32>>,
    cost: SearchCost,
    parent: Option<usize>,
    decision: Option<Decision>,
}

impl DecisionTreeNode {
    fn root() -> Self {
        Self {
            resolved: 0,
            frontier: None,
            used: Rc::new(BTreeSet::new()),
            cost: SearchCost::ZERO,
            parent: None,
            decision: None,
        }
    }

    /// Number of clusters decided on the path to this node.
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    /// Accumulated path cost.
    pub fn cost(&self) -> SearchCost {
        self.cost
    }

    fn state(&self) -> StateKey {
        (self.resolved, self.frontier, Rc::clone(&self.used))
    }

    fn admits_in_order(&self, position: u32) -> bool {
        self.frontier.map_or(true, |frontier| position > frontier)
    }
}

type StateKey = (usize, Option<u32>, Rc<BTreeSet<u32>>);

/// Result of a completed search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// Accepted matches in witness order.
    pub matches: Vec<Match>,
    /// Total cost of the chosen decisions.
    pub cost: SearchCost,
    /// Nodes expanded before the goal was reached.
    pub expanded: usize,
}

/// Optimal selection of matches from candidate clusters.
#[derive(Debug)]
pub struct DecisionSearch<'a> {
    clusters: &'a [Cluster],
    contested: BTreeSet<u32>,
    remaining: Vec<SearchCost>,
}

impl<'a> DecisionSearch<'a> {
    /// Prepare a search over `clusters`.
    pub fn new(clusters: &'a [Cluster]) -> Self {
        let contested = clusters
            .iter()
            .enumerate()
            .filter(|(_, cluster)| cluster.unique)
            .map(|(idx, cluster)| (idx, cluster.candidates[0].graph_position))
            .filter(|(idx, position)| {
                clusters.iter().enumerate().any(|(other, cluster)| {
                    other != *idx
                        && cluster
                            .candidates
                            .iter()
                            .any(|c| c.graph_position == *position)
                })
            })
            .map(|(_, position)| position)
            .collect();

        let mut remaining = vec![SearchCost::ZERO; clusters.len() + 1];
        for (idx, cluster) in clusters.iter().enumerate().rev() {
            let cheapest = cluster
                .candidates
                .iter()
                .map(|c| SearchCost::accept(c, false))
                .min()
                .unwrap_or_else(SearchCost::reject);
            remaining[idx] = remaining[idx + 1] + cheapest;
        }

        Self {
            clusters,
            contested,
            remaining,
        }
    }

    /// Run the search.
    ///
    /// Returns `None` only if the frontier empties without reaching a goal,
    /// which cannot happen for well-formed clusters: rejecting every
    /// remaining cluster, or placing every free unique cluster displaced,
    /// always leads to a goal.
    pub fn run(&self) -> Option<SearchOutcome> {
        let goal = self.clusters.len();
        let mut arena: Vec<DecisionTreeNode> = vec![DecisionTreeNode::root()];
        let mut frontier: BinaryHeap<Reverse<(SearchCost, Reverse<usize>, usize, usize)>> =
            BinaryHeap::new();
        let mut best_cost: HashMap<StateKey, SearchCost> = HashMap::new();
        let mut closed: HashSet<StateKey> = HashSet::new();
        let mut sequence = 0usize;

        frontier.push(Reverse((self.remaining[0], Reverse(0), sequence, 0)));
        best_cost.insert(arena[0].state(), SearchCost::ZERO);

        let mut expanded = 0usize;
        while let Some(Reverse((_, _, _, node_idx))) = frontier.pop() {
            let state = arena[node_idx].state();
            if !closed.insert(state) {
                continue;
            }

            if arena[node_idx].resolved == goal {
                return Some(SearchOutcome {
                    matches: self.reconstruct(&arena, node_idx),
                    cost: arena[node_idx].cost,
                    expanded,
                });
            }
            expanded += 1;

            for child in self.children(&arena[node_idx], node_idx) {
                let key = child.state();
                if closed.contains(&key) {
                    continue;
                }
                if best_cost.get(&key).is_some_and(|best| *best <= child.cost) {
                    continue;
                }
                best_cost.insert(key, child.cost);

                let f = child.cost + self.remaining[child.resolved];
                let depth = child.resolved;
                sequence += 1;
                arena.push(child);
                frontier.push(Reverse((f, Reverse(depth), sequence, arena.len() - 1)));
            }
        }

        None
    }

    fn children(&self, node: &DecisionTreeNode, node_idx: usize) -> Vec<DecisionTreeNode> {
        let cluster = &self.clusters[node.resolved];
        let mut children = Vec::new();

        let child = |decision: Decision,
                     cost: SearchCost,
                     frontier: Option<u32>,
                     taken: Option<u32>| {
            let used = match taken.filter(|p| self.contested.contains(p)) {
                Some(position) => {
                    let mut used = BTreeSet::clone(&node.used);
                    used.insert(position);
                    Rc::new(used)
                }
                None => Rc::clone(&node.used),
            };
            DecisionTreeNode {
                resolved: node.resolved + 1,
                frontier,
                used,
                cost: node.cost + cost,
                parent: Some(node_idx),
                decision: Some(decision),
            }
        };

        for (idx, candidate) in cluster.candidates.iter().enumerate() {
            let position = candidate.graph_position;
            if node.admits_in_order(position) && !node.used.contains(&position) {
                children.push(child(
                    Decision::Accept {
                        candidate: idx,
                        displaced: false,
                    },
                    SearchCost::accept(candidate, false),
                    Some(position),
                    Some(position),
                ));
            }
        }

        let free_unique = cluster.unique
            && !node
                .used
                .contains(&cluster.candidates[0].graph_position);

        if free_unique {
            let candidate = &cluster.candidates[0];
            children.push(child(
                Decision::Accept {
                    candidate: 0,
                    displaced: true,
                },
                SearchCost::accept(candidate, true),
                node.frontier,
                Some(candidate.graph_position),
            ));
        } else {
            children.push(child(Decision::Reject, SearchCost::reject(), node.frontier, None));
        }

        children
    }

    fn reconstruct(&self, arena: &[DecisionTreeNode], goal: usize) -> Vec<Match> {
        let mut matches = Vec::new();
        let mut current = Some(goal);

        while let Some(idx) = current {
            let node = &arena[idx];
            if let Some(Decision::Accept { candidate, .. }) = node.decision {
                let cluster = &self.clusters[node.resolved - 1];
                let chosen = cluster.candidates[candidate];
                matches.push(Match {
                    witness_position: cluster.witness_position,
                    graph_position: chosen.graph_position,
                    cost: chosen.cost,
                    kind: chosen.kind,
                });
            }
            current = node.parent;
        }

        matches.reverse();
        matches
    }
}
