//! core::graph
//!
//! Variant graph representation and operations.
//!
//! # Architecture
//!
//! The variant graph is a DAG where:
//! - Vertices are aligned columns; each holds at most one token per witness
//! - Edges carry the set of witnesses whose reading passes along them
//! - Two sentinels, start and end, bracket every witness path
//!
//! Vertices and edges live in arenas and are addressed by [`VertexId`] and
//! [`EdgeId`]. Nothing is ever removed, so ids stay valid for the lifetime
//! of the graph.
//!
//! # Invariants
//!
//! - Graph must be acyclic
//! - Each witness path visits its tokens in strictly increasing position
//! - A vertex is shared by several witnesses only if their tokens were
//!   accepted as matches
//! - Out-of-order matches are recorded as [`Transposition`] relations, never
//!   as edges

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};

use serde::{Deserialize, Serialize};

use super::types::{Fingerprint, Sigil, Token, TokenRef};

/// Index of a vertex in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(usize);

impl VertexId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        Self(index)
    }
}

impl std::fmt::Display for VertexId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Index of an edge in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(usize);

impl EdgeId {
    /// Raw arena index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// One aligned column of the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vertex {
    tokens: BTreeMap<Sigil, Token>,
}

impl Vertex {
    /// Witness → token mapping.
    pub fn tokens(&self) -> &BTreeMap<Sigil, Token> {
        &self.tokens
    }

    /// Token contributed by `sigil`, if any.
    pub fn token(&self, sigil: &Sigil) -> Option<&Token> {
        self.tokens.get(sigil)
    }

    /// Witnesses with a token at this vertex.
    pub fn witnesses(&self) -> impl Iterator<Item = &Sigil> {
        self.tokens.keys()
    }

    /// Distinct normalized keys of the tokens at this vertex.
    pub fn keys(&self) -> BTreeSet<&str> {
        self.tokens.values().map(Token::key).collect()
    }

    /// Whether this is a sentinel (start or end).
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A run between two vertices for one or more witnesses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    from: VertexId,
    to: VertexId,
    witnesses: BTreeSet<Sigil>,
}

impl Edge {
    /// Source vertex.
    pub fn from(&self) -> VertexId {
        self.from
    }

    /// Target vertex.
    pub fn to(&self) -> VertexId {
        self.to
    }

    /// Witnesses traversing this edge.
    pub fn witnesses(&self) -> &BTreeSet<Sigil> {
        &self.witnesses
    }
}

/// A transposition relation between vertices.
///
/// Links the vertices holding a transposed phrase in the graph with the
/// vertices created for the same phrase in the witness that moved it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transposition {
    vertices: BTreeSet<VertexId>,
}

impl Transposition {
    pub(crate) fn new(vertices: impl IntoIterator<Item = VertexId>) -> Self {
        Self {
            vertices: vertices.into_iter().collect(),
        }
    }

    /// Vertices linked by this relation.
    pub fn vertices(&self) -> &BTreeSet<VertexId> {
        &self.vertices
    }

    /// All tokens held by the linked vertices.
    ///
    /// Token identities do not depend on graph layout, so this is the form
    /// to compare transpositions across different merge orders.
    pub fn tokens(&self, graph: &VariantGraph) -> BTreeSet<TokenRef> {
        self.vertices
            .iter()
            .flat_map(|v| graph.vertex(*v).tokens().values())
            .map(Token::reference)
            .collect()
    }
}

/// The accumulating variant graph.
#[derive(Debug, Clone)]
pub struct VariantGraph {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,
    witnesses: Vec<Sigil>,
    transpositions: Vec<Transposition>,
}

impl Default for VariantGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Create an empty graph with start and end sentinels.
pub fn new_graph() -> VariantGraph {
    VariantGraph::new()
}

impl VariantGraph {
    const START: VertexId = VertexId(0);
    const END: VertexId = VertexId(1);

    /// Create an empty graph with start and end sentinels.
    pub fn new() -> Self {
        Self {
            vertices: vec![Vertex::default(), Vertex::default()],
            edges: Vec::new(),
            outgoing: vec![Vec::new(), Vec::new()],
            incoming: vec![Vec::new(), Vec::new()],
            witnesses: Vec::new(),
            transpositions: Vec::new(),
        }
    }

    /// The start sentinel.
    pub fn start(&self) -> VertexId {
        Self::START
    }

    /// The end sentinel.
    pub fn end(&self) -> VertexId {
        Self::END
    }

    /// Look up a vertex.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this graph.
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.0]
    }

    /// All vertices including sentinels, in arena order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> {
        self.vertices
            .iter()
            .enumerate()
            .map(|(idx, v)| (VertexId(idx), v))
    }

    /// Number of vertices excluding sentinels.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() - 2
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    /// All edges in arena order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> {
        self.edges
            .iter()
            .enumerate()
            .map(|(idx, e)| (EdgeId(idx), e))
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outgoing edges of a vertex.
    pub fn outgoing(&self, id: VertexId) -> &[EdgeId] {
        &self.outgoing[id.0]
    }

    /// Incoming edges of a vertex.
    pub fn incoming(&self, id: VertexId) -> &[EdgeId] {
        &self.incoming[id.0]
    }

    /// The edge from `from` to `to`, if present.
    pub fn edge_between(&self, from: VertexId, to: VertexId) -> Option<EdgeId> {
        self.outgoing[from.0]
            .iter()
            .copied()
            .find(|e| self.edges[e.0].to == to)
    }

    /// Witnesses merged so far, in merge order.
    pub fn witnesses(&self) -> &[Sigil] {
        &self.witnesses
    }

    /// Whether `sigil` has been merged.
    pub fn contains_witness(&self, sigil: &Sigil) -> bool {
        self.witnesses.contains(sigil)
    }

    /// Transposition relations recorded so far.
    pub fn transpositions(&self) -> &[Transposition] {
        &self.transpositions
    }

    pub(crate) fn register_witness(&mut self, sigil: Sigil) {
        self.witnesses.push(sigil);
    }

    pub(crate) fn add_vertex(&mut self, token: Token) -> VertexId {
        let id = VertexId(self.vertices.len());
        let mut vertex = Vertex::default();
        vertex.tokens.insert(token.witness().clone(), token);
        self.vertices.push(vertex);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        id
    }

    pub(crate) fn add_token(&mut self, id: VertexId, token: Token) {
        self.vertices[id.0]
            .tokens
            .insert(token.witness().clone(), token);
    }

    /// Extend the edge `from → to` with `sigil`, creating it if needed.
    pub(crate) fn connect(&mut self, from: VertexId, to: VertexId, sigil: &Sigil) -> EdgeId {
        if let Some(existing) = self.edge_between(from, to) {
            self.edges[existing.0].witnesses.insert(sigil.clone());
            return existing;
        }

        let id = EdgeId(self.edges.len());
        self.edges.push(Edge {
            from,
            to,
            witnesses: BTreeSet::from([sigil.clone()]),
        });
        self.outgoing[from.0].push(id);
        self.incoming[to.0].push(id);
        id
    }

    pub(crate) fn add_transposition(&mut self, transposition: Transposition) {
        self.transpositions.push(transposition);
    }

    /// Topological order of all vertices (including sentinels).
    ///
    /// Ready vertices are taken lowest id first, so the order is
    /// deterministic. Returns `None` if the graph contains a cycle.
    pub fn topological_order(&self) -> Option<Vec<VertexId>> {
        let mut indegree: Vec<usize> = self.incoming.iter().map(Vec::len).collect();
        let mut ready: BinaryHeap<Reverse<VertexId>> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(idx, _)| Reverse(VertexId(idx)))
            .collect();

        let mut order = Vec::with_capacity(self.vertices.len());
        while let Some(Reverse(current)) = ready.pop() {
            order.push(current);
            for edge in &self.outgoing[current.0] {
                let target = self.edges[edge.0].to;
                indegree[target.0] -= 1;
                if indegree[target.0] == 0 {
                    ready.push(Reverse(target));
                }
            }
        }

        (order.len() == self.vertices.len()).then_some(order)
    }

    /// Check whether the graph is acyclic.
    pub fn is_acyclic(&self) -> bool {
        self.topological_order().is_some()
    }

    /// Rank of every vertex: length of the longest path from start.
    ///
    /// Indexed by [`VertexId::index`]. The end sentinel always ranks one
    /// past the highest interior rank.
    ///
    /// # Example
    ///
    /// ```
    /// use collatio::align::Collator;
    /// use collatio::core::config::CollationConfig;
    /// use collatio::core::types::{Sigil, Witness};
    ///
    /// let mut collator = Collator::new(CollationConfig::default());
    /// collator.merge(&Witness::from_text(Sigil::new("A").unwrap(), "a b")).unwrap();
    ///
    /// let graph = collator.graph();
    /// let ranks = graph.ranks();
    /// assert_eq!(ranks[graph.start().index()], 0);
    /// assert_eq!(ranks[graph.end().index()], 3);
    /// ```
    pub fn ranks(&self) -> Vec<usize> {
        let mut ranks = vec![0usize; self.vertices.len()];
        // Arena order is a valid topological order only while no cycle
        // exists; the merge path never creates one.
        let order = self
            .topological_order()
            .unwrap_or_else(|| self.vertices().map(|(id, _)| id).collect());

        for current in &order {
            for edge in &self.outgoing[current.0] {
                let target = self.edges[edge.0].to;
                ranks[target.0] = ranks[target.0].max(ranks[current.0] + 1);
            }
        }

        let interior_max = self
            .vertices()
            .filter(|(id, _)| *id != Self::START && *id != Self::END)
            .map(|(id, _)| ranks[id.0])
            .max()
            .unwrap_or(0);
        ranks[Self::END.0] = interior_max + 1;
        ranks
    }

    /// Interior vertices ordered by rank, then by id.
    ///
    /// This is the "graph position" order used when aligning a new witness:
    /// it is a topological order, so matches increasing in it can be folded
    /// in without creating a cycle.
    pub fn vertex_order(&self) -> Vec<VertexId> {
        let ranks = self.ranks();
        let mut order: Vec<VertexId> = self
            .vertices()
            .map(|(id, _)| id)
            .filter(|id| *id != Self::START && *id != Self::END)
            .collect();
        order.sort_by_key(|id| (ranks[id.0], *id));
        order
    }

    /// Interior vertices on the path of `sigil`, in witness order.
    pub fn witness_path(&self, sigil: &Sigil) -> Vec<VertexId> {
        let mut path = Vec::new();
        let mut current = Self::START;

        while let Some(edge) = self.outgoing[current.0]
            .iter()
            .map(|e| &self.edges[e.0])
            .find(|e| e.witnesses.contains(sigil))
        {
            if edge.to == Self::END {
                break;
            }
            path.push(edge.to);
            current = edge.to;
        }
        path
    }

    /// Fingerprint of vertices, edges and transpositions.
    ///
    /// # Example
    ///
    /// ```
    /// use collatio::core::graph::VariantGraph;
    ///
    /// assert_eq!(VariantGraph::new().fingerprint(), VariantGraph::new().fingerprint());
    /// ```
    pub fn fingerprint(&self) -> Fingerprint {
        let vertices = self.vertices().map(|(id, v)| {
            let tokens: Vec<String> = v
                .tokens
                .values()
                .map(|t| format!("{}:{}:{}", t.witness(), t.position(), t.key()))
                .collect();
            format!("vertex {} [{}]", id, tokens.join(" "))
        });
        let edges = self.edges.iter().map(|e| {
            let sigils: Vec<&str> = e.witnesses.iter().map(Sigil::as_str).collect();
            format!("edge {}->{} [{}]", e.from, e.to, sigils.join(" "))
        });
        let transpositions = self.transpositions.iter().map(|t| {
            let ids: Vec<String> = t.vertices.iter().map(VertexId::to_string).collect();
            format!("transposition [{}]", ids.join(" "))
        });

        Fingerprint::compute(vertices.chain(edges).chain(transpositions))
    }
}
