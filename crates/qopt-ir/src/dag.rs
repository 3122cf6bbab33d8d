//! Wire-adjacency dependency DAG.
//!
//! Every gate of a netlist becomes a [`Vertex`]. Two vertices are joined by
//! an edge when they share a wire and no other vertex on that wire sits
//! between them, so each wire is a chain of nearest-neighbour dependencies.
//! Transitively ordered vertices on the same wire are not linked directly.
//!
//! Vertices live in an arena keyed by [`VertexId`]. Each vertex records its
//! neighbour on every wire it touches, one link in each direction, and the
//! predecessor and successor sets are derived from those links. Ids come
//! from construction order and are never reused within one DAG. A rebuild
//! (see [`CircuitDag::restore`]) hands out fresh ids.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use petgraph::graphmap::DiGraphMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{IrError, IrResult};
use crate::gate::Gate;
use crate::qubit::QubitId;

/// Identity of a vertex within one [`CircuitDag`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct VertexId(pub usize);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Map from ids before a rebuild to ids after it.
pub type Renumbering = FxHashMap<VertexId, VertexId>;

/// Nearest neighbours of a vertex on one wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct WireLink {
    prev: Option<VertexId>,
    next: Option<VertexId>,
}

/// A node in the circuit DAG.
#[derive(Debug, Clone)]
pub struct Vertex {
    id: VertexId,
    gate: Gate,
    wires: BTreeMap<QubitId, WireLink>,
    predecessors: BTreeSet<VertexId>,
    successors: BTreeSet<VertexId>,
}

impl Vertex {
    fn new(id: VertexId, gate: Gate) -> Self {
        Self {
            id,
            gate,
            wires: BTreeMap::new(),
            predecessors: BTreeSet::new(),
            successors: BTreeSet::new(),
        }
    }

    fn linked_predecessors(&self) -> BTreeSet<VertexId> {
        self.wires.values().filter_map(|link| link.prev).collect()
    }

    fn linked_successors(&self) -> BTreeSet<VertexId> {
        self.wires.values().filter_map(|link| link.next).collect()
    }

    /// Get the vertex id.
    #[inline]
    pub fn id(&self) -> VertexId {
        self.id
    }

    /// Get the gate held by this vertex.
    #[inline]
    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    /// Immediate predecessors, in ascending id order.
    #[inline]
    pub fn predecessors(&self) -> &BTreeSet<VertexId> {
        &self.predecessors
    }

    /// Immediate successors, in ascending id order.
    #[inline]
    pub fn successors(&self) -> &BTreeSet<VertexId> {
        &self.successors
    }
}

/// The gates of a DAG in topological order, kept for rollback.
#[derive(Debug, Clone)]
pub struct Snapshot {
    num_qubits: usize,
    entries: Vec<(VertexId, Gate)>,
}

impl Snapshot {
    /// Number of gates captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the snapshot holds no gates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The captured gates, in order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.entries.iter().map(|(_, gate)| gate)
    }
}

/// Dependency DAG over the gates of a netlist.
#[derive(Debug, Clone, Default)]
pub struct CircuitDag {
    num_qubits: usize,
    vertices: BTreeMap<VertexId, Vertex>,
}

impl CircuitDag {
    /// Create an empty DAG over `num_qubits` wires.
    pub fn new(num_qubits: usize) -> Self {
        Self {
            num_qubits,
            vertices: BTreeMap::new(),
        }
    }

    /// Build the DAG for a gate sequence.
    ///
    /// Vertex ids equal the position of the gate in `gates`. A single scan
    /// keeps the last vertex seen on every wire and links each new vertex to
    /// it, which yields exactly the nearest-neighbour chain per wire.
    pub fn build(num_qubits: usize, gates: &[Gate]) -> IrResult<Self> {
        let mut dag = Self::new(num_qubits);
        let mut last_on_wire: FxHashMap<QubitId, VertexId> = FxHashMap::default();

        for (position, gate) in gates.iter().enumerate() {
            dag.validate_gate(gate)?;

            let id = VertexId(position);
            let mut vertex = Vertex::new(id, gate.clone());
            for qubit in gate.all_qubits() {
                let prev = last_on_wire.insert(qubit, id);
                vertex.wires.insert(qubit, WireLink { prev, next: None });
                let Some(prev) = prev else {
                    continue;
                };
                vertex.predecessors.insert(prev);
                if let Some(prev_vertex) = dag.vertices.get_mut(&prev) {
                    prev_vertex.successors.insert(id);
                    if let Some(link) = prev_vertex.wires.get_mut(&qubit) {
                        link.next = Some(id);
                    }
                }
            }
            dag.vertices.insert(id, vertex);
        }

        Ok(dag)
    }

    fn validate_gate(&self, gate: &Gate) -> IrResult<()> {
        let mut seen = FxHashSet::default();
        for qubit in gate.all_qubits() {
            if qubit.index() >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    gate_name: Some(gate.name().to_string()),
                });
            }
            if !seen.insert(qubit) {
                return Err(IrError::DuplicateQubit {
                    qubit,
                    gate_name: Some(gate.name().to_string()),
                });
            }
        }
        Ok(())
    }

    /// Get the number of qubits.
    #[inline]
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Get the number of live vertices.
    #[inline]
    pub fn num_ops(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the DAG has no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Check whether a vertex is still present.
    #[inline]
    pub fn contains(&self, id: VertexId) -> bool {
        self.vertices.contains_key(&id)
    }

    /// Get a vertex by id.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(&id)
    }

    /// Get the gate of a vertex.
    #[inline]
    pub fn gate(&self, id: VertexId) -> Option<&Gate> {
        self.vertices.get(&id).map(Vertex::gate)
    }

    /// Get the gate of a vertex for in-place rewriting.
    ///
    /// Callers may rename the gate, change its angle or permute its wires,
    /// but must leave the set of wires it touches unchanged: the edges of
    /// the vertex are not recomputed.
    #[inline]
    pub fn gate_mut(&mut self, id: VertexId) -> Option<&mut Gate> {
        self.vertices.get_mut(&id).map(|v| &mut v.gate)
    }

    /// Iterate over live vertex ids in ascending order.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys().copied()
    }

    /// Iterate over live vertices in ascending id order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.values()
    }

    /// Ids of all vertices whose gate has the given name, ascending.
    pub fn collect_gate_ids(&self, name: &str) -> Vec<VertexId> {
        self.vertices
            .values()
            .filter(|v| v.gate.name() == name)
            .map(|v| v.id)
            .collect()
    }

    fn entry(&mut self, id: VertexId) -> IrResult<&mut Vertex> {
        self.vertices
            .get_mut(&id)
            .ok_or(IrError::VertexNotFound(id))
    }

    fn wire_link(&mut self, id: VertexId, wire: QubitId) -> IrResult<&mut WireLink> {
        self.entry(id)?
            .wires
            .get_mut(&wire)
            .ok_or_else(|| IrError::InvalidDag(format!("{id} is not on wire {wire}")))
    }

    /// Make `before` and `after` nearest neighbours on `wire`.
    fn splice(
        &mut self,
        wire: QubitId,
        before: Option<VertexId>,
        after: Option<VertexId>,
    ) -> IrResult<()> {
        if let Some(id) = before {
            self.wire_link(id, wire)?.next = after;
        }
        if let Some(id) = after {
            self.wire_link(id, wire)?.prev = before;
        }
        Ok(())
    }

    /// Recompute the adjacency sets of a vertex from its wire links.
    fn refresh(&mut self, id: VertexId) -> IrResult<()> {
        let vertex = self.entry(id)?;
        vertex.predecessors = vertex.linked_predecessors();
        vertex.successors = vertex.linked_successors();
        Ok(())
    }

    /// Remove a vertex and reconnect its neighbourhood.
    ///
    /// On every wire of the removed vertex its neighbours before and after
    /// become nearest neighbours. Wires it did not touch are left alone.
    /// Returns the removed gate, tombstoned.
    pub fn remove_vertex(&mut self, id: VertexId) -> IrResult<Gate> {
        let removed = self
            .vertices
            .remove(&id)
            .ok_or(IrError::VertexNotFound(id))?;

        let mut touched = BTreeSet::new();
        for (&wire, link) in &removed.wires {
            self.splice(wire, link.prev, link.next)?;
            touched.extend(link.prev);
            touched.extend(link.next);
        }
        for neighbour in touched {
            self.refresh(neighbour)?;
        }

        let mut gate = removed.gate;
        gate.delete();
        Ok(gate)
    }

    /// Swap two adjacent vertices so that `second` comes before `first`.
    ///
    /// `second` must directly follow `first` on every wire they share,
    /// otherwise [`IrError::NotAdjacent`] is returned and the DAG is left
    /// untouched. The two vertices trade places on each shared wire only.
    pub fn commute_adjacent(&mut self, first: VertexId, second: VertexId) -> IrResult<()> {
        let first_vertex = self.vertex(first).ok_or(IrError::VertexNotFound(first))?;
        let not_adjacent = IrError::NotAdjacent {
            from: first,
            to: second,
        };
        if !first_vertex.successors.contains(&second) {
            return Err(not_adjacent);
        }
        let second_vertex = self
            .vertex(second)
            .ok_or(IrError::VertexNotFound(second))?;

        let mut shared = Vec::new();
        for (&wire, link) in &first_vertex.wires {
            let Some(other) = second_vertex.wires.get(&wire) else {
                continue;
            };
            if link.next != Some(second) {
                return Err(not_adjacent);
            }
            shared.push((wire, link.prev, other.next));
        }

        let mut touched = BTreeSet::from([first, second]);
        for (wire, before, after) in shared {
            self.splice(wire, before, Some(second))?;
            self.splice(wire, Some(second), Some(first))?;
            self.splice(wire, Some(first), after)?;
            touched.extend(before);
            touched.extend(after);
        }
        for id in touched {
            self.refresh(id)?;
        }
        Ok(())
    }

    /// Deterministic topological order of the live vertices.
    ///
    /// Depth-first postorder over successors, reversed. Roots are tried from
    /// the highest id down and successors in ascending id order, so a DAG
    /// fresh from [`CircuitDag::build`] yields its ids in ascending order.
    pub fn topological_order(&self) -> Vec<VertexId> {
        let mut visited: FxHashSet<VertexId> = FxHashSet::default();
        let mut postorder = Vec::with_capacity(self.vertices.len());

        for (&root, root_vertex) in self.vertices.iter().rev() {
            if !visited.insert(root) {
                continue;
            }
            let mut stack = vec![(root, root_vertex.successors.iter())];
            loop {
                let Some((current, successors)) = stack.last_mut() else {
                    break;
                };
                let current = *current;
                let next = successors.find(|s| !visited.contains(*s)).copied();
                match next.and_then(|id| self.vertices.get(&id)) {
                    Some(next_vertex) => {
                        visited.insert(next_vertex.id);
                        stack.push((next_vertex.id, next_vertex.successors.iter()));
                    }
                    None => {
                        stack.pop();
                        postorder.push(current);
                    }
                }
            }
        }

        postorder.reverse();
        postorder
    }

    /// The gates of the DAG as a linear sequence, in topological order.
    pub fn linearize(&self) -> Vec<Gate> {
        self.topological_order()
            .into_iter()
            .filter_map(|id| self.gate(id).cloned())
            .collect()
    }

    /// Capture the whole DAG as a gate sequence for a later [`restore`].
    ///
    /// [`restore`]: CircuitDag::restore
    pub fn snapshot(&self) -> Snapshot {
        let entries = self
            .topological_order()
            .into_iter()
            .filter_map(|id| self.gate(id).map(|gate| (id, gate.clone())))
            .collect();
        Snapshot {
            num_qubits: self.num_qubits,
            entries,
        }
    }

    /// Replace the DAG with a fresh build of `snapshot`.
    ///
    /// All vertices are recreated with ids taken from their position in the
    /// snapshot. Returns the renumbering from the ids the snapshot was taken
    /// with to the new ids.
    pub fn restore(&mut self, snapshot: &Snapshot) -> IrResult<Renumbering> {
        let gates: Vec<Gate> = snapshot.gates().cloned().collect();
        *self = Self::build(snapshot.num_qubits, &gates)?;
        Ok(snapshot
            .entries
            .iter()
            .enumerate()
            .map(|(position, (old, _))| (*old, VertexId(position)))
            .collect())
    }

    fn graph(&self) -> DiGraphMap<VertexId, ()> {
        let mut graph = DiGraphMap::with_capacity(self.vertices.len(), 0);
        for &id in self.vertices.keys() {
            graph.add_node(id);
        }
        for vertex in self.vertices.values() {
            for &succ in &vertex.successors {
                graph.add_edge(vertex.id, succ, ());
            }
        }
        graph
    }

    /// Calculate the circuit depth (longest chain of vertices).
    ///
    /// Fails with [`IrError::InvalidDag`] if the graph has a cycle.
    pub fn depth(&self) -> IrResult<usize> {
        let graph = self.graph();
        let order = petgraph::algo::toposort(&graph, None).map_err(|cycle| {
            IrError::InvalidDag(format!("cycle through {}", cycle.node_id()))
        })?;

        let mut depths: FxHashMap<VertexId, usize> =
            FxHashMap::with_capacity_and_hasher(order.len(), Default::default());
        let mut max_depth = 0usize;

        for id in order {
            let max_pred_depth = graph
                .neighbors_directed(id, petgraph::Direction::Incoming)
                .map(|p| depths.get(&p).copied().unwrap_or(0))
                .max()
                .unwrap_or(0);
            let depth = max_pred_depth + 1;
            if depth > max_depth {
                max_depth = depth;
            }
            depths.insert(id, depth);
        }

        Ok(max_depth)
    }

    /// Verify the structural integrity of the DAG.
    ///
    /// Checks that:
    /// - Adjacency is symmetric and refers only to live vertices
    /// - Every edge joins two vertices that share a wire
    /// - The graph is acyclic
    /// - On every wire, consecutive vertices are directly connected
    /// - Every edge joins vertices that are consecutive on some wire
    /// - The adjacency sets agree with the per-wire links
    pub fn verify_integrity(&self) -> IrResult<()> {
        for vertex in self.vertices.values() {
            for &succ in &vertex.successors {
                let Some(succ_vertex) = self.vertices.get(&succ) else {
                    return Err(IrError::InvalidDag(format!(
                        "{} has dangling successor {succ}",
                        vertex.id
                    )));
                };
                if !succ_vertex.predecessors.contains(&vertex.id) {
                    return Err(IrError::InvalidDag(format!(
                        "edge {} -> {succ} missing from predecessors of {succ}",
                        vertex.id
                    )));
                }
                if !vertex.gate.shares_wire_with(&succ_vertex.gate) {
                    return Err(IrError::InvalidDag(format!(
                        "edge {} -> {succ} joins gates on disjoint wires",
                        vertex.id
                    )));
                }
            }
            for &pred in &vertex.predecessors {
                let linked = self
                    .vertices
                    .get(&pred)
                    .is_some_and(|p| p.successors.contains(&vertex.id));
                if !linked {
                    return Err(IrError::InvalidDag(format!(
                        "{} lists {pred} as predecessor without a matching edge",
                        vertex.id
                    )));
                }
            }
        }

        if petgraph::algo::is_cyclic_directed(&self.graph()) {
            return Err(IrError::InvalidDag("Graph contains a cycle".into()));
        }

        let mut last_on_wire: FxHashMap<QubitId, VertexId> = FxHashMap::default();
        let mut nearest: FxHashSet<(VertexId, VertexId)> = FxHashSet::default();
        for id in self.topological_order() {
            let Some(vertex) = self.vertices.get(&id) else {
                continue;
            };
            for qubit in vertex.gate.all_qubits() {
                if qubit.index() >= self.num_qubits {
                    return Err(IrError::QubitOutOfRange {
                        qubit,
                        num_qubits: self.num_qubits,
                        gate_name: Some(vertex.gate.name().to_string()),
                    });
                }
                if let Some(prev) = last_on_wire.insert(qubit, id) {
                    if !vertex.predecessors.contains(&prev) {
                        return Err(IrError::InvalidDag(format!(
                            "wire {qubit} is broken between {prev} and {id}"
                        )));
                    }
                    nearest.insert((prev, id));
                }
            }
        }

        for vertex in self.vertices.values() {
            if let Some(succ) = vertex
                .successors
                .iter()
                .find(|&&succ| !nearest.contains(&(vertex.id, succ)))
            {
                return Err(IrError::InvalidDag(format!(
                    "edge {} -> {succ} skips a vertex on every shared wire",
                    vertex.id
                )));
            }
        }

        for vertex in self.vertices.values() {
            if vertex.predecessors != vertex.linked_predecessors()
                || vertex.successors != vertex.linked_successors()
            {
                return Err(IrError::InvalidDag(format!(
                    "adjacency of {} disagrees with its wire links",
                    vertex.id
                )));
            }
        }

        Ok(())
    }
}
