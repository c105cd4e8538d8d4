use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use tracing::{debug, warn};

use crate::dependency::{Dependency, Relationship};
use crate::error::{EngineResult, ScheduleError};
use crate::project::Project;
use crate::task::{Task, TaskId};

/// Validated, immutable dependency DAG of one project.
///
/// Nodes are task ids, edges run predecessor -> successor and carry the
/// relationship. The topological order is fixed at build time and breaks
/// ties by task id, so every downstream stage iterates deterministically.
#[derive(Debug, Clone)]
pub struct ScheduleDag {
    graph: DiGraph<TaskId, Relationship>,
    id_to_index: HashMap<TaskId, NodeIndex>,
    durations: HashMap<TaskId, i64>,
    order: Vec<TaskId>,
}

impl ScheduleDag {
    pub fn build(project: &Project) -> EngineResult<Self> {
        Self::from_records(project.tasks(), project.dependencies())
    }

    pub fn from_records(tasks: &[Task], dependencies: &[Dependency]) -> EngineResult<Self> {
        let mut graph: DiGraph<TaskId, Relationship> = DiGraph::new();
        let mut id_to_index: HashMap<TaskId, NodeIndex> = HashMap::with_capacity(tasks.len());
        let mut durations: HashMap<TaskId, i64> = HashMap::with_capacity(tasks.len());

        // Add nodes first, in id order
        let mut sorted: Vec<&Task> = tasks.iter().collect();
        sorted.sort_by_key(|task| task.id);
        for task in sorted {
            if id_to_index.contains_key(&task.id) {
                return Err(ScheduleError::DuplicateTask(task.id));
            }
            let node_ix = graph.add_node(task.id);
            id_to_index.insert(task.id, node_ix);
            durations.insert(task.id, task.duration);
        }

        // Add edges: pred -> succ
        for dep in dependencies {
            let lookup = |id: TaskId| {
                id_to_index
                    .get(&id)
                    .copied()
                    .ok_or_else(|| ScheduleError::UnknownTaskReference {
                        predecessor: dep.predecessor,
                        successor: dep.successor,
                        missing: id,
                    })
            };
            let u = lookup(dep.predecessor)?;
            let v = lookup(dep.successor)?;
            if u == v {
                return Err(ScheduleError::InvalidDependency {
                    predecessor: dep.predecessor,
                    successor: dep.successor,
                    reason: "a task cannot depend on itself".into(),
                });
            }
            graph.add_edge(u, v, dep.relationship);
        }

        let order = Self::topological_order_of(&graph)?;
        debug!(
            tasks = graph.node_count(),
            dependencies = graph.edge_count(),
            "dependency graph validated"
        );

        Ok(Self {
            graph,
            id_to_index,
            durations,
            order,
        })
    }

    /// Kahn's algorithm with an ordered ready set.
    fn topological_order_of(graph: &DiGraph<TaskId, Relationship>) -> EngineResult<Vec<TaskId>> {
        let mut in_degree: HashMap<NodeIndex, usize> = graph
            .node_indices()
            .map(|ix| (ix, graph.edges_directed(ix, Direction::Incoming).count()))
            .collect();
        let mut ready: BTreeSet<(TaskId, NodeIndex)> = in_degree
            .iter()
            .filter(|(_, deg)| **deg == 0)
            .map(|(&ix, _)| (graph[ix], ix))
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some((task_id, ix)) = ready.pop_first() {
            order.push(task_id);
            for edge in graph.edges_directed(ix, Direction::Outgoing) {
                let target = edge.target();
                if let Some(deg) = in_degree.get_mut(&target) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert((graph[target], target));
                    }
                }
            }
        }

        if order.len() < graph.node_count() {
            let cycle = Self::find_cycle(graph);
            warn!(?cycle, "dependency cycle detected");
            return Err(ScheduleError::CyclicDependency { cycle });
        }
        Ok(order)
    }

    /// Returns one cycle, starting at the smallest task id involved in any
    /// cycle and following successors in id order.
    fn find_cycle(graph: &DiGraph<TaskId, Relationship>) -> Vec<TaskId> {
        let Some(component) = tarjan_scc(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .min_by_key(|scc| scc.iter().map(|&ix| graph[ix]).min())
        else {
            return Vec::new();
        };
        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let Some(&start) = component.iter().min_by_key(|&&ix| graph[ix]) else {
            return Vec::new();
        };

        // BFS inside the component until an edge closes back on `start`
        let mut parent: HashMap<NodeIndex, NodeIndex> = HashMap::new();
        let mut queue = VecDeque::from([start]);
        let mut closing = None;
        while let Some(current) = queue.pop_front() {
            let mut next: Vec<NodeIndex> = graph
                .neighbors_directed(current, Direction::Outgoing)
                .filter(|ix| members.contains(ix))
                .collect();
            next.sort_by_key(|&ix| graph[ix]);
            next.dedup();
            if next.contains(&start) {
                closing = Some(current);
                break;
            }
            for ix in next {
                if ix != start && !parent.contains_key(&ix) {
                    parent.insert(ix, current);
                    queue.push_back(ix);
                }
            }
        }

        let mut cycle = Vec::new();
        let mut cursor = closing;
        while let Some(ix) = cursor {
            cycle.push(graph[ix]);
            cursor = if ix == start {
                None
            } else {
                parent.get(&ix).copied()
            };
        }
        cycle.reverse();
        cycle
    }

    pub fn topological_order(&self) -> &[TaskId] {
        &self.order
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, task_id: TaskId) -> bool {
        self.id_to_index.contains_key(&task_id)
    }

    pub fn duration(&self, task_id: TaskId) -> i64 {
        self.durations.get(&task_id).copied().unwrap_or(0)
    }

    /// Incoming relationships of a task, sorted by predecessor id.
    pub fn predecessors(&self, task_id: TaskId) -> Vec<(TaskId, Relationship)> {
        self.neighbors(task_id, Direction::Incoming)
    }

    /// Outgoing relationships of a task, sorted by successor id.
    pub fn successors(&self, task_id: TaskId) -> Vec<(TaskId, Relationship)> {
        self.neighbors(task_id, Direction::Outgoing)
    }

    fn neighbors(&self, task_id: TaskId, direction: Direction) -> Vec<(TaskId, Relationship)> {
        let Some(&ix) = self.id_to_index.get(&task_id) else {
            return Vec::new();
        };
        let mut out: Vec<(TaskId, Relationship)> = self
            .graph
            .edges_directed(ix, direction)
            .map(|edge| {
                let other = match direction {
                    Direction::Incoming => edge.source(),
                    Direction::Outgoing => edge.target(),
                };
                (self.graph[other], *edge.weight())
            })
            .collect();
        out.sort_by_key(|(id, rel)| (*id, rel.kind, rel.lag));
        out
    }
}
