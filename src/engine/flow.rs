//! Built-in engine solving the assignment problem as a minimum cost flow problem.
//!
//! The flow network consists of a source node, one node per professor, one node per course and a
//! sink node. The source is connected to each professor with capacity `load`, each professor to
//! each non-forbidden course with capacity 1 and the pair's preference as cost, and each course to
//! the sink with capacity `demand`. A maximum flow of minimum cost corresponds to an optimal
//! assignment: all capacities are integral, so the flow on every professor/course edge is 0 or 1.
//!
//! The flow is built by successive shortest augmenting paths. Shortest paths are searched in the
//! residual network with a queue-based Bellman-Ford (SPFA), since the residual backward edges carry
//! negative costs. Starting from the zero flow with non-negative costs, the residual network never
//! contains a negative cycle.

use super::{required_flow, Engine, EngineResult, Limits};
use crate::problem::Problem;
use crate::{Cost, Status};
use log::debug;
use std::collections::VecDeque;
use std::time::Instant;

/// Type of edge costs and capacities in the flow network
pub type FlowValue = i64;

#[derive(Clone, Debug)]
struct Edge {
    to: usize,
    /// Remaining residual capacity
    capacity: FlowValue,
    cost: FlowValue,
}

/// Residual flow network. Edges are stored in pairs: edge `e` and its reverse edge `e ^ 1`.
#[derive(Clone, Debug, Default)]
pub struct FlowNetwork {
    edges: Vec<Edge>,
    adjacency: Vec<Vec<usize>>,
}

impl FlowNetwork {
    pub fn new(num_nodes: usize) -> Self {
        FlowNetwork {
            edges: Vec::new(),
            adjacency: vec![Vec::new(); num_nodes],
        }
    }

    /// Add an edge and its reverse residual edge. Returns the forward edge's index.
    pub fn add_edge(
        &mut self,
        from: usize,
        to: usize,
        capacity: FlowValue,
        cost: FlowValue,
    ) -> usize {
        let index = self.edges.len();
        self.edges.push(Edge { to, capacity, cost });
        self.edges.push(Edge {
            to: from,
            capacity: 0,
            cost: -cost,
        });
        self.adjacency[from].push(index);
        self.adjacency[to].push(index + 1);
        index
    }

    /// Current flow on the given forward edge
    pub fn flow(&self, edge: usize) -> FlowValue {
        self.edges[edge ^ 1].capacity
    }

    /// Find a cheapest path with remaining capacity from `source` to `sink` in the residual
    /// network. Returns the edge indexes of the path in order from source to sink.
    fn shortest_path(&self, source: usize, sink: usize) -> Option<Vec<usize>> {
        let n = self.adjacency.len();
        let mut distance = vec![FlowValue::MAX; n];
        let mut predecessor: Vec<Option<usize>> = vec![None; n];
        let mut in_queue = vec![false; n];
        let mut queue = VecDeque::new();

        distance[source] = 0;
        queue.push_back(source);
        in_queue[source] = true;
        while let Some(node) = queue.pop_front() {
            in_queue[node] = false;
            for &e in self.adjacency[node].iter() {
                let edge = &self.edges[e];
                if edge.capacity <= 0 {
                    continue;
                }
                let candidate = distance[node] + edge.cost;
                if candidate < distance[edge.to] {
                    distance[edge.to] = candidate;
                    predecessor[edge.to] = Some(e);
                    if !in_queue[edge.to] {
                        queue.push_back(edge.to);
                        in_queue[edge.to] = true;
                    }
                }
            }
        }

        if distance[sink] == FlowValue::MAX {
            return None;
        }
        let mut path = Vec::new();
        let mut node = sink;
        while node != source {
            let e = predecessor[node]?;
            path.push(e);
            node = self.edges[e ^ 1].to;
        }
        path.reverse();
        Some(path)
    }

    /// Push as much flow as possible (but at most `limit`) along the path. Returns the amount of
    /// flow pushed.
    fn augment(&mut self, path: &[usize], limit: FlowValue) -> FlowValue {
        let amount = path
            .iter()
            .map(|&e| self.edges[e].capacity)
            .min()
            .unwrap_or(0)
            .min(limit);
        for &e in path {
            self.edges[e].capacity -= amount;
            self.edges[e ^ 1].capacity += amount;
        }
        amount
    }
}

/// Outcome of `min_cost_flow()`
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The requested flow value was reached; contains the flow's total cost
    Complete(FlowValue),
    /// No more augmenting paths; contains the maximum flow value reached
    Incomplete(FlowValue),
    /// The deadline passed before the requested flow value was reached
    TimedOut,
}

/// Send `required` units of flow from `source` to `sink` at minimum cost.
pub fn min_cost_flow(
    network: &mut FlowNetwork,
    source: usize,
    sink: usize,
    required: FlowValue,
    deadline: Option<Instant>,
) -> FlowOutcome {
    let mut flow = 0;
    let mut cost = 0;
    let mut augmentations = 0;
    while flow < required {
        if let Some(d) = deadline {
            if Instant::now() >= d {
                debug!("Deadline reached after {} augmentations", augmentations);
                return FlowOutcome::TimedOut;
            }
        }
        let path = match network.shortest_path(source, sink) {
            Some(p) => p,
            None => {
                debug!("No augmenting path left at flow value {}", flow);
                return FlowOutcome::Incomplete(flow);
            }
        };
        let path_cost: FlowValue = path.iter().map(|&e| network.edges[e].cost).sum();
        let amount = network.augment(&path, required - flow);
        flow += amount;
        cost += amount * path_cost;
        augmentations += 1;
    }
    debug!(
        "Found flow of value {} and cost {} with {} augmentations",
        flow, cost, augmentations
    );
    FlowOutcome::Complete(cost)
}

/// Engine using the built-in min cost flow algorithm
#[derive(Clone, Debug, Default)]
pub struct FlowEngine {}

impl Engine for FlowEngine {
    fn name(&self) -> &str {
        "flow"
    }

    fn solve(&self, problem: &Problem, limits: &Limits) -> Result<EngineResult, String> {
        let start = Instant::now();
        let required = match required_flow(problem) {
            Some(r) => r as FlowValue,
            None => return Ok(EngineResult::without_assignment(Status::Infeasible)),
        };

        let num_professors = problem.professors.len();
        let num_courses = problem.courses.len();
        let source = 0;
        let sink = num_professors + num_courses + 1;
        let professor_node = |p: usize| 1 + p;
        let course_node = |c: usize| 1 + num_professors + c;

        let mut network = FlowNetwork::new(num_professors + num_courses + 2);
        for p in problem.professors.iter() {
            network.add_edge(source, professor_node(p.index), p.load as FlowValue, 0);
        }
        let mut pair_edges = Vec::<(usize, usize, usize)>::new();
        for ((p, c), cost) in problem.costs.indexed_iter() {
            if let Cost::Preference(value) = cost {
                let e = network.add_edge(professor_node(p), course_node(c), 1, *value as FlowValue);
                pair_edges.push((p, c, e));
            }
        }
        for c in problem.courses.iter() {
            network.add_edge(course_node(c.index), sink, c.demand as FlowValue, 0);
        }
        debug!(
            "Built flow network with {} nodes and {} edges",
            sink + 1,
            pair_edges.len() + num_professors + num_courses
        );

        match min_cost_flow(&mut network, source, sink, required, limits.deadline(start)) {
            FlowOutcome::Complete(_) => {
                let assignment = pair_edges
                    .into_iter()
                    .filter(|(_, _, e)| network.flow(*e) > 0)
                    .map(|(p, c, _)| (p, c))
                    .collect();
                Ok(EngineResult {
                    status: Status::Optimal,
                    assignment,
                })
            }
            FlowOutcome::Incomplete(_) => Ok(EngineResult::without_assignment(Status::Infeasible)),
            FlowOutcome::TimedOut => Ok(EngineResult::without_assignment(Status::TimedOut)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{min_cost_flow, FlowNetwork, FlowOutcome};
    use std::time::Instant;

    #[test]
    fn simple_min_cost_flow() {
        // Two parallel routes from 0 to 3: cheap one with capacity 1, expensive one with capacity 2
        let mut network = FlowNetwork::new(4);
        let cheap = network.add_edge(0, 1, 1, 1);
        network.add_edge(1, 3, 5, 1);
        let expensive = network.add_edge(0, 2, 2, 4);
        network.add_edge(2, 3, 5, 4);

        assert_eq!(
            min_cost_flow(&mut network, 0, 3, 2, None),
            FlowOutcome::Complete(2 + 8)
        );
        assert_eq!(network.flow(cheap), 1);
        assert_eq!(network.flow(expensive), 1);
    }

    #[test]
    fn rerouting_via_residual_edges() {
        // 0 -> 1 -> 3 is the cheapest path, but the second unit of flow can only get through, if
        // the first one is rerouted via 1 -> 4.
        let mut network = FlowNetwork::new(6);
        network.add_edge(0, 1, 1, 0);
        network.add_edge(0, 2, 1, 0);
        let e13 = network.add_edge(1, 3, 1, 1);
        let e14 = network.add_edge(1, 4, 1, 5);
        let e23 = network.add_edge(2, 3, 1, 2);
        network.add_edge(3, 5, 1, 0);
        network.add_edge(4, 5, 1, 0);

        assert_eq!(
            min_cost_flow(&mut network, 0, 5, 2, None),
            FlowOutcome::Complete(5 + 2)
        );
        assert_eq!(network.flow(e13), 0);
        assert_eq!(network.flow(e14), 1);
        assert_eq!(network.flow(e23), 1);
    }

    #[test]
    fn incomplete_and_timed_out() {
        let mut network = FlowNetwork::new(3);
        network.add_edge(0, 1, 1, 1);
        network.add_edge(1, 2, 1, 1);
        assert_eq!(
            min_cost_flow(&mut network.clone(), 0, 2, 2, None),
            FlowOutcome::Incomplete(1)
        );
        assert_eq!(
            min_cost_flow(&mut network, 0, 2, 1, Some(Instant::now())),
            FlowOutcome::TimedOut
        );
    }
}
