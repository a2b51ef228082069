//! Engine based on the pure rust LP/MILP solver `microlp`.
//!
//! One binary variable is created per non-forbidden professor/course pair. The objective is the
//! sum of preference costs of the selected pairs, with one equality constraint per course (demand)
//! and one per professor (load). The constraint matrix is totally unimodular, so the LP relaxation
//! already is integral and microlp's branch and bound stage finishes immediately.
//!
//! microlp can't be interrupted. To honour a timeout, the solver runs on a separate worker thread
//! and we stop waiting for it when the deadline has passed. The abandoned worker finishes in the
//! background and its result is discarded.

use super::{required_flow, Engine, EngineResult, Limits};
use crate::problem::Problem;
use crate::{Cost, Status};
use log::{debug, warn};
use microlp::{ComparisonOp, OptimizationDirection};
use std::sync::mpsc;
use std::thread;

#[derive(Clone, Debug, Default)]
pub struct SimplexEngine {}

/// The LP model together with the (professor, course) pair represented by each variable
struct LpModel {
    lp: microlp::Problem,
    variables: Vec<(usize, usize, microlp::Variable)>,
}

fn build_model(problem: &Problem) -> LpModel {
    let mut lp = microlp::Problem::new(OptimizationDirection::Minimize);
    let mut variables = Vec::new();
    for ((p, c), cost) in problem.costs.indexed_iter() {
        if let Cost::Preference(value) = cost {
            variables.push((p, c, lp.add_binary_var(*value as f64)));
        }
    }

    for course in problem.courses.iter() {
        let expr: Vec<(microlp::Variable, f64)> = variables
            .iter()
            .filter(|(_, c, _)| *c == course.index)
            .map(|(_, _, v)| (*v, 1.0))
            .collect();
        lp.add_constraint(expr, ComparisonOp::Eq, course.demand as f64);
    }
    for professor in problem.professors.iter() {
        let expr: Vec<(microlp::Variable, f64)> = variables
            .iter()
            .filter(|(p, _, _)| *p == professor.index)
            .map(|(_, _, v)| (*v, 1.0))
            .collect();
        lp.add_constraint(expr, ComparisonOp::Eq, professor.load as f64);
    }
    debug!(
        "Built LP model with {} variables and {} constraints",
        variables.len(),
        problem.courses.len() + problem.professors.len()
    );

    LpModel { lp, variables }
}

impl Engine for SimplexEngine {
    fn name(&self) -> &str {
        "simplex"
    }

    fn solve(&self, problem: &Problem, limits: &Limits) -> Result<EngineResult, String> {
        if required_flow(problem).is_none() {
            return Ok(EngineResult::without_assignment(Status::Infeasible));
        }
        let LpModel { lp, variables } = build_model(problem);

        let vars: Vec<microlp::Variable> = variables.iter().map(|(_, _, v)| *v).collect();
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let result = lp.solve().map(|solution| {
                vars.iter()
                    .map(|v| *solution.var_value(*v))
                    .collect::<Vec<f64>>()
            });
            // The receiver may already have given up waiting
            let _ = sender.send(result);
        });

        let result = match limits.timeout {
            Some(timeout) => match receiver.recv_timeout(timeout) {
                Ok(r) => r,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    debug!("microlp did not finish within {:?}", timeout);
                    return Ok(EngineResult::without_assignment(Status::TimedOut));
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    return Err("microlp worker thread terminated unexpectedly".to_owned())
                }
            },
            None => receiver
                .recv()
                .map_err(|_| "microlp worker thread terminated unexpectedly".to_owned())?,
        };

        match result {
            Ok(values) => {
                let assignment = variables
                    .iter()
                    .zip(values.iter())
                    .filter(|(_, value)| **value > 0.5)
                    .map(|((p, c, _), _)| (*p, *c))
                    .collect();
                Ok(EngineResult {
                    status: Status::Optimal,
                    assignment,
                })
            }
            Err(microlp::Error::Infeasible) => {
                Ok(EngineResult::without_assignment(Status::Infeasible))
            }
            Err(microlp::Error::Unbounded) => {
                warn!("microlp reported an unbounded objective for a bounded problem");
                Ok(EngineResult::without_assignment(Status::Unbounded))
            }
            Err(e) => Err(format!("microlp failed: {}", e)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::build_model;
    use crate::problem::Problem;
    use crate::{Cost, Course, Professor};

    #[test]
    fn forbidden_pairs_get_no_variable() {
        let professors = vec![
            Professor {
                index: 0,
                name: String::from("P1"),
                load: 1,
            },
            Professor {
                index: 1,
                name: String::from("P2"),
                load: 1,
            },
        ];
        let courses = vec![
            Course {
                index: 0,
                name: String::from("C1"),
                demand: 1,
            },
            Course {
                index: 1,
                name: String::from("C2"),
                demand: 1,
            },
        ];
        let costs = ndarray::arr2(&[
            [Cost::Preference(1), Cost::Forbidden],
            [Cost::Preference(2), Cost::Preference(3)],
        ]);
        let problem = Problem::from_parts(professors, courses, costs).unwrap();
        let model = build_model(&problem);
        let pairs: Vec<(usize, usize)> = model.variables.iter().map(|(p, c, _)| (*p, *c)).collect();
        assert_eq!(pairs, vec![(0, 0), (1, 0), (1, 1)]);

        let solution = model.lp.solve().unwrap();
        assert_eq!(solution.objective().round() as i64, 4);
    }
}
