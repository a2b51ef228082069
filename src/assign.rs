//! The assignment solver: validation of the problem's feasibility, invocation of the selected
//! engine and verification of the engine's result.
//!
//! The pre-checks in `check_feasibility()` fail fast on problems which are provably infeasible,
//! without building any engine model. All other outcomes of the optimization (including
//! infeasibility found by the engine and timeouts) are reported as the `Solution`'s status.

pub mod score;
#[cfg(test)]
mod tests;

use crate::engine::{EngineKind, EngineResult, Limits};
use crate::problem::{InputData, Problem};
use crate::{Error, FeasibilityError, Solution, Status};
use log::{debug, info, warn};
use std::time::{Duration, Instant};

/// Options for `solve()`
#[derive(Clone, Debug)]
pub struct SolverOptions {
    pub engine: EngineKind,
    /// Maximum run time of the engine. None means no limit.
    pub timeout: Option<Duration>,
    /// Command to run for the CBC engine
    pub cbc_command: String,
    /// Number of threads for the CBC engine. Defaults to the number of CPUs.
    pub threads: Option<usize>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            engine: EngineKind::Flow,
            timeout: None,
            cbc_command: String::from("cbc"),
            threads: None,
        }
    }
}

/// Check the problem for obvious infeasibility: demand and load must add up, no professor may have
/// to teach more courses than they are allowed to teach and no course may need more professors than
/// allowed to teach it.
pub fn check_feasibility(problem: &Problem) -> Result<(), FeasibilityError> {
    let total_demand = problem.total_demand();
    let total_load = problem.total_load();
    if total_demand != total_load {
        return Err(FeasibilityError::SumMismatch {
            total_demand,
            total_load,
        });
    }

    for p in problem.professors.iter() {
        let available = problem
            .costs
            .row(p.index)
            .iter()
            .filter(|cost| !cost.is_forbidden())
            .count();
        if p.load as usize > available {
            return Err(FeasibilityError::LoadExceedsCourses {
                professor: p.name.clone(),
                load: p.load,
                available,
            });
        }
    }
    for c in problem.courses.iter() {
        let available = problem
            .costs
            .column(c.index)
            .iter()
            .filter(|cost| !cost.is_forbidden())
            .count();
        if c.demand as usize > available {
            return Err(FeasibilityError::DemandExceedsProfessors {
                course: c.name.clone(),
                demand: c.demand,
                available,
            });
        }
    }
    Ok(())
}

/// Main method of the module to solve a professor assignment problem.
///
/// It runs the feasibility pre-checks, solves the problem with the engine selected in `options`
/// and verifies the result.
///
/// # Errors
///
/// * `Error::Feasibility` if the pre-checks fail (the engine is not invoked in that case)
/// * `Error::Engine` if the engine could not be run or returned an assignment that violates the
///   problem's constraints
pub fn solve(problem: &Problem, options: &SolverOptions) -> Result<Solution, Error> {
    check_feasibility(problem)?;

    let engine = options.engine.create(options);
    let limits = Limits {
        timeout: options.timeout,
    };
    info!(
        "Solving assignment of {} professors to {} courses with {} engine",
        problem.professors.len(),
        problem.courses.len(),
        engine.name()
    );
    let start = Instant::now();
    let result = engine.solve(problem, &limits).map_err(Error::Engine)?;
    let elapsed = start.elapsed();
    debug!("Engine {} finished after {:?}", engine.name(), elapsed);

    let solution = build_solution(problem, result, engine.name(), elapsed)?;
    match solution.status {
        Status::Optimal => info!(
            "Found optimal assignment with total cost {} in {:?}",
            solution.total_cost, elapsed
        ),
        Status::Unbounded => warn!(
            "Engine {} reported an unbounded problem, which should be impossible",
            engine.name()
        ),
        status => info!("No optimal assignment found: {}", status),
    }
    Ok(solution)
}

/// Validate the name based input data and solve it. See `solve()`.
pub fn solve_input(input: InputData, options: &SolverOptions) -> Result<Solution, Error> {
    let problem = Problem::new(input)?;
    solve(&problem, options)
}

/// Convert the engine's result into a `Solution`, checking all constraints on the way.
fn build_solution(
    problem: &Problem,
    mut result: EngineResult,
    engine: &str,
    elapsed: Duration,
) -> Result<Solution, Error> {
    if result.status != Status::Optimal {
        return Ok(Solution {
            status: result.status,
            assignment: Vec::new(),
            total_cost: 0,
            engine: engine.to_owned(),
            elapsed,
        });
    }

    result.assignment.sort_unstable();
    check_assignment(problem, &result.assignment).map_err(Error::Engine)?;
    let total_cost = score::assignment_cost(problem, &result.assignment)
        .ok_or_else(|| Error::Engine(format!("Engine {} used a forbidden pair", engine)))?;

    let sentinels = score::sentinel_count(problem, &result.assignment);
    if sentinels > 0 {
        warn!(
            "{} professors had to be assigned to courses they are disqualified for",
            sentinels
        );
    }

    Ok(Solution {
        status: Status::Optimal,
        assignment: result.assignment,
        total_cost,
        engine: engine.to_owned(),
        elapsed,
    })
}

/// Check that the assignment fulfills every course's demand and every professor's load exactly
/// and only uses allowed pairs. Returns a description of the first violation.
pub fn check_assignment(problem: &Problem, assignment: &[(usize, usize)]) -> Result<(), String> {
    let mut course_size = vec![0u32; problem.courses.len()];
    let mut professor_load = vec![0u32; problem.professors.len()];
    let mut used = ndarray::Array2::from_elem(problem.costs.dim(), false);
    for (p, c) in assignment.iter() {
        if *p >= professor_load.len() || *c >= course_size.len() {
            return Err(format!("Invalid pair ({}, {}) in assignment", p, c));
        }
        if std::mem::replace(&mut used[[*p, *c]], true) {
            return Err(format!(
                "Professor {} is assigned to course {} twice",
                problem.professors[*p].name, problem.courses[*c].name
            ));
        }
        if problem.cost(*p, *c).is_forbidden() {
            return Err(format!(
                "Professor {} is assigned to forbidden course {}",
                problem.professors[*p].name, problem.courses[*c].name
            ));
        }
        course_size[*c] += 1;
        professor_load[*p] += 1;
    }
    for (c, size) in course_size.iter().enumerate() {
        if *size != problem.courses[c].demand {
            return Err(format!(
                "Course {} has {} professors instead of {}",
                problem.courses[c].name, size, problem.courses[c].demand
            ));
        }
    }
    for (p, load) in professor_load.iter().enumerate() {
        if *load != problem.professors[p].load {
            return Err(format!(
                "Professor {} teaches {} courses instead of {}",
                problem.professors[p].name, load, problem.professors[p].load
            ));
        }
    }
    Ok(())
}
