//! Interchangeable solving engines for the professor/course assignment problem.
//!
//! Every engine takes the validated `Problem` and is responsible for building its own model from
//! it (flow network, LP matrix, .lp file). The engines only report what they found; checking the
//! result against the constraints is left to `assign::solve()`.

pub mod cbc;
pub mod flow;
pub mod simplex;

use crate::assign::SolverOptions;
use crate::problem::Problem;
use crate::{Assignment, Status};
use std::str::FromStr;
use std::time::{Duration, Instant};

/// Resource limits for a single engine run
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub timeout: Option<Duration>,
}

impl Limits {
    /// The point in time, at which a run started at `start` has to be stopped
    pub fn deadline(&self, start: Instant) -> Option<Instant> {
        self.timeout.map(|t| start + t)
    }
}

/// Raw result of an engine run
#[derive(Clone, Debug, PartialEq)]
pub struct EngineResult {
    pub status: Status,
    /// Selected (professor, course) pairs. Only meaningful for `Status::Optimal`.
    pub assignment: Assignment,
}

impl EngineResult {
    pub fn without_assignment(status: Status) -> Self {
        EngineResult {
            status,
            assignment: Vec::new(),
        }
    }
}

/// Common interface of all solving engines
pub trait Engine {
    /// Short name for logging and result output
    fn name(&self) -> &str;

    /// Solve the given problem to optimality. Returns an error string, if the engine could not be
    /// run at all (e.g. external solver not installed). Infeasibility and timeouts are reported via
    /// the result's status.
    fn solve(&self, problem: &Problem, limits: &Limits) -> Result<EngineResult, String>;
}

/// Selection of the available engines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineKind {
    /// Built-in min-cost flow solver
    Flow,
    /// Pure rust simplex/branch-and-bound via microlp
    Simplex,
    /// External CBC executable
    Cbc,
}

impl EngineKind {
    pub fn create(&self, options: &SolverOptions) -> Box<dyn Engine> {
        match self {
            EngineKind::Flow => Box::new(flow::FlowEngine::default()),
            EngineKind::Simplex => Box::new(simplex::SimplexEngine::default()),
            EngineKind::Cbc => Box::new(
                cbc::CbcEngine::new(options.cbc_command.clone())
                    .with_threads(options.threads.unwrap_or_else(num_cpus::get)),
            ),
        }
    }
}

impl FromStr for EngineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flow" => Ok(EngineKind::Flow),
            "simplex" => Ok(EngineKind::Simplex),
            "cbc" => Ok(EngineKind::Cbc),
            _ => Err(format!("Unknown engine '{}'", s)),
        }
    }
}

/// Total number of course places to fill, or None if demand and load don't add up.
fn required_flow(problem: &Problem) -> Option<u64> {
    let total = problem.total_load();
    if total == problem.total_demand() {
        Some(total)
    } else {
        None
    }
}
