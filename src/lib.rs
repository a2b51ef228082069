//! Assignment of professors to courses by minimising the total preference cost.
//!
//! The crate reads the problem data (professors with their teaching load, courses with their
//! demand and a preference cost for every professor/course pair), validates it into a
//! [`problem::Problem`] and hands it to one of the interchangeable solving engines in [`engine`].
//! [`assign::solve`] ties everything together and returns a verified [`Solution`].

pub mod assign;
pub mod engine;
pub mod io;
pub mod problem;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Cost value conventionally used to mark a professor as disqualified for a course. It is still an
/// ordinary (very expensive) cost: the pair stays usable if nothing else is possible.
pub const SENTINEL_COST: u32 = 999;

/// Representation of a professor's data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Professor {
    /// id/index of the Professor in the list of professors
    #[serde(skip)]
    pub index: usize,
    /// Professor's name, unique within the problem
    pub name: String,
    /// Exact number of courses this professor has to teach
    pub load: u32,
}

/// Representation of a course's data
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    /// id/index of the Course in the list of courses
    #[serde(skip)]
    pub index: usize,
    /// Course's name, unique within the problem
    pub name: String,
    /// Exact number of professors to be assigned to this course
    pub demand: u32,
}

/// Cost of assigning a professor to a course. Lower is better.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cost {
    /// A regular preference cost (including `SENTINEL_COST`)
    Preference(u32),
    /// The pair must not be used at all
    Forbidden,
}

impl Cost {
    /// The numeric cost, or None for forbidden pairs
    pub fn value(&self) -> Option<u32> {
        match self {
            Cost::Preference(c) => Some(*c),
            Cost::Forbidden => None,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Cost::Forbidden)
    }

    /// True for pairs priced at (or above) the disqualification sentinel
    pub fn is_sentinel(&self) -> bool {
        matches!(self, Cost::Preference(c) if *c >= SENTINEL_COST)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Preference(c) => write!(f, "{}", c),
            Cost::Forbidden => f.write_str("forbidden"),
        }
    }
}

// Serialized as plain number or `null` for forbidden pairs.
impl Serialize for Cost {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cost {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<u32>::deserialize(deserializer)? {
            Some(c) => Cost::Preference(c),
            None => Cost::Forbidden,
        })
    }
}

/// A set of (professor index, course index) pairs, sorted by professor, then course
pub type Assignment = Vec<(usize, usize)>;

/// Terminal status of a solve run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Optimal,
    Infeasible,
    Unbounded,
    TimedOut,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Optimal => "Optimal",
            Status::Infeasible => "Infeasible",
            Status::Unbounded => "Unbounded",
            Status::TimedOut => "TimedOut",
        };
        f.write_str(s)
    }
}

/// Result of `assign::solve()`
#[derive(Clone, Debug, PartialEq)]
pub struct Solution {
    pub status: Status,
    /// The selected pairs. Empty unless `status` is `Optimal`.
    pub assignment: Assignment,
    /// Sum of the preference costs of all selected pairs
    pub total_cost: u64,
    /// Name of the engine that produced the result
    pub engine: String,
    pub elapsed: Duration,
}

impl Solution {
    pub fn is_optimal(&self) -> bool {
        self.status == Status::Optimal
    }

    /// Turn a non-optimal terminal status into an `Error::SolverFailure`
    pub fn ensure_optimal(&self) -> Result<&Solution, Error> {
        if self.is_optimal() {
            Ok(self)
        } else {
            Err(Error::SolverFailure(self.status))
        }
    }

    /// Indexes of the courses assigned to the given professor
    pub fn courses_of(&self, professor: usize) -> Vec<usize> {
        self.assignment
            .iter()
            .filter(|(p, _)| *p == professor)
            .map(|(_, c)| *c)
            .collect()
    }

    /// Indexes of the professors assigned to the given course
    pub fn professors_of(&self, course: usize) -> Vec<usize> {
        self.assignment
            .iter()
            .filter(|(_, c)| *c == course)
            .map(|(p, _)| *p)
            .collect()
    }
}

/// Malformed or incomplete input data
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    NoProfessors,
    NoCourses,
    DuplicateProfessor(String),
    DuplicateCourse(String),
    UnknownProfessor(String),
    UnknownCourse(String),
    DuplicatePreference { professor: String, course: String },
    MissingPreference { professor: String, course: String },
    DuplicateDemand(String),
    DuplicateLoad(String),
    MissingDemand(String),
    MissingLoad(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigurationError::NoProfessors => f.write_str("No professors given."),
            ConfigurationError::NoCourses => f.write_str("No courses given."),
            ConfigurationError::DuplicateProfessor(p) => {
                write!(f, "Professor '{}' is listed more than once.", p)
            }
            ConfigurationError::DuplicateCourse(c) => {
                write!(f, "Course '{}' is listed more than once.", c)
            }
            ConfigurationError::UnknownProfessor(p) => write!(f, "Unknown professor '{}'.", p),
            ConfigurationError::UnknownCourse(c) => write!(f, "Unknown course '{}'.", c),
            ConfigurationError::DuplicatePreference { professor, course } => write!(
                f,
                "Preference of '{}' for '{}' is given more than once.",
                professor, course
            ),
            ConfigurationError::MissingPreference { professor, course } => write!(
                f,
                "No preference of '{}' for '{}' given.",
                professor, course
            ),
            ConfigurationError::DuplicateDemand(c) => {
                write!(f, "Demand of course '{}' is given more than once.", c)
            }
            ConfigurationError::DuplicateLoad(p) => {
                write!(f, "Load of professor '{}' is given more than once.", p)
            }
            ConfigurationError::MissingDemand(c) => write!(f, "No demand given for course '{}'.", c),
            ConfigurationError::MissingLoad(p) => write!(f, "No load given for professor '{}'.", p),
        }
    }
}

impl std::error::Error for ConfigurationError {}

/// Constraint system that is provably infeasible, detected before invoking any engine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeasibilityError {
    /// Σ demand != Σ load
    SumMismatch { total_demand: u64, total_load: u64 },
    /// A professor's load exceeds the number of courses they may teach
    LoadExceedsCourses {
        professor: String,
        load: u32,
        available: usize,
    },
    /// A course's demand exceeds the number of professors allowed to teach it
    DemandExceedsProfessors {
        course: String,
        demand: u32,
        available: usize,
    },
}

impl fmt::Display for FeasibilityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeasibilityError::SumMismatch {
                total_demand,
                total_load,
            } => write!(
                f,
                "Total course demand ({}) does not match total professor load ({}).",
                total_demand, total_load
            ),
            FeasibilityError::LoadExceedsCourses {
                professor,
                load,
                available,
            } => write!(
                f,
                "Load of professor '{}' ({}) exceeds the {} courses available to them.",
                professor, load, available
            ),
            FeasibilityError::DemandExceedsProfessors {
                course,
                demand,
                available,
            } => write!(
                f,
                "Demand of course '{}' ({}) exceeds the {} available qualified professors.",
                course, demand, available
            ),
        }
    }
}

impl std::error::Error for FeasibilityError {}

/// Error type of the solving functions
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    Configuration(ConfigurationError),
    Feasibility(FeasibilityError),
    /// The engine finished with a non-optimal status
    SolverFailure(Status),
    /// The engine could not be run or returned garbage
    Engine(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "Invalid input data: {}", e),
            Error::Feasibility(e) => write!(f, "Problem is infeasible: {}", e),
            Error::SolverFailure(status) => write!(f, "No optimal solution found ({}).", status),
            Error::Engine(msg) => write!(f, "Solver engine failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Configuration(e) => Some(e),
            Error::Feasibility(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigurationError> for Error {
    fn from(e: ConfigurationError) -> Self {
        Error::Configuration(e)
    }
}

impl From<FeasibilityError> for Error {
    fn from(e: FeasibilityError) -> Self {
        Error::Feasibility(e)
    }
}

/// Check consistency of a validated problem's indexes and cost matrix shape. Used in tests of
/// the IO modules.
#[cfg(test)]
fn assert_data_consistency(problem: &problem::Problem) {
    for (i, p) in problem.professors.iter().enumerate() {
        assert_eq!(i, p.index, "Index of {}. professor is {}", i, p.index);
        assert_eq!(problem.professor_index(&p.name), Some(i));
    }
    for (i, c) in problem.courses.iter().enumerate() {
        assert_eq!(i, c.index, "Index of {}. course is {}", i, c.index);
        assert_eq!(problem.course_index(&c.name), Some(i));
    }
    assert_eq!(
        problem.costs.dim(),
        (problem.professors.len(), problem.courses.len())
    );
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cost_serialization() {
        let costs = vec![Cost::Preference(3), Cost::Forbidden, Cost::Preference(SENTINEL_COST)];
        let json = serde_json::to_string(&costs).unwrap();
        assert_eq!(json, "[3,null,999]");
        let parsed: Vec<Cost> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, costs);
        assert!(parsed[2].is_sentinel());
        assert!(!parsed[0].is_sentinel());
        assert!(!parsed[1].is_sentinel());
    }

    #[test]
    fn ensure_optimal() {
        let mut solution = Solution {
            status: Status::Optimal,
            assignment: vec![(0, 1), (1, 0)],
            total_cost: 2,
            engine: String::from("flow"),
            elapsed: Duration::from_millis(1),
        };
        assert!(solution.ensure_optimal().is_ok());
        assert_eq!(solution.courses_of(0), vec![1]);
        assert_eq!(solution.professors_of(0), vec![1]);

        solution.status = Status::TimedOut;
        assert_eq!(
            solution.ensure_optimal().err(),
            Some(Error::SolverFailure(Status::TimedOut))
        );
    }
}
