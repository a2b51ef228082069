use super::{check_assignment, check_feasibility, solve, solve_input, SolverOptions};
use crate::engine::EngineKind;
use crate::problem::{InputData, PreferenceEntry, Problem};
use crate::{Cost, Error, FeasibilityError, Status, SENTINEL_COST};
use std::time::Duration;

const ENGINES: [EngineKind; 2] = [EngineKind::Flow, EngineKind::Simplex];

fn options(engine: EngineKind) -> SolverOptions {
    SolverOptions {
        engine,
        ..SolverOptions::default()
    }
}

/// Build input data from a cost matrix (rows = professors), loads and demands. Names are `P{i}`
/// and `C{j}`.
fn create_problem(costs: &[&[Cost]], load: &[u32], demand: &[u32]) -> InputData {
    let professors: Vec<String> = (0..load.len()).map(|i| format!("P{}", i)).collect();
    let courses: Vec<String> = (0..demand.len()).map(|j| format!("C{}", j)).collect();
    let mut preferences = Vec::new();
    for (i, row) in costs.iter().enumerate() {
        for (j, cost) in row.iter().enumerate() {
            preferences.push(PreferenceEntry {
                professor: professors[i].clone(),
                course: courses[j].clone(),
                preference: *cost,
            });
        }
    }
    InputData {
        demand: courses.iter().cloned().zip(demand.iter().cloned()).collect(),
        load: professors.iter().cloned().zip(load.iter().cloned()).collect(),
        professors,
        courses,
        preferences,
    }
}

fn pref(value: u32) -> Cost {
    Cost::Preference(value)
}

#[test]
fn test_simple_assignment() {
    let input = create_problem(&[&[pref(1), pref(5)], &[pref(5), pref(1)]], &[1, 1], &[1, 1]);
    for engine in ENGINES.iter() {
        let solution = solve_input(input.clone(), &options(*engine)).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.assignment, vec![(0, 0), (1, 1)]);
        assert_eq!(solution.total_cost, 2);
    }
}

#[test]
fn test_single_professor_with_higher_load() {
    let input = create_problem(&[&[pref(3), pref(4)]], &[2], &[1, 1]);
    for engine in ENGINES.iter() {
        let solution = solve_input(input.clone(), &options(*engine)).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.assignment, vec![(0, 0), (0, 1)]);
        assert_eq!(solution.total_cost, 7);
        assert_eq!(solution.courses_of(0), vec![0, 1]);
    }
}

#[test]
fn test_sentinel_pair_is_used_if_necessary() {
    let input = create_problem(
        &[
            &[pref(SENTINEL_COST), Cost::Forbidden],
            &[pref(1), pref(1)],
        ],
        &[1, 1],
        &[1, 1],
    );
    for engine in ENGINES.iter() {
        let solution = solve_input(input.clone(), &options(*engine)).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.assignment, vec![(0, 0), (1, 1)]);
        assert_eq!(solution.total_cost, SENTINEL_COST as u64 + 1);
    }
}

#[test]
fn test_sum_mismatch() {
    let input = create_problem(&[&[pref(1), pref(2)], &[pref(2), pref(1)]], &[1, 1], &[2, 1]);
    let problem = Problem::new(input).unwrap();
    assert_eq!(
        check_feasibility(&problem),
        Err(FeasibilityError::SumMismatch {
            total_demand: 3,
            total_load: 2
        })
    );
    // The CBC command does not exist: the error must come from the pre-check
    let options = SolverOptions {
        engine: EngineKind::Cbc,
        cbc_command: String::from("/nonexistent/cbc"),
        ..SolverOptions::default()
    };
    assert_eq!(
        solve(&problem, &options).err(),
        Some(Error::Feasibility(FeasibilityError::SumMismatch {
            total_demand: 3,
            total_load: 2
        }))
    );
}

#[test]
fn test_forbidden_pairs_in_feasibility_check() {
    let input = create_problem(
        &[&[pref(1), Cost::Forbidden], &[pref(1), pref(1)]],
        &[2, 0],
        &[1, 1],
    );
    let problem = Problem::new(input).unwrap();
    assert_eq!(
        check_feasibility(&problem),
        Err(FeasibilityError::LoadExceedsCourses {
            professor: String::from("P0"),
            load: 2,
            available: 1
        })
    );

    let input = create_problem(
        &[&[pref(1), Cost::Forbidden], &[pref(1), Cost::Forbidden]],
        &[1, 1],
        &[0, 2],
    );
    let problem = Problem::new(input).unwrap();
    assert_eq!(
        check_feasibility(&problem),
        Err(FeasibilityError::DemandExceedsProfessors {
            course: String::from("C1"),
            demand: 2,
            available: 0
        })
    );
}

#[test]
fn test_infeasible_by_engine() {
    // P0 and P1 can both only teach C0, which needs only one of them
    let input = create_problem(
        &[
            &[pref(1), Cost::Forbidden, Cost::Forbidden],
            &[pref(1), Cost::Forbidden, Cost::Forbidden],
            &[pref(1), pref(1), pref(1)],
        ],
        &[1, 1, 1],
        &[1, 1, 1],
    );
    let problem = Problem::new(input).unwrap();
    assert!(check_feasibility(&problem).is_ok());
    for engine in ENGINES.iter() {
        let solution = solve(&problem, &options(*engine)).unwrap();
        assert_eq!(solution.status, Status::Infeasible);
        assert!(solution.assignment.is_empty());
        assert_eq!(
            solution.ensure_optimal().err(),
            Some(Error::SolverFailure(Status::Infeasible))
        );
    }
}

#[test]
fn test_demo_data() {
    let problem = Problem::new(crate::io::demo::data()).unwrap();
    for engine in ENGINES.iter() {
        let solution = solve(&problem, &options(*engine)).unwrap();
        assert_eq!(solution.status, Status::Optimal);
        assert_eq!(solution.total_cost, 47);
        assert_eq!(solution.assignment.len(), 25);
        assert!(check_assignment(&problem, &solution.assignment).is_ok());
        assert_eq!(
            super::score::sentinel_count(&problem, &solution.assignment),
            0
        );

        let literal_sum: u64 = solution
            .assignment
            .iter()
            .map(|(p, c)| problem.cost(*p, *c).value().unwrap() as u64)
            .sum();
        assert_eq!(solution.total_cost, literal_sum);
        assert!(solution.total_cost >= super::score::course_lower_bound(&problem));
    }
}

#[test]
fn test_relabelled_professors() {
    let mut input = crate::io::demo::data();
    input.professors.reverse();
    input.preferences.reverse();
    let problem = Problem::new(input).unwrap();
    assert_eq!(problem.professors[0].name, "Prof_E");

    let solution = solve(&problem, &SolverOptions::default()).unwrap();
    assert_eq!(solution.status, Status::Optimal);
    assert_eq!(solution.total_cost, 47);
}

#[test]
fn test_zero_timeout() {
    let problem = Problem::new(crate::io::demo::data()).unwrap();
    for engine in ENGINES.iter() {
        let limited = SolverOptions {
            timeout: Some(Duration::ZERO),
            ..options(*engine)
        };
        let solution = solve(&problem, &limited).unwrap();
        assert_eq!(solution.status, Status::TimedOut);
        assert!(solution.assignment.is_empty());
        assert_eq!(solution.total_cost, 0);
        assert_eq!(
            solution.ensure_optimal().err(),
            Some(Error::SolverFailure(Status::TimedOut))
        );
    }
}

#[test]
fn test_check_assignment() {
    let input = create_problem(
        &[&[pref(1), Cost::Forbidden], &[pref(2), pref(1)]],
        &[1, 1],
        &[1, 1],
    );
    let problem = Problem::new(input).unwrap();

    assert!(check_assignment(&problem, &[(0, 0), (1, 1)]).is_ok());
    assert!(check_assignment(&problem, &[(0, 1), (1, 0)])
        .unwrap_err()
        .contains("forbidden"));
    assert!(check_assignment(&problem, &[(1, 0), (1, 0)])
        .unwrap_err()
        .contains("twice"));
    assert!(check_assignment(&problem, &[(0, 0)])
        .unwrap_err()
        .contains("instead of"));
    assert!(check_assignment(&problem, &[(0, 0), (2, 1)])
        .unwrap_err()
        .contains("Invalid pair"));
}

#[test]
fn test_scores() {
    let input = create_problem(
        &[&[pref(1), Cost::Forbidden], &[pref(SENTINEL_COST), pref(2)]],
        &[1, 1],
        &[1, 1],
    );
    let problem = Problem::new(input).unwrap();
    use assert_float_eq::*;

    assert_eq!(super::score::assignment_cost(&problem, &[(0, 0), (1, 1)]), Some(3));
    assert_eq!(super::score::assignment_cost(&problem, &[(0, 1), (1, 0)]), None);
    assert_eq!(super::score::sentinel_count(&problem, &[(0, 0), (1, 0)]), 1);
    assert_eq!(super::score::course_lower_bound(&problem), 3);
    assert_eq!(super::score::average_cost(0, &[]), None);
    assert_f64_near!(
        super::score::average_cost(3, &[(0, 0), (1, 1)]).unwrap(),
        1.5
    );
}
