pub mod csv;
pub mod demo;
pub mod simple;

use crate::assign::score;
use crate::problem::Problem;
use crate::{Solution, Status};
use std::fmt::Write;

/// Format the calculated assignment into a human readable String (e.g. to print it to stdout).
///
/// The output format will look like
/// ```text
/// Solution Status: Optimal
///
/// --- Courses for Prof_A ---
///   - Intro_to_AI (Preference: 1)
///   - Machine_Learning (Preference: 1)
///
/// --- Courses for Prof_B ---
///   - No courses assigned.
///
/// Total Preference Cost (minimized): 2
/// Average Preference Score per Assignment: 1.00
/// ```
pub fn format_assignment(solution: &Solution, problem: &Problem) -> String {
    let mut result = String::new();
    writeln!(result, "Solution Status: {}", solution.status).unwrap();

    if solution.status != Status::Optimal {
        let reason = match solution.status {
            Status::TimedOut => "The solver ran out of time.",
            Status::Unbounded => "The solver reported an unbounded objective.",
            _ => "The problem is infeasible.",
        };
        write!(result, "\nNo optimal solution found. {}\n", reason).unwrap();
        return result;
    }

    for p in problem.professors.iter() {
        write!(result, "\n--- Courses for {} ---\n", p.name).unwrap();
        let courses = solution.courses_of(p.index);
        if courses.is_empty() {
            writeln!(result, "  - No courses assigned.").unwrap();
        }
        for c in courses {
            writeln!(
                result,
                "  - {} (Preference: {}){}",
                problem.courses[c].name,
                problem.cost(p.index, c),
                if problem.cost(p.index, c).is_sentinel() {
                    " [disqualified]"
                } else {
                    ""
                }
            )
            .unwrap();
        }
    }

    write!(
        result,
        "\nTotal Preference Cost (minimized): {}\n",
        solution.total_cost
    )
    .unwrap();
    if let Some(average) = score::average_cost(solution.total_cost, &solution.assignment) {
        writeln!(
            result,
            "Average Preference Score per Assignment: {:.2}",
            average
        )
        .unwrap();
    }
    result
}
