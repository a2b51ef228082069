use crate::problem::Problem;
use crate::Cost;

/// Sum of the preference costs of all pairs in the assignment. Returns None if the assignment
/// contains a forbidden pair.
pub fn assignment_cost(problem: &Problem, assignment: &[(usize, usize)]) -> Option<u64> {
    assignment
        .iter()
        .map(|(p, c)| problem.cost(*p, *c).value().map(|v| v as u64))
        .sum()
}

/// Average preference cost per assigned pair, as displayed in the result summary
pub fn average_cost(total_cost: u64, assignment: &[(usize, usize)]) -> Option<f64> {
    if assignment.is_empty() {
        None
    } else {
        Some(total_cost as f64 / assignment.len() as f64)
    }
}

/// Number of assigned pairs priced at the disqualification sentinel cost
pub fn sentinel_count(problem: &Problem, assignment: &[(usize, usize)]) -> usize {
    assignment
        .iter()
        .filter(|(p, c)| problem.cost(*p, *c).is_sentinel())
        .count()
}

/// Lower bound of the total cost: each course's `demand` cheapest allowed professors. Forbidden
/// pairs are ignored. Used to judge the quality of a solution.
pub fn course_lower_bound(problem: &Problem) -> u64 {
    problem
        .courses
        .iter()
        .map(|course| {
            let mut costs: Vec<u64> = problem
                .costs
                .column(course.index)
                .iter()
                .filter_map(|cost| match cost {
                    Cost::Preference(v) => Some(*v as u64),
                    Cost::Forbidden => None,
                })
                .collect();
            costs.sort_unstable();
            costs.iter().take(course.demand as usize).sum::<u64>()
        })
        .sum()
}
