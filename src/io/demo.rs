//! Built-in demo data set: five professors with a load of five courses each and ten courses with
//! a total demand of 25. Disqualified pairs are marked with `SENTINEL_COST`.

use crate::problem::{InputData, PreferenceEntry};
use crate::{Cost, SENTINEL_COST};

const PROFESSORS: [&str; 5] = ["Prof_A", "Prof_B", "Prof_C", "Prof_D", "Prof_E"];

const COURSES: [(&str, u32); 10] = [
    ("Intro_to_AI", 3),
    ("Advanced_Algorithms", 2),
    ("Databases", 3),
    ("Operating_Systems", 2),
    ("Linear_Algebra", 3),
    ("Web_Development", 3),
    ("Mobile_Apps", 2),
    ("Machine_Learning", 3),
    ("Cybersecurity", 2),
    ("Software_Engineering", 2),
];

const LOAD: u32 = 5;

/// Short name for the disqualification marker in `PREFERENCES`
const X: u32 = SENTINEL_COST;

/// Preferences per professor (rows) and course (columns, same order as `COURSES`)
const PREFERENCES: [[u32; 10]; 5] = [
    [1, 2, X, X, 3, 2, X, 1, X, 3],
    [2, 1, 3, X, X, X, 2, 1, 3, X],
    [X, X, 1, 2, 3, 1, 2, X, X, 3],
    [3, X, 2, 1, X, X, X, 3, 1, 2],
    [1, X, X, 3, 2, 3, 1, 2, X, X],
];

/// Get the built-in data set
pub fn data() -> InputData {
    let mut preferences = Vec::new();
    for (p, row) in PROFESSORS.iter().zip(PREFERENCES.iter()) {
        for ((c, _), value) in COURSES.iter().zip(row.iter()) {
            preferences.push(PreferenceEntry {
                professor: p.to_string(),
                course: c.to_string(),
                preference: Cost::Preference(*value),
            });
        }
    }

    InputData {
        professors: PROFESSORS.iter().map(|p| p.to_string()).collect(),
        courses: COURSES.iter().map(|(c, _)| c.to_string()).collect(),
        preferences,
        demand: COURSES.iter().map(|(c, d)| (c.to_string(), *d)).collect(),
        load: PROFESSORS.iter().map(|p| (p.to_string(), LOAD)).collect(),
    }
}

#[cfg(test)]
mod test {
    use crate::problem::Problem;
    use crate::{Cost, SENTINEL_COST};

    #[test]
    fn demo_data_is_consistent() {
        let problem = Problem::new(super::data()).unwrap();
        crate::assert_data_consistency(&problem);
        assert_eq!(problem.professors.len(), 5);
        assert_eq!(problem.courses.len(), 10);
        assert_eq!(problem.total_demand(), 25);
        assert_eq!(problem.total_load(), 25);
        let a = problem.professor_index("Prof_A").unwrap();
        let db = problem.course_index("Databases").unwrap();
        let ml = problem.course_index("Machine_Learning").unwrap();
        assert_eq!(problem.cost(a, db), Cost::Preference(SENTINEL_COST));
        assert_eq!(problem.cost(a, ml), Cost::Preference(1));
        let sentinels = problem.costs.iter().filter(|c| c.is_sentinel()).count();
        assert_eq!(sentinels, 20);
        assert!(problem.costs.iter().all(|c| c.value() != Some(0)));
    }
}
