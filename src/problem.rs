//! Input data structures and their validation into a dense, index-based problem description.

use crate::{ConfigurationError, Cost, Course, Professor};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One (professor, course, preference) entry of the preference table in long format
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceEntry {
    pub professor: String,
    pub course: String,
    pub preference: Cost,
}

/// The raw, name-based input data as provided by the different input sources (built-in data, CSV
/// files, JSON file). Use `Problem::new()` to validate it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InputData {
    pub professors: Vec<String>,
    pub courses: Vec<String>,
    pub preferences: Vec<PreferenceEntry>,
    /// Demand per course name
    pub demand: Vec<(String, u32)>,
    /// Load per professor name
    pub load: Vec<(String, u32)>,
}

/// Validated problem description. All lookups are by index; the name maps are only used at the
/// boundaries (input conversion and output).
#[derive(Clone, Debug)]
pub struct Problem {
    pub professors: Vec<Professor>,
    pub courses: Vec<Course>,
    /// Cost matrix. Each row represents a professor, each column a course.
    pub costs: ndarray::Array2<Cost>,
    professor_ids: HashMap<String, usize>,
    course_ids: HashMap<String, usize>,
}

impl Problem {
    /// Validate the name-based input data and build the index-based problem.
    ///
    /// # Errors
    ///
    /// Fails with a `ConfigurationError` if
    /// * no professors or no courses are given
    /// * any professor or course is listed twice
    /// * a preference, demand or load entry references an unknown name or is given twice
    /// * any professor/course pair has no preference entry
    /// * any course has no demand or any professor has no load
    pub fn new(input: InputData) -> Result<Problem, ConfigurationError> {
        if input.professors.is_empty() {
            return Err(ConfigurationError::NoProfessors);
        }
        if input.courses.is_empty() {
            return Err(ConfigurationError::NoCourses);
        }

        let professor_ids = index_names(&input.professors)
            .map_err(|name| ConfigurationError::DuplicateProfessor(name.to_owned()))?;
        let course_ids = index_names(&input.courses)
            .map_err(|name| ConfigurationError::DuplicateCourse(name.to_owned()))?;

        let mut load: Vec<Option<u32>> = vec![None; input.professors.len()];
        for (name, value) in input.load.iter() {
            let p = *professor_ids
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownProfessor(name.clone()))?;
            if load[p].replace(*value).is_some() {
                return Err(ConfigurationError::DuplicateLoad(name.clone()));
            }
        }
        let mut demand: Vec<Option<u32>> = vec![None; input.courses.len()];
        for (name, value) in input.demand.iter() {
            let c = *course_ids
                .get(name)
                .ok_or_else(|| ConfigurationError::UnknownCourse(name.clone()))?;
            if demand[c].replace(*value).is_some() {
                return Err(ConfigurationError::DuplicateDemand(name.clone()));
            }
        }

        let mut costs: ndarray::Array2<Option<Cost>> =
            ndarray::Array2::from_elem([input.professors.len(), input.courses.len()], None);
        for entry in input.preferences.iter() {
            let p = *professor_ids
                .get(&entry.professor)
                .ok_or_else(|| ConfigurationError::UnknownProfessor(entry.professor.clone()))?;
            let c = *course_ids
                .get(&entry.course)
                .ok_or_else(|| ConfigurationError::UnknownCourse(entry.course.clone()))?;
            if costs[[p, c]].replace(entry.preference).is_some() {
                return Err(ConfigurationError::DuplicatePreference {
                    professor: entry.professor.clone(),
                    course: entry.course.clone(),
                });
            }
        }

        let professors = input
            .professors
            .iter()
            .enumerate()
            .map(|(index, name)| {
                Ok(Professor {
                    index,
                    name: name.clone(),
                    load: load[index].ok_or_else(|| ConfigurationError::MissingLoad(name.clone()))?,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;
        let courses = input
            .courses
            .iter()
            .enumerate()
            .map(|(index, name)| {
                Ok(Course {
                    index,
                    name: name.clone(),
                    demand: demand[index]
                        .ok_or_else(|| ConfigurationError::MissingDemand(name.clone()))?,
                })
            })
            .collect::<Result<Vec<_>, ConfigurationError>>()?;

        if let Some(((p, c), _)) = costs.indexed_iter().find(|(_, cost)| cost.is_none()) {
            return Err(ConfigurationError::MissingPreference {
                professor: professors[p].name.clone(),
                course: courses[c].name.clone(),
            });
        }
        let costs = costs.mapv(|cost| cost.unwrap_or(Cost::Forbidden));

        debug!(
            "Built problem with {} professors, {} courses and {} forbidden pairs",
            professors.len(),
            courses.len(),
            costs.iter().filter(|c| c.is_forbidden()).count()
        );

        Ok(Problem {
            professors,
            courses,
            costs,
            professor_ids,
            course_ids,
        })
    }

    /// Build a problem directly from professor and course objects and a cost matrix (rows =
    /// professors). The objects' indexes are overwritten with their position.
    #[cfg(test)]
    pub(crate) fn from_parts(
        mut professors: Vec<Professor>,
        mut courses: Vec<Course>,
        costs: ndarray::Array2<Cost>,
    ) -> Result<Problem, ConfigurationError> {
        if professors.is_empty() {
            return Err(ConfigurationError::NoProfessors);
        }
        if courses.is_empty() {
            return Err(ConfigurationError::NoCourses);
        }
        for (i, p) in professors.iter_mut().enumerate() {
            p.index = i;
        }
        for (i, c) in courses.iter_mut().enumerate() {
            c.index = i;
        }
        let professor_names: Vec<String> = professors.iter().map(|p| p.name.clone()).collect();
        let course_names: Vec<String> = courses.iter().map(|c| c.name.clone()).collect();
        let professor_ids = index_names(&professor_names)
            .map_err(|name| ConfigurationError::DuplicateProfessor(name.to_owned()))?;
        let course_ids = index_names(&course_names)
            .map_err(|name| ConfigurationError::DuplicateCourse(name.to_owned()))?;

        let (rows, cols) = costs.dim();
        if rows < professors.len() {
            return Err(ConfigurationError::MissingPreference {
                professor: professors[rows].name.clone(),
                course: courses[0].name.clone(),
            });
        }
        if cols < courses.len() {
            return Err(ConfigurationError::MissingPreference {
                professor: professors[0].name.clone(),
                course: courses[cols].name.clone(),
            });
        }
        if rows > professors.len() {
            return Err(ConfigurationError::UnknownProfessor(format!("row {}", professors.len())));
        }
        if cols > courses.len() {
            return Err(ConfigurationError::UnknownCourse(format!("column {}", courses.len())));
        }

        Ok(Problem {
            professors,
            courses,
            costs,
            professor_ids,
            course_ids,
        })
    }

    pub fn cost(&self, professor: usize, course: usize) -> Cost {
        self.costs[[professor, course]]
    }

    pub fn professor_index(&self, name: &str) -> Option<usize> {
        self.professor_ids.get(name).copied()
    }

    pub fn course_index(&self, name: &str) -> Option<usize> {
        self.course_ids.get(name).copied()
    }

    pub fn total_demand(&self) -> u64 {
        self.courses.iter().map(|c| c.demand as u64).sum()
    }

    pub fn total_load(&self) -> u64 {
        self.professors.iter().map(|p| p.load as u64).sum()
    }

    /// Convert back into the name-based representation, e.g. for exporting the data.
    pub fn to_input_data(&self) -> InputData {
        let mut preferences = Vec::with_capacity(self.costs.len());
        for p in self.professors.iter() {
            for c in self.courses.iter() {
                preferences.push(PreferenceEntry {
                    professor: p.name.clone(),
                    course: c.name.clone(),
                    preference: self.cost(p.index, c.index),
                });
            }
        }
        InputData {
            professors: self.professors.iter().map(|p| p.name.clone()).collect(),
            courses: self.courses.iter().map(|c| c.name.clone()).collect(),
            preferences,
            demand: self
                .courses
                .iter()
                .map(|c| (c.name.clone(), c.demand))
                .collect(),
            load: self
                .professors
                .iter()
                .map(|p| (p.name.clone(), p.load))
                .collect(),
        }
    }
}

/// Map each name to its position. Returns the first duplicate name as error.
fn index_names(names: &[String]) -> Result<HashMap<String, usize>, &str> {
    let mut result = HashMap::with_capacity(names.len());
    for (i, name) in names.iter().enumerate() {
        if result.insert(name.clone(), i).is_some() {
            return Err(name.as_str());
        }
    }
    Ok(result)
}
