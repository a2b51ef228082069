//! Reading and writing the problem data as a directory of CSV tables:
//!
//! * `professors.csv` (`ProfessorName`)
//! * `courses.csv` (`CourseName`)
//! * `course_demand.csv` (`CourseName`, `Demand`)
//! * `professor_load.csv` (`ProfessorName`, `Load`)
//! * `preferences.csv` (`ProfessorName`, `CourseName`, `Preference`)
//!
//! A preference of `forbidden` (or an empty field) marks a forbidden pair.

use crate::problem::{InputData, PreferenceEntry, Problem};
use crate::Cost;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;

const PROFESSORS_FILE: &str = "professors.csv";
const COURSES_FILE: &str = "courses.csv";
const DEMAND_FILE: &str = "course_demand.csv";
const LOAD_FILE: &str = "professor_load.csv";
const PREFERENCES_FILE: &str = "preferences.csv";

#[derive(Debug, Serialize, Deserialize)]
struct ProfessorRecord {
    #[serde(rename = "ProfessorName")]
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct CourseRecord {
    #[serde(rename = "CourseName")]
    name: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct DemandRecord {
    #[serde(rename = "CourseName")]
    course: String,
    #[serde(rename = "Demand")]
    demand: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct LoadRecord {
    #[serde(rename = "ProfessorName")]
    professor: String,
    #[serde(rename = "Load")]
    load: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct PreferenceRecord {
    #[serde(rename = "ProfessorName")]
    professor: String,
    #[serde(rename = "CourseName")]
    course: String,
    #[serde(rename = "Preference")]
    preference: String,
}

/// Read the input data from the CSV tables in the given directory.
pub fn read_dir(path: &Path) -> Result<InputData, String> {
    let professors: Vec<ProfessorRecord> = read_table(&path.join(PROFESSORS_FILE))?;
    let courses: Vec<CourseRecord> = read_table(&path.join(COURSES_FILE))?;
    let demand: Vec<DemandRecord> = read_table(&path.join(DEMAND_FILE))?;
    let load: Vec<LoadRecord> = read_table(&path.join(LOAD_FILE))?;
    let preferences: Vec<PreferenceRecord> = read_table(&path.join(PREFERENCES_FILE))?;

    let preferences = preferences
        .into_iter()
        .map(|record| {
            let preference = parse_preference(&record.preference).map_err(|e| {
                format!(
                    "{}: Invalid preference of '{}' for '{}': {}",
                    PREFERENCES_FILE, record.professor, record.course, e
                )
            })?;
            Ok(PreferenceEntry {
                professor: record.professor,
                course: record.course,
                preference,
            })
        })
        .collect::<Result<Vec<_>, String>>()?;

    debug!(
        "Read {} professors, {} courses and {} preferences from {}",
        professors.len(),
        courses.len(),
        preferences.len(),
        path.display()
    );

    Ok(InputData {
        professors: professors.into_iter().map(|r| r.name).collect(),
        courses: courses.into_iter().map(|r| r.name).collect(),
        preferences,
        demand: demand.into_iter().map(|r| (r.course, r.demand)).collect(),
        load: load.into_iter().map(|r| (r.professor, r.load)).collect(),
    })
}

/// Write the problem's input data as CSV tables into the given directory. The directory is
/// created if it does not exist.
pub fn write_dir(path: &Path, problem: &Problem) -> Result<(), String> {
    std::fs::create_dir_all(path)
        .map_err(|e| format!("Could not create directory {}: {}", path.display(), e))?;

    write_table(
        &path.join(PROFESSORS_FILE),
        problem.professors.iter().map(|p| ProfessorRecord {
            name: p.name.clone(),
        }),
    )?;
    write_table(
        &path.join(COURSES_FILE),
        problem.courses.iter().map(|c| CourseRecord {
            name: c.name.clone(),
        }),
    )?;
    write_table(
        &path.join(DEMAND_FILE),
        problem.courses.iter().map(|c| DemandRecord {
            course: c.name.clone(),
            demand: c.demand,
        }),
    )?;
    write_table(
        &path.join(LOAD_FILE),
        problem.professors.iter().map(|p| LoadRecord {
            professor: p.name.clone(),
            load: p.load,
        }),
    )?;
    write_table(
        &path.join(PREFERENCES_FILE),
        problem
            .to_input_data()
            .preferences
            .into_iter()
            .map(|entry| PreferenceRecord {
                professor: entry.professor,
                course: entry.course,
                preference: entry.preference.to_string(),
            }),
    )?;

    debug!("Exported problem data to {}", path.display());
    Ok(())
}

fn parse_preference(value: &str) -> Result<Cost, std::num::ParseIntError> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("forbidden") {
        Ok(Cost::Forbidden)
    } else {
        value.parse().map(Cost::Preference)
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, String> {
    let mut reader = ::csv::ReaderBuilder::new()
        .trim(::csv::Trim::All)
        .from_path(path)
        .map_err(|e| format!("Could not open {}: {}", path.display(), e))?;
    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| format!("{}: {}", path.display(), e))
}

fn write_table<T: Serialize, I: Iterator<Item = T>>(path: &Path, records: I) -> Result<(), String> {
    let mut writer = ::csv::Writer::from_path(path)
        .map_err(|e| format!("Could not create {}: {}", path.display(), e))?;
    for record in records {
        writer
            .serialize(record)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
    }
    writer
        .flush()
        .map_err(|e| format!("{}: {}", path.display(), e))
}
