use crate::problem::{InputData, PreferenceEntry, Problem};
use crate::{Course, Professor, Solution};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

const INPUT_FORMAT: &str = "X-professorassignment-simple";
const RESULT_FORMAT: &str = "X-professorassignment-result";

/// Read the input data from the simple JSON representation (canonical serde_json serialization of
/// `Professor`, `Course` and `PreferenceEntry` objects).
pub fn read<R: std::io::Read>(reader: R) -> Result<InputData, String> {
    let mut data: serde_json::Value =
        serde_json::from_reader(reader).map_err(|err| err.to_string())?;
    if !data.is_object() {
        return Err("Input file must contain a JSON object".to_owned());
    }
    if let Some(format) = data.get("format").and_then(|v| v.as_str()) {
        if format != INPUT_FORMAT {
            return Err(format!("Unexpected file format '{}'", format));
        }
    }

    let professors: Vec<Professor> =
        serde_json::from_value(data["professors"].take()).map_err(|e| format!("{}", e))?;
    let courses: Vec<Course> =
        serde_json::from_value(data["courses"].take()).map_err(|e| format!("{}", e))?;
    let preferences: Vec<PreferenceEntry> =
        serde_json::from_value(data["preferences"].take()).map_err(|e| format!("{}", e))?;

    Ok(InputData {
        professors: professors.iter().map(|p| p.name.clone()).collect(),
        courses: courses.iter().map(|c| c.name.clone()).collect(),
        preferences,
        demand: courses.into_iter().map(|c| (c.name, c.demand)).collect(),
        load: professors.into_iter().map(|p| (p.name, p.load)).collect(),
    })
}

/// Write the problem's input data to the simple JSON representation.
pub fn write_input_data<W: std::io::Write>(writer: W, problem: &Problem) -> Result<(), String> {
    let p = serde_json::to_value(&problem.professors).map_err(|e| format!("{}", e))?;
    let c = serde_json::to_value(&problem.courses).map_err(|e| format!("{}", e))?;
    let prefs =
        serde_json::to_value(problem.to_input_data().preferences).map_err(|e| format!("{}", e))?;
    let data = json!({
        "format": INPUT_FORMAT,
        "version": "1.0",
        "professors": p,
        "courses": c,
        "preferences": prefs,
    });
    serde_json::to_writer_pretty(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}

/// Write the solution as JSON to a Writer (e.g. an output file). Professors and courses are
/// referenced by name.
pub fn write<W: std::io::Write>(
    writer: W,
    solution: &Solution,
    problem: &Problem,
) -> Result<(), String> {
    let assignment: Vec<serde_json::Value> = solution
        .assignment
        .iter()
        .map(|(p, c)| {
            json!({
                "professor": problem.professors[*p].name,
                "course": problem.courses[*c].name,
                "preference": problem.cost(*p, *c),
            })
        })
        .collect();

    let data = json!({
        "format": RESULT_FORMAT,
        "version": "1.0",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, false),
        "status": solution.status,
        "engine": solution.engine,
        "total_cost": solution.total_cost,
        "assignment": assignment,
    });
    serde_json::to_writer_pretty(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}
