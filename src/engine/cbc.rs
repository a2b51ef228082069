//! Engine calling an external CBC executable.
//!
//! The problem is written to a temporary file in the .lp format, CBC is invoked on it and the
//! solution file written by CBC is parsed afterwards. Variables are named `x_<p>_<c>` after the
//! professor and course indexes, so no escaping of user supplied names is required.

use super::{Engine, EngineResult, Limits};
use crate::problem::Problem;
use crate::{Cost, Status};
use log::{debug, info};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::io::Write as _;
use std::process::Command;

/// Maximum number of objective terms per line in the .lp file
const TERMS_PER_LINE: usize = 8;

#[derive(Clone, Debug)]
pub struct CbcEngine {
    command_name: String,
    threads: Option<usize>,
}

impl Default for CbcEngine {
    fn default() -> Self {
        Self::new("cbc".to_owned())
    }
}

impl CbcEngine {
    pub fn new(command_name: String) -> CbcEngine {
        CbcEngine {
            command_name,
            threads: None,
        }
    }

    pub fn with_threads(&self, threads: usize) -> CbcEngine {
        CbcEngine {
            threads: Some(threads),
            ..(*self).clone()
        }
    }

    fn arguments(
        &self,
        lp_file: &std::path::Path,
        solution_file: &std::path::Path,
        limits: &Limits,
    ) -> Vec<std::ffi::OsString> {
        let mut args = vec![lp_file.as_os_str().to_owned()];
        if let Some(timeout) = limits.timeout {
            args.push("sec".into());
            // CBC only accepts whole seconds
            args.push(timeout.as_secs().max(1).to_string().into());
        }
        if let Some(threads) = self.threads {
            args.push("threads".into());
            args.push(threads.to_string().into());
        }
        args.extend_from_slice(&["solve".into(), "solution".into(), solution_file.into()]);
        args
    }
}

fn variable_name(professor: usize, course: usize) -> String {
    format!("x_{}_{}", professor, course)
}

/// Format the problem in the .lp file format
pub fn lp_format(problem: &Problem) -> String {
    let pairs: Vec<(usize, usize, u32)> = problem
        .costs
        .indexed_iter()
        .filter_map(|((p, c), cost)| cost.value().map(|v| (p, c, v)))
        .collect();

    let mut result = String::new();
    write_lp(&mut result, problem, &pairs).unwrap();
    result
}

fn write_lp(
    f: &mut String,
    problem: &Problem,
    pairs: &[(usize, usize, u32)],
) -> std::fmt::Result {
    write!(f, "\\ professor_assignment\n\nMinimize\n  obj:")?;
    if pairs.is_empty() {
        write!(f, " 0")?;
    }
    for (i, (p, c, cost)) in pairs.iter().enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            write!(f, "\n   ")?;
        }
        if i > 0 {
            write!(f, " +")?;
        }
        write!(f, " {} {}", cost, variable_name(*p, *c))?;
    }

    write!(f, "\n\nSubject To\n")?;
    for course in problem.courses.iter() {
        let terms: Vec<String> = pairs
            .iter()
            .filter(|(_, c, _)| *c == course.index)
            .map(|(p, c, _)| variable_name(*p, *c))
            .collect();
        write_constraint(f, &format!("demand_{}", course.index), &terms, course.demand)?;
    }
    for professor in problem.professors.iter() {
        let terms: Vec<String> = pairs
            .iter()
            .filter(|(p, _, _)| *p == professor.index)
            .map(|(p, c, _)| variable_name(*p, *c))
            .collect();
        write_constraint(f, &format!("load_{}", professor.index), &terms, professor.load)?;
    }

    if !pairs.is_empty() {
        writeln!(f, "\nBinaries")?;
        for (p, c, _) in pairs.iter() {
            writeln!(f, "  {}", variable_name(*p, *c))?;
        }
    }
    writeln!(f, "\nEnd")
}

fn write_constraint(
    f: &mut String,
    name: &str,
    terms: &[String],
    rhs: u32,
) -> std::fmt::Result {
    // An empty row can't be expressed. It's trivially satisfied for rhs == 0 and the engine
    // reports infeasibility for other values before invoking CBC.
    if terms.is_empty() {
        return Ok(());
    }
    write!(f, "  {}:", name)?;
    for (i, term) in terms.iter().enumerate() {
        if i > 0 && i % TERMS_PER_LINE == 0 {
            write!(f, "\n   ")?;
        }
        if i > 0 {
            write!(f, " +")?;
        }
        write!(f, " {}", term)?;
    }
    writeln!(f, " = {}", rhs)
}

/// Parse the contents of a CBC solution file. `variables` maps each variable name to its
/// (professor, course) pair.
pub fn parse_solution(
    content: &str,
    variables: &HashMap<String, (usize, usize)>,
) -> Result<EngineResult, String> {
    let mut lines = content.lines();
    let header = lines.next().ok_or("Empty CBC solution file")?;
    let words: Vec<&str> = header.split_whitespace().take(3).collect();
    let status = match words.as_slice() {
        ["Optimal", ..] => Status::Optimal,
        ["Infeasible", ..] | ["Integer", "infeasible", ..] => Status::Infeasible,
        ["Unbounded", ..] => Status::Unbounded,
        ["Stopped", "on", "time"] => Status::TimedOut,
        // "Stopped on iterations", "Stopped on difficulties", "Stopped on ctrl-c", ...
        _ => return Err(format!("Unexpected CBC solution status '{}'", header)),
    };
    if status != Status::Optimal {
        return Ok(EngineResult::without_assignment(status));
    }

    let mut assignment = Vec::new();
    for line in lines {
        let mut fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields[0] == "**" {
            fields.remove(0);
        }
        if fields.len() != 4 {
            return Err(format!("Incorrect CBC solution line '{}'", line));
        }
        let value: f64 = fields[2]
            .parse()
            .map_err(|e: std::num::ParseFloatError| e.to_string())?;
        let pair = variables
            .get(fields[1])
            .ok_or_else(|| format!("Unknown variable '{}' in CBC solution", fields[1]))?;
        if value > 0.5 {
            assignment.push(*pair);
        }
    }
    assignment.sort_unstable();
    Ok(EngineResult { status, assignment })
}

impl Engine for CbcEngine {
    fn name(&self) -> &str {
        "cbc"
    }

    fn solve(&self, problem: &Problem, limits: &Limits) -> Result<EngineResult, String> {
        // Rows without any allowed pair can't be written, so check them here
        for course in problem.courses.iter() {
            let allowed = (0..problem.professors.len())
                .filter(|p| !problem.cost(*p, course.index).is_forbidden())
                .count();
            if allowed == 0 && course.demand > 0 {
                return Ok(EngineResult::without_assignment(Status::Infeasible));
            }
        }
        for professor in problem.professors.iter() {
            let allowed = problem
                .costs
                .row(professor.index)
                .iter()
                .filter(|c| !c.is_forbidden())
                .count();
            if allowed == 0 && professor.load > 0 {
                return Ok(EngineResult::without_assignment(Status::Infeasible));
            }
        }

        let variables: HashMap<String, (usize, usize)> = problem
            .costs
            .indexed_iter()
            .filter(|(_, cost)| matches!(cost, Cost::Preference(_)))
            .map(|((p, c), _)| (variable_name(p, c), (p, c)))
            .collect();

        let mut lp_file = tempfile::Builder::new()
            .prefix("professor_assignment")
            .suffix(".lp")
            .tempfile()
            .map_err(|e| format!("Could not create temporary file: {}", e))?;
        lp_file
            .write_all(lp_format(problem).as_bytes())
            .and_then(|_| lp_file.flush())
            .map_err(|e| format!("Could not write .lp file: {}", e))?;
        let solution_file = tempfile::Builder::new()
            .prefix("professor_assignment")
            .suffix(".sol")
            .tempfile()
            .map_err(|e| format!("Could not create temporary file: {}", e))?;

        let args = self.arguments(lp_file.path(), solution_file.path(), limits);
        debug!("Running {} {:?}", self.command_name, args);
        let output = Command::new(&self.command_name)
            .args(&args)
            .output()
            .map_err(|e| format!("Error running {}: {}", self.command_name, e))?;
        if !output.status.success() {
            return Err(format!(
                "{} exited with {}: {}",
                self.command_name,
                output.status,
                String::from_utf8_lossy(&output.stderr)
            ));
        }
        info!("{} finished", self.command_name);

        let content = std::fs::read_to_string(solution_file.path())
            .map_err(|e| format!("Could not read CBC solution file: {}", e))?;
        parse_solution(&content, &variables)
    }
}

#[cfg(test)]
mod test {
    use super::{lp_format, parse_solution, CbcEngine};
    use crate::engine::Limits;
    use crate::problem::Problem;
    use crate::{Cost, Course, Professor, Status};
    use std::collections::HashMap;
    use std::path::Path;
    use std::time::Duration;

    fn small_problem() -> Problem {
        let professors = vec![
            Professor {
                index: 0,
                name: String::from("P1"),
                load: 2,
            },
            Professor {
                index: 1,
                name: String::from("P2"),
                load: 1,
            },
        ];
        let courses = vec![
            Course {
                index: 0,
                name: String::from("C1"),
                demand: 2,
            },
            Course {
                index: 1,
                name: String::from("C2"),
                demand: 1,
            },
        ];
        let costs = ndarray::arr2(&[
            [Cost::Preference(1), Cost::Preference(4)],
            [Cost::Preference(2), Cost::Forbidden],
        ]);
        Problem::from_parts(professors, courses, costs).unwrap()
    }

    #[test]
    fn write_lp_file() {
        let lp = lp_format(&small_problem());
        assert_eq!(
            lp,
            "\\ professor_assignment\n\n\
             Minimize\n  obj: 1 x_0_0 + 4 x_0_1 + 2 x_1_0\n\n\
             Subject To\n\
             \x20 demand_0: x_0_0 + x_1_0 = 2\n\
             \x20 demand_1: x_0_1 = 1\n\
             \x20 load_0: x_0_0 + x_0_1 = 2\n\
             \x20 load_1: x_1_0 = 1\n\
             \nBinaries\n  x_0_0\n  x_0_1\n  x_1_0\n\nEnd\n"
        );
    }

    #[test]
    fn parse_cbc_solution() {
        let variables: HashMap<String, (usize, usize)> = vec![
            ("x_0_0".to_owned(), (0, 0)),
            ("x_0_1".to_owned(), (0, 1)),
            ("x_1_0".to_owned(), (1, 0)),
        ]
        .into_iter()
        .collect();

        let content = "Optimal - objective value 7.00000000\n\
                       \x20     0 x_0_0                  1                       1\n\
                       \x20     1 x_0_1                  1                       4\n\
                       \x20     2 x_1_0                  1                       2\n";
        let result = parse_solution(content, &variables).unwrap();
        assert_eq!(result.status, Status::Optimal);
        assert_eq!(result.assignment, vec![(0, 0), (0, 1), (1, 0)]);

        let result = parse_solution("Stopped on time - objective value 9\n", &variables).unwrap();
        assert_eq!(result.status, Status::TimedOut);
        assert!(result.assignment.is_empty());

        let result = parse_solution("Integer infeasible - objective value 0\n", &variables).unwrap();
        assert_eq!(result.status, Status::Infeasible);

        // Only the time limit counts as timeout, other interruptions are failures
        for header in [
            "Stopped on iterations - objective value 9\n",
            "Stopped on difficulties - objective value 9\n",
            "Stopped on ctrl-c - objective value 9\n",
        ] {
            assert!(parse_solution(header, &variables).is_err());
        }

        assert!(parse_solution("Optimal\n  0 y 1 0\n", &variables).is_err());
        assert!(parse_solution("", &variables).is_err());
    }

    #[test]
    fn command_line_arguments() {
        let engine = CbcEngine::default().with_threads(4);
        let args = engine.arguments(
            Path::new("model.lp"),
            Path::new("model.sol"),
            &Limits {
                timeout: Some(Duration::from_millis(2500)),
            },
        );
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            args,
            vec!["model.lp", "sec", "2", "threads", "4", "solve", "solution", "model.sol"]
        );
    }
}
