use clap::{command, value_parser, Arg, ArgAction};
use log::{debug, error, info};
use profassign::assign::{self, score, SolverOptions};
use profassign::engine::EngineKind;
use profassign::problem::{InputData, Problem};
use profassign::{io, Error, Status};
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() {
    env_logger::init();
    let args = parse_cli_args();

    // Read input data
    let input = if args.get_flag("demo") {
        info!("Using built-in demo data");
        io::demo::data()
    } else {
        let path = match args.get_one::<PathBuf>("INPUT") {
            Some(p) => p,
            None => {
                error!("No input file given");
                std::process::exit(exitcode::USAGE);
            }
        };
        let format = args.get_one::<String>("format").map(|s| s.as_str()).unwrap_or("auto");
        match read_input(path, format) {
            Ok(data) => data,
            Err((message, code)) => {
                error!("Could not read input data: {}", message);
                std::process::exit(code);
            }
        }
    };
    let problem = match Problem::new(input) {
        Ok(p) => p,
        Err(e) => {
            error!("{}", e);
            std::process::exit(exitcode::DATAERR);
        }
    };
    info!(
        "Read {} professors and {} courses",
        problem.professors.len(),
        problem.courses.len()
    );

    // Export input data, if requested
    if let Some(path) = args.get_one::<PathBuf>("export_csv") {
        if let Err(e) = io::csv::write_dir(path, &problem) {
            error!("Could not export CSV files: {}", e);
            std::process::exit(exitcode::CANTCREAT);
        }
        info!("Exported input data to {}", path.display());
    }
    if let Some(path) = args.get_one::<PathBuf>("export_json") {
        let result = std::fs::File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|file| io::simple::write_input_data(file, &problem));
        if let Err(e) = result {
            error!("Could not export JSON file: {}", e);
            std::process::exit(exitcode::CANTCREAT);
        }
        info!("Exported input data to {}", path.display());
    }

    // Solve
    let options = solver_options(&args);
    debug!(
        "Lower bound of the total cost: {}",
        score::course_lower_bound(&problem)
    );
    let solution = match assign::solve(&problem, &options) {
        Ok(s) => s,
        Err(e) => {
            error!("{}", e);
            std::process::exit(match e {
                Error::Configuration(_) | Error::Feasibility(_) => exitcode::DATAERR,
                Error::SolverFailure(Status::TimedOut) => exitcode::TEMPFAIL,
                Error::SolverFailure(_) | Error::Engine(_) => exitcode::SOFTWARE,
            });
        }
    };

    // Print and write result
    print!("{}", io::format_assignment(&solution, &problem));
    if let Some(path) = args.get_one::<PathBuf>("output") {
        let result = std::fs::File::create(path)
            .map_err(|e| e.to_string())
            .and_then(|file| io::simple::write(file, &solution, &problem));
        match result {
            Ok(_) => info!("Wrote result to {}", path.display()),
            Err(e) => {
                error!("Could not write result file: {}", e);
                std::process::exit(exitcode::CANTCREAT);
            }
        }
    }

    std::process::exit(match solution.ensure_optimal() {
        Ok(_) => exitcode::OK,
        Err(Error::SolverFailure(Status::TimedOut)) => exitcode::TEMPFAIL,
        Err(Error::SolverFailure(Status::Infeasible)) => exitcode::DATAERR,
        Err(_) => exitcode::SOFTWARE,
    });
}

fn parse_cli_args() -> clap::ArgMatches {
    command!()
        .about("Assign professors to courses by minimising the total preference cost.")
        .arg(
            Arg::new("INPUT")
                .help("Input file (JSON) or directory (CSV tables)")
                .value_parser(value_parser!(PathBuf))
                .required_unless_present("demo"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Input format. 'auto' reads directories as CSV tables, files as JSON.")
                .value_parser(["auto", "json", "csv"])
                .default_value("auto"),
        )
        .arg(
            Arg::new("demo")
                .long("demo")
                .help("Use the built-in demo data instead of an input file")
                .action(ArgAction::SetTrue)
                .conflicts_with("INPUT"),
        )
        .arg(
            Arg::new("engine")
                .short('e')
                .long("engine")
                .help("Solver engine to use")
                .value_parser(["flow", "simplex", "cbc"])
                .default_value("flow"),
        )
        .arg(
            Arg::new("timeout")
                .short('t')
                .long("timeout")
                .value_name("SECONDS")
                .help("Maximum run time of the solver engine")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("cbc_command")
                .long("cbc-command")
                .value_name("COMMAND")
                .help("Executable of the CBC solver")
                .default_value("cbc"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .value_name("N")
                .help("Number of threads for the CBC solver. Defaults to the number of CPUs.")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("FILE")
                .help("Write the result as JSON to this file")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("export_csv")
                .long("export-csv")
                .value_name("DIR")
                .help("Write the input data as CSV tables into this directory")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("export_json")
                .long("export-json")
                .value_name("FILE")
                .help("Write the input data as JSON to this file")
                .value_parser(value_parser!(PathBuf)),
        )
        .get_matches()
}

fn solver_options(args: &clap::ArgMatches) -> SolverOptions {
    let mut options = SolverOptions::default();
    if let Some(engine) = args.get_one::<String>("engine") {
        // Possible values are restricted by clap
        options.engine = engine.parse().unwrap_or(EngineKind::Flow);
    }
    options.timeout = args.get_one::<u64>("timeout").map(|s| Duration::from_secs(*s));
    if let Some(command) = args.get_one::<String>("cbc_command") {
        options.cbc_command = command.clone();
    }
    options.threads = args.get_one::<usize>("threads").copied();
    options
}

/// Read the input data from a JSON file or a directory of CSV tables. Returns an error message
/// and exit code on failure.
fn read_input(path: &Path, format: &str) -> Result<InputData, (String, exitcode::ExitCode)> {
    let use_csv = match format {
        "csv" => true,
        "json" => false,
        _ => path.is_dir(),
    };
    if use_csv {
        if !path.is_dir() {
            return Err((
                format!("{} is not a directory", path.display()),
                exitcode::NOINPUT,
            ));
        }
        io::csv::read_dir(path).map_err(|e| (e, exitcode::DATAERR))
    } else {
        let file = std::fs::File::open(path)
            .map_err(|e| (format!("{}: {}", path.display(), e), exitcode::NOINPUT))?;
        io::simple::read(std::io::BufReader::new(file)).map_err(|e| (e, exitcode::DATAERR))
    }
}
