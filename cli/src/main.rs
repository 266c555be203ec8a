mod error;
use error::*;
use std::{collections::VecDeque, env::Args, fs::{read, write}, io::{self, BufRead, ErrorKind, Write}};
use colored::{ColoredString, Colorize};
use log::{Level, LevelFilter, Metadata, Record};
use intcode::{
	error::runtime::{InputError, RuntimeError},
	fileio,
	runtime::{io as vm_io, Input},
	Config, Growth, Interpreter, Pipeline, Program, Topology, Value,
};

const USAGE: &str = "usage:
  cli run <file> [--input a,b,..] [--capacity N] [--grow] [--verbose]
  cli build <file>
  cli amplify <file> --phases a,b,.. [--feedback] [--search] [--capacity N] [--grow] [--verbose]";

#[derive(Debug, Default)]
struct Options {
	file: String,
	inputs: Option<Vec<Value>>,
	phases: Option<Vec<Value>>,
	capacity: Option<usize>,
	grow: bool,
	verbose: bool,
	feedback: bool,
	search: bool,
}

fn main() {
	if let Err(e) = cli() {
		eprintln!("{} {}", "error:".red().bold(), e);
		if e == CLIError::InsufficientArguments {
			eprintln!("{}", USAGE);
		}
		std::process::exit(1);
	}
}

fn cli() -> CLIResult {
	let mut args = std::env::args();
	args.next(); // Ignore program name
	let command = args.next().ok_or(CLIError::InsufficientArguments)?;
	let options = parse_options(args)?;
	init_logger(options.verbose);
	match command.as_str() {
		"run" => run(&options),
		"build" => build(&options),
		"amplify" => amplify(&options),
		_ => Err(CLIError::UnknownArgument(command)),
	}
}

/// Coloured stderr logger for the library's `log` records.
struct Logger;

static LOGGER: Logger = Logger;

impl log::Log for Logger {
	fn enabled(&self, metadata: &Metadata) -> bool {
		metadata.level() <= log::max_level()
	}

	fn log(&self, record: &Record) {
		if !self.enabled(record.metadata()) {
			return;
		}
		let thread = std::thread::current();
		match thread.name() {
			Some(name) if name != "main" => eprintln!("{} {}: {}", tag(record.level()), name, record.args()),
			_ => eprintln!("{} {}", tag(record.level()), record.args()),
		}
	}

	fn flush(&self) {}
}

fn tag(level: Level) -> ColoredString {
	let tag = format!("[{:5}]", level);
	match level {
		Level::Error => tag.red().bold(),
		Level::Warn => tag.yellow().bold(),
		Level::Info => tag.normal(),
		Level::Debug | Level::Trace => tag.dimmed(),
	}
}

fn init_logger(verbose: bool) {
	if log::set_logger(&LOGGER).is_ok() {
		log::set_max_level(if verbose { LevelFilter::Debug } else { LevelFilter::Warn });
	}
}

fn parse_options(mut args: Args) -> CLIResult<Options> {
	let mut options = Options::default();
	let mut file = None;
	while let Some(arg) = args.next() {
		match arg.as_str() {
			"--input" => options.inputs = Some(words(args.next().ok_or(CLIError::MissingValue("--input"))?)?),
			"--phases" => options.phases = Some(words(args.next().ok_or(CLIError::MissingValue("--phases"))?)?),
			"--capacity" => {
				let value = args.next().ok_or(CLIError::MissingValue("--capacity"))?;
				let capacity = value.parse().map_err(|_| CLIError::InvalidValue("--capacity", value))?;
				options.capacity = Some(capacity);
			}
			"--grow" => options.grow = true,
			"--feedback" => options.feedback = true,
			"--search" => options.search = true,
			"--verbose" => options.verbose = true,
			_ if arg.starts_with("--") => return Err(CLIError::UnknownArgument(arg)),
			_ if file.is_none() => file = Some(arg),
			_ => return Err(CLIError::UnknownArgument(arg)),
		}
	}
	options.file = file.ok_or(CLIError::InsufficientArguments)?;
	Ok(options)
}

/// A comma separated list of words, parsed the same way as program text.
fn words(list: String) -> CLIResult<Vec<Value>> {
	let program: Program = list.parse::<Program>().map_err(external!("ProgramError"))?;
	Ok(program.into_words())
}

fn config(options: &Options) -> Config {
	let mut config = Config::default();
	if let Some(capacity) = options.capacity {
		config = config.with_capacity(capacity);
	}
	if options.grow {
		config = config.with_growth(Growth::OnDemand);
	}
	config
}

fn read_file(file: &str) -> CLIResult<Vec<u8>> {
	read(file).map_err(|e| match e.kind() {
		ErrorKind::NotFound => CLIError::NotFound(file.to_string()),
		_ => CLIError::ExternalError("io::Error".into(), e.to_string()),
	})
}

/// Load program text or a built image.
fn load(file: &str) -> CLIResult<Program> {
	let bytes = read_file(file)?;
	if fileio::is_image(&bytes) {
		return fileio::de(&bytes).map_err(external!("FileIOError"));
	}
	let text = String::from_utf8(bytes).map_err(external!("Utf8Error"))?;
	text.parse::<Program>().map_err(external!("ProgramError"))
}

fn run(options: &Options) -> CLIResult {
	let program = load(&options.file)?;
	let mut interpreter = Interpreter::with_config(&program, &config(options)).map_err(external!("MemoryError"))?;
	let mut output = vm_io::sink(|value| println!("{}", value));
	let mut input: Box<dyn Input> = match &options.inputs {
		Some(inputs) => Box::new(VecDeque::from(inputs.clone())),
		None => Box::new(vm_io::source(prompt)),
	};
	interpreter.run(&mut output, &mut *input).map_err(external!("RuntimeError"))?;
	Ok(())
}

/// Ask for one integer on stdin.
fn prompt() -> Result<Value, RuntimeError> {
	let stdin = io::stdin();
	loop {
		eprint!("{} ", ">".dimmed());
		io::stderr().flush().map_err(|e| InputError::External(e.to_string()))?;
		let mut line = String::new();
		let read = stdin.lock().read_line(&mut line).map_err(|e| InputError::External(e.to_string()))?;
		if read == 0 {
			return Err(InputError::External("stdin closed".into()).into());
		}
		match line.trim().parse() {
			Ok(value) => return Ok(value),
			Err(_) => eprintln!("{} {:?} is not an integer", "warning:".yellow().bold(), line.trim()),
		}
	}
}

fn build(options: &Options) -> CLIResult {
	let text = String::from_utf8(read_file(&options.file)?).map_err(external!("Utf8Error"))?;
	let program: Program = text.parse::<Program>().map_err(external!("ProgramError"))?;
	let image = fileio::ser(&program).map_err(external!("FileIOError"))?;
	let (save_as, _) = options.file.rsplit_once(".").unwrap_or((options.file.as_str(), ""));
	let save_as = format!("{}.icb", save_as);
	write(&save_as, image).map_err(external!("io::Error"))?;
	eprintln!("{} {} ({} words)", "wrote".green().bold(), save_as, program.len());
	Ok(())
}

fn amplify(options: &Options) -> CLIResult {
	let program = load(&options.file)?;
	let phases = options.phases.clone().ok_or(CLIError::MissingValue("--phases"))?;
	let topology = if options.feedback { Topology::Feedback } else { Topology::FeedForward };
	let config = config(options);
	if options.search {
		let (best, signal) = intcode::max_signal(&program, &phases, topology, &config)
			.map_err(external!("PipelineError"))?;
		let order: Vec<String> = best.iter().map(Value::to_string).collect();
		println!("{} (phases {})", signal, order.join(","));
	} else {
		let signal = Pipeline::with_config(phases.len(), &program, &phases, topology, &config)
			.and_then(Pipeline::run)
			.map_err(external!("PipelineError"))?;
		println!("{}", signal);
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tags_are_padded() {
		assert_eq!(&*tag(Level::Warn), "[WARN ]");
		assert_eq!(&*tag(Level::Error), "[ERROR]");
		assert_eq!(&*tag(Level::Debug), "[DEBUG]");
	}

	#[test]
	fn word_lists() {
		assert_eq!(words("9,8,7".into()), Ok(vec![9, 8, 7]));
		assert!(matches!(words("9,,7".into()), Err(CLIError::ExternalError(_, _))));
	}
}
