use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use hipify_cli::config::{MergedConfig, load_merged_config};
use hipify_cli::convert::{Converter, Exclusions, Options};
use hipify_cli::mapping::{MappingTable, default_mapping_table, parse_mapping_file};
use hipify_cli::rules::{CompiledProgram, RuleProgram, emit_program, load_program};

#[derive(Parser)]
#[command(name = "hipify")]
#[command(
	author,
	version,
	about = "Convert CUDA sources to HIP with rules compiled from a mapping table"
)]
#[command(arg_required_else_help = true)]
struct Cli {
	/// Print statistics and converted identifiers without writing output
	#[arg(long)]
	examine: bool,

	/// Rewrite files in place, keeping the original as <file>.prehip
	#[arg(long)]
	inplace: bool,

	/// Do not write converted output
	#[arg(long)]
	no_output: bool,

	/// Print per-file and run-wide statistics
	#[arg(long)]
	print_stats: bool,

	/// Count per-line warnings without printing them
	#[arg(long)]
	quiet_warnings: bool,

	/// Extra identifiers exempt from unconverted-identifier warnings
	#[arg(long, value_name = "NAMES", value_delimiter = ',')]
	whitelist: Vec<String>,

	/// Directories whose files are skipped
	#[arg(long, value_name = "DIRS", value_delimiter = ',')]
	exclude_dirs: Vec<PathBuf>,

	/// Files that are skipped
	#[arg(long, value_name = "FILES", value_delimiter = ',')]
	exclude_files: Vec<PathBuf>,

	/// Mapping table to compile instead of the built-in one
	#[arg(long, value_name = "FILE", conflicts_with = "program")]
	mappings: Option<PathBuf>,

	/// Run a rule program written by --emit-program
	#[arg(long, value_name = "FILE")]
	program: Option<PathBuf>,

	/// Write the compiled rule program into DIR and exit
	#[arg(long, value_name = "DIR", conflicts_with = "program")]
	emit_program: Option<PathBuf>,

	/// Files to convert
	#[arg(value_name = "FILE", required_unless_present = "emit_program")]
	files: Vec<PathBuf>,
}

fn main() -> ExitCode {
	hipify_cli::init_tracing();

	match run() {
		Ok(code) => code,
		Err(e) => {
			eprintln!("error: {e:?}");
			ExitCode::FAILURE
		}
	}
}

fn run() -> Result<ExitCode> {
	let cli = Cli::parse();

	let cwd = std::env::current_dir().context("Failed to get current directory")?;
	let config = load_merged_config(&cwd).context("Failed to load configuration")?;
	tracing::debug!(sources = ?config.sources, "merged configuration");

	// Handle --emit-program
	if let Some(ref dir) = cli.emit_program {
		let table = load_table(cli.mappings.as_deref(), &config)?;
		return handle_emit(&table, dir);
	}

	let program = match cli.program {
		Some(ref path) => load_program(path)
			.with_context(|| format!("Failed to load rule program {}", path.display()))?,
		None => RuleProgram::from_table(&load_table(cli.mappings.as_deref(), &config)?),
	};

	let mut compiled = CompiledProgram::compile(&program).context("Failed to compile rules")?;
	compiled
		.extend_whitelist(config.whitelist.iter().chain(&cli.whitelist).cloned())
		.context("Invalid whitelist")?;

	let options = Options {
		inplace: cli.inplace,
		no_output: cli.no_output,
		print_stats: cli.print_stats,
		examine: cli.examine,
		quiet_warnings: cli.quiet_warnings,
		exclusions: Exclusions::new(
			config.exclude_dirs.iter().chain(&cli.exclude_dirs).cloned(),
			config.exclude_files.iter().chain(&cli.exclude_files).cloned(),
		)
		.with_base(cwd),
	}
	.normalized();

	let stdout = std::io::stdout().lock();
	let stderr = std::io::stderr().lock();
	let mut converter = Converter::new(&compiled, &options, stdout, stderr);
	converter.run(&cli.files)?;

	Ok(ExitCode::SUCCESS)
}

/// The mapping table named on the command line, else by config, else the
/// built-in one.
fn load_table(cli_mappings: Option<&Path>, config: &MergedConfig) -> Result<MappingTable> {
	match cli_mappings.or(config.mappings.as_deref()) {
		Some(path) => parse_mapping_file(path)
			.with_context(|| format!("Failed to load mapping table {}", path.display())),
		None => default_mapping_table().context("Built-in mapping table is invalid"),
	}
}

fn handle_emit(table: &MappingTable, dir: &Path) -> Result<ExitCode> {
	let program = RuleProgram::from_table(table);
	let path = emit_program(&program, dir)
		.with_context(|| format!("Failed to emit rule program into {}", dir.display()))?;

	println!("Wrote {}", path.display());
	Ok(ExitCode::SUCCESS)
}
