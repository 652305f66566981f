//! The per-file conversion driver.
//!
//! This module handles:
//! - Skipping excluded files and directories
//! - In-place conversion with a pristine `.prehip` backup
//! - Printing diagnostics, per-file statistics and the run report

pub mod exclusion;
pub mod source;

pub use exclusion::{Exclusion, Exclusions, SkipNotice, is_excluded, is_walk_root};
pub use source::{FileOutcome, RUNTIME_INCLUDE, convert_source};

use crate::error::{HipifyError, Result};
use crate::rules::CompiledProgram;
use crate::stats::{RunStatistics, format_stats};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Appended to a file name to form its in-place backup.
pub const BACKUP_SUFFIX: &str = ".prehip";

/// Run-time switches.
#[derive(Debug, Clone, Default)]
pub struct Options {
	/// Overwrite inputs, keeping a pristine backup.
	pub inplace: bool,

	pub no_output: bool,
	pub print_stats: bool,

	/// Tally converted identifiers; implies `print_stats` and `no_output`.
	pub examine: bool,

	/// Count warnings without printing them.
	pub quiet_warnings: bool,

	pub exclusions: Exclusions,
}

impl Options {
	/// Apply the implications of `examine`.
	pub fn normalized(mut self) -> Self {
		if self.examine {
			self.print_stats = true;
			self.no_output = true;
		}
		self
	}
}

/// The backup path for `path`: `kernel.cu` becomes `kernel.cu.prehip`.
pub fn backup_path(path: &Path) -> PathBuf {
	let mut name = OsString::from(path.as_os_str());
	name.push(BACKUP_SUFFIX);
	PathBuf::from(name)
}

fn read_source(path: &Path) -> Result<Vec<u8>> {
	std::fs::read(path).map_err(|source| HipifyError::FileRead {
		path: path.to_path_buf(),
		source,
	})
}

/// Converts files one at a time, folding their statistics into run totals.
///
/// Any read or write failure aborts the remaining batch.
pub struct Converter<'a, O, E> {
	program: &'a CompiledProgram,
	options: &'a Options,
	out: O,
	err: E,
	stats: RunStatistics,
}

impl<'a, O: Write, E: Write> Converter<'a, O, E> {
	/// `out` receives converted text and statistics; `err` receives
	/// diagnostics and skip notices.
	pub fn new(program: &'a CompiledProgram, options: &'a Options, out: O, err: E) -> Self {
		Converter {
			program,
			options,
			out,
			err,
			stats: RunStatistics::default(),
		}
	}

	/// Convert every file, then print the run report if statistics were
	/// requested.
	pub fn run<P: AsRef<Path>>(&mut self, files: &[P]) -> Result<&RunStatistics> {
		for file in files {
			self.convert_file(file.as_ref())?;
		}

		if self.options.print_stats {
			self.stats
				.write_report(&mut self.out, self.options.examine)
				.map_err(|source| HipifyError::Output { source })?;
		}
		self.out
			.flush()
			.map_err(|source| HipifyError::Output { source })?;

		Ok(&self.stats)
	}

	fn convert_file(&mut self, path: &Path) -> Result<()> {
		if let Some(reason) = self.options.exclusions.check(path) {
			let notice = SkipNotice {
				file: path,
				reason: &reason,
			};
			writeln!(self.err, "{notice}").map_err(|source| HipifyError::Output { source })?;
			return Ok(());
		}

		let input = if self.options.inplace {
			let backup = backup_path(path);
			if !backup.exists() {
				std::fs::copy(path, &backup).map_err(|source| HipifyError::BackupFailed {
					path: path.to_path_buf(),
					backup: backup.clone(),
					source,
				})?;
				tracing::debug!(backup = %backup.display(), "created backup");
			}
			backup
		} else {
			path.to_path_buf()
		};

		tracing::debug!(file = %path.display(), input = %input.display(), "converting");
		let text = read_source(&input)?;
		let name = path.display().to_string();
		let outcome = convert_source(self.program, self.options, &name, &text);

		if !self.options.quiet_warnings {
			for diagnostic in &outcome.diagnostics {
				writeln!(self.err, "{}", diagnostic.in_file(&name))
					.map_err(|source| HipifyError::Output { source })?;
			}
		}

		if let Some(output) = &outcome.output {
			if self.options.inplace {
				std::fs::write(path, output).map_err(|source| HipifyError::FileWrite {
					path: path.to_path_buf(),
					source,
				})?;
			} else {
				self.out
					.write_all(output)
					.map_err(|source| HipifyError::Output { source })?;
			}
		}

		let file_stats = &outcome.stats;
		if self.options.print_stats && file_stats.is_noteworthy() {
			let summary = format_stats(
				"converted",
				&file_stats.counts,
				file_stats.warnings,
				file_stats.line_count,
			);
			writeln!(self.out, "{summary} in '{name}'")
				.map_err(|source| HipifyError::Output { source })?;
		}

		self.stats.fold(file_stats);
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapping::{Counter, default_mapping_table};
	use crate::rules::RuleProgram;
	use std::fs;

	fn program() -> CompiledProgram {
		let table = default_mapping_table().unwrap();
		CompiledProgram::compile(&RuleProgram::from_table(&table)).unwrap()
	}

	fn run(options: &Options, files: &[PathBuf]) -> (RunStatistics, String, String) {
		let program = program();
		let mut out = Vec::new();
		let mut err = Vec::new();
		let stats = Converter::new(&program, options, &mut out, &mut err)
			.run(files)
			.unwrap()
			.clone();
		(
			stats,
			String::from_utf8(out).unwrap(),
			String::from_utf8(err).unwrap(),
		)
	}

	#[test]
	fn test_backup_path() {
		assert_eq!(
			backup_path(Path::new("src/kernel.cu")),
			PathBuf::from("src/kernel.cu.prehip")
		);
	}

	#[test]
	fn test_examine_implies_stats_and_no_output() {
		let options = Options {
			examine: true,
			..Default::default()
		}
		.normalized();
		assert!(options.print_stats);
		assert!(options.no_output);
	}

	#[test]
	fn test_two_file_totals() {
		let dir = tempfile::tempdir().unwrap();
		let plain = dir.path().join("plain.cpp");
		let cuda = dir.path().join("saxpy.cu");
		fs::write(&plain, "int main() { return 0; }\n").unwrap();
		fs::write(
			&cuda,
			"void f(float *p) {\n\tcudaMalloc(&p, 4);\n\tcudaFree(p);\n\tsaxpy<<<1, 1>>>(p);\n}\n",
		)
		.unwrap();

		let options = Options {
			print_stats: true,
			no_output: true,
			..Default::default()
		};
		let (stats, out, _) = run(&options, &[plain, cuda.clone()]);

		assert_eq!(stats.files, 2);
		assert_eq!(stats.counts.total(), 3);
		assert_eq!(
			stats.counts.ranked(),
			vec![(Counter::Memory, 2), (Counter::KernelLaunch, 1)]
		);
		assert_eq!(stats.kernels.get("saxpy"), 1);
		assert!(out.contains(&format!(
			"  info: converted 3 CUDA->HIP refs ( memory:2 kernel_launch:1 )\n  warning:0 LOC:5 in '{}'",
			cuda.display()
		)));
		assert!(!out.contains("plain.cpp"));
		assert!(out.contains("  info: TOTAL-converted 3 CUDA->HIP refs ( memory:2 kernel_launch:1 )"));
		assert!(out.contains("  kernels (1 total) :   saxpy(1)"));
	}

	#[test]
	fn test_inplace_converts_from_backup() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("k.cu");
		let original = "cudaFree(p);\n";
		fs::write(&file, original).unwrap();

		let options = Options {
			inplace: true,
			..Default::default()
		};
		let (_, out, _) = run(&options, std::slice::from_ref(&file));
		assert!(out.is_empty());
		assert_eq!(fs::read_to_string(&file).unwrap(), "hipFree(p);\n");
		assert_eq!(fs::read_to_string(backup_path(&file)).unwrap(), original);

		let (stats, _, _) = run(&options, std::slice::from_ref(&file));
		assert_eq!(stats.counts.total(), 1);
		assert_eq!(fs::read_to_string(&file).unwrap(), "hipFree(p);\n");
	}

	#[test]
	fn test_excluded_file_is_never_opened() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("vendor").join("missing.cu");

		let options = Options {
			exclusions: Exclusions::new([dir.path().join("vendor")], Vec::<PathBuf>::new()),
			..Default::default()
		};
		let (stats, out, err) = run(&options, std::slice::from_ref(&missing));
		assert_eq!(stats.files, 0);
		assert!(out.is_empty());
		assert!(err.contains("Skipping file:"));
	}

	#[test]
	fn test_latin1_file_does_not_stop_the_batch() {
		let dir = tempfile::tempdir().unwrap();
		let latin1 = dir.path().join("a.cu");
		let plain = dir.path().join("b.cu");
		fs::write(&latin1, b"// Copyright \xA9 1999 M\xFCller\ncudaFree(p);\n").unwrap();
		fs::write(&plain, "cudaFree(q);\n").unwrap();

		let program = program();
		let options = Options::default();
		let mut out = Vec::new();
		let stats = Converter::new(&program, &options, &mut out, Vec::new())
			.run(&[latin1, plain])
			.unwrap()
			.clone();

		assert_eq!(stats.files, 2);
		assert_eq!(stats.counts.get(Counter::Memory), 2);
		assert_eq!(
			out,
			b"// Copyright \xA9 1999 M\xFCller\nhipFree(p);\nhipFree(q);\n"
		);
	}

	#[test]
	fn test_missing_file_is_fatal() {
		let dir = tempfile::tempdir().unwrap();
		let program = program();
		let options = Options::default();
		let mut converter = Converter::new(&program, &options, Vec::new(), Vec::new());
		let result = converter.run(&[dir.path().join("nope.cu")]);
		assert!(matches!(result, Err(HipifyError::FileRead { .. })));
	}

	#[test]
	fn test_quiet_warnings_still_counts() {
		let dir = tempfile::tempdir().unwrap();
		let file = dir.path().join("w.cu");
		fs::write(&file, "cudaBrandNewApi(x);\n").unwrap();

		let options = Options {
			quiet_warnings: true,
			no_output: true,
			..Default::default()
		};
		let (stats, _, err) = run(&options, std::slice::from_ref(&file));
		assert_eq!(stats.warnings, 1);
		assert!(err.is_empty());

		let options = Options {
			no_output: true,
			..Default::default()
		};
		let (_, _, err) = run(&options, std::slice::from_ref(&file));
		assert!(err.contains(":#1 : cudaBrandNewApi(x);"));
	}
}
