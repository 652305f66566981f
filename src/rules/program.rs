use crate::error::{HipifyError, Result};
use crate::mapping::{Counter, MappingTable};
use crate::rules::diagnostics::{DiagnosticLists, emit_diagnostic_lists};
use crate::rules::host::emit_host_function_rules;
use crate::rules::launch::emit_kernel_launch_rules;
use crate::rules::substitution::{
	emit_extern_shared_rules, emit_namespace_rules, emit_substitution_rules,
};
use crate::rules::whitelist::builtin_whitelist;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// File name of an emitted rule program.
pub const PROGRAM_FILE_NAME: &str = "hipify-rules.toml";

const PROGRAM_HEADER: &str = "\
# Generated by `hipify --emit-program`. Do not edit manually: regenerate it
# from the mapping table instead.
";

/// A capture group that, when it already starts with `prefix`, means the
/// match was rewritten before.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrappedArg {
	pub group: usize,
	pub prefix: String,
}

/// One find/replace rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RewriteRule {
	/// Sed-style expression: `s/pattern/replacement/g`.
	pub expr: String,

	/// Counter incremented by the number of rewrites.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub counter: Option<Counter>,

	/// Matches immediately preceded by this text are left untouched.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub skip_after: Option<String>,

	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub skip_wrapped: Option<WrappedArg>,
}

impl RewriteRule {
	pub fn counted(expr: String, counter: Counter) -> Self {
		RewriteRule {
			expr,
			counter: Some(counter),
			skip_after: None,
			skip_wrapped: None,
		}
	}

	pub fn uncounted(expr: String) -> Self {
		RewriteRule {
			expr,
			counter: None,
			skip_after: None,
			skip_wrapped: None,
		}
	}
}

/// Every rule generated from a mapping table, in application order.
///
/// This is the standalone artifact: it can be written to disk with
/// [`emit_program`] and run later without the mapping table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RuleProgram {
	/// Identifiers exempt from unconverted-identifier diagnostics.
	#[serde(default)]
	pub whitelist: Vec<String>,

	#[serde(default, rename = "substitution")]
	pub substitutions: Vec<RewriteRule>,

	#[serde(default)]
	pub extern_shared: Vec<RewriteRule>,

	#[serde(default)]
	pub kernel_launch: Vec<RewriteRule>,

	#[serde(default)]
	pub namespace: Vec<RewriteRule>,

	#[serde(default, rename = "host-function")]
	pub host_functions: Vec<RewriteRule>,

	#[serde(default)]
	pub diagnostics: DiagnosticLists,
}

impl RuleProgram {
	/// Run every emitter over the table.
	pub fn from_table(table: &MappingTable) -> Self {
		let program = RuleProgram {
			whitelist: builtin_whitelist(),
			substitutions: emit_substitution_rules(table),
			extern_shared: emit_extern_shared_rules(),
			kernel_launch: emit_kernel_launch_rules(),
			namespace: emit_namespace_rules(),
			host_functions: emit_host_function_rules(table),
			diagnostics: emit_diagnostic_lists(table),
		};

		tracing::debug!(
			substitutions = program.substitutions.len(),
			kernel_launch = program.kernel_launch.len(),
			host_functions = program.host_functions.len(),
			deprecated = program.diagnostics.deprecated.len(),
			unsupported = program.diagnostics.unsupported.len(),
			"generated rule program"
		);

		program
	}

	/// Serialize to the TOML artifact format.
	pub fn to_toml(&self) -> Result<String> {
		let body =
			toml::to_string(self).map_err(|source| HipifyError::ProgramSerialize { source })?;
		Ok(format!("{PROGRAM_HEADER}\n{body}"))
	}

	/// Parse a previously emitted program.
	pub fn from_toml(content: &str, path: &Path) -> Result<Self> {
		toml::from_str(content).map_err(|source| HipifyError::ProgramParse {
			path: path.to_path_buf(),
			source,
		})
	}
}

/// Write `program` into `dir` as [`PROGRAM_FILE_NAME`].
///
/// The program is written to a temporary file in `dir` and renamed into
/// place, so a failure never leaves a partial artifact installed.
pub fn emit_program(program: &RuleProgram, dir: &Path) -> Result<PathBuf> {
	let dir = dir.canonicalize().map_err(|source| HipifyError::OutputDir {
		path: dir.to_path_buf(),
		source,
	})?;
	if !dir.is_dir() {
		return Err(HipifyError::OutputDir {
			path: dir,
			source: std::io::Error::other("not a directory"),
		});
	}

	let content = program.to_toml()?;
	let dest = dir.join(PROGRAM_FILE_NAME);
	let write_error = |source| HipifyError::ProgramWrite {
		path: dest.clone(),
		source,
	};

	let mut tmp = tempfile::Builder::new()
		.prefix(".hipify-rules")
		.suffix(".tmp")
		.tempfile_in(&dir)
		.map_err(write_error)?;
	tmp.write_all(content.as_bytes()).map_err(write_error)?;
	tmp.flush().map_err(write_error)?;
	tmp.persist(&dest).map_err(|e| write_error(e.error))?;

	tracing::debug!(path = %dest.display(), "installed rule program");
	Ok(dest)
}

/// Load a program written by [`emit_program`].
pub fn load_program(path: &Path) -> Result<RuleProgram> {
	let content = std::fs::read_to_string(path).map_err(|source| HipifyError::FileRead {
		path: path.to_path_buf(),
		source,
	})?;
	RuleProgram::from_toml(&content, path)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapping::default_mapping_table;

	#[test]
	fn test_program_from_default_table() {
		let program = RuleProgram::from_table(&default_mapping_table().unwrap());

		assert_eq!(program.kernel_launch.len(), 12);
		assert_eq!(program.extern_shared.len(), 1);
		assert!(!program.substitutions.is_empty());
		assert!(!program.host_functions.is_empty());
		assert!(program.whitelist.iter().any(|w| w == "cudaDevice"));
		assert!(
			program
				.kernel_launch
				.iter()
				.all(|r| r.counter == Some(Counter::KernelLaunch))
		);
	}

	#[test]
	fn test_unsupported_entries_only_reach_diagnostics() {
		let table = default_mapping_table().unwrap();
		let program = RuleProgram::from_table(&table);

		for entry in table.renames().filter(|e| e.is_unsupported()) {
			let word = format!(r"\b{}\b", regex::escape(&entry.source));
			assert!(
				program.substitutions.iter().all(|r| !r.expr.contains(&word)),
				"{} has a rewrite rule",
				entry.source
			);
			assert!(program.diagnostics.unsupported.contains(&entry.source));
		}
	}

	#[test]
	fn test_toml_round_trip() {
		let program = RuleProgram::from_table(&default_mapping_table().unwrap());
		let text = program.to_toml().unwrap();
		assert!(text.starts_with("# Generated by `hipify --emit-program`"));

		let parsed = RuleProgram::from_toml(&text, Path::new("rules.toml")).unwrap();
		assert_eq!(parsed, program);
	}

	#[test]
	fn test_emit_program_installs_file() {
		let dir = tempfile::tempdir().unwrap();
		let program = RuleProgram::from_table(&default_mapping_table().unwrap());

		let path = emit_program(&program, dir.path()).unwrap();
		assert_eq!(path.file_name().unwrap(), PROGRAM_FILE_NAME);
		assert_eq!(load_program(&path).unwrap(), program);

		// Only the installed program remains; the temporary file is gone.
		let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
		assert_eq!(entries.len(), 1);
	}

	#[test]
	fn test_emit_program_missing_directory() {
		let dir = tempfile::tempdir().unwrap();
		let missing = dir.path().join("missing");

		let result = emit_program(&RuleProgram::default(), &missing);
		assert!(matches!(result, Err(HipifyError::OutputDir { .. })));
		assert!(!missing.exists());
	}
}
