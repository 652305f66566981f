//! Per-line diagnostics for identifiers the converter cannot (or should not)
//! rewrite silently.

use crate::error::{HipifyError, Result};
use crate::mapping::{MappingTable, SupportStatus};
use regex::bytes::{Regex, RegexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier lists scanned for on every line.
///
/// Each list is in reverse declaration order so longer identifiers declared
/// after their prefixes are reported first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DiagnosticLists {
	#[serde(default)]
	pub deprecated: Vec<String>,

	#[serde(default)]
	pub unsupported: Vec<String>,

	#[serde(default)]
	pub unsupported_device_functions: Vec<String>,

	/// Not a warning: supported device calls earn `device_function` credit.
	#[serde(default)]
	pub supported_device_functions: Vec<String>,
}

/// Collect the diagnostic name lists from the table.
pub fn emit_diagnostic_lists(table: &MappingTable) -> DiagnosticLists {
	let mut lists = DiagnosticLists::default();

	for entry in table.renames().rev() {
		match entry.status {
			SupportStatus::Deprecated => lists.deprecated.push(entry.source.clone()),
			SupportStatus::Unsupported => lists.unsupported.push(entry.source.clone()),
			SupportStatus::Supported => {}
		}
	}

	for func in table.device_functions.iter().rev() {
		match func.status {
			SupportStatus::Unsupported => lists.unsupported_device_functions.push(func.name.clone()),
			_ => lists.supported_device_functions.push(func.name.clone()),
		}
	}

	lists
}

/// What a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
	/// A `cuda[A-Z]` identifier or `<<<...>>>` launch survived conversion.
	Unconverted,
	DeprecatedIdentifier,
	UnsupportedIdentifier,
	UnsupportedDeviceFunction,
}

impl DiagnosticKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			DiagnosticKind::Unconverted => "unconverted",
			DiagnosticKind::DeprecatedIdentifier => "deprecated identifier",
			DiagnosticKind::UnsupportedIdentifier => "unsupported identifier",
			DiagnosticKind::UnsupportedDeviceFunction => "unsupported device function",
		}
	}
}

/// One warning for one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
	/// 1-based line number.
	pub line: usize,

	pub kind: DiagnosticKind,

	/// Key for the warning-tag statistics.
	pub tag: String,

	/// The offending line.
	pub text: String,
}

impl Diagnostic {
	/// Attach the file name for printing.
	pub fn in_file<'a>(&'a self, file: &'a str) -> DiagnosticInFile<'a> {
		DiagnosticInFile {
			diagnostic: self,
			file,
		}
	}
}

/// A diagnostic rendered with its file name.
pub struct DiagnosticInFile<'a> {
	diagnostic: &'a Diagnostic,
	file: &'a str,
}

impl fmt::Display for DiagnosticInFile<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let d = self.diagnostic;
		match d.kind {
			DiagnosticKind::Unconverted => {
				write!(f, "  warning: {}:#{} : {}", self.file, d.line, d.text)
			}
			kind => write!(
				f,
				"  warning: {}:{}: {} \"{}\": {}",
				self.file,
				d.line,
				kind.as_str(),
				d.tag,
				d.text
			),
		}
	}
}

fn compile(pattern: String) -> Result<Regex> {
	Regex::new(&pattern).map_err(|source| HipifyError::InvalidRegex { pattern, source })
}

/// A list of identifiers matched together, reported in list order.
#[derive(Debug)]
struct NameSet {
	names: Vec<String>,
	set: RegexSet,
	regexes: Vec<Regex>,
}

impl NameSet {
	fn new(names: &[String], shape: fn(&str) -> String) -> Result<Self> {
		let patterns: Vec<String> = names.iter().map(|n| shape(&regex::escape(n))).collect();
		let set = RegexSet::new(&patterns).map_err(|source| HipifyError::InvalidRegex {
			pattern: patterns.join("|"),
			source,
		})?;
		let regexes = patterns.into_iter().map(compile).collect::<Result<_>>()?;

		Ok(NameSet {
			names: names.to_vec(),
			set,
			regexes,
		})
	}

	/// Indices of the names present in `text`, in list order.
	fn present(&self, text: &[u8]) -> Vec<usize> {
		if self.names.is_empty() {
			return Vec::new();
		}
		self.set.matches(text).into_iter().collect()
	}

	/// Occurrences of name `idx` not qualified by a named namespace.
	///
	/// `ns::umin(...)` is some other function; `::umin(...)` is the global
	/// device function and still counts.
	fn unqualified(&self, idx: usize, text: &[u8]) -> usize {
		self.regexes[idx]
			.find_iter(text)
			.filter(|m| !is_namespace_qualified(&text[..m.start()]))
			.count()
	}
}

fn is_namespace_qualified(before: &[u8]) -> bool {
	before
		.strip_suffix(b"::")
		.and_then(|rest| rest.last())
		.is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_' || !b.is_ascii())
}

fn whole_word(name: &str) -> String {
	format!(r"\b{name}\b")
}

fn call(name: &str) -> String {
	format!(r"\b{name}\s*\(")
}

/// Compiled diagnostic rules.
#[derive(Debug)]
pub struct DiagnosticScanner {
	deprecated: NameSet,
	unsupported: NameSet,
	unsupported_device: NameSet,
	supported_device: NameSet,
	leftover_identifier: Regex,
	leftover_launch: Regex,
	cuda_hint: Regex,
}

impl DiagnosticScanner {
	pub fn new(lists: &DiagnosticLists) -> Result<Self> {
		Ok(DiagnosticScanner {
			deprecated: NameSet::new(&lists.deprecated, whole_word)?,
			unsupported: NameSet::new(&lists.unsupported, whole_word)?,
			unsupported_device: NameSet::new(&lists.unsupported_device_functions, call)?,
			supported_device: NameSet::new(&lists.supported_device_functions, call)?,
			leftover_identifier: compile(r"\bcuda[A-Z]\w+".to_string())?,
			leftover_launch: compile(r"<<<.*>>>".to_string())?,
			cuda_hint: compile(r"\bcu|CU".to_string())?,
		})
	}

	/// Whether a converted buffer is worth scanning line by line.
	pub fn needs_line_scan(&self, text: &[u8], has_device_code: bool) -> bool {
		has_device_code || self.cuda_hint.is_match(text) || self.leftover_launch.is_match(text)
	}

	/// Scan one line.
	///
	/// `sanitized` is the line with whitelisted identifiers replaced; all
	/// matching happens on it, while diagnostics quote the original `line`.
	/// Bytes that are not UTF-8 are shown as U+FFFD in the quote.
	pub fn scan_line(&self, line_num: usize, line: &[u8], sanitized: &[u8]) -> Vec<Diagnostic> {
		let text = String::from_utf8_lossy(line);
		let diagnostic = |kind, tag: &str| Diagnostic {
			line: line_num,
			kind,
			tag: tag.to_string(),
			text: text.to_string(),
		};

		let mut found = Vec::new();

		if let Some(m) = self.leftover_identifier.find(sanitized) {
			found.push(diagnostic(
				DiagnosticKind::Unconverted,
				&String::from_utf8_lossy(m.as_bytes()),
			));
		} else if self.leftover_launch.is_match(sanitized) {
			found.push(diagnostic(DiagnosticKind::Unconverted, "Launch"));
		}

		for idx in self.deprecated.present(sanitized) {
			found.push(diagnostic(
				DiagnosticKind::DeprecatedIdentifier,
				&self.deprecated.names[idx],
			));
		}

		for idx in self.unsupported.present(sanitized) {
			found.push(diagnostic(
				DiagnosticKind::UnsupportedIdentifier,
				&self.unsupported.names[idx],
			));
		}

		for idx in self.unsupported_device.present(sanitized) {
			if self.unsupported_device.unqualified(idx, sanitized) > 0 {
				found.push(diagnostic(
					DiagnosticKind::UnsupportedDeviceFunction,
					&self.unsupported_device.names[idx],
				));
			}
		}

		found
	}

	/// Count unqualified calls to supported device functions in `text`.
	pub fn count_supported_device_calls(&self, text: &[u8]) -> usize {
		self.supported_device
			.present(text)
			.into_iter()
			.map(|idx| self.supported_device.unqualified(idx, text))
			.sum()
	}
}
