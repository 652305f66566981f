use crate::convert::Options;
use crate::mapping::Counter;
use crate::rules::{CompiledProgram, CompiledRule, Diagnostic};
use crate::stats::FileStats;

/// Prepended to converted files that contain device code.
pub const RUNTIME_INCLUDE: &str = "#include \"hip/hip_runtime.h\"";

const RUNTIME_HEADER_FORMS: [&str; 2] = [
	"#include \"hip/hip_runtime.h\"",
	"#include <hip/hip_runtime.h>",
];

/// Keywords marking device code in the unconverted source.
const DEVICE_KEYWORDS: [&str; 2] = ["__global__", "__shared__"];

/// Result of converting one buffer.
#[derive(Debug, Default)]
pub struct FileOutcome {
	/// Converted bytes, `None` when output is suppressed.
	pub output: Option<Vec<u8>>,
	pub stats: FileStats,
	pub diagnostics: Vec<Diagnostic>,
}

fn apply_counted(rules: &[CompiledRule], buffer: &mut Vec<u8>, stats: &mut FileStats) {
	for rule in rules {
		let hits = rule.apply(buffer);
		if let Some(counter) = rule.counter() {
			stats.counts.add(counter, hits.count);
		}
	}
}

fn contains(haystack: &[u8], needle: &str) -> bool {
	haystack
		.windows(needle.len())
		.any(|window| window == needle.as_bytes())
}

fn has_runtime_header(text: &[u8]) -> bool {
	RUNTIME_HEADER_FORMS.iter().any(|form| contains(text, form))
}

/// The line terminator used by the first line of `text`.
fn line_ending(text: &[u8]) -> &'static str {
	match text.iter().position(|&b| b == b'\n') {
		Some(idx) if text[..idx].ends_with(b"\r") => "\r\n",
		_ => "\n",
	}
}

/// Convert one file's contents.
///
/// Pure: no I/O, no printing. `name` is only used to label diagnostics.
/// The text need not be UTF-8; bytes outside the rewritten spans are kept
/// as they are.
pub fn convert_source(
	program: &CompiledProgram,
	options: &Options,
	name: &str,
	text: &[u8],
) -> FileOutcome {
	let mut stats = FileStats::default();
	let mut buffer = text.to_vec();

	let keywords = DEVICE_KEYWORDS
		.iter()
		.filter(|keyword| contains(&buffer, keyword))
		.count();

	apply_counted(&program.substitutions, &mut buffer, &mut stats);
	apply_counted(&program.extern_shared, &mut buffer, &mut stats);

	for rule in &program.kernel_launch {
		let hits = rule.apply(&mut buffer);
		stats.counts.add(Counter::KernelLaunch, hits.count);
		for kernel in &hits.first_groups {
			stats.kernels.add(kernel, 1);
		}
	}

	for rule in &program.namespace {
		stats.namespace_rewrites += rule.apply(&mut buffer).count;
	}

	if options.examine {
		for m in program.converted_tag.find_iter(&buffer) {
			stats
				.converted_tags
				.add(&String::from_utf8_lossy(m.as_bytes()), 1);
		}
	}

	let device_signal = keywords + stats.counts.get(Counter::DeviceFunction);

	let mut diagnostics = Vec::new();
	if program.diagnostics.needs_line_scan(&buffer, device_signal > 0) {
		for (idx, line) in buffer.split(|&b| b == b'\n').enumerate() {
			let line = line.strip_suffix(b"\r").unwrap_or(line);
			let sanitized = program.whitelist.sanitize(line);
			for diagnostic in program.diagnostics.scan_line(idx + 1, line, &sanitized) {
				stats.warnings += 1;
				stats.warning_tags.add(&diagnostic.tag, 1);
				diagnostics.push(diagnostic);
			}
		}
	}

	if device_signal > 0 {
		let credit = program.diagnostics.count_supported_device_calls(&buffer);
		stats.counts.add(Counter::DeviceFunction, credit);
	}

	for rule in &program.host_functions {
		stats.host_rewrites += rule.apply(&mut buffer).count;
	}

	stats.line_count = buffer.iter().filter(|&&b| b == b'\n').count();

	let output = if options.no_output {
		None
	} else {
		let kernel_signal = device_signal
			+ stats.counts.get(Counter::KernelLaunch)
			+ stats.counts.get(Counter::DeviceFunction);
		let total_calls = stats.counts.api_calls() + kernel_signal;

		if total_calls > 0 && kernel_signal > 0 && !has_runtime_header(&buffer) {
			let ending = line_ending(text);
			let mut with_header =
				Vec::with_capacity(RUNTIME_INCLUDE.len() + ending.len() + buffer.len());
			with_header.extend_from_slice(RUNTIME_INCLUDE.as_bytes());
			with_header.extend_from_slice(ending.as_bytes());
			with_header.extend_from_slice(&buffer);
			Some(with_header)
		} else {
			Some(buffer)
		}
	};

	tracing::debug!(
		file = name,
		converted = stats.counts.total(),
		warnings = stats.warnings,
		kernels = stats.kernels.len(),
		host_rewrites = stats.host_rewrites,
		namespace_rewrites = stats.namespace_rewrites,
		"converted source"
	);

	FileOutcome {
		output,
		stats,
		diagnostics,
	}
}
