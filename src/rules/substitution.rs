//! Whole-word identifier substitutions plus the two fixed source rewrites
//! (dynamic shared memory declarations and the cub namespace).

use crate::mapping::{Counter, MappingEntry, MappingTable};
use crate::rules::program::RewriteRule;
use crate::rules::rewriter::sed_expr;

/// Emit one whole-word rule per supported or deprecated mapping entry.
///
/// Rules are ordered by category (catalog order), then by declaration
/// order. Unsupported entries never become rewrite rules.
pub fn emit_substitution_rules(table: &MappingTable) -> Vec<RewriteRule> {
	let mut rules = Vec::new();

	for counter in Counter::ALL {
		let entries: Vec<&MappingEntry> = if counter.is_include() {
			table.includes.iter().collect()
		} else {
			table.renames().collect()
		};

		rules.extend(
			entries
				.into_iter()
				.filter(|entry| entry.category == counter && !entry.is_unsupported())
				.map(substitution_rule),
		);
	}

	rules
}

fn substitution_rule(entry: &MappingEntry) -> RewriteRule {
	let pattern = format!(r"\b{}\b", regex::escape(&entry.source));
	// Targets are literal text; `$` would otherwise start a group reference.
	let replacement = entry.target.replace('$', "$$");
	RewriteRule::counted(sed_expr(&pattern, &replacement), entry.category)
}

/// `extern [attr] __shared__ TYPE NAME[];` becomes `HIP_DYNAMIC_SHARED(attr TYPE, NAME)`.
pub fn emit_extern_shared_rules() -> Vec<RewriteRule> {
	vec![RewriteRule::counted(
		sed_expr(
			r"extern\s+([\w\(\)]+)?\s*__shared__\s+([\w:<>\s]+?)\s+(\w+)\s*\[\s*\]\s*;",
			"HIP_DYNAMIC_SHARED(${1} ${2}, ${3})",
		),
		Counter::ExternShared,
	)]
}

pub fn emit_namespace_rules() -> Vec<RewriteRule> {
	vec![
		RewriteRule::uncounted(sed_expr(
			r"using\s+namespace\s+cub\b",
			"using namespace hipcub",
		)),
		RewriteRule::uncounted(sed_expr(r"\bcub::", "hipcub::")),
	]
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::mapping::SupportStatus;
	use crate::rules::rewriter::Substitution;

	fn entry(source: &str, target: &str, category: Counter, status: SupportStatus) -> MappingEntry {
		MappingEntry {
			source: source.to_string(),
			target: target.to_string(),
			category,
			status,
		}
	}

	fn apply_all(rules: &[RewriteRule], input: &str) -> String {
		let text = rules.iter().fold(input.as_bytes().to_vec(), |text, rule| {
			Substitution::parse(&rule.expr).unwrap().apply(&text)
		});
		String::from_utf8(text).unwrap()
	}

	#[test]
	fn test_unsupported_entries_get_no_rule() {
		let table = MappingTable {
			runtime_functions: vec![
				entry("cudaMalloc", "hipMalloc", Counter::Memory, SupportStatus::Supported),
				entry(
					"cudaProfilerInitialize",
					"hipProfilerInitialize",
					Counter::Profiler,
					SupportStatus::Unsupported,
				),
				entry(
					"cudaThreadExit",
					"hipDeviceReset",
					Counter::Thread,
					SupportStatus::Deprecated,
				),
			],
			..Default::default()
		};

		let rules = emit_substitution_rules(&table);
		assert_eq!(rules.len(), 2);
		assert!(rules.iter().all(|r| !r.expr.contains("cudaProfilerInitialize")));
	}

	#[test]
	fn test_rules_follow_catalog_order() {
		let table = MappingTable {
			includes: vec![entry(
				"cuda_runtime.h",
				"hip/hip_runtime.h",
				Counter::IncludeCudaMainHeader,
				SupportStatus::Supported,
			)],
			renames: vec![
				entry("cudaStream_t", "hipStream_t", Counter::Type, SupportStatus::Supported),
				entry("cudaGetLastError", "hipGetLastError", Counter::Error, SupportStatus::Supported),
			],
			..Default::default()
		};

		let counters: Vec<_> = emit_substitution_rules(&table)
			.iter()
			.map(|r| r.counter)
			.collect();
		assert_eq!(
			counters,
			vec![
				Some(Counter::Error),
				Some(Counter::IncludeCudaMainHeader),
				Some(Counter::Type)
			]
		);
	}

	#[test]
	fn test_include_paths_escape_separators() {
		let table = MappingTable {
			includes: vec![entry(
				"cub/cub.cuh",
				"hipcub/hipcub.hpp",
				Counter::Include,
				SupportStatus::Supported,
			)],
			..Default::default()
		};

		let rules = emit_substitution_rules(&table);
		assert_eq!(rules[0].expr, r"s/\bcub\/cub\.cuh\b/hipcub\/hipcub.hpp/g");
		assert_eq!(
			apply_all(&rules, "#include <cub/cub.cuh>"),
			"#include <hipcub/hipcub.hpp>"
		);
	}

	#[test]
	fn test_substitution_is_whole_word() {
		let table = MappingTable {
			runtime_functions: vec![entry(
				"cudaMemcpy",
				"hipMemcpy",
				Counter::Memory,
				SupportStatus::Supported,
			)],
			..Default::default()
		};

		let rules = emit_substitution_rules(&table);
		assert_eq!(
			apply_all(&rules, "cudaMemcpy(a); cudaMemcpyAsync(b); mycudaMemcpy(c);"),
			"hipMemcpy(a); cudaMemcpyAsync(b); mycudaMemcpy(c);"
		);
	}

	#[test]
	fn test_extern_shared_rewrite() {
		let rules = emit_extern_shared_rules();
		assert_eq!(
			apply_all(&rules, "extern __shared__ float sdata[];"),
			"HIP_DYNAMIC_SHARED( float, sdata)"
		);
		assert_eq!(
			apply_all(&rules, "extern __shared__ unsigned int cache [ ];"),
			"HIP_DYNAMIC_SHARED( unsigned int, cache)"
		);
	}

	#[test]
	fn test_namespace_rewrite() {
		let rules = emit_namespace_rules();
		assert_eq!(
			apply_all(&rules, "using namespace cub;\ncub::BlockReduce<int, 128> r;"),
			"using namespace hipcub;\nhipcub::BlockReduce<int, 128> r;"
		);
		assert_eq!(
			apply_all(&rules, "using namespace hipcub; hipcub::Sum s;"),
			"using namespace hipcub; hipcub::Sum s;"
		);
	}
}
