//! Argument wrapping for host functions that take device symbols or kernel
//! function pointers.
//!
//! Argument boundaries are found by scanning to the first comma (or closing
//! parenthesis for the second argument). This is a heuristic: arguments that
//! contain nested calls or commas inside literals are split in the wrong place.

use crate::mapping::MappingTable;
use crate::rules::program::{RewriteRule, WrappedArg};
use crate::rules::rewriter::sed_expr;

/// Calls already annotated with this marker are left alone.
pub const VERIFIED_MARKER: &str = "// CHECK: ";

const HIP_SYMBOL: &str = "HIP_SYMBOL";
const REINTERPRET_CAST: &str = "reinterpret_cast<const void*>";

/// The four function groups, each driving one rewrite shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionGroup {
	DeviceSymbol0,
	DeviceSymbol1,
	Reinterpret0,
	Reinterpret1,
}

impl FunctionGroup {
	pub const ALL: [FunctionGroup; 4] = [
		FunctionGroup::DeviceSymbol0,
		FunctionGroup::DeviceSymbol1,
		FunctionGroup::Reinterpret0,
		FunctionGroup::Reinterpret1,
	];

	fn wrapper(&self) -> &'static str {
		match self {
			FunctionGroup::DeviceSymbol0 | FunctionGroup::DeviceSymbol1 => HIP_SYMBOL,
			FunctionGroup::Reinterpret0 | FunctionGroup::Reinterpret1 => REINTERPRET_CAST,
		}
	}

	fn wraps_second_argument(&self) -> bool {
		matches!(self, FunctionGroup::DeviceSymbol1 | FunctionGroup::Reinterpret1)
	}

	fn sources<'a>(&self, table: &'a MappingTable) -> &'a [String] {
		let roles = &table.host_functions;
		match self {
			FunctionGroup::DeviceSymbol0 => &roles.device_symbol_0,
			FunctionGroup::DeviceSymbol1 => &roles.device_symbol_1,
			FunctionGroup::Reinterpret0 => &roles.reinterpret_0,
			FunctionGroup::Reinterpret1 => &roles.reinterpret_1,
		}
	}

	/// HIP names of the group's functions that are known runtime functions.
	pub fn members(&self, table: &MappingTable) -> Vec<String> {
		self.sources(table)
			.iter()
			.filter_map(|source| table.runtime_function(source))
			.map(|entry| entry.target.clone())
			.collect()
	}

	/// The rewrite rule for one function of this group.
	pub fn rule(&self, function: &str) -> RewriteRule {
		let name = regex::escape(function);
		let wrapper = self.wrapper();

		let (pattern, replacement, group) = if self.wraps_second_argument() {
			(
				format!(r"\b({name})\s*\(\s*([^,]+?)\s*,\s*([^,\)]+?)\s*(,\s*|\))"),
				format!("{function}(${{2}}, {wrapper}(${{3}})${{4}}"),
				3,
			)
		} else {
			(
				format!(r"\b({name})\s*\(\s*([^,]+?)\s*,"),
				format!("{function}({wrapper}(${{2}}),"),
				2,
			)
		};

		let mut rule = RewriteRule::uncounted(sed_expr(&pattern, &replacement));
		rule.skip_after = Some(VERIFIED_MARKER.to_string());
		rule.skip_wrapped = Some(WrappedArg {
			group,
			prefix: format!("{wrapper}("),
		});
		rule
	}
}

/// Emit one rule per function in each group, groups in fixed order.
pub fn emit_host_function_rules(table: &MappingTable) -> Vec<RewriteRule> {
	FunctionGroup::ALL
		.iter()
		.flat_map(|group| {
			group
				.members(table)
				.into_iter()
				.map(move |function| group.rule(&function))
		})
		.collect()
}
