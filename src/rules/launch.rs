//! The `<<<...>>>` kernel launch family.
//!
//! A launch looks like `kern[<targs>] <<<grid, block[, shmem[, stream]]>>> (args)`.
//! Every combination of template presence, configuration arity and call
//! argument emptiness gets its own rule, rewriting to
//! `hipLaunchKernelGGL(kern, dim3(grid), dim3(block), shmem, stream, args)`.

use crate::mapping::Counter;
use crate::rules::program::RewriteRule;
use crate::rules::rewriter::sed_expr;

/// A configuration argument: never spans a line or a closing `>>>`, so two
/// launches on one line stay separate.
const CONFIG_ARG: &str = r"((?:[^>\n]|>[^>\n]|>>[^>\n])+?)";

/// Template arguments: may nest `<...>` but never contain `<<<` or cross a
/// statement boundary.
const TEMPLATE_ARGS: &str = r"((?:[^;\n<]|<[^;\n<]|<<[^;\n<])+?)";

/// One launch shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchShape {
	/// `kern<...><<<` rather than `kern<<<`.
	pub templated: bool,

	/// Number of configuration arguments between the chevrons (2..=4).
	pub arity: usize,

	/// `()` rather than `(args...)`.
	pub empty_args: bool,
}

/// All 12 shapes in application order.
///
/// Higher arity is tried first: configuration groups match permissively, so
/// a 2-argument pattern would swallow `shmem, stream` into its block group.
/// For each arity the empty-argument shape precedes the open-paren shape,
/// whose bare `(` anchor would otherwise also match `()`.
pub const LAUNCH_SHAPES: [LaunchShape; 12] = {
	let mut shapes = [LaunchShape {
		templated: false,
		arity: 0,
		empty_args: false,
	}; 12];
	let mut i = 0;
	while i < 12 {
		shapes[i] = LaunchShape {
			templated: i % 2 == 0,
			arity: 4 - i / 4,
			empty_args: (i / 2) % 2 == 0,
		};
		i += 1;
	}
	shapes
};

impl LaunchShape {
	/// Regex matching this shape.
	///
	/// Group 1 is the kernel name, group 2 the template arguments when
	/// templated, followed by one group per configuration argument.
	pub fn pattern(&self) -> String {
		let mut pattern = String::from(r"([:\w]+)\s*");
		if self.templated {
			pattern.push('<');
			pattern.push_str(TEMPLATE_ARGS);
			pattern.push_str(r">\s*");
		}
		pattern.push_str(r"<<<\s*");
		let config = vec![CONFIG_ARG; self.arity].join(r"\s*,\s*");
		pattern.push_str(&config);
		pattern.push_str(r"\s*>>>\s*\(");
		if self.empty_args {
			pattern.push_str(r"\s*\)");
		}
		pattern
	}

	/// Replacement template producing the normalized four-argument launch.
	pub fn replacement(&self) -> String {
		let (callee, first_config) = if self.templated {
			("HIP_KERNEL_NAME(${1}<${2}>)".to_string(), 3)
		} else {
			("${1}".to_string(), 2)
		};

		let mut args = vec![callee];
		for slot in 0..4 {
			let group = first_config + slot;
			args.push(match slot {
				_ if slot >= self.arity => "0".to_string(),
				0 | 1 => format!("dim3(${{{group}}})"),
				_ => format!("${{{group}}}"),
			});
		}

		let tail = if self.empty_args { ")" } else { ", " };
		format!("hipLaunchKernelGGL({}{}", args.join(", "), tail)
	}

	pub fn rule(&self) -> RewriteRule {
		RewriteRule::counted(
			sed_expr(&self.pattern(), &self.replacement()),
			Counter::KernelLaunch,
		)
	}
}

/// Emit the kernel launch rules in application order.
pub fn emit_kernel_launch_rules() -> Vec<RewriteRule> {
	LAUNCH_SHAPES.iter().map(LaunchShape::rule).collect()
}
