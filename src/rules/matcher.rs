use crate::error::{HipifyError, Result};
use crate::mapping::Counter;
use crate::rules::diagnostics::DiagnosticScanner;
use crate::rules::program::{RewriteRule, RuleProgram, WrappedArg};
use crate::rules::rewriter::Substitution;
use crate::rules::whitelist::Whitelist;
use regex::bytes::{Captures, Regex};

/// Identifiers in the converted vocabulary, tallied in examine mode.
const CONVERTED_TAG: &str = r"\b(?:hip|HIP)(?:[A-Z]|_)\w+\b";

/// Outcome of applying one rule to a buffer.
#[derive(Debug, Default)]
pub struct RuleHits {
	/// Number of rewrites performed.
	pub count: usize,

	/// Capture group 1 of every rewritten match.
	pub first_groups: Vec<String>,
}

/// A rule ready for matching.
#[derive(Debug)]
pub struct CompiledRule {
	/// The original rule.
	pub rule: RewriteRule,

	/// Parsed substitution.
	pub substitution: Substitution,
}

impl CompiledRule {
	/// Compile a rule from its sed-style expression.
	pub fn compile(rule: &RewriteRule) -> Result<Self> {
		Ok(CompiledRule {
			rule: rule.clone(),
			substitution: Substitution::parse(&rule.expr)?,
		})
	}

	pub fn counter(&self) -> Option<Counter> {
		self.rule.counter
	}

	/// Check if a match is eligible for rewriting.
	pub fn accepts(&self, before: &[u8], caps: &Captures) -> bool {
		if let Some(ref marker) = self.rule.skip_after
			&& before.ends_with(marker.as_bytes())
		{
			return false;
		}

		if let Some(WrappedArg { group, ref prefix }) = self.rule.skip_wrapped
			&& caps
				.get(group)
				.is_some_and(|m| m.as_bytes().starts_with(prefix.as_bytes()))
		{
			return false;
		}

		true
	}

	/// Rewrite `text` in place and report what was rewritten.
	pub fn apply(&self, text: &mut Vec<u8>) -> RuleHits {
		let mut first_groups = Vec::new();
		let (rewritten, count) = self.substitution.apply_counted(text, |before, caps| {
			let accepted = self.accepts(before, caps);
			if accepted && let Some(m) = caps.get(1) {
				first_groups.push(String::from_utf8_lossy(m.as_bytes()).into_owned());
			}
			accepted
		});

		if count > 0 {
			*text = rewritten;
		}

		RuleHits {
			count,
			first_groups,
		}
	}
}

/// Compile a list of rules.
pub fn compile_rules(rules: &[RewriteRule]) -> Result<Vec<CompiledRule>> {
	rules.iter().map(CompiledRule::compile).collect()
}

/// A [`RuleProgram`] with every pattern compiled.
#[derive(Debug)]
pub struct CompiledProgram {
	pub whitelist: Whitelist,
	pub substitutions: Vec<CompiledRule>,
	pub extern_shared: Vec<CompiledRule>,
	pub kernel_launch: Vec<CompiledRule>,
	pub namespace: Vec<CompiledRule>,
	pub host_functions: Vec<CompiledRule>,
	pub diagnostics: DiagnosticScanner,
	pub converted_tag: Regex,
}

impl CompiledProgram {
	pub fn compile(program: &RuleProgram) -> Result<Self> {
		let compiled = CompiledProgram {
			whitelist: Whitelist::new(program.whitelist.iter().cloned())?,
			substitutions: compile_rules(&program.substitutions)?,
			extern_shared: compile_rules(&program.extern_shared)?,
			kernel_launch: compile_rules(&program.kernel_launch)?,
			namespace: compile_rules(&program.namespace)?,
			host_functions: compile_rules(&program.host_functions)?,
			diagnostics: DiagnosticScanner::new(&program.diagnostics)?,
			converted_tag: Regex::new(CONVERTED_TAG).map_err(|source| {
				HipifyError::InvalidRegex {
					pattern: CONVERTED_TAG.to_string(),
					source,
				}
			})?,
		};
		tracing::debug!(
			rules = compiled.substitutions.len()
				+ compiled.extern_shared.len()
				+ compiled.kernel_launch.len()
				+ compiled.namespace.len()
				+ compiled.host_functions.len(),
			"compiled rule program"
		);
		Ok(compiled)
	}

	/// Add identifiers to the whitelist, e.g. from `--whitelist`.
	pub fn extend_whitelist<I, S>(&mut self, words: I) -> Result<()>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut all = self.whitelist.words().to_vec();
		all.extend(words.into_iter().map(Into::into));
		self.whitelist = Whitelist::new(all)?;
		Ok(())
	}
}
