//! Conversion statistics: per-file counters, run totals and the reports
//! printed with `--print-stats`.

use crate::mapping::Counter;
use std::collections::{BTreeMap, HashMap};
use std::io::{self, Write};

/// Conversion counts keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Counts(BTreeMap<Counter, usize>);

impl Counts {
	pub fn clear(&mut self) {
		self.0.clear();
	}

	pub fn add(&mut self, counter: Counter, n: usize) {
		if n > 0 {
			*self.0.entry(counter).or_default() += n;
		}
	}

	/// Fold another set of counts into this one.
	pub fn merge(&mut self, other: &Counts) {
		for (&counter, &n) in &other.0 {
			self.add(counter, n);
		}
	}

	pub fn get(&self, counter: Counter) -> usize {
		self.0.get(&counter).copied().unwrap_or(0)
	}

	pub fn total(&self) -> usize {
		self.0.values().sum()
	}

	/// Total over the categories produced by plain substitutions.
	pub fn api_calls(&self) -> usize {
		self.0
			.iter()
			.filter(|(counter, _)| counter.is_api_call())
			.map(|(_, n)| n)
			.sum()
	}

	/// Nonzero categories by descending count, catalog order on ties.
	pub fn ranked(&self) -> Vec<(Counter, usize)> {
		let mut ranked: Vec<_> = self.0.iter().map(|(&c, &n)| (c, n)).collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1));
		ranked
	}
}

/// Frequency of free-form tags: warning tags, kernel names, converted
/// identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagCounts(HashMap<String, usize>);

impl TagCounts {
	pub fn add(&mut self, tag: &str, n: usize) {
		if n == 0 {
			return;
		}
		match self.0.get_mut(tag) {
			Some(count) => *count += n,
			None => {
				self.0.insert(tag.to_string(), n);
			}
		}
	}

	pub fn merge(&mut self, other: &TagCounts) {
		for (tag, &n) in &other.0 {
			self.add(tag, n);
		}
	}

	pub fn get(&self, tag: &str) -> usize {
		self.0.get(tag).copied().unwrap_or(0)
	}

	/// Number of distinct tags.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Tags by descending count; ties sort by name so output is stable.
	pub fn ranked(&self) -> Vec<(&str, usize)> {
		let mut ranked: Vec<_> = self.0.iter().map(|(t, &n)| (t.as_str(), n)).collect();
		ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
		ranked
	}
}

/// Everything counted while converting one file.
#[derive(Debug, Clone, Default)]
pub struct FileStats {
	pub counts: Counts,
	pub warnings: usize,
	pub warning_tags: TagCounts,
	pub line_count: usize,

	/// Callee names of rewritten kernel launches.
	pub kernels: TagCounts,

	/// Only filled in examine mode.
	pub converted_tags: TagCounts,

	pub host_rewrites: usize,
	pub namespace_rewrites: usize,
}

impl FileStats {
	/// Whether the per-file statistics line is worth printing.
	pub fn is_noteworthy(&self) -> bool {
		self.counts.total() + self.warnings > 0
	}
}

/// Render one statistics line pair.
///
/// ```text
///   info: converted 3 CUDA->HIP refs ( memory:2 kernel_launch:1 )
///   warning:0 LOC:12
/// ```
pub fn format_stats(label: &str, counts: &Counts, warnings: usize, loc: usize) -> String {
	let refs: String = counts
		.ranked()
		.into_iter()
		.map(|(counter, n)| format!("{counter}:{n} "))
		.collect();
	format!(
		"  info: {label} {} CUDA->HIP refs ( {refs})\n  warning:{warnings} LOC:{loc}",
		counts.total()
	)
}

/// Totals accumulated across every converted file.
#[derive(Debug, Clone, Default)]
pub struct RunStatistics {
	pub files: usize,
	pub counts: Counts,
	pub warnings: usize,
	pub warning_tags: TagCounts,
	pub line_count: usize,
	pub kernels: TagCounts,
	pub converted_tags: TagCounts,
}

impl RunStatistics {
	/// Fold one file's statistics into the run totals.
	pub fn fold(&mut self, file: &FileStats) {
		self.files += 1;
		self.counts.merge(&file.counts);
		self.warnings += file.warnings;
		self.warning_tags.merge(&file.warning_tags);
		self.line_count += file.line_count;
		self.kernels.merge(&file.kernels);
		self.converted_tags.merge(&file.converted_tags);
	}

	/// Write the end-of-run report.
	pub fn write_report<W: Write>(&self, out: &mut W, examine: bool) -> io::Result<()> {
		writeln!(out)?;
		writeln!(
			out,
			"{}",
			format_stats("TOTAL-converted", &self.counts, self.warnings, self.line_count)
		)?;
		writeln!(out)?;

		for (tag, n) in self.warning_tags.ranked() {
			writeln!(out, "  warning: unconverted {tag} : {n}")?;
		}

		write!(out, "  kernels ({} total) : ", self.kernels.len())?;
		for (name, n) in self.kernels.ranked() {
			write!(out, "  {name}({n})")?;
		}
		writeln!(out)?;
		writeln!(out)?;

		if examine {
			for (tag, n) in self.converted_tags.ranked() {
				writeln!(out, "  {tag} {n}")?;
			}
		}

		Ok(())
	}
}
