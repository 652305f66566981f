use crate::error::HipifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A conversion category.
///
/// Every category has a stable key that names both the runtime counter and
/// the label printed in statistics reports. The declaration order is the
/// report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
	Error,
	Init,
	Version,
	Device,
	Context,
	Module,
	Memory,
	Addressing,
	Stream,
	Event,
	ExternalResourceInterop,
	StreamMemory,
	Execution,
	Graph,
	Occupancy,
	Texture,
	Surface,
	Peer,
	Graphics,
	Profiler,
	Thread,
	Complex,
	Library,
	Math,
	Cache,
	Exec,
	Err,
	Def,
	Tex,
	Other,
	Include,
	IncludeCudaMainHeader,
	Type,
	Literal,
	NumericLiteral,
	Define,
	ExternShared,
	KernelLaunch,
	DeviceFunction,
}

impl Counter {
	/// Every category, in catalog order.
	pub const ALL: [Counter; 39] = [
		Counter::Error,
		Counter::Init,
		Counter::Version,
		Counter::Device,
		Counter::Context,
		Counter::Module,
		Counter::Memory,
		Counter::Addressing,
		Counter::Stream,
		Counter::Event,
		Counter::ExternalResourceInterop,
		Counter::StreamMemory,
		Counter::Execution,
		Counter::Graph,
		Counter::Occupancy,
		Counter::Texture,
		Counter::Surface,
		Counter::Peer,
		Counter::Graphics,
		Counter::Profiler,
		Counter::Thread,
		Counter::Complex,
		Counter::Library,
		Counter::Math,
		Counter::Cache,
		Counter::Exec,
		Counter::Err,
		Counter::Def,
		Counter::Tex,
		Counter::Other,
		Counter::Include,
		Counter::IncludeCudaMainHeader,
		Counter::Type,
		Counter::Literal,
		Counter::NumericLiteral,
		Counter::Define,
		Counter::ExternShared,
		Counter::KernelLaunch,
		Counter::DeviceFunction,
	];

	/// Get the stable key used for counters and report labels.
	pub fn as_str(&self) -> &'static str {
		match self {
			Counter::Error => "error",
			Counter::Init => "init",
			Counter::Version => "version",
			Counter::Device => "device",
			Counter::Context => "context",
			Counter::Module => "module",
			Counter::Memory => "memory",
			Counter::Addressing => "addressing",
			Counter::Stream => "stream",
			Counter::Event => "event",
			Counter::ExternalResourceInterop => "external_resource_interop",
			Counter::StreamMemory => "stream_memory",
			Counter::Execution => "execution",
			Counter::Graph => "graph",
			Counter::Occupancy => "occupancy",
			Counter::Texture => "texture",
			Counter::Surface => "surface",
			Counter::Peer => "peer",
			Counter::Graphics => "graphics",
			Counter::Profiler => "profiler",
			Counter::Thread => "thread",
			Counter::Complex => "complex",
			Counter::Library => "library",
			Counter::Math => "math",
			Counter::Cache => "cache",
			Counter::Exec => "exec",
			Counter::Err => "err",
			Counter::Def => "def",
			Counter::Tex => "tex",
			Counter::Other => "other",
			Counter::Include => "include",
			Counter::IncludeCudaMainHeader => "include_cuda_main_header",
			Counter::Type => "type",
			Counter::Literal => "literal",
			Counter::NumericLiteral => "numeric_literal",
			Counter::Define => "define",
			Counter::ExternShared => "extern_shared",
			Counter::KernelLaunch => "kernel_launch",
			Counter::DeviceFunction => "device_function",
		}
	}

	/// Include categories draw their rules from the include section of the table.
	pub fn is_include(&self) -> bool {
		matches!(self, Counter::Include | Counter::IncludeCudaMainHeader)
	}

	/// Whether this category contributes to the "API calls" aggregate.
	///
	/// Device functions, extern shared declarations and kernel launches are
	/// tallied by their own passes, not by the simple substitutions.
	pub fn is_api_call(&self) -> bool {
		!matches!(
			self,
			Counter::DeviceFunction | Counter::ExternShared | Counter::KernelLaunch
		)
	}
}

impl fmt::Display for Counter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Support status of a CUDA identifier in HIP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
	#[default]
	Supported,
	Deprecated,
	Unsupported,
}

/// One source-identifier to target-identifier mapping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MappingEntry {
	/// CUDA identifier (or include path), matched as a whole word.
	pub source: String,

	/// HIP replacement.
	pub target: String,

	/// Category this mapping is counted under.
	pub category: Counter,

	#[serde(default)]
	pub status: SupportStatus,
}

impl MappingEntry {
	pub fn is_unsupported(&self) -> bool {
		self.status == SupportStatus::Unsupported
	}

	pub fn is_deprecated(&self) -> bool {
		self.status == SupportStatus::Deprecated
	}
}

/// A device-side function known to the converter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceFunction {
	pub name: String,

	#[serde(default)]
	pub status: SupportStatus,
}

/// Runtime functions whose arguments need wrapping after renaming.
///
/// Each list names CUDA runtime functions by their source name and the
/// position of the argument that must be wrapped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HostFunctions {
	/// Device symbol passed as the first argument.
	#[serde(default, rename = "device-symbol-0")]
	pub device_symbol_0: Vec<String>,

	/// Device symbol passed as the second argument.
	#[serde(default, rename = "device-symbol-1")]
	pub device_symbol_1: Vec<String>,

	/// Function pointer passed as the first argument.
	#[serde(default, rename = "reinterpret-0")]
	pub reinterpret_0: Vec<String>,

	/// Function pointer passed as the second argument.
	#[serde(default, rename = "reinterpret-1")]
	pub reinterpret_1: Vec<String>,
}

/// The complete CUDA->HIP mapping table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MappingTable {
	/// Header include mappings.
	#[serde(default, rename = "include")]
	pub includes: Vec<MappingEntry>,

	/// CUDA runtime API functions.
	#[serde(default, rename = "runtime-function")]
	pub runtime_functions: Vec<MappingEntry>,

	/// Every other identifier mapping (types, enums, driver API, libraries).
	#[serde(default, rename = "rename")]
	pub renames: Vec<MappingEntry>,

	#[serde(default, rename = "device-function")]
	pub device_functions: Vec<DeviceFunction>,

	#[serde(default)]
	pub host_functions: HostFunctions,
}

impl MappingTable {
	/// All identifier renames in declaration order: runtime functions first.
	pub fn renames(&self) -> impl DoubleEndedIterator<Item = &MappingEntry> {
		self.runtime_functions.iter().chain(self.renames.iter())
	}

	/// Look up a runtime function by its CUDA name.
	pub fn runtime_function(&self, source: &str) -> Option<&MappingEntry> {
		self.runtime_functions.iter().find(|e| e.source == source)
	}

	/// Validate that every entry sits in a section matching its category.
	pub fn validate(&self) -> Result<(), HipifyError> {
		for entry in &self.includes {
			check_source(entry)?;
			if !entry.category.is_include() {
				return Err(HipifyError::InvalidMapping {
					source_name: entry.source.clone(),
					reason: format!("include entry uses non-include category '{}'", entry.category),
				});
			}
		}

		for entry in self.renames() {
			check_source(entry)?;
			if entry.category.is_include() {
				return Err(HipifyError::InvalidMapping {
					source_name: entry.source.clone(),
					reason: format!("rename entry uses include category '{}'", entry.category),
				});
			}
		}

		for func in &self.device_functions {
			if func.name.trim().is_empty() {
				return Err(HipifyError::InvalidMapping {
					source_name: func.name.clone(),
					reason: "empty device function name".to_string(),
				});
			}
		}

		Ok(())
	}
}

fn check_source(entry: &MappingEntry) -> Result<(), HipifyError> {
	if entry.source.trim().is_empty() {
		return Err(HipifyError::InvalidMapping {
			source_name: entry.source.clone(),
			reason: format!("empty source name (target '{}')", entry.target),
		});
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_counter_catalog_order_matches_keys() {
		assert_eq!(Counter::ALL.first().unwrap().as_str(), "error");
		assert_eq!(Counter::ALL.last().unwrap().as_str(), "device_function");

		// Catalog order is the declaration order.
		let mut sorted = Counter::ALL;
		sorted.sort();
		assert_eq!(sorted, Counter::ALL);
	}

	#[test]
	fn test_counter_keys_are_unique() {
		let mut keys: Vec<_> = Counter::ALL.iter().map(|c| c.as_str()).collect();
		keys.sort_unstable();
		keys.dedup();
		assert_eq!(keys.len(), Counter::ALL.len());
	}

	#[test]
	fn test_api_call_exclusions() {
		let excluded: Vec<_> = Counter::ALL.iter().filter(|c| !c.is_api_call()).collect();
		assert_eq!(
			excluded,
			vec![
				&Counter::ExternShared,
				&Counter::KernelLaunch,
				&Counter::DeviceFunction
			]
		);
	}

	#[test]
	fn test_renames_puts_runtime_functions_first() {
		let entry = |s: &str| MappingEntry {
			source: s.to_string(),
			target: s.replace("cuda", "hip"),
			category: Counter::Memory,
			status: SupportStatus::Supported,
		};
		let table = MappingTable {
			runtime_functions: vec![entry("cudaMalloc")],
			renames: vec![entry("cudaStream_t")],
			..Default::default()
		};

		let names: Vec<_> = table.renames().map(|e| e.source.as_str()).collect();
		assert_eq!(names, vec!["cudaMalloc", "cudaStream_t"]);
		assert!(table.runtime_function("cudaMalloc").is_some());
		assert!(table.runtime_function("cudaStream_t").is_none());
	}
}
