use crate::error::{HipifyError, Result};
use regex::bytes::Regex;
use std::borrow::Cow;

/// Inert text substituted for whitelisted identifiers before diagnostics run.
pub const PLACEHOLDER: &str = "ZAP";

/// `cuda[A-Z]` identifiers common in CUDA sources that are not CUDA API.
const BUILTIN: &[&str] = &[
	"cudaCloverField",
	"cudaColorSpinorField",
	"cudaCpsGauge",
	"cudaDevice",
	"cudaDeviceId",
	"cudaDevice_t",
	"cudaDevices",
	"cudaDimBlock",
	"cudaDimGrid",
	"cudaEigValueSet",
	"cudaEigVecSet",
	"cudaFatLink",
	"cudaForce",
	"cudaForce_ex",
	"cudaGauge",
	"cudaGaugeField",
	"cudaGaugeTemp",
	"cudaGauge_ex",
	"cudaGradInput",
	"cudaGradOutput",
	"cudaGridDim",
	"cudaIDs",
	"cudaInForce",
	"cudaInGauge",
	"cudaInGaugeEx",
	"cudaInLink",
	"cudaInLinkEx",
	"cudaIndices",
	"cudaInput",
	"cudaLongLink",
	"cudaLongLinkOprod",
	"cudaLongLinkOprod_ex",
	"cudaMemcpys",
	"cudaMom",
	"cudaOprod",
	"cudaOprod_ex",
	"cudaOutForce",
	"cudaOutGauge",
	"cudaOutput",
	"cudaParam",
	"cudaQdpGauge",
	"cudaQuark",
	"cudaResult",
	"cudaRitzVectors",
	"cudaSiteLink",
	"cudaSpinor",
	"cudaSpinorOut",
	"cudaStaple",
	"cudaULink",
	"cudaUnitarizedLink",
];

/// The built-in whitelist as owned strings.
pub fn builtin_whitelist() -> Vec<String> {
	BUILTIN.iter().map(|w| w.to_string()).collect()
}

/// Identifiers exempt from "looks unconverted" diagnostics.
#[derive(Debug)]
pub struct Whitelist {
	words: Vec<String>,
	regex: Option<Regex>,
}

impl Whitelist {
	/// Build a whitelist from identifiers; blank entries are ignored.
	pub fn new<I, S>(words: I) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let mut words: Vec<String> = words
			.into_iter()
			.map(Into::into)
			.map(|w| w.trim().to_string())
			.filter(|w| !w.is_empty())
			.collect();
		words.sort();
		words.dedup();

		let regex = if words.is_empty() {
			None
		} else {
			let alternation = words
				.iter()
				.map(|w| regex::escape(w))
				.collect::<Vec<_>>()
				.join("|");
			let pattern = format!(r"\b(?:{alternation})\b");
			Some(
				Regex::new(&pattern)
					.map_err(|source| HipifyError::InvalidRegex { pattern, source })?,
			)
		};

		Ok(Whitelist { words, regex })
	}

	pub fn words(&self) -> &[String] {
		&self.words
	}

	pub fn contains(&self, word: &str) -> bool {
		self.words.binary_search_by(|w| w.as_str().cmp(word)).is_ok()
	}

	/// Replace every whitelisted identifier in `line` with [`PLACEHOLDER`].
	pub fn sanitize<'a>(&self, line: &'a [u8]) -> Cow<'a, [u8]> {
		match &self.regex {
			Some(regex) => regex.replace_all(line, PLACEHOLDER.as_bytes()),
			None => Cow::Borrowed(line),
		}
	}
}
