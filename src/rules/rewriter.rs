use crate::error::{HipifyError, Result};
use regex::bytes::{Captures, Regex};

/// A compiled `s/pattern/replacement/flags` rule expression.
#[derive(Debug)]
pub struct Substitution {
	pub pattern: Regex,

	/// Expanded per match; `${N}` names capture group N.
	pub replacement: String,

	/// `g` flag: rewrite every match, not just the first.
	pub global: bool,
}

impl Substitution {
	/// Parse a rule expression.
	///
	/// The character after `s` is the delimiter; a backslash before it
	/// makes it literal. Flags other than `g` are ignored.
	pub fn parse(input: &str) -> Result<Self> {
		let Some(body) = input.strip_prefix('s') else {
			return Err(invalid(input, "rule expression must start with 's'"));
		};
		let Some(delimiter) = body.chars().next() else {
			return Err(invalid(input, "rule expression has no delimiter"));
		};

		let mut fields = split_fields(&body[delimiter.len_utf8()..], delimiter).into_iter();
		let (Some(pattern_text), Some(replacement)) = (fields.next(), fields.next()) else {
			return Err(invalid(input, "rule expression needs a pattern and a replacement"));
		};
		let global = fields.next().is_some_and(|flags| flags.contains('g'));

		let pattern = Regex::new(&pattern_text).map_err(|source| HipifyError::InvalidRegex {
			pattern: pattern_text,
			source,
		})?;

		Ok(Substitution {
			pattern,
			replacement,
			global,
		})
	}

	/// Rewrite every match.
	pub fn apply(&self, input: &[u8]) -> Vec<u8> {
		self.apply_counted(input, |_, _| true).0
	}

	/// Apply this substitution, returning the rewritten text and the number
	/// of matches that were rewritten.
	///
	/// Works on raw bytes so input that is not UTF-8 passes through
	/// untouched. `accept` sees the bytes preceding each match and its
	/// captures; a rejected match is left as it was and not counted.
	pub fn apply_counted<F>(&self, input: &[u8], mut accept: F) -> (Vec<u8>, usize)
	where
		F: FnMut(&[u8], &Captures) -> bool,
	{
		let mut count = 0;
		let limit = if self.global { 0 } else { 1 };

		let rewritten = self.pattern.replacen(input, limit, |caps: &Captures| {
			let whole = caps.get_match();
			if !accept(&input[..whole.start()], caps) {
				return whole.as_bytes().to_vec();
			}
			count += 1;
			let mut dst = Vec::new();
			caps.expand(self.replacement.as_bytes(), &mut dst);
			dst
		});

		(rewritten.into_owned(), count)
	}
}

fn invalid(input: &str, message: &str) -> HipifyError {
	HipifyError::InvalidRegex {
		pattern: input.to_string(),
		source: regex::Error::Syntax(message.to_string()),
	}
}

/// Split on unescaped `delimiter`. `\<delimiter>` becomes the bare
/// delimiter; every other backslash is kept for the regex engine.
fn split_fields(input: &str, delimiter: char) -> Vec<String> {
	let mut fields = Vec::new();
	let mut field = String::new();
	let mut chars = input.chars().peekable();

	while let Some(c) = chars.next() {
		match c {
			'\\' if chars.peek() == Some(&delimiter) => {
				field.push(delimiter);
				chars.next();
			}
			c if c == delimiter => fields.push(std::mem::take(&mut field)),
			c => field.push(c),
		}
	}

	fields.push(field);
	fields
}

/// Build a global sed-style expression, escaping the `/` delimiter in both halves.
pub fn sed_expr(pattern: &str, replacement: &str) -> String {
	format!(
		"s/{}/{}/g",
		pattern.replace('/', "\\/"),
		replacement.replace('/', "\\/")
	)
}
