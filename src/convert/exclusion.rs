use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Directories and files that are never opened.
///
/// Entries are either relative (command line, matched against input paths
/// as given) or absolute (config files, resolved against the config's
/// directory). Matching compares path components, not canonicalized paths.
#[derive(Debug, Clone, Default)]
pub struct Exclusions {
	pub dirs: HashSet<PathBuf>,
	pub files: HashSet<PathBuf>,

	/// Relative inputs are also checked joined onto this directory.
	pub base: PathBuf,
}

impl Exclusions {
	pub fn new<D, F>(dirs: D, files: F) -> Self
	where
		D: IntoIterator,
		D::Item: Into<PathBuf>,
		F: IntoIterator,
		F::Item: Into<PathBuf>,
	{
		Exclusions {
			dirs: dirs.into_iter().map(Into::into).collect(),
			files: files.into_iter().map(Into::into).collect(),
			base: PathBuf::new(),
		}
	}

	pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
		self.base = base.into();
		self
	}

	pub fn is_empty(&self) -> bool {
		self.dirs.is_empty() && self.files.is_empty()
	}

	/// Check `path` as given, then resolved against [`Exclusions::base`].
	pub fn check(&self, path: &Path) -> Option<Exclusion> {
		if self.is_empty() {
			return None;
		}
		if let Some(reason) = is_excluded(path, self, is_walk_root) {
			return Some(reason);
		}
		if path.is_relative() && !self.base.as_os_str().is_empty() {
			return is_excluded(&self.base.join(path), self, is_walk_root);
		}
		None
	}
}

/// Why a file was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
	/// An ancestor directory is excluded.
	Directory(PathBuf),

	/// The file itself is excluded.
	File,
}

/// A skip notice for `file`.
pub struct SkipNotice<'a> {
	pub file: &'a Path,
	pub reason: &'a Exclusion,
}

impl fmt::Display for SkipNotice<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.reason {
			Exclusion::Directory(dir) => write!(
				f,
				"Skipping file: {} in excluded directory {}",
				self.file.display(),
				dir.display()
			),
			Exclusion::File => write!(f, "Skipping excluded file: {}", self.file.display()),
		}
	}
}

/// Where the ancestor walk stops: `""`, `"."` or a filesystem root.
pub fn is_walk_root(dir: &Path) -> bool {
	dir.as_os_str().is_empty() || dir == Path::new(".") || dir.parent().is_none()
}

/// Check `path` against the exclusion sets.
///
/// Walks the file's directory ancestry upward until `is_root` says stop.
/// Nothing is read from the filesystem.
pub fn is_excluded<R>(path: &Path, exclusions: &Exclusions, is_root: R) -> Option<Exclusion>
where
	R: Fn(&Path) -> bool,
{
	let mut dir = path.parent();
	while let Some(current) = dir {
		if is_root(current) {
			break;
		}
		if exclusions.dirs.contains(current) {
			return Some(Exclusion::Directory(current.to_path_buf()));
		}
		dir = current.parent();
	}

	if exclusions.files.contains(path) {
		return Some(Exclusion::File);
	}

	None
}

#[cfg(test)]
mod tests {
	use super::*;

	fn exclusions(dirs: &[&str], files: &[&str]) -> Exclusions {
		Exclusions::new(dirs.iter().copied(), files.iter().copied())
	}

	#[test]
	fn test_nested_directory_is_excluded() {
		let ex = exclusions(&["third_party"], &[]);
		assert_eq!(
			is_excluded(Path::new("third_party/cub/block.cu"), &ex, is_walk_root),
			Some(Exclusion::Directory(PathBuf::from("third_party")))
		);
		assert_eq!(is_excluded(Path::new("src/block.cu"), &ex, is_walk_root), None);
	}

	#[test]
	fn test_directory_matches_whole_ancestor_path() {
		let ex = exclusions(&["src/vendor"], &[]);
		assert!(is_excluded(Path::new("src/vendor/a/k.cu"), &ex, is_walk_root).is_some());
		assert!(is_excluded(Path::new("vendor/k.cu"), &ex, is_walk_root).is_none());
	}

	#[test]
	fn test_excluded_file() {
		let ex = exclusions(&[], &["src/legacy.cu"]);
		assert_eq!(
			is_excluded(Path::new("src/legacy.cu"), &ex, is_walk_root),
			Some(Exclusion::File)
		);
		assert_eq!(is_excluded(Path::new("src/kernel.cu"), &ex, is_walk_root), None);
	}

	#[test]
	fn test_walk_stops_at_injected_root() {
		let ex = exclusions(&["/work"], &[]);
		let path = Path::new("/work/project/k.cu");
		assert!(is_excluded(path, &ex, is_walk_root).is_some());
		assert!(is_excluded(path, &ex, |dir| dir == Path::new("/work/project")).is_none());
	}

	#[test]
	fn test_check_resolves_relative_inputs_against_base() {
		let ex = Exclusions::new(["/work/project/vendor"], ["/work/project/legacy.cu"])
			.with_base("/work/project/src/..");
		assert_eq!(ex.check(Path::new("vendor/k.cu")), None);

		let ex = ex.with_base("/work/project");
		assert_eq!(
			ex.check(Path::new("vendor/k.cu")),
			Some(Exclusion::Directory(PathBuf::from("/work/project/vendor")))
		);
		assert_eq!(ex.check(Path::new("legacy.cu")), Some(Exclusion::File));
		assert_eq!(ex.check(Path::new("src/k.cu")), None);
	}

	#[test]
	fn test_check_keeps_relative_entries_relative() {
		let ex = exclusions(&["third_party"], &[]).with_base("/work");
		assert!(ex.check(Path::new("third_party/k.cu")).is_some());
		assert!(ex.check(Path::new("/work/third_party/k.cu")).is_none());
		assert_eq!(Exclusions::default().check(Path::new("k.cu")), None);
	}

	#[test]
	fn test_walk_root_predicate() {
		assert!(is_walk_root(Path::new("")));
		assert!(is_walk_root(Path::new(".")));
		assert!(is_walk_root(Path::new("/")));
		assert!(!is_walk_root(Path::new("src")));
	}

	#[test]
	fn test_skip_notice() {
		let file = Path::new("ext/k.cu");
		let reason = Exclusion::Directory(PathBuf::from("ext"));
		assert_eq!(
			SkipNotice {
				file,
				reason: &reason
			}
			.to_string(),
			"Skipping file: ext/k.cu in excluded directory ext"
		);
		assert_eq!(
			SkipNotice {
				file,
				reason: &Exclusion::File
			}
			.to_string(),
			"Skipping excluded file: ext/k.cu"
		);
	}
}
