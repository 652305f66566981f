//! Hipify - compile CUDA->HIP mapping tables into rewrite rules and convert
//! CUDA sources with them.
//!
//! This library provides the core functionality for hipify, including:
//! - Mapping table parsing and validation
//! - Rule generation: substitutions, kernel launches, host function
//!   argument wrapping and diagnostic name lists
//! - Compiling and applying a rule program with conversion statistics
//! - Configuration file parsing and cascade discovery
//!
//! # Example
//!
//! ```no_run
//! use hipify_cli::convert::{Options, convert_source};
//! use hipify_cli::mapping::default_mapping_table;
//! use hipify_cli::rules::{CompiledProgram, RuleProgram};
//!
//! let table = default_mapping_table().unwrap();
//! let program = CompiledProgram::compile(&RuleProgram::from_table(&table)).unwrap();
//!
//! let outcome = convert_source(
//!     &program,
//!     &Options::default(),
//!     "saxpy.cu",
//!     b"saxpy<<<blocks, threads>>>(n, a, x, y);\n",
//! );
//! print!("{}", String::from_utf8_lossy(&outcome.output.unwrap_or_default()));
//! ```

pub mod config;
pub mod convert;
pub mod error;
pub mod mapping;
pub mod rules;
pub mod stats;

pub use error::{HipifyError, Result};

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Safe to call multiple times. Enable with `RUST_LOG=hipify_cli=debug`.
/// Events go to stderr so they never mix with converted output.
pub fn init_tracing() {
	TRACING_INIT.call_once(|| {
		use tracing_subscriber::{EnvFilter, fmt, prelude::*};

		// Only initialize if RUST_LOG is set
		if std::env::var("RUST_LOG").is_ok() {
			let filter = EnvFilter::from_default_env();
			tracing_subscriber::registry()
				.with(
					fmt::layer()
						.with_writer(std::io::stderr)
						.with_target(true)
						.with_level(true),
				)
				.with(filter)
				.init();
		}
	});
}
