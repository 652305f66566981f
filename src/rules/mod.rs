//! Rule generation and rule matching for hipify.
//!
//! This module handles:
//! - Emitting rewrite rules and diagnostic lists from a mapping table
//! - The serializable rule program and its on-disk artifact
//! - Compiling sed-like rule expressions and applying them with hit counts

pub mod diagnostics;
pub mod host;
pub mod launch;
pub mod matcher;
pub mod program;
pub mod rewriter;
pub mod substitution;
pub mod whitelist;

pub use diagnostics::{Diagnostic, DiagnosticKind, DiagnosticLists, DiagnosticScanner};
pub use host::FunctionGroup;
pub use launch::{LAUNCH_SHAPES, LaunchShape};
pub use matcher::{CompiledProgram, CompiledRule, RuleHits, compile_rules};
pub use program::{
	PROGRAM_FILE_NAME, RewriteRule, RuleProgram, WrappedArg, emit_program, load_program,
};
pub use rewriter::{Substitution, sed_expr};
pub use whitelist::{PLACEHOLDER, Whitelist, builtin_whitelist};
