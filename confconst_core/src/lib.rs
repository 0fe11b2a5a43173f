//! `confconst_core` is the core library for confconst. It turns hierarchical
//! YAML configuration into named constants in generated source code, and
//! rewrites existing source when a regenerated constants file renames them.
//!
//! ## Generation Pipeline
//!
//! ```text
//! YAML document
//!   → Tree builder (mapping/sequence → TreeNode, `# prefix: X` annotations attached)
//!   → Flattener (depth-first leaves with their effective override)
//!   → Name generator (prefix + UpperCamelCase path segments, collision checked)
//!   → Code generator (Go const block or Rust `pub const` items)
//! ```
//!
//! ## Update Pipeline
//!
//! ```text
//! old constants file + new constants file
//!   → Constant parser (name → literal value)
//!   → Rename mapping (joined on value)
//!   → Source scanner (identifier occurrences outside literals and comments)
//!   → Rewrite (dry-run report, or backup + write)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: `confconst.toml` loading and the option structs for both
//!   entry points.
//! - [`project`]: Source and YAML file discovery, honoring `.gitignore` and
//!   exclude patterns.
//! - [`source_scanner`]: Lexical identifier scanning for Go and Rust source.
//!
//! ## Key Types
//!
//! - [`TreeNode`]: One key of the configuration hierarchy.
//! - [`FlattenResult`]: A leaf with its key path and effective override.
//! - [`ConstantMap`]: Constants parsed from a generated source file.
//! - [`RenameMapping`]: Old constant name → new constant name.
//! - [`UpdateReport`]: Substitutions found (and applied) by an update run.
//! - [`GenerateReport`]: Files written by a generate run.
//!
//! ## Override Annotations
//!
//! A comment of the form `# prefix: Name`, either directly above a key or
//! trailing it, replaces the generated name prefix for that key's subtree:
//!
//! ```yaml
//! Parent: # prefix: Override
//!   Child: value
//! ```
//!
//! generates the constant `OverrideChild` instead of `ParentChild`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confconst_core::GenerateOptions;
//! use confconst_core::UpdateOptions;
//! use confconst_core::generate_constants;
//! use confconst_core::update_constants;
//! use std::path::PathBuf;
//!
//! let options = GenerateOptions {
//! 	target: PathBuf::from("config"),
//! 	out: PathBuf::from("internal/config/constants.go"),
//! 	..GenerateOptions::default()
//! };
//! let report = generate_constants(&options).unwrap();
//! println!("{} constant(s) generated", report.constant_count());
//!
//! let mut options = UpdateOptions::new("old/constants.go", "internal/config/constants.go");
//! options.directories = vec![PathBuf::from(".")];
//! options.dry_run = true;
//! let report = update_constants(&options).unwrap();
//! println!("{} substitution(s) pending", report.substitution_count());
//! ```

pub use annotations::*;
pub use backup::*;
pub use codegen::*;
pub use config::*;
pub use constants::*;
pub use error::*;
pub use flatten::*;
pub use generate::*;
pub use project::*;
pub use source_scanner::*;
pub use tree::*;
pub use update::*;

mod annotations;
mod backup;
mod codegen;
pub mod config;
mod constants;
#[allow(unused_assignments)]
mod error;
mod flatten;
mod generate;
pub(crate) mod lexer;
pub mod project;
pub mod source_scanner;
mod tree;
mod update;
