//! VBA module lexer, section classifier and merger.
//!
//! Tokenizes VBA source without a grammar, locates constructs with a small
//! token pattern language, classifies modules into typed sections and
//! merges many modules into one with private symbols kept apart.
//!
//! # Quick start
//!
//! ## Classify a module
//!
//! ```
//! use vba_packager::{SectionKind, classify, tokenize};
//!
//! let tokens = tokenize("Option Explicit\nPrivate Sub Run()\nEnd Sub\n");
//! let kinds: Vec<_> = classify(&tokens).iter().map(|s| s.kind).collect();
//! assert_eq!(
//!     kinds,
//!     [SectionKind::Option, SectionKind::Function, SectionKind::Unknown]
//! );
//! ```
//!
//! ## Merge modules
//!
//! ```
//! use vba_packager::{SourceBundle, merge};
//!
//! let bundle = SourceBundle::new()
//!     .source("a.bas", "Attribute VB_Name = \"A\"\nPrivate Function Helper()\nEnd Function\n")
//!     .source("b.bas", "Attribute VB_Name = \"B\"\nPrivate Function Helper()\nEnd Function\n");
//!
//! let merged = merge(bundle, Some("Library")).unwrap();
//! assert!(merged.starts_with("Attribute VB_Name = \"Library\"\n"));
//! assert!(merged.contains("Private Function A_Helper()"));
//! assert!(merged.contains("Private Function B_Helper()"));
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod bundle;
pub mod casing;
pub mod classifier;
pub mod formatter;
pub mod keywords;
pub mod lexer;
pub mod matcher;
pub mod merge;
pub mod namespace;
pub mod rename;
pub mod token;

pub use bundle::SourceBundle;
pub use casing::{CaseStyle, CasingFixer, UnknownCaseStyle};
pub use classifier::{Section, SectionKind, SectionPatch, classify, classify_origin};
pub use formatter::format;
pub use lexer::tokenize;
pub use matcher::{Pattern, match_tokens};
pub use merge::{Bucket, MergeError, MergedModule, assemble, merge};
pub use namespace::{NamespacedClass, namespace_declarations, namespace_modules};
pub use rename::{ModuleNameError, RenameError, RenameRules, Renames, module_name, rename_bundle};
pub use token::{Directive, Token, TokenKind, tokens_to_string};

/// Unified error type for everything that can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A merge error.
    #[error("{0}")]
    Merge(#[from] MergeError),
    /// A module without a name.
    #[error("{0}")]
    ModuleName(#[from] ModuleNameError),
    /// A failed bundle-wide rename.
    #[error("{0}")]
    Rename(#[from] RenameError),
    /// An unsupported case style.
    #[error("{0}")]
    CaseStyle(#[from] UnknownCaseStyle),
}

/// Merge `(origin, source text)` pairs in one step.
pub fn merge_sources<K, V>(sources: impl IntoIterator<Item = (K, V)>, module_name: Option<&str>) -> Result<String, Error>
where
    K: Into<String>,
    V: AsRef<str>,
{
    Ok(merge(sources.into_iter().collect(), module_name)?)
}
