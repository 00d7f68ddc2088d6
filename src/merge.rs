//! Combine several VBA modules into one.
//!
//! Every source is renamed, classified and validated on its own, then the
//! sections of all sources are grouped into a fixed sequence of buckets:
//!
//! 1. `Option` statements, taken from the first source only,
//! 2. `Declare` statements,
//! 3. module-level variables and constants,
//! 4. everything else (enums, types, stray code),
//! 5. procedures.
//!
//! `Attribute` lines are dropped; the formatter writes a fresh
//! `Attribute VB_Name` header.

use std::mem;

use indexmap::IndexMap;

use crate::bundle::SourceBundle;
use crate::classifier::{Section, SectionKind, SectionPatch, classify, classify_origin};
use crate::formatter;
use crate::rename::{ModuleNameError, qualify_private_symbols, require_module_name};
use crate::token::{Token, TokenKind, end_of_line};

/// Errors raised while merging modules.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    /// A source without an `Attribute VB_Name` line.
    #[error(transparent)]
    ModuleName(#[from] ModuleNameError),
    /// Two sources disagree on their `Option` statements.
    #[error("{}", conflict_message(.first_origin, .first, .origin, .options))]
    OptionConflict {
        first_origin: String,
        first: Vec<String>,
        origin: String,
        options: Vec<String>,
    },
    /// Nothing to merge.
    #[error("no source modules to merge")]
    NoSources,
}

fn conflict_message(first_origin: &str, first: &[String], origin: &str, options: &[String]) -> String {
    format!(
        "Options must be equal across aggregated bas files, got conflict:\n{}\n{}",
        describe_options(first_origin, first),
        describe_options(origin, options)
    )
}

fn describe_options(origin: &str, options: &[String]) -> String {
    let statements: Vec<String> = options.iter().map(|o| format!("    {o}")).collect();
    format!("  {origin}:\n{}", statements.join("\n"))
}

/// Output group of the merged module, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Option,
    Declare,
    Global,
    Other,
    Function,
}

impl Bucket {
    pub const ALL: [Self; 5] = [
        Self::Option,
        Self::Declare,
        Self::Global,
        Self::Other,
        Self::Function,
    ];

    /// Bucket receiving sections of `kind`; `None` for dropped kinds.
    #[must_use]
    pub const fn of(kind: SectionKind) -> Option<Self> {
        match kind {
            SectionKind::Attribute => None,
            SectionKind::Option => Some(Self::Option),
            SectionKind::Declare => Some(Self::Declare),
            SectionKind::Global => Some(Self::Global),
            SectionKind::Function => Some(Self::Function),
            SectionKind::Enum
            | SectionKind::Type
            | SectionKind::Conditional
            | SectionKind::Unknown => Some(Self::Other),
        }
    }
}

/// Bucketed sections ready to be written out by [`formatter::format`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedModule {
    /// Name written to the `Attribute VB_Name` header.
    pub name: String,
    /// Declared module name of every origin, in source order.
    pub module_names: IndexMap<String, String>,
    /// Sections grouped by bucket, in [`Bucket::ALL`] order.
    pub buckets: IndexMap<Bucket, Vec<Section>>,
}

impl MergedModule {
    /// Module name declared by `origin`, or the origin itself if unknown.
    #[must_use]
    pub fn module_name_of<'a>(&'a self, origin: &'a str) -> &'a str {
        self.module_names.get(origin).map_or(origin, String::as_str)
    }

    pub fn sections(&self) -> impl Iterator<Item = (Bucket, &Section)> {
        self.buckets
            .iter()
            .flat_map(|(bucket, sections)| sections.iter().map(move |s| (*bucket, s)))
    }
}

/// Merge `bundle` into module text named `module_name`, or after the
/// first source's module when `None`.
pub fn merge(bundle: SourceBundle, module_name: Option<&str>) -> Result<String, MergeError> {
    Ok(formatter::format(&assemble(bundle, module_name)?))
}

/// Run every merge step except serialization.
pub fn assemble(bundle: SourceBundle, module_name: Option<&str>) -> Result<MergedModule, MergeError> {
    if bundle.is_empty() {
        return Err(MergeError::NoSources);
    }

    let mut module_names = IndexMap::with_capacity(bundle.len());
    let mut origins = Vec::with_capacity(bundle.len());

    for (origin, mut tokens) in bundle {
        let name = require_module_name(&tokens, &origin)?;
        let renamed = qualify_private_symbols(&mut tokens, &name);
        let mut sections = classify_origin(&tokens, &origin);
        for section in &mut sections {
            resolve_conditional(section);
        }

        log::debug!(
            "{origin}: module {name}, {renamed} private references renamed, {} sections",
            sections.len()
        );

        module_names.insert(origin.clone(), name);
        origins.push((origin, sections));
    }

    check_options(&origins)?;

    let mut buckets: IndexMap<Bucket, Vec<Section>> =
        Bucket::ALL.into_iter().map(|b| (b, Vec::new())).collect();

    for (index, (_, sections)) in origins.into_iter().enumerate() {
        for section in fold_unknowns(sections) {
            match Bucket::of(section.kind) {
                Some(Bucket::Option) if index > 0 => {}
                Some(bucket) => buckets.entry(bucket).or_default().push(section),
                None => {}
            }
        }
    }

    let name = match module_name {
        Some(name) => name.to_string(),
        None => module_names
            .values()
            .next()
            .cloned()
            .ok_or(MergeError::NoSources)?,
    };

    Ok(MergedModule {
        name,
        module_names,
        buckets,
    })
}

/// Give a conditional section the kind of the first construct inside it.
/// A block wrapping two alternative `Declare` lines becomes a declare.
fn resolve_conditional(section: &mut Section) {
    if section.kind != SectionKind::Conditional {
        return;
    }
    if let Some(kind) = conditional_proxy(&section.tokens) {
        section.apply(SectionPatch {
            kind: Some(kind),
            ..SectionPatch::default()
        });
    }
}

/// Kind of the first classified construct after the opening directive
/// line of a conditional block.
#[must_use]
pub fn conditional_proxy(tokens: &[Token]) -> Option<SectionKind> {
    let inner = &tokens[end_of_line(tokens, 0)..];
    classify(inner)
        .into_iter()
        .map(|section| match section.kind {
            SectionKind::Conditional => {
                conditional_proxy(&section.tokens).unwrap_or(SectionKind::Conditional)
            }
            kind => kind,
        })
        .find(|&kind| kind != SectionKind::Unknown)
}

/// Canonical text of one `Option` statement: words lowercased, comments
/// and blanks dropped.
#[must_use]
pub fn normalize_option(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| {
            !matches!(
                t.kind,
                TokenKind::Space | TokenKind::Comment | TokenKind::Newline
            )
        })
        .map(|t| t.text.trim().to_lowercase())
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sorted, normalized `Option` statements of one source.
#[must_use]
pub fn option_statements(sections: &[Section]) -> Vec<String> {
    let mut options: Vec<String> = sections
        .iter()
        .filter(|s| s.kind == SectionKind::Option)
        .map(|s| normalize_option(&s.tokens))
        .collect();
    options.sort();
    options
}

fn check_options(origins: &[(String, Vec<Section>)]) -> Result<(), MergeError> {
    let mut lists = origins
        .iter()
        .map(|(origin, sections)| (origin, option_statements(sections)));

    let Some((first_origin, first)) = lists.next() else {
        return Ok(());
    };

    for (origin, options) in lists {
        if options != first {
            return Err(MergeError::OptionConflict {
                first_origin: first_origin.clone(),
                first,
                origin: origin.clone(),
                options,
            });
        }
    }
    Ok(())
}

/// Attach every unknown section to the section after it. A trailing
/// unknown section has nothing to attach to and is kept.
fn fold_unknowns(sections: Vec<Section>) -> Vec<Section> {
    let mut folded = Vec::with_capacity(sections.len());
    let mut carry: Vec<Token> = Vec::new();
    let mut sections = sections.into_iter().peekable();

    while let Some(mut section) = sections.next() {
        if !carry.is_empty() {
            section.apply(SectionPatch {
                prefix: Some(mem::take(&mut carry)),
                ..SectionPatch::default()
            });
        }
        if section.kind == SectionKind::Unknown && sections.peek().is_some() {
            carry = section.tokens;
        } else {
            folded.push(section);
        }
    }

    folded
}
