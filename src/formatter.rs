//! Serializes a merged module back into VBA source text.
//!
//! Each section becomes one block, trimmed and followed by a blank line.
//! A provenance comment naming the source module precedes the first block
//! of each run of blocks from the same source; `Option` blocks never get
//! one.

use std::fmt::Write;

use crate::merge::{Bucket, MergedModule};

/// Marker line written before blocks that come from a new source module.
pub const PROVENANCE_PREFIX: &str = "'*************** ";

/// Format a [`MergedModule`] into `.bas` text with `\n` line endings.
#[must_use]
pub fn format(module: &MergedModule) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Attribute VB_Name = \"{}\"", module.name);

    let mut current: Option<&str> = None;
    for (bucket, section) in module.sections() {
        let text = to_unix_line_endings(&section.text());
        let block = text.trim();
        if block.is_empty() {
            continue;
        }

        if bucket != Bucket::Option && section.origin.as_deref() != current {
            current = section.origin.as_deref();
            let origin = current.unwrap_or_default();
            out.push_str(PROVENANCE_PREFIX);
            out.push_str(module.module_name_of(origin));
            out.push('\n');
        }

        out.push_str(block);
        out.push_str("\n\n");
    }

    out
}

/// Drop every carriage return.
#[must_use]
pub fn to_unix_line_endings(text: &str) -> String {
    text.replace('\r', "")
}
