//! Turn standard modules into classes reached through a namespace object.
//!
//! Each `.bas` module `M` becomes a class `z__M`, and a declaration module
//! `z__NameSpaces` holds one `Public M As New z__M` per class. References
//! from other modules to a public symbol `S` of `M` are rewritten to
//! `M.S`, so callers keep working once the module is a class. Existing
//! class modules (`.cls` origins) only get their references qualified.
//!
//! A class name cut to fit the editor's limit carries the full module name
//! in a `'zebra NameSpace <name>` comment below its attributes.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;
use std::sync::LazyLock;

use crate::bundle::{SourceBundle, is_class_module};
use crate::matcher::{Pattern, match_tokens};
pub use crate::rename::MAX_MODULE_NAME_LEN;
use crate::rename::{ModuleNameError, require_module_name};
use crate::token::{Token, TokenKind, tokens_to_string};

/// Prefix of generated class names.
pub const CLASS_PREFIX: &str = "z__";
/// Name of the module declaring one namespace object per class.
pub const NAMESPACE_MODULE: &str = "z__NameSpaces";
/// Comment prefix recording the full module name of a shortened class.
pub const NAMESPACE_ANNOTATION: &str = "'zebra NameSpace ";

const SHORTENED_STEM_LEN: usize = 28;

static PUBLIC_SYMBOLS: LazyLock<[Pattern; 3]> = LazyLock::new(|| {
    [
        Pattern::new("[public|global] [static] [declare] [ptrsafe] function|sub|enum|type .*"),
        Pattern::new("public|global const .*"),
        Pattern::new("[public] [static] property get|let|set .*"),
    ]
});

/// A module rewritten as a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedClass {
    /// Original module name, used as the namespace object's name.
    pub module: String,
    /// Origin key of the module in the input bundle.
    pub origin: String,
    /// `z__` class name, shortened to fit the editor's limit.
    pub class_name: String,
    /// Complete `.cls` text.
    pub source: String,
    /// `false` for a class module that was only qualified; it gets no
    /// namespace object.
    pub converted: bool,
}

/// Remove every `Attribute VB_Name = "..."` line.
#[must_use]
pub fn strip_module_header(tokens: &[Token]) -> Vec<Token> {
    tokens
        .split_inclusive(Token::is_newline)
        .filter(|line| {
            !(line.iter().any(|t| t.is_word("attribute")) && line.iter().any(|t| t.is_word("vb_name")))
        })
        .flatten()
        .cloned()
        .collect()
}

/// Class file header for a non-creatable, exposed class.
#[must_use]
pub fn class_header(class_name: &str) -> String {
    let mut header = String::from("VERSION 1.0 CLASS\nBEGIN\n  MultiUse = -1  'True\nEND\n");
    let _ = write!(
        header,
        "Attribute VB_Name = \"{class_name}\"\n\
         Attribute VB_GlobalNameSpace = False\n\
         Attribute VB_Creatable = False\n\
         Attribute VB_PredeclaredId = False\n\
         Attribute VB_Exposed = True\n"
    );
    header
}

/// Fit `name` into the editor's module name limit.
///
/// Too-long names are cut and given a three-digit counter, choosing the
/// first one not in `taken`. Names of exactly the limit that already end in
/// three digits are treated the same way so they cannot collide with a
/// generated name. The returned name is added to `taken`.
pub fn shorten_module_name(name: &str, taken: &mut HashSet<String>) -> String {
    let len = name.chars().count();
    let digit_suffix = name
        .chars()
        .rev()
        .take(3)
        .filter(char::is_ascii_digit)
        .count()
        == 3;

    if len < MAX_MODULE_NAME_LEN || (len == MAX_MODULE_NAME_LEN && !digit_suffix) {
        taken.insert(name.to_string());
        return name.to_string();
    }

    let stem: String = name.chars().take(SHORTENED_STEM_LEN).collect();
    let mut suffix = 1;
    loop {
        let candidate = format!("{stem}{suffix:03}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        suffix += 1;
    }
}

/// Full module name from a `'zebra NameSpace <name>` comment, if any.
#[must_use]
pub fn annotated_namespace(tokens: &[Token]) -> Option<&str> {
    tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comment)
        .find_map(|t| {
            let rest = t.text.strip_prefix('\'')?.trim_start();
            let rest = strip_word(rest, "zebra")?;
            let name = strip_word(rest, "namespace")?.trim_end();
            (!name.is_empty()).then_some(name)
        })
}

fn strip_word<'a>(text: &'a str, word: &str) -> Option<&'a str> {
    let head = text.get(..word.len())?;
    head.eq_ignore_ascii_case(word)
        .then(|| text[word.len()..].trim_start())
}

/// Public symbols a module exports, spelled as defined.
#[must_use]
pub fn public_symbols(tokens: &[Token]) -> Vec<String> {
    let mut found: Vec<(usize, &str)> = PUBLIC_SYMBOLS
        .iter()
        .flat_map(|pattern| match_tokens(tokens, pattern, true))
        .map(|(_, end)| end - 1)
        .filter(|&i| tokens[i].kind == TokenKind::Name)
        .map(|i| (i, tokens[i].text.as_str()))
        .collect();
    found.sort_by_key(|&(i, _)| i);
    found.into_iter().map(|(_, name)| name.to_string()).collect()
}

struct Export {
    module: String,
    origin: String,
    name: String,
}

/// Convert every module of `bundle` into a namespaced class.
pub fn namespace_modules(bundle: &SourceBundle) -> Result<Vec<NamespacedClass>, ModuleNameError> {
    let mut exports: HashMap<String, Export> = HashMap::new();
    let mut modules = Vec::with_capacity(bundle.len());

    let mut taken = HashSet::new();

    for (origin, tokens) in bundle {
        let module = require_module_name(tokens, origin)?;
        let class = is_class_module(origin);
        if class {
            taken.insert(module.clone());
            modules.push((origin, module, tokens.clone(), class));
            continue;
        }
        for name in public_symbols(tokens) {
            let key = name.to_lowercase();
            if let Some(previous) = exports.get(&key) {
                if previous.origin != *origin {
                    log::warn!(
                        "{name} is public in both {} and {module}; keeping {}",
                        previous.module,
                        previous.module
                    );
                }
                continue;
            }
            exports.insert(
                key,
                Export {
                    module: module.clone(),
                    origin: origin.clone(),
                    name,
                },
            );
        }
        modules.push((origin, module, tokens.clone(), class));
    }

    let mut classes = Vec::with_capacity(modules.len());

    for (origin, module, mut tokens, class) in modules {
        let qualified = qualify_references(&mut tokens, origin, &exports);

        if class {
            log::debug!("{origin}: class {module}, {qualified} references qualified");
            classes.push(NamespacedClass {
                class_name: module.clone(),
                module,
                origin: origin.clone(),
                source: tokens_to_string(&tokens),
                converted: false,
            });
            continue;
        }

        let full_name = format!("{CLASS_PREFIX}{module}");
        let class_name = shorten_module_name(&full_name, &mut taken);

        log::debug!("{origin}: {module} -> {class_name}, {qualified} references qualified");

        let mut source = class_header(&class_name);
        if class_name != full_name {
            let _ = writeln!(source, "{NAMESPACE_ANNOTATION}{module}");
        }
        source.push_str(&tokens_to_string(&strip_module_header(&tokens)));
        classes.push(NamespacedClass {
            module,
            origin: origin.clone(),
            class_name,
            source,
            converted: true,
        });
    }

    Ok(classes)
}

/// Prefix references to other modules' exports with their module name.
fn qualify_references(tokens: &mut [Token], origin: &str, exports: &HashMap<String, Export>) -> usize {
    let mut qualified = 0;
    for i in 0..tokens.len() {
        if tokens[i].kind != TokenKind::Name || is_member_access(tokens, i) {
            continue;
        }
        if let Some(export) = exports.get(&tokens[i].text.to_lowercase()) {
            if export.origin != origin {
                tokens[i].text = format!("{}.{}", export.module, export.name);
                qualified += 1;
            }
        }
    }
    qualified
}

fn is_member_access(tokens: &[Token], index: usize) -> bool {
    index > 0 && tokens[index - 1].kind == TokenKind::Unknown && tokens[index - 1].text == "."
}

/// Source of the [`NAMESPACE_MODULE`] declaring one object per class.
#[must_use]
pub fn namespace_declarations(classes: &[NamespacedClass]) -> String {
    let mut out = format!("Attribute VB_Name = \"{NAMESPACE_MODULE}\"\nOption Explicit\n\n");
    for class in classes.iter().filter(|c| c.converted) {
        let _ = writeln!(out, "Public {} As New {}", class.module, class.class_name);
    }
    out
}
