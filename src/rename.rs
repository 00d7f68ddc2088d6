//! Module names and identifier renaming.
//!
//! Three kinds of renaming live here: per-module qualification of private
//! symbols for merging, user [`RenameRules`] applied to every name of a
//! bundle, and the `z_` prefix given to class modules so they sort apart
//! from generated classes.

use std::fmt;
use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;

use crate::bundle::{SourceBundle, is_class_module};
use crate::matcher::{Pattern, match_tokens};
use crate::token::{Token, TokenKind, end_of_line};

/// Longest module name the VBA editor accepts.
pub const MAX_MODULE_NAME_LEN: usize = 31;
/// Prefix given to class module names by [`class_renames`].
pub const CLASS_RENAME_PREFIX: &str = "z_";

static MODULE_NAME: LazyLock<Pattern> =
    LazyLock::new(|| Pattern::new("attribute vb_name = \" .*"));

static PRIVATE_SYMBOLS: LazyLock<[Pattern; 3]> = LazyLock::new(|| {
    [
        Pattern::new("private [static] function|sub|enum|const|type .*"),
        Pattern::new("private [static] property get|let|set .*"),
        Pattern::new("private declare [ptrsafe] function|sub .*"),
    ]
});

static PRIVATE_DECLARATIONS: LazyLock<[Pattern; 2]> = LazyLock::new(|| {
    [
        Pattern::new("private [withevents] .*"),
        Pattern::new("[private] const .*"),
    ]
});

/// A module without an `Attribute VB_Name = "..."` line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("missing `Attribute VB_Name = \"...\"` declaration in {origin}")]
pub struct ModuleNameError {
    pub origin: String,
}

/// Failure of a bundle-wide rename.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenameError {
    #[error(transparent)]
    ModuleName(#[from] ModuleNameError),
    #[error("cannot rename class {name} in {origin}: {renamed} is longer than 31 characters")]
    ClassNameTooLong {
        origin: String,
        name: String,
        renamed: String,
    },
}

/// The name declared by the module's `Attribute VB_Name` line.
#[must_use]
pub fn module_name(tokens: &[Token]) -> Option<&str> {
    match_tokens(tokens, &MODULE_NAME, true)
        .map(|(_, end)| &tokens[end - 1])
        .find(|token| token.kind == TokenKind::Name)
        .map(|token| token.text.as_str())
}

/// [`module_name`], failing with the origin in the error.
pub fn require_module_name(tokens: &[Token], origin: &str) -> Result<String, ModuleNameError> {
    module_name(tokens)
        .map(str::to_string)
        .ok_or_else(|| ModuleNameError {
            origin: origin.to_string(),
        })
}

/// Identifiers a module keeps to itself, in definition order, each
/// spelled as at its first definition.
///
/// These are the names of `Private` functions, subs, properties, enums,
/// types and declares, every variable of a `Private` declaration line and
/// every constant of a `Const` line not marked `Public` or `Global`.
#[must_use]
pub fn private_symbols(tokens: &[Token]) -> Vec<String> {
    let procedures = PRIVATE_SYMBOLS
        .iter()
        .flat_map(|pattern| match_tokens(tokens, pattern, true))
        .map(|(_, end)| end - 1);
    let declarations = PRIVATE_DECLARATIONS
        .iter()
        .flat_map(|pattern| match_tokens(tokens, pattern, true))
        .filter(|&(_, end)| tokens[end - 1].kind == TokenKind::Name)
        .flat_map(|(_, end)| declarators(tokens, end - 1));

    let mut found: Vec<(usize, &str)> = procedures
        .chain(declarations)
        .filter(|&i| tokens[i].kind == TokenKind::Name)
        .map(|i| (i, tokens[i].text.as_str()))
        .collect();
    found.sort_by_key(|&(i, _)| i);

    let mut seen = IndexMap::new();
    for (_, name) in found {
        seen.entry(name.to_ascii_lowercase()).or_insert(name);
    }
    seen.into_values().map(str::to_string).collect()
}

/// `first` plus the first token of every later comma-separated declarator
/// on its logical line. Commas inside parentheses do not count.
fn declarators(tokens: &[Token], first: usize) -> Vec<usize> {
    let line_end = end_of_line(tokens, first);
    let mut found = vec![first];
    let mut depth = 0usize;

    for (i, token) in tokens.iter().enumerate().take(line_end).skip(first + 1) {
        match token.text.as_str() {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            "," if depth == 0 => found.extend(next_word(tokens, i + 1, line_end)),
            _ => {}
        }
    }
    found
}

/// Case-insensitive identifier rename table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Renames {
    names: IndexMap<String, String>,
}

impl Renames {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, from: &str, to: impl Into<String>) {
        self.names.insert(from.to_ascii_lowercase(), to.into());
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// `(lowercased name, replacement)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.names.iter().map(|(from, to)| (from.as_str(), to.as_str()))
    }

    /// Rewrite every [`TokenKind::Name`] token found in the table.
    /// Returns the number of tokens changed.
    pub fn apply(&self, tokens: &mut [Token]) -> usize {
        let mut changed = 0;
        for token in tokens.iter_mut().filter(|t| t.kind == TokenKind::Name) {
            if let Some(to) = self.get(&token.text) {
                if token.text != to {
                    token.text = to.to_string();
                    changed += 1;
                }
            }
        }
        changed
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Renames {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut renames = Self::new();
        for (from, to) in iter {
            renames.insert(from.as_ref(), to);
        }
        renames
    }
}

type Predicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;
type Rewrite = Arc<dyn Fn(&str) -> String + Send + Sync>;

#[derive(Clone)]
enum Selector {
    Exact(String),
    Matching(Predicate),
}

#[derive(Clone)]
struct Rule {
    selector: Selector,
    rewrite: Rewrite,
}

impl Rule {
    fn selects(&self, name: &str) -> bool {
        match &self.selector {
            Selector::Exact(word) => word.eq_ignore_ascii_case(name),
            Selector::Matching(predicate) => predicate(name),
        }
    }
}

/// Ordered user rename rules over identifiers.
///
/// A rule selects names either exactly (ignoring case) or with a
/// predicate, and maps each selected name to its replacement. The first
/// rule that selects a name decides it.
///
/// ```
/// use vba_packager::{RenameRules, tokenize, tokens_to_string};
///
/// let rules = RenameRules::new()
///     .exact("OldApi", "NewApi")
///     .matching(|name| name.starts_with("tmp"), |name| format!("scratch{}", &name[3..]));
///
/// let mut tokens = tokenize("x = oldapi(tmpA)");
/// assert_eq!(rules.apply(&mut tokens), 2);
/// assert_eq!(tokens_to_string(&tokens), "x = NewApi(scratchA)");
/// ```
#[derive(Clone, Default)]
pub struct RenameRules {
    rules: Vec<Rule>,
}

impl fmt::Debug for RenameRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exact: Vec<_> = self
            .rules
            .iter()
            .filter_map(|rule| match &rule.selector {
                Selector::Exact(word) => Some(word.as_str()),
                Selector::Matching(_) => None,
            })
            .collect();
        f.debug_struct("RenameRules")
            .field("exact", &exact)
            .field("predicates", &(self.rules.len() - exact.len()))
            .finish()
    }
}

impl RenameRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename `from`, in any casing, to `to`.
    #[must_use]
    pub fn exact(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        let to = to.into();
        self.rules.push(Rule {
            selector: Selector::Exact(from.into()),
            rewrite: Arc::new(move |_: &str| to.clone()),
        });
        self
    }

    /// Rename every name `predicate` accepts to `rewrite(name)`.
    #[must_use]
    pub fn matching<P, R>(mut self, predicate: P, rewrite: R) -> Self
    where
        P: Fn(&str) -> bool + Send + Sync + 'static,
        R: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            selector: Selector::Matching(Arc::new(predicate)),
            rewrite: Arc::new(rewrite),
        });
        self
    }

    /// Append one exact rule per entry of `renames`.
    #[must_use]
    pub fn with_renames(self, renames: &Renames) -> Self {
        renames
            .iter()
            .fold(self, |rules, (from, to)| rules.exact(from, to))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule selects `name`.
    #[must_use]
    pub fn selects(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.selects(name))
    }

    /// Replacement for `name`, or `None` when no rule selects it.
    #[must_use]
    pub fn rename(&self, name: &str) -> Option<String> {
        self.rules
            .iter()
            .find(|rule| rule.selects(name))
            .map(|rule| (rule.rewrite)(name))
    }

    /// Rewrite every selected [`TokenKind::Name`] token. Returns the
    /// number of tokens changed.
    pub fn apply(&self, tokens: &mut [Token]) -> usize {
        let mut changed = 0;
        for token in tokens.iter_mut().filter(|t| t.kind == TokenKind::Name) {
            if let Some(to) = self.rename(&token.text) {
                if token.text != to {
                    token.text = to;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// [`apply`](Self::apply) to every module of `bundle`.
    pub fn apply_bundle(&self, bundle: &mut SourceBundle) -> usize {
        bundle
            .iter_mut()
            .map(|(origin, tokens)| {
                let changed = self.apply(tokens);
                log::debug!("{origin}: {changed} names renamed");
                changed
            })
            .sum()
    }
}

/// `z_` names for the class modules of `bundle`.
///
/// Classes already starting with `z_` and classes some rule in `rules`
/// selects keep their names.
pub fn class_renames(bundle: &SourceBundle, rules: &RenameRules) -> Result<Renames, RenameError> {
    let mut renames = Renames::new();
    for (origin, tokens) in bundle {
        if !is_class_module(origin) {
            continue;
        }
        let name = require_module_name(tokens, origin)?;
        if name.starts_with(CLASS_RENAME_PREFIX) || rules.selects(&name) {
            continue;
        }

        let renamed = format!("{CLASS_RENAME_PREFIX}{name}");
        if renamed.chars().count() > MAX_MODULE_NAME_LEN {
            return Err(RenameError::ClassNameTooLong {
                origin: origin.clone(),
                name,
                renamed,
            });
        }
        renames.insert(&name, renamed);
    }
    Ok(renames)
}

/// Apply `rules` to every name in `bundle`, after adding the
/// [`class_renames`] when `rename_classes` is set.
///
/// Returns the number of tokens changed.
pub fn rename_bundle(
    bundle: &mut SourceBundle,
    rules: RenameRules,
    rename_classes: bool,
) -> Result<usize, RenameError> {
    let rules = if rename_classes {
        let classes = class_renames(bundle, &rules)?;
        rules.with_renames(&classes)
    } else {
        rules
    };
    Ok(rules.apply_bundle(bundle))
}

/// Prefix every private symbol of `module` with `{module}_`, at its
/// definition and at every use. A private `Declare` without an `Alias`
/// gets `Alias "<original>"` so it still binds the same entry point.
///
/// Returns the number of tokens renamed.
pub fn qualify_private_symbols(tokens: &mut Vec<Token>, module: &str) -> usize {
    let renames: Renames = private_symbols(tokens)
        .into_iter()
        .map(|name| {
            let qualified = format!("{module}_{name}");
            (name, qualified)
        })
        .collect();

    let aliases = missing_aliases(tokens);
    let changed = renames.apply(tokens);

    for (at, original) in aliases.into_iter().rev() {
        tokens.splice(
            at..at,
            [
                Token::new(TokenKind::Space, " "),
                Token::new(TokenKind::Reserved, "Alias"),
                Token::new(TokenKind::Space, " "),
                Token::new(TokenKind::String, format!("\"{original}\"")),
            ],
        );
    }

    changed
}

/// Insertion points (just past the library string) and entry point names
/// of private declares that have no `Alias` clause.
fn missing_aliases(tokens: &[Token]) -> Vec<(usize, String)> {
    match_tokens(tokens, &PRIVATE_SYMBOLS[2], true)
        .filter_map(|(_, end)| {
            let name = &tokens[end - 1];
            let line_end = end_of_line(tokens, end);
            let lib = next_word(tokens, end, line_end)?;
            if !tokens[lib].is_word("lib") {
                return None;
            }
            let library = next_word(tokens, lib + 1, line_end)?;
            if tokens[library].kind != TokenKind::String {
                return None;
            }
            match next_word(tokens, library + 1, line_end) {
                Some(i) if tokens[i].is_word("alias") => None,
                _ => Some((library + 1, name.text.clone())),
            }
        })
        .collect()
}

fn next_word(tokens: &[Token], from: usize, until: usize) -> Option<usize> {
    (from..until).find(|&i| !tokens[i].is_space())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use crate::token::tokens_to_string;

    const MODULE: &str = "Attribute VB_Name = \"MiscArray\"\n\
        Option Explicit\n\
        Private Declare PtrSafe Function funcA Lib \"A.dll\" (ByVal x As Long) As Long\n\
        Public Declare Function funcB Lib \"A.dll\" (ByVal x As Long) As Long\n\
        private const theConst = 5\n\
        Private Function Bla(arr As Variant)\n    Bla = theConst\nEnd Function\n\
        Public Function Open_(arr As Variant)\n    Open_ = Bla(arr)\nEnd Function\n";

    #[test]
    fn finds_module_name() {
        let tokens = tokenize(MODULE);
        assert_eq!(module_name(&tokens), Some("MiscArray"));
    }

    #[test]
    fn missing_module_name_names_origin() {
        let err = require_module_name(&tokenize("Option Explicit\n"), "src/a.bas");
        assert_eq!(
            err.map_err(|e| e.to_string()),
            Err("missing `Attribute VB_Name = \"...\"` declaration in src/a.bas".to_string())
        );
    }

    #[test]
    fn collects_private_symbols_in_order() {
        let tokens = tokenize(MODULE);
        assert_eq!(private_symbols(&tokens), ["funcA", "theConst", "Bla"]);
    }

    #[test]
    fn collects_private_variables_and_bare_consts() {
        let tokens = tokenize(
            "Private mCache As Collection, mCount As Long\n\
             Private buf() As Byte\n\
             Private grid(1 To 3, 1 To 3) As Long, total As Long\n\
             Const LIMIT = 5, STEP_SIZE = 2\n\
             Public Const SHARED = 1\n\
             Private WithEvents app As Application\n\
             Dim loose As Long\n",
        );
        assert_eq!(
            private_symbols(&tokens),
            ["mCache", "mCount", "buf", "grid", "total", "LIMIT", "STEP_SIZE", "app"]
        );
    }

    #[test]
    fn property_accessors_count_once() {
        let tokens = tokenize(
            "Private Property Get Size() As Long\nEnd Property\n\
             Private Property Let Size(v As Long)\nEnd Property\n",
        );
        assert_eq!(private_symbols(&tokens), ["Size"]);
    }

    #[test]
    fn renames_are_case_insensitive() {
        let renames: Renames = [("Bla", "M_Bla")].into_iter().collect();
        let mut tokens = tokenize("x = BLA + bla");
        assert_eq!(renames.apply(&mut tokens), 2);
        assert_eq!(tokens_to_string(&tokens), "x = M_Bla + M_Bla");
    }

    #[test]
    fn qualifies_definitions_and_uses() {
        let mut tokens = tokenize(MODULE);
        let changed = qualify_private_symbols(&mut tokens, "MiscArray");
        let text = tokens_to_string(&tokens);

        assert_eq!(changed, 6);
        assert!(text.contains("Private Function MiscArray_Bla(arr As Variant)"));
        assert!(text.contains("MiscArray_Bla = MiscArray_theConst"));
        assert!(text.contains("Open_ = MiscArray_Bla(arr)"));
        assert!(text.contains("Public Declare Function funcB Lib \"A.dll\" (ByVal"));
    }

    #[test]
    fn private_declare_gets_alias() {
        let mut tokens = tokenize(MODULE);
        qualify_private_symbols(&mut tokens, "MiscArray");
        assert!(tokens_to_string(&tokens).contains(
            "Private Declare PtrSafe Function MiscArray_funcA Lib \"A.dll\" Alias \"funcA\" (ByVal"
        ));
    }

    #[test]
    fn first_rule_wins() {
        let rules = RenameRules::new()
            .exact("Counter", "Tally")
            .matching(|name| name.len() > 3, str::to_uppercase);
        assert_eq!(rules.rename("COUNTER").as_deref(), Some("Tally"));
        assert_eq!(rules.rename("Total").as_deref(), Some("TOTAL"));
        assert_eq!(rules.rename("x"), None);
        assert!(rules.selects("counter"));
        assert!(!rules.selects("abc"));
    }

    #[test]
    fn rules_touch_names_only() {
        let rules = RenameRules::new().exact("msg", "Message");
        let mut tokens = tokenize("msg = \"msg\" ' msg\n");
        assert_eq!(rules.apply(&mut tokens), 1);
        assert_eq!(tokens_to_string(&tokens), "Message = \"msg\" ' msg\n");
    }

    #[test]
    fn classes_get_prefix() {
        let bundle = SourceBundle::new()
            .source("Parser.cls", "Attribute VB_Name = \"Parser\"\n")
            .source("z_Done.cls", "Attribute VB_Name = \"z_Done\"\n")
            .source("Kept.cls", "Attribute VB_Name = \"Kept\"\n")
            .source("Util.bas", "Attribute VB_Name = \"Util\"\n");
        let rules = RenameRules::new().exact("Kept", "Kept");

        let renames = class_renames(&bundle, &rules).expect("renames");
        assert_eq!(renames.len(), 1);
        assert_eq!(renames.get("parser"), Some("z_Parser"));
    }

    #[test]
    fn class_prefix_respects_length_limit() {
        let name = "ThirtyCharacterClassNameHere01";
        assert_eq!(name.len(), 30);
        let bundle = SourceBundle::new()
            .source("Long.cls", &format!("Attribute VB_Name = \"{name}\"\n"));

        assert_eq!(
            class_renames(&bundle, &RenameRules::new()),
            Err(RenameError::ClassNameTooLong {
                origin: "Long.cls".to_string(),
                name: name.to_string(),
                renamed: format!("z_{name}"),
            })
        );
    }

    #[test]
    fn rename_bundle_rewrites_class_uses() {
        let mut bundle = SourceBundle::new()
            .source("Parser.cls", "Attribute VB_Name = \"Parser\"\nPublic Sub Run()\nEnd Sub\n")
            .source(
                "Main.bas",
                "Attribute VB_Name = \"Main\"\nSub Go()\n    Dim p As New Parser\n    p.Run\nEnd Sub\n",
            );
        let changed = rename_bundle(&mut bundle, RenameRules::new(), true).expect("rename");

        assert_eq!(changed, 2);
        let class = tokens_to_string(bundle.get("Parser.cls").unwrap_or_default());
        let main = tokens_to_string(bundle.get("Main.bas").unwrap_or_default());
        assert!(class.starts_with("Attribute VB_Name = \"z_Parser\"\n"));
        assert!(main.contains("Dim p As New z_Parser\n"));
    }

    #[test]
    fn rename_bundle_without_class_prefix() {
        let mut bundle = SourceBundle::new()
            .source("Parser.cls", "Attribute VB_Name = \"Parser\"\nDim parserState As Long\n");
        let rules = RenameRules::new().exact("parserState", "state");
        assert_eq!(rename_bundle(&mut bundle, rules, false), Ok(1));
        assert_eq!(
            bundle.get("Parser.cls").map(tokens_to_string),
            Some("Attribute VB_Name = \"Parser\"\nDim state As Long\n".to_string())
        );
    }

    #[test]
    fn existing_alias_is_kept() {
        let mut tokens =
            tokenize("Private Declare Function Beep Lib \"k32\" Alias \"MessageBeep\" (ByVal n As Long) As Long\n");
        qualify_private_symbols(&mut tokens, "M");
        assert_eq!(
            tokens_to_string(&tokens),
            "Private Declare Function M_Beep Lib \"k32\" Alias \"MessageBeep\" (ByVal n As Long) As Long\n"
        );
    }
}
