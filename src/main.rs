//! CLI tool to merge, inspect and normalize VBA modules.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use vba_packager::casing::{self, CaseStyle, CasingFixer};
use vba_packager::namespace::{self, NAMESPACE_MODULE};
use vba_packager::{RenameRules, SourceBundle, classify, rename_bundle, tokenize, tokens_to_string};

#[derive(Debug, Parser)]
#[command(name = "vba-packager")]
#[command(about = "Merge, inspect and normalize VBA modules.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge modules into a single `.bas` module.
    Merge {
        /// Name of the merged module (defaults to the first module's name).
        #[arg(long)]
        module_name: Option<String>,
        /// Write the result here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Modules to merge, in output order.
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print the sections of a module.
    Sections { file: PathBuf },
    /// Print the tokens of a module.
    Tokens { file: PathBuf },
    /// Enforce consistent identifier casing.
    Case {
        /// `camel` or `pascal`; without it only the spelling is unified.
        #[arg(long)]
        style: Option<CaseStyle>,
        /// File of names whose spelling always wins, one per line.
        #[arg(long)]
        overrides: Option<PathBuf>,
        /// Rewrite the files instead of listing the ones that would change.
        #[arg(long)]
        write: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Rename identifiers across modules.
    Rename {
        /// `OLD=NEW`, matched ignoring case; may be repeated.
        #[arg(long = "rule", value_parser = parse_rule)]
        rules: Vec<(String, String)>,
        /// Keep class module names instead of prefixing them with `z_`.
        #[arg(long)]
        keep_class_names: bool,
        /// Rewrite the files instead of listing the ones that would change.
        #[arg(long)]
        write: bool,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Convert modules into namespaced classes.
    Namespace {
        /// Directory receiving the `.cls` files and the declaration module.
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Merge {
            module_name,
            output,
            files,
        } => run_merge(module_name.as_deref(), output.as_deref(), &files),
        Command::Sections { file } => run_sections(&file),
        Command::Tokens { file } => run_tokens(&file),
        Command::Case {
            style,
            overrides,
            write,
            files,
        } => run_case(style, overrides.as_deref(), write, &files),
        Command::Rename {
            rules,
            keep_class_names,
            write,
            files,
        } => run_rename(rules, !keep_class_names, write, &files),
        Command::Namespace { out_dir, files } => run_namespace(&out_dir, &files),
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

/// Outcome of a command: `Ok(false)` when it ran but found problems.
type CommandResult = Result<bool, String>;

fn read(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("{}: {e}", path.display()))
}

fn write(path: &Path, content: &str) -> Result<(), String> {
    fs::write(path, content).map_err(|e| format!("{}: {e}", path.display()))
}

fn load_bundle(files: &[PathBuf]) -> Result<SourceBundle, String> {
    let mut bundle = SourceBundle::new();
    for path in files {
        bundle.insert(path.display().to_string(), tokenize(&read(path)?));
    }
    Ok(bundle)
}

fn run_merge(module_name: Option<&str>, output: Option<&Path>, files: &[PathBuf]) -> CommandResult {
    let bundle = load_bundle(files)?;
    let merged = vba_packager::merge(bundle, module_name).map_err(|e| e.to_string())?;

    match output {
        Some(path) => {
            write(path, &merged)?;
            eprintln!("{}: merged {} module(s)", path.display(), files.len());
        }
        None => print!("{merged}"),
    }
    Ok(true)
}

fn run_sections(file: &Path) -> CommandResult {
    let tokens = tokenize(&read(file)?);
    for section in classify(&tokens) {
        let text = section.text();
        let first_line = text.trim().lines().next().unwrap_or_default();
        let private = if section.private { "private" } else { "-" };
        println!("{:<10} {private:<8} {first_line}", section.kind.as_str());
    }
    Ok(true)
}

fn run_tokens(file: &Path) -> CommandResult {
    for token in tokenize(&read(file)?) {
        println!("{:?} {:?}", token.kind, token.text);
    }
    Ok(true)
}

fn run_case(
    style: Option<CaseStyle>,
    overrides: Option<&Path>,
    write_back: bool,
    files: &[PathBuf],
) -> CommandResult {
    let names = match overrides {
        Some(path) => casing::parse_overrides(&read(path)?),
        None => Vec::new(),
    };
    let mut fixer = CasingFixer::new(style).with_overrides(names);
    let mut unchanged = true;

    for path in files {
        let content = read(path)?;
        let fixed = fixer.fix_source(&content);
        if fixed == content {
            continue;
        }
        if write_back {
            write(path, &fixed)?;
            eprintln!("{}: recased", path.display());
        } else {
            eprintln!("{}: casing differs", path.display());
            unchanged = false;
        }
    }

    Ok(unchanged)
}

fn parse_rule(rule: &str) -> Result<(String, String), String> {
    match rule.split_once('=') {
        Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
            Ok((from.trim().to_string(), to.trim().to_string()))
        }
        _ => Err(format!("expected OLD=NEW, got `{rule}`")),
    }
}

fn run_rename(
    rules: Vec<(String, String)>,
    rename_classes: bool,
    write_back: bool,
    files: &[PathBuf],
) -> CommandResult {
    let mut bundle = load_bundle(files)?;
    let before: Vec<String> = bundle.iter().map(|(_, tokens)| tokens_to_string(tokens)).collect();

    let rules = rules
        .into_iter()
        .fold(RenameRules::new(), |rules, (from, to)| rules.exact(from, to));
    let changed = rename_bundle(&mut bundle, rules, rename_classes).map_err(|e| e.to_string())?;

    for ((origin, tokens), original) in bundle.iter().zip(&before) {
        let text = tokens_to_string(tokens);
        if text == *original {
            continue;
        }
        if write_back {
            write(Path::new(origin), &text)?;
            eprintln!("{origin}: renamed");
        } else {
            eprintln!("{origin}: names differ");
        }
    }

    let verb = if write_back { "renamed" } else { "to rename" };
    eprintln!("{changed} name(s) {verb}");
    Ok(true)
}

fn run_namespace(out_dir: &Path, files: &[PathBuf]) -> CommandResult {
    let bundle = load_bundle(files)?;
    let classes = namespace::namespace_modules(&bundle).map_err(|e| e.to_string())?;

    fs::create_dir_all(out_dir).map_err(|e| format!("{}: {e}", out_dir.display()))?;
    for class in &classes {
        write(&out_dir.join(format!("{}.cls", class.class_name)), &class.source)?;
    }

    let mut taken: HashSet<String> = classes.iter().map(|c| c.class_name.clone()).collect();
    let declarations_name = namespace::shorten_module_name(NAMESPACE_MODULE, &mut taken);
    write(
        &out_dir.join(format!("{declarations_name}.bas")),
        &namespace::namespace_declarations(&classes),
    )?;

    eprintln!(
        "{}: {} class(es) written",
        out_dir.display(),
        classes.len()
    );
    Ok(true)
}
