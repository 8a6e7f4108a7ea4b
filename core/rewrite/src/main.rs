/// Vault maintenance CLI
///
/// Usage:
///   vault [--root <dir>] <command> [options]
///
/// Every command that changes files is a dry run unless `--write` is given.
/// Set RUST_LOG (e.g. `RUST_LOG=debug`) for diagnostics on stderr.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vault_indexing::{lint_notes, load_config, scan_notes, Result, VaultError};
use vault_rewrite::{
    apply_moves, apply_rename, fix_vault, generate_promotion_plan, linkify_all, plan_rename,
    read_plan, stub_candidates, validate_plan, write_plan, Linker, DEFAULT_MIN_REFS,
    DEFAULT_PLAN_FILE,
};

/// How many entries a text report lists before summarizing the rest
const REPORT_LIMIT: usize = 30;

#[derive(Parser, Debug)]
#[command(name = "vault")]
#[command(about = "Maintain an Obsidian-style markdown vault")]
struct Cli {
    /// Vault root (defaults to the current directory)
    #[arg(long, global = true, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Scan for broken links and front-matter issues
    Lint {
        /// Machine readable output
        #[arg(long)]
        json: bool,
    },

    /// Add wikilinks for known people and concepts to one note
    Linkify {
        /// Markdown file, relative to --root
        file: PathBuf,

        #[arg(long)]
        write: bool,
    },

    /// Linkify every note matching a glob
    LinkifyAll {
        /// Glob relative to --root, e.g. '00-inbox/**/*.md'
        #[arg(long)]
        glob: String,

        /// Only process the first N matching files
        #[arg(long)]
        limit: Option<usize>,

        #[arg(long)]
        write: bool,
    },

    /// Repair escaped pipes and trailing slashes in wikilinks
    Fix {
        /// Only fix notes matching this glob
        #[arg(long)]
        glob: Option<String>,

        #[arg(long)]
        write: bool,
    },

    /// Rename a note and update every link to it
    Rename {
        /// Note path (relative to --root) or unique basename
        #[arg(long)]
        from: String,

        /// New path relative to --root, ending in .md
        #[arg(long)]
        to: String,

        #[arg(long)]
        write: bool,
    },

    /// Write a stub promotion plan (JSON) for review
    PromoteStubs {
        /// Minimum unqualified references for a stub to be promoted
        #[arg(long, default_value_t = DEFAULT_MIN_REFS)]
        min_refs: usize,

        /// Plan file to write
        #[arg(long, default_value = DEFAULT_PLAN_FILE)]
        out: PathBuf,
    },

    /// Validate and apply a stub promotion plan
    PromoteStubsApply {
        /// Plan JSON file
        #[arg(long)]
        plan: PathBuf,

        /// Actually move files
        #[arg(long)]
        write: bool,
    },
}

fn main() -> ExitCode {
    if let Err(e) = init_tracing() {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::from(3);
    }

    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            report_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
}

fn report_error(e: &VaultError) {
    eprintln!("Error: {e}");
    if let VaultError::Validation(problems) = e {
        for problem in problems.iter().take(REPORT_LIMIT) {
            eprintln!("- {problem}");
        }
        if problems.len() > REPORT_LIMIT {
            eprintln!("...and {} more", problems.len() - REPORT_LIMIT);
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let root = cli.root.as_path();
    match cli.command {
        Command::Lint { json } => lint(root, json),
        Command::Linkify { file, write } => linkify(root, &file, write),
        Command::LinkifyAll { glob, limit, write } => linkify_many(root, &glob, limit, write),
        Command::Fix { glob, write } => fix(root, glob.as_deref(), write),
        Command::Rename { from, to, write } => rename(root, &from, &to, write),
        Command::PromoteStubs { min_refs, out } => promote_stubs(root, min_refs, &out),
        Command::PromoteStubsApply { plan, write } => promote_stubs_apply(root, &plan, write),
    }
}

fn print_dry_run() {
    println!("Dry run: no files changed. Re-run with --write to apply.");
}

fn lint(root: &Path, json: bool) -> Result<u8> {
    let config = load_config(root)?;
    let notes = scan_notes(&config.vault_root)?;
    let issues = lint_notes(&notes, &config);

    if json {
        let out = serde_json::json!({ "issues": &issues });
        let text = serde_json::to_string_pretty(&out)
            .map_err(|e| VaultError::Invariant(format!("JSON output failed: {e}")))?;
        println!("{text}");
    } else {
        let count = |kind: &str| issues.iter().filter(|i| i.kind() == kind).count();
        println!("Scanned {} notes", notes.len());
        println!("- Broken links: {}", count("broken_link"));
        println!("- Missing frontmatter: {}", count("missing_frontmatter"));
        println!("- Missing required fields: {}", count("missing_field"));
        for issue in issues.iter().take(REPORT_LIMIT) {
            println!("{issue}");
        }
        if issues.len() > REPORT_LIMIT {
            println!("...and {} more", issues.len() - REPORT_LIMIT);
        }
    }

    Ok(if issues.is_empty() { 0 } else { 1 })
}

fn linkify(root: &Path, file: &Path, write: bool) -> Result<u8> {
    let config = load_config(root)?;
    let linker = Linker::from_vault(&config)?;
    let path = root.join(file);
    println!("Target: {}", file.display());

    let result = linker.linkify_file(&path, write)?;
    if !result.changed() {
        println!("No changes.");
    } else if write {
        println!("Updated {} ({} link insertions).", file.display(), result.count);
    } else {
        println!("Dry run: would apply {} link insertions.", result.count);
        println!("Re-run with --write to apply.");
    }
    Ok(0)
}

fn linkify_many(root: &Path, glob: &str, limit: Option<usize>, write: bool) -> Result<u8> {
    let config = load_config(root)?;
    let linker = Linker::from_vault(&config)?;
    let report = linkify_all(&linker, &config.vault_root, glob, limit, write)?;

    println!("Matched {} markdown file(s)", report.matched);
    if report.processed.len() + report.failures.len() < report.matched {
        println!(
            "Limiting to first {}.",
            report.processed.len() + report.failures.len()
        );
    }
    for file in &report.processed {
        println!("-> {} ({} link insertions)", file.rel_path, file.count);
    }
    for (rel_path, e) in &report.failures {
        eprintln!("Failed {rel_path}: {e}");
    }
    if !write {
        print_dry_run();
    }

    Ok(if report.failures.is_empty() { 0 } else { 1 })
}

fn fix(root: &Path, glob: Option<&str>, write: bool) -> Result<u8> {
    let config = load_config(root)?;
    let report = fix_vault(&config, glob, write)?;

    println!("Scanned {} notes", report.scanned);
    if report.files.is_empty() {
        println!("No safe fixes needed.");
        return Ok(0);
    }

    println!(
        "Safe fixes: {} change(s) across {} file(s)",
        report.total_changes(),
        report.files.len()
    );
    for file in report.files.iter().take(REPORT_LIMIT) {
        println!("- {}\t{}", file.changes, file.rel_path);
    }
    if report.files.len() > REPORT_LIMIT {
        println!("...and {} more", report.files.len() - REPORT_LIMIT);
    }
    if !write {
        print_dry_run();
    }
    Ok(0)
}

fn rename(root: &Path, from: &str, to: &str, write: bool) -> Result<u8> {
    let config = load_config(root)?;
    let notes = scan_notes(&config.vault_root)?;
    let plan = plan_rename(&notes, &config.vault_root, from, to)?;

    println!("Rename plan");
    println!("- Move: {} -> {}", plan.from_rel, plan.to_rel);
    println!(
        "- Update links: [[{}]] -> [[{}]]",
        plan.from_basename, plan.to_basename
    );
    println!("- Links to update: {}", plan.links_updated());

    if !write {
        print_dry_run();
        return Ok(0);
    }

    let outcome = apply_rename(&plan)?;
    info!("Renamed {} -> {}", outcome.moved_from, outcome.moved_to);
    let text = serde_json::to_string_pretty(&outcome)
        .map_err(|e| VaultError::Invariant(format!("JSON output failed: {e}")))?;
    println!("Renamed note and updated links.");
    println!("{text}");
    Ok(0)
}

fn promote_stubs(root: &Path, min_refs: usize, out: &Path) -> Result<u8> {
    let config = load_config(root)?;
    let notes = scan_notes(&config.vault_root)?;

    let candidates = stub_candidates(&notes, &config, min_refs);
    if candidates.is_empty() {
        println!("No stubs meet threshold.");
    } else {
        println!("Stub candidates (>={} refs): {}", min_refs, candidates.len());
        for c in candidates.iter().take(REPORT_LIMIT) {
            println!("- {}\t{}\t({})", c.refs, c.stub, c.category.as_str());
        }
    }

    let plan = generate_promotion_plan(&notes, &config, min_refs)?;
    write_plan(&plan, out)?;
    println!("Wrote plan: {} ({} moves)", out.display(), plan.moves.len());
    println!("Edit the plan, then apply with: vault promote-stubs-apply --plan <file>");
    Ok(0)
}

fn promote_stubs_apply(root: &Path, plan_path: &Path, write: bool) -> Result<u8> {
    let config = load_config(root)?;
    let plan = read_plan(plan_path)?;
    let moves = validate_plan(&plan, &config)?;

    println!("Plan moves: {}", moves.len());
    for mv in moves.iter().take(REPORT_LIMIT) {
        println!("- {} -> {}", mv.from, mv.to_rel_path);
    }
    if moves.len() > REPORT_LIMIT {
        println!("...and {} more", moves.len() - REPORT_LIMIT);
    }

    if !write {
        println!("Dry run: no files moved. Re-run with --write to apply.");
        return Ok(0);
    }

    let moved = apply_moves(&moves)?;
    println!("Moved {moved} stub(s).");
    Ok(0)
}
