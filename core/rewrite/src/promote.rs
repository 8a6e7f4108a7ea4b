//! Stub promotion: find heavily referenced stubs, plan where they should
//! live, then move them once the whole plan checks out.

use chrono::Utc;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use vault_indexing::{config::normalize, count_references, stub_notes, Result, VaultError};
use vault_schemas::{has_note_extension, Note, PromotionMove, PromotionPlan, VaultConfig, NOTE_EXTENSION};

pub const DEFAULT_PLAN_FILE: &str = "vault.promote-stubs.plan.json";
pub const DEFAULT_MIN_REFS: usize = 5;

/// Where a stub probably belongs, judged from its name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubCategory {
    People,
    Tools,
    Unknown,
}

impl StubCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            StubCategory::People => "people",
            StubCategory::Tools => "tools",
            StubCategory::Unknown => "unknown",
        }
    }
}

const PEOPLE_HINTS: &[&str] = &["@", "capital", "inc", "co"];
const TOOL_HINTS: &[&str] = &[".js", "ts", "css", "api"];

pub fn guess_category(stub: &str) -> StubCategory {
    let lower = stub.to_lowercase();
    if PEOPLE_HINTS.iter().any(|h| lower.contains(h)) {
        StubCategory::People
    } else if TOOL_HINTS.iter().any(|h| lower.contains(h)) {
        StubCategory::Tools
    } else {
        StubCategory::Unknown
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StubCandidate {
    pub stub: String,
    pub refs: usize,
    pub category: StubCategory,
}

/// Stubs with at least `min_refs` unqualified references, most referenced
/// first. Ties keep the order stubs were first referenced in.
pub fn stub_candidates(notes: &[Note], config: &VaultConfig, min_refs: usize) -> Vec<StubCandidate> {
    let stubs: HashSet<String> = stub_notes(notes, config)
        .into_iter()
        .map(|n| n.basename.clone())
        .collect();

    let mut candidates: Vec<StubCandidate> = count_references(notes, &stubs)
        .into_iter()
        .filter(|(_, refs)| *refs >= min_refs)
        .map(|(stub, refs)| StubCandidate {
            category: guess_category(&stub),
            stub,
            refs,
        })
        .collect();

    candidates.sort_by_key(|c| Reverse(c.refs));
    debug!("{} of {} stubs meet {} refs", candidates.len(), stubs.len(), min_refs);
    candidates
}

/// Propose moving every candidate into the first concepts folder
pub fn generate_promotion_plan(
    notes: &[Note],
    config: &VaultConfig,
    min_refs: usize,
) -> Result<PromotionPlan> {
    let dest_folder = config
        .folders
        .concepts
        .first()
        .ok_or_else(|| VaultError::InvalidInput("No concepts folder configured".into()))?
        .trim_end_matches('/');

    let moves = stub_candidates(notes, config, min_refs)
        .into_iter()
        .map(|c| PromotionMove {
            to_rel_path: format!("{}/{}{}", dest_folder, c.stub, NOTE_EXTENSION),
            from: c.stub,
        })
        .collect();

    Ok(PromotionPlan {
        vault_root: config.vault_root.display().to_string(),
        generated_at: Utc::now().to_rfc3339(),
        moves,
    })
}

pub fn write_plan(plan: &PromotionPlan, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(plan)
        .map_err(|e| VaultError::Invariant(format!("Plan serialization failed: {}", e)))?;
    fs::write(path, json).map_err(|e| VaultError::io(path, e))?;
    info!("Wrote plan {} ({} moves)", path.display(), plan.moves.len());
    Ok(())
}

pub fn read_plan(path: &Path) -> Result<PromotionPlan> {
    let raw = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => VaultError::PlanFormat {
            path: path.to_path_buf(),
            message: "plan not found".into(),
        },
        _ => VaultError::io(path, e),
    })?;

    serde_json::from_str(&raw).map_err(|e| VaultError::PlanFormat {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// A plan move resolved against the vault
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMove {
    pub from: String,
    pub to_rel_path: String,
    pub source: PathBuf,
    pub dest: PathBuf,
}

fn stub_paths(config: &VaultConfig, stub: &str) -> Vec<PathBuf> {
    config
        .folders
        .stubs
        .iter()
        .map(|folder| {
            config
                .vault_root
                .join(folder)
                .join(format!("{}{}", stub, NOTE_EXTENSION))
        })
        .collect()
}

/// Check every move against the vault as it is now.
///
/// All problems are collected before returning; any problem fails the whole
/// plan with [`VaultError::Validation`].
pub fn validate_plan(plan: &PromotionPlan, config: &VaultConfig) -> Result<Vec<ResolvedMove>> {
    let root = &config.vault_root;
    if !plan.vault_root.is_empty() && normalize(Path::new(&plan.vault_root)) != *root {
        warn!(
            "Plan was generated for {}, applying to {}",
            plan.vault_root,
            root.display()
        );
    }

    let mut problems = Vec::new();
    let mut resolved = Vec::new();
    let mut seen_sources = HashSet::new();
    let mut seen_dests = HashSet::new();

    for mv in &plan.moves {
        if mv.from.trim().is_empty() || mv.to_rel_path.trim().is_empty() {
            problems.push(format!(
                "Invalid move: {}",
                serde_json::to_string(mv).unwrap_or_default()
            ));
            continue;
        }
        if mv.from.contains(['/', '\\']) {
            problems.push(format!("Stub name must be a basename: {}", mv.from));
            continue;
        }

        let candidates = stub_paths(config, &mv.from);
        let source = candidates.iter().find(|p| p.is_file()).cloned();
        if source.is_none() {
            let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
            problems.push(format!(
                "Missing stub file for '{}' (searched {})",
                mv.from,
                searched.join(", ")
            ));
        }
        if !seen_sources.insert(mv.from.as_str()) {
            problems.push(format!("Stub '{}' is moved more than once", mv.from));
        }

        let dest = normalize(&root.join(&mv.to_rel_path));
        if !has_note_extension(&mv.to_rel_path) {
            problems.push(format!("Destination must end with .md: {}", mv.to_rel_path));
        }
        if !dest.starts_with(root) {
            problems.push(format!("Destination is outside the vault: {}", mv.to_rel_path));
        }
        if dest.exists() {
            problems.push(format!("Destination already exists: {}", mv.to_rel_path));
        }
        if !seen_dests.insert(dest.clone()) {
            problems.push(format!("Destination used more than once: {}", mv.to_rel_path));
        }

        if let Some(source) = source {
            resolved.push(ResolvedMove {
                from: mv.from.clone(),
                to_rel_path: mv.to_rel_path.clone(),
                source,
                dest,
            });
        }
    }

    if !problems.is_empty() {
        return Err(VaultError::Validation(problems));
    }
    Ok(resolved)
}

/// Perform validated moves in order.
///
/// Each move re-checks its source and destination first; a mismatch means
/// the vault changed under us and stops the batch.
pub fn apply_moves(moves: &[ResolvedMove]) -> Result<usize> {
    let mut moved = 0;

    for mv in moves {
        if !mv.source.is_file() {
            return Err(VaultError::Invariant(format!("missing stub '{}'", mv.from)));
        }
        if mv.dest.exists() {
            return Err(VaultError::Invariant(format!(
                "destination appeared: {}",
                mv.to_rel_path
            )));
        }

        if let Some(parent) = mv.dest.parent() {
            fs::create_dir_all(parent).map_err(|e| VaultError::io(parent, e))?;
        }
        fs::rename(&mv.source, &mv.dest).map_err(|e| VaultError::io(&mv.source, e))?;
        debug!("Moved {} -> {}", mv.from, mv.to_rel_path);
        moved += 1;
    }

    info!("Moved {} stub(s)", moved);
    Ok(moved)
}
