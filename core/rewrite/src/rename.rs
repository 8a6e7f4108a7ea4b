//! Rename a note and retarget every link pointing at it.
//!
//! Planning reads the vault and computes every rewrite in memory. Nothing
//! touches disk until [`apply_rename`].

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use vault_indexing::{
    config::normalize, is_ignored_path, is_path_qualified, normalize_target, relative_path,
    split_wikilink, Result, VaultError, WIKILINK_RE,
};
use vault_schemas::{has_note_extension, strip_note_extension, Note};

use crate::rewriter::{rewrite, Rewrite, RewriteOptions, Rule};

/// One note whose text changes because of the rename
#[derive(Debug, Clone)]
pub struct NoteUpdate {
    pub abs_path: PathBuf,
    pub rel_path: String,
    pub text: String,
    pub links: usize,
}

#[derive(Debug, Clone)]
pub struct RenamePlan {
    pub from_abs: PathBuf,
    pub from_rel: String,
    pub from_basename: String,
    pub to_abs: PathBuf,
    pub to_rel: String,
    pub to_basename: String,
    pub updates: Vec<NoteUpdate>,
}

impl RenamePlan {
    pub fn links_updated(&self) -> usize {
        self.updates.iter().map(|u| u.links).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenameOutcome {
    pub moved_from: String,
    pub moved_to: String,
    pub files_changed: usize,
    pub links_updated: usize,
}

/// Resolve `query` to a note: an exact relative or absolute path first, then a
/// unique basename.
pub fn find_note<'a>(notes: &'a [Note], vault_root: &Path, query: &str) -> Result<&'a Note> {
    let abs = normalize(&vault_root.join(query));
    if let Some(note) = notes.iter().find(|n| n.abs_path == abs) {
        return Ok(note);
    }

    let basename = strip_note_extension(query);
    let matches: Vec<&Note> = notes.iter().filter(|n| n.basename == basename).collect();
    match matches.as_slice() {
        [] => Err(VaultError::NoteNotFound(query.to_string())),
        [note] => Ok(note),
        many => Err(VaultError::AmbiguousNote {
            basename: basename.to_string(),
            candidates: many.iter().map(|n| n.rel_path.clone()).collect(),
        }),
    }
}

/// Retarget links to `from` (by basename, or by stem when path-qualified).
///
/// Only the target span changes; labels, headings and block refs stay as
/// written. Code fences are left alone.
pub fn retarget_links(text: &str, from: &LinkName, to: &LinkName) -> Rewrite {
    let (from, to) = (from.clone(), to.clone());
    let rule = Rule::new(WIKILINK_RE.clone(), move |caps| {
        let inner = &caps[1];
        let target = normalize_target(inner).replace('\\', "/");
        let replacement = if target == from.basename {
            &to.basename
        } else if is_path_qualified(&target) && target == from.stem {
            &to.stem
        } else {
            return None;
        };
        let (_, suffix) = split_wikilink(inner);
        Some(format!("[[{}{}]]", replacement, suffix))
    });
    rewrite(text, &[rule], RewriteOptions::default())
}

/// How a note is addressed by links: bare basename or vault-relative stem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkName {
    pub basename: String,
    pub stem: String,
}

impl LinkName {
    pub fn from_rel_path(rel_path: &str) -> Self {
        let stem = strip_note_extension(rel_path).to_string();
        let basename = stem.rsplit('/').next().unwrap_or(&stem).to_string();
        Self { basename, stem }
    }
}

/// Validate the destination and compute every link rewrite
pub fn plan_rename(notes: &[Note], vault_root: &Path, from: &str, to: &str) -> Result<RenamePlan> {
    let source = find_note(notes, vault_root, from)?;

    if !has_note_extension(to) {
        return Err(VaultError::InvalidInput(format!(
            "Destination must end with .md (got: {})",
            to
        )));
    }
    let to_abs = normalize(&vault_root.join(to));
    if !to_abs.starts_with(vault_root) {
        return Err(VaultError::InvalidInput(format!(
            "Destination is outside the vault: {}",
            to
        )));
    }
    let to_rel = relative_path(vault_root, &to_abs);
    if strip_note_extension(to_rel.rsplit('/').next().unwrap_or(&to_rel)).is_empty() {
        return Err(VaultError::InvalidInput(format!(
            "Destination needs a file name: {}",
            to
        )));
    }
    if is_ignored_path(&to_rel) {
        return Err(VaultError::InvalidInput(format!(
            "Destination is in a hidden or ignored folder: {}",
            to_rel
        )));
    }
    if to_abs.exists() {
        return Err(VaultError::InvalidInput(format!(
            "Destination already exists: {}",
            to_rel
        )));
    }

    let old_name = LinkName::from_rel_path(&source.rel_path);
    let new_name = LinkName::from_rel_path(&to_rel);

    let updates: Vec<NoteUpdate> = notes
        .iter()
        .filter_map(|note| {
            let result = retarget_links(&note.raw_text(), &old_name, &new_name);
            result.changed().then(|| NoteUpdate {
                abs_path: note.abs_path.clone(),
                rel_path: note.rel_path.clone(),
                text: result.text,
                links: result.count,
            })
        })
        .collect();

    debug!(
        "Rename {} -> {} touches {} notes",
        source.rel_path,
        to_rel,
        updates.len()
    );

    Ok(RenamePlan {
        from_abs: source.abs_path.clone(),
        from_rel: source.rel_path.clone(),
        from_basename: old_name.basename,
        to_abs,
        to_rel,
        to_basename: new_name.basename,
        updates,
    })
}

/// Move the note, then write every updated note.
///
/// A failure after the move leaves the vault partially updated; the error
/// names the file that failed.
pub fn apply_rename(plan: &RenamePlan) -> Result<RenameOutcome> {
    if let Some(parent) = plan.to_abs.parent() {
        fs::create_dir_all(parent).map_err(|e| VaultError::io(parent, e))?;
    }
    fs::rename(&plan.from_abs, &plan.to_abs).map_err(|e| VaultError::io(&plan.from_abs, e))?;
    info!("Moved {} -> {}", plan.from_rel, plan.to_rel);

    let mut files_changed = 0;
    for update in &plan.updates {
        let path = if update.abs_path == plan.from_abs {
            &plan.to_abs
        } else {
            &update.abs_path
        };
        fs::write(path, &update.text).map_err(|e| VaultError::io(path, e))?;
        files_changed += 1;
    }

    Ok(RenameOutcome {
        moved_from: plan.from_rel.clone(),
        moved_to: plan.to_rel.clone(),
        files_changed: files_changed.max(1),
        links_updated: plan.links_updated(),
    })
}
