//! Vault enumeration and note loading.
//!
//! Notes are read fresh on every scan; nothing is cached between runs.

use globset::{Glob, GlobMatcher};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use vault_schemas::{has_note_extension, Note};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, VaultError};
use crate::frontmatter::parse_note_text;

/// Directories never scanned
pub const IGNORED_DIRS: &[&str] = &[".obsidian", ".git", "node_modules"];

/// Repository documentation files that live in a vault but are not notes
pub const DOC_BASENAMES: &[&str] = &["README", "AGENTS", "CLAUDE", "SPEC"];

/// True for README/AGENTS/CLAUDE/SPEC, case-insensitive
pub fn is_doc_basename(basename: &str) -> bool {
    DOC_BASENAMES
        .iter()
        .any(|doc| doc.eq_ignore_ascii_case(basename))
}

fn is_ignored(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && IGNORED_DIRS.contains(&name.as_ref()))
}

/// True when a scan would never reach the vault-relative path `rel`
pub fn is_ignored_path(rel: &str) -> bool {
    let mut parts = rel.split('/').filter(|p| !p.is_empty()).peekable();
    while let Some(part) = parts.next() {
        let is_dir = parts.peek().is_some();
        if part.starts_with('.') || (is_dir && IGNORED_DIRS.contains(&part)) {
            return true;
        }
    }
    false
}

/// All markdown files below `root`, absolute and sorted by path
pub fn list_markdown_files(root: &Path) -> Result<Vec<PathBuf>> {
    walk_files(root, |rel| has_note_extension(rel))
}

/// Markdown files whose vault-relative path matches `pattern`
pub fn list_matching(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let matcher = compile_glob(pattern)?;
    walk_files(root, |rel| has_note_extension(rel) && matcher.is_match(rel))
}

fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    Glob::new(pattern)
        .map(|g| g.compile_matcher())
        .map_err(|e| VaultError::InvalidInput(format!("Invalid glob '{}': {}", pattern, e)))
}

fn walk_files(root: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_ignored(e));

    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            let source = e
                .into_io_error()
                .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
            VaultError::io(path, source)
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_path(root, entry.path());
        if keep(&rel) {
            files.push(entry.into_path());
        }
    }

    debug!("Found {} matching files under {}", files.len(), root.display());
    Ok(files)
}

/// Vault-relative `/`-separated path of `path`
pub fn relative_path(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Read and parse one note
pub fn read_note(vault_root: &Path, abs_path: &Path) -> Result<Note> {
    let content = fs::read_to_string(abs_path).map_err(|e| VaultError::io(abs_path, e))?;
    let parsed = parse_note_text(&content);
    let rel = relative_path(vault_root, abs_path);

    Ok(Note::new(
        abs_path.to_path_buf(),
        &rel,
        parsed.frontmatter,
        parsed.header,
        parsed.body,
    ))
}

/// Read every note in the vault.
///
/// A note that cannot be read (e.g. not valid UTF-8) is logged and left out
/// of the scan; it never aborts the others.
pub fn scan_notes(vault_root: &Path) -> Result<Vec<Note>> {
    let files = list_markdown_files(vault_root)?;
    let notes: Vec<Note> = files
        .iter()
        .filter_map(|f| match read_note(vault_root, f) {
            Ok(note) => Some(note),
            Err(e) => {
                warn!("Skipping unreadable note: {}", e);
                None
            }
        })
        .collect();

    debug!("Scanned {} notes", notes.len());
    Ok(notes)
}
