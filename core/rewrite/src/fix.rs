//! Mechanical repairs for malformed wikilinks.

use regex::Regex;
use std::fs;
use std::sync::LazyLock;
use tracing::{debug, info, warn};
use vault_indexing::{
    is_doc_basename, list_markdown_files, list_matching, read_note, strip_code, Result,
    VaultError,
};
use vault_schemas::VaultConfig;

use crate::rewriter::{rewrite, Rewrite, RewriteOptions, Rule};

/// `[[foo\|Bar]]`: a table-escaped pipe inside a link
static ESCAPED_PIPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]*?)\\\|").unwrap());

/// `[[nextjs/]]` or `[[nextjs/|Label]]`: a trailing slash on the target
static TRAILING_SLASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|#^]+?)/(\|[^\]]+)?\]\]").unwrap());

pub fn safe_fix_rules() -> Vec<Rule> {
    vec![
        Rule::template(ESCAPED_PIPE_RE.clone(), "[[${1}|"),
        Rule::template(TRAILING_SLASH_RE.clone(), "[[${1}${2}]]"),
    ]
}

/// Apply every safe fix to a whole file's text, leaving code fences alone
pub fn fix_text(text: &str) -> Rewrite {
    rewrite(text, &safe_fix_rules(), RewriteOptions::default())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFix {
    pub rel_path: String,
    pub changes: usize,
}

#[derive(Debug, Default)]
pub struct FixReport {
    /// Notes considered, documentation files excluded
    pub scanned: usize,
    /// Files that needed at least one fix, in path order
    pub files: Vec<FileFix>,
}

impl FixReport {
    pub fn total_changes(&self) -> usize {
        self.files.iter().map(|f| f.changes).sum()
    }
}

/// Fix every note in the vault, or only those matching `pattern`.
///
/// Documentation files and files with nothing outside code are skipped.
/// Files are only written when `write` is set.
pub fn fix_vault(config: &VaultConfig, pattern: Option<&str>, write: bool) -> Result<FixReport> {
    let root = &config.vault_root;
    let files = match pattern {
        Some(p) => list_matching(root, p)?,
        None => list_markdown_files(root)?,
    };

    let mut report = FixReport::default();
    let rules = safe_fix_rules();

    for file in &files {
        let note = match read_note(root, file) {
            Ok(note) => note,
            Err(e) => {
                warn!("Skipping unreadable note: {}", e);
                continue;
            }
        };
        if is_doc_basename(&note.basename) {
            continue;
        }
        report.scanned += 1;

        let text = note.raw_text();
        if strip_code(&text).trim().is_empty() {
            debug!("Skipping {} (only code)", note.rel_path);
            continue;
        }

        let result = rewrite(&text, &rules, RewriteOptions::default());
        if !result.changed() {
            continue;
        }

        if write {
            fs::write(file, &result.text).map_err(|e| VaultError::io(file, e))?;
        }
        report.files.push(FileFix {
            rel_path: note.rel_path,
            changes: result.count,
        });
    }

    info!(
        "Safe fixes: {} change(s) across {} file(s){}",
        report.total_changes(),
        report.files.len(),
        if write { "" } else { " (dry run)" }
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixes_escaped_pipe_and_trailing_slash() {
        let result = fix_text("Link [[foo\\|Bar]] and [[nextjs/]]");
        assert_eq!(result.text, "Link [[foo|Bar]] and [[nextjs]]");
        assert_eq!(result.count, 2);
    }

    #[test]
    fn test_trailing_slash_keeps_label() {
        let result = fix_text("[[tools/react/|React]]");
        assert_eq!(result.text, "[[tools/react|React]]");
    }

    #[test]
    fn test_fenced_code_is_not_fixed() {
        let text = "```\n[[foo\\|Bar]]\n```\n";
        let result = fix_text(text);
        assert_eq!(result.text, text);
        assert!(!result.changed());
    }

    #[test]
    fn test_fixes_are_idempotent() {
        let once = fix_text("[[a\\|b]] [[c/]] [[d|e]]");
        let twice = fix_text(&once.text);
        assert_eq!(twice.text, once.text);
        assert_eq!(twice.count, 0);
    }

    #[test]
    fn test_headings_and_blocks_are_not_trailing_slashes() {
        let text = "[[note#a/b]] [[note^x/]]";
        assert!(!fix_text(text).changed());
    }
}
