//! Turn plain mentions of people and concepts into wikilinks.

use regex::Regex;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};
use vault_indexing::{
    build_alias_map, is_doc_basename, link_candidates, list_matching, load_entities,
    parse_note_text, relative_path, scan_notes, Result, VaultError,
};
use vault_schemas::{strip_note_extension, Entity, VaultConfig};

use crate::rewriter::{rewrite, Rewrite, RewriteOptions, Rule};

/// Alias rules for every linkable entity, longest aliases first
pub struct Linker {
    rules: Vec<Rule>,
}

impl Linker {
    pub fn new(entities: &[Entity]) -> Self {
        let index = build_alias_map(entities);
        let rules = link_candidates(entities, &index)
            .into_iter()
            .filter_map(|candidate| {
                let pattern = match Regex::new(&regex::escape(candidate.alias)) {
                    Ok(p) => p,
                    Err(e) => {
                        warn!("Skipping alias '{}': {}", candidate.alias, e);
                        return None;
                    }
                };
                let target = candidate.entity.target.clone();
                Some(
                    Rule::new(pattern, move |caps| {
                        Some(format!("[[{}|{}]]", target, &caps[0]))
                    })
                    .whole_word(),
                )
            })
            .collect::<Vec<_>>();

        debug!("Built {} link rules from {} entities", rules.len(), entities.len());
        Self { rules }
    }

    /// Scan the vault and build rules from its entity notes
    pub fn from_vault(config: &VaultConfig) -> Result<Self> {
        let notes = scan_notes(&config.vault_root)?;
        let entities = load_entities(&notes, &config.frontmatter);
        Ok(Self::new(&entities))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Link the body of a note; the front-matter block is kept verbatim
    pub fn linkify_text(&self, text: &str) -> Rewrite {
        let parsed = parse_note_text(text);
        let body = rewrite(&parsed.body, &self.rules, RewriteOptions::PROTECT_LINKS);
        Rewrite {
            text: format!("{}{}", parsed.header, body.text),
            count: body.count,
        }
    }

    /// Linkify one file, writing it back only when `write` is set and
    /// something changed
    pub fn linkify_file(&self, path: &Path, write: bool) -> Result<Rewrite> {
        if !path.is_file() {
            return Err(VaultError::NoteNotFound(path.display().to_string()));
        }
        let raw = fs::read_to_string(path).map_err(|e| VaultError::io(path, e))?;
        let result = self.linkify_text(&raw);

        if write && result.changed() {
            fs::write(path, &result.text).map_err(|e| VaultError::io(path, e))?;
            info!("Updated {} ({} link insertions)", path.display(), result.count);
        }
        Ok(result)
    }
}

/// Per-file link insertions for a batch run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLinks {
    pub rel_path: String,
    pub count: usize,
}

#[derive(Debug, Default)]
pub struct LinkifyReport {
    /// Files matching the glob, before the limit is applied
    pub matched: usize,
    pub processed: Vec<FileLinks>,
    pub failures: Vec<(String, VaultError)>,
}

impl LinkifyReport {
    pub fn total_links(&self) -> usize {
        self.processed.iter().map(|f| f.count).sum()
    }
}

/// Linkify every note under `vault_root` matching `pattern`.
///
/// Documentation files are skipped. A failing file is recorded and the batch
/// carries on.
pub fn linkify_all(
    linker: &Linker,
    vault_root: &Path,
    pattern: &str,
    limit: Option<usize>,
    write: bool,
) -> Result<LinkifyReport> {
    let files: Vec<_> = list_matching(vault_root, pattern)?
        .into_iter()
        .filter(|f| {
            let rel = relative_path(vault_root, f);
            let basename = strip_note_extension(rel.rsplit('/').next().unwrap_or(&rel));
            !is_doc_basename(basename)
        })
        .collect();

    let mut report = LinkifyReport {
        matched: files.len(),
        ..LinkifyReport::default()
    };

    let take = limit.filter(|n| *n > 0).unwrap_or(files.len());
    for file in files.iter().take(take) {
        let rel_path = relative_path(vault_root, file);
        match linker.linkify_file(file, write) {
            Ok(result) => report.processed.push(FileLinks {
                rel_path,
                count: result.count,
            }),
            Err(e) => {
                warn!("Failed to linkify {}: {}", rel_path, e);
                report.failures.push((rel_path, e));
            }
        }
    }

    info!(
        "Linkified {} of {} matched files ({} links)",
        report.processed.len(),
        report.matched,
        report.total_links()
    );
    Ok(report)
}
