#![allow(dead_code)]

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use vault_indexing::load_config;
use vault_schemas::VaultConfig;

/// A small vault with one inbox note, one person, one concept and an empty
/// stubs folder
pub fn basic_vault() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "00-inbox/note.md",
        "---\ncreated: 2026-01-01\ntype: capture\n---\n\n# Inbox note\n",
    );
    write(
        root,
        "03-people/alice.md",
        "---\ncreated: 2026-01-01\ntype: person\naliases:\n  - Alice Example\n---\n\n# Alice\n",
    );
    write(
        root,
        "02-concepts/example-concept.md",
        "---\ncreated: 2026-01-01\ntype: concept\naliases: [Example Concept]\n---\n\n# Example Concept\n",
    );
    fs::create_dir_all(root.join("99-stubs")).unwrap();

    dir
}

pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

pub fn append(root: &Path, rel: &str, contents: &str) {
    let existing = read(root, rel);
    fs::write(root.join(rel), format!("{}{}", existing, contents)).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

pub fn config(dir: &TempDir) -> VaultConfig {
    load_config(dir.path()).unwrap()
}
