mod common;

use common::{append, basic_vault, config, write};
use vault_indexing::{scan_notes, VaultError};
use vault_rewrite::{
    apply_moves, generate_promotion_plan, read_plan, validate_plan, write_plan,
};
use vault_schemas::{PromotionMove, PromotionPlan};

const STUB: &str = "---\ncreated: 2026-01-01\ntype: stub\n---\n\n# stubby\n";

fn plan(moves: &[(&str, &str)]) -> PromotionPlan {
    PromotionPlan {
        vault_root: String::new(),
        generated_at: String::new(),
        moves: moves
            .iter()
            .map(|(from, to)| PromotionMove {
                from: from.to_string(),
                to_rel_path: to.to_string(),
            })
            .collect(),
    }
}

/// Five unqualified references meet the default threshold
#[test]
fn test_plan_written_and_dry_run_apply_moves_nothing() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "99-stubs/stubby.md", STUB);
    append(root, "00-inbox/note.md", &"\n[[stubby]]".repeat(5));
    let config = config(&dir);

    let notes = scan_notes(&config.vault_root).unwrap();
    let generated = generate_promotion_plan(&notes, &config, 5).unwrap();
    let plan_path = root.join("plan.json");
    write_plan(&generated, &plan_path).unwrap();

    let loaded = read_plan(&plan_path).unwrap();
    assert_eq!(loaded.moves.len(), 1);
    assert_eq!(loaded.moves[0].from, "stubby");
    assert_eq!(loaded.moves[0].to_rel_path, "02-concepts/stubby.md");

    // Validation alone never moves anything
    let moves = validate_plan(&loaded, &config).unwrap();
    assert_eq!(moves.len(), 1);
    assert!(root.join("99-stubs/stubby.md").exists());
    assert!(!root.join("02-concepts/stubby.md").exists());
}

#[test]
fn test_four_references_are_below_threshold() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "99-stubs/stubby.md", STUB);
    append(root, "00-inbox/note.md", &"\n[[stubby]]".repeat(4));
    append(root, "00-inbox/note.md", "\n[[99-stubs/stubby]]");
    let config = config(&dir);

    let notes = scan_notes(&config.vault_root).unwrap();
    let generated = generate_promotion_plan(&notes, &config, 5).unwrap();
    assert!(generated.moves.is_empty(), "qualified links must not count");
}

#[test]
fn test_apply_moves_validated_plan() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "99-stubs/stubby.md", STUB);
    let config = config(&dir);

    let moves = validate_plan(&plan(&[("stubby", "04-tools/stubby.md")]), &config).unwrap();
    assert_eq!(apply_moves(&moves).unwrap(), 1);

    assert!(!root.join("99-stubs/stubby.md").exists());
    assert_eq!(common::read(root, "04-tools/stubby.md"), STUB);
}

/// One bad move aborts the whole batch before anything moves
#[test]
fn test_invalid_plan_moves_nothing() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "99-stubs/one.md", STUB);
    write(root, "99-stubs/two.md", STUB);
    write(root, "02-concepts/two.md", "taken\n");
    let config = config(&dir);

    let bad = plan(&[
        ("one", "02-concepts/one.md"),
        ("two", "02-concepts/two.md"),
        ("ghost", "02-concepts/ghost.txt"),
        ("", "02-concepts/empty.md"),
    ]);
    let err = validate_plan(&bad, &config).unwrap_err();
    match &err {
        VaultError::Validation(problems) => {
            assert_eq!(problems.len(), 4, "problems: {:?}", problems);
            assert!(problems.iter().any(|p| p.contains("Destination already exists")));
            assert!(problems.iter().any(|p| p.contains("Missing stub file for 'ghost'")));
            assert!(problems.iter().any(|p| p.contains("must end with .md")));
            assert!(problems.iter().any(|p| p.starts_with("Invalid move")));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 1);

    assert!(root.join("99-stubs/one.md").exists());
    assert!(!root.join("02-concepts/one.md").exists());
}

#[test]
fn test_duplicate_and_escaping_destinations_rejected() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "99-stubs/one.md", STUB);
    write(root, "99-stubs/two.md", STUB);
    let config = config(&dir);

    let bad = plan(&[
        ("one", "02-concepts/same.md"),
        ("two", "02-concepts/same.md"),
        ("one", "../outside.md"),
    ]);
    let Err(VaultError::Validation(problems)) = validate_plan(&bad, &config) else {
        panic!("expected validation error");
    };
    assert!(problems.iter().any(|p| p.contains("Destination used more than once")));
    assert!(problems.iter().any(|p| p.contains("moved more than once")));
    assert!(problems.iter().any(|p| p.contains("outside the vault")));
}

#[test]
fn test_stale_plan_is_an_invariant_failure() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "99-stubs/stubby.md", STUB);
    let config = config(&dir);

    let moves = validate_plan(&plan(&[("stubby", "02-concepts/stubby.md")]), &config).unwrap();
    std::fs::remove_file(root.join("99-stubs/stubby.md")).unwrap();

    let err = apply_moves(&moves).unwrap_err();
    assert!(matches!(err, VaultError::Invariant(_)));
    assert_eq!(err.exit_code(), 3);
}

#[test]
fn test_malformed_plan_file() {
    let dir = basic_vault();
    let root = dir.path();
    write(root, "plan.json", "{\"vaultRoot\": \"x\"}");

    let err = read_plan(&root.join("plan.json")).unwrap_err();
    assert!(matches!(err, VaultError::PlanFormat { .. }));

    let err = read_plan(&root.join("missing.json")).unwrap_err();
    assert!(matches!(err, VaultError::PlanFormat { .. }));
    assert_eq!(err.exit_code(), 2);
}
