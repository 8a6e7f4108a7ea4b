pub mod fix;
pub mod linkify;
pub mod promote;
pub mod rename;
pub mod rewriter;

pub use fix::{fix_text, fix_vault, safe_fix_rules, FileFix, FixReport};
pub use linkify::{linkify_all, FileLinks, Linker, LinkifyReport};
pub use promote::{
    apply_moves, generate_promotion_plan, guess_category, read_plan, stub_candidates,
    validate_plan, write_plan, ResolvedMove, StubCandidate, StubCategory, DEFAULT_MIN_REFS,
    DEFAULT_PLAN_FILE,
};
pub use rename::{apply_rename, find_note, plan_rename, retarget_links, LinkName, RenameOutcome, RenamePlan};
pub use rewriter::{rewrite, Rewrite, RewriteOptions, Rule};
pub use vault_indexing::{segments, strip_code};
