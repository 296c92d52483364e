//! Merging independently-authored parameterized statements into one
//! all-or-nothing transaction block.

pub mod batch;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::Bindings;

/// Merges N parameterized statements into a single collision-free
/// transaction block.
///
/// Every `add` call renames the statement's placeholders with a per-instance
/// counter (`$email` becomes `$v1_email`), so statements written in isolation
/// can share one request without parameter collisions. Statements keep their
/// add order; [`build`](Self::build) wraps them in a `BEGIN TRANSACTION;` /
/// `COMMIT TRANSACTION;` block that the store executes as one request.
///
/// Intended for a single caller. The rename counter is an atomic, so
/// concurrent `add` calls cannot mint duplicate names, but statement order
/// across concurrent callers is unspecified.
///
/// # Examples
///
/// ```
/// use flexstore::{bindings, StatementComposer};
///
/// let mut composer = StatementComposer::new();
/// let renames = composer.add("CREATE user SET email = $email", bindings! { "email" => "a@x.com" });
/// composer.add("CREATE profile SET owner = $owner", bindings! { "owner" => "user:1" });
///
/// assert_eq!(renames["email"], "v1_email");
/// let (text, vars) = composer.build();
/// assert!(text.starts_with("BEGIN TRANSACTION;"));
/// assert_eq!(vars.len(), 2);
/// ```
pub struct StatementComposer {
    counter: AtomicU64,
    statements: Vec<String>,
    bindings: Bindings,
}

impl StatementComposer {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            statements: Vec::new(),
            bindings: Bindings::new(),
        }
    }

    /// Append a parameterized statement, renaming its placeholders.
    ///
    /// Returns the original-name to renamed-name map so a later `add` can
    /// reference a generated name (e.g. an identifier created by an earlier
    /// statement in the same block).
    ///
    /// Placeholders are rewritten by token-boundary-aware substring
    /// replacement of `$name`: `$email` never clobbers `$email_verified`.
    /// Placeholder names are limited to `[A-Za-z0-9_]`.
    pub fn add(&mut self, query: &str, vars: Bindings) -> BTreeMap<String, String> {
        let mut rewritten = query.to_string();
        let mut renames = BTreeMap::new();

        for (name, value) in vars {
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            let renamed = format!("v{n}_{name}");
            rewritten = rewrite_placeholder(&rewritten, &name, &renamed);
            self.bindings.insert(renamed.clone(), value);
            renames.insert(name, renamed);
        }

        self.statements.push(rewritten);
        renames
    }

    /// Append a statement verbatim, for statements with no parameters.
    pub fn add_raw(&mut self, query: &str) {
        self.statements.push(query.to_string());
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Build the one-shot transaction block.
    ///
    /// Statements appear in add order, each terminated by `;`, wrapped in
    /// begin/commit markers. Zero statements build to empty text and empty
    /// bindings. Identical add sequences always produce identical output.
    pub fn build(self) -> (String, Bindings) {
        if self.statements.is_empty() {
            return (String::new(), Bindings::new());
        }

        let mut text = String::from("BEGIN TRANSACTION;\n");
        for statement in &self.statements {
            text.push_str(statement.trim_end().trim_end_matches(';'));
            text.push_str(";\n");
        }
        text.push_str("COMMIT TRANSACTION;");

        (text, self.bindings)
    }
}

impl Default for StatementComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// Replace `$name` with `$renamed` wherever the match ends at a token
/// boundary, leaving longer placeholders that merely share the prefix alone.
fn rewrite_placeholder(query: &str, name: &str, renamed: &str) -> String {
    let token = format!("${name}");
    let mut out = String::with_capacity(query.len() + renamed.len());
    let mut rest = query;

    while let Some(pos) = rest.find(&token) {
        let after = &rest[pos + token.len()..];
        let at_boundary = after
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_alphanumeric() && c != '_');

        out.push_str(&rest[..pos]);
        if at_boundary {
            out.push('$');
            out.push_str(renamed);
        } else {
            out.push_str(&token);
        }
        rest = after;
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings;

    #[test]
    fn add_renames_placeholders_per_statement() {
        let mut composer = StatementComposer::new();
        let first = composer.add("CREATE user SET email = $email", bindings! { "email" => "a@x.com" });
        let second = composer.add("CREATE profile SET email = $email", bindings! { "email" => "a@x.com" });

        assert_eq!(first["email"], "v1_email");
        assert_eq!(second["email"], "v2_email");

        let (text, vars) = composer.build();
        assert!(text.contains("CREATE user SET email = $v1_email"));
        assert!(text.contains("CREATE profile SET email = $v2_email"));
        assert_eq!(vars["v1_email"], "a@x.com");
        assert_eq!(vars["v2_email"], "a@x.com");
        assert!(text.starts_with("BEGIN TRANSACTION;"));
        assert!(text.ends_with("COMMIT TRANSACTION;"));
    }

    #[test]
    fn same_name_in_two_statements_stays_independent() {
        let mut composer = StatementComposer::new();
        composer.add("UPDATE a SET x = $x", bindings! { "x" => 1 });
        composer.add("UPDATE b SET x = $x", bindings! { "x" => 2 });

        let (text, vars) = composer.build();
        assert!(text.contains("UPDATE a SET x = $v1_x"));
        assert!(text.contains("UPDATE b SET x = $v2_x"));
        assert_eq!(vars["v1_x"], 1);
        assert_eq!(vars["v2_x"], 2);
    }

    #[test]
    fn statements_keep_add_order() {
        let mut composer = StatementComposer::new();
        composer.add_raw("CREATE a");
        composer.add_raw("CREATE b");
        composer.add_raw("CREATE c");

        let (text, _) = composer.build();
        let a = text.find("CREATE a").unwrap();
        let b = text.find("CREATE b").unwrap();
        let c = text.find("CREATE c").unwrap();
        assert!(a < b && b < c);
    }

    #[test]
    fn empty_composer_builds_empty_block() {
        let composer = StatementComposer::new();
        let (text, vars) = composer.build();
        assert!(text.is_empty());
        assert!(vars.is_empty());
    }

    #[test]
    fn rename_map_allows_cross_statement_references() {
        let mut composer = StatementComposer::new();
        let renames = composer.add("CREATE user SET id = $id", bindings! { "id" => "user:1" });
        let user_var = &renames["id"];

        composer.add_raw(&format!("CREATE profile SET owner = ${user_var}"));
        let (text, _) = composer.build();
        assert!(text.contains("CREATE profile SET owner = $v1_id"));
    }

    #[test]
    fn placeholder_rewrite_respects_token_boundaries() {
        let out = rewrite_placeholder("SET a = $email, b = $email_verified", "email", "v1_email");
        assert_eq!(out, "SET a = $v1_email, b = $email_verified");
    }

    #[test]
    fn placeholder_rewrite_handles_end_of_statement() {
        let out = rewrite_placeholder("WHERE email = $email", "email", "v3_email");
        assert_eq!(out, "WHERE email = $v3_email");
    }

    #[test]
    fn identical_add_sequences_are_deterministic() {
        let compose = || {
            let mut composer = StatementComposer::new();
            composer.add(
                "CREATE event SET name = $name, at = $at",
                bindings! { "name" => "launch", "at" => "2026-01-01" },
            );
            composer.add("DELETE vote WHERE event = $event", bindings! { "event" => "event:1" });
            composer.build()
        };

        assert_eq!(compose(), compose());
    }

    #[test]
    fn trailing_semicolons_are_not_doubled() {
        let mut composer = StatementComposer::new();
        composer.add_raw("CREATE a;");
        let (text, _) = composer.build();
        assert!(text.contains("CREATE a;\n"));
        assert!(!text.contains("CREATE a;;"));
    }
}
