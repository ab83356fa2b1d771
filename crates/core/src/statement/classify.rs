//! Lexical statement classification.

use serde::{Deserialize, Serialize};

/// Keywords that get a warning log when executed outside hardened mode.
const DESTRUCTIVE_KEYWORDS: [&str; 7] = [
    "DROP", "DELETE", "TRUNCATE", "ALTER", "CREATE", "INSERT", "UPDATE",
];

/// Operation kind derived from a statement's leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    /// SELECT: read-only, executed, rows returned, never exports.
    Query,
    /// PRAGMA: introspection, same treatment as a query.
    Pragma,
    /// Everything else.
    Mutation,
}

/// Ephemeral classification of one raw statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementClassification {
    pub kind: StatementKind,
    /// First identifier after INSERT INTO / UPDATE / DELETE FROM. Other
    /// mutation forms carry no target and trigger no export.
    pub target_table: Option<String>,
}

/// Classify `sql` by its leading keyword, case-insensitively after trim.
pub fn classify_statement(sql: &str) -> StatementClassification {
    let trimmed = sql.trim();
    let leading = trimmed
        .split_whitespace()
        .next()
        .map(str::to_ascii_uppercase)
        .unwrap_or_default();

    let kind = match leading.as_str() {
        "SELECT" => StatementKind::Query,
        "PRAGMA" => StatementKind::Pragma,
        _ => StatementKind::Mutation,
    };
    let target_table = match kind {
        StatementKind::Mutation => mutation_target(trimmed),
        _ => None,
    };
    StatementClassification { kind, target_table }
}

/// True when `sql` contains a destructive keyword anywhere in its text.
pub fn has_destructive_keyword(sql: &str) -> bool {
    let upper = sql.to_ascii_uppercase();
    DESTRUCTIVE_KEYWORDS
        .iter()
        .any(|keyword| upper.contains(keyword))
}

/// Strict identifier check for names interpolated into introspection SQL.
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

/// Extract the target table of INSERT INTO / UPDATE / DELETE FROM.
///
/// A deliberate lexical approximation: no quoted identifiers, schema
/// qualification, or multi-table statements. Only the first table matters
/// for export triggering.
fn mutation_target(sql: &str) -> Option<String> {
    let mut tokens = sql.split_whitespace();
    let first = tokens.next()?.to_ascii_uppercase();
    let candidate = match first.as_str() {
        "INSERT" => {
            let second = tokens.next()?;
            if !second.eq_ignore_ascii_case("INTO") {
                return None;
            }
            tokens.next()?
        }
        "UPDATE" => tokens.next()?,
        "DELETE" => {
            let second = tokens.next()?;
            if !second.eq_ignore_ascii_case("FROM") {
                return None;
            }
            tokens.next()?
        }
        _ => return None,
    };

    let identifier: String = candidate
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    if identifier.is_empty() {
        None
    } else {
        Some(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_is_query_regardless_of_case_and_padding() {
        assert_eq!(classify_statement("SELECT * FROM X").kind, StatementKind::Query);
        assert_eq!(classify_statement("select * from x").kind, StatementKind::Query);
        assert_eq!(
            classify_statement("  Select * From X  ").kind,
            StatementKind::Query
        );
    }

    #[test]
    fn pragma_is_never_a_mutation() {
        let classification = classify_statement("PRAGMA table_info(Orders)");
        assert_eq!(classification.kind, StatementKind::Pragma);
        assert_eq!(classification.target_table, None);
    }

    #[test]
    fn insert_extracts_target_table() {
        let classification = classify_statement("INSERT INTO Orders (status) VALUES ('new')");
        assert_eq!(classification.kind, StatementKind::Mutation);
        assert_eq!(classification.target_table.as_deref(), Some("Orders"));
    }

    #[test]
    fn insert_target_survives_attached_parenthesis() {
        let classification = classify_statement("INSERT INTO Orders(status) VALUES ('new')");
        assert_eq!(classification.target_table.as_deref(), Some("Orders"));
    }

    #[test]
    fn update_and_delete_extract_target_table() {
        assert_eq!(
            classify_statement("UPDATE Orders SET status = 'done'")
                .target_table
                .as_deref(),
            Some("Orders")
        );
        assert_eq!(
            classify_statement("delete from Orders where id = 1")
                .target_table
                .as_deref(),
            Some("Orders")
        );
    }

    #[test]
    fn ddl_is_mutation_without_target() {
        let classification = classify_statement("DROP TABLE Orders");
        assert_eq!(classification.kind, StatementKind::Mutation);
        assert_eq!(classification.target_table, None);
    }

    #[test]
    fn destructive_keywords_are_flagged() {
        assert!(has_destructive_keyword("DELETE FROM Orders"));
        assert!(has_destructive_keyword("drop table Orders"));
        assert!(!has_destructive_keyword("SELECT * FROM Orders WHERE status = 'open'"));
    }

    #[test]
    fn identifier_validation() {
        assert!(is_valid_identifier("Orders"));
        assert!(is_valid_identifier("_audit_log2"));
        assert!(!is_valid_identifier("2fast"));
        assert!(!is_valid_identifier("Orders; DROP TABLE x"));
        assert!(!is_valid_identifier(""));
    }
}
