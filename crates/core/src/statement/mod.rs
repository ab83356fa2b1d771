//! Raw-statement execution path: classification, hardened-mode policy,
//! execution, and the synchronous export trigger for mutations.

mod classify;
mod executor;

pub use classify::{
    classify_statement, has_destructive_keyword, is_valid_identifier, StatementClassification,
    StatementKind,
};
pub use executor::{StatementExecutor, StatementOutput};
