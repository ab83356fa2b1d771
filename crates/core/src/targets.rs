//! Static mapping from storage tables to rendering targets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Immutable mapping from one storage table to its rendering model and
/// document name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportTarget {
    /// Storage table name as it appears in the database.
    pub table: String,
    /// Logical model handle the renderer exports.
    pub model: String,
    /// Document name (without extension) the rows render into.
    pub document: String,
}

impl ExportTarget {
    pub fn new(
        table: impl Into<String>,
        model: impl Into<String>,
        document: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            model: model.into(),
            document: document.into(),
        }
    }
}

/// Registry of export targets with tolerant name resolution.
///
/// Lookups are case-insensitive and accept both the plural storage name and
/// the singular logical name (`Orders` / `Order`), mirroring how raw
/// statements refer to tables.
#[derive(Debug, Clone, Default)]
pub struct ExportTargetRegistry {
    targets: Vec<ExportTarget>,
    by_key: HashMap<String, usize>,
}

impl ExportTargetRegistry {
    pub fn new(targets: Vec<ExportTarget>) -> Self {
        let mut by_key = HashMap::new();
        for (index, target) in targets.iter().enumerate() {
            by_key.insert(target.table.to_ascii_lowercase(), index);
            by_key
                .entry(target.model.to_ascii_lowercase())
                .or_insert(index);
        }
        Self { targets, by_key }
    }

    /// All registered targets in declaration order.
    pub fn targets(&self) -> &[ExportTarget] {
        &self.targets
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Resolve `name` to a target: exact match first, then the pluralized
    /// form, then the name with one trailing `s` stripped.
    pub fn resolve(&self, name: &str) -> Option<&ExportTarget> {
        let key = name.trim().to_ascii_lowercase();
        if let Some(&index) = self.by_key.get(&key) {
            return Some(&self.targets[index]);
        }
        let pluralized = format!("{key}s");
        if let Some(&index) = self.by_key.get(&pluralized) {
            return Some(&self.targets[index]);
        }
        if let Some(stripped) = key.strip_suffix('s') {
            if let Some(&index) = self.by_key.get(stripped) {
                return Some(&self.targets[index]);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ExportTargetRegistry {
        ExportTargetRegistry::new(vec![
            ExportTarget::new("Orders", "Order", "orders"),
            ExportTarget::new("MenuItems", "MenuItem", "menu"),
            ExportTarget::new("Staff", "Staff", "staff"),
        ])
    }

    #[test]
    fn resolves_exact_table_name() {
        assert_eq!(registry().resolve("Orders").unwrap().document, "orders");
    }

    #[test]
    fn resolves_case_insensitively() {
        assert_eq!(registry().resolve("orders").unwrap().document, "orders");
        assert_eq!(registry().resolve("MENUITEMS").unwrap().document, "menu");
    }

    #[test]
    fn resolves_singular_logical_name() {
        assert_eq!(registry().resolve("Order").unwrap().document, "orders");
        assert_eq!(registry().resolve("MenuItem").unwrap().document, "menu");
    }

    #[test]
    fn resolves_uninflected_name() {
        assert_eq!(registry().resolve("Staff").unwrap().document, "staff");
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(registry().resolve("NotARealTable").is_none());
    }
}
