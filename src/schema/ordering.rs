//! Foreign-key dependency ordering.
//!
//! Tables are created referenced-first. A cycle in the declared references
//! is a startup error.

use std::collections::HashMap;

/// Table metadata for dependency ordering.
#[derive(Debug, Clone)]
pub struct TableInfo {
    pub name: String,
    pub sql: String,
    /// Tables this table depends on.
    pub dependencies: Vec<String>,
}

/// Topologically sort tables: dependencies first, dependents last.
///
/// The queue is kept sorted so the result is deterministic.
///
/// # Errors
///
/// Returns the names of the tables stuck in a cycle.
pub fn topological_sort(tables: &[TableInfo]) -> Result<Vec<String>, String> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for table in tables {
        in_degree.insert(&table.name, table.dependencies.len());
        dependents.entry(&table.name).or_default();
    }
    for table in tables {
        for dep in &table.dependencies {
            if let Some(list) = dependents.get_mut(dep.as_str()) {
                list.push(&table.name);
            }
        }
    }

    let mut queue: Vec<&str> = tables
        .iter()
        .filter(|t| t.dependencies.is_empty())
        .map(|t| t.name.as_str())
        .collect();
    queue.sort_unstable();

    let mut result = Vec::new();
    while let Some(current) = queue.first().copied() {
        queue.remove(0);
        result.push(current.to_string());
        if let Some(list) = dependents.get(current) {
            for dependent in list.clone() {
                let degree = in_degree
                    .get_mut(dependent)
                    .ok_or_else(|| format!("unknown table in graph: {dependent}"))?;
                *degree -= 1;
                if *degree == 0 {
                    queue.push(dependent);
                    queue.sort_unstable();
                }
            }
        }
    }

    if result.len() != tables.len() {
        let stuck: Vec<&str> = in_degree
            .iter()
            .filter(|(_, d)| **d > 0)
            .map(|(name, _)| *name)
            .collect();
        return Err(format!(
            "circular foreign key references between tables: {}",
            stuck.join(", ")
        ));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::registry;
    use crate::schema::ddl;

    fn table(name: &str, deps: &[&str]) -> TableInfo {
        TableInfo {
            name: name.to_string(),
            sql: String::new(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
        }
    }

    #[test]
    fn dependencies_come_first() {
        let tables = vec![
            table("events", &["customers", "locations"]),
            table("customers", &[]),
            table("locations", &[]),
            table("commitments", &["promoters", "events"]),
            table("promoters", &[]),
        ];
        let order = topological_sort(&tables).unwrap();
        let pos = |n: &str| order.iter().position(|t| t == n).unwrap();
        assert!(pos("customers") < pos("events"));
        assert!(pos("locations") < pos("events"));
        assert!(pos("events") < pos("commitments"));
        assert!(pos("promoters") < pos("commitments"));
    }

    #[test]
    fn cycles_are_reported() {
        let tables = vec![table("a", &["b"]), table("b", &["a"]), table("c", &[])];
        let err = topological_sort(&tables).unwrap_err();
        assert!(err.contains("circular"));
        assert!(err.contains('a'));
        assert!(err.contains('b'));
    }

    #[test]
    fn full_registry_is_acyclic() {
        let tables: Vec<TableInfo> = registry()
            .iter()
            .map(|def| TableInfo {
                name: def.table.to_string(),
                sql: String::new(),
                dependencies: ddl::dependencies(def),
            })
            .collect();
        let order = topological_sort(&tables).unwrap();
        assert_eq!(order.len(), registry().len());
        let pos = |n: &str| order.iter().position(|t| t == n).unwrap();
        assert!(pos("countries") < pos("employees"));
        assert!(pos("customers") < pos("invoices"));
        assert!(pos("events") < pos("commitments"));
    }
}
