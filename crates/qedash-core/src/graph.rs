use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::DatasetSchema;

/// Summary of FK graph structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphSummary {
    pub nodes: usize,
    pub edges: usize,
}

/// Report for FK dependency ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FkGraphReport {
    pub summary: FkGraphSummary,
    pub topo_order: Option<Vec<String>>,
    pub cycle: Option<Vec<String>>,
}

/// Build a deterministic FK dependency report for the dataset catalogue.
pub fn build_fk_graph_report(schema: &DatasetSchema) -> FkGraphReport {
    let graph = build_adjacency(schema);
    let nodes = graph.len();
    let edges = graph.values().map(|targets| targets.len()).sum();
    let summary = FkGraphSummary { nodes, edges };

    match toposort(&graph) {
        Ok(order) => FkGraphReport {
            summary,
            topo_order: Some(order),
            cycle: None,
        },
        Err(cycle) => FkGraphReport {
            summary,
            topo_order: None,
            cycle: Some(cycle),
        },
    }
}

/// Parent-first table order used for generation and bulk loads.
pub fn load_order(schema: &DatasetSchema) -> Result<Vec<String>> {
    let report = build_fk_graph_report(schema);
    match report.topo_order {
        Some(order) => Ok(order),
        None => Err(Error::Cycle(report.cycle.unwrap_or_default().join(", "))),
    }
}

fn build_adjacency(schema: &DatasetSchema) -> BTreeMap<String, BTreeSet<String>> {
    let mut graph: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for table in &schema.tables {
        graph.entry(table.name.clone()).or_default();

        for fk in &table.foreign_keys {
            // A self reference is still an edge so it shows up as a cycle.
            graph
                .entry(fk.referenced_table.clone())
                .or_default()
                .insert(table.name.clone());
        }
    }

    graph
}

fn toposort(
    graph: &BTreeMap<String, BTreeSet<String>>,
) -> std::result::Result<Vec<String>, Vec<String>> {
    let mut indegree: BTreeMap<String, usize> = BTreeMap::new();

    for node in graph.keys() {
        indegree.entry(node.clone()).or_insert(0);
    }

    for targets in graph.values() {
        for target in targets {
            *indegree.entry(target.clone()).or_insert(0) += 1;
        }
    }

    let mut ready: BTreeSet<String> = indegree
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| node.clone())
        .collect();

    let mut order = Vec::with_capacity(graph.len());

    while let Some(node) = ready.pop_first() {
        order.push(node.clone());

        if let Some(targets) = graph.get(&node) {
            for target in targets {
                if let Some(count) = indegree.get_mut(target) {
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        ready.insert(target.clone());
                    }
                }
            }
        }
    }

    if order.len() == graph.len() {
        Ok(order)
    } else {
        let cycle_nodes: Vec<String> = indegree
            .into_iter()
            .filter(|(_, count)| *count > 0)
            .map(|(node, _)| node)
            .collect();
        Err(cycle_nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{qe_schema, tables};

    fn position(order: &[String], table: &str) -> usize {
        order
            .iter()
            .position(|item| item == table)
            .unwrap_or_else(|| panic!("{table} missing from order"))
    }

    #[test]
    fn parents_precede_children() {
        let schema = qe_schema();
        let order = load_order(&schema).expect("acyclic catalogue");
        assert_eq!(order.len(), 10);

        for table in &schema.tables {
            for fk in &table.foreign_keys {
                assert!(
                    position(&order, &fk.referenced_table) < position(&order, &table.name),
                    "{} must load before {}",
                    fk.referenced_table,
                    table.name
                );
            }
        }
        assert!(position(&order, tables::ASSESSMENTS) < position(&order, tables::GRADES));
    }

    #[test]
    fn toposort_reports_cycle() {
        let mut schema = qe_schema();
        let students = schema
            .tables
            .iter_mut()
            .find(|table| table.name == tables::STUDENTS)
            .expect("students table");
        students.foreign_keys.push(crate::ForeignKeyDef::new(
            "student_id",
            tables::ADMISSIONS,
            "app_id",
        ));

        let report = build_fk_graph_report(&schema);
        assert!(report.topo_order.is_none());
        let cycle = report.cycle.expect("cycle members");
        assert!(cycle.contains(&tables::STUDENTS.to_string()));
        assert!(cycle.contains(&tables::ADMISSIONS.to_string()));
        assert!(matches!(load_order(&schema), Err(Error::Cycle(_))));
    }
}
