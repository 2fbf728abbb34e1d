//! Table Dependency Graph
//!
//! Table-level view of the active relations: an edge runs from the parent
//! table to the child table. Used for cycle detection and for a parent-first
//! load order.

use petgraph::algo::{kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

use crate::error::{RegistryError, Result};
use crate::registry::Registry;

/// Directed parent -> child table graph
#[derive(Debug, Clone)]
pub struct RelationGraph {
    graph: DiGraph<String, usize>,
    indices: HashMap<String, NodeIndex>,
    /// Tables with a relation onto themselves, kept out of the graph
    self_referencing: Vec<String>,
}

impl RelationGraph {
    /// Build from the registry's active relations. Edge weights count the
    /// relations between the two tables.
    pub fn from_registry(registry: &Registry) -> Self {
        let mut graph = DiGraph::new();
        let mut indices: HashMap<String, NodeIndex> = HashMap::new();
        let mut self_referencing = Vec::new();

        for relation in registry.active_relations() {
            let parent = *indices
                .entry(relation.parent.table.clone())
                .or_insert_with(|| graph.add_node(relation.parent.table.clone()));
            let child = *indices
                .entry(relation.child.table.clone())
                .or_insert_with(|| graph.add_node(relation.child.table.clone()));

            if parent == child {
                if !self_referencing.contains(&relation.parent.table) {
                    self_referencing.push(relation.parent.table.clone());
                }
                continue;
            }

            match graph.find_edge(parent, child) {
                Some(edge) => graph[edge] += 1,
                None => {
                    graph.add_edge(parent, child, 1);
                }
            }
        }

        Self {
            graph,
            indices,
            self_referencing,
        }
    }

    pub fn table_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn contains(&self, table: &str) -> bool {
        self.indices.contains_key(table)
    }

    pub fn self_referencing(&self) -> &[String] {
        &self.self_referencing
    }

    /// Tables referenced by `table`'s columns
    pub fn parents_of(&self, table: &str) -> Vec<&str> {
        self.neighbors(table, petgraph::Direction::Incoming)
    }

    /// Tables whose columns reference `table`
    pub fn children_of(&self, table: &str) -> Vec<&str> {
        self.neighbors(table, petgraph::Direction::Outgoing)
    }

    fn neighbors(&self, table: &str, direction: petgraph::Direction) -> Vec<&str> {
        let Some(&idx) = self.indices.get(table) else {
            return Vec::new();
        };
        let mut names: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Groups of two or more tables that reference each other in a loop.
    /// Members are sorted, groups ordered by their first member.
    pub fn cycles(&self) -> Vec<Vec<String>> {
        let mut groups: Vec<Vec<String>> = kosaraju_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|scc| {
                let mut members: Vec<String> = scc.into_iter().map(|n| self.graph[n].clone()).collect();
                members.sort();
                members
            })
            .collect();
        groups.sort();
        groups
    }

    /// Tables ordered so every parent precedes its children
    pub fn load_order(&self) -> Result<Vec<String>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order.into_iter().map(|n| self.graph[n].clone()).collect()),
            Err(cycle) => {
                let table = &self.graph[cycle.node_id()];
                let members = self
                    .cycles()
                    .into_iter()
                    .find(|group| group.contains(table))
                    .unwrap_or_else(|| vec![table.clone()]);
                Err(RegistryError::Cycle(members))
            }
        }
    }
}
