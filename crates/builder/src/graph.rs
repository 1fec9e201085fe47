// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dependency-graph resolution over a pipeline's `needs` edges: computing
//! the transitive closure from a set of requested actions, and detecting
//! cycles via Kahn's algorithm so a cyclic pipeline produces a precise,
//! located error instead of infinite recursion.

use indexmap::{IndexMap, IndexSet};

use rap_adapters::Pipeline;

use crate::error::BuildError;

/// Starting from `roots`, walks `needs` edges backwards (dependencies of
/// dependencies) and returns every action reachable, including the roots
/// themselves. Order is insertion order (roots first), not topological.
pub fn transitive_needs(
    pipeline: &Pipeline,
    roots: &[String],
) -> Result<IndexSet<String>, BuildError> {
    let mut seen = IndexSet::new();
    let mut stack: Vec<String> = roots.to_vec();

    while let Some(name) = stack.pop() {
        if seen.contains(&name) {
            continue;
        }
        let action = pipeline
            .action(&name)
            .ok_or_else(|| BuildError::MissingAction {
                action: name.clone(),
            })?;
        seen.insert(name.clone());
        for dep in &action.needs {
            if !seen.contains(dep) {
                stack.push(dep.clone());
            }
        }
    }

    Ok(seen)
}

/// Topologically sorts `actions` (dependencies before dependents) using
/// Kahn's algorithm. Returns the cycle's member actions as an error if the
/// subgraph induced by `actions` is not a DAG.
pub fn topological_order(
    pipeline: &Pipeline,
    actions: &IndexSet<String>,
) -> Result<Vec<String>, BuildError> {
    let mut in_degree: IndexMap<String, usize> =
        actions.iter().map(|a| (a.clone(), 0)).collect();
    let mut dependents: IndexMap<String, Vec<String>> =
        actions.iter().map(|a| (a.clone(), Vec::new())).collect();

    for name in actions {
        let Some(action) = pipeline.action(name) else {
            continue;
        };
        for dep in &action.needs {
            if actions.contains(dep) {
                dependents.entry(dep.clone()).or_default().push(name.clone());
                *in_degree.entry(name.clone()).or_insert(0) += 1;
            }
        }
    }

    let mut queue: Vec<String> = in_degree
        .iter()
        .filter(|(_, degree)| **degree == 0)
        .map(|(name, _)| name.clone())
        .collect();

    let mut order = Vec::with_capacity(actions.len());
    while let Some(name) = queue.pop() {
        order.push(name.clone());
        if let Some(deps) = dependents.get(&name) {
            for dependent in deps {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 {
                        queue.push(dependent.clone());
                    }
                }
            }
        }
    }

    if order.len() != actions.len() {
        let remaining: Vec<String> = actions
            .iter()
            .filter(|a| !order.contains(a))
            .cloned()
            .collect();
        return Err(BuildError::CyclicDependency { actions: remaining });
    }

    Ok(order)
}

#[cfg(test)]
#[path = "graph_tests.rs"]
mod tests;
