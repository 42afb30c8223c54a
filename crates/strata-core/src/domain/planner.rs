//! Dependency and conflict planning.
//!
//! Builds a graph with an edge `A -> B` whenever `B` requires `A`, orders it
//! with Kahn's algorithm (ties broken by recipe order) and checks every pair of
//! selected modules for declared conflicts. All problems found are returned
//! together; any of them is fatal before a single file is written.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::domain::{
    entities::adapter::{AdapterMetadata, Requirement},
    error::DomainError,
    value_objects::ModuleKey,
};

/// The planner's view of one recipe module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanNode {
    pub key: ModuleKey,
    pub requires: Vec<Requirement>,
    pub conflicts: Vec<Requirement>,
}

impl PlanNode {
    /// Node for a module whose adapter is unknown: it contributes no edges.
    pub fn bare(key: ModuleKey) -> Self {
        Self {
            key,
            requires: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    pub fn from_metadata(key: ModuleKey, metadata: &AdapterMetadata) -> Self {
        Self {
            key,
            requires: metadata.requires.clone(),
            conflicts: metadata.conflicts.clone(),
        }
    }
}

/// A valid execution order plus the direct dependency sets behind it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub order: Vec<ModuleKey>,
    dependencies: BTreeMap<ModuleKey, BTreeSet<ModuleKey>>,
}

impl ExecutionPlan {
    /// Selected modules `key` directly requires. Installed modules are not
    /// listed since they never run.
    pub fn dependencies_of(&self, key: &ModuleKey) -> impl Iterator<Item = &ModuleKey> {
        self.dependencies.get(key).into_iter().flatten()
    }

    pub fn position(&self, key: &ModuleKey) -> Option<usize> {
        self.order.iter().position(|k| k == key)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DependencyPlanner;

impl DependencyPlanner {
    /// Compute an execution order for `nodes` (in recipe order).
    ///
    /// `installed` modules satisfy requirements and take part in conflict
    /// checks but are never ordered.
    pub fn plan(
        nodes: &[PlanNode],
        installed: &[ModuleKey],
    ) -> Result<ExecutionPlan, Vec<DomainError>> {
        let mut errors = Vec::new();

        // Edges, as indices into `nodes`: deps[i] holds what node i requires.
        let mut deps: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); nodes.len()];

        for (i, node) in nodes.iter().enumerate() {
            for requirement in &node.requires {
                let selected: Vec<usize> = nodes
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| *j != i && requirement.matches(&other.key))
                    .map(|(j, _)| j)
                    .collect();
                let satisfied_by_installed = installed
                    .iter()
                    .any(|k| *k != node.key && requirement.matches(k));

                if selected.is_empty() && !satisfied_by_installed {
                    errors.push(DomainError::MissingDependency {
                        module: node.key.id.clone(),
                        dependency: requirement.to_string(),
                    });
                }
                deps[i].extend(selected);
            }
        }

        let order = match Self::topological_order(nodes, &deps) {
            Ok(order) => Some(order),
            Err(cycle) => {
                errors.push(DomainError::CyclicDependency { cycle });
                None
            }
        };

        errors.extend(Self::conflicts(nodes, installed));

        if !errors.is_empty() {
            return Err(errors);
        }

        let order = order.unwrap_or_default();
        let dependencies = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let set = deps[i].iter().map(|&j| nodes[j].key.clone()).collect();
                (node.key.clone(), set)
            })
            .collect();

        Ok(ExecutionPlan {
            order: order.into_iter().map(|i| nodes[i].key.clone()).collect(),
            dependencies,
        })
    }

    /// Kahn's algorithm; the ready set is ordered by recipe index, which keeps
    /// the result stable. On failure returns one cycle, first node repeated.
    fn topological_order(
        nodes: &[PlanNode],
        deps: &[BTreeSet<usize>],
    ) -> Result<Vec<usize>, Vec<String>> {
        let mut in_degree: Vec<usize> = deps.iter().map(BTreeSet::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for (i, set) in deps.iter().enumerate() {
            for &j in set {
                dependents[j].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(nodes.len());

        while let Some(current) = ready.pop_first() {
            order.push(current);
            for &next in &dependents[current] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        if order.len() == nodes.len() {
            return Ok(order);
        }

        let done: HashSet<usize> = order.into_iter().collect();
        Err(Self::find_cycle(nodes, deps, &done))
    }

    /// Walk requirement edges among unordered nodes until one repeats.
    /// Every unordered node has at least one unordered dependency, so the walk
    /// always closes a loop.
    fn find_cycle(
        nodes: &[PlanNode],
        deps: &[BTreeSet<usize>],
        done: &HashSet<usize>,
    ) -> Vec<String> {
        let Some(start) = (0..nodes.len()).find(|i| !done.contains(i)) else {
            return Vec::new();
        };

        let mut path = vec![start];
        let mut current = start;
        loop {
            let Some(&next) = deps[current].iter().find(|j| !done.contains(j)) else {
                break;
            };
            if let Some(pos) = path.iter().position(|&p| p == next) {
                let mut cycle: Vec<String> =
                    path[pos..].iter().map(|&i| nodes[i].key.id.clone()).collect();
                cycle.push(nodes[next].key.id.clone());
                return cycle;
            }
            path.push(next);
            current = next;
        }

        path.into_iter().map(|i| nodes[i].key.id.clone()).collect()
    }

    /// Pairs of selected modules where either side declares a conflict with
    /// the other. Each pair is reported once.
    fn conflicts(nodes: &[PlanNode], installed: &[ModuleKey]) -> Vec<DomainError> {
        let mut errors = Vec::new();
        let mut reported: HashSet<(ModuleKey, ModuleKey)> = HashSet::new();

        let mut report = |a: &ModuleKey, b: &ModuleKey, errors: &mut Vec<DomainError>| {
            let pair = if a <= b {
                (a.clone(), b.clone())
            } else {
                (b.clone(), a.clone())
            };
            if reported.insert(pair) {
                errors.push(DomainError::ModuleConflict {
                    module: a.id.clone(),
                    conflicts_with: b.id.clone(),
                });
            }
        };

        for (i, a) in nodes.iter().enumerate() {
            for b in &nodes[i + 1..] {
                if a.conflicts.iter().any(|c| c.matches(&b.key)) {
                    report(&a.key, &b.key, &mut errors);
                } else if b.conflicts.iter().any(|c| c.matches(&a.key)) {
                    report(&b.key, &a.key, &mut errors);
                }
            }
            for other in installed.iter().filter(|k| **k != a.key) {
                if a.conflicts.iter().any(|c| c.matches(other)) {
                    report(&a.key, other, &mut errors);
                }
            }
        }

        errors
    }
}
