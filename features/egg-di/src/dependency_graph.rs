use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use crate::{
    provider::{Provider, ProviderId, ProviderInfo},
    signature::{find_marker, Signature},
};

/// Graph of all providers reachable from a signature through eggs
///
/// Used to check for circular dependencies before calling and enables visualization of the
/// hatching order. Parameters matched by name are not part of the graph - their values only
/// exist during a call.
pub struct DependencyGraph {
    roots: Vec<ProviderId>,
    map: BTreeMap<ProviderId, DependencyGraphEntry>,
    unbound: Vec<DependencyGraphError>,
}
impl DependencyGraph {
    pub fn of(signature: &Signature) -> Self {
        let mut graph = Self {
            roots: Vec::new(),
            map: BTreeMap::new(),
            unbound: Vec::new(),
        };

        graph.roots = graph.add_signature(signature, None);
        graph
    }

    /// Adds all providers reachable from `signature`, returning its direct dependencies
    fn add_signature(
        &mut self,
        signature: &Signature,
        required_by: Option<&ProviderInfo>,
    ) -> Vec<ProviderId> {
        let mut dependencies = Vec::new();

        for param in signature.params() {
            let Some(egg) = find_marker(param) else {
                continue;
            };

            match egg.provider() {
                Ok(provider) => {
                    dependencies.push(provider.id());
                    self.add(&provider);
                }
                Err(_) => self.unbound.push(DependencyGraphError::Unbound {
                    egg: egg.to_string(),
                    required_by: required_by
                        .map(|info| info.name.clone())
                        .unwrap_or_else(|| "target".to_string()),
                }),
            }
        }

        dependencies
    }

    fn add(&mut self, provider: &Provider) {
        if self.map.contains_key(&provider.id()) {
            return;
        }

        // Insert before recursing so cycles terminate
        self.map.insert(
            provider.id(),
            DependencyGraphEntry {
                info: provider.info().clone(),
                dependencies: Vec::new(),
            },
        );

        let dependencies = self.add_signature(provider.signature(), Some(provider.info()));
        if let Some(entry) = self.map.get_mut(&provider.id()) {
            entry.dependencies = dependencies;
        }
    }

    /// Providers the signature directly depends on
    pub fn roots(&self) -> impl Iterator<Item = &ProviderInfo> {
        self.roots
            .iter()
            .filter_map(|id| self.map.get(id).map(|entry| &entry.info))
    }

    /// All providers in the graph
    pub fn providers(&self) -> impl Iterator<Item = &ProviderInfo> {
        self.map.values().map(|entry| &entry.info)
    }

    /// Direct egg dependencies of a provider
    pub fn dependencies(&self, provider: ProviderId) -> Vec<&ProviderInfo> {
        self.map
            .get(&provider)
            .map(|entry| {
                entry
                    .dependencies
                    .iter()
                    .filter_map(|id| self.map.get(id).map(|dependency| &dependency.info))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate the graph
    ///
    /// Returns a list of all issues
    pub fn check(&self) -> Result<(), DependencyGraphErrors> {
        let mut checked = HashSet::new();
        let mut errors = self.unbound.clone();
        for entry in self.map.values() {
            let mut dependency_chain = Vec::new();
            check_recurse(
                self,
                &mut checked,
                &mut errors,
                &mut dependency_chain,
                entry,
            );
        }

        if !errors.is_empty() {
            return Err(DependencyGraphErrors { errors });
        }

        return Ok(());

        fn check_recurse(
            graph: &DependencyGraph,
            checked: &mut HashSet<ProviderId>,
            errors: &mut Vec<DependencyGraphError>,
            dependency_chain: &mut Vec<ProviderInfo>,
            entry: &DependencyGraphEntry,
        ) {
            // Circular Dependency Check
            if let Some(start) = dependency_chain.iter().position(|info| info.id == entry.info.id) {
                let mut chain: Vec<String> = dependency_chain[start..]
                    .iter()
                    .map(|info| info.name.clone())
                    .collect();
                chain.push(entry.info.name.clone()); // Add current so chain is complete

                errors.push(DependencyGraphError::CircularDependency {
                    from: dependency_chain[start].name.clone(),
                    to: entry.info.name.clone(),
                    chain,
                });
                return;
            }

            // Skip other checks if already checked
            if !checked.insert(entry.info.id) {
                return;
            };

            dependency_chain.push(entry.info.clone());

            for dependency in &entry.dependencies {
                if let Some(next_entry) = graph.map.get(dependency) {
                    check_recurse(graph, checked, errors, dependency_chain, next_entry);
                }
            }

            dependency_chain.pop();
        }
    }
}
impl std::fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for entry in self.map.values() {
            let dependencies: Vec<&str> = entry
                .dependencies
                .iter()
                .filter_map(|id| self.map.get(id).map(|dependency| dependency.info.name.as_str()))
                .collect();
            writeln!(f, "{} -> [{}]", entry.info.name, dependencies.join(", "))?;
        }
        Ok(())
    }
}

struct DependencyGraphEntry {
    info: ProviderInfo,
    dependencies: Vec<ProviderId>,
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("'{required_by}' needs {egg} but it was never bound")]
    Unbound { egg: String, required_by: String },
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {chain:?}")]
    CircularDependency {
        from: String,
        to: String,
        chain: Vec<String>,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
