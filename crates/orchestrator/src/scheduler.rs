use std::collections::{BTreeMap, BTreeSet};

use pixelgen_core::AgentConfig;

use crate::error::{OrchestratorError, Result};

/// Group agents into dependency stages.
///
/// Stage `k` contains every agent whose dependencies all live in stages
/// `0..k`. Agents within a stage have no edges between them and may run
/// concurrently. Within a stage, higher `priority` sorts first (ties break
/// by name) so sequential execution order is deterministic.
pub fn stages(configs: &[AgentConfig]) -> Result<Vec<Vec<String>>> {
    let by_name: BTreeMap<&str, &AgentConfig> =
        configs.iter().map(|c| (c.name.as_str(), c)).collect();

    for config in configs {
        for dep in &config.dependencies {
            if !by_name.contains_key(dep.as_str()) {
                return Err(OrchestratorError::UnknownAgent(dep.clone()));
            }
        }
    }

    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut stages: Vec<Vec<String>> = Vec::new();

    while placed.len() < by_name.len() {
        let mut ready: Vec<&AgentConfig> = by_name
            .values()
            .filter(|c| !placed.contains(c.name.as_str()))
            .filter(|c| c.dependencies.iter().all(|d| placed.contains(d.as_str())))
            .copied()
            .collect();

        if ready.is_empty() {
            let stuck = by_name
                .keys()
                .filter(|n| !placed.contains(**n))
                .cloned()
                .collect::<Vec<_>>()
                .join(", ");
            return Err(OrchestratorError::DependencyCycle(stuck));
        }

        ready.sort_by(|a, b| b.priority.cmp(&a.priority).then(a.name.cmp(&b.name)));

        for config in &ready {
            placed.insert(config.name.as_str());
        }
        stages.push(ready.into_iter().map(|c| c.name.clone()).collect());
    }

    Ok(stages)
}
