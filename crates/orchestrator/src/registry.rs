use std::collections::BTreeMap;
use std::sync::Arc;

use pixelgen_core::AgentConfig;

use crate::agent::Agent;
use crate::error::{OrchestratorError, Result};

/// Immutable set of agents available to the runner, keyed by name.
///
/// Construction validates the pipeline shape: names are unique and every
/// declared dependency refers to an enabled, registered agent. Disabled
/// agents are dropped at build time so the scheduler never sees them.
#[derive(Clone)]
pub struct AgentRegistry {
    agents: BTreeMap<String, Arc<dyn Agent>>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AgentRegistry {
    pub fn builder() -> AgentRegistryBuilder {
        AgentRegistryBuilder { agents: Vec::new() }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.get(name)
    }

    pub fn configs(&self) -> Vec<AgentConfig> {
        self.agents.values().map(|a| a.config().clone()).collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.agents.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

pub struct AgentRegistryBuilder {
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentRegistryBuilder {
    pub fn register(mut self, agent: Arc<dyn Agent>) -> Self {
        self.agents.push(agent);
        self
    }

    pub fn build(self) -> Result<AgentRegistry> {
        let mut agents: BTreeMap<String, Arc<dyn Agent>> = BTreeMap::new();

        for agent in self.agents {
            let config = agent.config();
            if !config.enabled {
                continue;
            }
            if agents
                .insert(config.name.clone(), agent.clone())
                .is_some()
            {
                return Err(OrchestratorError::DuplicateAgent(config.name.clone()));
            }
        }

        for agent in agents.values() {
            for dep in &agent.config().dependencies {
                if !agents.contains_key(dep) {
                    return Err(OrchestratorError::UnknownAgent(dep.clone()));
                }
            }
        }

        Ok(AgentRegistry { agents })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ScriptedAgent;
    use serde_json::json;

    fn agent(config: AgentConfig) -> Arc<dyn Agent> {
        Arc::new(ScriptedAgent::fixed(config, json!({})))
    }

    #[test]
    fn test_build_validates_unique_names() {
        let err = AgentRegistry::builder()
            .register(agent(AgentConfig::new("vision")))
            .register(agent(AgentConfig::new("vision")))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::DuplicateAgent(name) if name == "vision"));
    }

    #[test]
    fn test_build_validates_dependencies() {
        let err = AgentRegistry::builder()
            .register(agent(AgentConfig::new("code-gen").depends_on(["style"])))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownAgent(name) if name == "style"));
    }

    #[test]
    fn test_disabled_agents_are_dropped() {
        let mut disabled = AgentConfig::new("asset");
        disabled.enabled = false;

        let registry = AgentRegistry::builder()
            .register(agent(AgentConfig::new("vision")))
            .register(agent(disabled))
            .build()
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert!(registry.get("asset").is_none());
    }

    #[test]
    fn test_dependency_on_disabled_agent_is_unknown() {
        let mut disabled = AgentConfig::new("vision");
        disabled.enabled = false;

        let err = AgentRegistry::builder()
            .register(agent(disabled))
            .register(agent(AgentConfig::new("hierarchy").depends_on(["vision"])))
            .build()
            .unwrap_err();
        assert!(matches!(err, OrchestratorError::UnknownAgent(_)));
    }
}
