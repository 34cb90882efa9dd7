//! Serializable overview of a configuration, for tools and dashboards.

use crate::configuration::Configuration;
use crate::execution::{Launch, ResourceRequirements};
use crate::identity::Reference;

use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ComponentView {
    pub name: String,
    pub implementation: Option<String>,
    pub multiplicity: Vec<u64>,
    /// Saturates at `u64::MAX`.
    pub instances: u64,

    /// Port names keyed by operator (`f_init`, `o_i`, `s`, `o_f`).
    pub ports: BTreeMap<String, Vec<String>>,

    pub resources: Option<ResourceView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceView {
    pub shape: &'static str,
    pub cores_per_instance: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConduitView {
    pub sender: String,
    pub receiver: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettingView {
    pub name: String,
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImplementationView {
    pub name: String,
    /// Executable path, or `script` for inline scripts.
    pub launch: String,
    pub execution_model: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckpointsView {
    pub at_end: bool,
    pub wallclock_rules: usize,
    pub simulation_rules: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotalsView {
    pub components: usize,
    pub instances: u64,
    pub conduits: usize,
    pub settings: usize,
    pub implementations: usize,
    /// Cores over all instances of components that have a resource request.
    /// Saturates at `u64::MAX`.
    pub cores: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub model: Option<String>,
    pub components: Vec<ComponentView>,
    pub conduits: Vec<ConduitView>,
    pub settings: Vec<SettingView>,
    pub implementations: Vec<ImplementationView>,
    pub checkpoints: Option<CheckpointsView>,
    pub totals: TotalsView,

    /// What is still missing before the configuration can run.
    pub problems: Vec<String>,
}

fn shape_name(r: &ResourceRequirements) -> &'static str {
    match r {
        ResourceRequirements::Threaded { .. } => "threaded",
        ResourceRequirements::MpiCores { .. } => "mpi_cores",
        ResourceRequirements::MpiNodes { .. } => "mpi_nodes",
    }
}

/// Summarize a validated configuration.
pub fn build_summary(config: &Configuration) -> Summary {
    let mut components = Vec::new();
    let mut conduits = Vec::new();
    let mut cores = 0u64;

    if let Some(model) = config.model() {
        for comp in model.components() {
            let mut ports: BTreeMap<String, Vec<String>> = BTreeMap::new();
            for port in comp.ports() {
                ports
                    .entry(port.operator.key().to_string())
                    .or_default()
                    .push(port.to_string());
            }

            let instances = comp.instance_count().unwrap_or(u64::MAX);
            let name = Reference::from(comp.name().clone());
            let resources = config
                .resources()
                .and_then(|res| res.get(&name))
                .map(|r| ResourceView {
                    shape: shape_name(r),
                    cores_per_instance: r.total_cores(),
                });
            if let Some(r) = &resources {
                cores = cores.saturating_add(r.cores_per_instance.saturating_mul(instances));
            }

            components.push(ComponentView {
                name: comp.name().to_string(),
                implementation: comp.implementation().map(|i| i.to_string()),
                multiplicity: comp.multiplicity().to_vec(),
                instances,
                ports,
                resources,
            });
        }

        conduits = model
            .conduits()
            .iter()
            .map(|c| ConduitView {
                sender: c.sender().to_string(),
                receiver: c.receiver().to_string(),
            })
            .collect();
    }

    let settings: Vec<SettingView> = config
        .settings()
        .map(|s| {
            s.iter()
                .map(|(name, value)| SettingView {
                    name: name.to_string(),
                    kind: value.kind(),
                    value: value.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    let implementations: Vec<ImplementationView> = config
        .implementations()
        .map(|impls| {
            impls
                .values()
                .map(|imp| ImplementationView {
                    name: imp.name.to_string(),
                    launch: match &imp.launch {
                        Launch::Executable { path, .. } => path.display().to_string(),
                        Launch::Script(_) => "script".to_string(),
                    },
                    execution_model: imp.execution_model.key(),
                })
                .collect()
        })
        .unwrap_or_default();

    let checkpoints = config.checkpoints().map(|cp| CheckpointsView {
        at_end: cp.at_end,
        wallclock_rules: cp.wallclock_time.len(),
        simulation_rules: cp.simulation_time.len(),
    });

    let totals = TotalsView {
        components: components.len(),
        instances: components
            .iter()
            .fold(0u64, |total, c| total.saturating_add(c.instances)),
        conduits: conduits.len(),
        settings: settings.len(),
        implementations: implementations.len(),
        cores,
    };

    Summary {
        model: config.model().map(|m| m.name().to_string()),
        components,
        conduits,
        settings,
        implementations,
        checkpoints,
        totals,
        problems: config
            .check_runnable()
            .iter()
            .map(|p| p.to_string())
            .collect(),
    }
}
