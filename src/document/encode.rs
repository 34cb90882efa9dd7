//! Objects -> generic YAML tree, in canonical form.
//!
//! The chosen form depends only on the value being written, never on how it
//! was read: components without multiplicity or ports become a bare
//! implementation name, a sender with a single receiver maps to a string,
//! default and empty fields are left out.

use crate::checkpoint::{CheckpointRule, Checkpoints};
use crate::configuration::{PartialConfiguration, YMMSL_VERSION};
use crate::execution::{ExecutionModel, Implementation, Launch, ResourceRequirements};
use crate::identity::Reference;
use crate::model::{Component, Model, Operator};
use crate::settings::{SettingValue, Settings};

use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};
use std::path::Path;

pub fn partial_configuration(config: &PartialConfiguration) -> Value {
    let mut out = Mapping::new();
    out.insert(key("ymmsl_version"), key(YMMSL_VERSION));

    if let Some(m) = &config.model {
        out.insert(key("model"), model(m));
    }
    if let Some(s) = &config.settings {
        out.insert(key("settings"), settings(s));
    }
    if let Some(impls) = &config.implementations {
        out.insert(key("implementations"), implementations(impls));
    }
    if let Some(res) = &config.resources {
        out.insert(key("resources"), resources(res));
    }
    if let Some(cp) = &config.checkpoints {
        out.insert(key("checkpoints"), checkpoints(cp));
    }
    Value::Mapping(out)
}

fn key(s: impl Into<String>) -> Value {
    Value::String(s.into())
}

/// One value as itself, several as a list.
fn one_or_many(mut items: Vec<Value>) -> Value {
    if items.len() == 1 {
        items.remove(0)
    } else {
        Value::Sequence(items)
    }
}

fn path_text(path: &Path) -> Value {
    key(path.to_string_lossy())
}

/// Whole numbers are written without a fraction.
fn number(x: f64) -> Value {
    const EXACT: f64 = 9_007_199_254_740_992.0; // 2^53
    if x.is_finite() && x.fract() == 0.0 && x.abs() < EXACT {
        Value::from(x as i64)
    } else {
        Value::from(x)
    }
}

// ---- model ----

fn model(m: &Model) -> Value {
    let mut out = Mapping::new();
    out.insert(key("name"), key(m.name().as_str()));

    if !m.components().is_empty() {
        let components: Mapping = m
            .components()
            .iter()
            .map(|c| (key(c.name().as_str()), component(c)))
            .collect();
        out.insert(key("components"), Value::Mapping(components));
    }

    let grouped = m.conduits_by_sender();
    if !grouped.is_empty() {
        let conduits: Mapping = grouped
            .into_iter()
            .map(|(sender, receivers)| {
                let receivers = receivers.iter().map(|r| key(r.to_string())).collect();
                (key(sender.to_string()), one_or_many(receivers))
            })
            .collect();
        out.insert(key("conduits"), Value::Mapping(conduits));
    }
    Value::Mapping(out)
}

fn component(c: &Component) -> Value {
    if c.is_short_form() {
        if let Some(imp) = c.implementation() {
            return key(imp.to_string());
        }
    }

    let mut out = Mapping::new();
    if let Some(imp) = c.implementation() {
        out.insert(key("implementation"), key(imp.to_string()));
    }
    if !c.multiplicity().is_empty() {
        let dims = c.multiplicity().iter().map(|&d| Value::from(d)).collect();
        out.insert(key("multiplicity"), one_or_many(dims));
    }
    if !c.ports().is_empty() {
        let mut ports = Mapping::new();
        for op in Operator::ALL {
            let names: Vec<Value> = c.ports_for(op).map(|p| key(p.to_string())).collect();
            if !names.is_empty() {
                ports.insert(key(op.key()), one_or_many(names));
            }
        }
        out.insert(key("ports"), Value::Mapping(ports));
    }
    Value::Mapping(out)
}

// ---- settings ----

fn settings(s: &Settings) -> Value {
    Value::Mapping(
        s.iter()
            .map(|(name, value)| (key(name.to_string()), setting_value(value)))
            .collect(),
    )
}

fn setting_value(value: &SettingValue) -> Value {
    match value {
        SettingValue::String(s) => key(s.as_str()),
        SettingValue::Integer(i) => Value::from(*i),
        SettingValue::Float(x) => Value::from(*x),
        SettingValue::Boolean(b) => Value::Bool(*b),
        SettingValue::Vector(v) => floats(v),
        SettingValue::Matrix(m) => Value::Sequence(m.rows().iter().map(|r| floats(r)).collect()),
    }
}

fn floats(v: &[f64]) -> Value {
    Value::Sequence(v.iter().map(|&x| Value::from(x)).collect())
}

// ---- implementations ----

fn implementations(impls: &IndexMap<Reference, Implementation>) -> Value {
    Value::Mapping(
        impls
            .iter()
            .map(|(name, imp)| (key(name.to_string()), implementation(imp)))
            .collect(),
    )
}

fn implementation(imp: &Implementation) -> Value {
    let mut out = Mapping::new();
    match &imp.launch {
        Launch::Executable { path, args } => {
            out.insert(key("executable"), path_text(path));
            if !args.is_empty() {
                let args = args.iter().map(|a| key(a.as_str())).collect();
                out.insert(key("args"), Value::Sequence(args));
            }
        }
        Launch::Script(text) => {
            out.insert(key("script"), script(text));
        }
    }
    if !imp.env.is_empty() {
        let env = imp
            .env
            .iter()
            .map(|(k, v)| (key(k.as_str()), key(v.as_str())))
            .collect();
        out.insert(key("env"), Value::Mapping(env));
    }
    if !imp.modules.is_empty() {
        let modules = imp.modules.iter().map(|m| key(m.as_str())).collect();
        out.insert(key("modules"), Value::Sequence(modules));
    }
    if let Some(venv) = &imp.virtual_env {
        out.insert(key("virtual_env"), path_text(venv));
    }
    if imp.execution_model != ExecutionModel::Direct {
        out.insert(key("execution_model"), key(imp.execution_model.key()));
    }
    Value::Mapping(out)
}

/// A script ending in a newline is written as a list of lines.
fn script(text: &str) -> Value {
    match text.strip_suffix('\n') {
        Some(body) => Value::Sequence(body.split('\n').map(key).collect()),
        None => key(text),
    }
}

// ---- resources ----

fn resources(res: &IndexMap<Reference, ResourceRequirements>) -> Value {
    Value::Mapping(
        res.iter()
            .map(|(name, r)| (key(name.to_string()), resource(r)))
            .collect(),
    )
}

fn resource(r: &ResourceRequirements) -> Value {
    let mut out = Mapping::new();
    let threads_per_process = match *r {
        ResourceRequirements::Threaded { threads } => {
            out.insert(key("threads"), Value::from(threads));
            1
        }
        ResourceRequirements::MpiCores {
            mpi_processes,
            threads_per_mpi_process,
        } => {
            out.insert(key("mpi_processes"), Value::from(mpi_processes));
            threads_per_mpi_process
        }
        ResourceRequirements::MpiNodes {
            nodes,
            mpi_processes_per_node,
            threads_per_mpi_process,
        } => {
            out.insert(key("nodes"), Value::from(nodes));
            out.insert(key("mpi_processes_per_node"), Value::from(mpi_processes_per_node));
            threads_per_mpi_process
        }
    };
    if threads_per_process != 1 {
        out.insert(key("threads_per_mpi_process"), Value::from(threads_per_process));
    }
    Value::Mapping(out)
}

// ---- checkpoints ----

fn checkpoints(cp: &Checkpoints) -> Value {
    let mut out = Mapping::new();
    if cp.at_end {
        out.insert(key("at_end"), Value::Bool(true));
    }
    if !cp.wallclock_time.is_empty() {
        out.insert(key("wallclock_time"), rules(&cp.wallclock_time));
    }
    if !cp.simulation_time.is_empty() {
        out.insert(key("simulation_time"), rules(&cp.simulation_time));
    }
    Value::Mapping(out)
}

fn rules(rules: &[CheckpointRule]) -> Value {
    Value::Sequence(rules.iter().map(rule).collect())
}

fn rule(rule: &CheckpointRule) -> Value {
    let mut out = Mapping::new();
    match rule {
        CheckpointRule::At(moments) => {
            let at = moments.iter().map(|&m| number(m)).collect();
            out.insert(key("at"), Value::Sequence(at));
        }
        CheckpointRule::Range { start, stop, every } => {
            if let Some(start) = start {
                out.insert(key("start"), number(*start));
            }
            if let Some(stop) = stop {
                out.insert(key("stop"), number(*stop));
            }
            out.insert(key("every"), number(*every));
        }
    }
    Value::Mapping(out)
}
