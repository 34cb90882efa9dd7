//! Generic YAML tree -> validated objects.
//!
//! Each section is decoded by walking the `serde_yaml::Value` tree directly,
//! so that every alternative spelling (short-form components, fan-out
//! conduits, scalar multiplicities, space-separated lists) is resolved here
//! and never reaches the object graph. Implementation entries go through a
//! serde raw struct first, like the other flat sections of the format would.

use super::DocPath;
use crate::checkpoint::{CheckpointRule, Checkpoints};
use crate::configuration::{PartialConfiguration, YMMSL_VERSION};
use crate::error::{Error, Result, ResultExt};
use crate::execution::resources::Shape;
use crate::execution::{ExecutionModel, Implementation, ResourceRequirements};
use crate::identity::{Identifier, Reference};
use crate::model::{Component, Conduit, Model, Operator, Port};
use crate::settings::{SettingValue, Settings};

use indexmap::IndexMap;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

const TOP_LEVEL_KEYS: &[&str] = &[
    "ymmsl_version",
    "model",
    "settings",
    "implementations",
    "resources",
    "checkpoints",
];

/// Decode a whole document into a fragment.
pub fn partial_configuration(root: &Value) -> Result<PartialConfiguration> {
    let path = DocPath::root();
    let map = fields(root, &path, TOP_LEVEL_KEYS)?;

    let version = map
        .get("ymmsl_version")
        .ok_or(Error::MissingKey("ymmsl_version"))
        .at(&path)?;
    let vpath = path.join("ymmsl_version");
    match version.as_str() {
        Some(YMMSL_VERSION) => {}
        Some(other) => return Err(Error::UnsupportedVersion(other.to_string()).at(&vpath)),
        None => return Err(unexpected("a version string", version).at(&vpath)),
    }

    Ok(PartialConfiguration {
        model: section(map, "model", &path, model)?,
        settings: section(map, "settings", &path, settings)?,
        implementations: section(map, "implementations", &path, implementations)?,
        resources: section(map, "resources", &path, resources)?,
        checkpoints: section(map, "checkpoints", &path, checkpoints)?,
    })
}

fn section<T>(
    map: &Mapping,
    key: &str,
    path: &DocPath,
    decode: fn(&Value, &DocPath) -> Result<T>,
) -> Result<Option<T>> {
    map.get(key).map(|v| decode(v, &path.join(key))).transpose()
}

// ---- tree helpers ----

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(n) if n.is_f64() => "a float",
        Value::Number(_) => "an integer",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a list",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

fn unexpected(expected: &'static str, found: &Value) -> Error {
    Error::UnexpectedType {
        expected,
        found: type_name(found),
    }
}

/// A mapping whose keys must all be in `allowed`.
fn fields<'a>(value: &'a Value, path: &DocPath, allowed: &[&str]) -> Result<&'a Mapping> {
    let map = value
        .as_mapping()
        .ok_or_else(|| unexpected("a mapping", value))
        .at(path)?;
    for (key, _) in entries(value, path)? {
        if !allowed.contains(&key) {
            return Err(Error::UnknownKey(key.to_string()).at(path));
        }
    }
    Ok(map)
}

/// Entries of a mapping with string keys, in document order. A null node
/// counts as an empty mapping.
fn entries<'a>(value: &'a Value, path: &DocPath) -> Result<Vec<(&'a str, &'a Value)>> {
    let map = match value {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(map) => map,
        other => return Err(unexpected("a mapping", other).at(path)),
    };
    map.iter()
        .map(|(k, v)| match k.as_str() {
            Some(k) => Ok((k, v)),
            None => Err(unexpected("a string key", k).at(path)),
        })
        .collect()
}

fn text<'a>(value: &'a Value, path: &DocPath, expected: &'static str) -> Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| unexpected(expected, value))
        .at(path)
}

fn identifier(text: &str, path: &DocPath) -> Result<Identifier> {
    Identifier::new(text).at(path)
}

fn reference(text: &str, path: &DocPath) -> Result<Reference> {
    Reference::parse(text).at(path)
}

/// A name that may not contain subscripts.
fn plain_reference(text: &str, path: &DocPath) -> Result<Reference> {
    let name = reference(text, path)?;
    if name.has_index() {
        return Err(Error::InvalidReference {
            text: text.to_string(),
            reason: "subscripts are not allowed here".into(),
        }
        .at(path));
    }
    Ok(name)
}

/// A string, or a list of strings.
fn strings<'a>(value: &'a Value, path: &DocPath) -> Result<Vec<&'a str>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.as_str()]),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| text(item, &path.join(i), "a string"))
            .collect(),
        other => Err(unexpected("a string or a list of strings", other).at(path)),
    }
}

fn number(value: &Value, path: &DocPath) -> Result<f64> {
    match value {
        Value::Number(n) => n.as_f64().ok_or_else(|| unexpected("a number", value)).at(path),
        other => Err(unexpected("a number", other).at(path)),
    }
}

fn optional_number(map: &Mapping, key: &str, path: &DocPath) -> Result<Option<f64>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => number(v, &path.join(key)).map(Some),
    }
}

// ---- model ----

fn model(value: &Value, path: &DocPath) -> Result<Model> {
    let map = fields(value, path, &["name", "components", "conduits"])?;

    let npath = path.join("name");
    let name = map.get("name").ok_or(Error::MissingKey("name")).at(path)?;
    let name = identifier(text(name, &npath, "a model name")?, &npath)?;

    let mut components = Vec::new();
    if let Some(section) = map.get("components") {
        let cpath = path.join("components");
        for (cname, cvalue) in entries(section, &cpath)? {
            components.push(component(cname, cvalue, &cpath.join(cname))?);
        }
    }

    let conduits = match map.get("conduits") {
        Some(section) => conduits(section, &path.join("conduits"))?,
        None => Vec::new(),
    };

    Model::new(name, components, conduits).at(path)
}

/// One entry under `components`: a bare implementation name, or a mapping.
fn component(name: &str, value: &Value, path: &DocPath) -> Result<Component> {
    let comp = Component::new(identifier(name, path)?);
    match value {
        Value::Null => Ok(comp),
        Value::String(imp) => comp
            .with_implementation(reference(imp, path)?)
            .at(path),
        Value::Mapping(map) => {
            fields(value, path, &["implementation", "multiplicity", "ports"])?;
            let mut comp = comp;

            if let Some(v) = map.get("implementation") {
                let ipath = path.join("implementation");
                let imp = reference(text(v, &ipath, "an implementation name")?, &ipath)?;
                comp = comp.with_implementation(imp).at(&ipath)?;
            }
            if let Some(v) = map.get("multiplicity") {
                comp = comp.with_multiplicity(multiplicity(v, &path.join("multiplicity"))?);
            }
            if let Some(v) = map.get("ports") {
                let ppath = path.join("ports");
                comp = comp.with_ports(ports(v, &ppath)?).at(&ppath)?;
            }
            Ok(comp)
        }
        other => Err(unexpected("an implementation name or a mapping", other).at(path)),
    }
}

fn multiplicity(value: &Value, path: &DocPath) -> Result<Vec<u64>> {
    let dimension = |v: &Value, path: &DocPath| -> Result<u64> {
        match (v.as_u64(), v.as_i64()) {
            (Some(n), _) => Ok(n),
            (None, Some(n)) => Err(Error::InvalidValue(format!(
                "multiplicity must not be negative, got {n}"
            ))
            .at(path)),
            _ => Err(unexpected("a non-negative integer", v).at(path)),
        }
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| dimension(item, &path.join(i)))
            .collect(),
        single => Ok(vec![dimension(single, path)?]),
    }
}

/// `ports:` maps operator keys to port names, given as a list or as a
/// single space-separated string.
fn ports(value: &Value, path: &DocPath) -> Result<Vec<Port>> {
    let mut out = Vec::new();
    for (key, names) in entries(value, path)? {
        let operator = Operator::from_key(key)
            .ok_or_else(|| Error::UnknownKey(key.to_string()))
            .at(path)?;
        let opath = path.join(key);
        for declared in strings(names, &opath)? {
            for name in declared.split_whitespace() {
                out.push(Port::parse(name, operator).at(&opath)?);
            }
        }
    }
    Ok(out)
}

/// `conduits:` maps a sender to one receiver, or to a list of receivers.
fn conduits(value: &Value, path: &DocPath) -> Result<Vec<Conduit>> {
    let mut out = Vec::new();
    for (sender, receivers) in entries(value, path)? {
        let spath = path.join(sender);
        let receivers = match receivers {
            Value::String(r) => vec![r.as_str()],
            Value::Sequence(items) if !items.is_empty() => items
                .iter()
                .enumerate()
                .map(|(i, item)| text(item, &spath.join(i), "a receiving port"))
                .collect::<Result<Vec<_>>>()?,
            Value::Sequence(_) => {
                return Err(
                    Error::InvalidValue("a sender needs at least one receiver".into()).at(&spath),
                );
            }
            other => {
                return Err(unexpected("a receiving port or a list of them", other).at(&spath));
            }
        };
        for receiver in receivers {
            out.push(Conduit::parse(sender, receiver).at(&spath)?);
        }
    }
    Ok(out)
}

// ---- settings ----

fn settings(value: &Value, path: &DocPath) -> Result<Settings> {
    let mut out = Settings::new();
    for (key, raw) in entries(value, path)? {
        let kpath = path.join(key);
        let name = Reference::parse(key)
            .map_err(|e| Error::InvalidSettingKey {
                key: key.to_string(),
                reason: Box::new(e),
            })
            .at(&kpath)?;
        // `a[1]` and `a[01]` are different keys to YAML but the same setting
        if out.contains(&name) {
            return Err(Error::DuplicateSetting(name.to_string()).at(&kpath));
        }
        out.set(name, setting_value(raw).at(&kpath)?);
    }
    Ok(out)
}

/// Decode one value by the type the document gives it. Integers stay
/// integers; only list elements are widened to float.
fn setting_value(value: &Value) -> Result<SettingValue> {
    const EXPECTED: &str = "a string, number, boolean, list of numbers or list of lists of numbers";

    match value {
        Value::String(s) => Ok(SettingValue::String(s.clone())),
        Value::Bool(b) => Ok(SettingValue::Boolean(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(SettingValue::Integer(i))
            } else if n.is_f64() {
                n.as_f64()
                    .map(SettingValue::Float)
                    .ok_or_else(|| unexpected(EXPECTED, value))
            } else {
                Err(Error::InvalidValue(format!("integer {n} is out of range")))
            }
        }
        Value::Sequence(items) if items.iter().all(Value::is_number) => {
            Ok(SettingValue::Vector(floats(items)?))
        }
        Value::Sequence(rows) if rows.iter().all(Value::is_sequence) => {
            let rows = rows
                .iter()
                .map(|row| match row.as_sequence() {
                    Some(cells) if cells.iter().all(Value::is_number) => floats(cells),
                    _ => Err(unexpected(EXPECTED, value)),
                })
                .collect::<Result<Vec<_>>>()?;
            SettingValue::matrix(rows)
        }
        other => Err(unexpected(EXPECTED, other)),
    }
}

fn floats(items: &[Value]) -> Result<Vec<f64>> {
    items
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| unexpected("a number", v)))
        .collect()
}

// ---- implementations ----

const IMPLEMENTATION_KEYS: &[&str] = &[
    "executable",
    "args",
    "script",
    "env",
    "modules",
    "virtual_env",
    "execution_model",
];

/// Implementation entry as written in a document.
#[derive(Debug, Deserialize)]
struct RawImplementation {
    executable: Option<PathBuf>,
    args: Option<OneOrMany>,
    script: Option<OneOrMany>,
    modules: Option<OneOrMany>,
    virtual_env: Option<PathBuf>,
    execution_model: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

/// Environment variables. Values must be strings: once YAML has read `0x10`
/// or `1.0` as a number, the text that was written is gone.
fn env(value: &Value, path: &DocPath) -> Result<IndexMap<String, String>> {
    entries(value, path)?
        .into_iter()
        .map(|(key, v)| match v {
            Value::String(s) => Ok((key.to_string(), s.clone())),
            Value::Number(_) | Value::Bool(_) => Err(Error::InvalidValue(format!(
                "environment variable {key} must be a string, put the value in quotes"
            ))
            .at(&path.join(key))),
            other => Err(unexpected("a string", other).at(&path.join(key))),
        })
        .collect()
}

fn implementations(value: &Value, path: &DocPath) -> Result<IndexMap<Reference, Implementation>> {
    let mut out = IndexMap::new();
    for (name, raw) in entries(value, path)? {
        let ipath = path.join(name);
        let name = plain_reference(name, &ipath)?;
        out.insert(name.clone(), implementation(name, raw, &ipath)?);
    }
    Ok(out)
}

fn implementation(name: Reference, value: &Value, path: &DocPath) -> Result<Implementation> {
    fields(value, path, IMPLEMENTATION_KEYS)?;
    let raw: RawImplementation = serde_yaml::from_value(value.clone())
        .map_err(|e| Error::InvalidValue(e.to_string()))
        .at(path)?;

    let args = raw.args.map(|args| match args {
        OneOrMany::One(arg) => vec![arg],
        OneOrMany::Many(args) => args,
    });
    let script = raw.script.map(|script| match script {
        OneOrMany::One(text) => text,
        OneOrMany::Many(lines) => lines.join("\n") + "\n",
    });

    let mut imp = Implementation::from_parts(name, raw.executable, args, script).at(path)?;
    if let Some(vars) = value.get("env") {
        imp.env = env(vars, &path.join("env"))?;
    }
    imp.modules = match raw.modules {
        Some(OneOrMany::One(list)) => list.split_whitespace().map(String::from).collect(),
        Some(OneOrMany::Many(list)) => list,
        None => Vec::new(),
    };
    imp.virtual_env = raw.virtual_env;
    if let Some(key) = raw.execution_model {
        imp.execution_model = ExecutionModel::from_key(&key)
            .ok_or_else(|| {
                Error::InvalidValue(format!(
                    "unknown execution model {key:?}, expected one of direct, openmpi, intelmpi or srun"
                ))
            })
            .at(&path.join("execution_model"))?;
    }

    imp.check().at(path)?;
    Ok(imp)
}

// ---- resources ----

const RESOURCE_KEYS: &[&str] = &[
    "threads",
    "mpi_processes",
    "threads_per_mpi_process",
    "nodes",
    "mpi_processes_per_node",
];

fn resources(value: &Value, path: &DocPath) -> Result<IndexMap<Reference, ResourceRequirements>> {
    let mut out = IndexMap::new();
    for (name, raw) in entries(value, path)? {
        let rpath = path.join(name);
        out.insert(plain_reference(name, &rpath)?, resource(raw, &rpath)?);
    }
    Ok(out)
}

fn resource(value: &Value, path: &DocPath) -> Result<ResourceRequirements> {
    let map = fields(value, path, RESOURCE_KEYS)?;
    let keys = entries(value, path)?;
    let shape = Shape::detect(keys.iter().map(|(k, _)| *k)).at(path)?;

    let count = |key: &'static str| -> Result<Option<i64>> {
        map.get(key)
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| unexpected("an integer", v))
                    .at(&path.join(key))
            })
            .transpose()
    };
    let required = |key: &'static str| -> Result<i64> {
        count(key)?.ok_or(Error::MissingKey(key)).at(path)
    };

    match shape {
        Shape::Threaded => ResourceRequirements::threaded(required("threads")?),
        Shape::MpiCores => ResourceRequirements::mpi_cores(
            required("mpi_processes")?,
            count("threads_per_mpi_process")?,
        ),
        Shape::MpiNodes => ResourceRequirements::mpi_nodes(
            required("nodes")?,
            required("mpi_processes_per_node")?,
            count("threads_per_mpi_process")?,
        ),
    }
    .at(path)
}

// ---- checkpoints ----

fn checkpoints(value: &Value, path: &DocPath) -> Result<Checkpoints> {
    let map = fields(value, path, &["at_end", "wallclock_time", "simulation_time"])?;

    let at_end = match map.get("at_end") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => return Err(unexpected("a boolean", other).at(&path.join("at_end"))),
    };

    let out = Checkpoints {
        at_end,
        wallclock_time: rules(map.get("wallclock_time"), &path.join("wallclock_time"))?,
        simulation_time: rules(map.get("simulation_time"), &path.join("simulation_time"))?,
    };
    out.check().at(path)?;
    Ok(out)
}

fn rules(value: Option<&Value>, path: &DocPath) -> Result<Vec<CheckpointRule>> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Sequence(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| rule(item, &path.join(i)))
            .collect(),
        Some(other) => Err(unexpected("a list of checkpoint rules", other).at(path)),
    }
}

/// `{at: ...}` or `{start?, stop?, every}`.
fn rule(value: &Value, path: &DocPath) -> Result<CheckpointRule> {
    let map = fields(value, path, &["at", "start", "stop", "every"])?;

    if let Some(at) = map.get("at") {
        if ["start", "stop", "every"].iter().any(|k| map.contains_key(*k)) {
            return Err(Error::ConflictingKeys(
                "`at` cannot be combined with `start`, `stop` or `every`".into(),
            )
            .at(path));
        }
        let apath = path.join("at");
        let moments = match at {
            Value::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| number(item, &apath.join(i)))
                .collect::<Result<Vec<_>>>()?,
            single => vec![number(single, &apath)?],
        };
        return CheckpointRule::at(moments).at(path);
    }

    let every = optional_number(map, "every", path)?
        .ok_or(Error::MissingKey("every"))
        .at(path)?;
    CheckpointRule::range(
        optional_number(map, "start", path)?,
        optional_number(map, "stop", path)?,
        every,
    )
    .at(path)
}
