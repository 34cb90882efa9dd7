//! How to start a component: implementations and resource requests.

pub mod resources;

pub use resources::ResourceRequirements;

use crate::error::{Error, Result};
use crate::identity::Reference;

use indexmap::IndexMap;
use std::fmt;
use std::path::PathBuf;

/// How the manager launches an implementation's processes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExecutionModel {
    #[default]
    Direct,
    OpenMpi,
    IntelMpi,
    Srun,
}

impl ExecutionModel {
    pub const ALL: [ExecutionModel; 4] = [
        ExecutionModel::Direct,
        ExecutionModel::OpenMpi,
        ExecutionModel::IntelMpi,
        ExecutionModel::Srun,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::OpenMpi => "openmpi",
            Self::IntelMpi => "intelmpi",
            Self::Srun => "srun",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl fmt::Display for ExecutionModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// What gets run for an implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Launch {
    /// A program, possibly an interpreter, with its arguments.
    Executable { path: PathBuf, args: Vec<String> },
    /// An inline shell script.
    Script(String),
}

/// An installed program that components can use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
    pub name: Reference,
    pub launch: Launch,
    pub env: IndexMap<String, String>,
    pub modules: Vec<String>,
    pub virtual_env: Option<PathBuf>,
    pub execution_model: ExecutionModel,
}

impl Implementation {
    pub fn executable(name: Reference, path: impl Into<PathBuf>) -> Self {
        Self::with_launch(
            name,
            Launch::Executable {
                path: path.into(),
                args: Vec::new(),
            },
        )
    }

    pub fn script(name: Reference, script: impl Into<String>) -> Self {
        Self::with_launch(name, Launch::Script(script.into()))
    }

    fn with_launch(name: Reference, launch: Launch) -> Self {
        Self {
            name,
            launch,
            env: IndexMap::new(),
            modules: Vec::new(),
            virtual_env: None,
            execution_model: ExecutionModel::Direct,
        }
    }

    /// Assemble an implementation from optional document fields.
    ///
    /// Exactly one of `executable` and `script` must be given; `args` only
    /// go with an executable.
    pub fn from_parts(
        name: Reference,
        executable: Option<PathBuf>,
        args: Option<Vec<String>>,
        script: Option<String>,
    ) -> Result<Self> {
        let launch = match (executable, script) {
            (Some(path), None) => Launch::Executable {
                path,
                args: args.unwrap_or_default(),
            },
            (None, Some(script)) => {
                if args.is_some() {
                    return Err(Error::ConflictingKeys(
                        "`args` can only be used with `executable`, not with `script`".into(),
                    ));
                }
                Launch::Script(script)
            }
            (Some(_), Some(_)) => {
                return Err(Error::ConflictingKeys(
                    "specify either `executable` or `script`, not both".into(),
                ));
            }
            (None, None) => return Err(Error::MissingKey("executable")),
        };
        Ok(Self::with_launch(name, launch))
    }

    /// Check that a script is not combined with launch settings.
    ///
    /// A script sets up its own environment, so `env`, `modules`,
    /// `virtual_env` and a non-direct execution model only go with an
    /// executable.
    pub fn check(&self) -> Result<()> {
        if let Launch::Script(_) = self.launch {
            let mut extra = Vec::new();
            if !self.env.is_empty() {
                extra.push("env");
            }
            if !self.modules.is_empty() {
                extra.push("modules");
            }
            if self.virtual_env.is_some() {
                extra.push("virtual_env");
            }
            if self.execution_model != ExecutionModel::Direct {
                extra.push("execution_model");
            }
            if !extra.is_empty() {
                return Err(Error::ConflictingKeys(format!(
                    "`script` cannot be combined with `{}`",
                    extra.join("`, `")
                )));
            }
        }
        Ok(())
    }

    pub fn args(&self) -> &[String] {
        match &self.launch {
            Launch::Executable { args, .. } => args,
            Launch::Script(_) => &[],
        }
    }

    pub fn is_mpi(&self) -> bool {
        self.execution_model != ExecutionModel::Direct
    }
}
