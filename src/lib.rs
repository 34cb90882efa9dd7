//! Document model for yMMSL, the YAML-based language describing coupled
//! multiscale simulations.
//!
//! Text is loaded into a typed, validated object graph and saved back in a
//! single canonical form:
//!
//! ```
//! let text = "ymmsl_version: v0.1
//! model:
//!   name: isr2d
//!   components:
//!     macro: isr2d.macro
//!     micro: isr2d.micro
//!   conduits:
//!     macro.out: micro.in
//!     micro.out: macro.in
//! ";
//! let config = ymmsl::load(text).unwrap();
//! assert_eq!(config.model().unwrap().components().len(), 2);
//! assert_eq!(ymmsl::dump(&config).unwrap(), text);
//! ```
//!
//! Fragments ([`PartialConfiguration`]) can be layered onto one another and
//! onto complete configurations with [`PartialConfiguration::merged`] and
//! [`Configuration::merge`].

pub mod checkpoint;
pub mod configuration;
pub mod document;
pub mod error;
pub mod execution;
pub mod identity;
pub mod model;
pub mod report;
pub mod settings;

pub use checkpoint::{CheckpointRule, Checkpoints};
pub use configuration::{Configuration, PartialConfiguration, RunProblem, YMMSL_VERSION};
pub use document::{dump, load, load_partial, read, save, DocPath};
pub use error::{Category, Error, Result};
pub use execution::{ExecutionModel, Implementation, Launch, ResourceRequirements};
pub use identity::{Identifier, Reference, ReferencePart};
pub use model::{Component, Conduit, Model, Operator, Port};
pub use settings::{Matrix, SettingValue, Settings};
