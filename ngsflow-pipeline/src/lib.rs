//! # ngsflow-pipeline
//!
//! The sample dispatcher and every stage it drives. A [`Stage`] works on one
//! sample name at a time; the [`Dispatcher`] reads the manifest, selects all
//! samples or a single one by index and, for stages that ask for it, walks the
//! length splits of each sample once the sample itself is done.
//!
//! ```no_run
//! use std::path::Path;
//! use ngsflow_core::Workspace;
//! use ngsflow_pipeline::{Context, Dispatcher};
//! use ngsflow_pipeline::stages::PrepCoverage;
//! use ngsflow_coverage::ForcovPolicy;
//! use ngsflow_tools::{SystemRunner, Toolbox};
//!
//! let context = Context::new(Workspace::new("."), &SystemRunner, Toolbox::default(), 4);
//! let mut stage = PrepCoverage { policy: ForcovPolicy::Center };
//! Dispatcher::new(&context, Path::new("samples.txt"), None).run(&mut stage).unwrap();
//! ```
//!
pub mod config;
pub mod consts;
pub mod dispatch;
pub mod stages;

// re-exports
pub use config::{PipelineConfig, ToolsConfig};
pub use dispatch::{Context, Dispatcher, GroupStage, Stage, selection};
