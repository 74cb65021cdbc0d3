//! Tankobon - Manga Volume Batching Library
//!
//! This crate reorganizes a flat folder of numbered volume archives (`.cbz`,
//! `.cbr`, `.cb7`, `.zip`) into fixed-size batch folders, cleans the volume
//! file names, and gives every batch a copy of the series cover with the batch
//! number drawn in its center.
//!
//! # Getting Started
//!
//! Configure a run with the [`TankobonConfig`] builder, then drive the stages
//! yourself (to show the plan before anything moves) or call
//! [`process`](TankobonConfig::process) to do everything at once.
//!
//! ```rust,no_run
//! use tankobon::prelude::*;
//!
//! fn main() -> tankobon::error::Result<()> {
//!     let config = TankobonConfig::builder()
//!         .series_dir(PathBuf::from("./Library/Some Series"))
//!         .batch_size(20usize)
//!         .remote_lookup(false)
//!         .build()?;
//!
//!     // 1. Scan the volumes in natural order
//!     let volumes = config.scan()?;
//!
//!     // 2. Find a series cover: first volume, local image, then remote providers
//!     let cover = config.resolve_cover(&volumes);
//!
//!     // 3. Plan the batches; nothing is touched yet
//!     let plan = config.plan(&volumes, cover.as_ref())?;
//!     println!("{}", format_plan(&config.series_dir, &plan, config.batch_size, None));
//!
//!     // 4. Apply it
//!     let report = config.execute(&plan, cover.as_ref())?;
//!     println!("Moved {} files", report.files_moved);
//!     Ok(())
//! }
//! ```

pub mod cover;
pub mod error;
pub mod executor;
pub mod natural;
pub mod normalize;
pub mod path_utils;
pub mod planner;
pub mod provider;
pub mod scanner;
pub mod synth;
pub mod tankobon;
pub mod types;

#[cfg(test)]
mod test_utils;

// Publicly expose the main `TankobonConfig` struct and its builder
pub use tankobon::TankobonConfig;
pub use tankobon::TankobonConfigBuilder;

// Re-export core types for direct access
pub use types::{
    BatchPlan, CoverOrigin, CoverResult, ExecutionReport, FileMove, MatchPolicy, ResolvedCover,
    VolumeCoverResult, VolumeFile,
};

/// Prelude module for convenient imports.
///
/// Re-exports the most commonly used types and traits so that
/// `use tankobon::prelude::*;` is enough for typical use.
pub mod prelude {
    pub use super::{
        BatchPlan, CoverOrigin, CoverResult, ExecutionReport, FileMove, MatchPolicy,
        ResolvedCover, TankobonConfig, TankobonConfigBuilder, VolumeCoverResult, VolumeFile,
        error, types,
    };
    pub use crate::cover::CoverResolver;
    pub use crate::normalize::clean_volume_filename;
    pub use crate::planner::format_plan;
    pub use crate::provider::CoverProvider;
    pub use crate::synth::{CoverSynthesizer, LabelFace, SynthSettings};
    pub use std::path::{Path, PathBuf};
}
