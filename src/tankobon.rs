//! The configured entry point: scan, resolve the cover, plan and execute.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, warn};

use crate::cover::CoverResolver;
use crate::error::{Error, Result};
use crate::executor::{self, CoverJob};
use crate::path_utils::get_file_name_lossy;
use crate::planner::{PlanSettings, plan_batches};
use crate::provider::{CoverProvider, DEFAULT_USER_AGENT, HttpClient, default_providers};
use crate::scanner::Scanner;
use crate::synth::{CoverSynthesizer, DEFAULT_FILL_RATIO, DEFAULT_MARGIN, SynthSettings, load_face};
use crate::types::{
    BatchPlan, DEFAULT_BATCH_SIZE, DEFAULT_PAD_WIDTH, ExecutionReport, MatchPolicy, ResolvedCover,
    VolumeFile,
};

/// The main Tankobon configuration, built declaratively using the builder pattern.
///
/// It describes one series directory and how its volumes are batched, and it
/// exposes every stage of the pipeline separately so a caller can show the plan
/// and ask for confirmation before anything moves:
///
/// - [`scan`](TankobonConfig::scan): list the volumes in natural order
/// - [`resolve_cover`](TankobonConfig::resolve_cover): run the cover cascade
/// - [`plan`](TankobonConfig::plan): compute the batches, touching nothing
/// - [`execute`](TankobonConfig::execute): apply a plan
/// - [`process`](TankobonConfig::process): all of the above without confirmation
///
/// ## Builder Pattern
///
/// ```rust,no_run
/// # use tankobon::prelude::*;
/// # use std::path::PathBuf;
/// let config = TankobonConfig::builder()
///     .series_dir(PathBuf::from("./Library/Some Series"))
///     .batch_size(10usize)
///     .build()
///     .expect("Invalid configuration");
/// ```
#[derive(Debug, Clone, derive_builder::Builder)]
#[builder(setter(into, strip_option), build_fn(validate = "Self::validate"))]
pub struct TankobonConfig {
    /// Directory holding the flat list of volume archives.
    ///
    /// Batch folders are created next to it, in its parent directory.
    pub series_dir: PathBuf,

    /// Number of volumes per batch folder. Must be at least 1.
    #[builder(default = "DEFAULT_BATCH_SIZE")]
    pub batch_size: usize,

    /// Digits the volume number is zero-padded to in clean names (1 to 9).
    #[builder(default = "DEFAULT_PAD_WIDTH")]
    pub pad_width: usize,

    /// Empty border on each side of a numbered cover, as a fraction of the
    /// image dimension. In `[0, 0.5)`.
    #[builder(default = "DEFAULT_MARGIN")]
    pub margin: f32,

    /// Fraction of the largest fitting font size actually used. In `(0, 1]`.
    #[builder(default = "DEFAULT_FILL_RATIO")]
    pub fill_ratio: f32,

    /// Font file for the batch numbers. Falls back to a system bold font, then
    /// to built-in segment digits.
    #[builder(default)]
    pub font_path: Option<PathBuf>,

    /// Whether the remote providers may be queried when no local cover exists.
    #[builder(default = "true")]
    pub remote_lookup: bool,

    /// How strictly remote search results must match the series name.
    #[builder(default)]
    pub match_policy: MatchPolicy,

    #[builder(default = "20")]
    pub lookup_timeout_secs: u64,

    #[builder(default = "30")]
    pub download_timeout_secs: u64,

    /// User-Agent sent to the remote providers.
    #[builder(default = "DEFAULT_USER_AGENT.to_string()")]
    pub user_agent: String,
}

impl TankobonConfig {
    /// Creates a new builder for configuring `TankobonConfig`.
    pub fn builder() -> TankobonConfigBuilder {
        TankobonConfigBuilder::default()
    }

    /// Checks that the series directory can be processed.
    ///
    /// Nothing is read or written besides the directory metadata. Every stage
    /// that touches the filesystem calls this first.
    ///
    /// # Returns
    ///
    /// * `Ok(&self)` - The configuration is usable
    /// * `Err(Error)` - Missing directory, not a directory, or no parent to batch into
    pub fn preflight_check(&self) -> Result<&Self> {
        if self.series_dir.as_os_str().is_empty() {
            return Err(Error::Other("Series directory is required".to_string()));
        }
        if !self.series_dir.exists() {
            return Err(Error::NotFound(format!(
                "Series directory does not exist: {:?}",
                self.series_dir
            )));
        }
        if !self.series_dir.is_dir() {
            return Err(Error::InvalidPath(
                self.series_dir.clone(),
                "Series path is not a directory.".to_string(),
            ));
        }
        self.parent_dir()?;
        Ok(self)
    }

    /// Display name of the series: the directory name.
    pub fn series_name(&self) -> String {
        get_file_name_lossy(&self.series_dir)
    }

    /// Directory the batch folders are created in.
    pub fn parent_dir(&self) -> Result<&Path> {
        self.series_dir
            .parent()
            .filter(|_| self.series_dir.file_name().is_some())
            .ok_or_else(|| {
                Error::InvalidPath(
                    self.series_dir.clone(),
                    "Series directory has no parent to create batches in.".to_string(),
                )
            })
    }

    pub fn scanner(&self) -> Scanner<'_> {
        Scanner::new(&self.series_dir)
    }

    /// Lists the volumes of the series in natural order.
    pub fn scan(&self) -> Result<Vec<VolumeFile>> {
        self.preflight_check()?;
        self.scanner().scan_volumes()
    }

    /// Builds the remote providers this configuration allows, in cascade order.
    pub fn providers(&self) -> Result<Vec<Box<dyn CoverProvider>>> {
        if !self.remote_lookup {
            return Ok(Vec::new());
        }
        let client = HttpClient::new(
            &self.user_agent,
            Duration::from_secs(self.lookup_timeout_secs),
            Duration::from_secs(self.download_timeout_secs),
        )?;
        Ok(default_providers(client, self.match_policy))
    }

    /// Resolves the series cover with the configured providers.
    ///
    /// Never fails: problems are logged and end in `None`.
    pub fn resolve_cover(&self, volumes: &[VolumeFile]) -> Option<ResolvedCover> {
        let providers = self.providers().unwrap_or_else(|e| {
            warn!("[WARN] Remote lookup unavailable: {e}");
            Vec::new()
        });
        self.resolve_cover_with(volumes, providers)
    }

    /// Resolves the series cover with an explicit provider list.
    pub fn resolve_cover_with(
        &self,
        volumes: &[VolumeFile],
        providers: Vec<Box<dyn CoverProvider>>,
    ) -> Option<ResolvedCover> {
        CoverResolver::new(&self.series_dir, self.series_name(), providers)
            .resolve(volumes.first().map(VolumeFile::path))
    }

    /// Computes the batch plan. Reads the filesystem, never modifies it.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<BatchPlan>)` - One entry per batch folder
    /// * `Err(Error::NoVolumes)` - `volumes` is empty
    pub fn plan(
        &self,
        volumes: &[VolumeFile],
        cover: Option<&ResolvedCover>,
    ) -> Result<Vec<BatchPlan>> {
        let series_name = self.series_name();
        let settings = PlanSettings {
            parent_dir: self.parent_dir()?,
            series_name: &series_name,
            batch_size: self.batch_size,
            pad_width: self.pad_width,
            with_cover: cover.is_some(),
        };
        plan_batches(volumes, &self.series_dir, &settings)
    }

    /// Synthesizer configured with this configuration's font and layout.
    pub fn synthesizer(&self) -> CoverSynthesizer {
        let face = load_face(self.font_path.as_deref());
        debug!("Numbering covers with {}", face.describe());
        CoverSynthesizer::new(
            face,
            SynthSettings {
                margin: self.margin,
                fill_ratio: self.fill_ratio,
                ..SynthSettings::default()
            },
        )
    }

    /// Applies a plan produced by [`plan`](TankobonConfig::plan).
    pub fn execute(
        &self,
        plan: &[BatchPlan],
        cover: Option<&ResolvedCover>,
    ) -> Result<ExecutionReport> {
        match cover {
            Some(cover) => {
                let synthesizer = self.synthesizer();
                executor::execute(
                    plan,
                    Some(CoverJob {
                        base_path: &cover.path,
                        synthesizer: &synthesizer,
                    }),
                )
            }
            None => executor::execute(plan, None),
        }
    }

    /// Runs scan, cover resolution, planning and execution without asking.
    pub fn process(&self) -> Result<ExecutionReport> {
        let volumes = self.scan()?;
        if volumes.is_empty() {
            return Err(Error::NoVolumes(self.series_dir.clone()));
        }
        let cover = self.resolve_cover(&volumes);
        let plan = self.plan(&volumes, cover.as_ref())?;
        self.execute(&plan, cover.as_ref())
    }
}

impl TankobonConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(dir) = &self.series_dir {
            if dir.as_os_str().is_empty() {
                return Err("Series directory must not be empty".to_string());
            }
        }
        if let Some(batch_size) = self.batch_size {
            if batch_size == 0 {
                return Err("Batch size must be at least 1".to_string());
            }
        }
        if let Some(pad_width) = self.pad_width {
            if !(1..=9).contains(&pad_width) {
                return Err(format!("Pad width must be between 1 and 9, got {pad_width}"));
            }
        }
        if let Some(margin) = self.margin {
            if !(0.0..0.5).contains(&margin) {
                return Err(format!("Margin must be in [0, 0.5), got {margin}"));
            }
        }
        if let Some(fill_ratio) = self.fill_ratio {
            if !(fill_ratio > 0.0 && fill_ratio <= 1.0) {
                return Err(format!("Fill ratio must be in (0, 1], got {fill_ratio}"));
            }
        }
        if let Some(user_agent) = &self.user_agent {
            if user_agent.trim().is_empty() {
                return Err("User agent must not be empty".to_string());
            }
        }
        Ok(())
    }
}
