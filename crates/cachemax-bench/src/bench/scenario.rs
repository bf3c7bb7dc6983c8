//! The two comparison runs: storage volumes and cache layers.

use crate::bench::{
    BenchmarkResult, BenchmarkRunner, DirectMemoryStrategy, IoStrategy, MappedFileStrategy,
    OpenMode, PhaseProgress, Phases, SyncFileStrategy,
};
use crate::config::Scenario;
use crate::results::analysis::{
    analyze_cache, analyze_volumes, Analysis, CacheTargets, Target, VolumeTargets,
};
use crate::results::progress::{ProgressMode, StrategyProgress};
use crate::workload::WorkloadSpec;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Target names used in reports.
pub const REGULAR: &str = "regular";
pub const ACCELERATED: &str = "accelerated";
pub const MEMORY: &str = "memory";
pub const ORIGINAL: &str = "original";
pub const DIRECT_CACHE: &str = "direct cache";
pub const LAYERED: &str = "caching layer";

/// One strategy measured against one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    /// Which target was measured.
    pub target: String,
    /// File used, if the strategy touches storage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub result: BenchmarkResult,
}

impl Measurement {
    fn target(&self) -> Target<'_> {
        Target::new(&self.target, &self.result)
    }
}

/// Everything one scenario produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioReport {
    pub scenario: &'static str,
    pub workload: WorkloadSpec,
    pub measurements: Vec<Measurement>,
    pub analysis: Analysis,
}

/// Removes a scratch file on drop unless asked to keep it.
struct ScratchFile {
    path: PathBuf,
    keep: bool,
}

impl ScratchFile {
    fn new(dir: &Path, kind: &str, keep: bool) -> Self {
        let name = format!("cmbench-{}-{kind}.dat", std::process::id());
        Self {
            path: dir.join(name),
            keep,
        }
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.keep {
            tracing::info!("Keeping {}", self.path.display());
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!("Removed {}", self.path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", self.path.display(), e),
        }
    }
}

/// Runs the strategies a scenario needs, in order, and analyzes them.
pub struct ScenarioRunner<'c> {
    runner: BenchmarkRunner<'c>,
    keep_files: bool,
    progress: ProgressMode,
}

impl<'c> ScenarioRunner<'c> {
    /// Scenario runner without progress output.
    pub fn new(runner: BenchmarkRunner<'c>, keep_files: bool) -> Self {
        Self {
            runner,
            keep_files,
            progress: ProgressMode::Hidden,
        }
    }

    /// Show a spinner per strategy run.
    #[must_use]
    pub fn with_progress(mut self, mode: ProgressMode) -> Self {
        self.progress = mode;
        self
    }

    /// Run `scenario`.
    pub fn run(&self, scenario: &Scenario) -> ScenarioReport {
        match scenario {
            Scenario::Volumes {
                regular_dir,
                accelerated_dir,
            } => self.run_volumes(regular_dir, accelerated_dir),
            Scenario::Cache {
                original,
                direct_cache,
                layered,
            } => self.run_cache(original, direct_cache, layered),
        }
    }

    /// Synchronous and mapped I/O on fresh scratch files in both directories,
    /// then the in-memory baseline.
    pub fn run_volumes(&self, regular_dir: &Path, accelerated_dir: &Path) -> ScenarioReport {
        let mut measurements = Vec::with_capacity(5);

        for (target, dir) in [(REGULAR, regular_dir), (ACCELERATED, accelerated_dir)] {
            let sync_file = ScratchFile::new(dir, "sync", self.keep_files);
            let mut sync = SyncFileStrategy::new(&sync_file.path, OpenMode::Recreate);
            measurements.push(self.measure(
                target,
                Some(sync_file.path.as_path()),
                &mut sync,
                Phases::ReadWrite,
            ));

            let mapped_file = ScratchFile::new(dir, "mapped", self.keep_files);
            let mut mapped = MappedFileStrategy::new(&mapped_file.path);
            measurements.push(self.measure(
                target,
                Some(mapped_file.path.as_path()),
                &mut mapped,
                Phases::ReadWrite,
            ));
        }

        let mut memory = DirectMemoryStrategy::new();
        measurements.push(self.measure(MEMORY, None, &mut memory, Phases::ReadWrite));

        let analysis = analyze_volumes(&VolumeTargets {
            regular_sync: measurements[0].target(),
            accelerated_sync: measurements[2].target(),
            accelerated_mapped: measurements[3].target(),
            memory: measurements[4].target(),
        });

        self.report("volumes", measurements, analysis)
    }

    /// Random reads of the same file through three paths. The files are user
    /// data: they are only read, never created, extended, or removed. A
    /// missing or short file is reported as not measured.
    pub fn run_cache(&self, original: &Path, direct_cache: &Path, layered: &Path) -> ScenarioReport {
        let measurements: Vec<Measurement> = [
            (ORIGINAL, original),
            (DIRECT_CACHE, direct_cache),
            (LAYERED, layered),
        ]
        .into_iter()
        .map(|(target, path)| {
            let mut sync = SyncFileStrategy::new(path, OpenMode::ReadExisting);
            self.measure(target, Some(path), &mut sync, Phases::ReadOnly)
        })
        .collect();

        let analysis = analyze_cache(&CacheTargets {
            original: measurements[0].target(),
            direct_cache: measurements[1].target(),
            layered: measurements[2].target(),
        });

        self.report("cache", measurements, analysis)
    }

    fn measure(
        &self,
        target: &str,
        path: Option<&Path>,
        strategy: &mut dyn IoStrategy,
        phases: Phases,
    ) -> Measurement {
        let result = if self.progress == ProgressMode::Hidden {
            self.runner.run_phases(strategy, phases)
        } else {
            let reporter = StrategyProgress::new(target, strategy.label(), self.progress);
            let callback = |step: PhaseProgress| reporter.update(&step);
            let result = self.runner.run_with_progress(strategy, phases, Some(&callback));
            reporter.finish(&result);
            result
        };
        Measurement {
            target: target.to_string(),
            path: path.map(Path::to_path_buf),
            result,
        }
    }

    fn report(
        &self,
        scenario: &'static str,
        measurements: Vec<Measurement>,
        analysis: Analysis,
    ) -> ScenarioReport {
        ScenarioReport {
            scenario,
            workload: *self.runner.spec(),
            measurements,
            analysis,
        }
    }
}
