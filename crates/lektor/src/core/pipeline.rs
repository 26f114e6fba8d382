//! Batch orchestration: step sequencing per document and bounded parallelism.

use crate::core::config::PipelineConfig;
use crate::core::io;
use crate::quality::report::{report_file_name, write_report};
use crate::steps::{Step, StepContext, StepRegistry, global_registry};
use crate::types::EstimationRecord;
use crate::{LektorError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

/// Runs the configured steps over the documents of one data directory.
#[derive(Debug, Clone)]
pub struct Pipeline {
    data_dir: PathBuf,
    config: PipelineConfig,
    registry: StepRegistry,
}

impl Pipeline {
    /// Pipeline over `data_dir` with the process-wide step registry.
    ///
    /// # Errors
    ///
    /// `LektorError::Validation` for invalid settings, unknown step tags or
    /// step parameters a constructor rejects.
    pub fn new(data_dir: impl Into<PathBuf>, config: PipelineConfig) -> Result<Self> {
        Self::with_registry(data_dir, config, global_registry()?)
    }

    pub fn with_registry(data_dir: impl Into<PathBuf>, config: PipelineConfig, registry: StepRegistry) -> Result<Self> {
        config.validate()?;
        let pipeline = Self {
            data_dir: data_dir.into(),
            config,
            registry,
        };
        pipeline.build_steps()?;
        Ok(pipeline)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Fresh step instances in configured order.
    pub fn build_steps(&self) -> Result<Vec<Arc<dyn Step>>> {
        self.config
            .steps
            .iter()
            .map(|s| self.registry.build(&s.tag, &s.params))
            .collect()
    }

    /// Sorted input files of the data directory.
    pub fn input_paths(&self) -> Result<Vec<PathBuf>> {
        io::input_sorted(&self.data_dir, &self.config.pipeline.file_ext, self.config.pipeline.recursive)
    }

    /// Prepare the configured workdir, if any.
    pub fn prepare_workdir(&self) -> Result<Option<PathBuf>> {
        match &self.config.pipeline.workdir {
            Some(workdir) => io::prepare_workdir(workdir).map(Some),
            None => Ok(None),
        }
    }

    fn switch_mark(&self, next: &str) -> Result<Option<PathBuf>> {
        match &self.config.pipeline.mark_prev {
            Some(prev) => io::write_mark(&self.data_dir, prev, next).map(Some),
            None => {
                tracing::debug!("no previous marker configured, skip '{}'", next);
                Ok(None)
            }
        }
    }

    pub fn mark_done(&self) -> Result<Option<PathBuf>> {
        self.switch_mark(&self.config.pipeline.mark_done)
    }

    pub fn mark_fail(&self) -> Result<Option<PathBuf>> {
        self.switch_mark(&self.config.pipeline.mark_fail)
    }

    /// Run all steps on one document, threading each step's `path_next`.
    ///
    /// Returns the document's estimation, or [`EstimationRecord::missing`] if
    /// no step produced one.
    pub async fn run_document(&self, nr: usize, path: impl AsRef<Path>) -> Result<EstimationRecord> {
        let mut ctx = StepContext::new(path.as_ref());
        let span = tracing::info_span!("document", file = %ctx.label, nr);
        async move {
            let steps = self.build_steps()?;
            tracing::info!("start pipeline with {} steps", steps.len());

            let mut record = EstimationRecord::missing(ctx.label.as_str());
            for step in &steps {
                let started = Instant::now();
                let output = step.execute(&ctx).await?;
                if !output.statistics.is_empty() {
                    tracing::debug!("statistics: {:?}", output.statistics);
                }
                tracing::info!("'{}' passed in {:.2}s", step.name(), started.elapsed().as_secs_f64());

                if let Some(estimation) = output.estimation {
                    record = estimation;
                }
                if let Some(next) = output.path_next {
                    tracing::debug!("'{}' path_next: {}", step.name(), next.display());
                    ctx = ctx.with_input(next);
                }
            }
            tracing::info!("done pipeline with {} steps", steps.len());
            Ok(record)
        }
        .instrument(span)
        .await
    }

    /// Run every document with at most `executors` in flight.
    ///
    /// Records come back in input order. The first failing document aborts
    /// the batch with its error.
    pub async fn run(&self, paths: Vec<PathBuf>) -> Result<Vec<EstimationRecord>> {
        use tokio::sync::Semaphore;
        use tokio::task::JoinSet;

        if paths.is_empty() {
            return Ok(vec![]);
        }

        let total = paths.len();
        let pipeline = Arc::new(self.clone());
        let semaphore = Arc::new(Semaphore::new(self.config.pipeline.executors.max(1)));
        tracing::info!("process {} documents with {} executors", total, self.config.pipeline.executors);

        let mut tasks = JoinSet::new();
        for (index, path) in paths.into_iter().enumerate() {
            let pipeline = Arc::clone(&pipeline);
            let semaphore = Arc::clone(&semaphore);
            tasks.spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => pipeline.run_document(index + 1, &path).await,
                    Err(e) => Err(LektorError::Other(format!("Executor pool closed: {}", e))),
                };
                (index, path, result)
            });
        }

        let mut records: Vec<Option<EstimationRecord>> = vec![None; total];
        while let Some(task_result) = tasks.join_next().await {
            match task_result {
                Ok((index, _, Ok(record))) => records[index] = Some(record),
                Ok((_, path, Err(e))) => {
                    tracing::error!("[{}] {}", path.display(), e);
                    return Err(e);
                }
                Err(join_err) => {
                    return Err(LektorError::Other(format!("Task panicked: {}", join_err)));
                }
            }
        }

        records
            .into_iter()
            .map(|r| r.ok_or_else(|| LektorError::Other("Document result missing".to_string())))
            .collect()
    }

    /// Write the batch report into the data directory.
    ///
    /// Returns the report path, or `None` if no record carries a valid ratio.
    pub fn store_estimations(&self, records: &[EstimationRecord]) -> Result<Option<PathBuf>> {
        let dir_name = self
            .data_dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "ocr".to_string());
        let finished = chrono::Local::now().naive_local();
        let path = self.data_dir.join(report_file_name(&dir_name, &finished));

        if write_report(&path, records)? {
            tracing::info!("stored estimations in '{}'", path.display());
            Ok(Some(path))
        } else {
            tracing::info!("no ocr estimation data available, no report written");
            Ok(None)
        }
    }
}
