//! Pipeline orchestration.
//!
//! - [`config`] loads the `[pipeline]` settings and the `[[steps]]` list
//! - [`io`] discovers input files, prepares the workdir and switches state markers
//! - [`pipeline`] runs the steps per document with bounded parallelism
//!
//! # Example
//!
//! ```rust,no_run
//! use lektor::core::{Pipeline, PipelineConfig};
//!
//! # async fn example() -> lektor::Result<()> {
//! let config = PipelineConfig::from_file("lektor.toml")?;
//! let pipeline = Pipeline::new("/data/scans/1981185920_44046", config)?;
//! let records = pipeline.run(pipeline.input_paths()?).await?;
//! pipeline.store_estimations(&records)?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod io;
pub mod pipeline;

pub use config::{PipelineConfig, PipelineOverrides, PipelineSection, StepConfig};
pub use pipeline::Pipeline;
