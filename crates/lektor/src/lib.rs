//! Lektor - OCR Line Extraction and Quality Estimation
//!
//! Lektor reads the text lines of OCR results in ALTO (v3, v4) and PAGE
//! (2013, 2019) format, normalizes them and estimates their lexical quality
//! against a LanguageTool spell-checking service. A configurable pipeline runs
//! tesseract, file cleanups and the estimation over whole scan directories.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lektor::ocr::{LineOptions, read_lines};
//!
//! # fn main() -> lektor::Result<()> {
//! for line in read_lines("0001.xml", &LineOptions::default())? {
//!     println!("{}", line.text_content());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **OCR** (`ocr`): format detection, line extraction, ALTO postprocessing
//! - **Text** (`text`): dehyphenation and noise removal
//! - **Quality** (`quality`): spell-checker client, estimator and batch report
//! - **Steps** (`steps`): pipeline steps and their registry
//! - **Core** (`core`): configuration, input discovery, batch runner

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod ocr;
pub mod quality;
pub mod steps;
pub mod text;
pub mod types;

pub use error::{LektorError, Result};
pub use types::*;

pub use core::{Pipeline, PipelineConfig, PipelineOverrides};
pub use ocr::{LineOptions, OcrFormat, extract_lines, read_lines};
pub use quality::{EstimatorConfig, LanguageToolClient, QualityEstimator, SpellChecker};
pub use steps::{Step, StepContext, StepKind, StepOutput, StepRegistry};
