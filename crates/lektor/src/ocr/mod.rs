//! Multi-format OCR text-line extraction.
//!
//! Parses ALTO (v3, v4) and PAGE (2013, 2019) documents into a unified
//! [`TextLine`](crate::types::TextLine) sequence.
//!
//! # Example
//!
//! ```rust,no_run
//! use lektor::ocr::{LineOptions, read_lines};
//!
//! # fn example() -> lektor::Result<()> {
//! let lines = read_lines("0001.xml", &LineOptions::default())?;
//! for line in &lines {
//!     println!("{}: {}", line.id(), line.text_content());
//! }
//! # Ok(())
//! # }
//! ```
pub mod alto;
pub mod geometry;
pub mod lines;
pub mod namespace;
pub mod page;
pub mod postprocess;
pub mod xml_tree;

pub use lines::{LineOptions, extract_lines, read_alto_lines, read_lines};
pub use namespace::{OcrFormat, detect_format};
pub use postprocess::{AltoPostprocessor, PostprocessStats};
