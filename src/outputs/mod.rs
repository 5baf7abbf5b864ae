//! Output generation for completed runs.
//!
//! # Submodules
//!
//! - [`json`]: Writes each [`RunReport`](crate::ingest::RunReport) to a dated JSON file
//!
//! # Output Structure
//!
//! ```text
//! report_dir/
//! ├── 2025-05-06/
//! │   ├── 08-00-00.json
//! │   └── 09-00-00.json
//! └── 2025-05-07/
//!     └── 08-00-00.json
//! ```

pub mod json;
