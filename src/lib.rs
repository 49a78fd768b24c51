//! # rgealti
//!
//! Per-tile statistics and reproducible elevation samples from IGN RGE ALTI
//! ESRI ASCII grids (`.asc`, Lambert-93), with coordinates converted to WGS84.
//!
//! ```no_run
//! use rgealti::{CsvExporter, PipelineConfig, RunSummary, TileProcessingPipeline};
//! use std::path::Path;
//!
//! let input = Path::new("RGEALTI_MNT_1M_ASC_LAMB93_IGN69_D075_20210118");
//! let mut pipeline = TileProcessingPipeline::new(PipelineConfig::default())?;
//! let results = pipeline.run_directory(input)?;
//! CsvExporter::new("output").export(&results)?;
//! println!("{}", RunSummary::from_results(&results));
//! # Ok::<(), rgealti::RgeAltiError>(())
//! ```

pub mod error;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod projection;
pub mod sampler;
pub mod statistics;
pub mod summary;
pub mod writer;

pub use error::{Result, RgeAltiError};
pub use model::{Bounds, GridHeader, GridTile, SamplePoint, TileStatistics};
pub use parser::{parse_asc, parse_asc_file};
pub use pipeline::{
    collect_asc_files, ErrorPolicy, PipelineConfig, SkippedTile, TileProcessingPipeline,
    TileResults,
};
pub use projection::Reprojector;
pub use sampler::{sample_tile, RandomSampler, SamplingMode};
pub use statistics::compute_statistics;
pub use summary::RunSummary;
pub use writer::{CsvExporter, ExportPaths};
