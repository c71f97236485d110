//! Module graph model, cycle detection, export and reports

pub mod error;
pub mod model;
pub mod graph;
pub mod cycles;
pub mod export;
pub mod report;


pub use error::{KiteError, Result};
pub use model::{FileEntry, SymbolRecord, ModuleKind, ModuleNode, ModuleEntry, DependencyInfo, FileDependencies};
pub use graph::DependencyGraph;
pub use cycles::find_cycles;
pub use export::{ExportFormat, ExportOutput, export};
pub use report::{DependencyReport, HighDependencyModule, ReportSummary, ReportThresholds};
