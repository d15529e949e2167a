pub mod analyze;
pub mod config;
pub mod filter;
pub mod gate;
pub mod report;
pub mod summarize;

#[cfg(feature = "test_data")]
pub mod test_data;

pub use config::{ConfigError, FilterConfig, ReportConfig, SummaryConfig, ThresholdConfig};
pub use filter::RecordFilter;
pub use gate::{ThresholdCheck, ThresholdGate, Verdict};
pub use report::{build_report, InvalidRecord, Report};
pub use summarize::{SummaryOutput, SummaryReducer};
