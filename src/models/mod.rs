// Combined outputs assembled from the analysis and options modules
pub mod report;

pub use report::{
    AnalyticsReport, OptionsReport, build_options_report, build_report, build_report_with,
};
