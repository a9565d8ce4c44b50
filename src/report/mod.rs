pub mod markdown;
pub mod progress;

pub use markdown::{ComparisonReporter, ReportExtras, REPORT_TITLE};
pub use progress::{
    clamp_percentage, create_category_chart, create_progress_bar, ProgressVisualizer,
    DEFAULT_BAR_WIDTH,
};
