mod aggregate;
mod model;
mod parse;

pub mod prelude {
    pub use crate::aggregate::aggregate_results;
    pub use crate::model::{MetricValue, ResultSummary};
    pub use crate::parse::{convert_metric_to_ms, parse_report};
}
