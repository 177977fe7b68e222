use crate::model::ResultSummary;
use crate::parse::parse_report;

/// Collect the per-run summaries of a batch of parallel runs.
///
/// Takes the captured combined output of each run, in dispatch order, with `None` for runs
/// whose execution failed outright. Failed runs are silently skipped here: their failure was
/// already published as an execution event by the supervisor and must not be double-reported.
///
/// The second element is reserved for aggregation-level errors and is currently always empty.
pub fn aggregate_results<'a>(
    outputs: impl IntoIterator<Item = Option<&'a str>>,
) -> (Vec<ResultSummary>, Vec<String>) {
    let errors = Vec::new();

    let summaries = outputs
        .into_iter()
        .flatten()
        .map(|output| parse_report(output.lines()))
        .collect();

    (summaries, errors)
}
