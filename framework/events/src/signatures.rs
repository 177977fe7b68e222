use regex::Regex;
use serde::Serialize;

/// Known failure categories in scylla-bench output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FaultKind {
    /// Not enough replicas answered within the consistency requirement.
    ConsistencyError,
    /// Read back data that does not match what was written.
    DataValidationError,
    /// The tool rejected one of its distribution arguments.
    ParseDistributionError,
    /// Could not reach the cluster.
    ConnectionError,
    /// The tool crashed.
    Panic,
}

/// One entry in the ordered fault signature table.
#[derive(Debug, Clone)]
pub struct FaultSignature {
    pub pattern: Regex,
    pub kind: FaultKind,
}

impl FaultSignature {
    fn new(pattern: &str, kind: FaultKind) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("fault signature pattern must be a valid regex"),
            kind,
        }
    }
}

/// Matches lines of live tool output against an ordered signature table.
///
/// The table is plain data so new signatures can be registered without touching the matching
/// code. Order matters: [PatternMatcher::first_match] honors it, and
/// [PatternMatcher::matches] yields entries in it.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    signatures: Vec<FaultSignature>,
}

impl PatternMatcher {
    pub fn new(signatures: Vec<FaultSignature>) -> Self {
        Self { signatures }
    }

    /// The kind of the first signature that matches `line`, if any.
    pub fn first_match(&self, line: &str) -> Option<FaultKind> {
        self.signatures
            .iter()
            .find(|signature| signature.pattern.is_match(line))
            .map(|signature| signature.kind)
    }

    /// Every signature that matches `line`, in table order.
    pub fn matches<'a>(&'a self, line: &'a str) -> impl Iterator<Item = &'a FaultSignature> {
        self.signatures
            .iter()
            .filter(move |signature| signature.pattern.is_match(line))
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::new(default_fault_signatures())
    }
}

/// The built-in signature table for scylla-bench output.
pub fn default_fault_signatures() -> Vec<FaultSignature> {
    vec![
        FaultSignature::new(r"received only", FaultKind::ConsistencyError),
        FaultSignature::new(r"doesn't match", FaultKind::DataValidationError),
        FaultSignature::new(r"error parsing distribution", FaultKind::ParseDistributionError),
        FaultSignature::new(
            r"connection refused|no connections were made",
            FaultKind::ConnectionError,
        ),
        FaultSignature::new(r"panic: ", FaultKind::Panic),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_match_honors_table_order() {
        let matcher = PatternMatcher::new(vec![
            FaultSignature::new("error", FaultKind::ConnectionError),
            FaultSignature::new("error parsing", FaultKind::ParseDistributionError),
        ]);

        assert_eq!(
            matcher.first_match("error parsing distribution: bad spec"),
            Some(FaultKind::ConnectionError)
        );
    }

    #[test]
    fn unmatched_line_yields_none() {
        let matcher = PatternMatcher::default();
        assert_eq!(matcher.first_match("Operations/s: 100"), None);
    }

    #[test]
    fn all_matching_signatures_are_yielded_in_order() {
        let matcher = PatternMatcher::new(vec![
            FaultSignature::new("timed out", FaultKind::ConnectionError),
            FaultSignature::new("panic", FaultKind::Panic),
            FaultSignature::new("timed out waiting", FaultKind::ConsistencyError),
        ]);

        let kinds: Vec<_> = matcher
            .matches("request timed out waiting for replicas")
            .map(|signature| signature.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![FaultKind::ConnectionError, FaultKind::ConsistencyError]
        );
    }

    #[test]
    fn default_table_covers_known_tool_failures() {
        let matcher = PatternMatcher::default();

        assert_eq!(
            matcher.first_match("2024/02/12 09:15:10 received only 1 responses from 2 CL=QUORUM"),
            Some(FaultKind::ConsistencyError)
        );
        assert_eq!(
            matcher.first_match("value of pk(42), ck(7) doesn't match expected checksum"),
            Some(FaultKind::DataValidationError)
        );
        assert_eq!(
            matcher.first_match("panic: runtime error: invalid memory address"),
            Some(FaultKind::Panic)
        );
    }
}
