use std::collections::HashSet;

use tracing::debug;

/// Something with an identity string. Records with the same identity are the same record.
pub trait Identified {
    fn identity(&self) -> &str;
}

/// Counters for one assembly run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyReport {
    pub candidates: usize,
    pub extracted: usize,
    /// Candidates that yielded nothing.
    pub skipped: usize,
    /// Records with an empty identity.
    pub malformed: usize,
    pub duplicates: usize,
}

/// Keeps the first record seen for every identity.
///
/// The seen set lives only as long as the deduplicator, so state never leaks between requests.
#[derive(Debug)]
pub struct Deduplicator<T> {
    seen: HashSet<String>,
    records: Vec<T>,
    report: AssemblyReport,
}

impl<T> Default for Deduplicator<T> {
    fn default() -> Self {
        Self {
            seen: Default::default(),
            records: vec![],
            report: Default::default(),
        }
    }
}

impl<T: Identified> Deduplicator<T> {
    pub fn new() -> Self {
        Default::default()
    }

    /// Offers the outcome of extracting one candidate. Returns whether a record was kept.
    pub fn offer(&mut self, candidate: Option<T>) -> bool {
        self.report.candidates += 1;

        let Some(record) = candidate else {
            self.report.skipped += 1;
            return false;
        };

        let id = record.identity();

        if id.is_empty() {
            self.report.malformed += 1;
            return false;
        }

        if !self.seen.insert(id.to_owned()) {
            self.report.duplicates += 1;
            return false;
        }

        self.report.extracted += 1;
        self.records.push(record);

        true
    }

    pub fn finish(self) -> (Vec<T>, AssemblyReport) {
        (self.records, self.report)
    }
}

/// Runs `extract` over `candidates` in order and keeps the first record for every identity.
///
/// Candidates that yield nothing or carry an empty identity are dropped and only counted.
pub fn assemble<I, T, F>(what: &str, candidates: I, extract: F) -> Vec<T>
where
    I: IntoIterator,
    T: Identified,
    F: FnMut(I::Item) -> Option<T>,
{
    let mut dedup = Deduplicator::new();

    for candidate in candidates.into_iter().map(extract) {
        dedup.offer(candidate);
    }

    let (records, report) = dedup.finish();

    debug!(
        candidates = report.candidates,
        extracted = report.extracted,
        skipped = report.skipped,
        malformed = report.malformed,
        duplicates = report.duplicates,
        "Assembled {what}",
    );

    records
}
