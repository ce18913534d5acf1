//! Sweep [`Report`] definitions.

use derive_more::Display;

/// Outcome of a single sweep pass.
///
/// Records failing to be processed are counted and skipped, so they never
/// abort the whole pass.
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[display(
    "matched: {matched}, notified: {notified}, updated: {updated}, \
     skipped: {skipped}, failed: {failed}"
)]
pub struct Report {
    /// Number of records matching the sweep condition.
    pub matched: u64,

    /// Number of delivered notices.
    pub notified: u64,

    /// Number of records mutated by the sweep.
    pub updated: u64,

    /// Number of records skipped because their owner couldn't be resolved.
    pub skipped: u64,

    /// Number of failed notices or mutations.
    pub failed: u64,
}

impl Report {
    /// Counts the outcome of a sent notice.
    pub(crate) fn sent(&mut self, delivered: bool) {
        if delivered {
            self.notified += 1;
        } else {
            self.failed += 1;
        }
    }
}
