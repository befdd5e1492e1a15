//! Aggregate RSVP statistics.

use serde::{Deserialize, Serialize};

use super::rsvp::Record;

/// Totals derived from the full record list.
///
/// Never stored: always recomputed from a fresh read so the numbers match the
/// records shown next to them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total: u64,
    pub going: u64,
    pub not_going: u64,
    pub total_adults: u64,
    pub total_kids: u64,
}

impl AggregateStats {
    /// Compute stats over a slice of records.
    #[must_use]
    pub fn from_records(records: &[Record]) -> Self {
        records.iter().collect()
    }

    fn add(mut self, record: &Record) -> Self {
        self.total += 1;
        if record.attending {
            self.going += 1;
        } else {
            self.not_going += 1;
        }
        self.total_adults += u64::from(record.adult_count);
        self.total_kids += u64::from(record.kid_count);
        self
    }
}

impl<'a> FromIterator<&'a Record> for AggregateStats {
    fn from_iter<I: IntoIterator<Item = &'a Record>>(iter: I) -> Self {
        iter.into_iter().fold(Self::default(), Self::add)
    }
}
