//! Half-open date ranges (`[start, end)`) used for contract terms and room nights.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// A non-empty, half-open range of calendar dates.
///
/// `end` is exclusive, so a stay from the 1st to the 3rd covers the nights of the 1st
/// and the 2nd. Construction guarantees `start < end`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = DomainError;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        DateRange::new(raw.start, raw.end)
    }
}

impl ValueObject for DateRange {}

impl DateRange {
    /// Build `[start, end)`. Rejects empty or inverted ranges.
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start >= end {
            return Err(DomainError::validation(format!(
                "date range must be non-empty (start {start} must be before end {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range covering `first..=last`.
    pub fn inclusive(first: NaiveDate, last: NaiveDate) -> DomainResult<Self> {
        let end = last
            .succ_opt()
            .ok_or_else(|| DomainError::validation("date range end is out of bounds"))?;
        Self::new(first, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Exclusive end.
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Last date inside the range.
    pub fn last_day(&self) -> NaiveDate {
        self.end.pred_opt().unwrap_or(self.start)
    }

    pub fn len_days(&self) -> u32 {
        (self.end - self.start).num_days() as u32
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// True when every date of `other` lies inside `self`.
    pub fn covers(&self, other: &DateRange) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        DateRange::new(start, end).ok()
    }

    /// Iterate every date in the range, ascending.
    pub fn days(&self) -> Days {
        Days {
            next: self.start,
            end: self.end,
        }
    }
}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Iterator over the dates of a [`DateRange`].
#[derive(Debug, Clone)]
pub struct Days {
    next: NaiveDate,
    end: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.end {
            return None;
        }
        let current = self.next;
        self.next = current.succ_opt().unwrap_or(self.end);
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        let d = date(2024, 7, 1);
        assert!(matches!(
            DateRange::new(d, d),
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            DateRange::new(date(2024, 7, 2), d),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn inclusive_range_includes_last_day() {
        let range = DateRange::inclusive(date(2024, 7, 1), date(2024, 7, 2)).unwrap();
        assert_eq!(range.end(), date(2024, 7, 3));
        assert_eq!(range.last_day(), date(2024, 7, 2));
        assert_eq!(
            range.days().collect::<Vec<_>>(),
            vec![date(2024, 7, 1), date(2024, 7, 2)]
        );
    }

    #[test]
    fn days_cross_month_boundaries() {
        let range = DateRange::new(date(2024, 2, 28), date(2024, 3, 2)).unwrap();
        assert_eq!(range.len_days(), 3);
        assert_eq!(range.days().last(), Some(date(2024, 3, 1)));
    }

    #[test]
    fn overlap_and_intersection() {
        let a = DateRange::new(date(2024, 7, 1), date(2024, 7, 5)).unwrap();
        let b = DateRange::new(date(2024, 7, 4), date(2024, 7, 10)).unwrap();
        let c = DateRange::new(date(2024, 7, 5), date(2024, 7, 6)).unwrap();

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert_eq!(
            a.intersection(&b),
            Some(DateRange::new(date(2024, 7, 4), date(2024, 7, 5)).unwrap())
        );
        assert_eq!(a.intersection(&c), None);
        assert!(a.covers(&DateRange::inclusive(date(2024, 7, 2), date(2024, 7, 4)).unwrap()));
        assert!(!a.covers(&b));
    }

    #[test]
    fn deserialization_enforces_non_empty() {
        let err = serde_json::from_str::<DateRange>(r#"{"start":"2024-07-02","end":"2024-07-01"}"#);
        assert!(err.is_err());

        let ok: DateRange =
            serde_json::from_str(r#"{"start":"2024-07-01","end":"2024-07-02"}"#).unwrap();
        assert_eq!(ok.len_days(), 1);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: iteration yields exactly `len_days` dates, all contained.
            #[test]
            fn days_match_length(offset in 0i64..3650, len in 1i64..400) {
                let start = date(2020, 1, 1) + chrono::Duration::days(offset);
                let end = start + chrono::Duration::days(len);
                let range = DateRange::new(start, end).unwrap();

                let days: Vec<_> = range.days().collect();
                prop_assert_eq!(days.len() as u32, range.len_days());
                prop_assert!(days.iter().all(|d| range.contains(*d)));
                prop_assert!(!range.contains(end));
            }
        }
    }
}
