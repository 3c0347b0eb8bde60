//! Candidate storage paths for a photo id.
//!
//! Photos are uploaded under one of two folder shapes:
//!
//! ```text
//! {venue}/{year}/{MonthName}/{MM.DD.YYYY}/{id}
//! {venue}/{year}/{MM.DD.YYYY}/{id}
//! ```
//!
//! The exact date and the casing of the id are unknown, so the resolver walks
//! a window of days backwards from the event start date. For each day and each
//! casing variant the month-qualified path comes first. Recent dates and the
//! month shape are the most common, which keeps the average number of remote
//! lookups low.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};

use super::photo_id::{venue_from_id, Venue};

/// Default number of days searched backwards from the start date.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 90;

/// Casing applied to a photo id before it is placed in a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdCasing {
    Original,
    Upper,
    Lower,
}

impl IdCasing {
    pub fn apply(self, photo_id: &str) -> String {
        match self {
            IdCasing::Original => photo_id.to_string(),
            IdCasing::Upper => photo_id.to_uppercase(),
            IdCasing::Lower => photo_id.to_lowercase(),
        }
    }
}

/// Casings tried by default, in priority order.
pub const DEFAULT_CASINGS: [IdCasing; 3] = [IdCasing::Original, IdCasing::Upper, IdCasing::Lower];

/// Distinct, non-empty id variants in casing order.
pub fn id_variants(photo_id: &str, casings: &[IdCasing]) -> Vec<String> {
    let mut variants: Vec<String> = Vec::with_capacity(casings.len());
    for casing in casings {
        let variant = casing.apply(photo_id);
        if !variant.is_empty() && !variants.contains(&variant) {
            variants.push(variant);
        }
    }
    variants
}

/// Parse the `startDateISO` value accepted by the API.
///
/// Accepts a plain date (`2025-09-28`), an RFC 3339 timestamp (the calendar
/// date in its own offset is used) or a naive `YYYY-MM-DDTHH:MM:SS`.
pub fn parse_start_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}

/// Lazy, ordered sequence of candidate paths.
///
/// Nothing is allocated up front beyond the id variants, so a resolver that
/// hits on the first candidate never builds the remaining few hundred.
#[derive(Debug, Clone)]
pub struct CandidatePaths {
    venue: Venue,
    start: NaiveDate,
    lookback_days: u32,
    variants: Vec<String>,
    day: u32,
    variant: usize,
    month_emitted: bool,
}

impl CandidatePaths {
    /// Build the sequence for `photo_id`, searching `lookback_days` days back
    /// from (and including) `start`.
    pub fn new(photo_id: &str, start: NaiveDate, lookback_days: u32, casings: &[IdCasing]) -> Self {
        Self {
            venue: venue_from_id(photo_id),
            start,
            lookback_days,
            variants: id_variants(photo_id, casings),
            day: 0,
            variant: 0,
            month_emitted: false,
        }
    }

    /// Venue the paths are rooted in.
    pub fn venue(&self) -> Venue {
        self.venue
    }

    fn remaining(&self) -> usize {
        let per_day = self.variants.len() * 2;
        let total = self.lookback_days as usize * per_day;
        let consumed =
            self.day as usize * per_day + self.variant * 2 + usize::from(self.month_emitted);
        total.saturating_sub(consumed)
    }
}

impl Iterator for CandidatePaths {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        if self.day >= self.lookback_days {
            return None;
        }
        let id = self.variants.get(self.variant)?;
        let date = self.start.checked_sub_days(Days::new(u64::from(self.day)))?;

        let year = date.year();
        let day_folder = date.format("%m.%d.%Y");

        let path = if self.month_emitted {
            format!("{}/{}/{}/{}", self.venue, year, day_folder, id)
        } else {
            let month = date.format("%B");
            format!("{}/{}/{}/{}/{}", self.venue, year, month, day_folder, id)
        };

        if self.month_emitted {
            self.month_emitted = false;
            self.variant += 1;
            if self.variant == self.variants.len() {
                self.variant = 0;
                self.day += 1;
            }
        } else {
            self.month_emitted = true;
        }

        Some(path)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining()))
    }
}
