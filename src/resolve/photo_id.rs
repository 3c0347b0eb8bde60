//! Photo identifier conventions.
//!
//! A photo id such as `CH0928251007` is a venue prefix followed by a numeric
//! ordinal. The prefix picks the storage folder, the ordinal links sequential
//! poses of the same shoot.

use std::fmt;

use serde::Serialize;

/// Venue folder an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Venue {
    ChiefsLuau,
    KaMoanaLuau,
}

impl Venue {
    /// Top-level folder name in the asset store.
    pub fn slug(&self) -> &'static str {
        match self {
            Venue::ChiefsLuau => "chiefs-luau",
            Venue::KaMoanaLuau => "ka-moana-luau",
        }
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Classify an identifier by its prefix.
///
/// `KL…` (any case) belongs to Ka Moana; everything else, including the
/// empty string, falls back to the Chiefs venue.
pub fn venue_from_id(photo_id: &str) -> Venue {
    let is_ka_moana = photo_id
        .as_bytes()
        .get(..2)
        .map(|prefix| prefix.eq_ignore_ascii_case(b"KL"))
        .unwrap_or(false);

    if is_ka_moana {
        Venue::KaMoanaLuau
    } else {
        Venue::ChiefsLuau
    }
}

/// Whether `photo_id` can name a single file in the store.
///
/// Ids are spliced into storage paths as the last segment, so separators and
/// dot segments would escape the dated folder.
pub fn is_valid_photo_id(photo_id: &str) -> bool {
    !photo_id.is_empty()
        && photo_id != "."
        && photo_id != ".."
        && !photo_id.contains(['/', '\\'])
}

/// Split an identifier into its non-digit prefix and trailing ASCII digits.
pub fn split_ordinal(photo_id: &str) -> (&str, &str) {
    let digit_count = photo_id
        .bytes()
        .rev()
        .take_while(u8::is_ascii_digit)
        .count();
    photo_id.split_at(photo_id.len() - digit_count)
}

/// Identifiers of the previous and next pose.
///
/// A missing ordinal counts as 0, so `"X"` yields `("X-1", "X1")`. The
/// result keeps the zero padding of the original ordinal. No bounds are
/// enforced; ids that do not exist simply fail to resolve later.
pub fn neighbor_ids(photo_id: &str) -> (String, String) {
    let (prefix, digits) = split_ordinal(photo_id);
    let width = digits.len();
    let n: i64 = if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(i64::MAX)
    };

    (
        format!("{}{:0width$}", prefix, n.saturating_sub(1), width = width),
        format!("{}{:0width$}", prefix, n.saturating_add(1), width = width),
    )
}
