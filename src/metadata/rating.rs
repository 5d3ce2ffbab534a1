//! Star rating conversion between the canonical 0-5 scale and each tag
//! format's native encoding.
//!
//! The tables follow vendor tooling rather than a linear formula: the ID3
//! POPM byte values are the ones Windows Explorer maps to stars, and the ASF
//! values are what Windows Media Player writes to `WM/SharedUserRating`.
//! Any canonical value outside 0-5 maps to the format's 0 entry.

const POPM_TABLE: [u8; 6] = [0, 1, 64, 128, 196, 255];
const MP4_TABLE: [u8; 6] = [0, 20, 40, 60, 80, 100];
const ASF_TABLE: [u32; 6] = [0, 1, 25, 50, 75, 99];

/// Table index for a canonical rating, 0 when out of range.
fn slot(rating: i64) -> usize {
    usize::try_from(rating)
        .ok()
        .filter(|index| *index < POPM_TABLE.len())
        .unwrap_or(0)
}

/// POPM byte for a canonical rating.
pub fn popm_byte(rating: i64) -> u8 {
    POPM_TABLE[slot(rating)]
}

/// MP4 `rate` value for a canonical rating.
pub fn mp4_rate(rating: i64) -> u8 {
    MP4_TABLE[slot(rating)]
}

/// `WM/SharedUserRating` value for a canonical rating.
pub fn asf_shared_user_rating(rating: i64) -> u32 {
    ASF_TABLE[slot(rating)]
}

/// Vorbis `rating` comment text for a canonical rating.
pub fn vorbis_rating(rating: i64) -> String {
    slot(rating).to_string()
}
