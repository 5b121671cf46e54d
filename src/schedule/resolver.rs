use chrono::{DateTime, Duration, Utc};

use crate::models::Programme;

/// First programme in schedule order airing at `now + safety_buffer`.
///
/// Both interval ends are exclusive: nothing is current exactly at a start or end instant.
pub fn current_programme(
    programmes: &[Programme],
    now: DateTime<Utc>,
    safety_buffer: Duration,
) -> Option<&Programme> {
    let at = now + safety_buffer;
    programmes
        .iter()
        .find(|programme| programme.start_date < at && at < programme.end_date)
}

/// Programmes that have not finished by `now`, in schedule order
pub fn upcoming_programmes(programmes: &[Programme], now: DateTime<Utc>) -> Vec<&Programme> {
    programmes
        .iter()
        .filter(|programme| programme.end_date > now)
        .collect()
}
