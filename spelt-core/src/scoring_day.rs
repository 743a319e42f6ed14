use anyhow::{Result, anyhow};
use chrono::{DateTime, FixedOffset, NaiveTime, Offset, TimeDelta, Utc};

/// Leaderboard day shared by every player: it starts at midnight in one fixed
/// reference offset, whatever the viewer's own time zone is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringDay {
    offset: FixedOffset,
}

impl ScoringDay {
    /// Midnight PST (UTC-08:00)
    pub const DEFAULT_UTC_OFFSET_MINUTES: i32 = -8 * 60;

    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn from_utc_offset_minutes(minutes: i32) -> Result<Self> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| anyhow!("UTC offset out of range: {} minutes", minutes))?;
        Ok(Self::new(offset))
    }

    pub fn utc() -> Self {
        Self::new(Utc.fix())
    }

    /// Instant at which the scoring day containing `now` began
    pub fn boundary(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_midnight = now
            .with_timezone(&self.offset)
            .date_naive()
            .and_time(NaiveTime::MIN);
        let offset = TimeDelta::seconds(i64::from(self.offset.local_minus_utc()));

        (local_midnight - offset).and_utc()
    }

    /// Submitted strictly after the current day's boundary
    pub fn is_current(&self, submitted_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        submitted_at > self.boundary(now)
    }
}

impl Default for ScoringDay {
    fn default() -> Self {
        Self::new(
            FixedOffset::east_opt(Self::DEFAULT_UTC_OFFSET_MINUTES * 60)
                .unwrap_or_else(|| Utc.fix()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_boundary_in_utc() {
        let day = ScoringDay::utc();
        assert_eq!(day.boundary(utc(2026, 10, 17, 15, 30)), utc(2026, 10, 17, 0, 0));
        assert_eq!(day.boundary(utc(2026, 10, 17, 0, 0)), utc(2026, 10, 17, 0, 0));
    }

    #[test]
    fn test_boundary_west_of_utc() {
        let day = ScoringDay::default(); // UTC-08:00

        // 15:30 UTC is 07:30 local, so the day began at 08:00 UTC
        assert_eq!(day.boundary(utc(2026, 10, 17, 15, 30)), utc(2026, 10, 17, 8, 0));

        // 03:00 UTC is still the previous local day (19:00)
        assert_eq!(day.boundary(utc(2026, 10, 17, 3, 0)), utc(2026, 10, 16, 8, 0));
    }

    #[test]
    fn test_boundary_east_of_utc() {
        let day = ScoringDay::from_utc_offset_minutes(5 * 60 + 30).unwrap(); // UTC+05:30

        // 20:00 UTC is 01:30 local next day
        assert_eq!(day.boundary(utc(2026, 10, 17, 20, 0)), utc(2026, 10, 17, 18, 30));
        // 10:00 UTC is 15:30 local same day
        assert_eq!(day.boundary(utc(2026, 10, 17, 10, 0)), utc(2026, 10, 16, 18, 30));
    }

    #[test]
    fn test_boundary_ignores_viewer_zone() {
        // The same instant yields the same boundary however it was produced
        let day = ScoringDay::default();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let instant = tokyo.with_ymd_and_hms(2026, 10, 18, 1, 0, 0).unwrap();

        assert_eq!(
            day.boundary(instant.with_timezone(&Utc)),
            day.boundary(utc(2026, 10, 17, 16, 0))
        );
    }

    #[test]
    fn test_current_excludes_boundary() {
        let day = ScoringDay::utc();
        let now = utc(2026, 10, 17, 12, 0);
        let boundary = day.boundary(now);

        assert!(!day.is_current(boundary, now));
        assert!(day.is_current(boundary + TimeDelta::seconds(1), now));
        assert!(!day.is_current(utc(2026, 10, 16, 23, 59), now));
    }

    #[test]
    fn test_offset_out_of_range() {
        assert!(ScoringDay::from_utc_offset_minutes(24 * 60).is_err());
        assert!(ScoringDay::from_utc_offset_minutes(-24 * 60).is_err());
        assert!(ScoringDay::from_utc_offset_minutes(14 * 60).is_ok());
    }

    #[test]
    fn test_offset_too_large_to_convert() {
        assert!(ScoringDay::from_utc_offset_minutes(i32::MAX / 2).is_err());
        assert!(ScoringDay::from_utc_offset_minutes(i32::MIN).is_err());
        assert!(ScoringDay::from_utc_offset_minutes(40_000_000).is_err());
    }
}
