use chrono::{DateTime, FixedOffset, Utc};

/// Offset of the reference timezone (America/Mexico_City) in seconds.
/// Mexico abolished daylight saving in 2022, so UTC-6 holds year-round.
pub const REFERENCE_OFFSET_SECS: i32 = -6 * 3600;

pub fn reference_offset() -> FixedOffset {
    FixedOffset::east_opt(REFERENCE_OFFSET_SECS).expect("UTC-6 is a valid fixed offset")
}

/// Source of "now" for everything user-visible: turn-context timestamps and
/// folio date buckets. Injected so both stay deterministic under test.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    fn now_local(&self) -> DateTime<FixedOffset> {
        self.now_utc().with_timezone(&reference_offset())
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a single instant.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.0
    }
}
