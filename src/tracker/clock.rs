use chrono::{DateTime, FixedOffset};

use crate::util::datetime;

/// 目前時間的來源
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;
}

/// 以固定 UTC+8 回傳目前時間
#[derive(Debug, Default, Clone, Copy)]
pub struct TaipeiClock;

impl Clock for TaipeiClock {
    fn now(&self) -> DateTime<FixedOffset> {
        datetime::now_in_taipei()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::{Datelike, TimeZone};

    use super::*;

    /// 固定在某個台北時間的時鐘
    pub(crate) struct FixedClock(DateTime<FixedOffset>);

    impl FixedClock {
        pub(crate) fn at(year: i32, month: u32, day: u32) -> Self {
            let now = datetime::taipei()
                .with_ymd_and_hms(year, month, day, 9, 30, 0)
                .single()
                .unwrap();
            FixedClock(now)
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<FixedOffset> {
            self.0
        }
    }

    #[test]
    fn test_taipei_clock_offset() {
        let now = TaipeiClock.now();
        assert_eq!(now.offset().local_minus_utc(), 8 * 60 * 60);
        assert!(now.year() >= 2024);
    }
}
