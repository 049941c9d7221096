//! 追蹤每檔證券每個月份的成交資訊是否已補齊，並算出本次需要抓取的月份。
//!
//! 一個月份只會由「未抓取」前進到「已抓取但當月未結束」或「已補齊」，
//! 已補齊的月份會寫入 `stock_daily_trading_record`，之後不會再抓取。

use std::fmt;

use chrono::NaiveDate;

use crate::{
    database::{table::completion_record::CompletionRecord, DatabaseError},
    util::datetime::YearMonth,
};

pub mod clock;
pub mod ledger;
pub mod planner;

pub use clock::{Clock, TaipeiClock};
pub use ledger::Ledger;
pub use planner::plan;

/// 排入回補的有價證券
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Security {
    /// 數字代號，例如 1101
    pub id: i32,
    pub listing_date: NaiveDate,
    pub classification: String,
}

impl Security {
    pub fn new<S: Into<String>>(id: i32, listing_date: NaiveDate, classification: S) -> Self {
        Security {
            id,
            listing_date,
            classification: classification.into(),
        }
    }
}

/// 一次抓取的單位：某檔證券的某個月份
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Unit {
    pub security_id: i32,
    pub month: YearMonth,
}

impl Unit {
    pub fn new(security_id: i32, month: YearMonth) -> Self {
        Unit { security_id, month }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.security_id, self.month)
    }
}

/// 寫入一個月份後的結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    /// 已結束的月份，留下紀錄
    Closed(CompletionRecord),
    /// 當月仍在進行，下次執行會再抓取
    Open,
}

/// 某個月份的資料寫入後呼叫，早於當下台北月份的月份才會標記為補齊
pub async fn settle<L, C>(ledger: &mut L, clock: &C, unit: Unit) -> Result<Settlement, DatabaseError>
where
    L: Ledger,
    C: Clock,
{
    let now = clock.now();
    if unit.month >= YearMonth::of(&now) {
        return Ok(Settlement::Open);
    }

    let record = CompletionRecord::new(unit.security_id, unit.month, now.naive_local());
    ledger.mark_closed(&record).await?;

    Ok(Settlement::Closed(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{clock::tests::FixedClock, ledger::tests::MemoryLedger};

    #[tokio::test]
    async fn test_past_month_is_closed() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();
        let may = YearMonth::new(2024, 5).unwrap();

        let settlement = settle(&mut ledger, &clock, Unit::new(1101, may))
            .await
            .unwrap();

        match settlement {
            Settlement::Closed(record) => {
                assert_eq!((record.security_id, record.year, record.month), (1101, 2024, 5));
                assert_eq!(record.last_updated, clock.now().naive_local());
            }
            Settlement::Open => panic!("May should be closed in June"),
        }
        assert!(ledger.is_closed(1101, may));
    }

    #[tokio::test]
    async fn test_current_month_stays_open() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();
        let june = YearMonth::new(2024, 6).unwrap();

        let settlement = settle(&mut ledger, &clock, Unit::new(1101, june))
            .await
            .unwrap();

        assert_eq!(settlement, Settlement::Open);
        assert!(!ledger.is_closed(1101, june));
    }
}
