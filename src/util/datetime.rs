use std::{fmt, str::FromStr};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Offset, Utc};
use once_cell::sync::Lazy;

/// 台北時間與 UTC 的時差(秒)，台灣沒有日光節約時間，固定為 UTC+8
const TAIPEI_OFFSET_SECONDS: i32 = 8 * 60 * 60;

static TAIPEI: Lazy<FixedOffset> = Lazy::new(|| {
    FixedOffset::east_opt(TAIPEI_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix())
});

/// 回傳 UTC+8 的固定時區
pub fn taipei() -> FixedOffset {
    *TAIPEI
}

/// 以 UTC+8 回傳目前的台北時間
pub fn now_in_taipei() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&taipei())
}

/// 解析 `YYYY/MM/DD` 或 `YYYY-MM-DD` 格式的西元日期
pub fn parse_date(date_str: &str) -> Option<NaiveDate> {
    let date_str = date_str.trim();
    NaiveDate::parse_from_str(date_str, "%Y/%m/%d")
        .or_else(|_| NaiveDate::parse_from_str(date_str, "%Y-%m-%d"))
        .ok()
}

/// 年月，追蹤交易資料是否補齊的最小時間單位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// 月份必須介於 1 ~ 12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    /// 該年的 1 月
    pub const fn january(year: i32) -> Self {
        YearMonth { year, month: 1 }
    }

    /// 取出日期所在的年月
    pub fn of<D: Datelike>(date: &D) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// 下一個月，12 月的下一個月為隔年 1 月
    pub fn next(self) -> Self {
        if self.month == 12 {
            YearMonth {
                year: self.year + 1,
                month: 1,
            }
        } else {
            YearMonth {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// 由 `self` 起依序列出到 `end`(含) 為止的每一個月
    pub fn through(self, end: YearMonth) -> impl Iterator<Item = YearMonth> {
        std::iter::successors(Some(self), |ym| Some(ym.next())).take_while(move |ym| *ym <= end)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}/{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = anyhow::Error;

    /// 接受 `2024/06` 或 `2024-06`
    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.trim().split(['/', '-']);
        let (Some(year), Some(month), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(anyhow!("'{}' is not a year/month", s));
        };

        let year = year
            .parse::<i32>()
            .map_err(|why| anyhow!("Failed to parse year of '{}' because {:?}", s, why))?;
        let month = month
            .parse::<u32>()
            .map_err(|why| anyhow!("Failed to parse month of '{}' because {:?}", s, why))?;

        YearMonth::new(year, month).ok_or_else(|| anyhow!("'{}' has an invalid month", s))
    }
}
