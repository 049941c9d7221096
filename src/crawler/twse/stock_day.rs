use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    database::table::daily_trading::DailyTrading,
    tracker::Unit,
    util::{self, datetime::YearMonth},
};

const STAT_OK: &str = "OK";

/// 標題中的空白分隔，第一段是年月，最後一段是證券代號
static TITLE_SEPARATOR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Failed to compile title regex"));

#[derive(Deserialize, Debug)]
struct StockDayResponse {
    stat: Option<String>,
    title: Option<String>,
    data: Option<Vec<Vec<String>>>,
}

/// 回應內容與請求的月份或證券不符，該月份維持未補齊
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Mismatch {
    #[error("response body is not the expected json: {0}")]
    Body(String),
    #[error("stat is {0:?}")]
    Status(String),
    #[error("title {0:?} does not name a month and a security")]
    Title(String),
    #[error("requested {requested} but the response is for {actual}")]
    Month { requested: YearMonth, actual: String },
    #[error("requested security {requested} but the response is for {actual}")]
    Security { requested: i32, actual: i32 },
    #[error("row {row:?} is malformed: {reason}")]
    Row { row: Vec<String>, reason: String },
    /// 狀態為 OK 卻沒有任何交易日，不能視為已補齊
    #[error("{0} has no trading days")]
    Empty(YearMonth),
}

/// `STOCK_DAY` 以該月 1 日查詢整個月份
pub fn url(base: &str, unit: &Unit) -> String {
    format!(
        "{}?date={:04}{:02}01&stockNo={}&response=json",
        base,
        unit.month.year(),
        unit.month.month(),
        unit.security_id
    )
}

/// 下載某檔證券某個月份的每日成交資訊
pub async fn visit(base: &str, unit: &Unit) -> Result<Vec<DailyTrading>> {
    let body = util::http::get(&url(base, unit)).await?;
    Ok(parse(unit, &body)?)
}

/// 驗證回應的狀態、月份與證券代號後轉換每一列
pub fn parse(unit: &Unit, body: &str) -> Result<Vec<DailyTrading>, Mismatch> {
    let response: StockDayResponse =
        serde_json::from_str(body).map_err(|why| Mismatch::Body(why.to_string()))?;

    let stat = response.stat.unwrap_or_default();
    if stat != STAT_OK {
        return Err(Mismatch::Status(stat));
    }

    // 例如 `2024/06  Daily Trading Value/Volume of 1101 `
    let title = response.title.unwrap_or_default();
    let tokens: Vec<&str> = TITLE_SEPARATOR
        .split(title.trim())
        .filter(|token| !token.is_empty())
        .collect();
    let (Some(month), Some(symbol)) = (tokens.first(), tokens.last()) else {
        return Err(Mismatch::Title(title));
    };

    if *month != unit.month.to_string() {
        return Err(Mismatch::Month {
            requested: unit.month,
            actual: month.to_string(),
        });
    }

    let security_id = symbol
        .parse::<i32>()
        .map_err(|_| Mismatch::Title(title.clone()))?;
    if security_id != unit.security_id {
        return Err(Mismatch::Security {
            requested: unit.security_id,
            actual: security_id,
        });
    }

    let rows = response.data.unwrap_or_default();
    if rows.is_empty() {
        return Err(Mismatch::Empty(unit.month));
    }

    let mut trades = Vec::with_capacity(rows.len());
    for row in rows {
        let trading = DailyTrading::from_cells(unit.security_id, &row).map_err(|why| {
            Mismatch::Row {
                row: row.clone(),
                reason: why.to_string(),
            }
        })?;

        if YearMonth::new(trading.year, trading.month) != Some(unit.month) {
            return Err(Mismatch::Row {
                row,
                reason: format!("trading date is not in {}", unit.month),
            });
        }

        trades.push(trading);
    }

    Ok(trades)
}
