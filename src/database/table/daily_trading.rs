use anyhow::{anyhow, Result};
use chrono::Datelike;
use once_cell::sync::OnceCell;
use rust_decimal::Decimal;

use crate::{
    database::{Client, Column, DatabaseError, Signedness, SqlValue, Table},
    util::{datetime, text},
};

pub const TABLE_NAME: &str = "stock_daily_trading_info";

/// 上游每一列的欄位數：日期、成交股數、成交金額、開、高、低、收、漲跌價差、成交筆數
pub const CELL_COUNT: usize = 9;

static TABLE: OnceCell<Table> = OnceCell::new();

pub fn table() -> Result<&'static Table, DatabaseError> {
    TABLE.get_or_try_init(|| {
        Table::new(
            TABLE_NAME,
            vec![
                Column::small_int("security_id", Signedness::Unsigned).primary_key(),
                Column::small_int("year", Signedness::Unsigned).primary_key(),
                Column::tiny_int("month", Signedness::Unsigned).primary_key(),
                Column::tiny_int("day", Signedness::Unsigned).primary_key(),
                Column::big_int("volume", Signedness::Unsigned),
                Column::big_int("value", Signedness::Unsigned),
                Column::decimal("open", 10, 2)?,
                Column::decimal("high", 10, 2)?,
                Column::decimal("low", 10, 2)?,
                Column::decimal("close", 10, 2)?,
                Column::var_char("delta", 10)?,
                Column::integer("transaction_count", Signedness::Unsigned),
            ],
        )
    })
}

/// 個股單一交易日的成交資訊，上游為 `--` 的欄位為 `None`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTrading {
    pub security_id: i32,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// 成交股數
    pub volume: Option<u64>,
    /// 成交金額
    pub value: Option<u64>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    /// 漲跌價差，除權息日會是 `X0.00` 這類非數字內容
    pub delta: Option<String>,
    /// 成交筆數
    pub transaction_count: Option<u64>,
}

impl DailyTrading {
    /// 由上游 `data` 陣列中的一列轉換
    pub fn from_cells(security_id: i32, cells: &[String]) -> Result<Self> {
        if cells.len() != CELL_COUNT {
            return Err(anyhow!(
                "expected {} cells but got {}: {:?}",
                CELL_COUNT,
                cells.len(),
                cells
            ));
        }

        let date = datetime::parse_date(cells[0].trim())
            .ok_or_else(|| anyhow!("Failed to parse trading date from '{}'", cells[0]))?;

        Ok(DailyTrading {
            security_id,
            year: date.year(),
            month: date.month(),
            day: date.day(),
            volume: text::parse_optional_u64(&cells[1])?,
            value: text::parse_optional_u64(&cells[2])?,
            open: text::parse_optional_decimal(&cells[3])?,
            high: text::parse_optional_decimal(&cells[4])?,
            low: text::parse_optional_decimal(&cells[5])?,
            close: text::parse_optional_decimal(&cells[6])?,
            delta: text::optional_text(&cells[7]),
            transaction_count: text::parse_optional_u64(&cells[8])?,
        })
    }

    pub fn values(&self) -> Vec<SqlValue> {
        vec![
            self.security_id.into(),
            self.year.into(),
            self.month.into(),
            self.day.into(),
            self.volume.into(),
            self.value.into(),
            self.open.into(),
            self.high.into(),
            self.low.into(),
            self.close.into(),
            self.delta.clone().into(),
            self.transaction_count.into(),
        ]
    }

    pub async fn upsert(&self, client: &mut Client<'_>) -> Result<u64, DatabaseError> {
        client.insert(self.values()).await
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn cells(raw: [&str; CELL_COUNT]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_from_cells() {
        let row = DailyTrading::from_cells(
            1101,
            &cells([
                "2024/06/03",
                "21,000,368",
                "700,351,519",
                "33.20",
                "33.60",
                "33.05",
                "33.45",
                "+0.35",
                "8,514",
            ]),
        )
        .unwrap();

        assert_eq!((row.year, row.month, row.day), (2024, 6, 3));
        assert_eq!(row.volume, Some(21_000_368));
        assert_eq!(row.value, Some(700_351_519));
        assert_eq!(row.close, Some(dec!(33.45)));
        assert_eq!(row.delta.as_deref(), Some("+0.35"));
        assert_eq!(row.transaction_count, Some(8514));
    }

    #[test]
    fn test_missing_cells_become_null() {
        let row = DailyTrading::from_cells(
            2330,
            &cells([
                "2024/06/04",
                "0",
                "0",
                "--",
                "--",
                "--",
                "--",
                "X0.00",
                "0",
            ]),
        )
        .unwrap();

        assert_eq!(row.open, None);
        assert_eq!(row.close, None);
        assert_eq!(row.delta.as_deref(), Some("X0.00"));

        let values = row.values();
        assert_eq!(values.len(), table().unwrap().arity());
        assert!(values[6].is_null());
        assert!(values[9].is_null());
    }

    #[test]
    fn test_from_cells_rejects_short_row() {
        assert!(DailyTrading::from_cells(1101, &["2024/06/03".to_string()]).is_err());
        assert!(DailyTrading::from_cells(
            1101,
            &cells(["2024-13-40", "1", "1", "1", "1", "1", "1", "1", "1"])
        )
        .is_err());
    }

    #[test]
    fn test_table_layout() {
        let table = table().unwrap();
        assert_eq!(
            table.primary_keys(),
            vec!["security_id", "year", "month", "day"]
        );
        assert!(table
            .create_statement()
            .contains("close DECIMAL(10,2), delta VARCHAR(10) CHARACTER SET utf8"));
    }
}
