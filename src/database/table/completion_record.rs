use chrono::NaiveDateTime;
use once_cell::sync::OnceCell;
use sqlx::Row;

use crate::{
    database::{Client, Column, DatabaseError, Signedness, SqlValue, Table},
    logging,
    util::datetime::YearMonth,
};

pub const TABLE_NAME: &str = "stock_daily_trading_record";

const SELECT_MONTHS: &str = r#"
SELECT
    year,
    month
FROM
    stock_daily_trading_record
WHERE
    security_id = ?
ORDER BY
    year, month
"#;

static TABLE: OnceCell<Table> = OnceCell::new();

pub fn table() -> Result<&'static Table, DatabaseError> {
    TABLE.get_or_try_init(|| {
        Table::new(
            TABLE_NAME,
            vec![
                Column::small_int("security_id", Signedness::Unsigned).primary_key(),
                Column::small_int("year", Signedness::Unsigned).primary_key(),
                Column::tiny_int("month", Signedness::Unsigned).primary_key(),
                Column::date_time("last_updated"),
            ],
        )
    })
}

/// 某檔證券某個月份的成交資訊已完整寫入的紀錄
///
/// 只有早於當下台北月份的月份會留下紀錄，當月資料每次都會重新抓取。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRecord {
    pub security_id: i32,
    pub year: i32,
    pub month: u32,
    /// 寫入當下的台北時間
    pub last_updated: NaiveDateTime,
}

impl CompletionRecord {
    pub fn new(security_id: i32, month: YearMonth, last_updated: NaiveDateTime) -> Self {
        CompletionRecord {
            security_id,
            year: month.year(),
            month: month.month(),
            last_updated,
        }
    }

    pub fn year_month(&self) -> Option<YearMonth> {
        YearMonth::new(self.year, self.month)
    }

    pub fn values(&self) -> Vec<SqlValue> {
        vec![
            self.security_id.into(),
            self.year.into(),
            self.month.into(),
            self.last_updated.into(),
        ]
    }
}

/// 在資料表所屬的 Client 之外建立紀錄表，語法與 [`Client::open`] 相同
pub async fn create_table(client: &mut Client<'_>) -> Result<(), DatabaseError> {
    let table = table()?;
    client
        .execute(table.create_statement(), Vec::new())
        .await
        .map(|_| ())
        .map_err(|why| DatabaseError::Schema {
            table: table.name().to_string(),
            reason: why.to_string(),
        })
}

/// 以 (security_id, year, month) 為鍵寫入或覆蓋紀錄
pub async fn upsert(
    client: &mut Client<'_>,
    record: &CompletionRecord,
) -> Result<u64, DatabaseError> {
    let table = table()?;
    let values = record.values();
    crate::database::client::check_arity(table, values.len())?;
    client.execute(table.upsert_statement(), values).await
}

/// 取出某檔證券所有已完成的月份
pub async fn fetch_months(
    client: &mut Client<'_>,
    security_id: i32,
) -> Result<Vec<YearMonth>, DatabaseError> {
    let rows = client
        .fetch_all(SELECT_MONTHS, vec![security_id.into()])
        .await?;

    let mut months = Vec::with_capacity(rows.len());
    for row in rows {
        let decoded = row
            .try_get::<u16, _>("year")
            .and_then(|year| row.try_get::<u8, _>("month").map(|month| (year, month)));
        let (year, month) = decoded.map_err(|source| DatabaseError::Query {
            statement: SELECT_MONTHS.to_string(),
            source,
        })?;

        match YearMonth::new(year.into(), month.into()) {
            Some(ym) => months.push(ym),
            None => logging::warn_file_async(format!(
                "Ignore invalid completion record {} {}/{}",
                security_id, year, month
            )),
        }
    }

    Ok(months)
}
