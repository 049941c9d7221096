use chrono::NaiveDate;
use once_cell::sync::OnceCell;
use sqlx::Row;

use crate::{
    database::{Client, Column, DatabaseError, SqlValue, Table},
    logging,
    tracker::Security,
};

pub const TABLE_NAME: &str = "stock_info";

/// 上市資訊中普通股的分類名稱，只有這個分類會排入回補
pub const EQUITY_CLASSIFICATION: &str = "股票";

static TABLE: OnceCell<Table> = OnceCell::new();

/// `stock_info` 的資料表結構，以 ISIN 為主鍵
pub fn table() -> Result<&'static Table, DatabaseError> {
    TABLE.get_or_try_init(|| {
        Table::new(
            TABLE_NAME,
            vec![
                Column::var_char("classification", 50)?,
                Column::var_char("symbol", 25)?,
                Column::var_char("name", 50)?,
                Column::var_char("isin_code", 25)?.primary_key(),
                Column::date("listing_date"),
                Column::var_char("market_category", 50)?,
                Column::var_char("industry_category", 50)?,
                Column::var_char("cfi_code", 25)?,
                Column::var_char("remark", 25)?,
            ],
        )
    })
}

/// 國際證券辨識號碼一覽表中的一列
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockInfo {
    /// 有價證券別，例如 股票、ETF、特別股
    pub classification: String,
    pub symbol: String,
    pub name: String,
    pub isin_code: String,
    pub listing_date: NaiveDate,
    /// 市場別，例如 上市
    pub market_category: String,
    pub industry_category: Option<String>,
    pub cfi_code: String,
    pub remark: Option<String>,
}

impl StockInfo {
    /// 依欄位宣告順序排列的值
    pub fn values(&self) -> Vec<SqlValue> {
        vec![
            self.classification.as_str().into(),
            self.symbol.as_str().into(),
            self.name.as_str().into(),
            self.isin_code.as_str().into(),
            self.listing_date.into(),
            self.market_category.as_str().into(),
            self.industry_category.clone().into(),
            self.cfi_code.as_str().into(),
            self.remark.clone().into(),
        ]
    }

    /// 以 ISIN 為鍵寫入或更新
    pub async fn upsert(&self, client: &mut Client<'_>) -> Result<u64, DatabaseError> {
        client.insert(self.values()).await
    }
}

/// 取出指定分類的有價證券，代號不是數字的(例如部分特別股)會略過
pub async fn fetch_securities(
    client: &mut Client<'_>,
    classification: &str,
) -> Result<Vec<Security>, DatabaseError> {
    let rows = client
        .fetch_all(
            r#"
SELECT
    symbol,
    listing_date,
    classification
FROM
    stock_info
WHERE
    classification = ?
"#,
            vec![classification.into()],
        )
        .await?;

    let mut securities = Vec::with_capacity(rows.len());
    for row in rows {
        let symbol: String = row.try_get("symbol").map_err(|source| DatabaseError::Query {
            statement: "SELECT symbol FROM stock_info".to_string(),
            source,
        })?;
        let listing_date: NaiveDate =
            row.try_get("listing_date")
                .map_err(|source| DatabaseError::Query {
                    statement: "SELECT listing_date FROM stock_info".to_string(),
                    source,
                })?;
        let classification: String =
            row.try_get("classification")
                .map_err(|source| DatabaseError::Query {
                    statement: "SELECT classification FROM stock_info".to_string(),
                    source,
                })?;

        match symbol.trim().parse::<i32>() {
            Ok(id) => securities.push(Security::new(id, listing_date, classification)),
            Err(_) => logging::warn_file_async(format!(
                "Skip security {} because the symbol is not numeric",
                symbol
            )),
        }
    }

    Ok(securities)
}
