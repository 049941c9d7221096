use async_trait::async_trait;
use hashbrown::HashSet;

use crate::{
    database::{
        table::completion_record::{self, CompletionRecord},
        Client, DatabaseError,
    },
    util::datetime::YearMonth,
};

/// 已補齊月份的紀錄
#[async_trait]
pub trait Ledger: Send {
    /// 確保紀錄的儲存位置存在
    async fn prepare(&mut self) -> Result<(), DatabaseError>;

    /// 某檔證券已補齊的月份
    async fn closed_months(&mut self, security_id: i32) -> Result<HashSet<YearMonth>, DatabaseError>;

    /// 新增或覆蓋一筆補齊紀錄
    async fn mark_closed(&mut self, record: &CompletionRecord) -> Result<(), DatabaseError>;
}

#[async_trait]
impl Ledger for Client<'_> {
    async fn prepare(&mut self) -> Result<(), DatabaseError> {
        completion_record::create_table(self).await
    }

    async fn closed_months(&mut self, security_id: i32) -> Result<HashSet<YearMonth>, DatabaseError> {
        let months = completion_record::fetch_months(self, security_id).await?;
        Ok(months.into_iter().collect())
    }

    async fn mark_closed(&mut self, record: &CompletionRecord) -> Result<(), DatabaseError> {
        completion_record::upsert(self, record).await.map(|_| ())
    }
}
