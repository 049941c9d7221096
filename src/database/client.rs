use sqlx::{
    mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow},
    Connection, Executor,
};

use crate::{
    database::{schema::Table, value::SqlValue, Credentials, DatabaseError},
    logging,
};

/// 持有單一 MariaDB 連線的寫入端，一個批次只會有一個 Client
///
/// 連線建立後關閉 autocommit，寫入需透過 [`Client::commit`] 或
/// [`Client::close`] 才會生效。
pub struct Client<'t> {
    table: &'t Table,
    conn: Option<MySqlConnection>,
}

impl<'t> Client<'t> {
    /// 建立連線並確保資料表存在
    ///
    /// # Errors
    /// 無法連線時回傳 [`DatabaseError::Connection`]，建立資料表失敗時回傳
    /// [`DatabaseError::Schema`]
    pub async fn open(table: &'t Table, credentials: &Credentials) -> Result<Self, DatabaseError> {
        let options = MySqlConnectOptions::new()
            .host(&credentials.host)
            .port(credentials.port)
            .username(&credentials.user)
            .password(&credentials.password)
            .database(&credentials.database)
            .charset("utf8mb4");
        let connection_error = |source| DatabaseError::Connection {
            host: credentials.host.clone(),
            database: credentials.database.clone(),
            source,
        };

        let mut conn = MySqlConnection::connect_with(&options)
            .await
            .map_err(connection_error)?;
        (&mut conn)
            .execute(sqlx::raw_sql("SET autocommit = 0"))
            .await
            .map_err(connection_error)?;

        if let Err(why) = (&mut conn)
            .execute(sqlx::raw_sql(table.create_statement()))
            .await
        {
            let _ = conn.close().await;
            return Err(DatabaseError::Schema {
                table: table.name().to_string(),
                reason: format!("{:?}", why),
            });
        }

        Ok(Client {
            table,
            conn: Some(conn),
        })
    }

    /// 執行任意一段 SQL，回傳影響的筆數
    pub async fn execute(
        &mut self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> Result<u64, DatabaseError> {
        let conn = self.connection()?;
        let mut query = sqlx::query(statement);
        for value in params {
            query = value.bind_to(query);
        }

        query
            .execute(conn)
            .await
            .map(|result| result.rows_affected())
            .map_err(|source| DatabaseError::Query {
                statement: statement.to_string(),
                source,
            })
    }

    /// 執行查詢並取回所有資料列
    pub async fn fetch_all(
        &mut self,
        statement: &str,
        params: Vec<SqlValue>,
    ) -> Result<Vec<MySqlRow>, DatabaseError> {
        let conn = self.connection()?;
        let mut query = sqlx::query(statement);
        for value in params {
            query = value.bind_to(query);
        }

        query
            .fetch_all(conn)
            .await
            .map_err(|source| DatabaseError::Query {
                statement: statement.to_string(),
                source,
            })
    }

    /// 以資料表的 upsert 語法寫入一列，值的順序需與欄位宣告順序相同
    ///
    /// # Errors
    /// 值的數量與欄位數不符時回傳 [`DatabaseError::Arity`]，不會送出任何語法
    pub async fn insert(&mut self, values: Vec<SqlValue>) -> Result<u64, DatabaseError> {
        check_arity(self.table, values.len())?;
        let statement = self.table.upsert_statement();
        self.execute(statement, values).await
    }

    pub async fn commit(&mut self) -> Result<(), DatabaseError> {
        let conn = self.connection()?;
        conn.execute(sqlx::raw_sql("COMMIT"))
            .await
            .map(|_| ())
            .map_err(|source| DatabaseError::Query {
                statement: "COMMIT".to_string(),
                source,
            })
    }

    /// 最後一次 commit 後關閉連線，commit 失敗時仍會關閉連線
    pub async fn close(mut self) -> Result<(), DatabaseError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        let committed = (&mut conn).execute(sqlx::raw_sql("COMMIT")).await;
        let closed = conn.close().await;

        committed.map_err(|source| DatabaseError::Query {
            statement: "COMMIT".to_string(),
            source,
        })?;
        closed.map_err(|source| DatabaseError::Query {
            statement: "QUIT".to_string(),
            source,
        })
    }

    /// 不論 `outcome` 成功與否都會關閉連線；`outcome` 的錯誤優先回傳
    pub async fn close_with<T>(self, outcome: anyhow::Result<T>) -> anyhow::Result<T> {
        let table = self.table.name().to_string();
        let closed = self.close().await;

        match outcome {
            Err(why) => {
                if let Err(close_why) = closed {
                    logging::error_file_async(format!(
                        "Failed to close client of {} because {:?}",
                        table, close_why
                    ));
                }
                Err(why)
            }
            Ok(value) => {
                closed?;
                Ok(value)
            }
        }
    }

    fn connection(&mut self) -> Result<&mut MySqlConnection, DatabaseError> {
        let table = self.table;
        self.conn
            .as_mut()
            .ok_or_else(|| DatabaseError::Closed(table.name().to_string()))
    }
}

impl Drop for Client<'_> {
    fn drop(&mut self) {
        if self.conn.is_some() {
            logging::warn_file_async(format!(
                "Client of {} dropped without close, uncommitted rows are rolled back",
                self.table.name()
            ));
        }
    }
}

/// 檢查寫入的值數量是否等於欄位數
pub(crate) fn check_arity(table: &Table, actual: usize) -> Result<(), DatabaseError> {
    if actual != table.arity() {
        return Err(DatabaseError::Arity {
            table: table.name().to_string(),
            expected: table.arity(),
            actual,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use sqlx::Row;

    use crate::{
        config,
        database::column::{Column, Signedness},
    };

    use super::*;

    fn sample_table(name: &str) -> Table {
        Table::new(
            name,
            vec![
                Column::small_int("security_id", Signedness::Unsigned).primary_key(),
                Column::date("trading_date").primary_key(),
                Column::big_int("volume", Signedness::Unsigned),
                Column::decimal("close", 10, 2).unwrap(),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_check_arity() {
        let table = sample_table("arity");
        assert!(check_arity(&table, 4).is_ok());
        match check_arity(&table, 3) {
            Err(DatabaseError::Arity {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 4);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    #[ignore]
    async fn test_upsert_keeps_one_row_with_latest_values() {
        dotenv::dotenv().ok();
        let table = sample_table("client_upsert_test");
        let credentials = Credentials::from(&config::SETTINGS.mariadb);
        let mut client = Client::open(&table, &credentials).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        client
            .execute("DELETE FROM client_upsert_test", vec![])
            .await
            .unwrap();
        client
            .insert(vec![1101.into(), date.into(), 1000u64.into(), dec!(30.5).into()])
            .await
            .unwrap();
        client
            .insert(vec![1101.into(), date.into(), 2000u64.into(), dec!(31.25).into()])
            .await
            .unwrap();
        client.commit().await.unwrap();

        let rows = client
            .fetch_all(
                "SELECT volume, close FROM client_upsert_test WHERE security_id = ?",
                vec![1101.into()],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<u64, _>("volume"), 2000);
        assert_eq!(rows[0].get::<Decimal, _>("close"), dec!(31.25));

        client
            .execute("DROP TABLE client_upsert_test", vec![])
            .await
            .unwrap();
        client.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_missing_value_is_stored_as_null() {
        dotenv::dotenv().ok();
        let table = sample_table("client_null_test");
        let credentials = Credentials::from(&config::SETTINGS.mariadb);
        let mut client = Client::open(&table, &credentials).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 5, 3).unwrap();
        let close = crate::util::text::parse_optional_decimal("--").unwrap();

        client
            .insert(vec![2330.into(), date.into(), 0u64.into(), close.into()])
            .await
            .unwrap();

        let rows = client
            .fetch_all(
                "SELECT close FROM client_null_test WHERE security_id = ?",
                vec![2330.into()],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<Option<Decimal>, _>("close"), None);

        client
            .execute("DROP TABLE client_null_test", vec![])
            .await
            .unwrap();
        client.close().await.unwrap();
    }

    #[tokio::test]
    #[ignore]
    async fn test_arity_error_does_not_touch_connection() {
        dotenv::dotenv().ok();
        let table = sample_table("client_arity_test");
        let credentials = Credentials::from(&config::SETTINGS.mariadb);
        let mut client = Client::open(&table, &credentials).await.unwrap();

        let err = client.insert(vec![1101.into()]).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Arity { .. }));

        let outcome: anyhow::Result<()> = Err(err.into());
        assert!(client.close_with(outcome).await.is_err());
    }
}
