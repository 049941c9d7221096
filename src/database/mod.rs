use std::fmt;

use crate::config;

pub mod client;
pub mod column;
pub mod schema;
pub mod table;
pub mod value;

pub use client::Client;
pub use column::{Column, ColumnKind, Signedness};
pub use schema::Table;
pub use value::SqlValue;

/// 資料庫相關的錯誤分類
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// 欄位屬性無效或缺少該型別必要的設定
    #[error("invalid column configuration: {0}")]
    Configuration(String),
    /// 欄位集合不合法，或建立資料表失敗
    #[error("invalid schema for table {table}: {reason}")]
    Schema { table: String, reason: String },
    /// 寫入的值數量與資料表欄位數不符
    #[error("table {table} expects {expected} values but received {actual}")]
    Arity {
        table: String,
        expected: usize,
        actual: usize,
    },
    /// 無法連線或帳密被拒
    #[error("failed to connect to {host}/{database}: {source}")]
    Connection {
        host: String,
        database: String,
        #[source]
        source: sqlx::Error,
    },
    #[error("client of table {0} is already closed")]
    Closed(String),
    #[error("failed to execute `{statement}`: {source}")]
    Query {
        statement: String,
        #[source]
        source: sqlx::Error,
    },
}

/// 連線 MariaDB 所需的帳密，只會以連線參數的方式送出
#[derive(Clone, Default)]
pub struct Credentials {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl From<&config::MariaDB> for Credentials {
    fn from(mariadb: &config::MariaDB) -> Self {
        Credentials {
            host: mariadb.host.clone(),
            port: mariadb.port,
            user: mariadb.user.clone(),
            password: mariadb.password.clone(),
            database: mariadb.database.clone(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}
