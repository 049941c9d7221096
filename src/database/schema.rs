use hashbrown::HashSet;

use crate::database::{column::Column, DatabaseError};

/// 資料表結構，建立時一次產生 CREATE TABLE 與 upsert 語法，之後不可變更
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    create_statement: String,
    upsert_statement: String,
}

impl Table {
    /// # Errors
    /// 欄位為空、欄位名稱空白或重複時回傳 [`DatabaseError::Schema`]
    pub fn new<S: Into<String>>(name: S, columns: Vec<Column>) -> Result<Self, DatabaseError> {
        let name = name.into();
        let schema_error = |reason: String| DatabaseError::Schema {
            table: name.clone(),
            reason,
        };

        if columns.is_empty() {
            return Err(schema_error(
                "at least one column is required".to_string(),
            ));
        }

        {
            let mut seen = HashSet::with_capacity(columns.len());
            for column in &columns {
                if column.name().trim().is_empty() {
                    return Err(schema_error("column name must not be blank".to_string()));
                }

                if !seen.insert(column.name()) {
                    return Err(schema_error(format!(
                        "duplicate column name {}",
                        column.name()
                    )));
                }
            }
        }

        let create_statement = build_create_statement(&name, &columns);
        let upsert_statement = build_upsert_statement(&name, &columns);

        Ok(Table {
            name,
            columns,
            create_statement,
            upsert_statement,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 主鍵欄位名稱，依宣告順序
    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.is_primary_key())
            .map(Column::name)
            .collect()
    }

    /// 欄位數量，寫入時用來檢查參數個數
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    pub fn create_statement(&self) -> &str {
        &self.create_statement
    }

    pub fn upsert_statement(&self) -> &str {
        &self.upsert_statement
    }
}

fn build_create_statement(name: &str, columns: &[Column]) -> String {
    let mut definitions: Vec<String> = columns.iter().map(Column::definition).collect();
    let primary_keys: Vec<&str> = columns
        .iter()
        .filter(|c| c.is_primary_key())
        .map(Column::name)
        .collect();

    if !primary_keys.is_empty() {
        definitions.push(format!("PRIMARY KEY ({})", primary_keys.join(", ")));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        name,
        definitions.join(", ")
    )
}

/// 有主鍵時附加 ON DUPLICATE KEY UPDATE，鍵值相同時整列改寫為新值
///
/// 更新清單列出所有欄位而不只主鍵欄位。只更新主鍵時 MariaDB 會保留舊的非鍵值，
/// 重複寫入同一列就無法得到第二次的內容。
fn build_upsert_statement(name: &str, columns: &[Column]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    let mut statement = format!("INSERT INTO {} VALUES ({})", name, placeholders);

    if columns.iter().any(Column::is_primary_key) {
        let assignments: Vec<String> = columns
            .iter()
            .map(|c| format!("{0} = VALUES({0})", c.name()))
            .collect();
        statement.push_str(" ON DUPLICATE KEY UPDATE ");
        statement.push_str(&assignments.join(", "));
    }

    statement
}
