use std::str::FromStr;

use strum::{Display, EnumString};

use crate::database::DatabaseError;

/// MariaDB DECIMAL 可接受的最大位數
const MAX_DECIMAL_PRECISION: u32 = 65;

/// 數值型別的屬性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Signedness {
    #[strum(to_string = "SIGNED")]
    Signed,
    #[strum(to_string = "UNSIGNED")]
    Unsigned,
    #[strum(to_string = "ZEROFILL")]
    ZeroFilled,
}

impl Signedness {
    /// 解析 `SIGNED`、`UNSIGNED`、`ZEROFILL`，其他值視為設定錯誤
    pub fn parse(attribute: &str) -> Result<Self, DatabaseError> {
        Signedness::from_str(attribute.trim()).map_err(|_| {
            DatabaseError::Configuration(format!(
                "'{}' is not one of SIGNED, UNSIGNED or ZEROFILL",
                attribute
            ))
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    VarChar(u32),
    TinyInt(Signedness),
    SmallInt(Signedness),
    Integer(Signedness),
    BigInt(Signedness),
    Decimal { precision: u32, scale: u32 },
    Date,
    DateTime,
}

impl ColumnKind {
    /// 由 SQL 型別名稱與屬性建立整數型別
    fn integer(sql_type: &str, signedness: Signedness) -> Result<Self, DatabaseError> {
        match sql_type.trim().to_ascii_uppercase().as_str() {
            "TINYINT" => Ok(ColumnKind::TinyInt(signedness)),
            "SMALLINT" => Ok(ColumnKind::SmallInt(signedness)),
            "INT" | "INTEGER" => Ok(ColumnKind::Integer(signedness)),
            "BIGINT" => Ok(ColumnKind::BigInt(signedness)),
            other => Err(DatabaseError::Configuration(format!(
                "'{}' is not an integer type",
                other
            ))),
        }
    }

    fn fragment(&self) -> String {
        match self {
            ColumnKind::Text => "TEXT".to_string(),
            ColumnKind::VarChar(length) => format!("VARCHAR({}) CHARACTER SET utf8", length),
            ColumnKind::TinyInt(signedness) => format!("TINYINT {}", signedness),
            ColumnKind::SmallInt(signedness) => format!("SMALLINT {}", signedness),
            ColumnKind::Integer(signedness) => format!("INT {}", signedness),
            ColumnKind::BigInt(signedness) => format!("BIGINT {}", signedness),
            ColumnKind::Decimal { precision, scale } => format!("DECIMAL({},{})", precision, scale),
            ColumnKind::Date => "DATE".to_string(),
            ColumnKind::DateTime => "DATETIME".to_string(),
        }
    }
}

/// 資料表的一個欄位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    kind: ColumnKind,
    primary_key: bool,
}

impl Column {
    fn new<S: Into<String>>(name: S, kind: ColumnKind) -> Self {
        Column {
            name: name.into(),
            kind,
            primary_key: false,
        }
    }

    pub fn text<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnKind::Text)
    }

    /// 長度必須大於 0
    pub fn var_char<S: Into<String>>(name: S, length: u32) -> Result<Self, DatabaseError> {
        let name = name.into();
        if length == 0 {
            return Err(DatabaseError::Configuration(format!(
                "VARCHAR column {} requires a positive length",
                name
            )));
        }

        Ok(Self::new(name, ColumnKind::VarChar(length)))
    }

    pub fn tiny_int<S: Into<String>>(name: S, signedness: Signedness) -> Self {
        Self::new(name, ColumnKind::TinyInt(signedness))
    }

    pub fn small_int<S: Into<String>>(name: S, signedness: Signedness) -> Self {
        Self::new(name, ColumnKind::SmallInt(signedness))
    }

    pub fn integer<S: Into<String>>(name: S, signedness: Signedness) -> Self {
        Self::new(name, ColumnKind::Integer(signedness))
    }

    pub fn big_int<S: Into<String>>(name: S, signedness: Signedness) -> Self {
        Self::new(name, ColumnKind::BigInt(signedness))
    }

    /// 整數欄位的宣告式寫法，例如 `Column::numeric("volume", "BIGINT", "UNSIGNED")`
    pub fn numeric<S: Into<String>>(
        name: S,
        sql_type: &str,
        attribute: &str,
    ) -> Result<Self, DatabaseError> {
        let signedness = Signedness::parse(attribute)?;
        Ok(Self::new(name, ColumnKind::integer(sql_type, signedness)?))
    }

    /// precision 介於 1 ~ 65，scale 不得大於 precision
    pub fn decimal<S: Into<String>>(
        name: S,
        precision: u32,
        scale: u32,
    ) -> Result<Self, DatabaseError> {
        let name = name.into();
        if precision == 0 || precision > MAX_DECIMAL_PRECISION || scale > precision {
            return Err(DatabaseError::Configuration(format!(
                "DECIMAL({},{}) of column {} is out of range",
                precision, scale, name
            )));
        }

        Ok(Self::new(name, ColumnKind::Decimal { precision, scale }))
    }

    pub fn date<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnKind::Date)
    }

    pub fn date_time<S: Into<String>>(name: S) -> Self {
        Self::new(name, ColumnKind::DateTime)
    }

    /// 將欄位標記為主鍵的一部分
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// 欄位在 CREATE TABLE 中的定義，例如 `volume BIGINT UNSIGNED`
    pub fn definition(&self) -> String {
        format!("{} {}", self.name, self.kind.fragment())
    }
}
