use std::str::FromStr;

use anyhow::{anyhow, Result};
use rust_decimal::Decimal;

/// 數值欄位中需要移除的字元(千分位、空白等)
const NUMBER_ESCAPE_CHAR: &[char] = &[',', ' ', '"', '\n', '\u{3000}'];

/// 上游以 `--` 表示該欄位無資料
pub const MISSING_VALUE: &str = "--";

/// Converts Big5 encoded bytes to a UTF-8 `String`.
///
/// Malformed sequences are replaced rather than rejected, the ISIN page of
/// TWSE contains a few characters outside of Big5 proper.
pub fn big5_to_utf8(data: &[u8]) -> String {
    let (text, _, had_errors) = encoding_rs::BIG5.decode(data);
    if had_errors {
        crate::logging::warn_file_async("Big5 content contains malformed sequences");
    }

    text.into_owned()
}

/// 上游的欄位是否為 `--` 或空白
pub fn is_missing(s: &str) -> bool {
    let trimmed = s.trim();
    trimmed.is_empty() || trimmed == MISSING_VALUE
}

/// 移除字串中的千分位與其他跳脫字元
pub fn clean_escape_chars(s: &str) -> String {
    s.chars().filter(|c| !NUMBER_ESCAPE_CHAR.contains(c)).collect()
}

/// Parses a digit-grouped decimal like `1,234.56`.
pub fn parse_decimal(s: &str) -> Result<Decimal> {
    let cleaned = clean_escape_chars(s);
    Decimal::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as Decimal because {:?}", cleaned, why))
}

/// Parses a digit-grouped unsigned integer like `1,000,000`.
pub fn parse_u64(s: &str) -> Result<u64> {
    let cleaned = clean_escape_chars(s);
    u64::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as u64 because: {:?}", cleaned, why))
}

/// `--` 轉為 `None`，其餘依 [`parse_decimal`] 解析
pub fn parse_optional_decimal(s: &str) -> Result<Option<Decimal>> {
    if is_missing(s) {
        return Ok(None);
    }

    parse_decimal(s).map(Some)
}

/// `--` 轉為 `None`，其餘依 [`parse_u64`] 解析
pub fn parse_optional_u64(s: &str) -> Result<Option<u64>> {
    if is_missing(s) {
        return Ok(None);
    }

    parse_u64(s).map(Some)
}

/// `--` 與空白轉為 `None`，其餘去除前後空白
pub fn optional_text(s: &str) -> Option<String> {
    if is_missing(s) {
        None
    } else {
        Some(s.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_big5_to_utf8() {
        // 「股票」的 Big5 編碼
        let bytes = [0xAA, 0xD1, 0xB2, 0xBC];
        assert_eq!(big5_to_utf8(&bytes), "股票");
    }

    #[test]
    fn test_parse_digit_grouped() {
        assert_eq!(parse_u64("1,000,000").unwrap(), 1_000_000);
        assert_eq!(parse_decimal("1,234.56").unwrap(), dec!(1234.56));
        assert_eq!(parse_decimal(" 94.87 ").unwrap(), dec!(94.87));
        assert!(parse_u64("12a").is_err());
    }

    #[test]
    fn test_missing_value_becomes_none() {
        assert_eq!(parse_optional_decimal("--").unwrap(), None);
        assert_eq!(parse_optional_u64(" -- ").unwrap(), None);
        assert_eq!(parse_optional_u64("").unwrap(), None);
        assert_eq!(optional_text("--"), None);
        assert_eq!(
            parse_optional_decimal("1,001.5").unwrap(),
            Some(dec!(1001.5))
        );
        assert_eq!(optional_text(" X0.00 "), Some("X0.00".to_string()));
    }
}
