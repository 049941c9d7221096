use anyhow::{anyhow, Result};
use scraper::{ElementRef, Html, Selector};

use crate::{
    database::table::stock_info::StockInfo,
    logging,
    util::{self, datetime, http::element, text},
};

/// 資料列的欄位數：代號及名稱、ISIN、上市日、市場別、產業別、CFICode、備註
const CELL_COUNT: usize = 7;

/// 分類列與資料列的底色
const ROW_SELECTOR: &str = r##"td[bgcolor="#FAFAD2"]"##;

/// 下載並解析本國上市證券國際證券辨識號碼一覽表
pub async fn visit(url: &str) -> Result<Vec<StockInfo>> {
    let html = util::http::get_use_big5(url).await?;
    parse(&html)
}

/// 解析一覽表，分類列(例如 `股票`、`ETF`)之後的資料列都屬於該分類
pub fn parse(html: &str) -> Result<Vec<StockInfo>> {
    let document = Html::parse_document(html);
    let row_selector =
        Selector::parse("tr").map_err(|why| anyhow!("Failed to Selector::parse because: {:?}", why))?;
    let cell_selector = Selector::parse(ROW_SELECTOR)
        .map_err(|why| anyhow!("Failed to Selector::parse because: {:?}", why))?;

    let mut classification: Option<String> = None;
    let mut stocks = Vec::with_capacity(4096);

    for row in document.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.is_empty() {
            continue;
        }

        if let Some(category) = element::parse_value(&row, "td[colspan] > b") {
            classification = Some(category);
            continue;
        }

        let Some(current) = classification.as_deref() else {
            continue;
        };

        let texts: Vec<String> = cells.iter().map(element::text_of).collect();
        match to_stock_info(current, &texts) {
            Ok(stock) => stocks.push(stock),
            Err(why) => logging::warn_file_async(format!(
                "Skip ISIN row {:?} because {:?}",
                texts, why
            )),
        }
    }

    Ok(stocks)
}

fn to_stock_info(classification: &str, cells: &[String]) -> Result<StockInfo> {
    if cells.len() != CELL_COUNT {
        return Err(anyhow!("expected {} cells but got {}", CELL_COUNT, cells.len()));
    }

    let (symbol, name) = cells[0]
        .split_once('\u{3000}')
        .ok_or_else(|| anyhow!("'{}' is not code and name", cells[0]))?;
    let listing_date = datetime::parse_date(&cells[2])
        .ok_or_else(|| anyhow!("Failed to parse listing date from '{}'", cells[2]))?;

    Ok(StockInfo {
        classification: classification.to_string(),
        symbol: symbol.trim().to_string(),
        name: name.trim().to_string(),
        isin_code: cells[1].trim().to_string(),
        listing_date,
        market_category: cells[3].trim().to_string(),
        industry_category: text::optional_text(&cells[4]),
        cfi_code: cells[5].trim().to_string(),
        remark: text::optional_text(&cells[6]),
    })
}
