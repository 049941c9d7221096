use anyhow::Result;
use scopeguard::defer;

use crate::{
    config,
    crawler::twse,
    database::{
        table::stock_info::{self, StockInfo},
        Client, Credentials,
    },
    logging,
};

/// 更新台股國際證券識別碼
pub async fn execute() -> Result<()> {
    logging::info_file_async("更新台股國際證券識別碼開始");
    defer! {
        logging::info_file_async("更新台股國際證券識別碼結束");
    }

    let settings = &config::SETTINGS;
    let stocks =
        twse::international_securities_identification_number::visit(&settings.crawler.isin_url)
            .await?;

    let credentials = Credentials::from(&settings.mariadb);
    let mut client = Client::open(stock_info::table()?, &credentials).await?;
    let outcome = upsert_all(&mut client, &stocks).await;
    let rows = client.close_with(outcome).await?;

    logging::info_file_async(format!(
        "國際證券識別碼共 {} 筆，寫入 {} 筆",
        stocks.len(),
        rows
    ));

    Ok(())
}

async fn upsert_all(client: &mut Client<'static>, stocks: &[StockInfo]) -> Result<u64> {
    let mut rows = 0;
    for stock in stocks {
        rows += stock.upsert(client).await?;
    }

    client.commit().await?;

    Ok(rows)
}
