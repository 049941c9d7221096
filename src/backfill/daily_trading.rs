use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use scopeguard::defer;

use crate::{
    config,
    crawler::twse::stock_day,
    database::{
        table::{daily_trading, stock_info},
        Client, Credentials,
    },
    logging,
    tracker::{self, Clock, Ledger, Settlement, TaipeiClock, Unit},
};

/// 一輪回補的統計
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub planned: usize,
    /// 已結束且寫入紀錄的月份
    pub closed: usize,
    /// 當月，下一輪會再抓
    pub open: usize,
    /// 下載失敗或內容不符
    pub skipped: usize,
    pub rows: u64,
}

/// 補齊上市股票每個月份的日成交資訊
pub async fn execute() -> Result<()> {
    logging::info_file_async("回補個股日成交資訊開始");
    defer! {
        logging::info_file_async("回補個股日成交資訊結束");
    }

    let settings = &config::SETTINGS;
    let credentials = Credentials::from(&settings.mariadb);
    let mut client = Client::open(daily_trading::table()?, &credentials).await?;
    let outcome = backfill(&mut client, &TaipeiClock, &settings.crawler).await;
    let summary = client.close_with(outcome).await?;

    logging::info_file_async(format!("回補個股日成交資訊 {:?}", summary));

    Ok(())
}

async fn backfill<C: Clock>(
    client: &mut Client<'static>,
    clock: &C,
    crawler: &config::Crawler,
) -> Result<Summary> {
    client.prepare().await?;
    client
        .execute(stock_info::table()?.create_statement(), Vec::new())
        .await?;

    let securities =
        stock_info::fetch_securities(client, stock_info::EQUITY_CLASSIFICATION).await?;
    let mut rng = StdRng::from_rng(&mut rand::rng());
    let units = tracker::plan(client, clock, &mut rng, securities, crawler.floor()?).await?;
    let mut summary = Summary {
        planned: units.len(),
        ..Default::default()
    };

    for unit in units {
        let trades = match stock_day::visit(&crawler.stock_day_url, &unit).await {
            Ok(trades) => trades,
            Err(why) => {
                logging::warn_file_async(format!("Skip {} because {:?}", unit, why));
                summary.skipped += 1;
                continue;
            }
        };

        summary.rows += ingest(client, unit, &trades).await?;
        match tracker::settle(client, clock, unit).await? {
            Settlement::Closed(_) => summary.closed += 1,
            Settlement::Open => summary.open += 1,
        }

        client.commit().await?;
    }

    Ok(summary)
}

/// 寫入一個月份的每一個交易日
async fn ingest(
    client: &mut Client<'static>,
    unit: Unit,
    trades: &[daily_trading::DailyTrading],
) -> Result<u64> {
    let mut rows = 0;
    for trade in trades {
        rows += trade.upsert(client).await?;
    }

    logging::debug_file_async(format!("{} {} trading days", unit, trades.len()));

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::{
        tracker::{clock::tests::FixedClock, ledger::tests::MemoryLedger, Security},
        util::datetime::YearMonth,
    };

    #[tokio::test]
    async fn test_empty_month_stays_planned() {
        let clock = FixedClock::at(2024, 6, 10);
        let mut ledger = MemoryLedger::default();
        let may = Unit::new(1101, YearMonth::new(2024, 5).unwrap());
        let security = Security::new(1101, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(), "股票");
        let body = r#"{"stat":"OK","title":"2024/05  Daily Trading Value/Volume of 1101 ","data":[]}"#;

        assert_eq!(
            stock_day::parse(&may, body).unwrap_err(),
            stock_day::Mismatch::Empty(may.month)
        );

        let mut rng = StdRng::seed_from_u64(5);
        let units = tracker::plan(&mut ledger, &clock, &mut rng, vec![security], may.month)
            .await
            .unwrap();
        assert!(units.contains(&may));
        assert!(!ledger.is_closed(1101, may.month));
    }

    #[tokio::test]
    #[ignore]
    async fn test_execute() {
        dotenv::dotenv().ok();
        logging::debug_file_async("開始 daily_trading::execute".to_string());

        match execute().await {
            Ok(_) => logging::debug_file_async("結束 daily_trading::execute".to_string()),
            Err(why) => {
                logging::debug_file_async(format!("Failed to execute because {:?}", why));
            }
        }
    }
}
