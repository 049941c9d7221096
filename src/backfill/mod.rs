use anyhow::Result;
use once_cell::sync::Lazy;
use scopeguard::defer;
use tokio::sync::Mutex;

use crate::logging;

/// 個股日成交資訊
pub mod daily_trading;
/// 國際證券辨識號碼
pub mod isin;

/// 同一時間只跑一輪回補，排程觸發時上一輪還沒結束就略過
static RUNNING: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// 一輪完整的回補：先更新上市資訊，再補齊每日成交資訊
///
/// 上市資訊更新失敗時沿用資料庫內既有的清單繼續回補。
pub async fn run() -> Result<()> {
    let running: &'static Mutex<()> = Lazy::force(&RUNNING);
    let Ok(_running) = running.try_lock() else {
        logging::warn_file_async("上一輪回補尚未結束，略過本次排程");
        return Ok(());
    };

    logging::info_file_async("回補開始");
    defer! {
        logging::info_file_async("回補結束");
    }

    if let Err(why) = isin::execute().await {
        logging::error_file_async(format!("Failed to isin::execute because {:?}", why));
    }

    daily_trading::execute().await
}
