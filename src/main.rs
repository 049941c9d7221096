use anyhow::Result;
use tokio_cron_scheduler::JobScheduler;

#[cfg(all(target_os = "linux", target_env = "musl"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod backfill;
pub mod config;
pub mod crawler;
pub mod database;
pub mod logging;
pub mod scheduler;
pub mod tracker;
pub mod util;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    // 設定或密碼檔有誤時在排程前就結束
    once_cell::sync::Lazy::force(&config::SETTINGS);
    util::http::ensure_rustls_crypto_provider();
    logging::info_console(format!(
        "taiwan_stock_crawler 已啟動 OS/Arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    ));

    let mut sched = JobScheduler::new().await?;
    scheduler::start(&sched).await?;

    tokio::spawn(async {
        if let Err(why) = backfill::run().await {
            logging::error_file_async(format!("Failed to backfill::run because {:?}", why));
        }
    });

    tokio::signal::ctrl_c().await?;
    logging::info_console("收到中止訊號，停止排程");
    if let Err(why) = sched.shutdown().await {
        logging::error_console(format!("Failed to shutdown scheduler because {:?}", why));
    }

    Ok(())
}
