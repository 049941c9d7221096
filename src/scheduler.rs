use std::future::Future;

use anyhow::{Error, Result};
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::{backfill, config, logging};

/// 啟動排程
pub async fn start(sched: &JobScheduler) -> Result<()> {
    //                 sec  min   hour   day of month   month   day of week
    // UTC 時間，10:00 為台北 18:00 收盤後
    let cron_expr = config::SETTINGS.crawler.cron.clone();
    let job = create_job(cron_expr.clone(), backfill::run)?;
    sched.add(job).await?;
    sched.start().await?;

    logging::info_file_async(format!("排程已啟動 {}", cron_expr));

    Ok(())
}

fn create_job<F, Fut>(cron_expr: String, task: F) -> Result<Job>
where
    F: Fn() -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<(), Error>> + Send,
{
    let expr = cron_expr.clone();
    Ok(Job::new_async(cron_expr.as_str(), move |_uuid, _l| {
        let task = task.clone();
        let expr = expr.clone();
        Box::pin(async move {
            if let Err(why) = task().await {
                logging::error_file_async(format!(
                    "Failed to execute task({}) because {:?}",
                    expr, why
                ));
            }
        })
    })?)
}
