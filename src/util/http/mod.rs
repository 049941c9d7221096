use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use once_cell::sync::{Lazy, OnceCell};
use reqwest::Client;
use tokio::sync::Mutex;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    Retry,
};

use crate::{config, logging::Logger, util};

pub mod element;
pub mod user_agent;

/// A singleton instance of the reqwest client.
static CLIENT: OnceCell<Client> = OnceCell::new();

/// 上一次請求結束的時間，同一時間只允許一個請求
///
/// 持有鎖直到回應內容讀取完畢，下一個請求至少間隔
/// `crawler.request_delay_secs` 秒，避免被證交所封鎖。
static GATE: Lazy<Mutex<Option<Instant>>> = Lazy::new(|| Mutex::new(None));

static RUSTLS_PROVIDER: OnceCell<()> = OnceCell::new();

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("http"));

/// HTTP 請求失敗時的最大重試次數。
const MAX_RETRIES: usize = 3;

/// 安裝 rustls 使用的 ring 加密實作，重複呼叫不會有影響
pub fn ensure_rustls_crypto_provider() {
    RUSTLS_PROVIDER.get_or_init(|| {
        // 已經有其他地方安裝過時會回傳 Err，直接沿用即可
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}

fn get_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        ensure_rustls_crypto_provider();
        Client::builder()
            // ===== 壓縮 =====
            .brotli(true)
            .gzip(true)
            .zstd(true)
            // ===== 超時設置 =====
            .connect_timeout(Duration::from_secs(8))
            .timeout(Duration::from_secs(30))
            // ===== 連接池 =====
            .pool_max_idle_per_host(2)
            .pool_idle_timeout(Duration::from_secs(90))
            // ===== Cookie 和重定向 =====
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(user_agent::gen_random_ua())
            .build()
            .map_err(|e| anyhow!("Failed to create reqwest client: {:?}", e))
    })
}

fn request_delay() -> Duration {
    Duration::from_secs(config::SETTINGS.crawler.request_delay_secs)
}

/// Performs an HTTP GET request and returns the body as UTF-8 text.
pub async fn get(url: &str) -> Result<String> {
    let body = send(url).await?;
    String::from_utf8(body).map_err(|e| anyhow!("Error parsing response text: {:?}", e))
}

/// Performs an HTTP GET request and decodes the body as Big5.
pub async fn get_use_big5(url: &str) -> Result<String> {
    let body = send(url).await?;
    Ok(util::text::big5_to_utf8(&body))
}

/// 經過請求間隔的控管送出 GET，失敗時以指數退避重試
async fn send(url: &str) -> Result<Vec<u8>> {
    let client = get_client()?;
    // 2s, 4s, 8s
    let strategy = ExponentialBackoff::from_millis(2)
        .factor(1000)
        .max_delay(Duration::from_secs(30))
        .map(jitter)
        .take(MAX_RETRIES);

    Retry::spawn(strategy, || attempt(client, url))
        .await
        .map_err(|why| {
            anyhow!(
                "Failed to send request to {} after {} retries; last error: {:?}",
                url,
                MAX_RETRIES,
                why
            )
        })
}

/// 一次請求，回應內容讀取完畢前不會放開 [`GATE`]
async fn attempt(client: &Client, url: &str) -> Result<Vec<u8>> {
    let mut last_request = GATE.lock().await;
    if let Some(last) = *last_request {
        let delay = request_delay();
        let elapsed = last.elapsed();
        if elapsed < delay {
            tokio::time::sleep(delay - elapsed).await;
        }
    }

    let start = Instant::now();
    let result = read_body(client, url).await;
    *last_request = Some(Instant::now());
    let elapsed = start.elapsed().as_millis();

    match result {
        Ok(body) => {
            LOGGER.info(format!("GET:{} {} bytes {} ms", url, body.len(), elapsed));
            Ok(body)
        }
        Err(why) => {
            LOGGER.error(format!("GET:{} failed because {:?}. {} ms", url, why, elapsed));
            Err(anyhow!(why))
        }
    }
}

async fn read_body(client: &Client, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}
