use std::{env, fmt::Debug, fs, io, path::PathBuf, str::FromStr};

use anyhow::{anyhow, Result};
use config::{Config as config_config, File as config_file};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::util::datetime::YearMonth;

const CONFIG_PATH: &str = "app.json";

#[derive(Serialize, Deserialize, Default, Debug, Clone)]
pub struct App {
    #[serde(default)]
    pub mariadb: MariaDB,
    #[serde(default)]
    pub crawler: Crawler,
}

const MARIADB_HOST: &str = "MARIADB_HOST";
const MARIADB_PORT: &str = "MARIADB_PORT";
const MARIADB_USER: &str = "MARIADB_USER";
const MARIADB_PASSWORD: &str = "MARIADB_PASSWORD";
const MARIADB_PASSWORD_FILE: &str = "MARIADB_PASSWORD_FILE";
const MARIADB_DATABASE: &str = "MARIADB_DATABASE";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MariaDB {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    /// 直接指定的密碼，未設定時改讀 `password_file`
    #[serde(default)]
    pub password: String,
    /// docker secret 之類掛載進來的密碼檔
    #[serde(default)]
    pub password_file: String,
    #[serde(default)]
    pub database: String,
}

impl Default for MariaDB {
    fn default() -> Self {
        MariaDB {
            host: default_host(),
            port: default_port(),
            user: String::new(),
            password: String::new(),
            password_file: String::new(),
            database: String::new(),
        }
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    3306
}

const CRAWLER_START_MONTH: &str = "CRAWLER_START_MONTH";
const CRAWLER_REQUEST_DELAY_SECS: &str = "CRAWLER_REQUEST_DELAY_SECS";
const CRAWLER_STOCK_DAY_URL: &str = "CRAWLER_STOCK_DAY_URL";
const CRAWLER_ISIN_URL: &str = "CRAWLER_ISIN_URL";
const CRAWLER_CRON: &str = "CRAWLER_CRON";

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Crawler {
    /// 最早回補的年月，格式 `2010/01`
    #[serde(default = "default_start_month")]
    pub start_month: String,
    /// 兩次請求之間至少間隔的秒數
    #[serde(default = "default_request_delay_secs")]
    pub request_delay_secs: u64,
    #[serde(default = "default_stock_day_url")]
    pub stock_day_url: String,
    #[serde(default = "default_isin_url")]
    pub isin_url: String,
    /// UTC 時間的排程
    #[serde(default = "default_cron")]
    pub cron: String,
}

impl Default for Crawler {
    fn default() -> Self {
        Crawler {
            start_month: default_start_month(),
            request_delay_secs: default_request_delay_secs(),
            stock_day_url: default_stock_day_url(),
            isin_url: default_isin_url(),
            cron: default_cron(),
        }
    }
}

impl Crawler {
    /// 回補的起始年月
    pub fn floor(&self) -> Result<YearMonth> {
        YearMonth::from_str(&self.start_month)
            .map_err(|why| anyhow!("Invalid start_month({}) because {:?}", self.start_month, why))
    }
}

fn default_floor() -> YearMonth {
    YearMonth::january(2010)
}

fn default_start_month() -> String {
    default_floor().to_string()
}

fn default_request_delay_secs() -> u64 {
    4
}

fn default_stock_day_url() -> String {
    "https://www.twse.com.tw/rwd/en/afterTrading/STOCK_DAY".to_string()
}

fn default_isin_url() -> String {
    "https://isin.twse.com.tw/isin/C_public.jsp?strMode=2".to_string()
}

fn default_cron() -> String {
    // 18:00 台北時間
    "0 0 10 * * *".to_string()
}

pub static SETTINGS: Lazy<App> = Lazy::new(|| App::get().expect("Config error"));

impl App {
    fn get() -> Result<Self> {
        let config_path = config_path();
        let app = if config_path.exists() {
            config_config::builder()
                .add_source(config_file::from(config_path))
                .build()?
                .try_deserialize::<App>()?
        } else {
            App::default()
        };

        app.override_with_env()?.resolve_password()?.validate()
    }

    /// 設定值在啟動時就要能用，不等到回補時才發現
    fn validate(self) -> Result<Self> {
        self.crawler.floor()?;
        Ok(self)
    }

    /// 將來至於 env 的設定值覆蓋掉 json 上的設定值
    fn override_with_env(mut self) -> Result<Self> {
        if let Ok(host) = env::var(MARIADB_HOST) {
            self.mariadb.host = host;
        }

        if let Ok(port) = env::var(MARIADB_PORT) {
            self.mariadb.port = parse_setting(MARIADB_PORT, &port)?;
        }

        if let Ok(user) = env::var(MARIADB_USER) {
            self.mariadb.user = user;
        }

        if let Ok(password) = env::var(MARIADB_PASSWORD) {
            self.mariadb.password = password;
        }

        if let Ok(password_file) = env::var(MARIADB_PASSWORD_FILE) {
            self.mariadb.password_file = password_file;
        }

        if let Ok(database) = env::var(MARIADB_DATABASE) {
            self.mariadb.database = database;
        }

        if let Ok(start_month) = env::var(CRAWLER_START_MONTH) {
            self.crawler.start_month = start_month;
        }

        if let Ok(delay) = env::var(CRAWLER_REQUEST_DELAY_SECS) {
            self.crawler.request_delay_secs = parse_setting(CRAWLER_REQUEST_DELAY_SECS, &delay)?;
        }

        if let Ok(url) = env::var(CRAWLER_STOCK_DAY_URL) {
            self.crawler.stock_day_url = url;
        }

        if let Ok(url) = env::var(CRAWLER_ISIN_URL) {
            self.crawler.isin_url = url;
        }

        if let Ok(cron) = env::var(CRAWLER_CRON) {
            self.crawler.cron = cron;
        }

        Ok(self)
    }

    /// 未直接給定密碼時，從密碼檔讀取
    fn resolve_password(mut self) -> Result<Self> {
        if self.mariadb.password.is_empty() && !self.mariadb.password_file.is_empty() {
            let path = PathBuf::from(&self.mariadb.password_file);
            let password = read_text_file(path).map_err(|why| {
                anyhow!(
                    "Failed to read password file {} because {:?}",
                    self.mariadb.password_file,
                    why
                )
            })?;
            self.mariadb.password = password.trim_end_matches(['\r', '\n']).to_string();
        }

        Ok(self)
    }
}

fn parse_setting<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Debug,
{
    T::from_str(value.trim()).map_err(|why| anyhow!("Invalid {}({}) because {:?}", key, value, why))
}

/// 回傳設定檔的路徑
fn config_path() -> PathBuf {
    PathBuf::from(CONFIG_PATH)
}

/// 回傳指定路徑的文字檔的內容
pub(crate) fn read_text_file(path: PathBuf) -> Result<String, io::Error> {
    fs::read_to_string(path)
}
