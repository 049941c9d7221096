use std::thread;

use chrono::{DateTime, Local};
use concat_string::concat_string;
use once_cell::sync::Lazy;
use strum::Display;
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::logging::rotate::Rotate;

pub mod rotate;

/// 單次寫檔的緩衝上限
const BATCH_CAPACITY: usize = 4096;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

pub struct LogMessage {
    pub level: Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }

    fn line(&self) -> String {
        concat_string!(
            self.created_at.format("%F %X%.6f").to_string(),
            " ",
            self.level.to_string(),
            " ",
            self.msg,
            "\r\n"
        )
    }
}

/// 具名的檔案日誌，寫檔的動作交由背景線程處理，呼叫端不會被 IO 阻塞
pub struct Logger {
    writer: UnboundedSender<LogMessage>,
}

impl Logger {
    /// 建立寫入 `log/%Y-%m-%d-{name}.log` 的日誌
    pub fn new(name: &str) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<LogMessage>();
        let mut rotate = Rotate::new(format!("log/%Y-%m-%d-{}.log", name));

        //寫入檔案的操作使用另一個線程處理
        thread::spawn(move || {
            let mut together = String::with_capacity(BATCH_CAPACITY);

            while let Some(received) = rx.blocking_recv() {
                together.push_str(&received.line());

                if rx.is_empty() || together.len() >= BATCH_CAPACITY {
                    if let Err(why) = rotate.write_msg(Local::now(), together.as_bytes()) {
                        error_console(format!("Failed to write log because {:?}", why));
                        info_console(together.clone());
                    }
                    rotate.flush();
                    together.clear();
                }
            }
        });

        Logger { writer: tx }
    }

    pub fn debug<S: Into<String>>(&self, log: S) {
        self.send(Level::Debug, log.into());
    }

    pub fn info<S: Into<String>>(&self, log: S) {
        self.send(Level::Info, log.into());
    }

    pub fn warn<S: Into<String>>(&self, log: S) {
        self.send(Level::Warn, log.into());
    }

    pub fn error<S: Into<String>>(&self, log: S) {
        self.send(Level::Error, log.into());
    }

    fn send(&self, level: Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }
}

pub fn debug_file_async<S: Into<String>>(log: S) {
    LOGGER.debug(log);
}

pub fn info_file_async<S: Into<String>>(log: S) {
    LOGGER.info(log);
}

pub fn warn_file_async<S: Into<String>>(log: S) {
    LOGGER.warn(log);
}

pub fn error_file_async<S: Into<String>>(log: S) {
    LOGGER.error(log);
}

pub fn info_console<S: Into<String>>(log: S) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log.into()
    );
}

pub fn error_console<S: Into<String>>(log: S) {
    println!(
        "{} Error {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log.into()
    );
}
