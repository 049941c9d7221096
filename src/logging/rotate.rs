use std::{
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Local};

/// 預設單檔最大大小：10 MB
const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
/// 預設保留天數：7 天
const DEFAULT_MAX_AGE_DAYS: u64 = 7;

/// 依日期切換檔案，同一天內超過大小上限時遞增世代編號
pub struct Rotate {
    /// 檔名模式，例如 "log/%Y-%m-%d-name.log"
    fn_pattern: String,
    /// 當前基礎檔名（不含 generation，由日期決定）
    cur_base_fn: String,
    out_fh: Option<BufWriter<File>>,
    /// 只增不減
    generation: u32,
    max_size: u64,
    current_size: u64,
    max_age: Duration,
}

impl Rotate {
    pub fn new(fn_pattern: String) -> Self {
        Self::with_options(fn_pattern, DEFAULT_MAX_SIZE, DEFAULT_MAX_AGE_DAYS)
    }

    pub fn with_options(fn_pattern: String, max_size: u64, max_age_days: u64) -> Self {
        Rotate {
            fn_pattern,
            cur_base_fn: String::new(),
            out_fh: None,
            generation: 0,
            max_size,
            current_size: 0,
            max_age: Duration::from_secs(max_age_days * 24 * 60 * 60),
        }
    }

    /// 寫入日誌訊息，日期變更或超過大小上限時先切換檔案
    pub fn write_msg(&mut self, now: DateTime<Local>, msg: &[u8]) -> Result<()> {
        let base_fn = now.format(&self.fn_pattern).to_string();

        if base_fn != self.cur_base_fn || self.out_fh.is_none() {
            self.generation = 0;
            self.cur_base_fn = base_fn;
            self.open_new_file()?;
            self.cleanup_old_files();
        }

        if self.current_size > 0 && self.current_size + msg.len() as u64 > self.max_size {
            self.generation += 1;
            self.open_new_file()?;
        }

        let writer = self
            .out_fh
            .as_mut()
            .ok_or_else(|| anyhow!("Log file {} is not open", self.cur_base_fn))?;
        writer.write_all(msg)?;
        self.current_size += msg.len() as u64;

        Ok(())
    }

    pub fn flush(&mut self) {
        if let Some(writer) = self.out_fh.as_mut() {
            let _ = writer.flush();
        }
    }

    /// generation = 0: "log/2025-02-03-app.log"
    /// generation = 2: "log/2025-02-03-app.2.log"
    fn generate_full_fn(base_fn: &str, generation: u32) -> PathBuf {
        let path = Path::new(base_fn);
        if generation == 0 {
            return path.to_path_buf();
        }

        let parent = path.parent().unwrap_or(Path::new(""));
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("log");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("log");

        parent.join(format!("{}.{}.{}", stem, generation, ext))
    }

    fn open_new_file(&mut self) -> Result<()> {
        self.flush();

        let filename = Self::generate_full_fn(&self.cur_base_fn, self.generation);
        if let Some(parent) = filename.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&filename)?;

        self.current_size = file.metadata().map(|m| m.len()).unwrap_or(0);
        self.out_fh = Some(BufWriter::with_capacity(4096, file));

        Ok(())
    }

    /// 刪除同一目錄下修改時間超過 max_age 的 .log 檔
    fn cleanup_old_files(&self) {
        let base = Path::new(&self.cur_base_fn);
        let Some(dir) = base.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };
        let Some(cut_off) = SystemTime::now().checked_sub(self.max_age) else {
            return;
        };

        for path in entries.flatten().map(|entry| entry.path()) {
            if path.extension().and_then(|e| e.to_str()) != Some("log") {
                continue;
            }

            let expired = fs::metadata(&path)
                .and_then(|metadata| metadata.modified())
                .map(|modified| modified < cut_off)
                .unwrap_or(false);

            if expired {
                if let Err(why) = fs::remove_file(&path) {
                    super::error_console(format!(
                        "couldn't remove the file({}). because {:?}",
                        path.display(),
                        why
                    ));
                }
            }
        }
    }
}

impl Drop for Rotate {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "rotate-{}-{}-{}",
            name,
            std::process::id(),
            Local::now().timestamp_nanos_opt().unwrap_or_default()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_generation_filename() {
        let base = "log/2025-02-03-app.log";
        assert_eq!(
            Rotate::generate_full_fn(base, 0),
            PathBuf::from("log/2025-02-03-app.log")
        );
        assert_eq!(
            Rotate::generate_full_fn(base, 2),
            PathBuf::from("log/2025-02-03-app.2.log")
        );
    }

    #[test]
    fn test_size_rotation_never_overwrites() {
        let dir = temp_dir("size");
        let pattern = format!("{}/%Y-%m-%d-size.log", dir.display());
        let mut r = Rotate::with_options(pattern, 512, 7);
        let now = Local::now();

        for i in 0..50 {
            let msg = format!("Line {:03} - {}\r\n", i, "X".repeat(50));
            r.write_msg(now, msg.as_bytes()).unwrap();
        }
        r.flush();

        assert!(r.generation >= 3, "generation: {}", r.generation);
        let files = fs::read_dir(&dir).unwrap().count() as u32;
        assert_eq!(files, r.generation + 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
