use std::{
    env,
    fmt::Write as _,
    fs::{self, File, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;

const LOG_DIR: &str = "LOG_DIR";
const DEFAULT_LOG_DIR: &str = "log";

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("default"));

/// 非同步寫檔的日誌，寫入檔案的操作由背景線程處理
pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    pub fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();

        match Self::get_log_path(log_name) {
            Some(log_path) => {
                thread::spawn(move || write_to_file(log_path, rx));
            }
            None => {
                error_console(format!(
                    "Failed to create log directory for {}, fall back to console.",
                    log_name
                ));
                thread::spawn(move || {
                    for received in &rx {
                        println!("{}", received.format());
                    }
                });
            }
        }

        Logger { writer: tx }
    }

    pub fn info(&self, log: String) {
        self.send(log::Level::Info, log);
    }

    pub fn warn(&self, log: String) {
        self.send(log::Level::Warn, log);
    }

    pub fn error(&self, log: String) {
        self.send(log::Level::Error, log);
    }

    pub fn debug(&self, log: String) {
        self.send(log::Level::Debug, log);
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }

    fn get_log_path(name: &str) -> Option<PathBuf> {
        let dir = env::var(LOG_DIR).unwrap_or_else(|_| DEFAULT_LOG_DIR.to_string());
        let path = Path::new(&dir);

        if !path.exists() {
            fs::create_dir_all(path).ok()?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", Local::now().format("%Y-%m-%d"), name));

        Some(log_path)
    }
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }

    fn format(&self) -> String {
        format!(
            "{} {} {}",
            self.created_at.format("%F %X%.6f"),
            self.level,
            self.msg
        )
    }
}

fn write_to_file(log_path: PathBuf, rx: Receiver<LogMessage>) {
    let file: File = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(file) => file,
        Err(why) => {
            error_console(format!("Failed to open log file {:?}: {}", log_path, why));
            for received in &rx {
                println!("{}", received.format());
            }
            return;
        }
    };

    let mut writer = BufWriter::new(file);
    let mut line = String::with_capacity(4096);

    for received in &rx {
        if writeln!(&mut line, "{}", received.format()).is_err() {
            continue;
        }

        if rx.is_empty() || line.len() >= 4096 {
            if let Err(why) = writer.write_all(line.as_bytes()) {
                error_console(format!(
                    "Failed to write to log file. because:{:#?}\r\nmsg:{}",
                    why, line
                ));
            }

            if let Err(why) = writer.flush() {
                error_console(format!("Failed to flush log file. because:{:#?}", why));
            }

            line.clear();
        }
    }
}

pub fn info_file_async(log: String) {
    LOGGER.info(log);
}

pub fn warn_file_async(log: String) {
    LOGGER.warn(log);
}

pub fn error_file_async(log: String) {
    LOGGER.error(log);
}

pub fn debug_file_async(log: String) {
    LOGGER.debug(log);
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    eprintln!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
