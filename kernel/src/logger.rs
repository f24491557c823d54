//! 内核日志
//!
//! `log` 门面的后端，经由 `println!` 输出到控制台

use log::{LevelFilter, Log, Metadata, Record};
use crate::println;

pub struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            println!("[{:5}] {}: {}", record.level(), record.target(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: KernelLogger = KernelLogger;

/// 解析配置中的日志级别
pub fn parse_level(level: &str) -> LevelFilter {
    match level {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// 安装内核日志后端
///
/// 重复调用只会更新日志级别
pub fn init() {
    init_with_level(parse_level(crate::config::LOG_LEVEL));
}

pub fn init_with_level(level: LevelFilter) {
    // 已经安装过时 set_logger 返回 Err，忽略即可
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}
