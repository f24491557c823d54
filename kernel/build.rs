//! taskcore 构建脚本
//!
//! 这个脚本在编译前运行，负责：
//! 1. 解析 Kernel.toml 配置文件
//! 2. 在 OUT_DIR 下生成 config.rs

use std::env;
use std::fs;
use std::path::PathBuf;

fn get_int(config: &toml::Value, section: &str, key: &str, default: i64) -> i64 {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_integer())
        .unwrap_or(default)
}

fn get_str<'a>(config: &'a toml::Value, section: &str, key: &str, default: &'a str) -> &'a str {
    config.get(section)
        .and_then(|s| s.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or(default)
}

fn main() {
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let config_path = manifest_dir.join("../Kernel.toml");

    println!("cargo:rerun-if-changed={}", config_path.display());
    println!("cargo:rerun-if-changed=build.rs");

    // 配置文件缺失时全部使用默认值
    let config: toml::Value = match fs::read_to_string(&config_path) {
        Ok(content) => toml::from_str(&content).expect("Kernel.toml 解析失败"),
        Err(_) => {
            println!("cargo:warning=Kernel.toml not found, using defaults");
            toml::Value::Table(toml::map::Map::new())
        }
    };

    let kernel_name = get_str(&config, "general", "name", "taskcore");
    let kernel_version = get_str(&config, "general", "version", "0.1.0");

    let max_pid = get_int(&config, "scheduler", "max_pid", 32767);
    let time_slice_ticks = get_int(&config, "scheduler", "time_slice_ticks", 10);
    let tick_hz = get_int(&config, "scheduler", "tick_hz", 1000);
    let default_priority = get_int(&config, "scheduler", "default_priority", 120);

    let kernel_stack_size = get_int(&config, "process", "kernel_stack_size", 16384);
    let wait_queue_slots = get_int(&config, "process", "wait_queue_slots", 16);

    let log_level = if env::var("CARGO_FEATURE_DEBUG_LOG").is_ok() {
        "trace"
    } else {
        get_str(&config, "debug", "log_level", "info")
    };

    assert!(max_pid >= 2 && max_pid <= u32::MAX as i64, "scheduler.max_pid 超出范围");
    assert!(time_slice_ticks > 0, "scheduler.time_slice_ticks 必须大于 0");
    assert!(tick_hz > 0, "scheduler.tick_hz 必须大于 0");
    assert!(wait_queue_slots > 0, "process.wait_queue_slots 必须大于 0");
    assert!(kernel_stack_size >= 4096 && kernel_stack_size % 16 == 0,
            "process.kernel_stack_size 至少 4096 且 16 字节对齐");

    let config_code = format!(
        r#"// 由 build.rs 根据 Kernel.toml 自动生成，请勿手动修改

/// 内核名称
pub const KERNEL_NAME: &str = "{kernel_name}";

/// 内核版本
pub const KERNEL_VERSION: &str = "{kernel_version}";

/// 最大 PID
pub const MAX_PID: u32 = {max_pid};

/// 时间片滴答数
pub const TIME_SLICE_TICKS: u32 = {time_slice_ticks};

/// 时钟中断频率 (Hz)
pub const TICK_HZ: u32 = {tick_hz};

/// 默认优先级
pub const DEFAULT_PRIORITY: i32 = {default_priority};

/// 内核栈大小 (字节)
pub const KERNEL_STACK_SIZE: usize = {kernel_stack_size};

/// 等待队列槽位数
pub const WAIT_QUEUE_SLOTS: usize = {wait_queue_slots};

/// 日志级别
pub const LOG_LEVEL: &str = "{log_level}";
"#
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("config.rs"), config_code).expect("无法写入 config.rs");
}
