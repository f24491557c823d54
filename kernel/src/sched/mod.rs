//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器模块
//!
//! 参照 Linux 内核的调度器设计 (kernel/sched/)：
//! - 调度入口: schedule() -> pick_next_task() -> context_switch()
//! - 时钟中断: scheduler_tick()
//!
//! 当前实现: 单处理器上的轮转调度
//!
//! - `sched`: 调度器状态、任务选择、上下文切换与信号投递
//! - `fork`: 复制当前任务
//! - `exit`: 退出与回收
//! - `sleep`: 等待队列上的阻塞/唤醒、定时睡眠与 idle

pub mod sched;
mod fork;
mod exit;
mod sleep;

pub use sched::{Scheduler, SchedulerState, TaskInfo};
pub use sleep::ms_to_ticks;
