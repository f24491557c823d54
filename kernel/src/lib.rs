//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! taskcore - 单处理器内核的抢占式多任务核心
//!
//! - 任务表、PID 分配与内核栈 ([`process`])
//! - 轮转调度、fork/exit/sleep/idle ([`sched`])
//! - 信号 ([`signal`])
//! - 系统调用分发 ([`syscall`])
//!
//! 与硬件相关的部分（中断屏蔽、上下文切换、页表）都在 [`arch::Platform`] 之后。
//! 宿主机上的测试使用记录调用的模拟平台。

#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod arch;
pub mod config;
pub mod console;
pub mod errno;
pub mod logger;
pub mod print;
pub mod process;
pub mod sched;
pub mod signal;
pub mod syscall;

pub use arch::{Platform, Ring};
pub use process::{Pid, TaskState, WaitQueue, PID_IDLE};
pub use sched::{Scheduler, TaskInfo};
pub use signal::Signal;

#[cfg(test)]
mod tests;
