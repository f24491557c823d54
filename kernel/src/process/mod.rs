//! 进程管理模块
//!
//! - `task`: 任务控制块 (task_struct) 与内核栈
//! - `table`: 任务表（槽位数组）
//! - `pid`: PID 分配
//! - `wait`: 等待队列

pub mod task;
pub mod table;
pub mod pid;
pub mod wait;

pub use task::{Pid, Task, TaskState, KernelStack, PID_IDLE};
pub use table::{TaskId, TaskTable};
pub use pid::PidAllocator;
pub use wait::WaitQueue;
