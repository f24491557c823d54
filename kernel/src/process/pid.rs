//! PID 管理
//!
//! PID 空间：
//! - PID 0: idle 进程，启动时固定分配
//! - PID 1..=MAX_PID: 普通进程
//!
//! 分配器是一个单调递增的游标，到达 MAX_PID 后回绕到 1（跳过 0），
//! 仍被存活任务（包括僵尸）占用的候选值会被跳过。

use crate::config::MAX_PID;
use super::task::Pid;

/// 第一个可分配的 PID
pub const PID_FIRST: Pid = 1;

pub struct PidAllocator {
    next: Pid,
}

impl PidAllocator {
    pub const fn new() -> Self {
        Self { next: PID_FIRST }
    }

    fn advance(&mut self) {
        self.next = if self.next >= MAX_PID { PID_FIRST } else { self.next + 1 };
    }

    /// 分配一个不被 `in_use` 占用的 PID
    ///
    /// 整个 PID 空间都被占用时停机
    pub fn alloc<F: Fn(Pid) -> bool>(&mut self, in_use: F) -> Pid {
        for _ in 0..MAX_PID {
            let candidate = self.next;
            self.advance();
            if !in_use(candidate) {
                return candidate;
            }
        }
        panic!("pid: all {} pids are in use", MAX_PID);
    }
}

impl Default for PidAllocator {
    fn default() -> Self {
        Self::new()
    }
}
