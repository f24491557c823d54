//! 等待队列 (Wait Queue)
//!
//! 参照 Linux 的等待队列 (include/linux/wait.h, kernel/sched/wait.c)：
//! - 任务需要等待某个事件时占用一个槽位并调用 reschedule()
//! - 事件发生时 wake_up() 把所有等待者设为 Runnable 并清空槽位
//!
//! 中断处理程序不能动态分配内存，所以队列是固定容量的槽位数组。
//! 一个任务同一时刻最多占用一个队列中的一个槽位。
//!
//! 这里只负责槽位本身；改变任务状态的 sleep/wake_up 在
//! `Scheduler::sleep_interruptible` / `Scheduler::wake_up` 中实现，
//! 因为它们必须和任务表在同一个临界区里修改。

use spin::Mutex;

use crate::config::WAIT_QUEUE_SLOTS;
use super::task::Pid;

pub struct WaitQueue {
    slots: Mutex<[Option<Pid>; WAIT_QUEUE_SLOTS]>,
}

impl WaitQueue {
    /// 对应 Linux 的 DECLARE_WAIT_QUEUE_HEAD()
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new([None; WAIT_QUEUE_SLOTS]),
        }
    }

    /// 清空所有槽位
    ///
    /// 对应 Linux 的 init_waitqueue_head()
    pub fn init(&self) {
        *self.slots.lock() = [None; WAIT_QUEUE_SLOTS];
    }

    /// 占用第一个空槽，队列已满时返回 None
    pub(crate) fn claim(&self, pid: Pid) -> Option<usize> {
        let mut slots = self.slots.lock();
        let idx = slots.iter().position(|s| s.is_none())?;
        slots[idx] = Some(pid);
        Some(idx)
    }

    /// 释放槽位（仅当它仍属于 `pid`）
    pub(crate) fn release(&self, idx: usize, pid: Pid) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get_mut(idx) {
            if *slot == Some(pid) {
                *slot = None;
            }
        }
    }

    /// 按槽位顺序取出并清空所有等待者
    pub(crate) fn drain<F: FnMut(Pid)>(&self, mut f: F) {
        let mut slots = self.slots.lock();
        for slot in slots.iter_mut() {
            if let Some(pid) = slot.take() {
                f(pid);
            }
        }
    }

    /// 已占用的槽位数
    pub fn occupied(&self) -> usize {
        self.slots.lock().iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.slots.lock().iter().any(|s| *s == Some(pid))
    }

    pub const fn capacity(&self) -> usize {
        WAIT_QUEUE_SLOTS
    }
}

impl Default for WaitQueue {
    fn default() -> Self {
        Self::new()
    }
}
