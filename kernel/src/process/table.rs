//! 任务表
//!
//! 所有任务（无论处于什么状态）都登记在这里。
//! 任务放在槽位数组中，用 [`TaskId`]（槽位下标）引用，取代侵入式双向链表；
//! 每个任务单独装箱，地址在整个生命周期内不变，
//! 切换时保存/恢复上下文的指针因此始终有效。
//!
//! 调用者负责在修改前屏蔽中断（见 `sched`）。

use alloc::boxed::Box;
use alloc::vec::Vec;

use super::task::{Pid, Task};

/// 任务在任务表中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

pub struct TaskTable {
    slots: Vec<Option<Box<Task>>>,
}

impl TaskTable {
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// 登记任务，优先复用空槽
    pub fn add(&mut self, task: Box<Task>) -> TaskId {
        if let Some(idx) = self.slots.iter().position(|s| s.is_none()) {
            self.slots[idx] = Some(task);
            TaskId(idx)
        } else {
            self.slots.push(Some(task));
            TaskId(self.slots.len() - 1)
        }
    }

    /// 移出任务，返回其所有权
    ///
    /// idle 任务永远不能被移除
    pub fn remove(&mut self, id: TaskId) -> Option<Box<Task>> {
        let slot = self.slots.get_mut(id.0)?;
        if slot.as_ref().is_some_and(|t| t.is_idle()) {
            panic!("task table: attempt to remove the idle task");
        }
        slot.take()
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.slots.get(id.0).and_then(|s| s.as_deref())
    }

    pub fn get_mut(&mut self, id: TaskId) -> Option<&mut Task> {
        self.slots.get_mut(id.0).and_then(|s| s.as_deref_mut())
    }

    pub fn find_by_pid(&self, pid: Pid) -> Option<TaskId> {
        self.iter().find(|(_, t)| t.pid() == pid).map(|(id, _)| id)
    }

    pub fn contains_pid(&self, pid: Pid) -> bool {
        self.find_by_pid(pid).is_some()
    }

    pub fn for_each<F: FnMut(TaskId, &Task)>(&self, mut f: F) {
        for (id, task) in self.iter() {
            f(id, task);
        }
    }

    pub fn for_each_mut<F: FnMut(TaskId, &mut Task)>(&mut self, mut f: F) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            if let Some(task) = slot.as_deref_mut() {
                f(TaskId(idx), task);
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Task)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_deref().map(|t| (TaskId(idx), t)))
    }

    /// 槽位数（含空槽），用于循环扫描
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 实际登记的任务数
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TaskTable {
    fn default() -> Self {
        Self::new()
    }
}
