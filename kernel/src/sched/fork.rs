//! fork
//!
//! 对应 Linux 的 kernel/fork.c: copy_process()

use alloc::boxed::Box;

use crate::arch::{IrqGuard, Platform};
use crate::process::{Pid, TaskState, PID_IDLE};
use super::sched::{Scheduler, SchedulerState};

impl<P: Platform> Scheduler<P> {
    /// 复制当前任务
    ///
    /// 父进程得到子进程的 PID；子进程的上下文是父进程在陷入入口保存的上下文
    /// （见 [`Scheduler::save_context`]），返回值寄存器被置为 0，
    /// 所以子进程第一次被调度时从同一个 fork 调用返回 0。
    ///
    /// idle 任务也可以 fork，子进程的 ppid 为 0。
    pub fn fork(&self) -> Pid {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();
        let SchedulerState { table, pids, current, .. } = &mut *st;

        let parent_id = match *current {
            Some(id) => id,
            None => panic!("fork: no current task"),
        };
        let parent = match table.get(parent_id) {
            Some(task) => task,
            None => panic!("fork: current task is not in the table"),
        };

        let pid = pids.alloc(|candidate| candidate == PID_IDLE || table.contains_pid(candidate));
        let space = self.platform.clone_space(parent.address_space());

        let mut child = Box::new(parent.duplicate(pid, space));
        child.set_state(TaskState::Runnable);

        let parent_pid = parent.pid();
        table.add(child);

        log::info!("fork: pid {} -> child pid {}", parent_pid, pid);
        pid
    }
}
