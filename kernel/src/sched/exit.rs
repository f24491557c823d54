//! 进程退出与回收
//!
//! 对应 Linux 的 kernel/exit.c: do_exit() / release_task()

use alloc::vec::Vec;

use crate::arch::{IrqGuard, Platform};
use crate::process::{Pid, TaskId, TaskState, PID_IDLE};
use crate::signal::{SigSet, Signal};
use super::sched::{post_signal, Scheduler};

impl<P: Platform> Scheduler<P> {
    /// 退出当前任务，永不返回
    pub fn exit(&self, code: i32) -> ! {
        self.do_exit(code);
        // 僵尸或已释放的任务不会再被选中
        panic!("exit: pid {} resumed after exit", self.getpid());
    }

    /// 退出当前任务
    ///
    /// 1. 子进程过继给 idle (ppid = 0)，其中的僵尸直接释放
    /// 2. 父进程存活：进入 Zombie，记录退出码，向父进程发送 SIGCHLD
    /// 3. 否则：从任务表移除，切换完成后释放存储
    /// 4. 重新调度
    pub fn do_exit(&self, code: i32) {
        let _irq = IrqGuard::new(&self.platform);

        let exiting = {
            let mut st = self.state.lock();

            let cur = match st.current {
                Some(id) => id,
                None => panic!("exit: no current task"),
            };
            let (pid, ppid) = match st.table.get(cur) {
                Some(task) if task.is_idle() => panic!("exit: idle task cannot exit"),
                Some(task) => (task.pid(), task.ppid()),
                None => panic!("exit: current task is not in the table"),
            };

            let mut zombies: Vec<TaskId> = Vec::new();
            st.table.for_each_mut(|id, task| {
                if task.ppid() == pid {
                    task.set_ppid(PID_IDLE);
                    if task.state() == TaskState::Zombie {
                        zombies.push(id);
                    }
                }
            });
            for id in zombies {
                if let Some(zombie) = st.table.remove(id) {
                    self.release(zombie);
                }
            }

            let parent = if ppid == PID_IDLE { None } else { st.table.find_by_pid(ppid) };

            if let Some(task) = st.table.get_mut(cur) {
                task.alarm = 0;
                task.pending = SigSet::empty();
            }

            match parent {
                Some(parent_id) => {
                    if let Some(task) = st.table.get_mut(cur) {
                        task.set_exit_code(code);
                        task.set_state(TaskState::Zombie);
                    }
                    if let Some(parent) = st.table.get_mut(parent_id) {
                        post_signal(parent, Signal::SIGCHLD);
                    }
                    log::info!("exit: pid {} exited with {}, zombie until reaped by {}", pid, code, ppid);
                    None
                }
                None => {
                    log::info!("exit: pid {} exited with {}, orphan released", pid, code);
                    st.table.remove(cur)
                }
            }
        };

        self.switch_out(exiting);
    }

    /// 回收僵尸子进程，返回其退出码
    ///
    /// `pid` 不是当前任务的僵尸子进程时返回 None
    pub fn reap(&self, pid: Pid) -> Option<i32> {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();

        let parent_pid = st.current_task()?.pid();
        let id = st.table.find_by_pid(pid)?;
        let code = {
            let task = st.table.get(id)?;
            if task.ppid() != parent_pid {
                return None;
            }
            task.exit_code()?
        };

        let task = st.table.remove(id)?;
        self.release(task);
        log::debug!("exit: pid {} reaped by {}", pid, parent_pid);
        Some(code)
    }
}
