//! 阻塞、唤醒与空闲
//!
//! 对应 Linux 的 kernel/sched/wait.c 与 kernel/time/hrtimer.c: nanosleep

use core::ptr;

use crate::arch::{IrqGuard, Platform};
use crate::config::TICK_HZ;
use crate::process::{TaskState, WaitQueue};
use super::sched::Scheduler;

/// 毫秒换算为滴答数（向上取整，至少 1）
pub fn ms_to_ticks(ms: u64) -> u32 {
    let ticks = ms.saturating_mul(TICK_HZ as u64).saturating_add(999) / 1000;
    ticks.clamp(1, u32::MAX as u64) as u32
}

impl<P: Platform> Scheduler<P> {
    /// 当前任务在 `queue` 上可中断地睡眠
    ///
    /// 直到 `wake_up(queue)` 或收到信号才会重新变为 Runnable
    pub fn sleep_interruptible(&self, queue: &'static WaitQueue) {
        self.sleep_on(queue, TaskState::InterruptibleWait);
    }

    /// 当前任务在 `queue` 上不可中断地睡眠，只有 `wake_up(queue)` 能唤醒
    pub fn sleep_uninterruptible(&self, queue: &'static WaitQueue) {
        self.sleep_on(queue, TaskState::UninterruptibleWait);
    }

    fn sleep_on(&self, queue: &'static WaitQueue, state: TaskState) {
        // 从登记到让出 CPU 都屏蔽中断，避免丢失唤醒
        let _irq = IrqGuard::new(&self.platform);
        {
            let mut st = self.state.lock();
            let task = match st.current_task_mut() {
                Some(task) => task,
                None => panic!("sleep_on: no current task"),
            };
            if task.is_idle() {
                panic!("sleep_on: idle task cannot block");
            }
            debug_assert!(task.wait_slot().is_none(), "task already occupies a wait-queue slot");

            // 已有待处理信号时不进入可中断睡眠，让调度把信号投递出去
            if state == TaskState::InterruptibleWait && !task.pending.is_empty() {
                log::trace!("sleep_on: pid {} has pending signals, not blocking", task.pid());
                drop(st);
                self.reschedule();
                return;
            }

            let slot = match queue.claim(task.pid()) {
                Some(slot) => slot,
                None => panic!("wait queue: all {} slots are occupied", queue.capacity()),
            };
            task.set_wait_slot(Some((queue, slot)));
            task.set_state(state);
            log::trace!("sleep_on: pid {} waits in slot {}", task.pid(), slot);
        }
        self.reschedule();
    }

    /// 唤醒 `queue` 上的所有等待者，返回被唤醒的任务数
    ///
    /// 可以在中断上下文中调用；队列为空时什么也不做
    pub fn wake_up(&self, queue: &WaitQueue) -> usize {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();
        let mut woken = 0;

        queue.drain(|pid| {
            let id = match st.table.find_by_pid(pid) {
                Some(id) => id,
                None => return,
            };
            if let Some(task) = st.table.get_mut(id) {
                if task.wait_slot().is_some_and(|(q, _)| ptr::eq(q, queue)) {
                    task.set_wait_slot(None);
                }
                if task.state().is_waiting() {
                    task.set_state(TaskState::Runnable);
                    woken += 1;
                }
            }
        });

        if woken > 0 {
            log::trace!("wake_up: {} task(s) woken", woken);
        }
        woken
    }

    /// 当前任务睡眠 `ms` 毫秒
    ///
    /// 到期时 alarm 产生 SIGALRM 把任务唤醒；其他信号也会提前唤醒它。
    /// `ms == 0` 或已有待处理信号时只让出 CPU。
    pub fn sleep(&self, ms: u64) {
        let _irq = IrqGuard::new(&self.platform);
        {
            let mut st = self.state.lock();
            let task = match st.current_task_mut() {
                Some(task) => task,
                None => panic!("sleep: no current task"),
            };
            if task.is_idle() {
                panic!("sleep: idle task cannot sleep");
            }
            if ms > 0 && task.pending.is_empty() {
                task.alarm = ms_to_ticks(ms);
                task.set_state(TaskState::InterruptibleWait);
                log::trace!("sleep: pid {} sleeps {} ticks", task.pid(), task.alarm);
            }
        }
        self.reschedule();
    }

    /// idle 任务的一次空闲：打开中断并停机，直到下一个中断
    pub fn idle(&self) {
        {
            let _irq = IrqGuard::new(&self.platform);
            let st = self.state.lock();
            match st.current_task() {
                Some(task) if task.is_idle() => {}
                Some(task) => panic!("idle: called by non-idle pid {}", task.pid()),
                None => panic!("idle: scheduler not initialized"),
            }
        }
        self.platform.halt_until_interrupt();
    }

    /// idle 循环
    pub fn run_idle(&self) -> ! {
        loop {
            self.idle();
            self.preempt();
        }
    }
}
