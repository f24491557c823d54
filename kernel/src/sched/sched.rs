//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 调度器实现
//!
//! 参照 Linux 内核的调度入口 (kernel/sched/core.c)：
//! - 时钟中断: scheduler_tick() -> 时间片用完时设置 need_resched
//! - 调度入口: schedule() -> pick_next_task() -> context_switch()
//!
//! 单处理器，并发只来自中断。所有共享状态都在 [`SchedulerState`] 中，
//! 每次读改写都先用 [`IrqGuard`] 屏蔽中断，再获取 spin 锁；
//! 锁不会跨越上下文切换持有。
//!
//! 调度策略是简单的轮转：从当前任务之后的槽位开始向前扫描，
//! 找到第一个 Runnable 的非 idle 任务；一圈都没有就返回 idle。

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};
use spin::Mutex;

use crate::arch::{Context, IrqGuard, Platform, Ring};
use crate::config::TIME_SLICE_TICKS;
use crate::process::{Pid, PidAllocator, Task, TaskId, TaskState, TaskTable, PID_IDLE};
use crate::signal::{DefaultAction, SigSet, Signal};

/// 调度器共享状态
pub struct SchedulerState {
    pub(crate) table: TaskTable,
    pub(crate) current: Option<TaskId>,
    pub(crate) idle: Option<TaskId>,
    pub(crate) pids: PidAllocator,
    /// 当前时间片剩余滴答数
    pub(crate) quantum: u32,
    /// 全局滴答计数
    pub(crate) ticks: u64,
    /// 已退出、等待切换完成后释放的任务
    pub(crate) dying: Option<Box<Task>>,
}

impl SchedulerState {
    const fn new() -> Self {
        Self {
            table: TaskTable::new(),
            current: None,
            idle: None,
            pids: PidAllocator::new(),
            quantum: TIME_SLICE_TICKS,
            ticks: 0,
            dying: None,
        }
    }

    /// 选择下一个任务
    ///
    /// 当前任务本身是最后一个候选；没有可运行任务时返回 idle
    pub(crate) fn pick_next(&self) -> Option<TaskId> {
        let idle = self.idle?;
        let nr_slots = self.table.capacity();
        let start = self.current.unwrap_or(idle).0;

        for offset in 1..=nr_slots {
            let id = TaskId((start + offset) % nr_slots);
            if let Some(task) = self.table.get(id) {
                if task.state() == TaskState::Runnable && !task.is_idle() {
                    return Some(id);
                }
            }
        }

        Some(idle)
    }

    pub(crate) fn current_task(&self) -> Option<&Task> {
        self.table.get(self.current?)
    }

    pub(crate) fn current_task_mut(&mut self) -> Option<&mut Task> {
        let id = self.current?;
        self.table.get_mut(id)
    }
}

/// 只读的任务快照，用于诊断输出和测试
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub pid: Pid,
    pub ppid: Pid,
    pub state: TaskState,
    pub priority: i32,
    pub alarm: u32,
    pub pending: SigSet,
    pub exit_code: Option<i32>,
    pub kernel_time: u64,
    pub user_time: u64,
}

impl From<&Task> for TaskInfo {
    fn from(task: &Task) -> Self {
        Self {
            pid: task.pid(),
            ppid: task.ppid(),
            state: task.state(),
            priority: task.priority(),
            alarm: task.alarm,
            pending: task.pending,
            exit_code: task.exit_code(),
            kernel_time: task.kernel_time,
            user_time: task.user_time,
        }
    }
}

/// 向任务投递信号
///
/// 可中断睡眠中的任务被提升为 Runnable，让出所占的等待队列槽位，
/// 未到期的 alarm 一并取消
pub(crate) fn post_signal(task: &mut Task, sig: Signal) {
    task.pending.add(sig);
    if task.state() == TaskState::InterruptibleWait {
        if let Some((queue, slot)) = task.wait_slot() {
            queue.release(slot, task.pid());
            task.set_wait_slot(None);
        }
        task.alarm = 0;
        task.set_state(TaskState::Runnable);
    }
}

/// 调度器
///
/// 内核生命周期内只有一个实例，由平台层持有（通常放在一个 static 中）
pub struct Scheduler<P: Platform> {
    pub(crate) platform: P,
    pub(crate) state: Mutex<SchedulerState>,
    need_resched: AtomicBool,
}

impl<P: Platform> Scheduler<P> {
    pub const fn new(platform: P) -> Self {
        Self {
            platform,
            state: Mutex::new(SchedulerState::new()),
            need_resched: AtomicBool::new(false),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// 安装 idle 任务 (PID 0) 并把它设为当前任务
    pub fn init(&self) {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();

        if st.idle.is_some() {
            panic!("sched: init called twice");
        }

        let idle = Box::new(Task::new_idle(self.platform.kernel_space()));
        let id = st.table.add(idle);
        st.idle = Some(id);
        st.current = Some(id);
        st.quantum = TIME_SLICE_TICKS;

        log::info!("sched: initialized, idle task installed");
    }

    /// 查询下一次调度会选中的任务（不改变任何状态）
    pub fn pick_next(&self) -> Option<Pid> {
        let _irq = IrqGuard::new(&self.platform);
        let st = self.state.lock();
        let id = st.pick_next()?;
        st.table.get(id).map(|t| t.pid())
    }

    /// 重新调度
    ///
    /// 仍处于 Running 的当前任务被降为 Runnable（被抢占）；
    /// 正在阻塞的调用者在调用前已经设置好自己的等待状态
    pub fn reschedule(&self) {
        self.switch_out(None);
    }

    /// 调度的公共路径
    ///
    /// `exiting` 是已经从任务表中移除的当前任务，
    /// 它的存储要等切换完成后才能释放（我们还运行在它的内核栈上）
    pub(crate) fn switch_out(&self, exiting: Option<Box<Task>>) {
        let _irq = IrqGuard::new(&self.platform);

        let switch = {
            let mut st = self.state.lock();

            // 上一次切换遗留的已退出任务
            if let Some(dead) = st.dying.take() {
                self.release(dead);
            }

            let prev = match st.current {
                Some(id) => id,
                None => {
                    // 还没有任何任务，切换是空操作
                    if let Some(task) = exiting {
                        self.release(task);
                    }
                    return;
                }
            };

            if let Some(task) = st.table.get_mut(prev) {
                if task.state() == TaskState::Running {
                    task.set_state(TaskState::Runnable);
                }
            }

            let next = match st.pick_next() {
                Some(id) => id,
                None => panic!("sched: no idle task to fall back to"),
            };
            self.need_resched.store(false, Ordering::Release);

            if next == prev && exiting.is_none() {
                if let Some(task) = st.table.get_mut(next) {
                    task.set_state(TaskState::Running);
                }
                None
            } else {
                let (resume, space, next_pid) = match st.table.get_mut(next) {
                    Some(task) => {
                        task.set_state(TaskState::Running);
                        (task.context() as *const Context, task.address_space(), task.pid())
                    }
                    None => panic!("sched: picked an empty slot"),
                };
                st.current = Some(next);

                let save: *mut Context = match exiting {
                    Some(task) => {
                        let dying = st.dying.insert(task);
                        dying.context_mut() as *mut Context
                    }
                    None => match st.table.get_mut(prev) {
                        Some(task) => task.context_mut() as *mut Context,
                        None => panic!("sched: current task vanished from the table"),
                    },
                };

                log::trace!("sched: switch to pid {}", next_pid);
                self.platform.install_space(space);
                Some((save, resume))
            }
        };

        if let Some((save, resume)) = switch {
            // SAFETY: 两个上下文都属于装箱的任务（或 dying 槽位），
            // 在切换完成前不会被释放；中断处于屏蔽状态
            unsafe { self.platform.switch(save, resume) };

            // 从这里开始，执行的是被重新选中的任务
            let mut st = self.state.lock();
            if let Some(dead) = st.dying.take() {
                self.release(dead);
            }
        }

        self.handle_signal_on_resume();
    }

    /// 恢复运行时投递至多一个信号，并执行其默认动作
    fn handle_signal_on_resume(&self) {
        if let Some(sig) = self.deliver_signal() {
            if sig.default_action() == DefaultAction::Terminate {
                log::info!("sched: pid {} terminated by {:?}", self.getpid(), sig);
                self.do_exit(sig.exit_code());
            }
        }
    }

    /// 取出当前任务编号最小的待处理信号
    ///
    /// 每次调用只投递一个信号，其余的留给后续的调度
    pub fn deliver_signal(&self) -> Option<Signal> {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();
        let task = st.current_task_mut()?;
        if task.is_idle() {
            return None;
        }
        let sig = task.pending.take_first()?;
        log::debug!("signal: deliver {:?} to pid {}", sig, task.pid());
        Some(sig)
    }

    /// 向 `pid` 发送信号
    ///
    /// 目标不存在或是 idle 任务时返回 false；僵尸任务静默忽略
    pub fn raise(&self, pid: Pid, sig: Signal) -> bool {
        if pid == PID_IDLE {
            return false;
        }

        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();
        let id = match st.table.find_by_pid(pid) {
            Some(id) => id,
            None => return false,
        };
        if let Some(task) = st.table.get_mut(id) {
            if task.state() != TaskState::Zombie {
                post_signal(task, sig);
                log::debug!("signal: raise {:?} on pid {}", sig, pid);
            }
        }
        true
    }

    /// 时钟中断处理
    ///
    /// 更新时间统计和 alarm 倒计时，递减时间片；
    /// 时间片用完时只设置 need_resched，真正的调度由中断分发器调用
    /// [`Scheduler::preempt`] 完成。返回是否需要重新调度。
    pub fn tick(&self, ring: Ring) -> bool {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();

        st.ticks += 1;

        let task = match st.current_task_mut() {
            Some(task) => task,
            None => return false,
        };
        match ring {
            Ring::Kernel => task.kernel_time += 1,
            Ring::User => task.user_time += 1,
        }

        st.table.for_each_mut(|_, task| {
            if task.is_idle() || task.alarm == 0 {
                return;
            }
            if matches!(task.state(), TaskState::Initializing | TaskState::Zombie) {
                return;
            }
            task.alarm -= 1;
            if task.alarm == 0 {
                log::trace!("signal: alarm expired for pid {}", task.pid());
                post_signal(task, Signal::SIGALRM);
            }
        });

        st.quantum = st.quantum.saturating_sub(1);
        if st.quantum == 0 {
            st.quantum = TIME_SLICE_TICKS;
            self.need_resched.store(true, Ordering::Release);
            return true;
        }
        false
    }

    pub fn need_resched(&self) -> bool {
        self.need_resched.load(Ordering::Acquire)
    }

    pub fn set_need_resched(&self) {
        self.need_resched.store(true, Ordering::Release);
    }

    /// 中断返回前调用：时间片用完时执行调度
    pub fn preempt(&self) {
        if self.need_resched() {
            self.reschedule();
        }
    }

    /// 陷入入口保存的寄存器写入当前任务
    ///
    /// fork 复制的就是这里保存的上下文
    pub fn save_context(&self, ctx: &Context) {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();
        if let Some(task) = st.current_task_mut() {
            *task.context_mut() = ctx.clone();
        }
    }

    /// 当前任务的 PID；初始化之前返回 0
    pub fn getpid(&self) -> Pid {
        let _irq = IrqGuard::new(&self.platform);
        let st = self.state.lock();
        st.current_task().map(|t| t.pid()).unwrap_or(PID_IDLE)
    }

    /// 当前任务的父进程 PID；初始化之前返回 0
    pub fn getppid(&self) -> Pid {
        let _irq = IrqGuard::new(&self.platform);
        let st = self.state.lock();
        st.current_task().map(|t| t.ppid()).unwrap_or(PID_IDLE)
    }

    pub fn ticks(&self) -> u64 {
        let _irq = IrqGuard::new(&self.platform);
        self.state.lock().ticks
    }

    pub fn quantum_remaining(&self) -> u32 {
        let _irq = IrqGuard::new(&self.platform);
        self.state.lock().quantum
    }

    pub fn nr_tasks(&self) -> usize {
        let _irq = IrqGuard::new(&self.platform);
        self.state.lock().table.len()
    }

    pub fn task_info(&self, pid: Pid) -> Option<TaskInfo> {
        self.with_task(pid, |task| TaskInfo::from(task))
    }

    /// 所有任务的快照，按任务表槽位顺序
    pub fn tasks(&self) -> Vec<TaskInfo> {
        let _irq = IrqGuard::new(&self.platform);
        let st = self.state.lock();
        let mut infos = Vec::with_capacity(st.table.len());
        st.table.for_each(|_, task| infos.push(TaskInfo::from(task)));
        infos
    }

    pub fn with_task<R, F: FnOnce(&Task) -> R>(&self, pid: Pid, f: F) -> Option<R> {
        let _irq = IrqGuard::new(&self.platform);
        let st = self.state.lock();
        let id = st.table.find_by_pid(pid)?;
        st.table.get(id).map(f)
    }

    pub fn with_task_mut<R, F: FnOnce(&mut Task) -> R>(&self, pid: Pid, f: F) -> Option<R> {
        let _irq = IrqGuard::new(&self.platform);
        let mut st = self.state.lock();
        let id = st.table.find_by_pid(pid)?;
        st.table.get_mut(id).map(f)
    }

    /// 释放任务的地址空间和存储
    pub(crate) fn release(&self, task: Box<Task>) {
        log::debug!("sched: release pid {}", task.pid());
        self.platform.release_space(task.address_space());
        drop(task);
    }
}
