//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 任务控制块 (Task Control Block)
//!
//! 参照 Linux 内核的 `struct task_struct` (include/linux/sched.h)，
//! 只保留单处理器调度核心需要的字段：
//! 1. 身份：pid / ppid
//! 2. 调度：state / priority / context / 时间统计
//! 3. 资源：地址空间句柄与内核栈，二者都由任务独占
//! 4. 信号：pending 位图与 alarm 倒计时

use alloc::alloc::{alloc, dealloc, handle_alloc_error};
use core::alloc::Layout;
use core::ptr::NonNull;

use crate::arch::{AddressSpace, Context};
use crate::config::{DEFAULT_PRIORITY, KERNEL_STACK_SIZE};
use crate::signal::SigSet;
use super::wait::WaitQueue;

/// 进程标识符
pub type Pid = u32;

/// idle 任务的 PID
pub const PID_IDLE: Pid = 0;

/// 内核栈对齐（按页对齐）
const KERNEL_STACK_ALIGN: usize = 4096;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum TaskState {
    /// 正在构造，尚不可调度
    Initializing = 0,

    /// 可运行，等待被选中
    Runnable = 1,

    /// 正在 CPU 上运行（任意时刻只有一个）
    Running = 2,

    /// 可中断睡眠：wake_up 或信号都能唤醒
    InterruptibleWait = 3,

    /// 不可中断睡眠：只有 wake_up 能唤醒
    UninterruptibleWait = 4,

    /// 已退出，等待父进程回收
    Zombie = 5,
}

impl TaskState {
    pub fn is_waiting(self) -> bool {
        matches!(self, TaskState::InterruptibleWait | TaskState::UninterruptibleWait)
    }
}

/// 内核栈
///
/// 固定大小、页对齐的内存块，随任务一起释放（Drop 中释放，恰好一次）
pub struct KernelStack {
    base: NonNull<u8>,
}

// 内核栈只通过所属任务访问，任务本身受调度器锁保护
unsafe impl Send for KernelStack {}

impl KernelStack {
    fn layout() -> Layout {
        // KERNEL_STACK_SIZE 由 build.rs 保证非零且对齐
        match Layout::from_size_align(KERNEL_STACK_SIZE, KERNEL_STACK_ALIGN) {
            Ok(layout) => layout,
            Err(_) => panic!("kernel stack: invalid layout"),
        }
    }

    /// 分配一块新的内核栈（内容清零）
    pub fn new() -> Self {
        let layout = Self::layout();
        // SAFETY: layout 大小非零
        let ptr = unsafe { alloc(layout) };
        let base = match NonNull::new(ptr) {
            Some(p) => p,
            None => handle_alloc_error(layout),
        };
        // SAFETY: 刚分配的 KERNEL_STACK_SIZE 字节
        unsafe { core::ptr::write_bytes(base.as_ptr(), 0, KERNEL_STACK_SIZE) };
        Self { base }
    }

    /// 栈底（最低地址）
    pub fn base(&self) -> usize {
        self.base.as_ptr() as usize
    }

    /// 栈顶（最高地址，初始栈指针）
    pub fn top(&self) -> usize {
        self.base() + KERNEL_STACK_SIZE
    }

    pub fn contains(&self, addr: usize) -> bool {
        addr >= self.base() && addr <= self.top()
    }

    pub fn as_slice(&self) -> &[u8] {
        // SAFETY: base 指向 KERNEL_STACK_SIZE 字节的独占内存
        unsafe { core::slice::from_raw_parts(self.base.as_ptr(), KERNEL_STACK_SIZE) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        // SAFETY: 同上，且 &mut self 保证独占
        unsafe { core::slice::from_raw_parts_mut(self.base.as_ptr(), KERNEL_STACK_SIZE) }
    }
}

impl Drop for KernelStack {
    fn drop(&mut self) {
        // SAFETY: base 由 alloc(Self::layout()) 分配，只会在这里释放一次
        unsafe { dealloc(self.base.as_ptr(), Self::layout()) };
    }
}

/// 任务控制块
pub struct Task {
    pid: Pid,
    ppid: Pid,
    state: TaskState,

    /// 优先级，仅作记录，调度选择不使用
    priority: i32,

    /// 切换时保存的寄存器
    context: Context,

    /// 地址空间（由平台层释放）
    address_space: AddressSpace,

    kernel_stack: KernelStack,

    /// alarm 倒计时（滴答），0 表示未设置
    pub alarm: u32,

    /// 待处理信号
    pub pending: SigSet,

    /// 退出码，仅 Zombie 状态有效
    exit_code: i32,

    pub kernel_time: u64,
    pub user_time: u64,

    /// 当前占用的等待队列槽位
    wait_slot: Option<(&'static WaitQueue, usize)>,
}

impl Task {
    /// 构造 idle 任务 (PID 0)
    pub fn new_idle(space: AddressSpace) -> Self {
        let mut task = Self::blank(PID_IDLE, PID_IDLE, space);
        task.state = TaskState::Runnable;
        task
    }

    fn blank(pid: Pid, ppid: Pid, space: AddressSpace) -> Self {
        let kernel_stack = KernelStack::new();
        let mut context = Context::zeroed();
        context.set_stack_pointer(kernel_stack.top());

        Self {
            pid,
            ppid,
            state: TaskState::Initializing,
            priority: DEFAULT_PRIORITY,
            context,
            address_space: space,
            kernel_stack,
            alarm: 0,
            pending: SigSet::empty(),
            exit_code: 0,
            kernel_time: 0,
            user_time: 0,
            wait_slot: None,
        }
    }

    /// 以 `self` 为父进程构造子任务 (copy_process)
    ///
    /// 逐字段复制父进程，然后：
    /// - 分配新的内核栈并逐字节复制父进程的栈
    /// - 栈指针重定位到新栈的相同偏移
    /// - 返回值寄存器置 0（子进程从 fork 返回 0）
    /// - 时间统计、待处理信号与 alarm 清零
    ///
    /// 返回的任务处于 Initializing 状态
    pub fn duplicate(&self, pid: Pid, space: AddressSpace) -> Self {
        let mut child = Self::blank(pid, self.pid, space);
        child.priority = self.priority;

        child.kernel_stack.as_mut_slice().copy_from_slice(self.kernel_stack.as_slice());

        child.context = self.context.clone();
        let parent_sp = self.context.stack_pointer();
        let child_sp = if self.kernel_stack.contains(parent_sp) {
            child.kernel_stack.base() + (parent_sp - self.kernel_stack.base())
        } else {
            // 父进程还运行在启动栈上（idle），子进程从自己的栈顶开始
            child.kernel_stack.top()
        };
        child.context.set_stack_pointer(child_sp);
        child.context.set_return_value(0);

        child
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn ppid(&self) -> Pid {
        self.ppid
    }

    pub fn set_ppid(&mut self, ppid: Pid) {
        self.ppid = ppid;
    }

    pub fn is_idle(&self) -> bool {
        self.pid == PID_IDLE
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn set_state(&mut self, state: TaskState) {
        self.state = state;
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn address_space(&self) -> AddressSpace {
        self.address_space
    }

    pub fn kernel_stack(&self) -> &KernelStack {
        &self.kernel_stack
    }

    pub fn kernel_stack_mut(&mut self) -> &mut KernelStack {
        &mut self.kernel_stack
    }

    /// 退出码，仅在 Zombie 状态下有意义
    pub fn exit_code(&self) -> Option<i32> {
        if self.state == TaskState::Zombie {
            Some(self.exit_code)
        } else {
            None
        }
    }

    pub fn set_exit_code(&mut self, code: i32) {
        self.exit_code = code;
    }

    pub fn wait_slot(&self) -> Option<(&'static WaitQueue, usize)> {
        self.wait_slot
    }

    pub(crate) fn set_wait_slot(&mut self, slot: Option<(&'static WaitQueue, usize)>) {
        self.wait_slot = slot;
    }
}
