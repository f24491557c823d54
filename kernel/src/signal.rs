//! 信号
//!
//! 参照 Linux 的信号设计 (kernel/signal.c, include/linux/signal.h)，
//! 但只保留调度核心需要的部分：
//! - 每个任务一个待处理信号位图，信号 n 对应第 n-1 位
//! - 编号越小优先级越高，每次调度只投递最低编号的一个信号
//! - 没有用户态处理函数，投递即执行默认动作
//!
//! 对外接口使用 [`Signal`] 枚举，内部用 [`SigSet`] 位图存储。

use bitflags::bitflags;

/// 标准信号定义
///
/// 对应 Linux 的 signal 定义 (include/uapi/asm-generic/signal.h)
#[repr(u32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Signal {
    /// SIGHUP - 挂起
    SIGHUP = 1,
    /// SIGINT - 中断 (Ctrl+C)
    SIGINT = 2,
    /// SIGQUIT - 退出
    SIGQUIT = 3,
    /// SIGILL - 非法指令
    SIGILL = 4,
    /// SIGTRAP - 断点陷阱
    SIGTRAP = 5,
    /// SIGABRT - 异常终止
    SIGABRT = 6,
    /// SIGBUS - 总线错误
    SIGBUS = 7,
    /// SIGFPE - 浮点异常
    SIGFPE = 8,
    /// SIGKILL - 强制杀死
    SIGKILL = 9,
    /// SIGUSR1 - 用户定义信号1
    SIGUSR1 = 10,
    /// SIGSEGV - 段错误
    SIGSEGV = 11,
    /// SIGUSR2 - 用户定义信号2
    SIGUSR2 = 12,
    /// SIGPIPE - 管道破裂
    SIGPIPE = 13,
    /// SIGALRM - 定时器到期（sleep/alarm）
    SIGALRM = 14,
    /// SIGTERM - 终止
    SIGTERM = 15,
    /// SIGSTKFLT - 栈错误
    SIGSTKFLT = 16,
    /// SIGCHLD - 子进程退出
    SIGCHLD = 17,
    /// SIGCONT - 继续
    SIGCONT = 18,
    /// SIGSTOP - 停止
    SIGSTOP = 19,
    /// SIGTSTP - 终端停止 (Ctrl+Z)
    SIGTSTP = 20,
    /// SIGTTIN - 后台读
    SIGTTIN = 21,
    /// SIGTTOU - 后台写
    SIGTTOU = 22,
}

/// 最大信号编号
pub const SIGMAX: u32 = 22;

const ALL_SIGNALS: [Signal; SIGMAX as usize] = [
    Signal::SIGHUP, Signal::SIGINT, Signal::SIGQUIT, Signal::SIGILL,
    Signal::SIGTRAP, Signal::SIGABRT, Signal::SIGBUS, Signal::SIGFPE,
    Signal::SIGKILL, Signal::SIGUSR1, Signal::SIGSEGV, Signal::SIGUSR2,
    Signal::SIGPIPE, Signal::SIGALRM, Signal::SIGTERM, Signal::SIGSTKFLT,
    Signal::SIGCHLD, Signal::SIGCONT, Signal::SIGSTOP, Signal::SIGTSTP,
    Signal::SIGTTIN, Signal::SIGTTOU,
];

/// 信号的默认动作
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DefaultAction {
    /// 终止任务，退出码为 128 + 信号编号
    Terminate,
    /// 消费掉信号，不做其他处理（唤醒效果已经在 raise 时产生）
    Ignore,
}

impl Signal {
    /// 从原始编号构造
    pub fn from_raw(sig: u32) -> Option<Signal> {
        if sig == 0 || sig > SIGMAX {
            return None;
        }
        Some(ALL_SIGNALS[(sig - 1) as usize])
    }

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn default_action(self) -> DefaultAction {
        match self {
            Signal::SIGKILL | Signal::SIGTERM => DefaultAction::Terminate,
            _ => DefaultAction::Ignore,
        }
    }

    /// 被信号终止时的退出码
    pub fn exit_code(self) -> i32 {
        128 + self as i32
    }
}

bitflags! {
    /// 信号位图，信号 n 占第 n-1 位
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SigSet: u32 {
        const SIGHUP    = 1 << 0;
        const SIGINT    = 1 << 1;
        const SIGQUIT   = 1 << 2;
        const SIGILL    = 1 << 3;
        const SIGTRAP   = 1 << 4;
        const SIGABRT   = 1 << 5;
        const SIGBUS    = 1 << 6;
        const SIGFPE    = 1 << 7;
        const SIGKILL   = 1 << 8;
        const SIGUSR1   = 1 << 9;
        const SIGSEGV   = 1 << 10;
        const SIGUSR2   = 1 << 11;
        const SIGPIPE   = 1 << 12;
        const SIGALRM   = 1 << 13;
        const SIGTERM   = 1 << 14;
        const SIGSTKFLT = 1 << 15;
        const SIGCHLD   = 1 << 16;
        const SIGCONT   = 1 << 17;
        const SIGSTOP   = 1 << 18;
        const SIGTSTP   = 1 << 19;
        const SIGTTIN   = 1 << 20;
        const SIGTTOU   = 1 << 21;
    }
}

impl From<Signal> for SigSet {
    fn from(sig: Signal) -> Self {
        SigSet::from_bits_truncate(1 << (sig as u32 - 1))
    }
}

impl SigSet {
    pub fn add(&mut self, sig: Signal) {
        self.insert(SigSet::from(sig));
    }

    pub fn has(&self, sig: Signal) -> bool {
        self.contains(SigSet::from(sig))
    }

    /// 编号最小的待处理信号
    pub fn first(&self) -> Option<Signal> {
        if self.is_empty() {
            return None;
        }
        Signal::from_raw(self.bits().trailing_zeros() + 1)
    }

    /// 取出编号最小的待处理信号
    pub fn take_first(&mut self) -> Option<Signal> {
        let sig = self.first()?;
        self.remove(SigSet::from(sig));
        Some(sig)
    }
}
