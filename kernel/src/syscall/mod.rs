//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 系统调用分发
//!
//! 与架构无关的部分：陷入入口取出调用号和最多 5 个参数，
//! 交给 [`dispatch`]，把返回值写回返回值寄存器。
//!
//! 错误以负的 errno 返回：
//! - 未知调用号: -ENOSYS
//! - SIGNAL 的信号编号无效: -EINVAL
//! - SIGNAL 的目标是 0 号或不存在的进程: -ESRCH
//! - 没有挂接控制台时的 CONSOLE* 调用: -ENODEV

use crate::arch::{Context, Platform};
use crate::errno::Errno;
use crate::sched::Scheduler;
use crate::signal::Signal;

/// 系统调用参数个数
pub const SYSCALL_ARGS: usize = 5;

#[repr(usize)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SyscallNo {
    Null = 0,

    /// 控制台
    Console = 1,
    ConWrite = 2,
    ConRead = 3,
    ConFlush = 4,

    /// 进程操作
    Fork = 10,
    Sleep = 11,
    GetPid = 12,
    GetPpid = 13,
    Idle = 14,
    Exit = 15,
    Signal = 16,
}

impl SyscallNo {
    pub fn from_raw(nr: usize) -> Option<SyscallNo> {
        Some(match nr {
            0 => SyscallNo::Null,
            1 => SyscallNo::Console,
            2 => SyscallNo::ConWrite,
            3 => SyscallNo::ConRead,
            4 => SyscallNo::ConFlush,
            10 => SyscallNo::Fork,
            11 => SyscallNo::Sleep,
            12 => SyscallNo::GetPid,
            13 => SyscallNo::GetPpid,
            14 => SyscallNo::Idle,
            15 => SyscallNo::Exit,
            16 => SyscallNo::Signal,
            _ => return None,
        })
    }

    pub fn is_console(self) -> bool {
        matches!(
            self,
            SyscallNo::Console | SyscallNo::ConWrite | SyscallNo::ConRead | SyscallNo::ConFlush
        )
    }
}

/// 控制台驱动处理 CONSOLE* 调用
pub trait ConsoleRoute {
    fn route(&self, nr: SyscallNo, args: &[usize; SYSCALL_ARGS]) -> isize;
}

/// 分发一次系统调用
///
/// `frame` 是陷入入口保存的寄存器，其中 `ra` 指向陷入返回路径。
/// FORK 以它作为子进程的上下文，子进程因此从同一个系统调用返回 0。
pub fn dispatch<P: Platform>(
    sched: &Scheduler<P>,
    console: Option<&dyn ConsoleRoute>,
    frame: &Context,
    nr: usize,
    args: [usize; SYSCALL_ARGS],
) -> isize {
    let no = match SyscallNo::from_raw(nr) {
        Some(no) => no,
        None => {
            log::debug!("syscall: unknown number {}", nr);
            return Errno::NotImplemented.as_neg_isize();
        }
    };
    log::trace!("syscall: {:?} pid {}", no, sched.getpid());

    match no {
        SyscallNo::Null => 0,
        SyscallNo::Console | SyscallNo::ConWrite | SyscallNo::ConRead | SyscallNo::ConFlush => {
            sys_console(console, no, &args)
        }
        SyscallNo::Fork => sys_fork(sched, frame),
        SyscallNo::Sleep => sys_sleep(sched, args),
        SyscallNo::GetPid => sched.getpid() as isize,
        SyscallNo::GetPpid => sched.getppid() as isize,
        SyscallNo::Idle => sys_idle(sched),
        SyscallNo::Exit => sched.exit(args[0] as i32),
        SyscallNo::Signal => sys_signal(sched, args),
    }
}

fn sys_console(console: Option<&dyn ConsoleRoute>, no: SyscallNo, args: &[usize; SYSCALL_ARGS]) -> isize {
    match console {
        Some(route) => route.route(no, args),
        None => Errno::NoSuchDevice.as_neg_isize(),
    }
}

fn sys_fork<P: Platform>(sched: &Scheduler<P>, frame: &Context) -> isize {
    sched.save_context(frame);
    sched.fork() as isize
}

fn sys_sleep<P: Platform>(sched: &Scheduler<P>, args: [usize; SYSCALL_ARGS]) -> isize {
    sched.sleep(args[0] as u64);
    0
}

fn sys_idle<P: Platform>(sched: &Scheduler<P>) -> isize {
    sched.idle();
    0
}

fn sys_signal<P: Platform>(sched: &Scheduler<P>, args: [usize; SYSCALL_ARGS]) -> isize {
    let pid = args[0];
    let sig = match u32::try_from(args[1]).ok().and_then(Signal::from_raw) {
        Some(sig) => sig,
        None => return Errno::InvalidArgument.as_neg_isize(),
    };
    let pid = match u32::try_from(pid) {
        Ok(pid) => pid,
        Err(_) => return Errno::NoSuchProcess.as_neg_isize(),
    };

    if sched.raise(pid, sig) {
        0
    } else {
        Errno::NoSuchProcess.as_neg_isize()
    }
}
