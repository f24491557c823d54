//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! RISC-V 64位平台
//!
//! 在 S 模式下实现 [`Platform`]：
//! - 中断屏蔽: sstatus.SIE (riscv crate)
//! - 上下文切换: [`context::cpu_switch_to`]
//! - 地址空间安装: satp + sfence.vma
//! - 控制台与定时器: SBI
//!
//! 页表的复制和释放由内存管理子系统提供，通过 [`MmOps`] 注入。

pub mod context;

use core::arch::asm;
use riscv::register::sstatus;

use crate::arch::{AddressSpace, Context, Platform, Ring};
use crate::config::{KERNEL_NAME, KERNEL_VERSION, TICK_HZ};
use crate::sched::Scheduler;
use crate::syscall::{self, ConsoleRoute, SYSCALL_ARGS};
use crate::{console, logger};

/// 定时器频率 (QEMU virt 平台)
pub const CLOCK_FREQ: u64 = 10_000_000;

/// 内存管理子系统提供的地址空间操作
pub struct MmOps {
    /// 复制地址空间 (dup_mm)
    pub clone: fn(AddressSpace) -> AddressSpace,
    /// 释放地址空间 (mmput)
    pub release: fn(AddressSpace),
}

pub struct RiscvPlatform {
    kernel_satp: usize,
    mm: MmOps,
}

impl RiscvPlatform {
    /// `kernel_satp` 是内核页表的 satp 值，也是 idle 任务的地址空间
    pub const fn new(kernel_satp: usize, mm: MmOps) -> Self {
        Self { kernel_satp, mm }
    }
}

#[inline]
fn read_satp() -> usize {
    let satp: usize;
    unsafe { asm!("csrr {}, satp", out(reg) satp, options(nomem, nostack)) };
    satp
}

impl Platform for RiscvPlatform {
    fn irq_save(&self) -> bool {
        let was_enabled = sstatus::read().sie();
        unsafe { sstatus::clear_sie() };
        was_enabled
    }

    fn irq_restore(&self, was_enabled: bool) {
        if was_enabled {
            unsafe { sstatus::set_sie() };
        }
    }

    fn halt_until_interrupt(&self) {
        // wfi 在 SIE=0 时也会因挂起的中断醒来，随后打开 SIE 让它进入
        unsafe {
            riscv::asm::wfi();
            sstatus::set_sie();
        }
    }

    fn kernel_space(&self) -> AddressSpace {
        AddressSpace(self.kernel_satp)
    }

    fn clone_space(&self, space: AddressSpace) -> AddressSpace {
        (self.mm.clone)(space)
    }

    fn install_space(&self, space: AddressSpace) {
        if read_satp() == space.0 {
            return;
        }
        unsafe {
            asm!("csrw satp, {}", in(reg) space.0);
            asm!("sfence.vma zero, zero");
        }
    }

    fn release_space(&self, space: AddressSpace) {
        if space.0 != self.kernel_satp {
            (self.mm.release)(space);
        }
    }

    unsafe fn switch(&self, save_into: *mut Context, resume: *const Context) {
        context::cpu_switch_to(save_into, resume);
    }
}

fn sbi_putchar(c: u8) {
    #[allow(deprecated)]
    sbi_rt::legacy::console_putchar(c as usize);
}

/// 注册 SBI 控制台并初始化日志
pub fn init_console() {
    console::set_sink(sbi_putchar);
    logger::init();
    log::info!("{} v{}", KERNEL_NAME, KERNEL_VERSION);
}

/// 设置下一次定时器中断，间隔为一个滴答
///
/// 对应 Linux 内核的 tick_sched_timer()
pub fn set_next_trigger() {
    let now = riscv::register::time::read() as u64;
    sbi_rt::set_timer(now + CLOCK_FREQ / TICK_HZ as u64);
}

/// 监管者时钟中断处理
///
/// `from_user` 来自 sstatus.SPP。时间片用完时在中断返回前调度。
pub fn on_timer_interrupt(sched: &Scheduler<RiscvPlatform>, from_user: bool) {
    set_next_trigger();
    let ring = if from_user { Ring::User } else { Ring::Kernel };
    sched.tick(ring);
    sched.preempt();
}

/// ecall 处理
///
/// 陷入入口在调用前把 ra/sp/s0-s11 保存到 `frame`，并把 ra 设为自己的返回路径，
/// 然后调用本函数；返回值写回 a0。fork 出的子进程经 `cpu_switch_to` 恢复 `frame`
/// 后直接走同一条返回路径，a0 为 0。
pub fn on_syscall(
    sched: &Scheduler<RiscvPlatform>,
    console: Option<&dyn ConsoleRoute>,
    frame: &Context,
    a7: usize,
    args: [usize; SYSCALL_ARGS],
) -> isize {
    syscall::dispatch(sched, console, frame, a7, args)
}
