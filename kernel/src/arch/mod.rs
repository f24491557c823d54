//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!

//! 平台抽象层
//!
//! 调度核心不直接接触寄存器、页表或中断控制器，
//! 这些能力都由 [`Platform`] 提供：
//! - 中断屏蔽/恢复 (local_irq_save / local_irq_restore)
//! - 上下文切换 (__switch_to)
//! - 地址空间的复制、安装与释放 (dup_mm / switch_mm / mmput)
//! - 空闲等待 (wfi)
//!
//! 内核栈直接从全局分配器获取，分配失败由 `handle_alloc_error` 停机。

#[cfg(target_arch = "riscv64")]
pub mod riscv64;

/// 被中断时所处的特权级
///
/// 时钟中断据此把滴答计入 kernel_time 或 user_time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    Kernel,
    User,
}

/// 地址空间句柄
///
/// 对调度核心不透明，由平台层解释（例如页表根的物理地址）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressSpace(pub usize);

/// 任务切换时保存/恢复的寄存器
///
/// 布局与 riscv64 的 `cpu_switch_to` 一致：ra, sp, s0-s11, a0。
/// 调度核心只通过 `stack_pointer`/`set_stack_pointer`/`set_return_value`
/// 访问其中的值，其余字段只在平台层有意义。
#[repr(C)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// 返回地址
    pub ra: usize,
    /// 栈指针
    pub sp: usize,
    /// 被调用者保存寄存器 s0-s11
    pub s: [usize; 12],
    /// 返回值寄存器 (a0)
    pub a0: usize,
}

impl Context {
    pub const fn zeroed() -> Self {
        Self { ra: 0, sp: 0, s: [0; 12], a0: 0 }
    }

    pub fn stack_pointer(&self) -> usize {
        self.sp
    }

    pub fn set_stack_pointer(&mut self, sp: usize) {
        self.sp = sp;
    }

    pub fn return_value(&self) -> usize {
        self.a0
    }

    pub fn set_return_value(&mut self, value: usize) {
        self.a0 = value;
    }
}

/// 平台能力
///
/// 所有方法都可能在中断上下文中被调用
pub trait Platform: Sync {
    /// 屏蔽中断，返回屏蔽之前的使能状态
    fn irq_save(&self) -> bool;

    /// 恢复到 `irq_save` 之前的状态
    fn irq_restore(&self, was_enabled: bool);

    /// 打开中断并停机，直到下一个中断到来
    fn halt_until_interrupt(&self);

    /// 内核地址空间（idle 任务使用）
    fn kernel_space(&self) -> AddressSpace;

    /// 复制地址空间 (fork)
    fn clone_space(&self, space: AddressSpace) -> AddressSpace;

    /// 切换到给定地址空间
    fn install_space(&self, space: AddressSpace);

    /// 释放地址空间，每个句柄只会被释放一次
    fn release_space(&self, space: AddressSpace);

    /// 保存当前寄存器到 `save_into`，从 `resume` 恢复执行
    ///
    /// 返回时表示保存的上下文被重新调度
    ///
    /// # Safety
    ///
    /// 两个指针在切换期间必须有效，调用时中断必须处于屏蔽状态
    unsafe fn switch(&self, save_into: *mut Context, resume: *const Context);
}

/// 中断保护 RAII 守卫
///
/// 在作用域内屏蔽中断，离开时恢复到进入前的状态（而不是无条件打开）
///
/// 对应 Linux 的 local_irq_save()/local_irq_restore()
pub struct IrqGuard<'a, P: Platform + ?Sized> {
    platform: &'a P,
    was_enabled: bool,
}

impl<'a, P: Platform + ?Sized> IrqGuard<'a, P> {
    #[inline]
    pub fn new(platform: &'a P) -> Self {
        let was_enabled = platform.irq_save();
        Self { platform, was_enabled }
    }
}

impl<P: Platform + ?Sized> Drop for IrqGuard<'_, P> {
    #[inline]
    fn drop(&mut self) {
        self.platform.irq_restore(self.was_enabled);
    }
}
