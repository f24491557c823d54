//! RISC-V 64-bit 上下文切换
//!
//! 遵循 Linux 内核的上下文切换实现 (arch/riscv/kernel/entry.S: __switch_to)
//!
//! 只保存被调用者保存寄存器 (ra, sp, s0-s11) 和 a0；
//! 调用者保存寄存器已经由编译器在调用点保存。
//! fork 出的子进程第一次被切换到时，a0 被恢复为 0，
//! 从而在子进程中表现为 fork 返回 0。

use crate::arch::Context;

/// 上下文切换
///
/// 对应 Linux 内核的 __switch_to()
///
/// # Safety
///
/// - `save` 和 `resume` 必须指向有效的 [`Context`]，布局见其定义
/// - 调用时中断必须已经屏蔽
///
/// # 参数
///
/// - `save`: 保存当前寄存器的位置 (a0)
/// - `resume`: 要恢复的上下文 (a1)
#[unsafe(naked)]
#[no_mangle]
#[link_section = ".text.context_switch"]
pub unsafe extern "C" fn cpu_switch_to(save: *mut Context, resume: *const Context) {
    core::arch::naked_asm!(
        "sd ra, 0(a0)",
        "sd sp, 8(a0)",
        "sd s0, 16(a0)",
        "sd s1, 24(a0)",
        "sd s2, 32(a0)",
        "sd s3, 40(a0)",
        "sd s4, 48(a0)",
        "sd s5, 56(a0)",
        "sd s6, 64(a0)",
        "sd s7, 72(a0)",
        "sd s8, 80(a0)",
        "sd s9, 88(a0)",
        "sd s10, 96(a0)",
        "sd s11, 104(a0)",
        // 被保存的任务恢复时从 switch 返回，a0 没有意义
        "sd zero, 112(a0)",

        "ld ra, 0(a1)",
        "ld sp, 8(a1)",
        "ld s0, 16(a1)",
        "ld s1, 24(a1)",
        "ld s2, 32(a1)",
        "ld s3, 40(a1)",
        "ld s4, 48(a1)",
        "ld s5, 56(a1)",
        "ld s6, 64(a1)",
        "ld s7, 72(a1)",
        "ld s8, 80(a1)",
        "ld s9, 88(a1)",
        "ld s10, 96(a1)",
        "ld s11, 104(a1)",
        "ld a0, 112(a1)",

        "ret",
    );
}

// Context 的布局必须与上面的偏移一致
const _: () = {
    assert!(core::mem::size_of::<Context>() == 120);
    assert!(core::mem::offset_of!(Context, sp) == 8);
    assert!(core::mem::offset_of!(Context, s) == 16);
    assert!(core::mem::offset_of!(Context, a0) == 112);
};
