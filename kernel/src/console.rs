//! 控制台输出
//!
//! 控制台设备本身由平台层提供，这里只保存一个字节输出函数。
//! 未注册输出函数之前，所有输出被丢弃。

use core::sync::atomic::{AtomicUsize, Ordering};

/// 字节输出函数类型
pub type PutcharFn = fn(u8);

static SINK: AtomicUsize = AtomicUsize::new(0);

/// 注册控制台输出函数
pub fn set_sink(sink: PutcharFn) {
    SINK.store(sink as usize, Ordering::Release);
}

/// 写入单个字符
pub fn putchar(c: u8) {
    let raw = SINK.load(Ordering::Acquire);
    if raw == 0 {
        return;
    }
    // SAFETY: SINK 只会被 set_sink 写入一个合法的 fn(u8)
    let sink: PutcharFn = unsafe { core::mem::transmute::<usize, PutcharFn>(raw) };
    sink(c);
}
