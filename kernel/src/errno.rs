//! MIT License
//!
//! Copyright (c) 2026 Fei Wang
//!
//! 标准错误代码定义
//!
//! 和 include/uapi/asm-generic/errno.h 保持一致。
//! 调度核心本身没有可恢复错误，这里的错误码只由系统调用路由返回给调用者。

/// 标准错误代码
///
/// 使用方法：
/// ```rust
/// use taskcore::errno::Errno;
///
/// // 系统调用风格，返回负数
/// let ret = Errno::NoSuchProcess.as_neg_isize();
/// assert_eq!(ret, -3);
/// ```
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Errno {
    /// No such process (ESRCH, 3)
    NoSuchProcess = 3,

    /// No such device (ENODEV, 19)
    NoSuchDevice = 19,

    /// Invalid argument (EINVAL, 22)
    InvalidArgument = 22,

    /// Function not implemented (ENOSYS, 38)
    NotImplemented = 38,
}

impl Errno {
    /// 错误码的正值
    pub const fn as_i32(self) -> i32 {
        self as i32
    }

    /// 系统调用返回用的负值
    pub const fn as_neg_i32(self) -> i32 {
        -(self as i32)
    }

    pub const fn as_neg_isize(self) -> isize {
        -(self as i32) as isize
    }
}

pub const ESRCH: i32 = Errno::NoSuchProcess as i32;
pub const ENODEV: i32 = Errno::NoSuchDevice as i32;
pub const EINVAL: i32 = Errno::InvalidArgument as i32;
pub const ENOSYS: i32 = Errno::NotImplemented as i32;
