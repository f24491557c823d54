//! 格式化输出
//!
//! `print!`/`println!` 把格式化结果逐字节交给 [`console::putchar`]，
//! 换行符前补一个 '\r'，串口终端需要它

use core::fmt::{self, Write};
use crate::console;

struct ConsoleWriter;

impl Write for ConsoleWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        s.bytes().for_each(|b| {
            if b == b'\n' {
                console::putchar(b'\r');
            }
            console::putchar(b);
        });
        Ok(())
    }
}

/// 输出到控制台，没有注册输出函数时丢弃
pub fn print(args: fmt::Arguments) {
    // ConsoleWriter 不会失败
    let _ = ConsoleWriter.write_fmt(args);
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::print::print(format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}
