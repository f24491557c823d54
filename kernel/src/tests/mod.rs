//! 单元测试模块
//!
//! 测试在宿主机上运行（`cargo test -p taskcore`），平台层由 [`MockPlatform`] 代替：
//! 它记录中断状态、切换次数和地址空间操作。
//!
//! 模拟平台的 `switch` 立即返回，所以调度之后的代码就是
//! “以被选中任务的身份”继续执行的：`getpid()` 返回的是新任务。

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use spin::Mutex;

use crate::arch::{AddressSpace, Context, Platform};
use crate::process::{Pid, WaitQueue};
use crate::sched::Scheduler;

pub mod scheduler;
pub mod sleep_wakeup;

pub const KERNEL_SPACE: AddressSpace = AddressSpace(0x1000);

pub struct MockPlatform {
    irq_enabled: AtomicBool,
    switches: AtomicUsize,
    /// 在中断打开时发生的切换次数，应当始终为 0
    unmasked_switches: AtomicUsize,
    halts: AtomicUsize,
    installed: AtomicUsize,
    next_space: AtomicUsize,
    cloned: Mutex<Vec<AddressSpace>>,
    released: Mutex<Vec<AddressSpace>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self {
            irq_enabled: AtomicBool::new(true),
            switches: AtomicUsize::new(0),
            unmasked_switches: AtomicUsize::new(0),
            halts: AtomicUsize::new(0),
            installed: AtomicUsize::new(KERNEL_SPACE.0),
            next_space: AtomicUsize::new(0x2000),
            cloned: Mutex::new(Vec::new()),
            released: Mutex::new(Vec::new()),
        }
    }

    pub fn irq_enabled(&self) -> bool {
        self.irq_enabled.load(Ordering::SeqCst)
    }

    pub fn set_irq_enabled(&self, enabled: bool) {
        self.irq_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn switches(&self) -> usize {
        self.switches.load(Ordering::SeqCst)
    }

    pub fn unmasked_switches(&self) -> usize {
        self.unmasked_switches.load(Ordering::SeqCst)
    }

    pub fn halts(&self) -> usize {
        self.halts.load(Ordering::SeqCst)
    }

    pub fn installed(&self) -> AddressSpace {
        AddressSpace(self.installed.load(Ordering::SeqCst))
    }

    pub fn cloned(&self) -> Vec<AddressSpace> {
        self.cloned.lock().clone()
    }

    pub fn released(&self) -> Vec<AddressSpace> {
        self.released.lock().clone()
    }
}

impl Platform for MockPlatform {
    fn irq_save(&self) -> bool {
        self.irq_enabled.swap(false, Ordering::SeqCst)
    }

    fn irq_restore(&self, was_enabled: bool) {
        if was_enabled {
            self.irq_enabled.store(true, Ordering::SeqCst);
        }
    }

    fn halt_until_interrupt(&self) {
        self.halts.fetch_add(1, Ordering::SeqCst);
        self.irq_enabled.store(true, Ordering::SeqCst);
    }

    fn kernel_space(&self) -> AddressSpace {
        KERNEL_SPACE
    }

    fn clone_space(&self, _space: AddressSpace) -> AddressSpace {
        let space = AddressSpace(self.next_space.fetch_add(0x1000, Ordering::SeqCst));
        self.cloned.lock().push(space);
        space
    }

    fn install_space(&self, space: AddressSpace) {
        self.installed.store(space.0, Ordering::SeqCst);
    }

    fn release_space(&self, space: AddressSpace) {
        self.released.lock().push(space);
    }

    unsafe fn switch(&self, save_into: *mut Context, resume: *const Context) {
        assert!(!save_into.is_null() && !resume.is_null());
        self.switches.fetch_add(1, Ordering::SeqCst);
        if self.irq_enabled() {
            self.unmasked_switches.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// 初始化好的调度器，当前任务是 idle
pub fn boot() -> Scheduler<MockPlatform> {
    let sched = Scheduler::new(MockPlatform::new());
    sched.init();
    sched
}

/// 从 idle fork 出 `n` 个任务，返回它们的 PID
pub fn spawn(sched: &Scheduler<MockPlatform>, n: usize) -> Vec<Pid> {
    (0..n).map(|_| sched.fork()).collect()
}

/// 等待队列必须活得比等待者长
pub fn leak_queue() -> &'static WaitQueue {
    Box::leak(Box::new(WaitQueue::new()))
}

#[test]
fn log_level_parsing() {
    use crate::logger::parse_level;
    use log::LevelFilter;

    assert_eq!(parse_level("trace"), LevelFilter::Trace);
    assert_eq!(parse_level("debug"), LevelFilter::Debug);
    assert_eq!(parse_level("warn"), LevelFilter::Warn);
    assert_eq!(parse_level("off"), LevelFilter::Off);
    assert_eq!(parse_level("bogus"), LevelFilter::Info);
}

static CAPTURED: Mutex<Vec<u8>> = Mutex::new(Vec::new());

fn capture(c: u8) {
    CAPTURED.lock().push(c);
}

#[test]
fn println_goes_through_console_sink() {
    crate::console::set_sink(capture);
    crate::println!("pid {}\nok", 7);

    let out = CAPTURED.lock().clone();
    assert_eq!(out, b"pid 7\r\nok\r\n");
}
