// 测试：等待队列上的睡眠与唤醒

use super::{boot, leak_queue, spawn};
use crate::config::{TICK_HZ, WAIT_QUEUE_SLOTS};
use crate::process::{TaskState, WaitQueue, PID_IDLE};
use crate::sched::ms_to_ticks;
use crate::signal::Signal;

static DISK: WaitQueue = WaitQueue::new();

#[test]
fn sleep_and_wake_round_trip() {
    let sched = boot();
    let pid = spawn(&sched, 1)[0];
    sched.reschedule();
    assert_eq!(sched.getpid(), pid);

    sched.sleep_interruptible(&DISK);
    // 没有其他任务可运行，切到 idle
    assert_eq!(sched.getpid(), PID_IDLE);
    assert_eq!(sched.task_info(pid).map(|t| t.state), Some(TaskState::InterruptibleWait));
    assert!(DISK.contains(pid));

    assert_eq!(sched.wake_up(&DISK), 1);
    assert!(DISK.is_empty());
    assert_eq!(sched.task_info(pid).map(|t| t.state), Some(TaskState::Runnable));
    assert!(sched.with_task(pid, |t| t.wait_slot().is_none()).unwrap());

    sched.reschedule();
    assert_eq!(sched.getpid(), pid);
}

#[test]
fn wake_up_on_empty_queue_is_noop() {
    let sched = boot();
    let queue = leak_queue();
    assert_eq!(sched.wake_up(queue), 0);
    assert_eq!(sched.platform().switches(), 0);
}

#[test]
fn wake_up_releases_every_waiter() {
    let sched = boot();
    let queue = leak_queue();
    let pids = spawn(&sched, 3);

    sched.reschedule();
    for _ in &pids {
        sched.sleep_uninterruptible(queue);
    }
    assert_eq!(sched.getpid(), PID_IDLE);
    assert_eq!(queue.occupied(), 3);

    assert_eq!(sched.wake_up(queue), 3);
    for pid in pids {
        assert_eq!(sched.task_info(pid).map(|t| t.state), Some(TaskState::Runnable));
    }
}

#[test]
#[should_panic(expected = "wait queue")]
fn full_queue_is_fatal() {
    let sched = boot();
    let queue = leak_queue();
    spawn(&sched, WAIT_QUEUE_SLOTS + 1);

    for _ in 0..=WAIT_QUEUE_SLOTS {
        if sched.getpid() == PID_IDLE {
            sched.reschedule();
        }
        sched.sleep_interruptible(queue);
    }
}

/// 不可中断的睡眠不会被信号打断
#[test]
fn uninterruptible_ignores_signals() {
    let sched = boot();
    let queue = leak_queue();
    let pid = spawn(&sched, 1)[0];
    sched.reschedule();
    sched.sleep_uninterruptible(queue);

    assert!(sched.raise(pid, Signal::SIGUSR1));
    let info = sched.task_info(pid).unwrap();
    assert_eq!(info.state, TaskState::UninterruptibleWait);
    assert!(info.pending.has(Signal::SIGUSR1));
    assert!(queue.contains(pid));

    sched.wake_up(queue);
    assert_eq!(sched.task_info(pid).map(|t| t.state), Some(TaskState::Runnable));
}

/// 信号把可中断的等待者提前唤醒，并让出它的槽位
#[test]
fn signal_interrupts_interruptible_wait() {
    let sched = boot();
    let queue = leak_queue();
    let pid = spawn(&sched, 1)[0];
    sched.reschedule();
    sched.sleep_interruptible(queue);

    sched.raise(pid, Signal::SIGUSR2);
    assert_eq!(sched.task_info(pid).map(|t| t.state), Some(TaskState::Runnable));
    assert!(!queue.contains(pid));
    assert_eq!(sched.wake_up(queue), 0);
}

#[test]
fn sleep_zero_only_yields() {
    let sched = boot();
    let pids = spawn(&sched, 2);
    sched.reschedule();

    sched.sleep(0);
    assert_eq!(sched.getpid(), pids[1]);
    let info = sched.task_info(pids[0]).unwrap();
    assert_eq!(info.state, TaskState::Runnable);
    assert_eq!(info.alarm, 0);
}

#[test]
fn timed_sleep_arms_alarm() {
    let sched = boot();
    let pid = spawn(&sched, 1)[0];
    sched.reschedule();

    sched.sleep(20);
    let info = sched.task_info(pid).unwrap();
    assert_eq!(info.state, TaskState::InterruptibleWait);
    assert_eq!(info.alarm, ms_to_ticks(20));
}

#[test]
fn milliseconds_round_up_to_ticks() {
    assert_eq!(ms_to_ticks(1000), TICK_HZ);
    assert!(ms_to_ticks(1) >= 1);
    assert_eq!(ms_to_ticks(0), 1);
    assert_eq!(ms_to_ticks(u64::MAX), u32::MAX);
}

#[test]
fn idle_halts_until_interrupt() {
    let sched = boot();
    sched.idle();
    sched.idle();
    assert_eq!(sched.platform().halts(), 2);
}

/// 阻塞前已挂起的信号让可中断睡眠立即返回，不占用槽位
#[test]
fn pending_signal_prevents_interruptible_block() {
    let sched = boot();
    let queue = leak_queue();
    let parent = spawn(&sched, 1)[0];
    sched.reschedule();
    let child = sched.fork();

    sched.raise(parent, Signal::SIGKILL);
    sched.sleep_interruptible(queue);

    assert!(!queue.contains(parent));
    assert_eq!(sched.getpid(), child);
    assert_eq!(sched.task_info(parent).map(|t| t.state), Some(TaskState::Runnable));

    // 父进程恢复运行时被 SIGKILL 终止
    sched.reschedule();
    assert!(sched.task_info(parent).is_none());
    assert_eq!(sched.getpid(), child);
}

#[test]
fn pending_signal_cuts_timed_sleep() {
    let sched = boot();
    let pid = spawn(&sched, 1)[0];
    sched.reschedule();

    sched.raise(pid, Signal::SIGUSR1);
    sched.sleep(500);

    assert_eq!(sched.getpid(), pid);
    let info = sched.task_info(pid).unwrap();
    assert_eq!(info.state, TaskState::Running);
    assert_eq!(info.alarm, 0);
    assert!(info.pending.is_empty());
}

#[test]
fn pending_signal_does_not_skip_uninterruptible_block() {
    let sched = boot();
    let queue = leak_queue();
    let pid = spawn(&sched, 1)[0];
    sched.reschedule();

    sched.raise(pid, Signal::SIGUSR1);
    sched.sleep_uninterruptible(queue);

    assert!(queue.contains(pid));
    assert_eq!(sched.task_info(pid).map(|t| t.state), Some(TaskState::UninterruptibleWait));
}

#[test]
fn init_clears_every_slot() {
    let queue = leak_queue();
    for pid in 1..=3 {
        queue.claim(pid);
    }
    assert_eq!(queue.occupied(), 3);

    queue.init();
    assert_eq!(queue.occupied(), 0);
    assert!(queue.is_empty());

    // 旧的持有者释放槽位，不能清掉新持有者
    assert_eq!(queue.claim(9), Some(0));
    queue.release(0, 1);
    assert!(queue.contains(9));
    queue.release(0, 9);
    assert!(queue.is_empty());
}
