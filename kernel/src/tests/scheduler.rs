// 测试：轮转调度、时间片与中断屏蔽

use super::{boot, spawn, MockPlatform};
use crate::arch::Ring;
use crate::config::TIME_SLICE_TICKS;
use crate::process::{TaskState, PID_IDLE};
use crate::sched::Scheduler;

/// 启动后只有 idle：Runnable，pick_next 选中它
#[test]
fn boot_leaves_only_idle() {
    let sched = boot();

    assert_eq!(sched.nr_tasks(), 1);
    assert_eq!(sched.getpid(), PID_IDLE);
    assert_eq!(sched.task_info(PID_IDLE).map(|t| t.state), Some(TaskState::Runnable));
    assert_eq!(sched.pick_next(), Some(PID_IDLE));
}

#[test]
fn first_reschedule_runs_idle() {
    let sched = boot();
    sched.reschedule();

    assert_eq!(sched.task_info(PID_IDLE).map(|t| t.state), Some(TaskState::Running));
    assert_eq!(sched.platform().switches(), 0, "idle rescheduling itself must not switch");
}

#[test]
fn uninitialized_scheduler_has_nothing_to_pick() {
    let sched = Scheduler::new(MockPlatform::new());
    assert_eq!(sched.pick_next(), None);
    sched.reschedule();
    assert_eq!(sched.getpid(), PID_IDLE);
}

/// A, B, C 各运行一次之后才会重复
#[test]
fn round_robin_visits_everyone() {
    let sched = boot();
    let pids = spawn(&sched, 3);

    let mut order = alloc::vec::Vec::new();
    for _ in 0..6 {
        sched.reschedule();
        order.push(sched.getpid());
    }

    assert_eq!(order, [pids[0], pids[1], pids[2], pids[0], pids[1], pids[2]]);
    assert!(!order.contains(&PID_IDLE), "idle must not run while others are runnable");
}

#[test]
fn only_current_is_running() {
    let sched = boot();
    spawn(&sched, 3);
    sched.reschedule();
    sched.reschedule();

    let running: alloc::vec::Vec<_> = sched
        .tasks()
        .into_iter()
        .filter(|t| t.state == TaskState::Running)
        .map(|t| t.pid)
        .collect();
    assert_eq!(running, [sched.getpid()]);
}

#[test]
fn falls_back_to_idle_when_nothing_runnable() {
    let sched = boot();
    let pids = spawn(&sched, 2);
    for &pid in &pids {
        sched.with_task_mut(pid, |t| t.set_state(TaskState::UninterruptibleWait));
    }

    assert_eq!(sched.pick_next(), Some(PID_IDLE));
    sched.reschedule();
    assert_eq!(sched.getpid(), PID_IDLE);
}

#[test]
fn lone_task_keeps_running() {
    let sched = boot();
    let pids = spawn(&sched, 1);
    sched.reschedule();
    let switches = sched.platform().switches();

    sched.reschedule();
    assert_eq!(sched.getpid(), pids[0]);
    assert_eq!(sched.platform().switches(), switches);
}

#[test]
fn switch_installs_next_address_space() {
    let sched = boot();
    let pids = spawn(&sched, 1);
    sched.reschedule();

    let space = sched.with_task(pids[0], |t| t.address_space());
    assert_eq!(Some(sched.platform().installed()), space);
}

/// 时间片用完才设置 need_resched；preempt 执行调度并清除标志
#[test]
fn quantum_expiry_preempts() {
    let sched = boot();
    let pids = spawn(&sched, 2);
    sched.reschedule();
    assert_eq!(sched.getpid(), pids[0]);

    for _ in 0..TIME_SLICE_TICKS - 1 {
        assert!(!sched.tick(Ring::Kernel));
        sched.preempt();
        assert_eq!(sched.getpid(), pids[0]);
    }
    assert_eq!(sched.quantum_remaining(), 1);

    assert!(sched.tick(Ring::Kernel));
    assert!(sched.need_resched());
    assert_eq!(sched.quantum_remaining(), TIME_SLICE_TICKS);

    sched.preempt();
    assert_eq!(sched.getpid(), pids[1]);
    assert!(!sched.need_resched());
}

#[test]
fn ticks_are_charged_to_current_ring() {
    let sched = boot();
    let pids = spawn(&sched, 1);
    sched.reschedule();

    sched.tick(Ring::User);
    sched.tick(Ring::User);
    sched.tick(Ring::Kernel);

    let info = sched.task_info(pids[0]).unwrap();
    assert_eq!(info.user_time, 2);
    assert_eq!(info.kernel_time, 1);
    assert_eq!(sched.ticks(), 3);
}

/// 每个操作结束后恢复进入前的中断状态，切换总是在屏蔽中断时发生
#[test]
fn interrupt_state_is_restored() {
    let sched = boot();
    assert!(sched.platform().irq_enabled());

    spawn(&sched, 2);
    sched.reschedule();
    sched.tick(Ring::Kernel);
    assert!(sched.platform().irq_enabled());

    sched.platform().set_irq_enabled(false);
    sched.fork();
    sched.reschedule();
    sched.getpid();
    assert!(!sched.platform().irq_enabled(), "masked state must stay masked");

    assert!(sched.platform().switches() > 0);
    assert_eq!(sched.platform().unmasked_switches(), 0);
}

#[test]
fn forced_reschedule_switches_on_preempt() {
    let sched = boot();
    let pids = spawn(&sched, 2);
    sched.reschedule();
    assert_eq!(sched.getpid(), pids[0]);

    sched.preempt();
    assert_eq!(sched.getpid(), pids[0]);

    sched.set_need_resched();
    sched.preempt();
    assert_eq!(sched.getpid(), pids[1]);
    assert!(!sched.need_resched());
}
