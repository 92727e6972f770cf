//! Clocks, timers and sleeps whose records carry guest-sized `time_t`.

use anyhow::Result;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{errno::Errno, syscall::Sysno};

/// `struct timezone`: two ints on every ABI.
const TIMEZONE: usize = 8;
const TIMER_ABSTIME: i32 = 1;

fn fd<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> u64 {
    args.int(i) as i64 as u64
}

pub(super) fn sys_gettimeofday<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut tv = args.record::<A::Timeval>(0)?;
    let tz = args.ptr(1, TIMEZONE)?;
    let ret = cx.call(Sysno::Gettimeofday, [tv.neutral(), tz, 0, 0, 0, 0])?;
    if ret == 0 {
        tv.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_settimeofday<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut tv = args.record::<A::Timeval>(0)?.input()?;
    let tz = args.ptr(1, TIMEZONE)?;
    cx.call(Sysno::Settimeofday, [tv.neutral(), tz, 0, 0, 0, 0])
}

pub(super) fn sys_getitimer<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut value = args.record::<A::Itimerval>(1)?;
    let ret = cx.call(Sysno::Getitimer, [fd(args, 0), value.neutral(), 0, 0, 0, 0])?;
    if ret == 0 {
        value.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_setitimer<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut new = args.record::<A::Itimerval>(1)?.input()?;
    let mut old = args.record::<A::Itimerval>(2)?;
    let ret = cx.call(
        Sysno::Setitimer,
        [fd(args, 0), new.neutral(), old.neutral(), 0, 0, 0],
    )?;
    if ret == 0 {
        old.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_nanosleep<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut req = args.record::<A::Timespec>(0)?.input()?;
    let mut rem = args.record::<A::Timespec>(1)?;
    let ret = cx.call(Sysno::Nanosleep, [req.neutral(), rem.neutral(), 0, 0, 0, 0])?;
    if ret == Errno(libc::EINTR).as_result() {
        rem.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_clock_nanosleep<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let flags = args.int(1);
    let mut req = args.record::<A::Timespec>(2)?.input()?;
    let mut rem = args.record::<A::Timespec>(3)?;
    let ret = cx.call(
        Sysno::ClockNanosleep,
        [fd(args, 0), flags as u64, req.neutral(), rem.neutral(), 0, 0],
    )?;
    if ret == Errno(libc::EINTR).as_result() && flags & TIMER_ABSTIME == 0 {
        rem.write_back()?;
    }
    Ok(ret)
}

/// `clock_gettime`, `clock_getres` and friends: one output timespec.
fn clock_output<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno) -> Result<i64> {
    let mut ts = args.record::<A::Timespec>(1)?;
    let ret = cx.call(sysno, [fd(args, 0), ts.neutral(), 0, 0, 0, 0])?;
    if ret == 0 {
        ts.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_clock_gettime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    clock_output(cx, args, Sysno::ClockGettime)
}

pub(super) fn sys_clock_getres<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    clock_output(cx, args, Sysno::ClockGetres)
}

pub(super) fn sys_sched_rr_get_interval<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    clock_output(cx, args, Sysno::SchedRrGetInterval)
}

pub(super) fn sys_clock_settime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut ts = args.record::<A::Timespec>(1)?.input()?;
    cx.call(Sysno::ClockSettime, [fd(args, 0), ts.neutral(), 0, 0, 0, 0])
}

pub(super) fn sys_timer_create<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut sev = args.record::<A::Sigevent>(1)?.input()?;
    let id = args.ptr(2, size_of::<i32>())?;
    cx.call(Sysno::TimerCreate, [fd(args, 0), sev.neutral(), id, 0, 0, 0])
}

/// `timer_settime` and `timerfd_settime`: input and optional output
/// `itimerspec`.
fn settime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno) -> Result<i64> {
    let mut new = args.record::<A::Itimerspec>(2)?.input()?;
    let mut old = args.record::<A::Itimerspec>(3)?;
    let ret = cx.call(
        sysno,
        [fd(args, 0), args.int(1) as u64, new.neutral(), old.neutral(), 0, 0],
    )?;
    if ret == 0 {
        old.write_back()?;
    }
    Ok(ret)
}

fn gettime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno) -> Result<i64> {
    let mut cur = args.record::<A::Itimerspec>(1)?;
    let ret = cx.call(sysno, [fd(args, 0), cur.neutral(), 0, 0, 0, 0])?;
    if ret == 0 {
        cur.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_timer_settime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    settime(cx, args, Sysno::TimerSettime)
}

pub(super) fn sys_timer_gettime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    gettime(cx, args, Sysno::TimerGettime)
}

pub(super) fn sys_timerfd_settime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    settime(cx, args, Sysno::TimerfdSettime)
}

pub(super) fn sys_timerfd_gettime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    gettime(cx, args, Sysno::TimerfdGettime)
}

pub(super) fn sys_adjtimex<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut tx = args.record::<A::Timex>(0)?.input()?;
    let ret = cx.call(Sysno::Adjtimex, [tx.neutral(), 0, 0, 0, 0, 0])?;
    if ret >= 0 {
        tx.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_clock_adjtime<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut tx = args.record::<A::Timex>(1)?.input()?;
    let ret = cx.call(Sysno::ClockAdjtime, [fd(args, 0), tx.neutral(), 0, 0, 0, 0])?;
    if ret >= 0 {
        tx.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_times<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut tms = args.record::<A::Tms>(0)?;
    let ret = cx.call(Sysno::Times, [tms.neutral(), 0, 0, 0, 0, 0])?;
    if Errno::check(ret).is_ok() {
        tms.write_back()?;
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use crate::{
        abi::{self, ilp32},
        compound::exec::ExecConfig,
        errno::Errno,
        guest::ArmAdapter,
        memory,
        syscall::Sysno,
        testing::{RecordingHost, arena, peek, poke},
    };

    #[test]
    fn gettimeofday_narrows_the_result() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|_, a| {
            unsafe {
                poke(a[0], abi::Timeval {
                    tv_sec: 1_700_000_000,
                    tv_usec: 250,
                })
            };
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(78, [base as u32, 0, 0, 0, 0, 0]).unwrap(), 0);
        let tv: ilp32::Timeval = memory::load(&mem, base).unwrap();
        assert_eq!(tv, ilp32::Timeval {
            tv_sec: 1_700_000_000,
            tv_usec: 250
        });
    }

    #[test]
    fn sentinel_pointers_fault_without_a_host_call() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // gettimeofday(-1, NULL)
        assert_eq!(
            adapter.handle_trap(78, [u32::MAX, 0, 0, 0, 0, 0]).unwrap(),
            Errno::EFAULT.as_result()
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn null_records_stay_null() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // gettimeofday(NULL, NULL)
        adapter.handle_trap(78, [0; 6]).unwrap();
        assert_eq!(host.calls()[0].1, [0; 6]);
    }

    #[test]
    fn interrupted_sleeps_report_the_remainder() {
        let (mem, base) = arena();
        let req = ilp32::Timespec { tv_sec: 5, tv_nsec: 0 };
        memory::store(&mem, base, &req).unwrap();
        let host = RecordingHost::with(|sysno, a| {
            assert_eq!(sysno, Sysno::Nanosleep);
            let req: abi::Timespec = unsafe { peek(a[0]) };
            assert_eq!(req.tv_sec, 5);
            unsafe { poke(a[1], abi::Timespec { tv_sec: 2, tv_nsec: 7 }) };
            -(libc::EINTR as i64)
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        assert_eq!(
            adapter.handle_trap(162, [b, b + 8, 0, 0, 0, 0]).unwrap(),
            -(libc::EINTR as i64)
        );
        let rem: ilp32::Timespec = memory::load(&mem, base + 8).unwrap();
        assert_eq!(rem, ilp32::Timespec { tv_sec: 2, tv_nsec: 7 });
    }

    #[test]
    fn timer_settime_converts_both_records() {
        let (mem, base) = arena();
        let new = ilp32::Itimerspec {
            it_interval: ilp32::Timespec { tv_sec: 1, tv_nsec: 0 },
            it_value: ilp32::Timespec { tv_sec: 0, tv_nsec: 500 },
        };
        memory::store(&mem, base, &new).unwrap();
        let host = RecordingHost::with(|_, a| {
            let new: abi::Itimerspec = unsafe { peek(a[2]) };
            assert_eq!(new.it_value.tv_nsec, 500);
            unsafe { poke(a[3], new) };
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        // timer_settime(1, 0, new, old)
        assert_eq!(adapter.handle_trap(258, [1, 0, b, b + 16, 0, 0]).unwrap(), 0);
        let old: ilp32::Itimerspec = memory::load(&mem, base + 16).unwrap();
        assert_eq!(old, new);
    }
}
