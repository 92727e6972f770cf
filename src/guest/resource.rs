//! Resource limits and usage, process waits and signal delivery records.

use anyhow::Result;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{errno::Errno, syscall::Sysno};

const PRIO_PROCESS: u64 = 0;

pub(super) fn sys_getrlimit<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut rlim = args.record::<A::Rlimit>(1)?;
    let ret = cx.call(Sysno::Getrlimit, [args.uint(0) as u64, rlim.neutral(), 0, 0, 0, 0])?;
    if ret == 0 {
        rlim.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_setrlimit<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut rlim = args.record::<A::Rlimit>(1)?.input()?;
    cx.call(Sysno::Setrlimit, [args.uint(0) as u64, rlim.neutral(), 0, 0, 0, 0])
}

pub(super) fn sys_getrusage<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut ru = args.record::<A::Rusage>(1)?;
    let ret = cx.call(Sysno::Getrusage, [args.int(0) as i64 as u64, ru.neutral(), 0, 0, 0, 0])?;
    if ret == 0 {
        ru.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_sysinfo<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut info = args.record::<A::Sysinfo>(0)?;
    let ret = cx.call(Sysno::Sysinfo, [info.neutral(), 0, 0, 0, 0, 0])?;
    if ret == 0 {
        info.write_back()?;
    }
    Ok(ret)
}

/// `nice(inc)` on top of the priority calls. The raw `getpriority` result
/// is `20 - nice`.
pub(super) fn sys_nice<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let inc = (args.int(0) as i64).clamp(-40, 40);
    let raw = Errno::check(cx.call(Sysno::Getpriority, [PRIO_PROCESS, 0, 0, 0, 0, 0])?)?;
    let nice = (20 - raw + inc).clamp(-20, 19);
    let ret = cx.call(Sysno::Setpriority, [PRIO_PROCESS, 0, nice as u64, 0, 0, 0])?;
    Ok(ret.min(0))
}

pub(super) fn sys_wait4<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let status = args.ptr(1, size_of::<i32>())?;
    let mut ru = args.record::<A::Rusage>(3)?;
    let ret = cx.call(
        Sysno::Wait4,
        [args.int(0) as i64 as u64, status, args.int(2) as i64 as u64, ru.neutral(), 0, 0],
    )?;
    if ret > 0 {
        ru.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_waitid<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut info = args.record::<A::Siginfo>(2)?;
    let mut ru = args.record::<A::Rusage>(4)?;
    let ret = cx.call(
        Sysno::Waitid,
        [
            args.int(0) as i64 as u64,
            args.int(1) as i64 as u64,
            info.neutral(),
            args.int(3) as i64 as u64,
            ru.neutral(),
            0,
        ],
    )?;
    if ret == 0 {
        info.write_back()?;
        ru.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_pidfd_send_signal<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    let mut info = args.record::<A::Siginfo>(2)?.input()?;
    cx.call(
        Sysno::PidfdSendSignal,
        [
            args.int(0) as i64 as u64,
            args.int(1) as i64 as u64,
            info.neutral(),
            args.uint(3) as u64,
            0,
            0,
        ],
    )
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
        testing::{RecordingHost, arena, poke},
    };

    #[test]
    fn getrlimit_narrows_infinity() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|_, a| {
            unsafe {
                poke(a[1], abi::Rlimit64 {
                    rlim_cur: 8 << 20,
                    rlim_max: abi::RLIM64_INFINITY,
                })
            };
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // ugetrlimit(RLIMIT_STACK, rlim)
        assert_eq!(adapter.handle_trap(191, [3, base as u32, 0, 0, 0, 0]).unwrap(), 0);
        let rlim: ilp32::Rlimit = memory::load(&mem, base).unwrap();
        assert_eq!(rlim.rlim_cur, 8 << 20);
        assert_eq!(rlim.rlim_max, ilp32::RLIM_INFINITY);
    }

    #[test]
    fn sentinel_records_fault() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        for (nr, arg) in [(191, 1), (116, 0)] {
            let mut words = [0u32; 6];
            words[arg] = u32::MAX;
            assert_eq!(adapter.handle_trap(nr, words).unwrap(), Errno::EFAULT.as_result());
        }
        assert!(host.calls().is_empty());
    }

    #[test]
    fn nice_adjusts_the_current_priority() {
        let (mem, _) = arena();
        // Current nice value 5.
        let host = RecordingHost::with(|sysno, _| if sysno == Sysno::Getpriority { 15 } else { 0 });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(34, [20, 0, 0, 0, 0, 0]).unwrap(), 0);
        let calls = host.calls();
        assert_eq!(calls[1].0, Sysno::Setpriority);
        assert_eq!(calls[1].1[2], 19);
    }

    #[test]
    fn wait4_reports_child_usage() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|_, a| {
            unsafe {
                poke(a[1], 0x100i32);
                poke(a[3], abi::Rusage {
                    ru_maxrss: 4096,
                    ..Default::default()
                });
            }
            42
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        assert_eq!(adapter.handle_trap(114, [u32::MAX, b, 0, b + 8, 0, 0]).unwrap(), 42);
        assert_eq!(memory::load::<i32, _>(&mem, base).unwrap(), 0x100);
        let ru: ilp32::Rusage = memory::load(&mem, base + 8).unwrap();
        assert_eq!(ru.ru_maxrss, 4096);
        assert_eq!(host.calls()[0].1[0], -1i64 as u64);
    }
}
