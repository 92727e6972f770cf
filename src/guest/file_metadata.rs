//! `stat`, `statfs` and timestamp updates.

use anyhow::Result;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    abi::{self, Record, arm, arm64, ilp32},
    errno::Errno,
    memory,
    syscall::Sysno,
};

/// Size the guest must pass to `statfs64`.
const STATFS64_SIZE: u64 = size_of::<ilp32::Statfs64>() as u64;

fn fd<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> u64 {
    args.int(i) as i64 as u64
}

/// Run a neutral `stat` call into a scratch record and narrow it into the
/// pre-LFS layout at register `out`.
fn old_stat<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
    sysno: Sysno,
    first: u64,
    out: usize,
) -> Result<i64> {
    let guest = args.guest_addr(out)?;
    memory::translate_range(cx.mem(), guest, size_of::<ilp32::Stat>()).map_err(Errno::from)?;
    let mut st = abi::Stat::default();
    let ret = cx.call(sysno, [first, &mut st as *mut abi::Stat as usize as u64, 0, 0, 0, 0])?;
    if ret != 0 {
        return Ok(ret);
    }
    let narrow = ilp32::narrow_stat(&st)?;
    memory::store(cx.mem(), guest, &narrow).map_err(Errno::from)?;
    Ok(0)
}

pub(super) fn sys_stat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    old_stat(cx, args, Sysno::Stat, args.string(0)?, 1)
}

pub(super) fn sys_lstat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    old_stat(cx, args, Sysno::Lstat, args.string(0)?, 1)
}

pub(super) fn sys_fstat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    old_stat(cx, args, Sysno::Fstat, fd(args, 0), 1)
}

/// Issue a neutral stat call whose record argument sits in register `out`,
/// converting the scratch copy into `T` on success.
fn stat_into<A: GuestAbi, T: Record<Neutral = abi::Stat>>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
    sysno: Sysno,
    mut neutral: [u64; 6],
    out: usize,
) -> Result<i64> {
    let mut st = args.record::<T>(out)?;
    neutral[out] = st.neutral();
    let ret = cx.call(sysno, neutral)?;
    if ret == 0 {
        st.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_stat64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    stat_into::<A, arm::Stat64>(cx, args, Sysno::Stat, [args.string(0)?, 0, 0, 0, 0, 0], 1)
}

pub(super) fn sys_lstat64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    stat_into::<A, arm::Stat64>(cx, args, Sysno::Lstat, [args.string(0)?, 0, 0, 0, 0, 0], 1)
}

pub(super) fn sys_fstat64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    stat_into::<A, arm::Stat64>(cx, args, Sysno::Fstat, [fd(args, 0), 0, 0, 0, 0, 0], 1)
}

pub(super) fn sys_fstatat64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let head = [fd(args, 0), args.string(1)?, 0, args.int(3) as i64 as u64, 0, 0];
    stat_into::<A, arm::Stat64>(cx, args, Sysno::Newfstatat, head, 2)
}

/// ARM64 `newfstatat` with the asm-generic `struct stat`.
pub(super) fn sys_newfstatat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let head = [fd(args, 0), args.string(1)?, 0, args.int(3) as i64 as u64, 0, 0];
    stat_into::<A, arm64::Stat>(cx, args, Sysno::Newfstatat, head, 2)
}

/// ARM64 `fstat` with the asm-generic `struct stat`.
pub(super) fn sys_newfstat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    stat_into::<A, arm64::Stat>(cx, args, Sysno::Fstat, [fd(args, 0), 0, 0, 0, 0, 0], 1)
}

fn old_statfs<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno, first: u64) -> Result<i64> {
    let guest = args.guest_addr(1)?;
    memory::translate_range(cx.mem(), guest, size_of::<ilp32::Statfs>()).map_err(Errno::from)?;
    let mut st = abi::Statfs::default();
    let ret = cx.call(sysno, [first, &mut st as *mut abi::Statfs as usize as u64, 0, 0, 0, 0])?;
    if ret != 0 {
        return Ok(ret);
    }
    let narrow = ilp32::narrow_statfs(&st)?;
    memory::store(cx.mem(), guest, &narrow).map_err(Errno::from)?;
    Ok(0)
}

pub(super) fn sys_statfs<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    old_statfs(cx, args, Sysno::Statfs, args.string(0)?)
}

pub(super) fn sys_fstatfs<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    old_statfs(cx, args, Sysno::Fstatfs, fd(args, 0))
}

/// `statfs64(path, size, buf)`: the record moves to register 1 of the
/// neutral call.
fn statfs64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno, first: u64) -> Result<i64> {
    if args.ulong(1) != STATFS64_SIZE {
        return Ok(Errno::EINVAL.as_result());
    }
    let mut buf = args.record::<ilp32::Statfs64>(2)?;
    let ret = cx.call(sysno, [first, buf.neutral(), 0, 0, 0, 0])?;
    if ret == 0 {
        buf.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_statfs64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    statfs64(cx, args, Sysno::Statfs, args.string(0)?)
}

pub(super) fn sys_fstatfs64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    statfs64(cx, args, Sysno::Fstatfs, fd(args, 0))
}

pub(super) fn sys_utimes<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(0)?;
    let mut times = args.record::<[A::Timeval; 2]>(1)?.input()?;
    cx.call(Sysno::Utimes, [path, times.neutral(), 0, 0, 0, 0])
}

pub(super) fn sys_futimesat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(1)?;
    let mut times = args.record::<[A::Timeval; 2]>(2)?.input()?;
    cx.call(Sysno::Futimesat, [fd(args, 0), path, times.neutral(), 0, 0, 0])
}

pub(super) fn sys_utimensat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(1)?;
    let mut times = args.record::<[A::Timespec; 2]>(2)?.input()?;
    cx.call(
        Sysno::Utimensat,
        [fd(args, 0), path, times.neutral(), args.int(3) as i64 as u64, 0, 0],
    )
}
