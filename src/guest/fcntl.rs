//! Open flags and the command-multiplexed calls: `open*`, `fcntl`, `ioctl`
//! and `prctl`.

use anyhow::Result;
use log::debug;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    abi::ilp32,
    errno::Errno,
    host::{F_GETLK64, F_OFD_GETLK, F_OFD_SETLK, F_OFD_SETLKW, F_SETLK64, F_SETLKW64},
    memory,
    syscall::{GuestArch, Sysno},
};

/// Open flags whose values differ between ARM and x86, as (guest, host).
const OPEN_FLAG_PAIRS: [(i32, i32); 4] = [
    (0o40000, 0o200000),  // O_DIRECTORY
    (0o100000, 0o400000), // O_NOFOLLOW
    (0o200000, 0o40000),  // O_DIRECT
    (0o400000, 0o100000), // O_LARGEFILE
];

const OPEN_FLAG_MASK: i32 = 0o740000;

pub fn open_flags_to_host(flags: i32) -> i32 {
    OPEN_FLAG_PAIRS
        .iter()
        .filter(|(guest, _)| flags & guest != 0)
        .fold(flags & !OPEN_FLAG_MASK, |out, (_, host)| out | host)
}

pub fn open_flags_to_guest(flags: i32) -> i32 {
    OPEN_FLAG_PAIRS
        .iter()
        .filter(|(_, host)| flags & host != 0)
        .fold(flags & !OPEN_FLAG_MASK, |out, (guest, _)| out | guest)
}

pub(super) fn sys_open<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(0)?;
    let flags = open_flags_to_host(args.int(1));
    cx.call(Sysno::Open, [path, flags as u64, args.uint(2) as u64, 0, 0, 0])
}

pub(super) fn sys_openat<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(1)?;
    let flags = open_flags_to_host(args.int(2));
    cx.call(
        Sysno::Openat,
        [args.int(0) as i64 as u64, path, flags as u64, args.uint(3) as u64, 0, 0],
    )
}

/// `struct open_how` as of its first version.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct OpenHow {
    flags: u64,
    mode: u64,
    resolve: u64,
}

pub(super) fn sys_openat2<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(1)?;
    let size = args.ulong(3);
    if size < size_of::<OpenHow>() as u64 {
        return Ok(Errno::EINVAL.as_result());
    }
    let mut how: OpenHow = memory::load(cx.mem(), args.guest_addr(2)?).map_err(Errno::from)?;
    how.flags = open_flags_to_host(how.flags as i32) as u32 as u64 | (how.flags & !0xffff_ffff);
    cx.call(
        Sysno::Openat2,
        [
            args.int(0) as i64 as u64,
            path,
            &how as *const OpenHow as usize as u64,
            size_of::<OpenHow>() as u64,
            0,
            0,
        ],
    )
}

const F_DUPFD: i32 = 0;
const F_GETFD: i32 = 1;
const F_SETFD: i32 = 2;
const F_GETFL: i32 = 3;
const F_SETFL: i32 = 4;
const F_GETLK: i32 = 5;
const F_SETLK: i32 = 6;
const F_SETLKW: i32 = 7;
const F_SETOWN: i32 = 8;
const F_GETOWN: i32 = 9;
const F_SETSIG: i32 = 10;
const F_GETSIG: i32 = 11;
const F_SETOWN_EX: i32 = 15;
const F_GETOWN_EX: i32 = 16;
const F_GETOWNER_UIDS: i32 = 17;
const F_SETLEASE: i32 = 1024;
const F_GETLEASE: i32 = 1025;
const F_NOTIFY: i32 = 1026;
const F_CANCELLK: i32 = 1029;
const F_DUPFD_CLOEXEC: i32 = 1030;
const F_SETPIPE_SZ: i32 = 1031;
const F_GETPIPE_SZ: i32 = 1032;
const F_ADD_SEALS: i32 = 1033;
const F_GET_SEALS: i32 = 1034;
const F_GET_RW_HINT: i32 = 1035;
const F_SET_RW_HINT: i32 = 1036;
const F_GET_FILE_RW_HINT: i32 = 1037;
const F_SET_FILE_RW_HINT: i32 = 1038;

/// Which `fcntl` entry point the guest used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FcntlCall {
    /// 32-bit `fcntl`: every lock command takes a 32-bit `struct flock`.
    Fcntl32,
    /// 32-bit `fcntl64`: the `*LK64` and OFD commands take `struct flock64`.
    Fcntl64,
    /// 64-bit `fcntl`: `struct flock` is already the 64-bit record.
    Native,
}

enum LockRecord {
    Narrow,
    Wide,
}

/// Neutral command and record layout of a lock command.
fn lock_command(call: FcntlCall, cmd: i32) -> Option<(i32, LockRecord)> {
    let (neutral, flock64) = match cmd {
        F_GETLK => (F_GETLK64, false),
        F_SETLK => (F_SETLK64, false),
        F_SETLKW => (F_SETLKW64, false),
        F_GETLK64 | F_SETLK64 | F_SETLKW64 if call == FcntlCall::Fcntl64 => (cmd, true),
        F_OFD_GETLK | F_OFD_SETLK | F_OFD_SETLKW => (cmd, call == FcntlCall::Fcntl64),
        _ => return None,
    };
    let record = if flock64 || call == FcntlCall::Native {
        LockRecord::Wide
    } else {
        LockRecord::Narrow
    };
    Some((neutral, record))
}

fn fcntl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, call: FcntlCall) -> Result<i64> {
    let fd = args.int(0) as i64 as u64;
    let cmd = args.int(1);
    let arg = args.ulong(2);

    if let Some((neutral, record)) = lock_command(call, cmd) {
        return match record {
            LockRecord::Wide => {
                let lock = args.ptr(2, size_of::<crate::abi::Flock64>())?;
                cx.call(Sysno::Fcntl, [fd, neutral as u64, lock, 0, 0, 0])
            }
            LockRecord::Narrow => {
                let mut lock = args.record::<ilp32::Flock>(2)?.input()?;
                let ret = cx.call(Sysno::Fcntl, [fd, neutral as u64, lock.neutral(), 0, 0, 0])?;
                if ret >= 0 && matches!(neutral, F_GETLK64 | F_OFD_GETLK) {
                    let wide = lock.get();
                    if i32::try_from(wide.l_start).is_err() || i32::try_from(wide.l_len).is_err() {
                        return Ok(Errno::EOVERFLOW.as_result());
                    }
                    lock.write_back()?;
                }
                Ok(ret)
            }
        };
    }

    match cmd {
        F_GETFL => {
            let ret = cx.call(Sysno::Fcntl, [fd, cmd as u64, 0, 0, 0, 0])?;
            Ok(if ret < 0 { ret } else { open_flags_to_guest(ret as i32) as i64 })
        }
        F_SETFL => {
            let flags = open_flags_to_host(arg as i32);
            cx.call(Sysno::Fcntl, [fd, cmd as u64, flags as u32 as u64, 0, 0, 0])
        }
        F_SETOWN_EX | F_GETOWN_EX | F_GETOWNER_UIDS | F_GET_RW_HINT | F_SET_RW_HINT
        | F_GET_FILE_RW_HINT | F_SET_FILE_RW_HINT => {
            let ptr = args.ptr(2, 8)?;
            cx.call(Sysno::Fcntl, [fd, cmd as u64, ptr, 0, 0, 0])
        }
        F_DUPFD | F_GETFD | F_SETFD | F_SETOWN | F_GETOWN | F_SETSIG | F_GETSIG | F_SETLEASE
        | F_GETLEASE | F_NOTIFY | F_CANCELLK | F_DUPFD_CLOEXEC | F_SETPIPE_SZ | F_GETPIPE_SZ
        | F_ADD_SEALS | F_GET_SEALS => cx.call(Sysno::Fcntl, [fd, cmd as u64, arg, 0, 0, 0]),
        _ => {
            debug!("{} fcntl: unknown command {cmd}", A::ARCH);
            Ok(Errno::EINVAL.as_result())
        }
    }
}

pub(super) fn sys_fcntl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let call = match A::ARCH {
        GuestArch::Arm => FcntlCall::Fcntl32,
        GuestArch::Arm64 => FcntlCall::Native,
    };
    fcntl(cx, args, call)
}

pub(super) fn sys_fcntl64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    fcntl(cx, args, FcntlCall::Fcntl64)
}

/// What the third `ioctl` argument points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IoctlArg {
    Value,
    Pointer(usize),
}

const TERMIOS: usize = 36;
const WINSIZE: usize = 8;
const INT: usize = 4;

/// Terminal and file requests predating the `_IOC` encoding.
fn legacy_ioctl(request: u32) -> Option<IoctlArg> {
    use IoctlArg::*;
    Some(match request {
        0x5401 => Pointer(TERMIOS),                        // TCGETS
        0x5402..=0x5404 => Pointer(TERMIOS),               // TCSETS, TCSETSW, TCSETSF
        0x5409..=0x540b => Value,                          // TCSBRK, TCXONC, TCFLSH
        0x540c | 0x540d => Value,                          // TIOCEXCL, TIOCNXCL
        0x540e => Value,                                   // TIOCSCTTY
        0x540f | 0x5410 => Pointer(INT),                   // TIOCGPGRP, TIOCSPGRP
        0x5411 => Pointer(INT),                            // TIOCOUTQ
        0x5413 | 0x5414 => Pointer(WINSIZE),               // TIOCGWINSZ, TIOCSWINSZ
        0x5415..=0x5418 => Pointer(INT),                   // TIOCMGET, TIOCMBIS, TIOCMBIC, TIOCMSET
        0x541b => Pointer(INT),                            // FIONREAD
        0x5421 => Pointer(INT),                            // FIONBIO
        0x5422 => Value,                                   // TIOCNOTTY
        0x5423 | 0x5424 => Pointer(INT),                   // TIOCSETD, TIOCGETD
        0x5429 => Pointer(INT),                            // TIOCGSID
        0x5441 => Value,                                   // TIOCGPTPEER
        0x5450 | 0x5451 => Value,                          // FIONCLEX, FIOCLEX
        0x5452 => Pointer(INT),                            // FIOASYNC
        0x5460 => Pointer(8),                              // FIOQSIZE
        _ => return None,
    })
}

/// Requests built with `_IOC`: direction in bits 30-31, size in 16-29.
fn encoded_ioctl(request: u32) -> Option<IoctlArg> {
    let dir = request >> 30;
    let size = ((request >> 16) & 0x3fff) as usize;
    match (dir, size) {
        (0, _) => None,
        (_, 0) => Some(IoctlArg::Value),
        _ => Some(IoctlArg::Pointer(size)),
    }
}

pub(super) fn sys_ioctl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let fd = args.int(0) as i64 as u64;
    let request = args.uint(1);
    let Some(kind) = legacy_ioctl(request).or_else(|| encoded_ioctl(request)) else {
        debug!("{} ioctl: unknown request {request:#x}", A::ARCH);
        return Ok(Errno::ENOTTY.as_result());
    };
    let arg = match kind {
        IoctlArg::Value => args.ulong(2),
        IoctlArg::Pointer(size) => args.ptr(2, size)?,
    };
    cx.call(Sysno::Ioctl, [fd, request as u64, arg, 0, 0, 0])
}

const TASK_COMM_LEN: usize = 16;

/// How `prctl` options use their arguments.
enum PrctlArgs {
    Values,
    /// The second argument points at this many bytes.
    Pointer(usize),
    /// Options that depend on guest CPU state or on guest-sized pointers.
    Rejected,
}

fn prctl_args(option: i32) -> PrctlArgs {
    use PrctlArgs::*;
    match option {
        2 | 37 => Pointer(INT),            // PR_GET_PDEATHSIG, PR_GET_CHILD_SUBREAPER
        15 | 16 => Pointer(TASK_COMM_LEN), // PR_SET_NAME, PR_GET_NAME
        1 | 3 | 4 | 7 | 8 | 13 | 14 | 21 | 23 | 24 | 27..=34 | 36 | 38 | 39 | 41 | 42 | 47 | 52
        | 53 | 57 | 58 | 65 | 66 => Values,
        _ => Rejected,
    }
}

pub(super) fn sys_prctl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let option = args.int(0);
    let arg2 = match prctl_args(option) {
        PrctlArgs::Values => args.ulong(1),
        PrctlArgs::Pointer(size) => args.ptr(1, size)?,
        PrctlArgs::Rejected => {
            debug!("{} prctl: option {option} rejected", A::ARCH);
            return Ok(Errno::EINVAL.as_result());
        }
    };
    cx.call(
        Sysno::Prctl,
        [option as u64, arg2, args.ulong(2), args.ulong(3), args.ulong(4), 0],
    )
}
