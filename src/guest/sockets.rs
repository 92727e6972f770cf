//! Socket calls whose arguments carry guest pointers inside records.

use anyhow::Result;
use log::trace;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    abi::{self, Msghdr, Record},
    compound::msghdr::{Direction, HostMmsgs, HostMsghdr},
    errno::Errno,
    memory,
    syscall::Sysno,
};

const SOL_SOCKET: i32 = 1;
const SO_RCVTIMEO_OLD: i32 = 20;
const SO_SNDTIMEO_OLD: i32 = 21;
/// The 64-bit `time_t` spellings, understood by every host word size.
const SO_RCVTIMEO_NEW: i32 = 66;
const SO_SNDTIMEO_NEW: i32 = 67;

fn fd<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> u64 {
    args.int(i) as i64 as u64
}

/// The neutral option name for a timeout option carrying a guest `timeval`.
fn timeout_option(level: i32, name: i32) -> Option<i32> {
    match (level, name) {
        (SOL_SOCKET, SO_RCVTIMEO_OLD) => Some(SO_RCVTIMEO_NEW),
        (SOL_SOCKET, SO_SNDTIMEO_OLD) => Some(SO_SNDTIMEO_NEW),
        _ => None,
    }
}

pub(super) fn sys_send<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let buf = args.buf(1, 2)?;
    cx.call(
        Sysno::Sendto,
        [fd(args, 0), buf, args.ulong(2), args.int(3) as i64 as u64, 0, 0],
    )
}

pub(super) fn sys_recv<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let buf = args.buf(1, 2)?;
    cx.call(
        Sysno::Recvfrom,
        [fd(args, 0), buf, args.ulong(2), args.int(3) as i64 as u64, 0, 0],
    )
}

pub(super) fn sys_setsockopt<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let (level, name, optlen) = (args.int(1), args.int(2), args.uint(4));
    let Some(neutral_name) = timeout_option(level, name) else {
        let optval = args.buf(3, 4)?;
        return cx.call(
            Sysno::Setsockopt,
            [fd(args, 0), level as i64 as u64, name as i64 as u64, optval, optlen as u64, 0],
        );
    };
    if (optlen as usize) < size_of::<A::Timeval>() {
        return Ok(Errno::EINVAL.as_result());
    }
    let mut tv = args.record::<A::Timeval>(3)?.input()?;
    if tv.is_null() {
        return Ok(Errno::EFAULT.as_result());
    }
    cx.call(
        Sysno::Setsockopt,
        [
            fd(args, 0),
            level as i64 as u64,
            neutral_name as u64,
            tv.neutral(),
            size_of::<abi::Timeval>() as u64,
            0,
        ],
    )
}

pub(super) fn sys_getsockopt<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let (level, name) = (args.int(1), args.int(2));
    let optlen_addr = args.guest_addr(4)?;
    let optlen: u32 = memory::load(cx.mem(), optlen_addr).map_err(Errno::from)?;
    let Some(neutral_name) = timeout_option(level, name) else {
        let optval = args.ptr(3, optlen as usize)?;
        let optlen = args.ptr(4, size_of::<u32>())?;
        return cx.call(
            Sysno::Getsockopt,
            [fd(args, 0), level as i64 as u64, name as i64 as u64, optval, optlen, 0],
        );
    };
    if (optlen as usize) < size_of::<A::Timeval>() {
        return Ok(Errno::EINVAL.as_result());
    }
    let mut tv = args.record::<A::Timeval>(3)?;
    if tv.is_null() {
        return Ok(Errno::EFAULT.as_result());
    }
    let mut len = size_of::<abi::Timeval>() as u32;
    let ret = cx.call(
        Sysno::Getsockopt,
        [
            fd(args, 0),
            level as i64 as u64,
            neutral_name as u64,
            tv.neutral(),
            &mut len as *mut u32 as usize as u64,
            0,
        ],
    )?;
    if ret == 0 {
        tv.write_back()?;
        memory::store(cx.mem(), optlen_addr, &(size_of::<A::Timeval>() as u32)).map_err(Errno::from)?;
    }
    Ok(ret)
}

fn message<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
    sysno: Sysno,
    dir: Direction,
) -> Result<i64> {
    let addr = args.guest_addr(1)?;
    let mut guest: Msghdr<A::Word> = memory::load(cx.mem(), addr).map_err(Errno::from)?;
    let mut host = HostMsghdr::from_guest::<A::Word>(cx.mem(), &guest, dir)?;
    let mut raw = host.raw();
    let ret = cx.call(
        sysno,
        [
            fd(args, 0),
            &mut raw as *mut libc::msghdr as usize as u64,
            args.int(2) as i64 as u64,
            0,
            0,
            0,
        ],
    )?;
    if ret >= 0 && dir == Direction::Recv {
        host.write_back::<A::Word>(cx.mem(), &raw, &mut guest)?;
        memory::store(cx.mem(), addr, &guest).map_err(Errno::from)?;
    }
    Ok(ret)
}

pub(super) fn sys_sendmsg<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    message(cx, args, Sysno::Sendmsg, Direction::Send)
}

pub(super) fn sys_recvmsg<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    message(cx, args, Sysno::Recvmsg, Direction::Recv)
}

pub(super) fn sys_sendmmsg<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let addr = args.guest_addr(1)?;
    let mut msgs = HostMmsgs::<A::Word>::from_guest(cx.mem(), addr, args.uint(2) as usize, Direction::Send)?;
    let ret = cx.call(
        Sysno::Sendmmsg,
        [fd(args, 0), msgs.neutral(), msgs.len() as u64, args.uint(3) as u64, 0, 0],
    )?;
    if ret > 0 {
        msgs.write_back(cx.mem(), ret as usize)?;
    }
    Ok(ret)
}

fn recvmmsg<A: GuestAbi, T: Record<Neutral = abi::Timespec>>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    let addr = args.guest_addr(1)?;
    let mut msgs = HostMmsgs::<A::Word>::from_guest(cx.mem(), addr, args.uint(2) as usize, Direction::Recv)?;
    let mut timeout = args.record::<T>(4)?.input()?;
    trace!("recvmmsg of {} headers", msgs.len());
    let ret = cx.call(
        Sysno::Recvmmsg,
        [
            fd(args, 0),
            msgs.neutral(),
            msgs.len() as u64,
            args.uint(3) as u64,
            timeout.neutral(),
            0,
        ],
    )?;
    if ret > 0 {
        msgs.write_back(cx.mem(), ret as usize)?;
        timeout.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_recvmmsg<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    recvmmsg::<A, A::Timespec>(cx, args)
}

pub(super) fn sys_recvmmsg_time64<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    recvmmsg::<A, abi::Timespec>(cx, args)
}

#[cfg(test)]
mod tests {
    use crate::{
        abi::{self, Msghdr, ilp32},
        compound::exec::ExecConfig,
        errno::Errno,
        guest::ArmAdapter,
        memory::{self, AddressSpace},
        testing::{RecordingHost, arena, peek, poke},
    };

    fn msghdr(base: u64, iovlen: u32) -> Msghdr<u32> {
        Msghdr {
            msg_iov: base as u32 + 0x100,
            msg_iovlen: iovlen,
            ..Default::default()
        }
    }

    #[test]
    fn sendmsg_accepts_sixteen_iovecs() {
        let (mem, base) = arena();
        memory::store(&mem, base, &msghdr(base, 16)).unwrap();
        let host = RecordingHost::with(|_, a| {
            let raw: libc::msghdr = unsafe { peek(a[1]) };
            assert_eq!(raw.msg_iovlen as usize, 16);
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(296, [3, base as u32, 0, 0, 0, 0]).unwrap(), 0);
    }

    #[test]
    fn sendmsg_rejects_seventeen_iovecs() {
        let (mem, base) = arena();
        memory::store(&mem, base, &msghdr(base, 17)).unwrap();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(
            adapter.handle_trap(296, [3, base as u32, 0, 0, 0, 0]).unwrap(),
            Errno::EMSGSIZE.as_result()
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn recvmsg_updates_the_guest_header() {
        let (mem, base) = arena();
        let hdr = Msghdr::<u32> {
            msg_name: base as u32 + 0x200,
            msg_namelen: 16,
            ..msghdr(base, 1)
        };
        memory::store(&mem, base, &hdr).unwrap();
        let host = RecordingHost::with(|_, a| {
            let mut raw: libc::msghdr = unsafe { peek(a[1]) };
            raw.msg_namelen = 8;
            raw.msg_flags = libc::MSG_TRUNC;
            unsafe { poke(a[1], raw) };
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(297, [3, base as u32, 0, 0, 0, 0]).unwrap(), 0);
        let back: Msghdr<u32> = memory::load(&mem, base).unwrap();
        assert_eq!(back.msg_namelen, 8);
        assert_eq!(back.msg_flags, libc::MSG_TRUNC);
        assert_eq!(back.msg_name, hdr.msg_name);
    }

    #[test]
    fn timeout_options_use_wide_timevals() {
        let (mem, base) = arena();
        memory::store(&mem, base, &ilp32::Timeval { tv_sec: 2, tv_usec: 5 }).unwrap();
        let host = RecordingHost::with(|_, a| {
            assert_eq!(a[2], 66);
            assert_eq!(a[4], 16);
            let tv: abi::Timeval = unsafe { peek(a[3]) };
            assert_eq!(tv, abi::Timeval { tv_sec: 2, tv_usec: 5 });
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // setsockopt(3, SOL_SOCKET, SO_RCVTIMEO, tv, 8)
        assert_eq!(adapter.handle_trap(294, [3, 1, 20, base as u32, 8, 0]).unwrap(), 0);
        // A short option buffer is rejected.
        assert_eq!(
            adapter.handle_trap(294, [3, 1, 20, base as u32, 4, 0]).unwrap(),
            Errno::EINVAL.as_result()
        );
    }

    #[test]
    fn getsockopt_passes_other_options_through() {
        let (mem, base) = arena();
        memory::store(&mem, base, &4u32).unwrap();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        // getsockopt(3, SOL_SOCKET, SO_TYPE, val, len)
        adapter.handle_trap(295, [3, 1, 3, b + 8, b, 0]).unwrap();
        let call = host.calls()[0].1;
        assert_eq!(call[3], mem.guest_to_host(base + 8).unwrap() as u64);
        assert_eq!(call[4], mem.guest_to_host(base).unwrap() as u64);
    }
}
