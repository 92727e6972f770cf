//! Futexes. The fourth argument is a timeout pointer for the waiting
//! operations and a plain count for the requeueing ones.

use anyhow::Result;
use log::debug;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    abi::{self, Record},
    errno::Errno,
    memory,
    syscall::Sysno,
};

const FUTEX_PRIVATE_FLAG: i32 = 128;
const FUTEX_CLOCK_REALTIME: i32 = 256;

const FUTEX_WAIT: i32 = 0;
const FUTEX_WAKE: i32 = 1;
const FUTEX_REQUEUE: i32 = 3;
const FUTEX_CMP_REQUEUE: i32 = 4;
const FUTEX_WAKE_OP: i32 = 5;
const FUTEX_LOCK_PI: i32 = 6;
const FUTEX_UNLOCK_PI: i32 = 7;
const FUTEX_TRYLOCK_PI: i32 = 8;
const FUTEX_WAIT_BITSET: i32 = 9;
const FUTEX_WAKE_BITSET: i32 = 10;
const FUTEX_WAIT_REQUEUE_PI: i32 = 11;
const FUTEX_CMP_REQUEUE_PI: i32 = 12;
const FUTEX_LOCK_PI2: i32 = 13;

const FUTEX_WAITV_MAX: usize = 128;
const FUTEX2_SIZE_MASK: u32 = 3;

/// How an operation uses its fourth argument.
enum Fourth {
    Unused,
    Timeout,
    Count,
}

fn classify(cmd: i32) -> Option<(Fourth, bool)> {
    Some(match cmd {
        FUTEX_WAIT | FUTEX_WAIT_BITSET | FUTEX_LOCK_PI | FUTEX_LOCK_PI2 => (Fourth::Timeout, false),
        FUTEX_WAIT_REQUEUE_PI => (Fourth::Timeout, true),
        FUTEX_REQUEUE | FUTEX_CMP_REQUEUE | FUTEX_WAKE_OP | FUTEX_CMP_REQUEUE_PI => (Fourth::Count, true),
        FUTEX_WAKE | FUTEX_UNLOCK_PI | FUTEX_TRYLOCK_PI | FUTEX_WAKE_BITSET => (Fourth::Unused, false),
        _ => return None,
    })
}

fn futex<A: GuestAbi, T: Record<Neutral = abi::Timespec>>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    let op = args.int(1);
    let cmd = op & !(FUTEX_PRIVATE_FLAG | FUTEX_CLOCK_REALTIME);
    let Some((fourth, second_word)) = classify(cmd) else {
        debug!("unknown futex op {op:#x}");
        return Ok(Errno::ENOSYS.as_result());
    };
    let uaddr = args.ptr(0, 4)?;
    let uaddr2 = if second_word { args.ptr(4, 4)? } else { 0 };
    let mut timeout = match fourth {
        Fourth::Timeout => Some(args.record::<T>(3)?.input()?),
        _ => None,
    };
    let val2 = match fourth {
        Fourth::Timeout => timeout.as_mut().map_or(0, |t| t.neutral()),
        Fourth::Count => args.uint(3) as u64,
        Fourth::Unused => 0,
    };
    cx.call(
        Sysno::Futex,
        [uaddr, op as i64 as u64, args.uint(2) as u64, val2, uaddr2, args.uint(5) as u64],
    )
}

pub(super) fn sys_futex<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    futex::<A, A::Timespec>(cx, args)
}

pub(super) fn sys_futex_time64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    futex::<A, abi::Timespec>(cx, args)
}

/// `struct futex_waitv`, fixed-width on every architecture.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct FutexWaitv {
    val: u64,
    uaddr: u64,
    flags: u32,
    reserved: u32,
}

pub(super) fn sys_futex_waitv<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let count = args.uint(1) as usize;
    if count == 0 || count > FUTEX_WAITV_MAX {
        return Ok(Errno::EINVAL.as_result());
    }
    let base = args.guest_addr(0)?;
    let mut waiters = Vec::with_capacity(count);
    for i in 0..count {
        let at = base.wrapping_add((i * size_of::<FutexWaitv>()) as u64);
        let mut w: FutexWaitv = memory::load(cx.mem(), at).map_err(Errno::from)?;
        let size = 1usize << (w.flags & FUTEX2_SIZE_MASK);
        w.uaddr = memory::translate_range(cx.mem(), w.uaddr, size).map_err(Errno::from)? as u64;
        waiters.push(w);
    }
    let mut timeout = args.record::<abi::Timespec>(3)?.input()?;
    cx.call(
        Sysno::FutexWaitv,
        [
            waiters.as_mut_ptr() as usize as u64,
            count as u64,
            args.uint(2) as u64,
            timeout.neutral(),
            args.int(4) as i64 as u64,
            0,
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::FutexWaitv;
    use crate::{
        abi::{self, ilp32},
        compound::exec::ExecConfig,
        errno::Errno,
        guest::{Arm64Adapter, ArmAdapter},
        memory::{self, AddressSpace},
        syscall::Sysno,
        testing::{RecordingHost, arena, peek},
    };

    #[test]
    fn wait_converts_the_timeout() {
        let (mem, base) = arena();
        memory::store(&mem, base + 0x10, &ilp32::Timespec { tv_sec: 2, tv_nsec: 500 }).unwrap();
        let seen = std::rc::Rc::new(std::cell::Cell::new(abi::Timespec::default()));
        let sink = seen.clone();
        let host = RecordingHost::with(move |_, a| {
            sink.set(unsafe { peek(a[3]) });
            -(libc::ETIMEDOUT as i64)
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        // futex(uaddr, FUTEX_WAIT_PRIVATE, 0, timeout)
        let ret = adapter.handle_trap(240, [b, 128, 0, b + 0x10, 0, 0]).unwrap();
        assert_eq!(ret, -(libc::ETIMEDOUT as i64));
        assert_eq!(seen.get(), abi::Timespec { tv_sec: 2, tv_nsec: 500 });
        assert_eq!(host.calls()[0].1[0], mem.guest_to_host(base).unwrap() as u64);
    }

    #[test]
    fn wake_and_requeue_ignore_the_timeout_slot() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(1);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        // futex(uaddr, FUTEX_WAKE, 1, garbage)
        assert_eq!(adapter.handle_trap(240, [b, 1, 1, 0xdead_beef, 0, 0]).unwrap(), 1);
        // futex(uaddr, FUTEX_CMP_REQUEUE, 1, nr_requeue, uaddr2, val3)
        adapter.handle_trap(240, [b, 4, 1, 0x7fff_ffff, b + 4, 9]).unwrap();
        let calls = host.calls();
        assert_eq!(calls[0].1[3], 0);
        assert_eq!(calls[1].1[3], 0x7fff_ffff);
        assert_eq!(calls[1].1[4], mem.guest_to_host(base + 4).unwrap() as u64);
        assert_eq!(calls[1].1[5], 9);
    }

    #[test]
    fn unknown_operations_are_unsupported() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = Arm64Adapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(98, [base, 42, 0, 0, 0, 0]).unwrap(), Errno::ENOSYS.as_result());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn futex_time64_reads_a_wide_timeout() {
        let (mem, base) = arena();
        memory::store(&mem, base + 0x10, &abi::Timespec { tv_sec: 1 << 33, tv_nsec: 1 }).unwrap();
        let seen = std::rc::Rc::new(std::cell::Cell::new(abi::Timespec::default()));
        let sink = seen.clone();
        let host = RecordingHost::with(move |_, a| {
            sink.set(unsafe { peek(a[3]) });
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        // futex_time64(uaddr, FUTEX_WAIT_BITSET, 0, timeout, NULL, ~0)
        adapter.handle_trap(422, [b, 9, 0, b + 0x10, 0, u32::MAX]).unwrap();
        assert_eq!(host.sysnos(), vec![Sysno::Futex]);
        assert_eq!(seen.get().tv_sec, 1 << 33);
    }

    #[test]
    fn waitv_translates_every_address() {
        let (mem, base) = arena();
        let waiters = [
            FutexWaitv { val: 1, uaddr: base + 0x100, flags: 2, reserved: 0 },
            FutexWaitv { val: 2, uaddr: base + 0x200, flags: 2, reserved: 0 },
        ];
        memory::store(&mem, base, &waiters).unwrap();
        let host_addrs = [
            mem.guest_to_host(base + 0x100).unwrap() as u64,
            mem.guest_to_host(base + 0x200).unwrap() as u64,
        ];
        let seen = std::rc::Rc::new(std::cell::Cell::new([0u64; 2]));
        let sink = seen.clone();
        let host = RecordingHost::with(move |_, a| {
            let w: [FutexWaitv; 2] = unsafe { peek(a[0]) };
            sink.set([w[0].uaddr, w[1].uaddr]);
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        adapter.handle_trap(449, [base as u32, 2, 0, 0, 1, 0]).unwrap();
        assert_eq!(seen.get(), host_addrs);

        assert_eq!(
            adapter.handle_trap(449, [base as u32, 129, 0, 0, 1, 0]).unwrap(),
            Errno::EINVAL.as_result()
        );
    }
}
