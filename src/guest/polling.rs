//! `select`, `poll` and `epoll` families.

use anyhow::Result;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    abi::{self, Record, SigsetArg, Word},
    errno::Errno,
    memory,
    syscall::Sysno,
};

/// Largest descriptor count an `fd_set` is copied for; larger counts are
/// `EINVAL`.
const MAX_SELECT_FDS: usize = 1 << 20;
/// Upper bound on `maxevents` (`EP_MAX_EVENTS`).
const EP_MAX_EVENTS: usize = i32::MAX as usize / size_of::<abi::EpollEvent>();

/// One `fd_set` copied out of guest memory.
///
/// The bitmap is byte-identical on every little-endian ABI; only the
/// rounding of its length differs, so the host copy is padded to whole
/// 64-bit words.
struct FdSet {
    guest: u64,
    guest_len: usize,
    bits: Vec<u64>,
}

impl FdSet {
    fn load<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize, nfds: usize) -> Result<Option<Self>, Errno> {
        let guest = args.guest_addr(i)?;
        if guest == 0 {
            return Ok(None);
        }
        let word_bits = A::Word::BYTES * 8;
        let guest_len = nfds.div_ceil(word_bits) * A::Word::BYTES;
        let bytes = memory::read_bytes(args.mem, guest, guest_len)?;
        let mut bits = vec![0u64; nfds.div_ceil(64)];
        for (i, b) in bytes.iter().enumerate() {
            bits[i / 8] |= (*b as u64) << ((i % 8) * 8);
        }
        Ok(Some(Self {
            guest,
            guest_len,
            bits,
        }))
    }

    fn neutral(set: &mut Option<Self>) -> u64 {
        set.as_mut().map_or(0, |s| s.bits.as_mut_ptr() as usize as u64)
    }

    fn store<A: GuestAbi>(&self, args: &SyscallArgs<'_, A>) -> Result<(), Errno> {
        let bytes: Vec<u8> = self.bits.iter().flat_map(|w| w.to_le_bytes()).collect();
        memory::write_bytes(args.mem, self.guest, &bytes[..self.guest_len])?;
        Ok(())
    }
}

fn select_count<A: GuestAbi>(args: &SyscallArgs<'_, A>) -> Result<usize, Errno> {
    usize::try_from(args.int(0))
        .ok()
        .filter(|&n| n <= MAX_SELECT_FDS)
        .ok_or(Errno::EINVAL)
}

/// Run a select-style call over the three sets in registers 1 to 3; `rest`
/// supplies the timeout and mask words.
fn with_fd_sets<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
    sysno: Sysno,
    rest: [u64; 2],
) -> Result<i64> {
    let nfds = select_count(args)?;
    let mut sets = [
        FdSet::load(args, 1, nfds)?,
        FdSet::load(args, 2, nfds)?,
        FdSet::load(args, 3, nfds)?,
    ];
    let ret = cx.call(
        sysno,
        [
            nfds as u64,
            FdSet::neutral(&mut sets[0]),
            FdSet::neutral(&mut sets[1]),
            FdSet::neutral(&mut sets[2]),
            rest[0],
            rest[1],
        ],
    )?;
    if ret >= 0 {
        for set in sets.iter().flatten() {
            set.store(args)?;
        }
    }
    Ok(ret)
}

pub(super) fn sys_select<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut tv = args.record::<A::Timeval>(4)?.input()?;
    let ret = with_fd_sets(cx, args, Sysno::Select, [tv.neutral(), 0])?;
    // The kernel reports the unslept time even when interrupted.
    if ret >= 0 || ret == Errno(libc::EINTR).as_result() {
        tv.write_back()?;
    }
    Ok(ret)
}

/// Rebuild the `{ sigset pointer, size }` pair of `pselect6` with a host
/// pointer. `None` when the guest passed NULL.
fn sigset_arg<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> Result<Option<[usize; 2]>, Errno> {
    let addr = args.guest_addr(i)?;
    if addr == 0 {
        return Ok(None);
    }
    let arg: SigsetArg<A::Word> = memory::load(args.mem, addr)?;
    let ss: u64 = arg.ss.into();
    let len: u64 = arg.ss_len.into();
    let len = usize::try_from(len).map_err(|_| Errno::EINVAL)?;
    let host = if ss == 0 {
        0
    } else {
        memory::translate_range(args.mem, ss, len)?
    };
    Ok(Some([host, len]))
}

fn pselect<A: GuestAbi, T: Record<Neutral = abi::Timespec>>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    let mut ts = args.record::<T>(4)?.input()?;
    let mut sig = sigset_arg(args, 5)?;
    let sig_ptr = sig.as_mut().map_or(0, |s| s.as_mut_ptr() as usize as u64);
    let ret = with_fd_sets(cx, args, Sysno::Pselect6, [ts.neutral(), sig_ptr])?;
    if ret >= 0 || ret == Errno(libc::EINTR).as_result() {
        ts.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_pselect6<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    pselect::<A, A::Timespec>(cx, args)
}

pub(super) fn sys_pselect6_time64<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    pselect::<A, abi::Timespec>(cx, args)
}

pub(super) fn sys_ppoll<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let nfds = args.uint(1) as usize;
    let fds = args.ptr(0, nfds * size_of::<libc::pollfd>())?;
    let mut ts = args.record::<A::Timespec>(2)?.input()?;
    let sigmask = args.buf(3, 4)?;
    let ret = cx.call(
        Sysno::Ppoll,
        [fds, nfds as u64, ts.neutral(), sigmask, args.ulong(4), 0],
    )?;
    if ret >= 0 || ret == Errno(libc::EINTR).as_result() {
        ts.write_back()?;
    }
    Ok(ret)
}

pub(super) fn sys_epoll_ctl<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut event = args.record::<A::EpollEvent>(3)?.input()?;
    cx.call(
        Sysno::EpollCtl,
        [
            args.int(0) as i64 as u64,
            args.int(1) as i64 as u64,
            args.int(2) as i64 as u64,
            event.neutral(),
            0,
            0,
        ],
    )
}

/// Event buffer of the `epoll_wait` family: neutral records collected on
/// the host, converted into the guest array afterwards.
struct Events<A: GuestAbi> {
    guest: u64,
    host: Vec<abi::EpollEvent>,
    _abi: std::marker::PhantomData<A>,
}

impl<A: GuestAbi> Events<A> {
    fn new(args: &SyscallArgs<'_, A>) -> Result<Self, Errno> {
        let max = usize::try_from(args.int(2))
            .ok()
            .filter(|&n| n > 0 && n <= EP_MAX_EVENTS)
            .ok_or(Errno::EINVAL)?;
        let guest = args.guest_addr(1)?;
        memory::translate_range(args.mem, guest, max * size_of::<A::EpollEvent>())?;
        Ok(Self {
            guest,
            host: vec![abi::EpollEvent::default(); max],
            _abi: std::marker::PhantomData,
        })
    }

    fn neutral(&mut self) -> u64 {
        self.host.as_mut_ptr() as usize as u64
    }

    fn deliver(&self, args: &SyscallArgs<'_, A>, ret: i64) -> Result<(), Errno> {
        let ready = usize::try_from(ret).unwrap_or(0).min(self.host.len());
        for (i, event) in self.host[..ready].iter().enumerate() {
            let at = self.guest + (i * size_of::<A::EpollEvent>()) as u64;
            memory::store(args.mem, at, &A::EpollEvent::from_neutral(event))?;
        }
        Ok(())
    }
}

pub(super) fn sys_epoll_wait<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut events = Events::<A>::new(args)?;
    let ret = cx.call(
        Sysno::EpollWait,
        [
            args.int(0) as i64 as u64,
            events.neutral(),
            args.int(2) as i64 as u64,
            args.int(3) as i64 as u64,
            0,
            0,
        ],
    )?;
    events.deliver(args, ret)?;
    Ok(ret)
}

pub(super) fn sys_epoll_pwait<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut events = Events::<A>::new(args)?;
    let sigmask = args.buf(4, 5)?;
    let ret = cx.call(
        Sysno::EpollPwait,
        [
            args.int(0) as i64 as u64,
            events.neutral(),
            args.int(2) as i64 as u64,
            args.int(3) as i64 as u64,
            sigmask,
            args.ulong(5),
        ],
    )?;
    events.deliver(args, ret)?;
    Ok(ret)
}

pub(super) fn sys_epoll_pwait2<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let mut events = Events::<A>::new(args)?;
    let mut timeout = args.record::<abi::Timespec>(3)?.input()?;
    let sigmask = args.buf(4, 5)?;
    let ret = cx.call(
        Sysno::EpollPwait2,
        [
            args.int(0) as i64 as u64,
            events.neutral(),
            args.int(2) as i64 as u64,
            timeout.neutral(),
            sigmask,
            args.ulong(5),
        ],
    )?;
    events.deliver(args, ret)?;
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use crate::{
        abi::{self, SigsetArg, arm},
        compound::exec::ExecConfig,
        errno::Errno,
        guest::ArmAdapter,
        memory::{self, AddressSpace},
        syscall::Sysno,
        testing::{RecordingHost, arena, peek, poke},
    };

    #[test]
    fn select_copies_sets_both_ways() {
        let (mem, base) = arena();
        // fds 0 and 33 in the read set.
        memory::store(&mem, base, &[0x1u32, 0x2]).unwrap();
        let host = RecordingHost::with(|_, a| {
            let set: [u64; 1] = unsafe { peek(a[1]) };
            assert_eq!(set[0], 0x2_0000_0001);
            unsafe { poke(a[1], [0x2_0000_0000u64]) };
            1
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // select(40, set, NULL, NULL, NULL)
        assert_eq!(adapter.handle_trap(142, [40, base as u32, 0, 0, 0, 0]).unwrap(), 1);
        assert_eq!(memory::load::<[u32; 2], _>(&mem, base).unwrap(), [0, 2]);
        assert_eq!(host.calls()[0].1[2..], [0, 0, 0, 0]);
    }

    #[test]
    fn negative_select_counts_are_invalid() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(
            adapter.handle_trap(142, [u32::MAX, 0, 0, 0, 0, 0]).unwrap(),
            Errno::EINVAL.as_result()
        );
        assert!(host.calls().is_empty());
    }

    #[test]
    fn select_counts_past_the_cap_are_invalid() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let over = (super::MAX_SELECT_FDS + 1) as u32;
        assert_eq!(
            adapter.handle_trap(142, [over, base as u32, 0, 0, 0, 0]).unwrap(),
            Errno::EINVAL.as_result()
        );
        assert!(host.calls().is_empty());
        assert_eq!(
            adapter.handle_trap(142, [super::MAX_SELECT_FDS as u32, 0, 0, 0, 0, 0]).unwrap(),
            0
        );
    }

    #[test]
    fn pselect6_rebuilds_the_mask_pair() {
        let (mem, base) = arena();
        let b = base as u32;
        memory::store(&mem, base, &SigsetArg::<u32> { ss: b + 0x10, ss_len: 8 }).unwrap();
        let mask_host = mem.guest_to_host(base + 0x10).unwrap();
        let host = RecordingHost::with(move |sysno, a| {
            assert_eq!(sysno, Sysno::Pselect6);
            let pair: [usize; 2] = unsafe { peek(a[5]) };
            assert_eq!(pair, [mask_host, 8]);
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(335, [0, 0, 0, 0, 0, b]).unwrap(), 0);
    }

    #[test]
    fn epoll_wait_widens_ready_events() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|_, a| {
            let ready = [
                abi::EpollEvent { events: 1, data: 7 },
                abi::EpollEvent { events: 4, data: 9 },
            ];
            unsafe { poke(a[1], ready) };
            2
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // epoll_wait(3, events, 4, -1)
        let ret = adapter.handle_trap(252, [3, base as u32, 4, u32::MAX, 0, 0]).unwrap();
        assert_eq!(ret, 2);
        let events: [arm::EpollEvent; 2] = memory::load(&mem, base).unwrap();
        assert_eq!((events[0].events, events[0].data), (1, 7));
        assert_eq!((events[1].events, events[1].data), (4, 9));
        assert_eq!(host.calls()[0].1[3], -1i64 as u64);
    }

    #[test]
    fn epoll_wait_rejects_empty_buffers() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(
            adapter.handle_trap(252, [3, base as u32, 0, 0, 0, 0]).unwrap(),
            Errno::EINVAL.as_result()
        );
    }
}
