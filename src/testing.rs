//! Test doubles for the host side.

use std::cell::RefCell;

use anyhow::Result;

use crate::{
    host::{HostKernel, NeutralArgs, NeutralHost},
    memory::GuestMemory,
    syscall::Sysno,
};

/// Guest address of the scratch mapping handed out by [`arena`].
pub const ARENA: u64 = 0x10000;
pub const ARENA_LEN: usize = 0x10000;

/// A guest memory with one zeroed 64 KiB segment at [`ARENA`].
pub fn arena() -> (GuestMemory, u64) {
    let mut mem = GuestMemory::new();
    mem.map(ARENA, ARENA_LEN).expect("map test arena");
    (mem, ARENA)
}

type KernelReply = Box<dyn Fn(usize, [usize; 6]) -> i64>;

/// A [`HostKernel`] that records every raw call and answers via a closure.
pub struct RecordingKernel {
    reply: KernelReply,
    calls: RefCell<Vec<(usize, [usize; 6])>>,
}

impl RecordingKernel {
    pub fn replying(value: i64) -> Self {
        Self::with(move |_, _| value)
    }

    pub fn with(reply: impl Fn(usize, [usize; 6]) -> i64 + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(usize, [usize; 6])> {
        self.calls.borrow().clone()
    }
}

impl HostKernel for RecordingKernel {
    unsafe fn syscall(&self, nr: usize, args: [usize; 6]) -> i64 {
        self.calls.borrow_mut().push((nr, args));
        (self.reply)(nr, args)
    }
}

type HostReply = Box<dyn Fn(Sysno, &NeutralArgs) -> i64>;

/// A [`NeutralHost`] that records neutral calls instead of issuing them.
pub struct RecordingHost {
    reply: HostReply,
    calls: RefCell<Vec<(Sysno, NeutralArgs)>>,
}

impl RecordingHost {
    pub fn replying(value: i64) -> Self {
        Self::with(move |_, _| value)
    }

    pub fn with(reply: impl Fn(Sysno, &NeutralArgs) -> i64 + 'static) -> Self {
        Self {
            reply: Box::new(reply),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(Sysno, NeutralArgs)> {
        self.calls.borrow().clone()
    }

    pub fn sysnos(&self) -> Vec<Sysno> {
        self.calls.borrow().iter().map(|(s, _)| *s).collect()
    }
}

impl NeutralHost for RecordingHost {
    fn dispatch(&self, sysno: Sysno, args: NeutralArgs) -> Result<i64> {
        self.calls.borrow_mut().push((sysno, args));
        Ok((self.reply)(sysno, &args))
    }
}

/// Write a value through a neutral pointer word, as a host kernel would.
///
/// # Safety
///
/// `addr` must point at a live `T`.
pub unsafe fn poke<T>(addr: u64, value: T) {
    unsafe { std::ptr::write_unaligned(addr as usize as *mut T, value) }
}

/// Read a value through a neutral pointer word.
///
/// # Safety
///
/// `addr` must point at a live `T`.
pub unsafe fn peek<T>(addr: u64) -> T {
    unsafe { std::ptr::read_unaligned(addr as usize as *const T) }
}
