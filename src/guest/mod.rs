//! Guest-facing adapters.
//!
//! An [`Adapter`] takes the six raw argument registers of a trapped call,
//! translates guest pointers, converts guest records into their neutral
//! layouts and issues the call through a [`NeutralHost`]. Output records are
//! converted back on the way out.
//!
//! Calls the tables mark as custom are handled by the `sys_*` functions in
//! the submodules, grouped by subsystem the way the kernel groups them.

use std::{marker::PhantomData, mem};

use anyhow::{Result, bail};
use log::{trace, warn};

use crate::{
    abi::{self, Record, Word},
    compound::exec::ExecConfig,
    errno::Errno,
    host::{NeutralArgs, NeutralHost},
    memory::{self, AddressSpace, MemoryError},
    syscall::{self, ArgKind, GuestArch, Policy, Sysno},
};

mod arm;
mod arm64;
mod fcntl;
mod file_io;
mod file_metadata;
mod futex;
mod ipc;
mod mman;
mod polling;
mod process;
mod resource;
mod sockets;
mod time;
mod uid16;

pub use arm::Arm;
pub use arm64::Arm64;

/// Longest path accepted from the guest, terminator included.
pub const PATH_MAX: usize = 4096;

/// One guest ABI: its word size and the layouts of the records whose guest
/// form is not the neutral one.
pub trait GuestAbi: Sized + 'static {
    const ARCH: GuestArch;

    type Word: Word;

    type Timespec: Record<Neutral = abi::Timespec>;
    type Timeval: Record<Neutral = abi::Timeval>;
    type Itimerval: Record<Neutral = abi::Itimerval>;
    type Itimerspec: Record<Neutral = abi::Itimerspec>;
    type Tms: Record<Neutral = abi::Tms>;
    type Rlimit: Record<Neutral = abi::Rlimit64>;
    type Rusage: Record<Neutral = abi::Rusage>;
    type Sysinfo: Record<Neutral = abi::Sysinfo>;
    type Siginfo: Record<Neutral = abi::Siginfo>;
    type Sigevent: Record<Neutral = abi::Sigevent>;
    type EpollEvent: Record<Neutral = abi::EpollEvent>;
    type MqAttr: Record<Neutral = abi::MqAttr>;
    type Timex: Record<Neutral = abi::Timex>;
    type SemidDs: Record<Neutral = abi::SemidDs>;
    type MsqidDs: Record<Neutral = abi::MsqidDs>;
    type ShmidDs: Record<Neutral = abi::ShmidDs>;
    type Shminfo: Record<Neutral = abi::Shminfo>;
    type ShmInfo: Record<Neutral = abi::ShmInfo>;

    fn handlers() -> &'static HandlerTable<Self>;
}

/// The all-ones pointer value some callers use to mean "no valid address".
fn sentinel<A: GuestAbi>() -> u64 {
    A::Word::MAX.into()
}

/// The six argument registers of one call, with typed accessors.
///
/// Pointer accessors map `0` to the neutral NULL without touching memory
/// and reject the all-ones sentinel with `EFAULT`.
pub struct SyscallArgs<'a, A: GuestAbi> {
    words: [A::Word; 6],
    mem: &'a dyn AddressSpace,
}

impl<'a, A: GuestAbi> SyscallArgs<'a, A> {
    pub fn new(words: [A::Word; 6], mem: &'a dyn AddressSpace) -> Self {
        Self { words, mem }
    }

    pub fn raw(&self, i: usize) -> u64 {
        self.words[i].into()
    }

    pub fn int(&self, i: usize) -> i32 {
        self.raw(i) as i32
    }

    pub fn uint(&self, i: usize) -> u32 {
        self.raw(i) as u32
    }

    pub fn long(&self, i: usize) -> i64 {
        self.words[i].sign_extend()
    }

    pub fn ulong(&self, i: usize) -> u64 {
        self.raw(i)
    }

    /// A 64-bit value split over registers `lo` and `lo + 1`, low half first.
    pub fn pair(&self, lo: usize) -> u64 {
        (self.raw(lo) & 0xffff_ffff) | (self.raw(lo + 1) << 32)
    }

    /// A file offset passed as `pos_l, pos_h`: one register on 64-bit
    /// guests, a pair on 32-bit ones.
    pub fn offset(&self, i: usize) -> i64 {
        if A::Word::BYTES == 8 {
            self.raw(i) as i64
        } else {
            self.pair(i) as i64
        }
    }

    /// The guest address in register `i`, unchecked beyond the sentinel.
    pub fn guest_addr(&self, i: usize) -> Result<u64, Errno> {
        let addr = self.raw(i);
        if addr == sentinel::<A>() {
            return Err(Errno::EFAULT);
        }
        Ok(addr)
    }

    /// Host address of `size` bytes at the guest pointer in register `i`.
    pub fn ptr(&self, i: usize, size: usize) -> Result<u64, Errno> {
        match self.guest_addr(i)? {
            0 => Ok(0),
            addr => Ok(memory::translate_range(self.mem, addr, size)? as u64),
        }
    }

    /// Host address of the buffer in register `i` whose length is in
    /// register `len`.
    pub fn buf(&self, i: usize, len: usize) -> Result<u64, Errno> {
        let len = usize::try_from(self.ulong(len)).map_err(|_| Errno::EFAULT)?;
        self.ptr(i, len)
    }

    /// Host address of a guest pointer whose extent only the kernel knows.
    pub fn host_addr(&self, i: usize) -> Result<u64, Errno> {
        match self.guest_addr(i)? {
            0 => Ok(0),
            addr => self
                .mem
                .guest_to_host(addr)
                .map(|host| host as u64)
                .ok_or(Errno::EFAULT),
        }
    }

    /// Host address of the NUL-terminated path in register `i`.
    pub fn string(&self, i: usize) -> Result<u64, Errno> {
        match self.guest_addr(i)? {
            0 => Ok(0),
            addr => match memory::c_string(self.mem, addr, PATH_MAX) {
                Ok((host, _)) => Ok(host as u64),
                Err(MemoryError::Unterminated { .. }) => Err(Errno::ENAMETOOLONG),
                Err(err) => Err(err.into()),
            },
        }
    }

    /// A guest record in register `i`, checked to be fully mapped.
    pub fn record<T: Record>(&self, i: usize) -> Result<RecordPtr<'a, T>, Errno> {
        let guest = self.guest_addr(i)?;
        if guest != 0 {
            memory::translate_range(self.mem, guest, mem::size_of::<T>())?;
        }
        Ok(RecordPtr {
            mem: self.mem,
            guest,
            scratch: T::Neutral::default(),
        })
    }
}

/// A guest record pointer paired with a neutral scratch copy that the host
/// reads from or writes into.
pub struct RecordPtr<'a, T: Record> {
    mem: &'a dyn AddressSpace,
    guest: u64,
    scratch: T::Neutral,
}

impl<T: Record> RecordPtr<'_, T> {
    pub fn is_null(&self) -> bool {
        self.guest == 0
    }

    /// Load the guest record into the scratch copy.
    pub fn input(mut self) -> Result<Self, Errno> {
        if !self.is_null() {
            let guest: T = memory::load(self.mem, self.guest)?;
            self.scratch = guest.to_neutral();
        }
        Ok(self)
    }

    /// The scratch copy as a neutral pointer word, NULL for a NULL guest
    /// pointer.
    pub fn neutral(&mut self) -> u64 {
        if self.is_null() {
            0
        } else {
            &mut self.scratch as *mut T::Neutral as usize as u64
        }
    }

    /// Convert the scratch copy back into the guest record.
    pub fn write_back(&self) -> Result<(), Errno> {
        if !self.is_null() {
            memory::store(self.mem, self.guest, &T::from_neutral(&self.scratch))?;
        }
        Ok(())
    }

    pub fn get(&self) -> &T::Neutral {
        &self.scratch
    }

    pub fn get_mut(&mut self) -> &mut T::Neutral {
        &mut self.scratch
    }
}

/// A custom call converter.
pub type Handler<A> = fn(&Adapter<'_, A>, &SyscallArgs<'_, A>) -> Result<i64>;

/// Custom converters of one guest ABI, indexed by [`Sysno`].
pub struct HandlerTable<A: GuestAbi> {
    slots: Vec<Option<Handler<A>>>,
}

impl<A: GuestAbi> HandlerTable<A> {
    pub fn empty() -> Self {
        Self {
            slots: vec![None; Sysno::COUNT],
        }
    }

    pub fn insert(&mut self, sysno: Sysno, handler: Handler<A>) {
        self.slots[sysno as usize] = Some(handler);
    }

    pub fn get(&self, sysno: Sysno) -> Option<Handler<A>> {
        self.slots[sysno as usize]
    }

    pub fn covers(&self, sysno: Sysno) -> bool {
        self.get(sysno).is_some()
    }
}

/// Build a [`HandlerTable`] from `Sysno => handler` pairs.
macro_rules! handlers {
    ($abi:ty; $($sysno:ident => $handler:path),* $(,)?) => {{
        let mut table = $crate::guest::HandlerTable::<$abi>::empty();
        $(table.insert($crate::syscall::Sysno::$sysno, $handler);)*
        table
    }};
}

pub(crate) use handlers;

/// Whether `sysno` has a custom converter on `arch`.
pub fn has_handler(arch: GuestArch, sysno: Sysno) -> bool {
    match arch {
        GuestArch::Arm => Arm::handlers().covers(sysno),
        GuestArch::Arm64 => Arm64::handlers().covers(sysno),
    }
}

/// Translates the calls of one guest ABI.
pub struct Adapter<'a, A: GuestAbi> {
    mem: &'a dyn AddressSpace,
    host: &'a dyn NeutralHost,
    exec: &'a ExecConfig,
    _abi: PhantomData<A>,
}

pub type ArmAdapter<'a> = Adapter<'a, Arm>;
pub type Arm64Adapter<'a> = Adapter<'a, Arm64>;

impl<'a, A: GuestAbi> Adapter<'a, A> {
    pub fn new(mem: &'a dyn AddressSpace, host: &'a dyn NeutralHost, exec: &'a ExecConfig) -> Self {
        Self {
            mem,
            host,
            exec,
            _abi: PhantomData,
        }
    }

    pub fn mem(&self) -> &'a dyn AddressSpace {
        self.mem
    }

    pub fn exec_config(&self) -> &'a ExecConfig {
        self.exec
    }

    /// Entry point for the CPU loop: resolve the raw number and run the call.
    ///
    /// Returns the value for the guest result register. `Err` is fatal.
    pub fn handle_trap(&self, raw: u32, words: [A::Word; 6]) -> Result<i64> {
        let sysno = syscall::resolve(A::ARCH, raw)?;
        self.adapt(sysno, words)
    }

    pub fn adapt(&self, sysno: Sysno, words: [A::Word; 6]) -> Result<i64> {
        let args = SyscallArgs::<A>::new(words, self.mem);
        let outcome = match syscall::policy_for(A::ARCH, sysno) {
            Policy::Passthrough => self.passthrough(sysno, &args),
            Policy::Custom => match A::handlers().get(sysno) {
                Some(handler) => handler(self, &args),
                None => bail!("{sysno} has no converter on {}", A::ARCH),
            },
            Policy::NotYetSupported => bail!("{sysno} is not yet supported on {}", A::ARCH),
            Policy::NotImplemented => {
                warn!("{} {sysno} is not implemented", A::ARCH);
                Ok(Errno::ENOSYS.as_result())
            }
        };
        let ret = match outcome {
            Ok(ret) => ret,
            Err(err) => {
                if let Some(errno) = err.downcast_ref::<Errno>() {
                    errno.as_result()
                } else if let Some(fault) = err.downcast_ref::<MemoryError>() {
                    Errno::from(fault.clone()).as_result()
                } else {
                    return Err(err.context(format!("{} {sysno}", A::ARCH)));
                }
            }
        };
        trace!("{} {sysno}({words:#x?}) = {ret}", A::ARCH);
        Ok(ret)
    }

    /// Issue a neutral call.
    pub fn call(&self, sysno: Sysno, args: NeutralArgs) -> Result<i64> {
        self.host.dispatch(sysno, args)
    }

    fn passthrough(&self, sysno: Sysno, args: &SyscallArgs<'_, A>) -> Result<i64> {
        let mut neutral = [0u64; 6];
        for (i, kind) in sysno.signature().iter().enumerate() {
            neutral[i] = match *kind {
                ArgKind::Int => args.int(i) as i64 as u64,
                ArgKind::Uint => args.uint(i) as u64,
                ArgKind::Long => args.long(i) as u64,
                ArgKind::Ulong => args.ulong(i),
                ArgKind::Ptr(size) => args.ptr(i, size)?,
                ArgKind::Buf(len) => args.buf(i, len)?,
                ArgKind::Str => args.string(i)?,
                ArgKind::Addr => args.host_addr(i)?,
            };
        }
        self.call(sysno, neutral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingHost, arena, peek, poke};

    fn exec() -> ExecConfig {
        ExecConfig::new("/opt/emu")
    }

    #[test]
    fn passthrough_translates_buffers_and_paths() {
        let (mem, base) = arena();
        memory::write_bytes(&mem, base, b"/etc/hostname\0").unwrap();
        let host = RecordingHost::replying(5);
        let config = exec();
        let adapter = ArmAdapter::new(&mem, &host, &config);

        // write(1, base + 0x100, 5)
        let ret = adapter.handle_trap(4, [1, base as u32 + 0x100, 5, 0, 0, 0]).unwrap();
        assert_eq!(ret, 5);
        // access(path, R_OK)
        adapter.handle_trap(33, [base as u32, 4, 0, 0, 0, 0]).unwrap();

        let calls = host.calls();
        assert_eq!(calls[0].0, Sysno::Write);
        assert_eq!(calls[0].1[1], mem.guest_to_host(base + 0x100).unwrap() as u64);
        assert_eq!(calls[1].0, Sysno::Access);
        assert_eq!(calls[1].1[0], mem.guest_to_host(base).unwrap() as u64);
    }

    #[test]
    fn int_arguments_are_sign_extended() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = exec();
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // close(-1)
        adapter.handle_trap(6, [u32::MAX, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(host.calls()[0].1[0], -1i64 as u64);
    }

    #[test]
    fn host_errors_pass_through_unchanged() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(-(libc::EBADF as i64));
        let config = exec();
        let adapter = Arm64Adapter::new(&mem, &host, &config);
        // close(99)
        assert_eq!(adapter.handle_trap(57, [99, 0, 0, 0, 0, 0]).unwrap(), -9);
    }

    #[test]
    fn unmapped_buffers_fault_before_the_host_call() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = exec();
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let ret = adapter.handle_trap(3, [0, 0x10, 16, 0, 0, 0]).unwrap();
        assert_eq!(ret, Errno::EFAULT.as_result());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn overlong_paths_are_rejected() {
        let (mem, base) = arena();
        memory::write_bytes(&mem, base, &[b'a'; PATH_MAX + 8]).unwrap();
        let host = RecordingHost::replying(0);
        let config = exec();
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let ret = adapter.handle_trap(10, [base as u32, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(ret, Errno::ENAMETOOLONG.as_result());
    }

    #[test]
    fn not_implemented_calls_answer_enosys() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = exec();
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // ustat
        assert_eq!(adapter.handle_trap(62, [0; 6]).unwrap(), -(libc::ENOSYS as i64));
        assert!(host.calls().is_empty());
    }

    #[test]
    fn not_yet_supported_calls_are_fatal() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = exec();
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // rt_sigaction
        let err = adapter.handle_trap(174, [0; 6]).unwrap_err();
        assert!(format!("{err:#}").contains("rt_sigaction is not yet supported on arm"));
    }

    #[test]
    fn unknown_numbers_are_fatal() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = exec();
        let adapter = Arm64Adapter::new(&mem, &host, &config);
        assert!(adapter.handle_trap(5000, [0; 6]).is_err());
    }

    #[test]
    fn record_pointers_round_trip_through_scratch() {
        let (mem, base) = arena();
        let guest = abi::ilp32::Timespec { tv_sec: 3, tv_nsec: 4 };
        memory::store(&mem, base, &guest).unwrap();
        let args = SyscallArgs::<Arm>::new([base as u32, 0, u32::MAX, 0, 0, 0], &mem);

        let mut ts = args.record::<abi::ilp32::Timespec>(0).unwrap().input().unwrap();
        let ptr = ts.neutral();
        let wide: abi::Timespec = unsafe { peek(ptr) };
        assert_eq!(wide, abi::Timespec { tv_sec: 3, tv_nsec: 4 });
        unsafe { poke(ptr, abi::Timespec { tv_sec: 9, tv_nsec: 1 }) };
        ts.write_back().unwrap();
        assert_eq!(
            memory::load::<abi::ilp32::Timespec, _>(&mem, base).unwrap(),
            abi::ilp32::Timespec { tv_sec: 9, tv_nsec: 1 }
        );

        let mut null = args.record::<abi::ilp32::Timespec>(1).unwrap();
        assert!(null.is_null());
        assert_eq!(null.neutral(), 0);
        assert_eq!(args.record::<abi::ilp32::Timespec>(2).err(), Some(Errno::EFAULT));
    }

    #[test]
    fn split_offsets_join_low_half_first() {
        let (mem, _) = arena();
        let args = SyscallArgs::<Arm>::new([0, 0, 0, 0x89ab_cdef, 0x1, 0], &mem);
        assert_eq!(args.pair(3), 0x1_89ab_cdef);
        assert_eq!(args.offset(3), 0x1_89ab_cdef);
        let args = SyscallArgs::<Arm64>::new([0, 0, 0, 0x1_89ab_cdef, 0, 0], &mem);
        assert_eq!(args.offset(3), 0x1_89ab_cdef);
    }

    #[test]
    fn every_custom_entry_has_a_converter() {
        for arch in [GuestArch::Arm, GuestArch::Arm64] {
            for e in syscall::table(arch).entries() {
                if e.policy == Policy::Custom {
                    assert!(has_handler(arch, e.sysno), "{arch} {}", e.sysno);
                }
            }
        }
    }
}
