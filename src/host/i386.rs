use std::ptr;

use anyhow::{Result, bail};
use log::trace;

use super::{HostKernel, NeutralArgs, NeutralHost, is_lock_command};
use crate::{
    abi::{Record, i386},
    compound::ipc::{self, IPC_64, IpcPayload},
    errno::Errno,
    syscall::Sysno,
};

// i386 entry points the dispatcher reshapes calls onto.
const NR_TIMES: usize = 43;
const NR_GETRUSAGE: usize = 77;
const NR_GETTIMEOFDAY: usize = 78;
const NR_SETTIMEOFDAY: usize = 79;
const NR_SOCKETCALL: usize = 102;
const NR_SETITIMER: usize = 104;
const NR_GETITIMER: usize = 105;
const NR_WAIT4: usize = 114;
const NR_SYSINFO: usize = 116;
const NR_IPC: usize = 117;
const NR_LLSEEK: usize = 140;
const NR_NEWSELECT: usize = 142;
const NR_PREAD64: usize = 180;
const NR_PWRITE64: usize = 181;
const NR_MMAP2: usize = 192;
const NR_TRUNCATE64: usize = 193;
const NR_FTRUNCATE64: usize = 194;
const NR_STAT64: usize = 195;
const NR_LSTAT64: usize = 196;
const NR_FSTAT64: usize = 197;
const NR_FCNTL64: usize = 221;
const NR_READAHEAD: usize = 225;
const NR_TIMER_CREATE: usize = 259;
const NR_STATFS64: usize = 268;
const NR_FSTATFS64: usize = 269;
const NR_UTIMES: usize = 271;
const NR_FADVISE64_64: usize = 272;
const NR_MQ_OPEN: usize = 277;
const NR_MQ_NOTIFY: usize = 281;
const NR_MQ_GETSETATTR: usize = 282;
const NR_WAITID: usize = 284;
const NR_FUTIMESAT: usize = 299;
const NR_FSTATAT64: usize = 300;
const NR_SYNC_FILE_RANGE: usize = 314;
const NR_FALLOCATE: usize = 324;
const NR_PREADV: usize = 333;
const NR_PWRITEV: usize = 334;
const NR_FANOTIFY_MARK: usize = 339;
const NR_PRLIMIT64: usize = 340;
const NR_PREADV2: usize = 378;
const NR_PWRITEV2: usize = 379;
const NR_CLOCK_ADJTIME64: usize = 405;
const NR_CLOCK_NANOSLEEP_TIME64: usize = 407;
const NR_IO_PGETEVENTS_TIME64: usize = 416;

// socketcall(2) operations.
const SYS_SOCKET: usize = 1;
const SYS_BIND: usize = 2;
const SYS_CONNECT: usize = 3;
const SYS_LISTEN: usize = 4;
const SYS_ACCEPT: usize = 5;
const SYS_GETSOCKNAME: usize = 6;
const SYS_GETPEERNAME: usize = 7;
const SYS_SOCKETPAIR: usize = 8;
const SYS_SENDTO: usize = 11;
const SYS_RECVFROM: usize = 12;
const SYS_SHUTDOWN: usize = 13;
const SYS_SETSOCKOPT: usize = 14;
const SYS_GETSOCKOPT: usize = 15;
const SYS_SENDMSG: usize = 16;
const SYS_RECVMSG: usize = 17;
const SYS_ACCEPT4: usize = 18;
const SYS_SENDMMSG: usize = 20;

// ipc(2) operations.
const SEMOP: usize = 1;
const SEMGET: usize = 2;
const SEMCTL: usize = 3;
const MSGSND: usize = 11;
const MSGRCV: usize = 12;
const MSGGET: usize = 13;
const MSGCTL: usize = 14;
const SHMAT: usize = 21;
const SHMDT: usize = 22;
const SHMGET: usize = 23;
const SHMCTL: usize = 24;

/// Selects the `msgrcv` form that takes `msgp` and `msgtyp` directly.
const IPC_NEW_FORM: usize = 1 << 16;

const CLOCK_REALTIME: usize = 0;
const PAGE_SHIFT: u32 = 12;

/// x86 (32-bit) host: narrows neutral calls onto the i386 ABI.
///
/// Words are narrowed with `as usize`, so on a 32-bit build they truncate to
/// the host register width. 64-bit values travel as low/high word pairs and
/// pointer-free records are converted through scratch copies in the i386
/// layout.
pub struct Host32<K> {
    kernel: K,
}

impl<K: HostKernel> Host32<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    fn raw(&self, nr: usize, args: [usize; 6]) -> i64 {
        let ret = unsafe { self.kernel.syscall(nr, args) };
        trace!("i386 #{nr}({args:#x?}) = {ret}");
        ret
    }

    fn socketcall(&self, call: usize, a: &NeutralArgs) -> i64 {
        let block = a.map(word);
        self.raw(NR_SOCKETCALL, [call, block.as_ptr() as usize, 0, 0, 0, 0])
    }

    fn ipc(&self, call: usize, first: usize, second: usize, third: usize, ptr: usize, fifth: usize) -> i64 {
        self.raw(NR_IPC, [call, first, second, third, ptr, fifth])
    }

    fn semctl(&self, a: &NeutralArgs) -> Result<i64> {
        let cmd = a[2] as i32;
        let call = |arg: usize| {
            let semun = arg;
            self.ipc(
                SEMCTL,
                word(a[0]),
                word(a[1]),
                (cmd | IPC_64) as usize,
                ptr::addr_of!(semun) as usize,
                0,
            )
        };
        Ok(match ipc::sem_payload(cmd)? {
            IpcPayload::ReadControl => with_output::<i386::SemidDs>(a[3], call),
            IpcPayload::WriteControl => with_input::<i386::SemidDs>(a[3], call),
            _ => call(word(a[3])),
        })
    }

    fn msgctl(&self, a: &NeutralArgs) -> Result<i64> {
        let cmd = a[1] as i32;
        let call = |buf| self.ipc(MSGCTL, word(a[0]), (cmd | IPC_64) as usize, 0, buf, 0);
        Ok(match ipc::msg_payload(cmd)? {
            IpcPayload::ReadControl => with_output::<i386::MsqidDs>(a[2], call),
            IpcPayload::WriteControl => with_input::<i386::MsqidDs>(a[2], call),
            _ => call(word(a[2])),
        })
    }

    fn shmctl(&self, a: &NeutralArgs) -> Result<i64> {
        let cmd = a[1] as i32;
        let call = |buf| self.ipc(SHMCTL, word(a[0]), (cmd | IPC_64) as usize, 0, buf, 0);
        Ok(match ipc::shm_payload(cmd)? {
            IpcPayload::ReadControl => with_output::<i386::ShmidDs>(a[2], call),
            IpcPayload::WriteControl => with_input::<i386::ShmidDs>(a[2], call),
            IpcPayload::Limits => with_output::<i386::Shminfo>(a[2], call),
            IpcPayload::Usage => with_output::<i386::ShmInfo>(a[2], call),
            _ => call(word(a[2])),
        })
    }

    fn msgsnd(&self, a: &NeutralArgs) -> i64 {
        let size = word(a[2]);
        if a[1] == 0 {
            return Errno::EFAULT.as_result();
        }
        // Neutral msgbuf: 8-byte mtype followed by the text.
        let neutral = unsafe { std::slice::from_raw_parts(word(a[1]) as *const u8, 8 + size) };
        let host = ipc::repack_msgbuf(neutral, 8, 4);
        self.ipc(MSGSND, word(a[0]), size, word(a[3]), host.as_ptr() as usize, 0)
    }

    fn msgrcv(&self, a: &NeutralArgs) -> i64 {
        let size = word(a[2]);
        if a[1] == 0 {
            return Errno::EFAULT.as_result();
        }
        let mut host = vec![0u8; 4 + size];
        let ret = self.ipc(
            MSGRCV | IPC_NEW_FORM,
            word(a[0]),
            size,
            word(a[4]),
            host.as_mut_ptr() as usize,
            word(a[3]),
        );
        if ret >= 0 {
            let wide = ipc::repack_msgbuf(&host[..4 + ret as usize], 4, 8);
            unsafe { ptr::copy_nonoverlapping(wide.as_ptr(), word(a[1]) as *mut u8, wide.len()) };
        }
        ret
    }

    fn shmat(&self, a: &NeutralArgs) -> i64 {
        let mut raddr: usize = 0;
        let ret = self.ipc(
            SHMAT,
            word(a[0]),
            word(a[2]),
            ptr::addr_of_mut!(raddr) as usize,
            word(a[1]),
            0,
        );
        if ret < 0 { ret } else { raddr as i64 }
    }

    fn fcntl(&self, a: &NeutralArgs) -> i64 {
        let call = |arg| self.raw(NR_FCNTL64, [word(a[0]), word(a[1]), arg, 0, 0, 0]);
        if is_lock_command(a[1] as i32) {
            with_inout::<i386::Flock64>(a[2], call)
        } else {
            call(word(a[2]))
        }
    }

    fn llseek(&self, a: &NeutralArgs) -> i64 {
        let (lo, hi) = halves(a[1]);
        let mut result: i64 = 0;
        let ret = self.raw(
            NR_LLSEEK,
            [word(a[0]), hi, lo, ptr::addr_of_mut!(result) as usize, word(a[2]), 0],
        );
        if ret < 0 { ret } else { result }
    }

    fn mmap(&self, a: &NeutralArgs) -> i64 {
        if a[5] & ((1 << PAGE_SHIFT) - 1) != 0 {
            return Errno::EINVAL.as_result();
        }
        let pgoff = word(a[5] >> PAGE_SHIFT);
        self.raw(NR_MMAP2, [word(a[0]), word(a[1]), word(a[2]), word(a[3]), word(a[4]), pgoff])
    }

    fn utimes(&self, nr: usize, args: [usize; 6], times_at: usize, times: u64) -> i64 {
        let mut args = args;
        if times == 0 {
            args[times_at] = 0;
            return self.raw(nr, args);
        }
        let wide: [crate::abi::Timeval; 2] = unsafe { ptr::read_unaligned(word(times) as *const _) };
        let narrow = wide.map(|tv| i386::Timeval::from_neutral(&tv));
        args[times_at] = narrow.as_ptr() as usize;
        self.raw(nr, args)
    }

    fn reshape(&self, sysno: Sysno, a: &NeutralArgs) -> Result<Option<i64>> {
        let w = |i: usize| word(a[i]);
        let ret = match sysno {
            Sysno::Stat => with_output::<i386::Stat64>(a[1], |st| self.raw(NR_STAT64, [w(0), st, 0, 0, 0, 0])),
            Sysno::Lstat => with_output::<i386::Stat64>(a[1], |st| self.raw(NR_LSTAT64, [w(0), st, 0, 0, 0, 0])),
            Sysno::Fstat => with_output::<i386::Stat64>(a[1], |st| self.raw(NR_FSTAT64, [w(0), st, 0, 0, 0, 0])),
            Sysno::Newfstatat => with_output::<i386::Stat64>(a[2], |st| {
                self.raw(NR_FSTATAT64, [w(0), w(1), st, w(3), 0, 0])
            }),
            Sysno::Statfs => with_output::<i386::Statfs64>(a[1], |buf| {
                self.raw(NR_STATFS64, [w(0), size_of::<i386::Statfs64>(), buf, 0, 0, 0])
            }),
            Sysno::Fstatfs => with_output::<i386::Statfs64>(a[1], |buf| {
                self.raw(NR_FSTATFS64, [w(0), size_of::<i386::Statfs64>(), buf, 0, 0, 0])
            }),
            Sysno::Lseek => self.llseek(a),
            Sysno::Mmap => self.mmap(a),
            Sysno::Pread64 | Sysno::Pwrite64 => {
                let nr = if sysno == Sysno::Pread64 { NR_PREAD64 } else { NR_PWRITE64 };
                let (lo, hi) = halves(a[3]);
                self.raw(nr, [w(0), w(1), w(2), lo, hi, 0])
            }
            Sysno::Truncate | Sysno::Ftruncate => {
                let nr = if sysno == Sysno::Truncate { NR_TRUNCATE64 } else { NR_FTRUNCATE64 };
                let (lo, hi) = halves(a[1]);
                self.raw(nr, [w(0), lo, hi, 0, 0, 0])
            }
            Sysno::Readahead => {
                let (lo, hi) = halves(a[1]);
                self.raw(NR_READAHEAD, [w(0), lo, hi, w(2), 0, 0])
            }
            Sysno::Fadvise64 => {
                let (off_lo, off_hi) = halves(a[1]);
                let (len_lo, len_hi) = halves(a[2]);
                self.raw(NR_FADVISE64_64, [w(0), off_lo, off_hi, len_lo, len_hi, w(3)])
            }
            Sysno::SyncFileRange => {
                let (off_lo, off_hi) = halves(a[1]);
                let (len_lo, len_hi) = halves(a[2]);
                self.raw(NR_SYNC_FILE_RANGE, [w(0), off_lo, off_hi, len_lo, len_hi, w(3)])
            }
            Sysno::Fallocate => {
                let (off_lo, off_hi) = halves(a[2]);
                let (len_lo, len_hi) = halves(a[3]);
                self.raw(NR_FALLOCATE, [w(0), w(1), off_lo, off_hi, len_lo, len_hi])
            }
            Sysno::Preadv | Sysno::Pwritev => {
                let nr = if sysno == Sysno::Preadv { NR_PREADV } else { NR_PWRITEV };
                let (lo, hi) = halves(a[3]);
                self.raw(nr, [w(0), w(1), w(2), lo, hi, 0])
            }
            Sysno::Preadv2 | Sysno::Pwritev2 => {
                let nr = if sysno == Sysno::Preadv2 { NR_PREADV2 } else { NR_PWRITEV2 };
                let (lo, hi) = halves(a[3]);
                self.raw(nr, [w(0), w(1), w(2), lo, hi, w(5)])
            }
            Sysno::FanotifyMark => {
                let (lo, hi) = halves(a[2]);
                self.raw(NR_FANOTIFY_MARK, [w(0), w(1), lo, hi, w(3), w(4)])
            }
            Sysno::Nanosleep => self.raw(NR_CLOCK_NANOSLEEP_TIME64, [CLOCK_REALTIME, 0, w(0), w(1), 0, 0]),
            Sysno::IoGetevents => self.raw(NR_IO_PGETEVENTS_TIME64, [w(0), w(1), w(2), w(3), w(4), 0]),
            Sysno::Adjtimex => self.raw(NR_CLOCK_ADJTIME64, [CLOCK_REALTIME, w(0), 0, 0, 0, 0]),
            Sysno::Gettimeofday => with_output::<i386::Timeval>(a[0], |tv| {
                self.raw(NR_GETTIMEOFDAY, [tv, w(1), 0, 0, 0, 0])
            }),
            Sysno::Settimeofday => with_input::<i386::Timeval>(a[0], |tv| {
                self.raw(NR_SETTIMEOFDAY, [tv, w(1), 0, 0, 0, 0])
            }),
            Sysno::Getitimer => with_output::<i386::Itimerval>(a[1], |it| {
                self.raw(NR_GETITIMER, [w(0), it, 0, 0, 0, 0])
            }),
            Sysno::Setitimer => with_input::<i386::Itimerval>(a[1], |new| {
                with_output::<i386::Itimerval>(a[2], |old| {
                    self.raw(NR_SETITIMER, [w(0), new, old, 0, 0, 0])
                })
            }),
            Sysno::Select => with_inout::<i386::Timeval>(a[4], |tv| {
                self.raw(NR_NEWSELECT, [w(0), w(1), w(2), w(3), tv, 0])
            }),
            Sysno::Utimes => self.utimes(NR_UTIMES, [w(0), 0, 0, 0, 0, 0], 1, a[1]),
            Sysno::Futimesat => self.utimes(NR_FUTIMESAT, [w(0), w(1), 0, 0, 0, 0], 2, a[2]),
            Sysno::Getrusage => with_output::<i386::Rusage>(a[1], |ru| {
                self.raw(NR_GETRUSAGE, [w(0), ru, 0, 0, 0, 0])
            }),
            Sysno::Wait4 => with_output::<i386::Rusage>(a[3], |ru| {
                self.raw(NR_WAIT4, [w(0), w(1), w(2), ru, 0, 0])
            }),
            Sysno::Waitid => with_output::<i386::Siginfo>(a[2], |info| {
                with_output::<i386::Rusage>(a[4], |ru| {
                    self.raw(NR_WAITID, [w(0), w(1), info, w(3), ru, 0])
                })
            }),
            Sysno::Sysinfo => with_output::<i386::Sysinfo>(a[0], |info| self.raw(NR_SYSINFO, [info, 0, 0, 0, 0, 0])),
            Sysno::Times => with_output::<i386::Tms>(a[0], |tms| self.raw(NR_TIMES, [tms, 0, 0, 0, 0, 0])),
            // rlimit64 is the neutral layout already.
            Sysno::Getrlimit => self.raw(NR_PRLIMIT64, [0, w(0), 0, w(1), 0, 0]),
            Sysno::Setrlimit => self.raw(NR_PRLIMIT64, [0, w(0), w(1), 0, 0, 0]),
            Sysno::MqOpen => with_input::<i386::MqAttr>(a[3], |attr| {
                self.raw(NR_MQ_OPEN, [w(0), w(1), w(2), attr, 0, 0])
            }),
            Sysno::MqGetsetattr => with_input::<i386::MqAttr>(a[1], |new| {
                with_output::<i386::MqAttr>(a[2], |old| {
                    self.raw(NR_MQ_GETSETATTR, [w(0), new, old, 0, 0, 0])
                })
            }),
            Sysno::MqNotify => with_input::<i386::Sigevent>(a[1], |sev| {
                self.raw(NR_MQ_NOTIFY, [w(0), sev, 0, 0, 0, 0])
            }),
            Sysno::TimerCreate => with_input::<i386::Sigevent>(a[1], |sev| {
                self.raw(NR_TIMER_CREATE, [w(0), sev, w(2), 0, 0, 0])
            }),
            Sysno::Fcntl => self.fcntl(a),

            Sysno::Socket => self.socketcall(SYS_SOCKET, a),
            Sysno::Bind => self.socketcall(SYS_BIND, a),
            Sysno::Connect => self.socketcall(SYS_CONNECT, a),
            Sysno::Listen => self.socketcall(SYS_LISTEN, a),
            Sysno::Accept => self.socketcall(SYS_ACCEPT, a),
            Sysno::Getsockname => self.socketcall(SYS_GETSOCKNAME, a),
            Sysno::Getpeername => self.socketcall(SYS_GETPEERNAME, a),
            Sysno::Socketpair => self.socketcall(SYS_SOCKETPAIR, a),
            Sysno::Sendto => self.socketcall(SYS_SENDTO, a),
            Sysno::Recvfrom => self.socketcall(SYS_RECVFROM, a),
            Sysno::Shutdown => self.socketcall(SYS_SHUTDOWN, a),
            Sysno::Setsockopt => self.socketcall(SYS_SETSOCKOPT, a),
            Sysno::Getsockopt => self.socketcall(SYS_GETSOCKOPT, a),
            Sysno::Sendmsg => self.socketcall(SYS_SENDMSG, a),
            Sysno::Recvmsg => self.socketcall(SYS_RECVMSG, a),
            Sysno::Accept4 => self.socketcall(SYS_ACCEPT4, a),
            Sysno::Sendmmsg => self.socketcall(SYS_SENDMMSG, a),

            Sysno::Semop => self.ipc(SEMOP, w(0), w(2), 0, w(1), 0),
            Sysno::Semget => self.ipc(SEMGET, w(0), w(1), w(2), 0, 0),
            Sysno::Semctl => self.semctl(a)?,
            Sysno::Msgsnd => self.msgsnd(a),
            Sysno::Msgrcv => self.msgrcv(a),
            Sysno::Msgget => self.ipc(MSGGET, w(0), w(1), 0, 0, 0),
            Sysno::Msgctl => self.msgctl(a)?,
            Sysno::Shmat => self.shmat(a),
            Sysno::Shmdt => self.ipc(SHMDT, 0, 0, 0, w(0), 0),
            Sysno::Shmget => self.ipc(SHMGET, w(0), w(1), w(2), 0, 0),
            Sysno::Shmctl => self.shmctl(a)?,
            _ => return Ok(None),
        };
        Ok(Some(ret))
    }
}

impl<K: HostKernel> NeutralHost for Host32<K> {
    fn dispatch(&self, sysno: Sysno, args: NeutralArgs) -> Result<i64> {
        if let Some(ret) = self.reshape(sysno, &args)? {
            trace!("i386 {sysno} = {ret}");
            return Ok(ret);
        }
        let Some(nr) = sysno.i386() else {
            bail!("unsupported neutral syscall {sysno} on i386");
        };
        Ok(self.raw(nr, args.map(word)))
    }
}

/// Narrow a neutral word to a host register.
fn word(v: u64) -> usize {
    v as usize
}

/// Low and high register halves of a 64-bit value.
fn halves(v: u64) -> (usize, usize) {
    (v as u32 as usize, (v >> 32) as usize)
}

// Neutral record pointers are valid for the duration of the call; a zero
// word is passed on as NULL.

fn with_output<R: Record>(neutral: u64, call: impl FnOnce(usize) -> i64) -> i64 {
    if neutral == 0 {
        return call(0);
    }
    let mut host = R::default();
    let ret = call(ptr::addr_of_mut!(host) as usize);
    if ret >= 0 {
        unsafe { ptr::write_unaligned(word(neutral) as *mut R::Neutral, host.to_neutral()) };
    }
    ret
}

fn with_input<R: Record>(neutral: u64, call: impl FnOnce(usize) -> i64) -> i64 {
    if neutral == 0 {
        return call(0);
    }
    let wide = unsafe { ptr::read_unaligned(word(neutral) as *const R::Neutral) };
    let host = R::from_neutral(&wide);
    call(ptr::addr_of!(host) as usize)
}

fn with_inout<R: Record>(neutral: u64, call: impl FnOnce(usize) -> i64) -> i64 {
    if neutral == 0 {
        return call(0);
    }
    let wide = unsafe { ptr::read_unaligned(word(neutral) as *const R::Neutral) };
    let mut host = R::from_neutral(&wide);
    let ret = call(ptr::addr_of_mut!(host) as usize);
    if ret >= 0 {
        unsafe { ptr::write_unaligned(word(neutral) as *mut R::Neutral, host.to_neutral()) };
    }
    ret
}

#[cfg(test)]
mod tests {
    use std::ptr::addr_of_mut;

    use super::*;
    use crate::{
        abi::{self, ilp32},
        host::F_SETLK64,
        testing::{RecordingKernel, peek, poke},
    };

    fn addr<T>(v: &mut T) -> u64 {
        v as *mut T as usize as u64
    }

    #[test]
    fn lseek_goes_through_llseek() {
        let host = Host32::new(RecordingKernel::with(|nr, args| {
            assert_eq!(nr, NR_LLSEEK);
            unsafe { poke::<i64>(args[3] as u64, 0x1_0000_0010) };
            0
        }));
        let ret = host.dispatch(Sysno::Lseek, [3, 0x1_0000_0010, 0, 0, 0, 0]).unwrap();
        assert_eq!(ret, 0x1_0000_0010);
        let (_, args) = host.kernel().calls()[0];
        assert_eq!((args[0], args[1], args[2], args[4]), (3, 1, 0x10, 0));
    }

    #[test]
    fn pread_splits_the_offset() {
        let host = Host32::new(RecordingKernel::replying(5));
        host.dispatch(Sysno::Pread64, [4, 0x1000, 5, 0x2_0000_0003, 0, 0]).unwrap();
        assert_eq!(host.kernel().calls(), vec![(NR_PREAD64, [4, 0x1000, 5, 3, 2, 0])]);
    }

    #[test]
    fn stat_widens_the_host_record() {
        let host = Host32::new(RecordingKernel::with(|_, args| {
            let st = i386::Stat64 {
                st_ino: 1 << 40,
                st_size: 12345,
                st_nlink: 3,
                ..Default::default()
            };
            unsafe { poke(args[1] as u64, st) };
            0
        }));
        let mut st = abi::Stat::default();
        host.dispatch(Sysno::Stat, [0x1000, addr(&mut st), 0, 0, 0, 0]).unwrap();
        assert_eq!(host.kernel().calls()[0].0, NR_STAT64);
        assert_eq!(st.st_ino, 1 << 40);
        assert_eq!(st.st_size, 12345);
        assert_eq!(st.st_nlink, 3);
    }

    #[test]
    fn failed_calls_leave_outputs_alone() {
        let host = Host32::new(RecordingKernel::replying(-2));
        let mut st = abi::Stat {
            st_ino: 99,
            ..Default::default()
        };
        let ret = host.dispatch(Sysno::Fstat, [3, addr(&mut st), 0, 0, 0, 0]).unwrap();
        assert_eq!(ret, -2);
        assert_eq!(st.st_ino, 99);
    }

    #[test]
    fn socket_calls_are_multiplexed() {
        let host = Host32::new(RecordingKernel::with(|nr, args| {
            assert_eq!(nr, NR_SOCKETCALL);
            let block: [usize; 6] = unsafe { peek(args[1] as u64) };
            (args[0] * 1000 + block[0] * 100 + block[2]) as i64
        }));
        let ret = host.dispatch(Sysno::Connect, [3, 0x2000, 16, 0, 0, 0]).unwrap();
        assert_eq!(ret, 3316);
    }

    #[test]
    fn unaligned_mmap_offset_is_rejected() {
        let host = Host32::new(RecordingKernel::replying(0));
        let ret = host.dispatch(Sysno::Mmap, [0, 4096, 3, 0x22, 5, 100]).unwrap();
        assert_eq!(ret, Errno::EINVAL.as_result());
        assert!(host.kernel().calls().is_empty());

        host.dispatch(Sysno::Mmap, [0, 4096, 3, 0x22, 5, 0x3000]).unwrap();
        assert_eq!(host.kernel().calls()[0], (NR_MMAP2, [0, 4096, 3, 0x22, 5, 3]));
    }

    #[test]
    fn msgsnd_narrows_the_message_type() {
        let host = Host32::new(RecordingKernel::with(|nr, args| {
            assert_eq!((nr, args[0]), (NR_IPC, MSGSND));
            let bytes: [u8; 6] = unsafe { peek(args[4] as u64) };
            assert_eq!(&bytes[..4], &7i32.to_le_bytes());
            assert_eq!(&bytes[4..], b"hi");
            0
        }));
        let mut msg = [0u8; 10];
        msg[..8].copy_from_slice(&7i64.to_le_bytes());
        msg[8..].copy_from_slice(b"hi");
        let ret = host
            .dispatch(Sysno::Msgsnd, [5, msg.as_mut_ptr() as u64, 2, 0, 0, 0])
            .unwrap();
        assert_eq!(ret, 0);
        assert_eq!(host.kernel().calls()[0].1[2], 2);
    }

    #[test]
    fn shmctl_stat_joins_split_times() {
        let host = Host32::new(RecordingKernel::with(|_, args| {
            assert_eq!(args[2], (ipc::IPC_STAT | IPC_64) as usize);
            let ds = ilp32::ShmidDs {
                shm_segsz: 4096,
                shm_atime: 5,
                shm_atime_high: 1,
                ..Default::default()
            };
            unsafe { poke(args[4] as u64, ds) };
            0
        }));
        let mut ds = abi::ShmidDs::default();
        host.dispatch(Sysno::Shmctl, [9, ipc::IPC_STAT as u64, addr(&mut ds), 0, 0, 0])
            .unwrap();
        assert_eq!(ds.shm_segsz, 4096);
        assert_eq!(ds.shm_atime, 0x1_0000_0005);
    }

    #[test]
    fn unknown_ipc_commands_are_fatal() {
        let host = Host32::new(RecordingKernel::replying(0));
        assert!(host.dispatch(Sysno::Msgctl, [1, 77, 0, 0, 0, 0]).is_err());
        assert!(host.kernel().calls().is_empty());
    }

    #[test]
    fn shmat_returns_the_attach_address() {
        let host = Host32::new(RecordingKernel::with(|_, args| {
            unsafe { poke::<usize>(args[3] as u64, 0x4000_0000) };
            0
        }));
        let ret = host.dispatch(Sysno::Shmat, [2, 0, 0, 0, 0, 0]).unwrap();
        assert_eq!(ret, 0x4000_0000);
    }

    #[test]
    fn lock_records_use_the_packed_layout() {
        let host = Host32::new(RecordingKernel::with(|nr, args| {
            assert_eq!(nr, NR_FCNTL64);
            let lock: i386::Flock64 = unsafe { peek(args[2] as u64) };
            assert_eq!({ lock.l_start }, 1 << 33);
            0
        }));
        let mut lock = abi::Flock64 {
            l_type: 1,
            l_start: 1 << 33,
            ..Default::default()
        };
        let ret = host
            .dispatch(Sysno::Fcntl, [3, F_SETLK64 as u64, addr(&mut lock), 0, 0, 0])
            .unwrap();
        assert_eq!(ret, 0);
    }

    #[test]
    fn rlimits_use_prlimit64() {
        let host = Host32::new(RecordingKernel::replying(0));
        let mut lim = abi::Rlimit64::default();
        let ptr = addr_of_mut!(lim) as usize;
        host.dispatch(Sysno::Getrlimit, [7, ptr as u64, 0, 0, 0, 0]).unwrap();
        assert_eq!(host.kernel().calls(), vec![(NR_PRLIMIT64, [0, 7, 0, ptr, 0, 0])]);
    }

    #[test]
    fn time64_entry_points_come_from_the_table() {
        let host = Host32::new(RecordingKernel::replying(0));
        host.dispatch(Sysno::ClockGettime, [1, 0x1000, 0, 0, 0, 0]).unwrap();
        assert_eq!(host.kernel().calls()[0].0, 403);
    }

    #[test]
    fn guest_only_ids_are_fatal() {
        let host = Host32::new(RecordingKernel::replying(0));
        let err = host.dispatch(Sysno::Stat64, [0; 6]).unwrap_err();
        assert!(err.to_string().contains("unsupported neutral syscall stat64 on i386"));
    }
}
