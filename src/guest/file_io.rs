//! Reads, writes and seeks: vectored I/O, split 64-bit offsets and the
//! legacy directory stream.

use anyhow::Result;
use log::trace;

use super::{Adapter, GuestAbi, SyscallArgs, fcntl::open_flags_to_host};
use crate::{
    abi::Word,
    compound::{
        dirent,
        iovec::{IOV_MAX, IoVectors},
    },
    errno::Errno,
    memory,
    syscall::Sysno,
};

const SEEK_SET: u64 = 0;
const SEEK_CUR: u64 = 1;
/// `MAX_HANDLE_SZ`.
const MAX_HANDLE_SZ: usize = 128;

fn fd<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> u64 {
    args.int(i) as i64 as u64
}

fn vectors<A: GuestAbi>(args: &SyscallArgs<'_, A>, addr: usize, count: usize) -> Result<IoVectors, Errno> {
    let count = usize::try_from(args.int(count)).map_err(|_| Errno::EINVAL)?;
    IoVectors::from_guest::<A::Word>(args.mem, args.guest_addr(addr)?, count, IOV_MAX, Errno::EINVAL)
}

pub(super) fn sys_readv<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let iov = vectors(args, 1, 2)?;
    cx.call(Sysno::Readv, [fd(args, 0), iov.neutral(), iov.len() as u64, 0, 0, 0])
}

pub(super) fn sys_writev<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let iov = vectors(args, 1, 2)?;
    cx.call(Sysno::Writev, [fd(args, 0), iov.neutral(), iov.len() as u64, 0, 0, 0])
}

fn positioned<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno, flags: u64) -> Result<i64> {
    let iov = vectors(args, 1, 2)?;
    cx.call(
        sysno,
        [fd(args, 0), iov.neutral(), iov.len() as u64, args.offset(3) as u64, 0, flags],
    )
}

pub(super) fn sys_preadv<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    positioned(cx, args, Sysno::Preadv, 0)
}

pub(super) fn sys_pwritev<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    positioned(cx, args, Sysno::Pwritev, 0)
}

pub(super) fn sys_preadv2<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    positioned(cx, args, Sysno::Preadv2, args.int(5) as i64 as u64)
}

pub(super) fn sys_pwritev2<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    positioned(cx, args, Sysno::Pwritev2, args.int(5) as i64 as u64)
}

pub(super) fn sys_vmsplice<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let iov = vectors(args, 1, 2)?;
    cx.call(
        Sysno::Vmsplice,
        [fd(args, 0), iov.neutral(), iov.len() as u64, args.uint(3) as u64, 0, 0],
    )
}

pub(super) fn sys_open_by_handle_at<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    let addr = args.guest_addr(1)?;
    let handle_bytes: u32 = memory::load(cx.mem(), addr).map_err(Errno::from)?;
    if handle_bytes as usize > MAX_HANDLE_SZ {
        return Ok(Errno::EINVAL.as_result());
    }
    // handle_bytes, handle_type, then the opaque handle.
    let handle = args.ptr(1, 8 + handle_bytes as usize)?;
    let flags = open_flags_to_host(args.int(2));
    cx.call(Sysno::OpenByHandleAt, [fd(args, 0), handle, flags as i64 as u64, 0, 0, 0])
}

// 32-bit ARM passes 64-bit values in an even/odd register pair, so a
// pair following an odd number of words skips one register.

pub(super) fn sys_pread64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let buf = args.buf(1, 2)?;
    cx.call(Sysno::Pread64, [fd(args, 0), buf, args.ulong(2), args.pair(4), 0, 0])
}

pub(super) fn sys_pwrite64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let buf = args.buf(1, 2)?;
    cx.call(Sysno::Pwrite64, [fd(args, 0), buf, args.ulong(2), args.pair(4), 0, 0])
}

pub(super) fn sys_truncate64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(0)?;
    cx.call(Sysno::Truncate, [path, args.pair(2), 0, 0, 0, 0])
}

pub(super) fn sys_ftruncate64<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(Sysno::Ftruncate, [fd(args, 0), args.pair(2), 0, 0, 0, 0])
}

pub(super) fn sys_readahead<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(Sysno::Readahead, [fd(args, 0), args.pair(2), args.ulong(4), 0, 0, 0])
}

/// `arm_fadvise64_64(fd, advice, offset, len)`: advice moved up front to
/// keep both pairs aligned.
pub(super) fn sys_arm_fadvise64_64<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    cx.call(
        Sysno::Fadvise64,
        [fd(args, 0), args.pair(2), args.pair(4), args.int(1) as i64 as u64, 0, 0],
    )
}

/// `sync_file_range2(fd, flags, offset, nbytes)`.
pub(super) fn sys_sync_file_range2<A: GuestAbi>(
    cx: &Adapter<'_, A>,
    args: &SyscallArgs<'_, A>,
) -> Result<i64> {
    cx.call(
        Sysno::SyncFileRange,
        [fd(args, 0), args.pair(2), args.pair(4), args.uint(1) as u64, 0, 0],
    )
}

pub(super) fn sys_fallocate<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(
        Sysno::Fallocate,
        [fd(args, 0), args.int(1) as i64 as u64, args.pair(2), args.pair(4), 0, 0],
    )
}

pub(super) fn sys_fanotify_mark<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(5)?;
    cx.call(
        Sysno::FanotifyMark,
        [fd(args, 0), args.uint(1) as u64, args.pair(2), fd(args, 4), path, 0],
    )
}

/// `_llseek(fd, offset_high, offset_low, result, whence)`.
/// `lseek` returning a `long`: positions past the guest word are reported
/// as `EOVERFLOW`.
pub(super) fn sys_lseek<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let ret = cx.call(
        Sysno::Lseek,
        [fd(args, 0), args.long(1) as u64, args.uint(2) as u64, 0, 0, 0],
    )?;
    if A::Word::BYTES == 4 && i32::try_from(ret).is_err() {
        return Ok(Errno::EOVERFLOW.as_result());
    }
    Ok(ret)
}

pub(super) fn sys_llseek<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let offset = (args.raw(1) << 32) | (args.raw(2) & 0xffff_ffff);
    let result = args.guest_addr(3)?;
    memory::translate_range(cx.mem(), result, size_of::<i64>()).map_err(Errno::from)?;
    let ret = cx.call(Sysno::Lseek, [fd(args, 0), offset, args.uint(4) as u64, 0, 0, 0])?;
    if ret < 0 {
        return Ok(ret);
    }
    memory::store(cx.mem(), result, &ret).map_err(Errno::from)?;
    Ok(0)
}

/// `sendfile` with a 32-bit `off_t`.
pub(super) fn sys_sendfile<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let off_addr = args.guest_addr(2)?;
    let mut offset = match off_addr {
        0 => None,
        addr => Some(memory::load::<i32, _>(cx.mem(), addr).map_err(Errno::from)? as i64),
    };
    let off_ptr = offset.as_mut().map_or(0, |o| o as *mut i64 as usize as u64);
    let ret = cx.call(
        Sysno::Sendfile,
        [fd(args, 0), fd(args, 1), off_ptr, args.ulong(3), 0, 0],
    )?;
    if let Some(offset) = offset
        && ret >= 0
    {
        let Ok(narrow) = i32::try_from(offset) else {
            return Ok(Errno::EOVERFLOW.as_result());
        };
        memory::store(cx.mem(), off_addr, &narrow).map_err(Errno::from)?;
    }
    Ok(ret)
}

/// Legacy `getdents`, served from `getdents64`.
pub(super) fn sys_getdents<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let capacity = args.uint(2) as usize;
    args.buf(1, 2)?;
    // Directories that cannot report a position are left to fail in getdents64.
    let start = cx.call(Sysno::Lseek, [fd(args, 0), 0, SEEK_CUR, 0, 0, 0])?;
    let mut host = vec![0u8; capacity];
    let ret = cx.call(
        Sysno::Getdents64,
        [fd(args, 0), host.as_mut_ptr() as usize as u64, capacity as u64, 0, 0, 0],
    )?;
    if ret <= 0 {
        return Ok(ret);
    }
    let repacked = match dirent::repack_legacy(&host[..ret as usize], capacity) {
        Ok(repacked) => repacked,
        Err(errno) => {
            if start >= 0 {
                trace!("getdents failed with {errno}, rewinding to {start}");
                cx.call(Sysno::Lseek, [fd(args, 0), start as u64, SEEK_SET, 0, 0, 0])?;
            }
            return Ok(errno.as_result());
        }
    };
    memory::write_bytes(cx.mem(), args.raw(1), &repacked.bytes).map_err(Errno::from)?;
    if let Some(resume) = repacked.resume {
        trace!("getdents resumes at {resume}");
        let seek = cx.call(Sysno::Lseek, [fd(args, 0), resume as u64, SEEK_SET, 0, 0, 0])?;
        Errno::check(seek)?;
    }
    Ok(repacked.bytes.len() as i64)
}

#[cfg(test)]
mod tests {
    use crate::{
        abi::Iovec,
        compound::exec::ExecConfig,
        errno::Errno,
        guest::{Arm64Adapter, ArmAdapter},
        memory,
        syscall::Sysno,
        testing::{RecordingHost, arena, poke},
    };

    #[test]
    fn split_offsets_are_joined() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;

        // pread64(3, buf, 16, pad, lo, hi)
        adapter.handle_trap(180, [3, b, 16, 0, 0x10, 0x2]).unwrap();
        // arm_fadvise64_64(3, POSIX_FADV_DONTNEED, off, len)
        adapter.handle_trap(270, [3, 4, 0x100, 0, 0x200, 0]).unwrap();
        // sync_file_range2(3, flags, off, nbytes)
        adapter.handle_trap(341, [3, 2, 0x1000, 1, 0x10, 0]).unwrap();
        // fallocate(3, mode, off, len)
        adapter.handle_trap(352, [3, 1, 0, 1, 0x1000, 0]).unwrap();

        let calls = host.calls();
        assert_eq!(calls[0].0, Sysno::Pread64);
        assert_eq!(calls[0].1[3], 0x2_0000_0010);
        assert_eq!(calls[1].0, Sysno::Fadvise64);
        assert_eq!(calls[1].1[..4], [3, 0x100, 0x200, 4]);
        assert_eq!(calls[2].0, Sysno::SyncFileRange);
        assert_eq!(calls[2].1[..4], [3, 0x1_0000_1000, 0x10, 2]);
        assert_eq!(calls[3].0, Sysno::Fallocate);
        assert_eq!(calls[3].1[..4], [3, 1, 0x1_0000_0000, 0x1000]);
    }

    #[test]
    fn preadv2_keeps_its_flags() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = Arm64Adapter::new(&mem, &host, &config);
        let iov = Iovec::<u64> { iov_base: base + 0x100, iov_len: 8 };
        memory::store(&mem, base, &iov).unwrap();
        // preadv2(3, iov, 1, 4096, 0, RWF_NOWAIT)
        adapter.handle_trap(286, [3, base, 1, 4096, 0, 8]).unwrap();
        let call = host.calls()[0].1;
        assert_eq!(call[2..], [1, 4096, 0, 8]);
    }

    #[test]
    fn llseek_stores_the_result() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0x1_0000_0004);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // _llseek(3, 1, 4, result, SEEK_SET)
        assert_eq!(adapter.handle_trap(140, [3, 1, 4, base as u32, 0, 0]).unwrap(), 0);
        assert_eq!(host.calls()[0].1[1], 0x1_0000_0004);
        assert_eq!(memory::load::<i64, _>(&mem, base).unwrap(), 0x1_0000_0004);
    }

    #[test]
    fn lseek_rejects_positions_past_the_guest_long() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0x8000_0000);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // lseek(3, -16, SEEK_END)
        assert_eq!(
            adapter.handle_trap(19, [3, -16i32 as u32, 2, 0, 0, 0]).unwrap(),
            Errno::EOVERFLOW.as_result()
        );
        assert_eq!(host.calls()[0].1[..3], [3, -16i64 as u64, 2]);

        let host = RecordingHost::replying(0x7fff_fff0);
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(adapter.handle_trap(19, [3, 0, 1, 0, 0, 0]).unwrap(), 0x7fff_fff0);
    }

    #[test]
    fn oversized_iovec_counts_are_invalid() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        assert_eq!(
            adapter.handle_trap(145, [3, base as u32, 1025, 0, 0, 0]).unwrap(),
            Errno::EINVAL.as_result()
        );
    }

    fn host_dirent(ino: u64, off: i64, name: &str) -> Vec<u8> {
        let reclen = (19 + name.len() + 1 + 7) & !7;
        let mut rec = vec![0u8; reclen];
        rec[0..8].copy_from_slice(&ino.to_ne_bytes());
        rec[8..16].copy_from_slice(&off.to_ne_bytes());
        rec[16..18].copy_from_slice(&(reclen as u16).to_ne_bytes());
        rec[18] = 8;
        rec[19..19 + name.len()].copy_from_slice(name.as_bytes());
        rec
    }

    #[test]
    fn getdents_seeks_back_over_leftovers() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|sysno, a| match sysno {
            Sysno::Getdents64 => {
                let mut recs = host_dirent(11, 100, "one");
                // An inode the legacy record cannot hold.
                recs.extend(host_dirent(1 << 40, 200, "two"));
                let recs: [u8; 48] = recs.try_into().unwrap();
                unsafe { poke(a[1], recs) };
                48
            }
            _ => 100,
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let ret = adapter.handle_trap(141, [3, base as u32, 48, 0, 0, 0]).unwrap();
        assert_eq!(ret, 16);
        let calls = host.calls();
        assert_eq!(host.sysnos(), [Sysno::Lseek, Sysno::Getdents64, Sysno::Lseek]);
        assert_eq!(calls[2].1[..3], [3, 100, 0]);
        let rec = memory::read_bytes(&mem, base, 16).unwrap();
        assert_eq!(u32::from_ne_bytes(rec[0..4].try_into().unwrap()), 11);
        assert_eq!(&rec[10..13], b"one");
    }

    #[test]
    fn getdents_failures_keep_the_directory_position() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|sysno, a| match sysno {
            Sysno::Getdents64 => {
                let mut recs = host_dirent(1 << 40, 100, "big");
                recs.extend(host_dirent(5, 200, "ok"));
                let recs: [u8; 48] = recs.try_into().unwrap();
                unsafe { poke(a[1], recs) };
                48
            }
            // Position before the read.
            _ => 40,
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let ret = adapter.handle_trap(141, [3, base as u32, 4096, 0, 0, 0]).unwrap();
        assert_eq!(ret, Errno::EOVERFLOW.as_result());
        let calls = host.calls();
        assert_eq!(host.sysnos(), [Sysno::Lseek, Sysno::Getdents64, Sysno::Lseek]);
        assert_eq!(calls[0].1[..3], [3, 0, 1]);
        assert_eq!(calls[2].1[..3], [3, 40, 0]);
    }
}
