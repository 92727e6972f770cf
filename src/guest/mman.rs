//! Memory mappings: guest addresses in, guest addresses out.

use anyhow::{Result, bail};
use log::debug;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{abi::Word, errno::Errno, syscall::Sysno};

const MAP_FIXED: i32 = 0x10;
const MAP_FIXED_NOREPLACE: i32 = 0x10_0000;
const MREMAP_FIXED: i32 = 2;
/// Unit of the `mmap2` offset.
const MMAP2_PAGE: u64 = 4096;

/// Guest address of a host mapping, if the guest can name it.
fn guest_address<A: GuestAbi>(cx: &Adapter<'_, A>, host: usize) -> Option<u64> {
    let limit: u64 = A::Word::MAX.into();
    cx.mem().host_to_guest(host).filter(|&g| g <= limit)
}

fn map<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, offset: u64) -> Result<i64> {
    let len = args.ulong(1);
    let flags = args.int(3);
    let want = args.raw(0);
    let hint = match want {
        0 => 0,
        addr => match cx.mem().guest_to_host(addr) {
            Some(host) => host as u64,
            None if flags & (MAP_FIXED | MAP_FIXED_NOREPLACE) != 0 => {
                debug!("fixed mapping at {addr:#x} has no host counterpart");
                return Ok(Errno::ENOMEM.as_result());
            }
            None => 0,
        },
    };
    let ret = cx.call(
        Sysno::Mmap,
        [
            hint,
            len,
            args.int(2) as i64 as u64,
            flags as i64 as u64,
            args.int(4) as i64 as u64,
            offset,
        ],
    )?;
    let Ok(host) = Errno::check(ret) else {
        return Ok(ret);
    };
    match guest_address(cx, host as u64 as usize) {
        Some(guest) => Ok(guest as i64),
        None => {
            debug!("mapping at host {host:#x} is outside the guest address space");
            cx.call(Sysno::Munmap, [host as u64, len, 0, 0, 0, 0])?;
            Ok(Errno::ENOMEM.as_result())
        }
    }
}

pub(super) fn sys_mmap<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    map(cx, args, args.ulong(5))
}

pub(super) fn sys_mmap2<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    map(cx, args, args.ulong(5) * MMAP2_PAGE)
}

pub(super) fn sys_mremap<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let old = args.host_addr(0)?;
    let flags = args.int(3);
    let new = if flags & MREMAP_FIXED != 0 { args.host_addr(4)? } else { 0 };
    let ret = cx.call(
        Sysno::Mremap,
        [old, args.ulong(1), args.ulong(2), flags as i64 as u64, new, 0],
    )?;
    let Ok(host) = Errno::check(ret) else {
        return Ok(ret);
    };
    match guest_address(cx, host as u64 as usize) {
        Some(guest) => Ok(guest as i64),
        None => bail!("mremap moved the mapping to host {host:#x}, outside the guest address space"),
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        compound::exec::ExecConfig,
        errno::Errno,
        guest::{Arm64Adapter, ArmAdapter},
        memory::AddressSpace,
        syscall::Sysno,
        testing::{RecordingHost, arena},
    };

    #[test]
    fn mmap_returns_the_guest_address() {
        let (mem, base) = arena();
        let inside = mem.guest_to_host(base + 0x2000).unwrap() as i64;
        let host = RecordingHost::replying(inside);
        let config = ExecConfig::new("/opt/emu");
        let adapter = Arm64Adapter::new(&mem, &host, &config);
        // mmap(NULL, 4096, PROT_READ, MAP_PRIVATE | MAP_ANONYMOUS, -1, 0)
        let ret = adapter.handle_trap(222, [0, 4096, 1, 0x22, u64::MAX, 0]).unwrap();
        assert_eq!(ret, (base + 0x2000) as i64);
        assert_eq!(host.calls()[0].1[4], -1i64 as u64);
    }

    #[test]
    fn fixed_mappings_need_a_host_counterpart() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(0);
        let config = ExecConfig::new("/opt/emu");
        let adapter = Arm64Adapter::new(&mem, &host, &config);
        let ret = adapter.handle_trap(222, [0x4000_0000, 4096, 3, 0x32, u64::MAX, 0]).unwrap();
        assert_eq!(ret, Errno::ENOMEM.as_result());
        assert!(host.calls().is_empty());
    }

    #[test]
    fn unaddressable_results_are_unmapped() {
        let (mem, _) = arena();
        let host = RecordingHost::with(|sysno, _| match sysno {
            Sysno::Mmap => 0x7f12_3456_0000,
            _ => 0,
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // mmap2(NULL, 8192, PROT_READ, MAP_PRIVATE, 3, 2)
        let ret = adapter.handle_trap(192, [0, 8192, 1, 0x02, 3, 2]).unwrap();
        assert_eq!(ret, Errno::ENOMEM.as_result());
        let calls = host.calls();
        assert_eq!(calls[0].1[5], 8192);
        assert_eq!(calls[1].0, Sysno::Munmap);
        assert_eq!(calls[1].1[..2], [0x7f12_3456_0000, 8192]);
    }

    #[test]
    fn mremap_outside_the_guest_is_fatal() {
        let (mem, base) = arena();
        let host = RecordingHost::replying(0x7f00_0000_0000);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // mremap(base, 4096, 8192, MREMAP_MAYMOVE)
        let err = adapter.handle_trap(163, [base as u32, 4096, 8192, 1, 0, 0]).unwrap_err();
        assert!(format!("{err:#}").contains("outside the guest address space"));
    }
}
