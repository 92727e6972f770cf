//! Legacy 16-bit user and group id calls of 32-bit ARM.

use anyhow::Result;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    abi::ilp32::{high2lowuid, low2highuid},
    errno::Errno,
    memory,
    syscall::Sysno,
};

/// `NGROUPS_MAX`.
const NGROUPS_MAX: usize = 65536;

fn id16<A: GuestAbi>(args: &SyscallArgs<'_, A>, i: usize) -> u64 {
    low2highuid(args.raw(i) as u16) as u64
}

/// Narrow a returned id; errors pass through.
fn narrow(ret: i64) -> i64 {
    if ret < 0 { ret } else { high2lowuid(ret as u32) as i64 }
}

pub(super) fn sys_chown16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(0)?;
    cx.call(Sysno::Chown, [path, id16(args, 1), id16(args, 2), 0, 0, 0])
}

pub(super) fn sys_lchown16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = args.string(0)?;
    cx.call(Sysno::Lchown, [path, id16(args, 1), id16(args, 2), 0, 0, 0])
}

pub(super) fn sys_fchown16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let fd = args.int(0) as i64 as u64;
    cx.call(Sysno::Fchown, [fd, id16(args, 1), id16(args, 2), 0, 0, 0])
}

pub(super) fn sys_setuid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(Sysno::Setuid, [id16(args, 0), 0, 0, 0, 0, 0])
}

pub(super) fn sys_setgid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(Sysno::Setgid, [id16(args, 0), 0, 0, 0, 0, 0])
}

pub(super) fn sys_getuid16<A: GuestAbi>(cx: &Adapter<'_, A>, _args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(narrow(cx.call(Sysno::Getuid, [0; 6])?))
}

pub(super) fn sys_getgid16<A: GuestAbi>(cx: &Adapter<'_, A>, _args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(narrow(cx.call(Sysno::Getgid, [0; 6])?))
}

pub(super) fn sys_geteuid16<A: GuestAbi>(cx: &Adapter<'_, A>, _args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(narrow(cx.call(Sysno::Geteuid, [0; 6])?))
}

pub(super) fn sys_getegid16<A: GuestAbi>(cx: &Adapter<'_, A>, _args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(narrow(cx.call(Sysno::Getegid, [0; 6])?))
}

pub(super) fn sys_setreuid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(Sysno::Setreuid, [id16(args, 0), id16(args, 1), 0, 0, 0, 0])
}

pub(super) fn sys_setregid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(Sysno::Setregid, [id16(args, 0), id16(args, 1), 0, 0, 0, 0])
}

pub(super) fn sys_setresuid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(
        Sysno::Setresuid,
        [id16(args, 0), id16(args, 1), id16(args, 2), 0, 0, 0],
    )
}

pub(super) fn sys_setresgid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    cx.call(
        Sysno::Setresgid,
        [id16(args, 0), id16(args, 1), id16(args, 2), 0, 0, 0],
    )
}

/// `getres[ug]id16`: fetch full ids, store them as 16-bit values.
fn getres16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>, sysno: Sysno) -> Result<i64> {
    let targets = [args.guest_addr(0)?, args.guest_addr(1)?, args.guest_addr(2)?];
    for &addr in &targets {
        memory::translate_range(cx.mem(), addr, 2).map_err(Errno::from)?;
    }
    let mut ids = [0u32; 3];
    let ptrs = [
        &mut ids[0] as *mut u32 as usize as u64,
        &mut ids[1] as *mut u32 as usize as u64,
        &mut ids[2] as *mut u32 as usize as u64,
    ];
    let ret = cx.call(sysno, [ptrs[0], ptrs[1], ptrs[2], 0, 0, 0])?;
    if ret == 0 {
        for (addr, id) in targets.into_iter().zip(ids) {
            memory::store(cx.mem(), addr, &high2lowuid(id)).map_err(Errno::from)?;
        }
    }
    Ok(ret)
}

pub(super) fn sys_getresuid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    getres16(cx, args, Sysno::Getresuid)
}

pub(super) fn sys_getresgid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    getres16(cx, args, Sysno::Getresgid)
}

fn group_count<A: GuestAbi>(args: &SyscallArgs<'_, A>) -> Result<usize, Errno> {
    usize::try_from(args.int(0))
        .ok()
        .filter(|&n| n <= NGROUPS_MAX)
        .ok_or(Errno::EINVAL)
}

pub(super) fn sys_getgroups16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let size = group_count(args)?;
    if size == 0 {
        return cx.call(Sysno::Getgroups, [0; 6]);
    }
    let list = args.guest_addr(1)?;
    memory::translate_range(cx.mem(), list, size * 2).map_err(Errno::from)?;
    let mut groups = vec![0u32; size];
    let ret = cx.call(
        Sysno::Getgroups,
        [size as u64, groups.as_mut_ptr() as usize as u64, 0, 0, 0, 0],
    )?;
    if ret > 0 {
        let narrow: Vec<u16> = groups[..ret as usize].iter().map(|&g| high2lowuid(g)).collect();
        let bytes: Vec<u8> = narrow.iter().flat_map(|g| g.to_ne_bytes()).collect();
        memory::write_bytes(cx.mem(), list, &bytes).map_err(Errno::from)?;
    }
    Ok(ret)
}

pub(super) fn sys_setgroups16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let size = group_count(args)?;
    let bytes = memory::read_bytes(cx.mem(), args.guest_addr(1)?, size * 2).map_err(Errno::from)?;
    let groups: Vec<u32> = bytes
        .chunks_exact(2)
        .map(|c| low2highuid(u16::from_ne_bytes([c[0], c[1]])))
        .collect();
    let list = if groups.is_empty() { 0 } else { groups.as_ptr() as usize as u64 };
    cx.call(Sysno::Setgroups, [size as u64, list, 0, 0, 0, 0])
}

pub(super) fn sys_setfsuid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(narrow(cx.call(Sysno::Setfsuid, [id16(args, 0), 0, 0, 0, 0, 0])?))
}

pub(super) fn sys_setfsgid16<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(narrow(cx.call(Sysno::Setfsgid, [id16(args, 0), 0, 0, 0, 0, 0])?))
}

#[cfg(test)]
mod tests {
    use crate::{
        compound::exec::ExecConfig,
        guest::ArmAdapter,
        memory,
        syscall::Sysno,
        testing::{RecordingHost, arena, poke},
    };

    #[test]
    fn ids_are_widened_and_narrowed() {
        let (mem, _) = arena();
        let host = RecordingHost::replying(100_000);
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);

        // getuid16
        assert_eq!(adapter.handle_trap(24, [0; 6]).unwrap(), 65534);
        // setreuid16(-1, 1000)
        adapter.handle_trap(70, [0xffff, 1000, 0, 0, 0, 0]).unwrap();
        assert_eq!(host.calls()[1].0, Sysno::Setreuid);
        assert_eq!(host.calls()[1].1[..2], [u32::MAX as u64, 1000]);
    }

    #[test]
    fn getresuid16_stores_short_ids() {
        let (mem, base) = arena();
        let host = RecordingHost::with(|_, a| {
            for (i, id) in [1000u32, 70_000, 0].into_iter().enumerate() {
                unsafe { poke(a[i], id) };
            }
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        let b = base as u32;
        assert_eq!(adapter.handle_trap(165, [b, b + 2, b + 4, 0, 0, 0]).unwrap(), 0);
        let ids: [u16; 3] = memory::load(&mem, base).unwrap();
        assert_eq!(ids, [1000, 65534, 0]);
    }

    #[test]
    fn group_lists_change_width() {
        let (mem, base) = arena();
        memory::store(&mem, base, &[5u16, 0xffff]).unwrap();
        let host = RecordingHost::with(|sysno, a| {
            if sysno == Sysno::Setgroups {
                let groups: [u32; 2] = unsafe { crate::testing::peek(a[1]) };
                assert_eq!(groups, [5, u32::MAX]);
            }
            0
        });
        let config = ExecConfig::new("/opt/emu");
        let adapter = ArmAdapter::new(&mem, &host, &config);
        // setgroups16(2, list)
        assert_eq!(adapter.handle_trap(81, [2, base as u32, 0, 0, 0, 0]).unwrap(), 0);
        // getgroups16(-1, list)
        assert_eq!(
            adapter.handle_trap(80, [u32::MAX, base as u32, 0, 0, 0, 0]).unwrap(),
            -(libc::EINVAL as i64)
        );
    }
}
