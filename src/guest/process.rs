//! Program execution and process creation.

use anyhow::Result;
use log::debug;

use super::{Adapter, GuestAbi, SyscallArgs};
use crate::{
    compound::exec::{self, ARGV_CAPACITY, ENVP_CAPACITY},
    errno::Errno,
    syscall::Sysno,
};

pub(super) fn sys_execve<A: GuestAbi>(cx: &Adapter<'_, A>, args: &SyscallArgs<'_, A>) -> Result<i64> {
    let path = match args.string(0)? {
        0 => return Ok(Errno::EFAULT.as_result()),
        path => path as usize,
    };
    let argv = exec::read_vector::<A::Word>(cx.mem(), args.guest_addr(1)?, ARGV_CAPACITY)?;
    let envp = exec::read_vector::<A::Word>(cx.mem(), args.guest_addr(2)?, ENVP_CAPACITY)?;
    let plan = exec::prepare(cx.exec_config(), path, &argv, &envp)?;
    // Only returns on failure.
    let ret = cx.call(Sysno::Execve, [plan.path(), plan.argv(), plan.envp(), 0, 0, 0])?;
    debug!("execve {:?} failed: {ret}", plan.args());
    Ok(ret)
}

/// `vfork` is issued as `fork`: the child gets its own copy of the guest.
pub(super) fn sys_vfork<A: GuestAbi>(cx: &Adapter<'_, A>, _args: &SyscallArgs<'_, A>) -> Result<i64> {
    debug!("vfork issued as fork");
    cx.call(Sysno::Fork, [0; 6])
}

/// `cacheflush` has nothing to flush once the code runs on the host.
pub(super) fn sys_cacheflush<A: GuestAbi>(_cx: &Adapter<'_, A>, _args: &SyscallArgs<'_, A>) -> Result<i64> {
    Ok(0)
}
