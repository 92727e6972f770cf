use anyhow::{Result, bail};
use log::trace;

use super::{F_GETLK64, F_SETLK64, F_SETLKW64, HostKernel, NeutralArgs, NeutralHost};
use crate::syscall::Sysno;

/// x86_64 host: neutral records are the native ones.
pub struct Host64<K> {
    kernel: K,
}

impl<K: HostKernel> Host64<K> {
    pub fn new(kernel: K) -> Self {
        Self { kernel }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: HostKernel> NeutralHost for Host64<K> {
    fn dispatch(&self, sysno: Sysno, mut args: NeutralArgs) -> Result<i64> {
        let Some(nr) = sysno.x86_64() else {
            bail!("unsupported neutral syscall {sysno} on x86_64");
        };
        if sysno == Sysno::Fcntl {
            args[1] = match args[1] as i32 {
                F_GETLK64 => libc::F_GETLK as u64,
                F_SETLK64 => libc::F_SETLK as u64,
                F_SETLKW64 => libc::F_SETLKW as u64,
                _ => args[1],
            };
        }
        let words = args.map(|a| a as usize);
        let ret = unsafe { self.kernel.syscall(nr, words) };
        trace!("x86_64 {sysno}#{nr}({words:#x?}) = {ret}");
        Ok(ret)
    }
}
