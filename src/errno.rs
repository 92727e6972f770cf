use std::{error::Error, fmt};

use crate::memory::MemoryError;

/// A Linux error number raised while translating a call.
///
/// Handlers return these through `anyhow` with `?`; the adapter recognises
/// them and hands `-errno` back to the guest instead of failing. The numbers
/// are shared by ARM, ARM64, i386 and x86_64.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Errno(pub i32);

impl Errno {
    pub const EPERM: Errno = Errno(libc::EPERM);
    pub const ENOENT: Errno = Errno(libc::ENOENT);
    pub const E2BIG: Errno = Errno(libc::E2BIG);
    pub const EBADF: Errno = Errno(libc::EBADF);
    pub const ENOMEM: Errno = Errno(libc::ENOMEM);
    pub const EFAULT: Errno = Errno(libc::EFAULT);
    pub const EINVAL: Errno = Errno(libc::EINVAL);
    pub const ENOTTY: Errno = Errno(libc::ENOTTY);
    pub const ENAMETOOLONG: Errno = Errno(libc::ENAMETOOLONG);
    pub const ENOSYS: Errno = Errno(libc::ENOSYS);
    pub const EOVERFLOW: Errno = Errno(libc::EOVERFLOW);
    pub const EMSGSIZE: Errno = Errno(libc::EMSGSIZE);
    pub const ENOPROTOOPT: Errno = Errno(libc::ENOPROTOOPT);

    /// The value written back into the guest result register.
    pub fn as_result(self) -> i64 {
        -(self.0 as i64)
    }

    /// Split a kernel-style result into a value or an error number.
    pub fn check(result: i64) -> Result<i64, Errno> {
        if (-4095..0).contains(&result) {
            Err(Errno(-result as i32))
        } else {
            Ok(result)
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = std::io::Error::from_raw_os_error(self.0);
        write!(f, "errno {} ({text})", self.0)
    }
}

impl Error for Errno {}

impl From<MemoryError> for Errno {
    fn from(err: MemoryError) -> Self {
        match err {
            MemoryError::NotRepresentable { .. } => Errno::ENOMEM,
            _ => Errno::EFAULT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_splits_kernel_results() {
        assert_eq!(Errno::check(12), Ok(12));
        assert_eq!(Errno::check(-14), Err(Errno::EFAULT));
        // mmap-style addresses in the top page range are values, not errors
        assert_eq!(Errno::check(-4096), Ok(-4096));
    }

    #[test]
    fn memory_errors_become_bad_address() {
        let err = MemoryError::Unmapped { addr: 0x1000, size: 4 };
        assert_eq!(Errno::from(err), Errno::EFAULT);
        assert_eq!(Errno::EFAULT.as_result(), -14);
    }
}
