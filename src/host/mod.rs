//! Neutral host dispatchers.
//!
//! A neutral call is a [`Sysno`] plus six `u64` words whose pointed-to
//! records use the x86_64 layouts in [`crate::abi::neutral`]. [`Host64`]
//! issues it almost unchanged; [`Host32`] narrows it onto the i386 ABI.

use anyhow::Result;

use crate::syscall::Sysno;

pub mod i386;
pub mod x86_64;

pub use i386::Host32;
pub use x86_64::Host64;

/// Six neutral argument words.
pub type NeutralArgs = [u64; 6];

/// Neutral `fcntl` lock commands. The adapter always locks with 64-bit
/// records; 64-bit hosts spell these as the plain `F_*LK` commands.
pub const F_GETLK64: i32 = 12;
pub const F_SETLK64: i32 = 13;
pub const F_SETLKW64: i32 = 14;

/// Open file description locks, also always 64-bit records.
pub const F_OFD_GETLK: i32 = 36;
pub const F_OFD_SETLK: i32 = 37;
pub const F_OFD_SETLKW: i32 = 38;

pub fn is_lock_command(cmd: i32) -> bool {
    matches!(
        cmd,
        F_GETLK64 | F_SETLK64 | F_SETLKW64 | F_OFD_GETLK | F_OFD_SETLK | F_OFD_SETLKW
    )
}

/// Issues neutral calls on the host.
///
/// Returns the kernel-style result (`-errno` on failure). `Err` means the
/// call has no host rendition at all.
pub trait NeutralHost {
    fn dispatch(&self, sysno: Sysno, args: NeutralArgs) -> Result<i64>;
}

/// The raw host system call instruction.
pub trait HostKernel {
    /// # Safety
    ///
    /// Pointer arguments must be valid for whatever the kernel does with them.
    unsafe fn syscall(&self, nr: usize, args: [usize; 6]) -> i64;
}

/// [`HostKernel`] over `libc::syscall`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibcKernel;

impl HostKernel for LibcKernel {
    unsafe fn syscall(&self, nr: usize, a: [usize; 6]) -> i64 {
        let result = unsafe { libc::syscall(nr as libc::c_long, a[0], a[1], a[2], a[3], a[4], a[5]) };
        libc_to_kernel(result as i64)
    }
}

/// Convert libc syscall result (-1 + errno) to kernel ABI (-errno).
pub fn libc_to_kernel(result: i64) -> i64 {
    if result == -1 {
        let errno = std::io::Error::last_os_error().raw_os_error().unwrap_or(1);
        -(errno as i64)
    } else {
        result
    }
}

/// The dispatcher matching the build target.
#[cfg(target_pointer_width = "64")]
pub type NativeHost = Host64<LibcKernel>;
#[cfg(target_pointer_width = "32")]
pub type NativeHost = Host32<LibcKernel>;

pub fn native() -> NativeHost {
    NativeHost::new(LibcKernel)
}
