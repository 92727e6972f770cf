//! Syscall ABI translation for a user-mode ARM/ARM64 emulator running on x86
//! or x86_64 hosts.
//!
//! A trapped guest syscall enters through [`guest::Adapter::handle_trap`],
//! is resolved against the per-architecture tables in [`syscall`], has its
//! records and nested pointers rebuilt by [`abi`] and [`compound`], and is
//! finally issued on the host by a [`host::NeutralHost`] implementation.

pub mod abi;
pub mod compound;
pub mod errno;
pub mod guest;
pub mod host;
pub mod memory;
pub mod syscall;

#[cfg(test)]
pub(crate) mod testing;

pub use errno::Errno;
pub use guest::{Adapter, Arm, Arm64, ArmAdapter, Arm64Adapter};
pub use memory::{AddressSpace, GuestMemory, IdentitySpace};
pub use syscall::{GuestArch, Policy, Sysno};
