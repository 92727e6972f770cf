//! Rebuilders for arguments that embed further guest pointers.
//!
//! Everything built here is handed to the host in its native layout and
//! lives only for the duration of one call.

pub mod dirent;
pub mod exec;
pub mod iovec;
pub mod ipc;
pub mod msghdr;

pub use iovec::IoVectors;
pub use msghdr::{HostMmsgs, HostMsghdr};
