//! Records whose ARM EABI layout differs from the generic 32-bit one.

use super::{Record, neutral, record_pair};

/// ARM `struct stat64`: eight-byte aligned 64-bit members.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stat64 {
    pub st_dev: u64,
    pub __pad0: [u8; 4],
    pub __st_ino: u32,
    pub st_mode: u32,
    pub st_nlink: u32,
    pub st_uid: u32,
    pub st_gid: u32,
    pub st_rdev: u64,
    pub __pad3: [u8; 4],
    pub __pad4: u32,
    pub st_size: i64,
    pub st_blksize: u32,
    pub __pad5: u32,
    pub st_blocks: u64,
    pub st_atime: u32,
    pub st_atime_nsec: u32,
    pub st_mtime: u32,
    pub st_mtime_nsec: u32,
    pub st_ctime: u32,
    pub st_ctime_nsec: u32,
    pub st_ino: u64,
}

impl Record for Stat64 {
    type Neutral = neutral::Stat;

    fn to_neutral(&self) -> neutral::Stat {
        neutral::Stat {
            st_dev: self.st_dev,
            st_ino: self.st_ino,
            st_nlink: self.st_nlink as u64,
            st_mode: self.st_mode,
            st_uid: self.st_uid,
            st_gid: self.st_gid,
            st_rdev: self.st_rdev,
            st_size: self.st_size,
            st_blksize: self.st_blksize as i64,
            st_blocks: self.st_blocks as i64,
            st_atime: self.st_atime as i64,
            st_atime_nsec: self.st_atime_nsec as i64,
            st_mtime: self.st_mtime as i64,
            st_mtime_nsec: self.st_mtime_nsec as i64,
            st_ctime: self.st_ctime as i64,
            st_ctime_nsec: self.st_ctime_nsec as i64,
            ..Default::default()
        }
    }

    fn from_neutral(n: &neutral::Stat) -> Self {
        Stat64 {
            st_dev: n.st_dev,
            __st_ino: n.st_ino as u32,
            st_mode: n.st_mode,
            st_nlink: n.st_nlink as u32,
            st_uid: n.st_uid,
            st_gid: n.st_gid,
            st_rdev: n.st_rdev,
            st_size: n.st_size,
            st_blksize: n.st_blksize as u32,
            st_blocks: n.st_blocks as u64,
            st_atime: n.st_atime as u32,
            st_atime_nsec: n.st_atime_nsec as u32,
            st_mtime: n.st_mtime as u32,
            st_mtime_nsec: n.st_mtime_nsec as u32,
            st_ctime: n.st_ctime as u32,
            st_ctime_nsec: n.st_ctime_nsec as u32,
            st_ino: n.st_ino,
            ..Default::default()
        }
    }
}

/// ARM `epoll_event` is naturally aligned.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpollEvent {
    pub events: u32,
    pub __pad: u32,
    pub data: u64,
}

record_pair!(EpollEvent => neutral::EpollEvent { events, data });

const _: () = assert!(size_of::<Stat64>() == 104);
const _: () = assert!(std::mem::offset_of!(Stat64, st_size) == 48);
const _: () = assert!(std::mem::offset_of!(Stat64, st_blocks) == 64);
const _: () = assert!(std::mem::offset_of!(Stat64, st_ino) == 96);
const _: () = assert!(size_of::<EpollEvent>() == 16);
