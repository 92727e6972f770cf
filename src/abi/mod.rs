//! Kernel record layouts and the conversions between them.
//!
//! The neutral form of every record is the x86_64 kernel layout
//! ([`neutral`]). Guest layouts live in [`ilp32`] (shared by ARM and i386),
//! [`arm`] and [`arm64`]; [`i386`] adds the 32-bit host records that differ
//! from ARM.

pub mod arm;
pub mod arm64;
pub mod i386;
pub mod ilp32;
pub mod neutral;

use std::fmt;

pub use neutral::*;

/// A guest register word: `u32` for ARM, `u64` for ARM64.
pub trait Word:
    Copy + Default + Eq + fmt::Debug + fmt::LowerHex + Into<u64> + Send + Sync + 'static
{
    const BYTES: usize;
    const MAX: Self;

    /// Truncate a 64-bit value to the word.
    fn from_u64(v: u64) -> Self;

    fn sign_extend(self) -> i64;
}

impl Word for u32 {
    const BYTES: usize = 4;
    const MAX: Self = u32::MAX;

    fn from_u64(v: u64) -> Self {
        v as u32
    }

    fn sign_extend(self) -> i64 {
        self as i32 as i64
    }
}

impl Word for u64 {
    const BYTES: usize = 8;
    const MAX: Self = u64::MAX;

    fn from_u64(v: u64) -> Self {
        v
    }

    fn sign_extend(self) -> i64 {
        self as i64
    }
}

/// A guest or 32-bit host record with a neutral counterpart.
///
/// Widening zero-fills fields the source lacks; narrowing truncates scalars
/// to the destination width and drops fields the destination lacks.
pub trait Record: Copy + Default {
    type Neutral: Copy + Default;

    fn to_neutral(&self) -> Self::Neutral;
    fn from_neutral(n: &Self::Neutral) -> Self;
}

/// Derive a [`Record`] impl from a field list.
///
/// Scalars convert with `as`, `nested` fields through their own `Record`
/// impl, `arrays` element by element.
macro_rules! record_pair {
    (
        $guest:path => $neutral:path {
            $($field:ident),* $(,)?
        }
        $(nested { $($nested:ident),* $(,)? })?
        $(arrays { $($array:ident),* $(,)? })?
    ) => {
        impl $crate::abi::Record for $guest {
            type Neutral = $neutral;

            #[allow(clippy::needless_update, clippy::unnecessary_cast)]
            fn to_neutral(&self) -> $neutral {
                $neutral {
                    $($field: self.$field as _,)*
                    $($($nested: $crate::abi::Record::to_neutral(&{ self.$nested }),)*)?
                    $($($array: {
                        let src = self.$array;
                        std::array::from_fn(|i| src[i] as _)
                    },)*)?
                    ..Default::default()
                }
            }

            #[allow(clippy::needless_update, clippy::unnecessary_cast)]
            fn from_neutral(n: &$neutral) -> Self {
                $guest {
                    $($field: n.$field as _,)*
                    $($($nested: $crate::abi::Record::from_neutral(&{ n.$nested }),)*)?
                    $($($array: {
                        let src = n.$array;
                        std::array::from_fn(|i| src[i] as _)
                    },)*)?
                    ..Default::default()
                }
            }
        }
    };
}

/// Records whose guest layout is already the neutral one.
macro_rules! identity_record {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::abi::Record for $ty {
                type Neutral = $ty;

                fn to_neutral(&self) -> $ty {
                    *self
                }

                fn from_neutral(n: &$ty) -> Self {
                    *n
                }
            }
        )*
    };
}

pub(crate) use {identity_record, record_pair};

/// Time pairs such as the `times` argument of `utimes` and `utimensat`.
impl<T: Record> Record for [T; 2] {
    type Neutral = [T::Neutral; 2];

    fn to_neutral(&self) -> Self::Neutral {
        self.map(|t| t.to_neutral())
    }

    fn from_neutral(n: &Self::Neutral) -> Self {
        n.map(|t| T::from_neutral(&t))
    }
}

/// `struct iovec` with guest-sized words.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Iovec<W> {
    pub iov_base: W,
    pub iov_len: W,
}

/// `struct msghdr`; `Msghdr<u32>` is the 28-byte 32-bit layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Msghdr<W> {
    pub msg_name: W,
    pub msg_namelen: u32,
    pub msg_iov: W,
    pub msg_iovlen: W,
    pub msg_control: W,
    pub msg_controllen: W,
    pub msg_flags: i32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mmsghdr<W> {
    pub msg_hdr: Msghdr<W>,
    pub msg_len: u32,
}

/// Control message header. The payload follows at `align(size_of::<Self>())`.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cmsghdr<W> {
    pub cmsg_len: W,
    pub cmsg_level: i32,
    pub cmsg_type: i32,
}

/// Sixth argument of `pselect6`: the signal mask pointer and its size.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SigsetArg<W> {
    pub ss: W,
    pub ss_len: W,
}

const _: () = assert!(size_of::<Iovec<u32>>() == 8);
const _: () = assert!(size_of::<Iovec<u64>>() == 16);
const _: () = assert!(size_of::<Msghdr<u32>>() == 28);
const _: () = assert!(size_of::<Msghdr<u64>>() == 56);
const _: () = assert!(size_of::<Mmsghdr<u32>>() == 32);
const _: () = assert!(size_of::<Mmsghdr<u64>>() == 64);
const _: () = assert!(size_of::<Cmsghdr<u32>>() == 12);
const _: () = assert!(size_of::<Cmsghdr<u64>>() == 16);

/// A record layout as shown by the `layouts` diagnostic.
pub struct Layout {
    pub name: &'static str,
    pub guest: &'static str,
    pub size: usize,
    pub align: usize,
}

macro_rules! layouts {
    ($($guest:literal => $ty:ty),* $(,)?) => {
        vec![$(Layout {
            name: stringify!($ty),
            guest: $guest,
            size: size_of::<$ty>(),
            align: align_of::<$ty>(),
        },)*]
    };
}

/// Every record layout the engine converts between.
pub fn layouts() -> Vec<Layout> {
    layouts![
        "neutral" => neutral::Timespec,
        "neutral" => neutral::Timeval,
        "neutral" => neutral::Itimerspec,
        "neutral" => neutral::Tms,
        "neutral" => neutral::Rlimit64,
        "neutral" => neutral::Rusage,
        "neutral" => neutral::Stat,
        "neutral" => neutral::Statfs,
        "neutral" => neutral::Sysinfo,
        "neutral" => neutral::EpollEvent,
        "neutral" => neutral::Flock64,
        "neutral" => neutral::MqAttr,
        "neutral" => neutral::Siginfo,
        "neutral" => neutral::Sigevent,
        "neutral" => neutral::Timex,
        "neutral" => neutral::SemidDs,
        "neutral" => neutral::MsqidDs,
        "neutral" => neutral::ShmidDs,
        "arm/i386" => ilp32::Timespec,
        "arm/i386" => ilp32::Timeval,
        "arm/i386" => ilp32::Itimerspec,
        "arm/i386" => ilp32::Tms,
        "arm/i386" => ilp32::Rlimit,
        "arm/i386" => ilp32::Rusage,
        "arm" => ilp32::Stat,
        "arm/i386" => ilp32::Statfs,
        "arm/i386" => ilp32::Statfs64,
        "arm/i386" => ilp32::Sysinfo,
        "arm/i386" => ilp32::Flock,
        "arm/i386" => ilp32::MqAttr,
        "arm/i386" => ilp32::Siginfo,
        "arm/i386" => ilp32::Sigevent,
        "arm/i386" => ilp32::Timex,
        "arm/i386" => ilp32::SemidDs,
        "arm/i386" => ilp32::MsqidDs,
        "arm/i386" => ilp32::ShmidDs,
        "arm" => arm::Stat64,
        "arm" => arm::EpollEvent,
        "arm64" => arm64::Stat,
        "arm64" => arm64::EpollEvent,
        "arm64" => arm64::SemidDs,
        "i386" => i386::Stat64,
        "i386" => i386::Flock64,
        "arm" => Msghdr<u32>,
        "arm64" => Msghdr<u64>,
        "arm" => Cmsghdr<u32>,
        "arm64" => Cmsghdr<u64>,
    ]
}
