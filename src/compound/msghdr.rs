//! Socket message headers: `sendmsg`, `recvmsg`, `sendmmsg`, `recvmmsg`.
//!
//! The name and vector pointers are translated in place. Control messages
//! are used in place when the guest header matches the host one; otherwise
//! (32-bit guest, 64-bit host) they are re-encoded with host-sized headers
//! on the way in and with guest-sized headers on the way out.

use std::{borrow::Cow, mem, ptr};

use super::iovec::IoVectors;
use crate::{
    abi::{Cmsghdr, Mmsghdr, Msghdr, Record, Word, ilp32},
    errno::Errno,
    memory::{self, AddressSpace},
};

/// Vector elements accepted per message header.
pub const MSG_IOV_MAX: usize = 16;

/// Messages handled per `sendmmsg`/`recvmmsg`; larger counts are clamped like
/// the kernel does.
pub const MMSG_VLEN_MAX: usize = 1024;

const HOST_CMSG_HDR: usize = size_of::<libc::cmsghdr>();
const HOST_CMSG_ALIGN: usize = size_of::<usize>();

const SOL_SOCKET: i32 = 1;
const SCM_TIMESTAMP: i32 = 29;
const SCM_TIMESTAMPNS: i32 = 35;
const SCM_TIMESTAMPING: i32 = 37;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Send,
    Recv,
}

#[derive(Debug)]
enum Control {
    None,
    /// The guest buffer, used in place.
    Direct { host: usize, len: usize },
    /// Outgoing messages re-encoded for the host.
    Widened(Vec<u8>),
    /// Host-side landing buffer for incoming messages.
    Staged {
        guest: u64,
        guest_len: usize,
        buf: Vec<u8>,
    },
}

impl Control {
    fn from_guest<W: Word>(
        mem: &dyn AddressSpace,
        addr: u64,
        len: u64,
        dir: Direction,
    ) -> Result<Self, Errno> {
        if len == 0 {
            return Ok(Control::None);
        }
        let len = usize::try_from(len).map_err(|_| Errno::EINVAL)?;
        if !needs_relayout::<W>() {
            let host = memory::translate_range(mem, addr, len)?;
            return Ok(Control::Direct { host, len });
        }
        match dir {
            Direction::Send => {
                let guest = memory::read_bytes(mem, addr, len)?;
                Ok(Control::Widened(widen_cmsgs::<W>(&guest)?))
            }
            Direction::Recv => {
                memory::translate_range(mem, addr, len)?;
                Ok(Control::Staged {
                    guest: addr,
                    guest_len: len,
                    buf: vec![0; len * 2],
                })
            }
        }
    }

    fn host(&mut self) -> (usize, usize) {
        match self {
            Control::None => (0, 0),
            Control::Direct { host, len } => (*host, *len),
            Control::Widened(buf) | Control::Staged { buf, .. } => {
                (buf.as_mut_ptr() as usize, buf.len())
            }
        }
    }
}

fn needs_relayout<W: Word>() -> bool {
    size_of::<Cmsghdr<W>>() != HOST_CMSG_HDR
}

fn cmsg_align(len: usize, align: usize) -> usize {
    (len + align - 1) & !(align - 1)
}

/// Re-encode guest control messages with host-sized headers.
///
/// A header whose length is shorter than itself or runs past the buffer is
/// `EINVAL`, as the kernel reports it.
pub fn widen_cmsgs<W: Word>(guest: &[u8]) -> Result<Vec<u8>, Errno> {
    let ghdr = size_of::<Cmsghdr<W>>();
    let mut out = Vec::new();
    let mut off = 0;
    while off + ghdr <= guest.len() {
        let hdr: Cmsghdr<W> = unsafe { ptr::read_unaligned(guest[off..].as_ptr().cast()) };
        let len: u64 = hdr.cmsg_len.into();
        let len = usize::try_from(len).map_err(|_| Errno::EINVAL)?;
        if len < ghdr || len > guest.len() - off {
            return Err(Errno::EINVAL);
        }
        let payload = &guest[off + ghdr..off + len];
        let start = out.len();
        out.resize(start + cmsg_align(HOST_CMSG_HDR + payload.len(), HOST_CMSG_ALIGN), 0);
        let host = Cmsghdr::<usize> {
            cmsg_len: HOST_CMSG_HDR + payload.len(),
            cmsg_level: hdr.cmsg_level,
            cmsg_type: hdr.cmsg_type,
        };
        unsafe { ptr::write_unaligned(out[start..].as_mut_ptr().cast(), host) };
        out[start + HOST_CMSG_HDR..start + HOST_CMSG_HDR + payload.len()].copy_from_slice(payload);
        off += cmsg_align(len, W::BYTES);
    }
    Ok(out)
}

/// Re-lay an array of host time records as the guest's 32-bit ones.
fn narrow_times<T: Record>(payload: &[u8]) -> Vec<u8> {
    let wide = size_of::<T::Neutral>();
    let mut out = vec![0u8; payload.len() / wide * size_of::<T>()];
    for (i, chunk) in payload.chunks_exact(wide).enumerate() {
        let neutral: T::Neutral = unsafe { ptr::read_unaligned(chunk.as_ptr().cast()) };
        let at = i * size_of::<T>();
        unsafe { ptr::write_unaligned(out[at..].as_mut_ptr().cast(), T::from_neutral(&neutral)) };
    }
    out
}

/// The guest form of a control message payload. Socket timestamps carry
/// `long`-sized times; everything else is copied as is.
fn narrow_payload<W: Word>(level: i32, kind: i32, payload: &[u8]) -> Cow<'_, [u8]> {
    if W::BYTES == HOST_CMSG_ALIGN || level != SOL_SOCKET {
        return Cow::Borrowed(payload);
    }
    match kind {
        SCM_TIMESTAMP => Cow::Owned(narrow_times::<ilp32::Timeval>(payload)),
        SCM_TIMESTAMPNS | SCM_TIMESTAMPING => Cow::Owned(narrow_times::<ilp32::Timespec>(payload)),
        _ => Cow::Borrowed(payload),
    }
}

/// Re-encode host control messages with guest-sized headers into at most
/// `capacity` bytes. The flag is set when a message had to be dropped.
pub fn narrow_cmsgs<W: Word>(host: &[u8], capacity: usize) -> (Vec<u8>, bool) {
    let ghdr = size_of::<Cmsghdr<W>>();
    let mut out = Vec::new();
    let mut off = 0;
    while off + HOST_CMSG_HDR <= host.len() {
        let hdr: Cmsghdr<usize> = unsafe { ptr::read_unaligned(host[off..].as_ptr().cast()) };
        if hdr.cmsg_len < HOST_CMSG_HDR || hdr.cmsg_len > host.len() - off {
            break;
        }
        let payload = narrow_payload::<W>(
            hdr.cmsg_level,
            hdr.cmsg_type,
            &host[off + HOST_CMSG_HDR..off + hdr.cmsg_len],
        );
        let len = ghdr + payload.len();
        let start = out.len();
        if start + len > capacity {
            return (out, true);
        }
        out.resize((start + cmsg_align(len, W::BYTES)).min(capacity), 0);
        let guest = Cmsghdr::<W> {
            cmsg_len: W::from_u64(len as u64),
            cmsg_level: hdr.cmsg_level,
            cmsg_type: hdr.cmsg_type,
        };
        unsafe { ptr::write_unaligned(out[start..].as_mut_ptr().cast(), guest) };
        out[start + ghdr..start + len].copy_from_slice(&payload);
        off += cmsg_align(hdr.cmsg_len, HOST_CMSG_ALIGN);
    }
    (out, false)
}

/// A host `msghdr` rebuilt from a guest one.
#[derive(Debug)]
pub struct HostMsghdr {
    dir: Direction,
    name: usize,
    namelen: u32,
    iov: IoVectors,
    control: Control,
    flags: i32,
}

impl HostMsghdr {
    pub fn from_guest<W: Word>(
        mem: &dyn AddressSpace,
        hdr: &Msghdr<W>,
        dir: Direction,
    ) -> Result<Self, Errno> {
        let iovlen: u64 = hdr.msg_iovlen.into();
        let iov = IoVectors::from_guest::<W>(
            mem,
            hdr.msg_iov.into(),
            usize::try_from(iovlen).unwrap_or(usize::MAX),
            MSG_IOV_MAX,
            Errno::EMSGSIZE,
        )?;
        let name_addr: u64 = hdr.msg_name.into();
        let name = if name_addr == 0 {
            0
        } else {
            memory::translate_range(mem, name_addr, hdr.msg_namelen as usize)?
        };
        let control = Control::from_guest::<W>(
            mem,
            hdr.msg_control.into(),
            hdr.msg_controllen.into(),
            dir,
        )?;
        Ok(Self {
            dir,
            name,
            namelen: hdr.msg_namelen,
            iov,
            control,
            flags: hdr.msg_flags,
        })
    }

    /// The header to pass to the host. Its pointers stay valid while `self`
    /// is alive.
    pub fn raw(&mut self) -> libc::msghdr {
        let (control, controllen) = self.control.host();
        // Field types and padding differ between libc targets.
        let mut raw: libc::msghdr = unsafe { mem::zeroed() };
        raw.msg_name = self.name as *mut libc::c_void;
        raw.msg_namelen = self.namelen as _;
        raw.msg_iov = self.iov.as_ptr() as *mut libc::iovec;
        raw.msg_iovlen = self.iov.len() as _;
        raw.msg_control = control as *mut libc::c_void;
        raw.msg_controllen = controllen as _;
        raw.msg_flags = self.flags;
        raw
    }

    /// Copy what a receive updated into the guest header: the address
    /// length, the control length and the flags. The guest's pointers are
    /// left alone. Sends update nothing.
    pub fn write_back<W: Word>(
        &self,
        mem: &dyn AddressSpace,
        host: &libc::msghdr,
        guest: &mut Msghdr<W>,
    ) -> Result<(), Errno> {
        if self.dir == Direction::Send {
            return Ok(());
        }
        guest.msg_namelen = host.msg_namelen as u32;
        guest.msg_flags = host.msg_flags;
        match &self.control {
            Control::Staged {
                guest: addr,
                guest_len,
                buf,
            } => {
                let used = (host.msg_controllen as usize).min(buf.len());
                let (bytes, truncated) = narrow_cmsgs::<W>(&buf[..used], *guest_len);
                memory::write_bytes(mem, *addr, &bytes)?;
                guest.msg_controllen = W::from_u64(bytes.len() as u64);
                if truncated {
                    guest.msg_flags |= libc::MSG_CTRUNC;
                }
            }
            _ => guest.msg_controllen = W::from_u64(host.msg_controllen as u64),
        }
        Ok(())
    }
}

/// A host `mmsghdr` array rebuilt from a guest one.
pub struct HostMmsgs<W> {
    addr: u64,
    guests: Vec<Mmsghdr<W>>,
    hdrs: Vec<HostMsghdr>,
    raw: Vec<libc::mmsghdr>,
}

impl<W: Word> HostMmsgs<W> {
    /// Rebuild `vlen` guest headers at `addr`, clamped to [`MMSG_VLEN_MAX`].
    pub fn from_guest(
        mem: &dyn AddressSpace,
        addr: u64,
        vlen: usize,
        dir: Direction,
    ) -> Result<Self, Errno> {
        let vlen = vlen.min(MMSG_VLEN_MAX);
        let mut guests = Vec::with_capacity(vlen);
        let mut hdrs = Vec::with_capacity(vlen);
        let mut raw = Vec::with_capacity(vlen);
        for i in 0..vlen {
            let at = addr.wrapping_add((i * size_of::<Mmsghdr<W>>()) as u64);
            let guest: Mmsghdr<W> = memory::load(mem, at)?;
            let mut hdr = HostMsghdr::from_guest(mem, &guest.msg_hdr, dir)?;
            raw.push(libc::mmsghdr {
                msg_hdr: hdr.raw(),
                msg_len: 0,
            });
            guests.push(guest);
            hdrs.push(hdr);
        }
        Ok(Self {
            addr,
            guests,
            hdrs,
            raw,
        })
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// The array as a neutral pointer word.
    pub fn neutral(&mut self) -> u64 {
        self.raw.as_mut_ptr() as usize as u64
    }

    /// Write the first `done` results back: `msg_len` always, and the
    /// receive-updated header fields.
    pub fn write_back(&mut self, mem: &dyn AddressSpace, done: usize) -> Result<(), Errno> {
        for i in 0..done.min(self.raw.len()) {
            let mut guest = self.guests[i];
            self.hdrs[i].write_back(mem, &self.raw[i].msg_hdr, &mut guest.msg_hdr)?;
            guest.msg_len = self.raw[i].msg_len;
            let at = self.addr.wrapping_add((i * size_of::<Mmsghdr<W>>()) as u64);
            memory::store(mem, at, &guest)?;
        }
        Ok(())
    }
}
