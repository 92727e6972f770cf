use std::ptr;

use crate::{
    abi::{Iovec, Word},
    errno::Errno,
    memory::{self, AddressSpace},
};

/// Upper bound on elements for the vectored I/O calls (`UIO_MAXIOV`).
pub const IOV_MAX: usize = 1024;

/// A host `iovec` array rebuilt from a guest one.
#[derive(Debug, Default)]
pub struct IoVectors {
    vecs: Vec<libc::iovec>,
}

impl IoVectors {
    /// Rebuild `count` guest `iovec`s starting at `addr`.
    ///
    /// A count above `limit` fails with `over` before any element is read.
    /// Every non-empty buffer must be mapped in full.
    pub fn from_guest<W: Word>(
        mem: &dyn AddressSpace,
        addr: u64,
        count: usize,
        limit: usize,
        over: Errno,
    ) -> Result<Self, Errno> {
        if count > limit {
            return Err(over);
        }
        let mut vecs = Vec::with_capacity(count);
        for i in 0..count {
            let at = addr.wrapping_add((i * size_of::<Iovec<W>>()) as u64);
            let iov: Iovec<W> = memory::load(mem, at)?;
            let base: u64 = iov.iov_base.into();
            let len: u64 = iov.iov_len.into();
            let len = usize::try_from(len).map_err(|_| Errno::EINVAL)?;
            let host = if len == 0 {
                0
            } else {
                memory::translate_range(mem, base, len)?
            };
            vecs.push(libc::iovec {
                iov_base: host as *mut libc::c_void,
                iov_len: len,
            });
        }
        Ok(Self { vecs })
    }

    pub fn len(&self) -> usize {
        self.vecs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vecs.is_empty()
    }

    pub fn as_ptr(&self) -> *const libc::iovec {
        if self.vecs.is_empty() {
            ptr::null()
        } else {
            self.vecs.as_ptr()
        }
    }

    /// The array as a neutral pointer word.
    pub fn neutral(&self) -> u64 {
        self.as_ptr() as usize as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::arena;

    #[test]
    fn translates_each_buffer() {
        let (mem, base) = arena();
        let vecs = [
            Iovec::<u32> { iov_base: base as u32 + 0x100, iov_len: 4 },
            Iovec::<u32> { iov_base: 0, iov_len: 0 },
            Iovec::<u32> { iov_base: base as u32 + 0x200, iov_len: 8 },
        ];
        memory::store(&mem, base, &vecs).unwrap();

        let host = IoVectors::from_guest::<u32>(&mem, base, 3, IOV_MAX, Errno::EINVAL).unwrap();
        assert_eq!(host.len(), 3);
        let raw = unsafe { std::slice::from_raw_parts(host.as_ptr(), 3) };
        assert_eq!(raw[0].iov_base as usize, mem.guest_to_host(base + 0x100).unwrap());
        assert_eq!(raw[0].iov_len, 4);
        assert!(raw[1].iov_base.is_null());
        assert_eq!(raw[2].iov_len, 8);
    }

    #[test]
    fn counts_above_the_limit_are_rejected_unread() {
        let (mem, base) = arena();
        // Points nowhere: reading any element would fault.
        let err = IoVectors::from_guest::<u32>(&mem, 0xdead_0000, 17, 16, Errno::EMSGSIZE);
        assert_eq!(err.unwrap_err(), Errno::EMSGSIZE);
        let err = IoVectors::from_guest::<u32>(&mem, base, IOV_MAX + 1, IOV_MAX, Errno::EINVAL);
        assert_eq!(err.unwrap_err(), Errno::EINVAL);
    }

    #[test]
    fn unmapped_buffers_fault() {
        let (mem, base) = arena();
        let iov = Iovec::<u32> { iov_base: 0x10, iov_len: 4 };
        memory::store(&mem, base, &iov).unwrap();
        let err = IoVectors::from_guest::<u32>(&mem, base, 1, IOV_MAX, Errno::EINVAL);
        assert_eq!(err.unwrap_err(), Errno::EFAULT);
    }
}
