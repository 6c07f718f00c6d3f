//! Reference-counted byte buffer (§3 "Memory buffer", §4.4).
//!
//! `Bytes` already gives cheap refcounted aliasing, so `MemoryBuffer`
//! layers the ownership bookkeeping spec.md asks for on top of it
//! instead of reimplementing a buffer pool: `clone()` is a non-owning
//! alias, `grab()` materializes an independent owned copy, and `lock()`
//! moves ownership of the allocation to the returned handle.

use bytes::Bytes;

/// Invariant: at most one of any set of buffers sharing the same
/// backing allocation may report `is_free() == true` at a time. `clone`
/// and `lock` are the only ways to produce an alias, and both are
/// careful to hand `owns` to exactly one side.
pub struct MemoryBuffer {
    data: Bytes,
    owns: bool,
}

impl MemoryBuffer {
    /// Allocates a zeroed buffer of `size` bytes, owning it.
    pub fn alloc(size: usize) -> Self {
        MemoryBuffer {
            data: Bytes::from(vec![0u8; size]),
            owns: true,
        }
    }

    /// Wraps already-materialized bytes as an owning buffer.
    pub fn from_bytes(data: Bytes) -> Self {
        MemoryBuffer { data, owns: true }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_bytes(&self) -> Bytes {
        self.data.clone()
    }

    /// Whether this handle owns (and is responsible for) the
    /// allocation, as opposed to being a non-owning view.
    pub fn is_free(&self) -> bool {
        self.owns
    }

    /// Materializes an independent owned copy, decoupled from any
    /// allocation this buffer might be aliasing.
    pub fn grab(&self) -> MemoryBuffer {
        MemoryBuffer {
            data: Bytes::copy_from_slice(&self.data),
            owns: true,
        }
    }

    /// Transfers ownership of the allocation to the returned buffer,
    /// leaving `self` a non-owning view of the same bytes.
    pub fn lock(&mut self) -> MemoryBuffer {
        let owns = self.owns;
        self.owns = false;

        MemoryBuffer {
            data: self.data.clone(),
            owns,
        }
    }

    /// Resizes in place (by truncation) when this buffer uniquely owns
    /// its allocation and is shrinking; otherwise copies into a fresh,
    /// owned allocation.
    pub fn resize(&mut self, new_size: usize) {
        if self.owns && new_size <= self.data.len() {
            self.data = self.data.slice(0..new_size);
            return;
        }

        let mut owned = self.data.to_vec();
        owned.resize(new_size, 0);
        self.data = Bytes::from(owned);
        self.owns = true;
    }

    /// A logical sub-view starting at `offset`, sharing the allocation.
    pub fn view(&self, offset: usize) -> MemoryBuffer {
        MemoryBuffer {
            data: self.data.slice(offset..),
            owns: false,
        }
    }
}

impl Clone for MemoryBuffer {
    /// Cheap, non-owning alias of the same allocation (§3: two buffers
    /// aliasing the same allocation must never both hold `is_free=true`).
    fn clone(&self) -> Self {
        MemoryBuffer {
            data: self.data.clone(),
            owns: false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn alloc_owns_its_allocation() {
        let buf = MemoryBuffer::alloc(16);
        assert!(buf.is_free());
        assert_eq!(buf.len(), 16);
    }

    #[test]
    fn clone_is_non_owning_alias() {
        let original = MemoryBuffer::from_bytes(Bytes::from_static(b"matroska"));
        let aliased = original.clone();

        assert!(original.is_free());
        assert!(!aliased.is_free());
        assert_eq!(original.as_slice(), aliased.as_slice());
    }

    #[test]
    fn grab_decouples_into_an_owned_copy() {
        let original = MemoryBuffer::from_bytes(Bytes::from_static(b"payload"));
        let aliased = original.clone();
        let grabbed = aliased.grab();

        assert!(grabbed.is_free());
        assert_eq!(grabbed.as_slice(), b"payload");
    }

    #[test]
    fn lock_moves_ownership_without_duplicating_is_free() {
        let mut original = MemoryBuffer::alloc(4);
        assert!(original.is_free());

        let locked = original.lock();

        assert!(!original.is_free());
        assert!(locked.is_free());
        assert_eq!(original.as_slice(), locked.as_slice());
    }

    #[test]
    fn resize_grows_by_copying() {
        let mut buf = MemoryBuffer::from_bytes(Bytes::from_static(b"ab"));
        buf.resize(4);
        assert_eq!(buf.as_slice(), &[b'a', b'b', 0, 0]);
    }

    #[test]
    fn resize_shrinks_in_place_when_owning() {
        let mut buf = MemoryBuffer::alloc(8);
        buf.resize(3);
        assert_eq!(buf.len(), 3);
        assert!(buf.is_free());
    }
}
