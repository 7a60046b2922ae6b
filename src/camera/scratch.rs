//! The single shared buffer camera payloads are downloaded into.
//!
//! Exclusivity is carried by ownership: [`ScratchBuffer::acquire`] moves the bytes
//! out into a [`Lease`], which cannot be cloned, and [`ScratchBuffer::release`]
//! takes the lease back by value. While a lease exists the buffer is empty, so a
//! second acquisition is impossible.

/// Exclusive access to the scratch bytes.
#[must_use = "a lease must be returned with ScratchBuffer::release"]
#[derive(Debug)]
pub struct Lease<'b> {
    bytes: &'b mut [u8],
}

impl Lease<'_> {
    #[inline]
    pub fn as_slice(&self) -> &[u8] { self.bytes }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] { self.bytes }

    #[inline]
    pub fn len(&self) -> usize { self.bytes.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.bytes.is_empty() }
}

/// Fixed-capacity byte buffer with at most one outstanding [`Lease`].
#[derive(Debug)]
pub struct ScratchBuffer<'b> {
    bytes: Option<&'b mut [u8]>,
    capacity: usize,
}

impl<'b> ScratchBuffer<'b> {
    pub fn new(bytes: &'b mut [u8]) -> Self {
        let capacity = bytes.len();
        Self {
            bytes: Some(bytes),
            capacity,
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize { self.capacity }

    /// Whether no lease is outstanding.
    #[inline]
    pub const fn is_free(&self) -> bool { self.bytes.is_some() }

    /// Take the buffer, or `None` if it is already leased.
    pub fn acquire(&mut self) -> Option<Lease<'b>> { self.bytes.take().map(|bytes| Lease { bytes }) }

    /// Return a lease.
    pub fn release(
        &mut self,
        lease: Lease<'b>,
    ) {
        self.bytes = Some(lease.bytes);
    }
}
