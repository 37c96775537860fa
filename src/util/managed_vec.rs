/// Error value indicating insufficient capacity.
#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd)]
pub struct CapacityError<Element>(pub Element);

/// Wraps a fixed-size slice in a vec-like interface.
///
/// Owned and borrowed packet buffers are treated alike: neither ever grows
/// past the size advertised to the GDB client.
pub struct ManagedVec<'b, T> {
    buf: &'b mut [T],
    len: usize,
}

impl<'b, T> ManagedVec<'b, T> {
    pub fn new(buf: &'b mut [T]) -> Self {
        ManagedVec { buf, len: 0 }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn push(&mut self, value: T) -> Result<(), CapacityError<T>> {
        if self.len < self.buf.len() {
            self.buf[self.len] = value;
            self.len += 1;
            Ok(())
        } else {
            Err(CapacityError(value))
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf[..self.len]
    }

    /// Consume the vec, returning the initialized portion of the backing
    /// slice.
    pub fn into_slice(self) -> &'b mut [T] {
        &mut self.buf[..self.len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_until_full() {
        let mut backing = [0u8; 2];
        let mut v = ManagedVec::new(&mut backing);
        v.push(1).unwrap();
        v.push(2).unwrap();
        assert_eq!(v.push(3), Err(CapacityError(3)));
        assert_eq!(v.into_slice(), [1, 2]);
    }
}
