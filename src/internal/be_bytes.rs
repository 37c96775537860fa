/// A trait for working with integers as big-endian byte arrays.
///
/// Used when turning hex-decoded packet fields (addresses, lengths) back into
/// numbers, and when writing numbers out in their most compact hex form.
pub trait BeBytes: Sized {
    /// Write the memory representation of `self` as a byte array in
    /// big-endian (network) byte order into the provided buffer.
    fn to_be_bytes(self, buf: &mut [u8]) -> Option<usize>;

    /// Parse `self` from a byte array in big-endian (network) byte order.
    /// Returns None upon overflow.
    fn from_be_bytes(buf: &[u8]) -> Option<Self>;
}

macro_rules! impl_be_bytes {
    ($($num:ty)*) => {
        $(
            impl BeBytes for $num {
                fn to_be_bytes(self, buf: &mut [u8]) -> Option<usize> {
                    let len = core::mem::size_of::<$num>();
                    if buf.len() < len {
                        return None
                    }
                    buf[..len].copy_from_slice(&<$num>::to_be_bytes(self));
                    Some(len)
                }

                fn from_be_bytes(buf: &[u8]) -> Option<Self> {
                    let len = core::mem::size_of::<$num>();

                    // leading zero bytes are fine, anything else overflows
                    let buf = if buf.len() > len {
                        let (extra, buf) = buf.split_at(buf.len() - len);
                        if extra.iter().any(|&b| b != 0) {
                            return None
                        }
                        buf
                    } else {
                        buf
                    };

                    let mut res: Self = 0;
                    for b in buf.iter().copied() {
                        // `res <<= 8` would overflow in the `u8` case
                        res <<= 4;
                        res <<= 4;
                        res |= b as Self;
                    }

                    Some(res)
                }
            }
        )*
    };
}

impl_be_bytes!(u8 u16 u32 u64 usize);
