//! Bounds-checked little-endian reads for method body parsing.
//!
//! CIL method headers, operands and exception-handling clauses are all stored little-endian.
//! [`CilIO`] abstracts the conversion from a fixed-size byte array to a primitive, and
//! [`read_le`] / [`read_le_at`] perform the checked slice access on top of it. Every read
//! returns [`crate::Error::OutOfBounds`] instead of panicking when the buffer is too short.

use crate::{Error::OutOfBounds, Result};

/// Primitive types that can be read from a little-endian byte buffer.
///
/// The associated `Bytes` type is the fixed-size array matching the size of the type
/// (e.g. `[u8; 4]` for `u32`), which lets [`read_le_at`] convert a slice without copying
/// through an intermediate buffer.
pub trait CilIO: Sized {
    /// Byte array type for this numeric type
    type Bytes: Sized + for<'a> TryFrom<&'a [u8]>;

    /// Read T from a byte buffer in little-endian
    fn from_le_bytes(bytes: Self::Bytes) -> Self;
}

macro_rules! impl_cilio {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CilIO for $ty {
                type Bytes = [u8; std::mem::size_of::<$ty>()];

                fn from_le_bytes(bytes: Self::Bytes) -> Self {
                    <$ty>::from_le_bytes(bytes)
                }
            }
        )*
    };
}

impl_cilio!(u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

/// Reads a `T` from the start of `data`.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if `data` is shorter than `T`.
pub fn read_le<T: CilIO>(data: &[u8]) -> Result<T> {
    let mut offset = 0_usize;
    read_le_at(data, &mut offset)
}

/// Reads a `T` at `offset` and advances `offset` past it.
///
/// # Errors
/// Returns [`crate::Error::OutOfBounds`] if fewer than `size_of::<T>()` bytes remain,
/// in which case `offset` is left untouched.
pub fn read_le_at<T: CilIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let type_len = std::mem::size_of::<T>();
    let Some(end) = offset.checked_add(type_len) else {
        return Err(OutOfBounds);
    };
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let Ok(read) = data[*offset..end].try_into() else {
        return Err(OutOfBounds);
    };

    *offset = end;

    Ok(T::from_le_bytes(read))
}
