//! Voxel element types and typed storage banks.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, VolumeError};

/// Numeric type of the elements held by a [`Volume`](crate::Volume).
///
/// Values cross the storage boundary as `f64`. Writing to an integral type
/// truncates toward zero and saturates at the type's bounds; `NaN` stores as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ElementType {
    /// Unsigned 8-bit integer.
    U8,
    /// Signed 16-bit integer.
    I16,
    /// Unsigned 16-bit integer.
    U16,
    /// Signed 32-bit integer.
    I32,
    /// 32-bit float.
    #[default]
    F32,
    /// 64-bit float.
    F64,
}

impl ElementType {
    /// All element types, narrowest first.
    pub const ALL: [Self; 6] = [
        Self::U8,
        Self::I16,
        Self::U16,
        Self::I32,
        Self::F32,
        Self::F64,
    ];

    /// Canonical lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "uint8",
            Self::I16 => "int16",
            Self::U16 => "uint16",
            Self::I32 => "int32",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }

    /// Size of one element in bytes.
    #[must_use]
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// True for the floating-point types.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unknown element type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown element type: {0:?}")]
pub struct ParseElementTypeError(pub String);

impl FromStr for ElementType {
    type Err = ParseElementTypeError;

    /// Accepts the canonical names and the short names `byte`, `short`, `ushort`,
    /// `int`, `float` and `double`, case-insensitively.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "uint8" | "u8" | "byte" => Ok(Self::U8),
            "int16" | "i16" | "short" => Ok(Self::I16),
            "uint16" | "u16" | "ushort" => Ok(Self::U16),
            "int32" | "i32" | "int" => Ok(Self::I32),
            "float32" | "f32" | "float" => Ok(Self::F32),
            "float64" | "f64" | "double" => Ok(Self::F64),
            _ => Err(ParseElementTypeError(s.to_string())),
        }
    }
}

/// Dense element storage of one [`ElementType`].
#[derive(Debug, Clone, PartialEq)]
pub enum VoxelBuffer {
    /// Unsigned 8-bit elements.
    U8(Vec<u8>),
    /// Signed 16-bit elements.
    I16(Vec<i16>),
    /// Unsigned 16-bit elements.
    U16(Vec<u16>),
    /// Signed 32-bit elements.
    I32(Vec<i32>),
    /// 32-bit float elements.
    F32(Vec<f32>),
    /// 64-bit float elements.
    F64(Vec<f64>),
}

macro_rules! each_variant {
    ($buffer:expr, $data:ident => $body:expr) => {
        match $buffer {
            VoxelBuffer::U8($data) => $body,
            VoxelBuffer::I16($data) => $body,
            VoxelBuffer::U16($data) => $body,
            VoxelBuffer::I32($data) => $body,
            VoxelBuffer::F32($data) => $body,
            VoxelBuffer::F64($data) => $body,
        }
    };
}

impl VoxelBuffer {
    /// A zero-filled buffer of `len` elements.
    #[must_use]
    pub fn zeros(element: ElementType, len: usize) -> Self {
        match element {
            ElementType::U8 => Self::U8(vec![0; len]),
            ElementType::I16 => Self::I16(vec![0; len]),
            ElementType::U16 => Self::U16(vec![0; len]),
            ElementType::I32 => Self::I32(vec![0; len]),
            ElementType::F32 => Self::F32(vec![0.0; len]),
            ElementType::F64 => Self::F64(vec![0.0; len]),
        }
    }

    /// Element type of the buffer.
    #[must_use]
    pub const fn element_type(&self) -> ElementType {
        match self {
            Self::U8(_) => ElementType::U8,
            Self::I16(_) => ElementType::I16,
            Self::U16(_) => ElementType::U16,
            Self::I32(_) => ElementType::I32,
            Self::F32(_) => ElementType::F32,
            Self::F64(_) => ElementType::F64,
        }
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        each_variant!(self, data => data.len())
    }

    /// True when the buffer holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads one element as `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    #[must_use]
    pub fn get(&self, idx: usize) -> f64 {
        each_variant!(self, data => f64::from(data[idx]))
    }

    /// Writes one element, converting from `f64`.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn set(&mut self, idx: usize, value: f64) {
        match self {
            Self::U8(data) => data[idx] = value as u8,
            Self::I16(data) => data[idx] = value as i16,
            Self::U16(data) => data[idx] = value as u16,
            Self::I32(data) => data[idx] = value as i32,
            Self::F32(data) => data[idx] = value as f32,
            Self::F64(data) => data[idx] = value,
        }
    }

    /// Sets every element of `range` to `value`.
    pub fn fill(&mut self, range: std::ops::Range<usize>, value: f64) {
        for idx in range {
            self.set(idx, value);
        }
    }

    /// Copies every element into a new `f64` vector.
    #[must_use]
    pub fn to_f64_vec(&self) -> Vec<f64> {
        each_variant!(self, data => data.iter().map(|&v| f64::from(v)).collect())
    }

    /// Raw native-endian bytes of the buffer.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        each_variant!(self, data => bytemuck::cast_slice(data.as_slice()))
    }

    /// Rebuilds a buffer from raw native-endian bytes.
    ///
    /// # Errors
    ///
    /// Returns [`VolumeError::BufferLength`] if the byte count is not `len` elements
    /// of `element`.
    pub fn from_bytes(element: ElementType, bytes: &[u8], len: usize) -> Result<Self> {
        let expected = len * element.size_bytes();
        if bytes.len() != expected {
            return Err(VolumeError::BufferLength {
                expected,
                actual: bytes.len(),
            });
        }
        Ok(match element {
            ElementType::U8 => Self::U8(bytes.to_vec()),
            ElementType::I16 => Self::I16(read(bytes)),
            ElementType::U16 => Self::U16(read(bytes)),
            ElementType::I32 => Self::I32(read(bytes)),
            ElementType::F32 => Self::F32(read(bytes)),
            ElementType::F64 => Self::F64(read(bytes)),
        })
    }
}

// Element-by-element, so the input need not be aligned.
fn read<T: bytemuck::AnyBitPattern>(bytes: &[u8]) -> Vec<T> {
    bytes
        .chunks_exact(std::mem::size_of::<T>())
        .map(bytemuck::pod_read_unaligned)
        .collect()
}

macro_rules! impl_from_vec {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<Vec<$ty>> for VoxelBuffer {
                fn from(data: Vec<$ty>) -> Self {
                    Self::$variant(data)
                }
            }
        )*
    };
}

impl_from_vec!(u8 => U8, i16 => I16, u16 => U16, i32 => I32, f32 => F32, f64 => F64);

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for ty in ElementType::ALL {
            assert_eq!(ty.name().parse::<ElementType>().unwrap(), ty);
        }
        assert_eq!("DOUBLE".parse::<ElementType>().unwrap(), ElementType::F64);
        assert_eq!("ushort".parse::<ElementType>().unwrap(), ElementType::U16);
        assert!("complex".parse::<ElementType>().is_err());
    }

    #[test]
    fn test_default_is_float32() {
        assert_eq!(ElementType::default(), ElementType::F32);
    }

    #[test]
    fn test_integral_conversion_truncates_and_saturates() {
        let mut buf = VoxelBuffer::zeros(ElementType::U8, 4);
        buf.set(0, 3.9);
        buf.set(1, -5.0);
        buf.set(2, 300.0);
        buf.set(3, f64::NAN);
        assert_eq!(buf.to_f64_vec(), vec![3.0, 0.0, 255.0, 0.0]);

        let mut buf = VoxelBuffer::zeros(ElementType::I16, 2);
        buf.set(0, -2.7);
        buf.set(1, 1e9);
        assert_eq!(buf.get(0), -2.0);
        assert_eq!(buf.get(1), f64::from(i16::MAX));
    }

    #[test]
    fn test_float_storage() {
        let mut buf = VoxelBuffer::zeros(ElementType::F32, 1);
        buf.set(0, 0.25);
        assert_eq!(buf.get(0), 0.25);
        assert_eq!(buf.element_type(), ElementType::F32);
    }

    #[test]
    fn test_fill_range() {
        let mut buf = VoxelBuffer::zeros(ElementType::I32, 5);
        buf.fill(1..4, 7.0);
        assert_eq!(buf.to_f64_vec(), vec![0.0, 7.0, 7.0, 7.0, 0.0]);
    }

    #[test]
    fn test_bytes_round_trip() {
        let buf = VoxelBuffer::from(vec![1u16, 2, 65535]);
        let bytes = buf.as_bytes().to_vec();
        assert_eq!(bytes.len(), 6);
        let back = VoxelBuffer::from_bytes(ElementType::U16, &bytes, 3).unwrap();
        assert_eq!(back, buf);

        let err = VoxelBuffer::from_bytes(ElementType::F64, &bytes, 1).unwrap_err();
        assert_eq!(
            err,
            VolumeError::BufferLength {
                expected: 8,
                actual: 6
            }
        );
    }

    #[test]
    fn test_len_per_variant() {
        for ty in ElementType::ALL {
            let buf = VoxelBuffer::zeros(ty, 7);
            assert_eq!(buf.len(), 7);
            assert_eq!(buf.element_type(), ty);
            assert_eq!(buf.as_bytes().len(), 7 * ty.size_bytes());
        }
    }
}
