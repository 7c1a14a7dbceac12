//! Element types that a dataset can store.

use std::fmt;
use std::str::FromStr;

use ndarray_npy::{ReadableElement, WritableElement};
use serde::Serialize;

use crate::error::ShowersetError;

/// Element dtype tag, named after the NumPy dtype it is stored as on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Dtype {
    #[serde(rename = "uint8")]
    U8,
    #[serde(rename = "uint16")]
    U16,
    #[serde(rename = "int32")]
    I32,
    #[serde(rename = "int64")]
    I64,
    #[serde(rename = "float32")]
    F32,
    #[serde(rename = "float64")]
    F64,
}

impl Dtype {
    pub const ALL: [Dtype; 6] = [
        Dtype::U8,
        Dtype::U16,
        Dtype::I32,
        Dtype::I64,
        Dtype::F32,
        Dtype::F64,
    ];

    /// The NumPy name of this dtype.
    pub fn name(&self) -> &'static str {
        match self {
            Dtype::U8 => "uint8",
            Dtype::U16 => "uint16",
            Dtype::I32 => "int32",
            Dtype::I64 => "int64",
            Dtype::F32 => "float32",
            Dtype::F64 => "float64",
        }
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dtype {
    type Err = ShowersetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Dtype::ALL
            .into_iter()
            .find(|dtype| dtype.name() == trimmed)
            .ok_or_else(|| ShowersetError::UnknownDtype(trimmed.to_string()))
    }
}

/// A scalar type usable as a dataset element.
///
/// The bound on the `.npy` element traits lets every item array be written
/// to and read from disk without conversion.
pub trait Element:
    Copy
    + PartialOrd
    + Default
    + fmt::Debug
    + ReadableElement
    + WritableElement
    + Send
    + Sync
    + 'static
{
    /// Dtype tag recorded in the dataset config.
    const DTYPE: Dtype;
}

macro_rules! impl_element {
    ($($ty:ty => $dtype:expr),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: Dtype = $dtype;
            }
        )*
    };
}

impl_element! {
    u8 => Dtype::U8,
    u16 => Dtype::U16,
    i32 => Dtype::I32,
    i64 => Dtype::I64,
    f32 => Dtype::F32,
    f64 => Dtype::F64,
}
