//! Element types for tensor storage.
//!
//! The trait hierarchy mirrors what operations need from a scalar:
//!
//! - `Element`: anything that can live in a tensor buffer (including `bool` masks)
//! - `Numeric`: element types with `+`, `-`, `*` and ordering
//! - `Float`: floating-point types with transcendental functions and a GEMM hook

use half::{bf16, f16};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Data type tag for tensor elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    F32,
    F64,
    F16,
    BF16,
    I32,
    I64,
    U8,
    Bool,
}

impl DType {
    /// Per-element byte size.
    pub fn size(&self) -> usize {
        match self {
            DType::F64 | DType::I64 => 8,
            DType::F32 | DType::I32 => 4,
            DType::F16 | DType::BF16 => 2,
            DType::U8 | DType::Bool => 1,
        }
    }

    /// Whether values of this type can be NaN or infinite.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64 | DType::F16 | DType::BF16)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::F32 => "f32",
            DType::F64 => "f64",
            DType::F16 => "f16",
            DType::BF16 => "bf16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::U8 => "u8",
            DType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// Classification of a single value by a stability audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueClass {
    Finite,
    NaN,
    PosInf,
    NegInf,
}

/// Base trait for every type that can be stored in a tensor.
pub trait Element: Copy + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// The matching dtype tag.
    const DTYPE: DType;

    /// Classify this value. Non-float types are always finite.
    fn value_class(self) -> ValueClass {
        ValueClass::Finite
    }
}

/// Element types supporting arithmetic and ordering.
pub trait Numeric:
    Element + PartialOrd + Add<Output = Self> + Sub<Output = Self> + Mul<Output = Self>
{
    const ZERO: Self;
    const ONE: Self;

    fn from_usize(n: usize) -> Self;
}

/// Floating-point element types.
pub trait Float: Numeric + Div<Output = Self> + Neg<Output = Self> {
    const INFINITY: Self;
    const NEG_INFINITY: Self;

    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;
    fn sqrt(self) -> Self;
    fn exp(self) -> Self;
    fn ln(self) -> Self;
    fn tanh(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn is_nan(self) -> bool;
    fn is_finite(self) -> bool;

    /// Row-major `out[m, n] = a[m, k] * b[k, n]`, with `out` zero-initialized.
    ///
    /// Types without an accelerated kernel use the reference triple loop.
    fn gemm(a: &[Self], b: &[Self], out: &mut [Self], m: usize, k: usize, n: usize) {
        crate::core::tensor::linalg::reference_gemm(a, b, out, m, k, n);
    }
}

fn classify_f64(v: f64) -> ValueClass {
    if v.is_nan() {
        ValueClass::NaN
    } else if v == f64::INFINITY {
        ValueClass::PosInf
    } else if v == f64::NEG_INFINITY {
        ValueClass::NegInf
    } else {
        ValueClass::Finite
    }
}

macro_rules! impl_native_float {
    ($($ty:ty => $dtype:expr, $gemm:path);+ $(;)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = $dtype;

                fn value_class(self) -> ValueClass {
                    classify_f64(self as f64)
                }
            }

            impl Numeric for $ty {
                const ZERO: Self = 0.0;
                const ONE: Self = 1.0;

                fn from_usize(n: usize) -> Self {
                    n as $ty
                }
            }

            impl Float for $ty {
                const INFINITY: Self = <$ty>::INFINITY;
                const NEG_INFINITY: Self = <$ty>::NEG_INFINITY;

                fn from_f64(v: f64) -> Self { v as $ty }
                fn to_f64(self) -> f64 { self as f64 }
                fn sqrt(self) -> Self { <$ty>::sqrt(self) }
                fn exp(self) -> Self { <$ty>::exp(self) }
                fn ln(self) -> Self { <$ty>::ln(self) }
                fn tanh(self) -> Self { <$ty>::tanh(self) }
                fn sin(self) -> Self { <$ty>::sin(self) }
                fn cos(self) -> Self { <$ty>::cos(self) }
                fn is_nan(self) -> bool { <$ty>::is_nan(self) }
                fn is_finite(self) -> bool { <$ty>::is_finite(self) }

                fn gemm(a: &[Self], b: &[Self], out: &mut [Self], m: usize, k: usize, n: usize) {
                    $gemm(a, b, out, m, k, n);
                }
            }
        )+
    };
}

// Half-precision types compute through f32 and use the reference GEMM.
macro_rules! impl_half_float {
    ($($ty:ty => $dtype:expr);+ $(;)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = $dtype;

                fn value_class(self) -> ValueClass {
                    classify_f64(self.to_f64())
                }
            }

            impl Numeric for $ty {
                const ZERO: Self = <$ty>::ZERO;
                const ONE: Self = <$ty>::ONE;

                fn from_usize(n: usize) -> Self {
                    <$ty>::from_f64(n as f64)
                }
            }

            impl Float for $ty {
                const INFINITY: Self = <$ty>::INFINITY;
                const NEG_INFINITY: Self = <$ty>::NEG_INFINITY;

                fn from_f64(v: f64) -> Self { <$ty>::from_f64(v) }
                fn to_f64(self) -> f64 { <$ty>::to_f64(self) }
                fn sqrt(self) -> Self { <$ty>::from_f32(self.to_f32().sqrt()) }
                fn exp(self) -> Self { <$ty>::from_f32(self.to_f32().exp()) }
                fn ln(self) -> Self { <$ty>::from_f32(self.to_f32().ln()) }
                fn tanh(self) -> Self { <$ty>::from_f32(self.to_f32().tanh()) }
                fn sin(self) -> Self { <$ty>::from_f32(self.to_f32().sin()) }
                fn cos(self) -> Self { <$ty>::from_f32(self.to_f32().cos()) }
                fn is_nan(self) -> bool { <$ty>::is_nan(self) }
                fn is_finite(self) -> bool { <$ty>::is_finite(self) }
            }
        )+
    };
}

macro_rules! impl_integer {
    ($($ty:ty => $dtype:expr);+ $(;)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = $dtype;
            }

            impl Numeric for $ty {
                const ZERO: Self = 0;
                const ONE: Self = 1;

                fn from_usize(n: usize) -> Self {
                    n as $ty
                }
            }
        )+
    };
}

impl_native_float!(
    f32 => DType::F32, crate::core::tensor::linalg::gemm_f32;
    f64 => DType::F64, crate::core::tensor::linalg::gemm_f64;
);

impl_half_float!(
    f16 => DType::F16;
    bf16 => DType::BF16;
);

impl_integer!(
    i32 => DType::I32;
    i64 => DType::I64;
    u8 => DType::U8;
);

impl Element for bool {
    const DTYPE: DType = DType::Bool;
}
