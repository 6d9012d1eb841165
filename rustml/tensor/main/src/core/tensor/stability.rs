//! NaN and infinity auditing.

use crate::api::error::{TensorError, TensorResult};
use crate::api::types::{Element, Float, ValueClass};
use std::fmt;
use super::tensor::Tensor;

/// Snapshot of the non-finite values in a tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StabilityReport {
    pub has_nan: bool,
    pub has_pos_inf: bool,
    pub has_neg_inf: bool,
    pub nan_count: usize,
    pub pos_inf_count: usize,
    pub neg_inf_count: usize,
    pub first_nan: Option<usize>,
    pub first_pos_inf: Option<usize>,
    pub first_neg_inf: Option<usize>,
}

impl StabilityReport {
    /// True when no NaN or infinity was found.
    pub fn is_clean(&self) -> bool {
        !(self.has_nan || self.has_pos_inf || self.has_neg_inf)
    }

    fn record(&mut self, index: usize, class: ValueClass) {
        let (flag, count, first) = match class {
            ValueClass::Finite => return,
            ValueClass::NaN => (&mut self.has_nan, &mut self.nan_count, &mut self.first_nan),
            ValueClass::PosInf => (
                &mut self.has_pos_inf,
                &mut self.pos_inf_count,
                &mut self.first_pos_inf,
            ),
            ValueClass::NegInf => (
                &mut self.has_neg_inf,
                &mut self.neg_inf_count,
                &mut self.first_neg_inf,
            ),
        };
        *flag = true;
        *count += 1;
        first.get_or_insert(index);
    }

    /// Convert the report into the highest-priority failure:
    /// NaN, then +inf, then -inf.
    pub fn into_result(self) -> TensorResult<()> {
        if let Some(first_index) = self.first_nan {
            return Err(TensorError::HasNaN {
                count: self.nan_count,
                first_index,
            });
        }
        if let Some(first_index) = self.first_pos_inf {
            return Err(TensorError::HasPositiveInfinity {
                count: self.pos_inf_count,
                first_index,
            });
        }
        if let Some(first_index) = self.first_neg_inf {
            return Err(TensorError::HasNegativeInfinity {
                count: self.neg_inf_count,
                first_index,
            });
        }
        Ok(())
    }
}

impl fmt::Display for StabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_clean() {
            return write!(f, "stable");
        }
        let mut parts = Vec::with_capacity(3);
        if let Some(i) = self.first_nan {
            parts.push(format!("{} NaN (first at {})", self.nan_count, i));
        }
        if let Some(i) = self.first_pos_inf {
            parts.push(format!("{} +inf (first at {})", self.pos_inf_count, i));
        }
        if let Some(i) = self.first_neg_inf {
            parts.push(format!("{} -inf (first at {})", self.neg_inf_count, i));
        }
        write!(f, "unstable: {}", parts.join(", "))
    }
}

impl<T: Element> Tensor<T> {
    /// Scan the tensor in one pass. Non-float tensors always report clean.
    pub fn stability_info(&self) -> StabilityReport {
        let mut report = StabilityReport::default();
        if !T::DTYPE.is_float() {
            return report;
        }
        for (i, &v) in self.data.iter().enumerate() {
            report.record(i, v.value_class());
        }
        report
    }

    /// Fail with `HasNaN`, `HasPositiveInfinity` or `HasNegativeInfinity`
    /// (checked in that order) when the tensor holds a non-finite value.
    pub fn check_stability(&self) -> TensorResult<()> {
        let report = self.stability_info();
        if !report.is_clean() {
            log::warn!("{:?}: {}", self, report);
        }
        report.into_result()
    }

    /// True when the tensor holds no NaN or infinity.
    pub fn is_stable(&self) -> bool {
        self.stability_info().is_clean()
    }

    pub fn has_nan(&self) -> bool {
        self.stability_info().has_nan
    }

    pub fn has_inf(&self) -> bool {
        let report = self.stability_info();
        report.has_pos_inf || report.has_neg_inf
    }
}

impl<T: Float> Tensor<T> {
    /// Overwrite every NaN and infinity with `replacement`.
    pub fn replace_unstable(&mut self, replacement: T) {
        for v in self.data.iter_mut() {
            if !v.is_finite() {
                *v = replacement;
            }
        }
    }
}
