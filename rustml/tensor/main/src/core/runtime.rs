use crate::api::error::{TensorError, TensorResult};
use serde::Deserialize;

/// Runtime configuration for parallelism and thread management.
/// Must be applied (via `apply()`) before any computation to take effect.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Number of threads for faer GEMM and the rayon pool it runs on.
    /// 1 (the default) keeps every operation on the calling thread;
    /// 0 means auto-detect (use all available cores).
    pub num_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { num_threads: 1 }
    }
}

impl RuntimeConfig {
    /// The faer parallelism this config selects.
    pub(crate) fn parallelism(&self) -> faer::Parallelism {
        match self.num_threads {
            1 => faer::Parallelism::None,
            n => faer::Parallelism::Rayon(n),
        }
    }

    /// Apply this runtime configuration globally.
    ///
    /// Sets faer's global parallelism. `Parallelism::Rayon` runs faer's GEMM
    /// on rayon's global pool, so an explicit count above one also sizes that
    /// pool to match. The default (one thread) builds no pool at all. The
    /// rayon pool can only be built once per process; a second attempt
    /// returns `InvalidOperation`.
    pub fn apply(&self) -> TensorResult<()> {
        faer::set_global_parallelism(self.parallelism());

        if self.num_threads > 1 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.num_threads)
                .build_global()
                .map_err(|e| {
                    TensorError::InvalidOperation(format!("Failed to set rayon thread pool: {}", e))
                })?;
        }

        log::info!("[runtime] SIMD: {}", Self::detect_simd());
        let threads = if self.num_threads == 1 {
            1
        } else {
            rayon::current_num_threads()
        };
        log::info!("[runtime] threads: {}", threads);

        Ok(())
    }

    /// Detect available SIMD instruction sets.
    pub fn detect_simd() -> &'static str {
        #[cfg(target_arch = "x86_64")]
        {
            if is_x86_feature_detected!("avx2") {
                return "AVX2";
            }
            if is_x86_feature_detected!("sse2") {
                return "SSE2";
            }
        }
        #[cfg(target_arch = "aarch64")]
        {
            // NEON is always available on aarch64
            return "NEON";
        }
        #[allow(unreachable_code)]
        "scalar"
    }
}
