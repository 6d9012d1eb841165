use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use crate::api::error::{KernelError, KernelResult};
use crate::core::layer_norm::LayerNorm;
use crate::core::rope::{precompute_freqs_cis, RotaryEmbedding};
use rustml_tensor::{Float, MatmulBackend, Tensor};

/// Attention-block kernel settings, loadable from JSON.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct KernelConfig {
    pub head_dim: usize,
    pub n_heads: usize,
    pub max_seq_len: usize,
    #[serde(default = "default_rope_theta")]
    pub rope_theta: f64,
    /// Rotated features per head; `None` rotates the whole head.
    #[serde(default)]
    pub rot_dim: Option<usize>,
    #[serde(default = "default_interleave")]
    pub interleave: bool,
    #[serde(default = "default_norm_eps")]
    pub norm_eps: f64,
    #[serde(default)]
    pub matmul_backend: MatmulBackend,
}

fn default_rope_theta() -> f64 { 10000.0 }
fn default_interleave() -> bool { true }
fn default_norm_eps() -> f64 { 1e-5 }

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            head_dim: 64,
            n_heads: 12,
            max_seq_len: 2048,
            rope_theta: default_rope_theta(),
            rot_dim: None,
            interleave: default_interleave(),
            norm_eps: default_norm_eps(),
            matmul_backend: MatmulBackend::default(),
        }
    }
}

impl KernelConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> KernelResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: KernelConfig = serde_json::from_reader(reader)
            .map_err(|e| KernelError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> KernelResult<()> {
        if self.head_dim == 0 {
            return Err(KernelError::InvalidConfig("head_dim must be > 0".into()));
        }
        if self.n_heads == 0 {
            return Err(KernelError::InvalidConfig("n_heads must be > 0".into()));
        }
        if self.max_seq_len == 0 {
            return Err(KernelError::InvalidConfig("max_seq_len must be > 0".into()));
        }
        let rot_dim = self.rot_dim();
        if rot_dim == 0 || rot_dim % 2 != 0 {
            return Err(KernelError::InvalidConfig(
                format!("rot_dim ({}) must be even and > 0", rot_dim)
            ));
        }
        if rot_dim > self.head_dim {
            return Err(KernelError::InvalidConfig(
                format!("rot_dim ({}) must not exceed head_dim ({})", rot_dim, self.head_dim)
            ));
        }
        if !(self.rope_theta > 0.0) {
            return Err(KernelError::InvalidConfig(
                format!("rope_theta ({}) must be > 0", self.rope_theta)
            ));
        }
        if !(self.norm_eps > 0.0) {
            return Err(KernelError::InvalidConfig(
                format!("norm_eps ({}) must be > 0", self.norm_eps)
            ));
        }
        Ok(())
    }

    /// Model width covered by all heads.
    pub fn dim(&self) -> usize {
        self.head_dim * self.n_heads
    }

    pub fn rot_dim(&self) -> usize {
        self.rot_dim.unwrap_or(self.head_dim)
    }

    /// The `[max_seq_len, rot_dim / 2, 2]` frequency table this config describes.
    pub fn rope_freqs<T: Float>(&self) -> KernelResult<Tensor<T>> {
        precompute_freqs_cis(self.rot_dim(), self.max_seq_len, self.rope_theta)
    }

    pub fn rotary_embedding<T: Float>(&self) -> KernelResult<RotaryEmbedding<T>> {
        RotaryEmbedding::new(self.rot_dim(), self.max_seq_len, self.rope_theta, self.interleave)
    }

    /// Identity-initialized layer norm over `features` values.
    pub fn layer_norm<T: Float>(&self, features: usize) -> KernelResult<LayerNorm<T>> {
        LayerNorm::new(features, T::from_f64(self.norm_eps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_json_uses_defaults() {
        let config: KernelConfig =
            serde_json::from_str(r#"{"head_dim": 8, "n_heads": 2, "max_seq_len": 16}"#).unwrap();
        assert_eq!(config.rope_theta, 10000.0);
        assert_eq!(config.rot_dim(), 8);
        assert!(config.interleave);
        assert_eq!(config.norm_eps, 1e-5);
        assert_eq!(config.matmul_backend, MatmulBackend::Accelerated);
        assert_eq!(config.dim(), 16);
        config.validate().unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_rot_dim() {
        let mut config = KernelConfig::default();
        config.rot_dim = Some(3);
        assert!(matches!(config.validate(), Err(KernelError::InvalidConfig(_))));
        config.rot_dim = Some(128);
        assert!(matches!(config.validate(), Err(KernelError::InvalidConfig(_))));
    }

    #[test]
    fn test_validate_rejects_non_positive_values() {
        let config = KernelConfig { rope_theta: 0.0, ..KernelConfig::default() };
        assert!(config.validate().is_err());
        let config = KernelConfig { norm_eps: -1.0, ..KernelConfig::default() };
        assert!(config.validate().is_err());
        let config = KernelConfig { n_heads: 0, ..KernelConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rope_freqs_shape() {
        let config = KernelConfig {
            head_dim: 8,
            rot_dim: Some(4),
            max_seq_len: 10,
            ..KernelConfig::default()
        };
        let freqs = config.rope_freqs::<f32>().unwrap();
        assert_eq!(freqs.shape(), &[10, 2, 2]);
        assert_eq!(config.rotary_embedding::<f32>().unwrap().rot_dim(), 4);
    }
}
