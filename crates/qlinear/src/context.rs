//! Quantization Context
//!
//! Bundles what every stage needs: the partitioning config, the optional
//! worker pool and the vector math kernel. The stages are implemented as
//! methods on `QuantContext` in their own modules.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{CpuKernel, QuantKernel, ThreadPool};

use crate::config::QuantConfig;
use crate::error::QuantResult;

/// Shared state for the quantization stages.
#[derive(Debug, Clone, Copy)]
pub struct QuantContext<'p, K: QuantKernel = CpuKernel> {
    config: QuantConfig,
    pool: Option<&'p ThreadPool>,
    kernel: K,
}

impl<'p> QuantContext<'p, CpuKernel> {
    /// Creates a context using the CPU kernel.
    pub fn new(config: QuantConfig, pool: Option<&'p ThreadPool>) -> QuantResult<Self> {
        Self::with_kernel(config, pool, CpuKernel::new())
    }

    /// Default config, CPU kernel, everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            config: QuantConfig::default(),
            pool: None,
            kernel: CpuKernel::new(),
        }
    }
}

impl<'p, K: QuantKernel> QuantContext<'p, K> {
    /// Creates a context with a custom kernel.
    pub fn with_kernel(config: QuantConfig, pool: Option<&'p ThreadPool>, kernel: K) -> QuantResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            pool,
            kernel,
        })
    }

    /// Returns the partitioning config.
    pub fn config(&self) -> &QuantConfig {
        &self.config
    }

    /// Returns the worker pool, if any.
    pub fn pool(&self) -> Option<&'p ThreadPool> {
        self.pool
    }

    /// Returns the vector math kernel.
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_rejected() {
        let config = QuantConfig {
            block_size: 3,
            ..Default::default()
        };
        assert!(QuantContext::new(config, None).is_err());
    }

    #[test]
    fn test_sequential_context() {
        let ctx = QuantContext::sequential();
        assert!(ctx.pool().is_none());
        assert_eq!(ctx.kernel().name(), "cpu");
        assert_eq!(ctx.config(), &QuantConfig::default());
    }
}
