use crate::core::KernelCatalog;
use crate::utils::error::Result;

/// Kernel used when the notebook's own kernel is not installed.
pub const FALLBACK_KERNEL: &str = "python3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KernelChoice {
    Requested(String),
    Fallback { requested: String, fallback: String },
}

impl KernelChoice {
    pub fn name(&self) -> &str {
        match self {
            KernelChoice::Requested(name) => name,
            KernelChoice::Fallback { fallback, .. } => fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, KernelChoice::Fallback { .. })
    }
}

/// Returns the requested kernel when installed, otherwise [`FALLBACK_KERNEL`].
pub async fn resolve_kernel(requested: &str, catalog: &dyn KernelCatalog) -> Result<KernelChoice> {
    let available = catalog.installed_kernels().await?;
    tracing::debug!("Installed kernels: {:?}", available);

    if available.contains(requested) {
        return Ok(KernelChoice::Requested(requested.to_string()));
    }

    tracing::warn!(
        "Kernel '{}' is not installed, falling back to '{}'",
        requested,
        FALLBACK_KERNEL
    );
    Ok(KernelChoice::Fallback {
        requested: requested.to_string(),
        fallback: FALLBACK_KERNEL.to_string(),
    })
}
