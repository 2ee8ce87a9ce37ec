use thiserror::Error;

/// Errors raised directly by `spartan-core` (event/template/registry
/// concerns). Config-DSL errors live in `spartan-config`; this crate's
/// errors are the ones any module adapter might hit.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("registry error: {0}")]
    Registry(#[from] crate::registry::RegistryError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
