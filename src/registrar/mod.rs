mod model;
mod openprovider;
mod provider;

pub use model::{Contact, Domain, MAX_NAMESERVERS};
pub use openprovider::OpenProviderRegistrar;
pub use provider::Registrar;

use anyhow::{anyhow, Result};
use std::sync::Arc;

use crate::config::RegistrarConfig;

pub fn create_registrar(name: &str, config: RegistrarConfig) -> Result<Arc<dyn Registrar>> {
    match name.to_lowercase().as_str() {
        "openprovider" => Ok(Arc::new(OpenProviderRegistrar::new(config)?)),
        _ => Err(anyhow!("Unknown registrar: {}", name)),
    }
}
