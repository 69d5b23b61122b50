use async_trait::async_trait;

use super::model::Domain;
use crate::error::Result;

/// Operations the hosting platform expects from every registrar module.
#[async_trait]
pub trait Registrar: Send + Sync {
    /// Whether the domain can be registered right now
    async fn is_domain_available(&self, domain: &Domain) -> Result<bool>;

    /// Whether the domain can be transferred in
    async fn is_domain_can_be_transferred(&self, domain: &Domain) -> Result<bool>;

    async fn register_domain(&self, domain: &Domain) -> Result<()>;

    async fn transfer_domain(&self, domain: &Domain) -> Result<()>;

    async fn renew_domain(&self, domain: &Domain) -> Result<()>;

    async fn delete_domain(&self, domain: &Domain) -> Result<()>;

    /// Transfer authorization (EPP) code
    async fn get_epp(&self, domain: &Domain) -> Result<String>;

    /// Fresh copy of `domain` with dates, flags, nameservers and contacts
    /// filled in from the registrar
    async fn get_domain_details(&self, domain: &Domain) -> Result<Domain>;

    async fn modify_ns(&self, domain: &Domain) -> Result<()>;

    async fn modify_contact(&self, domain: &Domain) -> Result<()>;

    async fn lock(&self, domain: &Domain) -> Result<()>;

    async fn unlock(&self, domain: &Domain) -> Result<()>;

    async fn enable_privacy_protection(&self, domain: &Domain) -> Result<()>;

    async fn disable_privacy_protection(&self, domain: &Domain) -> Result<()>;

    /// TLDs this registrar is restricted to; empty means no restriction
    fn supported_tlds(&self) -> Vec<String> {
        Vec::new()
    }

    /// Get the registrar name
    fn registrar_name(&self) -> &'static str;
}
