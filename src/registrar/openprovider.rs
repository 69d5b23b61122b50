use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info};

use super::model::{Contact, Domain, MAX_NAMESERVERS};
use super::provider::Registrar;
use crate::api::schema::{
    Address, AuthCodeData, CheckDomainsRequest, CreateDomainRequest, CustomerPayload,
    CustomerRecord, CustomerSummary, DeleteDomainRequest, DomainCheckResult, DomainName,
    DomainRecord, DomainSummary, Handles, NameServer, PersonName, Phone, RenewDomainRequest,
    ResultList, UpdateDomainRequest,
};
use crate::api::ApiClient;
use crate::config::RegistrarConfig;
use crate::error::{RegistrarError, Result, ResultExt};

const REGISTRAR_NAME: &str = "openprovider";
const DEFAULT_NS_GROUP: &str = "dns-openprovider";
const AUTORENEW: &str = "default";
const DELETE_REASON: &str = "By user";
const STATUS_FREE: &str = "free";
const STATUS_TRANSFER: &str = "transfer";
const MIN_NAMESERVERS: usize = 2;

/// Registrar backed by the OpenProvider `v1beta` REST API.
pub struct OpenProviderRegistrar {
    api: ApiClient,
}

impl OpenProviderRegistrar {
    pub fn new(config: RegistrarConfig) -> Result<Self> {
        config.validate()?;
        let api = ApiClient::new(&config)?;
        Ok(Self { api })
    }

    fn domain_name(domain: &Domain) -> DomainName {
        DomainName {
            name: domain.sld.clone(),
            extension: domain.extension().to_string(),
        }
    }

    fn period(domain: &Domain) -> Result<u32> {
        if domain.registration_period == 0 {
            return Err(RegistrarError::invalid_input(format!(
                "registration period for {} must be at least one year",
                domain.name()
            )));
        }
        Ok(domain.registration_period)
    }

    /// Status string of the first result of a domain check, if any.
    async fn check_status(&self, domain: &Domain) -> Result<Option<String>> {
        let request = CheckDomainsRequest {
            domains: vec![Self::domain_name(domain)],
        };

        let results: ResultList<DomainCheckResult> = self
            .api
            .post("/domains/check", &request)
            .await?
            .into_data("POST /domains/check")?;

        let status = results.results.into_iter().next().map(|result| result.status);
        debug!("Check status for {}: {:?}", domain.name(), status);
        Ok(status)
    }

    /// Resolve the OpenProvider domain ID for a fully-qualified name.
    pub async fn domain_id(&self, domain: &Domain) -> Result<u64> {
        self.lookup_domain_id(domain)
            .await
            .context("Failed to fetch domain ID")
    }

    async fn lookup_domain_id(&self, domain: &Domain) -> Result<u64> {
        let name = domain.name();

        let results: ResultList<DomainSummary> = self
            .api
            .get("/domains", &[("full_name", name.as_str())])
            .await?
            .into_data("GET /domains")?;

        results
            .results
            .first()
            .map(|summary| summary.id)
            .ok_or_else(|| RegistrarError::not_found("Domain", name))
    }

    /// Handle of the customer with the contact's email, creating one if
    /// none exists. With `update_existing` the found customer is
    /// overwritten with the contact's details.
    pub async fn customer_handle(
        &self,
        contact: &Contact,
        update_existing: bool,
    ) -> Result<String> {
        if contact.email.trim().is_empty() {
            return Err(RegistrarError::invalid_input(
                "contact email is required to look up the customer handle",
            ));
        }

        let payload = customer_payload(contact);

        if let Some(handle) = self.find_customer_by_email(&contact.email).await? {
            if update_existing {
                self.api
                    .put(&format!("/customers/{}", handle), &payload)
                    .await
                    .and_then(|response| response.ensure_success())
                    .context("Failed to update contact")?;
                info!("Updated customer {}", handle);
            }
            return Ok(handle);
        }

        let handle = self
            .create_customer(&payload)
            .await
            .context("Failed to create customer")?;
        info!("Created customer {} for {}", handle, contact.email);
        Ok(handle)
    }

    async fn find_customer_by_email(&self, email: &str) -> Result<Option<String>> {
        self.search_customer(email)
            .await
            .context("Failed to find customer by email")
    }

    async fn search_customer(&self, email: &str) -> Result<Option<String>> {
        let results: ResultList<CustomerSummary> = self
            .api
            .get("/customers", &[("email_pattern", email)])
            .await?
            .into_data("GET /customers")?;

        Ok(results.results.into_iter().next().map(|customer| customer.handle))
    }

    async fn create_customer(&self, payload: &CustomerPayload) -> Result<String> {
        let created: CustomerSummary = self
            .api
            .post("/customers", payload)
            .await?
            .into_data("POST /customers")?;
        Ok(created.handle)
    }

    async fn fetch_customer(&self, handle: &str) -> Result<CustomerRecord> {
        self.load_customer(handle)
            .await
            .context(&format!("Failed to fetch customer {}", handle))
    }

    async fn load_customer(&self, handle: &str) -> Result<CustomerRecord> {
        self.api
            .get(&format!("/customers/{}", handle), &[])
            .await?
            .into_data("GET /customers/{handle}")
    }

    fn create_request(
        domain: &Domain,
        handle: &str,
        auth_code: Option<String>,
    ) -> Result<CreateDomainRequest> {
        Ok(CreateDomainRequest {
            domain: Self::domain_name(domain),
            period: Self::period(domain)?,
            handles: Handles::uniform(handle),
            ns_group: DEFAULT_NS_GROUP,
            autorenew: AUTORENEW,
            auth_code,
        })
    }

    /// Look up the domain ID and send a partial update.
    async fn update_domain(&self, domain: &Domain, update: UpdateDomainRequest) -> Result<()> {
        let id = self.domain_id(domain).await?;
        self.api
            .put(&format!("/domains/{}", id), &update)
            .await?
            .ensure_success()?;
        Ok(())
    }
}

#[async_trait]
impl Registrar for OpenProviderRegistrar {
    async fn is_domain_available(&self, domain: &Domain) -> Result<bool> {
        let status = self.check_status(domain).await?;
        Ok(status.as_deref() == Some(STATUS_FREE))
    }

    async fn is_domain_can_be_transferred(&self, domain: &Domain) -> Result<bool> {
        let status = self.check_status(domain).await?;
        Ok(status.as_deref() == Some(STATUS_TRANSFER))
    }

    async fn register_domain(&self, domain: &Domain) -> Result<()> {
        Self::period(domain)?;
        let handle = self.customer_handle(&domain.contact_admin, false).await?;
        let request = Self::create_request(domain, &handle, None)?;

        self.api.post("/domains", &request).await?.ensure_success()?;

        info!("Registered {} for {} year(s)", domain.name(), request.period);
        Ok(())
    }

    async fn transfer_domain(&self, domain: &Domain) -> Result<()> {
        let auth_code = domain
            .epp
            .as_deref()
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .ok_or_else(|| {
                RegistrarError::invalid_input(format!(
                    "an EPP code is required to transfer {}",
                    domain.name()
                ))
            })?
            .to_string();
        Self::period(domain)?;

        let handle = self.customer_handle(&domain.contact_admin, false).await?;
        let request = Self::create_request(domain, &handle, Some(auth_code))?;

        self.api
            .post("/domains/transfer", &request)
            .await?
            .ensure_success()?;

        info!("Requested transfer of {}", domain.name());
        Ok(())
    }

    async fn renew_domain(&self, domain: &Domain) -> Result<()> {
        let period = Self::period(domain)?;
        let id = self.domain_id(domain).await?;

        let request = RenewDomainRequest {
            domain: Self::domain_name(domain),
            period,
        };

        self.api
            .post(&format!("/domains/{}/renew", id), &request)
            .await?
            .ensure_success()?;

        info!("Renewed {} for {} year(s)", domain.name(), period);
        Ok(())
    }

    async fn delete_domain(&self, domain: &Domain) -> Result<()> {
        let id = self.domain_id(domain).await?;

        let request = DeleteDomainRequest {
            skip_soft_quarantine: false,
            force_delete: false,
            kind: DELETE_REASON,
        };

        self.api
            .delete(&format!("/domains/{}", id), &request)
            .await?
            .ensure_success()?;

        info!("Deleted {}", domain.name());
        Ok(())
    }

    async fn get_epp(&self, domain: &Domain) -> Result<String> {
        let id = self.domain_id(domain).await?;

        let data: AuthCodeData = self
            .api
            .get(&format!("/domains/{}/authcode", id), &[])
            .await?
            .into_data("GET /domains/{id}/authcode")?;

        data.auth_code
            .filter(|code| !code.is_empty())
            .ok_or_else(|| RegistrarError::not_found("Auth code", domain.name()))
    }

    async fn get_domain_details(&self, domain: &Domain) -> Result<Domain> {
        let id = self.domain_id(domain).await?;

        let mut record: DomainRecord = self
            .api
            .get(&format!("/domains/{}", id), &[])
            .await?
            .into_data("GET /domains/{id}")?;

        let mut details = domain.clone();
        details.registration_time = Some(parse_timestamp(&record.creation_date, "creation_date")?);
        details.expiration_time =
            Some(parse_timestamp(&record.expiration_date, "expiration_date")?);
        details.locked = record.is_locked;
        details.privacy_enabled = record.is_private_whois_enabled;
        details.set_nameservers(record.name_servers.drain(..).map(|ns| ns.name));

        let handle = [record.owner_handle.take(), record.admin_handle.take()]
            .into_iter()
            .flatten()
            .find(|handle| !handle.is_empty());

        let contact = match handle {
            Some(handle) => contact_from_customer(self.fetch_customer(&handle).await?),
            None => record
                .owner
                .and_then(|owner| owner.full_name)
                .map(|full_name| Contact::from_full_name(&full_name))
                .unwrap_or_default(),
        };
        details.set_contacts(contact);

        Ok(details)
    }

    async fn modify_ns(&self, domain: &Domain) -> Result<()> {
        let name_servers: Vec<NameServer> = domain
            .nameservers
            .iter()
            .map(|ns| ns.trim())
            .filter(|ns| !ns.is_empty())
            .take(MAX_NAMESERVERS)
            .map(|ns| NameServer {
                name: ns.to_string(),
            })
            .collect();

        if name_servers.len() < MIN_NAMESERVERS {
            return Err(RegistrarError::invalid_input(format!(
                "at least {} nameservers are required for {}",
                MIN_NAMESERVERS,
                domain.name()
            )));
        }

        self.update_domain(
            domain,
            UpdateDomainRequest {
                name_servers: Some(name_servers),
                ..Default::default()
            },
        )
        .await?;

        info!("Updated nameservers of {}", domain.name());
        Ok(())
    }

    async fn modify_contact(&self, domain: &Domain) -> Result<()> {
        let id = self.domain_id(domain).await?;
        let handle = self.customer_handle(&domain.contact_admin, true).await?;

        let request = UpdateDomainRequest {
            handles: Some(Handles::uniform(&handle)),
            ..Default::default()
        };

        self.api
            .put(&format!("/domains/{}", id), &request)
            .await?
            .ensure_success()?;

        info!("Updated contacts of {} to {}", domain.name(), handle);
        Ok(())
    }

    async fn lock(&self, domain: &Domain) -> Result<()> {
        self.update_domain(
            domain,
            UpdateDomainRequest {
                is_locked: Some(true),
                ..Default::default()
            },
        )
        .await?;
        info!("Locked {}", domain.name());
        Ok(())
    }

    async fn unlock(&self, domain: &Domain) -> Result<()> {
        self.update_domain(
            domain,
            UpdateDomainRequest {
                is_locked: Some(false),
                ..Default::default()
            },
        )
        .await?;
        info!("Unlocked {}", domain.name());
        Ok(())
    }

    async fn enable_privacy_protection(&self, domain: &Domain) -> Result<()> {
        self.update_domain(
            domain,
            UpdateDomainRequest {
                is_private_whois_enabled: Some(true),
                ..Default::default()
            },
        )
        .await?;
        info!("Enabled WHOIS privacy for {}", domain.name());
        Ok(())
    }

    async fn disable_privacy_protection(&self, domain: &Domain) -> Result<()> {
        self.update_domain(
            domain,
            UpdateDomainRequest {
                is_private_whois_enabled: Some(false),
                ..Default::default()
            },
        )
        .await?;
        info!("Disabled WHOIS privacy for {}", domain.name());
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        REGISTRAR_NAME
    }
}

fn customer_payload(contact: &Contact) -> CustomerPayload {
    let country_code = match contact.tel_cc.trim() {
        "" => String::new(),
        cc if cc.starts_with('+') => cc.to_string(),
        cc => format!("+{}", cc),
    };

    CustomerPayload {
        email: contact.email.clone(),
        phone: Phone {
            country_code,
            area_code: contact.tel_area.clone(),
            subscriber_number: contact.tel.clone(),
        },
        company_name: contact.company.clone(),
        address: Address {
            street: contact.address1.clone(),
            zipcode: contact.zip.clone(),
            city: contact.city.clone(),
            state: contact.state.clone(),
            country: contact.country.clone(),
        },
        name: PersonName {
            first_name: contact.first_name.clone(),
            last_name: contact.last_name.clone(),
        },
    }
}

fn contact_from_customer(customer: CustomerRecord) -> Contact {
    Contact {
        first_name: customer.name.first_name,
        last_name: customer.name.last_name,
        email: customer.email,
        company: customer.company_name.unwrap_or_default(),
        tel_cc: customer.phone.country_code,
        tel_area: customer.phone.area_code,
        tel: customer.phone.subscriber_number,
        address1: customer.address.street,
        city: customer.address.city,
        state: customer.address.state,
        zip: customer.address.zipcode,
        country: customer.address.country,
    }
}

/// OpenProvider dates are `YYYY-MM-DD HH:MM:SS` in UTC; RFC 3339 and bare
/// dates are accepted too.
fn parse_timestamp(value: &str, field: &str) -> Result<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(parsed.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(RegistrarError::schema(
        "GET /domains/{id}",
        format!("{} '{}' is not a recognised timestamp", field, value),
    ))
}
