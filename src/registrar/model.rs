use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{RegistrarError, Result};

/// Most nameservers a domain record carries.
pub const MAX_NAMESERVERS: usize = 4;

/// Contact attached to a domain in one of its roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub company: String,
    /// Phone country code, e.g. `+31`.
    pub tel_cc: String,
    pub tel_area: String,
    pub tel: String,
    pub address1: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl Contact {
    /// Contact with only a name, split from a full name where the last
    /// whitespace-separated token is the surname.
    pub fn from_full_name(full_name: &str) -> Self {
        let mut tokens: Vec<&str> = full_name.split_whitespace().collect();
        let last_name = if tokens.len() > 1 {
            tokens.pop().unwrap_or_default().to_string()
        } else {
            String::new()
        };

        Self {
            first_name: tokens.join(" "),
            last_name,
            ..Self::default()
        }
    }
}

/// A domain as the hosting platform sees it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub sld: String,
    /// Top-level part including the leading dot, e.g. `.co.uk`.
    pub tld: String,
    pub registration_period: u32,
    pub epp: Option<String>,
    pub registration_time: Option<DateTime<Utc>>,
    pub expiration_time: Option<DateTime<Utc>>,
    pub nameservers: Vec<String>,
    pub locked: bool,
    pub privacy_enabled: bool,
    pub contact_registrar: Contact,
    pub contact_admin: Contact,
    pub contact_tech: Contact,
    pub contact_billing: Contact,
}

impl Domain {
    pub fn new(sld: impl Into<String>, tld: impl Into<String>) -> Self {
        let tld = tld.into();
        let tld = if tld.starts_with('.') {
            tld
        } else {
            format!(".{}", tld)
        };

        Self {
            sld: sld.into(),
            tld,
            registration_period: 1,
            ..Self::default()
        }
    }

    /// Split a fully-qualified name at its first dot.
    pub fn parse(name: &str) -> Result<Self> {
        let name = name.trim().trim_end_matches('.').to_lowercase();
        match name.split_once('.') {
            Some((sld, tld)) if !sld.is_empty() && !tld.is_empty() => Ok(Self::new(sld, tld)),
            _ => Err(RegistrarError::invalid_input(format!(
                "'{}' is not a fully-qualified domain name",
                name
            ))),
        }
    }

    /// Fully-qualified name, e.g. `example.co.uk`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.sld, self.extension())
    }

    /// TLD without surrounding dots, as OpenProvider expects it.
    pub fn extension(&self) -> &str {
        self.tld.trim_matches('.')
    }

    pub fn with_period(mut self, years: u32) -> Self {
        self.registration_period = years;
        self
    }

    pub fn with_epp(mut self, code: impl Into<String>) -> Self {
        self.epp = Some(code.into());
        self
    }

    pub fn with_admin(mut self, contact: Contact) -> Self {
        self.contact_admin = contact;
        self
    }

    pub fn with_nameservers<I, S>(mut self, nameservers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nameservers = nameservers.into_iter().map(Into::into).collect();
        self
    }

    /// Set nameservers, skipping blanks and keeping at most four.
    pub fn set_nameservers<I, S>(&mut self, nameservers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nameservers = nameservers
            .into_iter()
            .map(Into::into)
            .filter(|ns: &String| !ns.trim().is_empty())
            .take(MAX_NAMESERVERS)
            .collect();
    }

    /// Same contact in the registrant, admin, tech and billing roles.
    pub fn set_contacts(&mut self, contact: Contact) {
        self.contact_registrar = contact.clone();
        self.contact_admin = contact.clone();
        self.contact_tech = contact.clone();
        self.contact_billing = contact;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domain() {
        let domain = Domain::parse("Example.co.uk.").unwrap();
        assert_eq!(domain.sld, "example");
        assert_eq!(domain.tld, ".co.uk");
        assert_eq!(domain.extension(), "co.uk");
        assert_eq!(domain.name(), "example.co.uk");
        assert_eq!(domain.registration_period, 1);
    }

    #[test]
    fn test_parse_rejects_bare_label() {
        assert!(Domain::parse("localhost").is_err());
        assert!(Domain::parse(".com").is_err());
    }

    #[test]
    fn test_extension_strips_dots() {
        let domain = Domain::new("example", "..com.");
        assert_eq!(domain.extension(), "com");
    }

    #[test]
    fn test_set_nameservers_caps_and_skips_blanks() {
        let mut domain = Domain::new("example", "com");
        domain.set_nameservers(["ns1.a", "", "ns2.a", "ns3.a", "ns4.a", "ns5.a"]);
        assert_eq!(domain.nameservers, vec!["ns1.a", "ns2.a", "ns3.a", "ns4.a"]);
    }

    #[test]
    fn test_full_name_split() {
        let contact = Contact::from_full_name("  Jan Pieter   de Vries ");
        assert_eq!(contact.first_name, "Jan Pieter de");
        assert_eq!(contact.last_name, "Vries");

        let contact = Contact::from_full_name("Madonna");
        assert_eq!(contact.first_name, "Madonna");
        assert_eq!(contact.last_name, "");
        assert!(contact.email.is_empty());
    }
}
