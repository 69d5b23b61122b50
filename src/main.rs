use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use openprovider_registrar::{
    config::{RegistrarConfig, Settings},
    logging,
    registrar::{create_registrar, Contact, Domain, Registrar},
    secrets::CredentialStore,
};

#[derive(Parser)]
#[command(name = "opregistrar")]
#[command(about = "OpenProvider registrar adapter - register and manage domains")]
#[command(version)]
struct Cli {
    /// Path to config.toml (defaults to the system location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a domain is available for registration
    Check { domain: String },

    /// Check whether a domain can be transferred in
    Transferable { domain: String },

    /// Register a domain
    Register {
        domain: String,
        /// TOML file with the registrant contact
        #[arg(long)]
        contact: PathBuf,
        /// Registration period in years
        #[arg(long, default_value_t = 1)]
        period: u32,
    },

    /// Transfer a domain in
    Transfer {
        domain: String,
        #[arg(long)]
        contact: PathBuf,
        #[arg(long)]
        auth_code: String,
        #[arg(long, default_value_t = 1)]
        period: u32,
    },

    /// Renew a domain
    Renew {
        domain: String,
        #[arg(long, default_value_t = 1)]
        period: u32,
    },

    /// Delete a domain
    Delete { domain: String },

    /// Show registration details of a domain
    Info { domain: String },

    /// Show the transfer authorization code of a domain
    Epp { domain: String },

    /// Replace the nameservers of a domain
    Nameservers {
        domain: String,
        /// Two to four nameserver host names
        #[arg(required = true, num_args = 2..=4)]
        nameservers: Vec<String>,
    },

    /// Point all contact roles of a domain at the given contact
    Contact {
        domain: String,
        #[arg(long)]
        contact: PathBuf,
    },

    /// Lock a domain against transfers
    Lock { domain: String },

    /// Unlock a domain
    Unlock { domain: String },

    /// Turn WHOIS privacy protection on or off
    Privacy { domain: String, state: Toggle },

    /// Show configuration file location, contents and form fields
    Config,

    /// Store the reseller password outside config.toml
    SetPassword { username: String },

    /// Delete a stored reseller password
    DeletePassword { username: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn init_logging(log_level: &str, debug: bool, request_log: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let filter = logging::console_filter(filter, debug)?;

    let journal = match request_log {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open request log: {}", path.display()))?;
            Some(logging::journal_layer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(logging::console_layer(filter, std::io::stderr))
        .with(journal)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Settings::config_path);

    // Load config for commands that need it
    let settings = Settings::load_from(&config_path);

    let log_level = settings
        .as_ref()
        .map(|s| s.logging.log_level.as_str())
        .unwrap_or("info");
    let debug = settings.as_ref().is_ok_and(|s| s.registrar.debug());
    let request_log = settings
        .as_ref()
        .ok()
        .and_then(|s| s.logging.request_log.as_deref());
    init_logging(log_level, debug, request_log)?;

    let store = CredentialStore::beside(&config_path);

    match cli.command {
        Commands::Config => show_config(&config_path, settings.as_ref().ok()),

        Commands::SetPassword { username } => {
            let password = rpassword::prompt_password("Reseller password: ")?;
            store.store_password(&username, &password)?;
            println!("Password stored for reseller account: {}", username);
            Ok(())
        }

        Commands::DeletePassword { username } => {
            store.delete_password(&username)?;
            println!("Password deleted for reseller account: {}", username);
            Ok(())
        }

        command => {
            let settings =
                settings.context("Run 'opregistrar config' to see the expected configuration")?;
            let registrar = create_registrar("openprovider", registrar_config(settings, &store)?)?;
            run(registrar, command).await
        }
    }
}

fn registrar_config(settings: Settings, store: &CredentialStore) -> Result<RegistrarConfig> {
    let config = settings.registrar;
    if config.has_password() {
        return Ok(config);
    }

    let password = store
        .get_password(config.username())
        .context("Reseller password is neither in config.toml nor in the credential store")?;
    Ok(config.with_password(password))
}

fn load_contact(path: &Path) -> Result<Contact> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read contact file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse contact file: {}", path.display()))
}

async fn run(registrar: Arc<dyn Registrar>, command: Commands) -> Result<()> {
    match command {
        Commands::Check { domain } => {
            let domain = Domain::parse(&domain)?;
            let available = registrar.is_domain_available(&domain).await?;
            println!(
                "{}: {}",
                domain.name(),
                if available { "available" } else { "not available" }
            );
        }

        Commands::Transferable { domain } => {
            let domain = Domain::parse(&domain)?;
            let transferable = registrar.is_domain_can_be_transferred(&domain).await?;
            println!(
                "{}: {}",
                domain.name(),
                if transferable {
                    "can be transferred"
                } else {
                    "cannot be transferred"
                }
            );
        }

        Commands::Register {
            domain,
            contact,
            period,
        } => {
            let domain = Domain::parse(&domain)?
                .with_period(period)
                .with_admin(load_contact(&contact)?);
            registrar
                .register_domain(&domain)
                .await
                .with_context(|| format!("Failed to register {}", domain.name()))?;
            println!("Registered {} for {} year(s)", domain.name(), period);
        }

        Commands::Transfer {
            domain,
            contact,
            auth_code,
            period,
        } => {
            let domain = Domain::parse(&domain)?
                .with_period(period)
                .with_epp(auth_code)
                .with_admin(load_contact(&contact)?);
            registrar
                .transfer_domain(&domain)
                .await
                .with_context(|| format!("Failed to transfer {}", domain.name()))?;
            println!("Transfer of {} requested", domain.name());
        }

        Commands::Renew { domain, period } => {
            let domain = Domain::parse(&domain)?.with_period(period);
            registrar.renew_domain(&domain).await?;
            println!("Renewed {} for {} year(s)", domain.name(), period);
        }

        Commands::Delete { domain } => {
            let domain = Domain::parse(&domain)?;
            registrar.delete_domain(&domain).await?;
            println!("Deleted {}", domain.name());
        }

        Commands::Info { domain } => {
            let domain = Domain::parse(&domain)?;
            let details = registrar.get_domain_details(&domain).await?;
            print_details(&details);
        }

        Commands::Epp { domain } => {
            let domain = Domain::parse(&domain)?;
            let code = registrar.get_epp(&domain).await?;
            println!("{}", code);
        }

        Commands::Nameservers {
            domain,
            nameservers,
        } => {
            let domain = Domain::parse(&domain)?.with_nameservers(nameservers);
            registrar.modify_ns(&domain).await?;
            println!(
                "Nameservers of {} set to {}",
                domain.name(),
                domain.nameservers.join(", ")
            );
        }

        Commands::Contact { domain, contact } => {
            let domain = Domain::parse(&domain)?.with_admin(load_contact(&contact)?);
            registrar.modify_contact(&domain).await?;
            println!("Contacts of {} updated", domain.name());
        }

        Commands::Lock { domain } => {
            let domain = Domain::parse(&domain)?;
            registrar.lock(&domain).await?;
            println!("Locked {}", domain.name());
        }

        Commands::Unlock { domain } => {
            let domain = Domain::parse(&domain)?;
            registrar.unlock(&domain).await?;
            println!("Unlocked {}", domain.name());
        }

        Commands::Privacy { domain, state } => {
            let domain = Domain::parse(&domain)?;
            match state {
                Toggle::On => registrar.enable_privacy_protection(&domain).await?,
                Toggle::Off => registrar.disable_privacy_protection(&domain).await?,
            }
            println!(
                "WHOIS privacy for {} turned {}",
                domain.name(),
                match state {
                    Toggle::On => "on",
                    Toggle::Off => "off",
                }
            );
        }

        Commands::Config | Commands::SetPassword { .. } | Commands::DeletePassword { .. } => {
            unreachable!("handled before the registrar is created")
        }
    }

    info!("Done ({})", registrar.registrar_name());
    Ok(())
}

fn print_details(domain: &Domain) {
    let timestamp = |t: Option<chrono::DateTime<chrono::Utc>>| {
        t.map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| "-".to_string())
    };

    println!("Domain:      {}", domain.name());
    println!("Registered:  {}", timestamp(domain.registration_time));
    println!("Expires:     {}", timestamp(domain.expiration_time));
    println!("Locked:      {}", domain.locked);
    println!("Privacy:     {}", domain.privacy_enabled);
    for (i, ns) in domain.nameservers.iter().enumerate() {
        println!("NS{}:         {}", i + 1, ns);
    }

    let owner = &domain.contact_registrar;
    println!(
        "Registrant:  {} {} <{}>",
        owner.first_name, owner.last_name, owner.email
    );
    if !owner.company.is_empty() {
        println!("Company:     {}", owner.company);
    }
}

fn show_config(config_path: &Path, settings: Option<&Settings>) -> Result<()> {
    println!("Configuration file location: {}\n", config_path.display());

    match settings {
        Some(s) => {
            let shown = Settings {
                registrar: s.registrar.redacted(),
                logging: s.logging.clone(),
            };
            println!("Current configuration:\n");
            println!("{}", toml::to_string_pretty(&shown)?);
        }
        None => {
            println!("Configuration file not found.");
            println!("\nCreate a configuration file at the location above.");
            println!("Example configuration:\n");
            println!(
                r#"[registrar]
username = "reseller"
password = "secret"   # or store it with 'opregistrar set-password reseller'
api_url = "https://api.openprovider.eu"
debug = false

[logging]
log_level = "info"
request_log = "/var/log/opregistrar/requests.log"
"#
            );
        }
    }

    let form = RegistrarConfig::form();
    println!("\n{} form fields:", form.label);
    for field in &form.fields {
        println!(
            "  {:<10} {:<9} {}{}",
            field.name,
            field.kind,
            field.label,
            if field.required { " (required)" } else { "" }
        );
    }

    Ok(())
}
