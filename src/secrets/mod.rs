mod credentials_store;

pub use credentials_store::CredentialStore;
