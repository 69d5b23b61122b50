mod settings;

pub use settings::{
    ConfigForm, FieldKind, FormField, LoggingConfig, RegistrarConfig, Settings,
};
