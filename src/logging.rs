use anyhow::Result;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer};

use crate::api::JOURNAL_TARGET;

/// Directive that surfaces the request/response dumps of a `debug` registrar.
pub const DEBUG_DIRECTIVE: &str = "openprovider_registrar::api=debug";

/// Console filter: `base` plus the debug dumps when `debug` is set, never the journal.
pub fn console_filter(base: EnvFilter, debug: bool) -> Result<EnvFilter> {
    let mut filter = base.add_directive(format!("{}=off", JOURNAL_TARGET).parse()?);
    if debug {
        filter = filter.add_directive(DEBUG_DIRECTIVE.parse()?);
    }
    Ok(filter)
}

pub fn console_layer<S, W>(filter: EnvFilter, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_filter(filter)
        .boxed()
}

/// Layer that writes only journal records, one JSON object per line.
pub fn journal_layer<S, W>(writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(writer)
        .with_filter(Targets::new().with_target(JOURNAL_TARGET, Level::INFO))
        .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_console_filter_mutes_journal() {
        let filter = console_filter(EnvFilter::new("info"), false).unwrap();
        let rendered = filter.to_string();
        assert!(rendered.contains("opregistrar::journal=off"));
        assert!(!rendered.contains(DEBUG_DIRECTIVE));
    }

    #[test]
    fn test_console_filter_debug_directive() {
        let filter = console_filter(EnvFilter::new("info"), true).unwrap();
        assert!(filter.to_string().contains(DEBUG_DIRECTIVE));
    }
}
