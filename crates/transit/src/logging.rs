//! Process-wide tracing setup for embedders that don't install their own
//! subscriber.

use std::sync::Once;

use tracing_subscriber::{
    filter::FilterFn, fmt::format::Format, layer::SubscriberExt, util::SubscriberInitExt,
};

const MODULE_PREFIX: &str = "transit_store";

/// Install a stderr `fmt` subscriber that only passes this crate's events.
///
/// Safe to call repeatedly. If another global subscriber is already set, that
/// one is kept.
pub fn setup_logging() {
    static LOGGING_SETUP: Once = Once::new();

    LOGGING_SETUP.call_once(|| {
        let filter = FilterFn::new(|metadata| {
            metadata
                .module_path()
                .unwrap_or_default()
                .starts_with(MODULE_PREFIX)
        });
        let layer = tracing_subscriber::fmt::layer()
            .event_format(Format::default().with_target(true).without_time());

        // Route through libtest's capture so passing tests stay quiet
        #[cfg(test)]
        let layer = layer.with_test_writer();
        #[cfg(not(test))]
        let layer = layer.with_writer(std::io::stderr);

        if tracing_subscriber::registry()
            .with(layer)
            .with(filter)
            .try_init()
            .is_err()
        {
            tracing::debug!("global subscriber already installed");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::EntityStore;

    #[test]
    fn test_setup_logging_is_idempotent() {
        setup_logging();
        setup_logging();

        // Store operations log through whichever subscriber won
        let mut store = EntityStore::new();
        store.reload(Vec::new(), Vec::new(), Vec::new(), Vec::new());
        assert_eq!(store.generation(), 1);
    }
}
