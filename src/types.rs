//! Built-in element types

pub mod any;
pub mod saml;

use crate::registry::ProviderRegistry;

/// Register the SAML element types and make [`any::AnyElement`] the default provider
pub fn register_defaults(registry: &ProviderRegistry) {
    saml::register(registry);
    registry.set_default_provider(Some(any::provider()));
}
