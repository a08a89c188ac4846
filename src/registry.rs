//! Provider registry: builders, marshallers and unmarshallers keyed by qualified name

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::debug;

use crate::marshaller::Marshaller;
use crate::node::{ElementType, Node, NodeRef};
use crate::qname::QName;
use crate::unmarshaller::Unmarshaller;

/// Creates empty nodes for an element or type name
pub trait Builder: Send + Sync {
    fn build_object(&self, element_name: QName, schema_type: Option<QName>) -> NodeRef;
}

/// [`Builder`] for any [`ElementType`]
pub struct TypeBuilder<T>(PhantomData<fn() -> T>);

impl<T> TypeBuilder<T> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Default for TypeBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ElementType> Builder for TypeBuilder<T> {
    fn build_object(&self, element_name: QName, schema_type: Option<QName>) -> NodeRef {
        T::build_with(element_name, schema_type).into_node()
    }
}

/// Builder, marshaller and unmarshaller registered together for one name
#[derive(Clone)]
pub struct Provider {
    builder: Arc<dyn Builder>,
    marshaller: Arc<dyn Marshaller>,
    unmarshaller: Arc<dyn Unmarshaller>,
}

impl Provider {
    pub fn new(
        builder: impl Builder + 'static,
        marshaller: impl Marshaller + 'static,
        unmarshaller: impl Unmarshaller + 'static,
    ) -> Self {
        Self {
            builder: Arc::new(builder),
            marshaller: Arc::new(marshaller),
            unmarshaller: Arc::new(unmarshaller),
        }
    }

    /// Provider for `T` using its [`TypeBuilder`]
    pub fn of<T: ElementType>(
        marshaller: impl Marshaller + 'static,
        unmarshaller: impl Unmarshaller + 'static,
    ) -> Self {
        Self::new(TypeBuilder::<T>::new(), marshaller, unmarshaller)
    }

    pub fn builder(&self) -> &Arc<dyn Builder> {
        &self.builder
    }

    pub fn marshaller(&self) -> &Arc<dyn Marshaller> {
        &self.marshaller
    }

    pub fn unmarshaller(&self) -> &Arc<dyn Unmarshaller> {
        &self.unmarshaller
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider").finish_non_exhaustive()
    }
}

/// Registry consulted by marshalling, unmarshalling and object construction
///
/// Lookups take a read lock; registration is expected at startup but is safe at any time.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    providers: RwLock<HashMap<QName, Provider>>,
    default_provider: RwLock<Option<Provider>>,
    id_attributes: RwLock<HashSet<QName>>,
}

impl ProviderRegistry {
    /// Empty registry that treats `xml:id` as an ID attribute
    pub fn new() -> Self {
        let registry = Self::default();
        registry.register_id_attribute(QName::xml_id());
        registry
    }

    /// Registry with the built-in element types and the generic default provider
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        crate::types::register_defaults(&registry);
        registry
    }

    /// Process-wide registry, initialised with the built-in element types on first use
    pub fn global() -> &'static Self {
        static GLOBAL: OnceLock<ProviderRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            debug!("initialising global provider registry");
            Self::with_defaults()
        })
    }

    pub fn register_provider(
        &self,
        name: QName,
        builder: impl Builder + 'static,
        marshaller: impl Marshaller + 'static,
        unmarshaller: impl Unmarshaller + 'static,
    ) {
        self.register(name, Provider::new(builder, marshaller, unmarshaller));
    }

    /// Register `provider` for an element name or schema type, replacing any previous one
    pub fn register(&self, name: QName, provider: Provider) {
        debug!(name = %name, "registering provider");
        self.providers.write().insert(name, provider);
    }

    pub fn deregister_provider(&self, name: &QName) -> Option<Provider> {
        debug!(name = %name, "deregistering provider");
        self.providers.write().remove(name)
    }

    pub fn provider(&self, name: &QName) -> Option<Provider> {
        self.providers.read().get(name).cloned()
    }

    pub fn builder(&self, name: &QName) -> Option<Arc<dyn Builder>> {
        self.providers.read().get(name).map(|p| Arc::clone(&p.builder))
    }

    pub fn marshaller(&self, name: &QName) -> Option<Arc<dyn Marshaller>> {
        self.providers
            .read()
            .get(name)
            .map(|p| Arc::clone(&p.marshaller))
    }

    pub fn unmarshaller(&self, name: &QName) -> Option<Arc<dyn Unmarshaller>> {
        self.providers
            .read()
            .get(name)
            .map(|p| Arc::clone(&p.unmarshaller))
    }

    /// Provider used for child elements no other provider claims
    pub fn set_default_provider(&self, provider: Option<Provider>) {
        *self.default_provider.write() = provider;
    }

    pub fn default_provider(&self) -> Option<Provider> {
        self.default_provider.read().clone()
    }

    pub fn register_id_attribute(&self, name: QName) {
        self.id_attributes.write().insert(name);
    }

    pub fn deregister_id_attribute(&self, name: &QName) {
        self.id_attributes.write().remove(name);
    }

    pub fn is_id_attribute(&self, name: &QName) -> bool {
        self.id_attributes.read().contains(name)
    }

    /// Build an empty node for a registered element name
    pub fn build(&self, name: &QName) -> Option<NodeRef> {
        self.builder(name)
            .map(|builder| builder.build_object(name.clone(), None))
    }

    /// Marshaller for `node`: by element name, then schema type, then the default provider
    pub fn marshaller_for(&self, node: &Node) -> Option<Arc<dyn Marshaller>> {
        self.marshaller(node.element_qname())
            .or_else(|| node.schema_type().and_then(|t| self.marshaller(t)))
            .or_else(|| {
                self.default_provider()
                    .map(|provider| Arc::clone(provider.marshaller()))
            })
    }
}
