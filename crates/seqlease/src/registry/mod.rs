//! Strategy selection by name.
//!
//! A [`Registry`] maps strategy names to constructors. It is an ordinary
//! value: build it once while wiring the process, register any custom
//! strategies, and pass it by reference to whatever needs to create
//! allocators.
//!
//! ```
//! use seqlease::{Registry, TIME_COMPOSITE, UidAllocator, UidConfig};
//!
//! let registry = Registry::with_defaults();
//! let config = UidConfig { node_id: 1, ..UidConfig::default() };
//! let allocator = registry.create(TIME_COMPOSITE, &config).unwrap();
//! assert!(!allocator.has_int32());
//! assert!(allocator.next_uid64() > 0);
//! ```


use std::collections::BTreeMap;

use crate::{
    config::{CompositeConfig, UidConfig},
    error::{Error, Result},
    generator::{CompositeAllocator, UidAllocator},
};

/// Segment leases over a MySQL sequence table.
pub const SEGMENT: &str = "segment";
/// One Redis `INCR` per ID.
pub const COUNTER: &str = "counter";
/// Snowflake-style timestamp + node + sequence IDs.
pub const TIME_COMPOSITE: &str = "snowflake";

/// An allocator built by a [`Registry`].
pub type BoxedAllocator = Box<dyn UidAllocator>;

/// Builds and initializes an allocator from configuration.
pub type Constructor = Box<dyn Fn(&UidConfig) -> Result<BoxedAllocator> + Send + Sync>;

/// Maps strategy names to constructors.
#[derive(Default)]
pub struct Registry {
    constructors: BTreeMap<String, Constructor>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in strategy enabled at compile
    /// time: [`TIME_COMPOSITE`] always, [`SEGMENT`] with the `mysql` feature,
    /// and [`COUNTER`] with the `redis` feature.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.insert_builtin(TIME_COMPOSITE, |config| {
            let config = CompositeConfig::try_from(config)?;
            Ok(Box::new(CompositeAllocator::from_config(&config)?))
        });

        #[cfg(feature = "mysql")]
        registry.insert_builtin(SEGMENT, |config| {
            let config = crate::config::SegmentConfig::try_from(config)?;
            Ok(Box::new(crate::generator::SegmentAllocator::connect(&config)?))
        });

        #[cfg(feature = "redis")]
        registry.insert_builtin(COUNTER, |config| {
            let config = crate::config::CounterConfig::try_from(config)?;
            Ok(Box::new(crate::generator::CounterAllocator::connect(&config)?))
        });

        registry
    }

    fn insert_builtin<F>(&mut self, name: &str, constructor: F)
    where
        F: Fn(&UidConfig) -> Result<BoxedAllocator> + Send + Sync + 'static,
    {
        self.constructors
            .insert(name.to_owned(), Box::new(constructor));
    }

    /// Adds a strategy under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateStrategy`] if `name` is already registered;
    /// the existing constructor is kept.
    pub fn register<F>(&mut self, name: impl Into<String>, constructor: F) -> Result<()>
    where
        F: Fn(&UidConfig) -> Result<BoxedAllocator> + Send + Sync + 'static,
    {
        let name = name.into();
        if self.constructors.contains_key(&name) {
            return Err(Error::DuplicateStrategy(name));
        }
        self.constructors.insert(name, Box::new(constructor));
        Ok(())
    }

    /// Whether a strategy is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Registered strategy names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    /// Builds and initializes the allocator registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStrategy`] for an unregistered name, or the
    /// constructor's initialization error (typically
    /// [`Error::ConfigInvalid`]).
    pub fn create(&self, name: &str, config: &UidConfig) -> Result<BoxedAllocator> {
        let constructor = self
            .constructors
            .get(name)
            .ok_or_else(|| Error::UnknownStrategy(name.to_owned()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(strategy = name, "creating allocator");

        constructor(config)
    }
}
