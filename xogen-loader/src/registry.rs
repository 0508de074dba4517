//! Engine to loader lookup.

use indexmap::IndexMap;
use xogen_core::{Engine, Error, Result};

use crate::{loader::Loader, oracle::OracleLoader, postgres::PostgresLoader};

/// Lookup table from engine to its loader, filled at startup.
#[derive(Default)]
pub struct LoaderRegistry {
    loaders: IndexMap<Engine, Box<dyn Loader>>,
}

impl LoaderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in loader.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PostgresLoader));
        registry.register(Box::new(OracleLoader));
        registry
    }

    /// Register a loader under its own engine, replacing any previous one.
    pub fn register(&mut self, loader: Box<dyn Loader>) {
        self.loaders.insert(loader.engine(), loader);
    }

    pub fn get(&self, engine: Engine) -> Result<&dyn Loader> {
        self.loaders
            .get(&engine)
            .map(|l| l.as_ref())
            .ok_or_else(|| {
                Box::new(Error::LoaderNotRegistered {
                    engine: engine.to_string(),
                })
            })
    }

    /// Registered engines, in registration order.
    pub fn engines(&self) -> impl Iterator<Item = Engine> + '_ {
        self.loaders.keys().copied()
    }
}
