//! Precedence chain shared by every option.
//!
//! Layers are consulted in a fixed order: explicit argument, configuration
//! file, environment variable, default. The first layer holding a value wins
//! and layers are never merged within one option.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    Argument,
    ConfigFile,
    Environment,
    Default,
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Layer::Argument => "argument",
            Layer::ConfigFile => "config file",
            Layer::Environment => "environment",
            Layer::Default => "default",
        };
        write!(f, "{label}")
    }
}

/// A value together with the layer that supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub layer: Layer,
}

/// Fluent first-defined-wins resolution for a single option.
///
/// Call the layer methods in precedence order; later layers only fill the
/// slot while it is still empty.
#[derive(Debug)]
#[must_use]
pub struct Chain<T> {
    option: &'static str,
    found: Option<Sourced<T>>,
}

impl<T> Chain<T> {
    pub fn new(option: &'static str) -> Self {
        Self {
            option,
            found: None,
        }
    }

    pub fn argument(self, value: Option<T>) -> Self {
        self.layer(Layer::Argument, value)
    }

    pub fn config_file(self, value: Option<T>) -> Self {
        self.layer(Layer::ConfigFile, value)
    }

    /// Environment lookup, only evaluated when no earlier layer matched.
    pub fn environment(self, lookup: impl FnOnce() -> Option<T>) -> Self {
        if self.found.is_some() {
            return self;
        }
        let value = lookup();
        self.layer(Layer::Environment, value)
    }

    fn layer(mut self, layer: Layer, value: Option<T>) -> Self {
        if self.found.is_none() {
            self.found = value.map(|value| Sourced { value, layer });
        }
        self
    }

    pub fn resolve(self) -> Option<Sourced<T>> {
        match &self.found {
            Some(found) => tracing::debug!(option = self.option, layer = %found.layer, "resolved"),
            None => tracing::debug!(option = self.option, "unspecified"),
        }
        self.found
    }

    pub fn value(self) -> Option<T> {
        self.resolve().map(|found| found.value)
    }

    pub fn or_default(self, default: T) -> Sourced<T> {
        self.or_else(|| default)
    }

    pub fn or_else(self, default: impl FnOnce() -> T) -> Sourced<T> {
        let option = self.option;
        self.resolve().unwrap_or_else(|| {
            tracing::debug!(option, layer = %Layer::Default, "resolved");
            Sourced {
                value: default(),
                layer: Layer::Default,
            }
        })
    }
}

/// Resolves one key of a structured option bag. Each key runs its own chain
/// and is simply omitted when no layer defines it.
pub fn sub_key<B, T>(
    option: &'static str,
    argument: Option<&B>,
    config_file: Option<&B>,
    pick: impl Fn(&B) -> Option<T>,
) -> Option<T> {
    Chain::new(option)
        .argument(argument.and_then(&pick))
        .config_file(config_file.and_then(&pick))
        .value()
}
