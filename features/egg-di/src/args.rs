use std::collections::BTreeMap;

use crate::{
    signature::Signature,
    types::{Injectable, Instance},
};

/// The actual arguments of a hatched call
///
/// Positional arguments are bound to the target's parameters in declaration order, keyword
/// arguments by name. Supplying a parameter always wins over its egg.
#[derive(Debug, Clone, Default)]
pub struct Args {
    positional: Vec<Instance>,
    keyword: BTreeMap<String, Instance>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument
    pub fn arg<T: Injectable>(self, value: T) -> Self {
        self.arg_instance(Instance::new(value))
    }

    /// Sets a keyword argument
    pub fn kwarg<T: Injectable>(self, name: impl Into<String>, value: T) -> Self {
        self.kwarg_instance(name, Instance::new(value))
    }

    pub fn arg_instance(mut self, value: Instance) -> Self {
        self.positional.push(value);
        self
    }

    pub fn kwarg_instance(mut self, name: impl Into<String>, value: Instance) -> Self {
        self.keyword.insert(name.into(), value);
        self
    }

    pub fn positional(&self) -> &[Instance] {
        &self.positional
    }

    pub fn keyword(&self) -> &BTreeMap<String, Instance> {
        &self.keyword
    }

    /// Maps the arguments onto the parameter names of `signature`
    ///
    /// Positional arguments beyond the declared parameters are dropped, keyword arguments
    /// overlay positional ones and are kept even if undeclared.
    pub fn bind(&self, signature: &Signature) -> BTreeMap<String, Instance> {
        let mut available: BTreeMap<String, Instance> = signature
            .names()
            .zip(&self.positional)
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();

        available.extend(
            self.keyword
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        available
    }
}
