//! Keyed accessor table
//!
//! One [`OptionAccessor`] per schema option, built once when the binding is
//! attached. Accessors hold a weak reference to their binding, so a table
//! outliving its binding reports `Destroyed` instead of keeping it alive.

use std::collections::HashMap;
use std::fmt;
use std::rc::Weak;

use super::errors::{BindingError, BindingResult};
use super::BindingInner;
use crate::types::Value;

/// Getter and setters for one option
pub struct OptionAccessor {
    name: String,
    binding: Weak<BindingInner>,
}

impl OptionAccessor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current cached value. `None` while a required option has no value.
    pub fn get(&self) -> Option<Value> {
        self.binding.upgrade()?.cached(&self.name)
    }

    /// Write a value.
    ///
    /// A value rejected by the option's constraints leaves cache and
    /// attribute untouched and is reported as an `invalid-value-js` event.
    pub fn set(&self, value: impl Into<Value>) -> BindingResult<()> {
        let binding = self.binding.upgrade().ok_or(BindingError::Destroyed)?;
        binding.write(&self.name, value.into())
    }

    /// Remove the option's attribute, falling back to what an absent
    /// attribute reads as (the default, `null` or `false`).
    pub fn unset(&self) -> BindingResult<()> {
        let binding = self.binding.upgrade().ok_or(BindingError::Destroyed)?;
        binding.remove(&self.name)
    }
}

impl fmt::Debug for OptionAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionAccessor")
            .field("name", &self.name)
            .field("value", &self.get())
            .finish()
    }
}

/// Options surface of a binding
pub struct Options {
    accessors: Vec<OptionAccessor>,
    index: HashMap<String, usize>,
}

impl Options {
    pub(crate) fn build<'a>(names: impl Iterator<Item = &'a str>, binding: &Weak<BindingInner>) -> Self {
        let accessors: Vec<_> = names
            .map(|name| OptionAccessor {
                name: name.to_string(),
                binding: Weak::clone(binding),
            })
            .collect();
        let index = accessors
            .iter()
            .enumerate()
            .map(|(i, a)| (a.name.clone(), i))
            .collect();
        Self { accessors, index }
    }

    /// Accessor for an option
    pub fn option(&self, name: &str) -> BindingResult<&OptionAccessor> {
        self.index
            .get(name)
            .map(|&i| &self.accessors[i])
            .ok_or_else(|| BindingError::UnknownOption(name.to_string()))
    }

    pub fn get(&self, name: &str) -> BindingResult<Option<Value>> {
        Ok(self.option(name)?.get())
    }

    pub fn set(&self, name: &str, value: impl Into<Value>) -> BindingResult<()> {
        self.option(name)?.set(value)
    }

    pub fn unset(&self, name: &str) -> BindingResult<()> {
        self.option(name)?.unset()
    }

    pub fn iter(&self) -> impl Iterator<Item = &OptionAccessor> {
        self.accessors.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accessors.iter().map(OptionAccessor::name)
    }

    /// Every option with its current value, in schema order
    pub fn snapshot(&self) -> Vec<(String, Option<Value>)> {
        self.accessors
            .iter()
            .map(|a| (a.name.clone(), a.get()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.accessors.iter()).finish()
    }
}
