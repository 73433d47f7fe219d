//! Metadata field binding for KML `<ExtendedData>` blocks.
//!
//! A [`FieldBinder`] looks up `<Data name="...">` entries by name and writes
//! their `<value>` text into an item's extras map. The default/transform
//! plumbing lives in the generic [`OptionSetter`]; the binder's unique
//! contribution is the name-attribute lookup against a metadata block rather
//! than a direct property read.

use std::collections::BTreeMap;
use std::fmt;

use roxmltree::Node;

/// Generic named-option write: a config key plus an optional default and an
/// optional transform applied to raw values before writing.
pub struct OptionSetter {
    key: String,
    default: Option<String>,
    transform: Option<Box<dyn Fn(&str) -> String>>,
}

impl OptionSetter {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: None,
            transform: None,
        }
    }

    /// Value written when the raw value is absent or empty.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Transform applied to non-empty raw values before writing.
    pub fn with_transform(mut self, transform: impl Fn(&str) -> String + 'static) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// The config key this setter writes under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write `raw` into `config` under this setter's key.
    ///
    /// An absent or empty raw value falls back to the default; without a
    /// default the key is left untouched.
    pub fn set(&self, config: &mut BTreeMap<String, String>, raw: Option<&str>) {
        match raw.map(str::trim).filter(|value| !value.is_empty()) {
            Some(value) => {
                let value = match &self.transform {
                    Some(transform) => transform(value),
                    None => value.to_string(),
                };
                config.insert(self.key.clone(), value);
            }
            None => {
                if let Some(default) = &self.default {
                    config.insert(self.key.clone(), default.clone());
                }
            }
        }
    }
}

impl fmt::Debug for OptionSetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSetter")
            .field("key", &self.key)
            .field("default", &self.default)
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Binds one named `<Data>` entry from a metadata block into an item's
/// extras.
#[derive(Debug)]
pub struct FieldBinder {
    name: String,
    setter: OptionSetter,
}

impl FieldBinder {
    /// Binder whose config key equals the entry name it matches.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let setter = OptionSetter::new(name.clone());
        Self { name, setter }
    }

    /// Write matches under `key` instead of the entry name.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.setter.key = key.into();
        self
    }

    /// Value written when no entry matches or the matched value is empty.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.setter = self.setter.with_default(default);
        self
    }

    /// Transform applied to matched values before writing.
    pub fn with_transform(mut self, transform: impl Fn(&str) -> String + 'static) -> Self {
        self.setter = self.setter.with_transform(transform);
        self
    }

    /// The entry name this binder matches.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Scan `entries` for every `<Data>` whose name attribute equals this
    /// binder's name and write each match in encounter order, so the final
    /// write wins. With no match at all, the default (if any) is written.
    pub fn bind(&self, config: &mut BTreeMap<String, String>, entries: &[Node<'_, '_>]) {
        let mut matched = false;
        for entry in entries {
            if entry.attribute("name") != Some(self.name.as_str()) {
                continue;
            }
            matched = true;

            let raw = entry
                .children()
                .find(|child| child.is_element() && child.tag_name().name() == "value")
                .and_then(|value| value.text());
            self.setter.set(config, raw);
        }

        if !matched {
            self.setter.set(config, None);
        }
    }
}
