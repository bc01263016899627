// src/generator/value.rs
// Option values and the variant map they live in

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single configuration option value.
///
/// Serialized untagged so a variant round-trips as a plain JSON object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<String>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Null)
    }

    /// Null or empty string: the option is left to the module default.
    pub fn is_unset(&self) -> bool {
        match self {
            ConfigValue::Null => true,
            ConfigValue::Str(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        match self {
            ConfigValue::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Parse a command-line literal: `null`, `true`/`false`, integers,
    /// `[a,b]` lists, anything else is a string.
    pub fn parse_literal(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "null" | "" => return ConfigValue::Null,
            "true" => return ConfigValue::Bool(true),
            "false" => return ConfigValue::Bool(false),
            _ => {}
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return ConfigValue::Int(n);
        }
        if let Some(inner) = trimmed.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            let items = inner
                .split(',')
                .map(|s| s.trim().trim_matches('"').to_string())
                .filter(|s| !s.is_empty())
                .collect();
            return ConfigValue::List(items);
        }
        ConfigValue::Str(trimmed.to_string())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Null => write!(f, "null"),
            ConfigValue::Bool(b) => write!(f, "{}", b),
            ConfigValue::Int(n) => write!(f, "{}", n),
            ConfigValue::Str(s) => write!(f, "{}", s),
            ConfigValue::List(items) => write!(f, "[{}]", items.join(", ")),
            ConfigValue::Map(map) => {
                let parts: Vec<String> = map.iter().map(|(k, v)| format!("{}: {}", k, v)).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Bool(b)
    }
}

impl From<i64> for ConfigValue {
    fn from(n: i64) -> Self {
        ConfigValue::Int(n)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Str(s.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Str(s)
    }
}

impl From<Option<&str>> for ConfigValue {
    fn from(s: Option<&str>) -> Self {
        s.map(ConfigValue::from).unwrap_or(ConfigValue::Null)
    }
}

impl From<Vec<&str>> for ConfigValue {
    fn from(items: Vec<&str>) -> Self {
        ConfigValue::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<ConfigurationVariant> for ConfigValue {
    fn from(v: ConfigurationVariant) -> Self {
        ConfigValue::Map(v.0)
    }
}

/// Key under which feature flags are collected.
pub const OVERRIDES_KEY: &str = "overrides";

/// One candidate set of option values, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationVariant(BTreeMap<String, ConfigValue>);

impl ConfigurationVariant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Builder-style feature flag
    pub fn with_override(mut self, flag: impl Into<String>, enabled: bool) -> Self {
        self.set_override(flag, ConfigValue::Bool(enabled));
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// String value of a key, treating null and "" as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(ConfigValue::as_str).filter(|s| !s.is_empty())
    }

    /// True when the key holds a value other than null/"".
    pub fn is_set(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_unset())
    }

    pub fn overrides(&self) -> Option<&BTreeMap<String, ConfigValue>> {
        self.0.get(OVERRIDES_KEY).and_then(ConfigValue::as_map)
    }

    /// Set one flag inside the overrides sub-map, creating it if needed.
    pub fn set_override(&mut self, flag: impl Into<String>, value: ConfigValue) {
        let entry = self
            .0
            .entry(OVERRIDES_KEY.to_string())
            .or_insert_with(|| ConfigValue::Map(BTreeMap::new()));
        if !matches!(entry, ConfigValue::Map(_)) {
            *entry = ConfigValue::Map(BTreeMap::new());
        }
        if let ConfigValue::Map(map) = entry {
            map.insert(flag.into(), value);
        }
    }

    /// Shallow merge: every key of `other` replaces the key here.
    pub fn update(&mut self, other: &ConfigurationVariant) {
        for (k, v) in &other.0 {
            self.0.insert(k.clone(), v.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConfigValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, ConfigValue> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, ConfigValue> {
        self.0
    }
}

impl From<BTreeMap<String, ConfigValue>> for ConfigurationVariant {
    fn from(map: BTreeMap<String, ConfigValue>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigurationVariant {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
