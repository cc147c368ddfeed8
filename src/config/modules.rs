use std::fmt;

use serde::ser::SerializeStruct;
use serde::{de, Deserialize, Deserializer, Serialize};

use super::root_module::{ROOT_MODULE_PATH, ROOT_MODULE_SENTINEL_TAG};
use super::utils::*;

#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct DependencyConfig {
    pub path: String,
    pub deprecated: bool,
}

impl Serialize for DependencyConfig {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // The string shorthand round-trips unless 'deprecated' is set
        if !self.deprecated {
            serializer.serialize_str(&self.path)
        } else {
            let mut state = serializer.serialize_struct("DependencyConfig", 2)?;
            state.serialize_field("path", &self.path)?;
            state.serialize_field("deprecated", &self.deprecated)?;
            state.end()
        }
    }
}

impl DependencyConfig {
    pub fn from_deprecated_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deprecated: true,
        }
    }
    pub fn from_path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            deprecated: false,
        }
    }
}

struct DependencyConfigVisitor;

impl<'de> de::Visitor<'de> for DependencyConfigVisitor {
    type Value = DependencyConfig;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("string or map")
    }

    fn visit_str<E>(self, value: &str) -> Result<DependencyConfig, E>
    where
        E: de::Error,
    {
        Ok(DependencyConfig {
            path: value.to_string(),
            ..Default::default()
        })
    }

    fn visit_map<M>(self, mut map: M) -> Result<DependencyConfig, M::Error>
    where
        M: de::MapAccess<'de>,
    {
        let mut path = None;
        let mut deprecated = false;

        while let Some(key) = map.next_key::<String>()? {
            match key.as_str() {
                "path" => {
                    path = {
                        if path.is_some() {
                            return Err(de::Error::duplicate_field("path"));
                        }
                        Some(map.next_value()?)
                    }
                }
                "deprecated" => {
                    if deprecated {
                        return Err(de::Error::duplicate_field("deprecated"));
                    }
                    deprecated = map.next_value()?;
                }
                _ => {
                    return Err(de::Error::unknown_field(&key, &["path", "deprecated"]));
                }
            }
        }

        let path = path.ok_or_else(|| de::Error::missing_field("path"))?;

        Ok(DependencyConfig { path, deprecated })
    }
}

impl<'de> Deserialize<'de> for DependencyConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DependencyConfigVisitor)
    }
}

pub fn default_visibility() -> Vec<String> {
    global_visibility()
}

pub fn is_default_visibility(value: &Vec<String>) -> bool {
    value == &default_visibility()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub path: String,
    #[serde(default, skip_serializing_if = "is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub depends_on: Vec<DependencyConfig>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strict: bool,
    #[serde(
        default = "default_visibility",
        skip_serializing_if = "is_default_visibility"
    )]
    pub visibility: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layer: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub unchecked: bool,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            path: Default::default(),
            tags: Default::default(),
            depends_on: Default::default(),
            strict: Default::default(),
            visibility: default_visibility(),
            layer: Default::default(),
            unchecked: Default::default(),
        }
    }
}

impl ModuleConfig {
    pub fn new(path: &str, strict: bool) -> Self {
        Self {
            path: path.to_string(),
            strict,
            ..Default::default()
        }
    }

    pub fn new_root_config() -> Self {
        Self::new(ROOT_MODULE_SENTINEL_TAG, false)
    }

    pub fn new_with_layer(path: &str, layer: &str) -> Self {
        // shorthand for test fixtures
        Self {
            path: path.to_string(),
            layer: Some(layer.to_string()),
            ..Default::default()
        }
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT_MODULE_SENTINEL_TAG
    }

    pub fn is_unchecked(&self) -> bool {
        self.unchecked
    }

    /// The path used for module tree insertion and filesystem resolution.
    pub fn mod_path(&self) -> String {
        if self.is_root() {
            return ROOT_MODULE_PATH.to_string();
        }
        self.path.clone()
    }

    pub fn dependencies_iter(&self) -> impl Iterator<Item = &DependencyConfig> {
        self.depends_on.iter()
    }

    pub fn with_dependencies_removed(&self) -> Self {
        Self {
            depends_on: vec![],
            ..self.clone()
        }
    }
}
