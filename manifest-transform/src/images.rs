//! Image overrides resolved from the process environment.
//!
//! Overrides are supplied as `<PREFIX><NAME>=<image>` entries, e.g.
//! `IMAGE_PIPELINES_ARG__GIT_IMAGE=registry.example/git-init:v1`. The prefix selects the component
//! the override applies to and is stripped; `NAME` is matched against the normalized name of a
//! container, argument flag, task step or task param.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const PIPELINES_IMAGE_PREFIX: &str = "IMAGE_PIPELINES_";
pub const TRIGGERS_IMAGE_PREFIX: &str = "IMAGE_TRIGGERS_";
pub const ADDONS_IMAGE_PREFIX: &str = "IMAGE_ADDONS_";

pub const ARG_PREFIX: &str = "arg_";
pub const PARAM_PREFIX: &str = "param_";

/// Canonical override key for `raw`: lower-cased, `-` replaced by `_`, with `prefix` prepended as
/// is. The caller includes any separator in `prefix`.
pub fn normalize(prefix: &str, raw: &str) -> String {
    let mut key = String::with_capacity(prefix.len() + raw.len());
    key.push_str(prefix);
    key.push_str(&raw.to_lowercase().replace('-', "_"));
    key
}

/// Mapping from override key to image reference.
///
/// Keys are stored exactly as they were given. Use [`ImageOverrides::lowercase_keys`] to get a
/// table that matches the lower-case keys produced by [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageOverrides {
    images: IndexMap<String, String>,
}

impl ImageOverrides {
    /// Build the table from `KEY=VALUE` entries whose key starts with `prefix`.
    ///
    /// Everything after the first `=` is the value. Entries without `=` and entries whose key is
    /// exactly `prefix` are ignored.
    pub fn from_entries<I, S>(entries: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut images = ImageOverrides::default();
        for entry in entries {
            if let Some((key, value)) = entry.as_ref().split_once('=') {
                images.insert_prefixed(key, value, prefix);
            }
        }
        images
    }

    /// Same as [`ImageOverrides::from_entries`] for entries that are already split, such as the
    /// output of [`std::env::vars`].
    pub fn from_vars<I, K, V>(vars: I, prefix: &str) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut images = ImageOverrides::default();
        for (key, value) in vars {
            images.insert_prefixed(key.as_ref(), value.as_ref(), prefix);
        }
        images
    }

    fn insert_prefixed(&mut self, key: &str, value: &str, prefix: &str) {
        match key.strip_prefix(prefix) {
            Some(name) if !name.is_empty() => {
                self.images.insert(name.to_string(), value.to_string());
            }
            _ => {}
        }
    }

    /// Derived table with every key lower-cased.
    ///
    /// Keys differing only by case collapse into one entry and the last one in iteration order
    /// wins. Iteration order is the order entries were added, which for an environment snapshot is
    /// whatever order the platform reported, so callers must not depend on which one survives.
    pub fn lowercase_keys(&self) -> Self {
        self.images
            .iter()
            .map(|(key, image)| (key.to_lowercase(), image.clone()))
            .collect()
    }

    /// Merge `other` into `self`, entries of `other` win on conflict.
    pub fn merge(&mut self, other: ImageOverrides) {
        self.images.extend(other.images);
    }

    pub fn insert(&mut self, key: impl Into<String>, image: impl Into<String>) -> Option<String> {
        self.images.insert(key.into(), image.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.images.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &str)> {
        self.images.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Override for a container named `name`.
    pub fn for_container(&self, name: &str) -> Option<&str> {
        self.get(&normalize("", name))
    }

    /// Override for the value of the command line flag `flag`.
    ///
    /// The flag is normalized as is first, so `-git-image` looks up `arg__git_image`. If that is
    /// absent the lookup falls back to the flag without its leading dashes (`arg_git_image`).
    pub fn for_arg(&self, flag: &str) -> Option<&str> {
        self.get(&normalize(ARG_PREFIX, flag)).or_else(|| {
            let bare = flag.trim_start_matches('-');
            if bare.len() == flag.len() || bare.is_empty() {
                return None;
            }
            self.get(&normalize(ARG_PREFIX, bare))
        })
    }

    /// Non-empty override for a task step named `name`.
    pub fn for_step(&self, name: &str) -> Option<&str> {
        self.get(&normalize("", name)).filter(|image| !image.is_empty())
    }

    /// Non-empty override for the default of a task param named `name`.
    pub fn for_param(&self, name: &str) -> Option<&str> {
        self.get(&normalize(PARAM_PREFIX, name))
            .filter(|image| !image.is_empty())
    }
}

impl<K, V> FromIterator<(K, V)> for ImageOverrides
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        ImageOverrides {
            images: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
