use core::fmt;
use std::{
    io::Read,
    ops::{Index, IndexMut},
};

use anyhow::Context as _;
use compact_str::CompactString;
use serde::Deserialize as _;

use crate::resource::Resource;

pub type Str = CompactString;

/// An ordered collection of resources that are installed together.
///
/// Order is preserved as given, it is the order the resources are applied in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    resources: Vec<Resource>,
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for resource in self.iter() {
            if self.len() > 1 {
                writeln!(f, "---")?;
            }
            write!(
                f,
                "{}",
                serde_yaml::to_string(resource).map_err(|_| fmt::Error)?
            )?;
        }

        Ok(())
    }
}

impl Manifest {
    pub fn new(resources: impl IntoIterator<Item = Resource>) -> Self {
        Self {
            resources: resources.into_iter().collect(),
        }
    }

    /// Parse a stream of `---` separated YAML documents. Empty documents are skipped.
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        Self::from_documents(serde_yaml::Deserializer::from_str(s))
    }

    pub fn from_reader(reader: impl Read) -> anyhow::Result<Self> {
        Self::from_documents(serde_yaml::Deserializer::from_reader(reader))
    }

    fn from_documents<'de>(
        documents: impl Iterator<Item = serde_yaml::Deserializer<'de>>,
    ) -> anyhow::Result<Self> {
        let mut resources = Vec::new();
        for (index, document) in documents.enumerate() {
            let value = serde_json::Value::deserialize(document)
                .with_context(|| format!("parsing YAML document {index}"))?;
            if value.is_null() {
                continue;
            }

            let resource = Resource::try_from(value)
                .with_context(|| format!("parsing resource from YAML document {index}"))?;
            resources.push(resource);
        }

        Ok(Self { resources })
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn push(&mut self, resource: Resource) {
        self.resources.push(resource);
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Resource> + DoubleEndedIterator {
        self.resources.iter()
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl ExactSizeIterator<Item = &mut Resource> + DoubleEndedIterator {
        self.resources.iter_mut()
    }
}

impl FromIterator<Resource> for Manifest {
    fn from_iter<T: IntoIterator<Item = Resource>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl IntoIterator for Manifest {
    type Item = Resource;
    type IntoIter = std::vec::IntoIter<Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_iter()
    }
}

impl Index<usize> for Manifest {
    type Output = Resource;

    fn index(&self, index: usize) -> &Self::Output {
        &self.resources[index]
    }
}

impl IndexMut<usize> for Manifest {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.resources[index]
    }
}
