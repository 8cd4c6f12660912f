//! The raw JSON configuration document and structured updates on it.

use crate::{Error, Result};
use serde_json::{Map, Value};
use std::path::Path;

/// A parsed configuration document.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    root: Value,
}

impl ConfigDocument {
    /// Read and parse the document at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let root = serde_json::from_str(&content).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "config document loaded");
        Ok(Self { root })
    }

    /// Parse a document held in memory.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(Self {
            root: serde_json::from_str(content)?,
        })
    }

    pub fn from_value(root: Value) -> Self {
        Self { root }
    }

    /// Look up the value at `path`, if every key on it exists.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(&self.root, |node, key| node.get(key))
    }

    /// Set the value at `path`.
    ///
    /// Every key but the last must already exist and hold an object; the last
    /// key is inserted or overwritten.
    pub fn set(&mut self, path: &[&str], value: impl Into<Value>) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            self.root = value.into();
            return Ok(());
        };

        let mut node = object_mut(&mut self.root, &[])?;
        for (depth, key) in parents.iter().enumerate() {
            let walked = &path[..=depth];
            let child = node
                .get_mut(*key)
                .ok_or_else(|| Error::MissingKey(dotted(walked)))?;
            node = object_mut(child, walked)?;
        }

        node.insert((*last).to_string(), value.into());
        Ok(())
    }

    /// Remove and return the top-level section `key`.
    pub fn take(&mut self, key: &str) -> Result<Value> {
        object_mut(&mut self.root, &[])?
            .remove(key)
            .ok_or_else(|| Error::MissingKey(key.to_string()))
    }

    pub fn into_value(self) -> Value {
        self.root
    }
}

fn object_mut<'a>(value: &'a mut Value, path: &[&str]) -> Result<&'a mut Map<String, Value>> {
    value.as_object_mut().ok_or_else(|| {
        if path.is_empty() {
            Error::NotAnObject("<root>".to_string())
        } else {
            Error::NotAnObject(dotted(path))
        }
    })
}

fn dotted(path: &[&str]) -> String {
    path.join(".")
}
