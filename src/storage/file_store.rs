//! The storage engine: a live entity registry keyed by `"<Kind>.<id>"`,
//! persisted as one JSON object rewritten in full on every save.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::entity::{Entity, EntityKind};
use crate::error::{HearthError, Result};

/// Default storage file, relative to the working directory.
pub const DEFAULT_FILE: &str = "file.json";

pub struct FileStore {
    path: PathBuf,
    objects: BTreeMap<String, Entity>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            objects: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The live registry. Iteration order is key order, so listings are
    /// deterministic.
    pub fn all(&self) -> &BTreeMap<String, Entity> {
        &self.objects
    }

    /// Mutable view of the live registry; changes hit engine state
    /// directly, there is no defensive copy.
    pub fn all_mut(&mut self) -> &mut BTreeMap<String, Entity> {
        &mut self.objects
    }

    /// Insert or overwrite under the entity's composite key. A key
    /// collision silently replaces the prior instance. Returns the key.
    pub fn register(&mut self, entity: Entity) -> String {
        let key = entity.key();
        self.objects.insert(key.clone(), entity);
        key
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.objects.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Entity> {
        self.objects.get_mut(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Entity> {
        self.objects.remove(key)
    }

    /// Number of live entities of one kind, by key-prefix match.
    pub fn count(&self, kind: EntityKind) -> usize {
        let prefix = kind.key_prefix();
        self.objects.keys().filter(|key| key.starts_with(&prefix)).count()
    }

    /// Serialize the full registry to the storage file, overwriting it.
    /// A write failure surfaces as a fatal error.
    pub fn save(&self) -> Result<()> {
        let mut doc = Map::new();
        for (key, entity) in &self.objects {
            doc.insert(key.clone(), entity.to_value());
        }
        fs::write(&self.path, serde_json::to_string(&Value::Object(doc))?)?;
        debug!(
            objects = self.objects.len(),
            path = %self.path.display(),
            "wrote storage file"
        );
        Ok(())
    }

    /// Reconstruct the registry from the storage file. A missing file is
    /// the first-run case and a no-op. Malformed JSON, a non-object
    /// document, or an unknown kind tag is fatal; partial corruption is
    /// not tolerated.
    pub fn reload(&mut self) -> Result<()> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let doc: Value = serde_json::from_str(&text)?;
        let Value::Object(members) = doc else {
            return Err(HearthError::Malformed(
                "storage file is not a JSON object".into(),
            ));
        };
        for (_, member) in members {
            let entity = Entity::from_value(member)?;
            self.register(entity);
        }
        debug!(objects = self.objects.len(), "reloaded storage file");
        Ok(())
    }
}
