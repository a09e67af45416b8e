use anyhow::{anyhow, Result};

use super::result::{ObjectType, UNKNOWN_OBJECT};

/// Object kinds the assistant knows how to handle out of the box.
pub const DEFAULT_OBJECTS: &[(&str, &str)] = &[
    ("graffiti", "Graffiti"),
    ("syringe", "Syringe"),
    ("dog-poop", "Dog Waste"),
    ("water-bottle", "Water Bottle"),
    ("circle-t-logo", "Circle T Logo"),
    ("pen", "Pen"),
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectProfile {
    pub id: String,
    pub display_name: String,
}

/// Catalog of recognized object types.
///
/// Classifier replies are validated against this set; anything outside it is
/// reported as [`UNKNOWN_OBJECT`].
#[derive(Clone, Debug)]
pub struct ObjectCatalog {
    profiles: Vec<ObjectProfile>,
}

impl ObjectCatalog {
    /// Empty catalog. Every reply resolves to unknown until objects are registered.
    pub fn empty() -> Self {
        Self {
            profiles: Vec::new(),
        }
    }

    /// Register an object type. Registering an existing id updates its display name.
    pub fn register(&mut self, id: &str, display_name: &str) -> Result<()> {
        let id = validate_object_id(id)?;
        if let Some(existing) = self.profiles.iter_mut().find(|p| p.id == id) {
            existing.display_name = display_name.to_string();
            return Ok(());
        }
        self.profiles.push(ObjectProfile {
            id,
            display_name: display_name.to_string(),
        });
        Ok(())
    }

    pub fn is_known(&self, id: &str) -> bool {
        let id = id.trim();
        self.profiles
            .iter()
            .any(|p| p.id.eq_ignore_ascii_case(id))
    }

    /// Map a raw classifier label to a catalog type, or unknown.
    pub fn resolve(&self, raw: &str) -> ObjectType {
        if self.is_known(raw) {
            ObjectType::new(raw)
        } else {
            ObjectType::unknown()
        }
    }

    pub fn display_name<'a>(&'a self, object_type: &'a ObjectType) -> &'a str {
        self.profiles
            .iter()
            .find(|p| p.id == object_type.as_str())
            .map(|p| p.display_name.as_str())
            .unwrap_or_else(|| object_type.as_str())
    }

    pub fn ids(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ObjectCatalog {
    fn default() -> Self {
        let profiles = DEFAULT_OBJECTS
            .iter()
            .map(|(id, name)| ObjectProfile {
                id: (*id).to_string(),
                display_name: (*name).to_string(),
            })
            .collect();
        Self { profiles }
    }
}

/// Object ids are lowercase slugs (`a-z`, `0-9`, `-`) and may not shadow the sentinel.
pub fn validate_object_id(id: &str) -> Result<String> {
    let id = id.trim().to_lowercase();
    if id.is_empty() {
        return Err(anyhow!("object id must not be empty"));
    }
    if id == UNKNOWN_OBJECT {
        return Err(anyhow!("'{}' is reserved for unrecognized objects", UNKNOWN_OBJECT));
    }
    if id.len() > 64 {
        return Err(anyhow!("object id '{}' exceeds 64 characters", id));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(anyhow!(
            "object id '{}' must contain only a-z, 0-9 and '-'",
            id
        ));
    }
    Ok(id)
}
