use std::collections::BTreeMap;

use super::model::{FieldSchema, FieldType};

/// One entity exposed by the gateway: its URL name and field schema.
#[derive(Debug, Clone)]
pub struct EntityDef {
    pub name: String,
    pub fields: FieldSchema,
}

impl EntityDef {
    pub fn new(name: impl Into<String>, fields: FieldSchema) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

/// Explicit name-to-entity mapping, built by the caller at startup and
/// passed around by reference. Nothing here is global: tests construct
/// synthetic registries against synthetic schemas.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<String, EntityDef>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, entity: EntityDef) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.entities.keys()
    }

    /// The entities the gateway ships with: user accounts, dating profiles
    /// and messages between them.
    pub fn builtin() -> Self {
        Self::new()
            .register(EntityDef::new(
                "user",
                FieldSchema::new()
                    .field("id", FieldType::Integer)
                    .field("email", FieldType::Text)
                    .field("confirmed_at", FieldType::DateTime)
                    .hidden_field("password", FieldType::Text),
            ))
            .register(EntityDef::new(
                "profile",
                FieldSchema::new()
                    .field("id", FieldType::Integer)
                    .field("username", FieldType::Text)
                    .field("gender", FieldType::Integer)
                    .field("dob", FieldType::Date)
                    .field("headline", FieldType::Text)
                    .field("about", FieldType::Text)
                    .field("city", FieldType::Text)
                    .field("latest_seen", FieldType::DateTime),
            ))
            .register(EntityDef::new(
                "message",
                FieldSchema::new()
                    .field("id", FieldType::Integer)
                    .field("sent", FieldType::DateTime)
                    .field("to", FieldType::Integer)
                    .field("fro", FieldType::Integer)
                    .field("read", FieldType::DateTime),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_entities_are_registered() {
        let registry = EntityRegistry::builtin();
        for name in ["user", "profile", "message"] {
            assert!(registry.get(name).is_some(), "missing entity {name}");
        }
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn builtin_user_hides_password() {
        let registry = EntityRegistry::builtin();
        let user = registry.get("user").unwrap();
        assert!(user.fields.queryable("password").is_none());
        assert!(user.fields.queryable("email").is_some());
    }
}
