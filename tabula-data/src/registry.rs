use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::entity::Entity;
use crate::error::DataError;
use crate::resolver::{self, ResolvedField};
use crate::schema::{EntitySchema, FieldDescriptor};

struct Registered {
    entity: &'static str,
    descriptors: Vec<FieldDescriptor>,
    schema: Arc<dyn Any + Send + Sync>,
}

/// Process-wide table of entity schemas.
///
/// Populated once at startup, then shared read-only (typically behind an
/// `Arc`). Registering the same entity twice replaces the earlier schema.
#[derive(Default)]
pub struct SchemaRegistry {
    by_type: HashMap<TypeId, Registered>,
    by_name: HashMap<&'static str, TypeId>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` using its own [`Entity::schema`].
    pub fn register<T: Entity>(&mut self) -> Result<&mut Self, DataError> {
        self.register_schema(T::schema())
    }

    /// Register `T` with an explicitly built schema.
    pub fn register_schema<T: Entity>(
        &mut self,
        schema: EntitySchema<T>,
    ) -> Result<&mut Self, DataError> {
        schema.validate()?;
        let entity = T::table_name();
        let descriptors = schema.descriptors();
        tracing::debug!(entity, fields = descriptors.len(), "registering entity schema");

        if let Some(previous) = self.by_name.insert(entity, TypeId::of::<T>()) {
            if previous != TypeId::of::<T>() {
                // Another type claimed the same name; drop its typed entry.
                self.by_type.remove(&previous);
            }
            tracing::debug!(entity, "entity schema replaced");
        }
        self.by_type.insert(
            TypeId::of::<T>(),
            Registered {
                entity,
                descriptors,
                schema: Arc::new(schema),
            },
        );
        Ok(self)
    }

    /// Resolvable fields of the named entity, in declaration order.
    pub fn describe(&self, entity: &str) -> Result<&[FieldDescriptor], DataError> {
        self.by_name
            .get(entity)
            .and_then(|type_id| self.by_type.get(type_id))
            .map(|registered| registered.descriptors.as_slice())
            .ok_or_else(|| DataError::UnknownEntity(entity.to_string()))
    }

    /// The typed schema of `T`.
    pub fn schema<T: Entity>(&self) -> Result<Arc<EntitySchema<T>>, DataError> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|registered| registered.schema.clone().downcast::<EntitySchema<T>>().ok())
            .ok_or_else(|| DataError::UnknownEntity(T::table_name().to_string()))
    }

    /// Resolve a dotted field path on `T`.
    pub fn resolve<T: Entity>(&self, path: &str) -> Result<ResolvedField<T>, DataError> {
        resolver::resolve(&*self.schema::<T>()?, path)
    }

    /// Names of all registered entities, sorted.
    pub fn entities(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.by_type.values().map(|r| r.entity).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;
    use crate::value::FieldKind;

    #[derive(Clone)]
    struct Tag {
        id: i64,
        label: String,
        weight: i64,
    }

    impl Entity for Tag {
        type Id = i64;
        fn table_name() -> &'static str {
            "tags"
        }
        fn id_column() -> &'static str {
            "id"
        }
        fn id(&self) -> &i64 {
            &self.id
        }
        fn schema() -> EntitySchema<Self> {
            EntitySchema::new()
                .field(Field::number("id", |t: &Tag| t.id.into()))
                .field(Field::text("label", |t: &Tag| t.label.as_str().into()).searchable())
                .field(Field::number("weight", |t: &Tag| t.weight.into()))
        }
    }

    #[test]
    fn describe_registered_entity() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Tag>().unwrap();

        let fields = registry.describe("tags").unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["id", "label", "weight"]);
        assert_eq!(fields[1].kind, FieldKind::Text);
        assert_eq!(registry.entities(), vec!["tags"]);
    }

    #[test]
    fn unknown_entity_fails() {
        let registry = SchemaRegistry::new();
        assert!(matches!(
            registry.describe("tags"),
            Err(DataError::UnknownEntity(name)) if name == "tags"
        ));
        assert!(matches!(
            registry.schema::<Tag>(),
            Err(DataError::UnknownEntity(_))
        ));
    }

    #[test]
    fn re_registration_overwrites() {
        let mut registry = SchemaRegistry::new();
        registry.register::<Tag>().unwrap();
        registry
            .register_schema(
                EntitySchema::new().field(Field::number("id", |t: &Tag| t.id.into())),
            )
            .unwrap();

        assert_eq!(registry.describe("tags").unwrap().len(), 1);
        assert!(registry.resolve::<Tag>("label").is_err());
        assert!(registry.resolve::<Tag>("id").is_ok());
    }

    #[test]
    fn rejects_non_text_searchable_field() {
        let mut registry = SchemaRegistry::new();
        let schema = EntitySchema::new()
            .field(Field::number("weight", |t: &Tag| t.weight.into()).searchable());
        assert!(matches!(
            registry.register_schema(schema),
            Err(DataError::InvalidSchema(msg)) if msg.contains("weight")
        ));
        assert!(registry.describe("tags").is_err());
    }

    #[test]
    fn rejects_duplicate_field_names() {
        let mut registry = SchemaRegistry::new();
        let schema = EntitySchema::new()
            .field(Field::text("label", |t: &Tag| t.label.as_str().into()))
            .field(Field::text("label", |t: &Tag| t.label.as_str().into()));
        assert!(matches!(
            registry.register_schema(schema),
            Err(DataError::InvalidSchema(_))
        ));
    }
}
