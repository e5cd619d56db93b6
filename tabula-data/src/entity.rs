use std::fmt::Debug;

use crate::schema::EntitySchema;

/// Trait representing a stored entity: a table name, a primary key, and a
/// static field table.
///
/// # Example
///
/// ```ignore
/// impl Entity for Category {
///     type Id = i64;
///     fn table_name() -> &'static str { "categories" }
///     fn id_column() -> &'static str { "id" }
///     fn id(&self) -> &i64 { &self.id }
///     fn schema() -> EntitySchema<Self> {
///         EntitySchema::new()
///             .field(Field::number("id", |c: &Category| c.id.into()))
///             .field(Field::text("name", |c: &Category| c.name.as_str().into()).searchable())
///     }
/// }
/// ```
pub trait Entity: Clone + Send + Sync + Unpin + 'static {
    /// Primary key. Its ordering is the tie-break for every sorted page.
    type Id: Ord + Clone + Debug + ToString + Send + Sync + 'static;

    /// Table name; also the entity's name in the schema registry.
    fn table_name() -> &'static str;
    fn id_column() -> &'static str;
    fn id(&self) -> &Self::Id;

    /// Build the field table. Called once, at registration.
    fn schema() -> EntitySchema<Self>;
}
