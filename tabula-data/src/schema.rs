//! Static per-entity field tables.
//!
//! An [`EntitySchema`] is built once per entity type at startup and maps
//! field names to typed accessor functions. Nothing here inspects an entity
//! at runtime beyond calling those accessors.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::error::DataError;
use crate::value::{FieldKind, Value};

/// Reads one scalar value out of an entity.
pub type Accessor<T> = Arc<dyn Fn(&T) -> Value + Send + Sync>;

/// Typed, resolved representation of a named entity attribute.
///
/// `name` is the full dotted path (`"parent.name"`), `path` its segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    pub path: Vec<String>,
}

/// How a to-one relation is stored: `local_key` on the owning table points at
/// `remote_key` of `table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub local_key: String,
    pub table: String,
    pub remote_key: String,
}

impl Join {
    pub fn new(local_key: &str, table: &str, remote_key: &str) -> Self {
        Self {
            local_key: local_key.to_string(),
            table: table.to_string(),
            remote_key: remote_key.to_string(),
        }
    }
}

/// Storage location of a resolved scalar, for backends that query by column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    Column(String),
    /// A column reached through one to-one relation hop.
    Related { join: Join, inner: Box<ColumnRef> },
}

impl ColumnRef {
    pub(crate) fn through(joins: &[Join], column: &str) -> Self {
        joins
            .iter()
            .rev()
            .fold(ColumnRef::Column(column.to_string()), |inner, join| {
                ColumnRef::Related {
                    join: join.clone(),
                    inner: Box::new(inner),
                }
            })
    }
}

pub(crate) struct Scalar<T> {
    pub(crate) kind: FieldKind,
    pub(crate) column: String,
    pub(crate) access: Accessor<T>,
    pub(crate) searchable: bool,
}

pub(crate) enum Shape<T> {
    Scalar(Scalar<T>),
    /// To-one relation; nested fields already read from the owning entity.
    Relation { join: Join, fields: Vec<Field<T>> },
    /// Collection-valued field. Declared so that paths through it are rejected
    /// with a precise reason instead of "no such field".
    Collection,
}

/// One named field in an [`EntitySchema`].
pub struct Field<T> {
    pub(crate) name: String,
    pub(crate) shape: Shape<T>,
}

impl<T: 'static> Field<T> {
    fn scalar(
        name: &str,
        kind: FieldKind,
        access: impl Fn(&T) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.to_string(),
            shape: Shape::Scalar(Scalar {
                kind,
                column: name.to_string(),
                access: Arc::new(access),
                searchable: false,
            }),
        }
    }

    pub fn text(name: &str, access: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self::scalar(name, FieldKind::Text, access)
    }

    pub fn number(name: &str, access: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self::scalar(name, FieldKind::Number, access)
    }

    pub fn boolean(name: &str, access: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self::scalar(name, FieldKind::Boolean, access)
    }

    pub fn timestamp(name: &str, access: impl Fn(&T) -> Value + Send + Sync + 'static) -> Self {
        Self::scalar(name, FieldKind::Timestamp, access)
    }

    /// Store this field under a column name different from the field name.
    pub fn column(mut self, column: &str) -> Self {
        if let Shape::Scalar(scalar) = &mut self.shape {
            scalar.column = column.to_string();
        }
        self
    }

    /// Include this field in the free-text search allow-list.
    ///
    /// Only text fields may be searchable; registration rejects anything else.
    pub fn searchable(mut self) -> Self {
        if let Shape::Scalar(scalar) = &mut self.shape {
            scalar.searchable = true;
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> Option<FieldKind> {
        match &self.shape {
            Shape::Scalar(scalar) => Some(scalar.kind),
            _ => None,
        }
    }

    /// Re-root a field of `U` onto `T` through a to-one relation getter.
    fn lift<U: 'static>(field: Field<U>, get: fn(&T) -> Option<&U>) -> Self {
        let shape = match field.shape {
            Shape::Scalar(scalar) => {
                let inner = scalar.access;
                Shape::Scalar(Scalar {
                    kind: scalar.kind,
                    column: scalar.column,
                    access: Arc::new(move |entity: &T| get(entity).map_or(Value::Null, |u| inner(u))),
                    searchable: false,
                })
            }
            Shape::Relation { join, fields } => Shape::Relation {
                join,
                fields: fields.into_iter().map(|f| Field::lift(f, get)).collect(),
            },
            Shape::Collection => Shape::Collection,
        };
        Field {
            name: field.name,
            shape,
        }
    }
}

/// The field table of one entity type.
///
/// # Example
///
/// ```ignore
/// fn category_fields() -> EntitySchema<Category> {
///     EntitySchema::new()
///         .field(Field::number("id", |c: &Category| c.id.into()))
///         .field(Field::text("name", |c: &Category| c.name.as_str().into()).searchable())
/// }
///
/// let schema = category_fields()
///     .relation("parent", Join::new("parent_id", "categories", "id"),
///               |c| c.parent.as_deref(), category_fields())
///     .collection("children");
/// ```
pub struct EntitySchema<T> {
    fields: Vec<Field<T>>,
}

impl<T: 'static> Default for EntitySchema<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> EntitySchema<T> {
    pub fn new() -> Self {
        Self { fields: Vec::new() }
    }

    pub fn field(mut self, field: Field<T>) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a to-one relation whose fields are reachable as `name.<field>`.
    ///
    /// The target schema is taken by value, so self-referencing entities
    /// choose their own nesting depth.
    pub fn relation<U: 'static>(
        mut self,
        name: &str,
        join: Join,
        get: fn(&T) -> Option<&U>,
        target: EntitySchema<U>,
    ) -> Self {
        let fields = target
            .fields
            .into_iter()
            .map(|f| Field::lift(f, get))
            .collect();
        self.fields.push(Field {
            name: name.to_string(),
            shape: Shape::Relation { join, fields },
        });
        self
    }

    /// Declare a collection-valued field. It can never be sorted or filtered on.
    pub fn collection(mut self, name: &str) -> Self {
        self.fields.push(Field {
            name: name.to_string(),
            shape: Shape::Collection,
        });
        self
    }

    pub fn fields(&self) -> &[Field<T>] {
        &self.fields
    }

    /// Every resolvable scalar, depth-first in declaration order.
    pub fn descriptors(&self) -> Vec<FieldDescriptor> {
        let mut out = Vec::new();
        collect_descriptors(&self.fields, &mut Vec::new(), &mut out);
        out
    }

    /// Top-level scalar column names, in declaration order.
    pub fn columns(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter_map(|f| match &f.shape {
                Shape::Scalar(scalar) => Some(scalar.column.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check the schema for duplicate names and non-text searchable fields.
    pub fn validate(&self) -> Result<(), DataError> {
        validate_level(&self.fields, "")
    }
}

fn collect_descriptors<T>(
    fields: &[Field<T>],
    prefix: &mut Vec<String>,
    out: &mut Vec<FieldDescriptor>,
) {
    for field in fields {
        match &field.shape {
            Shape::Scalar(scalar) => {
                let mut path = prefix.clone();
                path.push(field.name.clone());
                out.push(FieldDescriptor {
                    name: path.join("."),
                    kind: scalar.kind,
                    path,
                });
            }
            Shape::Relation { fields, .. } => {
                prefix.push(field.name.clone());
                collect_descriptors(fields, prefix, out);
                prefix.pop();
            }
            Shape::Collection => {}
        }
    }
}

fn validate_level<T>(fields: &[Field<T>], prefix: &str) -> Result<(), DataError> {
    let mut seen = HashSet::new();
    for field in fields {
        let qualified = if prefix.is_empty() {
            field.name.clone()
        } else {
            format!("{prefix}.{}", field.name)
        };
        if field.name.is_empty() || field.name.contains('.') {
            return Err(DataError::InvalidSchema(format!(
                "invalid field name `{qualified}`"
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(DataError::InvalidSchema(format!(
                "duplicate field `{qualified}`"
            )));
        }
        match &field.shape {
            Shape::Scalar(scalar) if scalar.searchable && scalar.kind != FieldKind::Text => {
                return Err(DataError::InvalidSchema(format!(
                    "searchable field `{qualified}` is {}, only text fields can be searched",
                    scalar.kind
                )));
            }
            Shape::Relation { fields, .. } => validate_level(fields, &qualified)?,
            _ => {}
        }
    }
    Ok(())
}
