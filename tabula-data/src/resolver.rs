//! Dotted-path field resolution.

use std::fmt;

use crate::error::DataError;
use crate::schema::{Accessor, ColumnRef, EntitySchema, FieldDescriptor, Shape};
use crate::value::{FieldKind, Value};

/// A field path resolved against a schema: its descriptor, the accessor that
/// reads it from an entity, and where a relational store keeps it.
pub struct ResolvedField<T> {
    descriptor: FieldDescriptor,
    access: Accessor<T>,
    column: ColumnRef,
}

impl<T> ResolvedField<T> {
    pub fn descriptor(&self) -> &FieldDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn kind(&self) -> FieldKind {
        self.descriptor.kind
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    /// Read this field from `entity`.
    pub fn value(&self, entity: &T) -> Value {
        (self.access)(entity)
    }
}

impl<T> Clone for ResolvedField<T> {
    fn clone(&self) -> Self {
        Self {
            descriptor: self.descriptor.clone(),
            access: self.access.clone(),
            column: self.column.clone(),
        }
    }
}

impl<T> fmt::Debug for ResolvedField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedField")
            .field("descriptor", &self.descriptor)
            .field("column", &self.column)
            .finish_non_exhaustive()
    }
}

/// Resolve `path` (e.g. `"parent.name"`) against `schema`.
///
/// Each dot-separated segment is looked up at its own nesting level. The
/// path must end on a scalar; paths through collections, past scalars, or
/// ending on a relation fail with [`DataError::UnresolvableField`].
pub fn resolve<T>(schema: &EntitySchema<T>, path: &str) -> Result<ResolvedField<T>, DataError>
where
    T: 'static,
{
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(DataError::unresolvable(path, "empty path segment"));
    }

    let mut fields = schema.fields();
    let mut joins = Vec::new();
    for (depth, segment) in segments.iter().enumerate() {
        let last = depth + 1 == segments.len();
        let field = fields
            .iter()
            .find(|f| f.name == *segment)
            .ok_or_else(|| DataError::unresolvable(path, format!("no field `{segment}`")))?;

        match &field.shape {
            Shape::Scalar(scalar) if last => {
                return Ok(ResolvedField {
                    descriptor: FieldDescriptor {
                        name: path.to_string(),
                        kind: scalar.kind,
                        path: segments.iter().map(|s| s.to_string()).collect(),
                    },
                    access: scalar.access.clone(),
                    column: ColumnRef::through(&joins, &scalar.column),
                });
            }
            Shape::Scalar(_) => {
                return Err(DataError::unresolvable(
                    path,
                    format!("`{segment}` is a scalar and has no fields"),
                ));
            }
            Shape::Relation { .. } if last => {
                return Err(DataError::unresolvable(
                    path,
                    format!("`{segment}` is a relation, not a scalar"),
                ));
            }
            Shape::Relation { join, fields: nested } => {
                joins.push(join.clone());
                fields = nested.as_slice();
            }
            Shape::Collection => {
                return Err(DataError::unresolvable(
                    path,
                    format!("`{segment}` is a collection"),
                ));
            }
        }
    }

    // split() always yields at least one segment, and the last one returns.
    Err(DataError::unresolvable(path, "empty path"))
}

/// All top-level fields marked searchable, resolved.
pub fn searchable_fields<T: 'static>(schema: &EntitySchema<T>) -> Vec<ResolvedField<T>> {
    schema
        .fields()
        .iter()
        .filter_map(|field| match &field.shape {
            Shape::Scalar(scalar) if scalar.searchable => Some(ResolvedField {
                descriptor: FieldDescriptor {
                    name: field.name.clone(),
                    kind: scalar.kind,
                    path: vec![field.name.clone()],
                },
                access: scalar.access.clone(),
                column: ColumnRef::Column(scalar.column.clone()),
            }),
            _ => None,
        })
        .collect()
}
