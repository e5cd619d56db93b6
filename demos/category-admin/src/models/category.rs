use chrono::{DateTime, Utc};
use serde::Serialize;
use tabula::prelude::*;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub parent_category_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Loaded rows leave this empty; `parent.*` fields sort through the join.
    #[sqlx(skip)]
    pub parent: Option<Box<Category>>,
}

fn fields() -> EntitySchema<Category> {
    EntitySchema::new()
        .field(Field::number("id", |c: &Category| c.id.into()))
        .field(Field::number("parent_category_id", |c: &Category| c.parent_category_id.into()))
        .field(Field::text("name", |c: &Category| c.name.as_str().into()).searchable())
        .field(Field::text("slug", |c: &Category| c.slug.as_str().into()))
        .field(Field::text("description", |c: &Category| c.description.as_deref().into()).searchable())
        .field(Field::text("image_url", |c: &Category| c.image_url.as_deref().into()))
        .field(Field::boolean("is_active", |c: &Category| c.is_active.into()))
        .field(Field::timestamp("created_at", |c: &Category| c.created_at.into()))
        .field(Field::timestamp("updated_at", |c: &Category| c.updated_at.into()))
}

impl Entity for Category {
    type Id = i64;

    fn table_name() -> &'static str {
        "categories"
    }

    fn id_column() -> &'static str {
        "id"
    }

    fn id(&self) -> &i64 {
        &self.id
    }

    fn schema() -> EntitySchema<Self> {
        fields()
            .relation(
                "parent",
                Join::new("parent_category_id", "categories", "id"),
                |c: &Category| c.parent.as_deref(),
                fields(),
            )
            .collection("children")
    }
}

/// One row of the category table as the admin page renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRow {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub created_at: String,
    pub status: &'static str,
}

impl From<Category> for CategoryRow {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
            created_at: c.created_at.format("%Y-%m-%d").to_string(),
            status: if c.is_active { "Active" } else { "Inactive" },
        }
    }
}
