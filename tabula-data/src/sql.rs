//! SQL rendering of [`Query`] values.
//!
//! ```ignore
//! let sql = SqlBuilder::<Category>::for_entity(Dialect::Sqlite)?;
//! let (count, params) = sql.build_count(&built.filtered)?;
//! let (select, params) = sql.build_select(&built.page)?;
//! ```
//!
//! The main table is always aliased `t0`; relation hops render as correlated
//! scalar subqueries aliased `t1`, `t2`, ... by depth.

use std::marker::PhantomData;

use crate::entity::Entity;
use crate::query::Query;
use crate::schema::ColumnRef;

const MAX_ROWS: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// Standard SQL with `?` placeholders.
    Generic,
    Sqlite,
    /// `?` placeholders with backtick quoting.
    MySql,
    /// `$1, $2, ...` placeholders.
    Postgres,
}

impl Dialect {
    fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${index}"),
            Dialect::Generic | Dialect::Sqlite | Dialect::MySql => "?".to_string(),
        }
    }

    fn quote_char(self) -> char {
        match self {
            Dialect::MySql => '`',
            Dialect::Generic | Dialect::Sqlite | Dialect::Postgres => '"',
        }
    }

    /// `haystack` contains `needle` (both already lower-cased).
    fn contains(self, haystack: &str, needle: &str) -> String {
        match self {
            Dialect::Sqlite => format!("instr({haystack}, {needle}) > 0"),
            Dialect::Postgres => format!("strpos({haystack}, {needle}) > 0"),
            Dialect::MySql => format!("LOCATE({needle}, {haystack}) > 0"),
            Dialect::Generic => format!("POSITION({needle} IN {haystack}) > 0"),
        }
    }

    /// Nulls sort first ascending and last descending, as in memory.
    fn null_order(self, ascending: bool) -> &'static str {
        match (self, ascending) {
            (Dialect::Postgres, true) => " NULLS FIRST",
            (Dialect::Postgres, false) => " NULLS LAST",
            _ => "",
        }
    }
}

#[derive(Debug, Clone)]
pub enum QueryError {
    InvalidIdentifier { kind: &'static str, ident: String },
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidIdentifier { kind, ident } => {
                write!(f, "Invalid {kind} identifier: {ident}")
            }
        }
    }
}

impl std::error::Error for QueryError {}

/// Renders the queries of one entity type as parameterised SQL.
///
/// Every statement comes back as `(sql, bind_values)`. Bind values are
/// strings; the primary key is bound through its `ToString` form.
pub struct SqlBuilder<T> {
    table: String,
    id_column: String,
    dialect: Dialect,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for SqlBuilder<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            id_column: self.id_column.clone(),
            dialect: self.dialect,
            _entity: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for SqlBuilder<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlBuilder")
            .field("table", &self.table)
            .field("id_column", &self.id_column)
            .field("dialect", &self.dialect)
            .finish()
    }
}

impl<T: Entity> SqlBuilder<T> {
    pub fn for_entity(dialect: Dialect) -> Result<Self, QueryError> {
        let builder = Self {
            table: T::table_name().to_string(),
            id_column: T::id_column().to_string(),
            dialect,
            _entity: PhantomData,
        };
        builder.ident(&builder.table, "table")?;
        builder.ident(&builder.id_column, "column")?;
        for column in T::schema().columns() {
            builder.ident(column, "column")?;
        }
        Ok(builder)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `SELECT COUNT(*)` over the rows the query's predicate admits.
    pub fn build_count(&self, query: &Query<T>) -> Result<(String, Vec<String>), QueryError> {
        let mut sql = format!("SELECT COUNT(*) FROM {}", self.from()?);
        let mut params = Vec::new();
        self.append_where(query, &mut sql, &mut params)?;
        Ok((sql, params))
    }

    /// Full rows, filtered, ordered (primary key as tie-break) and windowed.
    pub fn build_select(&self, query: &Query<T>) -> Result<(String, Vec<String>), QueryError> {
        let mut sql = format!("SELECT {}.* FROM {}", self.ident("t0", "alias")?, self.from()?);
        let mut params = Vec::new();
        self.append_where(query, &mut sql, &mut params)?;
        self.append_order(query, &mut sql)?;
        self.append_limit_offset(query, &mut sql);
        Ok((sql, params))
    }

    /// One row by primary key; bind the id as the single parameter.
    pub fn build_find_by_id(&self) -> Result<String, QueryError> {
        Ok(format!(
            "SELECT {t0}.* FROM {from} WHERE {t0}.{id} = {p}",
            t0 = self.ident("t0", "alias")?,
            from = self.from()?,
            id = self.ident(&self.id_column, "column")?,
            p = self.dialect.placeholder(1),
        ))
    }

    fn from(&self) -> Result<String, QueryError> {
        Ok(format!(
            "{} AS {}",
            self.ident(&self.table, "table")?,
            self.ident("t0", "alias")?
        ))
    }

    fn append_where(
        &self,
        query: &Query<T>,
        sql: &mut String,
        params: &mut Vec<String>,
    ) -> Result<(), QueryError> {
        let Some(filter) = query.text_filter() else {
            return Ok(());
        };
        if filter.fields().is_empty() {
            sql.push_str(" WHERE 1 = 0");
            return Ok(());
        }
        let mut clauses = Vec::with_capacity(filter.fields().len());
        for field in filter.fields() {
            let column = self.column_expr(field.column(), "t0", 1)?;
            let placeholder = self.dialect.placeholder(params.len() + 1);
            let haystack = format!("LOWER(COALESCE({column}, ''))");
            clauses.push(self.dialect.contains(&haystack, &placeholder));
            params.push(filter.needle().to_string());
        }
        sql.push_str(&format!(" WHERE ({})", clauses.join(" OR ")));
        Ok(())
    }

    fn append_order(&self, query: &Query<T>, sql: &mut String) -> Result<(), QueryError> {
        let id = format!(
            "{}.{}",
            self.ident("t0", "alias")?,
            self.ident(&self.id_column, "column")?
        );
        match query.ordering() {
            Some(sort) => {
                let expr = self.column_expr(sort.field.column(), "t0", 1)?;
                let dir = if sort.ascending { "ASC" } else { "DESC" };
                let nulls = self.dialect.null_order(sort.ascending);
                sql.push_str(&format!(" ORDER BY {expr} {dir}{nulls}, {id} ASC"));
            }
            None => sql.push_str(&format!(" ORDER BY {id} ASC")),
        }
        Ok(())
    }

    /// Windows beyond `i64::MAX` rows are unbounded; SQL engines read larger
    /// literals as non-integers.
    fn append_limit_offset(&self, query: &Query<T>, sql: &mut String) {
        let skip = query.skip_count().min(MAX_ROWS);
        match query.take_count().filter(|&take| take < MAX_ROWS) {
            Some(take) => sql.push_str(&format!(" LIMIT {take}")),
            None if skip > 0 => match self.dialect {
                Dialect::Sqlite => sql.push_str(" LIMIT -1"),
                Dialect::MySql => sql.push_str(&format!(" LIMIT {}", u64::MAX)),
                Dialect::Generic | Dialect::Postgres => {}
            },
            None => {}
        }
        if skip > 0 {
            sql.push_str(&format!(" OFFSET {skip}"));
        }
    }

    /// SQL expression reading `column` relative to the row aliased `outer`.
    fn column_expr(&self, column: &ColumnRef, outer: &str, depth: usize) -> Result<String, QueryError> {
        match column {
            ColumnRef::Column(name) => Ok(format!(
                "{}.{}",
                self.ident(outer, "alias")?,
                self.ident(name, "column")?
            )),
            ColumnRef::Related { join, inner } => {
                let alias = format!("t{depth}");
                let value = self.column_expr(inner, &alias, depth + 1)?;
                Ok(format!(
                    "(SELECT {value} FROM {table} AS {a} WHERE {a}.{remote} = {o}.{local})",
                    table = self.ident(&join.table, "table")?,
                    a = self.ident(&alias, "alias")?,
                    remote = self.ident(&join.remote_key, "column")?,
                    o = self.ident(outer, "alias")?,
                    local = self.ident(&join.local_key, "column")?,
                ))
            }
        }
    }

    fn ident(&self, ident: &str, kind: &'static str) -> Result<String, QueryError> {
        if !is_valid_identifier(ident) {
            return Err(QueryError::InvalidIdentifier {
                kind,
                ident: ident.to_string(),
            });
        }
        let quote = self.dialect.quote_char();
        Ok(format!("{quote}{ident}{quote}"))
    }
}

fn is_valid_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{QueryBuilder, QuerySpec};
    use crate::resolver::resolve;
    use crate::schema::{EntitySchema, Field, Join};

    #[derive(Clone)]
    struct Category {
        id: i64,
        name: String,
        parent: Option<Box<Category>>,
    }

    fn scalars() -> EntitySchema<Category> {
        EntitySchema::new()
            .field(Field::number("id", |c: &Category| c.id.into()))
            .field(Field::text("name", |c: &Category| c.name.as_str().into()).searchable())
            .field(Field::number("parent_id", |c: &Category| c.parent.as_ref().map(|p| p.id).into()))
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
            scalars().relation(
                "parent",
                Join::new("parent_id", "categories", "id"),
                |c: &Category| c.parent.as_deref(),
                scalars(),
            )
        }
    }

    struct Bad;

    impl Clone for Bad {
        fn clone(&self) -> Self {
            Bad
        }
    }

    impl Entity for Bad {
        type Id = i64;
        fn table_name() -> &'static str {
            "users;drop"
        }
        fn id_column() -> &'static str {
            "id"
        }
        fn id(&self) -> &i64 {
            &0
        }
        fn schema() -> EntitySchema<Self> {
            EntitySchema::new()
        }
    }

    #[test]
    fn unsorted_select_orders_by_primary_key() {
        let sql = SqlBuilder::<Category>::for_entity(Dialect::Sqlite).unwrap();
        let (select, params) = sql.build_select(&Query::scan()).unwrap();
        assert_eq!(
            select,
            r#"SELECT "t0".* FROM "categories" AS "t0" ORDER BY "t0"."id" ASC"#
        );
        assert!(params.is_empty());
    }

    #[test]
    fn filter_binds_needle_once_per_searchable_field() {
        let schema = Category::schema();
        let built = QueryBuilder::new(&schema).build(&QuerySpec::new(20, 10).filter("Tool"));
        let sql = SqlBuilder::<Category>::for_entity(Dialect::Sqlite).unwrap();

        let (count, params) = sql.build_count(&built.filtered).unwrap();
        assert_eq!(
            count,
            r#"SELECT COUNT(*) FROM "categories" AS "t0" WHERE (instr(LOWER(COALESCE("t0"."name", '')), ?) > 0)"#
        );
        assert_eq!(params, vec!["tool"]);

        let (select, _) = sql.build_select(&built.page).unwrap();
        assert!(select.ends_with(r#"ORDER BY "t0"."id" ASC LIMIT 10 OFFSET 20"#));
    }

    #[test]
    fn base_count_has_no_predicate() {
        let sql = SqlBuilder::<Category>::for_entity(Dialect::Generic).unwrap();
        let (count, params) = sql.build_count(&Query::scan()).unwrap();
        assert_eq!(count, r#"SELECT COUNT(*) FROM "categories" AS "t0""#);
        assert!(params.is_empty());
    }

    #[test]
    fn related_sort_uses_correlated_subquery() {
        let schema = Category::schema();
        let parent_name = resolve(&schema, "parent.name").unwrap();
        let query = Query::scan().order_by(crate::query::SortSpec {
            field: parent_name,
            ascending: false,
        });
        let sql = SqlBuilder::<Category>::for_entity(Dialect::Postgres).unwrap();
        let (select, _) = sql.build_select(&query).unwrap();
        assert_eq!(
            select,
            r#"SELECT "t0".* FROM "categories" AS "t0" ORDER BY (SELECT "t1"."name" FROM "categories" AS "t1" WHERE "t1"."id" = "t0"."parent_id") DESC NULLS LAST, "t0"."id" ASC"#
        );
    }

    #[test]
    fn postgres_and_mysql_placeholders() {
        let schema = Category::schema();
        let built = QueryBuilder::new(&schema).build(&QuerySpec::new(0, 5).filter("x"));

        let pg = SqlBuilder::<Category>::for_entity(Dialect::Postgres).unwrap();
        let (count, _) = pg.build_count(&built.filtered).unwrap();
        assert!(count.contains(r#"strpos(LOWER(COALESCE("t0"."name", '')), $1) > 0"#));

        let my = SqlBuilder::<Category>::for_entity(Dialect::MySql).unwrap();
        let (count, _) = my.build_count(&built.filtered).unwrap();
        assert!(count.contains("LOCATE(?, LOWER(COALESCE(`t0`.`name`, ''))) > 0"));
        assert_eq!(
            my.build_find_by_id().unwrap(),
            "SELECT `t0`.* FROM `categories` AS `t0` WHERE `t0`.`id` = ?"
        );
    }

    #[test]
    fn offset_without_limit() {
        let sql = SqlBuilder::<Category>::for_entity(Dialect::Sqlite).unwrap();
        let (select, _) = sql.build_select(&Query::scan().skip(3)).unwrap();
        assert!(select.ends_with("LIMIT -1 OFFSET 3"));
    }

    #[test]
    fn oversized_window_is_clamped_to_i64() {
        let sql = SqlBuilder::<Category>::for_entity(Dialect::Sqlite).unwrap();
        let (select, _) = sql.build_select(&Query::scan().take(u64::MAX)).unwrap();
        assert!(select.ends_with(r#"ORDER BY "t0"."id" ASC"#));

        let (select, _) = sql.build_select(&Query::scan().skip(u64::MAX).take(10)).unwrap();
        assert!(select.ends_with(&format!("LIMIT 10 OFFSET {}", i64::MAX)));

        let (select, _) = sql.build_select(&Query::scan().skip(2).take(u64::MAX)).unwrap();
        assert!(select.ends_with("LIMIT -1 OFFSET 2"));
    }

    #[test]
    fn invalid_table_is_rejected() {
        let err = SqlBuilder::<Bad>::for_entity(Dialect::Sqlite).unwrap_err();
        assert!(matches!(err, QueryError::InvalidIdentifier { kind: "table", .. }));
    }
}
