//! Request-facing façade: turns loosely typed paging/sort/search input into a
//! [`QuerySpec`] and runs it through a [`Repository`].

use std::str::FromStr;
use std::sync::Arc;

use tabula_core::{ConfigError, ConfigProperties, TabulaConfig};

use crate::entity::Entity;
use crate::error::DataError;
use crate::page::QueryResult;
use crate::query::{QuerySpec, SortSpec};
use crate::registry::SchemaRegistry;
use crate::repository::Repository;
use crate::resolver::{resolve, ResolvedField};
use crate::schema::EntitySchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn is_ascending(self) -> bool {
        self == SortDirection::Asc
    }
}

impl FromStr for SortDirection {
    type Err = DataError;

    /// `asc` / `desc`, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("asc") {
            Ok(SortDirection::Asc)
        } else if s.eq_ignore_ascii_case("desc") {
            Ok(SortDirection::Desc)
        } else {
            Err(DataError::InvalidSortDirection(s.to_string()))
        }
    }
}

/// Typed `tabula.table` configuration section.
///
/// ```yaml
/// tabula:
///   table:
///     default_length: 25
///     max_length: 500
///     default_sort: name
///     default_direction: asc
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TableConfig {
    pub default_length: u64,
    pub max_length: Option<u64>,
    pub default_sort: Option<String>,
    pub default_direction: SortDirection,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            default_length: 10,
            max_length: None,
            default_sort: None,
            default_direction: SortDirection::Asc,
        }
    }
}

impl ConfigProperties for TableConfig {
    fn prefix() -> &'static str {
        "tabula.table"
    }

    fn from_config(config: &TabulaConfig) -> Result<Self, ConfigError> {
        let defaults = TableConfig::default();
        let direction_key = Self::key("default_direction");
        let direction = match config.get_or::<Option<String>>(&direction_key, None)? {
            Some(raw) => raw.parse::<SortDirection>().map_err(|_| ConfigError::Invalid {
                key: direction_key.clone(),
                message: format!("expected `asc` or `desc`, got `{raw}`"),
            })?,
            None => defaults.default_direction,
        };
        Ok(Self {
            default_length: config.get_or(&Self::key("default_length"), defaults.default_length)?,
            max_length: config.get_or(&Self::key("max_length"), None)?,
            default_sort: config
                .get_or::<Option<String>>(&Self::key("default_sort"), None)?
                .filter(|s| !s.is_empty()),
            default_direction: direction,
        })
    }
}

/// Raw paging, sort and search input as a client sends it.
///
/// Every part is optional; defaults and clamping are applied by
/// [`TabularQueryService::spec`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableRequest {
    pub start: Option<i64>,
    pub length: Option<i64>,
    pub sort_field: Option<String>,
    pub sort_direction: Option<String>,
    pub search: Option<String>,
}

impl TableRequest {
    /// Build from `start`, `length`, `sort`, `dir` and `search` parameters.
    /// Integers that fail to parse are treated as absent; unknown keys are
    /// ignored.
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut request = TableRequest::default();
        for (key, value) in params {
            let value = value.as_ref();
            match key.as_ref() {
                "start" => request.start = value.trim().parse().ok(),
                "length" => request.length = value.trim().parse().ok(),
                "sort" => request.sort_field = Some(value.to_string()),
                "dir" => request.sort_direction = Some(value.to_string()),
                "search" => request.search = Some(value.to_string()),
                _ => {}
            }
        }
        request
    }
}

/// Paged, sorted, filtered reads of one entity type.
///
/// ```ignore
/// let service = TabularQueryService::new(&registry, repo, config.typed().clone())?;
/// let result = service.query(&TableRequest::from_params(params)).await?;
/// ```
pub struct TabularQueryService<T: Entity, R> {
    schema: Arc<EntitySchema<T>>,
    repository: R,
    config: TableConfig,
    default_sort: Option<ResolvedField<T>>,
}

impl<T: Entity, R: Repository<T>> TabularQueryService<T, R> {
    /// Look `T` up in the registry and bind it to `repository`.
    pub fn new(
        registry: &SchemaRegistry,
        repository: R,
        config: TableConfig,
    ) -> Result<Self, DataError> {
        Self::with_schema(registry.schema::<T>()?, repository, config)
    }

    /// Fails with [`DataError::InvalidSchema`] when the configured default
    /// sort does not resolve.
    pub fn with_schema(
        schema: Arc<EntitySchema<T>>,
        repository: R,
        config: TableConfig,
    ) -> Result<Self, DataError> {
        let default_sort = match config.default_sort.as_deref() {
            Some(path) => Some(resolve(&schema, path).map_err(|e| {
                DataError::InvalidSchema(format!(
                    "default sort for `{}` does not resolve: {e}",
                    T::table_name()
                ))
            })?),
            None => None,
        };
        Ok(Self {
            schema,
            repository,
            config,
            default_sort,
        })
    }

    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Normalise a raw request into a validated [`QuerySpec`].
    pub fn spec(&self, request: &TableRequest) -> Result<QuerySpec<T>, DataError> {
        let offset = request.start.map_or(0, |start| start.max(0) as u64);
        let mut limit = request
            .length
            .map_or(self.config.default_length, |length| length.max(0) as u64);
        if let Some(max) = self.config.max_length {
            limit = limit.min(max);
        }

        let direction = match request.sort_direction.as_deref() {
            Some(raw) if !raw.is_empty() => raw.parse::<SortDirection>()?,
            _ => self.config.default_direction,
        };

        let field = match request.sort_field.as_deref() {
            Some(path) if !path.is_empty() => {
                Some(resolve(&self.schema, path).map_err(|e| match e {
                    DataError::UnresolvableField { path, reason } => {
                        DataError::InvalidSortField { field: path, reason }
                    }
                    other => other,
                })?)
            }
            _ => self.default_sort.clone(),
        };

        let mut spec = QuerySpec::new(offset, limit);
        spec.sort = field.map(|field| SortSpec {
            field,
            ascending: direction.is_ascending(),
        });
        spec.filter_text = request.search.clone().filter(|s| !s.is_empty());
        Ok(spec)
    }

    /// Run `request` and return both counts with the page.
    pub async fn query(&self, request: &TableRequest) -> Result<QueryResult<T>, DataError> {
        let spec = self.spec(request)?;
        self.repository.execute(&spec).await
    }

    pub async fn find_by_id(&self, id: &T::Id) -> Result<T, DataError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| DataError::NotFound(format!("{} {id:?}", T::table_name())))
    }

    pub async fn count(&self) -> Result<u64, DataError> {
        self.repository.count().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::repository::TableRepository;
    use crate::schema::Field;

    #[derive(Clone, Debug, PartialEq)]
    struct Product {
        id: i64,
        name: String,
        price: i64,
    }

    impl Entity for Product {
        type Id = i64;
        fn table_name() -> &'static str {
            "products"
        }
        fn id_column() -> &'static str {
            "id"
        }
        fn id(&self) -> &i64 {
            &self.id
        }
        fn schema() -> EntitySchema<Self> {
            EntitySchema::new()
                .field(Field::number("id", |p: &Product| p.id.into()))
                .field(Field::text("name", |p: &Product| p.name.as_str().into()).searchable())
                .field(Field::number("price", |p: &Product| p.price.into()))
        }
    }

    fn product(id: i64, name: &str, price: i64) -> Product {
        Product {
            id,
            name: name.to_string(),
            price,
        }
    }

    type Service = TabularQueryService<Product, TableRepository<Product, MemoryStore<Product>>>;

    fn service(config: TableConfig) -> Result<Service, DataError> {
        let mut registry = SchemaRegistry::new();
        registry.register::<Product>()?;
        let store = MemoryStore::from_rows(vec![
            product(1, "Toys", 30),
            product(2, "Books", 10),
            product(3, "Bookshelf", 20),
        ]);
        let repo = TableRepository::new(&Product::schema(), store);
        TabularQueryService::new(&registry, repo, config)
    }

    fn request(pairs: &[(&str, &str)]) -> TableRequest {
        TableRequest::from_params(pairs.iter().copied())
    }

    #[test]
    fn parses_sort_direction() {
        assert_eq!("ASC".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!(matches!(
            "up".parse::<SortDirection>(),
            Err(DataError::InvalidSortDirection(_))
        ));
    }

    #[test]
    fn from_params_ignores_malformed_integers() {
        let req = request(&[("start", "abc"), ("length", " 7 "), ("sort", "name"), ("x", "y")]);
        assert_eq!(req.start, None);
        assert_eq!(req.length, Some(7));
        assert_eq!(req.sort_field.as_deref(), Some("name"));
    }

    #[test]
    fn clamps_negative_window_and_applies_defaults() {
        let svc = service(TableConfig::default()).unwrap();
        let spec = svc.spec(&request(&[("start", "-4")])).unwrap();
        assert_eq!(spec.offset, 0);
        assert_eq!(spec.limit, 10);

        let spec = svc.spec(&request(&[("length", "-1")])).unwrap();
        assert_eq!(spec.limit, 0);
    }

    #[test]
    fn caps_length_at_configured_maximum() {
        let svc = service(TableConfig {
            max_length: Some(50),
            ..TableConfig::default()
        })
        .unwrap();
        assert_eq!(svc.spec(&request(&[("length", "1000")])).unwrap().limit, 50);
    }

    #[test]
    fn unknown_sort_field_is_rejected() {
        let svc = service(TableConfig::default()).unwrap();
        let err = svc.spec(&request(&[("sort", "colour")])).unwrap_err();
        assert!(matches!(err, DataError::InvalidSortField { .. }));
        assert!(err.is_client_error());

        let err = svc.spec(&request(&[("sort", "name"), ("dir", "sideways")])).unwrap_err();
        assert!(matches!(err, DataError::InvalidSortDirection(_)));
    }

    #[test]
    fn unresolvable_default_sort_fails_construction() {
        let err = service(TableConfig {
            default_sort: Some("missing".into()),
            ..TableConfig::default()
        })
        .err()
        .unwrap();
        assert!(matches!(err, DataError::InvalidSchema(_)));
    }

    #[tokio::test]
    async fn default_sort_applies_when_field_is_empty() {
        let svc = service(TableConfig {
            default_sort: Some("price".into()),
            default_direction: SortDirection::Desc,
            ..TableConfig::default()
        })
        .unwrap();
        let result = svc.query(&request(&[("sort", "")])).await.unwrap();
        let ids: Vec<i64> = result.page.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3, 2]);
    }

    #[tokio::test]
    async fn books_scenario() {
        let svc = service(TableConfig::default()).unwrap();
        let result = svc
            .query(&request(&[("search", "book"), ("sort", "name"), ("dir", "asc")]))
            .await
            .unwrap();
        assert_eq!(result.total_count, 3);
        assert_eq!(result.filtered_count, 2);
        let names: Vec<&str> = result.page.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Books", "Bookshelf"]);

        let result = svc
            .query(&request(&[("start", "5"), ("length", "5")]))
            .await
            .unwrap();
        assert!(result.page.is_empty());
        assert_eq!(result.filtered_count, 3);
    }

    #[tokio::test]
    async fn find_by_id_reports_missing_rows() {
        let svc = service(TableConfig::default()).unwrap();
        assert_eq!(svc.find_by_id(&2).await.unwrap().name, "Books");
        assert!(matches!(svc.find_by_id(&42).await, Err(DataError::NotFound(_))));
        assert_eq!(svc.count().await.unwrap(), 3);
    }

    #[test]
    fn table_config_from_yaml() {
        let config = TabulaConfig::from_yaml_str(
            "tabula:\n  table:\n    default_length: 25\n    max_length: 100\n    default_sort: name\n    default_direction: DESC\n",
            "test",
        )
        .unwrap();
        let table = TableConfig::from_config(&config).unwrap();
        assert_eq!(
            table,
            TableConfig {
                default_length: 25,
                max_length: Some(100),
                default_sort: Some("name".into()),
                default_direction: SortDirection::Desc,
            }
        );
        assert_eq!(TableConfig::from_config(&TabulaConfig::empty()).unwrap(), TableConfig::default());
    }

    #[test]
    fn table_config_rejects_bad_direction() {
        let config =
            TabulaConfig::from_yaml_str("tabula:\n  table:\n    default_direction: up\n", "test").unwrap();
        assert!(matches!(
            TableConfig::from_config(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
