use serde::{Deserialize, Serialize};

use migrations::sqlx::{QueryBuilder, Sqlite, SqlitePool};

use super::article::{Article, ArticleError, SELECT_ARTICLES};
use crate::SqlxResultExt;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const DEFAULT_TRENDING_LIMIT: i64 = 5;
pub const MAX_TRENDING_LIMIT: i64 = 20;

/// Raw list parameters, exactly as received from a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParameters {
    pub q: Option<String>,
    pub category: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
    pub sort_by: Option<String>,
    pub sort_dir: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SortColumn {
    CreatedAt,
    PublishedAt,
    Title,
    Category,
}

impl SortColumn {
    /// Anything outside the allow-list sorts by creation time.
    pub fn from_parameter(value: Option<&str>) -> Self {
        match value {
            Some("publishedAt") => SortColumn::PublishedAt,
            Some("title") => SortColumn::Title,
            Some("category") => SortColumn::Category,
            _ => SortColumn::CreatedAt,
        }
    }

    fn column(self) -> &'static str {
        match self {
            SortColumn::CreatedAt => "created_at",
            SortColumn::PublishedAt => "published_at",
            SortColumn::Title => "title",
            SortColumn::Category => "category",
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct ArticleOrdering {
    pub column: SortColumn,
    pub ascending: bool,
}

impl ArticleOrdering {
    pub fn from_parameters(sort_by: Option<&str>, sort_dir: Option<&str>) -> Self {
        Self {
            column: SortColumn::from_parameter(sort_by),
            ascending: sort_dir.map_or(false, |dir| dir.eq_ignore_ascii_case("asc")),
        }
    }

    fn to_sql(&self) -> String {
        let order = if self.ascending { "ASC" } else { "DESC" };
        format!("{0} {1}, id {1}", self.column.column(), order)
    }
}

impl Default for ArticleOrdering {
    fn default() -> Self {
        Self {
            column: SortColumn::CreatedAt,
            ascending: false,
        }
    }
}

#[derive(Debug, Eq, PartialEq)]
pub struct ArticlePagination {
    pub page: i64,
    pub page_size: i64,
}

impl ArticlePagination {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.filter(|page| *page >= 1).unwrap_or(1);
        let page_size = page_size
            .filter(|size| *size != 0)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.page_size)
    }
}

impl Default for ArticlePagination {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleQueryResults {
    pub data: Vec<Article>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

/// A validated list query. Every input is defaulted or clamped; building one
/// never fails.
#[derive(Debug, Default, Eq, PartialEq)]
pub struct ArticleQuery {
    search: Option<String>,
    category: Option<String>,
    ordering: ArticleOrdering,
    pagination: ArticlePagination,
}

impl ArticleQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parameters(parameters: &ListParameters) -> Self {
        Self::new()
            .search(parameters.q.as_deref())
            .category(parameters.category.as_deref())
            .order_by(ArticleOrdering::from_parameters(
                parameters.sort_by.as_deref(),
                parameters.sort_dir.as_deref(),
            ))
            .paginate(ArticlePagination::new(
                parameters.page.as_deref().and_then(parse_leading_integer),
                parameters
                    .page_size
                    .as_deref()
                    .and_then(parse_leading_integer),
            ))
    }

    pub fn search(mut self, text: Option<&str>) -> Self {
        self.search = text.filter(|text| !text.is_empty()).map(str::to_owned);
        self
    }

    pub fn category(mut self, category: Option<&str>) -> Self {
        self.category = category
            .filter(|category| !category.is_empty())
            .map(str::to_owned);
        self
    }

    pub fn order_by(mut self, ordering: ArticleOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn paginate(mut self, pagination: ArticlePagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn pagination(&self) -> &ArticlePagination {
        &self.pagination
    }

    pub fn ordering(&self) -> &ArticleOrdering {
        &self.ordering
    }

    fn push_filters(&self, builder: &mut QueryBuilder<'_, Sqlite>) {
        let mut clause = " WHERE ";
        if let Some(search) = &self.search {
            let pattern = format!("%{}%", escape_like(search));
            builder
                .push(clause)
                .push("(title LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR content LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
            clause = " AND ";
        }
        if let Some(category) = &self.category {
            builder
                .push(clause)
                .push("category = ")
                .push_bind(category.clone());
        }
    }

    pub async fn query(self, pool: &SqlitePool) -> Result<ArticleQueryResults, ArticleError> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles");
        self.push_filters(&mut count);
        let total = count
            .build_query_scalar::<i64>()
            .fetch_one(pool)
            .await
            .map_database_error()?;

        let mut select = QueryBuilder::<Sqlite>::new(SELECT_ARTICLES);
        self.push_filters(&mut select);
        select
            .push(" ORDER BY ")
            .push(self.ordering.to_sql())
            .push(" LIMIT ")
            .push_bind(self.pagination.page_size)
            .push(" OFFSET ")
            .push_bind(self.pagination.offset());
        let data = select
            .build_query_as::<Article>()
            .fetch_all(pool)
            .await
            .map_database_error()?;

        Ok(ArticleQueryResults {
            data,
            total,
            page: self.pagination.page,
            page_size: self.pagination.page_size,
        })
    }
}

fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Reads the integer at the start of `value`, ignoring surrounding
/// whitespace and anything after the digits. `"12px"` is 12, `"px"` is
/// nothing.
pub fn parse_leading_integer(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, digits) = match value.as_bytes().first() {
        Some(b'-') => (true, &value[1..]),
        Some(b'+') => (false, &value[1..]),
        _ => (false, value),
    };
    let length = digits
        .bytes()
        .take_while(|byte| byte.is_ascii_digit())
        .count();
    if length == 0 {
        return None;
    }

    // Saturate rather than fail on absurdly long inputs.
    let magnitude = digits[..length].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

/// Resolves a raw `limit` parameter for the trending list.
pub fn trending_limit(value: Option<&str>) -> i64 {
    value
        .and_then(parse_leading_integer)
        .filter(|limit| *limit != 0)
        .unwrap_or(DEFAULT_TRENDING_LIMIT)
        .clamp(1, MAX_TRENDING_LIMIT)
}
