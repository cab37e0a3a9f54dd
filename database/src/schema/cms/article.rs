use chrono::{
    DateTime, NaiveDate, NaiveDateTime, SecondsFormat, SubsecRound, TimeZone, Utc,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use migrations::sqlx::{self, FromRow};

use crate::{DatabaseError, SqlxResultExt};

pub const DEFAULT_AUTHOR: &str = "Staff Writer";
pub const DEFAULT_CATEGORY: &str = "General";

pub(crate) const SELECT_ARTICLES: &str = r#"SELECT
    id,
    title,
    author,
    content,
    summary,
    category,
    image_url,
    tags,
    views,
    published_at,
    created_at,
    updated_at
FROM articles"#;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub content: String,
    pub summary: Option<String>,
    pub category: String,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub views: i64,
    pub published_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(thiserror::Error, Debug)]
pub enum ArticleError {
    #[error("Article not found")]
    ArticleNotFound,
    #[error("{0}")]
    Validation(String),
    #[error("sql error: {0}")]
    Sql(#[from] sqlx::Error),
}

impl From<DatabaseError> for ArticleError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::RowNotFound => ArticleError::ArticleNotFound,
            DatabaseError::ConstraintViolation(message) => ArticleError::Validation(message),
            DatabaseError::Other(sql) => ArticleError::Sql(sql),
        }
    }
}

/// The fields accepted when creating an article. Everything is optional at
/// this level so that a missing field surfaces as a validation error rather
/// than a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArticle {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub published_at: Option<String>,
}

impl NewArticle {
    pub fn into_article(self) -> Result<Article, ArticleError> {
        let now = now();
        let title = required(self.title, "title")?;
        let content = required(self.content, "content")?;
        let published_at = match self.published_at.as_deref().map(str::trim) {
            Some(value) if !value.is_empty() => parse_published_at(value)?,
            _ => now,
        };

        Ok(Article {
            id: 0,
            title,
            author: self.author.unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
            content,
            summary: self.summary,
            category: self
                .category
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned()),
            image_url: self.image_url,
            tags: self.tags,
            views: 0,
            published_at,
            created_at: now,
            updated_at: now,
        })
    }
}

/// A partial update. Absent (or `null`) fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub category: Option<String>,
    pub image_url: Option<String>,
    pub tags: Option<String>,
    pub published_at: Option<String>,
    pub views: Option<Value>,
}

impl ArticlePatch {
    /// Applies the patch to `article`. Nothing is modified unless every
    /// supplied field is valid.
    pub fn merge_into(&self, article: &mut Article) -> Result<(), ArticleError> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(ArticleError::Validation(String::from("title cannot be empty")));
        }
        if matches!(&self.content, Some(content) if content.trim().is_empty()) {
            return Err(ArticleError::Validation(String::from(
                "content cannot be empty",
            )));
        }
        let published_at = self
            .published_at
            .as_deref()
            .map(parse_published_at)
            .transpose()?;
        let views = match &self.views {
            Some(value) => patched_views(value)?,
            None => None,
        };

        merge(&mut article.title, &self.title);
        merge(&mut article.author, &self.author);
        merge(&mut article.content, &self.content);
        merge_optional(&mut article.summary, &self.summary);
        merge(&mut article.category, &self.category);
        merge_optional(&mut article.image_url, &self.image_url);
        merge_optional(&mut article.tags, &self.tags);
        if let Some(published_at) = published_at {
            article.published_at = published_at;
        }
        if let Some(views) = views {
            article.views = views;
        }

        Ok(())
    }
}

fn merge(target: &mut String, value: &Option<String>) {
    if let Some(value) = value {
        target.clone_from(value);
    }
}

fn merge_optional(target: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        target.clone_from(value);
    }
}

// Only JSON numbers replace the counter; any other value is ignored.
fn patched_views(value: &Value) -> Result<Option<i64>, ArticleError> {
    let number = match value {
        Value::Number(number) => number,
        _ => return Ok(None),
    };
    let views = number
        .as_i64()
        .or_else(|| number.as_f64().map(|views| views.trunc() as i64))
        .unwrap_or(i64::MAX);
    if views < 0 {
        return Err(ArticleError::Validation(String::from(
            "views cannot be negative",
        )));
    }
    Ok(Some(views))
}

fn required(value: Option<String>, field: &str) -> Result<String, ArticleError> {
    value
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ArticleError::Validation(format!("{} is required", field)))
}

fn parse_published_at(value: &str) -> Result<DateTime<Utc>, ArticleError> {
    parse_timestamp(value)
        .ok_or_else(|| ArticleError::Validation(format!("invalid publishedAt '{}'", value)))
}

/// Parses an RFC 3339 timestamp, a `datetime-local` form value or a bare
/// date. Values without an offset are taken as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc).trunc_subsecs(6));
    }

    for format in &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Utc.from_utc_datetime(&naive).trunc_subsecs(6));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

// Stored timestamps are truncated to microseconds and written with a fixed
// width so that text ordering in the database is chronological.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn stored(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl Article {
    pub async fn load<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
        article_id: i64,
        executor: E,
    ) -> Result<Self, ArticleError> {
        let query = format!("{} WHERE id = ?", SELECT_ARTICLES);
        let article = sqlx::query_as::<_, Self>(&query)
            .bind(article_id)
            .fetch_one(executor)
            .await
            .map_database_error()?;
        Ok(article)
    }

    pub async fn save<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
        &mut self,
        executor: E,
    ) -> Result<(), ArticleError> {
        if self.title.trim().is_empty() || self.content.trim().is_empty() {
            return Err(ArticleError::Validation(String::from(
                "title and content are required",
            )));
        }

        if self.id == 0 {
            let id = sqlx::query_scalar::<_, i64>(
                r#"INSERT INTO articles (
                    title,
                    author,
                    content,
                    summary,
                    category,
                    image_url,
                    tags,
                    views,
                    published_at,
                    created_at,
                    updated_at
                   ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id"#,
            )
            .bind(&self.title)
            .bind(&self.author)
            .bind(&self.content)
            .bind(self.summary.as_deref())
            .bind(&self.category)
            .bind(self.image_url.as_deref())
            .bind(self.tags.as_deref())
            .bind(self.views)
            .bind(stored(&self.published_at))
            .bind(stored(&self.created_at))
            .bind(stored(&self.updated_at))
            .fetch_one(executor)
            .await
            .map_database_error()?;

            self.id = id;
        } else {
            let updated_at = now();
            let result = sqlx::query(
                r#"UPDATE articles SET
                    title = ?,
                    author = ?,
                    content = ?,
                    summary = ?,
                    category = ?,
                    image_url = ?,
                    tags = ?,
                    views = ?,
                    published_at = ?,
                    updated_at = ?
                   WHERE id = ?"#,
            )
            .bind(&self.title)
            .bind(&self.author)
            .bind(&self.content)
            .bind(self.summary.as_deref())
            .bind(&self.category)
            .bind(self.image_url.as_deref())
            .bind(self.tags.as_deref())
            .bind(self.views)
            .bind(stored(&self.published_at))
            .bind(stored(&updated_at))
            .bind(self.id)
            .execute(executor)
            .await
            .map_database_error()?;
            if result.rows_affected() == 0 {
                return Err(ArticleError::ArticleNotFound);
            }

            self.updated_at = updated_at;
        }

        Ok(())
    }

    pub async fn delete<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
        article_id: i64,
        executor: E,
    ) -> Result<(), ArticleError> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(executor)
            .await
            .map_database_error()?;
        if result.rows_affected() == 0 {
            return Err(ArticleError::ArticleNotFound);
        }

        Ok(())
    }

    /// Adds one to the view counter in a single statement and returns the new
    /// count.
    pub async fn increment_views<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
        article_id: i64,
        executor: E,
    ) -> Result<i64, ArticleError> {
        sqlx::query_scalar::<_, i64>(
            "UPDATE articles SET views = views + 1, updated_at = ? WHERE id = ? RETURNING views",
        )
        .bind(stored(&now()))
        .bind(article_id)
        .fetch_optional(executor)
        .await
        .map_database_error()?
        .ok_or(ArticleError::ArticleNotFound)
    }

    pub async fn trending<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
        limit: i64,
        executor: E,
    ) -> Result<Vec<Self>, ArticleError> {
        let query = format!("{} ORDER BY views DESC, id ASC LIMIT ?", SELECT_ARTICLES);
        let articles = sqlx::query_as::<_, Self>(&query)
            .bind(limit)
            .fetch_all(executor)
            .await
            .map_database_error()?;
        Ok(articles)
    }

    /// Distinct categories, ordered by the first article that used each one.
    pub async fn categories<'e, E: sqlx::Executor<'e, Database = sqlx::Sqlite>>(
        executor: E,
    ) -> Result<Vec<String>, ArticleError> {
        let categories = sqlx::query_scalar::<_, String>(
            "SELECT category FROM articles GROUP BY category ORDER BY MIN(id)",
        )
        .fetch_all(executor)
        .await
        .map_database_error()?;
        Ok(categories)
    }
}
