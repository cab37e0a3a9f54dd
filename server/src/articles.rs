use database::{
    schema::cms::{
        Article, ArticleError, ArticlePatch, ArticleQuery, ArticleQueryResults, NewArticle,
    },
    SqlitePool,
};
use log::{debug, error, info};

/// Article operations over a shared pool. Cloning is cheap; clones share the
/// pool.
#[derive(Clone, Debug)]
pub struct ArticleService {
    pool: SqlitePool,
}

impl ArticleService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, query: ArticleQuery) -> Result<ArticleQueryResults, ArticleError> {
        debug!("listing articles: {:?}", query);
        query.query(&self.pool).await.map_err(log_failure)
    }

    pub async fn create(&self, new_article: NewArticle) -> Result<Article, ArticleError> {
        let mut article = new_article.into_article()?;
        article.save(&self.pool).await.map_err(log_failure)?;

        info!("created article {}", article.id);
        Ok(article)
    }

    pub async fn get(&self, article_id: i64) -> Result<Article, ArticleError> {
        Article::load(article_id, &self.pool)
            .await
            .map_err(log_failure)
    }

    pub async fn update(
        &self,
        article_id: i64,
        patch: &ArticlePatch,
    ) -> Result<Article, ArticleError> {
        // Take the write lock up front so concurrent updates queue on the busy
        // timeout instead of failing when the read lock is upgraded.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let mut article = Article::load(article_id, &mut *tx)
            .await
            .map_err(log_failure)?;
        patch.merge_into(&mut article)?;
        article.save(&mut *tx).await.map_err(log_failure)?;
        tx.commit().await?;

        info!("updated article {}", article.id);
        Ok(article)
    }

    pub async fn delete(&self, article_id: i64) -> Result<(), ArticleError> {
        Article::delete(article_id, &self.pool)
            .await
            .map_err(log_failure)?;

        info!("deleted article {}", article_id);
        Ok(())
    }

    pub async fn increment_views(&self, article_id: i64) -> Result<i64, ArticleError> {
        Article::increment_views(article_id, &self.pool)
            .await
            .map_err(log_failure)
    }

    pub async fn trending(&self, limit: i64) -> Result<Vec<Article>, ArticleError> {
        Article::trending(limit, &self.pool)
            .await
            .map_err(log_failure)
    }

    pub async fn categories(&self) -> Result<Vec<String>, ArticleError> {
        Article::categories(&self.pool).await.map_err(log_failure)
    }
}

fn log_failure(error: ArticleError) -> ArticleError {
    if let ArticleError::Sql(sql_error) = &error {
        error!("unexpected sql error: {:?}", sql_error);
    }
    error
}
