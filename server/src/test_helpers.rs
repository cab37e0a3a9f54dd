use database::schema::cms::NewArticle;
use rocket::local::asynchronous::Client;
use tempfile::TempDir;

use crate::{
    articles::ArticleService, configuration::ConfigurationManager, webserver::rocket_server,
};

/// A service over a fresh, migrated in-memory database.
pub async fn initialize() -> anyhow::Result<ArticleService> {
    let pool = database::initialize_in_memory().await?;
    Ok(ArticleService::new(pool))
}

/// A service over a migrated database file with several pooled connections.
/// The database lives as long as the returned directory.
pub async fn initialize_on_disk(
    max_connections: u32,
) -> anyhow::Result<(TempDir, ArticleService)> {
    let directory = tempfile::tempdir()?;
    let url = format!(
        "sqlite://{}",
        directory.path().join("articles.sqlite").display()
    );
    let pool = database::initialize(&url, max_connections).await?;
    Ok((directory, ArticleService::new(pool)))
}

pub async fn client() -> anyhow::Result<Client> {
    let service = initialize().await?;
    let client = Client::tracked(rocket_server(service, &ConfigurationManager::default()))
        .await
        .expect("valid rocket instance");
    Ok(client)
}

pub fn new_article(title: &str, content: &str) -> NewArticle {
    NewArticle {
        title: Some(title.to_owned()),
        content: Some(content.to_owned()),
        ..NewArticle::default()
    }
}
