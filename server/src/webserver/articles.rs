use database::schema::cms::{
    trending_limit, Article, ArticleError, ArticlePatch, ArticleQuery, ArticleQueryResults, ListParameters,
    NewArticle,
};
use rocket::{
    delete, get, http::Status, post, put, routes, serde::json::Json, FromForm, Route, State,
};
use serde::{Deserialize, Serialize};

use crate::{
    articles::ArticleService,
    suggest::{suggest, Suggestion, SuggestionRequest},
    webserver::Failure,
};

pub fn routes() -> Vec<Route> {
    routes![
        list_articles,
        create_article,
        view_article,
        update_article,
        record_view,
        trending_articles,
        list_categories,
        suggest_metadata,
        delete_article,
    ]
}

#[derive(FromForm, Debug, Default)]
pub struct ListArticlesQuery {
    q: Option<String>,
    category: Option<String>,
    page: Option<String>,
    #[field(name = "pageSize")]
    page_size: Option<String>,
    #[field(name = "sortBy")]
    sort_by: Option<String>,
    #[field(name = "sortDir")]
    sort_dir: Option<String>,
}

impl From<ListArticlesQuery> for ListParameters {
    fn from(query: ListArticlesQuery) -> Self {
        Self {
            q: query.q,
            category: query.category,
            page: query.page,
            page_size: query.page_size,
            sort_by: query.sort_by,
            sort_dir: query.sort_dir,
        }
    }
}

/// Ids that are not integers name no article.
fn parse_article_id(segment: &str) -> Result<i64, Failure> {
    segment
        .parse()
        .map_err(|_| Failure::from(ArticleError::ArticleNotFound))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ViewCount {
    pub views: i64,
}

#[get("/?<query..>")]
pub async fn list_articles(
    query: ListArticlesQuery,
    service: &State<ArticleService>,
) -> Result<Json<ArticleQueryResults>, Failure> {
    let parameters = ListParameters::from(query);
    let results = service
        .list(ArticleQuery::from_parameters(&parameters))
        .await?;
    Ok(Json(results))
}

#[post("/add", data = "<article>")]
pub async fn create_article(
    article: Json<NewArticle>,
    service: &State<ArticleService>,
) -> Result<(Status, Json<Article>), Failure> {
    let article = service.create(article.into_inner()).await?;
    Ok((Status::Created, Json(article)))
}

#[get("/<article_id>")]
pub async fn view_article(
    article_id: &str,
    service: &State<ArticleService>,
) -> Result<Json<Article>, Failure> {
    Ok(Json(service.get(parse_article_id(article_id)?).await?))
}

#[put("/<article_id>", data = "<patch>")]
pub async fn update_article(
    article_id: &str,
    patch: Json<ArticlePatch>,
    service: &State<ArticleService>,
) -> Result<Json<Article>, Failure> {
    Ok(Json(service.update(parse_article_id(article_id)?, &patch).await?))
}

#[post("/<article_id>/view")]
pub async fn record_view(
    article_id: &str,
    service: &State<ArticleService>,
) -> Result<Json<ViewCount>, Failure> {
    let views = service.increment_views(parse_article_id(article_id)?).await?;
    Ok(Json(ViewCount { views }))
}

#[get("/_meta/trending?<limit>")]
pub async fn trending_articles(
    limit: Option<String>,
    service: &State<ArticleService>,
) -> Result<Json<Vec<Article>>, Failure> {
    let articles = service.trending(trending_limit(limit.as_deref())).await?;
    Ok(Json(articles))
}

#[get("/_meta/categories")]
pub async fn list_categories(
    service: &State<ArticleService>,
) -> Result<Json<Vec<String>>, Failure> {
    Ok(Json(service.categories().await?))
}

#[post("/_ai/suggest", data = "<request>")]
pub fn suggest_metadata(request: Option<Json<SuggestionRequest>>) -> Json<Suggestion> {
    let request = request.map(Json::into_inner).unwrap_or_default();
    Json(suggest(
        request.title.as_deref().unwrap_or_default(),
        request.content.as_deref().unwrap_or_default(),
    ))
}

#[delete("/<article_id>")]
pub async fn delete_article(
    article_id: &str,
    service: &State<ArticleService>,
) -> Result<Status, Failure> {
    service.delete(parse_article_id(article_id)?).await?;
    Ok(Status::NoContent)
}

#[cfg(test)]
mod tests {
    use rocket::http::{ContentType, Status};
    use serde_json::{json, Value};

    use super::*;
    use crate::{test_helpers, webserver::ErrorBody};

    const BASE: &str = "/api/articles";

    #[rocket::async_test]
    async fn create_and_fetch() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;

        let response = client
            .post(format!("{}/add", BASE))
            .json(&json!({
                "title": "Hello",
                "author": "A",
                "content": "World",
                "category": "Tech",
            }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let created: Value = response.into_json().await.expect("article json");
        assert_eq!(created["views"], 0);
        assert_eq!(created["category"], "Tech");
        assert_eq!(created["author"], "A");
        assert!(created["id"].as_i64().unwrap() > 0);
        assert!(created["publishedAt"].is_string());
        assert!(created["createdAt"].is_string());
        assert!(created["imageUrl"].is_null());

        let id = created["id"].as_i64().unwrap();
        let response = client.get(format!("{}/{}", BASE, id)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let fetched: Value = response.into_json().await.expect("article json");
        assert_eq!(fetched, created);
        Ok(())
    }

    #[rocket::async_test]
    async fn create_defaults_category() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;

        let response = client
            .post(format!("{}/add", BASE))
            .json(&json!({ "title": "Hello", "content": "World" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let created: Article = response.into_json().await.expect("article json");
        assert_eq!(created.category, "General");
        assert_eq!(created.author, "Staff Writer");
        Ok(())
    }

    #[rocket::async_test]
    async fn create_without_content_fails() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;

        let response = client
            .post(format!("{}/add", BASE))
            .json(&json!({ "title": "Hello" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::InternalServerError);
        let body: ErrorBody = response.into_json().await.expect("error json");
        assert_eq!(body.error, "content is required");
        Ok(())
    }

    #[rocket::async_test]
    async fn missing_articles_are_404() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;

        let response = client.get(format!("{}/999", BASE)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        let body: ErrorBody = response.into_json().await.expect("error json");
        assert_eq!(body.error, "Article not found");

        let response = client
            .put(format!("{}/999", BASE))
            .json(&json!({ "title": "x" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client.post(format!("{}/999/view", BASE)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client.delete(format!("{}/999", BASE)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        Ok(())
    }

    #[rocket::async_test]
    async fn unparseable_ids_are_not_found() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;

        for id in &["not-a-number", "99999999999999999999", "1.5"] {
            let response = client.get(format!("{}/{}", BASE, id)).dispatch().await;
            assert_eq!(response.status(), Status::NotFound);
            assert_eq!(response.content_type(), Some(ContentType::JSON));
            let body: ErrorBody = response.into_json().await.expect("error json");
            assert_eq!(body.error, "Article not found");

            let response = client
                .put(format!("{}/{}", BASE, id))
                .json(&json!({ "title": "x" }))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::NotFound);

            let response = client
                .post(format!("{}/{}/view", BASE, id))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::NotFound);

            let response = client.delete(format!("{}/{}", BASE, id)).dispatch().await;
            assert_eq!(response.status(), Status::NotFound);
            let body: ErrorBody = response.into_json().await.expect("error json");
            assert_eq!(body.error, "Article not found");
        }
        Ok(())
    }

    #[rocket::async_test]
    async fn update_delete_lifecycle() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;
        let service = client.rocket().state::<ArticleService>().expect("managed service");
        let article = service
            .create(test_helpers::new_article("Draft", "Body"))
            .await?;

        let response = client
            .put(format!("{}/{}", BASE, article.id))
            .json(&json!({ "title": "Final", "summary": null, "views": "lots" }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let updated: Article = response.into_json().await.expect("article json");
        assert_eq!(updated.title, "Final");
        assert_eq!(updated.content, "Body");
        assert_eq!(updated.views, 0);

        for expected in 1..=3 {
            let response = client
                .post(format!("{}/{}/view", BASE, article.id))
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::Ok);
            let count: ViewCount = response.into_json().await.expect("view json");
            assert_eq!(count.views, expected);
        }

        let response = client
            .delete(format!("{}/{}", BASE, article.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NoContent);

        let response = client
            .get(format!("{}/{}", BASE, article.id))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::NotFound);
        Ok(())
    }

    #[rocket::async_test]
    async fn list_filters_and_paginates() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;
        let service = client.rocket().state::<ArticleService>().expect("managed service");
        for (title, category) in &[
            ("Rust tips", "Tech"),
            ("Baking bread", "Food"),
            ("Rusty bikes", "Hobby"),
            ("Async rust", "Tech"),
        ] {
            service
                .create(NewArticle {
                    category: Some((*category).to_owned()),
                    ..test_helpers::new_article(title, "body")
                })
                .await?;
        }

        let response = client
            .get(format!(
                "{}?q=rust&sortBy=title&sortDir=asc&page=1&pageSize=2",
                BASE
            ))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let results: ArticleQueryResults = response.into_json().await.expect("list json");
        assert_eq!(results.total, 3);
        assert_eq!(results.page, 1);
        assert_eq!(results.page_size, 2);
        let titles: Vec<&str> = results.data.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Async rust", "Rust tips"]);

        let response = client
            .get(format!("{}?q=rust&category=Tech&sortBy=views;--", BASE))
            .dispatch()
            .await;
        let results: ArticleQueryResults = response.into_json().await.expect("list json");
        assert_eq!(results.total, 2);
        let titles: Vec<&str> = results.data.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["Async rust", "Rust tips"]);

        let response = client
            .get(format!("{}?page=-3&pageSize=5000", BASE))
            .dispatch()
            .await;
        let body: Value = response.into_json().await.expect("list json");
        assert_eq!(body["page"], 1);
        assert_eq!(body["pageSize"], 100);
        assert_eq!(body["total"], 4);
        assert_eq!(body["data"].as_array().map(Vec::len), Some(4));
        Ok(())
    }

    #[rocket::async_test]
    async fn meta_endpoints() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;
        let service = client.rocket().state::<ArticleService>().expect("managed service");
        let mut ids = Vec::new();
        for (title, category) in &[("one", "Tech"), ("two", "Food"), ("three", "Tech")] {
            let article = service
                .create(NewArticle {
                    category: Some((*category).to_owned()),
                    ..test_helpers::new_article(title, "body")
                })
                .await?;
            ids.push(article.id);
        }
        service.increment_views(ids[2]).await?;

        let response = client
            .get(format!("{}/_meta/trending?limit=2", BASE))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let trending: Vec<Article> = response.into_json().await.expect("trending json");
        let trending: Vec<i64> = trending.iter().map(|a| a.id).collect();
        assert_eq!(trending, vec![ids[2], ids[0]]);

        let response = client
            .get(format!("{}/_meta/trending", BASE))
            .dispatch()
            .await;
        let trending: Vec<Article> = response.into_json().await.expect("trending json");
        assert_eq!(trending.len(), 3);

        let response = client
            .get(format!("{}/_meta/categories", BASE))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let categories: Vec<String> = response.into_json().await.expect("categories json");
        assert_eq!(categories, vec!["Tech", "Food"]);
        Ok(())
    }

    #[rocket::async_test]
    async fn suggest_endpoint() -> anyhow::Result<()> {
        let client = test_helpers::client().await?;

        let response = client
            .post(format!("{}/_ai/suggest", BASE))
            .json(&json!({
                "title": "Breaking AI News",
                "content": "AI is   transforming the world of\nmachine learning research.",
            }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let suggestion: Suggestion = response.into_json().await.expect("suggestion json");
        assert_eq!(
            suggestion,
            Suggestion {
                summary: String::from(
                    "AI is transforming the world of machine learning research."
                ),
                tags: String::from("AI,Science,Breaking,News"),
            }
        );

        let response = client
            .post(format!("{}/_ai/suggest", BASE))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let suggestion: Suggestion = response.into_json().await.expect("suggestion json");
        assert_eq!(suggestion.summary, "");
        assert_eq!(suggestion.tags, "");
        Ok(())
    }
}
