use std::path::Path;

use log::{error, info, warn};
use rocket::{
    catch, catchers, fs::FileServer, http::Status, serde::json::Json, Build, Request, Responder,
    Rocket,
};
use serde::{Deserialize, Serialize};

use database::schema::cms::ArticleError;

use crate::{
    articles::ArticleService,
    configuration::{
        ApiBase, ConfigurationManager, DatabaseUrl, MaxConnections, ServerPort, StaticDirectory,
    },
};

mod articles;

pub fn rocket_server(
    service: ArticleService,
    configuration: &ConfigurationManager,
) -> Rocket<Build> {
    let mut figment = rocket::Config::figment();
    if let Some(port) = configuration.get::<ServerPort>() {
        figment = figment.merge(("port", port));
    }

    let api_base = mount_point(configuration.get::<ApiBase>().as_deref());
    info!("mounting article routes at {}", api_base);

    let mut rocket = rocket::custom(figment)
        .manage(service)
        .mount(api_base.as_str(), articles::routes())
        .register("/", catchers![not_found, default_catcher]);

    if let Some(directory) = configuration.get::<StaticDirectory>() {
        if Path::new(&directory).is_dir() {
            rocket = rocket.mount("/", FileServer::from(directory));
        } else {
            warn!("static directory {} does not exist, not serving it", directory);
        }
    }

    rocket
}

fn mount_point(api_base: Option<&str>) -> String {
    let trimmed = api_base.unwrap_or_default().trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::from("/")
    } else if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{}", trimmed)
    }
}

pub async fn main(configuration: ConfigurationManager) -> anyhow::Result<()> {
    let database_url = configuration
        .get::<DatabaseUrl>()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL not set"))?;
    let max_connections = configuration.get::<MaxConnections>().unwrap_or(1);
    let pool = database::initialize(&database_url, max_connections).await?;

    rocket_server(ArticleService::new(pool), &configuration)
        .launch()
        .await
        .map_err(|err| anyhow::anyhow!("error running server: {}", err))?;

    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn json(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            error: message.into(),
        })
    }
}

#[derive(Debug, Responder)]
pub enum Failure {
    #[response(status = 404)]
    NotFound(Json<ErrorBody>),
    #[response(status = 500)]
    Internal(Json<ErrorBody>),
}

impl From<ArticleError> for Failure {
    fn from(error: ArticleError) -> Self {
        match &error {
            ArticleError::ArticleNotFound => Failure::NotFound(ErrorBody::json(error.to_string())),
            ArticleError::Validation(_) => Failure::Internal(ErrorBody::json(error.to_string())),
            ArticleError::Sql(sql_error) => {
                error!("error processing request: {:?}", sql_error);
                Failure::Internal(ErrorBody::json(error.to_string()))
            }
        }
    }
}

#[catch(404)]
fn not_found(request: &Request<'_>) -> Json<ErrorBody> {
    ErrorBody::json(format!("no resource at {}", request.uri().path()))
}

#[catch(default)]
fn default_catcher(status: Status, _request: &Request<'_>) -> Json<ErrorBody> {
    ErrorBody::json(status.reason().unwrap_or("request failed"))
}
