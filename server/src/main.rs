mod articles;
mod configuration;
mod suggest;
#[cfg(test)]
mod test_helpers;
mod webserver;

use configuration::ConfigurationManager;

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();

    webserver::main(ConfigurationManager::from_env()).await
}
