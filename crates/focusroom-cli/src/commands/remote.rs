//! Queries against a running focusroom-server.

use clap::Args;
use focusroom_core::{Config, UserFocusSample};
use url::Url;

#[derive(Args)]
pub struct ServerTarget {
    /// Server base URL (defaults to the configured port on localhost)
    #[arg(long)]
    url: Option<String>,
    /// Print raw JSON
    #[arg(long)]
    json: bool,
}

impl ServerTarget {
    fn base_url(&self) -> Result<Url, url::ParseError> {
        match &self.url {
            Some(url) => Url::parse(url),
            None => {
                let config = Config::load_or_default();
                let host = match config.server.host.as_str() {
                    "0.0.0.0" | "::" => "127.0.0.1",
                    other => other,
                };
                Url::parse(&format!("http://{host}:{}/", config.server.port))
            }
        }
    }
}

pub fn leaderboard(target: ServerTarget) -> Result<(), Box<dyn std::error::Error>> {
    let users = fetch(&target, "leaderboard")?;
    if target.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        print!("{}", render_ranked(&users));
    }
    Ok(())
}

pub fn snapshot(target: ServerTarget) -> Result<(), Box<dyn std::error::Error>> {
    let users = fetch(&target, "snapshot")?;
    if target.json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else {
        for user in &users {
            println!(
                "{:>3}  {:<16} {:>3}  {}",
                user.id,
                user.name,
                user.focus_level,
                user.observed_at.with_timezone(&chrono::Local).format("%H:%M:%S")
            );
        }
    }
    Ok(())
}

fn fetch(
    target: &ServerTarget,
    path: &str,
) -> Result<Vec<UserFocusSample>, Box<dyn std::error::Error>> {
    let url = target.base_url()?.join(path)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    Ok(runtime.block_on(get_users(url))?)
}

async fn get_users(url: Url) -> Result<Vec<UserFocusSample>, reqwest::Error> {
    reqwest::get(url).await?.error_for_status()?.json().await
}

fn render_ranked(users: &[UserFocusSample]) -> String {
    users
        .iter()
        .enumerate()
        .map(|(rank, user)| format!("{:>2}. {:<16} {:>3}\n", rank + 1, user.name, user.focus_level))
        .collect()
}
