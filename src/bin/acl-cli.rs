use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "acl-cli")]
#[command(about = "Management CLI for the frps-acl plugin", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:7200")]
    url: String,

    /// Admin user for Basic auth
    #[arg(long, env = "FRPS_ACL_USER")]
    user: Option<String>,

    /// Admin password for Basic auth
    #[arg(long, env = "FRPS_ACL_PASSWORD", default_value = "")]
    password: String,

    /// Bearer API key, used instead of Basic auth
    #[arg(short, long, env = "FRPS_ACL_API_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check plugin status
    Status,
    /// List users
    List {
        #[arg(long, default_value = "")]
        user: String,
        #[arg(long, default_value = "")]
        token: String,
        #[arg(long, default_value = "")]
        comment: String,
        #[arg(long, default_value_t = 1)]
        page: i64,
        /// 0 lists everything
        #[arg(long, default_value_t = 0)]
        limit: i64,
    },
    /// Add a user
    Add {
        user: String,
        token: String,
        #[arg(long, default_value = "")]
        comment: String,
        /// Comma-separated ports or ranges, e.g. 8080,6000-6010
        #[arg(long, default_value = "")]
        ports: String,
        #[arg(long, default_value = "")]
        domains: String,
        #[arg(long, default_value = "")]
        subdomains: String,
    },
    /// Remove users
    Remove { users: Vec<String> },
    /// Enable users
    Enable { users: Vec<String> },
    /// Disable users
    Disable { users: Vec<String> },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(key) = &cli.key {
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    } else if let Some(user) = &cli.user {
        let credentials = STANDARD.encode(format!("{}:{}", user, cli.password));
        headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Basic {}", credentials))?);
    }

    let res = match cli.command {
        Commands::Status => {
            client.get(format!("{}/status", cli.url))
                .headers(headers)
                .send()
                .await?
        }
        Commands::List { user, token, comment, page, limit } => {
            client.get(format!("{}/tokens", cli.url))
                .headers(headers)
                .query(&[("user", user), ("token", token), ("comment", comment)])
                .query(&[("page", page), ("limit", limit)])
                .send()
                .await?
        }
        Commands::Add { user, token, comment, ports, domains, subdomains } => {
            let body = json!({
                "user": user,
                "token": token,
                "comment": comment,
                "ports": ports,
                "domains": domains,
                "subdomains": subdomains,
            });
            client.post(format!("{}/add", cli.url))
                .headers(headers)
                .json(&body)
                .send()
                .await?
        }
        Commands::Remove { users } => post_selection(&client, &cli.url, "remove", headers, users).await?,
        Commands::Enable { users } => post_selection(&client, &cli.url, "enable", headers, users).await?,
        Commands::Disable { users } => post_selection(&client, &cli.url, "disable", headers, users).await?,
    };

    print_response(res).await
}

async fn post_selection(
    client: &reqwest::Client,
    url: &str,
    action: &str,
    headers: HeaderMap,
    users: Vec<String>,
) -> Result<reqwest::Response, reqwest::Error> {
    let body = json!({
        "users": users.iter().map(|u| json!({ "user": u })).collect::<Vec<_>>(),
    });
    client.post(format!("{}/{}", url, action))
        .headers(headers)
        .json(&body)
        .send()
        .await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
