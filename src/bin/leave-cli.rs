use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use leave_service::auth::issue_token;

#[derive(Parser)]
#[command(name = "leave-cli")]
#[command(about = "Operator CLI for the leave record service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000", env = "LEAVE_URL")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mint a bearer token for the append and list routes
    Token {
        #[arg(long, env = "JWT_SECRET")]
        secret: String,
        #[arg(long, default_value = "operator")]
        subject: String,
        #[arg(long, default_value_t = 3600)]
        ttl_secs: u64,
    },
    /// Look up a record
    Query {
        #[arg(long)]
        claim_code: String,
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        captcha_token: Option<String>,
    },
    /// Append the record in a JSON file
    Add {
        #[arg(long)]
        file: PathBuf,
        #[arg(long, env = "LEAVE_TOKEN")]
        token: String,
    },
    /// List every record
    List {
        #[arg(long, env = "LEAVE_TOKEN")]
        token: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Token { secret, subject, ttl_secs } => {
            println!("{}", issue_token(&subject, &secret, ttl_secs)?);
        }
        Commands::Query {
            claim_code,
            national_id,
            captcha_token,
        } => {
            let mut body = json!({ "claimCode": claim_code, "nationalId": national_id });
            if let Some(token) = captcha_token {
                body["captchaToken"] = Value::String(token);
            }
            let res = client.post(format!("{}/api/leave", cli.url)).json(&body).send().await?;
            print_response(res).await?;
        }
        Commands::Add { file, token } => {
            let record: Value = serde_json::from_str(&std::fs::read_to_string(&file)?)?;
            let res = client
                .post(format!("{}/api/add-leave", cli.url))
                .headers(bearer(&token)?)
                .json(&record)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::List { token } => {
            let res = client
                .get(format!("{}/api/leaves", cli.url))
                .headers(bearer(&token)?)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn bearer(token: &str) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", token))?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: service returned status {}", status);
    }

    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
