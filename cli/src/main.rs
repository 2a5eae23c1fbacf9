mod load_ingredients;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use potluck_server::models::NewTag;
use potluck_server::schema::tags;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "potluck")]
#[command(about = "Potluck CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ping the server (unauthenticated)
    Ping {
        /// Server URL (default: http://localhost:3000)
        #[arg(long, default_value = "http://localhost:3000")]
        server: String,
    },
    /// Load ingredients.csv (name,measurement_unit) into the database
    LoadIngredients {
        /// Directory containing ingredients.csv
        #[arg(long, default_value = "static/data")]
        path: PathBuf,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
    /// Create a recipe tag
    AddTag {
        #[arg(long)]
        name: String,
        #[arg(long)]
        slug: String,
        #[arg(long, env = "DATABASE_URL")]
        database_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ping { server } => {
            ping(&server).await?;
        }
        Commands::LoadIngredients { path, database_url } => {
            let mut conn = connect(&database_url)?;
            let summary = load_ingredients::load_dir(&mut conn, &path)?;
            println!(
                "Loaded {} ingredients ({} new, {} updated)",
                summary.created + summary.updated,
                summary.created,
                summary.updated
            );
        }
        Commands::AddTag {
            name,
            slug,
            database_url,
        } => {
            let mut conn = connect(&database_url)?;
            let id = add_tag(&mut conn, &name, &slug)?;
            println!("Created tag {name} ({slug}) with id {id}");
        }
    }

    Ok(())
}

fn connect(database_url: &str) -> Result<PgConnection> {
    PgConnection::establish(database_url).context("Failed to connect to the database")
}

fn add_tag(conn: &mut PgConnection, name: &str, slug: &str) -> Result<i32> {
    let name = name.trim();
    let slug = slug.trim();
    if name.is_empty() || slug.is_empty() {
        anyhow::bail!("Tag name and slug cannot be empty");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!("Slug may contain only letters, digits, '-' and '_'");
    }

    match diesel::insert_into(tags::table)
        .values(&NewTag { name, slug })
        .returning(tags::id)
        .get_result(conn)
    {
        Ok(id) => Ok(id),
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)) => {
            anyhow::bail!("A tag with name {name:?} or slug {slug:?} already exists")
        }
        Err(e) => Err(e).context("Failed to create tag"),
    }
}

#[derive(Debug, Deserialize)]
struct PingResponse {
    message: String,
}

async fn ping(server: &str) -> Result<()> {
    let url = format!("{}/api/test/unauthed-ping", server.trim_end_matches('/'));

    let response: PingResponse = reqwest::get(&url)
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .error_for_status()?
        .json()
        .await
        .context("Unexpected ping response")?;

    println!("{}", response.message);

    Ok(())
}
