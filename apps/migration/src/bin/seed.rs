//! Apply pending migrations and load a small demo blog.
//!
//! Creates the `SEED_USERNAME` account (default `admin`) with a handful of
//! tagged, published posts. Does nothing when that account already exists.

use std::sync::Arc;

use anyhow::Context;
use chrono::{Duration, Utc};
use sea_orm_migration::MigratorTrait;
use yablog_core::domain::{Post, Tag, User};
use yablog_core::ports::{BaseRepository, PasswordService, PostRepository, UserRepository};
use yablog_infra::database::{self, DatabaseConfig};
use yablog_infra::{Argon2PasswordService, PostgresPostRepository, PostgresUserRepository};

const POSTS: &[(&str, &str, &[&str])] = &[
    (
        "Who was Django Reinhardt?",
        "Jean Django Reinhardt was a Belgian-born Romani-French jazz guitarist and composer.",
        &["music", "jazz"],
    ),
    (
        "Another post",
        "A second post, published a day later, sharing the jazz tag.",
        &["jazz"],
    ),
    (
        "Notes on guitars",
        "Gypsy jazz guitars use a floating bridge and a large soundhole.",
        &["music", "guitars"],
    ),
    (
        "Hello world",
        "The first words of every new blog.",
        &[],
    ),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = DatabaseConfig {
        url: std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
        max_connections: 2,
        min_connections: 1,
    };
    let db = database::connect(&config)
        .await
        .context("connecting to the database")?;

    migration::Migrator::up(&db, None)
        .await
        .context("applying migrations")?;

    let users: Arc<dyn UserRepository> = Arc::new(PostgresUserRepository::new(db.clone()));
    let posts: Arc<dyn PostRepository> = Arc::new(PostgresPostRepository::new(db));

    let username = std::env::var("SEED_USERNAME").unwrap_or_else(|_| "admin".to_string());
    if users.find_by_username(&username).await?.is_some() {
        tracing::info!(%username, "Seed user already exists, skipping");
        return Ok(());
    }

    let password = std::env::var("SEED_PASSWORD").unwrap_or_else(|_| "change-me-please".to_string());
    let hash = Argon2PasswordService::new()
        .hash(&password)
        .map_err(|e| anyhow::anyhow!("hashing seed password: {e}"))?;
    let author = users
        .save(User::new(
            username.clone(),
            format!("{username}@example.com"),
            hash,
        ))
        .await?;

    let mut tags: Vec<Tag> = Vec::new();
    let now = Utc::now();
    for (offset, (title, body, tag_names)) in POSTS.iter().enumerate() {
        let mut post_tags = Vec::with_capacity(tag_names.len());
        for name in tag_names.iter() {
            let tag = match tags.iter().find(|t| t.slug == *name) {
                Some(tag) => tag.clone(),
                None => {
                    let tag = posts.save_tag(Tag::new(*name, *name)).await?;
                    tags.push(tag.clone());
                    tag
                }
            };
            post_tags.push(tag);
        }

        let publish = now - Duration::days((POSTS.len() - offset) as i64);
        let post = Post::new(author.id, title.to_string(), slugify(title), body.to_string())
            .published_at(publish)
            .with_tags(post_tags);
        let post = posts.save(post).await?;
        tracing::info!(path = %post.canonical_path(), "Seeded post");
    }

    tracing::info!(%username, posts = POSTS.len(), tags = tags.len(), "Seed complete");
    Ok(())
}

fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
