//! Cache command - flush or invalidate the configured cache store

use anyhow::{bail, Context};
use clap::{ArgGroup, Args, Subcommand};
use tracing::info;

use crate::config::AppConfig;
use crate::domain::cache::{InvalidationTable, KeyPattern, Mutation};
use crate::domain::EntityKind;
use crate::infrastructure::cache::{CacheFactory, CacheInvalidator, CacheStore, ConnectionState};
use crate::infrastructure::logging;

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheCommand {
    /// Remove every entry from the cache backend
    Flush,

    /// Delete entries by glob pattern or by entity mutation
    Invalidate(InvalidateArgs),

    /// Show connection state and reachability
    Status,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("target").required(true).args(["pattern", "entity"])))]
pub struct InvalidateArgs {
    /// Glob over keys, e.g. "cache:public:/api/quiz*"
    #[arg(long)]
    pub pattern: Option<String>,

    /// Entity whose mutation rules to apply (quiz, category, contest, result)
    #[arg(long, requires = "mutation")]
    pub entity: Option<EntityKind>,

    /// Mutation to replay (create, update, delete)
    #[arg(long, requires = "entity")]
    pub mutation: Option<Mutation>,
}

pub async fn run(args: CacheArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    let store = CacheFactory::new().create_store(&config.cache)?;
    let state = store.connect().await;

    let result = match args.command {
        CacheCommand::Status => {
            println!("backend: {}", store.backend_name());
            println!("state: {}", state);
            println!("reachable: {}", store.ping().await);
            Ok(())
        }
        command => execute(&store, state, command).await,
    };

    store.disconnect().await;
    result
}

async fn execute(
    store: &CacheStore,
    state: ConnectionState,
    command: CacheCommand,
) -> anyhow::Result<()> {
    if state != ConnectionState::Connected {
        bail!("Cache store is {}, nothing to do", state);
    }

    match command {
        CacheCommand::Flush => {
            if !store.flush_all().await {
                bail!("Cache flush failed");
            }
            println!("Cache flushed");
        }
        CacheCommand::Invalidate(target) => {
            let invalidator =
                CacheInvalidator::new(store.clone(), InvalidationTable::platform_default()?);
            let deleted = invalidate(&invalidator, target).await?;
            info!(deleted, "Invalidation complete");
            println!("Deleted {} entries", deleted);
        }
        CacheCommand::Status => {}
    }

    Ok(())
}

async fn invalidate(invalidator: &CacheInvalidator, target: InvalidateArgs) -> anyhow::Result<usize> {
    match (target.pattern, target.entity, target.mutation) {
        (Some(pattern), _, _) => {
            let pattern = KeyPattern::new(pattern)?;
            Ok(invalidator.invalidate_pattern(&pattern).await)
        }
        (None, Some(entity), Some(mutation)) => Ok(invalidator.invalidate_for(entity, mutation).await),
        _ => bail!("Provide --pattern or both --entity and --mutation"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::cli::{Cli, Command};
    use crate::infrastructure::cache::{InMemoryBackend, StoreSettings};
    use clap::Parser;

    fn parse(args: &[&str]) -> Result<CacheCommand, clap::Error> {
        let mut argv = vec!["quizhub-cache", "cache"];
        argv.extend_from_slice(args);

        match Cli::try_parse_from(argv)?.command {
            Some(Command::Cache(cache)) => Ok(cache.command),
            _ => panic!("expected cache command"),
        }
    }

    async fn seeded_store() -> CacheStore {
        let store = CacheStore::new(Arc::new(InMemoryBackend::new()), StoreSettings::default());
        store.connect().await;

        let ttl = Duration::from_secs(60);
        store.set("cache:public:/api/quiz/quizzes", "[]", ttl).await;
        store.set("cache:public:/api/contests", "[]", ttl).await;
        store
    }

    #[test]
    fn test_parse_invalidate_by_pattern() {
        match parse(&["invalidate", "--pattern", "cache:public:/api/quiz*"]).unwrap() {
            CacheCommand::Invalidate(args) => {
                assert_eq!(args.pattern.as_deref(), Some("cache:public:/api/quiz*"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalidate_by_entity() {
        match parse(&["invalidate", "--entity", "contests", "--mutation", "update"]).unwrap() {
            CacheCommand::Invalidate(args) => {
                assert_eq!(args.entity, Some(EntityKind::Contest));
                assert_eq!(args.mutation, Some(Mutation::Update));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_invalidate_requires_target() {
        assert!(parse(&["invalidate"]).is_err());
        assert!(parse(&["invalidate", "--entity", "quiz"]).is_err());
        assert!(parse(&["invalidate", "--entity", "poll", "--mutation", "create"]).is_err());
    }

    #[tokio::test]
    async fn test_execute_invalidate_pattern() {
        let store = seeded_store().await;
        let command = parse(&["invalidate", "--pattern", "cache:public:/api/quiz*"]).unwrap();

        execute(&store, ConnectionState::Connected, command).await.unwrap();

        assert!(store.get("cache:public:/api/quiz/quizzes").await.is_none());
        assert!(store.get("cache:public:/api/contests").await.is_some());
    }

    #[tokio::test]
    async fn test_execute_flush() {
        let store = seeded_store().await;

        execute(&store, ConnectionState::Connected, CacheCommand::Flush)
            .await
            .unwrap();

        assert!(store.get("cache:public:/api/contests").await.is_none());
    }

    #[tokio::test]
    async fn test_execute_requires_connection() {
        let store = seeded_store().await;

        let result = execute(&store, ConnectionState::Unavailable, CacheCommand::Flush).await;

        assert!(result.is_err());
        assert!(store.get("cache:public:/api/contests").await.is_some());
    }

    #[tokio::test]
    async fn test_invalid_pattern_is_an_error() {
        let store = seeded_store().await;
        let command = parse(&["invalidate", "--pattern", "*"]).unwrap();

        assert!(execute(&store, ConnectionState::Connected, command).await.is_err());
    }
}
