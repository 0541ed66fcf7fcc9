//! famcache - warm and inspect the family-fund portal data cache.
//!
//! Reads go through the same cache the portal screens use, so running a
//! command twice shows cache hits, TTL classes and background refreshes.

use std::io;

use anyhow::{bail, Context, Result};
use famcache_core::api::ApiClient;
use famcache_core::cache::CacheResult;
use famcache_core::{Config, DataCache, PortalCache, ResourceKey};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
usage: famcache [command]

commands:
  dashboard        fetch the home-screen composite (default)
  get <key>        fetch one resource, e.g. `get notificationCount`
  warm             fetch every resource once and print the cache table
  status           print the cache table after warming
  config-path      print where the config file is read from
  init-config      write the current settings to the config file";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = args.first().map(String::as_str).unwrap_or("dashboard");

    if command == "--help" || command == "-h" {
        println!("{}", USAGE);
        return Ok(());
    }
    if command == "config-path" {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }
    if command == "init-config" {
        let config = Config::load()?;
        config.save()?;
        println!("wrote {}", Config::config_path()?.display());
        return Ok(());
    }

    let portal = build_portal()?;
    info!(command, "famcache starting");

    let result = match command {
        "dashboard" => report(portal.fetch_dashboard(false).await),
        "get" => {
            let key = args.get(1).context("`get` needs a resource key")?;
            fetch_one(&portal, &ResourceKey::from(key.as_str()), false).await
        }
        "warm" => warm(&portal).await,
        "status" => {
            warm_quietly(&portal).await;
            print_statuses(portal.cache());
            Ok(())
        }
        other => bail!("unknown command `{}`\n\n{}", other, USAGE),
    };

    // Let refreshes started by the reads above land before exiting.
    portal.cache().join_background().await;
    info!("famcache shutting down");
    result
}

fn build_portal() -> Result<PortalCache<ApiClient>> {
    let mut config = Config::load()?;
    config.apply_env();

    let policy = config.cache.to_policy()?;
    let mut client = ApiClient::new(&config.api_base_url)?;
    if let Some(token) = config.token {
        client.set_token(token);
    }

    Ok(PortalCache::new(DataCache::new(policy), client))
}

async fn fetch_one(
    portal: &PortalCache<ApiClient>,
    key: &ResourceKey,
    force_refresh: bool,
) -> Result<()> {
    match key {
        ResourceKey::Dashboard => report(portal.fetch_dashboard(force_refresh).await),
        ResourceKey::Profile => report(portal.fetch_profile(force_refresh).await),
        ResourceKey::Subscriptions => report(portal.fetch_subscriptions(force_refresh).await),
        ResourceKey::Payments => report(portal.fetch_payments(force_refresh).await),
        ResourceKey::Notifications => report(portal.fetch_notifications(force_refresh).await),
        ResourceKey::NotificationCount => {
            report(portal.fetch_notification_count(force_refresh).await)
        }
        ResourceKey::FamilyTree => report(portal.fetch_family_tree(force_refresh).await),
        ResourceKey::Branches => report(portal.fetch_branches(force_refresh).await),
        ResourceKey::Initiatives => report(portal.fetch_initiatives(force_refresh).await),
        ResourceKey::News => report(portal.fetch_news(force_refresh).await),
        ResourceKey::Custom(name) => bail!("no fetcher for resource `{}`", name),
    }
}

async fn warm(portal: &PortalCache<ApiClient>) -> Result<()> {
    for key in ResourceKey::KNOWN.iter() {
        println!("== {} ({})", key, key.ttl_class());
        fetch_one(portal, key, false).await?;
    }
    print_statuses(portal.cache());
    Ok(())
}

async fn warm_quietly(portal: &PortalCache<ApiClient>) {
    let (dashboard, _, _, _, _, _, _) = tokio::join!(
        portal.fetch_dashboard(false),
        portal.fetch_payments(false),
        portal.fetch_notifications(false),
        portal.fetch_family_tree(false),
        portal.fetch_branches(false),
        portal.fetch_initiatives(false),
        portal.fetch_news(false),
    );
    if let Some(ref error) = dashboard.error {
        eprintln!("dashboard: {}", error);
    }
}

/// Print a read as JSON to stdout, its error (if any) to stderr.
fn report<T: Serialize>(result: CacheResult<T>) -> Result<()> {
    let source = if result.from_cache { "cache" } else { "network" };
    if let Some(ref error) = result.error {
        eprintln!("error: {}", error);
    }
    match result.data {
        Some(ref data) => {
            eprintln!("(served from {})", source);
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        None => println!("null"),
    }
    Ok(())
}

fn print_statuses(cache: &DataCache) {
    println!(
        "{:<20} {:<7} {:<6} {:<6} {:<11} {}",
        "KEY", "CLASS", "DATA", "FRESH", "REFRESHING", "AGE"
    );
    for status in cache.statuses() {
        println!(
            "{:<20} {:<7} {:<6} {:<6} {:<11} {}",
            status.key.as_str(),
            status.key.ttl_class().to_string(),
            yes_no(status.has_data),
            yes_no(status.is_fresh),
            yes_no(status.is_refreshing),
            status.age_display(),
        );
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_describes_warm_as_single_pass() {
        let warm = USAGE
            .lines()
            .find(|line| line.trim_start().starts_with("warm"))
            .expect("warm documented");
        assert!(warm.contains("once"));
        assert!(!warm.contains("twice"));
    }

    #[test]
    fn test_usage_lists_every_command() {
        for command in ["dashboard", "get <key>", "warm", "status", "config-path", "init-config"] {
            assert!(USAGE.contains(&format!("  {}", command)), "{command}");
        }
    }
}
