use gatehouse::commands::{config, simulate, token};
use gatehouse_config::{ConfigSource, GateConfig, GateConfigBuilder, GateConfigLoader, LoadedConfig};
use gatehouse_core::{ManualClock, RouteClass};
use serde_json::Value;
use serial_test::serial;
use std::fs;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const KEY: &str = "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60";
const NOW: u64 = 1_699_999_200_000;

fn keyed() -> GateConfig {
    GateConfigBuilder::new().with_signing_key(KEY).build().unwrap()
}

fn localhost() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

#[test]
fn config_show_redacts_signing_key() {
    let loaded = LoadedConfig {
        config: keyed(),
        source: ConfigSource::Default,
    };
    let text = config::render(&loaded).unwrap();
    assert!(!text.contains(KEY));

    let document: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(document["config"]["signing_key"], "[redacted]");
    assert_eq!(document["config"]["rate_limits"]["login"]["limit"], 5);
    assert_eq!(document["source"], ConfigSource::Default.to_string());
}

#[test]
#[serial]
fn config_show_reports_file_source() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("gate.json");
    fs::write(&path, r#"{ "token_ttl_secs": 120 }"#).unwrap();

    let loaded = GateConfigLoader::new()
        .with_file(&path)
        .without_env()
        .load()
        .unwrap();
    let document: Value = serde_json::from_str(&config::render(&loaded).unwrap()).unwrap();

    assert_eq!(document["config"]["token_ttl_secs"], 120);
    assert!(document["config"]["signing_key"].is_null());
    assert_eq!(document["source"], ConfigSource::ConfigFile(path).to_string());
}

#[test]
fn issued_token_inspects_as_valid() {
    let config = keyed();
    let issued = token::issue(&config, "u-42", "ada@giip.info", "editor", None, NOW).unwrap();

    let report = token::inspect(&config, &format!("Bearer {}", issued.token), NOW + 1_000).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(report["subject"], "u-42");
    assert_eq!(report["role"], "editor");
    assert_eq!(report["expires_in_secs"], 3599);
    let capabilities = report["capabilities"].as_array().unwrap();
    assert!(capabilities.contains(&Value::from("write:events")));
    assert!(!capabilities.contains(&Value::from("write:news")));
}

#[test]
fn inspect_reports_expiry_and_tampering() {
    let config = keyed();
    let issued = token::issue(
        &config,
        "u-1",
        "u1@giip.info",
        "user",
        Some(Duration::from_secs(60)),
        NOW,
    )
    .unwrap();

    let expired = token::inspect(&config, &issued.token, NOW + 60_000).unwrap();
    assert_eq!(expired["valid"], false);
    assert_eq!(expired["code"], "ExpiredCredential");

    let mut tampered = issued.token.clone();
    tampered.insert(0, 'x');
    let invalid = token::inspect(&config, &tampered, NOW).unwrap();
    assert_eq!(invalid["code"], "InvalidCredential");
}

#[test]
fn unknown_role_token_has_no_capabilities() {
    let config = keyed();
    let issued = token::issue(&config, "u-9", "u9@giip.info", "superuser", None, NOW).unwrap();

    let report = token::inspect(&config, &issued.token, NOW).unwrap();
    assert_eq!(report["role"], "unknown");
    assert_eq!(report["capabilities"].as_array().unwrap().len(), 0);
}

#[test]
fn token_commands_need_a_signing_key() {
    let config = GateConfig::default();
    assert!(token::issue(&config, "u-1", "u1@giip.info", "user", None, NOW).is_err());
    assert!(token::inspect(&config, "abc.def", NOW).is_err());
}

#[tokio::test]
async fn simulate_login_burst_stops_at_limit() {
    let clock = Arc::new(ManualClock::new(NOW));
    let report =
        simulate::run_with_clock(&keyed(), "auth.login", 8, None, localhost(), clock)
            .await
            .unwrap();

    assert_eq!(report.allowed, 5);
    assert_eq!(report.denied_total(), 3);
    assert_eq!(report.denied.get("RateLimitExceeded"), Some(&3));
    let rate = report.last_rate.unwrap();
    assert_eq!(rate.remaining, 0);
    assert_eq!(rate.reset_secs(), 15 * 60);
}

#[tokio::test]
async fn simulate_cached_reads_count_hits() {
    let clock = Arc::new(ManualClock::new(NOW));
    let report = simulate::run_with_clock(&keyed(), "news.list", 4, None, localhost(), clock)
        .await
        .unwrap();

    assert_eq!(report.allowed, 4);
    assert_eq!(report.cache_hits, 3);
    assert_eq!(report.last_rate.unwrap().remaining, 96);
    assert_eq!(report.cache.misses, 1);
    assert!((report.cache.hit_rate() - 0.75).abs() < f64::EPSILON);
    assert!(report.to_string().contains("3 from cache, 75% hit rate"));

    let document: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(document["cache_hit_rate"], 0.75);
}

#[tokio::test]
async fn simulate_with_token_respects_capabilities() {
    let config = keyed();
    let issued = token::issue(&config, "ed-1", "ed@giip.info", "editor", None, NOW).unwrap();
    let clock = Arc::new(ManualClock::new(NOW));

    let report = simulate::run_with_clock(
        &config,
        "news.create",
        2,
        Some(&issued.token),
        localhost(),
        clock,
    )
    .await
    .unwrap();

    assert_eq!(report.allowed, 0);
    assert_eq!(report.denied.get("InsufficientCapability"), Some(&2));
    assert!(report.last_rate.is_none());
}

#[tokio::test]
async fn simulate_honours_configured_limits() {
    let config = GateConfigBuilder::new()
        .with_signing_key(KEY)
        .with_rate_limit(RouteClass::Register, 1, Duration::from_secs(60))
        .build()
        .unwrap();
    let clock = Arc::new(ManualClock::new(NOW));

    let report = simulate::run_with_clock(&config, "auth.register", 3, None, localhost(), clock)
        .await
        .unwrap();
    assert_eq!(report.allowed, 1);
    assert_eq!(report.denied_total(), 2);

    let json: Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["denied"]["RateLimitExceeded"], 2);
}

#[tokio::test]
async fn simulate_rejects_unknown_route() {
    let clock = Arc::new(ManualClock::new(NOW));
    let result =
        simulate::run_with_clock(&keyed(), "nope", 1, None, localhost(), clock).await;
    assert!(result.is_err());
}
