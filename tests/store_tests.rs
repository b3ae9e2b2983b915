//! In-Memory Store Tests
//!
//! Exercises the command executor through the connection seam, the same
//! way the dispatcher drives it.

use restkv::conn::{Conn, ConnFactory};
use restkv::store::MemoryStore;
use serde_json::{json, Value};

fn args(items: &[&str]) -> Vec<Value> {
    items.iter().map(|s| Value::String(s.to_string())).collect()
}

async fn run(conn: &mut Box<dyn Conn>, cmd: &str, items: &[&str]) -> Result<Value, String> {
    conn.execute(cmd, &args(items)).await.map_err(|e| e.to_string())
}

#[tokio::test]
async fn test_ping_and_echo() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    assert_eq!(run(&mut conn, "PING", &[]).await.unwrap(), json!("PONG"));
    assert_eq!(run(&mut conn, "PING", &["hi"]).await.unwrap(), json!("hi"));
    assert_eq!(run(&mut conn, "ECHO", &["hi"]).await.unwrap(), json!("hi"));
}

#[tokio::test]
async fn test_set_get_del() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    assert_eq!(run(&mut conn, "GET", &["k"]).await.unwrap(), Value::Null);
    assert_eq!(run(&mut conn, "SET", &["k", "v"]).await.unwrap(), json!("OK"));
    assert_eq!(run(&mut conn, "GET", &["k"]).await.unwrap(), json!("v"));
    assert_eq!(run(&mut conn, "DEL", &["k", "missing"]).await.unwrap(), json!(1));
    assert_eq!(run(&mut conn, "GET", &["k"]).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_commands_are_case_insensitive() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    assert_eq!(run(&mut conn, "set", &["k", "v"]).await.unwrap(), json!("OK"));
    assert_eq!(run(&mut conn, "Get", &["k"]).await.unwrap(), json!("v"));
}

#[tokio::test]
async fn test_incr_from_missing_and_non_integer() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    assert_eq!(run(&mut conn, "INCR", &["n"]).await.unwrap(), json!(1));
    assert_eq!(run(&mut conn, "INCR", &["n"]).await.unwrap(), json!(2));

    run(&mut conn, "SET", &["s", "abc"]).await.unwrap();
    let err = run(&mut conn, "INCR", &["s"]).await.unwrap_err();
    assert_eq!(err, "ERR value is not an integer or out of range");
}

#[tokio::test]
async fn test_incr_at_maximum_errors_instead_of_wrapping() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    let max = i64::MAX.to_string();
    run(&mut conn, "SET", &["n", &max]).await.unwrap();
    let err = run(&mut conn, "INCR", &["n"]).await.unwrap_err();
    assert_eq!(err, "ERR increment or decrement would overflow");

    // the stored value is untouched
    assert_eq!(run(&mut conn, "GET", &["n"]).await.unwrap(), json!(max));
}

#[tokio::test]
async fn test_hset_and_hgetall() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    assert_eq!(
        run(&mut conn, "HSET", &["h", "f1", "1", "f2", "2"]).await.unwrap(),
        json!(2)
    );
    // updating an existing field adds nothing
    assert_eq!(run(&mut conn, "HSET", &["h", "f1", "9"]).await.unwrap(), json!(0));
    assert_eq!(
        run(&mut conn, "HGETALL", &["h"]).await.unwrap(),
        json!(["f1", "9", "f2", "2"])
    );
    assert_eq!(run(&mut conn, "HGETALL", &["nope"]).await.unwrap(), json!([]));

    let err = run(&mut conn, "GET", &["h"]).await.unwrap_err();
    assert!(err.starts_with("WRONGTYPE"));
}

#[tokio::test]
async fn test_hset_requires_field_value_pairs() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    let err = run(&mut conn, "HSET", &["h", "dangling"]).await.unwrap_err();
    assert_eq!(err, "ERR wrong number of arguments for 'hset' command");
}

#[tokio::test]
async fn test_set_with_expiry_and_ttl() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    run(&mut conn, "SET", &["k", "v", "EX", "100"]).await.unwrap();
    let ttl = run(&mut conn, "TTL", &["k"]).await.unwrap();
    let secs = ttl.as_i64().unwrap();
    assert!(secs > 90 && secs <= 100);

    run(&mut conn, "SET", &["p", "v"]).await.unwrap();
    assert_eq!(run(&mut conn, "TTL", &["p"]).await.unwrap(), json!(-1));
    assert_eq!(run(&mut conn, "TTL", &["missing"]).await.unwrap(), json!(-2));
}

#[tokio::test]
async fn test_expired_key_is_evicted() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    run(&mut conn, "SET", &["k", "v", "EX", "0"]).await.unwrap();
    assert_eq!(run(&mut conn, "GET", &["k"]).await.unwrap(), Value::Null);
    assert_eq!(run(&mut conn, "TTL", &["k"]).await.unwrap(), json!(-2));
}

#[tokio::test]
async fn test_set_rejects_bad_expiry() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    let err = run(&mut conn, "SET", &["k", "v", "EX", "soon"]).await.unwrap_err();
    assert_eq!(err, "ERR syntax error");
}

#[tokio::test]
async fn test_set_rejects_unrepresentable_expiry() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    // u64::MAX seconds parses but cannot be added to the current instant
    let err = run(&mut conn, "SET", &["k", "v", "EX", "18446744073709551615"])
        .await
        .unwrap_err();
    assert_eq!(err, "ERR invalid expire time in 'set' command");
    assert_eq!(run(&mut conn, "GET", &["k"]).await.unwrap(), Value::Null);
}

#[tokio::test]
async fn test_auth_verification() {
    let store = MemoryStore::new();
    store.require_user_auth("alice", "secret");
    let mut conn = store.get_conn().await;

    assert_eq!(
        run(&mut conn, "AUTH", &["alice", "secret"]).await.unwrap(),
        json!("OK")
    );
    let err = run(&mut conn, "AUTH", &["alice", "wrong"]).await.unwrap_err();
    assert!(err.starts_with("WRONGPASS"));
}

#[tokio::test]
async fn test_acl_genpass_is_unique() {
    let store = MemoryStore::new();
    let mut conn = store.get_conn().await;

    let a = run(&mut conn, "ACL", &["GENPASS"]).await.unwrap();
    let b = run(&mut conn, "ACL", &["GENPASS"]).await.unwrap();
    assert_ne!(a, b);
    assert!(!a.as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_connections_share_the_keyspace() {
    let store = MemoryStore::new();
    let mut writer = store.get_conn().await;
    let mut reader = store.get_conn().await;

    run(&mut writer, "SET", &["shared", "yes"]).await.unwrap();
    assert_eq!(run(&mut reader, "GET", &["shared"]).await.unwrap(), json!("yes"));
}
