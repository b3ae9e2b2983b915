//! In-memory backing store
//!
//! A small Redis-compatible command executor used as the default backing
//! store for local serving and as the test double for the dispatcher. It
//! covers the string and hash commands the REST surface is exercised
//! with, including the auth commands the credential issuer relies on, and
//! mirrors the store's conventional error texts (`ERR ...`, `WRONGTYPE
//! ...`, `WRONGPASS ...`).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::conn::{Conn, ConnFactory, StoreError};

/// A shared in-memory store. Cloning yields a handle to the same data;
/// every connection handed out by the factory sees the same keyspace.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Debug, Default)]
struct StoreInner {
    entries: HashMap<String, StoredEntry>,
    users: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: Entry,
    expires_at: Option<Instant>,
}

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    // field order preserved so HGETALL replies are deterministic
    Hash(Vec<(String, String)>),
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user/password pair that `AUTH` will accept. An empty
    /// password removes the user.
    pub fn require_user_auth(&self, username: &str, password: &str) {
        let mut inner = self.inner.lock();
        if password.is_empty() {
            inner.users.remove(username);
        } else {
            inner.users.insert(username.to_string(), password.to_string());
        }
    }

    /// Read a string key directly, for test assertions.
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.inner.lock();
        match inner.live_entry(key) {
            Some(Entry::Str(s)) => Some(s.clone()),
            _ => None,
        }
    }

    /// Remaining time-to-live of a key, for test assertions.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let mut inner = self.inner.lock();
        inner.live_expiry(key)
    }
}

#[async_trait]
impl ConnFactory for MemoryStore {
    async fn get_conn(&self) -> Box<dyn Conn> {
        Box::new(MemoryConn {
            inner: self.inner.clone(),
        })
    }
}

/// One connection to a [`MemoryStore`]. Connections are stateless; the
/// store itself is the shared state.
pub struct MemoryConn {
    inner: Arc<Mutex<StoreInner>>,
}

#[async_trait]
impl Conn for MemoryConn {
    async fn execute(&mut self, cmd: &str, args: &[Value]) -> Result<Value, StoreError> {
        let args: Vec<String> = args.iter().map(text_of).collect();
        self.inner.lock().execute(cmd, &args)
    }

    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

impl StoreInner {
    fn execute(&mut self, cmd: &str, args: &[String]) -> Result<Value, StoreError> {
        match cmd.to_ascii_uppercase().as_str() {
            "PING" => match args {
                [] => Ok(Value::String("PONG".to_string())),
                [msg] => Ok(Value::String(msg.clone())),
                _ => Err(wrong_arity("ping")),
            },

            "ECHO" => match args {
                [msg] => Ok(Value::String(msg.clone())),
                _ => Err(wrong_arity("echo")),
            },

            "GET" => match args {
                [key] => match self.live_entry(key) {
                    Some(Entry::Str(s)) => Ok(Value::String(s.clone())),
                    Some(Entry::Hash(_)) => Err(wrong_type()),
                    None => Ok(Value::Null),
                },
                _ => Err(wrong_arity("get")),
            },

            "SET" => self.set(args),

            "DEL" => {
                if args.is_empty() {
                    return Err(wrong_arity("del"));
                }
                let mut removed = 0i64;
                for key in args {
                    if self.live_entry(key).is_some() && self.entries.remove(key).is_some() {
                        removed += 1;
                    }
                }
                Ok(json!(removed))
            }

            "INCR" => match args {
                [key] => self.incr(key),
                _ => Err(wrong_arity("incr")),
            },

            "HSET" => self.hset(args),

            "HGETALL" => match args {
                [key] => match self.live_entry(key) {
                    Some(Entry::Hash(fields)) => {
                        let mut flat = Vec::with_capacity(fields.len() * 2);
                        for (field, value) in fields {
                            flat.push(Value::String(field.clone()));
                            flat.push(Value::String(value.clone()));
                        }
                        Ok(Value::Array(flat))
                    }
                    Some(Entry::Str(_)) => Err(wrong_type()),
                    None => Ok(Value::Array(Vec::new())),
                },
                _ => Err(wrong_arity("hgetall")),
            },

            "TTL" => match args {
                [key] => {
                    if self.live_entry(key).is_none() {
                        return Ok(json!(-2));
                    }
                    match self.live_expiry(key) {
                        Some(remaining) => Ok(json!(remaining.as_secs() as i64)),
                        None => Ok(json!(-1)),
                    }
                }
                _ => Err(wrong_arity("ttl")),
            },

            "AUTH" => match args {
                [username, password] => match self.users.get(username) {
                    Some(expected) if expected == password => Ok(Value::String("OK".to_string())),
                    _ => Err(StoreError::new(
                        "WRONGPASS invalid username-password pair or user is disabled.",
                    )),
                },
                [_] => Err(StoreError::new(
                    "ERR Client sent AUTH, but no password is set.",
                )),
                _ => Err(wrong_arity("auth")),
            },

            "ACL" => match args.first().map(|s| s.to_ascii_uppercase()) {
                Some(sub) if sub == "GENPASS" => {
                    Ok(Value::String(uuid::Uuid::new_v4().simple().to_string()))
                }
                Some(sub) => Err(StoreError::new(format!(
                    "ERR Unknown ACL subcommand or wrong number of arguments for '{sub}'"
                ))),
                None => Err(wrong_arity("acl")),
            },

            _ => Err(StoreError::new(format!("ERR unknown command '{cmd}'"))),
        }
    }

    /// SET key [value] [EX seconds]: the value is the first argument not
    /// consumed as an option, defaulting to the empty string so an
    /// option-only call still stores the key.
    fn set(&mut self, args: &[String]) -> Result<Value, StoreError> {
        let (key, rest) = match args.split_first() {
            Some(split) => split,
            None => return Err(wrong_arity("set")),
        };

        let mut value: Option<String> = None;
        let mut expires_at: Option<Instant> = None;

        let mut it = rest.iter();
        while let Some(token) = it.next() {
            if token.eq_ignore_ascii_case("ex") {
                let seconds = it
                    .next()
                    .and_then(|s| s.parse::<u64>().ok())
                    .ok_or_else(|| StoreError::new("ERR syntax error"))?;
                // a deadline too far out to represent is invalid, not a panic
                let at = Instant::now()
                    .checked_add(Duration::from_secs(seconds))
                    .ok_or_else(|| {
                        StoreError::new("ERR invalid expire time in 'set' command")
                    })?;
                expires_at = Some(at);
            } else if value.is_none() {
                value = Some(token.clone());
            } else {
                return Err(StoreError::new("ERR syntax error"));
            }
        }

        self.entries.insert(
            key.clone(),
            StoredEntry {
                value: Entry::Str(value.unwrap_or_default()),
                expires_at,
            },
        );
        Ok(Value::String("OK".to_string()))
    }

    fn incr(&mut self, key: &str) -> Result<Value, StoreError> {
        let current = match self.live_entry(key) {
            Some(Entry::Str(s)) => s
                .parse::<i64>()
                .map_err(|_| StoreError::new("ERR value is not an integer or out of range"))?,
            Some(Entry::Hash(_)) => return Err(wrong_type()),
            None => 0,
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| StoreError::new("ERR increment or decrement would overflow"))?;
        let expires_at = self.entries.get(key).and_then(|e| e.expires_at);
        self.entries.insert(
            key.to_string(),
            StoredEntry {
                value: Entry::Str(next.to_string()),
                expires_at,
            },
        );
        Ok(json!(next))
    }

    fn hset(&mut self, args: &[String]) -> Result<Value, StoreError> {
        let (key, pairs) = match args.split_first() {
            Some(split) if !split.1.is_empty() && split.1.len() % 2 == 0 => split,
            _ => return Err(wrong_arity("hset")),
        };

        let mut fields = match self.live_entry(key) {
            Some(Entry::Hash(fields)) => fields.clone(),
            Some(Entry::Str(_)) => return Err(wrong_type()),
            None => Vec::new(),
        };

        let mut added = 0i64;
        for pair in pairs.chunks(2) {
            let (field, value) = (&pair[0], &pair[1]);
            match fields.iter_mut().find(|(f, _)| f == field) {
                Some((_, existing)) => *existing = value.clone(),
                None => {
                    fields.push((field.clone(), value.clone()));
                    added += 1;
                }
            }
        }

        let expires_at = self.entries.get(key).and_then(|e| e.expires_at);
        self.entries.insert(
            key.clone(),
            StoredEntry {
                value: Entry::Hash(fields),
                expires_at,
            },
        );
        Ok(json!(added))
    }

    /// The live value of a key, evicting it first if its expiry passed.
    fn live_entry(&mut self, key: &str) -> Option<&Entry> {
        let expired = matches!(
            self.entries.get(key),
            Some(StoredEntry {
                expires_at: Some(at),
                ..
            }) if *at <= Instant::now()
        );
        if expired {
            self.entries.remove(key);
        }
        self.entries.get(key).map(|e| &e.value)
    }

    fn live_expiry(&mut self, key: &str) -> Option<Duration> {
        self.live_entry(key)?;
        let at = self.entries.get(key)?.expires_at?;
        at.checked_duration_since(Instant::now())
    }
}

fn wrong_arity(cmd: &str) -> StoreError {
    StoreError::new(format!(
        "ERR wrong number of arguments for '{cmd}' command"
    ))
}

fn wrong_type() -> StoreError {
    StoreError::new("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
