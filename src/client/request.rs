//! Pipelined request protocol
//!
//! A [`Request`] accumulates commands queued with [`Request::send`] and
//! transmits them all in a single round trip when one of the exec methods
//! is called. The reply batch is positionally aligned with the transmitted
//! batch; partial failures do not discard the results of the commands that
//! succeeded.

use serde::de::DeserializeOwned;
use serde_json::value::RawValue;
use serde_json::Value;

use super::Client;
use crate::error::{CommandError, RestError, Result};
use crate::protocol::{Arg, Reply};

/// Receives one positional reply from an executed batch.
///
/// Blanket-implemented for every deserializable type, so a plain
/// `&mut String` or `&mut i64` is a valid destination.
pub trait Destination {
    /// Assign the raw reply payload to this destination.
    fn assign(&mut self, raw: &RawValue) -> serde_json::Result<()>;
}

impl<T: DeserializeOwned> Destination for T {
    fn assign(&mut self, raw: &RawValue) -> serde_json::Result<()> {
        *self = serde_json::from_str(raw.get())?;
        Ok(())
    }
}

/// An in-flight exchange with the REST endpoint.
///
/// Not safe for concurrent use: the queue is request-scoped and must be
/// drained by one of the exec methods before reuse.
pub struct Request<'a> {
    client: &'a Client,
    token: String,
    queue: Vec<Value>,
}

impl<'a> Request<'a> {
    pub(super) fn new(client: &'a Client, token: String) -> Self {
        Self {
            client,
            token,
            queue: Vec::new(),
        }
    }

    /// Queue a command for execution. No transport I/O occurs until one of
    /// the exec methods is called.
    pub fn send(&mut self, cmd: &str, args: &[Arg]) -> Result<()> {
        if cmd.is_empty() {
            return Err(RestError::EmptyCommand);
        }

        let mut entry = Vec::with_capacity(args.len() + 1);
        entry.push(Value::String(cmd.to_string()));
        entry.extend(args.iter().map(Arg::to_token));
        self.queue.push(Value::Array(entry));
        Ok(())
    }

    /// Execute all queued commands and distribute the replies positionally
    /// into `dst`.
    ///
    /// At most `dst.len()` replies are unmarshaled; it is an error to
    /// supply more destinations than there are replies, while trailing
    /// replies beyond `dst.len()` are silently discarded. A `None`
    /// destination ignores the reply at that position.
    ///
    /// If any reply is an error, the first one (lowest index) is returned
    /// as a [`CommandError`] carrying its pipeline index, but the other
    /// successful replies are still unmarshaled into their destinations.
    pub async fn exec(&mut self, dst: &mut [Option<&mut dyn Destination>]) -> Result<()> {
        let replies = self.transmit().await?;

        if dst.len() > replies.len() {
            return Err(RestError::TooManyDestinations);
        }

        let mut first_err: Option<CommandError> = None;
        for (i, (reply, slot)) in replies.iter().zip(dst.iter_mut()).enumerate() {
            if reply.is_error() {
                if first_err.is_none() {
                    first_err = Some(CommandError::new(&reply.error, i as i64));
                }
                continue;
            }
            if let Some(d) = slot {
                if let Some(raw) = &reply.result {
                    d.assign(raw)?;
                }
            }
        }

        match first_err {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// Queue `cmd` as the final entry, execute the whole batch, and return
    /// only the last reply decoded as `T`. The results of the previously
    /// queued commands are discarded, even if they were errors.
    ///
    /// On failure of the final command, the returned [`CommandError`] has
    /// pipeline index 0, as if the flushed commands did not exist.
    pub async fn exec_one<T: DeserializeOwned>(&mut self, cmd: &str, args: &[Arg]) -> Result<T> {
        self.send(cmd, args)?;
        let replies = self.transmit().await?;

        let last = match replies.last() {
            Some(reply) => reply,
            None => {
                return Err(RestError::Transport {
                    status: 200,
                    body: "empty reply batch".to_string(),
                })
            }
        };

        if last.is_error() {
            return Err(CommandError::new(&last.error, 0).into());
        }

        // an absent result decodes as JSON null
        let raw = last.result.as_deref().map(RawValue::get).unwrap_or("null");
        Ok(serde_json::from_str(raw)?)
    }

    /// Execute all queued commands and return the reply batch verbatim,
    /// each entry carrying its own error text if any. An error is returned
    /// only if the round trip itself failed.
    pub async fn exec_raw(&mut self) -> Result<Vec<Reply>> {
        self.transmit().await
    }

    async fn transmit(&mut self) -> Result<Vec<Reply>> {
        let (body, pipeline) = match self.queue.len() {
            0 => return Err(RestError::NoCommand),
            1 => (self.queue.swap_remove(0), false),
            _ => (Value::Array(std::mem::take(&mut self.queue)), true),
        };

        let url = if pipeline {
            format!("{}/pipeline", self.client.base_url().trim_end_matches('/'))
        } else {
            self.client.base_url().to_string()
        };
        tracing::debug!(%url, pipeline, "transmitting command batch");

        let res = self
            .client
            .http()
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await?;

        let status = res.status();
        if status != reqwest::StatusCode::OK {
            let bytes = res.bytes().await.unwrap_or_default();
            let probe = &bytes[..bytes.len().min(512)];

            // probe the body for a JSON error envelope; the error is not
            // attributable to a single command at this level
            if let Ok(reply) = serde_json::from_slice::<Reply>(probe) {
                if reply.is_error() {
                    return Err(CommandError::new(reply.error, -1).into());
                }
            }

            let text = if probe.is_empty() {
                status.to_string()
            } else {
                String::from_utf8_lossy(probe).into_owned()
            };
            return Err(RestError::Transport {
                status: status.as_u16(),
                body: text,
            });
        }

        let raw = res.bytes().await?;
        let replies = if pipeline {
            serde_json::from_slice::<Vec<Reply>>(&raw)?
        } else {
            vec![serde_json::from_slice::<Reply>(&raw)?]
        };
        Ok(replies)
    }
}
