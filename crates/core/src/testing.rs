//! Scripted model for tests.
//!
//! [`Scripted`] replays canned stream rounds in order and records every
//! request it receives, so tests can drive the orchestration loop without
//! a provider.

use crate::{Choice, Delta, Message, Model, Request, Response, Role, StreamChunk};
use anyhow::Result;
use futures_core::Stream;
use parking_lot::Mutex;
use std::{collections::VecDeque, sync::Arc, time::Duration};

enum Round {
    Chunks(Vec<StreamChunk>),
    Fail(String),
}

#[derive(Default)]
struct Script {
    rounds: VecDeque<Round>,
    requests: Vec<Request>,
    delay: Option<Duration>,
}

/// A model that replays scripted rounds, one per invocation.
#[derive(Clone, Default)]
pub struct Scripted {
    script: Arc<Mutex<Script>>,
}

impl Scripted {
    /// Create a model with no rounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a round of stream chunks.
    pub fn round(self, chunks: Vec<StreamChunk>) -> Self {
        self.script.lock().rounds.push_back(Round::Chunks(chunks));
        self
    }

    /// Queue a round that answers with plain text.
    pub fn answer(self, text: &str) -> Self {
        self.round(vec![StreamChunk::text(text), StreamChunk::stop()])
    }

    /// Queue a round that fails with a provider error.
    pub fn fail(self, message: impl Into<String>) -> Self {
        self.script.lock().rounds.push_back(Round::Fail(message.into()));
        self
    }

    /// Sleep between chunks, to exercise cancellation.
    pub fn delay(self, delay: Duration) -> Self {
        self.script.lock().delay = Some(delay);
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.script.lock().requests.clone()
    }

    fn next(&self, request: Request) -> (Option<Round>, Option<Duration>) {
        let mut script = self.script.lock();
        script.requests.push(request);
        (script.rounds.pop_front(), script.delay)
    }
}

impl Model for Scripted {
    async fn send(&self, request: &Request) -> Result<Response> {
        let (round, _) = self.next(request.clone());
        let chunks = match round {
            Some(Round::Chunks(chunks)) => chunks,
            Some(Round::Fail(message)) => anyhow::bail!(message),
            None => anyhow::bail!("script exhausted"),
        };

        let mut builder = Message::builder(Role::Assistant);
        for chunk in &chunks {
            builder.accept(chunk);
        }
        let message = builder.build();
        Ok(Response {
            choices: vec![Choice {
                delta: Delta {
                    role: Some(Role::Assistant),
                    content: Some(message.content),
                    tool_calls: Some(message.tool_calls).filter(|calls| !calls.is_empty()),
                    function_call: message.function_call,
                },
                ..Default::default()
            }],
            ..Default::default()
        })
    }

    fn stream(&self, request: Request) -> impl Stream<Item = Result<StreamChunk>> + Send {
        let (round, delay) = self.next(request);
        async_stream::try_stream! {
            let chunks = match round {
                Some(Round::Chunks(chunks)) => chunks,
                Some(Round::Fail(message)) => Err(anyhow::anyhow!(message))?,
                None => Err(anyhow::anyhow!("script exhausted"))?,
            };
            for chunk in chunks {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                yield chunk;
            }
        }
    }
}

impl crate::ModelFactory for Scripted {
    type Model = Self;

    fn select(&self, _kind: crate::ProviderKind) -> Result<Self> {
        Ok(self.clone())
    }
}
