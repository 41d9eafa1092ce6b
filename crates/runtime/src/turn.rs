//! The continuation controller.
//!
//! A [`Turn`] drives one chat exchange through
//! `Init -> ModelTurn -> (Done | Dispatching -> ModelTurn ...)`, writing
//! every token and debug event to its [`SideChannel`].

use crate::{
    Dispatcher, SideChannel,
    channel::{Disconnected, Frame},
    dispatch::DEFAULT_CALL_TIMEOUT,
    gateway::{self, Output},
};
use ccore::{
    CallRequest, CallResult, ChatRequest, Conversation, DEFAULT_IMAGE_PROMPT, DebugEvent,
    IMAGE_FUNCTION, Message, Model, Registry, Request, Settings, Strategy, Tool, ToolChoice,
};
use compact_str::CompactString;
use futures_util::StreamExt;
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;

/// Default number of dispatch rounds per turn.
pub const MAX_ROUNDS: usize = 16;

/// Bounds of a single turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Dispatch rounds before function calling is disabled.
    pub max_rounds: usize,
    /// Timeout of a single call.
    pub call_timeout: Duration,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_rounds: MAX_ROUNDS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Why a turn ended early.
#[derive(Debug, thiserror::Error)]
pub enum TurnError {
    /// The model invocation failed.
    #[error("model invocation failed: {0:#}")]
    Model(#[from] anyhow::Error),
    /// The caller went away.
    #[error(transparent)]
    Disconnected(#[from] Disconnected),
    /// The model kept requesting calls with function calling disabled.
    #[error("model still requested calls after {0} rounds")]
    RoundLimit(usize),
}

/// One chat exchange.
pub struct Turn<M: Model> {
    model: M,
    conversation: Conversation,
    settings: Settings,
    tools: Vec<Tool>,
    forced: Option<CompactString>,
    dispatcher: Dispatcher,
    limits: Limits,
}

impl<M: Model> Turn<M> {
    /// Build a turn: the conversation, the offered functions and the
    /// strategy, which holds for the whole turn.
    pub fn new(
        model: M,
        registry: Arc<Registry>,
        system: Message,
        request: ChatRequest,
    ) -> Self {
        let image = request.image_url().map(ToOwned::to_owned);
        let ChatRequest { messages, data } = request;
        let settings = data.settings;
        let conversation = Conversation::new(system, messages);
        let strategy = Strategy::select(settings.provider, image.is_some(), settings.parallelize);

        let mut tools = registry.resolve(&settings.tools);
        let mut forced = None;
        let mut dispatcher = Dispatcher::new(registry.clone(), strategy);
        if let Some(url) = image {
            match registry.schema(IMAGE_FUNCTION) {
                Some(schema) => {
                    if !tools.iter().any(|tool| tool.name == IMAGE_FUNCTION) {
                        tools.push(schema.clone());
                    }
                    forced = Some(CompactString::from(IMAGE_FUNCTION));
                    let prompt = conversation
                        .last_user_content()
                        .unwrap_or(DEFAULT_IMAGE_PROMPT);
                    dispatcher = dispatcher.with_image(url, prompt);
                }
                None => tracing::warn!("image attached but {IMAGE_FUNCTION} is not registered"),
            }
        }

        let functions = tools.iter().map(|tool| tool.name.clone()).collect();
        tracing::debug!(
            "turn with {} messages, {} functions, {} protocol",
            conversation.len(),
            tools.len(),
            strategy.as_str()
        );
        Self {
            model,
            conversation,
            settings,
            tools,
            forced,
            dispatcher: dispatcher.with_functions(functions),
            limits: Limits::default(),
        }
    }

    /// Override the turn limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self.dispatcher = self.dispatcher.with_timeout(limits.call_timeout);
        self
    }

    /// The protocol selected for this turn.
    pub fn strategy(&self) -> Strategy {
        self.dispatcher.strategy()
    }

    /// The functions offered to the model.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Run the turn on its own task, returning the frames it writes.
    pub fn spawn(self) -> mpsc::UnboundedReceiver<Frame> {
        let (channel, rx) = crate::channel();
        tokio::spawn(async move {
            if let Err(e) = self.run(channel).await {
                tracing::error!("turn failed: {e}");
            }
        });
        rx
    }

    /// Run the turn to completion.
    ///
    /// Fatal errors are written to the channel as an error frame before it
    /// is closed. A disconnected caller abandons the turn, dropping any
    /// call still in flight.
    pub async fn run(mut self, channel: SideChannel) -> Result<(), TurnError> {
        let result = self.drive(&channel).await;
        match &result {
            Err(TurnError::Disconnected(_)) => {
                tracing::debug!("caller disconnected, turn abandoned")
            }
            Err(e) => {
                let _ = channel.error(e.to_string());
            }
            Ok(()) => {}
        }
        channel.close();
        result
    }

    async fn drive(&mut self, channel: &SideChannel) -> Result<(), TurnError> {
        let mut rounds = 0;
        loop {
            let exhausted = rounds >= self.limits.max_rounds;
            let choice = if exhausted {
                ToolChoice::None
            } else {
                self.forced
                    .take()
                    .map(ToolChoice::Function)
                    .unwrap_or_default()
            };

            let (text, calls) = self.complete(choice, channel).await?;
            let Some(calls) = calls else {
                return Ok(());
            };
            if exhausted {
                return Err(TurnError::RoundLimit(rounds));
            }

            rounds += 1;
            self.dispatch(text, calls, channel).await?;
        }
    }

    /// ModelTurn: snapshot, invoke, forward tokens, snapshot the completion.
    async fn complete(
        &self,
        choice: ToolChoice,
        channel: &SideChannel,
    ) -> Result<(String, Option<Vec<CallRequest>>), TurnError> {
        let messages = self.conversation.messages();
        channel.event(DebugEvent::message(messages))?;

        let request = Request::new(self.settings.model.clone())
            .with_messages(messages.to_vec())
            .with_tools(self.tools.clone())
            .with_tool_choice(choice)
            .with_strategy(self.strategy());
        let stream = gateway::invoke(&self.model, request);
        futures_util::pin_mut!(stream);

        let mut text = String::new();
        let mut calls = None;
        while let Some(output) = stream.next().await {
            match output? {
                Output::Token(token) => {
                    channel.text(token.as_str())?;
                    text.push_str(&token);
                }
                Output::Calls(requests) => calls = Some(requests),
            }
        }

        channel.event(DebugEvent::completion(text.as_str()))?;
        Ok((text, calls))
    }

    /// Dispatching: run the calls, record each as it settles, fold the
    /// results into the conversation.
    async fn dispatch(
        &mut self,
        text: String,
        calls: Vec<CallRequest>,
        channel: &SideChannel,
    ) -> Result<(), TurnError> {
        let mut results: Vec<CallResult> = Vec::with_capacity(calls.len());
        {
            let settled = self.dispatcher.settle(calls.clone());
            futures_util::pin_mut!(settled);
            loop {
                let result = tokio::select! {
                    result = settled.next() => result,
                    _ = channel.closed() => return Err(Disconnected.into()),
                };
                let Some(result) = result else {
                    break;
                };
                channel.event(DebugEvent::from(&result))?;
                results.push(result);
            }
        }
        results.sort_by_key(|result| result.position);

        let strategy = self.strategy();
        fold(&mut self.conversation, strategy, text, &calls, &results);
        Ok(())
    }
}

/// Append a dispatched round to the conversation.
///
/// The concurrent protocol needs the assistant message that carried the
/// calls before their results; `results` must be in request order.
pub(crate) fn fold(
    conversation: &mut Conversation,
    strategy: Strategy,
    text: String,
    calls: &[CallRequest],
    results: &[CallResult],
) {
    if strategy == Strategy::Concurrent {
        let calls = calls
            .iter()
            .enumerate()
            .map(|(index, call)| call.to_tool_call(index as u32))
            .collect();
        conversation.push(Message::assistant(text, calls));
    }
    conversation.extend(results.iter().map(CallResult::to_message));
}
