//! One-shot grid actions.
//!
//! Unlike a [`Turn`](crate::Turn), a grid action writes no side channel.
//! Each model invocation is a single non-streaming [`Model::send`], and
//! calls are executed with [`Dispatcher::execute`].

use crate::{Dispatcher, Limits, gateway, turn};
use anyhow::{Result, bail};
use ccore::{
    Cell, CellRequest, Conversation, Grid, IMAGE_FUNCTION, Message, Model, PrimaryCell, Registry,
    Request, Settings, Strategy, Tool, ToolChoice,
};
use compact_str::CompactString;
use serde_json::Value;
use std::sync::Arc;

/// Model used when the settings name none.
pub const GRID_MODEL: &str = "gpt-4o";

/// Answer used when the model produced no text.
pub const FALLBACK_ANSWER: &str = "Something went wrong";

/// Outcome of a primary-column request.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// The model called a function and its result became the column.
    Grid(Grid),
    /// The model answered in text instead, usually asking for a missing
    /// argument.
    Answer(String),
}

/// Grid actions bound to one provider and function set.
pub struct GridAction<M: Model> {
    model: M,
    name: CompactString,
    tools: Vec<Tool>,
    dispatcher: Dispatcher,
    limits: Limits,
}

impl<M: Model> GridAction<M> {
    /// Bind the actions to a provider client.
    ///
    /// With no functions named in `settings` every registered function is
    /// offered, except image analysis which needs an attachment.
    pub fn new(model: M, registry: Arc<Registry>, settings: &Settings) -> Self {
        let tools: Vec<Tool> = if settings.tools.is_empty() {
            registry
                .tools()
                .filter(|tool| tool.name != IMAGE_FUNCTION)
                .cloned()
                .collect()
        } else {
            registry.resolve(&settings.tools)
        };
        let name = if settings.model.is_empty() {
            CompactString::from(GRID_MODEL)
        } else {
            settings.model.clone()
        };

        let strategy = Strategy::select(settings.provider, false, true);
        let functions = tools.iter().map(|tool| tool.name.clone()).collect();
        Self {
            model,
            name,
            tools,
            dispatcher: Dispatcher::new(registry, strategy).with_functions(functions),
            limits: Limits::default(),
        }
    }

    /// Override the limits.
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self.dispatcher = self.dispatcher.with_timeout(limits.call_timeout);
        self
    }

    /// The functions offered to the model.
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Fill the primary column for a query.
    ///
    /// Only the first call the model asks for is executed. An array result
    /// becomes one row per item, anything else a single row.
    pub async fn column(&self, system: Message, query: &str) -> Result<Column> {
        let conversation = Conversation::new(system, vec![Message::user(query)]);
        let message = self.send(&conversation, ToolChoice::Auto).await?;

        let mut calls = gateway::requests(message.clone(), self.dispatcher.strategy());
        if calls.is_empty() {
            return Ok(Column::Answer(answer(&message)));
        }
        if calls.len() > 1 {
            tracing::debug!("column keeps the first of {} calls", calls.len());
            calls.truncate(1);
        }

        let Some(result) = self.dispatcher.execute(calls).await.into_iter().next() else {
            bail!("column call produced no result");
        };
        if !result.success {
            bail!("{} failed: {}", result.signature, result.content());
        }

        let primary_column: Vec<PrimaryCell> = match result.value {
            Value::Array(items) => items.into_iter().map(PrimaryCell::from).collect(),
            value => vec![PrimaryCell::from(value)],
        };
        tracing::debug!("{} filled {} rows", result.signature, primary_column.len());
        Ok(Column::Grid(Grid {
            title: query.to_owned(),
            primary_column,
        }))
    }

    /// Answer one cell from its row context.
    ///
    /// The model may call functions for up to `max_rounds` rounds before
    /// function calling is disabled.
    pub async fn cell(&self, system: Message, request: CellRequest) -> Result<Cell> {
        let CellRequest { key, context, .. } = request;
        let prompt = format!("Context: {context}\nQuery: {key}");
        let mut conversation = Conversation::new(system, vec![Message::user(prompt)]);
        let strategy = self.dispatcher.strategy();

        let mut rounds = 0;
        let message = loop {
            let exhausted = rounds >= self.limits.max_rounds;
            let choice = if exhausted {
                ToolChoice::None
            } else {
                ToolChoice::Auto
            };

            let message = self.send(&conversation, choice).await?;
            let calls = gateway::requests(message.clone(), strategy);
            if calls.is_empty() || exhausted {
                break message;
            }

            rounds += 1;
            let results = self.dispatcher.execute(calls.clone()).await;
            turn::fold(&mut conversation, strategy, message.content, &calls, &results);
        };

        Ok(Cell {
            key,
            context,
            display_value: answer(&message),
        })
    }

    async fn send(&self, conversation: &Conversation, choice: ToolChoice) -> Result<Message> {
        let request = Request::new(self.name.clone())
            .with_messages(conversation.messages().to_vec())
            .with_tools(self.tools.clone())
            .with_tool_choice(choice)
            .with_strategy(self.dispatcher.strategy());
        let response = self.model.send(&request).await?;
        Ok(response.message())
    }
}

fn answer(message: &Message) -> String {
    let content = message.content.trim();
    if content.is_empty() {
        FALLBACK_ANSWER.to_owned()
    } else {
        content.to_owned()
    }
}
