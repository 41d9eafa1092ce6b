//! Stateless adapter over a [`Model`].
//!
//! Turns a provider stream into text tokens followed by at most one batch
//! of call requests, merging streamed call fragments on the way.

use anyhow::Result;
use ccore::{CallRequest, FinishReason, Message, Model, Request, Role, Strategy};
use futures_core::Stream;
use futures_util::StreamExt;

/// One item of a model invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// A text token, forwarded verbatim.
    Token(String),
    /// The calls the model requested. Always the last item.
    Calls(Vec<CallRequest>),
}

/// Invoke the model once.
///
/// Provider and network failures end the stream with an error; nothing is
/// retried here.
pub fn invoke<M: Model>(
    model: &M,
    request: Request,
) -> impl Stream<Item = Result<Output>> + Send {
    let strategy = request.strategy;
    async_stream::try_stream! {
        let inner = model.stream(request);
        futures_util::pin_mut!(inner);

        let mut builder = Message::builder(Role::Assistant);
        while let Some(chunk) = inner.next().await {
            let chunk = chunk?;
            if let Some(text) = builder.accept(&chunk) {
                yield Output::Token(text.to_owned());
            }

            match chunk.reason() {
                Some(FinishReason::Length) => {
                    tracing::warn!("completion truncated at max tokens")
                }
                Some(FinishReason::ContentFilter) => {
                    tracing::warn!("completion stopped by content filter")
                }
                Some(reason) => tracing::debug!("model finished: {reason:?}"),
                None => {}
            }
        }

        let calls = requests(builder.build(), strategy);
        if !calls.is_empty() {
            yield Output::Calls(calls);
        }
    }
}

/// Extract the call requests of an assistant message.
pub(crate) fn requests(message: Message, strategy: Strategy) -> Vec<CallRequest> {
    match strategy {
        Strategy::Concurrent => message.tool_calls.iter().map(CallRequest::from).collect(),
        Strategy::Serial => {
            if message.tool_calls.len() + usize::from(message.function_call.is_some()) > 1 {
                tracing::warn!("serial invocation returned several calls, keeping the first");
            }
            message
                .function_call
                .map(|call| CallRequest::serial(call.name, call.arguments))
                .or_else(|| {
                    message.tool_calls.first().map(|call| {
                        CallRequest::serial(call.function.name.clone(), call.function.arguments.clone())
                    })
                })
                .into_iter()
                .collect()
        }
    }
}
