use anyhow::Result;
use futures::future::join_all;
use tracing::debug;

use crate::errors::{AgentError, AgentResult};
use crate::mcp::Toolset;
use crate::memory::MessageStore;
use crate::models::content::Content;
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::ToolCall;
use crate::providers::base::Provider;

/// Upper bound on completion rounds within one invocation. The model must
/// produce a reply with no tool request before this many rounds elapse.
const MAX_TOOL_ROUNDS: usize = 12;

/// Agent integrates a chat model with the toolset it can pilot, continuing
/// one conversation thread per invocation.
pub struct Agent {
    provider: Box<dyn Provider>,
    toolset: Box<dyn Toolset>,
    store: MessageStore,
}

impl Agent {
    pub fn new(provider: Box<dyn Provider>, toolset: Box<dyn Toolset>, store: MessageStore) -> Self {
        Self {
            provider,
            toolset,
            store,
        }
    }

    /// The conversation store backing this agent
    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    /// Run one conversational turn on the given thread.
    ///
    /// Loads the thread's history, appends the input messages, and asks the
    /// provider for completions until it replies without requesting a tool,
    /// dispatching every requested tool call in between. Returns the
    /// messages produced by this turn, the final assistant reply last. The
    /// updated history is persisted back under the thread identifier; a
    /// failed turn persists nothing.
    pub async fn invoke(&self, input: Vec<Message>, thread_id: &str) -> Result<Vec<Message>> {
        let mut messages = self.store.get(thread_id);
        messages.extend(input);

        let tools = self.toolset.tools().to_vec();
        let mut replies = Vec::new();
        let mut rounds = 0;

        loop {
            rounds += 1;
            if rounds > MAX_TOOL_ROUNDS {
                return Err(AgentError::LoopLimit(MAX_TOOL_ROUNDS).into());
            }

            let (response, usage) = self.provider.complete(&messages, &tools).await?;
            debug!(
                round = rounds,
                input_tokens = ?usage.input_tokens,
                output_tokens = ?usage.output_tokens,
                "model replied"
            );

            messages.push(response.clone());
            replies.push(response.clone());

            let tool_requests: Vec<&ToolRequest> = response
                .content
                .iter()
                .filter_map(|content| content.as_tool_request())
                .collect();

            if tool_requests.is_empty() {
                break;
            }

            // Dispatch all requested calls in parallel but wait until all are finished
            let futures: Vec<_> = tool_requests
                .iter()
                .map(|request| self.dispatch_tool_call(request.tool_call.clone()))
                .collect();
            let outputs = join_all(futures).await;

            // Fold the results into one message using the original request IDs
            let mut tool_response = Message::user();
            for (request, output) in tool_requests.iter().zip(outputs.into_iter()) {
                tool_response = tool_response.with_tool_response(request.id.clone(), output);
            }

            messages.push(tool_response.clone());
            replies.push(tool_response);
        }

        self.store.put(thread_id, messages);
        Ok(replies)
    }

    /// Dispatch a single tool call, carrying an upstream parse failure through
    async fn dispatch_tool_call(&self, tool_call: AgentResult<ToolCall>) -> AgentResult<Vec<Content>> {
        let call = tool_call?;
        self.toolset.call(call).await
    }
}
