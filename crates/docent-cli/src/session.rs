use anyhow::Result;

use docent::agent::Agent;
use docent::models::message::Message;

use crate::prompt::Prompt;

/// The persona given to the agent on the first turn of the thread.
pub const SYSTEM_PROMPT: &str = "You are a smart, useful agent with tools to access code library documentation and the Met Museum collection.";

/// The opening request that makes the agent introduce itself.
pub const INTRO_PROMPT: &str =
    "Give a brief introduction of what you do and the tools you can access.";

/// Drives one conversation thread through a menu loop: introduce the agent,
/// then answer questions until the operator picks anything but "1".
pub struct Session {
    agent: Agent,
    prompt: Box<dyn Prompt>,
    thread_id: String,
}

impl Session {
    pub fn new(agent: Agent, prompt: Box<dyn Prompt>, thread_id: impl Into<String>) -> Self {
        Session {
            agent,
            prompt,
            thread_id: thread_id.into(),
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        // Introduce the agent, opening the session's thread
        let intro = vec![
            Message::system().with_text(SYSTEM_PROMPT),
            Message::user().with_text(INTRO_PROMPT),
        ];
        self.prompt.show_busy();
        let result = self.agent.invoke(intro, &self.thread_id).await;
        self.prompt.hide_busy();
        self.render_reply(&result?);

        loop {
            let choice = self.prompt.get_choice()?;
            if choice != "1" {
                break;
            }

            let question = self.prompt.get_question()?;
            self.prompt.show_busy();
            let result = self
                .agent
                .invoke(vec![Message::user().with_text(&question)], &self.thread_id)
                .await;
            self.prompt.hide_busy();
            self.render_reply(&result?);
        }

        self.prompt.goodbye();
        Ok(())
    }

    fn render_reply(&mut self, replies: &[Message]) {
        if let Some(last) = replies.last() {
            self.prompt.render(last);
        }
    }
}
