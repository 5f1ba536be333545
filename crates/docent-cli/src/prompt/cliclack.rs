use anyhow::Result;
use bat::WrappingMode;
use cliclack::{input, spinner};
use console::style;
use docent::models::message::{Message, MessageContent};

use super::Prompt;

pub struct CliclackPrompt {
    spinner: cliclack::ProgressBar,
}

impl CliclackPrompt {
    pub fn new() -> Self {
        CliclackPrompt { spinner: spinner() }
    }
}

fn print_markdown(content: &str) {
    bat::PrettyPrinter::new()
        .input(bat::Input::from_bytes(content.as_bytes()))
        .language("Markdown")
        .wrapping_mode(WrappingMode::Character)
        .print()
        .ok();
}

impl Prompt for CliclackPrompt {
    fn get_choice(&mut self) -> Result<String> {
        println!();
        println!("{}", style("Menu:").bold());
        println!("1. Ask the agent a question");
        println!("2. Quit");
        let choice: String = input("Enter your choice (1 or 2):")
            .placeholder("")
            .required(false)
            .interact()?;
        Ok(choice)
    }

    fn get_question(&mut self) -> Result<String> {
        let question: String = input("Your question").placeholder("").interact()?;
        Ok(question)
    }

    fn render(&mut self, message: &Message) {
        for content in &message.content {
            match content {
                MessageContent::Text(text) => print_markdown(text),
                MessageContent::Image { mime_type, .. } => {
                    println!("{}", style(format!("[image: {}]", mime_type)).dim());
                }
                // Tool traffic stays internal to the agent loop
                MessageContent::ToolRequest(_) | MessageContent::ToolResponse(_) => {}
            }
        }
        println!();
    }

    fn show_busy(&mut self) {
        self.spinner = spinner();
        self.spinner.start("awaiting reply");
    }

    fn hide_busy(&mut self) {
        self.spinner.stop("");
    }

    fn goodbye(&mut self) {
        println!("Goodbye!");
    }
}
