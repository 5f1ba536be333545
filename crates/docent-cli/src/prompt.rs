use anyhow::Result;
use docent::models::message::Message;

pub mod cliclack;

/// Console seam for the session loop, so tests can script the operator.
pub trait Prompt {
    /// Show the menu and read the operator's choice as one raw line
    fn get_choice(&mut self) -> Result<String>;

    /// Read one line of free text as the operator's question
    fn get_question(&mut self) -> Result<String>;

    /// Render an agent reply
    fn render(&mut self, message: &Message);

    fn show_busy(&mut self);

    fn hide_busy(&mut self);

    /// Print the farewell line
    fn goodbye(&mut self);
}
