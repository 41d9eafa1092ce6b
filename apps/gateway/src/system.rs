//! System message construction.

use ccore::Message;

/// Base prompt used when the configuration sets none.
pub const DEFAULT_PROMPT: &str = "\
You are a helpful coding assistant that answers questions about code on GitHub.

* You have been given functions that load data from GitHub. Use them to answer.
* You may call functions several times for one message; pick them in the order that best serves the task.
* If you are unsure how or when to call a function, ask the user to clarify.
* Most users are developers, use technical terms freely and be concise.";

/// System prompt of the primary-column grid action.
pub const COLUMN_PROMPT: &str = "\
You have functions that retrieve data from GitHub. Use the right one to fetch what the user asks for.
You may call only one function per message, and its result is shown to the user as is.
If it is unclear which function fits, or a required argument is missing, ask the user instead of calling.";

/// System prompt of the cell grid action.
pub const CELL_PROMPT: &str = "\
You have functions that retrieve data from GitHub, and may call several of them in sequence or in parallel.
The user message holds a Context, a JSON artifact from GitHub such as an issue, commit or file, and a Query about it.
Sometimes the Context already contains the answer, otherwise use the functions to find it.
The answer is shown in a table cell: no greetings, no markdown, as short as possible.";

/// Build the system message from the base prompt and the user's custom
/// instructions.
pub fn system_message(prompt: &str, custom_instructions: &str) -> Message {
    let prompt = if prompt.trim().is_empty() {
        DEFAULT_PROMPT
    } else {
        prompt.trim_end()
    };

    let custom = custom_instructions.trim();
    if custom.is_empty() {
        return Message::system(prompt);
    }
    Message::system(format!(
        "{prompt}\n\nThe user has provided the following additional instructions:\n{custom}"
    ))
}
