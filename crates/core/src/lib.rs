pub mod command;
pub mod conversation;
pub mod markdown;
pub mod tool;

pub use command::{help_text, keywords, parse_command, Command, ParseError, Patch};
pub use conversation::{Conversation, Message, Role};
pub use markdown::{code_list, field};
pub use tool::{
    decode_arguments, ArgumentError, ToolArguments, ToolCall, ToolDefinition, ToolFunction,
    ToolOutput, ToolParameter,
};
