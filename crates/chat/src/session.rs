use serde_json::Value;
use tracing::{info, warn};
use vault_chat_core::{decode_arguments, Conversation, Message, ToolArguments, ToolCall};

use crate::error::TurnError;
use crate::ollama::{ChatBackend, ChatRequest};
use crate::tools::ToolRegistry;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an assistant for an Obsidian vault and a local Docker host that can call APIs via tools. \
If the user asks about files, notes, summaries, images or containers, you MUST call the appropriate tool. \
Never answer from your own knowledge when a tool exists.";

/// The tool a turn executed and what it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub name: String,
    pub arguments: ToolArguments,
    pub output: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TurnReply {
    pub invocation: Option<ToolInvocation>,
    pub reply: String,
}

/// Runs turns of the two-round tool protocol against a chat backend.
///
/// Holds only shared, read-only state; the conversation is passed in.
pub struct Assistant<B> {
    backend: B,
    tools: ToolRegistry,
    model: String,
}

impl<B: ChatBackend> Assistant<B> {
    pub fn new(backend: B, tools: ToolRegistry, model: impl Into<String>) -> Self {
        Self {
            backend,
            tools,
            model: model.into(),
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Process one user input.
    ///
    /// The user message is always recorded. Tool request, tool result and
    /// final reply are recorded together, and only once the follow-up request
    /// succeeded; on any error the conversation holds nothing past the user
    /// message.
    pub fn run_turn(
        &self,
        conversation: &mut Conversation,
        input: &str,
    ) -> Result<TurnReply, TurnError> {
        conversation.push(Message::user(input));

        let request = ChatRequest::new(
            &self.model,
            conversation.messages().to_vec(),
            self.tools.wire_definitions().to_vec(),
        );
        let first = self.backend.chat(&request).map_err(TurnError::Inference)?;

        let Some(call) = first.requested_call() else {
            conversation.push(Message::assistant(first.content.clone()));
            return Ok(TurnReply {
                invocation: None,
                reply: first.content.clone(),
            });
        };

        if first.call_count() > 1 {
            warn!(
                executed = call.name(),
                dropped = first.call_count() - 1,
                "model requested several tools; only the first is executed"
            );
        }

        let name = call.name().to_string();
        let arguments =
            decode_arguments(&call.function.arguments).map_err(|source| TurnError::Arguments {
                tool: name.clone(),
                source,
            })?;
        if !self.tools.contains(&name) {
            return Err(TurnError::UnknownTool(name));
        }

        info!(tool = %name, "model requested tool");
        let output = self.tools.call(&name, &arguments)?.render();

        let staged = [
            Message::tool_request(
                first.content.clone(),
                ToolCall::new(name.clone(), Value::Object(arguments.clone())),
            ),
            Message::tool_result(name.clone(), output.clone()),
        ];
        let mut history = conversation.messages().to_vec();
        history.extend(staged.iter().cloned());

        let followup = self
            .backend
            .chat(&ChatRequest::new(&self.model, history, Vec::new()))
            .map_err(TurnError::Inference)?;

        conversation.extend(staged);
        conversation.push(Message::assistant(followup.content.clone()));

        Ok(TurnReply {
            invocation: Some(ToolInvocation {
                name,
                arguments,
                output,
            }),
            reply: followup.content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ServiceError, ToolError};
    use crate::ollama::ReplyMessage;
    use crate::tools::ToolProvider;
    use serde_json::json;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use vault_chat_core::{Role, ToolDefinition, ToolOutput};

    fn count_role(conversation: &Conversation, role: Role) -> usize {
        conversation
            .messages()
            .iter()
            .filter(|m| m.role == role)
            .count()
    }

    /// Replays canned replies and records every request it receives.
    struct ScriptedBackend {
        replies: RefCell<VecDeque<Result<ReplyMessage, ServiceError>>>,
        requests: RefCell<Vec<ChatRequest>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<ReplyMessage, ServiceError>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                requests: RefCell::new(Vec::new()),
            }
        }
    }

    impl ChatBackend for &ScriptedBackend {
        fn chat(&self, request: &ChatRequest) -> Result<ReplyMessage, ServiceError> {
            self.requests.borrow_mut().push(request.clone());
            self.replies
                .borrow_mut()
                .pop_front()
                .expect("unexpected chat request")
        }
    }

    /// Records the filenames it was asked to summarize.
    #[derive(Default)]
    struct SummaryTools {
        calls: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl ToolProvider for SummaryTools {
        fn definitions(&self) -> Vec<ToolDefinition> {
            vec![
                ToolDefinition::new("summarize_file", "Summarize a file")
                    .param("filename", "File name"),
                ToolDefinition::new("list_files", "List files"),
            ]
        }

        fn call(&self, name: &str, arguments: &ToolArguments) -> Result<ToolOutput, ToolError> {
            if self.fail {
                return Err(ToolError::Service {
                    tool: name.to_string(),
                    source: ServiceError::Decode {
                        operation: "summarize file",
                        message: "boom".to_string(),
                    },
                });
            }
            match name {
                "summarize_file" => {
                    let filename = arguments["filename"].as_str().unwrap_or_default().to_string();
                    self.calls.lock().unwrap().push(filename.clone());
                    Ok(ToolOutput::Json(json!({ "file": filename, "summary": "short" })))
                }
                _ => Ok(ToolOutput::Text("- `a.md`".to_string())),
            }
        }
    }

    fn registry(tools: SummaryTools) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(tools));
        registry
    }

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall::new(name, arguments)
    }

    fn unreachable() -> ServiceError {
        ServiceError::Status {
            operation: "chat",
            status: 503,
            body: "down".to_string(),
        }
    }

    #[test]
    fn direct_reply_uses_one_request() {
        let backend = ScriptedBackend::new(vec![Ok(ReplyMessage::text("Hello!"))]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::with_system("sys");

        let turn = assistant.run_turn(&mut conversation, "hi").unwrap();

        assert_eq!(turn.reply, "Hello!");
        assert!(turn.invocation.is_none());
        assert_eq!(backend.requests.borrow().len(), 1);
        assert_eq!(conversation.len(), 3);
        assert_eq!(count_role(&conversation, Role::Assistant), 1);
        assert_eq!(conversation.last().unwrap().content, "Hello!");
    }

    #[test]
    fn first_request_carries_tools_and_followup_does_not() {
        let backend = ScriptedBackend::new(vec![
            Ok(ReplyMessage::with_calls("", vec![call("list_files", json!({}))])),
            Ok(ReplyMessage::text("You have a.md")),
        ]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::new();

        assistant.run_turn(&mut conversation, "what files?").unwrap();

        let requests = backend.requests.borrow();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].tools.len(), 2);
        assert!(requests[1].tools.is_empty());
        assert_eq!(requests[1].messages.last().unwrap().role, Role::Tool);
    }

    #[test]
    fn tool_round_trip_records_request_result_and_reply() {
        let backend = ScriptedBackend::new(vec![
            Ok(ReplyMessage::with_calls(
                "",
                vec![call("summarize_file", json!({ "filename": "a.md" }))],
            )),
            Ok(ReplyMessage::text("a.md is short.")),
        ]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::with_system("sys");

        let turn = assistant.run_turn(&mut conversation, "summarize a.md").unwrap();

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool, Role::Assistant]
        );
        assert_eq!(count_role(&conversation, Role::Tool), 1);

        let request = &conversation.messages()[2];
        assert_eq!(request.tool_calls[0].name(), "summarize_file");
        let result = &conversation.messages()[3];
        assert_eq!(result.name.as_deref(), Some("summarize_file"));
        assert!(result.content.contains("\"summary\": \"short\""));

        let invocation = turn.invocation.unwrap();
        assert_eq!(invocation.name, "summarize_file");
        assert_eq!(turn.reply, "a.md is short.");
        assert_eq!(backend.requests.borrow().len(), 2);
    }

    #[test]
    fn string_arguments_match_object_arguments() {
        let run = |arguments: Value| {
            let tools = SummaryTools::default();
            let calls = tools.calls.clone();
            let backend = ScriptedBackend::new(vec![
                Ok(ReplyMessage::with_calls("", vec![call("summarize_file", arguments)])),
                Ok(ReplyMessage::text("done")),
            ]);
            let assistant = Assistant::new(&backend, registry(tools), "m");
            let turn = assistant
                .run_turn(&mut Conversation::new(), "summarize")
                .unwrap();
            let recorded = calls.lock().unwrap().clone();
            (recorded, turn.invocation.unwrap())
        };

        let (from_string, string_turn) = run(json!("{\"filename\":\"a.md\"}"));
        let (from_object, object_turn) = run(json!({ "filename": "a.md" }));

        assert_eq!(from_string, vec!["a.md".to_string()]);
        assert_eq!(from_string, from_object);
        assert_eq!(string_turn, object_turn);
    }

    #[test]
    fn only_first_of_several_calls_runs() {
        let tools = SummaryTools::default();
        let calls = tools.calls.clone();
        let backend = ScriptedBackend::new(vec![
            Ok(ReplyMessage::with_calls(
                "",
                vec![
                    call("summarize_file", json!({ "filename": "first.md" })),
                    call("summarize_file", json!({ "filename": "second.md" })),
                ],
            )),
            Ok(ReplyMessage::text("done")),
        ]);
        let assistant = Assistant::new(&backend, registry(tools), "m");
        let mut conversation = Conversation::new();

        assistant.run_turn(&mut conversation, "summarize both").unwrap();

        assert_eq!(*calls.lock().unwrap(), vec!["first.md".to_string()]);
        assert_eq!(count_role(&conversation, Role::Tool), 1);
    }

    #[test]
    fn malformed_arguments_end_the_turn() {
        let backend = ScriptedBackend::new(vec![Ok(ReplyMessage::with_calls(
            "",
            vec![call("summarize_file", json!("{not json"))],
        ))]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::new();

        let err = assistant.run_turn(&mut conversation, "go").unwrap_err();

        assert!(matches!(err, TurnError::Arguments { ref tool, .. } if tool == "summarize_file"));
        assert_eq!(conversation.len(), 1);
        assert_eq!(backend.requests.borrow().len(), 1);
    }

    #[test]
    fn unknown_tool_leaves_no_tool_message() {
        let backend = ScriptedBackend::new(vec![Ok(ReplyMessage::with_calls(
            "",
            vec![call("format_disk", json!({}))],
        ))]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::new();

        let err = assistant.run_turn(&mut conversation, "go").unwrap_err();

        assert_eq!(err.to_string(), "Unknown tool requested: format_disk");
        assert_eq!(count_role(&conversation, Role::Tool), 0);
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn failing_tool_leaves_only_user_message() {
        let backend = ScriptedBackend::new(vec![Ok(ReplyMessage::with_calls(
            "",
            vec![call("summarize_file", json!({ "filename": "a.md" }))],
        ))]);
        let tools = SummaryTools {
            fail: true,
            ..SummaryTools::default()
        };
        let assistant = Assistant::new(&backend, registry(tools), "m");
        let mut conversation = Conversation::new();

        let err = assistant.run_turn(&mut conversation, "go").unwrap_err();

        assert!(matches!(err, TurnError::Tool(_)));
        assert!(err.to_string().contains("summarize file"));
        assert_eq!(conversation.len(), 1);
    }

    #[test]
    fn first_request_failure_keeps_only_user_message() {
        let backend = ScriptedBackend::new(vec![Err(unreachable())]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::new();

        let err = assistant.run_turn(&mut conversation, "hi").unwrap_err();

        assert!(matches!(err, TurnError::Inference(_)));
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.last().unwrap().role, Role::User);
    }

    #[test]
    fn followup_failure_keeps_only_user_message() {
        let backend = ScriptedBackend::new(vec![
            Ok(ReplyMessage::with_calls("", vec![call("list_files", json!({}))])),
            Err(unreachable()),
        ]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::with_system("sys");

        let err = assistant.run_turn(&mut conversation, "files?").unwrap_err();

        assert!(err.to_string().contains("chat"));
        assert_eq!(conversation.len(), 2);
        assert_eq!(count_role(&conversation, Role::Tool), 0);
        assert_eq!(backend.requests.borrow().len(), 2);
    }

    #[test]
    fn history_is_replayed_on_the_next_turn() {
        let backend = ScriptedBackend::new(vec![
            Ok(ReplyMessage::text("first")),
            Ok(ReplyMessage::text("second")),
        ]);
        let assistant = Assistant::new(&backend, registry(SummaryTools::default()), "m");
        let mut conversation = Conversation::new();

        assistant.run_turn(&mut conversation, "one").unwrap();
        assistant.run_turn(&mut conversation, "two").unwrap();

        let requests = backend.requests.borrow();
        let replayed: Vec<&str> = requests[1]
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(replayed, vec!["one", "first", "two"]);
    }
}
