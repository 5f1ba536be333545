use anyhow::{anyhow, Result};
use regex::Regex;
use serde_json::{json, Value};

use crate::errors::AgentError;
use crate::models::content::Content;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};

/// Convert internal messages to OpenAI's API message specification
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        let mut converted = json!({
            "role": message.role
        });

        let mut output = Vec::new();

        for content in &message.content {
            match content {
                MessageContent::Text(text) => {
                    if !text.is_empty() {
                        converted["content"] = json!(text);
                    }
                }
                MessageContent::ToolRequest(request) => match &request.tool_call {
                    Ok(tool_call) => {
                        let sanitized_name = sanitize_function_name(&tool_call.name);
                        let tool_calls = converted
                            .as_object_mut()
                            .map(|obj| obj.entry("tool_calls").or_insert(json!([])));

                        if let Some(Value::Array(tool_calls)) = tool_calls {
                            tool_calls.push(json!({
                                "id": request.id,
                                "type": "function",
                                "function": {
                                    "name": sanitized_name,
                                    "arguments": tool_call.arguments.to_string(),
                                }
                            }));
                        }
                    }
                    Err(e) => {
                        output.push(json!({
                            "role": "tool",
                            "content": format!("Error: {}", e),
                            "tool_call_id": request.id
                        }));
                    }
                },
                MessageContent::ToolResponse(response) => {
                    match &response.tool_result {
                        Ok(contents) => {
                            // Images cannot ride inside a tool message, so they are
                            // replaced with a placeholder and uploaded right after
                            let mut tool_content = Vec::new();
                            let mut image_messages = Vec::new();

                            for content in contents {
                                match content {
                                    Content::Image(image) => {
                                        tool_content.push(Content::text(
                                            "This tool result included an image that is uploaded in the next message.",
                                        ));
                                        image_messages.push(json!({
                                            "role": "user",
                                            "content": [convert_image(&image.data, &image.mime_type)]
                                        }));
                                    }
                                    _ => {
                                        tool_content.push(content.clone());
                                    }
                                }
                            }

                            output.push(json!({
                                "role": "tool",
                                "content": tool_content,
                                "tool_call_id": response.id
                            }));

                            output.extend(image_messages);
                        }
                        Err(e) => {
                            // A tool result error is shown as output so the model can interpret the error message
                            output.push(json!({
                                "role": "tool",
                                "content": format!("The tool call returned the following error:\n{}", e),
                                "tool_call_id": response.id
                            }));
                        }
                    }
                }
                MessageContent::Image { data, mime_type } => {
                    converted["content"] = json!([convert_image(data, mime_type)]);
                }
            }
        }

        if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
            output.insert(0, converted);
        }
        messages_spec.extend(output);
    }

    messages_spec
}

/// Convert image content into OpenAI's data-url image part
pub fn convert_image(data: &str, mime_type: &str) -> Value {
    json!({
        "type": "image_url",
        "image_url": {
            "url": format!("data:{};base64,{}", mime_type, data)
        }
    })
}

/// Convert internal Tool format to OpenAI's API tool specification
pub fn tools_to_openai_spec(tools: &[Tool]) -> Result<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(anyhow!("Duplicate tool name: {}", tool.name));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}

/// Convert OpenAI's API response to an internal assistant message
pub fn openai_response_to_message(response: Value) -> Result<Message> {
    let original = response["choices"][0]["message"].clone();
    let mut content = Vec::new();

    if let Some(text) = original.get("content") {
        if let Some(text_str) = text.as_str() {
            content.push(MessageContent::text(text_str));
        }
    }

    if let Some(tool_calls) = original.get("tool_calls") {
        if let Some(tool_calls_array) = tool_calls.as_array() {
            for tool_call in tool_calls_array {
                let id = tool_call["id"].as_str().unwrap_or_default().to_string();
                let function_name = tool_call["function"]["name"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();
                let arguments = tool_call["function"]["arguments"]
                    .as_str()
                    .unwrap_or_default()
                    .to_string();

                if !is_valid_function_name(&function_name) {
                    let error = AgentError::ToolNotFound(format!(
                        "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                        function_name
                    ));
                    content.push(MessageContent::tool_request(id, Err(error)));
                } else {
                    match serde_json::from_str::<Value>(&arguments) {
                        Ok(params) => {
                            content.push(MessageContent::tool_request(
                                id,
                                Ok(ToolCall::new(&function_name, params)),
                            ));
                        }
                        Err(e) => {
                            let error = AgentError::InvalidParameters(format!(
                                "Could not interpret tool use parameters for id {}: {}",
                                id, e
                            ));
                            content.push(MessageContent::tool_request(id, Err(error)));
                        }
                    }
                }
            }
        }
    }

    Ok(Message {
        role: Role::Assistant,
        created: chrono::Utc::now().timestamp(),
        content,
    })
}

fn sanitize_function_name(name: &str) -> String {
    let re = Regex::new(r"[^a-zA-Z0-9_-]").expect("static pattern");
    re.replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    let re = Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static pattern");
    re.is_match(name)
}

#[derive(Debug, thiserror::Error)]
#[error("Context length exceeded. Message: {0}")]
pub struct ContextLengthExceededError(String);

pub fn check_openai_context_length_error(error: &Value) -> Option<ContextLengthExceededError> {
    let code = error.get("code")?.as_str()?;
    if code == "context_length_exceeded" || code == "string_above_max_length" {
        let message = error
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("Unknown error")
            .to_string();
        Some(ContextLengthExceededError(message))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_to_openai_spec() -> Result<()> {
        let message = Message::user().with_text("Hello");
        let spec = messages_to_openai_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
        Ok(())
    }

    #[test]
    fn test_system_message_keeps_system_role() {
        let messages = vec![
            Message::system().with_text("You are a helpful agent."),
            Message::user().with_text("Hi"),
        ];
        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[0]["content"], "You are a helpful agent.");
        assert_eq!(spec[1]["role"], "user");
    }

    #[test]
    fn test_tools_to_openai_spec() -> Result<()> {
        let tool = Tool::new(
            "test_tool",
            "A test tool",
            json!({
                "type": "object",
                "properties": {
                    "input": {
                        "type": "string",
                        "description": "Test parameter"
                    }
                },
                "required": ["input"]
            }),
        );

        let spec = tools_to_openai_spec(&[tool])?;

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["type"], "function");
        assert_eq!(spec[0]["function"]["name"], "test_tool");
        Ok(())
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate() {
        let tool1 = Tool::new("test_tool", "Test tool", json!({"type": "object"}));
        let tool2 = Tool::new("test_tool", "Another tool", json!({"type": "object"}));

        assert!(tools_to_openai_spec(&[tool1, tool2]).is_err());
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("hello-world"), "hello-world");
        assert_eq!(sanitize_function_name("hello world"), "hello_world");
        assert_eq!(sanitize_function_name("hello@world"), "hello_world");
    }

    #[test]
    fn test_is_valid_function_name() {
        assert!(is_valid_function_name("hello-world"));
        assert!(is_valid_function_name("hello_world"));
        assert!(!is_valid_function_name("hello world"));
        assert!(!is_valid_function_name("hello@world"));
    }

    #[test]
    fn test_messages_to_openai_spec_complex() -> Result<()> {
        let mut messages = vec![
            Message::assistant().with_text("Hello!"),
            Message::user().with_text("How are you?"),
            Message::assistant().with_tool_request(
                "tool1",
                Ok(ToolCall::new("example", json!({"param1": "value1"}))),
            ),
        ];

        messages.push(
            Message::user().with_tool_response("tool1", Ok(vec![Content::text("Result")])),
        );

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 4);
        assert_eq!(spec[0]["role"], "assistant");
        assert_eq!(spec[0]["content"], "Hello!");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[1]["content"], "How are you?");
        assert_eq!(spec[2]["role"], "assistant");
        assert!(spec[2]["tool_calls"].is_array());
        assert_eq!(spec[3]["role"], "tool");
        assert_eq!(
            spec[3]["content"],
            json!([{"text": "Result", "type": "text"}])
        );
        assert_eq!(spec[3]["tool_call_id"], spec[2]["tool_calls"][0]["id"]);

        Ok(())
    }

    #[test]
    fn test_tool_response_image_becomes_followup_message() {
        let messages = vec![Message::user().with_tool_response(
            "call_1",
            Ok(vec![Content::image("aGk=", "image/jpeg")]),
        )];

        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0]["role"], "tool");
        assert_eq!(spec[1]["role"], "user");
        assert_eq!(spec[1]["content"][0]["type"], "image_url");
        assert!(spec[1]["content"][0]["image_url"]["url"]
            .as_str()
            .unwrap()
            .starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn test_openai_response_to_message_text() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "Hello!"
                }
            }]
        });

        let message = openai_response_to_message(response)?;
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "Hello!");
        Ok(())
    }

    #[test]
    fn test_openai_response_to_message_tool_call() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "1",
                        "function": {
                            "name": "example_fn",
                            "arguments": "{\"param\": \"value\"}"
                        }
                    }]
                }
            }]
        });

        let message = openai_response_to_message(response)?;
        let request = message.content[0].as_tool_request().expect("tool request");
        let tool_call = request.tool_call.as_ref().expect("valid call");
        assert_eq!(tool_call.name, "example_fn");
        assert_eq!(tool_call.arguments, json!({"param": "value"}));
        Ok(())
    }

    #[test]
    fn test_openai_response_invalid_function_name() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "1",
                        "function": {
                            "name": "invalid fn",
                            "arguments": "{}"
                        }
                    }]
                }
            }]
        });

        let message = openai_response_to_message(response)?;
        let request = message.content[0].as_tool_request().expect("tool request");
        assert!(matches!(
            request.tool_call,
            Err(AgentError::ToolNotFound(_))
        ));
        Ok(())
    }

    #[test]
    fn test_openai_response_malformed_arguments() -> Result<()> {
        let response = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "1",
                        "function": {
                            "name": "example_fn",
                            "arguments": "not json"
                        }
                    }]
                }
            }]
        });

        let message = openai_response_to_message(response)?;
        let request = message.content[0].as_tool_request().expect("tool request");
        assert!(matches!(
            request.tool_call,
            Err(AgentError::InvalidParameters(_))
        ));
        Ok(())
    }

    #[test]
    fn test_check_context_length_error() {
        let error = json!({
            "code": "context_length_exceeded",
            "message": "This model's maximum context length is exceeded"
        });
        assert!(check_openai_context_length_error(&error).is_some());

        let error = json!({
            "code": "other_error",
            "message": "Something else"
        });
        assert!(check_openai_context_length_error(&error).is_none());
    }
}
