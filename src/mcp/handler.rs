// MCP server handler
//
// Implements rmcp::ServerHandler with a dynamic tool list: both list_tools
// and call_tool read the current registry snapshot per request, so a hot
// reload changes the advertised tool set without restarting the session.

use std::sync::Arc;

use base64::Engine;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ProtocolVersion, RawAudioContent, RawContent, ServerCapabilities,
    ServerInfo, Tool,
};
use rmcp::service::{RequestContext, RoleServer};
use rmcp::ErrorData as McpError;
use tokio_util::sync::CancellationToken;

use crate::config::OutputFormat;
use crate::executor::{self, ExecError};
use crate::registry::{CompiledTool, RegistryHandle};

/// MCP server over the shared tool registry.
#[derive(Clone)]
pub struct ToolServer {
    registry: RegistryHandle,
    name: String,
}

impl ToolServer {
    pub fn new(registry: RegistryHandle, name: impl Into<String>) -> Self {
        Self {
            registry,
            name: name.into(),
        }
    }
}

impl rmcp::ServerHandler for ToolServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::default()
            },
            instructions: Some(
                "Each tool runs a configured external command. Tool names are \
                 namespace/name; arguments are described by each tool's input schema."
                    .to_string(),
            ),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let registry = self.registry.snapshot().await;
        let tools = registry
            .iter()
            .map(|tool| {
                Tool::new(
                    tool.identity(),
                    tool.declaration.description.clone(),
                    Arc::new(tool.schema.to_json_object()),
                )
            })
            .collect();

        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let registry = self.registry.snapshot().await;
        let tool = registry.get(&request.name).ok_or_else(|| {
            McpError::invalid_params(format!("unknown tool: {}", request.name), None)
        })?;

        let arguments = request.arguments.unwrap_or_default();
        Ok(dispatch_call(tool, &arguments, context.ct).await)
    }
}

/// Run one tool call and map the outcome to an MCP result.
///
/// Non-zero exits produce an error-flagged result carrying the command's
/// captured output so the caller can see its diagnostics; launch and
/// template failures produce a generic message without leaking internal
/// error text.
pub async fn dispatch_call(
    tool: &CompiledTool,
    arguments: &serde_json::Map<String, serde_json::Value>,
    cancel: CancellationToken,
) -> CallToolResult {
    let run = &tool.declaration.run;
    let output = match executor::run_command(&run.cmd, &run.args, arguments, cancel).await {
        Ok(output) => output,
        Err(err) => {
            tracing::warn!(
                tool = %tool.identity(),
                command = %run.cmd,
                error = %err,
                "tool command failed"
            );
            let text = match err {
                ExecError::ProcessExit { output, .. } => {
                    String::from_utf8_lossy(&output).into_owned()
                }
                ExecError::Cancelled => "tool error: command cancelled".to_string(),
                _ => format!("tool error: failed to run command: {}", run.cmd),
            };
            return CallToolResult::error(vec![Content::text(text)]);
        }
    };

    let content = match tool.declaration.output.format {
        OutputFormat::Image => {
            let mime = sniff_mime(&output);
            Content::image(encode_payload(&output), mime)
        }
        OutputFormat::Audio => {
            // No Content::audio constructor; build the audio variant directly
            let mime = sniff_mime(&output);
            Content::new(
                RawContent::Audio(RawAudioContent {
                    data: encode_payload(&output),
                    mime_type: mime,
                }),
                None,
            )
        }
        OutputFormat::Text | OutputFormat::Json => {
            Content::text(String::from_utf8_lossy(&output).into_owned())
        }
    };

    CallToolResult::success(vec![content])
}

fn encode_payload(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

/// Content type detected from the output bytes themselves; declared formats
/// only say image-vs-audio, not which codec the command produced.
fn sniff_mime(bytes: &[u8]) -> String {
    infer::get(bytes)
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        ArgumentDeclaration, CommandSpec, OutputSpec, ToolDeclaration,
    };
    use crate::registry::ToolRegistry;
    use rmcp::model::RawContent;
    use serde_json::json;

    fn echo_tool() -> ToolDeclaration {
        ToolDeclaration {
            namespace: "util".to_string(),
            name: "echo".to_string(),
            description: "echo message".to_string(),
            run: CommandSpec {
                cmd: "echo".to_string(),
                args: vec!["{{ msg }}".to_string()],
            },
            input: vec![ArgumentDeclaration {
                name: "msg".to_string(),
                arg_type: "string".to_string(),
                description: "message".to_string(),
                enum_values: vec![],
                required: true,
            }],
            output: OutputSpec::default(),
        }
    }

    fn compiled(declaration: ToolDeclaration) -> CompiledTool {
        let registry = ToolRegistry::build(std::slice::from_ref(&declaration)).unwrap();
        registry.get(&declaration.identity()).unwrap().as_ref().clone()
    }

    fn result_text(result: &CallToolResult) -> String {
        match &result.content[0].raw {
            RawContent::Text(text) => text.text.clone(),
            other => panic!("expected text content, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dispatch_echo_success() {
        let tool = compiled(echo_tool());
        let mut args = serde_json::Map::new();
        args.insert("msg".to_string(), json!("hello"));

        let result = dispatch_call(&tool, &args, CancellationToken::new()).await;
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(result_text(&result).trim(), "hello");
    }

    #[tokio::test]
    async fn test_dispatch_exit_error_surfaces_output() {
        let mut declaration = echo_tool();
        declaration.run = CommandSpec {
            cmd: "sh".to_string(),
            args: vec!["-c".to_string(), "echo boom; exit 1".to_string()],
        };
        declaration.input = vec![];
        let tool = compiled(declaration);

        let result = dispatch_call(&tool, &serde_json::Map::new(), CancellationToken::new()).await;
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(result_text(&result).trim(), "boom");
    }

    #[tokio::test]
    async fn test_dispatch_launch_error_is_generic() {
        let mut declaration = echo_tool();
        declaration.run = CommandSpec {
            cmd: "definitely-not-a-real-command".to_string(),
            args: vec![],
        };
        declaration.input = vec![];
        let tool = compiled(declaration);

        let result = dispatch_call(&tool, &serde_json::Map::new(), CancellationToken::new()).await;
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(
            result_text(&result),
            "tool error: failed to run command: definitely-not-a-real-command"
        );
    }

    #[tokio::test]
    async fn test_dispatch_template_error_is_generic() {
        let tool = compiled(echo_tool());

        // msg placeholder left undefined
        let result = dispatch_call(&tool, &serde_json::Map::new(), CancellationToken::new()).await;
        assert!(result.is_error.unwrap_or(false));
        assert!(result_text(&result).starts_with("tool error:"));
        // Internal template error text is not leaked
        assert!(!result_text(&result).contains("undefined"));
    }

    #[tokio::test]
    async fn test_dispatch_cancelled() {
        let mut declaration = echo_tool();
        declaration.run = CommandSpec {
            cmd: "sleep".to_string(),
            args: vec!["10".to_string()],
        };
        declaration.input = vec![];
        let tool = compiled(declaration);

        let cancel = CancellationToken::new();
        let killer = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            killer.cancel();
        });

        let result = dispatch_call(&tool, &serde_json::Map::new(), cancel).await;
        assert!(result.is_error.unwrap_or(false));
        assert_eq!(result_text(&result), "tool error: command cancelled");
    }

    #[tokio::test]
    async fn test_dispatch_audio_output_encoded() {
        let mut declaration = echo_tool();
        declaration.run = CommandSpec {
            cmd: "printf".to_string(),
            args: vec!["abc".to_string()],
        };
        declaration.input = vec![];
        declaration.output = OutputSpec {
            format: OutputFormat::Audio,
        };
        let tool = compiled(declaration);

        let result = dispatch_call(&tool, &serde_json::Map::new(), CancellationToken::new()).await;
        assert!(!result.is_error.unwrap_or(false));
        match &result.content[0].raw {
            RawContent::Audio(audio) => {
                assert_eq!(
                    audio.data,
                    base64::engine::general_purpose::STANDARD.encode(b"abc")
                );
                // Three ASCII bytes match no known signature
                assert_eq!(audio.mime_type, "application/octet-stream");
            }
            other => panic!("expected audio content, got {other:?}"),
        }
    }

    #[test]
    fn test_sniff_mime_png() {
        let png_magic = [0x89u8, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];
        assert_eq!(sniff_mime(&png_magic), "image/png");
        assert_eq!(sniff_mime(b"plain text"), "application/octet-stream");
    }
}
