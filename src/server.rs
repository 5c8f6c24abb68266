//! # MCP Server
//!
//! Registers the single `droidExec` tool with rmcp and maps subprocess
//! outcomes onto protocol tool results. Schema validation of inbound
//! arguments is rmcp's job; by the time [`DroidServer::droid_exec`] runs,
//! the request has already been deserialized against the derived schema.

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

use crate::config::ServerConfig;
use crate::exec::{self, ExecOutcome};
use crate::sanitize;

/// Arguments for one `droidExec` call. Created per inbound call and
/// discarded once the result is handed back to the transport.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct DroidExecRequest {
    /// The prompt to execute via droid exec
    pub prompt: String,
    /// Model ID to use (default: claude-sonnet-4-5-20250929). Available:
    /// gpt-5.1-codex, gpt-5.1, gpt-5-codex, claude-sonnet-4-5-20250929,
    /// gpt-5-2025-08-07, claude-opus-4-1-20250805,
    /// claude-haiku-4-5-20251001, glm-4.6
    pub model: Option<String>,
    /// Working directory path
    pub cwd: Option<String>,
}

#[derive(Clone)]
pub struct DroidServer {
    config: ServerConfig,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl DroidServer {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            tool_router: Self::tool_router(),
        }
    }

    /// Map a validated request onto droid's argument grammar. Flag order is
    /// fixed (`-m` before `--cwd`) and the prompt is always last; droid's
    /// own parser depends on both.
    fn build_args(req: &DroidExecRequest) -> Vec<String> {
        let mut args = vec!["exec".to_string(), "--skip-permissions-unsafe".to_string()];

        if let Some(model) = &req.model {
            args.push("-m".to_string());
            args.push(model.clone());
        }
        if let Some(cwd) = &req.cwd {
            args.push("--cwd".to_string());
            args.push(cwd.clone());
        }

        args.push(req.prompt.clone());
        args
    }

    /// Subprocess failures become error-flagged results, never protocol
    /// faults; the client always receives a well-formed response.
    fn into_tool_result(outcome: ExecOutcome) -> CallToolResult {
        match outcome {
            ExecOutcome::Success { stdout } => CallToolResult::success(vec![Content::text(
                sanitize::strip_status_preamble(&stdout),
            )]),
            ExecOutcome::ProcessError { message } => CallToolResult::error(vec![Content::text(
                format!("Error executing droid: {}", message),
            )]),
            ExecOutcome::NonZeroExit {
                code,
                stdout,
                stderr,
            } => {
                let code = code.map_or_else(|| "signal".to_string(), |c| c.to_string());
                CallToolResult::error(vec![Content::text(format!(
                    "droid exec failed with code {}\n\nStdout:\n{}\n\nStderr:\n{}",
                    code, stdout, stderr
                ))])
            }
        }
    }

    #[tool(
        name = "droidExec",
        description = "Execute a command via droid exec with the given prompt"
    )]
    async fn droid_exec(
        &self,
        Parameters(req): Parameters<DroidExecRequest>,
    ) -> Result<CallToolResult, McpError> {
        let args = Self::build_args(&req);
        debug!(
            model = req.model.as_deref(),
            cwd = req.cwd.as_deref(),
            "invoking droid exec"
        );

        let outcome =
            exec::run_with_timeout(&self.config.droid_bin, &args, self.config.exec_timeout).await;
        Ok(Self::into_tool_result(outcome))
    }
}

#[tool_handler]
impl ServerHandler for DroidServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Bridges the droid CLI: call droidExec with a prompt to run `droid exec` and receive its output."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::time::Duration;

    fn request(prompt: &str, model: Option<&str>, cwd: Option<&str>) -> DroidExecRequest {
        DroidExecRequest {
            prompt: prompt.to_string(),
            model: model.map(str::to_string),
            cwd: cwd.map(str::to_string),
        }
    }

    /// Inspect results through their wire shape so the assertions track the
    /// protocol contract rather than rmcp's internal representation.
    fn wire(result: &CallToolResult) -> Value {
        serde_json::to_value(result).unwrap()
    }

    fn wire_text(result: &CallToolResult) -> String {
        wire(result)["content"][0]["text"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_build_args_prompt_only() {
        let args = DroidServer::build_args(&request("do the thing", None, None));
        assert_eq!(args, vec!["exec", "--skip-permissions-unsafe", "do the thing"]);
    }

    #[test]
    fn test_build_args_full() {
        let args = DroidServer::build_args(&request(
            "fix tests",
            Some("glm-4.6"),
            Some("/tmp/project"),
        ));
        assert_eq!(
            args,
            vec![
                "exec",
                "--skip-permissions-unsafe",
                "-m",
                "glm-4.6",
                "--cwd",
                "/tmp/project",
                "fix tests",
            ]
        );
    }

    #[test]
    fn test_build_args_model_only() {
        let args = DroidServer::build_args(&request("p", Some("gpt-5.1"), None));
        assert_eq!(args, vec!["exec", "--skip-permissions-unsafe", "-m", "gpt-5.1", "p"]);
    }

    #[test]
    fn test_build_args_cwd_only() {
        let args = DroidServer::build_args(&request("p", None, Some("/work")));
        assert_eq!(args, vec!["exec", "--skip-permissions-unsafe", "--cwd", "/work", "p"]);
    }

    #[test]
    fn test_success_maps_to_plain_result() {
        let result = DroidServer::into_tool_result(ExecOutcome::Success {
            stdout: "OK".to_string(),
        });
        let v = wire(&result);
        assert_ne!(v["isError"], json!(true));
        assert_eq!(wire_text(&result), "OK");
    }

    #[test]
    fn test_success_strips_status_preamble() {
        let result = DroidServer::into_tool_result(ExecOutcome::Success {
            stdout: "\x1b[?25l\x1b[2K\x1b[1G\x1b[?25h\x1b[32m✓ Success\x1b[0m\nREST".to_string(),
        });
        assert_eq!(wire_text(&result), "REST");
    }

    #[test]
    fn test_nonzero_exit_maps_to_error_result() {
        let result = DroidServer::into_tool_result(ExecOutcome::NonZeroExit {
            code: Some(1),
            stdout: "partial".to_string(),
            stderr: "bad arg".to_string(),
        });
        let v = wire(&result);
        assert_eq!(v["isError"], json!(true));
        let text = wire_text(&result);
        assert!(text.contains("code 1"));
        assert!(text.contains("partial"));
        assert!(text.contains("bad arg"));
    }

    #[test]
    fn test_signal_death_maps_to_error_result() {
        let result = DroidServer::into_tool_result(ExecOutcome::NonZeroExit {
            code: None,
            stdout: String::new(),
            stderr: String::new(),
        });
        let v = wire(&result);
        assert_eq!(v["isError"], json!(true));
        assert!(wire_text(&result).contains("code signal"));
    }

    #[test]
    fn test_process_error_maps_to_error_result() {
        let result = DroidServer::into_tool_result(ExecOutcome::ProcessError {
            message: "ENOENT".to_string(),
        });
        let v = wire(&result);
        assert_eq!(v["isError"], json!(true));
        assert_eq!(wire_text(&result), "Error executing droid: ENOENT");
    }

    #[test]
    fn test_request_deserializes_without_optionals() {
        let req: DroidExecRequest = serde_json::from_value(json!({ "prompt": "hi" })).unwrap();
        assert_eq!(req.prompt, "hi");
        assert!(req.model.is_none());
        assert!(req.cwd.is_none());
    }

    #[tokio::test]
    async fn test_droid_exec_end_to_end_with_stub_binary() {
        // `echo` stands in for droid: the tool result is exactly the
        // argument list the handler built.
        let server = DroidServer::new(ServerConfig {
            droid_bin: "echo".to_string(),
            exec_timeout: Duration::from_secs(5),
        });

        let result = server
            .droid_exec(Parameters(request("hello", None, None)))
            .await
            .unwrap();
        let v = wire(&result);
        assert_ne!(v["isError"], json!(true));
        assert_eq!(wire_text(&result), "exec --skip-permissions-unsafe hello\n");
    }

    #[tokio::test]
    async fn test_droid_exec_passes_cwd_to_subprocess() {
        // A real directory, a real subprocess: the `--cwd` pair must reach
        // the binary in flag order, with the prompt still last.
        let dir = tempfile::tempdir().unwrap();
        let cwd = dir.path().to_str().unwrap();

        let server = DroidServer::new(ServerConfig {
            droid_bin: "echo".to_string(),
            exec_timeout: Duration::from_secs(5),
        });

        let result = server
            .droid_exec(Parameters(request("list files", None, Some(cwd))))
            .await
            .unwrap();
        let v = wire(&result);
        assert_ne!(v["isError"], json!(true));
        assert_eq!(
            wire_text(&result),
            format!("exec --skip-permissions-unsafe --cwd {} list files\n", cwd)
        );
    }

    #[tokio::test]
    async fn test_droid_exec_missing_binary() {
        let server = DroidServer::new(ServerConfig {
            droid_bin: "definitely-not-a-real-binary-xyz123".to_string(),
            exec_timeout: Duration::from_secs(5),
        });

        let result = server
            .droid_exec(Parameters(request("hello", None, None)))
            .await
            .unwrap();
        let v = wire(&result);
        assert_eq!(v["isError"], json!(true));
        assert!(wire_text(&result).starts_with("Error executing droid:"));
    }
}
