//! Scripting engine seam and the out-of-process `pwsh` implementation.
//!
//! The editor consumes three operations: tokenize/parse with structured
//! error spans, completion-candidate enumeration for (buffer, caret), and
//! script invocation. [`PwshEngine`] implements them by driving `pwsh` with
//! small driver scripts whose JSON output is deserialized here. Buffer text
//! crosses the process boundary base64-encoded so no quoting can break it.

use std::path::PathBuf;
use std::process::Command;

use base64::Engine as _;
use serde::Deserialize;

use pscode_types::{
    CompletionCandidate, CompletionKind, InvokeOutcome, ParseErrorInfo, PsToken, PsTokenKind,
    SourceSpan,
};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("pwsh not found: {0}")]
    NotFound(#[from] which::Error),
    #[error("running pwsh: {0}")]
    Io(#[from] std::io::Error),
    #[error("engine produced non-UTF-8 output")]
    NonUtf8Output,
    #[error("decoding engine output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Parse result: classified tokens plus structured parse errors.
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub tokens: Vec<PsToken>,
    pub errors: Vec<ParseErrorInfo>,
}

/// The embedding surface the editor shell consumes.
///
/// Implementations are synchronous; callers invoke them on the UI thread.
pub trait ScriptEngine {
    fn parse(&mut self, text: &str) -> Result<ParseOutcome, EngineError>;

    fn complete(
        &mut self,
        text: &str,
        caret: usize,
    ) -> Result<Vec<CompletionCandidate>, EngineError>;

    fn invoke(&mut self, script: &str) -> Result<InvokeOutcome, EngineError>;
}

// ── pwsh driver scripts ─────────────────────────────────────────────────

const PARSE_DRIVER: &str = r#"
$source = [System.Text.Encoding]::UTF8.GetString([Convert]::FromBase64String('__SOURCE_B64__'))
$tokens = $null; $errors = $null
[void][System.Management.Automation.Language.Parser]::ParseInput($source, [ref]$tokens, [ref]$errors)
@{
    tokens = @($tokens | ForEach-Object {
        @{ kind = $_.Kind.ToString(); start = $_.Extent.StartOffset; end = $_.Extent.EndOffset }
    })
    errors = @($errors | ForEach-Object {
        @{ start = $_.Extent.StartOffset; end = $_.Extent.EndOffset; message = $_.Message }
    })
} | ConvertTo-Json -Depth 4 -Compress
"#;

const COMPLETE_DRIVER: &str = r#"
$source = [System.Text.Encoding]::UTF8.GetString([Convert]::FromBase64String('__SOURCE_B64__'))
$result = [System.Management.Automation.CommandCompletion]::CompleteInput($source, __CARET__, $null)
@{
    matches = @($result.CompletionMatches | ForEach-Object {
        @{
            listItemText = $_.ListItemText
            completionText = $_.CompletionText
            resultType = [int]$_.ResultType
            toolTip = $_.ToolTip
        }
    })
} | ConvertTo-Json -Depth 4 -Compress
"#;

const INVOKE_DRIVER: &str = r#"
$source = [System.Text.Encoding]::UTF8.GetString([Convert]::FromBase64String('__SOURCE_B64__'))
$failures = @()
$captured = ''
try {
    $captured = Invoke-Command -ScriptBlock ([scriptblock]::Create($source)) -ErrorVariable nonTerminating 2>$null | Out-String
    foreach ($record in $nonTerminating) { $failures += $record.ToString() }
} catch {
    $failures += $_.ToString()
}
@{ output = $captured; errors = @($failures) } | ConvertTo-Json -Depth 3 -Compress
"#;

// ── wire shapes (ConvertTo-Json output) ─────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireParse {
    #[serde(default)]
    tokens: Vec<WireToken>,
    #[serde(default)]
    errors: Vec<WireError>,
}

#[derive(Debug, Deserialize)]
struct WireToken {
    kind: String,
    start: usize,
    end: usize,
}

#[derive(Debug, Deserialize)]
struct WireError {
    start: usize,
    end: usize,
    message: String,
}

#[derive(Debug, Deserialize)]
struct WireCompletions {
    #[serde(default)]
    matches: Vec<WireMatch>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMatch {
    list_item_text: String,
    completion_text: String,
    result_type: u32,
    #[serde(default)]
    tool_tip: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireInvoke {
    #[serde(default)]
    output: String,
    #[serde(default)]
    errors: Vec<String>,
}

/// The host tokenizer reports UTF-16 code-unit offsets; buffer spans are
/// byte offsets. Offsets past the end clamp to the buffer length.
fn utf16_to_byte_offset(text: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (byte_idx, c) in text.char_indices() {
        if units >= utf16 {
            return byte_idx;
        }
        units += c.len_utf16();
    }
    text.len()
}

fn wire_span(text: &str, start: usize, end: usize) -> Option<SourceSpan> {
    let start = utf16_to_byte_offset(text, start);
    let end = utf16_to_byte_offset(text, end);
    SourceSpan::new(start, end).ok()
}

fn parse_outcome_from_wire(text: &str, wire: WireParse) -> ParseOutcome {
    let tokens = wire
        .tokens
        .into_iter()
        .filter_map(|t| {
            Some(PsToken {
                kind: PsTokenKind::from_host_kind(&t.kind),
                span: wire_span(text, t.start, t.end)?,
            })
        })
        .collect();

    let errors = wire
        .errors
        .into_iter()
        .filter_map(|e| Some(ParseErrorInfo::new(wire_span(text, e.start, e.end)?, e.message)))
        .collect();

    ParseOutcome { tokens, errors }
}

fn candidates_from_wire(wire: WireCompletions) -> Vec<CompletionCandidate> {
    wire.matches
        .into_iter()
        .map(|m| {
            CompletionCandidate::new(
                m.list_item_text,
                m.completion_text,
                CompletionKind::from_result_type(m.result_type)
                    .unwrap_or(CompletionKind::Other),
                m.tool_tip.unwrap_or_default(),
            )
        })
        .collect()
}

// ── PwshEngine ──────────────────────────────────────────────────────────

/// Engine implementation backed by an external `pwsh` interpreter.
///
/// Each call runs one non-interactive driver invocation; invocations share
/// a persistent session directory as their working directory.
pub struct PwshEngine {
    pwsh: PathBuf,
    session_dir: PathBuf,
}

impl PwshEngine {
    /// Resolve the interpreter and set up the session directory.
    pub fn new(pwsh: &str) -> Result<Self, EngineError> {
        let resolved = which::which(pwsh)?;
        let session_dir = std::env::temp_dir().join(format!("pscode-rs-{}", std::process::id()));
        std::fs::create_dir_all(&session_dir)?;
        tracing::info!(pwsh = %resolved.display(), "Scripting engine ready");
        Ok(Self {
            pwsh: resolved,
            session_dir,
        })
    }

    fn run_driver(&self, driver: &str, source: &str, caret: Option<usize>) -> Result<String, EngineError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(source);
        let mut script = driver.replace("__SOURCE_B64__", &encoded);
        if let Some(caret) = caret {
            // CompleteInput takes a UTF-16 offset; derive it from the byte caret.
            let utf16: usize = source[..caret].chars().map(char::len_utf16).sum();
            script = script.replace("__CARET__", &utf16.to_string());
        }

        let output = Command::new(&self.pwsh)
            .arg("-NoProfile")
            .arg("-NonInteractive")
            .arg("-Command")
            .arg(&script)
            .current_dir(&self.session_dir)
            .output()?;

        if !output.status.success() {
            tracing::warn!(status = %output.status, "pwsh driver exited nonzero");
        }

        String::from_utf8(output.stdout).map_err(|_| EngineError::NonUtf8Output)
    }
}

impl ScriptEngine for PwshEngine {
    fn parse(&mut self, text: &str) -> Result<ParseOutcome, EngineError> {
        let stdout = self.run_driver(PARSE_DRIVER, text, None)?;
        let wire: WireParse = serde_json::from_str(stdout.trim())?;
        Ok(parse_outcome_from_wire(text, wire))
    }

    fn complete(
        &mut self,
        text: &str,
        caret: usize,
    ) -> Result<Vec<CompletionCandidate>, EngineError> {
        let stdout = self.run_driver(COMPLETE_DRIVER, text, Some(caret))?;
        let wire: WireCompletions = serde_json::from_str(stdout.trim())?;
        Ok(candidates_from_wire(wire))
    }

    fn invoke(&mut self, script: &str) -> Result<InvokeOutcome, EngineError> {
        let stdout = self.run_driver(INVOKE_DRIVER, script, None)?;
        let wire: WireInvoke = serde_json::from_str(stdout.trim())?;
        Ok(InvokeOutcome::new(wire.output, wire.errors))
    }
}
