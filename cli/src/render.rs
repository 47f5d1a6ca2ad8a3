//! The `render` subcommand.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use mjml_config::BridgeConfig;
use mjml_core::{AbortHandle, BridgeError, Invoker, RenderBridge, RenderInput, RenderResponse};
use mjml_node::NodeInvoker;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::RenderArgs;

const STDIN: &str = "-";

/// One template to render and where its result goes.
struct RenderJob {
    view: RenderInput,
    output: Option<PathBuf>,
    strict: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RenderStatus {
    Rendered,
    /// The renderer reported template errors and `--strict` was given.
    Rejected,
}

impl From<RenderStatus> for ExitCode {
    fn from(status: RenderStatus) -> Self {
        match status {
            RenderStatus::Rendered => ExitCode::SUCCESS,
            RenderStatus::Rejected => ExitCode::FAILURE,
        }
    }
}

pub(crate) async fn run(args: RenderArgs) -> Result<ExitCode> {
    let config = load_config(args.config.as_deref())?;
    let source = read_input(&args.input).await?;
    let job = RenderJob {
        view: parse_view(source, args.json)?,
        output: args.output,
        strict: args.strict,
    };

    let invoker =
        NodeInvoker::with_materialize_options(config.node.clone(), &config.materialize_options())
            .context("preparing Node.js host")?;
    let bridge = RenderBridge::start(invoker, config.bridge_options())
        .await
        .context("starting MJML renderer")?;

    let status = render_job(bridge, job, ctrl_c(), &mut std::io::stderr()).await?;
    Ok(status.into())
}

/// Resolves on the first Ctrl-C. Never resolves if the handler can't be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Interrupted, abandoning render");
}

/// Render the job, shut the bridge down, then report.
///
/// The bridge is shut down on every path before the outcome is looked at.
/// Template errors go to `stderr` as `warning: ...` lines.
async fn render_job<I: Invoker>(
    bridge: RenderBridge<I>,
    job: RenderJob,
    interrupt: impl Future<Output = ()>,
    stderr: &mut impl Write,
) -> Result<RenderStatus> {
    let outcome = render_until(&bridge, job.view, interrupt).await;
    bridge.shutdown().await;

    let response = outcome.context("rendering template")?;

    for line in error_lines(&response) {
        writeln!(stderr, "{line}").context("writing to stderr")?;
    }
    write_output(job.output.as_deref(), &response.html).await?;

    if job.strict && response.has_errors() {
        return Ok(RenderStatus::Rejected);
    }
    Ok(RenderStatus::Rendered)
}

fn load_config(explicit: Option<&Path>) -> Result<BridgeConfig> {
    let Some(path) = explicit else {
        return Ok(BridgeConfig::load()?.unwrap_or_default());
    };
    match BridgeConfig::load_from(path)? {
        Some(config) => Ok(config),
        None => bail!("config file not found: {}", path.display()),
    }
}

async fn read_input(input: &Path) -> Result<String> {
    if input == Path::new(STDIN) {
        let mut source = String::new();
        tokio::io::stdin()
            .read_to_string(&mut source)
            .await
            .context("reading template from stdin")?;
        return Ok(source);
    }
    tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("reading template {}", input.display()))
}

/// JSON input is parsed here so a malformed tree never reaches Node.
fn parse_view(source: String, json: bool) -> Result<RenderInput> {
    if !json {
        return Ok(RenderInput::Markup(source));
    }
    let tree = serde_json::from_str(&source).context("parsing MJML JSON tree")?;
    Ok(RenderInput::Tree(tree))
}

/// Render `view`, aborting the call if `interrupt` resolves first.
async fn render_until<I: Invoker>(
    bridge: &RenderBridge<I>,
    view: RenderInput,
    interrupt: impl Future<Output = ()>,
) -> Result<RenderResponse, BridgeError> {
    let (handle, registration) = AbortHandle::new_pair();
    let render = bridge.render_with_cancel(view, registration);
    tokio::pin!(render);
    tokio::pin!(interrupt);

    tokio::select! {
        result = &mut render => result,
        () = &mut interrupt => {
            handle.abort();
            render.await
        }
    }
}

fn error_lines(response: &RenderResponse) -> Vec<String> {
    response
        .errors
        .iter()
        .map(|error| format!("warning: {}", error.display_line()))
        .collect()
}

async fn write_output(output: Option<&Path>, html: &str) -> Result<()> {
    match output {
        Some(path) => tokio::fs::write(path, html)
            .await
            .with_context(|| format!("writing {}", path.display())),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(html.as_bytes())
                .await
                .context("writing HTML to stdout")?;
            stdout.flush().await.context("flushing stdout")
        }
    }
}
