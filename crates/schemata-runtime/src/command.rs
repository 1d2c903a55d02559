//! Migration runner that shells out to an external migration tool.
//!
//! The scoped connection string reaches the tool through one environment
//! variable set on the child process only. The parent's environment is
//! never touched, so workers in the same process cannot race on it.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use schemata_core::config::DATABASE_URL_ENV;
use schemata_core::{MigrationError, MigrationReport, MigrationRunner, SchemaSelector, ScopedTarget};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variable overriding the migration command line.
pub const MIGRATE_CMD_ENV: &str = "SCHEMATA_MIGRATE_CMD";

/// Command line used when [`MIGRATE_CMD_ENV`] is unset.
pub const DEFAULT_MIGRATE_CMD: &str = "sqlx migrate run";

/// Lines of stderr kept for [`MigrationError::Failed`].
const STDERR_TAIL_LINES: usize = 20;

/// Runs a migration command once per schema.
///
/// Zero exit status means success. There is no timeout and no retry.
#[derive(Debug, Clone)]
pub struct CommandMigrationRunner {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
    url_env: String,
    selector: Option<SchemaSelector>,
}

impl CommandMigrationRunner {
    /// Run `program` with no arguments, passing the URL in `DATABASE_URL`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            url_env: DATABASE_URL_ENV.to_string(),
            selector: None,
        }
    }

    /// Build a runner from a whitespace-separated command line.
    ///
    /// Returns `None` for a blank line. `sqlx` is given the `search_path`
    /// selector because it ignores unknown URL parameters.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace();
        let program = parts.next()?;
        let runner = Self::new(program).args(parts);

        Some(if program == "sqlx" {
            runner.selector(SchemaSelector::SearchPath)
        } else {
            runner
        })
    }

    /// `sqlx migrate run` from the current directory.
    pub fn sqlx_cli() -> Self {
        Self::new("sqlx")
            .args(["migrate", "run"])
            .selector(SchemaSelector::SearchPath)
    }

    /// Command line from `SCHEMATA_MIGRATE_CMD`, or `sqlx migrate run`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`Self::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(MIGRATE_CMD_ENV)
            .and_then(|line| Self::parse(&line))
            .unwrap_or_else(Self::sqlx_cli)
    }

    /// Append one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Working directory for the child.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Name of the variable that carries the scoped URL.
    #[must_use]
    pub fn url_env(mut self, name: impl Into<String>) -> Self {
        self.url_env = name.into();
        self
    }

    /// Render the URL with `selector` instead of the target's own.
    #[must_use]
    pub fn selector(mut self, selector: SchemaSelector) -> Self {
        self.selector = Some(selector);
        self
    }

    /// The command line as a single string.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn scoped_url(&self, target: &ScopedTarget) -> String {
        match &self.selector {
            Some(selector) => ScopedTarget::new(
                target.base().clone(),
                target.schema().clone(),
                selector.clone(),
            )
            .url(),
            None => target.url(),
        }
    }
}

impl Default for CommandMigrationRunner {
    fn default() -> Self {
        Self::sqlx_cli()
    }
}

#[async_trait]
impl MigrationRunner for CommandMigrationRunner {
    async fn apply(&self, target: &ScopedTarget) -> Result<MigrationReport, MigrationError> {
        let started = Instant::now();
        let command_line = self.command_line();
        let schema = target.schema().to_string();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env(&self.url_env, self.scoped_url(target))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        debug!(%schema, command = %command_line, "Running migration command");

        let mut child = cmd.spawn().map_err(|e| MigrationError::Spawn {
            program: command_line.clone(),
            reason: e.to_string(),
        })?;

        let stdout = child
            .stdout
            .take()
            .map(|out| tokio::spawn(forward_lines(out, "stdout", schema.clone())));
        let stderr = child
            .stderr
            .take()
            .map(|err| tokio::spawn(forward_lines(err, "stderr", schema.clone())));

        let status = child.wait().await.map_err(|e| MigrationError::Spawn {
            program: command_line.clone(),
            reason: e.to_string(),
        })?;

        join_reader(stdout, "stdout", &schema).await;
        let stderr_tail = join_reader(stderr, "stderr", &schema).await;

        if !status.success() {
            return Err(MigrationError::Failed {
                program: command_line,
                code: status.code(),
                stderr: stderr_tail.join("\n"),
            });
        }

        debug!(%schema, "Migration command finished");
        Ok(MigrationReport::new(command_line, None, started.elapsed()))
    }
}

/// Log every line of `stream` and return the last few.
///
/// Reads until EOF whatever the bytes are. Stopping early would close the
/// pipe and kill the child with SIGPIPE on its next write.
async fn forward_lines<R>(stream: R, stream_type: &'static str, schema: String) -> Vec<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&buf)
                    .trim_end_matches(['\n', '\r'])
                    .to_string();
                debug!(%schema, "{}: {}", stream_type, text);
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(text);
            }
            Err(e) => {
                warn!(%schema, "Failed to read migration {}: {}", stream_type, e);
                break;
            }
        }
    }
    tail.into()
}

async fn join_reader(
    task: Option<JoinHandle<Vec<String>>>,
    stream_type: &'static str,
    schema: &str,
) -> Vec<String> {
    let Some(task) = task else {
        return Vec::new();
    };
    match task.await {
        Ok(tail) => tail,
        Err(e) => {
            warn!(%schema, "Migration {} reader did not finish: {}", stream_type, e);
            Vec::new()
        }
    }
}
