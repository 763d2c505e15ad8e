//! services/study/src/driver/mod.rs
//!
//! The control loop for an interactive study session: read a command per
//! line, apply it, write the resulting events.

pub mod controller;
pub mod protocol;

pub use controller::StudyController;
pub use protocol::{parse_command, Command, Event};

use crate::error::ClientError;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info};

/// How events are written to the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    /// One JSON object per line.
    Json,
}

pub async fn write_events<W>(
    output: &mut W,
    events: &[Event],
    format: OutputFormat,
) -> Result<(), ClientError>
where
    W: AsyncWrite + Unpin,
{
    for event in events {
        let mut line = match format {
            OutputFormat::Text => event.render_text(),
            OutputFormat::Json => serde_json::to_string(event)?,
        };
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
    }
    output.flush().await?;
    Ok(())
}

/// Runs commands from `input` until the session ends or the input is exhausted.
///
/// Review submissions still in flight are awaited before returning, so a
/// finished session never loses its last ratings to process exit.
pub async fn run_session<R, W>(
    controller: &mut StudyController,
    input: R,
    output: &mut W,
    format: OutputFormat,
) -> Result<(), ClientError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    while controller.is_active() {
        let Some(line) = lines.next_line().await? else {
            debug!("Input closed");
            break;
        };

        let events = match parse_command(&line) {
            Ok(command) => controller.handle(command),
            Err(message) => vec![Event::Error { message }],
        };
        write_events(output, &events, format).await?;
    }

    if controller.is_active() {
        let events = controller.handle(Command::Quit);
        write_events(output, &events, format).await?;
    }

    controller.drain().await;
    info!("Study loop finished");
    Ok(())
}
