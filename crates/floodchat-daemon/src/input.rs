//! Local input: each line typed by the user becomes a broadcast.

use floodchat_core::CoordinatorHandle;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Submit every line from `reader` until EOF, empty ones included.
///
/// Returns the number of lines submitted. Stops early without error if the
/// coordinator has shut down.
pub async fn forward_lines<R>(reader: R, handle: CoordinatorHandle) -> std::io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut submitted = 0;

    while let Some(line) = lines.next_line().await? {
        if handle.submit(line).is_err() {
            debug!("Coordinator stopped, no longer reading input");
            break;
        }
        submitted += 1;
    }

    Ok(submitted)
}

/// Read stdin on a background task.
pub fn spawn_stdin(handle: CoordinatorHandle) -> JoinHandle<std::io::Result<usize>> {
    tokio::spawn(async move {
        let result = forward_lines(BufReader::new(tokio::io::stdin()), handle).await;
        info!("Input closed");
        result
    })
}
