//! Root filesystem discovery.
//!
//! Loads the disk image, boots the libguestfs appliance and asks `inspect-os`
//! for the root device. guestfish answers with a single line; that read is the
//! only step in a session that waits on the tool, so it is bounded.

use std::path::Path;
use std::time::Duration;

use tracing::info;

use super::{quote_arg, Response, Session, SessionState};
use crate::error::{Result, TarballError};

/// Run `add-drive`, `run` and `inspect-os`, returning the trimmed device line.
///
/// A timeout or a missing answer tears the session down before returning.
pub fn discover_root(session: &mut Session, source: &Path, timeout: Duration) -> Result<String> {
    session.expect_state(SessionState::SessionOpen, "discover the root filesystem")?;

    info!("Loading {} into guestfish", source.display());
    let add_drive = format!("add-drive {}", quote_arg(&source.to_string_lossy()));
    if let Err(e) = send_all(session, &[&add_drive, "run"]) {
        return Err(session.abort(e));
    }

    info!("Finding root filesystem");
    if let Err(e) = session.send("inspect-os") {
        return Err(session.abort(e));
    }

    let device = match session.read_line_within(timeout) {
        Some(Response::Line(line)) => {
            let device = line.trim();
            if device.is_empty() {
                return Err(session.abort(TarballError::RootNotFound(
                    "guestfish returned an empty response to inspect-os".into(),
                )));
            }
            device.to_string()
        }
        Some(Response::Eof) => {
            return Err(session.abort(TarballError::RootNotFound(
                "guestfish closed its output before naming a root device".into(),
            )));
        }
        Some(Response::Failed(e)) => {
            return Err(session.abort(TarballError::RootNotFound(format!(
                "reading guestfish output: {}",
                e
            ))));
        }
        None => {
            return Err(session.abort(TarballError::MountTimeout {
                seconds: timeout.as_secs(),
            }));
        }
    };

    info!("Found root filesystem at {}", device);
    session.advance(SessionState::DeviceDiscovered);
    Ok(device)
}

fn send_all(session: &mut Session, commands: &[&str]) -> Result<()> {
    for command in commands {
        session.send(command)?;
    }
    Ok(())
}
