//! Mount the discovered root and create the device nodes a container or VM
//! root needs. guestfish does not create these on its own.

use tracing::info;

use super::{quote_arg, Session, SessionState};
use crate::error::Result;

/// guestfish commands creating character devices and runtime directories.
pub const DEVICE_BATCH: &str = "\
mknod-c 0444 1 8 /dev/random
mknod-c 0444 1 9 /dev/urandom
mknod-c 0666 5 0 /dev/tty
mknod-c 0600 5 1 /dev/console
mknod-c 0666 5 2 /dev/ptmx
mknod-c 0666 1 5 /dev/zero
mknod-c 0666 1 3 /dev/null
mkdir-mode /dev/pts 0755
mkdir-mode /dev/shm 0755
";

/// Send `mount <device> /` followed by [`DEVICE_BATCH`] as one write.
pub fn prepare(session: &mut Session, device: &str) -> Result<()> {
    session.expect_state(SessionState::DeviceDiscovered, "prepare the root filesystem")?;

    info!("Mounting {} to /", device);
    if let Err(e) = session.send(&format!("mount {} /", quote_arg(device))) {
        return Err(session.abort(e));
    }

    info!("Creating character devices");
    if let Err(e) = session.send_batch(DEVICE_BATCH) {
        return Err(session.abort(e));
    }

    session.advance(SessionState::Prepared);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TarballError;
    use crate::session::discover_root;
    use crate::test_support::FakeGuestfish;
    use std::path::Path;
    use std::time::Duration;

    #[test]
    fn test_batch_is_newline_terminated() {
        assert!(DEVICE_BATCH.ends_with('\n'));
        assert_eq!(DEVICE_BATCH.lines().count(), 9);
        assert!(DEVICE_BATCH
            .lines()
            .all(|l| l.starts_with("mknod-c ") || l.starts_with("mkdir-mode ")));
    }

    #[test]
    fn test_prepare_requires_discovered_device() {
        let fake = FakeGuestfish::answering("/dev/sda1");
        let mut session = Session::open(&fake.binary).unwrap();

        let err = prepare(&mut session, "/dev/sda1").unwrap_err();
        assert!(matches!(err, TarballError::OutOfOrder { .. }));
        assert_eq!(session.state(), SessionState::SessionOpen);
    }

    #[test]
    fn test_prepare_sends_mount_then_batch() {
        let fake = FakeGuestfish::answering("/dev/sda1");
        let mut session = Session::open(&fake.binary).unwrap();
        let device = discover_root(&mut session, Path::new("disk.img"), Duration::from_secs(10))
            .unwrap();
        prepare(&mut session, &device).unwrap();
        session.send("quit").unwrap();
        session.advance(SessionState::Emitted);
        session.close().unwrap();

        let received = fake.received();
        let mut expected = vec!["add-drive disk.img", "run", "inspect-os", "mount /dev/sda1 /"];
        expected.extend(DEVICE_BATCH.lines());
        expected.push("quit");
        assert_eq!(received, expected);
    }
}
