//! Archive emission: `tar-out` the mounted tree, then `quit`.

use std::path::Path;

use tracing::info;

use super::{quote_arg, Session, SessionState};
use crate::error::Result;

pub fn tar_out_command(output: &Path, compression: &str) -> String {
    format!(
        "tar-out / {} compress:{}",
        quote_arg(&output.to_string_lossy()),
        compression
    )
}

/// Stream `/` into `output` and end the session. Nothing is read back; the
/// outcome is only visible through the exit status checked by
/// [`Session::close`].
pub fn emit(session: &mut Session, output: &Path, compression: &str) -> Result<()> {
    session.expect_state(SessionState::Prepared, "emit the archive")?;

    info!("Packing filesystem into tarball {}", output.display());
    let tar_out = tar_out_command(output, compression);
    for command in [tar_out.as_str(), "quit"] {
        if let Err(e) = session.send(command) {
            return Err(session.abort(e));
        }
    }

    session.advance(SessionState::Emitted);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TarballError;
    use crate::test_support::FakeGuestfish;

    #[test]
    fn test_tar_out_command() {
        assert_eq!(
            tar_out_command(Path::new("/out/disk.img.tar.gz"), "gz"),
            "tar-out / /out/disk.img.tar.gz compress:gz"
        );
        assert_eq!(
            tar_out_command(Path::new("/out dir/a.tar.xz"), "xz"),
            "tar-out / \"/out dir/a.tar.xz\" compress:xz"
        );
    }

    #[test]
    fn test_emit_requires_prepared_session() {
        let fake = FakeGuestfish::answering("/dev/sda1");
        let mut session = Session::open(&fake.binary).unwrap();

        let err = emit(&mut session, Path::new("/out/a.tar.gz"), "gz").unwrap_err();
        assert!(matches!(
            err,
            TarballError::OutOfOrder {
                state: SessionState::SessionOpen,
                ..
            }
        ));
    }
}
