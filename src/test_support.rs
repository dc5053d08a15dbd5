//! A scripted stand-in for guestfish used by the unit tests.
//!
//! The fake appends every command it receives to a log file and answers
//! `inspect-os` according to its mode.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;

use tempfile::TempDir;

pub(crate) struct FakeGuestfish {
    _dir: TempDir,
    pub binary: PathBuf,
    pub log: PathBuf,
    on_inspect: String,
    exit_code: i32,
}

impl FakeGuestfish {
    /// Replies to `inspect-os` with `reply` followed by a newline.
    pub fn answering(reply: &str) -> Self {
        Self::build(format!("printf '%s\\n' '{}'", reply.replace('\'', "'\\''")))
    }

    /// Never replies to `inspect-os`, keeping stdout open.
    pub fn silent() -> Self {
        Self::build(":".to_string())
    }

    /// Exits without output when it sees `inspect-os`.
    pub fn exiting_on_inspect() -> Self {
        Self::build("exit 0".to_string())
    }

    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self.write_script();
        self
    }

    /// Commands received so far, one entry per line.
    pub fn received(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    fn build(on_inspect: String) -> Self {
        let dir = TempDir::new().unwrap();
        let fake = Self {
            binary: dir.path().join("guestfish"),
            log: dir.path().join("commands.log"),
            _dir: dir,
            on_inspect,
            exit_code: 0,
        };
        fake.write_script();
        fake
    }

    fn write_script(&self) {
        let script = format!(
            "#!/bin/sh\n\
             while IFS= read -r line; do\n\
             \tprintf '%s\\n' \"$line\" >> '{log}'\n\
             \tcase \"$line\" in\n\
             \t\tinspect-os) {on_inspect} ;;\n\
             \t\tquit) exit {code} ;;\n\
             \tesac\n\
             done\n\
             exit {code}\n",
            log = self.log.display(),
            on_inspect = self.on_inspect,
            code = self.exit_code,
        );
        fs::write(&self.binary, script).unwrap();
        fs::set_permissions(&self.binary, fs::Permissions::from_mode(0o755)).unwrap();
    }
}
