//! Scenario fixtures: archive parts on disk and a scripted stand-in for the tool

use rar_reclaim::Config;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Directory layout for one scenario: parts, destination and tool script
pub struct Fixture {
    pub root: TempDir,
    pub parts_dir: PathBuf,
    pub dest_dir: PathBuf,
}

impl Fixture {
    /// Create `<base>.part1.rar` .. `<base>.part<count>.rar`, each `size` bytes
    pub fn with_parts(base: &str, count: u32, size: usize) -> Self {
        let root = TempDir::new().unwrap();
        let parts_dir = root.path().join("parts");
        let dest_dir = root.path().join("out");
        std::fs::create_dir_all(&parts_dir).unwrap();

        for n in 1..=count {
            std::fs::write(parts_dir.join(format!("{base}.part{n}.rar")), vec![7u8; size]).unwrap();
        }

        Self {
            root,
            parts_dir,
            dest_dir,
        }
    }

    pub fn part(&self, base: &str, n: u32) -> PathBuf {
        self.parts_dir.join(format!("{base}.part{n}.rar"))
    }

    pub fn exists(&self, base: &str, n: u32) -> bool {
        self.part(base, n).exists()
    }

    /// Write an executable stand-in for the archive tool.
    ///
    /// The script receives `t -y <archive>` or `x -y <archive>`. `test_body` and
    /// `extract_body` are shell snippets run for each mode; `$ARCHIVE` and
    /// `$PARTS` hold the archive path and its directory.
    pub fn write_tool(&self, test_body: &str, extract_body: &str) -> PathBuf {
        let path = self.root.path().join("fake-unrar");
        let script = format!(
            "#!/bin/sh\n\
             MODE=\"$1\"\n\
             ARCHIVE=\"$3\"\n\
             PARTS=\"$(dirname \"$ARCHIVE\")\"\n\
             if [ \"$MODE\" = \"t\" ]; then\n\
             {test_body}\n\
             fi\n\
             if [ \"$MODE\" = \"x\" ]; then\n\
             {extract_body}\n\
             fi\n\
             echo \"unexpected mode $MODE\" >&2\n\
             exit 99\n"
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    /// Config pointing at `tool` with no settle delays
    pub fn config(&self, tool: &Path) -> Config {
        let mut config = Config::default();
        config.tools.tool_path = Some(tool.to_path_buf());
        config.tools.search_path = false;
        config.extraction.delete_delay_ms = 0;
        config.extraction.final_settle_ms = 0;
        config.console.error_display_seconds = 0;
        config
    }
}

/// Test-mode body that prints a short report and exits with `code`
pub fn test_mode(code: i32) -> String {
    format!(
        "echo \"Testing archive $ARCHIVE\"\n\
         echo \"Testing     movie.mkv                 OK\"\n\
         exit {code}"
    )
}

/// Extract-mode body emitting a marker for each part in `markers`, then exiting with `code`.
///
/// Before announcing part N the script checks that part N-1 (the one it is
/// still reading) exists, and exits 42 if it was deleted too early.
pub fn extract_mode(base: &str, markers: &[u32], code: i32) -> String {
    let mut body = String::from(
        "echo \"UNRAR 6.24 freeware      Copyright (c) 1993-2023 Alexander Roshal\"\n\
         echo \"\"\n\
         echo \"Extracting from $ARCHIVE\"\n\
         echo \"payload\" > extracted.bin\n\
         echo \"Extracting  movie.mkv         10%\"\n",
    );
    let mut reading = 1;
    for &n in markers {
        body.push_str(&format!(
            "[ -f \"$PARTS/{base}.part{reading}.rar\" ] || {{ echo \"part {reading} deleted while in use\" >&2; exit 42; }}\n\
             echo \"\"\n\
             echo \"Extracting from $PARTS/{base}.part{n}.rar\"\n\
             echo \"...         movie.mkv         50%\"\n"
        ));
        reading = n;
    }
    if code == 0 {
        body.push_str("echo \"All OK\"\n");
    } else {
        body.push_str("echo \"movie.mkv - checksum error\"\necho \"ERROR: Unexpected end of archive\" >&2\n");
    }
    body.push_str(&format!("exit {code}"));
    body
}
