//! Timestamped log records to a size-rotated file; warnings also go to stderr.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use env_logger::{Builder, Env, Logger, Target};
use log::{LevelFilter, Log, Metadata, Record};

/// Size at which the log file is rolled over.
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
/// Number of rolled files kept, `.1` being the most recent.
pub const KEPT_LOGS: usize = 5;

///
/// Append-only log file rolled to `{path}.1` … `{path}.5` once it grows past
/// [`MAX_LOG_BYTES`].
///
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    written: u64,
    max_bytes: u64,
}

impl RotatingFile {
    pub fn open(path: &Path, max_bytes: u64) -> io::Result<RotatingFile> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(RotatingFile {
            path: path.to_path_buf(),
            file,
            written,
            max_bytes,
        })
    }

    fn rolled(&self, n: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{n}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        for n in (1..KEPT_LOGS).rev() {
            let from = self.rolled(n);
            if from.exists() {
                fs::rename(&from, self.rolled(n + 1))?;
            }
        }
        fs::rename(&self.path, self.rolled(1))?;
        self.file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

///
/// File logger plus a stderr logger that only lets warnings and errors through.
///
pub struct Tee {
    file: Logger,
    console: Logger,
}

impl Tee {
    pub fn new(mut file: Builder, file_target: Target, console_target: Target) -> Tee {
        let file = file
            .format(|buf, record| {
                writeln!(
                    buf,
                    "{} [{}] {} - {}",
                    Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    record.level(),
                    record.target(),
                    record.args()
                )
            })
            .target(file_target)
            .build();
        let console = Builder::new()
            .filter_level(LevelFilter::Warn)
            .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
            .target(console_target)
            .build();
        Tee { file, console }
    }

    pub fn max_level(&self) -> LevelFilter {
        self.file.filter().max(self.console.filter())
    }
}

impl Log for Tee {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.file.enabled(metadata) || self.console.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        self.file.log(record);
        self.console.log(record);
    }

    fn flush(&self) {
        self.file.flush();
        self.console.flush();
    }
}

///
/// Route the `log` facade to `path` and warnings to stderr. `RUST_LOG`
/// overrides the default `debug` level of the file.
///
pub fn init_logging(path: &Path) -> Result<()> {
    let file = RotatingFile::open(path, MAX_LOG_BYTES)
        .with_context(|| format!("Could not open log file {}", path.display()))?;

    let tee = Tee::new(
        Builder::from_env(Env::default().default_filter_or("debug")),
        Target::Pipe(Box::new(file)),
        Target::Stderr,
    );
    let max_level = tee.max_level();
    log::set_boxed_logger(Box::new(tee)).context("Logger already initialised")?;
    log::set_max_level(max_level);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use std::sync::{Arc, Mutex};

    #[rstest]
    fn rolls_over_and_keeps_five() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngsflow.log");
        let mut log = RotatingFile::open(&path, 10).unwrap();

        for i in 0..8 {
            log.write_all(format!("line {i:03}\n").as_bytes()).unwrap();
        }
        log.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 007\n");
        assert_eq!(fs::read_to_string(dir.path().join("ngsflow.log.1")).unwrap(), "line 006\n");
        assert_eq!(fs::read_to_string(dir.path().join("ngsflow.log.5")).unwrap(), "line 002\n");
        assert!(!dir.path().join("ngsflow.log.6").exists());
    }

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Shared {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn warnings_reach_both_outputs() {
        let file = Shared::default();
        let console = Shared::default();
        let mut builder = Builder::new();
        builder.parse_filters("debug");
        let tee = Tee::new(
            builder,
            Target::Pipe(Box::new(file.clone())),
            Target::Pipe(Box::new(console.clone())),
        );

        tee.log(&Record::builder().level(Level::Info).args(format_args!("sorted s.bed")).build());
        tee.log(&Record::builder().level(Level::Warn).args(format_args!("no output for s-100-110")).build());
        tee.log(&Record::builder().level(Level::Trace).args(format_args!("hidden")).build());
        tee.flush();

        let file = file.text();
        assert!(file.contains("[INFO]") && file.contains("sorted s.bed"));
        assert!(file.contains("no output for s-100-110"));
        assert!(!file.contains("hidden"));
        assert_eq!(console.text(), "[WARN] no output for s-100-110\n");
        assert_eq!(tee.max_level(), LevelFilter::Debug);
    }

    #[rstest]
    fn appends_to_an_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ngsflow.log");
        fs::write(&path, "old\n").unwrap();
        let mut log = RotatingFile::open(&path, 1024).unwrap();
        log.write_all(b"new\n").unwrap();
        log.flush().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }
}
