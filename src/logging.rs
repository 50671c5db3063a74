use env_logger::{Builder, Env, Target};
use log::LevelFilter;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use crate::config::project_dirs;

pub const LOG_FILE_NAME: &str = "mathmemo.log";

/// Where log records go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogSink {
    /// Appended to a file; the terminal belongs to the UI.
    File(PathBuf),
    Stderr,
}

/// `mathmemo.log` in the platform cache directory.
pub fn default_log_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.cache_dir().join(LOG_FILE_NAME))
}

pub fn init_logger(sink: LogSink) {
    let mut builder = Builder::from_env(Env::default().default_filter_or("mathmemo=info"));
    builder.filter_module("wry", LevelFilter::Warn);
    builder.filter_module("tao", LevelFilter::Warn);

    builder.format(|buf, record| {
        let module_path = record.module_path().unwrap_or("<unknown>");
        writeln!(
            buf,
            "[{}][{}][{}] {}",
            buf.timestamp_millis(),
            record.level(),
            module_path,
            record.args()
        )
    });

    match sink {
        LogSink::File(path) => match open_log_file(&path) {
            Ok(file) => {
                builder.target(Target::Pipe(Box::new(file)));
            }
            Err(err) => {
                eprintln!("Cannot open log file {}: {}", path.display(), err);
                builder.filter_level(LevelFilter::Off);
            }
        },
        LogSink::Stderr => {
            builder.target(Target::Stderr);
        }
    }

    let _ = builder.try_init();
}

fn open_log_file(path: &PathBuf) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::options().create(true).append(true).open(path)
}
