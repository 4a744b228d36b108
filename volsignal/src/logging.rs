use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

// [2024-01-02 14:30:00.000][INFO] message
const PATTERN: &str = "[{d(%Y-%m-%d %H:%M:%S%.3f)}][{l}] {m}{n}";

pub fn parse_level(level: &str) -> LevelFilter {
    level.parse().unwrap_or(LevelFilter::Info)
}

/// Logs to stderr and appends to `path` (parent directories are created).
pub fn configure_logger(path: &str, level: &str) -> Result<log4rs::Handle, Box<dyn std::error::Error>> {
    let level = parse_level(level);

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .build();

    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(PATTERN)))
        .append(true)
        .build(path)?;

    let config = Config::builder()
        .appender(Appender::builder().build("console", Box::new(console)))
        .appender(Appender::builder().build("file", Box::new(file)))
        .build(
            Root::builder()
                .appender("console")
                .appender("file")
                .build(level),
        )?;

    let handle = log4rs::init_config(config)?;
    Ok(handle)
}
