use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging based on output mode and debug flag
pub fn init_logging(debug: bool, quiet: bool, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let env_filter = if debug {
        EnvFilter::new("chat_wait=debug,chatwait=debug")
    } else if quiet {
        EnvFilter::new("chat_wait=error,chatwait=error")
    } else {
        EnvFilter::new("chat_wait=info,chatwait=info")
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(debug)
        .with_file(debug)
        .with_writer(std::io::stderr);

    if let Some(log_path) = log_file {
        let dir = log_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name = log_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("log path has no file name: {}", log_path.display()))?;

        std::fs::create_dir_all(&dir)?;
        let appender = tracing_appender::rolling::never(&dir, file_name);

        let file_layer = fmt::layer()
            .with_ansi(false)
            .with_writer(appender)
            .with_target(true)
            .with_line_number(true)
            .with_file(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }

    Ok(())
}

/// Default log file path for a demo session
pub fn default_log_path(session: i64) -> anyhow::Result<PathBuf> {
    let log_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("chatwait")
        .join("logs");

    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let filename = format!("session-{}-{}.log", session, timestamp);

    Ok(log_dir.join(filename))
}
