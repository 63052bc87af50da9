// File logger and panic hook. Stdout belongs to the terminal UI, so nothing
// is ever logged there.
use crate::context::AppContext;
use anyhow::{Context, Result};
use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};
use std::fs::OpenOptions;

pub fn init(ctx: &dyn AppContext, level: LevelFilter) -> Result<()> {
    let path = ctx.log_file()?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {:?}", path))?;

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .add_filter_allow_str("gcal_tui")
        .build();
    WriteLogger::init(level, config, file).context("Logger already initialised")?;

    install_panic_hook(ctx);
    log::info!("gcal-tui v{} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Writes panics to the log and to a dedicated panic file before the
/// default hook runs.
fn install_panic_hook(ctx: &dyn AppContext) {
    let panic_path = ctx.panic_log_file().ok();
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        use std::io::Write;
        log::error!("PANIC: {}", info);
        if let Some(path) = &panic_path
            && let Ok(mut file) = OpenOptions::new().create(true).append(true).open(path)
        {
            let _ = writeln!(file, "PANIC: {:?}", info);
        }
        default_hook(info);
    }));
}
