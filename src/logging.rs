use anyhow::Result;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global `tracing` subscriber.
///
/// `pretty` switches from single-line to multi-line output.
pub fn init_logging(level: Level, pretty: bool) -> Result<()> {
    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_line_number(true)
        .with_file(true)
        .with_target(false);

    if pretty {
        tracing::subscriber::set_global_default(builder.pretty().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.compact().finish())?;
    }
    Ok(())
}
