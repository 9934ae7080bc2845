mod composition;
mod features;
mod shell;

use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    simple_logger::SimpleLogger::new()
        .with_colors(true)
        .with_threads(true)
        .with_local_timestamps()
        .init()?;

    let code = winhance_startup::run(composition::platform(), composition::compose);
    Ok(ExitCode::from(code))
}
