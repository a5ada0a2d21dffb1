use crate::cli::OutputFormatter;
use crate::error::{ClinicError, Result};
use crate::service::ClinicContext;

/// Run the HTTP API until Ctrl-C
#[cfg(feature = "api")]
pub async fn handle_serve(
    host: Option<String>,
    port: Option<u16>,
    context: ClinicContext,
    output: &OutputFormatter,
) -> Result<()> {
    let host = host.unwrap_or_else(|| context.config.server.host.clone());
    let port = port.unwrap_or(context.config.server.port);

    let addr = tokio::net::lookup_host((host.as_str(), port))
        .await?
        .next()
        .ok_or_else(|| ClinicError::custom(format!("Could not resolve {host}:{port}")))?;

    output.info(&format!(
        "Serving {} on http://{addr} (Ctrl-C to stop)",
        context.config.clinic.name
    ));
    crate::api::serve(context, addr)
        .await
        .map_err(|e| ClinicError::custom(format!("{e:#}")))
}

#[cfg(not(feature = "api"))]
pub async fn handle_serve(
    _host: Option<String>,
    _port: Option<u16>,
    _context: ClinicContext,
    _output: &OutputFormatter,
) -> Result<()> {
    Err(ClinicError::custom(
        "The HTTP server requires building with the `api` feature",
    ))
}
