//! Error types emitted by the featureport CLI.
//!
//! Keep this error type reasonably small, as CLI helpers return
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use featureport_core::ExportError;
use featureport_data::service::ClientBuildError;
use thiserror::Error;

/// Errors emitted by the featureport CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required argument is missing after configuration merging.
    #[error("missing {field} (pass it as an argument or set {env})")]
    MissingArgument {
        field: &'static str,
        env: &'static str,
    },
    /// The feature service client could not be constructed.
    #[error("failed to connect to {url:?}: {source}")]
    BuildClient {
        url: String,
        #[source]
        source: ClientBuildError,
    },
    /// The export aborted.
    #[error(transparent)]
    Export(#[from] ExportError),
    /// Writing the dataset path to stdout failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
