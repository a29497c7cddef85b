//! Command-line interface exporting a remote feature service into a local
//! SQLite dataset.
//!
//! ```text
//! featureport <SERVICE_URL> <OUTPUT>
//! ```
//!
//! Both values may also come from `FEATUREPORT_SERVICE_URL` /
//! `FEATUREPORT_OUTPUT` or a configuration file; positional arguments win.
#![forbid(unsafe_code)]

use std::io::Write;

use camino::Utf8PathBuf;
use clap::Parser;
use featureport_core::{DatasetWriter, Exporter, FeatureService};
use featureport_data::{HttpFeatureService, SqliteDatasetWriter};
use log::info;
use ortho_config::figment::Figment;
use ortho_config::figment::providers::Env;
use ortho_config::{
    OrthoConfig, OrthoMergeExt, OrthoResult, SubcmdConfigMerge, sanitized_provider,
};
use serde::{Deserialize, Serialize};

mod error;

pub use error::CliError;

const ARG_SERVICE_URL: &str = "service-url";
const ARG_OUTPUT: &str = "output";
const ENV_SERVICE_URL: &str = "FEATUREPORT_SERVICE_URL";
const ENV_OUTPUT: &str = "FEATUREPORT_OUTPUT";
const ENV_PREFIX: &str = "FEATUREPORT_";
const KEY_SERVICE_URL: &str = "service_url";
const KEY_OUTPUT: &str = "output";

/// Run the featureport CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let args = ExportArgs::try_parse().map_err(CliError::ArgumentParsing)?;
    let config = args.into_config()?;
    let service =
        HttpFeatureService::new(config.service_url.clone()).map_err(|source| {
            CliError::BuildClient {
                url: config.service_url.clone(),
                source,
            }
        })?;
    let mut stdout = std::io::stdout().lock();
    run_export_with(&config, &service, &SqliteDatasetWriter::new(), &mut stdout)
}

/// Export the layer at `SERVICE_URL` into a new dataset at `OUTPUT`.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "featureport",
    about = "Download every feature of a feature service into a local dataset",
    long_about = "Download every feature of an ArcGIS REST feature layer into a \
                 new SQLite dataset. The output must not exist yet and its \
                 directory must.",
    version
)]
#[ortho_config(prefix = "FEATUREPORT")]
struct ExportArgs {
    /// Feature layer endpoint, e.g. `https://host/arcgis/rest/services/X/FeatureServer/0`.
    #[arg(value_name = "SERVICE_URL")]
    #[serde(default)]
    service_url: Option<String>,
    /// Path of the dataset to create.
    #[arg(value_name = "OUTPUT")]
    #[serde(default)]
    output: Option<Utf8PathBuf>,
}

impl ExportArgs {
    fn into_config(self) -> Result<ExportConfig, CliError> {
        let merged = self.merge_sources().map_err(CliError::Configuration)?;
        ExportConfig::try_from(merged)
    }

    /// Layer, lowest precedence first: configuration files (and the
    /// `FEATUREPORT_CMDS_FEATUREPORT_*` variables ortho_config reads with
    /// them), `FEATUREPORT_SERVICE_URL` / `FEATUREPORT_OUTPUT`, then the
    /// command line.
    fn merge_sources(&self) -> OrthoResult<Self> {
        let defaults = Self::default().load_and_merge()?;
        Figment::from(sanitized_provider(&defaults)?)
            .merge(Env::prefixed(ENV_PREFIX).only(&[KEY_SERVICE_URL, KEY_OUTPUT]))
            .merge(sanitized_provider(self)?)
            .extract()
            .into_ortho_merge()
    }
}

/// Resolved export configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ExportConfig {
    service_url: String,
    output: Utf8PathBuf,
}

impl TryFrom<ExportArgs> for ExportConfig {
    type Error = CliError;

    fn try_from(args: ExportArgs) -> Result<Self, Self::Error> {
        let service_url = args
            .service_url
            .filter(|url| !url.trim().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_SERVICE_URL,
                env: ENV_SERVICE_URL,
            })?;
        let output = args
            .output
            .filter(|path| !path.as_str().is_empty())
            .ok_or(CliError::MissingArgument {
                field: ARG_OUTPUT,
                env: ENV_OUTPUT,
            })?;
        Ok(Self {
            service_url,
            output,
        })
    }
}

fn run_export_with<S, W>(
    config: &ExportConfig,
    service: &S,
    writer: &W,
    out: &mut dyn Write,
) -> Result<(), CliError>
where
    S: FeatureService,
    W: DatasetWriter,
{
    info!("exporting {} into {}", config.service_url, config.output);
    let report = Exporter::new(service, writer).export(&config.output)?;
    writeln!(out, "{}", report.path).map_err(CliError::WriteOutput)
}

#[cfg(test)]
fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ExportConfig, CliError> {
    let merged = ExportArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ExportConfig::try_from(merged)
}

#[cfg(test)]
mod tests;
