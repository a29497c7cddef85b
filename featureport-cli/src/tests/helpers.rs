//! Helpers composing CLI, environment and file layers for configuration tests.

use super::*;
use ortho_config::MergeComposer;
use serde_json::{Value, json};

/// Values a non-CLI layer contributes.
#[derive(Debug, Clone, Default)]
pub(super) struct LayerOverrides {
    pub(super) service_url: Option<String>,
    pub(super) output: Option<String>,
}

impl LayerOverrides {
    fn to_json(&self) -> Value {
        let mut layer = serde_json::Map::new();
        if let Some(url) = &self.service_url {
            layer.insert("service_url".to_owned(), json!(url));
        }
        if let Some(output) = &self.output {
            layer.insert("output".to_owned(), json!(output));
        }
        Value::Object(layer)
    }
}

/// Parse `cli_args` as the process arguments (binary name excluded).
pub(super) fn parse_args(cli_args: &[String]) -> Result<ExportArgs, CliError> {
    let argv = std::iter::once("featureport".to_owned()).chain(cli_args.iter().cloned());
    ExportArgs::try_parse_from(argv).map_err(CliError::ArgumentParsing)
}

/// Resolve a configuration from parsed arguments plus optional file and
/// environment layers, lowest precedence first.
pub(super) fn merge_layers(
    cli_args: &ExportArgs,
    file_layer: Option<&LayerOverrides>,
    env_layer: Option<&LayerOverrides>,
) -> Result<ExportConfig, CliError> {
    let mut composer = MergeComposer::new();
    if let Some(layer) = file_layer {
        composer.push_file(layer.to_json(), None);
    }
    if let Some(layer) = env_layer {
        composer.push_environment(layer.to_json());
    }
    composer.push_cli(cli_layer(cli_args));
    config_from_layers_for_test(composer.layers())
}

/// Serialise parsed arguments, leaving out values the user did not pass.
fn cli_layer(cli_args: &ExportArgs) -> Value {
    match serde_json::to_value(cli_args).expect("arguments serialise") {
        Value::Object(fields) => Value::Object(
            fields
                .into_iter()
                .filter(|(_, value)| !value.is_null())
                .collect(),
        ),
        other => other,
    }
}
