// Copyright 2025 RISC Zero, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{path::PathBuf, time::Duration};

use chainspec::{ActiveSpec, SpecConfig};
use clap::{ArgAction, Parser};
use fixture_generator::{Error, FixturePipeline, PipelineConfig, protocol_client};
use tracing::{error, info};

/// CLI for generating beacon client test fixtures.
///
/// Failures are logged, the process still exits with status 0.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Beacon preset of the node
    #[clap(long, global = true, value_enum)]
    spec: Option<ActiveSpec>,

    /// Beacon API URL
    #[clap(
        long,
        global = true,
        env = "BEACON_RPC_URL",
        default_value = "http://127.0.0.1:9596"
    )]
    url: String,

    /// Root of the project the fixtures are written into
    #[clap(long, global = true, default_value = ".")]
    project_root: PathBuf,

    /// Optional YAML or JSON file overriding the preset settings
    #[clap(long, global = true)]
    spec_config: Option<PathBuf>,

    /// Seconds to wait for the chain to advance between checkpoint and updates
    #[clap(long, global = true)]
    wait_secs: Option<u64>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Generates the checkpoint, update and execution header fixtures, plus
    /// the benchmark module on mainnet
    #[clap(name = "generate-beacon-data")]
    GenerateBeaconData,
    /// Prints the initial checkpoint as an encoded `force_checkpoint` call
    #[clap(name = "generate-beacon-checkpoint")]
    GenerateBeaconCheckpoint {
        /// Also write the checkpoint as a JSON fixture
        #[clap(long, default_value_t = true, action = ArgAction::Set)]
        export_json: bool,
    },
}

fn pipeline_config(args: &Args) -> Result<PipelineConfig, Error> {
    let spec = args.spec.ok_or(chainspec::Error::MissingSpec)?;
    let spec_config = match &args.spec_config {
        Some(path) => SpecConfig::from_file(path)?,
        None => SpecConfig::default(),
    };

    let mut config = PipelineConfig::new(spec, spec_config.settings(spec), &args.project_root);
    if let Some(secs) = args.wait_secs {
        config = config.with_chain_advance_wait(Duration::from_secs(secs));
    }
    Ok(config)
}

fn run(args: Args) -> Result<(), Error> {
    let config = pipeline_config(&args)?;
    info!(spec = %config.spec, endpoint = %args.url, "Generating fixtures");

    let client =
        protocol_client(config.spec, &args.url, config.settings).map_err(Error::Endpoint)?;

    match args.command {
        Command::GenerateBeaconData => {
            let pipeline = FixturePipeline::new(client, config);
            let generated = tokio::task::block_in_place(|| pipeline.generate_beacon_data())?;
            info!(
                checkpoint = %generated.checkpoint.display(),
                sync_committee_update = %generated.sync_committee_update.display(),
                finalized_header_update = %generated.finalized_header_update.display(),
                execution_header_update = %generated.execution_header_update.display(),
                benchmark = ?generated.benchmark,
                "Done"
            );
        }
        Command::GenerateBeaconCheckpoint { export_json } => {
            let pipeline =
                FixturePipeline::new(client, config.with_export_checkpoint_json(export_json));
            let call = tokio::task::block_in_place(|| pipeline.generate_checkpoint())?;
            println!("{call}");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing. In order to view logs, run `RUST_LOG=info cargo run`
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .init();
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) if !err.use_stderr() => err.exit(),
        Err(err) => {
            error!("Invalid arguments: {err}");
            return Ok(());
        }
    };
    let command = format!("{:?}", args.command);
    let spec = args.spec.map_or("unset", |spec| spec.as_str());

    if let Err(err) = run(args) {
        error!(
            command = %command,
            spec = %spec,
            stage = ?err.stage(),
            "Fixture generation failed: {err}"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spec_as_value_enum() {
        let args = Args::try_parse_from([
            "beacon_fixtures",
            "generate-beacon-data",
            "--spec",
            "minimal",
        ])
        .unwrap();
        assert_eq!(args.spec, Some(ActiveSpec::Minimal));

        let err = Args::try_parse_from([
            "beacon_fixtures",
            "--spec",
            "sepolia",
            "generate-beacon-data",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::InvalidValue);
    }

    #[test]
    fn missing_spec_is_a_config_error() {
        let args = Args::try_parse_from(["beacon_fixtures", "generate-beacon-data"]).unwrap();
        assert!(matches!(
            pipeline_config(&args),
            Err(Error::Config(chainspec::Error::MissingSpec))
        ));
    }

    #[test]
    fn wait_defaults_to_preset_slot_time() {
        let args = Args::try_parse_from([
            "beacon_fixtures",
            "--spec",
            "mainnet",
            "generate-beacon-checkpoint",
            "--export-json",
            "false",
        ])
        .unwrap();
        let config = pipeline_config(&args).unwrap();
        assert_eq!(config.spec, ActiveSpec::Mainnet);
        assert_eq!(config.chain_advance_wait, Duration::from_secs(60));
        assert!(matches!(
            args.command,
            Command::GenerateBeaconCheckpoint { export_json: false }
        ));

        let args = Args::try_parse_from([
            "beacon_fixtures",
            "generate-beacon-data",
            "--spec",
            "mainnet",
            "--wait-secs",
            "0",
        ])
        .unwrap();
        assert!(pipeline_config(&args).unwrap().chain_advance_wait.is_zero());
    }
}
