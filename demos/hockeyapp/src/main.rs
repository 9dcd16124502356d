//! HockeyApp command line
//!
//! One subcommand per endpoint of the bundled definition; every parameter,
//! defaults included, becomes a `--name <value>` option.
//!
//! ```text
//! HOCKEYAPP_TOKEN=4567abcd hockeyapp list_apps
//! hockeyapp post_apps_upload --token 4567abcd --ipa MyApp.ipa --notify testers
//! ```

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::process::ExitCode;

use clap::{Arg, ArgMatches, Command};
use rink::prelude::*;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

const DEFINITION: &str = include_str!("hockeyapp.json");
const TOKEN_VAR: &str = "HOCKEYAPP_TOKEN";

fn load<C>(client: C) -> Result<Api<C>> {
    let definition = ApiDefinition::from_json(DEFINITION.as_bytes())?;
    Api::new(definition, client)
}

fn cli<C>(api: &Api<C>) -> Command {
    let mut command = Command::new("hockeyapp")
        .about("Call the HockeyApp API")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true);

    for endpoint in api.endpoint_names().filter_map(|name| api.endpoint(name)) {
        let mut subcommand = Command::new(endpoint.name().to_string());
        if let Some(description) = endpoint.description() {
            subcommand = subcommand.about(description.to_string());
        }
        for parameter in endpoint.parameters(api.resolver()) {
            let mut help = parameter
                .definition()
                .description
                .clone()
                .unwrap_or_default();
            if parameter.required() {
                help.push_str(" (required)");
            }
            subcommand = subcommand.arg(
                Arg::new(parameter.name().to_string())
                    .long(parameter.name().to_string())
                    .value_name("VALUE")
                    .help(help.trim().to_string()),
            );
        }
        command = command.subcommand(subcommand);
    }
    command
}

/// Supplied options as call parameters; the token falls back to the environment.
fn collect_params(matches: &ArgMatches, token: Option<String>) -> Params {
    let mut params: Params = matches
        .ids()
        .filter_map(|id| {
            matches
                .get_one::<String>(id.as_str())
                .map(|value| (id.to_string(), Value::String(value.clone())))
        })
        .collect();

    if let Some(token) = token
        && !params.contains_key("token")
    {
        params.insert("token".to_string(), Value::String(token));
    }
    params
}

async fn run() -> Result<Value> {
    let client = HyperClient::builder()
        .user_agent(concat!("hockeyapp-cli/", env!("CARGO_PKG_VERSION")))
        .with_logging()
        .build();
    let api = load(client)?;

    let matches = cli(&api).get_matches();
    let Some((endpoint, sub_matches)) = matches.subcommand() else {
        return Err(Error::invalid_request("no endpoint given"));
    };
    let params = collect_params(sub_matches, std::env::var(TOKEN_VAR).ok());

    api.call(endpoint, params).await
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run().await {
        Ok(result) => {
            match serde_json::to_string_pretty(&result) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{result}"),
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            if let Some(Ok(body)) = err.decode_body::<Value>() {
                eprintln!("{body:#}");
            }
            ExitCode::FAILURE
        }
    }
}
