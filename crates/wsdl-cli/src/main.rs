//! wsdl2rest command-line interface.
//!
//! Three subcommands over one pipeline:
//!
//! - `generate` - emit a native Rust SOAP client module from a WSDL,
//! - `export` - emit an OpenAPI 3.0 document, optionally with a
//!   TypeScript client bundle,
//! - `serve` - run the REST-to-SOAP bridge against the live endpoint.
//!
//! # Examples
//!
//! ```bash
//! # Generate a Rust client from a remote WSDL
//! wsdl2rest generate --wsdl http://example.com/calc.asmx?WSDL --output ./calc
//!
//! # Export the OpenAPI document to stdout
//! wsdl2rest export --wsdl ./calculator.wsdl
//!
//! # Bridge REST calls to the SOAP backend with digest authentication
//! wsdl2rest serve --wsdl ./calculator.wsdl --port 8080 \
//!     --username alice --password secret --digest
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use wsdl2rest_bridge::{BridgeOptions, BridgeState};
use wsdl2rest_codegen::{EmitterOptions, openapi, rust_client, typescript};
use wsdl2rest_core::{GenerationContext, ServiceDefinition};
use wsdl2rest_soap::{SecurityCredential, SoapVersion};

/// wsdl2rest - project WSDL/SOAP services into REST-era artifacts.
#[derive(Parser, Debug)]
#[command(name = "wsdl2rest")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a native Rust SOAP client module.
    Generate {
        /// WSDL source: file path or HTTP(S) URL
        #[arg(long)]
        wsdl: String,

        /// Output directory for the generated module
        #[arg(long, default_value = "generated")]
        output: PathBuf,

        /// Module name written into the generated files
        #[arg(long, default_value = "client")]
        module: String,

        /// SOAP version the generated client defaults to (1.1 or 1.2)
        #[arg(long, default_value = "1.1")]
        soap_version: String,
    },

    /// Export an OpenAPI 3.0 document, optionally with a TypeScript client.
    Export {
        /// WSDL source: file path or HTTP(S) URL
        #[arg(long)]
        wsdl: String,

        /// Output file for the OpenAPI JSON, `-` for stdout
        #[arg(long, default_value = "-")]
        output: String,

        /// Also emit the TypeScript client bundle
        #[arg(long)]
        typescript: bool,

        /// Output directory for the TypeScript bundle
        #[arg(long, default_value = "ts-client")]
        ts_output: PathBuf,
    },

    /// Run the REST-to-SOAP bridge.
    Serve {
        /// WSDL source: file path or HTTP(S) URL
        #[arg(long)]
        wsdl: String,

        /// Bind address
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Bind port
        #[arg(long, default_value_t = 8080)]
        port: u16,

        /// SOAP version for upstream calls (1.1 or 1.2)
        #[arg(long, default_value = "1.1")]
        soap_version: String,

        /// Overrides the endpoint address from the WSDL
        #[arg(long)]
        endpoint: Option<String>,

        /// WS-Security username
        #[arg(long)]
        username: Option<String>,

        /// WS-Security password
        #[arg(long)]
        password: Option<String>,

        /// Send the password as a digest instead of plaintext
        #[arg(long)]
        digest: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli.command).await
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn execute(command: Commands) -> Result<()> {
    match command {
        Commands::Generate {
            wsdl,
            output,
            module,
            soap_version,
        } => {
            let definition = load_definition(&wsdl).await?;
            let ctx = GenerationContext::for_definition(&definition);
            let report = definition.validate(&ctx);
            if !report.is_clean() {
                tracing::warn!(
                    unmatched = report.unmatched_binding_operations.len(),
                    unresolved = report.unresolved_references.len(),
                    "definition has dangling references; degraded entities are skipped"
                );
            }

            let options = EmitterOptions {
                module_name: module,
                soap_version: parse_version(&soap_version)?,
            };
            let bundle = rust_client::emit(&definition, &ctx, &options)?;
            bundle.write_to(&output)?;
            println!(
                "generated {} files in {}",
                bundle.file_count(),
                output.display()
            );
            print_counters(&ctx);
            Ok(())
        }

        Commands::Export {
            wsdl,
            output,
            typescript,
            ts_output,
        } => {
            let definition = load_definition(&wsdl).await?;
            let ctx = GenerationContext::for_definition(&definition);
            definition.validate(&ctx);

            let bundle = openapi::emit(&definition, &ctx)?;
            let document = &bundle
                .find("openapi.json")
                .context("OpenAPI bundle is missing openapi.json")?
                .content;
            if output == "-" {
                println!("{document}");
            } else {
                std::fs::write(&output, document)
                    .with_context(|| format!("failed to write {output}"))?;
                println!("wrote OpenAPI document to {output}");
            }

            if typescript {
                let ts_bundle = typescript::emit(&definition, &ctx)?;
                ts_bundle.write_to(&ts_output)?;
                println!(
                    "generated {} TypeScript files in {}",
                    ts_bundle.file_count(),
                    ts_output.display()
                );
            }
            print_counters(&ctx);
            Ok(())
        }

        Commands::Serve {
            wsdl,
            host,
            port,
            soap_version,
            endpoint,
            username,
            password,
            digest,
        } => {
            let definition = load_definition(&wsdl).await?;
            let credential = match (username, password) {
                (Some(username), Some(password)) if digest => {
                    Some(SecurityCredential::digest(username, password))
                }
                (Some(username), Some(password)) => {
                    Some(SecurityCredential::plaintext(username, password))
                }
                (None, None) => None,
                _ => anyhow::bail!("--username and --password must be given together"),
            };

            let state = BridgeState::new(
                definition,
                BridgeOptions {
                    soap_version: Some(parse_version(&soap_version)?),
                    endpoint,
                    credential,
                },
            );
            wsdl2rest_bridge::serve(Arc::new(state), &host, port).await?;
            Ok(())
        }
    }
}

async fn load_definition(wsdl: &str) -> Result<ServiceDefinition> {
    let xml = wsdl2rest_parser::load(wsdl)
        .await
        .with_context(|| format!("failed to load WSDL from {wsdl}"))?;
    let definition =
        wsdl2rest_parser::build(&xml).with_context(|| format!("failed to parse WSDL {wsdl}"))?;
    tracing::info!(
        service = %definition.name,
        operations = definition.operations().count(),
        "WSDL loaded"
    );
    Ok(definition)
}

fn parse_version(raw: &str) -> Result<SoapVersion> {
    raw.parse()
        .map_err(|_| anyhow::anyhow!("unsupported SOAP version: {raw} (expected 1.1 or 1.2)"))
}

/// Prints the degradation counters collected during the run.
fn print_counters(ctx: &GenerationContext) {
    if ctx.projection_warnings() > 0 || ctx.unresolved_references() > 0 {
        println!(
            "warnings: {} unknown type projections, {} unresolved references",
            ctx.projection_warnings(),
            ctx.unresolved_references()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_generate() {
        let cli = Cli::parse_from([
            "wsdl2rest",
            "generate",
            "--wsdl",
            "service.wsdl",
            "--output",
            "/tmp/out",
            "--module",
            "calc",
        ]);
        match cli.command {
            Commands::Generate {
                wsdl,
                output,
                module,
                soap_version,
            } => {
                assert_eq!(wsdl, "service.wsdl");
                assert_eq!(output, PathBuf::from("/tmp/out"));
                assert_eq!(module, "calc");
                assert_eq!(soap_version, "1.1");
            }
            other => panic!("expected Generate, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_export_defaults_to_stdout() {
        let cli = Cli::parse_from(["wsdl2rest", "export", "--wsdl", "service.wsdl"]);
        match cli.command {
            Commands::Export {
                output, typescript, ..
            } => {
                assert_eq!(output, "-");
                assert!(!typescript);
            }
            other => panic!("expected Export, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_export_with_typescript() {
        let cli = Cli::parse_from([
            "wsdl2rest",
            "export",
            "--wsdl",
            "service.wsdl",
            "--typescript",
            "--ts-output",
            "/tmp/ts",
        ]);
        match cli.command {
            Commands::Export {
                typescript,
                ts_output,
                ..
            } => {
                assert!(typescript);
                assert_eq!(ts_output, PathBuf::from("/tmp/ts"));
            }
            other => panic!("expected Export, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_with_credentials() {
        let cli = Cli::parse_from([
            "wsdl2rest",
            "serve",
            "--wsdl",
            "service.wsdl",
            "--port",
            "9000",
            "--soap-version",
            "1.2",
            "--username",
            "alice",
            "--password",
            "secret",
            "--digest",
        ]);
        match cli.command {
            Commands::Serve {
                port,
                soap_version,
                username,
                digest,
                ..
            } => {
                assert_eq!(port, 9000);
                assert_eq!(soap_version, "1.2");
                assert_eq!(username.as_deref(), Some("alice"));
                assert!(digest);
            }
            other => panic!("expected Serve, got {other:?}"),
        }
    }

    #[test]
    fn test_verbose_flag_is_global() {
        let cli = Cli::parse_from(["wsdl2rest", "export", "--wsdl", "x", "--verbose"]);
        assert!(cli.verbose);
    }

    #[test]
    fn test_parse_version_values() {
        assert_eq!(parse_version("1.1").unwrap(), SoapVersion::V11);
        assert_eq!(parse_version("1.2").unwrap(), SoapVersion::V12);
        assert!(parse_version("2.0").is_err());
    }
}
