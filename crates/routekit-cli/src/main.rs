//! RouteKit CLI
//!
//! Command-line interface for inspecting routing cache keys, route values
//! and URI constraints

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::CliConfig;
use routekit_core::{CacheableValue, ParameterStore, TagSet};
use routekit_routing::{
    ActionIdentity, ActionUriSpecification, RequestHead, RouteValues, RoutingContext, Uri,
    UriConstraintSet, query,
};
use serde_json::json;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "routekit")]
#[command(about = "RouteKit - Route matching cache keys and URI resolution", long_about = None)]
struct Cli {
    /// Path to a YAML or TOML configuration file
    #[arg(long, global = true, env = "ROUTEKIT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the routing context fingerprint of a request
    Fingerprint {
        #[arg(long)]
        host: String,

        #[arg(long, default_value = "/")]
        path: String,

        #[arg(long, default_value = "GET")]
        method: String,

        /// Routing parameter as key=value, repeatable
        #[arg(long = "param", value_parser = parse_key_value)]
        params: Vec<(String, String)>,
    },
    /// Print the route values of an action
    RouteValues {
        #[arg(long)]
        package: String,

        #[arg(long)]
        controller: String,

        #[arg(long)]
        action: String,

        #[arg(long)]
        subpackage: Option<String>,

        #[arg(long, default_value = "")]
        format: String,

        /// Routing argument as key=value, repeatable
        #[arg(long = "arg", value_parser = parse_key_value)]
        arguments: Vec<(String, String)>,

        /// Query parameter as key=value, repeatable
        #[arg(long = "query", value_parser = parse_key_value)]
        query_parameters: Vec<(String, String)>,

        /// Merge the query parameters into this URI
        #[arg(long)]
        uri: Option<String>,
    },
    /// Apply URI constraints to a candidate URI
    Apply {
        /// URI of the current request
        #[arg(long)]
        request_uri: String,

        /// Resolved URI to constrain
        #[arg(long)]
        candidate: String,

        /// Constraint preset from the configuration file
        #[arg(long)]
        preset: Option<String>,

        #[arg(long)]
        scheme: Option<String>,

        #[arg(long)]
        host: Option<String>,

        #[arg(long)]
        sub_domain: Option<String>,

        #[arg(long)]
        top_level_domain: Option<String>,

        #[arg(long)]
        port: Option<u16>,

        /// Always produce an absolute URI
        #[arg(long, default_value = "false")]
        absolute: bool,
    },
    /// Print the cache tags of a URI path
    PathTags {
        path: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => CliConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CliConfig::default(),
    };
    config.merge_env();

    let log_level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let filter = EnvFilter::new(log_level.to_string());
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let output = match cli.command {
        Commands::Fingerprint {
            host,
            path,
            method,
            params,
        } => {
            let request = RequestHead::parse(&method, &fingerprint_uri(&host, &path))?;
            let parameters: ParameterStore = params
                .into_iter()
                .map(|(k, v)| (k, CacheableValue::from(v)))
                .collect();
            let context = RoutingContext::from_request(request, parameters);
            json!({
                "fingerprint": context.fingerprint(),
                "parameters": context.parameters().fingerprint(),
            })
        }
        Commands::RouteValues {
            package,
            controller,
            action,
            subpackage,
            format,
            arguments,
            query_parameters,
            uri,
        } => {
            let identity = ActionIdentity::create(package, controller, action)
                .with_subpackage(subpackage)
                .with_format(format)
                .with_routing_arguments(to_route_values(arguments))
                .with_query_parameters(query::from_values(&to_route_values(query_parameters)));

            let mut output = json!({ "routeValues": identity.to_route_values() });
            if let Some(uri) = uri {
                let merged = identity.merge_query_parameters_into_uri(Uri::parse(&uri)?);
                output["uri"] = json!(merged.to_string());
            }
            output
        }
        Commands::Apply {
            request_uri,
            candidate,
            preset,
            scheme,
            host,
            sub_domain,
            top_level_domain,
            port,
            absolute,
        } => {
            let base = match preset {
                Some(name) => config.constraint_preset(&name)?.clone(),
                None => UriConstraintSet::new(),
            };
            let mut overrides = UriConstraintSet::new();
            if let Some(scheme) = scheme {
                overrides = overrides.with_scheme(scheme);
            }
            if let Some(host) = host {
                overrides = overrides.with_host(host);
            }
            if let Some(sub_domain) = sub_domain {
                overrides = overrides.with_sub_domain(sub_domain);
            }
            if let Some(top_level_domain) = top_level_domain {
                overrides = overrides.with_top_level_domain(top_level_domain);
            }
            if let Some(port) = port {
                overrides = overrides.with_port(port);
            }
            let constraints = base.merge(&overrides);

            let uri = constraints.apply_with(&Uri::parse(&candidate)?, &Uri::parse(&request_uri)?, absolute);
            json!({
                "constraints": constraints,
                "uri": uri.to_string(),
                "absolute": uri.is_absolute(),
            })
        }
        Commands::PathTags { path } => {
            json!({ "tags": TagSet::from_uri_path(&path) })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn to_route_values(pairs: Vec<(String, String)>) -> RouteValues {
    pairs
        .into_iter()
        .map(|(k, v)| (k, CacheableValue::from(v)))
        .collect()
}

fn fingerprint_uri(host: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("http://{}{}", host, path)
    } else {
        format!("http://{}/{}", host, path)
    }
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("page=2"),
            Ok(("page".to_string(), "2".to_string()))
        );
        assert_eq!(
            parse_key_value("a=b=c"),
            Ok(("a".to_string(), "b=c".to_string()))
        );
        assert!(parse_key_value("page").is_err());
    }

    #[test]
    fn test_fingerprint_uri_adds_leading_slash() {
        assert_eq!(fingerprint_uri("example.com", "/foo"), "http://example.com/foo");
        assert_eq!(fingerprint_uri("example.com", "foo"), "http://example.com/foo");

        let head = RequestHead::parse("GET", &fingerprint_uri("example.com", "foo")).unwrap();
        assert_eq!(routekit_routing::RouteRequest::host(&head), "example.com");
        assert_eq!(routekit_routing::RouteRequest::path(&head), "/foo");
    }

    #[test]
    fn test_parse_apply_command() {
        let cli = Cli::try_parse_from([
            "routekit",
            "apply",
            "--request-uri",
            "http://example.com/",
            "--candidate",
            "/foo",
            "--sub-domain",
            "de",
            "--absolute",
        ])
        .unwrap();
        match cli.command {
            Commands::Apply {
                sub_domain,
                absolute,
                ..
            } => {
                assert_eq!(sub_domain.as_deref(), Some("de"));
                assert!(absolute);
            }
            _ => panic!("expected apply command"),
        }
    }
}
