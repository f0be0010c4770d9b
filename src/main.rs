//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `domain_intel` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use std::process;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use serde_json::json;

use domain_intel::gateway::key_rotation::KeyRotationGateway;
use domain_intel::gateway::ProviderGateway;
use domain_intel::initialization::{init_client, init_logger_with};
use domain_intel::{
    analyze_domain, run_proxy_server, AnalysisContext, AnalysisOptions, Config, Credentials,
    MetadataResult, ProviderEndpoints, ReputationResult, ScanResult,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file (if it exists)
    // Try the current directory first, then next to the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let config = Config::parse();

    let log_level = config.log_level.clone();
    let log_format = config.log_format.clone();
    init_logger_with(log_level.into(), log_format).context("Failed to initialize logger")?;

    let endpoints = ProviderEndpoints::from_env();
    let credentials = Credentials::from_env();
    let timeout = Duration::from_secs(config.timeout_seconds);
    let client = init_client(timeout).context("Failed to build HTTP client")?;

    if let Some(port) = config.proxy_port {
        let gateway = Arc::new(KeyRotationGateway::new(
            ProviderGateway::new(client, timeout),
            endpoints.fraud_base.clone(),
            credentials.ipqs_keys,
            domain_intel::config::DEFAULT_QUOTA_SIGNAL,
        ));
        return run_proxy_server(port, gateway).await;
    }

    if config.domains.is_empty() {
        eprintln!("domain_intel error: no domains given (pass one or more domains, or --proxy-port to run the boundary server)");
        process::exit(1);
    }

    let options = AnalysisOptions {
        request_timeout: timeout,
        metadata_attempt_timeout: Duration::from_secs(config.metadata_timeout_seconds),
        ..AnalysisOptions::default()
    };
    let context = AnalysisContext::new(client, endpoints, credentials, options);

    let mut failures = 0usize;
    for domain in &config.domains {
        match analyze_domain(&context, domain).await {
            Ok(outcome) => {
                let metadata = outcome.metadata.await_result().await;
                match outcome.records {
                    Ok((scan, reputation)) => {
                        if config.json {
                            println!(
                                "{}",
                                json!({
                                    "scan": scan,
                                    "reputation": reputation,
                                    "metadata": metadata,
                                })
                            );
                        } else {
                            print_report(&scan, &reputation, &metadata);
                            println!("{}", "Scan Complete".green().bold());
                        }
                    }
                    Err(e) => {
                        failures += 1;
                        eprintln!("{}: {:#}", "Scan Failed".red().bold(), e);
                    }
                }
            }
            Err(e) => {
                failures += 1;
                eprintln!("{}: {:#}", "Scan Failed".red().bold(), e);
            }
        }
    }

    if !config.json {
        let total = config.domains.len();
        println!(
            "Scanned {} domain{} ({} succeeded, {} failed)",
            total,
            if total == 1 { "" } else { "s" },
            total - failures,
            failures
        );
    }
    if failures > 0 {
        process::exit(1);
    }
    Ok(())
}

fn print_report(scan: &ScanResult, reputation: &ReputationResult, metadata: &MetadataResult) {
    println!("{}", scan.domain.bold());
    println!("  Risk level:   {}", reputation.risk_level);
    println!(
        "  Verdicts:     {} malicious / {} suspicious / {} harmless / {} undetected",
        reputation.malicious, reputation.suspicious, reputation.harmless, reputation.undetected
    );
    println!("  Registrar:    {}", scan.registrar);
    println!("  Created:      {} ({})", scan.created, scan.domain_age());
    println!("  Expires:      {}", scan.expires);
    println!("  IP address:   {}", scan.ip_address);
    println!(
        "  Location:     {} / {} / {}",
        scan.country, scan.region, scan.city
    );
    println!("  ISP:          {}", scan.isp);
    println!("  Abuse score:  {}", scan.abuse_score);
    println!(
        "  Anonymized:   {}",
        if scan.is_anonymized { "yes" } else { "no" }
    );
    if !scan.name_servers.is_empty() {
        println!("  Name servers: {}", scan.name_servers.join(", "));
    }
    match &metadata.error {
        Some(error) => println!("  Metadata:     unavailable ({error})"),
        None => println!(
            "  Metadata:     {} ({}% complete)",
            metadata.title.as_deref().unwrap_or("-"),
            metadata.completeness_score
        ),
    }
}
