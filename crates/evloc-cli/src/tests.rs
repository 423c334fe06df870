use std::net::SocketAddr;
use std::path::Path;

use evloc_core::{AppConfig, Environment};

use super::*;

fn config_in(dir: &Path) -> AppConfig {
    let catalog_path = dir.join("stations.csv");
    std::fs::write(
        &catalog_path,
        "Name,Latitude,Longitude,Power (W)\n\
         Patia,20.30,85.82,50\n\
         Saheed Nagar,20.35,85.90,150\n",
    )
    .unwrap();
    AppConfig {
        env: Environment::Test,
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
        log_level: "info".to_string(),
        catalog_path,
        artifact_dir: dir.join("static"),
        render_timeout_secs: 30,
    }
}

#[test]
fn parses_nearest_command() {
    let cli = Cli::try_parse_from(["evloc", "nearest", "--lat", "20.3", "--lng", "85.8"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Nearest { lat, lng } if (lat - 20.3).abs() < 1e-12 && (lng - 85.8).abs() < 1e-12
    ));
}

#[test]
fn parses_best_command_with_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "evloc", "best", "--lat", "-33.9", "--lng", "-70.6", "--range", "0.5",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Best { lat, range, .. } if lat < 0.0 && (range - 0.5).abs() < 1e-12
    ));
}

#[test]
fn best_requires_range() {
    let result = Cli::try_parse_from(["evloc", "best", "--lat", "1", "--lng", "2"]);
    assert!(result.is_err());
}

#[test]
fn export_defaults_to_result_pdf() {
    let cli = Cli::try_parse_from(["evloc", "export"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Export { ref out } if out == Path::new("result.pdf")));
}

#[test]
fn catalog_override_is_global() {
    let cli = Cli::try_parse_from([
        "evloc", "nearest", "--lat", "1", "--lng", "2", "--catalog", "other.csv",
    ])
    .expect("expected valid cli args");
    assert_eq!(cli.catalog.as_deref(), Some(Path::new("other.csv")));
}

#[test]
fn missing_command_is_error() {
    assert!(Cli::try_parse_from(["evloc"]).is_err());
}

#[test]
fn nearest_then_export_writes_pdf_with_plot() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let empty_out = dir.path().join("empty.pdf");
    let out = dir.path().join("result.pdf");

    locate::run_export(&config, &empty_out).unwrap();
    locate::run_nearest(&config, 20.31, 85.83).unwrap();
    assert!(config.artifact_dir.join("result_plot.png").is_file());
    locate::run_export(&config, &out).unwrap();

    let empty = std::fs::read(&empty_out).unwrap();
    let full = std::fs::read(&out).unwrap();
    assert!(full.starts_with(b"%PDF"));
    assert!(full.len() > empty.len());
}

#[test]
fn best_out_of_range_is_error_and_leaves_slot_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let err = locate::run_best(&config, 0.0, 0.0, 1.0).unwrap_err();
    assert!(err.to_string().contains("no charging station within range"));
    assert!(!config.artifact_dir.join("result_plot.png").exists());
}

#[test]
fn missing_catalog_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.catalog_path = dir.path().join("absent.csv");
    let err = locate::run_nearest(&config, 20.31, 85.83).unwrap_err();
    assert!(err.to_string().contains("absent.csv"));
}
