use super::*;
use clap::CommandFactory;

fn write_payload(contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rigbuild-cli-{}.json", uuid::Uuid::new_v4()));
    std::fs::write(&path, contents).unwrap();
    path
}

fn normalize_cli(path: &Path) -> Cli {
    Cli::parse_from(["rigbuild", "normalize", path.to_str().unwrap()])
}

#[test]
fn cli_definition_is_consistent() {
    Cli::command().debug_assert();
}

#[tokio::test]
async fn normalize_accepts_offer_payload() {
    let path = write_payload(r#"[{ "gpu": { "best_price": [{ "title": "RX 7600", "price": 1500 }] } }]"#);
    run(normalize_cli(&path)).await.unwrap();
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn normalize_reports_unrecognized_payload() {
    let path = write_payload("{}");
    let err = run(normalize_cli(&path)).await.unwrap_err();
    assert!(matches!(err, CliError::Normalize(NormalizeError::UnrecognizedShape)));
    assert_eq!(err.code(), "E_UNRECOGNIZED_SHAPE");
    std::fs::remove_file(path).unwrap();
}

#[tokio::test]
async fn normalize_reports_missing_file() {
    let path = std::env::temp_dir().join(format!("rigbuild-cli-missing-{}.json", uuid::Uuid::new_v4()));
    let err = run(normalize_cli(&path)).await.unwrap_err();
    assert_eq!(err.code(), "E_READ_FILE");
}
