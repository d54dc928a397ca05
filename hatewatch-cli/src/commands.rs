//! CLI subcommand handlers.

use crate::{Commands, ConfigAction};
use hatewatch_core::{HatewatchConfig, load_config};
use hatewatch_ml::model::BagOfWordsBackend;
use hatewatch_ml::stages::check_sources;
use hatewatch_ml::{PredictionPipeline, TrainPipeline, normalize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match command {
        Commands::Run => handle_run(&load(workspace, config_file)?).await,
        Commands::Validate { raw, imbalanced } => handle_validate(&raw, &imbalanced),
        Commands::Normalize { text } => {
            println!("{}", normalize(&text));
            Ok(())
        }
        Commands::Predict { text, json } => {
            handle_predict(&load(workspace, config_file)?, &text, json).await
        }
        Commands::Config { action } => handle_config(action, workspace, config_file),
    }
}

fn load(workspace: &Path, config_file: Option<&Path>) -> anyhow::Result<HatewatchConfig> {
    let mut config = load_config(Some(workspace), config_file)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    anchor_paths(&mut config, workspace);
    Ok(config)
}

/// Make relative paths in `config` relative to the workspace rather than
/// the process working directory.
fn anchor_paths(config: &mut HatewatchConfig, workspace: &Path) {
    let anchor = |path: &mut PathBuf| {
        if path.is_relative() {
            *path = workspace.join(&*path);
        }
    };
    anchor(&mut config.storage.artifacts_dir);
    anchor(&mut config.ingestion.local_dataset_path);
    anchor(&mut config.evaluation.best_model_dir);
    anchor(&mut config.prediction.model_dir);
    anchor(&mut config.sync.local_root);
}

async fn handle_run(config: &HatewatchConfig) -> anyhow::Result<()> {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current stage");
            on_signal.cancel();
        }
    });

    let mut pipeline = TrainPipeline::from_config(config.clone()).with_cancellation(token);
    let summary = pipeline.run().await?;

    let evaluation = &summary.evaluation;
    println!("Run {} finished: {}", summary.run_id, pipeline.state());
    println!("  Trained accuracy:  {:.4}", evaluation.trained_accuracy);
    match evaluation.champion_accuracy {
        Some(acc) => println!("  Champion accuracy: {acc:.4}"),
        None => println!("  Champion accuracy: none (cold start)"),
    }
    match &summary.pushed {
        Some(pushed) => println!(
            "  Promoted to {}/{} (sha256 {})",
            pushed.bucket_name, pushed.object_name, pushed.sha256
        ),
        None => println!("  Not promoted; the champion stays in place"),
    }
    println!("  Run record: {}", summary.record_path.display());
    Ok(())
}

fn handle_validate(raw: &Path, imbalanced: &Path) -> anyhow::Result<()> {
    let (raw_table, imbalanced_table) = check_sources(raw, imbalanced)?;

    println!(
        "OK: {} raw rows, {} imbalanced rows",
        raw_table.row_count(),
        imbalanced_table.row_count()
    );
    Ok(())
}

async fn handle_predict(config: &HatewatchConfig, text: &str, json: bool) -> anyhow::Result<()> {
    let predictor = PredictionPipeline::new(
        config.prediction.clone(),
        config.storage.bucket_name.clone(),
        config.storage.model_name.clone(),
        config.transformation.tokenizer_file_name.clone(),
        config.training.max_len,
        hatewatch_core::sync::from_config(&config.sync),
        Arc::new(BagOfWordsBackend::from_config(&config.training)),
    );
    let prediction = predictor.run(text).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!("{} (p = {:.3})", prediction.verdict, prediction.probability);
    }
    Ok(())
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_file: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(Some(workspace), config_file)
                .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        ConfigAction::Init => {
            let config_dir = workspace.join(".hatewatch");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&HatewatchConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_relative_paths_anchor_to_workspace() {
        let ws = TempDir::new().unwrap();
        let mut config = HatewatchConfig::default();
        let absolute = ws.path().join("elsewhere");
        config.prediction.model_dir = absolute.clone();

        anchor_paths(&mut config, ws.path());
        assert_eq!(config.storage.artifacts_dir, ws.path().join("artifacts"));
        assert_eq!(
            config.sync.local_root,
            ws.path().join("storage").join("buckets")
        );
        assert_eq!(config.prediction.model_dir, absolute);
    }

    #[test]
    fn test_config_init_writes_loadable_defaults() {
        let ws = TempDir::new().unwrap();
        handle_config(ConfigAction::Init, ws.path(), None).unwrap();

        let path = ws.path().join(".hatewatch").join("config.toml");
        assert!(path.is_file());
        let loaded = load_config(Some(ws.path()), None).unwrap();
        assert_eq!(loaded, HatewatchConfig::default());
    }

    #[test]
    fn test_validate_reports_schema_errors() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.csv");
        let imbalanced = dir.path().join("imbalanced.csv");
        std::fs::write(&raw, "index,tweet\n0,hello\n").unwrap();
        std::fs::write(&imbalanced, "id,label,tweet\n1,0,hi\n").unwrap();

        let err = handle_validate(&raw, &imbalanced).unwrap_err();
        assert!(err.to_string().contains("Missing column"));
    }

    #[test]
    fn test_validate_reports_missing_values() {
        let dir = TempDir::new().unwrap();
        let raw = dir.path().join("raw.csv");
        let imbalanced = dir.path().join("imbalanced.csv");
        std::fs::write(
            &raw,
            "index,count,hate_speech_count,offensive_language_count,neither_count,class_label,tweet\n\
             0,3,0,0,3,2,hello\n",
        )
        .unwrap();
        std::fs::write(&imbalanced, "id,label,tweet\n1,0,\n").unwrap();

        let err = handle_validate(&raw, &imbalanced).unwrap_err();
        assert!(err.to_string().contains("Missing values found in imbalanced"));
    }
}
