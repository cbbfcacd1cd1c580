use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::domain::types::ConfigSpec;
use crate::infrastructure::config::LauncherConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntryOutcome {
    DirectoryExisted,
    DirectoryCreated,
    FileExisted,
    FileCopied,
    Failed(String),
}

impl EntryOutcome {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Clone, Debug, Default)]
pub struct MaterializeReport {
    pub entries: Vec<(String, EntryOutcome)>,
}

impl MaterializeReport {
    pub fn all_ok(&self) -> bool {
        self.entries.iter().all(|(_, outcome)| outcome.is_ok())
    }

    pub fn copies(&self) -> usize {
        self.count(|outcome| matches!(outcome, EntryOutcome::FileCopied))
    }

    pub fn directories_created(&self) -> usize {
        self.count(|outcome| matches!(outcome, EntryOutcome::DirectoryCreated))
    }

    pub fn failures(&self) -> usize {
        self.count(|outcome| !outcome.is_ok())
    }

    fn count(&self, predicate: impl Fn(&EntryOutcome) -> bool) -> usize {
        self.entries
            .iter()
            .filter(|(_, outcome)| predicate(outcome))
            .count()
    }
}

/// The config files the bundle modules read on start.
pub fn bundle_config_specs(config: &LauncherConfig) -> Vec<ConfigSpec> {
    let maibot = config.module_dir("MaiBot");
    let adapter = config.module_dir("MaiBot-Napcat-Adapter");
    vec![
        ConfigSpec::directory("MaiBot config directory", maibot.join("config")),
        ConfigSpec::file(
            "MaiBot bot config",
            config.bot_config_path(),
            config.bot_config_template_path(),
        ),
        ConfigSpec::file(
            "MaiBot model config",
            maibot.join("config").join("model_config.toml"),
            maibot.join("template").join("model_config_template.toml"),
        ),
        ConfigSpec::file(
            "MaiBot environment file",
            maibot.join(".env"),
            maibot.join("template").join("template.env"),
        ),
        ConfigSpec::file(
            "NapCat adapter config",
            adapter.join("config.toml"),
            adapter.join("template.toml"),
        ),
    ]
}

/// Processes every spec in order; a failing entry never stops the batch.
pub fn materialize(specs: &[ConfigSpec]) -> MaterializeReport {
    let mut report = MaterializeReport::default();
    for spec in specs {
        let outcome = match materialize_entry(spec) {
            Ok(outcome) => outcome,
            Err(error) => EntryOutcome::Failed(format!("{error:#}")),
        };
        match &outcome {
            EntryOutcome::DirectoryCreated => {
                tracing::info!(
                    entry = %spec.name,
                    path = %spec.target_path.display(),
                    "created directory"
                )
            }
            EntryOutcome::FileCopied => {
                tracing::info!(
                    entry = %spec.name,
                    path = %spec.target_path.display(),
                    "created config from template"
                )
            }
            EntryOutcome::DirectoryExisted | EntryOutcome::FileExisted => {
                tracing::debug!(
                    entry = %spec.name,
                    path = %spec.target_path.display(),
                    "already present"
                )
            }
            EntryOutcome::Failed(reason) => tracing::warn!(
                entry = %spec.name,
                path = %spec.target_path.display(),
                template = %spec
                    .template_path
                    .as_deref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_else(|| "unspecified".to_string()),
                reason = %reason,
                "config entry could not be materialized"
            ),
        }
        report.entries.push((spec.name.clone(), outcome));
    }

    if report.all_ok() {
        tracing::info!(entries = report.entries.len(), "config files checked");
    } else {
        tracing::warn!(
            failures = report.failures(),
            entries = report.entries.len(),
            "some config entries failed; see messages above"
        );
    }
    report
}

fn materialize_entry(spec: &ConfigSpec) -> Result<EntryOutcome> {
    if spec.is_directory {
        if spec.target_path.is_dir() {
            return Ok(EntryOutcome::DirectoryExisted);
        }
        fs::create_dir_all(&spec.target_path).with_context(|| {
            format!("failed to create directory: {}", spec.target_path.display())
        })?;
        return Ok(EntryOutcome::DirectoryCreated);
    }

    if spec.target_path.exists() {
        return Ok(EntryOutcome::FileExisted);
    }
    let template = spec
        .template_path
        .as_deref()
        .filter(|path| path.is_file())
        .ok_or_else(|| anyhow!("template missing, cannot create {}", spec.name))?;
    copy_preserving_mtime(template, &spec.target_path)?;
    Ok(EntryOutcome::FileCopied)
}

/// Copies bytes and permissions, then carries the template's modification time over.
pub fn copy_preserving_mtime(template: &Path, target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    fs::copy(template, target).with_context(|| {
        format!(
            "failed to copy template {} to {}",
            template.display(),
            target.display()
        )
    })?;
    let modified = fs::metadata(template)
        .and_then(|metadata| metadata.modified())
        .with_context(|| format!("failed to read template metadata: {}", template.display()))?;
    fs::File::options()
        .write(true)
        .open(target)
        .and_then(|file| file.set_modified(modified))
        .with_context(|| format!("failed to set modification time: {}", target.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_without_template_fails_alone() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path();
        std::fs::write(root.join("b.tpl"), "b = 1\n").expect("write template");

        let specs = vec![
            ConfigSpec::untemplated_file("a", root.join("a.toml")),
            ConfigSpec::file("b", root.join("cfg/b.toml"), root.join("b.tpl")),
        ];
        let report = materialize(&specs);

        assert!(!report.all_ok());
        assert_eq!(report.failures(), 1);
        assert_eq!(report.copies(), 1);
        assert_eq!(
            std::fs::read_to_string(root.join("cfg/b.toml")).expect("read copy"),
            "b = 1\n"
        );
    }

    #[test]
    fn copy_keeps_template_modification_time() {
        let temp = tempdir().expect("tempdir");
        let template = temp.path().join("t.toml");
        std::fs::write(&template, "x = 1\n").expect("write template");
        let target = temp.path().join("nested/dir/t.toml");

        copy_preserving_mtime(&template, &target).expect("copy");

        let source_time = std::fs::metadata(&template).unwrap().modified().unwrap();
        let target_time = std::fs::metadata(&target).unwrap().modified().unwrap();
        assert_eq!(source_time, target_time);
    }
}
