use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::infrastructure::config::LauncherConfig;
use crate::infrastructure::materializer::copy_preserving_mtime;

/// Reads `bot.qq_account`, creating the bot config from its template first if needed.
pub fn read_bot_account(config: &LauncherConfig) -> Result<String> {
    let path = config.bot_config_path();
    let template = config.bot_config_template_path();
    if !path.exists() && template.is_file() {
        copy_preserving_mtime(&template, &path)?;
        tracing::info!(path = %path.display(), "created bot config from template");
    }
    read_account_from(&path)
}

pub fn read_account_from(path: &Path) -> Result<String> {
    if !path.is_file() {
        return Err(anyhow!("bot config not found: {}", path.display()));
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read bot config: {}", path.display()))?;
    let document: toml::Table = raw
        .parse()
        .with_context(|| format!("bot config is not valid TOML: {}", path.display()))?;

    let account = document
        .get("bot")
        .and_then(|bot| bot.as_table())
        .and_then(|bot| bot.get("qq_account"))
        .ok_or_else(|| anyhow!("bot config is missing bot.qq_account: {}", path.display()))?;

    let account = match account {
        toml::Value::String(text) => text.trim().to_string(),
        toml::Value::Integer(number) => number.to_string(),
        other => {
            return Err(anyhow!(
                "bot.qq_account must be a string or integer, found {}",
                other.type_str()
            ))
        }
    };
    if account.is_empty() || account == "0" {
        return Err(anyhow!("bot.qq_account is not set in {}", path.display()));
    }
    Ok(account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn integer_and_string_accounts_are_accepted() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("bot_config.toml");

        std::fs::write(&path, "[bot]\nqq_account = 123456\n").unwrap();
        assert_eq!(read_account_from(&path).unwrap(), "123456");

        std::fs::write(&path, "[bot]\nqq_account = \"654321\"\n").unwrap();
        assert_eq!(read_account_from(&path).unwrap(), "654321");
    }

    #[test]
    fn missing_key_and_syntax_errors_are_descriptive() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("bot_config.toml");

        std::fs::write(&path, "[bot]\nnickname = \"mai\"\n").unwrap();
        let err = read_account_from(&path).unwrap_err();
        assert!(err.to_string().contains("bot.qq_account"));

        std::fs::write(&path, "[bot\nqq_account = 1\n").unwrap();
        let err = read_account_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("not valid TOML"));
    }

    #[test]
    fn placeholder_account_counts_as_unset() {
        let temp = tempdir().expect("tempdir");
        let path = temp.path().join("bot_config.toml");
        std::fs::write(&path, "[bot]\nqq_account = 0\n").unwrap();

        assert!(read_account_from(&path).is_err());
    }

    #[test]
    fn template_is_materialized_before_reading() {
        let temp = tempdir().expect("tempdir");
        let config = LauncherConfig::defaults_for_root(temp.path().to_path_buf());
        let template = config.bot_config_template_path();
        std::fs::create_dir_all(template.parent().unwrap()).unwrap();
        std::fs::write(&template, "[bot]\nqq_account = 42\n").unwrap();

        assert_eq!(read_bot_account(&config).unwrap(), "42");
        assert!(config.bot_config_path().exists());
    }
}
