//! Record commands: `save-sample`, `save`, `load`, `save-player`, `load-player`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use cloudsave::{PlayerRecord, RecordFields, RecordValue};

use super::connect;

/// Keys read by `load` when none are given.
pub const DEFAULT_LOAD_KEYS: [&str; 3] = ["player_name", "level", "xp"];

/// The fixed single-value record written by `save-sample`.
pub fn sample_fields() -> RecordFields {
    let mut fields = RecordFields::new();
    fields.insert("player_name".to_string(), RecordValue::from("Zack"));
    fields.insert("level".to_string(), RecordValue::from(50));
    fields.insert("xp".to_string(), RecordValue::from(2000));
    fields.insert("gold".to_string(), RecordValue::from(100));
    fields
}

/// Parse `KEY=VALUE` arguments into record fields.
pub fn parse_assignments(assignments: &[String]) -> Result<RecordFields> {
    let mut fields = RecordFields::new();
    for assignment in assignments {
        let Some((key, raw)) = assignment.split_once('=') else {
            bail!("expected KEY=VALUE, got '{}'", assignment);
        };
        if key.is_empty() {
            bail!("empty key in '{}'", assignment);
        }
        fields.insert(key.to_string(), RecordValue::parse_literal(raw));
    }
    Ok(fields)
}

pub async fn save_sample(config_path: &str) -> Result<()> {
    let cloud = connect(config_path).await?;
    cloud.save_record(&sample_fields()).await?;
    info!("Sample data saved");
    Ok(())
}

pub async fn save(config_path: &str, assignments: &[String]) -> Result<()> {
    let fields = parse_assignments(assignments)?;
    let cloud = connect(config_path).await?;
    cloud.save_record(&fields).await?;
    info!(keys = fields.len(), "Data saved");
    Ok(())
}

pub async fn load(config_path: &str, keys: &[String]) -> Result<()> {
    let keys: Vec<String> = if keys.is_empty() {
        DEFAULT_LOAD_KEYS.iter().map(|k| k.to_string()).collect()
    } else {
        keys.to_vec()
    };

    let cloud = connect(config_path).await?;
    let loaded = cloud.load_record(keys.iter().cloned()).await?;

    for key in &keys {
        match loaded.get(key) {
            Some(value) => println!("{}: {}", key, value),
            None => println!("{}: <missing>", key),
        }
    }
    Ok(())
}

pub async fn save_player(config_path: &str, key: &str, file: &Path) -> Result<()> {
    let contents = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading player file: {}", file.display()))?;
    let player: PlayerRecord = serde_json::from_str(&contents)
        .with_context(|| format!("parsing player file: {}", file.display()))?;

    let cloud = connect(config_path).await?;
    cloud.save_typed(key, &player).await?;
    info!(key, player = %player.name, "Player data saved");
    Ok(())
}

pub async fn load_player(config_path: &str, key: &str) -> Result<()> {
    let cloud = connect(config_path).await?;
    let player: PlayerRecord = cloud.load_typed(key).await?;
    println!("{}", serde_json::to_string_pretty(&player)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sample_fields_match_the_fixed_record() {
        let fields = sample_fields();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields["player_name"].as_json(), &json!("Zack"));
        assert_eq!(fields["level"].as_json(), &json!(50));
        assert_eq!(fields["xp"].as_json(), &json!(2000));
        assert_eq!(fields["gold"].as_json(), &json!(100));
    }

    #[test]
    fn parse_assignments_reads_json_and_strings() {
        let fields = parse_assignments(&[
            "level=50".to_string(),
            "player_name=Zack".to_string(),
            "tags=[\"a\",\"b\"]".to_string(),
            "note=a=b".to_string(),
        ])
        .unwrap();

        assert_eq!(fields["level"].as_json(), &json!(50));
        assert_eq!(fields["player_name"].as_json(), &json!("Zack"));
        assert_eq!(fields["tags"].as_json(), &json!(["a", "b"]));
        assert_eq!(fields["note"].as_json(), &json!("a=b"));
    }

    #[test]
    fn parse_assignments_rejects_malformed() {
        assert!(parse_assignments(&["level".to_string()]).is_err());
        assert!(parse_assignments(&["=5".to_string()]).is_err());
    }
}
