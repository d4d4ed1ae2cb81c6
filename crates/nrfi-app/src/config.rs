// Configuration loading and validation (nrfi.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

use nrfi_core::{FallbackPlan, FeatureSchema, UnknownValuePolicy};

pub const CONFIG_FILE: &str = "nrfi.toml";
pub const DEFAULT_STARTER_INNINGS: f64 = 5.5;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub snapshot_dir: String,
    pub features_csv: String,
    pub training_csv: String,
    pub schema: FeatureSchema,
    pub training_plan: FallbackPlan,
    pub inference_plan: FallbackPlan,
    pub expected_starter_innings: f64,
}

// ---------------------------------------------------------------------------
// nrfi.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire nrfi.toml file.
#[derive(Debug, Clone, Deserialize)]
struct NrfiFile {
    database: DatabaseSection,
    data: DataSection,
    export: ExportSection,
    #[serde(default)]
    features: FeaturesSection,
    #[serde(default)]
    fallback: FallbackSection,
    #[serde(default)]
    inference: InferenceSection,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct DataSection {
    snapshot_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
struct ExportSection {
    features_csv: String,
    training_csv: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FeaturesSection {
    /// Predictor column order. Omitted means the standard order.
    order: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
struct FallbackSection {
    #[serde(default = "FallbackPlan::reject_all")]
    training: FallbackPlan,
    #[serde(default = "FallbackPlan::inference_defaults")]
    inference: FallbackPlan,
}

impl Default for FallbackSection {
    fn default() -> Self {
        Self {
            training: FallbackPlan::reject_all(),
            inference: FallbackPlan::inference_defaults(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct InferenceSection {
    #[serde(default = "default_starter_innings")]
    expected_starter_innings: f64,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            expected_starter_innings: DEFAULT_STARTER_INNINGS,
        }
    }
}

fn default_starter_innings() -> f64 {
    DEFAULT_STARTER_INNINGS
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/nrfi.toml` relative to `base_dir`.
///
/// Does not copy defaults; `load_config()` does that first.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    parse_config(&path, &text)
}

fn parse_config(path: &Path, text: &str) -> Result<Config, ConfigError> {
    let file: NrfiFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let schema = match &file.features.order {
        Some(names) => FeatureSchema::from_names(names).map_err(|e| ConfigError::ValidationError {
            field: "features.order".into(),
            message: e.to_string(),
        })?,
        None => FeatureSchema::standard(),
    };

    let config = Config {
        db_path: file.database.path,
        snapshot_dir: file.data.snapshot_dir,
        features_csv: file.export.features_csv,
        training_csv: file.export.training_csv,
        schema,
        training_plan: file.fallback.training,
        inference_plan: file.fallback.inference,
        expected_starter_innings: file.inference.expected_starter_innings,
    };

    validate(&config)?;

    Ok(config)
}

/// Seed `config/` with any `*.toml` from `defaults/` that is not there yet.
/// Returns the files written. Existing files are never touched, and
/// `.toml.example` templates and other non-TOML files stay behind.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        // A hand-written config/ is enough to run.
        if config_dir.is_dir() {
            return Ok(vec![]);
        }
        return Err(seed_error(format!(
            "no defaults/ or config/ in {}; run nrfi from the workspace root \
             (where defaults/{CONFIG_FILE} lives)",
            base_dir.display()
        )));
    }

    std::fs::create_dir_all(&config_dir)
        .map_err(|e| seed_error(format!("cannot create {}: {e}", config_dir.display())))?;

    let entries = std::fs::read_dir(&defaults_dir)
        .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults_dir.display())))?;

    let mut seeded = Vec::new();
    for entry in entries {
        let source = entry
            .map_err(|e| seed_error(format!("cannot list {}: {e}", defaults_dir.display())))?
            .path();
        if !source.is_file() || !source.extension().is_some_and(|ext| ext == "toml") {
            continue;
        }
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let target = config_dir.join(file_name);

        // create_new so a file that appeared since the listing is left alone.
        let mut dest = match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(dest) => dest,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(seed_error(format!("cannot create {}: {e}", target.display()))),
        };
        let text = std::fs::read(&source)
            .map_err(|e| seed_error(format!("cannot read {}: {e}", source.display())))?;
        std::io::Write::write_all(&mut dest, &text)
            .map_err(|e| seed_error(format!("cannot write {}: {e}", target.display())))?;

        info!("seeded {} from defaults", target.display());
        seeded.push(target);
    }

    Ok(seeded)
}

fn seed_error(message: String) -> ConfigError {
    ConfigError::DefaultsCopyError { message }
}

/// Load config relative to the current working directory, seeding
/// `config/` from `defaults/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let paths: &[(&str, &str)] = &[
        ("database.path", config.db_path.as_str()),
        ("data.snapshot_dir", config.snapshot_dir.as_str()),
        ("export.features_csv", config.features_csv.as_str()),
        ("export.training_csv", config.training_csv.as_str()),
    ];
    for (name, val) in paths {
        if val.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must not be empty".into(),
            });
        }
    }

    validate_plan("fallback.training", &config.training_plan)?;
    validate_plan("fallback.inference", &config.inference_plan)?;

    let innings = config.expected_starter_innings;
    if !innings.is_finite() || innings <= 0.0 {
        return Err(ConfigError::ValidationError {
            field: "inference.expected_starter_innings".into(),
            message: format!("must be > 0, got {innings}"),
        });
    }

    Ok(())
}

fn validate_plan(section: &str, plan: &FallbackPlan) -> Result<(), ConfigError> {
    let entries = [
        ("era", plan.era),
        ("k9", plan.k9),
        ("pitcher_yrfi_rate", plan.pitcher_yrfi_rate),
        ("team_yrfi_rate", plan.team_yrfi_rate),
    ];
    for (name, policy) in entries {
        if let UnknownValuePolicy::Default(v) = policy {
            if !v.is_finite() {
                return Err(ConfigError::ValidationError {
                    field: format!("{section}.{name}"),
                    message: format!("default must be a finite number, got {v}"),
                });
            }
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use nrfi_core::Predictor;
    use std::fs;

    /// Workspace root holding `defaults/`, whether `cargo test` runs from
    /// the crate directory or the workspace root.
    fn project_root() -> PathBuf {
        let cwd = std::env::current_dir().unwrap();
        if cwd.join("defaults").exists() {
            cwd
        } else if cwd.join("../../defaults").exists() {
            cwd.join("../..")
        } else {
            panic!("Cannot locate defaults/ directory from CWD {:?}", cwd);
        }
    }

    fn minimal(extra: &str) -> String {
        format!(
            "[database]\npath = \"nrfi.db\"\n\n\
             [data]\nsnapshot_dir = \"data/daily\"\n\n\
             [export]\nfeatures_csv = \"out/features.csv\"\ntraining_csv = \"out/training.csv\"\n\n\
             {extra}"
        )
    }

    fn parse(text: &str) -> Result<Config, ConfigError> {
        parse_config(Path::new("config/nrfi.toml"), text)
    }

    #[test]
    fn shipped_defaults_load() {
        let tmp = std::env::temp_dir().join("nrfi_config_test_defaults");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::copy(
            project_root().join("defaults").join(CONFIG_FILE),
            tmp.join("config").join(CONFIG_FILE),
        )
        .unwrap();

        let config = load_config_from(&tmp).expect("shipped defaults should load");
        assert_eq!(config.db_path, "nrfi.db");
        assert_eq!(config.snapshot_dir, "data/daily");
        assert_eq!(config.schema, FeatureSchema::standard());
        assert_eq!(config.training_plan, FallbackPlan::reject_all());
        assert_eq!(config.inference_plan, FallbackPlan::inference_defaults());
        assert!((config.expected_starter_innings - 5.5).abs() < f64::EPSILON);

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn optional_sections_fall_back() {
        let config = parse(&minimal("")).unwrap();
        assert_eq!(config.schema.len(), 8);
        assert_eq!(config.training_plan, FallbackPlan::reject_all());
        assert_eq!(config.inference_plan, FallbackPlan::inference_defaults());
        assert!((config.expected_starter_innings - DEFAULT_STARTER_INNINGS).abs() < f64::EPSILON);
    }

    #[test]
    fn custom_order_and_plans() {
        let config = parse(&minimal(
            "[features]\norder = [\"away_team_yrfi_rate\", \"home_pitcher_era\"]\n\n\
             [fallback.training]\nera = \"reject\"\nk9 = \"reject\"\npitcher_yrfi_rate = 0.45\nteam_yrfi_rate = \"reject\"\n\n\
             [inference]\nexpected_starter_innings = 6.0\n",
        ))
        .unwrap();
        assert_eq!(
            config.schema.predictors(),
            &[Predictor::AwayTeamYrfiRate, Predictor::HomePitcherEra]
        );
        assert_eq!(config.training_plan.pitcher_yrfi_rate, UnknownValuePolicy::Default(0.45));
        assert_eq!(config.training_plan.era, UnknownValuePolicy::Reject);
        assert_eq!(config.inference_plan, FallbackPlan::inference_defaults());
        assert!((config.expected_starter_innings - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_unknown_predictor() {
        let err = parse(&minimal("[features]\norder = [\"home_pitcher_whip\"]\n")).unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "features.order"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_empty_path() {
        let text = minimal("").replace("path = \"nrfi.db\"", "path = \"  \"");
        match parse(&text).unwrap_err() {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "database.path"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_finite_default() {
        let err = parse(&minimal(
            "[fallback.inference]\nera = nan\nk9 = 8.0\npitcher_yrfi_rate = 0.5\nteam_yrfi_rate = 0.5\n",
        ))
        .unwrap_err();
        match err {
            ConfigError::ValidationError { field, .. } => assert_eq!(field, "fallback.inference.era"),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn rejects_non_positive_innings() {
        let err = parse(&minimal("[inference]\nexpected_starter_innings = 0.0\n")).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }

    #[test]
    fn bad_policy_word_is_a_parse_error() {
        let err = parse(&minimal(
            "[fallback.training]\nera = \"skip\"\nk9 = \"reject\"\npitcher_yrfi_rate = \"reject\"\nteam_yrfi_rate = \"reject\"\n",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let tmp = std::env::temp_dir().join("nrfi_config_test_missing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            load_config_from(&tmp).unwrap_err(),
            ConfigError::FileNotFound { .. }
        ));
        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn ensure_config_files_copies_once_and_skips_examples() {
        let tmp = std::env::temp_dir().join("nrfi_config_test_seed");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults").join(CONFIG_FILE), minimal("")).unwrap();
        fs::write(tmp.join("defaults/local.toml.example"), "# template").unwrap();
        fs::write(tmp.join("defaults/README"), "notes").unwrap();
        fs::create_dir_all(tmp.join("defaults/old.toml")).unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied, vec![tmp.join("config").join(CONFIG_FILE)]);
        assert!(!tmp.join("config/local.toml.example").exists());
        assert!(!tmp.join("config/README").exists());
        assert!(!tmp.join("config/old.toml").exists());

        // Local edits survive a second run.
        fs::write(tmp.join("config").join(CONFIG_FILE), "edited").unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        assert_eq!(fs::read_to_string(tmp.join("config").join(CONFIG_FILE)).unwrap(), "edited");

        let _ = fs::remove_dir_all(&tmp);
    }

    #[test]
    fn no_defaults_and_no_config_is_an_error() {
        let tmp = std::env::temp_dir().join("nrfi_config_test_empty");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        let err = ensure_config_files(&tmp).unwrap_err();
        assert!(matches!(err, ConfigError::DefaultsCopyError { .. }));
        assert!(err.to_string().contains("defaults/nrfi.toml"), "{err}");

        // A hand-written config/ without defaults/ is accepted as is.
        fs::create_dir_all(tmp.join("config")).unwrap();
        assert!(ensure_config_files(&tmp).unwrap().is_empty());
        let _ = fs::remove_dir_all(&tmp);
    }
}
