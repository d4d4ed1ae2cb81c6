// CSV export of feature vectors and resolved training rows.

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use nrfi_core::{FallbackPlan, FeatureSchema, FeatureVector, Metric};

/// One fully numeric training example.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub reference: String,
    pub values: Vec<f64>,
    pub label: bool,
}

/// Outcome of applying a fallback plan to a batch of labelled vectors.
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub rows: Vec<TrainingRow>,
    /// Vectors dropped because the plan rejected one of their values.
    pub rejected: usize,
    /// Vectors dropped because they had no label.
    pub unlabelled: usize,
}

impl TrainingSet {
    pub fn build(vectors: &[FeatureVector], schema: &FeatureSchema, plan: &FallbackPlan) -> Self {
        let mut set = TrainingSet::default();
        for vector in vectors {
            let Some(label) = vector.label else {
                set.unlabelled += 1;
                continue;
            };
            match plan.resolve(vector, schema) {
                Ok(values) => set.rows.push(TrainingRow {
                    reference: vector.reference.to_string(),
                    values,
                    label,
                }),
                Err(_) => set.rejected += 1,
            }
        }
        set
    }
}

fn metric_cell(metric: Metric) -> String {
    metric.value().map(|v| v.to_string()).unwrap_or_default()
}

fn label_cell(label: Option<bool>) -> &'static str {
    match label {
        Some(true) => "1",
        Some(false) => "0",
        None => "",
    }
}

/// Write every vector, unknowns as empty cells.
pub fn write_feature_vectors<W: Write>(writer: W, vectors: &[FeatureVector], schema: &FeatureSchema) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec![
        "reference",
        "date",
        "home_team",
        "away_team",
        "home_pitcher",
        "away_pitcher",
    ];
    header.extend(schema.names());
    header.push("yrfi");
    wtr.write_record(&header).context("failed to write feature header")?;

    for v in vectors {
        let mut record = vec![
            v.reference.to_string(),
            v.date.format("%Y-%m-%d").to_string(),
            v.home_team.to_string(),
            v.away_team.to_string(),
            v.home_pitcher.as_ref().map(|p| p.to_string()).unwrap_or_default(),
            v.away_pitcher.as_ref().map(|p| p.to_string()).unwrap_or_default(),
        ];
        record.extend(v.values(schema).into_iter().map(metric_cell));
        record.push(label_cell(v.label).to_string());
        wtr.write_record(&record)
            .with_context(|| format!("failed to write feature row {}", v.reference))?;
    }

    wtr.flush().context("failed to flush feature CSV")?;
    Ok(())
}

/// Write numeric rows in schema order followed by the 0/1 label.
pub fn write_training_rows<W: Write>(writer: W, rows: &[TrainingRow], schema: &FeatureSchema) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["reference"];
    header.extend(schema.names());
    header.push("yrfi");
    wtr.write_record(&header).context("failed to write training header")?;

    for row in rows {
        let mut record = Vec::with_capacity(row.values.len() + 2);
        record.push(row.reference.clone());
        record.extend(row.values.iter().map(|v| v.to_string()));
        record.push(label_cell(Some(row.label)).to_string());
        wtr.write_record(&record)
            .with_context(|| format!("failed to write training row {}", row.reference))?;
    }

    wtr.flush().context("failed to flush training CSV")?;
    Ok(())
}

fn create_file(path: &Path) -> Result<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    std::fs::File::create(path).with_context(|| format!("failed to create {}", path.display()))
}

pub fn export_feature_vectors(path: &Path, vectors: &[FeatureVector], schema: &FeatureSchema) -> Result<()> {
    write_feature_vectors(create_file(path)?, vectors, schema)
}

pub fn export_training_rows(path: &Path, rows: &[TrainingRow], schema: &FeatureSchema) -> Result<()> {
    write_training_rows(create_file(path)?, rows, schema)
}
