//! Per-metric report tables
//!
//! One [`MetricSheet`] per [`Metric`]. Rows walk the hierarchy discipline by
//! discipline: each field's subfields, then the field total, then after all
//! fields the discipline total. Overall rows close the sheet. Columns are one
//! per `model_mode` run.

use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;

use crate::analysis::{overall, participants, CategoryStats, HierarchyState, Metric, OverallPolicy, View};
use crate::records::{Level, Mode};

/// Kind of a report row, for renderers that style totals differently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Subfield,
    FieldTotal,
    DisciplineTotal,
    Overall,
}

/// One labelled row of rates
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub kind: RowKind,
    pub discipline: String,
    pub field: String,
    pub subfield: String,
    /// Rate in `[0, 1]` per column
    pub cells: IndexMap<String, f64>,
}

/// A full table for one metric
#[derive(Debug, Clone, Serialize)]
pub struct MetricSheet {
    pub metric: Metric,
    pub columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl MetricSheet {
    /// File name of this sheet inside the report directory
    pub fn file_name(&self) -> String {
        format!("{}.tsv", self.metric.name().to_lowercase().replace(' ', "_"))
    }

    /// Write as tab-separated values with percentage cells
    pub fn write_tsv(&self, out: &mut impl Write) -> std::io::Result<()> {
        write!(out, "Discipline\tField\tSubfield")?;
        for column in &self.columns {
            write!(out, "\t{}", column)?;
        }
        writeln!(out)?;

        for row in &self.rows {
            write!(out, "{}\t{}\t{}", row.discipline, row.field, row.subfield)?;
            for column in &self.columns {
                let value = row.cells.get(column).copied().unwrap_or(0.0);
                write!(out, "\t{}", format_percent(value))?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

/// `0.4567` → `"45.67%"`
pub fn format_percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

/// Build all six sheets
pub fn build_sheets(state: &HierarchyState) -> Vec<MetricSheet> {
    Metric::all()
        .iter()
        .map(|metric| build_sheet(state, *metric))
        .collect()
}

/// Build the sheet for one metric
pub fn build_sheet(state: &HierarchyState, metric: Metric) -> MetricSheet {
    let runs = state.runs();
    let columns: Vec<String> = runs
        .iter()
        .map(|(model, mode)| format!("{}_{}", model, mode))
        .collect();

    let mut rows = Vec::new();
    for (discipline, discipline_stats) in &state.disciplines {
        for (_, field_stats) in state.fields_of(discipline) {
            let field = field_stats.name();

            for (_, subfield_stats) in state.subfields_of(discipline, field) {
                rows.push(category_row(
                    RowKind::Subfield,
                    [
                        discipline.clone(),
                        field.to_string(),
                        format!("{} ({})", subfield_stats.name(), question_count(subfield_stats, metric, &runs)),
                    ],
                    subfield_stats,
                    metric,
                    &runs,
                ));
            }

            rows.push(category_row(
                RowKind::FieldTotal,
                [
                    discipline.clone(),
                    format!("{} (Total: {})", field, question_count(field_stats, metric, &runs)),
                    String::new(),
                ],
                field_stats,
                metric,
                &runs,
            ));
        }

        rows.push(category_row(
            RowKind::DisciplineTotal,
            [
                format!("{} (Total: {})", discipline, question_count(discipline_stats, metric, &runs)),
                String::new(),
                String::new(),
            ],
            discipline_stats,
            metric,
            &runs,
        ));
    }

    for policy in metric.policies() {
        let mut cells = IndexMap::new();
        for ((model, mode), column) in runs.iter().zip(&columns) {
            let view = View::Run { model, mode: *mode };
            cells.insert(column.clone(), overall(state, metric, policy, view).unwrap_or(0.0));
        }
        rows.push(ReportRow {
            kind: RowKind::Overall,
            discipline: overall_label(state, metric, policy, &runs),
            field: String::new(),
            subfield: String::new(),
            cells,
        });
    }

    MetricSheet { metric, columns, rows }
}

/// Write every sheet into `dir`, creating it if needed
pub fn write_sheets(dir: impl AsRef<Path>, sheets: &[MetricSheet]) -> std::io::Result<()> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    for sheet in sheets {
        let mut writer = BufWriter::new(std::fs::File::create(dir.join(sheet.file_name()))?);
        sheet.write_tsv(&mut writer)?;
        writer.flush()?;
    }
    Ok(())
}

fn category_row(
    kind: RowKind,
    [discipline, field, subfield]: [String; 3],
    stats: &CategoryStats,
    metric: Metric,
    runs: &[(String, Mode)],
) -> ReportRow {
    let cells = runs
        .iter()
        .map(|(model, mode)| {
            let value = stats.run(model, *mode).map(|c| metric.value(c)).unwrap_or(0.0);
            (format!("{}_{}", model, mode), value)
        })
        .collect();

    ReportRow {
        kind,
        discipline,
        field,
        subfield,
        cells,
    }
}

/// Questions behind a node: every run scores the same questions, so the
/// largest snapshot is the question count. Tier sheets count tier samples.
fn question_count(stats: &CategoryStats, metric: Metric, runs: &[(String, Mode)]) -> u64 {
    runs.iter()
        .filter_map(|(model, mode)| stats.run(model, *mode))
        .map(|counts| metric.fraction(counts).1)
        .max()
        .unwrap_or_else(|| metric.fraction(&stats.counts).1)
}

fn overall_label(state: &HierarchyState, metric: Metric, policy: OverallPolicy, runs: &[(String, Mode)]) -> String {
    let tier = metric.tier().map(|d| format!("{} ", d)).unwrap_or_default();

    match policy {
        OverallPolicy::SampleWise => {
            let samples = runs
                .iter()
                .map(|(model, mode)| participants(state, metric, policy, View::Run { model, mode: *mode }))
                .max()
                .unwrap_or(0);
            if metric.policies().len() == 1 {
                format!("Overall (Total samples: {})", samples)
            } else {
                format!("Overall (sample-wise) (Total {}samples: {})", tier, samples)
            }
        }
        OverallPolicy::CategoryWise(level) => {
            let categories = participants(state, metric, policy, View::Combined);
            let name = level.as_str();
            let plural = match level {
                Level::Discipline => "disciplines",
                Level::Field => "fields",
                Level::Subfield => "subfields",
            };
            format!("Overall ({}-wise) (Total {}{}: {})", name, tier, plural, categories)
        }
    }
}
