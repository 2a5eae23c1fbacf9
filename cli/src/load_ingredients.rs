use anyhow::{Context, Result};
use diesel::prelude::*;
use potluck_server::models::NewIngredient;
use potluck_server::schema::ingredients;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

pub const FILE_NAME: &str = "ingredients.csv";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IngredientRow {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    pub created: usize,
    pub updated: usize,
}

/// Parse a headered `name,measurement_unit` CSV. Blank names are skipped.
pub fn read_rows<R: Read>(reader: R) -> Result<Vec<IngredientRow>> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut rows = Vec::new();
    for (index, record) in csv.deserialize::<IngredientRow>().enumerate() {
        // +2: header line, 1-based numbering
        let row = record.with_context(|| format!("Invalid row on line {}", index + 2))?;
        if row.name.is_empty() {
            tracing::warn!(line = index + 2, "skipping ingredient without a name");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Insert or update each row by name, all in one transaction.
pub fn upsert(conn: &mut PgConnection, rows: &[IngredientRow]) -> Result<LoadSummary> {
    let summary = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let mut summary = LoadSummary::default();
        for row in rows {
            let updated = diesel::update(ingredients::table.filter(ingredients::name.eq(&row.name)))
                .set(ingredients::measurement_unit.eq(&row.measurement_unit))
                .execute(conn)?;

            if updated > 0 {
                summary.updated += 1;
            } else {
                diesel::insert_into(ingredients::table)
                    .values(&NewIngredient {
                        name: &row.name,
                        measurement_unit: &row.measurement_unit,
                    })
                    .execute(conn)?;
                summary.created += 1;
            }
        }
        Ok(summary)
    })?;

    Ok(summary)
}

pub fn load_dir(conn: &mut PgConnection, dir: &Path) -> Result<LoadSummary> {
    let path = dir.join(FILE_NAME);
    tracing::info!(path = %path.display(), "loading ingredients");

    let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
    let rows = read_rows(file)?;
    let summary = upsert(conn, &rows)?;

    tracing::info!(
        created = summary.created,
        updated = summary.updated,
        "ingredients loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_headered_rows() {
        let data = "name,measurement_unit\nflour,g\n  sugar , g \negg,pcs\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(
            rows,
            vec![
                IngredientRow {
                    name: "flour".to_string(),
                    measurement_unit: "g".to_string()
                },
                IngredientRow {
                    name: "sugar".to_string(),
                    measurement_unit: "g".to_string()
                },
                IngredientRow {
                    name: "egg".to_string(),
                    measurement_unit: "pcs".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_skips_blank_names() {
        let data = "name,measurement_unit\n,g\nsalt,g\n";
        let rows = read_rows(data.as_bytes()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "salt");
    }

    #[test]
    fn test_reports_malformed_rows() {
        let data = "name,measurement_unit\nflour\n";
        let err = read_rows(data.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }
}
