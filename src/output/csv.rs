//! CSV export of company profiles
//!
//! Projects a configured subset of profile columns into an RFC-4180 style
//! CSV file. Strictly a read-only consumer of the store.

use crate::config::ExportConfig;
use crate::storage::{ProfileRecord, Store};
use crate::Result;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Exports profiles to a CSV file under the configured export directory
///
/// # Arguments
///
/// * `store` - The store to read profiles from
/// * `config` - Export directory and column projection
/// * `filename` - Optional file name; defaults to a timestamped name
/// * `batch` - Optional batch filter
///
/// # Returns
///
/// The path of the written file
pub fn export_profiles(
    store: &dyn Store,
    config: &ExportConfig,
    filename: Option<&str>,
    batch: Option<&str>,
) -> Result<PathBuf> {
    let profiles = match batch {
        Some(batch) => store.profiles_by_batch(batch)?,
        None => store.all_profiles()?,
    };

    std::fs::create_dir_all(&config.path)?;

    let filename = match filename {
        Some(name) => name.to_string(),
        None => format!(
            "companies_{}.csv",
            Local::now().format("%Y%m%d_%H%M%S")
        ),
    };
    let path = Path::new(&config.path).join(filename);

    let mut out = String::new();
    out.push_str(
        &config
            .columns
            .iter()
            .map(|c| csv_escape(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');

    for profile in &profiles {
        let row = config
            .columns
            .iter()
            .map(|column| csv_escape(&project_column(profile, column)))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&row);
        out.push('\n');
    }

    std::fs::write(&path, out)?;

    tracing::info!(
        count = profiles.len(),
        path = %path.display(),
        "exported profiles to CSV"
    );

    Ok(path)
}

/// Projects one configured column out of a profile record
fn project_column(profile: &ProfileRecord, column: &str) -> String {
    match column {
        "name" => profile.name.clone(),
        "batch" => profile.batch.clone(),
        "location" => profile.location.clone().unwrap_or_default(),
        "description" => profile.description.clone().unwrap_or_default(),
        "website" => profile.website.clone().unwrap_or_default(),
        "directory_url" => profile.directory_url.clone(),
        "founder_names" => profile.founder_names.join("; "),
        "founder_profile_links" => profile.founder_profile_links.join("; "),
        "company_profile_links" => profile.company_profile_links.join("; "),
        "theme" => profile.theme.clone().unwrap_or_default(),
        "tags" => profile.tags.join("; "),
        "rationale" => profile.rationale.clone().unwrap_or_default(),
        "last_updated" => profile.last_updated.clone(),
        // Unknown columns are rejected at config validation time
        _ => String::new(),
    }
}

/// Quotes a field when it contains a separator, quote, or newline
fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
