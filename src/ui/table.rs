use tabled::{settings::Style, Table, Tabled};
use crate::entity::Extension;
use crate::storage::DbStats;

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

/// One search hit as printed by the CLI
#[derive(Tabled)]
pub struct ExtensionRow {
    #[tabled(rename = "Extension")]
    pub name: String,
    #[tabled(rename = "Version")]
    pub version: String,
    #[tabled(rename = "Downloads")]
    pub downloads: i64,
    #[tabled(rename = "Rating")]
    pub rating: String,
    #[tabled(rename = "Description")]
    pub description: String,
}

impl From<&Extension> for ExtensionRow {
    fn from(extension: &Extension) -> Self {
        let latest = extension.latest.as_ref();
        Self {
            name: extension.qualified_name(),
            version: latest.map(|v| v.version.clone()).unwrap_or_else(|| "-".to_string()),
            downloads: extension.download_count,
            rating: extension
                .average_rating
                .map(|r| format!("{:.1}", r))
                .unwrap_or_else(|| "-".to_string()),
            description: latest.and_then(|v| v.description.clone()).unwrap_or_default(),
        }
    }
}

pub fn extension_table(extensions: &[Extension]) -> String {
    if extensions.is_empty() {
        return String::new();
    }
    let rows: Vec<ExtensionRow> = extensions.iter().map(ExtensionRow::from).collect();
    Table::new(&rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &DbStats) -> String {
    let rows: Vec<TableRow> = [
        ("Namespaces", stats.namespaces),
        ("Extensions", stats.extensions),
        ("Versions", stats.versions),
        ("Files", stats.files),
        ("Active reviews", stats.reviews),
    ]
    .into_iter()
    .map(|(metric, value)| TableRow { metric: metric.to_string(), value: value.to_string() })
    .collect();

    Table::new(&rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{ExtensionVersion, Namespace};

    #[test]
    fn test_extension_table() {
        let extension = Extension::new(1, "vscode-yaml", Namespace::new(1, "redhat")).with_download_count(42);
        let mut version = ExtensionVersion::new(7, 1, "0.5.2", chrono::NaiveDateTime::default());
        version.description = Some("YAML Language Support".to_string());
        let extension = extension.with_latest(version).unwrap();

        let table = extension_table(&[extension]);
        assert!(table.contains("redhat.vscode-yaml"));
        assert!(table.contains("0.5.2"));
        assert!(table.contains("42"));
        assert!(extension_table(&[]).is_empty());
    }

    #[test]
    fn test_stats_table() {
        let stats = DbStats { namespaces: 1, extensions: 2, versions: 3, files: 4, reviews: 5 };
        let table = stats_table(&stats);
        assert!(table.contains("Extensions"));
        assert!(table.contains("Active reviews"));
    }
}
