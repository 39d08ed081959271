//! Import of unpacked extensions
//!
//! An unpacked extension directory holds `package.json` and, optionally,
//! a README, a LICENSE, the icon referenced by the manifest and the `.vsix`
//! package. Importing publishes one new version into the store.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use serde::Deserialize;
use crate::{Error, Result};
use crate::entity::{Extension, ExtensionVersion, FileResource, FileType};
use crate::storage::{Publication, SqliteStore};

/// The subset of `package.json` the gallery serves
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    publisher: String,
    #[serde(default)]
    version: String,
    display_name: Option<String>,
    description: Option<String>,
    #[serde(default)]
    engines: BTreeMap<String, String>,
    #[serde(default)]
    extension_dependencies: Vec<String>,
    #[serde(default)]
    extension_pack: Vec<String>,
    #[serde(default)]
    preview: bool,
    repository: Option<RepositoryField>,
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    keywords: Vec<String>,
    icon: Option<String>,
}

/// `repository` is either a URL or `{ "type": ..., "url": ... }`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RepositoryField {
    Url(String),
    Object { url: String },
}

impl RepositoryField {
    fn url(self) -> String {
        match self {
            RepositoryField::Url(url) | RepositoryField::Object { url } => url,
        }
    }
}

/// Read an unpacked extension directory into a publication
pub fn read_extension_dir(dir: &Path) -> Result<Publication> {
    let manifest_path = dir.join("package.json");
    if !manifest_path.is_file() {
        return Err(Error::InvalidManifest(format!("no package.json in {}", dir.display())));
    }
    let manifest_bytes = std::fs::read(&manifest_path)?;
    let manifest: PackageManifest = serde_json::from_slice(&manifest_bytes)?;
    validate(&manifest)?;

    let entries = sorted_entries(dir)?;
    let readme = find_by_prefix(&entries, &["readme"]);
    let license = find_by_prefix(&entries, &["license", "licence"]);
    let vsix = entries
        .iter()
        .find(|path| path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("vsix")))
        .cloned();
    let icon = match &manifest.icon {
        Some(icon) => Some(resolve_icon(dir, icon)?),
        None => None,
    };

    let mut version = ExtensionVersion::new(0, 0, manifest.version.clone(), chrono::Utc::now().naive_utc());
    version.preview = manifest.preview;
    version.display_name = manifest.display_name;
    version.description = manifest.description;
    version.repository = manifest.repository.map(RepositoryField::url);
    version.engines = manifest
        .engines
        .iter()
        .map(|(engine, range)| format!("{}@{}", engine, range))
        .collect();
    version.dependencies = manifest.extension_dependencies;
    version.bundled_extensions = manifest.extension_pack;
    version.categories = manifest.categories;
    version.tags = manifest.keywords;

    let mut files = vec![FileResource::new(0, FileType::Manifest, "package.json", manifest_bytes)];
    for (file_type, path) in [
        (FileType::Readme, readme),
        (FileType::License, license),
        (FileType::Icon, icon),
        (FileType::Download, vsix),
    ] {
        let Some(path) = path else { continue };
        let name = file_name(&path);
        match file_type {
            FileType::Readme => version.readme_file_name = Some(name.clone()),
            FileType::License => version.license_file_name = Some(name.clone()),
            FileType::Icon => version.icon_file_name = Some(name.clone()),
            FileType::Download => version.extension_file_name = Some(name.clone()),
            FileType::Manifest => {}
        }
        files.push(FileResource::new(0, file_type, name, std::fs::read(&path)?));
    }

    Ok(Publication {
        namespace: manifest.publisher,
        extension: manifest.name,
        version,
        files,
        owner: None,
    })
}

/// Read and publish an unpacked extension, optionally recording an owner
pub fn import_extension(store: &SqliteStore, dir: &Path, owner: Option<&str>) -> Result<Extension> {
    let mut publication = read_extension_dir(dir)?;
    publication.owner = owner.map(str::to_string);

    let extension = store.publish(&publication)?;
    tracing::info!(
        "Imported {}@{} ({} files)",
        extension.qualified_name(),
        publication.version.version,
        publication.files.len()
    );
    Ok(extension)
}

fn validate(manifest: &PackageManifest) -> Result<()> {
    for (field, value) in [("publisher", &manifest.publisher), ("name", &manifest.name)] {
        if value.is_empty() {
            return Err(Error::InvalidManifest(format!("missing {}", field)));
        }
        if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
            return Err(Error::InvalidManifest(format!("invalid {}: {}", field, value)));
        }
    }
    semver::Version::parse(&manifest.version)
        .map_err(|e| Error::InvalidVersion(format!("{}: {}", manifest.version, e)))?;
    Ok(())
}

/// Icon path from the manifest, confined to the extension directory
fn resolve_icon(dir: &Path, icon: &str) -> Result<PathBuf> {
    let relative = Path::new(icon);
    let plain = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
    if !plain {
        return Err(Error::InvalidManifest(format!("icon {} must be relative to the extension", icon)));
    }

    let path = dir.join(relative);
    if !path.is_file() {
        return Err(Error::InvalidManifest(format!("icon {} does not exist", icon)));
    }
    // symlinks may still point elsewhere
    if !path.canonicalize()?.starts_with(dir.canonicalize()?) {
        return Err(Error::InvalidManifest(format!("icon {} resolves outside the extension", icon)));
    }
    Ok(path)
}

/// Regular files directly inside `dir`; symlinks are skipped
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            entries.push(entry.path());
        }
    }
    entries.sort();
    Ok(entries)
}

fn find_by_prefix(entries: &[PathBuf], prefixes: &[&str]) -> Option<PathBuf> {
    entries
        .iter()
        .find(|path| {
            let name = file_name(path).to_lowercase();
            prefixes.iter().any(|prefix| name.starts_with(prefix))
        })
        .cloned()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}
