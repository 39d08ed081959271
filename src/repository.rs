//! Repository seam - keyed relational lookups used by the gallery adapter
//!
//! `SqliteStore` is the production implementation; tests substitute fakes.

use crate::Result;
use crate::entity::{Extension, ExtensionVersion, FileResource, FileType, MembershipRole, Namespace};

/// Lookups by natural keys, plus download accounting.
///
/// Extensions are returned hydrated: namespace and latest version included.
pub trait RepositoryService: Send + Sync {
    /// Find an extension by name within a namespace
    fn find_extension(&self, name: &str, namespace: &str) -> Result<Option<Extension>>;

    /// Find an extension by its identifier (search hits carry only this)
    fn find_extension_by_id(&self, id: i64) -> Result<Option<Extension>>;

    /// Find one exact version of an extension
    fn find_version(&self, version: &str, extension: &str, namespace: &str) -> Result<Option<ExtensionVersion>>;

    /// All versions of an extension, newest first
    fn find_versions(&self, extension: &Extension) -> Result<Vec<ExtensionVersion>>;

    /// The stored asset of a given type for a version
    fn find_file(&self, version: &ExtensionVersion, file_type: FileType) -> Result<Option<FileResource>>;

    /// Number of users holding a role in the namespace
    fn count_memberships(&self, namespace: &Namespace, role: MembershipRole) -> Result<usize>;

    /// Number of active reviews of the extension
    fn count_active_reviews(&self, extension: &Extension) -> Result<usize>;

    /// Count one package download of the version's extension
    fn record_download(&self, version: &ExtensionVersion) -> Result<()>;
}
