//! VS Code Gallery protocol
//!
//! - `model`: request and response shapes of `/vscode/gallery/extensionquery`
//! - `adapter`: resolves queries and assets through the repository and search seams

pub mod adapter;
pub mod model;

#[cfg(test)]
pub(crate) mod fakes;

pub use adapter::VsCodeAdapter;
pub use model::{Criterion, ExtensionQueryResult, QueryFilter, QueryParam};

use crate::{Error, Result};
use crate::entity::FileType;

/// Criterion `filterType` values
pub mod filter_type {
    pub const TAG: u32 = 1;
    pub const EXTENSION_ID: u32 = 4;
    pub const CATEGORY: u32 = 5;
    pub const EXTENSION_NAME: u32 = 7;
    pub const TARGET: u32 = 8;
    pub const FEATURED: u32 = 9;
    pub const SEARCH_TEXT: u32 = 10;
    pub const EXCLUDE_WITH_FLAGS: u32 = 12;
}

/// Bits of the query `flags` field
pub mod flags {
    pub const INCLUDE_VERSIONS: u32 = 0x1;
    pub const INCLUDE_FILES: u32 = 0x2;
    pub const INCLUDE_CATEGORY_AND_TAGS: u32 = 0x4;
    pub const INCLUDE_SHARED_ACCOUNTS: u32 = 0x8;
    pub const INCLUDE_VERSION_PROPERTIES: u32 = 0x10;
    pub const EXCLUDE_NON_VALIDATED: u32 = 0x20;
    pub const INCLUDE_INSTALLATION_TARGETS: u32 = 0x40;
    pub const INCLUDE_ASSET_URI: u32 = 0x80;
    pub const INCLUDE_STATISTICS: u32 = 0x100;
    pub const INCLUDE_LATEST_VERSION_ONLY: u32 = 0x200;
    pub const UNPUBLISHED: u32 = 0x1000;

    pub fn test(flags: u32, flag: u32) -> bool {
        flags & flag != 0
    }
}

/// Gallery asset type names
pub mod asset_type {
    pub const MANIFEST: &str = "Microsoft.VisualStudio.Code.Manifest";
    pub const DETAILS: &str = "Microsoft.VisualStudio.Services.Content.Details";
    pub const LICENSE: &str = "Microsoft.VisualStudio.Services.Content.License";
    pub const ICON: &str = "Microsoft.VisualStudio.Services.Icons.Default";
    pub const VSIX_PACKAGE: &str = "Microsoft.VisualStudio.Services.VSIXPackage";
}

/// Version property keys
pub mod property {
    pub const ENGINE: &str = "Microsoft.VisualStudio.Code.Engine";
    pub const DEPENDENCY: &str = "Microsoft.VisualStudio.Code.ExtensionDependencies";
    pub const EXTENSION_PACK: &str = "Microsoft.VisualStudio.Code.ExtensionPack";
    pub const SOURCE_LINK: &str = "Microsoft.VisualStudio.Services.Links.Source";
}

/// Gallery asset type of a stored file type
pub fn asset_type_name(file_type: FileType) -> &'static str {
    match file_type {
        FileType::Manifest => asset_type::MANIFEST,
        FileType::Readme => asset_type::DETAILS,
        FileType::License => asset_type::LICENSE,
        FileType::Icon => asset_type::ICON,
        FileType::Download => asset_type::VSIX_PACKAGE,
    }
}

/// Resolve a gallery asset type to a file type.
///
/// Accepts full names and their last segment (`Manifest`, `Details`, ...).
pub fn file_type_for_asset(name: &str) -> Result<FileType> {
    FileType::all()
        .iter()
        .copied()
        .find(|file_type| {
            let full = asset_type_name(*file_type);
            full == name
                || full
                    .rsplit('.')
                    .next()
                    .is_some_and(|short| short.eq_ignore_ascii_case(name))
        })
        .ok_or_else(|| Error::UnknownAssetType(name.to_string()))
}
