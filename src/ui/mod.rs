pub mod icons;
pub mod output;
pub mod table;
pub mod theme;

pub use icons::Icons;
pub use output::{error, header, info, success, summary_row, warn};
pub use table::{extension_table, stats_table, ExtensionRow};
pub use theme::{theme, Theme};
