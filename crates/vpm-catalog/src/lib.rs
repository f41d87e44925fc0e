mod compat;
mod exclusivity;
mod reconcile;
mod types;

pub use compat::{
    is_unity_compatible, AVATARS_SDK_PACKAGE, BASE_SDK_PACKAGE, RESOLVER_PACKAGE,
    SDK_ROOT_PACKAGES, WORLDS_SDK_PACKAGE,
};
pub use reconcile::{
    filter_rows, migration_recommended, reconcile, LOCAL_USER_SOURCE_LABEL,
};
pub use types::{InstalledInfo, PackageLatest, PackageRow};
