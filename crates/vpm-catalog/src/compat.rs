use vpm_core::{PackageRecord, UnityVersion};

pub const AVATARS_SDK_PACKAGE: &str = "com.vrchat.avatars";
pub const WORLDS_SDK_PACKAGE: &str = "com.vrchat.worlds";
pub const BASE_SDK_PACKAGE: &str = "com.vrchat.base";
pub const RESOLVER_PACKAGE: &str = "com.vrchat.core.vpm-resolver";

pub const SDK_ROOT_PACKAGES: [&str; 3] =
    [AVATARS_SDK_PACKAGE, WORLDS_SDK_PACKAGE, BASE_SDK_PACKAGE];

pub fn is_unity_compatible(pkg: &PackageRecord, unity: Option<UnityVersion>) -> bool {
    let Some(unity) = unity else {
        return true;
    };
    let Some(minimum) = pkg.info.unity else {
        return true;
    };

    // Historical carve-outs: these releases only run on Unity 2019 no
    // matter what minimum they declare.
    if SDK_ROOT_PACKAGES.contains(&pkg.info.name.as_str()) {
        if pkg.info.version.major == 3 && pkg.info.version.minor <= 4 {
            return unity.major == 2019;
        }
    } else if pkg.info.name == RESOLVER_PACKAGE {
        let version = &pkg.info.version;
        if version.major == 0 && version.minor == 1 && version.patch <= 26 {
            return unity.major == 2019;
        }
    }

    minimum <= unity
}
