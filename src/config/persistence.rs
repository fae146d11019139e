//! Cache and on-disk file settings

use std::time::Duration;

pub struct CacheSettings {
    pub default_ttl: Duration,
    pub key_separator: &'static str,
}

pub struct FileSettings {
    // Files with this extension are bincode, everything else is read as JSON
    pub binary_extension: &'static str,
    pub version: f64,
}

pub struct PersistenceConfig {
    pub cache: CacheSettings,
    pub files: FileSettings,
}

pub const PERSISTENCE: PersistenceConfig = PersistenceConfig {
    cache: CacheSettings {
        default_ttl: Duration::from_secs(5 * 60),
        key_separator: ":",
    },
    files: FileSettings {
        binary_extension: "bin",
        version: 1.0,
    },
};
