//! Accessor compiler configuration.

/// Environment variable read by [`CacheMode::from_env`].
pub const CACHE_ENV_VAR: &str = "VELA_ACCESSOR_CACHE";

/// Whether compiled accessors are stored for reuse.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum CacheMode {
    #[default]
    Enabled,
    /// Classify and rewrite as usual but compile on every request.
    Disabled,
}

impl CacheMode {
    /// Read [`CACHE_ENV_VAR`]; `off`, `0` and `false` (any case) disable the
    /// cache, anything else (or unset) enables it.
    pub fn from_env() -> Self {
        match std::env::var(CACHE_ENV_VAR) {
            Ok(value) => Self::parse(&value),
            Err(_) => CacheMode::Enabled,
        }
    }

    fn parse(value: &str) -> Self {
        let value = value.trim();
        if ["off", "0", "false"]
            .iter()
            .any(|off| value.eq_ignore_ascii_case(off))
        {
            CacheMode::Disabled
        } else {
            CacheMode::Enabled
        }
    }
}

/// Options for [`AccessorCompiler`](crate::AccessorCompiler).
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct AccessorOptions {
    pub caching: CacheMode,
}

impl AccessorOptions {
    /// Options taken from the environment.
    pub fn from_env() -> Self {
        AccessorOptions {
            caching: CacheMode::from_env(),
        }
    }
}
