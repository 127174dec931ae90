/// The service contract version sent with every request unless configured otherwise.
pub const DEFAULT_API_VERSION: &str = "2014-07-31-Preview";

/// Name of the query parameter pinning the service contract version.
pub const API_VERSION_PARAM: &str = "api-version";

/// Name of the header carrying the pre-shared service key.
pub const API_KEY_HEADER: &str = "api-key";

/// The only port requests are issued on.
pub const HTTPS_PORT: u16 = 443;

pub mod env_var {
    macro_rules! define_env_vars {
        ($($(#[$meta:meta])* $ident:ident = $name:expr),*) => {
            $(
                $(#[$meta])*
                pub const $ident: &str = $name;
            )*

            pub const ALL: &[&str] = &[$($ident),*];
        }
    }

    define_env_vars! {
        /// Base URL of the search service, e.g. `https://example.search.windows.net`
        SEARCH_SERVICE_URL = "SEARCH_SERVICE_URL",

        /// Pre-shared key sent in the `api-key` header
        SEARCH_SERVICE_KEY = "SEARCH_SERVICE_KEY",

        /// Overrides the default `api-version`
        SEARCH_API_VERSION = "SEARCH_API_VERSION",

        /// Path to an extra PEM encoded root certificate
        SEARCH_CUSTOM_CERT = "SEARCH_CUSTOM_CERT",

        /// Log filter directive for the command line front-end
        SEARCH_LOG_LEVEL = "SEARCH_LOG_LEVEL"
    }
}
