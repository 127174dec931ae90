use std::fs::File;
use std::io::BufReader;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::{
    Arc,
    LazyLock,
};

use reqwest::Client;
use rustls::pki_types::CertificateDer;
use rustls::{
    ClientConfig,
    RootCertStore,
};
use thiserror::Error;

use crate::consts::env_var::SEARCH_CUSTOM_CERT;

const PRODUCT: &str = "search-client";

#[derive(Debug, Error)]
enum TlsSetupError {
    #[error("failed to read certificate {}: {source}", path.display())]
    ReadCert {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} holds no PEM certificates", .0.display())]
    NoCerts(PathBuf),
    #[error(transparent)]
    Rustls(#[from] rustls::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Reads every PEM certificate in `path`. A file without any is an error.
fn load_pem_certs(path: &Path) -> Result<Vec<CertificateDer<'static>>, TlsSetupError> {
    let read_err = |source| TlsSetupError::ReadCert {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(read_err)?);
    let certs = rustls_pemfile::certs(&mut reader)
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_err)?;
    if certs.is_empty() {
        return Err(TlsSetupError::NoCerts(path.to_path_buf()));
    }
    Ok(certs)
}

/// Bundled webpki roots, plus the platform store when asked, plus `SEARCH_CUSTOM_CERT`.
///
/// Roots that fail to load are logged and skipped so one bad certificate does not take the
/// whole client down.
fn trust_roots(native_certs: bool) -> RootCertStore {
    let mut roots = RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    if native_certs {
        match rustls_native_certs::load_native_certs() {
            Ok(certs) => {
                let (added, ignored) = roots.add_parsable_certificates(certs);
                tracing::debug!(added, ignored, "Loaded platform root certificates");
            },
            Err(err) => tracing::warn!(%err, "Platform root certificates unavailable"),
        }
    }

    if let Some(path) = std::env::var_os(SEARCH_CUSTOM_CERT) {
        let path = PathBuf::from(path);
        match load_pem_certs(&path) {
            Ok(certs) => {
                let (added, ignored) = roots.add_parsable_certificates(certs);
                tracing::debug!(path = %path.display(), added, ignored, "Loaded custom certificate");
            },
            Err(err) => tracing::error!(%err, "Ignoring custom certificate"),
        }
    }

    roots
}

fn tls_config(native_certs: bool) -> Result<ClientConfig, TlsSetupError> {
    let provider = rustls::crypto::CryptoProvider::get_default()
        .cloned()
        .unwrap_or_else(|| Arc::new(rustls::crypto::ring::default_provider()));

    Ok(ClientConfig::builder_with_provider(provider)
        .with_protocol_versions(rustls::DEFAULT_VERSIONS)?
        .with_root_certificates(trust_roots(native_certs))
        .with_no_client_auth())
}

/// `search-client/<version> (<executable>; <os>; <arch>)`, restricted to printable ASCII so it
/// is always a valid header value.
fn format_user_agent(exe: Option<&Path>) -> String {
    let exe = exe
        .and_then(Path::file_stem)
        .and_then(|stem| stem.to_str())
        .unwrap_or("unknown");
    let agent = format!(
        "{PRODUCT}/{} ({exe}; {}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    agent.chars().filter(|c| *c == ' ' || c.is_ascii_graphic()).collect()
}

static USER_AGENT: LazyLock<String> =
    LazyLock::new(|| format_user_agent(std::env::current_exe().ok().as_deref()));

pub fn user_agent() -> &'static str {
    &USER_AGENT
}

fn build_client(native_certs: bool) -> Result<Client, TlsSetupError> {
    Ok(Client::builder()
        .use_preconfigured_tls(tls_config(native_certs)?)
        .user_agent(user_agent())
        .build()?)
}

fn cached_client(native_certs: bool) -> Option<Client> {
    match build_client(native_certs) {
        Ok(client) => Some(client),
        Err(err) => {
            tracing::error!(%err, native_certs, "Failed to build http client");
            None
        },
    }
}

static CLIENT_NATIVE_CERTS: LazyLock<Option<Client>> = LazyLock::new(|| cached_client(true));
static CLIENT_NO_NATIVE_CERTS: LazyLock<Option<Client>> = LazyLock::new(|| cached_client(false));

/// A shared http client, `None` if TLS could not be set up.
pub fn reqwest_client(native_certs: bool) -> Option<&'static Client> {
    if native_certs {
        CLIENT_NATIVE_CERTS.as_ref()
    } else {
        CLIENT_NO_NATIVE_CERTS.as_ref()
    }
}
