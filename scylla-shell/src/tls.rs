//! TLS material for driver connections.
//!
//! Connections are always encrypted. The picture looks like this:
//!
//! ┌─←─ ConnectionConfig (paths + verify flag)
//! │
//! │ loads
//! │
//! ↳TlsMaterial (CA pool, client identity)
//!   │
//!   │ produces
//!   │
//!   ↳ServerVerifier (accept-anything or webpki)
//!     │
//!     │ goes into
//!     │
//!     ↳rustls::ClientConfig (handed to the driver as TlsContext)

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::sign::CertifiedKey;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tracing::{debug, warn};

use crate::config::ConnectionConfig;
use crate::errors::ConfigError;

/// Crypto provider used for every TLS operation of the shell.
pub fn crypto_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::aws_lc_rs::default_provider())
}

/// Client certificate chain with its private key.
pub struct ClientIdentity {
    /// End-entity certificate first, then intermediates.
    pub cert_chain: Vec<CertificateDer<'static>>,
    /// Key matching the end-entity certificate.
    pub key: PrivateKeyDer<'static>,
}

impl fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientIdentity")
            .field("cert_chain_len", &self.cert_chain.len())
            .finish_non_exhaustive()
    }
}

/// Certificates and keys read from the files named on the command line.
#[derive(Debug)]
pub struct TlsMaterial {
    /// Trust pool from `--ca`, if given.
    pub ca_roots: Option<RootCertStore>,
    /// Certificate presented to the server, if both `--cert` and `--key` were given.
    pub client_identity: Option<ClientIdentity>,
    /// Whether the server's chain and name are validated.
    pub verify_host: bool,
}

impl TlsMaterial {
    /// Reads every file the configuration names.
    ///
    /// The CA file is loaded even when verification is off, so a bad CA
    /// path is always reported.
    pub fn load(config: &ConnectionConfig, provider: &CryptoProvider) -> Result<Self, ConfigError> {
        let ca_roots = config
            .ca_cert_path
            .as_deref()
            .map(load_ca_roots)
            .transpose()?;

        let client_identity = match config.client_identity_paths() {
            Some((cert, key)) => Some(load_client_identity(cert, key, provider)?),
            None => {
                if let Some(cert) = &config.client_cert_path {
                    warn!("Ignoring client certificate {cert:?}: no client key was given");
                }
                if let Some(key) = &config.client_key_path {
                    warn!("Ignoring client key {key:?}: no client certificate was given");
                }
                None
            }
        };

        Ok(Self {
            ca_roots,
            client_identity,
            verify_host: config.verify_host,
        })
    }

    /// Picks the server certificate verifier for this material.
    ///
    /// With verification on, the CA pool is the root of trust, falling back
    /// to [default_roots] when no CA file was given.
    pub fn server_verifier(
        &self,
        provider: Arc<CryptoProvider>,
    ) -> Result<ServerVerifier, ConfigError> {
        if !self.verify_host {
            return Ok(ServerVerifier::Insecure(Arc::new(AcceptAnyServerCert::new(
                provider,
            ))));
        }

        let roots = match &self.ca_roots {
            Some(roots) => roots.clone(),
            None => {
                debug!("No CA certificate given, trusting the system root set");
                default_roots()
            }
        };
        let verifier = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider)
            .build()
            .map_err(ConfigError::Verifier)?;
        Ok(ServerVerifier::WebPki(verifier))
    }
}

/// How the server's certificate is checked during the handshake.
#[derive(Debug, Clone)]
pub enum ServerVerifier {
    /// No chain or name validation at all. Meant for local and test clusters.
    Insecure(Arc<AcceptAnyServerCert>),
    /// Full chain validation against a root pool, plus server name validation.
    WebPki(Arc<WebPkiServerVerifier>),
}

impl ServerVerifier {
    /// Returns true when both chain and server name validation are enforced.
    pub fn is_enforcing(&self) -> bool {
        matches!(self, ServerVerifier::WebPki(_))
    }

    fn into_dyn(self) -> Arc<dyn ServerCertVerifier> {
        match self {
            ServerVerifier::Insecure(verifier) => verifier as Arc<dyn ServerCertVerifier>,
            ServerVerifier::WebPki(verifier) => verifier as Arc<dyn ServerCertVerifier>,
        }
    }
}

/// Verifier that trusts any certificate for any server name.
///
/// Handshake signatures are still checked, so the peer must own the key of
/// the certificate it shows.
#[derive(Debug)]
pub struct AcceptAnyServerCert {
    provider: Arc<CryptoProvider>,
}

impl AcceptAnyServerCert {
    /// Creates a verifier checking signatures with `provider`'s algorithms.
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

/// Trust anchors of the platform's certificate store.
///
/// Falls back to the bundled Mozilla root set when the platform store has
/// no usable certificates.
pub fn default_roots() -> RootCertStore {
    let native = rustls_native_certs::load_native_certs();
    for err in &native.errors {
        warn!("Could not load system root certificates: {err}");
    }

    let mut roots = RootCertStore::empty();
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    if ignored > 0 {
        debug!("Ignored {ignored} unparseable system root certificate(s)");
    }
    if roots.is_empty() {
        debug!("No system root certificates found, trusting the bundled root set");
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    } else {
        debug!("Loaded {added} system root certificate(s)");
    }
    roots
}

/// Loads every PEM certificate in `path` into a fresh trust pool.
pub fn load_ca_roots(path: &Path) -> Result<RootCertStore, ConfigError> {
    let pem = std::fs::read(path).map_err(|source| ConfigError::ReadCaCertificate {
        path: path.to_owned(),
        source,
    })?;

    let mut roots = RootCertStore::empty();
    for cert in CertificateDer::pem_slice_iter(&pem) {
        let cert = cert.map_err(|source| ConfigError::ParseCaCertificate {
            path: path.to_owned(),
            source,
        })?;
        roots
            .add(cert)
            .map_err(|source| ConfigError::AddCaCertificate {
                path: path.to_owned(),
                source,
            })?;
    }

    if roots.is_empty() {
        return Err(ConfigError::NoCaCertificates(path.to_owned()));
    }
    debug!("Loaded {} CA certificate(s) from {:?}", roots.len(), path);
    Ok(roots)
}

/// Loads a client certificate chain and key, and checks they belong together.
pub fn load_client_identity(
    cert_path: &Path,
    key_path: &Path,
    provider: &CryptoProvider,
) -> Result<ClientIdentity, ConfigError> {
    let load_cert_err = |source| ConfigError::LoadClientCertificate {
        path: cert_path.to_owned(),
        source,
    };
    let cert_chain = CertificateDer::pem_file_iter(cert_path)
        .map_err(load_cert_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(load_cert_err)?;
    if cert_chain.is_empty() {
        return Err(ConfigError::NoClientCertificates(cert_path.to_owned()));
    }

    let key =
        PrivateKeyDer::from_pem_file(key_path).map_err(|source| ConfigError::LoadClientKey {
            path: key_path.to_owned(),
            source,
        })?;

    let signing_key = provider
        .key_provider
        .load_private_key(key.clone_key())
        .map_err(ConfigError::InvalidClientKeyPair)?;
    CertifiedKey::new(cert_chain.clone(), signing_key)
        .keys_match()
        .map_err(ConfigError::InvalidClientKeyPair)?;

    debug!(
        "Loaded client certificate {:?} with key {:?}",
        cert_path, key_path
    );
    Ok(ClientIdentity { cert_chain, key })
}

/// Builds the rustls configuration used for every connection of the session.
pub fn client_config(material: TlsMaterial) -> Result<Arc<ClientConfig>, ConfigError> {
    let provider = crypto_provider();
    let verifier = material.server_verifier(provider.clone())?;
    if verifier.is_enforcing() {
        debug!("TLS host verification enabled");
    } else {
        debug!("TLS host verification disabled");
    }

    let builder = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(ConfigError::Tls)?
        .dangerous()
        .with_custom_certificate_verifier(verifier.into_dyn());

    let config = match material.client_identity {
        Some(ClientIdentity { cert_chain, key }) => builder
            .with_client_auth_cert(cert_chain, key)
            .map_err(ConfigError::InvalidClientKeyPair)?,
        None => builder.with_no_client_auth(),
    };
    Ok(Arc::new(config))
}

/// Reads the files named by `config` and builds the rustls configuration.
pub fn assemble(config: &ConnectionConfig) -> Result<Arc<ClientConfig>, ConfigError> {
    let material = TlsMaterial::load(config, &crypto_provider())?;
    client_config(material)
}
