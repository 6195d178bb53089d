use assert_matches::assert_matches;
use rustls::client::danger::ServerCertVerifier;
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use scylla_shell::errors::ConfigError;
use scylla_shell::tls::{self, crypto_provider, ServerVerifier, TlsMaterial};
use scylla_shell::ConnectionConfig;

use crate::utils::{leaf_cert, setup_tracing, test_ca, write_file};

fn der(pem: &str) -> CertificateDer<'static> {
    CertificateDer::from_pem_slice(pem.as_bytes()).unwrap()
}

fn check(
    verifier: &dyn ServerCertVerifier,
    cert: &CertificateDer<'_>,
    name: &str,
) -> Result<(), rustls::Error> {
    verifier
        .verify_server_cert(
            cert,
            &[],
            &ServerName::try_from(name.to_owned()).unwrap(),
            &[],
            UnixTime::now(),
        )
        .map(|_| ())
}

fn verifier_for(config: &ConnectionConfig) -> ServerVerifier {
    let provider = crypto_provider();
    TlsMaterial::load(config, &provider)
        .unwrap()
        .server_verifier(provider)
        .unwrap()
}

#[test]
fn verification_checks_chain_and_name_against_given_ca() {
    setup_tracing();
    let dir = tempfile::tempdir().unwrap();
    let ca = test_ca();
    let (server, _) = leaf_cert(&ca, &["localhost"]);
    let (stranger, _) = leaf_cert(&test_ca(), &["localhost"]);

    let config = ConnectionConfig {
        ca_cert_path: Some(write_file(dir.path(), "ca.crt", &ca.pem())),
        verify_host: true,
        ..Default::default()
    };
    let verifier = verifier_for(&config);
    assert!(verifier.is_enforcing());
    let ServerVerifier::WebPki(webpki) = verifier else {
        panic!("expected a webpki verifier");
    };

    let server = der(&server.pem());
    check(webpki.as_ref(), &server, "localhost").unwrap();
    assert_matches!(
        check(webpki.as_ref(), &server, "db.example.com"),
        Err(rustls::Error::InvalidCertificate(_))
    );
    assert_matches!(
        check(webpki.as_ref(), &der(&stranger.pem()), "localhost"),
        Err(rustls::Error::InvalidCertificate(_))
    );
}

#[test]
fn without_verification_any_certificate_and_name_pass() {
    setup_tracing();
    let dir = tempfile::tempdir().unwrap();
    let ca = test_ca();
    let (stranger, _) = leaf_cert(&test_ca(), &["somewhere.else"]);

    let config = ConnectionConfig {
        ca_cert_path: Some(write_file(dir.path(), "ca.crt", &ca.pem())),
        verify_host: false,
        ..Default::default()
    };
    let verifier = verifier_for(&config);
    assert!(!verifier.is_enforcing());
    let ServerVerifier::Insecure(insecure) = verifier else {
        panic!("expected the accept-any verifier");
    };
    check(insecure.as_ref(), &der(&stranger.pem()), "localhost").unwrap();
    check(insecure.as_ref(), &der(&ca.pem()), "10.0.0.1").unwrap();
}

#[test]
fn ca_bundle_with_several_certificates_is_loaded_whole() {
    let dir = tempfile::tempdir().unwrap();
    let bundle = format!("{}{}", test_ca().pem(), test_ca().pem());
    let roots = tls::load_ca_roots(&write_file(dir.path(), "bundle.crt", &bundle)).unwrap();
    assert_eq!(roots.len(), 2);
}

#[test]
fn ca_file_without_certificates_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ca = test_ca();
    let path = write_file(dir.path(), "ca.key", &ca.key().serialize_pem());
    assert_matches!(
        tls::load_ca_roots(&path),
        Err(ConfigError::NoCaCertificates(p)) if p == path
    );
}

#[test]
fn client_identity_is_presented_when_cert_and_key_match() {
    setup_tracing();
    let dir = tempfile::tempdir().unwrap();
    let ca = test_ca();
    let (client, client_key) = leaf_cert(&ca, &["scylla-shell-client"]);

    let config = ConnectionConfig {
        ca_cert_path: Some(write_file(dir.path(), "ca.crt", &ca.pem())),
        client_cert_path: Some(write_file(dir.path(), "client.crt", &client.pem())),
        client_key_path: Some(write_file(
            dir.path(),
            "client.key",
            &client_key.serialize_pem(),
        )),
        verify_host: true,
        ..Default::default()
    };

    let identity = TlsMaterial::load(&config, &crypto_provider())
        .unwrap()
        .client_identity
        .unwrap();
    assert_eq!(identity.cert_chain.len(), 1);

    let client_config = tls::assemble(&config).unwrap();
    assert!(client_config.client_auth_cert_resolver.has_certs());
}

#[test]
fn no_client_identity_without_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let (client, _) = leaf_cert(&test_ca(), &["scylla-shell-client"]);
    let config = ConnectionConfig {
        client_cert_path: Some(write_file(dir.path(), "client.crt", &client.pem())),
        ..Default::default()
    };
    let client_config = tls::assemble(&config).unwrap();
    assert!(!client_config.client_auth_cert_resolver.has_certs());
}

#[test]
fn mismatched_client_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let ca = test_ca();
    let (client, _) = leaf_cert(&ca, &["scylla-shell-client"]);
    let (_, other_key) = leaf_cert(&ca, &["someone-else"]);

    let config = ConnectionConfig {
        client_cert_path: Some(write_file(dir.path(), "client.crt", &client.pem())),
        client_key_path: Some(write_file(dir.path(), "other.key", &other_key.serialize_pem())),
        ..Default::default()
    };
    assert_matches!(
        tls::assemble(&config),
        Err(ConfigError::InvalidClientKeyPair(_))
    );
}

#[test]
fn key_file_without_key_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (client, _) = leaf_cert(&test_ca(), &["scylla-shell-client"]);
    let cert_path = write_file(dir.path(), "client.crt", &client.pem());

    let config = ConnectionConfig {
        client_cert_path: Some(cert_path.clone()),
        client_key_path: Some(cert_path),
        ..Default::default()
    };
    assert_matches!(
        tls::assemble(&config),
        Err(ConfigError::LoadClientKey { .. })
    );
}
