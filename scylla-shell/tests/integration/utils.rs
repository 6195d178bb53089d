use std::path::{Path, PathBuf};

use rcgen::{
    BasicConstraints, Certificate, CertificateParams, CertifiedIssuer, DistinguishedName, DnType,
    IsCa, KeyPair,
};

pub(crate) fn setup_tracing() {
    let _ = tracing_subscriber::fmt::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(tracing_subscriber::fmt::TestWriter::new())
        .try_init();
}

/// Writes `contents` to `dir/name` and returns the full path.
pub(crate) fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// A fresh self-signed certificate authority.
pub(crate) fn test_ca() -> CertifiedIssuer<'static, KeyPair> {
    let mut params = CertificateParams::new(vec!["scylla_shell_test_ca".to_owned()]).unwrap();
    params.distinguished_name = {
        let mut dn = DistinguishedName::new();
        dn.push(DnType::OrganizationName, "scylla_shell");
        dn.push(DnType::CommonName, "scylla_shell_tests");
        dn
    };
    params.use_authority_key_identifier_extension = true;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    CertifiedIssuer::self_signed(params, KeyPair::generate().unwrap()).unwrap()
}

/// An end-entity certificate for `names`, signed by `ca`.
pub(crate) fn leaf_cert(
    ca: &CertifiedIssuer<'static, KeyPair>,
    names: &[&str],
) -> (Certificate, KeyPair) {
    let params =
        CertificateParams::new(names.iter().map(|n| n.to_string()).collect::<Vec<_>>()).unwrap();
    let key = KeyPair::generate().unwrap();
    let cert = params.signed_by(&key, ca).unwrap();
    (cert, key)
}

/// Address of a live cluster with client encryption enabled.
pub(crate) fn cluster_address() -> (String, String) {
    let uri = std::env::var("SCYLLA_URI").unwrap_or_else(|_| "127.0.0.1:9042".to_string());
    match uri.rsplit_once(':') {
        Some((host, port)) => (host.to_owned(), port.to_owned()),
        None => (uri, "9042".to_owned()),
    }
}
