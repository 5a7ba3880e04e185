//! One-time signing material generation.
//!
//! apksigner wants a PKCS#8 DER key and a PEM certificate. Both are
//! generated on first run and reused forever after; app updates signed
//! with a different key would refuse to install over the old ones.

use std::path::Path;

use anyhow::{Result, bail};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use tracing::info;

/// Ensure `key_path` and `cert_path` exist, generating a fresh
/// self-signed pair when both are missing. Exactly one of the two
/// existing is an error: regenerating only half the pair would break
/// signature verification silently.
pub fn ensure_signing_material(key_path: &Path, cert_path: &Path) -> Result<()> {
    match (key_path.exists(), cert_path.exists()) {
        (true, true) => return Ok(()),
        (false, false) => {}
        _ => bail!(
            "incomplete signing material: delete the remaining one of {} and {} to regenerate",
            key_path.display(),
            cert_path.display()
        ),
    }

    info!(key = %key_path.display(), cert = %cert_path.display(), "generating signing material");

    let key_pair = KeyPair::generate()?;
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CommonName, "n/a");
    params.distinguished_name = dn;
    let cert = params.self_signed(&key_pair)?;

    if let Some(parent) = key_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if let Some(parent) = cert_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(key_path, key_pair.serialize_der())?;
    std::fs::write(cert_path, cert.pem())?;
    Ok(())
}
