//! Key management commands.
//!
//! `regauth keys generate` - Generate a self-signed development certificate and key.

use anyhow::Context;
use regauth_token::KeyPair;
use std::fs;
use std::path::{Path, PathBuf};

/// Write `NAME.crt` and `NAME.key` (ECDSA P-256) into `output`.
pub fn generate(output: &Path, name: &str) -> anyhow::Result<(PathBuf, PathBuf)> {
    let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])
        .context("Failed to generate certificate")?;
    let cert_pem = cert.serialize_pem().context("Failed to encode certificate")?;
    let key_pem = cert.serialize_private_key_pem();

    // Sanity check: the pair must load the same way the server loads it.
    let keypair = KeyPair::from_pem(cert_pem.as_bytes(), key_pem.as_bytes())?;

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let cert_path = output.join(format!("{name}.crt"));
    let key_path = output.join(format!("{name}.key"));
    fs::write(&cert_path, cert_pem)?;
    write_private(&key_path, key_pem.as_bytes())?;

    println!("✔ Generated token signing key:");
    println!("  Certificate: {}", cert_path.display());
    println!("  Private key: {}", key_path.display());
    println!("  Algorithm:   {}", keypair.algorithm());
    println!("  Key id:      {}", keypair.key_id());
    println!();
    println!("⚠️  Self-signed for development only. Keep the private key out of version control.");

    Ok((cert_path, key_path))
}

#[cfg(unix)]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;
    use std::os::unix::fs::OpenOptionsExt;

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)
}

#[cfg(not(unix))]
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}
