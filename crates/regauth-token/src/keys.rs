//! Signing key pair loaded from a PEM certificate and private key.
//!
//! The key id follows the registry's libtrust fingerprint: SHA-256 over the
//! DER SubjectPublicKeyInfo, truncated to 240 bits, base32-encoded and split
//! into twelve `:`-separated groups of four.

use crate::claims::SigningAlgorithm;
use crate::error::RegistryAuthError;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use signature::{SignatureEncoding, Signer};
use std::fmt;
use std::fs;
use std::path::Path;
use x509_parser::pem::Pem;

const BASE32_ALPHABET: &[u8; 32] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

enum SigningKey {
    Rsa(rsa::pkcs1v15::SigningKey<Sha256>),
    P256(p256::ecdsa::SigningKey),
    P384(p384::ecdsa::SigningKey),
    P521(p521::ecdsa::SigningKey),
}

/// Private signing key plus the public key it is advertised under.
pub struct KeyPair {
    signing_key: SigningKey,
    public_key_der: Vec<u8>,
    key_id: String,
}

impl KeyPair {
    /// Load a certificate and its private key from PEM files.
    pub fn load(
        certificate_path: &Path,
        private_key_path: &Path,
    ) -> Result<Self, RegistryAuthError> {
        let certificate_pem = fs::read(certificate_path)?;
        let private_key_pem = fs::read(private_key_path)?;
        let keypair = Self::from_pem(&certificate_pem, &private_key_pem)?;

        tracing::info!(
            certificate = %certificate_path.display(),
            algorithm = %keypair.algorithm(),
            key_id = %keypair.key_id(),
            "Loaded token signing key"
        );
        Ok(keypair)
    }

    /// Build a key pair from PEM contents, checking the certificate belongs to the key.
    pub fn from_pem(
        certificate_pem: &[u8],
        private_key_pem: &[u8],
    ) -> Result<Self, RegistryAuthError> {
        let certificate_spki = certificate_public_key(certificate_pem)?;
        let keypair = Self::from_private_key_pem(private_key_pem)?;

        if keypair.public_key_der != certificate_spki {
            return Err(RegistryAuthError::KeyMismatch);
        }
        Ok(keypair)
    }

    /// Build a key pair from a PKCS#8, PKCS#1 (RSA) or SEC1 (EC) private key alone.
    ///
    /// Blocks before the first `PRIVATE KEY` block (such as `EC PARAMETERS`) are skipped.
    pub fn from_private_key_pem(pem: &[u8]) -> Result<Self, RegistryAuthError> {
        let block = first_pem_block(pem, "private key", |label| {
            label == "PRIVATE KEY" || label.ends_with(" PRIVATE KEY")
        })?;

        match block.label.as_str() {
            "RSA PRIVATE KEY" => {
                let key = RsaPrivateKey::from_pkcs1_der(&block.contents)
                    .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?;
                Self::from_rsa(key)
            }
            "EC PRIVATE KEY" => {
                if let Ok(key) = p256::SecretKey::from_sec1_der(&block.contents) {
                    return Self::from_p256(key);
                }
                if let Ok(key) = p384::SecretKey::from_sec1_der(&block.contents) {
                    return Self::from_p384(key);
                }
                let key = p521::SecretKey::from_sec1_der(&block.contents)
                    .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?;
                Self::from_p521(key)
            }
            "PRIVATE KEY" => {
                if let Ok(key) = RsaPrivateKey::from_pkcs8_der(&block.contents) {
                    return Self::from_rsa(key);
                }
                if let Ok(key) = p256::SecretKey::from_pkcs8_der(&block.contents) {
                    return Self::from_p256(key);
                }
                if let Ok(key) = p384::SecretKey::from_pkcs8_der(&block.contents) {
                    return Self::from_p384(key);
                }
                if let Ok(key) = p521::SecretKey::from_pkcs8_der(&block.contents) {
                    return Self::from_p521(key);
                }
                Err(RegistryAuthError::UnsupportedKey(
                    "PKCS#8 key is neither RSA nor ECDSA P-256, P-384 or P-521".to_string(),
                ))
            }
            other => Err(RegistryAuthError::UnsupportedKey(format!(
                "unsupported private key PEM block {other:?}"
            ))),
        }
    }

    /// Use an RSA private key (signs with RS256).
    pub fn from_rsa(private_key: RsaPrivateKey) -> Result<Self, RegistryAuthError> {
        let public_key_der = RsaPublicKey::from(&private_key)
            .to_public_key_der()
            .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?
            .as_bytes()
            .to_vec();

        let signing_key = rsa::pkcs1v15::SigningKey::<Sha256>::new(private_key);
        Ok(Self::assemble(SigningKey::Rsa(signing_key), public_key_der))
    }

    /// Use an ECDSA P-256 private key (signs with ES256).
    pub fn from_p256(secret_key: p256::SecretKey) -> Result<Self, RegistryAuthError> {
        let public_key_der = secret_key
            .public_key()
            .to_public_key_der()
            .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?
            .as_bytes()
            .to_vec();

        let signing_key = p256::ecdsa::SigningKey::from(&secret_key);
        Ok(Self::assemble(SigningKey::P256(signing_key), public_key_der))
    }

    /// Use an ECDSA P-384 private key (signs with ES384).
    pub fn from_p384(secret_key: p384::SecretKey) -> Result<Self, RegistryAuthError> {
        let public_key_der = secret_key
            .public_key()
            .to_public_key_der()
            .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?
            .as_bytes()
            .to_vec();

        let signing_key = p384::ecdsa::SigningKey::from(&secret_key);
        Ok(Self::assemble(SigningKey::P384(signing_key), public_key_der))
    }

    /// Use an ECDSA P-521 private key (signs with ES512).
    pub fn from_p521(secret_key: p521::SecretKey) -> Result<Self, RegistryAuthError> {
        let public_key_der = secret_key
            .public_key()
            .to_public_key_der()
            .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?
            .as_bytes()
            .to_vec();

        let signing_key = p521::ecdsa::SigningKey::from_bytes(&secret_key.to_bytes())
            .map_err(|e| RegistryAuthError::UnsupportedKey(e.to_string()))?;
        Ok(Self::assemble(SigningKey::P521(signing_key), public_key_der))
    }

    fn assemble(signing_key: SigningKey, public_key_der: Vec<u8>) -> Self {
        let key_id = key_id_from_spki(&public_key_der);
        Self {
            signing_key,
            public_key_der,
            key_id,
        }
    }

    /// The algorithm this key signs with.
    pub fn algorithm(&self) -> SigningAlgorithm {
        match self.signing_key {
            SigningKey::Rsa(_) => SigningAlgorithm::Rs256,
            SigningKey::P256(_) => SigningAlgorithm::Es256,
            SigningKey::P384(_) => SigningAlgorithm::Es384,
            SigningKey::P521(_) => SigningAlgorithm::Es512,
        }
    }

    /// libtrust-style fingerprint of the public key.
    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    /// DER-encoded SubjectPublicKeyInfo.
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_key_der
    }

    /// Sign `message`, returning the raw signature and the algorithm actually used.
    ///
    /// ECDSA signatures are the fixed-width `r || s` form used by JWS.
    pub fn sign(&self, message: &[u8]) -> Result<(Vec<u8>, SigningAlgorithm), RegistryAuthError> {
        match &self.signing_key {
            SigningKey::Rsa(key) => {
                let sig: rsa::pkcs1v15::Signature = key
                    .try_sign(message)
                    .map_err(|e| RegistryAuthError::Signing(e.to_string()))?;
                Ok((sig.to_vec(), SigningAlgorithm::Rs256))
            }
            SigningKey::P256(key) => {
                let sig: p256::ecdsa::Signature = key
                    .try_sign(message)
                    .map_err(|e| RegistryAuthError::Signing(e.to_string()))?;
                Ok((sig.to_vec(), SigningAlgorithm::Es256))
            }
            SigningKey::P384(key) => {
                let sig: p384::ecdsa::Signature = key
                    .try_sign(message)
                    .map_err(|e| RegistryAuthError::Signing(e.to_string()))?;
                Ok((sig.to_vec(), SigningAlgorithm::Es384))
            }
            SigningKey::P521(key) => {
                let sig: p521::ecdsa::Signature = key
                    .try_sign(message)
                    .map_err(|e| RegistryAuthError::Signing(e.to_string()))?;
                Ok((sig.to_vec(), SigningAlgorithm::Es512))
            }
        }
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("algorithm", &self.algorithm())
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

/// SubjectPublicKeyInfo of the first certificate in `pem`.
fn certificate_public_key(pem: &[u8]) -> Result<Vec<u8>, RegistryAuthError> {
    let block = first_pem_block(pem, "certificate", |label| label == "CERTIFICATE")?;
    let certificate = block
        .parse_x509()
        .map_err(|e| RegistryAuthError::UnsupportedKey(format!("invalid certificate: {e}")))?;
    Ok(certificate.public_key().raw.to_vec())
}

/// First PEM block whose label satisfies `wanted`, skipping any others.
fn first_pem_block(
    pem: &[u8],
    what: &str,
    wanted: impl Fn(&str) -> bool,
) -> Result<Pem, RegistryAuthError> {
    for block in Pem::iter_from_buffer(pem) {
        let block = block
            .map_err(|e| RegistryAuthError::UnsupportedKey(format!("invalid {what} PEM: {e}")))?;
        if wanted(&block.label) {
            return Ok(block);
        }
    }
    Err(RegistryAuthError::UnsupportedKey(format!("no {what} PEM block found")))
}

fn key_id_from_spki(spki_der: &[u8]) -> String {
    let digest = Sha256::digest(spki_der);
    let encoded: Vec<char> = base32_no_pad(&digest[..30]).chars().collect();

    encoded
        .chunks(4)
        .map(|group| group.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(":")
}

/// RFC 4648 base32 (standard alphabet) without `=` padding.
fn base32_no_pad(data: &[u8]) -> String {
    let mut out = String::with_capacity((data.len() * 8).div_ceil(5));
    let mut buffer: u32 = 0;
    let mut bits = 0;

    for &byte in data {
        buffer = ((buffer << 8) | u32::from(byte)) & 0xffff;
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(BASE32_ALPHABET[((buffer >> bits) & 0x1f) as usize] as char);
        }
    }
    if bits > 0 {
        out.push(BASE32_ALPHABET[((buffer << (5 - bits)) & 0x1f) as usize] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use signature::Verifier;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn self_signed() -> (String, String) {
        let cert = rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        (cert.serialize_pem().unwrap(), cert.serialize_private_key_pem())
    }

    #[test]
    fn test_base32_vectors() {
        let cases = [
            ("", ""),
            ("f", "MY"),
            ("fo", "MZXQ"),
            ("foo", "MZXW6"),
            ("foob", "MZXW6YQ"),
            ("fooba", "MZXW6YTB"),
            ("foobar", "MZXW6YTBOI"),
        ];
        for (input, want) in cases {
            assert_eq!(base32_no_pad(input.as_bytes()), want, "input {input:?}");
        }
    }

    #[test]
    fn test_key_id_format() {
        assert_eq!(
            key_id_from_spki(b"hello"),
            "FTZE:3OS7:WCRQ:4JXI:HMVM:LOPC:TYNR:MHS4:D6TU:EXTT:AQZW:FE4L"
        );
    }

    #[test]
    fn test_from_pem_self_signed() {
        let (cert_pem, key_pem) = self_signed();
        let keypair = KeyPair::from_pem(cert_pem.as_bytes(), key_pem.as_bytes()).unwrap();

        assert_eq!(keypair.algorithm(), SigningAlgorithm::Es256);
        let groups: Vec<&str> = keypair.key_id().split(':').collect();
        assert_eq!(groups.len(), 12);
        assert!(groups.iter().all(|g| g.len() == 4));
    }

    #[test]
    fn test_mismatched_certificate_rejected() {
        let (cert_pem, _) = self_signed();
        let (_, other_key_pem) = self_signed();

        let err = KeyPair::from_pem(cert_pem.as_bytes(), other_key_pem.as_bytes()).unwrap_err();
        assert!(matches!(err, RegistryAuthError::KeyMismatch));
    }

    #[test]
    fn test_wrong_pem_blocks_rejected() {
        let (cert_pem, key_pem) = self_signed();

        // key where the certificate should be
        let err = KeyPair::from_pem(key_pem.as_bytes(), key_pem.as_bytes()).unwrap_err();
        assert!(matches!(err, RegistryAuthError::UnsupportedKey(_)));

        // certificate where the key should be
        let err = KeyPair::from_private_key_pem(cert_pem.as_bytes()).unwrap_err();
        assert!(matches!(err, RegistryAuthError::UnsupportedKey(_)));

        let err = KeyPair::from_private_key_pem(b"not a pem").unwrap_err();
        assert!(matches!(err, RegistryAuthError::UnsupportedKey(_)));
    }

    #[test]
    fn test_load_from_files() {
        let (cert_pem, key_pem) = self_signed();

        let mut cert_file = NamedTempFile::new().unwrap();
        let mut key_file = NamedTempFile::new().unwrap();
        write!(cert_file, "{cert_pem}").unwrap();
        write!(key_file, "{key_pem}").unwrap();

        let loaded = KeyPair::load(cert_file.path(), key_file.path()).unwrap();
        let direct = KeyPair::from_pem(cert_pem.as_bytes(), key_pem.as_bytes()).unwrap();
        assert_eq!(loaded.key_id(), direct.key_id());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = KeyPair::load(Path::new("/nonexistent/token.crt"), Path::new("/nonexistent/token.key"))
            .unwrap_err();
        assert!(matches!(err, RegistryAuthError::Io(_)));
    }

    #[test]
    fn test_p256_signature_verifies() {
        let secret = p256::SecretKey::random(&mut rand::thread_rng());
        let verifying_key = p256::ecdsa::VerifyingKey::from(secret.public_key());
        let keypair = KeyPair::from_p256(secret).unwrap();

        let (sig, alg) = keypair.sign(b"header.claims").unwrap();
        assert_eq!(alg, SigningAlgorithm::Es256);
        assert_eq!(sig.len(), 64);

        let sig = p256::ecdsa::Signature::from_slice(&sig).unwrap();
        verifying_key.verify(b"header.claims", &sig).unwrap();
    }

    #[test]
    fn test_leading_ec_parameters_block_skipped() {
        use p256::pkcs8::LineEnding;

        let secret = p256::SecretKey::random(&mut rand::thread_rng());
        let expected = KeyPair::from_p256(secret.clone()).unwrap();
        let sec1 = secret.to_sec1_pem(LineEnding::LF).unwrap();
        let pem = format!(
            "-----BEGIN EC PARAMETERS-----\nBggqhkjOPQMBBw==\n-----END EC PARAMETERS-----\n{}",
            sec1.as_str()
        );

        let keypair = KeyPair::from_private_key_pem(pem.as_bytes()).unwrap();
        assert_eq!(keypair.algorithm(), SigningAlgorithm::Es256);
        assert_eq!(keypair.key_id(), expected.key_id());
    }

    #[test]
    fn test_certificate_found_after_other_blocks() {
        let (cert_pem, key_pem) = self_signed();

        // combined file with the key ahead of the certificate
        let bundle = format!("{key_pem}{cert_pem}");
        let keypair = KeyPair::from_pem(bundle.as_bytes(), bundle.as_bytes()).unwrap();
        let direct = KeyPair::from_pem(cert_pem.as_bytes(), key_pem.as_bytes()).unwrap();
        assert_eq!(keypair.key_id(), direct.key_id());
    }

    #[test]
    fn test_p384_certificate_loads_and_verifies() {
        use p384::pkcs8::DecodePublicKey;

        let mut params = rcgen::CertificateParams::new(vec!["localhost".to_string()]);
        params.alg = &rcgen::PKCS_ECDSA_P384_SHA384;
        let cert = rcgen::Certificate::from_params(params).unwrap();
        let keypair = KeyPair::from_pem(
            cert.serialize_pem().unwrap().as_bytes(),
            cert.serialize_private_key_pem().as_bytes(),
        )
        .unwrap();
        assert_eq!(keypair.algorithm(), SigningAlgorithm::Es384);

        let (sig, alg) = keypair.sign(b"header.claims").unwrap();
        assert_eq!(alg, SigningAlgorithm::Es384);
        assert_eq!(sig.len(), 96);

        let verifying_key = p384::ecdsa::VerifyingKey::from_public_key_der(keypair.public_key_der()).unwrap();
        let sig = p384::ecdsa::Signature::from_slice(&sig).unwrap();
        verifying_key.verify(b"header.claims", &sig).unwrap();
    }

    #[test]
    fn test_p521_key_loads_and_verifies() {
        use p521::elliptic_curve::sec1::ToEncodedPoint;
        use p521::pkcs8::{EncodePrivateKey, LineEnding};

        let secret = p521::SecretKey::random(&mut rand::thread_rng());
        let public_point = secret.public_key().to_encoded_point(false);
        let pkcs8 = secret.to_pkcs8_pem(LineEnding::LF).unwrap();
        let sec1 = secret.to_sec1_pem(LineEnding::LF).unwrap();

        let keypair = KeyPair::from_private_key_pem(pkcs8.as_bytes()).unwrap();
        let from_sec1 = KeyPair::from_private_key_pem(sec1.as_bytes()).unwrap();
        assert_eq!(keypair.algorithm(), SigningAlgorithm::Es512);
        assert_eq!(from_sec1.key_id(), keypair.key_id());

        let (sig, alg) = keypair.sign(b"header.claims").unwrap();
        assert_eq!(alg, SigningAlgorithm::Es512);
        assert_eq!(sig.len(), 132);

        let verifying_key = p521::ecdsa::VerifyingKey::from_sec1_bytes(public_point.as_bytes()).unwrap();
        let sig = p521::ecdsa::Signature::from_slice(&sig).unwrap();
        verifying_key.verify(b"header.claims", &sig).unwrap();
    }
}
