//! Password scrambles for the supported authentication plugins, plus the
//! RSA-encrypted password exchange used by caching_sha2_password full
//! authentication.

use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Oaep, RsaPublicKey};
use sha1::{Digest, Sha1};
use sha2::Sha256;

use crate::error::{Error, Result};

/// Servers send more salt than the scramble consumes; every plugin operates
/// on this prefix.
pub const SCRAMBLE_LENGTH: usize = 20;

pub const NATIVE_PASSWORD_PLUGIN: &str = "mysql_native_password";
pub const CACHING_SHA2_PLUGIN: &str = "caching_sha2_password";
pub const CLEAR_PASSWORD_PLUGIN: &str = "mysql_clear_password";

/// Status bytes following the 0x01 marker in caching_sha2_password extra
/// data packets.
pub const FAST_AUTH_SUCCESS: u8 = 0x03;
pub const PERFORM_FULL_AUTHENTICATION: u8 = 0x04;

/// Single byte the client sends to request the server's RSA public key.
pub const REQUEST_PUBLIC_KEY: u8 = 0x02;

/// XOR `data` against `key`, cycling the key when it is shorter.
pub fn xor_rotating(data: &[u8], key: &[u8]) -> Vec<u8> {
    data.iter()
        .zip(key.iter().cycle())
        .map(|(&d, &k)| d ^ k)
        .collect()
}

/// `SHA1(password) XOR SHA1(salt || SHA1(SHA1(password)))`, empty for an
/// empty password.
pub fn scramble_native_password(password: &[u8], salt: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let salt = &salt[..SCRAMBLE_LENGTH.min(salt.len())];

    let stage1 = Sha1::digest(password);
    let stage2 = Sha1::digest(stage1);
    let mut hasher = Sha1::new();
    hasher.update(salt);
    hasher.update(stage2);
    let token = hasher.finalize();

    xor_rotating(&token, &stage1)
}

/// `SHA256(password) XOR SHA256(SHA256(SHA256(password)) || salt)`, empty
/// for an empty password.
pub fn scramble_caching_sha2(password: &[u8], salt: &[u8]) -> Vec<u8> {
    if password.is_empty() {
        return Vec::new();
    }
    let salt = &salt[..SCRAMBLE_LENGTH.min(salt.len())];

    let stage1 = Sha256::digest(password);
    let mut hasher = Sha256::new();
    hasher.update(Sha256::digest(stage1));
    hasher.update(salt);
    let token = hasher.finalize();

    xor_rotating(&stage1, &token)
}

/// Compute the auth response for the named plugin.
pub fn scramble(plugin: &str, password: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    match plugin {
        NATIVE_PASSWORD_PLUGIN => Ok(scramble_native_password(password, salt)),
        CACHING_SHA2_PLUGIN => Ok(scramble_caching_sha2(password, salt)),
        CLEAR_PASSWORD_PLUGIN => {
            let mut out = password.to_vec();
            out.push(0);
            Ok(out)
        }
        other => Err(Error::NotSupported(format!(
            "authentication plugin {other:?} is not implemented"
        ))),
    }
}

/// Full-authentication fallback over an insecure transport: XOR the
/// NUL-terminated password with the salt and encrypt with the server's RSA
/// key using OAEP with a SHA-1 mask generation function.
pub fn encrypt_password_rsa(public_key_pem: &[u8], password: &[u8], salt: &[u8]) -> Result<Vec<u8>> {
    let pem = std::str::from_utf8(public_key_pem)
        .map_err(|_| Error::Interface("server public key is not valid PEM".to_string()))?;
    // MySQL sends an X.509 SubjectPublicKeyInfo key; old MariaDB builds use
    // the PKCS#1 form.
    let key = RsaPublicKey::from_public_key_pem(pem)
        .or_else(|_| RsaPublicKey::from_pkcs1_pem(pem))
        .map_err(|e| Error::Interface(format!("cannot parse server public key: {e}")))?;

    let mut plain = password.to_vec();
    plain.push(0);
    let masked = xor_rotating(&plain, &salt[..SCRAMBLE_LENGTH.min(salt.len())]);

    key.encrypt(&mut rand::thread_rng(), Oaep::new::<Sha1>(), &masked)
        .map_err(|e| Error::Interface(format!("RSA encryption failed: {e}")))
}
