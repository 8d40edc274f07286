use rand::RngCore;
use sha2::{Digest, Sha256};

/// Iteration count for the password digest. High enough to slow brute force
/// noticeably without making login latency visible.
const PASSWORD_ROUNDS: u32 = 4096;

const SALT_BYTES: usize = 16;
const SESSION_TOKEN_BYTES: usize = 32;

/// Produces a `salt$digest` string suitable for storage.
pub(crate) fn mint_hash(password: &str) -> String {
    let salt = random_hex(SALT_BYTES);
    let digest = digest_rounds(&salt, password);
    format!("{salt}${digest}")
}

/// Recomputes the digest under the stored salt and compares. Malformed
/// stored values verify as false rather than erroring.
pub(crate) fn verify(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) if !salt.is_empty() && !digest.is_empty() => {
            digest_rounds(salt, password) == digest
        }
        _ => false,
    }
}

/// Random opaque token for login sessions.
pub(crate) fn session_token() -> String {
    random_hex(SESSION_TOKEN_BYTES)
}

fn digest_rounds(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let mut digest = hasher.finalize();

    for _ in 1..PASSWORD_ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(digest);
        digest = hasher.finalize();
    }

    hex_encode(&digest)
}

fn random_hex(bytes: usize) -> String {
    let mut buffer = vec![0u8; bytes];
    rand::thread_rng().fill_bytes(&mut buffer);
    hex_encode(&buffer)
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mint_and_verify_round_trip() {
        let stored = mint_hash("correct horse battery");
        assert!(verify("correct horse battery", &stored));
        assert!(!verify("correct horse battery!", &stored));
    }

    #[test]
    fn salts_differ_between_mints() {
        let first = mint_hash("same password");
        let second = mint_hash("same password");
        assert_ne!(first, second);
        assert!(verify("same password", &first));
        assert!(verify("same password", &second));
    }

    #[test]
    fn malformed_stored_values_verify_false() {
        assert!(!verify("anything", ""));
        assert!(!verify("anything", "no-separator"));
        assert!(!verify("anything", "$digestonly"));
        assert!(!verify("anything", "saltonly$"));
    }

    #[test]
    fn session_tokens_are_unique_and_sized() {
        let first = session_token();
        let second = session_token();
        assert_eq!(first.len(), SESSION_TOKEN_BYTES * 2);
        assert_ne!(first, second);
    }
}
