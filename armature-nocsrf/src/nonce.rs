//! Random nonce generation

use rand::Rng;

/// Characters a nonce is drawn from.
///
/// The order (and the missing `k` / doubled `q`) is kept as-is so that tokens
/// stay compatible with existing deployments.
pub const ALPHABET: &[u8; 62] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijqlmnopqrtsuvwxyz0123456789";

/// Nonce length used for generated tokens
pub const NONCE_LENGTH: usize = 32;

/// Draw `length` characters uniformly from [`ALPHABET`] using `rng`.
pub fn random_string_with<R: Rng + ?Sized>(rng: &mut R, length: usize) -> String {
    (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Nonce source backed by the thread-local CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct NonceGenerator;

impl NonceGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a nonce of exactly `length` characters
    pub fn next(&self, length: usize) -> String {
        let mut rng = rand::thread_rng();
        random_string_with(&mut rng, length)
    }
}
