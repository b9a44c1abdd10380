//! Opaque refresh token generation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Entropy per refresh token, 256 bits
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a refresh token from the OS CSPRNG, base64url encoded without padding
pub fn generate_refresh_token() -> Result<String, rand::Error> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}
