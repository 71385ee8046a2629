//! Multipart boundary generation.
//!
//! The endpoint accepts a hand-framed multipart body, so each request gets
//! its own random numeric boundary token. Collisions within a run only
//! matter at birthday-bound probability over 10^30; nothing here needs to
//! be cryptographic.

use rand::Rng;

/// Number of random digits in a boundary token.
pub const BOUNDARY_DIGITS: usize = 30;

/// Dash prefix used by browsers when framing multipart bodies.
const DASH_PREFIX: &str = "-----------------------------";

/// Generate a random 30-digit boundary token.
pub fn digits() -> String {
    let mut rng = rand::thread_rng();
    (0..BOUNDARY_DIGITS)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Full boundary marker as it appears in the request body.
///
/// The `Content-Type` header carries this marker minus its first two dashes,
/// which is how browsers frame multipart forms.
pub fn marker() -> String {
    format!("{DASH_PREFIX}{}", digits())
}

/// The boundary parameter for the `Content-Type` header, derived from a
/// marker produced by [`marker`].
pub fn header_param(marker: &str) -> &str {
    &marker[2..]
}
