use base64ct::{Base64, Base64UrlUnpadded, Base64Unpadded, Base64Url, Encoding};
use serde::{Deserialize, Serialize};

use super::Error;

/// Split a credential into its three segments.
pub(crate) fn segments(token: &str) -> Result<[&str; 3], Error> {
    let mut parts = token.split('.');
    let header = parts.next().ok_or(Error::TokenFormat)?;
    let payload = parts.next().ok_or(Error::TokenFormat)?;
    let signature = parts.next().ok_or(Error::TokenFormat)?;
    if parts.next().is_some() {
        return Err(Error::TokenFormat);
    }
    Ok([header, payload, signature])
}

/// Decode a segment written with either base64 alphabet, padded or not.
pub(crate) fn b64d(segment: &str) -> Result<Vec<u8>, Error> {
    let segment = segment.trim();
    let decoded = if segment.contains(['-', '_']) {
        if segment.ends_with('=') {
            Base64Url::decode_vec(segment)
        } else {
            Base64UrlUnpadded::decode_vec(segment)
        }
    } else if segment.ends_with('=') {
        Base64::decode_vec(segment)
    } else {
        Base64Unpadded::decode_vec(segment)
    };
    decoded.map_err(|_| Error::Base64)
}

pub(crate) fn b64e(bytes: &[u8]) -> String {
    Base64UrlUnpadded::encode_string(bytes)
}

pub(crate) fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(b64e(&json))
}

pub(crate) fn b64d_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, Error> {
    let bytes = b64d(segment)?;
    Ok(serde_json::from_slice(&bytes)?)
}
