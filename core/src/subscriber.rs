//! Subscriber identifiers.
//!
//! The provider addresses a member by the MD5 of its lower-cased email,
//! rendered as 32 lower-case hex digits.

use md5::{Digest, Md5};

/// Identifier of the member resource for `email`.
///
/// Case-insensitive: emails differing only in letter case map to the same
/// identifier. No syntax validation is performed.
pub fn subscriber_hash(email: &str) -> String {
    hex::encode(Md5::digest(email.to_lowercase().as_bytes()))
}
