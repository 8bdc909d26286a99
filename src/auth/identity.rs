//! Login-safe usernames for federated principals.

use md5::{Digest, Md5};

/// Separator between the stripped local part and the hash suffix.
pub const USERNAME_SEPARATOR: char = 'x';

const HASH_SUFFIX_LEN: usize = 6;

/// Map a mail address to a login-safe username.
///
/// The local part is lowercased and stripped to `[a-z0-9]`, then suffixed
/// with `x` and the first six hex digits of the MD5 of the full address, so
/// `a.b@x` and `ab@x` still map to different names.
pub fn username_from_mail(mail_address: &str) -> String {
    let local_part = mail_address
        .split('@')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    let mut username: String = local_part
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();

    let digest = format!("{:x}", Md5::digest(mail_address.as_bytes()));
    username.push(USERNAME_SEPARATOR);
    username.push_str(&digest[..HASH_SUFFIX_LEN]);
    username
}
