/// Team invitation codes
///
/// Codes are opaque to clients: `inv_` followed by 32 random base62
/// characters (`[A-Za-z0-9]`). Uniqueness is guaranteed by the
/// `team_invites_code_key` constraint; a collision surfaces as a unique
/// violation on insert.
///
/// ```
/// use teamtask_shared::auth::invite_code::{generate_invite_code, is_well_formed, INVITE_CODE_LENGTH};
///
/// let code = generate_invite_code();
/// assert!(code.starts_with("inv_"));
/// assert_eq!(code.len(), INVITE_CODE_LENGTH);
/// assert!(is_well_formed(&code));
/// ```

use rand::Rng;

const CODE_PREFIX: &str = "inv_";
const CODE_RANDOM_LENGTH: usize = 32;
const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Total length of an invitation code
pub const INVITE_CODE_LENGTH: usize = CODE_PREFIX.len() + CODE_RANDOM_LENGTH;

/// Generates a fresh invitation code
pub fn generate_invite_code() -> String {
    let mut rng = rand::thread_rng();

    let random: String = (0..CODE_RANDOM_LENGTH)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();

    format!("{}{}", CODE_PREFIX, random)
}

/// Checks whether a string has the shape of a generated code
///
/// Only used to reject obvious garbage early; lookups still go to the database.
pub fn is_well_formed(code: &str) -> bool {
    code.len() == INVITE_CODE_LENGTH
        && code.starts_with(CODE_PREFIX)
        && code[CODE_PREFIX.len()..].bytes().all(|b| b.is_ascii_alphanumeric())
}
