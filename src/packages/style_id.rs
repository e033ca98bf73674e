//! Global style identifier codec
//!
//! Styles are numbered locally within their speaker (0..=31), but the
//! surrounding synthesis API addresses a style with a single signed 32-bit
//! integer that must be unique across every installed pack. The codec
//! builds that integer without a central allocation authority: the low 27
//! bits of a digest of the speaker identity, shifted left by 5, OR-ed with
//! the local index. Two distinct speaker identities whose 27-bit digest
//! prefixes coincide would collide; that residual risk is accepted and the
//! identifier width cannot grow (external compatibility constraint).

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use crate::error::{ManagerError, Result};

/// Bits of the speaker identity digest kept in the identifier
const IDENTITY_DIGEST_BITS: u32 = 27;
const IDENTITY_DIGEST_MASK: u32 = (1 << IDENTITY_DIGEST_BITS) - 1;

/// Bits reserved for the local style index
const LOCAL_INDEX_BITS: u32 = 5;

/// Largest local style index a speaker may declare
pub const MAX_LOCAL_INDEX: u32 = (1 << LOCAL_INDEX_BITS) - 1;

const SIGN_BIT: u32 = 1 << 31;

/// Globally unique style identifier
///
/// Always non-negative when interpreted as a two's-complement i32, and
/// always re-derivable from (speaker identity, local index); it is never
/// persisted on its own.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct StyleId(pub i32);

impl std::fmt::Display for StyleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Encode a (speaker identity, local style index) pair into a global
/// style identifier
pub fn encode(speaker_identity: &str, local_index: u32) -> Result<StyleId> {
    if speaker_identity.is_empty() {
        return Err(ManagerError::InvalidArgument(
            "speaker identity must be a non-empty string".to_string(),
        ));
    }
    if local_index > MAX_LOCAL_INDEX {
        return Err(ManagerError::InvalidArgument(format!(
            "local style index must be in 0..={MAX_LOCAL_INDEX} (got {local_index})"
        )));
    }

    // Low 27 bits of the 128-bit digest read as a big-endian integer
    let digest = Md5::digest(speaker_identity.as_bytes());
    let digest_low =
        u32::from_be_bytes([digest[12], digest[13], digest[14], digest[15]]) & IDENTITY_DIGEST_MASK;

    let mut id = (digest_low << LOCAL_INDEX_BITS) | local_index;
    // 27 + 5 bits fill the whole word, so the top bit can land on the sign
    // position; clear it to keep the i32 interpretation non-negative
    if id & SIGN_BIT != 0 {
        id &= !SIGN_BIT;
    }

    Ok(StyleId(id as i32))
}

/// Recover the local style index from a global identifier
///
/// This is a one-way partial inverse: the speaker identity is not
/// recoverable from the identifier alone. Callers needing the full
/// (speaker, style) pair scan the registry for a matching identifier.
pub fn local_index(id: StyleId) -> u32 {
    (id.0 as u32) & MAX_LOCAL_INDEX
}
