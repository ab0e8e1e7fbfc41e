//! Key names shared with the bot and the web frontend.

/// Per-channel rotation and quiz state hash
pub fn channel(channel_id: &str) -> String {
    format!("channel:{}", channel_id)
}

/// Per-user upload status hash, polled by the web frontend
pub fn upload_status(user_id: &str) -> String {
    format!("sciolyid.upload.status:{}", user_id)
}

/// Per-user pending upload buffer
pub fn upload_save(user_id: &str) -> String {
    format!("sciolyid.upload.save:{}", user_id)
}

/// Which verification vote set an image was voted into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteKind {
    Invalid,
    Duplicate,
    Valid,
}

impl VoteKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteKind::Invalid => "invalid",
            VoteKind::Duplicate => "duplicate",
            VoteKind::Valid => "valid",
        }
    }
}

/// Score-sorted set of votes for one verdict
pub fn verify_images(kind: VoteKind) -> String {
    format!("sciolyid.verify.images:{}", kind.as_str())
}
