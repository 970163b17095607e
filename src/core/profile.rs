use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::{Builder, Uuid};

const DEFAULT_USERNAME: &str = "Player";
const OFFLINE_ACCESS_TOKEN: &str = "0";
const OFFLINE_USER_TYPE: &str = "legacy";

/// Identity placeholders passed to the game for an offline session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineProfile {
    pub username: String,
    pub uuid: Uuid,
    pub access_token: String,
    pub user_type: String,
}

impl OfflineProfile {
    /// Build the offline profile for `username`.
    ///
    /// The UUID is the name-based (MD5, version 3) UUID of
    /// `OfflinePlayer:<username>`, the same value a server in offline mode
    /// assigns, so worlds keep their player data between launches.
    pub fn offline(username: &str) -> Self {
        let username = match username.trim() {
            "" => DEFAULT_USERNAME.to_string(),
            name => name.to_string(),
        };
        Self {
            uuid: offline_uuid(&username),
            username,
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            user_type: OFFLINE_USER_TYPE.into(),
        }
    }
}

fn offline_uuid(username: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{username}").as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest);
    Builder::from_md5_bytes(bytes).into_uuid()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_username_falls_back() {
        let profile = OfflineProfile::offline("   ");
        assert_eq!(profile.username, "Player");
        assert_eq!(profile.user_type, "legacy");
        assert_eq!(profile.access_token, "0");
    }

    #[test]
    fn uuid_is_stable_version_3() {
        let a = OfflineProfile::offline("Alex");
        let b = OfflineProfile::offline(" Alex ");
        assert_eq!(a.uuid, b.uuid);
        assert_eq!(a.uuid.get_version_num(), 3);
        assert_ne!(a.uuid, OfflineProfile::offline("Steve").uuid);
    }
}
