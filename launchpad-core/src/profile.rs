use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A saved game-server entry, in the shape the persisted list stores it.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ServerProfile {
    pub nickname: String,
    #[serde(default)]
    pub udp_endpoint: String,
    #[serde(default)]
    pub https_endpoint: String,
}

impl ServerProfile {
    /// A fresh profile with empty endpoints.
    pub fn named(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            udp_endpoint: String::new(),
            https_endpoint: String::new(),
        }
    }

    pub fn field(&self, field: ProfileField) -> &str {
        match field {
            ProfileField::Nickname => &self.nickname,
            ProfileField::UdpEndpoint => &self.udp_endpoint,
            ProfileField::HttpsEndpoint => &self.https_endpoint,
        }
    }

    pub fn set_field(&mut self, field: ProfileField, value: String) {
        match field {
            ProfileField::Nickname => self.nickname = value,
            ProfileField::UdpEndpoint => self.udp_endpoint = value,
            ProfileField::HttpsEndpoint => self.https_endpoint = value,
        }
    }
}

/// In-memory identity of a profile for the lifetime of the process.
///
/// Never persisted: the stored list is positional, so ids are handed out again
/// on every load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileId(pub u64);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileField {
    Nickname,
    UdpEndpoint,
    HttpsEndpoint,
}

impl ProfileField {
    pub const ALL: [ProfileField; 3] = [
        ProfileField::Nickname,
        ProfileField::UdpEndpoint,
        ProfileField::HttpsEndpoint,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            ProfileField::Nickname => "nickname",
            ProfileField::UdpEndpoint => "udp_endpoint",
            ProfileField::HttpsEndpoint => "https_endpoint",
        }
    }
}

impl fmt::Display for ProfileField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown profile field `{0}`")]
pub struct UnknownField(pub String);

impl FromStr for ProfileField {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "nickname" | "name" => Ok(ProfileField::Nickname),
            "udp_endpoint" | "udp" => Ok(ProfileField::UdpEndpoint),
            "https_endpoint" | "https" => Ok(ProfileField::HttpsEndpoint),
            other => Err(UnknownField(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_shape_uses_snake_case_keys() {
        let profile = ServerProfile {
            nickname: "Home".to_owned(),
            udp_endpoint: "127.0.0.1:20042".to_owned(),
            https_endpoint: "https://127.0.0.1:8443".to_owned(),
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["nickname"], "Home");
        assert_eq!(json["udp_endpoint"], "127.0.0.1:20042");
        assert_eq!(json["https_endpoint"], "https://127.0.0.1:8443");
    }

    #[test]
    fn missing_endpoints_default_to_empty() {
        let profile: ServerProfile = serde_json::from_str(r#"{"nickname":"Bare"}"#).unwrap();
        assert_eq!(profile, ServerProfile::named("Bare"));
    }

    #[test]
    fn field_names_parse_with_short_aliases() {
        assert_eq!("udp".parse::<ProfileField>(), Ok(ProfileField::UdpEndpoint));
        assert_eq!(
            "https_endpoint".parse::<ProfileField>(),
            Ok(ProfileField::HttpsEndpoint)
        );
        assert!("port".parse::<ProfileField>().is_err());
    }
}
