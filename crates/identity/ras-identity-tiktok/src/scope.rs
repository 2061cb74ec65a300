//! Scope parsing and user info field selection.

pub const SCOPE_BASIC: &str = "user.info.basic";
pub const SCOPE_PROFILE: &str = "user.info.profile";
pub const SCOPE_STATS: &str = "user.info.stats";

/// Fields available with `user.info.basic`
pub const BASE_FIELDS: [&str; 4] = ["open_id", "avatar_url", "avatar_url_100", "display_name"];

/// Fields unlocked by `user.info.profile`
pub const PROFILE_FIELDS: [&str; 5] = [
    "profile_web_link",
    "profile_deep_link",
    "bio_description",
    "is_verified",
    "username",
];

/// Fields unlocked by `user.info.stats`
pub const STATS_FIELDS: [&str; 4] = [
    "follower_count",
    "following_count",
    "likes_count",
    "video_count",
];

/// Scope identifiers, in the order they were listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GrantedScopes(Vec<String>);

impl GrantedScopes {
    /// Accepts comma and/or whitespace separated lists.
    pub fn parse(raw: &str) -> Self {
        let mut scopes: Vec<String> = Vec::new();
        for scope in raw
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
        {
            if !scopes.iter().any(|s| s == scope) {
                scopes.push(scope.to_string());
            }
        }
        Self(scopes)
    }

    pub fn contains(&self, scope: &str) -> bool {
        self.0.iter().any(|s| s == scope)
    }

    pub fn has_profile(&self) -> bool {
        self.contains(SCOPE_PROFILE)
    }

    pub fn has_stats(&self) -> bool {
        self.contains(SCOPE_STATS)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

/// Ordered set of user info fields to request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfoFields(Vec<&'static str>);

impl UserInfoFields {
    pub fn for_scopes(scopes: &GrantedScopes) -> Self {
        let mut fields = BASE_FIELDS.to_vec();
        if scopes.has_profile() {
            fields.extend(PROFILE_FIELDS);
        }
        if scopes.has_stats() {
            fields.extend(STATS_FIELDS);
        }
        Self(fields)
    }

    pub fn as_slice(&self) -> &[&'static str] {
        &self.0
    }

    /// Value of the `fields` query parameter
    pub fn to_query_value(&self) -> String {
        self.0.join(",")
    }
}
