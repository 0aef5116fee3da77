/*
 * Responsibility
 * - identity resource の response DTO
 * - User (または不在) + self link を 1 つの JSON object にまとめる
 */
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;

use crate::repos::User;

/// Link segment used when there is no user (authentication disabled).
pub const ANONYMOUS_SEGMENT: &str = "me";

// RFC 3986 unreserved: ALPHA / DIGIT / "-" / "." / "_" / "~"
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelfLinks {
    #[serde(rename = "self")]
    pub self_: String,
}

/// `{ ...user fields..., "links": { "self": "<path>" } }`
///
/// User fields sit at the same level as `links` and are omitted entirely when
/// there is no user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityResource {
    #[serde(flatten)]
    pub user: Option<User>,
    pub links: SelfLinks,
}

impl IdentityResource {
    pub fn present(base_path: &str, user: Option<User>) -> Self {
        let segment = match &user {
            Some(u) => escape_segment(&u.name),
            None => ANONYMOUS_SEGMENT.to_string(),
        };

        Self {
            user,
            links: SelfLinks {
                self_: format!("{}/{}", base_path.trim_end_matches('/'), segment),
            },
        }
    }
}

/// Percent-encodes `name` as exactly one URL path segment.
///
/// Keeps the unreserved characters; everything else (`/`, `@`, `%`, `+`, `*`,
/// space, non-ASCII) is escaped as UTF-8 `%XX`.
fn escape_segment(name: &str) -> String {
    utf8_percent_encode(name, SEGMENT).to_string()
}
