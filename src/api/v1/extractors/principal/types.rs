/*
 * Responsibility
 * - 上流の認証ステップが検証済みとして request に付与する identity claim の型
 * - 検証 (JWT 署名など) は middleware/services 側の責務。ここは契約だけ
 */

/// Verified identity claim attached to a request.
///
/// `subject` uniquely identifies the caller (e.g. an email address). It is kept
/// verbatim from the token; emptiness is judged by the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub subject: String,
}

impl Principal {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
        }
    }
}
