/*!
 * Principal extractor
 *
 * Responsibility:
 * - 認証 middleware が extensions に入れた Principal を handler に明示的に渡す
 * - HTTP / axum 依存は core に閉じ込め、型定義は types に分離する
 *
 * Public API:
 * - Principal
 * - CurrentPrincipal
 */

mod core;
mod types;

pub use core::CurrentPrincipal;
pub use types::Principal;
