use tokio_util::sync::{CancellationToken, DropGuard};

/// Cancellation scope of one request.
///
/// The auth middleware holds a drop guard for the lifetime of the request
/// future, so the token fires when the client goes away and the future is
/// dropped. Authorization lookups race against it.
#[derive(Debug, Clone, Default)]
pub struct RequestCancellation {
    token: CancellationToken,
}

impl RequestCancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn drop_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}
