//! One-response-at-a-time gate for generation requests.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Nothing in flight; the next request goes out immediately.
    Idle,
    /// `response.create` sent, `response.created` not seen yet.
    Requested,
    /// The server is generating a response.
    Active,
}

/// What to send when the gate opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release<T> {
    /// Re-issue a request the server turned away because another
    /// response was running. Its item was already delivered.
    Retry,
    /// Send the next queued item.
    Next(T),
}

/// Serializes response generation: at most one request outstanding,
/// queued items released strictly in arrival order.
#[derive(Debug)]
pub struct ResponseGate<T> {
    state: GateState,
    pending: VecDeque<T>,
    retry: bool,
}

impl<T> Default for ResponseGate<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResponseGate<T> {
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
            pending: VecDeque::new(),
            retry: false,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Returns the item if it may be sent now, otherwise queues it.
    pub fn request(&mut self, item: T) -> Option<T> {
        if self.state == GateState::Idle && self.pending.is_empty() {
            self.state = GateState::Requested;
            Some(item)
        } else {
            self.pending.push_back(item);
            None
        }
    }

    /// `response.created`. Also covers responses the server starts on its
    /// own (voice activity detection).
    pub fn on_created(&mut self) {
        self.state = GateState::Active;
    }

    /// `response.done`: retry a turned-away request first, otherwise
    /// release the next queued item, if any.
    pub fn on_done(&mut self) -> Option<Release<T>> {
        if std::mem::take(&mut self.retry) {
            self.state = GateState::Requested;
            return Some(Release::Retry);
        }
        self.release().map(Release::Next)
    }

    /// `error`: a failed request no longer blocks the queue. Errors
    /// during an active response are left to `response.done`.
    pub fn on_error(&mut self) -> Option<T> {
        match self.state {
            GateState::Requested => self.release(),
            GateState::Idle | GateState::Active => None,
        }
    }

    /// Our request was refused because a response is already running,
    /// e.g. one the server started on voice activity before it saw ours.
    /// The request is re-issued once that response is done.
    pub fn on_rejected_busy(&mut self) {
        self.retry = true;
        self.state = GateState::Active;
    }

    /// Drop everything, e.g. when the connection goes away.
    pub fn reset(&mut self) {
        self.state = GateState::Idle;
        self.pending.clear();
        self.retry = false;
    }

    fn release(&mut self) -> Option<T> {
        match self.pending.pop_front() {
            Some(next) => {
                self.state = GateState::Requested;
                Some(next)
            }
            None => {
                self.state = GateState::Idle;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_request_goes_out() {
        let mut gate = ResponseGate::new();
        assert_eq!(gate.request("a"), Some("a"));
        assert_eq!(gate.state(), GateState::Requested);
    }

    #[test]
    fn test_requests_queue_until_done_in_fifo_order() {
        let mut gate = ResponseGate::new();
        assert_eq!(gate.request(1), Some(1));
        // Queued before the server even acknowledged the first request.
        assert_eq!(gate.request(2), None);
        gate.on_created();
        assert_eq!(gate.request(3), None);
        assert_eq!(gate.pending_len(), 2);

        assert_eq!(gate.on_done(), Some(Release::Next(2)));
        assert_eq!(gate.state(), GateState::Requested);
        gate.on_created();
        assert_eq!(gate.on_done(), Some(Release::Next(3)));
        gate.on_created();
        assert_eq!(gate.on_done(), None);
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_server_initiated_response_blocks_requests() {
        let mut gate = ResponseGate::new();
        gate.on_created();
        assert_eq!(gate.request("late"), None);
        assert_eq!(gate.on_done(), Some(Release::Next("late")));
    }

    #[test]
    fn test_error_while_requested_releases_next() {
        let mut gate = ResponseGate::new();
        assert_eq!(gate.request("a"), Some("a"));
        assert_eq!(gate.request("b"), None);

        assert_eq!(gate.on_error(), Some("b"));
        assert_eq!(gate.on_error(), None);
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_error_while_active_is_ignored() {
        let mut gate = ResponseGate::new();
        gate.request("a");
        gate.on_created();
        gate.request("b");
        assert_eq!(gate.on_error(), None);
        assert_eq!(gate.state(), GateState::Active);
        assert_eq!(gate.on_done(), Some(Release::Next("b")));
    }

    #[test]
    fn test_busy_rejection_retries_before_queue() {
        let mut gate = ResponseGate::new();
        assert_eq!(gate.request("a"), Some("a"));
        // Voice activity started a response before ours was seen.
        gate.on_created();
        gate.on_rejected_busy();
        assert_eq!(gate.request("b"), None);

        assert_eq!(gate.on_done(), Some(Release::Retry));
        assert_eq!(gate.state(), GateState::Requested);
        gate.on_created();
        assert_eq!(gate.on_done(), Some(Release::Next("b")));
        gate.on_created();
        assert_eq!(gate.on_done(), None);
        assert_eq!(gate.state(), GateState::Idle);
    }

    #[test]
    fn test_reset_forgets_pending_retry() {
        let mut gate: ResponseGate<&str> = ResponseGate::new();
        gate.request("a");
        gate.on_rejected_busy();
        gate.reset();
        assert_eq!(gate.on_done(), None);
        assert_eq!(gate.state(), GateState::Idle);
    }
}
