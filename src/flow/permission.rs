//! Microphone permission gate.
//!
//! The gate asks the capability broker for microphone access once per
//! recording screen. The broker call may block (device probing, OS prompts),
//! so it runs on a blocking worker and its answer is awaited by the UI task
//! before any screen state changes.

use super::error::WhistleError;
use std::sync::Arc;

/// Message shown instead of the recording controls when access is missing.
pub const ACCESS_FAILED_MESSAGE: &str =
    "Recording failed: please ensure the app has access to your microphone.";

/// Message shown when the broker says asking again is pointless.
pub const PERMANENTLY_DENIED_MESSAGE: &str =
    "Microphone access is permanently denied. Grant access in your system settings, then start whistle again.";

/// Broker answer to a microphone access request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrophoneAccess {
    Granted,
    Denied,
    /// Denied, and the broker cannot prompt again.
    PermanentlyDenied,
}

/// Host facility that owns the audio session and microphone capability.
pub trait CapabilityBroker: Send + Sync + 'static {
    /// Activates the audio session for recording and playback.
    fn activate(&self) -> Result<(), WhistleError>;

    /// Asks for microphone access. Called at most once per gate.
    fn request_microphone_access(&self) -> Result<MicrophoneAccess, WhistleError>;

    /// Releases the audio session.
    fn deactivate(&self);
}

/// What the recording screen should show after the gate has run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Granted,
    /// Static failure message; no controls, no retry.
    Unavailable(&'static str),
}

/// Requests microphone access exactly once and remembers the answer.
pub struct PermissionGate<B: CapabilityBroker> {
    broker: Arc<B>,
    outcome: Option<GateOutcome>,
    /// Set once `activate` succeeded; the session then needs releasing.
    activated: bool,
}

impl<B: CapabilityBroker> PermissionGate<B> {
    pub fn new(broker: Arc<B>) -> Self {
        Self {
            broker,
            outcome: None,
            activated: false,
        }
    }

    /// Outcome of the request, if it has been made.
    pub fn outcome(&self) -> Option<GateOutcome> {
        self.outcome
    }

    /// Activates the session and requests access; later calls return the first answer.
    pub async fn request(&mut self) -> GateOutcome {
        if let Some(outcome) = self.outcome() {
            return outcome;
        }

        let broker = Arc::clone(&self.broker);
        let task = tokio::task::spawn_blocking(move || {
            if let Err(e) = broker.activate() {
                return (false, Err(e));
            }
            (true, broker.request_microphone_access())
        })
        .await;
        let (activated, answer) = match task {
            Ok(pair) => pair,
            Err(e) => (
                false,
                Err(WhistleError::SessionSetupFailed(anyhow::anyhow!(
                    "Permission task failed: {e}"
                ))),
            ),
        };
        self.activated = activated;

        let outcome = match answer {
            Ok(MicrophoneAccess::Granted) => {
                tracing::info!("Microphone access granted");
                GateOutcome::Granted
            }
            Ok(MicrophoneAccess::Denied) => {
                tracing::warn!("{}", WhistleError::PermissionDenied);
                GateOutcome::Unavailable(ACCESS_FAILED_MESSAGE)
            }
            Ok(MicrophoneAccess::PermanentlyDenied) => {
                tracing::warn!("Microphone access permanently denied");
                GateOutcome::Unavailable(PERMANENTLY_DENIED_MESSAGE)
            }
            Err(e) => {
                tracing::error!("Microphone access request failed: {}", e);
                GateOutcome::Unavailable(ACCESS_FAILED_MESSAGE)
            }
        };

        self.outcome = Some(outcome);
        outcome
    }

    /// Releases the audio session if it was activated, whatever the answer.
    pub fn release(&self) {
        if self.activated {
            self.broker.deactivate();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Broker with a scripted answer that counts requests.
    pub(crate) struct ScriptedBroker {
        answer: Option<MicrophoneAccess>,
        fail_activation: bool,
        pub(crate) requests: AtomicUsize,
        pub(crate) deactivations: AtomicUsize,
    }

    impl ScriptedBroker {
        pub(crate) fn answering(answer: MicrophoneAccess) -> Self {
            Self {
                answer: Some(answer),
                fail_activation: false,
                requests: AtomicUsize::new(0),
                deactivations: AtomicUsize::new(0),
            }
        }

        fn failing_activation() -> Self {
            Self {
                answer: None,
                fail_activation: true,
                requests: AtomicUsize::new(0),
                deactivations: AtomicUsize::new(0),
            }
        }
    }

    impl CapabilityBroker for ScriptedBroker {
        fn activate(&self) -> Result<(), WhistleError> {
            if self.fail_activation {
                return Err(WhistleError::SessionSetupFailed(anyhow::anyhow!("no host")));
            }
            Ok(())
        }

        fn request_microphone_access(&self) -> Result<MicrophoneAccess, WhistleError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.answer.ok_or(WhistleError::PermissionDenied)
        }

        fn deactivate(&self) {
            self.deactivations.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_grant_is_requested_once() {
        let broker = Arc::new(ScriptedBroker::answering(MicrophoneAccess::Granted));
        let mut gate = PermissionGate::new(Arc::clone(&broker));

        assert_eq!(gate.outcome(), None);
        assert_eq!(gate.request().await, GateOutcome::Granted);
        assert_eq!(gate.request().await, GateOutcome::Granted);
        assert_eq!(broker.requests.load(Ordering::SeqCst), 1);

        gate.release();
        assert_eq!(broker.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_denial_shows_failure_message() {
        let broker = Arc::new(ScriptedBroker::answering(MicrophoneAccess::Denied));
        let mut gate = PermissionGate::new(Arc::clone(&broker));
        assert_eq!(
            gate.request().await,
            GateOutcome::Unavailable(ACCESS_FAILED_MESSAGE)
        );

        gate.release();
        assert_eq!(broker.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_permanent_denial_has_its_own_message() {
        let broker = Arc::new(ScriptedBroker::answering(
            MicrophoneAccess::PermanentlyDenied,
        ));
        let mut gate = PermissionGate::new(Arc::clone(&broker));
        assert_eq!(
            gate.request().await,
            GateOutcome::Unavailable(PERMANENTLY_DENIED_MESSAGE)
        );

        gate.release();
        assert_eq!(broker.deactivations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_setup_failure_skips_request() {
        let broker = Arc::new(ScriptedBroker::failing_activation());
        let mut gate = PermissionGate::new(Arc::clone(&broker));
        assert_eq!(
            gate.request().await,
            GateOutcome::Unavailable(ACCESS_FAILED_MESSAGE)
        );
        assert_eq!(broker.requests.load(Ordering::SeqCst), 0);

        gate.release();
        assert_eq!(broker.deactivations.load(Ordering::SeqCst), 0);
    }
}
