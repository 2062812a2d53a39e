//! Connection bring-up state machine.
//!
//! Models the sequence a client must run through before any task-level
//! command may be queued: greeting, capability discovery, optional STARTTLS,
//! credential submission, and a best-effort round of post-authentication
//! negotiation (ID, ENABLE, COMPRESS). This is deliberately sans-I/O: the
//! machine only decides what to send next given what arrived; a driver
//! (the type-state client, or a future `protocol::Protocol` integration)
//! performs the actual reads and writes and feeds the results back in as
//! events.
//!
//! The state sequence follows RFC 3501/9051 bring-up: a server may greet
//! with `PREAUTH` (already authenticated, e.g. by IP allowlist), `OK` (normal,
//! not yet authenticated) or `BYE` (refusing the connection outright). From
//! there capabilities are learned (either riding on the greeting's
//! `[CAPABILITY ...]` code or via an explicit `CAPABILITY` command), a
//! `LOGINDISABLED` capability or a caller policy can force `STARTTLS` before
//! credentials may be sent, and a successful `STARTTLS` discards every
//! capability learned so far (a TLS-stripping proxy could have lied about
//! them) and forces a fresh `CAPABILITY` round-trip.

use crate::types::{Capability, ResponseCode, Status};

/// Where the bring-up sequence currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BringUpState {
    /// Waiting for the server greeting.
    WaitingGreeting,
    /// Greeting arrived without capabilities; waiting for an explicit `CAPABILITY` reply.
    WaitingCapabilities,
    /// Capabilities known; deciding between STARTTLS, LOGIN, or failure.
    PostCapabilities,
    /// `STARTTLS` issued; waiting for its tagged result.
    StartTlsPending,
    /// Encrypted (or policy didn't require it) and capabilities settled; waiting for credentials to be submitted.
    ReadyToLogin,
    /// `LOGIN`/`AUTHENTICATE` issued; waiting for its tagged result.
    LoggingIn,
    /// Login succeeded without a `[CAPABILITY ...]` code; waiting for a fresh `CAPABILITY` reply.
    WaitingPostLoginCapabilities,
    /// Authenticated; running the best-effort ID/ENABLE/COMPRESS round.
    Authenticated,
    /// Bring-up complete. The scheduler may now send task-level commands.
    Ready,
    /// Bring-up failed; the connection should be torn down.
    Failed,
}

/// A best-effort step run once authenticated. Failure (`NO`/`BAD`) never
/// fails bring-up, it just skips to the next step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BestEffortStep {
    Id,
    Enable,
    Compress,
}

/// Caller-supplied policy shaping how bring-up proceeds.
#[derive(Debug, Clone, Default)]
pub struct BringUpPolicy {
    /// Force `STARTTLS` even if the server didn't send `LOGINDISABLED`.
    pub require_tls: bool,
    /// The transport is already encrypted (implicit TLS), so `STARTTLS` is never sent.
    pub already_encrypted: bool,
    /// Send a best-effort `ID` command once authenticated.
    pub send_id: bool,
    /// `ID` field-value parameters to send, if `send_id` is set.
    pub id_parameters: Option<Vec<(String, String)>>,
    /// Capabilities to best-effort `ENABLE` once authenticated (e.g. `QRESYNC`, `CONDSTORE`).
    pub enable_capabilities: Vec<String>,
    /// Attempt best-effort `COMPRESS DEFLATE` once authenticated.
    pub try_compress: bool,
}

/// An event fed into the bring-up machine by its driver.
#[derive(Debug, Clone)]
pub enum BringUpEvent {
    /// The server's initial greeting.
    Greeting {
        /// Greeting status (`PreAuth`, `Ok`, or `Bye`).
        status: Status,
        /// Response code carried on the greeting, if any.
        code: Option<ResponseCode>,
        /// Human-readable greeting text.
        text: String,
    },
    /// A `CAPABILITY` command's untagged `CAPABILITY` response arrived.
    CapabilitiesReceived(Vec<Capability>),
    /// `STARTTLS`'s tagged response was `OK`.
    StartTlsOk,
    /// `STARTTLS`'s tagged response was `NO`/`BAD`.
    StartTlsFailed(String),
    /// `LOGIN`/`AUTHENTICATE`'s tagged response was `OK`.
    LoginOk {
        /// Response code carried on the `OK`, if any.
        code: Option<ResponseCode>,
    },
    /// `LOGIN`/`AUTHENTICATE`'s tagged response was `NO`/`BAD`.
    LoginFailed(String),
    /// A best-effort command (`ID`/`ENABLE`/`COMPRESS`) completed, regardless of outcome.
    BestEffortDone,
    /// The server sent `BYE`. Valid at any stage; always fails bring-up.
    Bye(String),
}

/// An instruction for the driver: what to send, or that bring-up has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BringUpAction {
    /// Send a `CAPABILITY` command.
    SendCapability,
    /// Send `STARTTLS`.
    SendStartTls,
    /// Capabilities are settled; the driver should submit credentials next
    /// (via `LOGIN` or `AUTHENTICATE`) and report the result.
    ReadyForCredentials,
    /// Send a best-effort `ID` command.
    SendId,
    /// Send a best-effort `ENABLE` for these capability names.
    SendEnable(Vec<String>),
    /// Send a best-effort `COMPRESS DEFLATE`.
    SendCompress,
    /// Bring-up is complete; the scheduler may start dispatching task-level commands.
    Ready,
    /// Bring-up failed with this reason; the connection should be closed.
    Fail(String),
}

/// The connection bring-up state machine (spec C6).
///
/// Construct with a [`BringUpPolicy`], then feed it events via [`step`](Self::step)
/// as the driver completes each read. Each call returns the actions the
/// driver should take immediately (usually one, occasionally two: e.g.
/// `STARTTLS` success yields only [`BringUpAction::SendCapability`] since
/// the prior capability set was discarded in place).
#[derive(Debug, Clone)]
pub struct BringUpFsm {
    state: BringUpState,
    policy: BringUpPolicy,
    capabilities: Vec<Capability>,
    require_start_tls_in_future: bool,
    best_effort_queue: std::collections::VecDeque<BestEffortStep>,
}

impl BringUpFsm {
    /// Creates a new bring-up machine with the given policy.
    #[must_use]
    pub fn new(policy: BringUpPolicy) -> Self {
        Self {
            state: BringUpState::WaitingGreeting,
            policy,
            capabilities: Vec::new(),
            require_start_tls_in_future: false,
            best_effort_queue: std::collections::VecDeque::new(),
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> &BringUpState {
        &self.state
    }

    /// Capabilities known so far (cleared across a `STARTTLS` upgrade).
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// True once bring-up has completed successfully.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state == BringUpState::Ready
    }

    /// True once bring-up has failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.state == BringUpState::Failed
    }

    /// Set by `LOGINDISABLED` forcing a `STARTTLS` detour (spec scenario S3):
    /// future reconnects to this server/account should require TLS from the
    /// start rather than rediscovering this every time.
    #[must_use]
    pub fn require_start_tls_in_future(&self) -> bool {
        self.require_start_tls_in_future
    }

    /// Advances the machine. Returns the actions the driver should perform.
    ///
    /// # Panics
    ///
    /// Does not panic; an event that doesn't apply to the current state is
    /// treated as a protocol violation and fails bring-up.
    pub fn step(&mut self, event: BringUpEvent) -> Vec<BringUpAction> {
        if let BringUpEvent::Bye(text) = &event {
            self.state = BringUpState::Failed;
            return vec![BringUpAction::Fail(format!("server sent BYE: {text}"))];
        }

        match (&self.state, event) {
            (BringUpState::WaitingGreeting, BringUpEvent::Greeting { status, code, text }) => {
                self.handle_greeting(status, code, &text)
            }
            (BringUpState::WaitingCapabilities, BringUpEvent::CapabilitiesReceived(caps)) => {
                self.capabilities = caps;
                self.decide_post_capabilities()
            }
            (BringUpState::StartTlsPending, BringUpEvent::StartTlsOk) => {
                self.capabilities.clear();
                self.state = BringUpState::WaitingCapabilities;
                vec![BringUpAction::SendCapability]
            }
            (BringUpState::StartTlsPending, BringUpEvent::StartTlsFailed(text)) => {
                self.fail(format!("STARTTLS failed: {text}"))
            }
            (BringUpState::LoggingIn, BringUpEvent::LoginOk { code }) => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    self.capabilities = caps;
                    self.enter_authenticated()
                } else {
                    self.state = BringUpState::WaitingPostLoginCapabilities;
                    vec![BringUpAction::SendCapability]
                }
            }
            (BringUpState::LoggingIn, BringUpEvent::LoginFailed(text)) => {
                self.fail(format!("authentication failed: {text}"))
            }
            (
                BringUpState::WaitingPostLoginCapabilities,
                BringUpEvent::CapabilitiesReceived(caps),
            ) => {
                self.capabilities = caps;
                self.enter_authenticated()
            }
            (BringUpState::Authenticated, BringUpEvent::BestEffortDone) => self.next_best_effort(),
            (state, event) => {
                self.fail(format!("unexpected event {event:?} in state {state:?}"))
            }
        }
    }

    /// Call once the driver has submitted credentials, to move past
    /// `ReadyToLogin` into `LoggingIn` and start waiting for the result.
    pub fn credentials_submitted(&mut self) {
        if self.state == BringUpState::ReadyToLogin {
            self.state = BringUpState::LoggingIn;
        }
    }

    fn handle_greeting(
        &mut self,
        status: Status,
        code: Option<ResponseCode>,
        text: &str,
    ) -> Vec<BringUpAction> {
        match status {
            Status::PreAuth | Status::Ok => {
                if let Some(ResponseCode::Capability(caps)) = code {
                    self.capabilities = caps;
                    if status == Status::PreAuth {
                        return self.enter_authenticated();
                    }
                    return self.decide_post_capabilities();
                }
                self.state = BringUpState::WaitingCapabilities;
                vec![BringUpAction::SendCapability]
            }
            _ => self.fail(format!("unexpected greeting status: {text}")),
        }
    }

    fn decide_post_capabilities(&mut self) -> Vec<BringUpAction> {
        self.state = BringUpState::PostCapabilities;
        let login_disabled = self.capabilities.contains(&Capability::LoginDisabled);
        let has_starttls = self.capabilities.contains(&Capability::StartTls);

        if self.policy.already_encrypted {
            if login_disabled {
                return self.fail("LOGIN is disabled and the connection is already encrypted".to_string());
            }
            self.state = BringUpState::ReadyToLogin;
            return vec![BringUpAction::ReadyForCredentials];
        }

        if login_disabled || self.policy.require_tls {
            if !has_starttls {
                return self.fail("STARTTLS required but not advertised".to_string());
            }
            if login_disabled {
                self.require_start_tls_in_future = true;
            }
            self.state = BringUpState::StartTlsPending;
            return vec![BringUpAction::SendStartTls];
        }

        self.state = BringUpState::ReadyToLogin;
        vec![BringUpAction::ReadyForCredentials]
    }

    fn enter_authenticated(&mut self) -> Vec<BringUpAction> {
        self.state = BringUpState::Authenticated;
        self.best_effort_queue.clear();
        if self.policy.send_id {
            self.best_effort_queue.push_back(BestEffortStep::Id);
        }
        if !self.policy.enable_capabilities.is_empty() {
            self.best_effort_queue.push_back(BestEffortStep::Enable);
        }
        if self.policy.try_compress && self.capabilities.contains(&Capability::CompressDeflate) {
            self.best_effort_queue.push_back(BestEffortStep::Compress);
        }
        self.next_best_effort()
    }

    fn next_best_effort(&mut self) -> Vec<BringUpAction> {
        match self.best_effort_queue.pop_front() {
            Some(BestEffortStep::Id) => vec![BringUpAction::SendId],
            Some(BestEffortStep::Enable) => {
                vec![BringUpAction::SendEnable(self.policy.enable_capabilities.clone())]
            }
            Some(BestEffortStep::Compress) => vec![BringUpAction::SendCompress],
            None => {
                self.state = BringUpState::Ready;
                vec![BringUpAction::Ready]
            }
        }
    }

    fn fail(&mut self, reason: String) -> Vec<BringUpAction> {
        self.state = BringUpState::Failed;
        vec![BringUpAction::Fail(reason)]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn greeting_ok_no_caps() -> BringUpEvent {
        BringUpEvent::Greeting {
            status: Status::Ok,
            code: None,
            text: "IMAP4rev2 Service Ready".to_string(),
        }
    }

    #[test]
    fn preauth_with_capability_skips_straight_to_authenticated() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        let actions = fsm.step(BringUpEvent::Greeting {
            status: Status::PreAuth,
            code: Some(ResponseCode::Capability(vec![Capability::Imap4Rev2])),
            text: "pre-authenticated".to_string(),
        });
        assert_eq!(actions, vec![BringUpAction::Ready]);
        assert!(fsm.is_ready());
    }

    #[test]
    fn greeting_without_capabilities_requests_them() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        let actions = fsm.step(greeting_ok_no_caps());
        assert_eq!(actions, vec![BringUpAction::SendCapability]);
        assert_eq!(fsm.state(), &BringUpState::WaitingCapabilities);
    }

    #[test]
    fn bye_at_greeting_fails_immediately() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        let actions = fsm.step(BringUpEvent::Bye("shutting down".to_string()));
        assert!(matches!(actions[0], BringUpAction::Fail(_)));
        assert!(fsm.is_failed());
    }

    #[test]
    fn bye_mid_sequence_fails_immediately() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        let actions = fsm.step(BringUpEvent::Bye("idle timeout".to_string()));
        assert!(matches!(actions[0], BringUpAction::Fail(_)));
        assert!(fsm.is_failed());
    }

    #[test]
    fn logindisabled_forces_starttls_and_flags_future_requirement() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        let actions = fsm.step(BringUpEvent::CapabilitiesReceived(vec![
            Capability::Imap4Rev2,
            Capability::LoginDisabled,
            Capability::StartTls,
        ]));
        assert_eq!(actions, vec![BringUpAction::SendStartTls]);
        assert!(fsm.require_start_tls_in_future());
        assert_eq!(fsm.state(), &BringUpState::StartTlsPending);
    }

    #[test]
    fn logindisabled_without_starttls_fails() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        let actions = fsm.step(BringUpEvent::CapabilitiesReceived(vec![
            Capability::LoginDisabled,
        ]));
        assert!(matches!(actions[0], BringUpAction::Fail(_)));
        assert!(fsm.is_failed());
    }

    #[test]
    fn starttls_success_discards_capabilities_and_refetches() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![
            Capability::LoginDisabled,
            Capability::StartTls,
        ]));
        assert!(!fsm.capabilities().is_empty());
        let actions = fsm.step(BringUpEvent::StartTlsOk);
        assert_eq!(actions, vec![BringUpAction::SendCapability]);
        assert!(fsm.capabilities().is_empty());
        assert_eq!(fsm.state(), &BringUpState::WaitingCapabilities);
    }

    #[test]
    fn require_tls_policy_forces_starttls_even_without_logindisabled() {
        let mut policy = BringUpPolicy::default();
        policy.require_tls = true;
        let mut fsm = BringUpFsm::new(policy);
        fsm.step(greeting_ok_no_caps());
        let actions = fsm.step(BringUpEvent::CapabilitiesReceived(vec![
            Capability::Imap4Rev2,
            Capability::StartTls,
        ]));
        assert_eq!(actions, vec![BringUpAction::SendStartTls]);
        assert!(!fsm.require_start_tls_in_future());
    }

    #[test]
    fn require_tls_without_starttls_advertised_fails() {
        let mut policy = BringUpPolicy::default();
        policy.require_tls = true;
        let mut fsm = BringUpFsm::new(policy);
        fsm.step(greeting_ok_no_caps());
        let actions = fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        assert!(matches!(actions[0], BringUpAction::Fail(_)));
    }

    #[test]
    fn already_encrypted_skips_starttls() {
        let mut policy = BringUpPolicy::default();
        policy.already_encrypted = true;
        let mut fsm = BringUpFsm::new(policy);
        fsm.step(greeting_ok_no_caps());
        let actions = fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        assert_eq!(actions, vec![BringUpAction::ReadyForCredentials]);
        assert_eq!(fsm.state(), &BringUpState::ReadyToLogin);
    }

    #[test]
    fn login_ok_without_capability_code_fetches_fresh_capabilities() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        fsm.credentials_submitted();
        assert_eq!(fsm.state(), &BringUpState::LoggingIn);
        let actions = fsm.step(BringUpEvent::LoginOk { code: None });
        assert_eq!(actions, vec![BringUpAction::SendCapability]);
        assert_eq!(fsm.state(), &BringUpState::WaitingPostLoginCapabilities);
        let actions = fsm.step(BringUpEvent::CapabilitiesReceived(vec![
            Capability::Imap4Rev2,
            Capability::Idle,
        ]));
        assert_eq!(actions, vec![BringUpAction::Ready]);
        assert!(fsm.is_ready());
    }

    #[test]
    fn login_ok_with_capability_code_skips_refetch() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        fsm.credentials_submitted();
        let actions = fsm.step(BringUpEvent::LoginOk {
            code: Some(ResponseCode::Capability(vec![Capability::Imap4Rev2, Capability::Idle])),
        });
        assert_eq!(actions, vec![BringUpAction::Ready]);
        assert!(fsm.capabilities().contains(&Capability::Idle));
    }

    #[test]
    fn login_failure_fails_bring_up() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        fsm.credentials_submitted();
        let actions = fsm.step(BringUpEvent::LoginFailed("invalid credentials".to_string()));
        assert!(matches!(actions[0], BringUpAction::Fail(_)));
        assert!(fsm.is_failed());
    }

    #[test]
    fn best_effort_sequence_runs_id_then_enable_then_compress_then_ready() {
        let mut policy = BringUpPolicy::default();
        policy.send_id = true;
        policy.enable_capabilities = vec!["QRESYNC".to_string()];
        policy.try_compress = true;
        let mut fsm = BringUpFsm::new(policy);
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![
            Capability::Imap4Rev2,
            Capability::CompressDeflate,
        ]));
        fsm.credentials_submitted();
        let actions = fsm.step(BringUpEvent::LoginOk {
            code: Some(ResponseCode::Capability(vec![
                Capability::Imap4Rev2,
                Capability::CompressDeflate,
            ])),
        });
        assert_eq!(actions, vec![BringUpAction::SendId]);

        let actions = fsm.step(BringUpEvent::BestEffortDone);
        assert_eq!(
            actions,
            vec![BringUpAction::SendEnable(vec!["QRESYNC".to_string()])]
        );

        let actions = fsm.step(BringUpEvent::BestEffortDone);
        assert_eq!(actions, vec![BringUpAction::SendCompress]);

        let actions = fsm.step(BringUpEvent::BestEffortDone);
        assert_eq!(actions, vec![BringUpAction::Ready]);
        assert!(fsm.is_ready());
    }

    #[test]
    fn best_effort_failure_does_not_fail_bring_up() {
        let mut policy = BringUpPolicy::default();
        policy.send_id = true;
        let mut fsm = BringUpFsm::new(policy);
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        fsm.credentials_submitted();
        fsm.step(BringUpEvent::LoginOk {
            code: Some(ResponseCode::Capability(vec![Capability::Imap4Rev2])),
        });
        // ID came back NO; the driver still reports BestEffortDone, never a failure event.
        let actions = fsm.step(BringUpEvent::BestEffortDone);
        assert_eq!(actions, vec![BringUpAction::Ready]);
        assert!(fsm.is_ready());
    }

    #[test]
    fn no_best_effort_steps_goes_straight_to_ready() {
        let mut fsm = BringUpFsm::new(BringUpPolicy::default());
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        fsm.credentials_submitted();
        let actions = fsm.step(BringUpEvent::LoginOk {
            code: Some(ResponseCode::Capability(vec![Capability::Imap4Rev2])),
        });
        assert_eq!(actions, vec![BringUpAction::Ready]);
    }

    #[test]
    fn compress_skipped_when_not_advertised() {
        let mut policy = BringUpPolicy::default();
        policy.try_compress = true;
        let mut fsm = BringUpFsm::new(policy);
        fsm.step(greeting_ok_no_caps());
        fsm.step(BringUpEvent::CapabilitiesReceived(vec![Capability::Imap4Rev2]));
        fsm.credentials_submitted();
        let actions = fsm.step(BringUpEvent::LoginOk {
            code: Some(ResponseCode::Capability(vec![Capability::Imap4Rev2])),
        });
        assert_eq!(actions, vec![BringUpAction::Ready]);
    }
}
