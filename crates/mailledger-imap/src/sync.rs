//! Mailbox synchroniser.
//!
//! Decides, given what was cached from a previous session and what the
//! server reports on re-selecting a mailbox, which of a handful of
//! strategies to use to bring the local view back in sync, and then tracks
//! the seq→UID mapping through the in-session mutations (`EXISTS`,
//! `EXPUNGE`, `VANISHED`, `FETCH`) that follow.
//!
//! ## Decision table
//!
//! | Cached state | Fresh state | Strategy |
//! |---|---|---|
//! | absent, or `UIDVALIDITY` differs | — | [`SyncDecision::Invalidated`] then full resync |
//! | present | `UIDVALIDITY` same, `EXISTS`/`UIDNEXT` unchanged | [`SyncDecision::NoChange`] |
//! | present | `UIDVALIDITY` same, `EXISTS` grew by exactly the `UIDNEXT` delta | [`SyncDecision::AppendOnly`] |
//! | present | `UIDVALIDITY` same, otherwise changed | [`SyncDecision::ReEnumerate`] |
//! | — | `QRESYNC` advertised and a `HIGHESTMODSEQ` is known | [`SyncDecision::Qresync`] |
//!
//! `NoChange` only needs a flag refresh; `AppendOnly` derives the new UID
//! range directly without a `SEARCH`; `ReEnumerate` and the first sync of a
//! mailbox both require a `UID SEARCH ALL` and diff the cached map against
//! the fresh one.
//!
//! ## In-session tracking
//!
//! [`MailboxSyncState`] holds the live seq→UID map. It enforces two
//! invariants throughout a session: the map's length matches the mailbox's
//! reported `EXISTS` once reconciled, and UIDs in the map are strictly
//! increasing by sequence number. It never fabricates a UID: if a message
//! is expunged before its `FETCH UID` response arrives, `EXISTS` simply
//! drops back down without the map ever having grown.

use crate::qresync::{ModSeq, QresyncParams, SyncState};
use crate::types::{SeqNum, Uid, UidValidity};

/// A mailbox's last-known state, as cached from a previous session.
#[derive(Debug, Clone)]
pub struct CachedMailboxState {
    /// `UIDVALIDITY` at the time this was cached.
    pub uidvalidity: UidValidity,
    /// `EXISTS` count at the time this was cached.
    pub exists: u32,
    /// `UIDNEXT` at the time this was cached.
    pub uidnext: Uid,
    /// Known UIDs, in ascending (seq) order.
    pub uid_map: Vec<Uid>,
}

/// A mailbox's freshly reported state from re-selecting it.
#[derive(Debug, Clone, Copy)]
pub struct MailboxSnapshot {
    /// Current `UIDVALIDITY`.
    pub uidvalidity: UidValidity,
    /// Current `EXISTS` count.
    pub exists: u32,
    /// Current `UIDNEXT`.
    pub uidnext: Uid,
}

/// The strategy chosen to reconcile local state with the server's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncDecision {
    /// No cached state (or it was just invalidated): fetch the full UID map
    /// (`UID SEARCH ALL`) and `FLAGS` for every message.
    FullResync,
    /// `UIDVALIDITY`, `EXISTS` and `UIDNEXT` are all unchanged: only flags
    /// may have changed, so only a `FETCH FLAGS` refresh is needed.
    NoChange,
    /// `EXISTS` grew by exactly the `UIDNEXT` delta: the new UIDs are
    /// `[old_uidnext, new_uidnext)`, fetched directly without a `SEARCH`.
    AppendOnly {
        /// First UID of the newly arrived range.
        first_new_uid: Uid,
        /// Number of newly arrived messages.
        count: u32,
    },
    /// Something changed that isn't explained by simple appends (messages
    /// were expunged, reordered, or arrived and were expunged in the same
    /// window): re-run `UID SEARCH ALL` and diff against the cached map.
    ReEnumerate,
    /// `UIDVALIDITY` changed: all cached UID map and per-message metadata
    /// must be discarded before a full resync runs.
    Invalidated,
    /// QRESYNC is advertised and a previous `HIGHESTMODSEQ` is known: issue
    /// `SELECT`/`EXAMINE` with these QRESYNC parameters and consume the
    /// resulting `VANISHED`/`FETCH` responses instead of a separate SEARCH.
    Qresync(QresyncParams),
}

/// Chooses a synchronisation strategy given cached state, the server's
/// fresh mailbox snapshot, and (if advertised) a remembered QRESYNC state.
///
/// `UIDVALIDITY` divergence always wins: even with QRESYNC state on hand,
/// a changed `UIDVALIDITY` means the server rebuilt the mailbox and nothing
/// cached can be trusted.
#[must_use]
pub fn decide_sync_strategy(
    cached: Option<&CachedMailboxState>,
    fresh: MailboxSnapshot,
    qresync: Option<&SyncState>,
) -> SyncDecision {
    if let Some(state) = qresync {
        if state.uidvalidity != fresh.uidvalidity {
            return SyncDecision::Invalidated;
        }
        return SyncDecision::Qresync(state.to_params());
    }

    let Some(cached) = cached else {
        return SyncDecision::FullResync;
    };

    if cached.uidvalidity != fresh.uidvalidity {
        return SyncDecision::Invalidated;
    }

    if cached.exists == fresh.exists && cached.uidnext == fresh.uidnext {
        return SyncDecision::NoChange;
    }

    if fresh.exists > cached.exists {
        let exists_delta = fresh.exists - cached.exists;
        let uidnext_delta = fresh.uidnext.get().saturating_sub(cached.uidnext.get());
        if uidnext_delta == exists_delta {
            return SyncDecision::AppendOnly {
                first_new_uid: cached.uidnext,
                count: exists_delta,
            };
        }
    }

    SyncDecision::ReEnumerate
}

/// Reconstructs a seq→UID map from a `UID SEARCH ALL` result set.
///
/// Servers are not required to return matched UIDs in any particular
/// order; this sorts them ascending and assigns sequence numbers `1..N` in
/// that order, which is how IMAP numbers messages within a mailbox.
#[must_use]
pub fn build_uid_map_from_search(mut uids: Vec<Uid>) -> Vec<Uid> {
    uids.sort_unstable();
    uids
}

/// Diff between a cached UID map and a freshly re-enumerated one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UidMapDiff {
    /// UIDs present in the fresh map but not the cached one.
    pub inserted: Vec<Uid>,
    /// UIDs present in the cached map but not the fresh one.
    pub removed: Vec<Uid>,
}

/// Diffs a cached UID map against a freshly re-enumerated one (used by the
/// [`SyncDecision::ReEnumerate`] path).
#[must_use]
pub fn diff_uid_maps(cached: &[Uid], fresh: &[Uid]) -> UidMapDiff {
    let cached_set: std::collections::HashSet<Uid> = cached.iter().copied().collect();
    let fresh_set: std::collections::HashSet<Uid> = fresh.iter().copied().collect();

    let mut inserted: Vec<Uid> = fresh_set.difference(&cached_set).copied().collect();
    let mut removed: Vec<Uid> = cached_set.difference(&fresh_set).copied().collect();
    inserted.sort_unstable();
    removed.sort_unstable();

    UidMapDiff { inserted, removed }
}

/// A violated synchroniser invariant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncInvariantError {
    /// `len(uid_map) != EXISTS` after reconciliation.
    #[error("uid map length {map_len} does not match EXISTS {exists}")]
    LengthMismatch {
        /// Length of the tracked UID map.
        map_len: usize,
        /// Server-reported `EXISTS`.
        exists: u32,
    },
    /// UIDs in the map are not strictly increasing by sequence number.
    #[error("uid map is not strictly increasing at index {index}")]
    NotStrictlyIncreasing {
        /// Index of the first out-of-order entry.
        index: usize,
    },
}

/// Live, in-session seq→UID tracking for a selected mailbox (spec C8).
///
/// Built from a [`SyncDecision`]'s resolution (a full `UID SEARCH ALL`, an
/// append-only range, or a re-enumeration diff) and then kept current by
/// feeding it the untagged `EXISTS`/`EXPUNGE`/`VANISHED`/`FETCH` responses
/// that arrive during the session.
#[derive(Debug, Clone)]
pub struct MailboxSyncState {
    uidvalidity: UidValidity,
    uid_map: Vec<Uid>,
    /// Most recent `EXISTS` count reported by the server. May briefly
    /// exceed `uid_map.len()` between a new message's `EXISTS` announcement
    /// and its `UID` becoming known via `FETCH`.
    pending_exists: u32,
    /// Lower bound on the next UID the server can assign. Never advanced
    /// speculatively - only by a UID actually observed.
    uidnext_lower_bound: Uid,
    highestmodseq: Option<ModSeq>,
}

impl MailboxSyncState {
    /// Builds state from a full (or re-enumerated) UID map, already sorted
    /// ascending by [`build_uid_map_from_search`].
    #[must_use]
    pub fn from_uid_map(uidvalidity: UidValidity, uid_map: Vec<Uid>, uidnext: Uid) -> Self {
        let pending_exists = u32::try_from(uid_map.len()).unwrap_or(u32::MAX);
        Self {
            uidvalidity,
            uid_map,
            pending_exists,
            uidnext_lower_bound: uidnext,
            highestmodseq: None,
        }
    }

    /// Builds state for the append-only fast path: the cached map plus a
    /// freshly derived contiguous UID range, with no `SEARCH` round trip.
    #[must_use]
    pub fn from_append_only(
        uidvalidity: UidValidity,
        mut uid_map: Vec<Uid>,
        first_new_uid: Uid,
        count: u32,
    ) -> Self {
        let mut next = first_new_uid.get();
        for _ in 0..count {
            if let Some(uid) = Uid::new(next) {
                uid_map.push(uid);
            }
            next += 1;
        }
        let uidnext_lower_bound = Uid::new(next).unwrap_or(first_new_uid);
        let pending_exists = u32::try_from(uid_map.len()).unwrap_or(u32::MAX);
        Self {
            uidvalidity,
            uid_map,
            pending_exists,
            uidnext_lower_bound,
            highestmodseq: None,
        }
    }

    /// The tracked `UIDVALIDITY`.
    #[must_use]
    pub fn uidvalidity(&self) -> UidValidity {
        self.uidvalidity
    }

    /// Current reconciled `EXISTS` (the length of the known UID map).
    #[must_use]
    pub fn exists(&self) -> u32 {
        u32::try_from(self.uid_map.len()).unwrap_or(u32::MAX)
    }

    /// Whether the map is fully reconciled with the last-reported `EXISTS`.
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.exists() == self.pending_exists
    }

    /// The UID at a given 1-based sequence number, if known.
    #[must_use]
    pub fn uid_at_seq(&self, seq: SeqNum) -> Option<Uid> {
        self.uid_map.get(seq.get() as usize - 1).copied()
    }

    /// The sequence number of a given UID, if present.
    #[must_use]
    pub fn seq_of_uid(&self, uid: Uid) -> Option<SeqNum> {
        self.uid_map
            .iter()
            .position(|&u| u == uid)
            .and_then(|idx| SeqNum::new(u32::try_from(idx + 1).ok()?))
    }

    /// Records an untagged `EXISTS` response. Does not itself grow the UID
    /// map: new messages are only added once their UID is learned via
    /// [`on_fetch_uid`](Self::on_fetch_uid), so a message expunged before
    /// its UID arrives is never fabricated into the map.
    pub fn on_exists(&mut self, count: u32) {
        self.pending_exists = count;
    }

    /// Records an untagged `EXPUNGE` for the given (pre-removal) sequence
    /// number. Returns the UID that was removed, if the map had an entry
    /// for that sequence number.
    pub fn on_expunge(&mut self, seq: SeqNum) -> Option<Uid> {
        let idx = seq.get() as usize - 1;
        if idx < self.uid_map.len() {
            let uid = self.uid_map.remove(idx);
            self.pending_exists = self.pending_exists.saturating_sub(1);
            Some(uid)
        } else {
            // The expunged message never made it into the map (it arrived
            // and vanished before its UID was learned); just back off the
            // pending count.
            self.pending_exists = self.pending_exists.saturating_sub(1);
            None
        }
    }

    /// Records a `VANISHED` response (QRESYNC), removing every listed UID
    /// present in the map.
    pub fn on_vanished(&mut self, uids: &[Uid]) {
        for uid in uids {
            if let Some(pos) = self.uid_map.iter().position(|u| u == uid) {
                self.uid_map.remove(pos);
                self.pending_exists = self.pending_exists.saturating_sub(1);
            }
        }
    }

    /// Records a `FETCH` response revealing the UID for a sequence number.
    /// Only appends when `seq` is exactly the next unknown slot, preserving
    /// the strictly-increasing invariant; anything else is ignored rather
    /// than risking a corrupt map.
    pub fn on_fetch_uid(&mut self, seq: SeqNum, uid: Uid) {
        let idx = seq.get() as usize - 1;
        if idx == self.uid_map.len() {
            self.uid_map.push(uid);
            if uid.get() >= self.uidnext_lower_bound.get() {
                self.uidnext_lower_bound =
                    Uid::new(uid.get() + 1).unwrap_or(self.uidnext_lower_bound);
            }
        } else if let Some(existing) = self.uid_map.get(idx) {
            debug_assert_eq!(*existing, uid, "server reused a sequence number for a different UID");
        }
    }

    /// Records a new `HIGHESTMODSEQ` (CONDSTORE/QRESYNC).
    pub fn set_highestmodseq(&mut self, modseq: ModSeq) {
        self.highestmodseq = Some(modseq);
    }

    /// The current `HIGHESTMODSEQ`, if known.
    #[must_use]
    pub fn highestmodseq(&self) -> Option<ModSeq> {
        self.highestmodseq
    }

    /// A conservative lower bound on the UID the server will assign next.
    /// Never fabricated: only advanced when a UID at or above it is
    /// actually observed.
    #[must_use]
    pub fn uidnext_lower_bound(&self) -> Uid {
        self.uidnext_lower_bound
    }

    /// Snapshots the current UID map, in sequence order.
    #[must_use]
    pub fn uid_map(&self) -> &[Uid] {
        &self.uid_map
    }

    /// Checks the two structural invariants this state must uphold:
    /// 1. once reconciled, `len(uid_map) == EXISTS`;
    /// 2. UIDs are strictly increasing by sequence number.
    ///
    /// # Errors
    ///
    /// Returns [`SyncInvariantError`] describing which invariant broke.
    pub fn check_invariants(&self) -> Result<(), SyncInvariantError> {
        if self.is_reconciled() && self.uid_map.len() != self.pending_exists as usize {
            return Err(SyncInvariantError::LengthMismatch {
                map_len: self.uid_map.len(),
                exists: self.pending_exists,
            });
        }
        for (idx, pair) in self.uid_map.windows(2).enumerate() {
            if pair[0] >= pair[1] {
                return Err(SyncInvariantError::NotStrictlyIncreasing { index: idx + 1 });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::redundant_clone, clippy::manual_string_new, clippy::needless_collect, clippy::unreadable_literal, clippy::used_underscore_items, clippy::similar_names)]
mod tests {
    use super::*;

    fn uv(n: u32) -> UidValidity {
        UidValidity::new(n).unwrap()
    }

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    fn seq(n: u32) -> SeqNum {
        SeqNum::new(n).unwrap()
    }

    #[test]
    fn no_cache_means_full_resync() {
        let fresh = MailboxSnapshot {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
        };
        assert_eq!(decide_sync_strategy(None, fresh, None), SyncDecision::FullResync);
    }

    #[test]
    fn unchanged_state_is_no_change() {
        let cached = CachedMailboxState {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
            uid_map: (1..=10).map(uid).collect(),
        };
        let fresh = MailboxSnapshot {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
        };
        assert_eq!(
            decide_sync_strategy(Some(&cached), fresh, None),
            SyncDecision::NoChange
        );
    }

    #[test]
    fn exact_uidnext_growth_is_append_only() {
        let cached = CachedMailboxState {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
            uid_map: (1..=10).map(uid).collect(),
        };
        let fresh = MailboxSnapshot {
            uidvalidity: uv(1),
            exists: 13,
            uidnext: uid(14),
        };
        assert_eq!(
            decide_sync_strategy(Some(&cached), fresh, None),
            SyncDecision::AppendOnly {
                first_new_uid: uid(11),
                count: 3,
            }
        );
    }

    #[test]
    fn mismatched_growth_is_re_enumerate() {
        // EXISTS grew by 3 but UIDNEXT only by 2: something was expunged
        // alongside the new arrivals.
        let cached = CachedMailboxState {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
            uid_map: (1..=10).map(uid).collect(),
        };
        let fresh = MailboxSnapshot {
            uidvalidity: uv(1),
            exists: 13,
            uidnext: uid(13),
        };
        assert_eq!(
            decide_sync_strategy(Some(&cached), fresh, None),
            SyncDecision::ReEnumerate
        );
    }

    #[test]
    fn exists_shrinking_is_re_enumerate() {
        let cached = CachedMailboxState {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
            uid_map: (1..=10).map(uid).collect(),
        };
        let fresh = MailboxSnapshot {
            uidvalidity: uv(1),
            exists: 8,
            uidnext: uid(11),
        };
        assert_eq!(
            decide_sync_strategy(Some(&cached), fresh, None),
            SyncDecision::ReEnumerate
        );
    }

    #[test]
    fn changed_uidvalidity_invalidates() {
        let cached = CachedMailboxState {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
            uid_map: (1..=10).map(uid).collect(),
        };
        let fresh = MailboxSnapshot {
            uidvalidity: uv(2),
            exists: 10,
            uidnext: uid(11),
        };
        assert_eq!(
            decide_sync_strategy(Some(&cached), fresh, None),
            SyncDecision::Invalidated
        );
    }

    #[test]
    fn qresync_state_with_matching_uidvalidity_wins() {
        let state = SyncState::new(uv(1), ModSeq::from_u64(42).unwrap());
        let fresh = MailboxSnapshot {
            uidvalidity: uv(1),
            exists: 10,
            uidnext: uid(11),
        };
        match decide_sync_strategy(None, fresh, Some(&state)) {
            SyncDecision::Qresync(params) => {
                assert_eq!(params.uidvalidity, uv(1));
            }
            other => panic!("expected Qresync, got {other:?}"),
        }
    }

    #[test]
    fn qresync_state_with_changed_uidvalidity_invalidates() {
        let state = SyncState::new(uv(1), ModSeq::from_u64(42).unwrap());
        let fresh = MailboxSnapshot {
            uidvalidity: uv(2),
            exists: 10,
            uidnext: uid(11),
        };
        assert_eq!(
            decide_sync_strategy(None, fresh, Some(&state)),
            SyncDecision::Invalidated
        );
    }

    #[test]
    fn build_uid_map_sorts_out_of_order_search_results() {
        let uids = vec![uid(5), uid(1), uid(3)];
        assert_eq!(build_uid_map_from_search(uids), vec![uid(1), uid(3), uid(5)]);
    }

    #[test]
    fn diff_uid_maps_reports_inserted_and_removed() {
        let cached = vec![uid(1), uid(2), uid(3)];
        let fresh = vec![uid(2), uid(3), uid(4)];
        let diff = diff_uid_maps(&cached, &fresh);
        assert_eq!(diff.inserted, vec![uid(4)]);
        assert_eq!(diff.removed, vec![uid(1)]);
    }

    #[test]
    fn from_append_only_extends_the_cached_map() {
        let state = MailboxSyncState::from_append_only(uv(1), vec![uid(1), uid(2)], uid(3), 2);
        assert_eq!(state.exists(), 4);
        assert_eq!(state.uid_at_seq(seq(3)), Some(uid(3)));
        assert_eq!(state.uid_at_seq(seq(4)), Some(uid(4)));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn expunge_removes_the_mapped_uid_and_shifts_sequence_numbers() {
        let mut state = MailboxSyncState::from_uid_map(uv(1), vec![uid(1), uid(2), uid(3)], uid(4));
        let removed = state.on_expunge(seq(2));
        assert_eq!(removed, Some(uid(2)));
        assert_eq!(state.uid_map(), &[uid(1), uid(3)]);
        assert_eq!(state.uid_at_seq(seq(2)), Some(uid(3)));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn vanished_removes_all_listed_uids() {
        let mut state =
            MailboxSyncState::from_uid_map(uv(1), vec![uid(1), uid(2), uid(3), uid(4)], uid(5));
        state.on_vanished(&[uid(2), uid(4)]);
        assert_eq!(state.uid_map(), &[uid(1), uid(3)]);
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn expunge_immediately_after_arrival_never_fabricates_a_uid() {
        // A new message arrives (EXISTS goes up) but is expunged again
        // before its UID is ever learned via FETCH.
        let mut state = MailboxSyncState::from_uid_map(uv(1), vec![uid(1), uid(2)], uid(3));
        state.on_exists(3);
        assert!(!state.is_reconciled());

        // The server expunges the new message (seq 3) without ever having
        // sent a FETCH revealing its UID.
        let removed = state.on_expunge(seq(3));
        assert_eq!(removed, None);
        assert_eq!(state.uid_map(), &[uid(1), uid(2)]);
        assert!(state.is_reconciled());
        // The lower bound is untouched - we never guessed what the new
        // message's UID might have been.
        assert_eq!(state.uidnext_lower_bound(), uid(3));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn fetch_uid_reconciles_a_pending_exists() {
        let mut state = MailboxSyncState::from_uid_map(uv(1), vec![uid(1), uid(2)], uid(3));
        state.on_exists(3);
        assert!(!state.is_reconciled());

        state.on_fetch_uid(seq(3), uid(3));
        assert!(state.is_reconciled());
        assert_eq!(state.exists(), 3);
        assert_eq!(state.uidnext_lower_bound(), uid(4));
        assert!(state.check_invariants().is_ok());
    }

    #[test]
    fn seq_of_uid_round_trips_with_uid_at_seq() {
        let state = MailboxSyncState::from_uid_map(uv(1), vec![uid(10), uid(20), uid(30)], uid(31));
        assert_eq!(state.seq_of_uid(uid(20)), Some(seq(2)));
        assert_eq!(state.uid_at_seq(seq(2)), Some(uid(20)));
        assert_eq!(state.seq_of_uid(uid(99)), None);
    }
}
