//! Participant reconciliation.
//!
//! The transport's raw participant snapshot contains duplicates (the same
//! person reconnecting under a new session) and ghosts (echoes of the local
//! stream with no identity). [`reconcile`] turns that snapshot into a
//! deduplicated, privacy-safe roster. It is a pure function of its input:
//! no side effects, deterministic for a given set, so it is unit-testable
//! directly.

use crate::transport::RawParticipant;
use std::collections::BTreeMap;

/// Display name used when the transport reports none.
pub const FALLBACK_DISPLAY_NAME: &str = "Guest";

/// A normalized participant record.
///
/// Every field is concrete; normalization happens once at this boundary so
/// downstream logic never branches on missing fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub session_id: String,
    /// Most stable available identifier: application user id, else
    /// transport user id, else display name, else session id.
    pub identity_key: String,
    pub display_name: String,
    pub is_local: bool,
    pub has_video_track: bool,
    pub has_audio_track: bool,
    pub video_enabled: bool,
    pub audio_enabled: bool,
}

/// The reconciled view of a call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub local: Option<Participant>,
    /// One entry per distinct remote identity, ordered by identity key.
    pub remotes: Vec<Participant>,
}

impl Roster {
    #[must_use]
    pub fn remote_count(&self) -> usize {
        self.remotes.len()
    }

    /// Find a remote by transport session id.
    #[must_use]
    pub fn remote_by_session(&self, session_id: &str) -> Option<&Participant> {
        self.remotes.iter().find(|p| p.session_id == session_id)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn has_live_video(raw: &RawParticipant) -> bool {
    non_empty(&raw.video_track_id).is_some() && raw.video_enabled
}

fn has_live_audio(raw: &RawParticipant) -> bool {
    non_empty(&raw.audio_track_id).is_some() && raw.audio_enabled
}

fn has_any_identity(raw: &RawParticipant) -> bool {
    non_empty(&raw.app_user_id).is_some()
        || non_empty(&raw.transport_user_id).is_some()
        || non_empty(&raw.user_name).is_some()
}

/// Normalize a raw transport record into a strict [`Participant`].
#[must_use]
pub fn normalize(raw: &RawParticipant) -> Participant {
    let identity_key = non_empty(&raw.app_user_id)
        .or_else(|| non_empty(&raw.transport_user_id))
        .or_else(|| non_empty(&raw.user_name))
        .unwrap_or(&raw.session_id)
        .to_string();

    Participant {
        session_id: raw.session_id.clone(),
        identity_key,
        display_name: non_empty(&raw.user_name)
            .unwrap_or(FALLBACK_DISPLAY_NAME)
            .to_string(),
        is_local: raw.local,
        has_video_track: non_empty(&raw.video_track_id).is_some(),
        has_audio_track: non_empty(&raw.audio_track_id).is_some(),
        video_enabled: raw.video_enabled,
        audio_enabled: raw.audio_enabled,
    }
}

/// Select the canonical local record from a raw snapshot.
///
/// Among records flagged local: prefer one with a live video track, else a
/// live audio track, else the first.
#[must_use]
pub fn canonical_local(raws: &[RawParticipant]) -> Option<&RawParticipant> {
    let mut locals = raws.iter().filter(|r| r.local);
    let first = locals.next()?;

    let mut locals = raws.iter().filter(|r| r.local);
    if let Some(with_video) = locals.find(|r| has_live_video(r)) {
        return Some(with_video);
    }

    let mut locals = raws.iter().filter(|r| r.local);
    if let Some(with_audio) = locals.find(|r| has_live_audio(r)) {
        return Some(with_audio);
    }

    Some(first)
}

/// Whether a remote record is an echo of the local participant.
///
/// True when it shares a track identifier or a non-empty identity field
/// with the canonical local record, or when it carries no identity at all
/// yet exposes live tracks.
fn is_mirror(remote: &RawParticipant, local: Option<&RawParticipant>) -> bool {
    if let Some(local) = local {
        let shares_track = [&remote.video_track_id, &remote.audio_track_id]
            .into_iter()
            .filter_map(|id| non_empty(id))
            .any(|id| {
                non_empty(&local.video_track_id) == Some(id)
                    || non_empty(&local.audio_track_id) == Some(id)
            });
        if shares_track {
            return true;
        }

        let shares_identity = (non_empty(&remote.app_user_id).is_some()
            && remote.app_user_id == local.app_user_id)
            || (non_empty(&remote.transport_user_id).is_some()
                && remote.transport_user_id == local.transport_user_id)
            || (non_empty(&remote.user_name).is_some() && remote.user_name == local.user_name);
        if shares_identity {
            return true;
        }
    }

    // Identity-less records with live tracks are ghost echoes of the local
    // stream regardless of whether a local record is present.
    !has_any_identity(remote)
        && (non_empty(&remote.video_track_id).is_some()
            || non_empty(&remote.audio_track_id).is_some())
}

/// Merge duplicate records for one identity into a single participant.
///
/// Per media channel the *off* report always wins, whatever the arrival
/// order: a peer that disabled a channel must never be shown with it on.
/// Records with identical channel state collapse onto the lexicographically
/// lower session id, keeping selection stable across rebuilds.
fn merge_duplicates(mut records: Vec<Participant>) -> Option<Participant> {
    records.sort_by(|a, b| a.session_id.cmp(&b.session_id));

    let mut iter = records.into_iter();
    let mut merged = iter.next()?;

    for next in iter {
        let video = merged.video_enabled && next.video_enabled;
        let audio = merged.audio_enabled && next.audio_enabled;

        let merged_matches = merged.video_enabled == video && merged.audio_enabled == audio;
        let next_matches = next.video_enabled == video && next.audio_enabled == audio;
        if next_matches && !merged_matches {
            merged = next;
        }

        merged.video_enabled = video;
        merged.audio_enabled = audio;
    }

    Some(merged)
}

/// Reconcile a raw participant snapshot into a [`Roster`].
///
/// Pure and deterministic. The off-wins rule can make a tile flap between
/// two duplicate records while both channels toggle in quick succession;
/// that is inherent to preferring privacy over visual stability.
#[must_use]
pub fn reconcile(raws: &[RawParticipant]) -> Roster {
    let local_raw = canonical_local(raws);
    let local = local_raw.map(normalize);

    let mut groups: BTreeMap<String, Vec<Participant>> = BTreeMap::new();
    for raw in raws.iter().filter(|r| !r.local) {
        if is_mirror(raw, local_raw) {
            continue;
        }
        let participant = normalize(raw);
        groups
            .entry(participant.identity_key.clone())
            .or_default()
            .push(participant);
    }

    let remotes = groups.into_values().filter_map(merge_duplicates).collect();

    Roster { local, remotes }
}
