use std::fmt::Write;

use anchor_client::solana_sdk::pubkey::Pubkey;
use itertools::Itertools;

use crate::{snapshot::SnapshotSource, sync::ClientState};

/// `Abc123...wxyz` form of an address.
pub fn short_address(address: &Pubkey) -> String {
    let s = address.to_string();
    if s.len() <= 10 {
        return s;
    }
    format!("{}...{}", &s[..6], &s[s.len() - 4..])
}

/// Share of the total, rounded to the nearest whole percent.
pub fn vote_percentage(vote_count: u64, total_votes: u64) -> u64 {
    if total_votes == 0 {
        return 0;
    }
    ((vote_count as u128 * 200 + total_votes as u128) / (total_votes as u128 * 2)) as u64
}

/// Text rendering of the client state, candidates ranked by votes.
pub fn render_state(state: &ClientState) -> String {
    let mut out = String::new();

    let connection = match &state.identity {
        Some(identity) if state.is_correct_network => format!("connected as {identity}"),
        Some(identity) => format!("connected as {identity} (wrong network)"),
        None => "not connected".to_string(),
    };
    let _ = writeln!(out, "Wallet: {connection}");
    match state.source {
        SnapshotSource::Demo => {
            let _ = writeln!(out, "Mode: demo data");
        }
        SnapshotSource::Stale => {
            let _ = writeln!(out, "Mode: last known results");
        }
        SnapshotSource::Empty | SnapshotSource::Live => {}
    }
    if let Some(error) = &state.error {
        let _ = writeln!(out, "Note: {error}");
    }

    let _ = writeln!(out, "Total votes: {}", state.total_votes);
    let ranked = state
        .candidates
        .iter()
        .sorted_by(|a, b| b.vote_count.cmp(&a.vote_count).then(a.id.cmp(&b.id)));
    for (rank, candidate) in ranked.enumerate() {
        let leader = if rank == 0 && candidate.vote_count > 0 {
            " (leading)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "  #{} {:<32} {:>6} votes {:>3}%{}",
            candidate.id,
            candidate.name,
            candidate.vote_count,
            vote_percentage(candidate.vote_count, state.total_votes),
            leader
        );
    }
    if state.has_voted {
        let _ = writeln!(out, "You have already voted.");
    }
    out
}
