//! Call-leg correlation
//!
//! A RingOut (or RingMe) call shows up as two telephony sessions: the leg
//! that rings the caller's own device and the leg that reaches the callee.
//! Calls dispatched through a queue look similar from the receiving side.
//! The notification feed carries no join key for the two, so legs are
//! paired heuristically:
//!
//! 1. the numeric `session_id`s differ by exactly one of
//!    [`LEG_SESSION_ID_OFFSETS`], and
//! 2. the parties' numbers are crossed: one leg's `from` is the other's
//!    `to` and vice versa, compared with [`phone_numbers_match`].
//!
//! A match is a strong hint, not a guarantee.

use std::sync::Arc;

use crate::party::{Direction, Party, RingRole};
use crate::session::{Session, SessionData};

/// Observed distances between the session ids of two legs of one call
pub const LEG_SESSION_ID_OFFSETS: [u64; 4] = [1000, 2000, 3000, 4000];

/// Longest country code that may separate an E.164 number from its
/// national form
const MAX_COUNTRY_CODE_DIGITS: usize = 3;

/// True when both session ids are numeric and one leg offset apart
pub fn session_ids_correlate(a: &str, b: &str) -> bool {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(a), Ok(b)) => LEG_SESSION_ID_OFFSETS.contains(&a.abs_diff(b)),
        _ => false,
    }
}

fn digits(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Compare two phone numbers that may be written differently
///
/// Formatting characters are ignored. An E.164 number (leading `+`) equals
/// a national one when it ends with the national digits, minus a leading
/// trunk `0`, and the remaining prefix is a plausible country code.
pub fn phone_numbers_match(a: &str, b: &str) -> bool {
    let (da, db) = (digits(a), digits(b));
    if da.is_empty() || db.is_empty() {
        return false;
    }
    if da == db {
        return true;
    }
    let (international, national) = match (a.trim_start().starts_with('+'), b.trim_start().starts_with('+')) {
        (true, false) => (da, db),
        (false, true) => (db, da),
        _ => return false,
    };
    let national = national.strip_prefix('0').unwrap_or(&national);
    if national.is_empty() || !international.ends_with(national) {
        return false;
    }
    let prefix = international.len() - national.len();
    (1..=MAX_COUNTRY_CODE_DIGITS).contains(&prefix)
}

fn numbers_match(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => phone_numbers_match(a, b),
        _ => false,
    }
}

/// One party's `from` is the other's `to`, and the other way round
pub fn parties_cross_match(a: &Party, b: &Party) -> bool {
    numbers_match(a.from_number(), b.to_number()) && numbers_match(a.to_number(), b.from_number())
}

/// Find the held session that is the other leg of `new_party`'s call
///
/// Only sessions whose "my party" satisfies `is_candidate` are considered.
pub fn correlated_leg<F>(
    new_data: &SessionData,
    new_party: &Party,
    sessions: &[Arc<Session>],
    is_candidate: F,
) -> Option<Arc<Session>>
where
    F: Fn(&Party) -> bool,
{
    let new_session_id = new_data.session_id.as_deref()?;
    sessions
        .iter()
        .find(|session| {
            let Some(mine) = session.party() else {
                return false;
            };
            if !is_candidate(&mine) {
                return false;
            }
            let Some(session_id) = session.session_id() else {
                return false;
            };
            session_ids_correlate(new_session_id, &session_id) && parties_cross_match(new_party, &mine)
        })
        .cloned()
}

fn first_party_with_direction(data: &SessionData, direction: Direction) -> Option<&Party> {
    data.parties.iter().find(|p| p.direction == Some(direction))
}

/// The newly seen session is the inbound leg of a RingOut/RingMe we started
pub fn is_ring_out_inbound_leg(new_data: &SessionData, sessions: &[Arc<Session>]) -> bool {
    let Some(inbound) = first_party_with_direction(new_data, Direction::Inbound) else {
        return false;
    };
    correlated_leg(new_data, inbound, sessions, |mine| {
        mine.direction == Some(Direction::Outbound)
            && (mine.ring_out_role == Some(RingRole::Initiator) || mine.ring_me_role == Some(RingRole::Initiator))
    })
    .is_some()
}

/// The newly seen session is the outbound dispatch leg of an inbound call
/// we already hold
pub fn is_inbound_dispatch_leg(new_data: &SessionData, sessions: &[Arc<Session>]) -> bool {
    let Some(outbound) = first_party_with_direction(new_data, Direction::Outbound) else {
        return false;
    };
    correlated_leg(new_data, outbound, sessions, |mine| mine.direction == Some(Direction::Inbound)).is_some()
}
