// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Latest fix selection
//!
//! Reduces a fix history to the most recent fix per device. When several
//! fixes share the greatest timestamp, the one inserted first wins.

use super::decryptor::DecryptedFix;
use crate::crypto::LookupIdentifier;
use std::collections::BTreeMap;

/// Pick the fix with the greatest timestamp for every identifier
///
/// Identifiers with an empty history are left out.
pub fn latest_per_identifier(
    fixes: &BTreeMap<LookupIdentifier, Vec<DecryptedFix>>,
) -> BTreeMap<LookupIdentifier, DecryptedFix> {
    fixes
        .iter()
        .filter_map(|(id, history)| latest_fix(history).map(|fix| (*id, fix.clone())))
        .collect()
}

/// Most recent fix in one history, earliest insertion on ties
pub fn latest_fix(history: &[DecryptedFix]) -> Option<&DecryptedFix> {
    history.iter().fold(None, |best: Option<&DecryptedFix>, fix| match best {
        Some(current) if current.timestamp >= fix.timestamp => Some(current),
        _ => Some(fix),
    })
}
