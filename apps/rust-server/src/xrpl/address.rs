// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 TULDOK Social

//! XRPL classic address validation.
//!
//! A classic address is the base58check encoding (Ripple alphabet) of
//! `0x00 || account_id[20]`.

use bs58::Alphabet;

const ACCOUNT_ID_VERSION: u8 = 0x00;
/// Version byte plus the 20-byte account ID, checksum stripped.
const PAYLOAD_LEN: usize = 21;
const MIN_ADDRESS_LEN: usize = 25;
const MAX_ADDRESS_LEN: usize = 35;

/// Returns `true` for a well-formed XRPL classic address (`r...`).
pub fn is_valid_classic_address(address: &str) -> bool {
    if !address.starts_with('r')
        || address.len() < MIN_ADDRESS_LEN
        || address.len() > MAX_ADDRESS_LEN
    {
        return false;
    }

    bs58::decode(address)
        .with_alphabet(Alphabet::RIPPLE)
        .with_check(Some(ACCOUNT_ID_VERSION))
        .into_vec()
        .is_ok_and(|payload| payload.len() == PAYLOAD_LEN)
}
