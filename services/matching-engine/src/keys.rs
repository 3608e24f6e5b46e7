//! Index key encodings
//!
//! Three keyspaces plus the order id counter, all under one-byte prefixes:
//!
//! ```text
//! O/{owner}/{client_order_id}        -> bincode Order          (owner index)
//! P/{src}/{dst}/{price_be}{id_be}    -> owner key bytes        (pricing index)
//! I/{src}/{dst}                      -> empty marker           (instrument set)
//! N                                  -> uvarint next order id
//! ```
//!
//! Prices are encoded big-endian fixed-width so byte order equals numeric
//! order: 16 bytes of integer part followed by 8 bytes holding the 18
//! fractional digits. Scanning a pricing prefix therefore yields orders in
//! match priority (price ascending, id ascending).

use types::coin::Denom;
use types::ids::{AccountAddr, OrderId};
use types::numeric::{Price, PRICE_DECIMAL_PLACES};

/// Key of the persisted order id counter
pub const ORDER_ID_KEY: &[u8] = b"N";

const OWNER_PREFIX: &str = "O/";
const PRICING_PREFIX: &str = "P/";
const INSTRUMENT_PREFIX: &str = "I/";

pub fn owner_key(owner: &AccountAddr, client_order_id: &str) -> Vec<u8> {
    format!("{}{}/{}", OWNER_PREFIX, owner, client_order_id).into_bytes()
}

pub fn owner_prefix(owner: &AccountAddr) -> Vec<u8> {
    format!("{}{}/", OWNER_PREFIX, owner).into_bytes()
}

pub fn pricing_key(src: &Denom, dst: &Denom, price: Price, id: OrderId) -> Vec<u8> {
    let mut key = pricing_prefix(src, dst);
    key.extend_from_slice(&encode_price_be(price));
    key.extend_from_slice(&id.to_be_bytes());
    key
}

pub fn pricing_prefix(src: &Denom, dst: &Denom) -> Vec<u8> {
    format!("{}{}/{}/", PRICING_PREFIX, src, dst).into_bytes()
}

pub fn instrument_key(src: &Denom, dst: &Denom) -> Vec<u8> {
    format!("{}{}/{}", INSTRUMENT_PREFIX, src, dst).into_bytes()
}

pub fn instrument_prefix_by_source(src: &Denom) -> Vec<u8> {
    format!("{}{}/", INSTRUMENT_PREFIX, src).into_bytes()
}

/// Recover the (source, destination) pair from an instrument key
pub fn parse_instrument_key(key: &[u8]) -> Option<(Denom, Denom)> {
    let key = std::str::from_utf8(key).ok()?;
    let rest = key.strip_prefix(INSTRUMENT_PREFIX)?;
    let (src, dst) = rest.split_once('/')?;
    Some((Denom::try_new(src)?, Denom::try_new(dst)?))
}

/// Fixed-width big-endian price encoding
///
/// 16-byte integer part, then the 18 fractional digits as an 8-byte integer.
/// Lexicographic comparison of the result matches numeric comparison of the
/// prices.
pub fn encode_price_be(price: Price) -> [u8; 24] {
    let decimal = price.as_decimal();
    let scale = decimal.scale();
    debug_assert!(scale <= PRICE_DECIMAL_PLACES);

    let mantissa = decimal.mantissa();
    let pow = 10i128.pow(scale);
    let integer = (mantissa / pow) as u128;
    let fraction = ((mantissa % pow) * 10i128.pow(PRICE_DECIMAL_PLACES - scale)) as u64;

    let mut out = [0u8; 24];
    out[..16].copy_from_slice(&integer.to_be_bytes());
    out[16..].copy_from_slice(&fraction.to_be_bytes());
    out
}

/// Unsigned LEB128 encoding for the order id counter
pub fn encode_uvarint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Decode an unsigned LEB128 value, rejecting trailing bytes
pub fn decode_uvarint(bytes: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    let mut shift = 0u32;
    for (i, byte) in bytes.iter().enumerate() {
        if shift >= 64 {
            return None;
        }
        value |= u64::from(byte & 0x7f) << shift;
        if byte & 0x80 == 0 {
            return if i + 1 == bytes.len() { Some(value) } else { None };
        }
        shift += 7;
    }
    None
}
