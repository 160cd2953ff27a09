//! The hash engine: canonical payload encoding and block hashing.
//!
//! A block hash is the SHA-256 of the UTF-8 bytes of
//!
//!   type ++ canonical_json(payload) ++ timestamp ++ previous_hash
//!
//! rendered as 64 lowercase hex characters.  The concatenation order and
//! both string renderings are fixed: ledgers written by the previous
//! implementation of this system must keep verifying.
//!
//! `canonical_json` sorts object keys at every level and formats like a
//! `sort_keys=True` JSON dump with default settings: `", "` and `": "`
//! separators, every character outside printable ASCII escaped as
//! `\uXXXX`, and floats in shortest round-trip form (`2.0`, `1e+16`).

use std::io;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::ser::Formatter;
use serde_json::Value;
use sha2::{Digest, Sha256};

use chainlog_contracts::{Block, LedgerResult};

/// Compute the hash of a block from its four hash inputs.
///
/// `timestamp` must already be rendered with [`format_timestamp`].
/// Returns a lowercase 64-character hex string.
pub fn compute_hash(
    kind: &str,
    payload: &Value,
    timestamp: &str,
    previous_hash: &str,
) -> LedgerResult<String> {
    let payload_json = canonical_json(payload)?;

    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(payload_json.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(previous_hash.as_bytes());

    Ok(hex::encode(hasher.finalize()))
}

/// Recompute the hash of a stored block from its own fields.
pub fn hash_block(block: &Block) -> LedgerResult<String> {
    compute_hash(
        &block.kind,
        &block.payload,
        &format_timestamp(&block.timestamp),
        &block.previous_hash,
    )
}

/// Render a timestamp exactly as it is fed into the hash.
///
/// ISO-8601 with an explicit `+00:00` offset and six fractional digits,
/// with the fraction left out entirely when it is zero.
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    let precision = if timestamp.timestamp_subsec_micros() == 0 {
        SecondsFormat::Secs
    } else {
        SecondsFormat::Micros
    };
    timestamp.to_rfc3339_opts(precision, false)
}

/// The current time, truncated to the precision `format_timestamp` keeps.
pub fn frozen_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Encode `payload` with sorted keys and the fixed formatting rules.
///
/// The stored payload is never reordered; only this rendering is.
pub fn canonical_json(payload: &Value) -> LedgerResult<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    Canonical(payload).serialize(&mut serializer)?;
    // The formatter only ever emits ASCII.
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

// ── Sorted-key view over a JSON value ────────────────────────────────────────

struct Canonical<'a>(&'a Value);

impl Serialize for Canonical<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                // Byte order of UTF-8 equals code point order.
                entries.sort_by(|a, b| a.0.cmp(b.0));
                let mut out = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    out.serialize_entry(key, &Canonical(value))?;
                }
                out.end()
            }
            Value::Array(items) => {
                let mut out = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    out.serialize_element(&Canonical(item))?;
                }
                out.end()
            }
            scalar => scalar.serialize(serializer),
        }
    }
}

// ── Output formatting ────────────────────────────────────────────────────────

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    /// Quote, backslash and control characters are escaped by serde_json
    /// before fragments reach here; everything else non-printable is
    /// escaped as UTF-16 code units.
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (idx, ch) in fragment.char_indices() {
            if (' '..='~').contains(&ch) {
                continue;
            }
            writer.write_all(fragment[start..idx].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = idx + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    fn write_f32<W>(&mut self, writer: &mut W, value: f32) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(f64::from(value)).as_bytes())
    }
}

/// Shortest round-trip float rendering, positional for decimal exponents in
/// `[-4, 16)` and scientific with a signed two-digit exponent otherwise.
fn float_repr(value: f64) -> String {
    if value == 0.0 {
        return if value.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    let scientific = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = scientific.split_once('e') else {
        return value.to_string();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return value.to_string();
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    if (-4..16).contains(&exponent) {
        if exponent >= 0 {
            let point = exponent as usize + 1;
            if digits.len() <= point {
                format!("{sign}{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{sign}{}.{}", &digits[..point], &digits[point..])
            }
        } else {
            format!("{sign}0.{}{digits}", "0".repeat((-exponent - 1) as usize))
        }
    } else {
        let (head, tail) = digits.split_at(1);
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        if tail.is_empty() {
            format!("{sign}{head}e{exp_sign}{:02}", exponent.abs())
        } else {
            format!("{sign}{head}.{tail}e{exp_sign}{:02}", exponent.abs())
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use serde_json::json;

    use chainlog_contracts::GENESIS_HASH;

    use super::*;

    #[test]
    fn known_vector_for_genesis_company_block() {
        let hash = compute_hash(
            "company-created",
            &json!({ "nit": "900123456", "nombre": "Acme" }),
            "2024-01-15T10:30:00+00:00",
            GENESIS_HASH,
        )
        .unwrap();
        assert_eq!(
            hash,
            "1dce14ae36fcaaf26b1d78098f645c3e0cf504e14aba428fca687ce4102b1531"
        );
    }

    #[test]
    fn known_vector_with_unicode_float_and_fraction() {
        let hash = compute_hash(
            "product-created",
            &json!({
                "id": 7,
                "codigo": "P-001",
                "nombre": "Café",
                "empresa": "900123456",
                "precio": 12.5
            }),
            "2024-01-15T10:31:00.250000+00:00",
            "1dce14ae36fcaaf26b1d78098f645c3e0cf504e14aba428fca687ce4102b1531",
        )
        .unwrap();
        assert_eq!(
            hash,
            "e87275da9c0919f5b774c427899e0ea4599b7db706a3425bcd685add8cce5ef9"
        );
    }

    #[test]
    fn hash_ignores_key_insertion_order() {
        let mut a = serde_json::Map::new();
        a.insert("zeta".to_string(), json!(1));
        a.insert("alpha".to_string(), json!({ "y": 2, "x": [3, { "b": 1, "a": 0 }] }));

        let mut b = serde_json::Map::new();
        b.insert("alpha".to_string(), json!({ "x": [3, { "a": 0, "b": 1 }], "y": 2 }));
        b.insert("zeta".to_string(), json!(1));

        // The two maps really differ in iteration order before hashing.
        assert_eq!(a.keys().collect::<Vec<_>>(), ["zeta", "alpha"]);
        assert_eq!(b.keys().collect::<Vec<_>>(), ["alpha", "zeta"]);

        let ts = "2024-01-15T10:30:00+00:00";
        let ha = compute_hash("t", &Value::Object(a), ts, GENESIS_HASH).unwrap();
        let hb = compute_hash("t", &Value::Object(b), ts, GENESIS_HASH).unwrap();
        assert_eq!(ha, hb);
    }

    #[test]
    fn canonical_json_sorts_unsorted_maps_without_touching_them() {
        let mut inner = serde_json::Map::new();
        inner.insert("b".to_string(), json!(1));
        inner.insert("a".to_string(), json!(0));
        let mut outer = serde_json::Map::new();
        outer.insert("zeta".to_string(), Value::Object(inner));
        outer.insert("alpha".to_string(), json!([{ "d": 4, "c": 3 }]));
        let payload = Value::Object(outer);

        assert_eq!(
            canonical_json(&payload).unwrap(),
            r#"{"alpha": [{"c": 3, "d": 4}], "zeta": {"a": 0, "b": 1}}"#
        );
        // The value itself keeps its insertion order.
        let keys: Vec<&String> = payload.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["zeta", "alpha"]);
        assert_eq!(payload.to_string(), r#"{"zeta":{"b":1,"a":0},"alpha":[{"d":4,"c":3}]}"#);
    }

    #[test]
    fn hash_is_deterministic_and_lowercase_hex() {
        let payload = json!({ "email": "ana@x.com", "role": "admin" });
        let first = compute_hash("user-created", &payload, "2024-01-01T00:00:00+00:00", GENESIS_HASH)
            .unwrap();
        for _ in 0..10 {
            let again =
                compute_hash("user-created", &payload, "2024-01-01T00:00:00+00:00", GENESIS_HASH)
                    .unwrap();
            assert_eq!(first, again);
        }
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn every_hash_input_changes_the_digest() {
        let payload = json!({ "nit": "1" });
        let ts = "2024-01-01T00:00:00+00:00";
        let base = compute_hash("company-created", &payload, ts, GENESIS_HASH).unwrap();

        let other_kind = compute_hash("company-modified", &payload, ts, GENESIS_HASH).unwrap();
        let other_payload =
            compute_hash("company-created", &json!({ "nit": "2" }), ts, GENESIS_HASH).unwrap();
        let other_ts =
            compute_hash("company-created", &payload, "2024-01-01T00:00:01+00:00", GENESIS_HASH)
                .unwrap();
        let other_prev = compute_hash("company-created", &payload, ts, &"1".repeat(64)).unwrap();

        for h in [other_kind, other_payload, other_ts, other_prev] {
            assert_ne!(base, h);
        }
    }

    #[test]
    fn canonical_json_matches_reference_encoder() {
        let payload = json!({
            "b": [1, 2.0, { "z": null, "a": true }],
            "a": "ñ\u{7f}\n😀",
            "c": {},
            "d": [],
            "e": 1e16,
            "f": 1.5e-7,
            "g": -0.0,
            "h": 123456789.125,
            "i": 0.0001
        });
        let expected = r#"{"a": "\u00f1\u007f\n\ud83d\ude00", "b": [1, 2.0, {"a": true, "z": null}], "c": {}, "d": [], "e": 1e+16, "f": 1.5e-07, "g": -0.0, "h": 123456789.125, "i": 0.0001}"#;
        assert_eq!(canonical_json(&payload).unwrap(), expected);
    }

    #[test]
    fn canonical_json_escapes_quotes_and_backslashes() {
        let payload = json!({ "q": "say \"hi\" \\ bye\t" });
        assert_eq!(
            canonical_json(&payload).unwrap(),
            r#"{"q": "say \"hi\" \\ bye\t"}"#
        );
    }

    #[test]
    fn float_repr_boundaries() {
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(0.001), "0.001");
        assert_eq!(float_repr(0.00001), "1e-05");
        assert_eq!(float_repr(-2.5e-300), "-2.5e-300");
        assert_eq!(float_repr(1.7976931348623157e308), "1.7976931348623157e+308");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-12.0), "-12.0");
    }

    #[test]
    fn timestamp_rendering_drops_zero_fraction() {
        let whole = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(format_timestamp(&whole), "2024-01-15T10:30:00+00:00");

        let fractional = whole + chrono::Duration::milliseconds(250);
        assert_eq!(format_timestamp(&fractional), "2024-01-15T10:30:00.250000+00:00");
    }

    #[test]
    fn frozen_now_has_microsecond_precision() {
        let now = frozen_now();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
