//! GPS forwarder sentence parsing.
//!
//! Supports the formats commonly emitted by phone GPS forwarder apps:
//! - **NMEA 0183** `$--RMC` and `$--GGA` sentences (any talker prefix)
//! - **XGPS** simulator sentences (`XGPSName,lon,lat,alt,track,speed`)
//!
//! Sentences with a failing checksum, a void RMC status, or a zero GGA fix
//! quality are rejected.

use tracing::trace;

use super::poller::PositionFix;

/// Parse a forwarder datagram (auto-detects format).
pub(crate) fn parse_datagram(data: &[u8]) -> Option<PositionFix> {
    let text = std::str::from_utf8(data).ok()?.trim_end_matches(['\r', '\n']);

    if let Some(rest) = text.strip_prefix('$') {
        return parse_nmea(rest);
    }
    if text.starts_with("XGPS") {
        return parse_xgps(text);
    }

    None
}

/// Parse an NMEA sentence body (after the leading `$`).
fn parse_nmea(body: &str) -> Option<PositionFix> {
    let payload = match body.split_once('*') {
        Some((payload, checksum)) => {
            if !checksum_matches(payload, checksum) {
                trace!(checksum, "NMEA checksum mismatch");
                return None;
            }
            payload
        }
        // Some forwarders omit the checksum entirely
        None => body,
    };

    let fields: Vec<&str> = payload.split(',').collect();
    let address = fields.first()?;

    // Accept any talker prefix (GP, GN, GL, ...) - the sentence type is the
    // last three characters of the address field.
    if address.len() < 5 {
        return None;
    }
    match &address[address.len() - 3..] {
        "RMC" => parse_rmc(&fields),
        "GGA" => parse_gga(&fields),
        _ => None,
    }
}

/// Parse an RMC sentence: `$--RMC,time,status,lat,N/S,lon,E/W,...`
fn parse_rmc(fields: &[&str]) -> Option<PositionFix> {
    if fields.len() < 7 {
        trace!("RMC sentence too short: {} fields", fields.len());
        return None;
    }

    // Status "A" = active fix, "V" = void
    if fields[2] != "A" {
        trace!(status = fields[2], "RMC fix void, skipping");
        return None;
    }

    let latitude = parse_coordinate(fields[3], fields[4])?;
    let longitude = parse_coordinate(fields[5], fields[6])?;

    Some(PositionFix {
        latitude,
        longitude,
    })
}

/// Parse a GGA sentence: `$--GGA,time,lat,N/S,lon,E/W,quality,...`
fn parse_gga(fields: &[&str]) -> Option<PositionFix> {
    if fields.len() < 7 {
        trace!("GGA sentence too short: {} fields", fields.len());
        return None;
    }

    // Fix quality 0 = no fix
    let quality: u8 = fields[6].parse().ok()?;
    if quality == 0 {
        trace!("GGA fix quality 0, skipping");
        return None;
    }

    let latitude = parse_coordinate(fields[2], fields[3])?;
    let longitude = parse_coordinate(fields[4], fields[5])?;

    Some(PositionFix {
        latitude,
        longitude,
    })
}

/// Parse an XGPS sentence: `XGPSName,lon,lat,alt_m,track,speed_m/s`
///
/// Note the longitude-first field order.
fn parse_xgps(text: &str) -> Option<PositionFix> {
    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() < 3 {
        trace!("XGPS sentence too short: {} parts", parts.len());
        return None;
    }

    let longitude: f64 = parts[1].parse().ok()?;
    let latitude: f64 = parts[2].parse().ok()?;

    Some(PositionFix {
        latitude,
        longitude,
    })
}

/// Convert an NMEA `ddmm.mmmm` coordinate plus hemisphere to decimal degrees.
fn parse_coordinate(value: &str, hemisphere: &str) -> Option<f64> {
    let dot = value.find('.')?;
    if dot < 3 {
        return None;
    }

    // Degrees are everything up to two digits before the decimal point;
    // the remainder is minutes.
    let (degrees_part, minutes_part) = value.split_at(dot - 2);
    let degrees: f64 = degrees_part.parse().ok()?;
    let minutes: f64 = minutes_part.parse().ok()?;

    let magnitude = degrees + minutes / 60.0;

    match hemisphere {
        "N" | "E" => Some(magnitude),
        "S" | "W" => Some(-magnitude),
        _ => None,
    }
}

/// Verify an NMEA checksum: XOR of all payload bytes against the hex suffix.
fn checksum_matches(payload: &str, checksum: &str) -> bool {
    let expected = match u8::from_str_radix(checksum.trim(), 16) {
        Ok(value) => value,
        Err(_) => return false,
    };
    let actual = payload.bytes().fold(0u8, |acc, b| acc ^ b);
    actual == expected
}
