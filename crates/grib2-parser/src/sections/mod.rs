//! Product definition (section 4) decoding.
//!
//! The `grib` crate exposes the forecast time of a product but not the end
//! of its statistical processing period, so step timing is read from the
//! raw section 4 payload here. Offsets are relative to the start of the
//! product definition template, which begins at payload octet 4.

use crate::error::{Grib2Error, Result};

const START_OF_PROD_TEMPLATE: usize = 4;

/// Template offset of the indicator of unit of time range (octet 18).
const FORECAST_UNIT_OFFSET: usize = 8;

/// Start and end of a product's validity, in forecast hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProductTiming {
    pub start_step: u32,
    pub end_step: u32,
}

impl ProductTiming {
    /// Decode the timing of a product from its template number and the raw
    /// section 4 payload (section header excluded).
    pub fn decode(template: u16, payload: &[u8]) -> Result<Self> {
        let start_step = read_hours(payload, FORECAST_UNIT_OFFSET)?;

        // Templates with a statistical processing period carry the length
        // of the (first) time range after the end-of-period timestamp.
        let period_unit_offset = match template {
            8 => Some(39),
            11 => Some(42),
            _ => None,
        };

        let end_step = match period_unit_offset {
            Some(offset) => {
                let length = read_hours(payload, offset)?;
                start_step.checked_add(length).ok_or_else(|| {
                    Grib2Error::InvalidFormat(format!(
                        "period of {} h starting at {} h overflows",
                        length, start_step
                    ))
                })?
            }
            None => start_step,
        };

        Ok(Self {
            start_step,
            end_step,
        })
    }
}

/// Read a unit octet followed by a 4-octet duration and convert to hours.
fn read_hours(payload: &[u8], template_offset: usize) -> Result<u32> {
    let unit_index = START_OF_PROD_TEMPLATE + template_offset;
    let bytes = payload.get(unit_index..unit_index + 5).ok_or_else(|| {
        Grib2Error::InvalidFormat(format!(
            "product definition too short: {} octets, need {}",
            payload.len(),
            unit_index + 5
        ))
    })?;
    let value = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]);
    to_hours(bytes[0], value)
}

/// Convert a duration in a code table 4.4 unit to whole hours.
pub fn to_hours(unit: u8, value: u32) -> Result<u32> {
    let exact = |divisor: u32| {
        if value % divisor == 0 {
            Ok(value / divisor)
        } else {
            Err(Grib2Error::InvalidFormat(format!(
                "duration {} in unit {} is not a whole number of hours",
                value, unit
            )))
        }
    };
    let scaled = |factor: u32| {
        value.checked_mul(factor).ok_or_else(|| {
            Grib2Error::InvalidFormat(format!(
                "duration {} in unit {} overflows when converted to hours",
                value, unit
            ))
        })
    };
    match unit {
        0 => exact(60),
        1 => Ok(value),
        2 => scaled(24),
        10 => scaled(3),
        11 => scaled(6),
        12 => scaled(12),
        13 => exact(3600),
        other => Err(Grib2Error::UnsupportedTimeUnit(other)),
    }
}
