//! Header metadata of individual GRIB2 messages.

use std::fmt;

/// Position of a submessage in a file: `(message, submessage)`.
pub type MessageIndex = (usize, usize);

/// GRIB2 parameter code triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParameterCode {
    pub discipline: u8,
    pub category: u8,
    pub number: u8,
}

impl ParameterCode {
    pub fn new(discipline: u8, category: u8, number: u8) -> Self {
        Self {
            discipline,
            category,
            number,
        }
    }
}

impl fmt::Display for ParameterCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}_{}_{}", self.discipline, self.category, self.number)
    }
}

/// First fixed surface of a product (code table 4.5 type and scaled value).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceLevel {
    pub kind: u8,
    pub value: f64,
}

/// Everything the extractor needs to select a message without decoding it.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageHeader {
    pub index: MessageIndex,
    /// Short identifier resolved from the parameter table, if known.
    pub short_name: Option<String>,
    pub code: ParameterCode,
    pub surface: Option<SurfaceLevel>,
    /// Forecast hour at which the product starts.
    pub start_step: u32,
    /// Forecast hour at which the product ends. Equal to `start_step` for
    /// instantaneous products; the end of the accumulation for statistical ones.
    pub end_step: u32,
}

impl MessageHeader {
    /// Step range in the usual `"start-end"` form, or `"start"` for a
    /// single-step product.
    pub fn step_range(&self) -> String {
        if self.start_step == self.end_step {
            self.start_step.to_string()
        } else {
            format!("{}-{}", self.start_step, self.end_step)
        }
    }

    /// Check if the header refers to the given short identifier.
    pub fn is(&self, short_name: &str) -> bool {
        self.short_name.as_deref() == Some(short_name)
    }

    /// Name used in logs: the short identifier or the code triplet.
    pub fn label(&self) -> String {
        match &self.short_name {
            Some(name) => name.clone(),
            None => self.code.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(start_step: u32, end_step: u32) -> MessageHeader {
        MessageHeader {
            index: (0, 0),
            short_name: Some("tp".to_string()),
            code: ParameterCode::new(0, 1, 8),
            surface: None,
            start_step,
            end_step,
        }
    }

    #[test]
    fn test_step_range() {
        assert_eq!(header(6, 6).step_range(), "6");
        assert_eq!(header(0, 6).step_range(), "0-6");
        assert_eq!(header(0, 0).step_range(), "0");
    }

    #[test]
    fn test_label_falls_back_to_code() {
        let mut h = header(0, 0);
        assert_eq!(h.label(), "tp");
        assert!(h.is("tp"));
        h.short_name = None;
        assert_eq!(h.label(), "P0_1_8");
        assert!(!h.is("tp"));
    }
}
