//! Synthetic GRIB2 message builder.
//!
//! Produces minimal but complete GRIB2 messages: template 3.0 regular
//! lat/lon grid, product template 4.0 (instantaneous) or 4.8 (statistically
//! processed), template 5.0 simple packing and no bitmap. Several messages
//! concatenated form a valid multi-message file.

/// GRIB2 encodes signed integers as sign and magnitude, not two's complement.
fn grib_i16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7fff;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}

fn grib_i32(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7fff_ffff;
    let raw = if value < 0 {
        magnitude | 0x8000_0000
    } else {
        magnitude
    };
    raw.to_be_bytes()
}

/// Statistical processing period of a template 4.8 product.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Accumulation {
    start_hour: u32,
    length_hours: u32,
}

/// Build a minimal GRIB2 message with the specified parameters.
#[derive(Debug, Clone)]
pub struct Grib2Builder {
    discipline: u8,
    centre: u16,
    year: u16,
    month: u8,
    day: u8,
    // Grid definition
    ni: u32,
    nj: u32,
    la1: i32, // microdegrees
    lo1: i32,
    increment: u32,
    // Product definition
    category: u8,
    number: u8,
    surface_type: u8,
    surface_value: u32,
    forecast_hour: u32,
    accumulation: Option<Accumulation>,
    values: Vec<f32>,
}

impl Grib2Builder {
    /// A 2 m temperature message on a 4x4 1-degree grid with its north-west
    /// corner at 45N 5E.
    pub fn new() -> Self {
        let (ni, nj) = (4, 4);
        Self {
            discipline: 0,
            centre: 98, // ECMWF
            year: 2025,
            month: 1,
            day: 1,
            ni,
            nj,
            la1: 45_000_000,
            lo1: 5_000_000,
            increment: 1_000_000,
            category: 0,
            number: 0,
            surface_type: 103,
            surface_value: 2,
            forecast_hour: 0,
            accumulation: None,
            values: vec![288.15; (ni * nj) as usize],
        }
    }

    pub fn with_reference_date(mut self, year: u16, month: u8, day: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self
    }

    /// Grid of `ni` columns by `nj` rows; values reset to zero.
    pub fn with_grid(mut self, ni: u32, nj: u32) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.values = vec![0.0; (ni * nj) as usize];
        self
    }

    /// North-west corner and spacing, in degrees.
    pub fn with_origin(mut self, lat: f64, lon: f64, increment: f64) -> Self {
        self.la1 = (lat * 1e6).round() as i32;
        self.lo1 = (lon * 1e6).round() as i32;
        self.increment = (increment * 1e6).round() as u32;
        self
    }

    pub fn with_parameter(mut self, discipline: u8, category: u8, number: u8) -> Self {
        self.discipline = discipline;
        self.category = category;
        self.number = number;
        self
    }

    pub fn with_surface(mut self, surface_type: u8, value: u32) -> Self {
        self.surface_type = surface_type;
        self.surface_value = value;
        self
    }

    /// Instantaneous product at `hour` (template 4.0).
    pub fn with_forecast_hour(mut self, hour: u32) -> Self {
        self.forecast_hour = hour;
        self.accumulation = None;
        self
    }

    /// Accumulation from `start_hour` to `end_hour` (template 4.8).
    pub fn with_accumulation(mut self, start_hour: u32, end_hour: u32) -> Self {
        self.forecast_hour = start_hour;
        self.accumulation = Some(Accumulation {
            start_hour,
            length_hours: end_hour.saturating_sub(start_hour),
        });
        self
    }

    pub fn with_values(mut self, values: Vec<f32>) -> Self {
        self.values = values;
        self
    }

    pub fn with_constant_value(mut self, value: f32) -> Self {
        self.values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    /// Build the complete GRIB2 message bytes.
    pub fn build(&self) -> Vec<u8> {
        let sections = [
            self.build_section1(),
            self.build_section3(),
            self.build_section4(),
            self.build_section5(),
            self.build_section6(),
            self.build_section7(),
        ];
        let body_len: usize = sections.iter().map(Vec::len).sum();
        let message_length = 16 + body_len + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        for section in &sections {
            message.extend_from_slice(section);
        }

        // Section 8: End
        message.extend_from_slice(b"7777");
        message
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(21);
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&self.centre.to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // sub-centre
        section.push(2); // master table version
        section.push(0); // local table version
        section.push(1); // reference time is start of forecast

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.extend_from_slice(&[0, 0, 0]); // hour, minute, second

        section.push(0); // operational
        section.push(1); // forecast
        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(72);
        section.extend_from_slice(&72u32.to_be_bytes());
        section.push(3);

        section.push(0); // source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // no optional list
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // template 3.0

        // Template 3.0
        section.push(6); // spherical earth, radius 6371229 m
        section.extend_from_slice(&[0; 15]); // radius and axes unused
        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // basic angle
        section.extend_from_slice(&u32::MAX.to_be_bytes()); // subdivisions

        let span = |n: u32| self.increment as i64 * (n.max(1) - 1) as i64;
        let la2 = (self.la1 as i64 - span(self.nj)) as i32;
        let lo2 = (self.lo1 as i64 + span(self.ni)) as i32;

        section.extend_from_slice(&grib_i32(self.la1));
        section.extend_from_slice(&grib_i32(self.lo1));
        section.push(0x30); // increments given
        section.extend_from_slice(&grib_i32(la2));
        section.extend_from_slice(&grib_i32(lo2));
        section.extend_from_slice(&self.increment.to_be_bytes()); // Di
        section.extend_from_slice(&self.increment.to_be_bytes()); // Dj
        section.push(0); // +i, -j, rows consecutive
        section
    }

    fn build_section4(&self) -> Vec<u8> {
        let (template, length): (u16, u32) = match self.accumulation {
            Some(_) => (8, 58),
            None => (0, 34),
        };
        let mut section = Vec::with_capacity(length as usize);
        section.extend_from_slice(&length.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // no coordinate values
        section.extend_from_slice(&template.to_be_bytes());

        section.push(self.category);
        section.push(self.number);
        section.push(2); // forecast
        section.push(0); // background process
        section.push(0); // forecast process
        section.extend_from_slice(&0u16.to_be_bytes()); // cutoff hours
        section.push(0); // cutoff minutes
        section.push(1); // hours
        section.extend_from_slice(&self.forecast_hour.to_be_bytes());

        section.push(self.surface_type);
        section.push(0);
        section.extend_from_slice(&self.surface_value.to_be_bytes());
        section.push(255); // no second surface
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        if let Some(acc) = self.accumulation {
            // End of the overall time interval; only the day matters here.
            let end_hour = acc.start_hour + acc.length_hours;
            section.extend_from_slice(&self.year.to_be_bytes());
            section.push(self.month);
            section.push(self.day + (end_hour / 24) as u8);
            section.push((end_hour % 24) as u8);
            section.push(0);
            section.push(0);

            section.push(1); // one time range
            section.extend_from_slice(&0u32.to_be_bytes()); // none missing
            section.push(1); // accumulation
            section.push(2); // successive forecasts, same reference time
            section.push(1); // hours
            section.extend_from_slice(&acc.length_hours.to_be_bytes());
            section.push(255); // no increment
            section.extend_from_slice(&0u32.to_be_bytes());
        }
        section
    }

    /// Binary scale factor E so that the value range fits in 16 bits.
    fn packing(&self) -> (f32, i16, u8) {
        let (min, max) = self
            .values
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let min = if min.is_finite() { min } else { 0.0 };
        let range = max - min;
        if range.is_nan() || range <= 0.0 {
            return (min, 0, 0);
        }
        let e = (range / 65535.0).log2().ceil() as i16;
        (min, e, 16)
    }

    fn build_section5(&self) -> Vec<u8> {
        let (reference, e, bits) = self.packing();
        let mut section = Vec::with_capacity(21);
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(5);

        section.extend_from_slice(&(self.values.len() as u32).to_be_bytes());
        section.extend_from_slice(&0u16.to_be_bytes()); // template 5.0

        section.extend_from_slice(&reference.to_be_bytes());
        section.extend_from_slice(&grib_i16(e));
        section.extend_from_slice(&grib_i16(0)); // decimal scale factor
        section.push(bits);
        section.push(0); // floating point
        section
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::with_capacity(6);
        section.extend_from_slice(&6u32.to_be_bytes());
        section.push(6);
        section.push(255); // no bitmap
        section
    }

    fn build_section7(&self) -> Vec<u8> {
        let (reference, e, bits) = self.packing();
        let mut packed = Vec::new();
        if bits > 0 {
            let scale = 2f32.powi(e as i32);
            for &value in &self.values {
                let v = ((value - reference) / scale).round() as u16;
                packed.extend_from_slice(&v.to_be_bytes());
            }
        }

        let mut section = Vec::with_capacity(5 + packed.len());
        section.extend_from_slice(&(5 + packed.len() as u32).to_be_bytes());
        section.push(7);
        section.extend_from_slice(&packed);
        section
    }
}

impl Default for Grib2Builder {
    fn default() -> Self {
        Self::new()
    }
}

/// Concatenate messages into one file body.
pub fn build_grib_file(messages: &[Grib2Builder]) -> Vec<u8> {
    messages.iter().flat_map(|m| m.build()).collect()
}
