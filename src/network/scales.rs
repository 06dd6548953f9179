/// `d3.scaleSqrt`-style mapping: sqrt-normalized position within the domain,
/// interpolated into the range. Not clamped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SqrtScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl SqrtScale {
    pub fn new(domain: (f64, f64), range: (f32, f32)) -> Self {
        Self { domain, range }
    }

    pub fn apply(&self, value: f64) -> f32 {
        let a = signed_pow(self.domain.0, 0.5);
        let b = signed_pow(self.domain.1, 0.5);
        let t = normalize(signed_pow(value, 0.5), a, b);
        lerp(self.range.0, self.range.1, t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f32, f32),
}

impl LinearScale {
    pub fn apply(&self, value: f64) -> f32 {
        lerp(
            self.range.0,
            self.range.1,
            normalize(value, self.domain.0, self.domain.1),
        )
    }
}

/// Piecewise power scale over a three-stop domain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowScale {
    pub exponent: f64,
    pub domain: [f64; 3],
    pub range: [f32; 3],
}

impl PowScale {
    pub fn apply(&self, value: f64) -> f32 {
        let segment = if value < self.domain[1] { 0 } else { 1 };
        let a = signed_pow(self.domain[segment], self.exponent);
        let b = signed_pow(self.domain[segment + 1], self.exponent);
        let t = normalize(signed_pow(value, self.exponent), a, b);
        lerp(self.range[segment], self.range[segment + 1], t)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Scales {
    pub repo_radius: SqrtScale,
    pub contributor_radius: SqrtScale,
    pub link_width: PowScale,
    pub link_distance: LinearScale,
}

impl Default for Scales {
    fn default() -> Self {
        Self {
            repo_radius: SqrtScale::new((0.0, 10.0), (4.0, 20.0)),
            contributor_radius: SqrtScale::new((1.0, 10.0), (8.0, 30.0)),
            link_width: PowScale {
                exponent: 0.75,
                domain: [1.0, 10.0, 60.0],
                range: [1.0, 2.0, 60.0],
            },
            link_distance: LinearScale {
                domain: (1.0, 50.0),
                range: (10.0, 80.0),
            },
        }
    }
}

impl Scales {
    pub fn contributor_radius_floor(&self) -> f32 {
        self.contributor_radius.range.0
    }
}

/// Min and max of the values, if any.
pub fn extent(values: impl IntoIterator<Item = f64>) -> Option<(f64, f64)> {
    values.into_iter().fold(None, |acc, value| match acc {
        None => Some((value, value)),
        Some((min, max)) => Some((min.min(value), max.max(value))),
    })
}

fn signed_pow(value: f64, exponent: f64) -> f64 {
    value.signum() * value.abs().powf(exponent)
}

fn normalize(value: f64, a: f64, b: f64) -> f64 {
    let span = b - a;
    if span == 0.0 || !span.is_finite() {
        0.5
    } else {
        (value - a) / span
    }
}

fn lerp(a: f32, b: f32, t: f64) -> f32 {
    (a as f64 + (b as f64 - a as f64) * t) as f32
}
