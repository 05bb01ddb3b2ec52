use std::fmt;
use std::str::FromStr;

use rand_distr::{Distribution, LogNormal, Normal, Uniform};
use serde::{Deserialize, Serialize};
use statrs::function::erf::{erfc, erfc_inv};
use tmcmc_core::errors::ErrorInfo;
use tmcmc_core::{Bounds, Prior, RngHandle, TmcmcError};

/// One dimensional prior distribution.
///
/// Parsed from lines of the form `<name> <p1> <p2> [<p3> <p4>]`:
///
/// | name | parameters |
/// |---|---|
/// | `uniform` | lower upper |
/// | `normal` | mu sigma |
/// | `lognormal` | mu sigma of the underlying normal |
/// | `truncated_normal` | mu sigma lower upper |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PriorDistribution {
    /// Flat density on `[lower, upper]`.
    Uniform {
        /// Lower bound.
        lower: f64,
        /// Upper bound.
        upper: f64,
    },
    /// Gaussian on the real line.
    Normal {
        /// Mean.
        mu: f64,
        /// Standard deviation.
        sigma: f64,
    },
    /// Log-normal on `(0, inf)`.
    LogNormal {
        /// Mean of the underlying normal.
        mu: f64,
        /// Standard deviation of the underlying normal.
        sigma: f64,
    },
    /// Gaussian restricted to `[lower, upper]`.
    TruncatedNormal {
        /// Mean of the untruncated normal.
        mu: f64,
        /// Standard deviation of the untruncated normal.
        sigma: f64,
        /// Lower truncation point.
        lower: f64,
        /// Upper truncation point.
        upper: f64,
    },
}

fn invalid(line: &str, message: impl Into<String>) -> TmcmcError {
    TmcmcError::Config(
        ErrorInfo::new("invalid-prior", message)
            .with_context("line", line.to_string())
            .with_hint("expected `<uniform|normal|lognormal|truncated_normal> <p1> <p2> [<p3> <p4>]`"),
    )
}

impl PriorDistribution {
    /// Uniform prior on `[lower, upper]`.
    pub fn uniform(lower: f64, upper: f64) -> Result<Self, TmcmcError> {
        Self::Uniform { lower, upper }.validated()
    }

    /// Normal prior with mean `mu` and standard deviation `sigma`.
    pub fn normal(mu: f64, sigma: f64) -> Result<Self, TmcmcError> {
        Self::Normal { mu, sigma }.validated()
    }

    /// Log-normal prior whose logarithm has mean `mu` and deviation `sigma`.
    pub fn log_normal(mu: f64, sigma: f64) -> Result<Self, TmcmcError> {
        Self::LogNormal { mu, sigma }.validated()
    }

    /// Normal prior truncated to `[lower, upper]`.
    pub fn truncated_normal(mu: f64, sigma: f64, lower: f64, upper: f64) -> Result<Self, TmcmcError> {
        Self::TruncatedNormal {
            mu,
            sigma,
            lower,
            upper,
        }
        .validated()
    }

    fn validated(self) -> Result<Self, TmcmcError> {
        let line = self.to_string();
        let params = self.parameters();
        if params.iter().any(|value| !value.is_finite()) {
            return Err(invalid(&line, "prior parameters must be finite"));
        }
        match self {
            Self::Uniform { lower, upper } if lower >= upper => {
                Err(invalid(&line, "uniform lower bound must be below the upper bound"))
            }
            Self::Normal { sigma, .. } | Self::LogNormal { sigma, .. } if sigma <= 0.0 => {
                Err(invalid(&line, "sigma must be positive"))
            }
            Self::TruncatedNormal {
                sigma, lower, upper, ..
            } if sigma <= 0.0 || lower >= upper => Err(invalid(
                &line,
                "truncated normal needs positive sigma and lower < upper",
            )),
            _ => Ok(self),
        }
    }

    /// Name used in the prior-line grammar.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Normal { .. } => "normal",
            Self::LogNormal { .. } => "lognormal",
            Self::TruncatedNormal { .. } => "truncated_normal",
        }
    }

    fn parameters(&self) -> Vec<f64> {
        match *self {
            Self::Uniform { lower, upper } => vec![lower, upper],
            Self::Normal { mu, sigma } | Self::LogNormal { mu, sigma } => vec![mu, sigma],
            Self::TruncatedNormal {
                mu,
                sigma,
                lower,
                upper,
            } => vec![mu, sigma, lower, upper],
        }
    }

    /// Spread parameter of the distribution.
    ///
    /// The error model scales its noise floor by this value: `sigma` for the
    /// Gaussian families, the standard deviation `(upper - lower) / sqrt(12)`
    /// for the uniform family.
    pub fn scale(&self) -> f64 {
        match *self {
            Self::Uniform { lower, upper } => (upper - lower) / 12f64.sqrt(),
            Self::Normal { sigma, .. }
            | Self::LogNormal { sigma, .. }
            | Self::TruncatedNormal { sigma, .. } => sigma,
        }
    }
}

const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

fn unit_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

fn unit_quantile(p: f64) -> f64 {
    -std::f64::consts::SQRT_2 * erfc_inv(2.0 * p)
}

/// Beyond this many standard deviations the CDF is handled asymptotically.
const FAR_TAIL: f64 = 30.0;

/// Natural log of the standard normal CDF, accurate deep into the lower tail.
fn log_unit_cdf(z: f64) -> f64 {
    if z > -FAR_TAIL {
        return unit_cdf(z).ln();
    }
    let inv = 1.0 / (z * z);
    let series = 1.0 - inv * (1.0 - 3.0 * inv * (1.0 - 5.0 * inv * (1.0 - 7.0 * inv)));
    -0.5 * z * z - (-z).ln() - LN_SQRT_2PI + series.ln()
}

/// Standardised truncation interval, mirrored into the lower tail when it
/// lies entirely above the mean so that both CDF values keep their precision.
struct Truncation {
    lo: f64,
    hi: f64,
    mirrored: bool,
}

impl Truncation {
    fn new(mu: f64, sigma: f64, lower: f64, upper: f64) -> Self {
        let a = (lower - mu) / sigma;
        let b = (upper - mu) / sigma;
        if a > 0.0 {
            Self {
                lo: -b,
                hi: -a,
                mirrored: true,
            }
        } else {
            Self {
                lo: a,
                hi: b,
                mirrored: false,
            }
        }
    }

    fn log_mass(&self) -> f64 {
        let log_hi = log_unit_cdf(self.hi);
        log_hi + (-(log_unit_cdf(self.lo) - log_hi).exp()).ln_1p()
    }

    fn standard_draw(&self, rng: &mut RngHandle) -> f64 {
        let z = if self.hi < -FAR_TAIL {
            -far_tail_draw(-self.hi, -self.lo, rng)
        } else {
            let lo = unit_cdf(self.lo);
            let hi = unit_cdf(self.hi);
            unit_quantile(lo + (hi - lo) * rng.next_unit())
        };
        if self.mirrored {
            -z
        } else {
            z
        }
    }
}

/// Draws from N(0, 1) restricted to `[a, b]` with `a >= FAR_TAIL`.
///
/// Proposes from the exponential with rate `a` truncated to the interval and
/// accepts with probability `exp(-(z - a)^2 / 2)`.
fn far_tail_draw(a: f64, b: f64, rng: &mut RngHandle) -> f64 {
    let span = (-a * (b - a)).exp_m1();
    let mut z = a;
    for _ in 0..64 {
        z = (a - (rng.next_unit() * span).ln_1p() / a).min(b);
        let excess = z - a;
        if rng.next_unit() < (-0.5 * excess * excess).exp() {
            break;
        }
    }
    z
}

impl Prior for PriorDistribution {
    fn sample(&self, rng: &mut RngHandle) -> f64 {
        match *self {
            Self::Uniform { lower, upper } => Uniform::new_inclusive(lower, upper).sample(rng),
            Self::Normal { mu, sigma } => match Normal::new(mu, sigma) {
                Ok(dist) => dist.sample(rng),
                Err(_) => mu,
            },
            Self::LogNormal { mu, sigma } => match LogNormal::new(mu, sigma) {
                Ok(dist) => dist.sample(rng),
                Err(_) => mu.exp(),
            },
            Self::TruncatedNormal {
                mu,
                sigma,
                lower,
                upper,
            } => {
                let z = Truncation::new(mu, sigma, lower, upper).standard_draw(rng);
                (mu + sigma * z).clamp(lower, upper)
            }
        }
    }

    fn log_density(&self, value: f64) -> f64 {
        if !self.bounds().contains(value) {
            return f64::NEG_INFINITY;
        }
        match *self {
            Self::Uniform { lower, upper } => -(upper - lower).ln(),
            Self::Normal { mu, sigma } => {
                let z = (value - mu) / sigma;
                -0.5 * z * z - sigma.ln() - LN_SQRT_2PI
            }
            Self::LogNormal { mu, sigma } => {
                if value <= 0.0 {
                    return f64::NEG_INFINITY;
                }
                let z = (value.ln() - mu) / sigma;
                -0.5 * z * z - (value * sigma).ln() - LN_SQRT_2PI
            }
            Self::TruncatedNormal {
                mu,
                sigma,
                lower,
                upper,
            } => {
                let z = (value - mu) / sigma;
                let log_mass = Truncation::new(mu, sigma, lower, upper).log_mass();
                -0.5 * z * z - LN_SQRT_2PI - sigma.ln() - log_mass
            }
        }
    }

    fn bounds(&self) -> Bounds {
        match *self {
            Self::Uniform { lower, upper } | Self::TruncatedNormal { lower, upper, .. } => {
                Bounds::new(lower, upper)
            }
            Self::Normal { .. } => Bounds::real_line(),
            Self::LogNormal { .. } => Bounds::new(0.0, f64::INFINITY),
        }
    }
}

impl FromStr for PriorDistribution {
    type Err = TmcmcError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();
        let Some(name) = tokens.next() else {
            return Err(TmcmcError::Config(
                ErrorInfo::new("missing-prior", "prior specification is empty")
                    .with_hint("expected `<name> <p1> <p2> [<p3> <p4>]`"),
            ));
        };
        let params = tokens
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|_| invalid(line, format!("`{token}` is not a number")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let name = name.to_ascii_lowercase();
        let arity = match name.as_str() {
            "uniform" | "normal" | "lognormal" => 2,
            "truncated_normal" => 4,
            _ => {
                return Err(TmcmcError::Config(
                    ErrorInfo::new("unknown-prior", format!("prior type `{name}` not recognised"))
                        .with_context("line", line.to_string())
                        .with_hint("supported priors: uniform, normal, lognormal, truncated_normal"),
                ))
            }
        };
        if params.len() != arity {
            return Err(invalid(
                line,
                format!("`{name}` takes {arity} parameters, found {}", params.len()),
            ));
        }
        match name.as_str() {
            "uniform" => Self::uniform(params[0], params[1]),
            "normal" => Self::normal(params[0], params[1]),
            "lognormal" => Self::log_normal(params[0], params[1]),
            _ => Self::truncated_normal(params[0], params[1], params[2], params[3]),
        }
    }
}

impl TryFrom<String> for PriorDistribution {
    type Error = TmcmcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PriorDistribution> for String {
    fn from(value: PriorDistribution) -> Self {
        value.to_string()
    }
}

impl fmt::Display for PriorDistribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())?;
        for value in self.parameters() {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

/// Ordered collection of one prior per model parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorSet {
    priors: Vec<PriorDistribution>,
}

impl PriorSet {
    /// Wraps the per-dimension priors.
    pub fn new(priors: Vec<PriorDistribution>) -> Self {
        Self { priors }
    }

    /// Problem dimension.
    pub fn dimension(&self) -> usize {
        self.priors.len()
    }

    /// Per-dimension priors in parameter order.
    pub fn priors(&self) -> &[PriorDistribution] {
        &self.priors
    }

    /// Draws one point, coordinate by coordinate.
    pub fn sample_point(&self, rng: &mut RngHandle) -> Vec<f64> {
        self.priors.iter().map(|prior| prior.sample(rng)).collect()
    }

    /// Joint log density (independent coordinates).
    pub fn log_density(&self, point: &[f64]) -> f64 {
        self.priors
            .iter()
            .zip(point)
            .map(|(prior, &value)| prior.log_density(value))
            .sum()
    }

    /// Returns whether every coordinate of `point` lies in its prior support.
    pub fn contains(&self, point: &[f64]) -> bool {
        self.priors
            .iter()
            .zip(point)
            .all(|(prior, &value)| prior.bounds().contains(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_round_trips_through_parser() {
        let prior = PriorDistribution::truncated_normal(3.0, 1.0, 0.0, 2.5).unwrap();
        let parsed: PriorDistribution = prior.to_string().parse().unwrap();
        assert_eq!(parsed, prior);
    }

    #[test]
    fn uniform_scale_is_standard_deviation() {
        let prior = PriorDistribution::uniform(0.0, 12f64.sqrt()).unwrap();
        assert!((prior.scale() - 1.0).abs() < 1e-12);
    }
}
