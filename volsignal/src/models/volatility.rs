use std::f64::consts::{FRAC_2_PI, PI};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::AnalysisError;
use crate::models::optimization::{minimize, SimplexOptions};
use crate::models::returns::ReturnSeries;

/// Below this many returns an order-(1,1) fit is not trusted.
pub const MIN_OBSERVATIONS: usize = 30;

const MIN_VARIANCE: f64 = 1e-12;
const MAX_LOG_VARIANCE: f64 = 700.0;
const MAX_RESTARTS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Garch,
    Egarch,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModelKind::Garch => write!(f, "GARCH(1,1)"),
            ModelKind::Egarch => write!(f, "EGARCH(1,1)"),
        }
    }
}

/// How forecasts beyond one day are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HorizonMethod {
    /// Propagate the expected variance forward from the fitted parameters.
    Recursive,
    /// Append a zero-return placeholder, refit, forecast one step, repeat.
    Refit,
}

/// Forecast standard deviation of daily returns, in percent, one entry per day.
#[derive(Debug, Clone, PartialEq)]
pub struct VolatilityForecast {
    steps: Vec<f64>,
}

impl VolatilityForecast {
    pub fn from_variances(variances: &[f64]) -> Self {
        VolatilityForecast {
            steps: variances.iter().map(|v| v.max(0.0).sqrt()).collect(),
        }
    }

    pub fn steps(&self) -> &[f64] {
        &self.steps
    }

    pub fn horizon(&self) -> usize {
        self.steps.len()
    }

    pub fn one_day(&self) -> f64 {
        self.steps.first().copied().unwrap_or(0.0)
    }

    pub fn at_horizon(&self) -> f64 {
        self.steps.last().copied().unwrap_or(0.0)
    }
}

/// A conditional variance process with a constant mean.
pub trait VolatilityModel: Sized {
    fn mean(&self) -> f64;

    /// Next conditional variance given the latest residual and variance.
    fn next_variance(&self, residual: f64, variance: f64) -> f64;

    /// Next variance when no new shock is observed.
    fn expected_variance(&self, variance: f64) -> f64;

    fn is_admissible(&self) -> bool;

    fn fit_with(
        returns: &ReturnSeries,
        options: &SimplexOptions,
    ) -> Result<FittedModel<Self>, AnalysisError>;

    fn fit(returns: &ReturnSeries) -> Result<FittedModel<Self>, AnalysisError> {
        Self::fit_with(returns, &SimplexOptions::default())
    }
}

/// Symmetric GARCH(1,1): `s2[t] = omega + alpha * e[t-1]^2 + beta * s2[t-1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Garch {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub beta: f64,
}

impl Garch {
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    pub fn long_run_variance(&self) -> Option<f64> {
        let persistence = self.persistence();
        if persistence < 1.0 {
            Some(self.omega / (1.0 - persistence))
        } else {
            None
        }
    }

    /// Days for a variance shock to decay by half.
    pub fn half_life(&self) -> Option<f64> {
        let persistence = self.persistence();
        if persistence <= 0.0 || persistence >= 1.0 {
            None
        } else {
            Some(0.5_f64.ln() / persistence.ln())
        }
    }

    fn from_params(p: &[f64; 4]) -> Self {
        Garch {
            mu: p[0],
            omega: p[1],
            alpha: p[2],
            beta: p[3],
        }
    }
}

impl VolatilityModel for Garch {
    fn mean(&self) -> f64 {
        self.mu
    }

    fn next_variance(&self, residual: f64, variance: f64) -> f64 {
        self.omega + self.alpha * residual * residual + self.beta * variance
    }

    fn expected_variance(&self, variance: f64) -> f64 {
        self.omega + (self.alpha + self.beta) * variance
    }

    fn is_admissible(&self) -> bool {
        [self.mu, self.omega, self.alpha, self.beta]
            .iter()
            .all(|p| p.is_finite())
            && self.omega > 0.0
            && self.alpha >= 0.0
            && self.beta >= 0.0
            && self.alpha + self.beta < 1.0
    }

    fn fit_with(
        returns: &ReturnSeries,
        options: &SimplexOptions,
    ) -> Result<FittedModel<Self>, AnalysisError> {
        let variance = check_fit_input(returns)?;
        let mu = returns.mean();

        let starts: Vec<[f64; 4]> = [(0.05, 0.90), (0.10, 0.80), (0.15, 0.70), (0.03, 0.95)]
            .iter()
            .map(|&(alpha, beta)| [mu, variance * (1.0 - alpha - beta), alpha, beta])
            .collect();

        fit_model(returns, &starts, Garch::from_params, options)
    }
}

/// EGARCH(1,1):
/// `ln s2[t] = omega + alpha * (|z[t-1]| - sqrt(2/pi)) + gamma * z[t-1] + beta * ln s2[t-1]`
/// where `z = e / s`. A negative `gamma` makes down moves raise volatility more.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Egarch {
    pub mu: f64,
    pub omega: f64,
    pub alpha: f64,
    pub gamma: f64,
    pub beta: f64,
}

impl Egarch {
    pub fn persistence(&self) -> f64 {
        self.beta
    }

    fn from_params(p: &[f64; 5]) -> Self {
        Egarch {
            mu: p[0],
            omega: p[1],
            alpha: p[2],
            gamma: p[3],
            beta: p[4],
        }
    }

    fn exp_capped(log_variance: f64) -> f64 {
        if log_variance > MAX_LOG_VARIANCE {
            f64::INFINITY
        } else {
            log_variance.exp()
        }
    }
}

impl VolatilityModel for Egarch {
    fn mean(&self) -> f64 {
        self.mu
    }

    fn next_variance(&self, residual: f64, variance: f64) -> f64 {
        let z = residual / variance.sqrt();
        let log_variance = self.omega
            + self.alpha * (z.abs() - FRAC_2_PI.sqrt())
            + self.gamma * z
            + self.beta * variance.ln();
        Self::exp_capped(log_variance)
    }

    // E|z| = sqrt(2/pi) and E[z] = 0 cancel the shock terms; the log-variance
    // is propagated, which understates the variance slightly (Jensen)
    fn expected_variance(&self, variance: f64) -> f64 {
        Self::exp_capped(self.omega + self.beta * variance.ln())
    }

    fn is_admissible(&self) -> bool {
        [self.mu, self.omega, self.alpha, self.gamma, self.beta]
            .iter()
            .all(|p| p.is_finite())
            && self.alpha >= 0.0
            && self.beta.abs() < 1.0
    }

    fn fit_with(
        returns: &ReturnSeries,
        options: &SimplexOptions,
    ) -> Result<FittedModel<Self>, AnalysisError> {
        let variance = check_fit_input(returns)?;
        let mu = returns.mean();
        let log_variance = variance.ln();

        let starts: Vec<[f64; 5]> = [
            (0.10, -0.05, 0.90),
            (0.10, -0.10, 0.95),
            (0.20, 0.05, 0.70),
            (0.05, 0.0, 0.50),
        ]
            .iter()
            .map(|&(alpha, gamma, beta)| [mu, log_variance * (1.0 - beta), alpha, gamma, beta])
            .collect();

        fit_model(returns, &starts, Egarch::from_params, options)
    }
}

/// Maximum likelihood estimate together with its fit statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedModel<M> {
    pub params: M,
    pub log_likelihood: f64,
    pub observations: usize,
    pub parameter_count: usize,
    pub iterations: usize,
}

impl<M: VolatilityModel> FittedModel<M> {
    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.parameter_count as f64
    }

    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood
            + self.parameter_count as f64 * (self.observations as f64).ln()
    }

    /// In-sample conditional variances, one per return.
    pub fn conditional_variances(&self, returns: &ReturnSeries) -> Vec<f64> {
        conditional_variances(&self.params, returns.values(), returns.variance())
    }

    /// Forecast variances for the next `horizon` days (at least one).
    pub fn forecast_variances(&self, returns: &ReturnSeries, horizon: usize) -> Vec<f64> {
        let values = returns.values();
        let variances = self.conditional_variances(returns);

        let mut forecasts = Vec::with_capacity(horizon.max(1));
        let (Some(&last_return), Some(&last_variance)) = (values.last(), variances.last()) else {
            return forecasts;
        };

        let mut variance = self
            .params
            .next_variance(last_return - self.params.mean(), last_variance);
        forecasts.push(variance);
        for _ in 1..horizon {
            variance = self.params.expected_variance(variance);
            forecasts.push(variance);
        }
        forecasts
    }
}

fn check_fit_input(returns: &ReturnSeries) -> Result<f64, AnalysisError> {
    if returns.len() < MIN_OBSERVATIONS {
        return Err(AnalysisError::insufficient(
            "volatility model",
            MIN_OBSERVATIONS,
            returns.len(),
        ));
    }

    let variance = returns.variance();
    if !variance.is_finite() || variance < MIN_VARIANCE {
        return Err(AnalysisError::ModelFit(
            "return series has zero variance".to_string(),
        ));
    }
    Ok(variance)
}

fn conditional_variances<M: VolatilityModel>(model: &M, returns: &[f64], backcast: f64) -> Vec<f64> {
    let mut variances = Vec::with_capacity(returns.len());
    let mut variance = backcast;
    for t in 0..returns.len() {
        if t > 0 {
            variance = model.next_variance(returns[t - 1] - model.mean(), variance);
        }
        variances.push(variance);
    }
    variances
}

fn negative_log_likelihood<M: VolatilityModel>(model: &M, returns: &[f64], backcast: f64) -> f64 {
    if !model.is_admissible() {
        return f64::INFINITY;
    }

    let ln_2pi = (2.0 * PI).ln();
    let mut total = 0.0;
    let mut variance = backcast;
    for (t, r) in returns.iter().enumerate() {
        if t > 0 {
            variance = model.next_variance(returns[t - 1] - model.mean(), variance);
        }
        if !variance.is_finite() || variance <= 0.0 {
            return f64::INFINITY;
        }
        let residual = r - model.mean();
        total += ln_2pi + variance.ln() + residual * residual / variance;
    }
    0.5 * total
}

fn fit_model<M: VolatilityModel, const N: usize>(
    returns: &ReturnSeries,
    starts: &[[f64; N]],
    build: fn(&[f64; N]) -> M,
    options: &SimplexOptions,
) -> Result<FittedModel<M>, AnalysisError> {
    let values = returns.values();
    let backcast = returns.variance();
    let objective = |p: &[f64; N]| negative_log_likelihood(&build(p), values, backcast);

    // Score the candidate starting points and optimise from the best one
    let start = starts
        .iter()
        .copied()
        .min_by(|a, b| objective(a).total_cmp(&objective(b)))
        .ok_or_else(|| AnalysisError::ModelFit("no starting values".to_string()))?;
    if !objective(&start).is_finite() {
        return Err(AnalysisError::ModelFit(
            "likelihood is not finite at any starting point".to_string(),
        ));
    }

    // Each restart rebuilds the simplex around the best vertex so far, which
    // frees a simplex that collapsed or stalled along a ridge. The best vertex
    // is always kept, so restarts never lose ground.
    let mut optimum = minimize(start, objective, options);
    let mut iterations = optimum.iterations;
    for _ in 0..MAX_RESTARTS {
        optimum = minimize(optimum.position, objective, options);
        iterations += optimum.iterations;
        if optimum.converged {
            break;
        }
    }

    if !optimum.converged {
        return Err(AnalysisError::ModelFit(format!(
            "optimizer did not converge within {} iterations",
            iterations
        )));
    }

    let params = build(&optimum.position);
    if !params.is_admissible() || !optimum.value.is_finite() {
        return Err(AnalysisError::ModelFit(
            "estimated parameters are inadmissible".to_string(),
        ));
    }

    Ok(FittedModel {
        params,
        log_likelihood: -optimum.value,
        observations: values.len(),
        parameter_count: N,
        iterations,
    })
}

/// A fitted model of either kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolatilityModels {
    Garch(FittedModel<Garch>),
    Egarch(FittedModel<Egarch>),
}

impl VolatilityModels {
    pub fn fit(kind: ModelKind, returns: &ReturnSeries) -> Result<Self, AnalysisError> {
        match kind {
            ModelKind::Garch => Garch::fit(returns).map(VolatilityModels::Garch),
            ModelKind::Egarch => Egarch::fit(returns).map(VolatilityModels::Egarch),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            VolatilityModels::Garch(_) => ModelKind::Garch,
            VolatilityModels::Egarch(_) => ModelKind::Egarch,
        }
    }

    pub fn log_likelihood(&self) -> f64 {
        match self {
            VolatilityModels::Garch(fitted) => fitted.log_likelihood,
            VolatilityModels::Egarch(fitted) => fitted.log_likelihood,
        }
    }

    pub fn forecast_variances(&self, returns: &ReturnSeries, horizon: usize) -> Vec<f64> {
        match self {
            VolatilityModels::Garch(fitted) => fitted.forecast_variances(returns, horizon),
            VolatilityModels::Egarch(fitted) => fitted.forecast_variances(returns, horizon),
        }
    }
}

/// Fits `kind` to `returns` and forecasts `horizon` days ahead (at least one).
///
/// With [`HorizonMethod::Refit`] every further day is produced by appending a
/// zero return, refitting and forecasting a single step, so later days are
/// increasingly rough approximations. The returned model is the one fitted to
/// the original returns.
pub fn forecast_volatility(
    kind: ModelKind,
    method: HorizonMethod,
    returns: &ReturnSeries,
    horizon: usize,
) -> Result<(VolatilityModels, VolatilityForecast), AnalysisError> {
    let horizon = horizon.max(1);
    let model = VolatilityModels::fit(kind, returns)?;

    let variances = match method {
        HorizonMethod::Recursive => model.forecast_variances(returns, horizon),
        HorizonMethod::Refit => {
            let mut variances = model.forecast_variances(returns, 1);
            let mut extended = returns.with_appended(0.0);
            for _ in 1..horizon {
                let refitted = VolatilityModels::fit(kind, &extended)?;
                variances.extend(refitted.forecast_variances(&extended, 1));
                extended = extended.with_appended(0.0);
            }
            variances
        }
    };

    if variances.len() != horizon || variances.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::ModelFit(
            "forecast variance is not finite".to_string(),
        ));
    }

    Ok((model, VolatilityForecast::from_variances(&variances)))
}
