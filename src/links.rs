use crate::error::GevError;
use crate::types::Param;
use std::fmt::Debug;

// These traits help make sure the actual links are implemented correctly
pub trait Link: Debug + Send + Sync {
    fn name(&self) -> &'static str;
    /// eta = g(theta)
    fn link(&self, theta: f64) -> f64;
    /// theta = g^-1(eta)
    fn inv_link(&self, eta: f64) -> f64;
    /// d theta / d eta, evaluated at eta
    fn mu_eta(&self, eta: f64) -> f64;
    /// True when `theta` lies in the domain of g.
    fn valid_theta(&self, theta: f64) -> bool {
        theta.is_finite()
    }
    fn valid_eta(&self, eta: f64) -> bool {
        eta.is_finite()
    }
}

// Concrete Links

#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityLink;
impl Link for IdentityLink {
    fn name(&self) -> &'static str {
        "identity"
    }
    fn link(&self, theta: f64) -> f64 {
        theta
    }
    fn inv_link(&self, eta: f64) -> f64 {
        eta
    }
    fn mu_eta(&self, _eta: f64) -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogLink;
impl Link for LogLink {
    fn name(&self) -> &'static str {
        "log"
    }
    fn link(&self, theta: f64) -> f64 {
        theta.ln()
    }
    fn inv_link(&self, eta: f64) -> f64 {
        eta.min(30.0).exp()
    }
    fn mu_eta(&self, eta: f64) -> f64 {
        eta.min(30.0).exp()
    }
    fn valid_theta(&self, theta: f64) -> bool {
        theta > 0.0 && theta.is_finite()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InverseLink;
impl Link for InverseLink {
    fn name(&self) -> &'static str {
        "inverse"
    }
    fn link(&self, theta: f64) -> f64 {
        1.0 / theta
    }
    fn inv_link(&self, eta: f64) -> f64 {
        1.0 / eta
    }
    fn mu_eta(&self, eta: f64) -> f64 {
        -1.0 / (eta * eta)
    }
    fn valid_theta(&self, theta: f64) -> bool {
        theta.is_finite() && theta != 0.0
    }
    fn valid_eta(&self, eta: f64) -> bool {
        eta.is_finite() && eta != 0.0
    }
}

/// eta = log(theta + 0.5): keeps the shape parameter above -0.5 for any eta.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogShiftLink;
impl LogShiftLink {
    const SHIFT: f64 = 0.5;
}
impl Link for LogShiftLink {
    fn name(&self) -> &'static str {
        "logshift"
    }
    fn link(&self, theta: f64) -> f64 {
        (theta + Self::SHIFT).ln()
    }
    fn inv_link(&self, eta: f64) -> f64 {
        eta.min(30.0).exp() - Self::SHIFT
    }
    fn mu_eta(&self, eta: f64) -> f64 {
        eta.min(30.0).exp()
    }
    fn valid_theta(&self, theta: f64) -> bool {
        theta > -Self::SHIFT && theta.is_finite()
    }
}

/// Every link name this crate knows about.
pub const LINK_NAMES: [&str; 4] = ["identity", "log", "inverse", "logshift"];

/// Link names accepted for each parameter.
pub fn allowed_links(param: Param) -> &'static [&'static str] {
    match param {
        Param::Mu => &["identity", "log", "inverse"],
        Param::Sigma => &["log", "identity", "inverse"],
        Param::Xi => &["identity", "log", "logshift"],
    }
}

/// The link a family uses when none is named.
pub fn default_link_name(param: Param) -> &'static str {
    allowed_links(param)[0]
}

pub fn link_from_name(name: &str) -> Result<Box<dyn Link>, GevError> {
    match name {
        "identity" => Ok(Box::new(IdentityLink)),
        "log" => Ok(Box::new(LogLink)),
        "inverse" => Ok(Box::new(InverseLink)),
        "logshift" => Ok(Box::new(LogShiftLink)),
        _ => Err(GevError::UnknownLink {
            name: name.to_string(),
        }),
    }
}

/// Resolves `name` and checks that it may be attached to `param`.
pub fn link_for_param(param: Param, name: &str) -> Result<Box<dyn Link>, GevError> {
    let link = link_from_name(name)?;
    let allowed = allowed_links(param);
    if !allowed.contains(&name) {
        return Err(GevError::UnsupportedLink {
            param: param.name().to_string(),
            link: name.to_string(),
            allowed: allowed.join(", "),
        });
    }
    Ok(link)
}
