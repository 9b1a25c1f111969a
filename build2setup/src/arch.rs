use std::fmt::{self, Display};
use std::str::FromStr;

use eyre::{ensure, eyre, Context, Report, Result};

/// A CUDA compute capability, e.g. `9.0` or the architecture-specific `9.0a`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CudaCapability {
    pub major: u32,
    pub minor: u32,
    pub arch_specific: bool,
}

impl CudaCapability {
    fn sm(&self) -> String {
        let suffix = if self.arch_specific { "a" } else { "" };
        format!("{}{}{}", self.major, self.minor, suffix)
    }

    /// The two-token nvcc code generation flag pair for this capability.
    pub fn gencode_flags(&self) -> [String; 2] {
        let sm = self.sm();
        [
            "-gencode".to_string(),
            format!("arch=compute_{sm},code=sm_{sm}"),
        ]
    }
}

impl Display for CudaCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = if self.arch_specific { "a" } else { "" };
        write!(f, "{}.{}{}", self.major, self.minor, suffix)
    }
}

impl FromStr for CudaCapability {
    type Err = Report;

    fn from_str(capability: &str) -> Result<Self> {
        let trimmed = capability.trim();
        ensure!(!trimmed.is_empty(), "empty compute capability");

        let (digits, arch_specific) = match trimmed.strip_suffix('a') {
            Some(rest) => (rest, true),
            None => (trimmed, false),
        };

        let (major, minor) = digits.split_once('.').ok_or_else(|| {
            eyre!("compute capability must be of the form `major.minor`: {capability}")
        })?;
        let major = major
            .parse()
            .with_context(|| format!("cannot parse major version in `{capability}`"))?;
        let minor: u32 = minor
            .parse()
            .with_context(|| format!("cannot parse minor version in `{capability}`"))?;
        ensure!(
            minor < 10,
            "minor version must be a single digit: {capability}"
        );

        Ok(CudaCapability {
            major,
            minor,
            arch_specific,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::CudaCapability;

    #[test]
    fn hopper_capability_expands_to_gencode_pair() {
        let capability: CudaCapability = "9.0".parse().unwrap();
        assert_eq!(
            capability.gencode_flags(),
            ["-gencode", "arch=compute_90,code=sm_90"]
        );
    }

    #[test]
    fn arch_specific_suffix_is_kept() {
        let capability: CudaCapability = "9.0a".parse().unwrap();
        assert_eq!(capability.to_string(), "9.0a");
        assert_eq!(
            capability.gencode_flags(),
            ["-gencode", "arch=compute_90a,code=sm_90a"]
        );
    }

    #[test]
    fn older_capability_round_trips() {
        let capability: CudaCapability = "8.6".parse().unwrap();
        assert_eq!(capability.major, 8);
        assert_eq!(capability.minor, 6);
        assert_eq!(capability.to_string(), "8.6");
    }

    #[test]
    fn malformed_capabilities_are_rejected() {
        assert!("".parse::<CudaCapability>().is_err());
        assert!("9".parse::<CudaCapability>().is_err());
        assert!("x.0".parse::<CudaCapability>().is_err());
        assert!("9.x".parse::<CudaCapability>().is_err());
        assert!("9.10".parse::<CudaCapability>().is_err());
    }
}
