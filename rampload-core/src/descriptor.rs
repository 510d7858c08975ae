use crate::Error;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Scheduling parameters for one load run.
///
/// Workers are started one after another, spread linearly across `ramp_up`; each of them then
/// issues `invocations_per_client` sequential probe invocations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunDescriptor {
    pub name: String,
    pub clients: usize,
    pub invocations_per_client: usize,
    pub ramp_up: Duration,
}

impl RunDescriptor {
    pub fn new(
        name: impl Into<String>,
        clients: usize,
        invocations_per_client: usize,
        ramp_up: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            clients,
            invocations_per_client,
            ramp_up,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.clients == 0 {
            return Err(Error::InvalidClients);
        }
        Ok(())
    }

    /// Delay inserted between two consecutive worker starts.
    pub fn stagger(&self) -> Duration {
        if self.clients > 1 && !self.ramp_up.is_zero() {
            // NOTE: `Duration` division takes a u32; clamp absurd client counts instead of wrapping.
            let clients = u32::try_from(self.clients).unwrap_or(u32::MAX);
            self.ramp_up / clients
        } else {
            Duration::ZERO
        }
    }

    /// Number of outcomes a run produces when every worker reports back.
    pub fn expected_outcomes(&self) -> usize {
        self.clients.saturating_mul(self.invocations_per_client)
    }
}

impl fmt::Display for RunDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} clients x {} invocations, ramp-up {})",
            self.name,
            self.clients,
            self.invocations_per_client,
            humantime::format_duration(self.ramp_up),
        )
    }
}

/// Load presets used by the suites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadProfile {
    Light,
    Medium,
    Heavy,
    Stress,
}

impl LoadProfile {
    pub const ALL: [LoadProfile; 4] = [
        LoadProfile::Light,
        LoadProfile::Medium,
        LoadProfile::Heavy,
        LoadProfile::Stress,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LoadProfile::Light => "light",
            LoadProfile::Medium => "medium",
            LoadProfile::Heavy => "heavy",
            LoadProfile::Stress => "stress",
        }
    }

    pub fn clients(&self) -> usize {
        match self {
            LoadProfile::Light => 5,
            LoadProfile::Medium => 10,
            LoadProfile::Heavy => 20,
            LoadProfile::Stress => 50,
        }
    }

    pub fn invocations_per_client(&self) -> usize {
        match self {
            LoadProfile::Light => 50,
            LoadProfile::Medium => 100,
            LoadProfile::Heavy => 200,
            LoadProfile::Stress => 500,
        }
    }

    pub fn ramp_up(&self) -> Duration {
        match self {
            LoadProfile::Light => Duration::from_secs(2),
            LoadProfile::Medium => Duration::from_secs(5),
            LoadProfile::Heavy => Duration::from_secs(10),
            LoadProfile::Stress => Duration::from_secs(15),
        }
    }

    pub fn descriptor(&self) -> RunDescriptor {
        RunDescriptor::new(
            self.name(),
            self.clients(),
            self.invocations_per_client(),
            self.ramp_up(),
        )
    }
}

impl fmt::Display for LoadProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LoadProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoadProfile::ALL
            .into_iter()
            .find(|profile| profile.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnknownProfile(s.to_string()))
    }
}

impl From<LoadProfile> for RunDescriptor {
    fn from(profile: LoadProfile) -> Self {
        profile.descriptor()
    }
}
