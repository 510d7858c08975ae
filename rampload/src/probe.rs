//! Probe plumbing
//!
//! A probe is the unit of work a load run measures. The driver accepts any async closure whose
//! output implements [`ProbeOutput`]; the [`measure`] helper and the [`#[probe]`](crate::probe)
//! attribute build such closures out of ordinary fallible async code.
use rampload_core::InvocationOutcome;
use std::fmt::Display;
use std::future::Future;
use std::time::Instant;

/// Anything a probe body can report on success: it carries a status code and knows whether that
/// status counts as a success.
pub trait ProbeStatus {
    fn status_code(&self) -> u32;
    fn is_success(&self) -> bool;
}

impl ProbeStatus for u16 {
    fn status_code(&self) -> u32 {
        u32::from(*self)
    }

    fn is_success(&self) -> bool {
        (200..300).contains(self)
    }
}

impl ProbeStatus for u32 {
    fn status_code(&self) -> u32 {
        *self
    }

    fn is_success(&self) -> bool {
        (200..300).contains(self)
    }
}

impl ProbeStatus for () {
    fn status_code(&self) -> u32 {
        0
    }

    fn is_success(&self) -> bool {
        true
    }
}

#[cfg(feature = "http")]
impl ProbeStatus for reqwest::StatusCode {
    fn status_code(&self) -> u32 {
        u32::from(self.as_u16())
    }

    fn is_success(&self) -> bool {
        reqwest::StatusCode::is_success(self)
    }
}

#[cfg(feature = "http")]
impl ProbeStatus for reqwest::Response {
    fn status_code(&self) -> u32 {
        u32::from(self.status().as_u16())
    }

    fn is_success(&self) -> bool {
        self.status().is_success()
    }
}

/// What a probe invocation hands back to the driver.
///
/// Either a finished [`InvocationOutcome`], or a `Result` whose `Err` side means the probe could
/// not produce one. The driver turns such an error into a failed outcome and carries on.
pub trait ProbeOutput {
    fn into_outcome(self) -> Result<InvocationOutcome, String>;
}

impl ProbeOutput for InvocationOutcome {
    fn into_outcome(self) -> Result<InvocationOutcome, String> {
        Ok(self)
    }
}

impl<E: Display> ProbeOutput for Result<InvocationOutcome, E> {
    fn into_outcome(self) -> Result<InvocationOutcome, String> {
        self.map_err(|e| e.to_string())
    }
}

/// Time a fallible unit of work and turn its result into an [`InvocationOutcome`].
///
/// Used by the `#[probe]` macro. Errors are recorded as failures with status `0`.
pub async fn measure<F, R, E>(work: F) -> InvocationOutcome
where
    F: Future<Output = Result<R, E>>,
    R: ProbeStatus,
    E: Display,
{
    let start = Instant::now();
    let res = work.await;
    let elapsed = start.elapsed();

    match res {
        Ok(status) if status.is_success() => {
            InvocationOutcome::success(elapsed, status.status_code())
        }
        Ok(status) => InvocationOutcome::new(elapsed, false, status.status_code(), None),
        Err(err) => InvocationOutcome::failure(elapsed, 0, err.to_string()),
    }
}
