//! ATI (automatic tuning) sequencing shared by every product.

use crate::rw::NUM_RETRIES;
use crate::Error;

/// Calibration budget for one attempt.
pub(crate) const ATI_TIMEOUT_US: u32 = 2_000_000;

/// Calibration progress as reported by the device's status word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum AtiStatus {
  Active,
  Error,
  /// The device restarted underneath the calibration.
  Reset,
  Done,
}

/// Result of a successful calibration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Calibration {
  /// ATI completed; `retries` counts the attempts that had to be repeated.
  Complete { retries: u8 },
  /// The device reset mid-calibration and must be initialized again.
  Reset,
}

/// What a wait for the next RDY window saw, with the time spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum Window {
  Open(u32),
  /// RDY stayed deasserted; the status cannot be read yet.
  Missed(u32),
}

impl Window {
  /// Fold an RDY poll of at most `timeout_us` into a window.
  pub(crate) fn from_poll<E>(res: Result<u32, Error<E>>, timeout_us: u32) -> Result<Self, Error<E>> {
    match res {
      Ok(us) => Ok(Window::Open(us)),
      Err(Error::Timeout) => Ok(Window::Missed(timeout_us)),
      Err(e) => Err(e),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum AtiState {
  Idle,
  Requesting,
  Polling,
  Success,
  BusyRetry,
  ErrorRetry,
  Failed,
}

/// Product hooks driven by [`calibrate`].
pub(crate) trait Calibrate<E> {
  /// Enter a streaming, full-power mode and request a new ATI.
  async fn request(&mut self) -> Result<(), Error<E>>;

  /// Wait for the next RDY window.
  async fn wait(&mut self) -> Result<Window, Error<E>>;

  /// Decode the calibration state, alongside the raw status word.
  async fn status(&mut self) -> Result<(AtiStatus, u16), Error<E>>;

  /// Return to the configured power and interface mode.
  async fn restore(&mut self) -> Result<(), Error<E>>;
}

/// Run ATI until it completes, retrying failed or stalled attempts.
///
/// A device that is still calibrating keeps being polled until the per-attempt
/// budget runs out, and so is one that leaves RDY deasserted for a whole poll
/// interval. Only an error status or an expired budget costs a retry.
pub(crate) async fn calibrate<E, C: Calibrate<E>>(dev: &mut C) -> Result<Calibration, Error<E>> {
  let mut state = AtiState::Idle;
  let mut attempts = 0u8;
  let mut elapsed = 0u32;
  let mut status = 0u16;
  let mut timed_out = false;

  loop {
    match state {
      AtiState::Idle => {
        state = AtiState::Requesting;
      }

      AtiState::Requesting => {
        dev.request().await?;
        elapsed = 0;
        state = AtiState::Polling;
      }

      AtiState::Polling => {
        let (waited, open) = match dev.wait().await? {
          Window::Open(us) => (us, true),
          Window::Missed(us) => (us, false),
        };
        elapsed = elapsed.saturating_add(waited.max(1));

        if !open {
          state = if elapsed < ATI_TIMEOUT_US { AtiState::Polling } else { AtiState::BusyRetry };
          continue;
        }

        let (progress, raw) = dev.status().await?;
        status = raw;

        state = match progress {
          AtiStatus::Active if elapsed < ATI_TIMEOUT_US => AtiState::Polling,
          AtiStatus::Active => AtiState::BusyRetry,
          AtiStatus::Error => AtiState::ErrorRetry,
          AtiStatus::Reset => return Ok(Calibration::Reset),
          AtiStatus::Done => AtiState::Success,
        };
      }

      AtiState::BusyRetry | AtiState::ErrorRetry => {
        timed_out = state == AtiState::BusyRetry;
        attempts += 1;

        if (attempts as usize) < NUM_RETRIES {
          warn!("ATI attempt {} of {} failed with status {=u16:#06x}, retrying", attempts, NUM_RETRIES, status);
          state = AtiState::Requesting;
        } else {
          warn!("ATI attempt {} of {} failed with status {=u16:#06x}, stopping", attempts, NUM_RETRIES, status);
          state = AtiState::Failed;
        }
      }

      AtiState::Success => {
        dev.restore().await?;
        return Ok(Calibration::Complete { retries: attempts });
      }

      AtiState::Failed => {
        return Err(if timed_out { Error::AtiTimeout } else { Error::AtiFailed(status) });
      }
    }
  }
}
