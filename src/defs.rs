/// Firmware identification block at the start of each memory map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Version {
  pub product: u16,
  pub major: u16,
  pub minor: u16,
  pub patch: u32,
}

impl Version {
  /// Words in the on-wire block.
  pub(crate) const WORDS: usize = 5;

  pub(crate) fn from_words(w: [u16; Self::WORDS]) -> Self {
    Self { product: w[0], major: w[1], minor: w[2], patch: u32::from(w[3]) | u32::from(w[4]) << 16 }
  }

  /// `true` if the firmware is at least `major.minor`.
  pub fn at_least(&self, major: u16, minor: u16) -> bool {
    (self.major, self.minor) >= (major, minor)
  }
}

impl core::fmt::Display for Version {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}.{}.{}.{}", self.product, self.patch, self.major, self.minor)
  }
}

/// Placeholder for an absent reset line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPin;

impl embedded_hal::digital::ErrorType for NoPin {
  type Error = core::convert::Infallible;
}

impl embedded_hal::digital::OutputPin for NoPin {
  fn set_low(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }

  fn set_high(&mut self) -> Result<(), Self::Error> {
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn version_decodes_and_compares() {
    let v = Version::from_words([1106, 1, 25, 0x5678, 0x0001]);

    assert_eq!(v.patch, 0x0001_5678);
    assert!(v.at_least(1, 25));
    assert!(v.at_least(1, 2));
    assert!(!v.at_least(1, 26));
    assert!(!v.at_least(2, 0));
  }
}
