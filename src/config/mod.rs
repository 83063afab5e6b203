//! Descriptor-driven register configuration.
//!
//! Every product declares a static table of [`Property`] descriptors. Each
//! descriptor names one externally supplied value and the bit-field it
//! occupies within a row of a register group; [`apply`] walks the table for
//! one row and folds the values found on a [`PropertySource`] node into it.

mod source;

pub use source::*;

use crate::image::{set_word, word};

/// Invalid device description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
  /// A value lies outside the range its register field accepts.
  OutOfRange { name: &'static str, value: u32 },
  /// A property is malformed, has too many entries or conflicts with
  /// another one.
  Invalid { name: &'static str },
}

/// Where one named property lives inside a register row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Property<K> {
  pub(crate) name: &'static str,
  /// Selects the rows (channel, event, slider...) the property applies to.
  pub(crate) key: K,
  /// Word offset within the row.
  pub(crate) offset: u16,
  pub(crate) shift: u8,
  pub(crate) width: u8,
  pub(crate) pitch: u32,
  pub(crate) min: u32,
  /// Inclusive upper bound; zero derives it from the field width.
  pub(crate) max: u32,
  pub(crate) invert: bool,
  /// Read single-bit fields as a value instead of a presence flag.
  pub(crate) numeric: bool,
  /// Register values substituted verbatim for each accepted input.
  pub(crate) table: Option<&'static [u16]>,
  /// Highest per-node index for properties repeated over consecutive words.
  pub(crate) span: u8,
  pub(crate) label: &'static str,
}

impl<K: Copy> Property<K> {
  pub(crate) const fn new(name: &'static str, key: K, offset: u16, shift: u8, width: u8) -> Self {
    Self {
      name,
      key,
      offset,
      shift,
      width,
      pitch: 1,
      min: 0,
      max: 0,
      invert: false,
      numeric: false,
      table: None,
      span: 0,
      label: name,
    }
  }

  /// Single-bit boolean.
  pub(crate) const fn flag(name: &'static str, key: K, offset: u16, shift: u8) -> Self {
    Self::new(name, key, offset, shift, 1)
  }

  pub(crate) const fn pitch(mut self, pitch: u32) -> Self {
    self.pitch = pitch;
    self
  }

  pub(crate) const fn min(mut self, min: u32) -> Self {
    self.min = min;
    self
  }

  pub(crate) const fn max(mut self, max: u32) -> Self {
    self.max = max;
    self
  }

  pub(crate) const fn inverted(mut self) -> Self {
    self.invert = true;
    self
  }

  pub(crate) const fn numeric(mut self) -> Self {
    self.numeric = true;
    self
  }

  pub(crate) const fn table(mut self, table: &'static [u16]) -> Self {
    self.table = Some(table);
    self
  }

  pub(crate) const fn span(mut self, span: u8) -> Self {
    self.span = span;
    self
  }

  pub(crate) const fn label(mut self, label: &'static str) -> Self {
    self.label = label;
    self
  }

  const fn is_flag(&self) -> bool {
    self.width == 1 && self.table.is_none() && !self.numeric
  }

  const fn mask(&self) -> u16 {
    ((((1u32 << self.width) - 1) << self.shift) & 0xFFFF) as u16
  }

  /// Largest accepted input value.
  pub(crate) const fn limit(&self) -> u32 {
    if self.max > 0 {
      self.max
    } else {
      ((1u32 << self.width) - 1) * self.pitch
    }
  }
}

/// Apply every descriptor matching `key` to `row`.
pub(crate) fn apply<K, S>(props: &[Property<K>], row: &mut [u8], key: K, node: &S) -> Result<(), ConfigError>
where
  K: Copy + PartialEq,
  S: PropertySource + ?Sized,
{
  apply_indexed(props, row, key, node, 0)
}

/// Like [`apply`], shifting spanned properties by `index` words.
pub(crate) fn apply_indexed<K, S>(
  props: &[Property<K>],
  row: &mut [u8],
  key: K,
  node: &S,
  index: usize,
) -> Result<(), ConfigError>
where
  K: Copy + PartialEq,
  S: PropertySource + ?Sized,
{
  for prop in props.iter().filter(|p| p.key == key) {
    if index > prop.span as usize {
      error!("invalid {} index: {}", prop.label, index);
      return Err(ConfigError::Invalid { name: prop.name });
    }

    let col = prop.offset as usize + index;
    let mask = prop.mask();
    let old = word(row, col);

    if prop.is_flag() {
      let mut val = if prop.invert { old | mask } else { old & !mask };
      if node.has(prop.name) {
        val ^= mask;
      }
      set_word(row, col, val);
      continue;
    }

    let val = match node.read_u32(prop.name) {
      Ok(Some(val)) => val,
      Ok(None) => continue,
      Err(_) => {
        error!("failed to read {} {}", node.name(), prop.label);
        return Err(ConfigError::Invalid { name: prop.name });
      }
    };

    let bits = match prop.table {
      _ if val < prop.min || val > prop.limit() => None,
      Some(table) => table.get(val as usize).copied(),
      None => Some(((val / prop.pitch.max(1)) << prop.shift) as u16),
    };

    let Some(bits) = bits else {
      error!("invalid {} {}: {}", node.name(), prop.label, val);
      return Err(ConfigError::OutOfRange { name: prop.name, value: val });
    };

    set_word(row, col, (old & !mask) | bits);
  }

  Ok(())
}

/// Read an array property into `buf`, rejecting lists that do not fit.
pub(crate) fn read_array<'b, S>(node: &S, name: &'static str, buf: &'b mut [u32]) -> Result<Option<&'b [u32]>, ConfigError>
where
  S: PropertySource + ?Sized,
{
  node.read_u32_array(name, buf).map_err(|_| {
    error!("failed to read {} {}", node.name(), name);
    ConfigError::Invalid { name }
  })
}

/// Read a list of pin indices below `num_pins` and return them as a bitmap.
pub(crate) fn pin_mask<S>(node: &S, name: &'static str, max_count: usize, num_pins: u32) -> Result<Option<u64>, ConfigError>
where
  S: PropertySource + ?Sized,
{
  let mut buf = [0u32; 64];

  let Some(pins) = read_array(node, name, &mut buf[..max_count.min(64)])? else {
    return Ok(None);
  };

  let mut mask = 0u64;
  for &pin in pins.iter() {
    if pin >= num_pins || pin >= 64 {
      error!("invalid {} {}: {}", node.name(), name, pin);
      return Err(ConfigError::OutOfRange { name, value: pin });
    }
    mask |= 1 << pin;
  }

  Ok(Some(mask))
}

/// Read a scalar property that is not backed by a descriptor, checking it
/// against an inclusive upper bound.
pub(crate) fn read_max<S>(node: &S, name: &'static str, max: u32) -> Result<Option<u32>, ConfigError>
where
  S: PropertySource + ?Sized,
{
  match node.read_u32(name) {
    Ok(Some(val)) if val > max => {
      error!("invalid {} {}: {}", node.name(), name, val);
      Err(ConfigError::OutOfRange { name, value: val })
    }
    Ok(val) => Ok(val),
    Err(_) => Err(ConfigError::Invalid { name }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  enum Key {
    Chan,
    Event,
    Sensor,
  }

  const MODES: [u16; 4] = [0x10, 0x13, 0x1D, 0x3D];

  const PROPS: [Property<Key>; 7] = [
    Property::new("azoteq,thresh", Key::Event, 0, 0, 8).max(255),
    Property::flag("azoteq,dual-direction", Key::Chan, 0, 0),
    Property::flag("azoteq,ati-band-tighten", Key::Chan, 0, 1).inverted(),
    Property::new("azoteq,timeout-press-ms", Key::Chan, 1, 8, 8).pitch(512),
    Property::new("azoteq,timeout-comms-ms", Key::Chan, 2, 0, 8).min(2).max(230),
    Property::new("azoteq,sense-mode", Key::Chan, 3, 0, 6).table(&MODES),
    Property::new("azoteq,ati-comp-div", Key::Sensor, 1, 0, 5).span(2),
  ];

  fn row() -> [u8; 8] {
    [0; 8]
  }

  #[test]
  fn threshold_scenario() {
    let mut r = row();
    let ok = Node::new("event-touch").with_props(&[("azoteq,thresh", Value::U32(100))]);
    apply(&PROPS, &mut r, Key::Event, &ok).expect("apply");
    assert_eq!(word(&r, 0), 100);

    let bad = Node::new("event-touch").with_props(&[("azoteq,thresh", Value::U32(256))]);
    assert_eq!(
      apply(&PROPS, &mut r, Key::Event, &bad),
      Err(ConfigError::OutOfRange { name: "azoteq,thresh", value: 256 })
    );
    assert_eq!(word(&r, 0), 100);
  }

  #[test]
  fn absent_flags_reset_to_their_polarity() {
    let empty = Node::new("channel-0");

    for prior in [0x0000, 0xFFFF] {
      let mut r = row();
      set_word(&mut r, 0, prior);
      apply(&PROPS, &mut r, Key::Chan, &empty).expect("apply");
      assert_eq!(word(&r, 0) & 0b11, 0b10, "prior {prior:#06x}");
    }
  }

  #[test]
  fn present_flags_flip_their_polarity() {
    let node = Node::new("channel-0")
      .with_props(&[("azoteq,dual-direction", Value::Flag), ("azoteq,ati-band-tighten", Value::Flag)]);

    let mut r = row();
    set_word(&mut r, 0, 0xFFFF);
    apply(&PROPS, &mut r, Key::Chan, &node).expect("apply");
    assert_eq!(word(&r, 0) & 0b11, 0b01);
  }

  #[test]
  fn scalar_bounds_are_inclusive() {
    for prop in PROPS.iter().filter(|p| !p.is_flag() && p.table.is_none()) {
      let lo = [(prop.name, Value::U32(prop.min))];
      let hi = [(prop.name, Value::U32(prop.limit()))];
      let over = [(prop.name, Value::U32(prop.limit() + 1))];

      let mut r = row();
      apply(&PROPS, &mut r, prop.key, &Node::new("n").with_props(&lo)).expect("min");
      apply(&PROPS, &mut r, prop.key, &Node::new("n").with_props(&hi)).expect("max");
      assert!(matches!(
        apply(&PROPS, &mut r, prop.key, &Node::new("n").with_props(&over)),
        Err(ConfigError::OutOfRange { .. })
      ));

      if prop.min > 0 {
        let under = [(prop.name, Value::U32(prop.min - 1))];
        assert!(matches!(
          apply(&PROPS, &mut r, prop.key, &Node::new("n").with_props(&under)),
          Err(ConfigError::OutOfRange { .. })
        ));
      }
    }
  }

  #[test]
  fn pitch_scales_the_value() {
    let node = Node::new("channel-0").with_props(&[("azoteq,timeout-press-ms", Value::U32(5120))]);
    let mut r = row();
    apply(&PROPS, &mut r, Key::Chan, &node).expect("apply");
    assert_eq!(word(&r, 1), 10 << 8);
  }

  #[test]
  fn tables_substitute_verbatim() {
    let node = Node::new("channel-0").with_props(&[("azoteq,sense-mode", Value::U32(3))]);
    let mut r = row();
    set_word(&mut r, 3, 0xFF00);
    apply(&PROPS, &mut r, Key::Chan, &node).expect("apply");
    assert_eq!(word(&r, 3), 0xFF00 | 0x3D);

    let node = Node::new("channel-0").with_props(&[("azoteq,sense-mode", Value::U32(4))]);
    assert!(apply(&PROPS, &mut r, Key::Chan, &node).is_err());
  }

  #[test]
  fn absent_scalars_are_untouched() {
    let mut r = row();
    set_word(&mut r, 2, 0x00AA);
    apply(&PROPS, &mut r, Key::Chan, &Node::new("channel-0")).expect("apply");
    assert_eq!(word(&r, 2), 0x00AA);
  }

  #[test]
  fn spanned_properties_shift_by_index() {
    let node = Node::new("sensor").with_props(&[("azoteq,ati-comp-div", Value::U32(9))]);
    let mut r = row();
    apply_indexed(&PROPS, &mut r, Key::Sensor, &node, 2).expect("apply");
    assert_eq!(word(&r, 3), 9);

    assert_eq!(
      apply_indexed(&PROPS, &mut r, Key::Sensor, &node, 3),
      Err(ConfigError::Invalid { name: "azoteq,ati-comp-div" })
    );
  }

  #[test]
  fn numeric_bits_take_a_value() {
    let bits = [Property::new("azoteq,sleep-mode", Key::Chan, 0, 3, 1).numeric()];
    let mut r = row();
    set_word(&mut r, 0, 0x0008);

    apply(&bits, &mut r, Key::Chan, &Node::new("n")).expect("absent");
    assert_eq!(word(&r, 0), 0x0008);

    let zero = Node::new("n").with_props(&[("azoteq,sleep-mode", Value::U32(0))]);
    apply(&bits, &mut r, Key::Chan, &zero).expect("zero");
    assert_eq!(word(&r, 0), 0);

    let two = Node::new("n").with_props(&[("azoteq,sleep-mode", Value::U32(2))]);
    assert!(apply(&bits, &mut r, Key::Chan, &two).is_err());
  }

  #[test]
  fn pin_lists_become_bitmaps() {
    let node = Node::new("channel-0").with_props(&[("azoteq,tx-enable", Value::Array(&[0, 3]))]);
    assert_eq!(pin_mask(&node, "azoteq,tx-enable", 4, 4), Ok(Some(0b1001)));
    assert_eq!(pin_mask(&node, "azoteq,rx-enable", 4, 4), Ok(None));
    assert!(pin_mask(&node, "azoteq,tx-enable", 1, 4).is_err());
    assert!(pin_mask(&node, "azoteq,tx-enable", 4, 3).is_err());
  }
}
