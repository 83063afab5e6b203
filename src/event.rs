//! Semantic events decoded from status snapshots.

/// Transition of a decoded status field between two reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
  /// The field became set (press, entry).
  Rising,
  /// The field cleared (release, exit).
  Falling,
}

/// Where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
  Channel(u8),
  Slider,
  Trackpad,
  /// Device-wide inputs such as the IQS9150 switch and ALP channel.
  System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwipeDirection {
  XPositive,
  XNegative,
  YPositive,
  YNegative,
}

impl SwipeDirection {
  pub fn is_horizontal(&self) -> bool {
    matches!(self, SwipeDirection::XPositive | SwipeDirection::XNegative)
  }

  pub fn is_vertical(&self) -> bool {
    matches!(self, SwipeDirection::YPositive | SwipeDirection::YNegative)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TapCount {
  One = 1,
  Two = 2,
  Three = 3,
}

/// Trackpad gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gesture {
  Tap(TapCount),
  PressHold,
  Palm,
  Swipe(SwipeDirection),
  SwipeHold(SwipeDirection),
  ZoomIn,
  ZoomOut,
  Scroll(SwipeDirection),
}

impl Gesture {
  pub fn is_swipe(&self) -> bool {
    matches!(self, Gesture::Swipe(_) | Gesture::SwipeHold(_))
  }

  pub fn is_tap(&self) -> bool {
    matches!(self, Gesture::Tap(_))
  }
}

/// Slider gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SliderGesture {
  Press,
  Tap,
  SwipePositive,
  SwipeNegative,
  FlickPositive,
  FlickNegative,
  Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
  Halt,
  Proximity,
  Touch,
  Movement,
  Slider(SliderGesture),
  /// Trackpad gesture performed with `fingers` contacts.
  Gesture { fingers: u8, gesture: Gesture },
  Switch,
  Alp,
}

/// One decoded transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Event {
  pub source: Source,
  pub kind: EventKind,
  pub edge: Edge,
  /// Caller-supplied monotonic timestamp of the read that produced it.
  pub timestamp: u64,
}

/// Trackpad contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Contact {
  pub x: u16,
  pub y: u16,
  pub pressure: u16,
  pub area: u16,
}

/// Consumer of decoded output.
///
/// Only [`EventSink::event`] is mandatory; the other hooks serve the
/// products that produce that kind of data.
pub trait EventSink {
  fn event(&mut self, event: Event);

  /// Absolute position of a pointing source; `None` once released.
  fn position(&mut self, _source: Source, _position: Option<u16>) {}

  /// Buffered scan sample for one channel, published when sampling is
  /// triggered.
  fn sample(&mut self, _timestamp: u64, _channel: u8, _value: u32) {}

  /// Multi-touch slot update; `None` once the contact lifts.
  fn contact(&mut self, _slot: u8, _contact: Option<Contact>) {}

  /// End of one decoded frame.
  fn sync(&mut self) {}
}

/// Sink that drops everything, used when only the cached state matters.
pub(crate) struct Discard;

impl EventSink for Discard {
  fn event(&mut self, _event: Event) {}
}

/// Why a read produced no events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Recovery {
  /// The status block was inconsistent; the device was reset and
  /// reinitialized.
  Desync,
  /// The device reported a reset and was reinitialized.
  Reset,
  /// ATI had failed and was run again.
  AtiError,
  /// ATI is still in progress.
  AtiActive,
}

/// Result of servicing one RDY window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
  /// The status was decoded and events dispatched.
  Ready,
  /// Nothing was decoded; service the device again.
  Retry(Recovery),
}

/// Compare the `mask` bits of two snapshots. A field counts as set only when
/// every bit of its mask is set, which lets a busy flag gate a direction bit.
pub(crate) fn edge(old: u16, new: u16, mask: u16) -> Option<Edge> {
  if mask == 0 {
    return None;
  }

  match (old & mask == mask, new & mask == mask) {
    (false, true) => Some(Edge::Rising),
    (true, false) => Some(Edge::Falling),
    _ => None,
  }
}
