/// Failure reading a property that is present but unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PropertyError {
  /// The property holds a different kind of value than requested.
  Malformed,
  /// The array does not fit the caller's buffer.
  TooMany,
}

/// Hierarchical named-property lookup, scoped to one node of a device
/// description (the device itself, a channel, an event, a slider, ...).
///
/// Property and node names follow the vendor device-tree bindings, e.g.
/// `azoteq,thresh` or `channel-1`.
pub trait PropertySource {
  /// Node name, used in diagnostics.
  fn name(&self) -> &str;

  /// `true` if the property exists, whatever its value.
  fn has(&self, name: &str) -> bool;

  /// Read a scalar; `Ok(None)` when absent.
  fn read_u32(&self, name: &str) -> Result<Option<u32>, PropertyError>;

  /// Read an array into `buf`, returning the filled prefix; `Ok(None)` when
  /// absent.
  fn read_u32_array<'b>(&self, name: &str, buf: &'b mut [u32]) -> Result<Option<&'b [u32]>, PropertyError>;

  /// Child node by name.
  fn child(&self, name: &str) -> Option<&Self>;

  /// Child node by position, for iterating over every child.
  fn child_at(&self, index: usize) -> Option<&Self>;
}

/// Value of a [`Node`] property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'a> {
  /// Boolean property, present without a value.
  Flag,
  U32(u32),
  Array(&'a [u32]),
}

/// Borrowed, const-constructible property tree.
///
/// ```no_run
/// use azoteq_iqs::{Node, Value};
///
/// const CHANNEL: [Node; 1] = [Node::new("channel-0")
///   .with_props(&[("azoteq,rx-enable", Value::Array(&[0])), ("azoteq,ati-base", Value::U32(150))])
///   .with_children(&[Node::new("event-touch").with_props(&[("azoteq,thresh", Value::U32(20))])])];
/// const ROOT: Node = Node::new("iqs323").with_children(&CHANNEL);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
  pub name: &'a str,
  pub props: &'a [(&'a str, Value<'a>)],
  pub children: &'a [Node<'a>],
}

impl<'a> Node<'a> {
  pub const fn new(name: &'a str) -> Self {
    Self { name, props: &[], children: &[] }
  }

  pub const fn with_props(mut self, props: &'a [(&'a str, Value<'a>)]) -> Self {
    self.props = props;
    self
  }

  pub const fn with_children(mut self, children: &'a [Node<'a>]) -> Self {
    self.children = children;
    self
  }

  fn get(&self, name: &str) -> Option<Value<'a>> {
    self.props.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
  }
}

impl PropertySource for Node<'_> {
  fn name(&self) -> &str {
    self.name
  }

  fn has(&self, name: &str) -> bool {
    self.get(name).is_some()
  }

  fn read_u32(&self, name: &str) -> Result<Option<u32>, PropertyError> {
    match self.get(name) {
      None => Ok(None),
      Some(Value::U32(v)) => Ok(Some(v)),
      Some(Value::Array(a)) => a.first().copied().map(Some).ok_or(PropertyError::Malformed),
      Some(Value::Flag) => Err(PropertyError::Malformed),
    }
  }

  fn read_u32_array<'b>(&self, name: &str, buf: &'b mut [u32]) -> Result<Option<&'b [u32]>, PropertyError> {
    let val = self.get(name);
    let src: &[u32] = match &val {
      None => return Ok(None),
      Some(Value::U32(v)) => core::slice::from_ref(v),
      Some(Value::Array(a)) => a,
      Some(Value::Flag) => return Err(PropertyError::Malformed),
    };

    let dst = buf.get_mut(..src.len()).ok_or(PropertyError::TooMany)?;
    dst.copy_from_slice(src);
    Ok(Some(dst))
  }

  fn child(&self, name: &str) -> Option<&Self> {
    self.children.iter().find(|c| c.name == name)
  }

  fn child_at(&self, index: usize) -> Option<&Self> {
    self.children.get(index)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const ROOT: Node = Node::new("dev")
    .with_props(&[
      ("azoteq,flag", Value::Flag),
      ("azoteq,scalar", Value::U32(7)),
      ("azoteq,list", Value::Array(&[1, 2, 3])),
    ])
    .with_children(&[Node::new("channel-0"), Node::new("channel-2")]);

  #[test]
  fn scalars_and_flags() {
    assert!(ROOT.has("azoteq,flag"));
    assert_eq!(ROOT.read_u32("azoteq,scalar"), Ok(Some(7)));
    assert_eq!(ROOT.read_u32("azoteq,missing"), Ok(None));
    assert_eq!(ROOT.read_u32("azoteq,flag"), Err(PropertyError::Malformed));
  }

  #[test]
  fn arrays_must_fit() {
    let mut buf = [0u32; 4];
    assert_eq!(ROOT.read_u32_array("azoteq,list", &mut buf), Ok(Some(&[1, 2, 3][..])));

    let mut small = [0u32; 2];
    assert_eq!(ROOT.read_u32_array("azoteq,list", &mut small), Err(PropertyError::TooMany));
  }

  #[test]
  fn children_by_name_and_position() {
    assert!(ROOT.child("channel-2").is_some());
    assert!(ROOT.child("channel-1").is_none());
    assert_eq!(ROOT.child_at(1).map(|c| c.name), Some("channel-2"));
  }
}
