use std::fmt;

/// Effective name of a point-to-point channel.
///
/// A channel is identified by a name plus an optional numeric id. With an id
/// the effective name is `"<name>_<id>"`, otherwise the name is used verbatim.
/// Transports map this name onto their own address space.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelAddress(String);

impl ChannelAddress {
    /// Resolve a name and optional id into a channel address.
    pub fn resolve(name: &str, id: Option<u32>) -> Self {
        match id {
            Some(id) => Self(format!("{name}_{id}")),
            None => Self(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ChannelAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Shorthand for [`ChannelAddress::resolve`].
pub fn resolve(name: &str, id: Option<u32>) -> ChannelAddress {
    ChannelAddress::resolve(name, id)
}
