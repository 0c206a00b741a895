// ── Identity types ──
//
// Opaque identifiers assigned by the bridge. Each resource kind gets its
// own newtype so a scene id can never be passed where a light id belongs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_owned()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

resource_id!(
    /// Stable identifier of a light; the only join key across refreshes.
    LightId
);

resource_id!(
    /// Identifier of the physical device owning a light. Connectivity is
    /// reported per owner, not per light.
    OwnerId
);

resource_id!(
    /// Identifier of a stored scene.
    SceneId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_lexically() {
        let mut ids = vec![LightId::from("c"), LightId::from("a"), LightId::from("b")];
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, ["a", "b", "c"]);
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = OwnerId::new("dev-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"dev-1\"");
        let parsed: OwnerId = "dev-1".parse().unwrap();
        assert_eq!(parsed, id);
    }
}
