use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn from_str(s: impl Into<String>) -> Self {
                Self(s.into())
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
    };
}

id_newtype!(JobId);

impl JobId {
    /// Sequence number the scheduler embeds as the first `-` token,
    /// e.g. `0000012-130101000000000-oozie-oozi-B` -> 12.
    pub fn sequence(&self) -> Result<u64, CoreError> {
        let head = self.0.split('-').next().unwrap_or_default();
        head.parse::<u64>().map_err(|_| CoreError::MalformedJobId { id: self.0.clone() })
    }
}
