//! Calling protocol selection.

use crate::ProviderKind;
use serde::{Deserialize, Serialize};

/// The calling protocol used for a whole turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Strategy {
    /// Concurrent-tool protocol: the model may request several calls in
    /// one response and they run in parallel.
    #[serde(rename = "parallel")]
    Concurrent,
    /// Serial-function protocol: at most one call per response.
    #[serde(rename = "serial")]
    Serial,
}

impl Strategy {
    /// Select the protocol for a turn.
    ///
    /// Priority order:
    /// 1. providers without native parallel tool calling are always serial
    /// 2. an image attachment forces serial, the image call is mandatory
    /// 3. otherwise the parallelize flag decides
    pub fn select(provider: ProviderKind, has_image: bool, parallelize: bool) -> Self {
        if !provider.supports_tools() || has_image || !parallelize {
            Self::Serial
        } else {
            Self::Concurrent
        }
    }

    /// Protocol name as reported in call records.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concurrent => "parallel",
            Self::Serial => "serial",
        }
    }
}
