//! Field access for raw log arguments.

use alloy_primitives::U256;

use crate::error::MarketError;
use crate::ledger::{AbiValue, RawLog};
use crate::types::{Address, Wad};

/// Typed accessor over a log's named arguments.
///
/// Missing or mistyped fields fail with `MarketError::MalformedEvent`.
pub(crate) struct LogArgs<'a> {
    event: &'static str,
    log: &'a RawLog,
}

impl<'a> LogArgs<'a> {
    /// Check the log carries the expected event name and wrap it.
    pub(crate) fn new(event: &'static str, log: &'a RawLog) -> Result<Self, MarketError> {
        if log.event != event {
            return Err(MarketError::malformed(
                event,
                format!("log is a {} event", log.event),
            ));
        }
        Ok(Self { event, log })
    }

    fn field(&self, name: &str) -> Result<&'a AbiValue, MarketError> {
        self.log
            .args
            .get(name)
            .ok_or_else(|| MarketError::malformed(self.event, format!("missing field '{}'", name)))
    }

    fn mismatch(&self, name: &str, expected: &str, actual: &AbiValue) -> MarketError {
        MarketError::malformed(
            self.event,
            format!("field '{}' expected {}, got {}", name, expected, actual.kind()),
        )
    }

    pub(crate) fn address(&self, name: &str) -> Result<Address, MarketError> {
        match self.field(name)? {
            AbiValue::Address(a) => Ok(*a),
            other => Err(self.mismatch(name, "address", other)),
        }
    }

    pub(crate) fn wad(&self, name: &str) -> Result<Wad, MarketError> {
        match self.field(name)? {
            AbiValue::Uint(v) => Ok(Wad::from_raw(*v)),
            other => Err(self.mismatch(name, "uint", other)),
        }
    }

    pub(crate) fn u64(&self, name: &str) -> Result<u64, MarketError> {
        match self.field(name)? {
            AbiValue::Uint(v) => self.narrow(name, *v),
            other => Err(self.mismatch(name, "uint", other)),
        }
    }

    /// Order ids are logged as bytes32; uint is accepted too.
    pub(crate) fn order_id(&self, name: &str) -> Result<u64, MarketError> {
        match self.field(name)? {
            AbiValue::Bytes32(b) => self.narrow(name, U256::from_be_bytes(b.0)),
            AbiValue::Uint(v) => self.narrow(name, *v),
            other => Err(self.mismatch(name, "bytes32", other)),
        }
    }

    fn narrow(&self, name: &str, value: U256) -> Result<u64, MarketError> {
        u64::try_from(value).map_err(|_| {
            MarketError::malformed(
                self.event,
                format!("field '{}' value {} exceeds u64", name, value),
            )
        })
    }
}
