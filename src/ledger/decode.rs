//! Typed access to decoded call output tuples.

use alloy_primitives::U256;

use super::{AbiValue, LedgerError};
use crate::types::{Address, Wad};

/// Positional reader over a contract call's output tuple.
///
/// Every accessor checks both presence and type, so a short or reshaped
/// response surfaces as `LedgerError::Decode` instead of a panic.
pub struct ResponseReader<'a> {
    method: &'a str,
    values: &'a [AbiValue],
}

impl<'a> ResponseReader<'a> {
    pub fn new(method: &'a str, values: &'a [AbiValue]) -> Self {
        Self { method, values }
    }

    fn get(&self, index: usize) -> Result<&'a AbiValue, LedgerError> {
        self.values.get(index).ok_or_else(|| {
            LedgerError::Decode(format!(
                "{}: expected at least {} outputs, got {}",
                self.method,
                index + 1,
                self.values.len()
            ))
        })
    }

    fn mismatch(&self, index: usize, expected: &str, actual: &AbiValue) -> LedgerError {
        LedgerError::Decode(format!(
            "{}: output {} expected {}, got {}",
            self.method,
            index,
            expected,
            actual.kind()
        ))
    }

    pub fn address(&self, index: usize) -> Result<Address, LedgerError> {
        match self.get(index)? {
            AbiValue::Address(a) => Ok(*a),
            other => Err(self.mismatch(index, "address", other)),
        }
    }

    pub fn uint(&self, index: usize) -> Result<U256, LedgerError> {
        match self.get(index)? {
            AbiValue::Uint(v) => Ok(*v),
            other => Err(self.mismatch(index, "uint", other)),
        }
    }

    pub fn wad(&self, index: usize) -> Result<Wad, LedgerError> {
        self.uint(index).map(Wad::from_raw)
    }

    pub fn boolean(&self, index: usize) -> Result<bool, LedgerError> {
        match self.get(index)? {
            AbiValue::Bool(b) => Ok(*b),
            other => Err(self.mismatch(index, "bool", other)),
        }
    }

    /// A uint output that must fit in 64 bits (ids, timestamps).
    pub fn u64(&self, index: usize) -> Result<u64, LedgerError> {
        let value = self.uint(index)?;
        u64::try_from(value).map_err(|_| {
            LedgerError::Decode(format!(
                "{}: output {} value {} exceeds u64",
                self.method, index, value
            ))
        })
    }

    /// An order id, as bytes32 (how the contracts key offers) or uint.
    pub fn order_id(&self, index: usize) -> Result<u64, LedgerError> {
        let value = match self.get(index)? {
            AbiValue::Bytes32(b) => U256::from_be_bytes(b.0),
            AbiValue::Uint(v) => *v,
            other => return Err(self.mismatch(index, "bytes32", other)),
        };
        u64::try_from(value).map_err(|_| {
            LedgerError::Decode(format!(
                "{}: order id {} exceeds u64",
                self.method, value
            ))
        })
    }
}
