use std::fmt;

/// Possible errors returned by methods on a FIB. All of these errors are
/// recoverable: a failed `route_add` leaves the trie unaffected, and a failed
/// `commit` leaves the previously published table in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FibError {
    /// The exact (prefix, length) pair was already registered. The existing
    /// route is kept, the new next hop is discarded.
    DuplicateRoute,
    /// The requested prefix length cannot exist, i.e. it is larger than 32.
    PrefixLengthInvalid,
    /// The next hop value is reserved, e.g. it is the `NO_ENTRY` sentinel.
    NextHopInvalid,
    /// The prefix is not an IPv4 prefix. Only IPv4 is supported.
    AddressFamilyInvalid,
    /// A table allocation failed during a commit, or the commit would
    /// exceed the configured memory limit. Nothing was published, lookups
    /// keep using the previous table.
    OutOfMemory,
    /// The configuration holds a value outside of its valid range.
    ConfigInvalid,
    /// The compiler found a trie state it cannot represent. This cannot
    /// happen with a correctly built trie.
    InternalConsistency,
}

impl std::error::Error for FibError {}

impl fmt::Display for FibError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            FibError::DuplicateRoute => {
                write!(f, "Error: The route already exists.")
            }
            FibError::PrefixLengthInvalid => {
                write!(f, "Error: The specified Prefix length is invalid.")
            }
            FibError::NextHopInvalid => {
                write!(
                    f,
                    "Error: The specified next hop is reserved and cannot \
                    be used in a route."
                )
            }
            FibError::AddressFamilyInvalid => {
                write!(f, "Error: Only IPv4 prefixes can be stored.")
            }
            FibError::OutOfMemory => {
                write!(
                    f,
                    "Error: Out of memory while compiling the forwarding \
                    table. The previous table is still in use."
                )
            }
            FibError::ConfigInvalid => {
                write!(f, "Error: The configuration is invalid.")
            }
            FibError::InternalConsistency => {
                write!(
                    f,
                    "FATAL: The compiled table is inconsistent with the \
                    prefix trie."
                )
            }
        }
    }
}

impl From<std::collections::TryReserveError> for FibError {
    fn from(_: std::collections::TryReserveError) -> Self {
        FibError::OutOfMemory
    }
}
