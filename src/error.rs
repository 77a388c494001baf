//! Error types.
//!
//! Malformed instance data is rejected when a [`ProblemInstance`] is built
//! ([`InstanceError`]). Once an instance exists the engine only fails on
//! programmer errors ([`DispatchError`]) or invalid parameters
//! ([`ConfigError`]). An infeasible solution is *not* an error; see
//! [`Feasibility`](crate::models::Feasibility).
//!
//! [`ProblemInstance`]: crate::models::ProblemInstance

use std::fmt;

use crate::models::GroupKey;

/// Rejection of malformed problem data at construction time.
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceError {
    /// A cardinality (cells, periods or types) is zero.
    ZeroCardinality {
        /// Which cardinality.
        what: &'static str,
    },
    /// A per-type or per-cell vector has the wrong length.
    LengthMismatch {
        /// Which vector.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },
    /// A customer type completes zero tasks per unit time.
    ZeroTypeTasks {
        /// Customer type index.
        customer_type: usize,
    },
    /// A cost entry is negative, NaN or infinite.
    InvalidCost {
        /// Source cell.
        source: usize,
        /// Destination cell.
        dest: usize,
        /// Customer type.
        customer_type: usize,
        /// Period.
        period: usize,
        /// Offending value.
        value: f64,
    },
    /// A customer group refers to a cell, type or period outside the instance.
    GroupOutOfRange {
        /// Offending key.
        key: GroupKey,
    },
    /// A customer group record carries no customers.
    EmptyGroup {
        /// Offending key.
        key: GroupKey,
    },
    /// Merging group records overflowed the customer counter.
    CountOverflow {
        /// Offending key.
        key: GroupKey,
    },
}

impl fmt::Display for InstanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstanceError::ZeroCardinality { what } => write!(f, "number of {what} must be positive"),
            InstanceError::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what}: expected {expected} entries, got {actual}"),
            InstanceError::ZeroTypeTasks { customer_type } => {
                write!(f, "customer type {customer_type} completes zero tasks")
            }
            InstanceError::InvalidCost {
                source,
                dest,
                customer_type,
                period,
                value,
            } => write!(
                f,
                "invalid cost {value} at ({source}, {dest}, {customer_type}, {period})"
            ),
            InstanceError::GroupOutOfRange { key } => write!(f, "customer group {key} is out of range"),
            InstanceError::EmptyGroup { key } => write!(f, "customer group {key} has no customers"),
            InstanceError::CountOverflow { key } => {
                write!(f, "customer count of group {key} overflows")
            }
        }
    }
}

impl std::error::Error for InstanceError {}

/// An attempted mutation of a [`Solution`](crate::models::Solution) that
/// violates its preconditions.
///
/// Heuristics in this crate never trigger these; they exist so that a bug
/// surfaces immediately instead of corrupting the bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// Dispatch or recall of zero customers.
    ZeroAmount {
        /// Group involved.
        key: GroupKey,
        /// Destination cell.
        dest: usize,
    },
    /// More customers requested than remain in the unassigned pool.
    InsufficientPool {
        /// Group involved.
        key: GroupKey,
        /// Requested amount.
        requested: u32,
        /// Customers left in the pool.
        available: u32,
    },
    /// A group was dispatched to its own home cell.
    SelfDispatch {
        /// Group involved.
        key: GroupKey,
    },
    /// Group or destination outside the instance.
    OutOfRange {
        /// Group involved.
        key: GroupKey,
        /// Destination cell.
        dest: usize,
    },
    /// More customers recalled from a destination than are assigned there.
    InsufficientAssigned {
        /// Group involved.
        key: GroupKey,
        /// Destination cell.
        dest: usize,
        /// Requested amount.
        requested: u32,
        /// Customers currently assigned.
        assigned: u32,
    },
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::ZeroAmount { key, dest } => {
                write!(f, "invalid dispatch: zero customers of {key} to cell {dest}")
            }
            DispatchError::InsufficientPool {
                key,
                requested,
                available,
            } => write!(
                f,
                "invalid dispatch: {requested} customers of {key} requested, {available} unassigned"
            ),
            DispatchError::SelfDispatch { key } => {
                write!(f, "invalid dispatch: {key} sent to its own cell")
            }
            DispatchError::OutOfRange { key, dest } => {
                write!(f, "invalid dispatch: {key} to cell {dest} is out of range")
            }
            DispatchError::InsufficientAssigned {
                key,
                dest,
                requested,
                assigned,
            } => write!(
                f,
                "invalid recall: {requested} customers of {key} from cell {dest}, {assigned} assigned"
            ),
        }
    }
}

impl std::error::Error for DispatchError {}

/// Invalid algorithm parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Population must hold at least two chromosomes (two distinct parents).
    PopulationTooSmall {
        /// Configured size.
        size: usize,
    },
    /// A probability lies outside `[0, 1]`.
    Probability {
        /// Parameter name.
        name: &'static str,
        /// Offending value.
        value: f64,
    },
    /// Random selection chance is a percentage in `0..=100`.
    SelectionChance {
        /// Offending value.
        value: u32,
    },
    /// Preliminary runs must not exceed the population size.
    TooManyPrelimRuns {
        /// Configured runs.
        runs: usize,
        /// Population size.
        population: usize,
    },
    /// Cooling factor must lie in `(0, 1)`.
    Alpha {
        /// Offending value.
        value: f64,
    },
    /// Plateau factor must be positive and finite.
    Gamma {
        /// Offending value.
        value: f64,
    },
    /// Multi-start search needs at least one start.
    NoStarts,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::PopulationTooSmall { size } => {
                write!(f, "population size {size} is below the minimum of 2")
            }
            ConfigError::Probability { name, value } => {
                write!(f, "{name} = {value} is not a probability")
            }
            ConfigError::SelectionChance { value } => {
                write!(f, "random selection chance {value}% exceeds 100%")
            }
            ConfigError::TooManyPrelimRuns { runs, population } => write!(
                f,
                "{runs} preliminary runs cannot each seed a population of {population}"
            ),
            ConfigError::Alpha { value } => write!(f, "cooling factor {value} must lie in (0, 1)"),
            ConfigError::Gamma { value } => write!(f, "plateau factor {value} must be positive"),
            ConfigError::NoStarts => write!(f, "multi-start search needs at least one start"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure to read an instance from its text format.
#[derive(Debug)]
pub enum ParseError {
    /// The input ended before the named section was complete.
    UnexpectedEof {
        /// Section being read.
        expected: &'static str,
    },
    /// A token could not be parsed.
    InvalidToken {
        /// 1-based line number.
        line: usize,
        /// Offending token.
        token: String,
    },
    /// A line holds the wrong number of tokens.
    WrongArity {
        /// 1-based line number.
        line: usize,
        /// Expected token count.
        expected: usize,
        /// Actual token count.
        actual: usize,
    },
    /// The header cardinalities describe more entries than fit in memory
    /// addressing.
    SizeOverflow {
        /// 1-based line number of the header.
        line: usize,
    },
    /// A block header names a type or period outside the instance.
    BlockOutOfRange {
        /// 1-based line number.
        line: usize,
    },
    /// The parsed data does not form a valid instance.
    Instance(InstanceError),
    /// Reading the file failed.
    Io(std::io::Error),
}

impl From<InstanceError> for ParseError {
    fn from(e: InstanceError) -> Self {
        ParseError::Instance(e)
    }
}

impl From<std::io::Error> for ParseError {
    fn from(e: std::io::Error) -> Self {
        ParseError::Io(e)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input while reading {expected}")
            }
            ParseError::InvalidToken { line, token } => {
                write!(f, "line {line}: cannot parse '{token}'")
            }
            ParseError::WrongArity {
                line,
                expected,
                actual,
            } => write!(f, "line {line}: expected {expected} values, found {actual}"),
            ParseError::SizeOverflow { line } => {
                write!(f, "line {line}: instance dimensions overflow")
            }
            ParseError::BlockOutOfRange { line } => {
                write!(f, "line {line}: block header out of range")
            }
            ParseError::Instance(e) => write!(f, "instance: {e}"),
            ParseError::Io(e) => write!(f, "io: {e}"),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Instance(e) => Some(e),
            ParseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// Failure of the [`solve`](crate::solver::solve) facade.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// A heuristic violated a dispatch precondition.
    Dispatch(DispatchError),
    /// The configuration was rejected.
    Config(ConfigError),
    /// Assignment data did not fit the instance.
    Instance(InstanceError),
}

impl From<DispatchError> for SolveError {
    fn from(e: DispatchError) -> Self {
        SolveError::Dispatch(e)
    }
}

impl From<ConfigError> for SolveError {
    fn from(e: ConfigError) -> Self {
        SolveError::Config(e)
    }
}

impl From<InstanceError> for SolveError {
    fn from(e: InstanceError) -> Self {
        SolveError::Instance(e)
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveError::Dispatch(e) => write!(f, "dispatch: {e}"),
            SolveError::Config(e) => write!(f, "config: {e}"),
            SolveError::Instance(e) => write!(f, "instance: {e}"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Dispatch(e) => Some(e),
            SolveError::Config(e) => Some(e),
            SolveError::Instance(e) => Some(e),
        }
    }
}
