//! Instance text-format reader.
//!
//! ```text
//! <nCells> <nPeriods> <nTypes>
//! <typeTasks: nTypes values>
//! nPeriods*nTypes blocks of
//!     <m> <t>
//!     nCells rows of nCells costs (row = source, column = destination)
//! <tasksToDo: nCells values>
//! nPeriods*nTypes blocks of
//!     <m> <t>
//!     one row of nCells availability counts (column = source cell)
//! ```
//!
//! Lines are trimmed and blank lines are ignored, so the blank separators of
//! the usual files are optional. Availability entries of zero do not create
//! groups.

use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::cost::CostTensor;
use crate::error::{InstanceError, ParseError};
use crate::models::{CustomerGroup, ProblemInstance, Shape};

/// Parses an instance from its text format.
///
/// # Errors
///
/// Returns a [`ParseError`] carrying the 1-based line number of the first
/// malformed line, [`ParseError::UnexpectedEof`] for truncated input, or
/// [`ParseError::Instance`] when the numbers parse but do not form a valid
/// instance.
///
/// # Examples
///
/// ```
/// use u_dispatch::io::parse_instance;
///
/// let text = "\
/// 2 1 1
///
/// 2
///
/// 0 0
/// 0 5
/// 5 0
///
/// 0 4
///
/// 0 0
/// 3 0
/// ";
/// let instance = parse_instance(text).unwrap();
/// assert_eq!(instance.n_cells(), 2);
/// assert_eq!(instance.tasks_to_do(1), 4);
/// assert_eq!(instance.total_customers(), 3);
/// ```
pub fn parse_instance(text: &str) -> Result<ProblemInstance, ParseError> {
    let mut lines = Lines::new(text);

    let (line, header) = lines.row::<usize>("header", 3)?;
    let (n_cells, n_periods, n_types) = (header[0], header[1], header[2]);
    for (what, value) in [("cells", n_cells), ("periods", n_periods), ("types", n_types)] {
        if value == 0 {
            debug!(line, what, "zero cardinality in header");
            return Err(InstanceError::ZeroCardinality { what }.into());
        }
    }
    let blocks = n_periods
        .checked_mul(n_types)
        .ok_or(ParseError::SizeOverflow { line })?;
    n_cells
        .checked_mul(n_cells)
        .and_then(|cells| cells.checked_mul(blocks))
        .ok_or(ParseError::SizeOverflow { line })?;
    let shape = Shape::new(n_cells, n_periods, n_types);

    let (_, type_tasks) = lines.row::<u32>("type tasks", n_types)?;

    // Storage grows with the rows actually read, never with the header.
    let mut cost_blocks: HashMap<(usize, usize), Vec<f64>> = HashMap::new();
    for _ in 0..blocks {
        let (customer_type, period) = lines.block_header(shape, "cost block")?;
        let mut block = Vec::new();
        for _ in 0..n_cells {
            let (_, row) = lines.row::<f64>("cost row", n_cells)?;
            block.extend(row);
        }
        cost_blocks.insert((customer_type, period), block);
    }
    let costs = CostTensor::from_fn(shape, |source, dest, customer_type, period| {
        cost_blocks
            .get(&(customer_type, period))
            .map_or(0.0, |block| block[source * n_cells + dest])
    });

    let (_, tasks_to_do) = lines.row::<u32>("tasks to do", n_cells)?;

    let mut groups = Vec::new();
    for _ in 0..blocks {
        let (customer_type, period) = lines.block_header(shape, "availability block")?;
        let (_, row) = lines.row::<u32>("availability row", n_cells)?;
        groups.extend(
            row.into_iter()
                .enumerate()
                .filter(|&(_, count)| count > 0)
                .map(|(source, count)| CustomerGroup::new(source, customer_type, period, count)),
        );
    }

    let instance = ProblemInstance::new(type_tasks, tasks_to_do, costs, groups)?;
    debug!(
        n_cells,
        n_periods,
        n_types,
        customers = instance.total_customers(),
        tasks = instance.total_tasks(),
        "parsed instance"
    );
    Ok(instance)
}

/// Reads and parses an instance file.
///
/// # Errors
///
/// Returns [`ParseError::Io`] if the file cannot be read, otherwise as
/// [`parse_instance`].
pub fn read_instance(path: impl AsRef<Path>) -> Result<ProblemInstance, ParseError> {
    let text = std::fs::read_to_string(path)?;
    parse_instance(&text)
}

/// Non-blank lines with their 1-based numbers.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            inner: text.lines().enumerate(),
        }
    }

    fn next_tokens(&mut self, expected: &'static str) -> Result<(usize, Vec<&'a str>), ParseError> {
        for (index, raw) in self.inner.by_ref() {
            let line = raw.trim();
            if !line.is_empty() {
                return Ok((index + 1, line.split_whitespace().collect()));
            }
        }
        Err(ParseError::UnexpectedEof { expected })
    }

    /// Reads the next non-blank line as exactly `arity` values.
    fn row<T: FromStr>(
        &mut self,
        expected: &'static str,
        arity: usize,
    ) -> Result<(usize, Vec<T>), ParseError> {
        let (line, tokens) = self.next_tokens(expected)?;
        if tokens.len() != arity {
            return Err(ParseError::WrongArity {
                line,
                expected: arity,
                actual: tokens.len(),
            });
        }
        let values = tokens
            .into_iter()
            .map(|token| {
                token.parse::<T>().map_err(|_| ParseError::InvalidToken {
                    line,
                    token: token.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((line, values))
    }

    /// Reads an `<m> <t>` block header and checks it against the shape.
    fn block_header(
        &mut self,
        shape: Shape,
        expected: &'static str,
    ) -> Result<(usize, usize), ParseError> {
        let (line, header) = self.row::<usize>(expected, 2)?;
        let (customer_type, period) = (header[0], header[1]);
        if customer_type >= shape.n_types() || period >= shape.n_periods() {
            return Err(ParseError::BlockOutOfRange { line });
        }
        Ok((customer_type, period))
    }
}
