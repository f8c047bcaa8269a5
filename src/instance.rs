//! # Problem Instances
//!
//! An instance of the multiple courier routing problem and a parser for the
//! line-oriented instance format:
//!
//! ```text
//! m                     number of couriers
//! n                     number of items
//! l_1 ... l_m           courier capacities
//! s_1 ... s_n           item sizes
//! D_1,1 ... D_1,n+1     n+1 rows of the distance matrix,
//! ...                   row/column n+1 is the depot
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::{fs::File, io, path::Path};

use thiserror::Error;

/// Inconsistent instance data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InstanceError {
    /// There are no couriers or no items
    #[error("an instance needs at least one courier and one item")]
    Empty,
    /// A list or the matrix has the wrong dimension
    #[error("expected {expected} {what}, found {found}")]
    Dimension {
        /// What has the wrong dimension
        what: &'static str,
        /// The expected number of entries
        expected: usize,
        /// The found number of entries
        found: usize,
    },
    /// Sums over the instance do not fit into 64 bits
    #[error("the {what} does not fit into 64 bits")]
    TooLarge {
        /// The sum that overflows
        what: &'static str,
    },
}

/// Errors from reading an instance file
#[derive(Error, Debug)]
pub enum ParsingError {
    /// Reading the input failed
    #[error("failed to read instance: {0}")]
    Io(#[from] io::Error),
    /// The input ended early
    #[error("line {line}: input ended before the {what}")]
    MissingLine {
        /// The line number where input ended
        line: usize,
        /// What was expected
        what: &'static str,
    },
    /// A token is not a non-negative integer
    #[error("line {line}: expected an integer in the {what}, found '{found}'")]
    InvalidToken {
        /// The line number
        line: usize,
        /// What was being parsed
        what: &'static str,
        /// The offending token
        found: String,
    },
    /// A line has the wrong number of values
    #[error("line {line}: expected {expected} values for the {what}, found {found}")]
    TokenCount {
        /// The line number
        line: usize,
        /// What was being parsed
        what: &'static str,
        /// The expected number of values
        expected: usize,
        /// The found number of values
        found: usize,
    },
    /// There is content after the distance matrix
    #[error("line {line}: unexpected content after the distance matrix")]
    TrailingContent {
        /// The line number
        line: usize,
    },
    /// The data is inconsistent
    #[error(transparent)]
    Instance(#[from] InstanceError),
}

/// An instance of the multiple courier routing problem
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instance {
    capacities: Vec<u64>,
    sizes: Vec<u64>,
    /// Row-major `(n+1) x (n+1)` distance matrix
    distances: Vec<u64>,
}

impl Instance {
    /// Creates an instance from capacities, item sizes and the distance matrix
    /// rows. Row and column `n` of the matrix belong to the depot.
    ///
    /// # Errors
    ///
    /// If there are no couriers or items, the matrix is not `(n+1) x (n+1)`,
    /// or the total item size or the sum of the row maxima of the matrix
    /// overflows. Every load and every route distance is bounded by these
    /// sums.
    pub fn new(
        capacities: Vec<u64>,
        sizes: Vec<u64>,
        distances: Vec<Vec<u64>>,
    ) -> Result<Self, InstanceError> {
        if capacities.is_empty() || sizes.is_empty() {
            return Err(InstanceError::Empty);
        }
        let n_nodes = sizes.len() + 1;
        if distances.len() != n_nodes {
            return Err(InstanceError::Dimension {
                what: "distance matrix rows",
                expected: n_nodes,
                found: distances.len(),
            });
        }
        if let Some(row) = distances.iter().find(|row| row.len() != n_nodes) {
            return Err(InstanceError::Dimension {
                what: "distance matrix columns",
                expected: n_nodes,
                found: row.len(),
            });
        }
        if checked_sum(sizes.iter().copied()).is_none() {
            return Err(InstanceError::TooLarge {
                what: "total item size",
            });
        }
        if checked_sum(distances.iter().map(|row| row.iter().copied().max().unwrap_or(0))).is_none() {
            return Err(InstanceError::TooLarge {
                what: "sum of distance matrix row maxima",
            });
        }
        Ok(Self {
            capacities,
            sizes,
            distances: distances.into_iter().flatten().collect(),
        })
    }

    /// Parses an instance from a reader
    ///
    /// # Errors
    ///
    /// If reading fails or the input is malformed.
    pub fn from_reader(reader: impl io::BufRead) -> Result<Self, ParsingError> {
        parsing::parse_instance(reader)
    }

    /// Parses an instance from a file
    ///
    /// # Errors
    ///
    /// If the file cannot be opened or read, or is malformed.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ParsingError> {
        Self::from_reader(io::BufReader::new(File::open(path)?))
    }

    /// Gets the number of couriers `m`
    #[must_use]
    pub fn n_couriers(&self) -> usize {
        self.capacities.len()
    }

    /// Gets the number of items `n`
    #[must_use]
    pub fn n_items(&self) -> usize {
        self.sizes.len()
    }

    /// Gets the node index of the depot, which is `n`
    #[must_use]
    pub fn depot(&self) -> usize {
        self.sizes.len()
    }

    /// Gets the courier capacities
    #[must_use]
    pub fn capacities(&self) -> &[u64] {
        &self.capacities
    }

    /// Gets the item sizes
    #[must_use]
    pub fn sizes(&self) -> &[u64] {
        &self.sizes
    }

    /// Gets the distance from node `from` to node `to`
    #[must_use]
    pub fn distance(&self, from: usize, to: usize) -> u64 {
        let n_nodes = self.depot() + 1;
        debug_assert!(from < n_nodes && to < n_nodes);
        self.distances[from * n_nodes + to]
    }

    /// Gets the row of distances leaving node `from`
    #[must_use]
    pub fn distance_row(&self, from: usize) -> &[u64] {
        let n_nodes = self.depot() + 1;
        &self.distances[from * n_nodes..(from + 1) * n_nodes]
    }

    /// Gets the largest entry of the distance matrix
    #[must_use]
    pub fn max_distance(&self) -> u64 {
        self.distances.iter().copied().max().unwrap_or(0)
    }

    /// Checks whether the distance matrix is symmetric
    #[must_use]
    pub fn is_symmetric(&self) -> bool {
        let n_nodes = self.depot() + 1;
        (0..n_nodes).all(|from| (from + 1..n_nodes).all(|to| self.distance(from, to) == self.distance(to, from)))
    }

    /// Gets the sum of all item sizes
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.sizes.iter().sum()
    }
}

fn checked_sum(mut values: impl Iterator<Item = u64>) -> Option<u64> {
    values.try_fold(0u64, u64::checked_add)
}

mod parsing {
    use std::io;

    use nom::{
        character::complete::{space0, space1, u64 as dec_u64},
        combinator::all_consuming,
        multi::separated_list0,
        sequence::delimited,
        IResult,
    };

    use super::{Instance, InstanceError, ParsingError};

    macro_rules! next_data_line {
        ($reader:expr, $lineno:expr, $what:expr) => {{
            let mut buf = String::new();
            loop {
                buf.clear();
                if $reader.read_line(&mut buf)? == 0 {
                    return Err(ParsingError::MissingLine {
                        line: $lineno + 1,
                        what: $what,
                    });
                }
                $lineno += 1;
                if !buf.trim_start().starts_with('#') && !buf.trim().is_empty() {
                    break buf;
                }
            }
        }};
    }

    fn value_list(input: &str) -> IResult<&str, Vec<u64>> {
        all_consuming(delimited(space0, separated_list0(space1, dec_u64), space0))(input)
    }

    /// Parses one line of integers, checking the count if `expected` is given
    fn parse_line(
        line: &str,
        line_num: usize,
        what: &'static str,
        expected: Option<usize>,
    ) -> Result<Vec<u64>, ParsingError> {
        let line = line.trim_end();
        let values = match value_list(line) {
            Ok((_, values)) => values,
            Err(err) => {
                let rest = match &err {
                    nom::Err::Error(err) | nom::Err::Failure(err) => err.input,
                    nom::Err::Incomplete(_) => line,
                };
                return Err(ParsingError::InvalidToken {
                    line: line_num,
                    what,
                    found: rest.split_whitespace().next().unwrap_or(rest).to_string(),
                });
            }
        };
        if let Some(expected) = expected {
            if values.len() != expected {
                return Err(ParsingError::TokenCount {
                    line: line_num,
                    what,
                    expected,
                    found: values.len(),
                });
            }
        }
        Ok(values)
    }

    fn parse_count(line: &str, line_num: usize, what: &'static str) -> Result<usize, ParsingError> {
        let value = parse_line(line, line_num, what, Some(1))?[0];
        usize::try_from(value).map_err(|_| ParsingError::InvalidToken {
            line: line_num,
            what,
            found: value.to_string(),
        })
    }

    pub fn parse_instance(mut reader: impl io::BufRead) -> Result<Instance, ParsingError> {
        let mut line_num = 0;
        let line = next_data_line!(reader, line_num, "number of couriers");
        let n_couriers = parse_count(&line, line_num, "number of couriers")?;
        let line = next_data_line!(reader, line_num, "number of items");
        let n_items = parse_count(&line, line_num, "number of items")?;
        if n_couriers == 0 || n_items == 0 {
            return Err(InstanceError::Empty.into());
        }
        let line = next_data_line!(reader, line_num, "courier capacities");
        let capacities = parse_line(&line, line_num, "courier capacities", Some(n_couriers))?;
        let line = next_data_line!(reader, line_num, "item sizes");
        let sizes = parse_line(&line, line_num, "item sizes", Some(n_items))?;
        let mut distances = Vec::with_capacity(n_items + 1);
        for _ in 0..=n_items {
            let line = next_data_line!(reader, line_num, "distance matrix row");
            distances.push(parse_line(&line, line_num, "distance matrix row", Some(n_items + 1))?);
        }
        let mut buf = String::new();
        while reader.read_line(&mut buf)? > 0 {
            line_num += 1;
            if !buf.trim_start().starts_with('#') && !buf.trim().is_empty() {
                return Err(ParsingError::TrailingContent { line: line_num });
            }
            buf.clear();
        }
        Ok(Instance::new(capacities, sizes, distances)?)
    }
}
