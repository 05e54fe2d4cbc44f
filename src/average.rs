//! Streaming average over the age column.

use std::fmt;

use crate::error::Result;

/// Outcome of [`average_of`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AverageAge {
    NoData,
    Mean { average: f64, count: u64 },
}

impl fmt::Display for AverageAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AverageAge::NoData => f.write_str("No user data found."),
            AverageAge::Mean { average, .. } => write!(f, "Average age of users: {average:.2}"),
        }
    }
}

/// Folds a sequence of ages into their mean with a running sum and count.
///
/// The first error ends the fold and is returned as-is.
pub fn average_of<I>(ages: I) -> Result<AverageAge>
where
    I: IntoIterator<Item = Result<i64>>,
{
    let mut sum: i128 = 0;
    let mut count: u64 = 0;
    for age in ages {
        sum += i128::from(age?);
        count += 1;
    }
    if count == 0 {
        Ok(AverageAge::NoData)
    } else {
        Ok(AverageAge::Mean {
            average: sum as f64 / count as f64,
            count,
        })
    }
}
