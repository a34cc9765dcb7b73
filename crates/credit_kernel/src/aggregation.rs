//! Obligor to output-column mapping.
//!
//! The engine sums per-obligor losses of a row into the column chosen by a
//! [`GroupLayout`]. Column order is part of the contract:
//!
//! | Key | Columns |
//! |---|---|
//! | `Obligor` | one per obligor, portfolio order |
//! | `Rating` | one per distinct rating, first-seen order |
//! | `Portfolio` | a single total column |
//! | `Custom` | one per distinct key, first-seen order |
//! | `Explicit` | caller labels, in the order given |

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use credit_core::types::{Obligor, ObligorId, Portfolio, RatingGroup};
use credit_core::ConfigurationError;

/// Caller-supplied grouping function.
pub type GroupFn = Arc<dyn Fn(&Obligor) -> String + Send + Sync>;

/// How obligor losses are grouped into output columns.
#[derive(Clone, Default)]
pub enum AggregationKey {
    /// One column per obligor (no aggregation).
    #[default]
    Obligor,
    /// One column per rating group.
    Rating,
    /// A single portfolio-total column.
    Portfolio,
    /// Group by a caller key function; groups appear in first-seen order.
    Custom(GroupFn),
    /// Caller-declared labels and one label position per obligor.
    Explicit {
        /// Group labels in output order.
        labels: Vec<String>,
        /// `assignment[j]` is the label position of obligor `j`.
        assignment: Vec<usize>,
    },
}

impl AggregationKey {
    /// Wraps a key function.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Obligor) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl fmt::Debug for AggregationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Obligor => write!(f, "Obligor"),
            Self::Rating => write!(f, "Rating"),
            Self::Portfolio => write!(f, "Portfolio"),
            Self::Custom(_) => write!(f, "Custom(<fn>)"),
            Self::Explicit { labels, assignment } => f
                .debug_struct("Explicit")
                .field("labels", labels)
                .field("assignment", assignment)
                .finish(),
        }
    }
}

/// Label of one output column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GroupLabel {
    /// Single obligor.
    Obligor(ObligorId),
    /// Rating bucket.
    Rating(RatingGroup),
    /// Whole portfolio.
    Portfolio,
    /// Custom or explicit group.
    Named(String),
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Obligor(id) => write!(f, "{}", id),
            Self::Rating(rating) => write!(f, "{}", rating),
            Self::Portfolio => write!(f, "portfolio"),
            Self::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Resolved column layout for one portfolio.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupLayout {
    labels: Vec<GroupLabel>,
    columns: Vec<usize>,
}

fn invalid(reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidAggregationKey(reason.into())
}

/// Assigns columns in first-seen order of `keys`, one key per obligor.
fn first_seen<K, I>(keys: I, label: impl Fn(K) -> GroupLabel) -> GroupLayout
where
    K: Clone + Eq + Hash,
    I: IntoIterator<Item = K>,
{
    let keys = keys.into_iter();
    let mut seen: HashMap<K, usize> = HashMap::new();
    let mut labels = Vec::new();
    let mut columns = Vec::with_capacity(keys.size_hint().0);
    for key in keys {
        let column = *seen.entry(key.clone()).or_insert_with(|| {
            labels.push(label(key));
            labels.len() - 1
        });
        columns.push(column);
    }
    GroupLayout { labels, columns }
}

impl GroupLayout {
    /// Resolves `key` against `portfolio`.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidAggregationKey` when a custom key returns
    /// an empty label, or an explicit key has empty or duplicate labels, the
    /// wrong number of assignments, or an assignment past the label list.
    pub fn build(key: &AggregationKey, portfolio: &Portfolio) -> Result<Self, ConfigurationError> {
        match key {
            AggregationKey::Obligor => Ok(Self {
                labels: portfolio.ids().map(GroupLabel::Obligor).collect(),
                columns: (0..portfolio.len()).collect(),
            }),
            AggregationKey::Rating => Ok(first_seen(
                portfolio.obligors().iter().map(|o| o.rating().clone()),
                GroupLabel::Rating,
            )),
            AggregationKey::Portfolio => Ok(Self {
                labels: vec![GroupLabel::Portfolio],
                columns: vec![0; portfolio.len()],
            }),
            AggregationKey::Custom(f) => {
                // One call per obligor; the layout is built from these names.
                let names: Vec<String> = portfolio.obligors().iter().map(|o| f(o)).collect();
                if let Some(j) = names.iter().position(String::is_empty) {
                    return Err(invalid(format!(
                        "custom key returned an empty label for obligor {}",
                        portfolio.obligors()[j].id()
                    )));
                }
                Ok(first_seen(names, GroupLabel::Named))
            }
            AggregationKey::Explicit { labels, assignment } => {
                Self::explicit(labels, assignment, portfolio.len())
            }
        }
    }

    fn explicit(labels: &[String], assignment: &[usize], n_obligors: usize) -> Result<Self, ConfigurationError> {
        if labels.is_empty() {
            return Err(invalid("explicit key declares no labels"));
        }
        let mut distinct = HashSet::with_capacity(labels.len());
        for label in labels {
            if label.is_empty() {
                return Err(invalid("explicit key contains an empty label"));
            }
            if !distinct.insert(label.as_str()) {
                return Err(invalid(format!("duplicate label '{}'", label)));
            }
        }
        if assignment.len() != n_obligors {
            return Err(invalid(format!(
                "assignment has {} entries for {} obligors",
                assignment.len(),
                n_obligors
            )));
        }
        if let Some(j) = assignment.iter().position(|&g| g >= labels.len()) {
            return Err(invalid(format!(
                "obligor position {} assigned to group {} but only {} labels exist",
                j,
                assignment[j],
                labels.len()
            )));
        }
        Ok(Self {
            labels: labels.iter().cloned().map(GroupLabel::Named).collect(),
            columns: assignment.to_vec(),
        })
    }

    /// Output column of the obligor at `position`.
    #[inline(always)]
    pub fn column_of(&self, position: usize) -> usize {
        self.columns[position]
    }

    /// Column per obligor position.
    #[inline]
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// Column labels in output order.
    #[inline]
    pub fn labels(&self) -> &[GroupLabel] {
        &self.labels
    }

    /// Number of output columns.
    #[inline]
    pub fn n_groups(&self) -> usize {
        self.labels.len()
    }

    pub(crate) fn into_labels(self) -> Vec<GroupLabel> {
        self.labels
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn portfolio() -> Portfolio {
        let rows = [(10, "BB"), (11, "A"), (12, "BB"), (13, "CCC")];
        Portfolio::new(
            rows.iter()
                .map(|&(id, r)| {
                    Obligor::new(ObligorId::new(id), 0.01, 1.0, 0.5, 0.3, RatingGroup::new(r)).unwrap()
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_obligor_layout() {
        let layout = GroupLayout::build(&AggregationKey::default(), &portfolio()).unwrap();
        assert_eq!(layout.n_groups(), 4);
        assert_eq!(layout.labels()[2], GroupLabel::Obligor(ObligorId::new(12)));
        assert_eq!(layout.columns(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_rating_layout_first_seen_order() {
        let layout = GroupLayout::build(&AggregationKey::Rating, &portfolio()).unwrap();
        let names: Vec<String> = layout.labels().iter().map(|l| l.to_string()).collect();
        assert_eq!(names, vec!["BB", "A", "CCC"]);
        assert_eq!(layout.columns(), &[0, 1, 0, 2]);
    }

    #[test]
    fn test_portfolio_layout() {
        let layout = GroupLayout::build(&AggregationKey::Portfolio, &portfolio()).unwrap();
        assert_eq!(layout.labels(), &[GroupLabel::Portfolio]);
        assert!(layout.columns().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_custom_layout() {
        let key = AggregationKey::custom(|o| {
            let parity = if o.id().get() % 2 == 0 { "even" } else { "odd" };
            parity.to_string()
        });
        let layout = GroupLayout::build(&key, &portfolio()).unwrap();
        assert_eq!(
            layout.labels(),
            &[GroupLabel::Named("even".into()), GroupLabel::Named("odd".into())]
        );
        assert_eq!(layout.columns(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_custom_empty_label_rejected() {
        let key = AggregationKey::custom(|_| String::new());
        assert!(matches!(
            GroupLayout::build(&key, &portfolio()),
            Err(ConfigurationError::InvalidAggregationKey(_))
        ));
    }

    #[test]
    fn test_custom_key_called_once_per_obligor() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        // Labels depend on call order, so a second pass would shift them.
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let key = AggregationKey::custom(move |_| {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            if n < 4 {
                format!("g{}", n % 2)
            } else {
                String::new()
            }
        });

        let layout = GroupLayout::build(&key, &portfolio()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(
            layout.labels(),
            &[GroupLabel::Named("g0".into()), GroupLabel::Named("g1".into())]
        );
        assert_eq!(layout.columns(), &[0, 1, 0, 1]);
    }

    #[test]
    fn test_explicit_layout() {
        let key = AggregationKey::Explicit {
            labels: vec!["core".into(), "watchlist".into()],
            assignment: vec![0, 0, 1, 1],
        };
        let layout = GroupLayout::build(&key, &portfolio()).unwrap();
        assert_eq!(layout.n_groups(), 2);
        assert_eq!(layout.column_of(3), 1);
    }

    #[test]
    fn test_explicit_malformed_rejected() {
        let cases = [
            (vec!["a".to_string()], vec![0, 0, 0]),
            (vec!["a".to_string()], vec![0, 0, 0, 1]),
            (vec!["a".to_string(), "a".to_string()], vec![0, 0, 0, 1]),
            (vec![String::new()], vec![0, 0, 0, 0]),
            (vec![], vec![]),
        ];
        for (labels, assignment) in cases {
            let key = AggregationKey::Explicit { labels, assignment };
            assert!(GroupLayout::build(&key, &portfolio()).is_err(), "{:?}", key);
        }
    }

    #[test]
    fn test_label_display() {
        assert_eq!(GroupLabel::Obligor(ObligorId::new(7)).to_string(), "7");
        assert_eq!(GroupLabel::Portfolio.to_string(), "portfolio");
    }
}
