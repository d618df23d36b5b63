// Copyright (c) The mlca Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Boolean observations over named factors, stored column-wise.

use crate::{
    errors::InvalidDataTable,
    factor::Factor,
    formula::{Dnf, Equivalence},
};
use bitvec::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// A table of total Boolean assignments. Immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDataTable", into = "RawDataTable")]
pub struct DataTable {
    factors: Vec<Factor>,
    columns: Vec<BitVec>,
    row_count: usize,
    index: HashMap<Factor, usize>,
}

impl DataTable {
    pub fn from_rows(
        factors: Vec<Factor>,
        rows: impl IntoIterator<Item = Vec<bool>>,
    ) -> Result<Self, InvalidDataTable> {
        let mut index = HashMap::with_capacity(factors.len());
        for (ix, factor) in factors.iter().enumerate() {
            if index.insert(factor.clone(), ix).is_some() {
                return Err(InvalidDataTable::DuplicateFactor {
                    factor: factor.clone(),
                });
            }
        }

        let mut columns = vec![BitVec::new(); factors.len()];
        let mut row_count = 0;
        for (row_ix, row) in rows.into_iter().enumerate() {
            if row.len() != factors.len() {
                return Err(InvalidDataTable::RaggedRow {
                    row: row_ix,
                    expected: factors.len(),
                    actual: row.len(),
                });
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.push(value);
            }
            row_count += 1;
        }

        Ok(Self {
            factors,
            columns,
            row_count,
            index,
        })
    }

    /// Builds a table from factor names and rows written as strings of `0` and `1`.
    pub fn parse_rows(
        names: &[impl AsRef<str>],
        rows: &[impl AsRef<str>],
    ) -> Result<Self, InvalidDataTable> {
        let factors = names
            .iter()
            .map(Factor::new)
            .collect::<Result<Vec<_>, _>>()?;
        let rows = rows
            .iter()
            .enumerate()
            .map(|(row, line)| {
                line.as_ref()
                    .chars()
                    .filter(|ch| !ch.is_whitespace())
                    .map(|ch| match ch {
                        '0' => Ok(false),
                        '1' => Ok(true),
                        value => Err(InvalidDataTable::InvalidValue { row, value }),
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_rows(factors, rows)
    }

    #[inline]
    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    #[inline]
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    #[inline]
    pub fn contains(&self, factor: &Factor) -> bool {
        self.index.contains_key(factor)
    }

    #[inline]
    pub fn column(&self, factor: &Factor) -> Option<&BitSlice> {
        self.index.get(factor).map(|&ix| self.columns[ix].as_bitslice())
    }

    pub fn value(&self, row: usize, factor: &Factor) -> Option<bool> {
        self.column(factor).and_then(|c| c.get(row).map(|bit| *bit))
    }

    pub fn row(&self, ix: usize) -> Row<'_> {
        assert!(
            ix < self.row_count,
            "row {} must be in range 0..{}",
            ix,
            self.row_count
        );
        Row { table: self, ix }
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.row_count).map(move |ix| Row { table: self, ix })
    }

    /// Evaluates a formula on every row. Returns `None` if the formula mentions a factor that
    /// isn't in this table.
    pub fn evaluate(&self, formula: &Dnf) -> Option<BitVec> {
        let mut result: BitVec = BitVec::repeat(false, self.row_count);
        for disjunct in formula.disjuncts() {
            let mut term: BitVec = BitVec::repeat(true, self.row_count);
            for literal in disjunct.literals() {
                let column = self.column(literal.factor())?;
                if literal.is_negated() {
                    term &= (!column.to_bitvec()).as_bitslice();
                } else {
                    term &= column;
                }
            }
            result |= term.as_bitslice();
        }
        Some(result)
    }

    /// Scores `formula` as a description of `target`.
    pub fn metrics(&self, formula: &Dnf, target: &Factor) -> Option<Metrics> {
        let actual = self.column(target)?;
        if formula.is_empty() {
            return Some(Metrics::default());
        }
        let predicted = self.evaluate(formula)?;
        Some(Metrics::compute(&predicted, actual))
    }

    /// Returns true if the relation holds on every row. Relations over unknown factors never
    /// hold.
    pub fn holds(&self, relation: &Equivalence) -> bool {
        match (
            self.evaluate(relation.antecedent()),
            self.column(relation.consequent()),
        ) {
            (Some(predicted), Some(actual)) => predicted.as_bitslice() == actual,
            _ => false,
        }
    }

    /// Restricts the table to the given factors and removes duplicate rows.
    pub fn project(&self, factors: &[Factor]) -> Self {
        let factors: Vec<_> = factors
            .iter()
            .filter(|f| self.contains(f))
            .cloned()
            .collect();
        let mut seen = HashSet::new();
        let rows: Vec<Vec<bool>> = self
            .rows()
            .map(|row| {
                factors
                    .iter()
                    .map(|f| row.value(f).unwrap_or(false))
                    .collect::<Vec<_>>()
            })
            .filter(|values| seen.insert(values.clone()))
            .collect();

        let index = factors
            .iter()
            .enumerate()
            .map(|(ix, f)| (f.clone(), ix))
            .collect();
        let mut columns = vec![BitVec::with_capacity(rows.len()); factors.len()];
        for values in &rows {
            for (column, &value) in columns.iter_mut().zip(values) {
                column.push(value);
            }
        }
        Self {
            factors,
            columns,
            row_count: rows.len(),
            index,
        }
    }

    /// Groups of at least two of the given factors with identical columns. Members keep the order
    /// they were given in.
    pub fn coextensive_groups(&self, factors: &[Factor]) -> Vec<Vec<Factor>> {
        let mut groups: BTreeMap<usize, Vec<Factor>> = BTreeMap::new();
        let mut representatives: Vec<(&BitSlice, usize)> = Vec::new();
        for (ix, factor) in factors.iter().enumerate() {
            let column = match self.column(factor) {
                Some(column) => column,
                None => continue,
            };
            match representatives.iter().find(|(c, _)| *c == column) {
                Some(&(_, group)) => groups.entry(group).or_default().push(factor.clone()),
                None => {
                    representatives.push((column, ix));
                    groups.insert(ix, vec![factor.clone()]);
                }
            }
        }
        groups
            .into_values()
            .filter(|group| group.len() > 1)
            .collect()
    }

    /// Returns the candidates that may be effects.
    ///
    /// A factor is not an effect if it is constant over all rows, or if two rows differ only in
    /// that factor's value.
    pub fn find_effects(&self, candidates: &[Factor]) -> Vec<Factor> {
        candidates
            .iter()
            .filter(|factor| self.may_be_effect(factor))
            .cloned()
            .collect()
    }

    fn may_be_effect(&self, factor: &Factor) -> bool {
        let ix = match self.index.get(factor) {
            Some(&ix) => ix,
            None => return false,
        };
        let column = &self.columns[ix];
        let ones = column.count_ones();
        if ones == 0 || ones == self.row_count {
            return false;
        }

        // Rows keyed by every other column; a key seen with both values means two rows differ
        // only in `factor`.
        let mut seen: HashMap<Vec<bool>, bool> = HashMap::new();
        for row in 0..self.row_count {
            let key: Vec<bool> = self
                .columns
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != ix)
                .map(|(_, c)| c[row])
                .collect();
            let value = column[row];
            match seen.get(&key) {
                Some(&previous) if previous != value => return false,
                Some(_) => {}
                None => {
                    seen.insert(key, value);
                }
            }
        }
        true
    }
}

/// A view of one row of a [`DataTable`].
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    table: &'a DataTable,
    ix: usize,
}

impl<'a> Row<'a> {
    #[inline]
    pub fn index(&self) -> usize {
        self.ix
    }

    #[inline]
    pub fn value(&self, factor: &Factor) -> Option<bool> {
        self.table.value(self.ix, factor)
    }

    pub fn values(&self) -> impl Iterator<Item = (&'a Factor, bool)> + 'a {
        let ix = self.ix;
        self.table
            .factors
            .iter()
            .zip(&self.table.columns)
            .map(move |(f, c)| (f, c[ix]))
    }
}

/// How well a formula describes a target column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// Fraction of rows where formula and target agree.
    pub accuracy: f64,
    /// Fraction of rows with the target true where the formula is true; 1 without such rows.
    pub recall: f64,
    /// Fraction of rows with the target false where the formula is false; 1 without such rows.
    pub specificity: f64,
}

impl Metrics {
    pub fn compute(predicted: &BitSlice, actual: &BitSlice) -> Self {
        let rows = actual.len();
        if rows == 0 {
            return Self::default();
        }
        let positives = actual.count_ones();
        let negatives = rows - positives;
        let true_positives = predicted
            .iter()
            .by_vals()
            .zip(actual.iter().by_vals())
            .filter(|&(p, a)| p && a)
            .count();
        let true_negatives = predicted
            .iter()
            .by_vals()
            .zip(actual.iter().by_vals())
            .filter(|&(p, a)| !p && !a)
            .count();

        Self {
            accuracy: (true_positives + true_negatives) as f64 / rows as f64,
            recall: ratio_or_one(true_positives, positives),
            specificity: ratio_or_one(true_negatives, negatives),
        }
    }

    #[inline]
    pub fn is_perfect(&self) -> bool {
        self.accuracy >= 1.0
    }
}

fn ratio_or_one(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        1.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[derive(Serialize, Deserialize)]
struct RawDataTable {
    factors: Vec<Factor>,
    rows: Vec<String>,
}

impl TryFrom<RawDataTable> for DataTable {
    type Error = InvalidDataTable;

    fn try_from(raw: RawDataTable) -> Result<Self, Self::Error> {
        Self::parse_rows(&raw.factors, &raw.rows)
    }
}

impl From<DataTable> for RawDataTable {
    fn from(table: DataTable) -> Self {
        let rows = table
            .rows()
            .map(|row| {
                row.values()
                    .map(|(_, v)| if v { '1' } else { '0' })
                    .collect()
            })
            .collect();
        Self {
            factors: table.factors,
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conjunction_table() -> DataTable {
        DataTable::parse_rows(&["A", "B", "C"], &["111", "100", "010", "000"]).unwrap()
    }

    fn factor(name: &str) -> Factor {
        Factor::new(name).unwrap()
    }

    #[test]
    fn test_ragged_rows() {
        let result = DataTable::parse_rows(&["A", "B"], &["11", "1"]);
        assert_eq!(
            result,
            Err(InvalidDataTable::RaggedRow {
                row: 1,
                expected: 2,
                actual: 1
            })
        );
        assert!(matches!(
            DataTable::parse_rows(&["A", "A"], &["11"]),
            Err(InvalidDataTable::DuplicateFactor { .. })
        ));
    }

    #[test]
    fn test_evaluate_and_metrics() {
        let table = conjunction_table();
        let formula: Dnf = "A*B".parse().unwrap();
        let metrics = table.metrics(&formula, &factor("C")).unwrap();
        assert_eq!(metrics.accuracy, 1.0);
        assert!(table.holds(&"A*B <-> C".parse().unwrap()));
        assert!(!table.holds(&"A <-> C".parse().unwrap()));

        let partial = table
            .metrics(&"A".parse().unwrap(), &factor("C"))
            .unwrap();
        assert_eq!(partial.accuracy, 0.75);
        assert_eq!(partial.recall, 1.0);
        assert_eq!(partial.specificity, 2.0 / 3.0);

        let empty = table.metrics(&Dnf::default(), &factor("C")).unwrap();
        assert_eq!(empty.accuracy, 0.0);
    }

    #[test]
    fn test_find_effects() {
        let table = conjunction_table();
        let all = table.factors().to_vec();
        // Rows 100 and 000 differ only in A; rows 010 and 000 only in B.
        assert_eq!(table.find_effects(&all), vec![factor("C")]);

        let constant = DataTable::parse_rows(&["A", "B"], &["11", "01"]).unwrap();
        assert!(constant.find_effects(&[factor("B")]).is_empty());
    }

    #[test]
    fn test_coextensive_and_project() {
        let table =
            DataTable::parse_rows(&["A", "B", "C", "D"], &["1000", "0101", "1010", "1111"])
                .unwrap();
        assert_eq!(
            table.coextensive_groups(table.factors()),
            vec![vec![factor("B"), factor("D")]],
        );
        let projected = table.project(&[factor("A"), factor("C")]);
        assert_eq!(projected.row_count(), 3, "duplicate rows removed");
        assert_eq!(projected.factors(), &[factor("A"), factor("C")]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let table = conjunction_table();
        let json = serde_json::to_string(&table).unwrap();
        assert_eq!(
            json,
            r#"{"factors":["A","B","C"],"rows":["111","100","010","000"]}"#
        );
        let parsed: DataTable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, table);
    }
}
