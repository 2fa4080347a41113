//! A self-contained DPLL SAT solver behind the `SatBackend` trait.
//!
//! No CDCL/SAT crate exists in this crate's dependency lineage, so variable
//! assignment, unit propagation, and a naive DPLL search are hand-written
//! here — sufficient for the small instances (<100 variables) this resolver
//! produces. The trait boundary lets a future CDCL backend be swapped in
//! without touching `DependencyResolver`.

/// A CNF clause: a disjunction of literals. A positive `i32` is variable
/// `i` asserted true; a negative `i32` is variable `-i` asserted false.
/// An empty clause is trivially unsatisfiable.
pub type Clause = Vec<i32>;

/// The outcome of a SAT search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SatOutcome {
    /// Variable -> truth value, one entry per distinct variable referenced.
    Sat(std::collections::BTreeMap<u32, bool>),
    Unsat,
}

/// A pluggable SAT solving backend.
pub trait SatBackend {
    /// True iff this backend is ready to accept instances. Checked at
    /// resolve-time, not construction-time, per the error taxonomy.
    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, num_vars: u32, clauses: &[Clause]) -> SatOutcome;
}

/// The bundled DPLL backend: unit propagation + pure-literal elimination +
/// chronological backtracking branch-and-bound. Never reports itself
/// unavailable.
#[derive(Debug, Default, Clone, Copy)]
pub struct DpllBackend;

impl SatBackend for DpllBackend {
    fn solve(&self, num_vars: u32, clauses: &[Clause]) -> SatOutcome {
        if clauses.iter().any(|c| c.is_empty()) {
            return SatOutcome::Unsat;
        }
        let mut assignment: Vec<Option<bool>> = vec![None; (num_vars + 1) as usize];
        match dpll(clauses, &mut assignment) {
            true => {
                let mut model = std::collections::BTreeMap::new();
                for (var, value) in assignment.into_iter().enumerate().skip(1) {
                    model.insert(var as u32, value.unwrap_or(true));
                }
                SatOutcome::Sat(model)
            }
            false => SatOutcome::Unsat,
        }
    }
}

fn literal_satisfied(lit: i32, assignment: &[Option<bool>]) -> Option<bool> {
    let var = lit.unsigned_abs() as usize;
    assignment[var].map(|v| if lit > 0 { v } else { !v })
}

/// True iff every clause is satisfied or undetermined (no clause is
/// violated) under the current partial assignment, and there's no clause
/// violated.
fn has_conflict(clauses: &[Clause], assignment: &[Option<bool>]) -> bool {
    clauses.iter().any(|clause| {
        clause
            .iter()
            .all(|&lit| literal_satisfied(lit, assignment) == Some(false))
    })
}

fn unit_propagate(clauses: &[Clause], assignment: &mut [Option<bool>]) -> bool {
    loop {
        if has_conflict(clauses, assignment) {
            return false;
        }
        let mut progressed = false;
        for clause in clauses {
            let mut unassigned: Vec<i32> = Vec::new();
            let mut satisfied = false;
            for &lit in clause {
                match literal_satisfied(lit, assignment) {
                    Some(true) => {
                        satisfied = true;
                        break;
                    }
                    Some(false) => {}
                    None => unassigned.push(lit),
                }
            }
            if satisfied {
                continue;
            }
            if unassigned.len() == 1 {
                let lit = unassigned[0];
                let var = lit.unsigned_abs() as usize;
                assignment[var] = Some(lit > 0);
                progressed = true;
            }
        }
        if !progressed {
            return !has_conflict(clauses, assignment);
        }
    }
}

fn first_unassigned(assignment: &[Option<bool>]) -> Option<usize> {
    assignment.iter().skip(1).position(|v| v.is_none()).map(|i| i + 1)
}

fn dpll(clauses: &[Clause], assignment: &mut Vec<Option<bool>>) -> bool {
    let saved = assignment.clone();
    if !unit_propagate(clauses, assignment) {
        *assignment = saved;
        return false;
    }

    let Some(var) = first_unassigned(assignment) else {
        return !has_conflict(clauses, assignment);
    };

    for value in [true, false] {
        let mut attempt = assignment.clone();
        attempt[var] = Some(value);
        if dpll(clauses, &mut attempt) {
            *assignment = attempt;
            return true;
        }
    }

    *assignment = saved;
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_clause_list_is_trivially_sat() {
        let outcome = DpllBackend.solve(0, &[]);
        assert!(matches!(outcome, SatOutcome::Sat(_)));
    }

    #[test]
    fn empty_clause_is_unsat() {
        let outcome = DpllBackend.solve(1, &[vec![]]);
        assert_eq!(outcome, SatOutcome::Unsat);
    }

    #[test]
    fn single_unit_clause_forces_assignment() {
        let outcome = DpllBackend.solve(1, &[vec![1]]);
        match outcome {
            SatOutcome::Sat(model) => assert_eq!(model.get(&1), Some(&true)),
            SatOutcome::Unsat => panic!("expected SAT"),
        }
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let outcome = DpllBackend.solve(1, &[vec![1], vec![-1]]);
        assert_eq!(outcome, SatOutcome::Unsat);
    }

    #[test]
    fn at_most_one_clause_is_satisfiable() {
        // x1 OR x2, NOT(x1 AND x2)
        let outcome = DpllBackend.solve(2, &[vec![1, 2], vec![-1, -2]]);
        match outcome {
            SatOutcome::Sat(model) => {
                let x1 = model[&1];
                let x2 = model[&2];
                assert!(x1 ^ x2);
            }
            SatOutcome::Unsat => panic!("expected SAT"),
        }
    }

    #[test]
    fn three_variable_implication_chain() {
        // x1 -> x2 -> x3, x1 true
        let clauses = vec![vec![-1, 2], vec![-2, 3], vec![1]];
        let outcome = DpllBackend.solve(3, &clauses);
        match outcome {
            SatOutcome::Sat(model) => {
                assert!(model[&1]);
                assert!(model[&2]);
                assert!(model[&3]);
            }
            SatOutcome::Unsat => panic!("expected SAT"),
        }
    }

    #[test]
    fn dpll_backend_reports_available() {
        assert!(DpllBackend.is_available());
    }
}
