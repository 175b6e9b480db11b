//! Evaluation order over the target dependency graph.
//!
//! Edges run from a target to every target that reads it, through a rule
//! source (an attribute or every target in a family) or a formula
//! reference. The order is Kahn's algorithm with ties broken by first
//! registration; when only cycles remain, the earliest-registered unplaced
//! target is forced out and the walk continues.

use std::collections::{BTreeMap, BTreeSet};

use crate::attribute::AttrName;
use crate::rule::Source;
use crate::ruleset::TargetRules;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Plan {
    /// Target slots in evaluation order.
    pub order: Vec<usize>,
    /// Target slots on dependency cycles, in registration order.
    pub cyclic: Vec<usize>,
}

pub(crate) fn plan(targets: &[TargetRules], index: &BTreeMap<AttrName, usize>) -> Plan {
    let graph = Graph::new(targets, index);
    Plan {
        order: graph.order(),
        cyclic: graph.cyclic(),
    }
}

struct Graph {
    /// `dependents[j]` holds every target that reads target `j`.
    dependents: Vec<BTreeSet<usize>>,
    self_loops: Vec<bool>,
}

impl Graph {
    fn new(targets: &[TargetRules], index: &BTreeMap<AttrName, usize>) -> Self {
        let n = targets.len();
        let mut dependents = vec![BTreeSet::new(); n];
        let mut self_loops = vec![false; n];

        for (reader, target) in targets.iter().enumerate() {
            let mut reads = BTreeSet::new();
            for rule in target.rules() {
                match rule.source() {
                    Source::Always => {}
                    Source::Attribute(name) => reads.extend(index.get(name).copied()),
                    Source::Family(_) => reads.extend(
                        targets
                            .iter()
                            .enumerate()
                            .filter(|&(slot, t)| slot != reader && rule.source().reads(t.name().as_str()))
                            .map(|(slot, _)| slot),
                    ),
                }
                reads.extend(
                    rule.formula()
                        .references()
                        .iter()
                        .filter_map(|name| index.get(name).copied()),
                );
            }
            for read in reads {
                if read == reader {
                    self_loops[reader] = true;
                } else {
                    dependents[read].insert(reader);
                }
            }
        }

        Self {
            dependents,
            self_loops,
        }
    }

    fn indegrees(&self) -> Vec<usize> {
        let mut indegree = vec![0; self.dependents.len()];
        for readers in &self.dependents {
            for &reader in readers {
                indegree[reader] += 1;
            }
        }
        indegree
    }

    fn order(&self) -> Vec<usize> {
        let n = self.dependents.len();
        let mut indegree = self.indegrees();
        let mut ready: BTreeSet<usize> = (0..n).filter(|&slot| indegree[slot] == 0).collect();
        let mut placed = vec![false; n];
        let mut order = Vec::with_capacity(n);

        while order.len() < n {
            let Some(next) = ready
                .pop_first()
                .or_else(|| (0..n).find(|&slot| !placed[slot]))
            else {
                break;
            };
            placed[next] = true;
            order.push(next);

            for &reader in &self.dependents[next] {
                if placed[reader] {
                    continue;
                }
                indegree[reader] = indegree[reader].saturating_sub(1);
                if indegree[reader] == 0 {
                    ready.insert(reader);
                }
            }
        }
        order
    }

    /// Targets that can reach themselves, found by peeling away everything
    /// without a live predecessor and then everything without a live
    /// successor.
    fn cyclic(&self) -> Vec<usize> {
        let n = self.dependents.len();
        let mut alive = vec![true; n];

        let mut indegree = self.indegrees();
        let mut queue: Vec<usize> = (0..n).filter(|&slot| indegree[slot] == 0).collect();
        while let Some(slot) = queue.pop() {
            alive[slot] = false;
            for &reader in &self.dependents[slot] {
                indegree[reader] -= 1;
                if indegree[reader] == 0 {
                    queue.push(reader);
                }
            }
        }

        let mut readers_of: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (read, readers) in self.dependents.iter().enumerate() {
            for &reader in readers {
                readers_of[reader].push(read);
            }
        }
        let mut outdegree: Vec<usize> = self
            .dependents
            .iter()
            .map(|readers| readers.iter().filter(|&&r| alive[r]).count())
            .collect();
        let mut queue: Vec<usize> = (0..n)
            .filter(|&slot| alive[slot] && outdegree[slot] == 0)
            .collect();
        while let Some(slot) = queue.pop() {
            if !alive[slot] {
                continue;
            }
            alive[slot] = false;
            for &read in &readers_of[slot] {
                if alive[read] {
                    outdegree[read] -= 1;
                    if outdegree[read] == 0 {
                        queue.push(read);
                    }
                }
            }
        }

        (0..n)
            .filter(|&slot| alive[slot] || self.self_loops[slot])
            .collect()
    }
}
