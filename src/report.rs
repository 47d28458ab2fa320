// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Build a human-readable proof of why version solving failed.

use std::rc::Rc;

use crate::incompatibility::{Cause, Incompatibility};
use crate::type_aliases::Map;
use crate::version::Version;

/// Incompatibilities are shared and compared by identity here: two
/// distinct derivations may have equal terms but different causes.
type Key<V> = *const Incompatibility<V>;

fn key<V: Version>(incompatibility: &Rc<Incompatibility<V>>) -> Key<V> {
    Rc::as_ptr(incompatibility)
}

/// Renders the derivation tree of a failure as a numbered proof.
///
/// Each conflict-derived incompatibility becomes one sentence combining
/// its two causes. Incompatibilities referenced more than once get a line
/// number, so later sentences can cite them as "(n)" instead of repeating
/// the whole derivation.
pub struct FailureWriter<V: Version> {
    root: Rc<Incompatibility<V>>,
    /// How many derived incompatibilities reference each node.
    derivations: Map<Key<V>, usize>,
    /// Rendered lines with their optional line number.
    lines: Vec<(String, Option<usize>)>,
    line_numbers: Map<Key<V>, usize>,
}

impl<V: Version> FailureWriter<V> {
    /// Prepare a writer for the failure proof rooted at the given
    /// incompatibility.
    pub fn new(root: &Rc<Incompatibility<V>>) -> Self {
        let mut writer = Self {
            root: Rc::clone(root),
            derivations: Map::default(),
            lines: Vec::new(),
            line_numbers: Map::default(),
        };
        writer.count_derivations(root);
        writer
    }

    /// Render the proof.
    pub fn write(mut self) -> String {
        // A failure without a conflict cause is its own explanation, e.g.
        // a dependency of the root package on a package that does not
        // exist.
        if !self.root.is_conflict() {
            return self.root.to_string();
        }

        let root = Rc::clone(&self.root);
        self.visit(root, false);

        let padding = match self.line_numbers.len() {
            0 => 0,
            last => format!("({last}) ").len(),
        };
        let rendered: Vec<String> = self
            .lines
            .iter()
            .map(|(message, number)| {
                let lead = match number {
                    Some(n) => format!("({n}) "),
                    None => String::new(),
                };
                format!("{lead:<padding$}{message}")
            })
            .collect();
        rendered.join("\n")
    }

    fn write_line(
        &mut self,
        incompatibility: &Rc<Incompatibility<V>>,
        message: String,
        numbered: bool,
    ) {
        let number = if numbered {
            let number = self.line_numbers.len() + 1;
            self.line_numbers.insert(key(incompatibility), number);
            Some(number)
        } else {
            None
        };
        self.lines.push((message, number));
    }

    fn visit(&mut self, incompatibility: Rc<Incompatibility<V>>, conclusion: bool) {
        let Cause::Conflict { conflict, other } = incompatibility.cause() else {
            unreachable!("only conflict-derived incompatibilities are visited");
        };
        let conflict = Rc::clone(conflict);
        let other = Rc::clone(other);

        let numbered = conclusion || self.derivations[&key(&incompatibility)] > 1;
        let conjunction = if conclusion || Rc::ptr_eq(&incompatibility, &self.root) {
            "So,"
        } else {
            "And"
        };

        match (conflict.is_conflict(), other.is_conflict()) {
            (true, true) => {
                let conflict_line = self.line_numbers.get(&key(&conflict)).copied();
                let other_line = self.line_numbers.get(&key(&other)).copied();
                match (conflict_line, other_line) {
                    (Some(conflict_line), Some(other_line)) => {
                        self.write_line(
                            &incompatibility,
                            format!(
                                "Because {conflict} ({conflict_line}) and {other} ({other_line}), {incompatibility}."
                            ),
                            numbered,
                        );
                    }
                    (Some(line), None) | (None, Some(line)) => {
                        let (with_line, without_line) = if conflict_line.is_some() {
                            (conflict, other)
                        } else {
                            (other, conflict)
                        };
                        self.visit(without_line, false);
                        self.write_line(
                            &incompatibility,
                            format!(
                                "{conjunction} because {with_line} ({line}), {incompatibility}."
                            ),
                            numbered,
                        );
                    }
                    (None, None) => {
                        let single_line_other = Self::single_line(&other);
                        if Self::single_line(&conflict) || single_line_other {
                            let (first, second) = if single_line_other {
                                (Rc::clone(&conflict), Rc::clone(&other))
                            } else {
                                (Rc::clone(&other), Rc::clone(&conflict))
                            };
                            self.visit(first, false);
                            self.visit(second, false);
                            self.write_line(
                                &incompatibility,
                                format!("Thus, {incompatibility}."),
                                numbered,
                            );
                        } else {
                            // Render the first cause as its own numbered
                            // paragraph, then cite it by number.
                            self.visit(Rc::clone(&conflict), true);
                            self.lines.push((String::new(), None));
                            self.visit(other, false);
                            let line = self.line_numbers[&key(&conflict)];
                            self.write_line(
                                &incompatibility,
                                format!(
                                    "{conjunction} because {conflict} ({line}), {incompatibility}."
                                ),
                                numbered,
                            );
                        }
                    }
                }
            }
            (true, false) | (false, true) => {
                let (derived, external) = if conflict.is_conflict() {
                    (conflict, other)
                } else {
                    (other, conflict)
                };
                match self.line_numbers.get(&key(&derived)).copied() {
                    Some(line) => {
                        self.write_line(
                            &incompatibility,
                            format!("Because {external} and {derived} ({line}), {incompatibility}."),
                            numbered,
                        );
                    }
                    None => {
                        self.visit(derived, false);
                        self.write_line(
                            &incompatibility,
                            format!("{conjunction} because {external}, {incompatibility}."),
                            numbered,
                        );
                    }
                }
            }
            (false, false) => {
                self.write_line(
                    &incompatibility,
                    format!("Because {conflict} and {other}, {incompatibility}."),
                    numbered,
                );
            }
        }
    }

    /// Will this conflict-derived incompatibility render as a single
    /// sentence, i.e. neither of its causes is itself derived?
    fn single_line(incompatibility: &Rc<Incompatibility<V>>) -> bool {
        match incompatibility.cause() {
            Cause::Conflict { conflict, other } => !conflict.is_conflict() && !other.is_conflict(),
            _ => false,
        }
    }

    fn count_derivations(&mut self, incompatibility: &Rc<Incompatibility<V>>) {
        let k = key(incompatibility);
        if let Some(count) = self.derivations.get_mut(&k) {
            *count += 1;
            return;
        }
        self.derivations.insert(k, 1);
        if let Cause::Conflict { conflict, other } = incompatibility.cause() {
            let conflict = Rc::clone(conflict);
            let other = Rc::clone(other);
            self.count_derivations(&conflict);
            self.count_derivations(&other);
        }
    }
}

// TESTS #######################################################################

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::Constraint;
    use crate::package::Package;
    use crate::range::{Range, VersionSet};
    use crate::term::Term;
    use crate::version::NumberVersion;

    type Inc = Rc<Incompatibility<NumberVersion>>;

    fn v(n: u32) -> NumberVersion {
        NumberVersion(n)
    }

    fn term(package: Package, set: VersionSet<NumberVersion>, positive: bool) -> Term<NumberVersion> {
        Term::new(Constraint::new(package, set), positive)
    }

    fn between(low: u32, high: u32) -> VersionSet<NumberVersion> {
        VersionSet::Range(Range::between(v(low), v(high)))
    }

    fn dependency(package: &str, dep: &str, set: VersionSet<NumberVersion>) -> Inc {
        let depender = if package == "root" {
            Package::Root
        } else {
            Package::named(package)
        };
        Rc::new(Incompatibility::new(
            vec![
                term(depender, VersionSet::any(), true),
                term(Package::named(dep), set, false),
            ],
            Cause::Dependency,
        ))
    }

    fn derived(terms: Vec<Term<NumberVersion>>, conflict: &Inc, other: &Inc) -> Inc {
        Rc::new(Incompatibility::new(
            terms,
            Cause::Conflict {
                conflict: Rc::clone(conflict),
                other: Rc::clone(other),
            },
        ))
    }

    fn failure_terms() -> Vec<Term<NumberVersion>> {
        vec![term(Package::Root, VersionSet::any(), true)]
    }

    #[test]
    fn linear_proof_has_no_numbers() {
        let e1 = dependency("foo", "bar", between(2, 3));
        let e2 = dependency("bar", "baz", between(3, 4));
        let e3 = dependency("root", "baz", between(1, 2));
        let d1 = derived(
            vec![
                term(Package::named("foo"), VersionSet::any(), true),
                term(Package::named("baz"), between(3, 4), false),
            ],
            &e1,
            &e2,
        );
        let root = derived(failure_terms(), &d1, &e3);

        assert_eq!(
            FailureWriter::new(&root).write(),
            "Because every version of foo depends on bar >= 2, < 3 \
             and every version of bar depends on baz >= 3, < 4, \
             foo any requires baz >= 3, < 4.\n\
             So, because root depends on baz >= 1, < 2, \
             version solving has failed."
        );
    }

    #[test]
    fn shared_derivations_are_numbered_and_cited() {
        let e1 = dependency("foo", "bar", between(2, 3));
        let e2 = dependency("bar", "baz", between(3, 4));
        let d1 = derived(
            vec![
                term(Package::named("foo"), VersionSet::any(), true),
                term(Package::named("baz"), between(3, 4), false),
            ],
            &e1,
            &e2,
        );
        let ex = dependency("root", "foo", between(1, 2));
        let dp = derived(
            vec![term(Package::named("baz"), between(3, 4), false)],
            &d1,
            &ex,
        );
        let ey = dependency("qux", "baz", between(1, 2));
        let dq = derived(
            vec![
                term(Package::named("foo"), VersionSet::any(), true),
                term(Package::named("qux"), VersionSet::any(), true),
            ],
            &d1,
            &ey,
        );
        let root = derived(failure_terms(), &dp, &dq);

        let expected = String::new()
            + "(1) Because every version of foo depends on bar >= 2, < 3 \
               and every version of bar depends on baz >= 3, < 4, \
               foo any requires baz >= 3, < 4.\n"
            + "(2) So, because root depends on foo >= 1, < 2, baz >= 3, < 4 is required.\n"
            + "    \n"
            + "    Because every version of qux depends on baz >= 1, < 2 \
               and foo any requires baz >= 3, < 4 (1), \
               foo any is incompatible with qux any.\n"
            + "    So, because baz >= 3, < 4 is required (2), version solving has failed.";

        assert_eq!(FailureWriter::new(&root).write(), expected);
    }

    #[test]
    fn non_derived_root_is_its_own_explanation() {
        let forbidden = Rc::new(Incompatibility::new(
            vec![term(Package::named("foo"), between(1, 2), true)],
            Cause::NoVersions,
        ));
        assert_eq!(
            FailureWriter::new(&forbidden).write(),
            "foo >= 1, < 2 is forbidden"
        );
    }
}
