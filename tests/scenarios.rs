// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use version_solver::error::SolveError;
use version_solver::package::Package;
use version_solver::range::VersionSet;
use version_solver::requirement::parse_requirement;
use version_solver::solver::resolve;
use version_solver::source::StaticPackageSource;
use version_solver::type_aliases::SelectedDependencies;
use version_solver::version::SemanticVersion;

fn init_log() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn source() -> StaticPackageSource<SemanticVersion> {
    StaticPackageSource::new(SemanticVersion::zero())
}

fn v(text: &str) -> SemanticVersion {
    text.parse().unwrap()
}

fn deps(pairs: &[(&str, &str)]) -> Vec<(Package, VersionSet<SemanticVersion>)> {
    pairs
        .iter()
        .map(|(package, requirement)| {
            (
                Package::named(*package),
                parse_requirement(requirement).unwrap(),
            )
        })
        .collect()
}

fn assert_solution(
    solution: &SelectedDependencies<SemanticVersion>,
    expected: &[(&str, &str)],
) {
    assert_eq!(solution.get(&Package::Root), Some(&SemanticVersion::zero()));
    assert_eq!(solution.len(), expected.len() + 1);
    for (package, version) in expected {
        assert_eq!(
            solution.get(&Package::named(*package)),
            Some(&v(version)),
            "selected version of {package}"
        );
    }
}

#[test]
fn simple_dependency_tree() {
    init_log();
    let mut source = source();
    source.root(deps(&[("a", "1.0.0"), ("b", "1.0.0")]));
    source.add("a", v("1.0.0"), deps(&[("aa", "1.0.0"), ("ab", "1.0.0")]));
    source.add("aa", v("1.0.0"), []);
    source.add("ab", v("1.0.0"), []);
    source.add("b", v("1.0.0"), deps(&[("ba", "1.0.0"), ("bb", "1.0.0")]));
    source.add("ba", v("1.0.0"), []);
    source.add("bb", v("1.0.0"), []);

    let solution = resolve(&source).unwrap();
    assert_solution(
        &solution,
        &[
            ("a", "1.0.0"),
            ("aa", "1.0.0"),
            ("ab", "1.0.0"),
            ("b", "1.0.0"),
            ("ba", "1.0.0"),
            ("bb", "1.0.0"),
        ],
    );
}

#[test]
fn shared_dependency_with_overlapping_constraints() {
    init_log();
    let mut source = source();
    source.root(deps(&[("a", ">= 1.0.0"), ("b", ">= 1.0.0")]));
    source.add("a", v("1.0.0"), deps(&[("shared", ">= 2.0.0, < 4.0.0")]));
    source.add("b", v("1.0.0"), deps(&[("shared", ">= 3.0.0, < 5.0.0")]));
    for version in ["2.0.0", "3.0.0", "3.6.9", "4.0.0", "5.0.0"] {
        source.add("shared", v(version), []);
    }

    let solution = resolve(&source).unwrap();
    // Newest version in the intersection of both constraints.
    assert_solution(
        &solution,
        &[("a", "1.0.0"), ("b", "1.0.0"), ("shared", "3.6.9")],
    );
}

#[test]
fn backjumps_after_conflict() {
    init_log();
    let mut source = source();
    source.root(deps(&[("foo", ">= 1.0.0")]));
    source.add("foo", v("2.0.0"), deps(&[("bar", ">= 1.0.0, < 2.0.0")]));
    source.add("foo", v("1.0.0"), []);
    source.add("bar", v("1.0.0"), deps(&[("foo", ">= 1.0.0, < 2.0.0")]));

    // foo 2.0.0 pulls in bar, which contradicts the choice of foo 2.0.0.
    // The solver learns that foo >= 2.0.0 is unusable and settles on 1.0.0,
    // which needs no bar at all.
    let solution = resolve(&source).unwrap();
    assert_solution(&solution, &[("foo", "1.0.0")]);
}

#[test]
fn avoids_conflict_without_backjumping() {
    init_log();
    let mut source = source();
    source.root(deps(&[("foo", "~> 1.0"), ("bar", "~> 1.0")]));
    source.add("foo", v("1.1.0"), deps(&[("bar", "~> 2.0")]));
    source.add("foo", v("1.0.0"), []);
    source.add("bar", v("1.0.0"), []);
    source.add("bar", v("1.1.0"), []);
    source.add("bar", v("2.0.0"), []);

    // foo 1.1.0 would immediately contradict the constraint on bar, so it
    // is never decided on in the first place.
    let solution = resolve(&source).unwrap();
    assert_solution(&solution, &[("foo", "1.0.0"), ("bar", "1.1.0")]);
}

#[test]
fn circular_dependencies_are_fine() {
    init_log();
    let mut source = source();
    source.root(deps(&[("foo", "1.0.0")]));
    source.add("foo", v("1.0.0"), deps(&[("bar", "1.0.0")]));
    source.add("bar", v("1.0.0"), deps(&[("foo", "1.0.0")]));

    let solution = resolve(&source).unwrap();
    assert_solution(&solution, &[("foo", "1.0.0"), ("bar", "1.0.0")]);
}

#[test]
fn unsolvable_constraints_report_a_proof() {
    init_log();
    let mut source = source();
    source.root(deps(&[("foo", ">= 1.0.0"), ("baz", ">= 1.0.0, < 2.0.0")]));
    source.add("foo", v("1.0.0"), deps(&[("bar", ">= 2.0.0, < 3.0.0")]));
    source.add("bar", v("2.0.0"), deps(&[("baz", ">= 3.0.0, < 4.0.0")]));
    source.add("bar", v("2.1.0"), deps(&[("baz", ">= 3.0.0, < 4.0.0")]));
    source.add("baz", v("1.0.0"), []);
    source.add("baz", v("3.0.0"), []);

    let error = resolve(&source).unwrap_err();
    assert!(matches!(error, SolveError::NoSolution(_)));
    let proof = error.to_string();
    assert!(
        proof.contains("every version of bar depends on baz >= 3.0.0, < 4.0.0"),
        "proof was: {proof}"
    );
    assert!(
        proof.contains("root depends on baz >= 1.0.0, < 2.0.0"),
        "proof was: {proof}"
    );
    assert!(
        proof.ends_with("version solving has failed."),
        "proof was: {proof}"
    );
}

#[test]
fn no_matching_version_is_reported() {
    init_log();
    let mut source = source();
    source.root(deps(&[("foo", ">= 2.0.0")]));
    source.add("foo", v("1.0.0"), []);

    let error = resolve(&source).unwrap_err();
    let proof = error.to_string();
    assert!(
        proof.ends_with("version solving has failed."),
        "proof was: {proof}"
    );
    assert!(proof.contains("foo"), "proof was: {proof}");
}

#[test]
fn dependency_on_unknown_package_fails() {
    init_log();
    let mut source = source();
    source.root(deps(&[("foo", "1.0.0")]));
    source.add("foo", v("1.0.0"), deps(&[("mystery", ">= 1.0.0")]));

    let error = resolve(&source).unwrap_err();
    assert!(matches!(error, SolveError::NoSolution(_)));
}

#[test]
fn solving_twice_gives_the_same_decisions() {
    init_log();
    let mut source = source();
    source.root(deps(&[("a", ">= 1.0.0"), ("b", ">= 1.0.0")]));
    source.add("a", v("1.0.0"), deps(&[("shared", ">= 2.0.0, < 4.0.0")]));
    source.add("a", v("2.0.0"), deps(&[("shared", ">= 2.0.0, < 4.0.0")]));
    source.add("b", v("1.0.0"), deps(&[("shared", ">= 3.0.0, < 5.0.0")]));
    for version in ["2.0.0", "3.0.0", "3.6.9", "4.0.0"] {
        source.add("shared", v(version), []);
    }

    let first = resolve(&source).unwrap();
    let second = resolve(&source).unwrap();
    let first_order: Vec<_> = first.iter().collect();
    let second_order: Vec<_> = second.iter().collect();
    assert_eq!(first_order, second_order);
}

#[test]
fn partial_satisfier_narrows_the_backjump() {
    init_log();
    // From the PubGrub documentation: the union constraint on left is only
    // partially satisfied by the first assignment, which changes where the
    // solver backjumps to.
    let mut source = source();
    source.root(deps(&[("foo", "~> 1.0"), ("target", "~> 2.0")]));
    source.add("foo", v("1.1.0"), deps(&[("left", "~> 1.0"), ("right", "~> 1.0")]));
    source.add("foo", v("1.0.0"), []);
    source.add("left", v("1.0.0"), deps(&[("shared", ">= 1.0.0")]));
    source.add("right", v("1.0.0"), deps(&[("shared", "< 2.0.0")]));
    source.add("shared", v("2.0.0"), []);
    source.add("shared", v("1.0.0"), deps(&[("target", "~> 1.0")]));
    source.add("target", v("2.0.0"), []);
    source.add("target", v("1.0.0"), []);

    let solution = resolve(&source).unwrap();
    assert_solution(&solution, &[("foo", "1.0.0"), ("target", "2.0.0")]);
}
