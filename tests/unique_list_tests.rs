use std::collections::HashSet;

use movie_curator::{
    error::AppError,
    lists::{AddOutcome, UniqueMovieList},
    models::{Movie, Role},
};

/// Every indexed contributor maps to a listed movie crediting them in that
/// role, and every credit on a listed movie is indexed
fn assert_invariants(list: &UniqueMovieList) {
    for role in Role::ALL {
        for (contributor, uri) in list.index_snapshot(role) {
            let movie = list
                .get(uri)
                .unwrap_or_else(|| panic!("{contributor} indexed to missing movie {uri}"));
            assert!(
                movie.credited(role).contains(contributor),
                "{uri} does not credit {contributor} as {role}"
            );
        }
    }
    for movie in list.movies() {
        for (role, contributor) in movie.contributors() {
            assert_eq!(
                list.index_snapshot(role).get(contributor),
                Some(&movie.uri),
                "{role} {contributor} of {} is not indexed",
                movie.uri
            );
        }
    }
}

/// Small deterministic generator so failures reproduce
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u64) -> usize {
        (self.next() % n) as usize
    }

    fn people(&mut self, prefix: &str, pool: u64, max: u64) -> Vec<String> {
        let count = self.below(max + 1);
        (0..count)
            .map(|_| format!("{}{}", prefix, self.below(pool)))
            .collect()
    }
}

fn random_movie(rng: &mut XorShift) -> Movie {
    let id = rng.below(30);
    Movie::new(format!("m/{}", id), format!("Movie {}", id))
        .with_directors(rng.people("d", 12, 2))
        .with_writers(rng.people("w", 12, 2))
        .with_actors(rng.people("a", 40, 4))
}

#[test]
fn invariants_hold_across_random_operations() {
    for seed in 1..=20u64 {
        let mut rng = XorShift(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15));
        let mut list = UniqueMovieList::new();

        for _ in 0..200 {
            match rng.below(4) {
                0 => {
                    let movie = random_movie(&mut rng);
                    let before = list.to_snapshot();
                    if list.add(movie, false).is_err() {
                        assert_eq!(list.to_snapshot(), before, "failed add mutated the list");
                    }
                }
                1 | 2 => {
                    list.add(random_movie(&mut rng), true).unwrap();
                }
                _ => {
                    let uri = format!("m/{}", rng.below(30));
                    let listed = list.has_movie(&uri);
                    assert_eq!(list.remove(&uri).is_ok(), listed);
                    assert!(!list.has_movie(&uri));
                }
            }
            assert_invariants(&list);
        }
    }
}

#[test]
fn force_replace_evicts_exactly_the_blocking_movies() {
    for seed in 1..=20u64 {
        let mut rng = XorShift(seed.wrapping_mul(0xD1B5_4A32_D192_ED03));
        let mut list = UniqueMovieList::new();
        for _ in 0..40 {
            list.add(random_movie(&mut rng), true).unwrap();
        }

        let candidate = random_movie(&mut rng);
        let conflicts = list.find_conflicts(&candidate);
        let mut blocking: HashSet<String> =
            conflicts.iter().map(|c| c.blocking_movie.clone()).collect();
        let shared = candidate
            .contributors()
            .filter(|(role, c)| list.index_snapshot(*role).contains_key(*c))
            .count();
        assert_eq!(conflicts.len(), shared);

        let identical = list
            .get(&candidate.uri)
            .is_some_and(|listed| listed.same_record(&candidate));
        if list.has_movie(&candidate.uri) {
            blocking.insert(candidate.uri.clone());
        }

        match list.add(candidate.clone(), true).unwrap() {
            AddOutcome::Inserted => assert!(blocking.is_empty()),
            AddOutcome::Unchanged => assert!(identical),
            AddOutcome::Replaced { evicted } => {
                let evicted: HashSet<String> = evicted.into_iter().collect();
                assert_eq!(evicted, blocking);
            }
        }
        assert!(list.get(&candidate.uri).unwrap().same_record(&candidate));
        assert_invariants(&list);
    }
}

#[test]
fn repeated_force_add_is_idempotent() {
    let mut rng = XorShift(42);
    let mut list = UniqueMovieList::new();
    for _ in 0..30 {
        list.add(random_movie(&mut rng), true).unwrap();
    }

    let movie = random_movie(&mut rng);
    list.add(movie.clone(), true).unwrap();
    let after_first = list.to_snapshot();

    assert_eq!(list.add(movie, true).unwrap(), AddOutcome::Unchanged);
    assert_eq!(list.to_snapshot(), after_first);
}

#[test]
fn fargo_scenario() {
    let mut list = UniqueMovieList::new();
    let a = Movie::new("m/Fargo", "Fargo")
        .with_directors(["Coens"])
        .with_writers(["Coens"])
        .with_actors(["Buscemi", "McDormand"]);
    let b = Movie::new("m/Fargo2", "Fargo 2")
        .with_directors(["Coens"])
        .with_actors(["X"]);

    assert_eq!(list.add(a, false).unwrap(), AddOutcome::Inserted);
    for contributor in ["Coens", "Buscemi", "McDormand"] {
        let sharing = Movie::new("m/Sharing", "Sharing")
            .with_directors([contributor])
            .with_writers([contributor])
            .with_actors([contributor]);
        assert!(!list.can_add(&sharing));
    }

    match list.add(b.clone(), false) {
        Err(AppError::ConstraintViolation { uri, conflicts }) => {
            assert_eq!(uri, "m/Fargo2");
            assert_eq!(conflicts.len(), 1);
            assert_eq!(conflicts[0].role, Role::Director);
            assert_eq!(conflicts[0].contributor, "Coens");
            assert_eq!(conflicts[0].blocking_movie, "m/Fargo");
        }
        other => panic!("expected a constraint violation, got {other:?}"),
    }

    list.add(b, true).unwrap();
    assert!(!list.has_movie("m/Fargo"));
    assert!(list.has_movie("m/Fargo2"));
    assert_eq!(
        list.index_snapshot(Role::Director).get("Coens").map(String::as_str),
        Some("m/Fargo2")
    );
    assert!(!list.index_snapshot(Role::Actor).contains_key("Buscemi"));
    assert!(!list.index_snapshot(Role::Actor).contains_key("McDormand"));
    assert_invariants(&list);
}

#[test]
fn json_round_trip_reproduces_entries_and_indexes() {
    let mut rng = XorShift(7);
    let mut list = UniqueMovieList::new();
    for _ in 0..50 {
        list.add(random_movie(&mut rng), true).unwrap();
    }

    let json = serde_json::to_string_pretty(&list.to_snapshot()).unwrap();
    let restored = UniqueMovieList::from_json("round_trip", &json).unwrap();

    assert_eq!(restored.to_snapshot(), list.to_snapshot());
    for role in Role::ALL {
        assert_eq!(restored.index_snapshot(role), list.index_snapshot(role));
    }
}
